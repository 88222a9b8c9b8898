//! Raw declarations for `<sys/snapshot.h>`, IOKit and the slice of
//! CoreFoundation needed to read device tree properties.

#![allow(non_camel_case_types, non_upper_case_globals)]

use libc::{c_char, c_int, c_void, size_t};

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct attrlist {
    pub bitmapcount: u16,
    pub reserved: u16,
    pub commonattr: u32,
    pub volattr: u32,
    pub dirattr: u32,
    pub fileattr: u32,
    pub forkattr: u32,
}

pub const ATTR_BIT_MAP_COUNT: u16 = 5;

extern "C" {
    /// Enumerate the snapshots of the volume `dirfd` belongs to.
    ///
    /// # Safety
    ///
    /// - `dirfd` must be an open descriptor on the volume
    /// - `attrbuf` must point to at least `bufsize` writable bytes
    pub fn fs_snapshot_list(
        dirfd: c_int,
        alist: *mut attrlist,
        attrbuf: *mut c_void,
        bufsize: size_t,
        flags: u32,
    ) -> c_int;
}

pub type mach_port_t = u32;
pub type io_object_t = mach_port_t;
pub type io_registry_entry_t = io_object_t;
pub type kern_return_t = c_int;
pub type IOOptionBits = u32;

pub const MACH_PORT_NULL: mach_port_t = 0;
pub const MACH_PORT_DEAD: mach_port_t = !0;

pub type CFTypeRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFDataRef = *const c_void;
pub type CFAllocatorRef = *const c_void;
pub type CFIndex = isize;
pub type CFTypeID = usize;
pub type CFStringEncoding = u32;
pub type Boolean = u8;

pub const kCFStringEncodingUTF8: CFStringEncoding = 0x0800_0100;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    pub static kIOMasterPortDefault: mach_port_t;

    pub fn IORegistryEntryFromPath(
        master_port: mach_port_t,
        path: *const c_char,
    ) -> io_registry_entry_t;

    pub fn IORegistryEntryCreateCFProperty(
        entry: io_registry_entry_t,
        key: CFStringRef,
        allocator: CFAllocatorRef,
        options: IOOptionBits,
    ) -> CFTypeRef;

    pub fn IOObjectRelease(object: io_object_t) -> kern_return_t;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFStringCreateWithBytes(
        alloc: CFAllocatorRef,
        bytes: *const u8,
        num_bytes: CFIndex,
        encoding: CFStringEncoding,
        is_external_representation: Boolean,
    ) -> CFStringRef;

    pub fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    pub fn CFDataGetTypeID() -> CFTypeID;
    pub fn CFDataGetLength(data: CFDataRef) -> CFIndex;
    pub fn CFDataGetBytePtr(data: CFDataRef) -> *const u8;
    pub fn CFRelease(cf: CFTypeRef);
}
