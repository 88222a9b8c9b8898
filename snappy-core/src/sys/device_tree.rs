use std::ffi::CString;

use super::ffi::*;
use crate::boot_hash::{DeviceTree, PropertyValue, RegistryEntry};

/// The IOKit registry, reached through the default master port.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoDeviceTree;

impl DeviceTree for IoDeviceTree {
    type Entry = IoRegistryEntry;

    fn entry(&self, path: &str) -> Option<IoRegistryEntry> {
        let path = CString::new(path).ok()?;
        let port = unsafe { IORegistryEntryFromPath(kIOMasterPortDefault, path.as_ptr()) };

        if port == MACH_PORT_NULL || port == MACH_PORT_DEAD {
            tracing::debug!(path = ?path, "no registry entry");
            return None;
        }

        Some(IoRegistryEntry { port })
    }
}

/// A registry entry port, released on drop.
#[derive(Debug)]
pub struct IoRegistryEntry {
    port: io_registry_entry_t,
}

impl Drop for IoRegistryEntry {
    fn drop(&mut self) {
        unsafe {
            IOObjectRelease(self.port);
        }
    }
}

impl RegistryEntry for IoRegistryEntry {
    fn property(&self, key: &str) -> Option<PropertyValue> {
        let key = CfObject::new(unsafe {
            CFStringCreateWithBytes(
                std::ptr::null(),
                key.as_ptr(),
                key.len() as CFIndex,
                kCFStringEncodingUTF8,
                0,
            )
        })?;

        let value = CfObject::new(unsafe {
            IORegistryEntryCreateCFProperty(self.port, key.0, std::ptr::null(), 0)
        })?;

        let type_id = unsafe { CFGetTypeID(value.0) };
        if type_id != unsafe { CFDataGetTypeID() } {
            return Some(PropertyValue::Other {
                type_id: type_id as u64,
            });
        }

        let len = unsafe { CFDataGetLength(value.0) } as usize;
        let ptr = unsafe { CFDataGetBytePtr(value.0) };
        let bytes = if len == 0 || ptr.is_null() {
            Vec::new()
        } else {
            // SAFETY: CFData guarantees `len` readable bytes at `ptr` while
            // `value` is alive.
            unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec()
        };

        Some(PropertyValue::Data(bytes))
    }
}

/// An owned CoreFoundation reference, released on drop.
struct CfObject(CFTypeRef);

impl CfObject {
    fn new(ptr: CFTypeRef) -> Option<CfObject> {
        if ptr.is_null() {
            None
        } else {
            Some(CfObject(ptr))
        }
    }
}

impl Drop for CfObject {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) }
    }
}
