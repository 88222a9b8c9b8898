//! Bulk attribute records as returned by the snapshot enumeration call.
//!
//! A page is a run of variable-length, native-endian records:
//!
//! ```text
//! u32            length       total size of this record
//! attribute_set  returned     five u32 bitmaps; only `commonattr` is read
//! attrreference  name_info    i32 offset (relative to itself), u32 length
//! [u8]           name         NUL-terminated, at most MAXPATHLEN bytes
//! ```
//!
//! `name_info` is only present when the name bit is set in `returned`.
//! Records are variable length, so the only way through a page is to
//! follow each record's own `length`.

use std::convert::TryFrom;
use std::io;

use bitflags::bitflags;
use byteorder::{ByteOrder, NativeEndian};

use crate::{Error, Result};

/// Maximum length of a path, including the NUL terminator.
pub const MAXPATHLEN: usize = 1024;

const LENGTH_SIZE: usize = 4;
const ATTRIBUTE_SET_SIZE: usize = 5 * 4;
const NAME_REF_OFFSET: usize = LENGTH_SIZE + ATTRIBUTE_SET_SIZE;
const NAME_REF_SIZE: usize = 8;

/// Size of the fixed part of a record that carries a name.
pub const RECORD_HEADER_SIZE: usize = NAME_REF_OFFSET + NAME_REF_SIZE;

/// Size of the largest record the enumeration call can return.
pub const MAX_RECORD_SIZE: usize = RECORD_HEADER_SIZE + MAXPATHLEN;

bitflags! {
    /// Common attribute bits (`commonattr`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommonAttr: u32 {
        const NAME = 0x0000_0001;
        const RETURNED_ATTRS = 0x8000_0000;

        /// Attributes requested from the enumeration call.
        const BULK_REQUIRED = Self::NAME.bits() | Self::RETURNED_ATTRS.bits();
    }
}

/// The paging primitive behind a snapshot listing.
///
/// Each call fills `page` with the next run of packed records and returns how
/// many it wrote. `Ok(0)` means the stream is exhausted.
pub trait AttributeSource {
    fn next_page(&mut self, page: &mut [u8]) -> io::Result<usize>;
}

impl<S: AttributeSource + ?Sized> AttributeSource for &mut S {
    fn next_page(&mut self, page: &mut [u8]) -> io::Result<usize> {
        (**self).next_page(page)
    }
}

/// One parsed record, borrowing its name from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrRecord<'a> {
    /// Byte offset of the record within its page.
    pub offset: usize,
    pub length: u32,
    pub returned: CommonAttr,
    /// The name without its NUL terminator, if it was returned.
    pub name: Option<&'a [u8]>,
}

/// Iterates the first `count` records of a page.
///
/// Stops after the first malformed record.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    page: &'a [u8],
    offset: usize,
    remaining: usize,
}

impl<'a> Records<'a> {
    pub fn new(page: &'a [u8], count: usize) -> Records<'a> {
        Records {
            page,
            offset: 0,
            remaining: count,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<AttrRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match parse_record(self.page, self.offset) {
            Ok(record) => {
                self.remaining -= 1;
                self.offset += record.length as usize;
                Some(Ok(record))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }
}

fn parse_record(page: &[u8], offset: usize) -> Result<AttrRecord<'_>> {
    let malformed = |reason| Error::MalformedRecord { offset, reason };

    let header = page
        .get(offset..offset + NAME_REF_OFFSET)
        .ok_or_else(|| malformed("record header extends past end of page"))?;
    let length = NativeEndian::read_u32(&header[..LENGTH_SIZE]);

    if (length as usize) < NAME_REF_OFFSET {
        return Err(malformed("record length shorter than its header"));
    }

    let record = page
        .get(offset..offset + length as usize)
        .ok_or_else(|| malformed("record extends past end of page"))?;
    let returned =
        CommonAttr::from_bits_retain(NativeEndian::read_u32(&record[LENGTH_SIZE..NAME_REF_OFFSET]));

    let name = if returned.contains(CommonAttr::NAME) {
        Some(parse_name(record).map_err(malformed)?)
    } else {
        None
    };

    tracing::trace!(offset, length, returned = ?returned, "parsed attribute record");

    Ok(AttrRecord {
        offset,
        length,
        returned,
        name,
    })
}

fn parse_name(record: &[u8]) -> std::result::Result<&[u8], &'static str> {
    let reference = record
        .get(NAME_REF_OFFSET..RECORD_HEADER_SIZE)
        .ok_or("name reference extends past end of record")?;
    let data_offset = NativeEndian::read_i32(&reference[..4]);
    let data_length = NativeEndian::read_u32(&reference[4..]) as usize;

    if data_length > MAXPATHLEN {
        return Err("name longer than MAXPATHLEN");
    }

    // The offset is relative to the attrreference itself.
    let start = usize::try_from(data_offset)
        .ok()
        .and_then(|o| o.checked_add(NAME_REF_OFFSET))
        .ok_or("name offset points before its reference")?;
    let bytes = start
        .checked_add(data_length)
        .and_then(|end| record.get(start..end))
        .ok_or("name extends past end of record")?;

    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(&bytes[..end])
}

/// A zeroed, 4-byte aligned buffer that pages of records are read into.
pub(crate) struct PageBuffer {
    words: Vec<u32>,
}

impl PageBuffer {
    pub fn new(size: usize) -> Result<PageBuffer> {
        let len = size.max(RECORD_HEADER_SIZE).div_ceil(4);
        let mut words = Vec::new();
        words.try_reserve_exact(len)?;
        words.resize(len, 0);
        Ok(PageBuffer { words })
    }

    /// Zero the buffer so stale flag bits from an earlier page are never read.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 storage is valid for reads as u8 and the length covers
        // exactly the same allocation.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast(), self.words.len() * 4) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above; any byte pattern is a valid u32.
        unsafe {
            std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast(), self.words.len() * 4)
        }
    }
}
