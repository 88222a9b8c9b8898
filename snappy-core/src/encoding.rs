//! Uppercase hex rendering of boot digests.

use crate::{Error, Result};

/// Two uppercase hex digits per byte, no separators.
pub fn encode_upper<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode_upper(bytes)
}

/// Write the uppercase hex digits of `bytes` into `buf`, followed by a NUL.
///
/// `buf` must hold at least `2 * bytes.len() + 1` bytes. Returns the number of
/// digits written, not counting the terminator.
pub fn encode_upper_into(bytes: &[u8], buf: &mut [u8]) -> Result<usize> {
    let digits = bytes.len() * 2;
    let available = buf.len();
    let too_small = move || Error::EncodingBufferTooSmall {
        needed: digits + 1,
        available,
    };

    if available < digits + 1 {
        return Err(too_small());
    }

    hex::encode_to_slice(bytes, &mut buf[..digits]).map_err(|_| too_small())?;
    buf[..digits].make_ascii_uppercase();
    buf[digits] = 0;

    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_fixed_width() {
        assert_eq!(encode_upper([0x00u8, 0x0a, 0xff, 0x5c]), "000AFF5C");
        assert_eq!(encode_upper(b""), "");
    }

    #[test]
    fn into_writes_terminator() {
        let mut buf = [0xaa; 7];
        let n = encode_upper_into(&[0xde, 0xad, 0x01], &mut buf).unwrap();

        assert_eq!(n, 6);
        assert_eq!(&buf, b"DEAD01\0");
    }

    #[test]
    fn into_leaves_tail_alone() {
        let mut buf = [0xaa; 8];
        encode_upper_into(&[0x12], &mut buf).unwrap();

        assert_eq!(&buf[..3], b"12\0");
        assert!(buf[3..].iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn into_rejects_short_buffer() {
        let mut buf = [0u8; 6];
        let err = encode_upper_into(&[1, 2, 3], &mut buf).unwrap_err();

        assert!(matches!(
            err,
            Error::EncodingBufferTooSmall {
                needed: 7,
                available: 6
            }
        ));
        assert_eq!(buf, [0u8; 6]);
    }
}
