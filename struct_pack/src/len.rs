//! Width classes for length prefixes and the compatible total-length field.
use crate::{
    error::{pointer_sized_decode_error, preallocation_size_limit, ReadResult, WriteResult},
    io::{Reader, Writer},
};

/// Byte width of an encoded length.
///
/// The discriminant is the two-bit code stored in the metainfo byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum WidthClass {
    #[default]
    One = 0b00,
    Two = 0b01,
    Four = 0b10,
    Eight = 0b11,
}

impl WidthClass {
    /// Number of bytes a length occupies in this class.
    #[inline]
    pub const fn bytes(self) -> usize {
        1 << self as u8
    }

    /// Two-bit code of this class.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a class from the low two bits of `bits`.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::One,
            0b01 => Self::Two,
            0b10 => Self::Four,
            _ => Self::Eight,
        }
    }

    /// Narrowest class able to represent every length up to `max_len`.
    #[inline]
    pub const fn for_len(max_len: u64) -> Self {
        if max_len < 1 << 8 {
            Self::One
        } else if max_len < 1 << 16 {
            Self::Two
        } else if max_len < 1 << 32 {
            Self::Four
        } else {
            Self::Eight
        }
    }

    /// Narrowest class among two, four and eight bytes able to hold `len` plus the bytes of the
    /// field itself.
    #[inline]
    pub const fn for_total(len: u64) -> Self {
        if len.saturating_add(2) < 1 << 16 {
            Self::Two
        } else if len.saturating_add(4) < 1 << 32 {
            Self::Four
        } else {
            Self::Eight
        }
    }

    /// Write `len` little-endian, truncated to this class.
    #[inline]
    pub fn write_len(self, writer: &mut (impl Writer + ?Sized), len: u64) -> WriteResult<()> {
        debug_assert!(self.bytes() == 8 || len < 1 << (self.bytes() * 8));
        let bytes = len.to_le_bytes();
        writer.write(&bytes[..self.bytes()])?;
        Ok(())
    }

    /// Read a little-endian length of this class.
    #[inline]
    pub fn read_len<'de>(self, reader: &mut impl Reader<'de>) -> ReadResult<u64> {
        let width = self.bytes();
        let mut bytes = [0u8; 8];
        bytes[..width].copy_from_slice(reader.fill_exact(width)?);
        reader.consume(width)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

/// 4 MiB.
pub const DEFAULT_PREALLOCATION_SIZE_LIMIT: usize = 4 << 20;

/// Convert a decoded length to `usize` and ensure that preallocating `len` elements of `T`
/// stays within `limit` bytes.
///
/// This is a safety precaution against malicious input causing OOM.
#[inline]
pub fn checked_prealloc<T>(len: u64, limit: usize) -> ReadResult<usize> {
    let len = usize::try_from(len).map_err(|_| pointer_sized_decode_error())?;
    let needed = len
        .checked_mul(size_of::<T>().max(1))
        .ok_or_else(|| preallocation_size_limit(usize::MAX, limit))?;
    if needed > limit {
        return Err(preallocation_size_limit(needed, limit).into());
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::proptest_config::proptest_cfg, proptest::prelude::*};

    #[test]
    fn width_class_boundaries() {
        assert_eq!(WidthClass::for_len(0), WidthClass::One);
        assert_eq!(WidthClass::for_len(255), WidthClass::One);
        assert_eq!(WidthClass::for_len(256), WidthClass::Two);
        assert_eq!(WidthClass::for_len(300), WidthClass::Two);
        assert_eq!(WidthClass::for_len(65_535), WidthClass::Two);
        assert_eq!(WidthClass::for_len(65_536), WidthClass::Four);
        assert_eq!(WidthClass::for_len(u32::MAX as u64), WidthClass::Four);
        assert_eq!(WidthClass::for_len(1 << 32), WidthClass::Eight);
    }

    #[test]
    fn total_width_counts_itself() {
        assert_eq!(WidthClass::for_total(65_533), WidthClass::Two);
        assert_eq!(WidthClass::for_total(65_534), WidthClass::Four);
        assert_eq!(WidthClass::for_total(u32::MAX as u64 - 4), WidthClass::Four);
        assert_eq!(WidthClass::for_total(u32::MAX as u64 - 3), WidthClass::Eight);
    }

    #[test]
    fn preallocation_limit_rejects_oversized() {
        assert_eq!(checked_prealloc::<u64>(16, 128).unwrap(), 16);
        assert!(checked_prealloc::<u64>(17, 128).is_err());
    }

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn width_class_is_minimal(len in any::<u64>()) {
            let class = WidthClass::for_len(len);
            let bits = class.bytes() as u32 * 8;
            if bits < 64 {
                prop_assert!(len < 1u64 << bits);
            }
            if class != WidthClass::One {
                let narrower = WidthClass::from_bits(class.bits() - 1);
                prop_assert!(len >= 1u64 << (narrower.bytes() as u32 * 8));
            }
        }

        #[test]
        fn len_written_in_class_width(len in any::<u16>()) {
            let class = WidthClass::for_len(len as u64);
            let mut buf = Vec::new();
            class.write_len(&mut buf, len as u64).unwrap();
            prop_assert_eq!(buf.len(), class.bytes());
            prop_assert_eq!(class.read_len(&mut buf.as_slice()).unwrap(), len as u64);
        }
    }
}
