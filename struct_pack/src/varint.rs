//! Variable-width integer primitives.
//!
//! Two wire forms are supported:
//! - [`VarintForm::Leb128`]: seven payload bits per byte, high bit set on every byte but the last.
//! - [`VarintForm::Fast`]: values up to 250 take one byte, larger values are a tag byte
//!   (251, 252, 253) followed by a little-endian `u16`, `u32` or `u64`.
//!
//! Signed values are zig-zag mapped onto their unsigned counterpart first.
use {
    crate::{
        error::{invalid_tag_encoding, varint_overflow, ReadResult, WriteResult},
        io::{Reader, Writer},
    },
    pastey::paste,
};

const SINGLE_BYTE_MAX: u8 = 250;
const U16_BYTE: u8 = 251;
const U32_BYTE: u8 = 252;
const U64_BYTE: u8 = 253;

const LEB128_MAX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarintForm {
    #[default]
    Leb128,
    Fast,
}

/// Encoded length of `value`.
#[inline]
pub const fn varint_size(value: u64, form: VarintForm) -> usize {
    match form {
        VarintForm::Leb128 => {
            let bits = 64 - (value | 1).leading_zeros() as usize;
            bits.div_ceil(7)
        }
        VarintForm::Fast => {
            if value <= SINGLE_BYTE_MAX as u64 {
                1
            } else if value <= u16::MAX as u64 {
                3
            } else if value <= u32::MAX as u64 {
                5
            } else {
                9
            }
        }
    }
}

#[inline]
pub fn encode_varint(
    writer: &mut (impl Writer + ?Sized),
    mut value: u64,
    form: VarintForm,
) -> WriteResult<()> {
    match form {
        VarintForm::Leb128 => {
            let mut buf = [0u8; LEB128_MAX_LEN];
            let mut len = 0;
            loop {
                let byte = (value & 0x7f) as u8;
                value >>= 7;
                if value == 0 {
                    buf[len] = byte;
                    len += 1;
                    break;
                }
                buf[len] = byte | 0x80;
                len += 1;
            }
            writer.write(&buf[..len])?;
        }
        VarintForm::Fast => {
            if value <= SINGLE_BYTE_MAX as u64 {
                writer.write(&[value as u8])?;
            } else if value <= u16::MAX as u64 {
                writer.write(&[U16_BYTE])?;
                writer.write(&(value as u16).to_le_bytes())?;
            } else if value <= u32::MAX as u64 {
                writer.write(&[U32_BYTE])?;
                writer.write(&(value as u32).to_le_bytes())?;
            } else {
                writer.write(&[U64_BYTE])?;
                writer.write(&value.to_le_bytes())?;
            }
        }
    }
    Ok(())
}

#[inline]
pub fn decode_varint<'de>(reader: &mut impl Reader<'de>, form: VarintForm) -> ReadResult<u64> {
    match form {
        VarintForm::Leb128 => {
            let mut value = 0u64;
            for i in 0..LEB128_MAX_LEN {
                let byte = reader.take_byte()?;
                let payload = (byte & 0x7f) as u64;
                let shift = i * 7;
                // The tenth byte may only carry the top bit of a u64.
                if i == LEB128_MAX_LEN - 1 && payload > 1 {
                    return Err(varint_overflow());
                }
                value |= payload << shift;
                if byte & 0x80 == 0 {
                    return Ok(value);
                }
            }
            Err(varint_overflow())
        }
        VarintForm::Fast => match reader.take_byte()? {
            byte @ 0..=SINGLE_BYTE_MAX => Ok(byte as u64),
            U16_BYTE => Ok(u16::from_le_bytes(reader.take_array()?) as u64),
            U32_BYTE => Ok(u32::from_le_bytes(reader.take_array()?) as u64),
            U64_BYTE => Ok(u64::from_le_bytes(reader.take_array()?)),
            tag => Err(invalid_tag_encoding(tag as usize)),
        },
    }
}

/// Map a signed value onto an unsigned one so that small magnitudes stay small.
#[inline]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

macro_rules! varint_unsigned {
    ($($ty:ty),*) => {
        paste! {
            $(
                #[inline]
                pub const fn [<size_of_ $ty>](value: $ty, form: VarintForm) -> usize {
                    varint_size(value as u64, form)
                }

                #[inline]
                pub fn [<encode_ $ty>](
                    writer: &mut (impl Writer + ?Sized),
                    value: $ty,
                    form: VarintForm,
                ) -> WriteResult<()> {
                    encode_varint(writer, value as u64, form)
                }

                #[inline]
                pub fn [<decode_ $ty>]<'de>(
                    reader: &mut impl Reader<'de>,
                    form: VarintForm,
                ) -> ReadResult<$ty> {
                    <$ty>::try_from(decode_varint(reader, form)?).map_err(|_| varint_overflow())
                }
            )*
        }
    };
}

macro_rules! varint_signed {
    ($($ty:ty),*) => {
        paste! {
            $(
                #[inline]
                pub const fn [<size_of_ $ty>](value: $ty, form: VarintForm) -> usize {
                    varint_size(zigzag_encode(value as i64), form)
                }

                #[inline]
                pub fn [<encode_ $ty>](
                    writer: &mut (impl Writer + ?Sized),
                    value: $ty,
                    form: VarintForm,
                ) -> WriteResult<()> {
                    encode_varint(writer, zigzag_encode(value as i64), form)
                }

                #[inline]
                pub fn [<decode_ $ty>]<'de>(
                    reader: &mut impl Reader<'de>,
                    form: VarintForm,
                ) -> ReadResult<$ty> {
                    let value = zigzag_decode(decode_varint(reader, form)?);
                    <$ty>::try_from(value).map_err(|_| varint_overflow())
                }
            )*
        }
    };
}

varint_unsigned!(u32, u64);
varint_signed!(i32, i64);
