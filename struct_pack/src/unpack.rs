//! The read pass.
//!
//! Decoding mirrors [`Packer`](crate::pack::Packer): [`Unpack::unpack`] reads the base pass, and
//! [`Unpack::unpack_compatible`] is then called once per compatible version known to the reader.
//! A compatible field of a version the writer never knew is left empty; bytes written by a newer
//! writer past the known fields are skipped by trusting the embedded total length.
use {
    crate::{
        config::Config,
        error::{
            invalid_bool_encoding, invalid_value, signature_mismatch, type_literal_mismatch,
            ReadResult,
        },
        io::Reader,
        len::{checked_prealloc, WidthClass},
        signature::TypeDescription,
        size::varint_form,
        varint::{decode_varint, VarintForm},
    },
    log::{trace, warn},
};

const HAS_METAINFO_BIT: u32 = 1;
const TYPE_LITERAL_BIT: u8 = 0b100;
const COMPATIBLE_WIDTH_MASK: u8 = 0b11;
const LEN_WIDTH_SHIFT: u8 = 3;

/// Cursor over one encoded buffer.
pub struct Unpacker<'de> {
    reader: &'de [u8],
    input_len: usize,
    width: WidthClass,
    config: Config,
    form: VarintForm,
    inline: bool,
    compatible_end: usize,
    exhausted: bool,
}

impl<'de> Unpacker<'de> {
    /// Unpacker over a payload without header, reading lengths with `width`.
    pub fn new(input: &'de [u8], width: WidthClass, config: Config) -> Self {
        Self {
            reader: input,
            input_len: input.len(),
            width,
            config,
            form: varint_form(config),
            inline: false,
            compatible_end: input.len(),
            exhausted: false,
        }
    }

    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.input_len - self.reader.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Borrow the next `len` bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> ReadResult<&'de [u8]> {
        Ok(self.reader.borrow_exact(len)?)
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        Ok(self.reader.take_array()?)
    }

    /// A presence flag, success flag or variant index.
    #[inline]
    pub fn read_tag(&mut self) -> ReadResult<u8> {
        Ok(self.reader.take_byte()?)
    }

    #[inline]
    pub fn read_bool(&mut self) -> ReadResult<bool> {
        match self.read_tag()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(invalid_bool_encoding(byte)),
        }
    }

    /// The length prefix of a container of `T`, bounded by the preallocation limit.
    #[inline]
    pub fn read_len<T>(&mut self) -> ReadResult<usize> {
        let len = self.width.read_len(&mut self.reader)?;
        checked_prealloc::<T>(len, self.config.preallocation_limit())
    }

    /// A varint, before any zig-zag mapping.
    #[inline]
    pub fn read_varint(&mut self) -> ReadResult<u64> {
        decode_varint(&mut self.reader, self.form)
    }

    #[inline]
    pub fn skip_padding(&mut self, len: usize) -> ReadResult<()> {
        Ok(self.reader.consume(len)?)
    }

    #[inline]
    pub fn unpack<T: crate::Unpack>(&mut self) -> ReadResult<T> {
        T::unpack(self)
    }

    /// A presence flag followed by the value when present.
    #[inline]
    pub fn read_option<T: crate::Unpack>(&mut self) -> ReadResult<Option<T>> {
        if self.read_bool()? {
            Ok(Some(T::unpack(self)?))
        } else {
            Ok(None)
        }
    }

    /// Whether compatible fields are currently read inline with their enclosing value.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Run `f` with every compatible field it reaches read inline.
    pub fn inline<T>(&mut self, f: impl FnOnce(&mut Self) -> ReadResult<T>) -> ReadResult<T> {
        let saved = core::mem::replace(&mut self.inline, true);
        let result = f(self);
        self.inline = saved;
        result
    }

    /// Read the payload of a compatible field during the versioned pass of its version.
    ///
    /// Returns `None` once the writer's compatible data is exhausted.
    pub fn compatible_payload<T: crate::Unpack>(&mut self) -> ReadResult<Option<T>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.position() >= self.compatible_end {
            trace!(
                "compatible data exhausted at {} of {}",
                self.position(),
                self.compatible_end
            );
            self.exhausted = true;
            return Ok(None);
        }
        self.inline(Self::read_option::<T>)
    }

    /// Check the header against `description` and prepare the payload width.
    ///
    /// Returns the embedded total length when compatible fields were written.
    pub fn read_header(&mut self, description: &TypeDescription) -> ReadResult<Option<u64>> {
        if !self.config.metainfo_enabled() {
            self.width = WidthClass::Eight;
            self.compatible_end = self.input_len;
            return Ok(None);
        }

        let found = u32::from_le_bytes(self.read_array()?);
        let expected = description.signature();
        if found >> 1 != expected >> 1 {
            warn!(
                "type signature mismatch: expected {:#010x}, found {:#010x}",
                expected & !HAS_METAINFO_BIT,
                found & !HAS_METAINFO_BIT
            );
            return Err(signature_mismatch(
                expected & !HAS_METAINFO_BIT,
                found & !HAS_METAINFO_BIT,
            ));
        }

        self.width = WidthClass::One;
        self.compatible_end = 0;
        if found & HAS_METAINFO_BIT == 0 {
            return Ok(None);
        }

        let metainfo = self.read_tag()?;
        self.width = WidthClass::from_bits(metainfo >> LEN_WIDTH_SHIFT);

        let mut total = None;
        if metainfo & COMPATIBLE_WIDTH_MASK != 0 {
            let len = WidthClass::from_bits(metainfo).read_len(&mut self.reader)?;
            if len > self.input_len as u64 {
                return Err(invalid_value("compatible length exceeds the input"));
            }
            self.compatible_end = len as usize;
            total = Some(len);
        }

        if metainfo & TYPE_LITERAL_BIT != 0 {
            let literal = description.literal();
            let embedded = self.read_bytes(literal.len())?;
            let nul = self.read_tag()?;
            if embedded != literal || nul != 0 {
                warn!("embedded type literal does not match the expected type");
                return Err(type_literal_mismatch());
            }
        }
        Ok(total)
    }
}

/// Decode one `T` from the start of `input`.
///
/// Returns the value and the number of bytes it occupies.
pub fn unpack_from<T: crate::Unpack>(input: &[u8], config: Config) -> ReadResult<(T, usize)> {
    let description = TypeDescription::cached::<T>(config);
    let mut unpacker = Unpacker::new(input, WidthClass::One, config);
    let total = unpacker.read_header(&description)?;
    let mut value = T::unpack(&mut unpacker)?;
    for &version in description.versions() {
        value.unpack_compatible(&mut unpacker, version)?;
    }
    let consumed = match total {
        // A newer writer may have appended versions this type does not know.
        Some(total) => total as usize,
        None => unpacker.position(),
    };
    Ok((value, consumed))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::ReadError, pack::pack_into, proptest_config::proptest_cfg, schema::Compatible,
        },
        proptest::prelude::*,
    };

    fn pack<T: crate::Pack + ?Sized>(value: &T, config: Config) -> Vec<u8> {
        let mut buf = Vec::new();
        pack_into(&mut buf, value, config).unwrap();
        buf
    }

    #[test]
    fn header_rejects_foreign_signature() {
        let bytes = pack(&1u32, Config::DEFAULT);
        let result = unpack_from::<i32>(&bytes, Config::DEFAULT);
        assert!(matches!(result, Err(ReadError::SignatureMismatch { .. })));
    }

    #[test]
    fn header_ignores_metainfo_bit_when_comparing() {
        let narrow = pack(&vec![1u8; 3], Config::DEFAULT);
        let wide = pack(&vec![1u8; 300], Config::DEFAULT);
        assert_eq!(narrow[0] & 1, 0);
        assert_eq!(wide[0] & 1, 1);
        assert_eq!(
            u32::from_le_bytes(narrow[..4].try_into().unwrap()) >> 1,
            u32::from_le_bytes(wide[..4].try_into().unwrap()) >> 1
        );
        let (value, consumed) = unpack_from::<Vec<u8>>(&wide, Config::DEFAULT).unwrap();
        assert_eq!(value.len(), 300);
        assert_eq!(consumed, wide.len());
    }

    #[test]
    fn embedded_literal_is_checked() {
        let mut bytes = pack(&7u16, Config::ENABLE_TYPE_INFO);
        assert_eq!(unpack_from::<u16>(&bytes, Config::DEFAULT).unwrap().0, 7);
        bytes[5] = crate::signature::code::I16;
        assert!(matches!(
            unpack_from::<u16>(&bytes, Config::DEFAULT),
            Err(ReadError::TypeLiteralMismatch)
        ));
    }

    #[test]
    fn older_writer_leaves_compatible_empty() {
        let bytes = pack(&5i32, Config::DEFAULT);
        let mut unpacker = Unpacker::new(&bytes, WidthClass::One, Config::DEFAULT);
        let total = unpacker
            .read_header(&TypeDescription::of::<i32>(Config::DEFAULT))
            .unwrap();
        assert_eq!(total, None);
        assert_eq!(unpacker.unpack::<i32>().unwrap(), 5);
        assert_eq!(unpacker.compatible_payload::<u8>().unwrap(), None);
        assert_eq!(unpacker.compatible_payload::<u8>().unwrap(), None);
        assert_eq!(unpacker.position(), bytes.len());
    }

    #[test]
    fn compatible_round_trip_consumes_total() {
        let value = (3i32, Compatible::<String, 1>::new("x".into()));
        let bytes = pack(&value, Config::DEFAULT);
        let (decoded, consumed) =
            unpack_from::<(i32, Compatible<String, 1>)>(&bytes, Config::DEFAULT).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn truncated_input_is_an_error() {
        let bytes = pack(&(1u64, String::from("hello")), Config::DEFAULT);
        for end in 0..bytes.len() {
            assert!(unpack_from::<(u64, String)>(&bytes[..end], Config::DEFAULT).is_err());
        }
    }

    #[test]
    fn preallocation_limit_is_enforced() {
        let bytes = pack(&vec![0u64; 64], Config::DEFAULT);
        let config = Config::DEFAULT.with_preallocation_limit(64);
        assert!(matches!(
            unpack_from::<Vec<u64>>(&bytes, config),
            Err(ReadError::PreallocationSizeLimit { .. })
        ));
    }

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn consumed_matches_written(value in any::<(u32, Vec<u16>, Option<String>)>()) {
            let bytes = pack(&value, Config::DEFAULT);
            let (decoded, consumed) =
                unpack_from::<(u32, Vec<u16>, Option<String>)>(&bytes, Config::DEFAULT).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, bytes.len());
        }
    }
}
