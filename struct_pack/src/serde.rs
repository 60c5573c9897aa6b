use {
    crate::{
        config::Config,
        error::{ReadResult, WriteResult},
        io::Writer,
        pack::{pack_into, pack_with_plan, plan_for},
        plan::BufferPlan,
        schema::{FieldAt, Pack, Unpack},
        signature::TypeDescription,
        unpack::unpack_from,
    },
    alloc::vec::Vec,
};

/// Helper over [`Pack`] for the common encode entry points.
///
/// ```
/// # use struct_pack::Serialize;
/// let bytes = vec![1u16, 2, 3].serialize().unwrap();
/// assert_eq!(bytes.len() as u64, vec![1u16, 2, 3].serialized_size());
/// ```
pub trait Serialize: Pack {
    /// Serialize into a new `Vec` of exactly the planned length.
    #[inline]
    fn serialize(&self) -> WriteResult<Vec<u8>> {
        serialize_with_config(self, Config::DEFAULT)
    }

    /// Serialize into `dst` under `config`.
    #[inline]
    fn serialize_into(&self, dst: &mut impl Writer, config: Config) -> WriteResult<()> {
        pack_into(dst, self, config)?;
        Ok(())
    }

    /// Encoded length under the default configuration.
    #[inline]
    fn serialized_size(&self) -> u64 {
        plan(self, Config::DEFAULT).length
    }
}

impl<T> Serialize for T where T: Pack + ?Sized {}

/// Helper over [`Unpack`] for the common decode entry points.
pub trait Deserialize: Unpack {
    #[inline]
    fn deserialize(src: &[u8]) -> ReadResult<Self> {
        deserialize_with_config(src, Config::DEFAULT)
    }

    /// Decode `src` under `config`, returning the value and its encoded length.
    #[inline]
    fn deserialize_from(src: &[u8], config: Config) -> ReadResult<(Self, usize)> {
        unpack_from(src, config)
    }
}

impl<T> Deserialize for T where T: Unpack {}

#[inline]
fn plan<T: Pack + ?Sized>(value: &T, config: Config) -> BufferPlan {
    plan_for(value, &TypeDescription::cached::<T>(config), config)
}

/// Serialize `value` under the default configuration.
///
/// ```
/// let bytes = struct_pack::serialize(&(10i32, String::from("tom"))).unwrap();
/// let (id, name): (i32, String) = struct_pack::deserialize(&bytes).unwrap();
/// assert_eq!((id, name.as_str()), (10, "tom"));
/// ```
#[inline]
pub fn serialize<T: Pack + ?Sized>(value: &T) -> WriteResult<Vec<u8>> {
    serialize_with_config(value, Config::DEFAULT)
}

/// Serialize `value` under `config`.
pub fn serialize_with_config<T: Pack + ?Sized>(value: &T, config: Config) -> WriteResult<Vec<u8>> {
    let mut buffer = Vec::new();
    serialize_to_with_config(&mut buffer, value, config)?;
    Ok(buffer)
}

/// Append the encoding of `value` to `buffer`.
///
/// On failure `buffer` is restored to its previous length.
#[inline]
pub fn serialize_to<T: Pack + ?Sized>(buffer: &mut Vec<u8>, value: &T) -> WriteResult<()> {
    serialize_to_with_config(buffer, value, Config::DEFAULT)
}

/// [`serialize_to`] under `config`.
pub fn serialize_to_with_config<T: Pack + ?Sized>(
    buffer: &mut Vec<u8>,
    value: &T,
    config: Config,
) -> WriteResult<()> {
    let description = TypeDescription::cached::<T>(config);
    let plan = plan_for(value, &description, config);
    let start = buffer.len();
    buffer.reserve(plan.length as usize);
    if let Err(error) = pack_with_plan(buffer, value, &description, plan, config) {
        buffer.truncate(start);
        return Err(error);
    }
    debug_assert_eq!((buffer.len() - start) as u64, plan.length);
    Ok(())
}

/// Serialize `value` after `offset` zeroed bytes reserved for the caller.
#[inline]
pub fn serialize_with_offset<T: Pack + ?Sized>(offset: usize, value: &T) -> WriteResult<Vec<u8>> {
    let mut buffer = alloc::vec![0; offset];
    serialize_to(&mut buffer, value)?;
    Ok(buffer)
}

/// Serialize `value` into any [`Writer`] under `config`.
#[inline]
pub fn serialize_into<T: Pack + ?Sized>(
    dst: &mut impl Writer,
    value: &T,
    config: Config,
) -> WriteResult<()> {
    pack_into(dst, value, config)?;
    Ok(())
}

/// Exact encoded length of `value` under the default configuration.
#[inline]
pub fn get_needed_size<T: Pack + ?Sized>(value: &T) -> usize {
    get_needed_size_with_config(value, Config::DEFAULT)
}

#[inline]
pub fn get_needed_size_with_config<T: Pack + ?Sized>(value: &T, config: Config) -> usize {
    plan(value, config).length as usize
}

/// Deserialize a `T` from the start of `src` under the default configuration.
///
/// Bytes past the encoded value are ignored.
#[inline]
pub fn deserialize<T: Unpack>(src: &[u8]) -> ReadResult<T> {
    deserialize_with_config(src, Config::DEFAULT)
}

#[inline]
pub fn deserialize_with_config<T: Unpack>(src: &[u8], config: Config) -> ReadResult<T> {
    Ok(unpack_from(src, config)?.0)
}

/// Deserialize a `T` starting at `*offset`, advancing `offset` past it.
///
/// Consecutive values serialized into one buffer are read back by repeated calls.
pub fn deserialize_with_offset<T: Unpack>(src: &[u8], offset: &mut usize) -> ReadResult<T> {
    let rest = src
        .get(*offset..)
        .ok_or(crate::io::ReadError::ReadSizeLimit(*offset))?;
    let (value, consumed) = unpack_from(rest, Config::DEFAULT)?;
    *offset += consumed;
    Ok(value)
}

/// Deserialize into an existing `T`, leaving it untouched on failure.
#[inline]
pub fn deserialize_to<T: Unpack>(dst: &mut T, src: &[u8]) -> ReadResult<()> {
    *dst = deserialize(src)?;
    Ok(())
}

/// Decode field `I` of a derived struct.
///
/// The signature of the whole struct is checked, then the struct is decoded and the field taken.
///
/// ```
/// # #[cfg(feature = "derive")] {
/// # use struct_pack::{Pack, Unpack};
/// #[derive(Pack, Unpack)]
/// struct Person {
///     id: i32,
///     name: String,
/// }
///
/// let bytes = struct_pack::serialize(&Person { id: 10, name: "tom".into() }).unwrap();
/// let name = struct_pack::get_field::<Person, 1>(&bytes).unwrap();
/// assert_eq!(name, "tom");
/// # }
/// ```
#[inline]
pub fn get_field<T, const I: usize>(src: &[u8]) -> ReadResult<<T as FieldAt<I>>::Type>
where
    T: FieldAt<I>,
{
    Ok(deserialize::<T>(src)?.into_field())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::ReadError, proptest_config::proptest_cfg, schema::Compatible},
        proptest::prelude::*,
    };

    #[test]
    fn serialize_to_appends() {
        let mut buffer = vec![0xaa];
        serialize_to(&mut buffer, &7u8).unwrap();
        assert_eq!(buffer.len(), 1 + 4 + 1);
        assert_eq!(buffer[0], 0xaa);
        assert_eq!(deserialize::<u8>(&buffer[1..]).unwrap(), 7);
    }

    #[test]
    fn offset_round_trip() {
        let mut buffer = serialize_with_offset(3, &String::from("abc")).unwrap();
        assert_eq!(&buffer[..3], &[0, 0, 0]);
        serialize_to(&mut buffer, &(1u8, 2u64)).unwrap();
        let mut offset = 3;
        assert_eq!(deserialize_with_offset::<String>(&buffer, &mut offset).unwrap(), "abc");
        assert_eq!(offset, 3 + 4 + 1 + 3);
        assert_eq!(
            deserialize_with_offset::<(u8, u64)>(&buffer, &mut offset).unwrap(),
            (1, 2)
        );
        assert_eq!(offset, buffer.len());
        assert!(deserialize_with_offset::<u8>(&buffer, &mut offset).is_err());
    }

    #[test]
    fn offset_advances_by_compatible_total() {
        let value = (1u16, Compatible::<u32, 1>::new(9));
        let mut buffer = serialize(&value).unwrap();
        serialize_to(&mut buffer, &5u8).unwrap();
        let mut offset = 0;
        assert_eq!(
            deserialize_with_offset::<(u16, Compatible<u32, 1>)>(&buffer, &mut offset).unwrap(),
            value
        );
        assert_eq!(deserialize_with_offset::<u8>(&buffer, &mut offset).unwrap(), 5);
    }

    #[test]
    fn deserialize_to_leaves_target_on_error() {
        let mut target = 9u32;
        assert!(matches!(
            deserialize_to(&mut target, &serialize(&1u64).unwrap()),
            Err(ReadError::SignatureMismatch { .. })
        ));
        assert_eq!(target, 9);
        deserialize_to(&mut target, &serialize(&1u32).unwrap()).unwrap();
        assert_eq!(target, 1);
    }

    #[test]
    fn io_writer_sink() {
        let mut sink = crate::io::IoWriter(std::io::Cursor::new(Vec::new()));
        serialize_into(&mut sink, &[1u8, 2, 3], Config::DEFAULT).unwrap();
        let bytes = sink.0.into_inner();
        assert_eq!(deserialize::<[u8; 3]>(&bytes).unwrap(), [1, 2, 3]);
    }

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn needed_size_is_exact(value in any::<(Vec<String>, Option<i64>, [u8; 7])>(), bits in 0u8..16) {
            let config = Config::from_bits(bits);
            let bytes = serialize_with_config(&value, config).unwrap();
            prop_assert_eq!(get_needed_size_with_config(&value, config), bytes.len());
            prop_assert_eq!(deserialize_with_config::<(Vec<String>, Option<i64>, [u8; 7])>(&bytes, config).unwrap(), value);
        }
    }
}
