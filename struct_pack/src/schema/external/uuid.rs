use {
    crate::{
        schema::{Pack, TypeMeta, Unpack, Visitor},
        signature::Describe,
        unpack::Unpacker,
        ReadResult,
    },
    uuid::Uuid,
};

// SAFETY: `Uuid` is a `#[repr(transparent)]` newtype over `uuid::Bytes` (`[u8; 16]`), which is
// exactly its encoding.
unsafe impl Pack for Uuid {
    const TYPE_META: TypeMeta = TypeMeta::Static {
        size: size_of::<Uuid>(),
        trivial: true,
    };

    #[inline]
    fn describe(d: &mut Describe) {
        <uuid::Bytes>::describe(d);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.scalar(self.as_bytes())
    }
}

impl Unpack for Uuid {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        Ok(Uuid::from_bytes(u.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            deserialize, get_type_literal, proptest_config::proptest_cfg, serialize,
            signature::code,
        },
        proptest::prelude::*,
        uuid::{Bytes, Uuid},
    };

    #[test]
    fn test_uuid_literal_is_byte_array() {
        assert_eq!(
            get_type_literal::<Uuid>(),
            [code::ARRAY, code::U8, 16 | 0x80]
        );
    }

    #[test]
    fn test_uuid_roundtrip() {
        proptest!(proptest_cfg(), |(value: Bytes)| {
            let uuid = Uuid::from_bytes(value);
            let serialized = serialize(&uuid).unwrap();
            prop_assert_eq!(serialized.len(), 4 + 16);
            let deserialized: Uuid = deserialize(&serialized).unwrap();
            prop_assert_eq!(uuid, deserialized);
        });
    }

    #[test]
    fn test_uuid_roundtrip_in_sequence() {
        proptest!(proptest_cfg(), |(value: Vec<Bytes>)| {
            let uuids = value.into_iter().map(Uuid::from_bytes).collect::<Vec<_>>();
            let serialized = serialize(&uuids).unwrap();
            let deserialized: Vec<Uuid> = deserialize(&serialized).unwrap();
            prop_assert_eq!(uuids, deserialized);
        });
    }
}
