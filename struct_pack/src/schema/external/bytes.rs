use {
    crate::{
        schema::{visit_slice, Pack, Unpack, Visitor},
        signature::Describe,
        unpack::Unpacker,
        ReadResult,
    },
    alloc::boxed::Box,
    bytes::{Bytes, BytesMut},
};

// SAFETY: the encoding of `[u8]`.
unsafe impl Pack for Bytes {
    fn describe(d: &mut Describe) {
        <[u8]>::describe(d);
    }

    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_slice(v, self.as_ref())
    }
}

impl Unpack for Bytes {
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        // Box<[u8]> is closest to native representation of Bytes and avoids a second copy.
        Ok(Self::from(<Box<[u8]>>::unpack(u)?))
    }
}

// SAFETY: the encoding of `[u8]`.
unsafe impl Pack for BytesMut {
    fn describe(d: &mut Describe) {
        <[u8]>::describe(d);
    }

    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_slice(v, self.as_ref())
    }
}

impl Unpack for BytesMut {
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        // Bytes uniquely owning its buffer converts without a copy.
        Ok(Self::from(Bytes::unpack(u)?))
    }
}
