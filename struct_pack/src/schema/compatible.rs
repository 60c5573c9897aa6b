use {
    crate::{
        error::ReadResult,
        schema::{Pack, Unpack, Visitor},
        signature::Describe,
        unpack::Unpacker,
    },
    core::ops::{Deref, DerefMut},
};

/// An optional field added in version `V` of a type.
///
/// Compatible fields are not part of the type literal, so adding one keeps the signature of the
/// enclosing type. They are written after every non-versioned field, grouped by version:
/// - a reader that predates `V` skips them;
/// - a reader that knows `V` but decodes data from a writer that did not leaves them `None`.
///
/// Versions only ever grow: a field added later must carry a greater `V` than every existing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Compatible<T, const V: u64>(pub Option<T>);

impl<T, const V: u64> Compatible<T, V> {
    pub const VERSION: u64 = V;

    #[inline]
    pub const fn new(value: T) -> Self {
        Self(Some(value))
    }

    #[inline]
    pub const fn none() -> Self {
        Self(None)
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T, const V: u64> Default for Compatible<T, V> {
    #[inline]
    fn default() -> Self {
        Self(None)
    }
}

impl<T, const V: u64> From<Option<T>> for Compatible<T, V> {
    #[inline]
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T, const V: u64> Deref for Compatible<T, V> {
    type Target = Option<T>;

    #[inline]
    fn deref(&self) -> &Option<T> {
        &self.0
    }
}

impl<T, const V: u64> DerefMut for Compatible<T, V> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Option<T> {
        &mut self.0
    }
}

// SAFETY: the size depends on the pass, so the type is always dynamic.
unsafe impl<T: Pack, const V: u64> Pack for Compatible<T, V> {
    fn describe(d: &mut Describe) {
        d.compatible(V);
    }

    #[inline]
    fn visit<W: Visitor>(&self, v: &mut W) -> Result<(), W::Error> {
        v.compatible(V, self.0.as_ref())
    }
}

impl<T: Unpack, const V: u64> Unpack for Compatible<T, V> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        if u.is_inline() {
            return Ok(Self(u.read_option()?));
        }
        Ok(Self(None))
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        if version == V {
            self.0 = u.compatible_payload()?;
        }
        Ok(())
    }
}
