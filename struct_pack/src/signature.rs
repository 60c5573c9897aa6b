//! Type literals and the 32-bit type signature.
//!
//! Every [`Pack`] type describes itself as a sequence of type codes (its *type literal*). The
//! literal commits to the exact order and kind of every field, and its MD5 digest, truncated to 32
//! bits, is the signature placed at the head of every encoded buffer.
//!
//! Compatible fields contribute nothing to the literal, so adding one keeps the signature stable.
//! They contribute their version number instead, which decides how many versioned passes the
//! packer runs.
use {
    crate::{config::Config, schema::Pack, util::non_static_type_id},
    alloc::{sync::Arc, vec::Vec},
    core::any::TypeId,
    md5::{Digest, Md5},
};

/// One-byte type codes used in type literals.
pub mod code {
    pub const I32: u8 = 1;
    pub const U32: u8 = 2;
    pub const I64: u8 = 3;
    pub const U64: u8 = 4;
    pub const I8: u8 = 5;
    pub const U8: u8 = 6;
    pub const I16: u8 = 7;
    pub const U16: u8 = 8;
    pub const I128: u8 = 9;
    pub const U128: u8 = 10;
    pub const BOOL: u8 = 11;
    pub const CHAR8: u8 = 12;
    pub const CHAR: u8 = 14;
    pub const F32: u8 = 17;
    pub const F64: u8 = 18;
    pub const VARINT_I32: u8 = 20;
    pub const VARINT_I64: u8 = 21;
    pub const VARINT_U32: u8 = 22;
    pub const VARINT_U64: u8 = 23;
    pub const STRING: u8 = 128;
    pub const ARRAY: u8 = 129;
    pub const MAP: u8 = 130;
    pub const SET: u8 = 131;
    pub const CONTAINER: u8 = 132;
    pub const OPTIONAL: u8 = 133;
    pub const VARIANT: u8 = 134;
    pub const EXPECTED: u8 = 135;
    pub const POLYMORPHIC: u8 = 249;
    pub const MONOSTATE: u8 = 250;
    pub const CIRCLE: u8 = 251;
    pub const FAST_VARINT: u8 = 252;
    pub const STRUCT: u8 = 253;
    pub const TUPLE: u8 = 254;
    pub const END: u8 = 255;
}

/// Builder passed to [`Pack::describe`].
///
/// Keeps the chain of enclosing types so that recursive types terminate with a back-reference
/// instead of recursing forever.
pub struct Describe {
    literal: Vec<u8>,
    versions: Vec<u64>,
    parents: Vec<TypeId>,
    config: Config,
    saw_varint: bool,
}

impl Describe {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            literal: Vec::new(),
            versions: Vec::new(),
            parents: Vec::new(),
            config,
            saw_varint: false,
        }
    }

    /// Append a raw type code.
    #[inline]
    pub fn code(&mut self, code: u8) {
        self.literal.push(code);
    }

    /// Append the code of a 32 or 64 bit integer.
    ///
    /// Under [`Config::ENCODING_WITH_VARINT`] the varint code is used instead, so buffers written
    /// with different integer encodings never share a signature.
    #[inline]
    pub fn integer(&mut self, fixed: u8, varint: u8) {
        if self.config.varint_integers() {
            self.varint(varint);
        } else {
            self.code(fixed);
        }
    }

    /// Append the code of a varint field.
    #[inline]
    pub fn varint(&mut self, code: u8) {
        self.saw_varint = true;
        self.code(code);
    }

    /// Append `size` as base-127 digits, least significant first, the last digit tagged with the
    /// high bit.
    pub fn size_literal(&mut self, mut size: usize) {
        loop {
            let digit = (size % 127) as u8;
            size /= 127;
            if size == 0 {
                self.code(digit | 0x80);
                return;
            }
            self.code(digit);
        }
    }

    /// Describe a nested type.
    ///
    /// If `T` already encloses the current position, a back-reference to it is emitted instead.
    pub fn describe<T: Pack + ?Sized>(&mut self) {
        let id = non_static_type_id::<T>();
        if let Some(depth) = self.parents.iter().rev().rposition(|parent| *parent == id) {
            self.code(code::CIRCLE);
            self.size_literal(depth);
            return;
        }
        self.parents.push(id);
        T::describe(self);
        self.parents.pop();
    }

    /// Record a compatible field added in `version`.
    ///
    /// Only the version is recorded; the payload type is not part of the literal. Compatible
    /// fields nested inside a compatible payload are never reached, they travel inline with that
    /// payload and open no pass of their own.
    #[inline]
    pub fn compatible(&mut self, version: u64) {
        self.versions.push(version);
    }

    pub(crate) fn finish(mut self) -> TypeDescription {
        if self.saw_varint && self.config.fast_varint() {
            self.literal.push(code::FAST_VARINT);
        }
        self.versions.sort_unstable();
        self.versions.dedup();
        TypeDescription {
            signature: type_signature(&self.literal),
            literal: self.literal,
            versions: self.versions,
        }
    }
}

/// The static description of a type under one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    literal: Vec<u8>,
    versions: Vec<u64>,
    signature: u32,
}

impl TypeDescription {
    /// Describe `T` from scratch.
    pub fn of<T: Pack + ?Sized>(config: Config) -> Self {
        let mut describe = Describe::new(config);
        describe.describe::<T>();
        describe.finish()
    }

    /// The description of `T` under `config`, built once per process and shared afterwards.
    #[inline]
    pub fn cached<T: Pack + ?Sized>(config: Config) -> Arc<Self> {
        cache::get_or_describe::<T>(config)
    }

    /// The type literal, without the trailing NUL used on the wire.
    #[inline]
    pub fn literal(&self) -> &[u8] {
        &self.literal
    }

    /// Distinct compatible versions, ascending.
    #[inline]
    pub fn versions(&self) -> &[u64] {
        &self.versions
    }

    #[inline]
    pub fn has_compatible(&self) -> bool {
        !self.versions.is_empty()
    }

    /// 32-bit signature of the literal.
    #[inline]
    pub fn signature(&self) -> u32 {
        self.signature
    }
}

#[cfg(feature = "std")]
mod cache {
    use {
        super::*,
        std::{
            collections::HashMap,
            sync::{OnceLock, PoisonError, RwLock},
        },
    };

    /// Keyed by type and the config flags, which decide the integer codes of the literal.
    type Cache = HashMap<(TypeId, u8), Arc<TypeDescription>>;

    fn cache() -> &'static RwLock<Cache> {
        static CACHE: OnceLock<RwLock<Cache>> = OnceLock::new();
        CACHE.get_or_init(Default::default)
    }

    pub(super) fn get_or_describe<T: Pack + ?Sized>(config: Config) -> Arc<TypeDescription> {
        let key = (non_static_type_id::<T>(), config.bits());
        if let Some(description) = cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(description);
        }
        // Described outside the lock; a racing thread at worst describes the type twice.
        let description = Arc::new(TypeDescription::of::<T>(config));
        Arc::clone(
            cache()
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert(description),
        )
    }
}

#[cfg(not(feature = "std"))]
mod cache {
    use super::*;

    pub(super) fn get_or_describe<T: Pack + ?Sized>(config: Config) -> Arc<TypeDescription> {
        Arc::new(TypeDescription::of::<T>(config))
    }
}

/// MD5 of `literal`, first four digest bytes read big-endian.
pub fn type_signature(literal: &[u8]) -> u32 {
    let digest = Md5::digest(literal);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Signature of `T` under the default configuration.
///
/// The low bit is not part of the type identity: on the wire it flags a following metainfo byte.
pub fn get_type_code<T: Pack + ?Sized>() -> u32 {
    TypeDescription::cached::<T>(Config::DEFAULT).signature()
}

/// Type literal of `T` under the default configuration.
pub fn get_type_literal<T: Pack + ?Sized>() -> Vec<u8> {
    TypeDescription::cached::<T>(Config::DEFAULT).literal().to_vec()
}
