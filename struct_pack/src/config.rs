//! Call-time configuration for struct_pack.
//!
//! A [`Config`] is a small set of flags consumed by the resolver, the packer and the unpacker.
//! Flags combine with `|`:
//!
//! ```
//! # use struct_pack::config::Config;
//! let config = Config::ENABLE_TYPE_INFO | Config::ENCODING_WITH_VARINT;
//! assert!(config.type_literal_enabled());
//! assert!(config.varint_integers());
//! ```
use {
    crate::len::DEFAULT_PREALLOCATION_SIZE_LIMIT,
    core::ops::{BitOr, BitOrAssign},
};

const TYPE_INFO_MASK: u8 = 0b11;
const FLAGS_MASK: u8 = 0b1111;

/// Encoding flags plus the decode-side preallocation limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    flags: u8,
    preallocation_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Config {
    /// Signature header, metainfo only when needed, no type literal.
    pub const DEFAULT: Self = Self::from_bits(0);
    /// Never embed the type literal.
    pub const DISABLE_TYPE_INFO: Self = Self::from_bits(0b01);
    /// Embed the type literal after the metainfo byte.
    pub const ENABLE_TYPE_INFO: Self = Self::from_bits(0b10);
    /// Omit the signature header and the metainfo byte entirely.
    ///
    /// Without a metainfo byte the length width cannot be recorded, so every length prefix uses
    /// the eight byte class.
    pub const DISABLE_ALL_META_INFO: Self = Self::from_bits(0b11);
    /// Encode every 32 and 64 bit integer as a varint.
    pub const ENCODING_WITH_VARINT: Self = Self::from_bits(0b100);
    /// Use the tag-prefixed varint form instead of LEB128.
    pub const USE_FAST_VARINT: Self = Self::from_bits(0b1000);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            flags: bits & FLAGS_MASK,
            preallocation_limit: DEFAULT_PREALLOCATION_SIZE_LIMIT,
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.flags
    }

    /// Combine the flags of `self` and `other`, keeping the preallocation limit of `self`.
    #[inline]
    pub const fn with(self, other: Self) -> Self {
        Self {
            flags: self.flags | other.flags,
            preallocation_limit: self.preallocation_limit,
        }
    }

    /// Limit, in bytes, of what a single decoded length may preallocate.
    #[inline]
    pub const fn with_preallocation_limit(self, limit: usize) -> Self {
        Self {
            flags: self.flags,
            preallocation_limit: limit,
        }
    }

    #[inline]
    pub const fn preallocation_limit(self) -> usize {
        self.preallocation_limit
    }

    /// Whether the signature header (and the metainfo byte when needed) is emitted.
    #[inline]
    pub const fn metainfo_enabled(self) -> bool {
        self.flags & TYPE_INFO_MASK != DISABLE_ALL_BITS
    }

    #[inline]
    pub const fn type_literal_enabled(self) -> bool {
        self.flags & TYPE_INFO_MASK == ENABLE_TYPE_INFO_BITS
    }

    #[inline]
    pub const fn varint_integers(self) -> bool {
        self.flags & Self::ENCODING_WITH_VARINT.flags != 0
    }

    #[inline]
    pub const fn fast_varint(self) -> bool {
        self.flags & Self::USE_FAST_VARINT.flags != 0
    }
}

const DISABLE_ALL_BITS: u8 = 0b11;
const ENABLE_TYPE_INFO_BITS: u8 = 0b10;

impl BitOr for Config {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for Config {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.with(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_decode() {
        let default = Config::DEFAULT;
        assert!(default.metainfo_enabled());
        assert!(!default.type_literal_enabled());
        assert!(!default.varint_integers());

        assert!(!Config::DISABLE_TYPE_INFO.type_literal_enabled());
        assert!(Config::ENABLE_TYPE_INFO.type_literal_enabled());
        assert!(!Config::DISABLE_ALL_META_INFO.metainfo_enabled());
        assert!(!Config::DISABLE_ALL_META_INFO.type_literal_enabled());

        let fast = Config::ENCODING_WITH_VARINT | Config::USE_FAST_VARINT;
        assert!(fast.varint_integers() && fast.fast_varint());
        assert!(fast.metainfo_enabled());
    }

    #[test]
    fn preallocation_limit_survives_combination() {
        let mut config = Config::DEFAULT.with_preallocation_limit(64);
        config |= Config::ENABLE_TYPE_INFO;
        assert_eq!(config.preallocation_limit(), 64);
        assert_eq!(config.bits(), 0b10);
    }
}
