//! Schema traits.
//!
//! A type takes part in struct_pack through two traits:
//! - [`Pack`] describes the type statically ([`Pack::describe`]) and walks a value of it
//!   ([`Pack::visit`]). The same walk drives both the size pass ([`SizeCalculator`]) and the
//!   write pass ([`Packer`]), so the two can never disagree on what a value contains.
//! - [`Unpack`] is the inverse of the write pass.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "derive")] {
//! # use struct_pack::{Pack, Unpack, Compatible};
//! #[derive(Pack, Unpack, Debug, PartialEq)]
//! struct Person {
//!     id: i32,
//!     name: String,
//!     nickname: Compatible<String, 1>,
//! }
//!
//! let person = Person { id: 10, name: "tom".into(), nickname: Compatible::new("t".into()) };
//! let bytes = struct_pack::serialize(&person).unwrap();
//! assert_eq!(struct_pack::deserialize::<Person>(&bytes).unwrap(), person);
//! # }
//! ```
//!
//! [`SizeCalculator`]: crate::size::SizeCalculator
//! [`Packer`]: crate::pack::Packer
use {
    crate::{
        config::Config,
        error::ReadResult,
        signature::Describe,
        unpack::Unpacker,
        util::as_bytes,
    },
    core::iter::ExactSizeIterator,
};

mod compatible;
mod external;
mod impls;
pub mod poly;
pub use {
    compatible::Compatible,
    impls::{Monostate, Varint, VarintInt},
};

/// Indicates what kind of assumptions can be made when encoding a type.
///
/// Describes the fixed-width integer encoding. Under [`Config::ENCODING_WITH_VARINT`], types with
/// [`Pack::VARINT_SENSITIVE`] set lose these guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMeta {
    /// The type has a statically known serialized size.
    Static {
        /// The static serialized size of the type.
        size: usize,
        /// Whether the in-memory bytes of the type, on a little-endian host, are exactly its
        /// encoding, and every bit pattern of that size is a valid value. This allows containers
        /// of the type to be written and read with one copy.
        ///
        /// Specifying this incorrectly may trigger UB.
        trivial: bool,
    },
    /// The type has a dynamic size.
    Dynamic,
}

impl TypeMeta {
    #[inline(always)]
    pub const fn size(self) -> Option<usize> {
        match self {
            TypeMeta::Static { size, .. } => Some(size),
            TypeMeta::Dynamic => None,
        }
    }

    #[inline(always)]
    pub const fn is_trivial(self) -> bool {
        matches!(self, TypeMeta::Static { trivial: true, .. })
    }

    /// Metadata of a pointer whose target encodes as `self`.
    ///
    /// The encoded size is kept, but the pointer's own bytes are not its encoding.
    #[inline(always)]
    pub const fn indirect(self) -> TypeMeta {
        match self {
            TypeMeta::Static { size, .. } => TypeMeta::Static {
                size,
                trivial: false,
            },
            TypeMeta::Dynamic => TypeMeta::Dynamic,
        }
    }

    /// Metadata of a type laid out as `self` followed by `other`.
    ///
    /// The result is never trivial: sequential fields say nothing about the in-memory layout.
    #[inline(always)]
    pub const fn then(self, other: TypeMeta) -> TypeMeta {
        match (self, other) {
            (TypeMeta::Static { size: a, .. }, TypeMeta::Static { size: b, .. }) => {
                TypeMeta::Static {
                    size: a + b,
                    trivial: false,
                }
            }
            _ => TypeMeta::Dynamic,
        }
    }
}

/// Types that can be packed.
///
/// # Safety
///
/// Implementors must adhere to the Safety section of [`TypeMeta`]: a `Static` size must be the
/// exact number of bytes [`Pack::visit`] produces under the fixed-width integer encoding, and
/// `trivial` may only be claimed for plain old data without padding whose little-endian memory
/// representation is its encoding.
pub unsafe trait Pack {
    /// Metadata about the type's encoding.
    const TYPE_META: TypeMeta = TypeMeta::Dynamic;

    /// Whether the encoding of the type changes under [`Config::ENCODING_WITH_VARINT`].
    const VARINT_SENSITIVE: bool = false;

    /// Id of the type behind a [`PolyBox`](poly::PolyBox), overriding its type code.
    ///
    /// Types with the same layout share a type code, so concrete types of one base that do
    /// should each set a distinct id (`#[struct_pack(id = N)]` when derived).
    const POLYMORPHIC_ID: Option<u32> = None;

    /// Append the type literal of `Self`, and record the versions of its compatible fields.
    ///
    /// Nested types must be described through [`Describe::describe`], never by calling their
    /// `describe` directly.
    fn describe(d: &mut Describe);

    /// Walk `self` in encoding order.
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error>;
}

/// Types that can be unpacked.
pub trait Unpack: Pack + Sized {
    /// Decode a value in the non-versioned pass.
    ///
    /// Compatible fields come out empty here and are filled by [`Unpack::unpack_compatible`].
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self>;

    /// Fill the compatible fields of `version` reachable from `self`.
    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        let _ = (u, version);
        Ok(())
    }
}

/// The per-category hooks one traversal of a value calls.
///
/// Every [`Pack`] impl reduces its type to calls of these hooks. [`SizeCalculator`] implements
/// them by counting, [`Packer`] by writing, which keeps the two passes in lock-step.
///
/// [`SizeCalculator`]: crate::size::SizeCalculator
/// [`Packer`]: crate::pack::Packer
pub trait Visitor: Sized {
    type Error;

    /// Configuration the traversal runs under.
    fn config(&self) -> Config;

    /// Fixed-width little-endian bytes: scalars, fixed arrays and bulk container payloads.
    fn scalar(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Explicit zero padding of a fixed-layout struct.
    fn padding(&mut self, len: usize) -> Result<(), Self::Error>;

    /// A varint, already zig-zag mapped when signed.
    fn varint(&mut self, value: u64) -> Result<(), Self::Error>;

    /// The length prefix of a dynamic container.
    fn len(&mut self, len: usize) -> Result<(), Self::Error>;

    /// A one-byte presence flag, success flag or variant index.
    fn tag(&mut self, tag: u8) -> Result<(), Self::Error>;

    /// A compatible field added in `version`.
    fn compatible<T: Pack + ?Sized>(
        &mut self,
        version: u64,
        value: Option<&T>,
    ) -> Result<(), Self::Error>;

    /// The pointee of a polymorphic owning pointer whose base is `B`.
    fn polymorphic<B: ?Sized + poly::Polymorphic + 'static>(
        &mut self,
        value: &B,
    ) -> Result<(), Self::Error>;

    /// Run `f` with every compatible field it reaches written inline with its enclosing value.
    ///
    /// Used by containers whose decoded element order may differ from the written one.
    #[inline]
    fn inline<F>(&mut self, f: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>,
    {
        f(self)
    }

    #[inline]
    fn flag(&mut self, flag: bool) -> Result<(), Self::Error> {
        self.tag(flag as u8)
    }
}

/// Positional access to the fields of a derived struct, used by [`get_field`](crate::get_field).
pub trait FieldAt<const I: usize>: Unpack {
    type Type;

    fn into_field(self) -> Self::Type;
}

/// Whether a container of `T` may be written with one copy of its backing storage.
#[inline(always)]
pub(crate) fn bulk_copyable<T: Pack>(config: Config) -> bool {
    cfg!(target_endian = "little")
        && T::TYPE_META.is_trivial()
        && !(T::VARINT_SENSITIVE && config.varint_integers())
}

/// Visit a contiguous sequence as a dynamic container, taking the bulk path when possible.
#[inline]
pub(crate) fn visit_slice<T: Pack, V: Visitor>(v: &mut V, slice: &[T]) -> Result<(), V::Error> {
    v.len(slice.len())?;
    if bulk_copyable::<T>(v.config()) {
        // SAFETY: `T` is trivial, so it is plain old data without padding.
        return v.scalar(unsafe { as_bytes(slice) });
    }
    for elem in slice {
        elem.visit(v)?;
    }
    Ok(())
}

/// Visit a sequence as a dynamic container, one element at a time.
#[inline]
pub(crate) fn visit_iter<'a, T, V>(
    v: &mut V,
    iter: impl ExactSizeIterator<Item = &'a T>,
) -> Result<(), V::Error>
where
    T: Pack + 'a,
    V: Visitor,
{
    v.len(iter.len())?;
    for elem in iter {
        elem.visit(v)?;
    }
    Ok(())
}
