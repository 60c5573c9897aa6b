//! Implementations for core, alloc and std types.
//!
//! Integers, floats and arrays of them are trivial: containers of them are written and read with
//! one copy on little-endian hosts. Everything else is walked element by element.
//!
//! Maps and sets are walked with [`Visitor::inline`]: a decoded map does not keep the writer's
//! element order, so the compatible fields of their elements cannot be matched by position in a
//! later versioned pass.
#[cfg(feature = "std")]
use std::{
    collections::{HashMap, HashSet},
    hash::{BuildHasher, Hash},
};
use {
    crate::{
        error::{invalid_char_encoding, invalid_value, pointer_sized_decode_error, ReadResult},
        schema::{bulk_copyable, visit_iter, visit_slice, Pack, TypeMeta, Unpack, Visitor},
        signature::{code, Describe},
        unpack::Unpacker,
        util::as_bytes,
        varint::{zigzag_decode, zigzag_encode},
    },
    alloc::{
        boxed::Box,
        collections::{BTreeMap, BTreeSet, VecDeque},
        string::String,
        vec::Vec,
    },
    core::{ptr, str},
};

macro_rules! impl_fixed {
    ($($type:ty => $code:expr),* $(,)?) => {
        $(
            // SAFETY: `$type` is plain ol' data and its encoding is its little-endian bytes.
            unsafe impl Pack for $type {
                const TYPE_META: TypeMeta = TypeMeta::Static {
                    size: size_of::<$type>(),
                    trivial: true,
                };

                #[inline]
                fn describe(d: &mut Describe) {
                    d.code($code);
                }

                #[inline(always)]
                fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
                    v.scalar(&self.to_le_bytes())
                }
            }

            impl Unpack for $type {
                #[inline(always)]
                fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
                    Ok(<$type>::from_le_bytes(u.read_array()?))
                }
            }
        )*
    };
}

impl_fixed! {
    u8 => code::U8,
    i8 => code::I8,
    u16 => code::U16,
    i16 => code::I16,
    u128 => code::U128,
    i128 => code::I128,
    f32 => code::F32,
    f64 => code::F64,
}

/// 32 and 64 bit integers, which switch to varints under
/// [`Config::ENCODING_WITH_VARINT`](crate::config::Config::ENCODING_WITH_VARINT).
macro_rules! impl_varint_sensitive {
    ($($type:ty => $fixed:expr, $varint:expr, $to_wire:expr, $from_wire:expr);* $(;)?) => {
        $(
            // SAFETY: `$type` is plain ol' data and its fixed encoding is its little-endian bytes.
            unsafe impl Pack for $type {
                const TYPE_META: TypeMeta = TypeMeta::Static {
                    size: size_of::<$type>(),
                    trivial: true,
                };
                const VARINT_SENSITIVE: bool = true;

                #[inline]
                fn describe(d: &mut Describe) {
                    d.integer($fixed, $varint);
                }

                #[inline(always)]
                fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
                    if v.config().varint_integers() {
                        return v.varint($to_wire(*self));
                    }
                    v.scalar(&self.to_le_bytes())
                }
            }

            impl Unpack for $type {
                #[inline(always)]
                fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
                    if u.config().varint_integers() {
                        return $from_wire(u.read_varint()?);
                    }
                    Ok(<$type>::from_le_bytes(u.read_array()?))
                }
            }
        )*
    };
}

impl_varint_sensitive! {
    u32 => code::U32, code::VARINT_U32, |x: u32| x as u64, from_wire_u32;
    u64 => code::U64, code::VARINT_U64, |x: u64| x, |x: u64| -> ReadResult<u64> { Ok(x) };
    i32 => code::I32, code::VARINT_I32, |x: i32| zigzag_encode(x as i64), from_wire_i32;
    i64 => code::I64, code::VARINT_I64, zigzag_encode, |x: u64| -> ReadResult<i64> { Ok(zigzag_decode(x)) };
}

#[inline]
fn from_wire_u32(wire: u64) -> ReadResult<u32> {
    u32::try_from(wire).map_err(|_| crate::error::varint_overflow())
}

#[inline]
fn from_wire_i32(wire: u64) -> ReadResult<i32> {
    i32::try_from(zigzag_decode(wire)).map_err(|_| crate::error::varint_overflow())
}

/// Pointer-sized integers travel as their 64-bit counterparts.
macro_rules! impl_pointer_sized {
    ($($type:ty as $wide:ty),*) => {
        $(
            // SAFETY: the encoding is always the 8 bytes of `$wide`; `trivial` is not claimed
            // because the in-memory width is platform dependent.
            unsafe impl Pack for $type {
                const TYPE_META: TypeMeta = TypeMeta::Static {
                    size: size_of::<$wide>(),
                    trivial: false,
                };

                #[inline]
                fn describe(d: &mut Describe) {
                    <$wide as Pack>::describe(d);
                }

                #[inline]
                fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
                    (*self as $wide).visit(v)
                }
            }

            impl Unpack for $type {
                #[inline]
                fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
                    <$type>::try_from(<$wide>::unpack(u)?).map_err(|_| pointer_sized_decode_error())
                }
            }
        )*
    };
}

impl_pointer_sized!(usize as u64, isize as i64);

// SAFETY: one byte, but not trivial: only 0 and 1 are valid.
unsafe impl Pack for bool {
    const TYPE_META: TypeMeta = TypeMeta::Static {
        size: 1,
        trivial: false,
    };

    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::BOOL);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.scalar(&[*self as u8])
    }
}

impl Unpack for bool {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.read_bool()
    }
}

// SAFETY: a `char` travels as its `u32` scalar value. Not every `u32` is a `char`.
unsafe impl Pack for char {
    const TYPE_META: TypeMeta = TypeMeta::Static {
        size: 4,
        trivial: false,
    };

    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::CHAR);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.scalar(&(*self as u32).to_le_bytes())
    }
}

impl Unpack for char {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        let scalar = u32::from_le_bytes(u.read_array()?);
        char::from_u32(scalar).ok_or_else(|| invalid_char_encoding(scalar))
    }
}

/// The empty alternative, e.g. of a variant that carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monostate;

macro_rules! impl_monostate {
    ($($type:ty => $value:expr),*) => {
        $(
            // SAFETY: zero bytes.
            unsafe impl Pack for $type {
                const TYPE_META: TypeMeta = TypeMeta::Static {
                    size: 0,
                    trivial: false,
                };

                #[inline]
                fn describe(d: &mut Describe) {
                    d.code(code::MONOSTATE);
                }

                #[inline]
                fn visit<V: Visitor>(&self, _v: &mut V) -> Result<(), V::Error> {
                    Ok(())
                }
            }

            impl Unpack for $type {
                #[inline]
                fn unpack(_u: &mut Unpacker<'_>) -> ReadResult<Self> {
                    Ok($value)
                }
            }
        )*
    };
}

impl_monostate!(() => (), Monostate => Monostate);

/// An integer always encoded as a varint, independent of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Varint<T>(pub T);

/// Integers that can be wrapped in [`Varint`].
pub trait VarintInt: Copy {
    /// Type code of the varint form.
    const CODE: u8;

    /// The value before the variable-width encoding, zig-zag mapped when signed.
    fn to_wire(self) -> u64;

    fn from_wire(wire: u64) -> ReadResult<Self>;
}

macro_rules! impl_varint_int {
    ($($type:ty => $code:expr, $to_wire:expr, $from_wire:expr);* $(;)?) => {
        $(
            impl VarintInt for $type {
                const CODE: u8 = $code;

                #[inline]
                fn to_wire(self) -> u64 {
                    $to_wire(self)
                }

                #[inline]
                fn from_wire(wire: u64) -> ReadResult<Self> {
                    $from_wire(wire)
                }
            }
        )*
    };
}

impl_varint_int! {
    u32 => code::VARINT_U32, |x: u32| x as u64, from_wire_u32;
    u64 => code::VARINT_U64, |x: u64| x, |x: u64| -> ReadResult<u64> { Ok(x) };
    i32 => code::VARINT_I32, |x: i32| zigzag_encode(x as i64), from_wire_i32;
    i64 => code::VARINT_I64, zigzag_encode, |x: u64| -> ReadResult<i64> { Ok(zigzag_decode(x)) };
}

// SAFETY: variable width, so dynamic.
unsafe impl<T: VarintInt> Pack for Varint<T> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.varint(T::CODE);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.varint(self.0.to_wire())
    }
}

impl<T: VarintInt> Unpack for Varint<T> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        Ok(Varint(T::from_wire(u.read_varint()?)?))
    }
}

impl<T> From<T> for Varint<T> {
    #[inline]
    fn from(value: T) -> Self {
        Varint(value)
    }
}

// SAFETY: `N` consecutive encodings of `T`; trivial iff `T` is, since arrays carry no padding
// between elements.
unsafe impl<T: Pack, const N: usize> Pack for [T; N] {
    const TYPE_META: TypeMeta = match T::TYPE_META {
        TypeMeta::Static { size, trivial } => TypeMeta::Static {
            size: size * N,
            trivial,
        },
        TypeMeta::Dynamic => TypeMeta::Dynamic,
    };
    const VARINT_SENSITIVE: bool = T::VARINT_SENSITIVE;

    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::ARRAY);
        d.describe::<T>();
        d.size_literal(N);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        if bulk_copyable::<T>(v.config()) {
            // SAFETY: `T` is trivial.
            return v.scalar(unsafe { as_bytes(self) });
        }
        for elem in self {
            elem.visit(v)?;
        }
        Ok(())
    }
}

impl<T: Unpack, const N: usize> Unpack for [T; N] {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        if bulk_copyable::<T>(u.config()) {
            let bytes = u.read_bytes(size_of::<[T; N]>())?;
            // SAFETY: `T` is trivial, so any `size_of::<[T; N]>()` bytes form a valid array.
            return Ok(unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<[T; N]>()) });
        }
        let elems = (0..N)
            .map(|_| T::unpack(u))
            .collect::<ReadResult<Vec<T>>>()?;
        elems
            .try_into()
            .map_err(|_| invalid_value("array length"))
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        for elem in self {
            elem.unpack_compatible(u, version)?;
        }
        Ok(())
    }
}

/// Read `len` trivial elements with one copy.
///
/// # Safety
///
/// `T` must be trivial.
#[inline]
unsafe fn read_trivial_vec<T>(u: &mut Unpacker<'_>, len: usize) -> ReadResult<Vec<T>> {
    let bytes = u.read_bytes(len * size_of::<T>())?;
    let mut vec = Vec::<T>::with_capacity(len);
    // SAFETY:
    // - `vec` has capacity for `len` elements, i.e. `bytes.len()` bytes.
    // - `T` is trivial, so the copied bytes are `len` initialized values.
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), vec.as_mut_ptr().cast::<u8>(), bytes.len());
        vec.set_len(len);
    }
    Ok(vec)
}

fn unpack_vec<T: Unpack>(u: &mut Unpacker<'_>) -> ReadResult<Vec<T>> {
    let len = u.read_len::<T>()?;
    if bulk_copyable::<T>(u.config()) {
        // SAFETY: checked by `bulk_copyable`.
        return unsafe { read_trivial_vec(u, len) };
    }
    let mut vec = Vec::with_capacity(len);
    for _ in 0..len {
        vec.push(T::unpack(u)?);
    }
    Ok(vec)
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for [T] {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::CONTAINER);
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_slice(v, self)
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for Vec<T> {
    #[inline]
    fn describe(d: &mut Describe) {
        <[T]>::describe(d);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_slice(v, self)
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        unpack_vec(u)
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        for elem in self {
            elem.unpack_compatible(u, version)?;
        }
        Ok(())
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for Box<[T]> {
    #[inline]
    fn describe(d: &mut Describe) {
        <[T]>::describe(d);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_slice(v, self)
    }
}

impl<T: Unpack> Unpack for Box<[T]> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        Ok(unpack_vec(u)?.into_boxed_slice())
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        for elem in self.iter_mut() {
            elem.unpack_compatible(u, version)?;
        }
        Ok(())
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for VecDeque<T> {
    #[inline]
    fn describe(d: &mut Describe) {
        <[T]>::describe(d);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        if !bulk_copyable::<T>(v.config()) {
            return visit_iter(v, self.iter());
        }
        v.len(self.len())?;
        let (front, back) = self.as_slices();
        // SAFETY: `T` is trivial.
        unsafe {
            v.scalar(as_bytes(front))?;
            v.scalar(as_bytes(back))
        }
    }
}

impl<T: Unpack> Unpack for VecDeque<T> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        Ok(unpack_vec(u)?.into())
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        for elem in self {
            elem.unpack_compatible(u, version)?;
        }
        Ok(())
    }
}

// SAFETY: dynamic.
unsafe impl Pack for str {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::STRING);
        d.code(code::CHAR8);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.len(self.len())?;
        v.scalar(self.as_bytes())
    }
}

// SAFETY: dynamic.
unsafe impl Pack for String {
    #[inline]
    fn describe(d: &mut Describe) {
        str::describe(d);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        self.as_str().visit(v)
    }
}

impl Unpack for String {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        let len = u.read_len::<u8>()?;
        let bytes = u.read_bytes(len)?;
        Ok(str::from_utf8(bytes)?.into())
    }
}

// SAFETY: the encoding of `T`.
unsafe impl<T: Pack + ?Sized> Pack for &T {
    const TYPE_META: TypeMeta = T::TYPE_META.indirect();
    const VARINT_SENSITIVE: bool = T::VARINT_SENSITIVE;

    #[inline]
    fn describe(d: &mut Describe) {
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        (**self).visit(v)
    }
}

/// A `Box` is transparent. An owning pointer that may be null is `Option<Box<T>>`.
// SAFETY: the encoding of `T`.
unsafe impl<T: Pack> Pack for Box<T> {
    const TYPE_META: TypeMeta = T::TYPE_META.indirect();
    const VARINT_SENSITIVE: bool = T::VARINT_SENSITIVE;

    #[inline]
    fn describe(d: &mut Describe) {
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        (**self).visit(v)
    }
}

impl<T: Unpack> Unpack for Box<T> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        Ok(Box::new(T::unpack(u)?))
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        (**self).unpack_compatible(u, version)
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for Option<T> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::OPTIONAL);
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.flag(self.is_some())?;
        if let Some(value) = self {
            value.visit(v)?;
        }
        Ok(())
    }
}

impl<T: Unpack> Unpack for Option<T> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.read_option()
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        if let Some(value) = self {
            value.unpack_compatible(u, version)?;
        }
        Ok(())
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack, E: Pack> Pack for Result<T, E> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::EXPECTED);
        d.describe::<T>();
        d.describe::<E>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        match self {
            Ok(value) => {
                v.flag(true)?;
                value.visit(v)
            }
            Err(error) => {
                v.flag(false)?;
                error.visit(v)
            }
        }
    }
}

impl<T: Unpack, E: Unpack> Unpack for Result<T, E> {
    #[inline]
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        if u.read_bool()? {
            Ok(Ok(T::unpack(u)?))
        } else {
            Ok(Err(E::unpack(u)?))
        }
    }

    #[inline]
    fn unpack_compatible(&mut self, u: &mut Unpacker<'_>, version: u64) -> ReadResult<()> {
        match self {
            Ok(value) => value.unpack_compatible(u, version),
            Err(error) => error.unpack_compatible(u, version),
        }
    }
}

#[inline]
fn visit_map<'a, K, V, W>(
    v: &mut W,
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Result<(), W::Error>
where
    K: Pack + 'a,
    V: Pack + 'a,
    W: Visitor,
{
    v.inline(|v| {
        v.len(len)?;
        for (key, value) in entries {
            key.visit(v)?;
            value.visit(v)?;
        }
        Ok(())
    })
}

#[inline]
fn visit_set<'a, T, W>(v: &mut W, iter: impl ExactSizeIterator<Item = &'a T>) -> Result<(), W::Error>
where
    T: Pack + 'a,
    W: Visitor,
{
    v.inline(|v| visit_iter(v, iter))
}

// SAFETY: dynamic.
unsafe impl<K: Pack, V: Pack> Pack for BTreeMap<K, V> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::MAP);
        d.describe::<K>();
        d.describe::<V>();
    }

    #[inline]
    fn visit<W: Visitor>(&self, v: &mut W) -> Result<(), W::Error> {
        visit_map(v, self.len(), self.iter())
    }
}

impl<K: Unpack + Ord, V: Unpack> Unpack for BTreeMap<K, V> {
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.inline(|u| {
            let len = u.read_len::<(K, V)>()?;
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let key = K::unpack(u)?;
                let value = V::unpack(u)?;
                map.insert(key, value);
            }
            Ok(map)
        })
    }
}

// SAFETY: dynamic.
unsafe impl<T: Pack> Pack for BTreeSet<T> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::SET);
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_set(v, self.iter())
    }
}

impl<T: Unpack + Ord> Unpack for BTreeSet<T> {
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.inline(|u| {
            let len = u.read_len::<T>()?;
            let mut set = BTreeSet::new();
            for _ in 0..len {
                set.insert(T::unpack(u)?);
            }
            Ok(set)
        })
    }
}

// SAFETY: dynamic.
#[cfg(feature = "std")]
unsafe impl<K: Pack, V: Pack, S> Pack for HashMap<K, V, S> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::MAP);
        d.describe::<K>();
        d.describe::<V>();
    }

    #[inline]
    fn visit<W: Visitor>(&self, v: &mut W) -> Result<(), W::Error> {
        visit_map(v, self.len(), self.iter())
    }
}

#[cfg(feature = "std")]
impl<K, V, S> Unpack for HashMap<K, V, S>
where
    K: Unpack + Eq + Hash,
    V: Unpack,
    S: BuildHasher + Default,
{
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.inline(|u| {
            let len = u.read_len::<(K, V)>()?;
            let mut map = HashMap::with_capacity_and_hasher(len, S::default());
            for _ in 0..len {
                let key = K::unpack(u)?;
                let value = V::unpack(u)?;
                map.insert(key, value);
            }
            Ok(map)
        })
    }
}

// SAFETY: dynamic.
#[cfg(feature = "std")]
unsafe impl<T: Pack, S> Pack for HashSet<T, S> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::SET);
        d.describe::<T>();
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        visit_set(v, self.iter())
    }
}

#[cfg(feature = "std")]
impl<T, S> Unpack for HashSet<T, S>
where
    T: Unpack + Eq + Hash,
    S: BuildHasher + Default,
{
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        u.inline(|u| {
            let len = u.read_len::<T>()?;
            let mut set = HashSet::with_capacity_and_hasher(len, S::default());
            for _ in 0..len {
                set.insert(T::unpack(u)?);
            }
            Ok(set)
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]
    use {
        super::*,
        crate::{
            config::Config,
            error::ReadError,
            pack::pack_into,
            proptest_config::proptest_cfg,
            schema::Compatible,
            signature::{get_type_literal, TypeDescription},
            unpack::unpack_from,
        },
        core::fmt::Debug,
        proptest::prelude::*,
        std::collections::{BTreeMap, HashMap},
    };

    fn round_trip<T>(value: &T, config: Config) -> T
    where
        T: Unpack + Debug,
    {
        let mut buf = Vec::new();
        let plan = pack_into(&mut buf, value, config).unwrap();
        assert_eq!(plan.length as usize, buf.len());
        let (decoded, consumed) = unpack_from::<T>(&buf, config).unwrap();
        assert_eq!(consumed, buf.len());
        decoded
    }

    fn configs() -> [Config; 4] {
        [
            Config::DEFAULT,
            Config::ENABLE_TYPE_INFO,
            Config::DISABLE_ALL_META_INFO,
            Config::ENCODING_WITH_VARINT | Config::USE_FAST_VARINT,
        ]
    }

    #[test]
    fn boxed_elements_encode_their_targets() {
        assert!(bulk_copyable::<u32>(Config::DEFAULT));
        assert!(!bulk_copyable::<Box<u32>>(Config::DEFAULT));
        assert!(!bulk_copyable::<&u32>(Config::DEFAULT));
        assert_eq!(
            <Box<u32> as Pack>::TYPE_META,
            TypeMeta::Static {
                size: 4,
                trivial: false
            }
        );
        assert!(<Box<u64> as Pack>::VARINT_SENSITIVE);

        let config = Config::DISABLE_ALL_META_INFO;
        let mut boxed = Vec::new();
        let mut plain = Vec::new();
        pack_into(&mut boxed, &vec![Box::new(1u32), Box::new(2)], config).unwrap();
        pack_into(&mut plain, &vec![1u32, 2], config).unwrap();
        assert_eq!(boxed, plain);
        assert_eq!(&boxed[8..], &[1, 0, 0, 0, 2, 0, 0, 0]);

        let decoded = round_trip(&[Box::new(7u32), Box::new(9)], Config::DEFAULT);
        assert_eq!(decoded, [Box::new(7), Box::new(9)]);
        let varint = Config::ENCODING_WITH_VARINT;
        assert_eq!(round_trip(&vec![Box::new(300u64)], varint), [Box::new(300)]);
    }

    #[test]
    fn char_rejects_surrogates() {
        let mut buf = Vec::new();
        pack_into(&mut buf, &0xD800u32, Config::DISABLE_ALL_META_INFO).unwrap();
        assert!(matches!(
            unpack_from::<char>(&buf, Config::DISABLE_ALL_META_INFO),
            Err(ReadError::InvalidCharEncoding(0xD800))
        ));
    }

    #[test]
    fn bool_rejects_other_bytes() {
        assert!(matches!(
            unpack_from::<bool>(&[2], Config::DISABLE_ALL_META_INFO),
            Err(ReadError::InvalidBoolEncoding(2))
        ));
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let bytes = [2, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xfe];
        assert!(matches!(
            unpack_from::<String>(&bytes, Config::DISABLE_ALL_META_INFO),
            Err(ReadError::InvalidUtf8Encoding(_))
        ));
    }

    #[test]
    fn pointer_sized_integers_travel_as_64_bits() {
        assert_eq!(get_type_literal::<usize>(), [code::U64]);
        assert_eq!(get_type_literal::<isize>(), [code::I64]);
        assert_eq!(round_trip(&usize::MAX, Config::DEFAULT), usize::MAX);
    }

    #[test]
    fn result_literal_and_flag() {
        assert_eq!(
            get_type_literal::<Result<u8, String>>(),
            [code::EXPECTED, code::U8, code::STRING, code::CHAR8]
        );
        let mut buf = Vec::new();
        pack_into(&mut buf, &Err::<u8, u8>(9), Config::DISABLE_ALL_META_INFO).unwrap();
        assert_eq!(buf, [0, 9]);
    }

    #[test]
    fn map_and_set_literals() {
        assert_eq!(
            get_type_literal::<BTreeMap<u8, i64>>(),
            [code::MAP, code::U8, code::I64]
        );
        assert_eq!(
            get_type_literal::<HashSet<u16>>(),
            [code::SET, code::U16]
        );
        assert_eq!(
            get_type_literal::<HashMap<u8, i64>>(),
            get_type_literal::<BTreeMap<u8, i64>>()
        );
    }

    #[test]
    fn varint_wrapper_ignores_config() {
        let mut buf = Vec::new();
        pack_into(&mut buf, &Varint(300u32), Config::DISABLE_ALL_META_INFO).unwrap();
        assert_eq!(buf, [0xac, 0x02]);
        assert_eq!(get_type_literal::<Varint<i64>>(), [code::VARINT_I64]);
        assert_eq!(round_trip(&Varint(-5i32), Config::DEFAULT), Varint(-5));
    }

    #[test]
    fn varint_overflow_is_rejected() {
        let mut buf = Vec::new();
        let config = Config::DISABLE_ALL_META_INFO | Config::ENCODING_WITH_VARINT;
        pack_into(&mut buf, &(u32::MAX as u64 + 1), config).unwrap();
        assert!(matches!(
            unpack_from::<u32>(&buf, config),
            Err(ReadError::VarintOverflow)
        ));
    }

    #[test]
    fn map_values_carry_compatible_fields_inline() {
        let mut map = HashMap::new();
        map.insert(1u8, Compatible::<u16, 1>::new(10));
        map.insert(2u8, Compatible::<u16, 1>::none());
        let description = TypeDescription::of::<HashMap<u8, Compatible<u16, 1>>>(Config::DEFAULT);
        assert_eq!(description.versions(), &[1]);
        assert_eq!(round_trip(&map, Config::DEFAULT), map);
    }

    #[test]
    fn monostate_is_zero_bytes() {
        let mut buf = Vec::new();
        pack_into(&mut buf, &((), Monostate), Config::DISABLE_ALL_META_INFO).unwrap();
        assert!(buf.is_empty());
    }

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn scalars_round_trip(value in any::<(u8, i16, u32, i64, u128, f64, bool, char)>()) {
            for config in configs() {
                let decoded = round_trip(&value, config);
                prop_assert_eq!(decoded.0, value.0);
                prop_assert_eq!(decoded.1, value.1);
                prop_assert_eq!(decoded.2, value.2);
                prop_assert_eq!(decoded.3, value.3);
                prop_assert_eq!(decoded.4, value.4);
                prop_assert_eq!(decoded.5.to_bits(), value.5.to_bits());
                prop_assert_eq!(decoded.6, value.6);
                prop_assert_eq!(decoded.7, value.7);
            }
        }

        #[test]
        fn containers_round_trip(
            vec in proptest::collection::vec(any::<u32>(), 0..300),
            deque in proptest::collection::vec_deque(any::<String>(), 0..8),
            map in proptest::collection::btree_map(any::<i32>(), any::<Option<u8>>(), 0..8),
            set in proptest::collection::hash_set(any::<u64>(), 0..8),
            array in any::<[i64; 4]>(),
        ) {
            let value = (vec, deque, map, set, array);
            for config in configs() {
                prop_assert_eq!(&round_trip(&value, config), &value);
            }
        }

        #[test]
        fn bulk_and_elementwise_encodings_agree(data in proptest::collection::vec(any::<u16>(), 0..64)) {
            let deque: VecDeque<u16> = data.iter().copied().collect();
            let boxed: Box<[u16]> = data.clone().into_boxed_slice();
            // Boxed elements are not trivial and take the element-wise path.
            let elementwise: Vec<Box<u16>> = data.iter().copied().map(Box::new).collect();
            let mut from_vec = Vec::new();
            let mut from_deque = Vec::new();
            let mut from_box = Vec::new();
            let mut from_elements = Vec::new();
            pack_into(&mut from_vec, &data, Config::DEFAULT).unwrap();
            pack_into(&mut from_deque, &deque, Config::DEFAULT).unwrap();
            pack_into(&mut from_box, &boxed, Config::DEFAULT).unwrap();
            pack_into(&mut from_elements, &elementwise, Config::DEFAULT).unwrap();
            prop_assert_eq!(&from_vec, &from_deque);
            prop_assert_eq!(&from_vec, &from_box);
            prop_assert_eq!(&from_vec, &from_elements);
        }

        #[test]
        fn result_round_trips(value in any::<Result<Vec<i32>, String>>()) {
            prop_assert_eq!(round_trip(&value, Config::DEFAULT), value);
        }
    }
}
