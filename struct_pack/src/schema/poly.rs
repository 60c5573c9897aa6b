//! Polymorphic owning pointers.
//!
//! A [`PolyBox<B>`] holds any registered concrete type behind the base `B`, typically a trait
//! object. The encoding is the presence flag, then the concrete type's [`polymorphic_id`] as a
//! `u32`, then the concrete value. Decoding dispatches on that id through a process-global
//! registry populated with [`register_polymorphic`].
//!
//! The id defaults to the type's [`get_type_code`], which only depends on the layout. Concrete
//! types of one base that share a layout need an explicit `#[struct_pack(id = N)]`, otherwise
//! the second registration is refused.
//!
//! ```
//! # #[cfg(all(feature = "std", feature = "derive"))] {
//! use struct_pack::{poly::{register_polymorphic, PolyBox, Polymorphic}, Pack, Unpack};
//!
//! trait Shape: Polymorphic {
//!     fn area(&self) -> f64;
//! }
//!
//! #[derive(Pack, Unpack)]
//! struct Square(f64);
//!
//! impl Shape for Square {
//!     fn area(&self) -> f64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! register_polymorphic::<dyn Shape, Square>(|square| Box::new(square)).unwrap();
//!
//! let shape: PolyBox<dyn Shape> = PolyBox::new(Box::new(Square(2.0)));
//! let bytes = struct_pack::serialize(&shape).unwrap();
//! let decoded: PolyBox<dyn Shape> = struct_pack::deserialize(&bytes).unwrap();
//! assert_eq!(decoded.as_deref().map(Shape::area), Some(4.0));
//! # }
//! ```
//!
//! [`get_type_code`]: crate::get_type_code
use {
    crate::{
        error::{PolymorphicIdConflict, ReadResult},
        io::Writer,
        pack::Packer,
        schema::{Pack, Unpack, Visitor},
        signature::{code, get_type_code, Describe},
        size::SizeCalculator,
        unpack::Unpacker,
    },
    alloc::boxed::Box,
    core::{
        fmt,
        ops::{Deref, DerefMut},
    },
};

/// Object-safe view of a packable value, implemented for every [`Unpack`] type.
///
/// Make it a supertrait of a base trait to pack trait objects of that base in a [`PolyBox`].
pub trait Polymorphic {
    /// Registry id of the concrete type.
    fn polymorphic_id(&self) -> u32;

    fn visit_size(&self, calc: &mut SizeCalculator);

    fn visit_pack(&self, packer: &mut Packer<'_, dyn Writer + '_>) -> crate::WriteResult<()>;
}

/// Id of `T` behind a [`PolyBox`]: its [`Pack::POLYMORPHIC_ID`], else its type code.
#[inline]
pub fn polymorphic_id<T: Pack + ?Sized>() -> u32 {
    match T::POLYMORPHIC_ID {
        Some(id) => id,
        None => get_type_code::<T>(),
    }
}

impl<T: Unpack> Polymorphic for T {
    #[inline]
    fn polymorphic_id(&self) -> u32 {
        polymorphic_id::<T>()
    }

    #[inline]
    fn visit_size(&self, calc: &mut SizeCalculator) {
        calc.add(self);
    }

    #[inline]
    fn visit_pack(&self, packer: &mut Packer<'_, dyn Writer + '_>) -> crate::WriteResult<()> {
        self.visit(packer)
    }
}

/// An optional owning pointer to a polymorphic `B`.
pub struct PolyBox<B: ?Sized>(pub Option<Box<B>>);

impl<B: ?Sized> PolyBox<B> {
    #[inline]
    pub fn new(value: Box<B>) -> Self {
        Self(Some(value))
    }

    #[inline]
    pub const fn none() -> Self {
        Self(None)
    }

    #[inline]
    pub fn into_inner(self) -> Option<Box<B>> {
        self.0
    }
}

impl<B: ?Sized> Default for PolyBox<B> {
    #[inline]
    fn default() -> Self {
        Self(None)
    }
}

impl<B: ?Sized> Deref for PolyBox<B> {
    type Target = Option<Box<B>>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<B: ?Sized> DerefMut for PolyBox<B> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<B: ?Sized> fmt::Debug for PolyBox<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "PolyBox({})", core::any::type_name_of_val(&**value)),
            None => f.write_str("PolyBox(None)"),
        }
    }
}

// SAFETY: dynamic.
unsafe impl<B: ?Sized + Polymorphic + 'static> Pack for PolyBox<B> {
    #[inline]
    fn describe(d: &mut Describe) {
        d.code(code::OPTIONAL);
        d.code(code::POLYMORPHIC);
    }

    #[inline]
    fn visit<V: Visitor>(&self, v: &mut V) -> Result<(), V::Error> {
        v.flag(self.0.is_some())?;
        if let Some(value) = &self.0 {
            v.polymorphic::<B>(value)?;
        }
        Ok(())
    }
}

impl<B: ?Sized + Polymorphic + 'static> Unpack for PolyBox<B> {
    fn unpack(u: &mut Unpacker<'_>) -> ReadResult<Self> {
        if !u.read_bool()? {
            return Ok(Self(None));
        }
        Ok(Self(Some(registry::unpack::<B>(u)?)))
    }
}

pub use registry::{is_registered, register_polymorphic};

#[cfg(feature = "std")]
mod registry {
    use {
        super::*,
        crate::error::unregistered_polymorphic_read,
        log::{debug, warn},
        std::{
            any::{Any, TypeId},
            collections::HashMap,
            sync::{Arc, OnceLock, PoisonError, RwLock},
        },
    };

    type Decode<B> = dyn Fn(&mut Unpacker<'_>) -> ReadResult<Box<B>> + Send + Sync;

    /// Decoder of one concrete type behind the base `B`.
    struct Entry<B: ?Sized + 'static> {
        concrete: TypeId,
        name: &'static str,
        decode: Arc<Decode<B>>,
    }

    type Registry = HashMap<(TypeId, u32), Box<dyn Any + Send + Sync>>;

    fn registry() -> &'static RwLock<Registry> {
        static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
        REGISTRY.get_or_init(Default::default)
    }

    /// Make `T` decodable behind the base `B`, converting it with `upcast`.
    ///
    /// Registering the same pair again replaces the previous entry. Fails when another concrete
    /// type already holds the id of `T` behind `B`, keeping that type registered.
    pub fn register_polymorphic<B, T>(
        upcast: fn(T) -> Box<B>,
    ) -> Result<(), PolymorphicIdConflict>
    where
        B: ?Sized + 'static,
        T: Unpack + 'static,
    {
        let id = polymorphic_id::<T>();
        let name = core::any::type_name::<T>();
        let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
        let key = (TypeId::of::<B>(), id);
        if let Some(existing) = registry
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Entry<B>>())
            .filter(|entry| entry.concrete != TypeId::of::<T>())
        {
            warn!(
                "polymorphic id {id:#010x} behind {} is held by {}, refusing {name}",
                core::any::type_name::<B>(),
                existing.name
            );
            return Err(PolymorphicIdConflict {
                id,
                existing: existing.name,
                rejected: name,
            });
        }
        debug!(
            "registering polymorphic type {name} as {id:#010x} behind {}",
            core::any::type_name::<B>()
        );
        let decode: Arc<Decode<B>> =
            Arc::new(move |u: &mut Unpacker<'_>| -> ReadResult<Box<B>> {
                Ok(upcast(T::unpack(u)?))
            });
        registry.insert(
            key,
            Box::new(Entry {
                concrete: TypeId::of::<T>(),
                name,
                decode,
            }),
        );
        Ok(())
    }

    /// Whether a concrete type with `id` was registered behind `B`.
    pub fn is_registered<B: ?Sized + 'static>(id: u32) -> bool {
        registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(TypeId::of::<B>(), id))
    }

    fn lookup<B: ?Sized + 'static>(id: u32) -> Option<Arc<Decode<B>>> {
        let registry = registry().read().unwrap_or_else(PoisonError::into_inner);
        let entry = registry.get(&(TypeId::of::<B>(), id))?;
        entry
            .downcast_ref::<Entry<B>>()
            .map(|entry| Arc::clone(&entry.decode))
    }

    pub(super) fn unpack<B: ?Sized + 'static>(u: &mut Unpacker<'_>) -> ReadResult<Box<B>> {
        let id = u32::from_le_bytes(u.read_array()?);
        // The lock is released before decoding, which may itself reach the registry.
        let Some(decode) = lookup::<B>(id) else {
            warn!(
                "no polymorphic type {id:#010x} registered behind {}",
                core::any::type_name::<B>()
            );
            return Err(unregistered_polymorphic_read(id));
        };
        u.inline(|u| decode(u))
    }
}

#[cfg(not(feature = "std"))]
mod registry {
    use {super::*, crate::error::unregistered_polymorphic_read};

    /// Without `std` there is no registry, and every polymorphic type is unregistered.
    pub fn register_polymorphic<B, T>(
        _upcast: fn(T) -> Box<B>,
    ) -> Result<(), PolymorphicIdConflict>
    where
        B: ?Sized + 'static,
        T: Unpack + 'static,
    {
        Ok(())
    }

    pub fn is_registered<B: ?Sized + 'static>(_id: u32) -> bool {
        false
    }

    pub(super) fn unpack<B: ?Sized + 'static>(u: &mut Unpacker<'_>) -> ReadResult<Box<B>> {
        let id = u32::from_le_bytes(u.read_array()?);
        Err(unregistered_polymorphic_read(id))
    }
}
