use core::{any::TypeId, marker::PhantomData, mem::transmute};

/// [`TypeId`] of `T` without requiring `T: 'static`.
///
/// Used to detect recursive types while describing them, where borrowed field types are common.
#[inline(always)]
pub(crate) fn non_static_type_id<T: ?Sized>() -> TypeId {
    // Code by dtolnay in a bincode issue:
    // https://github.com/bincode-org/bincode/issues/665#issue-1903241159
    trait NonStaticAny {
        fn get_type_id(&self) -> TypeId
        where
            Self: 'static;
    }

    impl<T: ?Sized> NonStaticAny for PhantomData<T> {
        #[inline(always)]
        fn get_type_id(&self) -> TypeId
        where
            Self: 'static,
        {
            TypeId::of::<T>()
        }
    }

    let phantom_data = PhantomData::<T>;
    NonStaticAny::get_type_id(unsafe {
        transmute::<&dyn NonStaticAny, &(dyn NonStaticAny + 'static)>(&phantom_data)
    })
}

/// View a slice of plain old data as its raw bytes.
///
/// # Safety
///
/// - `T` must have no padding and no interior mutability.
#[inline(always)]
pub(crate) unsafe fn as_bytes<T>(src: &[T]) -> &[u8] {
    unsafe { core::slice::from_raw_parts(src.as_ptr().cast::<u8>(), size_of_val(src)) }
}
