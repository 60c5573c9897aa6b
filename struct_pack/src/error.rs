//! Error types and helpers.
use {crate::io, core::str::Utf8Error, thiserror::Error};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Io(#[from] io::WriteError),
    #[error("Polymorphic type id {0:#010x} is not registered for this base type")]
    UnregisteredPolymorphicType(u32),
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::ReadError),
    #[error(transparent)]
    InvalidUtf8Encoding(#[from] Utf8Error),
    #[error("Type signature mismatch: expected {expected:#010x}, found {found:#010x}")]
    SignatureMismatch { expected: u32, found: u32 },
    #[error("Embedded type literal does not match the expected type")]
    TypeLiteralMismatch,
    #[error("Polymorphic type id {0:#010x} is not registered for this base type")]
    UnregisteredPolymorphicType(u32),
    #[error("Could not cast integer type to pointer sized type")]
    PointerSizedReadError,
    #[error(
        "Encoded sequence length exceeded preallocation limit of {limit} bytes (needed {needed} \
         bytes)"
    )]
    PreallocationSizeLimit { needed: usize, limit: usize },
    #[error("Invalid tag encoding: {0}")]
    InvalidTagEncoding(usize),
    #[error("Invalid bool encoding: {0}")]
    InvalidBoolEncoding(u8),
    #[error("Invalid char encoding: {0:#x}")]
    InvalidCharEncoding(u32),
    #[error("Varint exceeds the width of its target integer")]
    VarintOverflow,
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),
}

/// A concrete type was registered under an id already held by another type of the same base.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Polymorphic type id {id:#010x} of {rejected} is already registered to {existing}")]
pub struct PolymorphicIdConflict {
    pub id: u32,
    pub existing: &'static str,
    pub rejected: &'static str,
}

pub struct PreallocationError {
    needed: usize,
    limit: usize,
}

pub type WriteResult<T> = core::result::Result<T, WriteError>;
pub type ReadResult<T> = core::result::Result<T, ReadError>;

#[cold]
pub const fn preallocation_size_limit(needed: usize, limit: usize) -> PreallocationError {
    PreallocationError { needed, limit }
}

#[cold]
pub const fn pointer_sized_decode_error() -> ReadError {
    ReadError::PointerSizedReadError
}

#[cold]
pub const fn invalid_bool_encoding(byte: u8) -> ReadError {
    ReadError::InvalidBoolEncoding(byte)
}

#[cold]
pub const fn invalid_tag_encoding(tag: usize) -> ReadError {
    ReadError::InvalidTagEncoding(tag)
}

#[cold]
pub const fn invalid_char_encoding(val: u32) -> ReadError {
    ReadError::InvalidCharEncoding(val)
}

#[cold]
pub const fn invalid_value(msg: &'static str) -> ReadError {
    ReadError::InvalidValue(msg)
}

#[cold]
pub const fn varint_overflow() -> ReadError {
    ReadError::VarintOverflow
}

#[cold]
pub const fn signature_mismatch(expected: u32, found: u32) -> ReadError {
    ReadError::SignatureMismatch { expected, found }
}

#[cold]
pub const fn type_literal_mismatch() -> ReadError {
    ReadError::TypeLiteralMismatch
}

#[cold]
pub const fn unregistered_polymorphic_write(id: u32) -> WriteError {
    WriteError::UnregisteredPolymorphicType(id)
}

#[cold]
pub const fn unregistered_polymorphic_read(id: u32) -> ReadError {
    ReadError::UnregisteredPolymorphicType(id)
}

impl From<PreallocationError> for ReadError {
    fn from(PreallocationError { needed, limit }: PreallocationError) -> ReadError {
        ReadError::PreallocationSizeLimit { needed, limit }
    }
}
