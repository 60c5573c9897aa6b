#[cfg(feature = "bytes")]
mod bytes;
#[cfg(feature = "uuid")]
mod uuid;
