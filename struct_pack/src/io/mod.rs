//! [`Reader`] and [`Writer`] implementations.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Attempting to read {0} bytes")]
    ReadSizeLimit(usize),
}

pub type ReadResult<T> = core::result::Result<T, ReadError>;

#[cold]
pub const fn read_size_limit(len: usize) -> ReadError {
    ReadError::ReadSizeLimit(len)
}

/// Trait for structured reading of bytes from an in-memory source.
///
/// # Advancement semantics
/// - `fill_*` and [`Reader::peek`] never advance.
/// - [`Reader::consume`], [`Reader::borrow_exact`] and [`Reader::take_byte`] advance by the
///   number of bytes read.
pub trait Reader<'de> {
    /// Return up to `n_bytes` from the source without advancing. Returns fewer than `n_bytes`
    /// at EOF.
    fn fill_buf(&mut self, n_bytes: usize) -> ReadResult<&[u8]>;

    /// Return exactly `n_bytes` without advancing.
    ///
    /// Errors if the source cannot provide enough bytes.
    fn fill_exact(&mut self, n_bytes: usize) -> ReadResult<&[u8]> {
        let src = self.fill_buf(n_bytes)?;
        if src.len() != n_bytes {
            return Err(read_size_limit(n_bytes));
        }
        Ok(src)
    }

    /// Return exactly `N` bytes as `[u8; N]` without advancing.
    fn fill_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.fill_exact(N)?);
        Ok(array)
    }

    /// Return a slice of exactly `len` bytes borrowed from the source and advance by `len`.
    fn borrow_exact(&mut self, len: usize) -> ReadResult<&'de [u8]>;

    /// Advance the reader exactly `amt` bytes, returning an error if the source does not have
    /// enough bytes.
    fn consume(&mut self, amt: usize) -> ReadResult<()>;

    /// Number of bytes left in the source.
    fn remaining(&self) -> usize;

    /// Return a reference to the next byte without advancing.
    #[inline]
    fn peek(&mut self) -> ReadResult<&u8> {
        self.fill_buf(1)?.first().ok_or_else(|| read_size_limit(1))
    }

    /// Read and consume a single byte.
    #[inline]
    fn take_byte(&mut self) -> ReadResult<u8> {
        let byte = *self.peek()?;
        self.consume(1)?;
        Ok(byte)
    }

    /// Read and consume exactly `N` bytes.
    #[inline]
    fn take_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let array = self.fill_array::<N>()?;
        self.consume(N)?;
        Ok(array)
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Attempting to write {0} bytes")]
    WriteSizeLimit(usize),
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cold]
pub const fn write_size_limit(len: usize) -> WriteError {
    WriteError::WriteSizeLimit(len)
}

pub type WriteResult<T> = core::result::Result<T, WriteError>;

/// Trait for structured writing of bytes into a sink.
///
/// The trait is object safe; polymorphic values are packed through `&mut dyn Writer`.
pub trait Writer {
    /// Finalize the writer by performing any required cleanup or flushing.
    fn finish(&mut self) -> WriteResult<()> {
        Ok(())
    }

    /// Write exactly `src.len()` bytes from the given `src` into the writer.
    fn write(&mut self, src: &[u8]) -> WriteResult<()>;

    /// Write `len` zero bytes.
    fn write_zeros(&mut self, mut len: usize) -> WriteResult<()> {
        const ZEROS: [u8; 64] = [0; 64];
        while len > 0 {
            let chunk = len.min(ZEROS.len());
            self.write(&ZEROS[..chunk])?;
            len -= chunk;
        }
        Ok(())
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    #[inline]
    fn finish(&mut self) -> WriteResult<()> {
        (**self).finish()
    }

    #[inline]
    fn write(&mut self, src: &[u8]) -> WriteResult<()> {
        (**self).write(src)
    }

    #[inline]
    fn write_zeros(&mut self, len: usize) -> WriteResult<()> {
        (**self).write_zeros(len)
    }
}

mod slice;
#[cfg(feature = "std")]
mod std_io;
mod vec;
#[cfg(feature = "std")]
pub use std_io::IoWriter;
