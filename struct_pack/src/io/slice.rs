use {super::*, core::mem};

impl<'de> Reader<'de> for &'de [u8] {
    #[inline]
    fn fill_buf(&mut self, n_bytes: usize) -> ReadResult<&[u8]> {
        Ok(&self[..n_bytes.min(self.len())])
    }

    #[inline]
    fn fill_exact(&mut self, n_bytes: usize) -> ReadResult<&[u8]> {
        let Some(src) = self.get(..n_bytes) else {
            return Err(read_size_limit(n_bytes));
        };
        Ok(src)
    }

    #[inline]
    fn borrow_exact(&mut self, len: usize) -> ReadResult<&'de [u8]> {
        let Some((src, rest)) = self.split_at_checked(len) else {
            return Err(read_size_limit(len));
        };
        *self = rest;
        Ok(src)
    }

    #[inline]
    fn consume(&mut self, amt: usize) -> ReadResult<()> {
        let Some(rest) = self.get(amt..) else {
            return Err(read_size_limit(amt));
        };
        *self = rest;
        Ok(())
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.len()
    }
}

/// Writer implementation for a fixed-capacity byte slice.
///
/// Each write advances the slice past the written bytes. Writes that do not fit
/// fail without touching the slice.
impl Writer for &mut [u8] {
    #[inline]
    fn write(&mut self, src: &[u8]) -> WriteResult<()> {
        if src.len() > self.len() {
            return Err(write_size_limit(src.len()));
        }
        let (dst, rest) = mem::take(self).split_at_mut(src.len());
        dst.copy_from_slice(src);
        *self = rest;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]
    use {super::*, crate::proptest_config::proptest_cfg, proptest::prelude::*};

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn slice_reader_borrow_and_consume(bytes in proptest::collection::vec(any::<u8>(), 1..=100)) {
            let mut reader = bytes.as_slice();
            let half = bytes.len() / 2;
            let head = reader.borrow_exact(half).unwrap();
            prop_assert_eq!(head, &bytes[..half]);
            prop_assert_eq!(reader.remaining(), bytes.len() - half);
            reader.consume(reader.remaining()).unwrap();
            prop_assert!(reader.take_byte().is_err());
        }

        #[test]
        fn slice_writer_fills_exactly(bytes in proptest::collection::vec(any::<u8>(), 0..=100)) {
            let mut buf = vec![0u8; bytes.len()];
            let mut writer = buf.as_mut_slice();
            writer.write(&bytes).unwrap();
            prop_assert!(writer.is_empty());
            prop_assert!(writer.write(&[1]).is_err());
            prop_assert_eq!(buf, bytes);
        }
    }

    #[test]
    fn slice_reader_fill_does_not_advance() {
        let bytes = [1u8, 2, 3];
        let mut reader = &bytes[..];
        assert_eq!(reader.fill_exact(2).unwrap(), &[1, 2]);
        assert_eq!(reader.take_array::<3>().unwrap(), [1, 2, 3]);
        assert!(matches!(reader.fill_exact(1), Err(ReadError::ReadSizeLimit(1))));
    }

    #[test]
    fn slice_writer_write_zeros() {
        let mut buf = [0xffu8; 100];
        let mut writer = &mut buf[..];
        writer.write_zeros(70).unwrap();
        assert_eq!(writer.len(), 30);
        assert!(buf[..70].iter().all(|b| *b == 0));
        assert!(buf[70..].iter().all(|b| *b == 0xff));
    }
}
