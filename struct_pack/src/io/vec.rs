use {super::*, alloc::vec::Vec};

/// Writer implementation for `Vec<u8>` that appends to the vector. The vector will grow as needed.
///
/// # Examples
///
/// Writing to an existing vector.
/// ```
/// # use struct_pack::io::Writer;
/// let mut vec = vec![1, 2, 3];
/// let bytes = [4, 5, 6];
/// vec.write(&bytes).unwrap();
/// assert_eq!(vec, &[1, 2, 3, 4, 5, 6]);
/// ```
impl Writer for Vec<u8> {
    #[inline]
    fn write(&mut self, src: &[u8]) -> WriteResult<()> {
        self.extend_from_slice(src);
        Ok(())
    }

    #[inline]
    fn write_zeros(&mut self, len: usize) -> WriteResult<()> {
        self.resize(self.len() + len, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]
    use {super::*, crate::proptest_config::proptest_cfg, alloc::vec, proptest::prelude::*};

    proptest! {
        #![proptest_config(proptest_cfg())]

        #[test]
        fn vec_writer_write_new(bytes in proptest::collection::vec(any::<u8>(), 0..=100)) {
            let mut vec = Vec::new();
            vec.write(&bytes).unwrap();
            prop_assert_eq!(vec, bytes);
        }

        #[test]
        fn vec_writer_write_existing(bytes in proptest::collection::vec(any::<u8>(), 0..=100)) {
            let mut vec = vec![0; 5];
            vec.write(&bytes).unwrap();
            prop_assert_eq!(&vec[..5], &[0; 5]);
            prop_assert_eq!(&vec[5..], bytes);
        }

        #[test]
        fn vec_writer_through_dyn(bytes in proptest::collection::vec(any::<u8>(), 0..=100), zeros in 0usize..200) {
            let mut vec = Vec::new();
            {
                let writer: &mut dyn Writer = &mut vec;
                writer.write(&bytes).unwrap();
                writer.write_zeros(zeros).unwrap();
            }
            prop_assert_eq!(vec.len(), bytes.len() + zeros);
            prop_assert_eq!(&vec[..bytes.len()], &bytes[..]);
            prop_assert!(vec[bytes.len()..].iter().all(|b| *b == 0));
        }
    }
}
