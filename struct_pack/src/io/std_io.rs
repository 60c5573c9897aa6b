use super::*;

/// Adapts any [`std::io::Write`] into a [`Writer`].
///
/// [`Writer::finish`] flushes the inner writer.
pub struct IoWriter<W>(pub W);

impl<W: std::io::Write> Writer for IoWriter<W> {
    #[inline]
    fn write(&mut self, src: &[u8]) -> WriteResult<()> {
        self.0.write_all(src)?;
        Ok(())
    }

    fn finish(&mut self) -> WriteResult<()> {
        self.0.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Cursor};

    #[test]
    fn io_writer_writes_through() {
        let mut writer = IoWriter(Cursor::new(Vec::new()));
        writer.write(&[1, 2, 3]).unwrap();
        writer.write_zeros(2).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.0.into_inner(), vec![1, 2, 3, 0, 0]);
    }

    #[test]
    fn io_writer_reports_short_sink() {
        let mut buf = [0u8; 2];
        let mut writer = IoWriter(Cursor::new(&mut buf[..]));
        assert!(matches!(writer.write(&[1, 2, 3]), Err(WriteError::Io(_))));
    }
}
