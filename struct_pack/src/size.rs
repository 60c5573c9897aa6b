//! The size pass.
use {
    crate::{
        config::Config,
        schema::{poly::Polymorphic, Pack, Visitor},
        varint::{varint_size, VarintForm},
    },
    core::{convert::Infallible, ops::Add, ops::AddAssign},
};

/// Byte count and dynamic container statistics of a value.
///
/// `total` excludes the length prefixes of dynamic containers: their width is only chosen once
/// the largest container of the whole value is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeInfo {
    pub total: u64,
    pub dynamic_count: u64,
    pub max_dynamic_len: u64,
}

impl Add for SizeInfo {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for SizeInfo {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.dynamic_count += rhs.dynamic_count;
        self.max_dynamic_len = self.max_dynamic_len.max(rhs.max_dynamic_len);
    }
}

/// [`Visitor`] that counts instead of writing.
pub struct SizeCalculator {
    info: SizeInfo,
    config: Config,
    form: VarintForm,
}

impl SizeCalculator {
    pub fn new(config: Config) -> Self {
        Self {
            info: SizeInfo::default(),
            config,
            form: varint_form(config),
        }
    }

    /// Size of one value.
    pub fn calculate<T: Pack + ?Sized>(value: &T, config: Config) -> SizeInfo {
        let mut calculator = Self::new(config);
        calculator.add(value);
        calculator.finish()
    }

    /// Accumulate the size of `value`.
    #[inline]
    pub fn add<T: Pack + ?Sized>(&mut self, value: &T) {
        match value.visit(self) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    #[inline]
    pub fn finish(self) -> SizeInfo {
        self.info
    }
}

pub(crate) const fn varint_form(config: Config) -> VarintForm {
    if config.fast_varint() {
        VarintForm::Fast
    } else {
        VarintForm::Leb128
    }
}

impl Visitor for SizeCalculator {
    type Error = Infallible;

    #[inline]
    fn config(&self) -> Config {
        self.config
    }

    #[inline]
    fn scalar(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.info.total += bytes.len() as u64;
        Ok(())
    }

    #[inline]
    fn padding(&mut self, len: usize) -> Result<(), Infallible> {
        self.info.total += len as u64;
        Ok(())
    }

    #[inline]
    fn varint(&mut self, value: u64) -> Result<(), Infallible> {
        self.info.total += varint_size(value, self.form) as u64;
        Ok(())
    }

    #[inline]
    fn len(&mut self, len: usize) -> Result<(), Infallible> {
        self.info.dynamic_count += 1;
        self.info.max_dynamic_len = self.info.max_dynamic_len.max(len as u64);
        Ok(())
    }

    #[inline]
    fn tag(&mut self, _tag: u8) -> Result<(), Infallible> {
        self.info.total += 1;
        Ok(())
    }

    #[inline]
    fn compatible<T: Pack + ?Sized>(
        &mut self,
        _version: u64,
        value: Option<&T>,
    ) -> Result<(), Infallible> {
        self.info.total += 1;
        if let Some(value) = value {
            value.visit(self)?;
        }
        Ok(())
    }

    #[inline]
    fn polymorphic<B: ?Sized + Polymorphic + 'static>(
        &mut self,
        value: &B,
    ) -> Result<(), Infallible> {
        self.info.total += size_of::<u32>() as u64;
        value.visit_size(self);
        Ok(())
    }
}

/// Size of one value under the default configuration.
pub fn calculate_one<T: Pack + ?Sized>(value: &T) -> SizeInfo {
    SizeCalculator::calculate(value, Config::DEFAULT)
}
