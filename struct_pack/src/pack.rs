//! The write pass.
//!
//! Packing a value runs its [`Pack::visit`] traversal once without any compatible payloads (the
//! base pass) and then once per distinct compatible version, ascending. A versioned pass writes
//! nothing but the compatible fields of its own version, each as a presence flag followed by the
//! payload. Fields nested inside a compatible payload or a polymorphic pointee travel inline with
//! their enclosing value.
use {
    crate::{
        config::Config,
        error::{unregistered_polymorphic_write, WriteError, WriteResult},
        io::Writer,
        len::WidthClass,
        plan::{resolve, BufferPlan},
        schema::{poly, poly::Polymorphic, Pack, Visitor},
        signature::TypeDescription,
        size::{varint_form, SizeCalculator},
        varint::{encode_varint, VarintForm},
    },
    log::warn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Base,
    Versioned(u64),
    Inline,
}

impl Pass {
    #[inline]
    const fn writes(self) -> bool {
        !matches!(self, Pass::Versioned(_))
    }
}

/// [`Visitor`] that writes a value to a [`Writer`].
pub struct Packer<'a, W: Writer + ?Sized> {
    writer: &'a mut W,
    width: WidthClass,
    config: Config,
    form: VarintForm,
    pass: Pass,
}

impl<'a, W: Writer + ?Sized> Packer<'a, W> {
    /// Packer for the base pass, writing every length prefix with `width`.
    pub fn new(writer: &'a mut W, width: WidthClass, config: Config) -> Self {
        Self {
            writer,
            width,
            config,
            form: varint_form(config),
            pass: Pass::Base,
        }
    }

    /// Run the base pass and every versioned pass of `description` over `value`.
    pub fn pack<T: Pack + ?Sized>(
        &mut self,
        value: &T,
        description: &TypeDescription,
    ) -> WriteResult<()> {
        self.pass = Pass::Base;
        value.visit(self)?;
        for &version in description.versions() {
            self.pass = Pass::Versioned(version);
            value.visit(self)?;
        }
        self.pass = Pass::Base;
        Ok(())
    }

    fn write_compatible<T: Pack + ?Sized>(&mut self, value: Option<&T>) -> WriteResult<()> {
        self.flag(value.is_some())?;
        if let Some(value) = value {
            value.visit(self)?;
        }
        Ok(())
    }
}

impl<W: Writer + ?Sized> Visitor for Packer<'_, W> {
    type Error = WriteError;

    #[inline]
    fn config(&self) -> Config {
        self.config
    }

    #[inline]
    fn scalar(&mut self, bytes: &[u8]) -> WriteResult<()> {
        if self.pass.writes() {
            self.writer.write(bytes)?;
        }
        Ok(())
    }

    #[inline]
    fn padding(&mut self, len: usize) -> WriteResult<()> {
        if self.pass.writes() {
            self.writer.write_zeros(len)?;
        }
        Ok(())
    }

    #[inline]
    fn varint(&mut self, value: u64) -> WriteResult<()> {
        if self.pass.writes() {
            encode_varint(&mut *self.writer, value, self.form)?;
        }
        Ok(())
    }

    #[inline]
    fn len(&mut self, len: usize) -> WriteResult<()> {
        if self.pass.writes() {
            self.width.write_len(&mut *self.writer, len as u64)?;
        }
        Ok(())
    }

    #[inline]
    fn tag(&mut self, tag: u8) -> WriteResult<()> {
        if self.pass.writes() {
            self.writer.write(&[tag])?;
        }
        Ok(())
    }

    fn compatible<T: Pack + ?Sized>(&mut self, version: u64, value: Option<&T>) -> WriteResult<()> {
        match self.pass {
            Pass::Base => Ok(()),
            Pass::Versioned(current) if current == version => {
                self.pass = Pass::Inline;
                let result = self.write_compatible(value);
                self.pass = Pass::Versioned(current);
                result
            }
            Pass::Versioned(_) => Ok(()),
            Pass::Inline => self.write_compatible(value),
        }
    }

    fn inline<F>(&mut self, f: F) -> WriteResult<()>
    where
        F: FnOnce(&mut Self) -> WriteResult<()>,
    {
        match self.pass {
            Pass::Base => {
                self.pass = Pass::Inline;
                let result = f(self);
                self.pass = Pass::Base;
                result
            }
            Pass::Versioned(_) => Ok(()),
            Pass::Inline => f(self),
        }
    }

    fn polymorphic<B: ?Sized + Polymorphic + 'static>(&mut self, value: &B) -> WriteResult<()> {
        if !self.pass.writes() {
            return Ok(());
        }
        let id = value.polymorphic_id();
        if !poly::is_registered::<B>(id) {
            warn!(
                "refusing to pack unregistered polymorphic type {id:#010x} behind {}",
                core::any::type_name::<B>()
            );
            return Err(unregistered_polymorphic_write(id));
        }
        self.writer.write(&id.to_le_bytes())?;

        let mut inner: &mut W = &mut *self.writer;
        let writer: &mut dyn Writer = &mut inner;
        let mut packer = Packer {
            writer,
            width: self.width,
            config: self.config,
            form: self.form,
            pass: Pass::Inline,
        };
        value.visit_pack(&mut packer)
    }
}

/// Write the signature and, when `plan` carries one, the metainfo block.
pub fn write_header<W: Writer + ?Sized>(
    writer: &mut W,
    description: &TypeDescription,
    plan: BufferPlan,
    config: Config,
) -> WriteResult<()> {
    if !config.metainfo_enabled() {
        return Ok(());
    }
    let signature = (description.signature() & !1) | plan.has_metainfo() as u32;
    writer.write(&signature.to_le_bytes())?;
    if !plan.has_metainfo() {
        return Ok(());
    }
    writer.write(&[plan.metainfo])?;
    if let Some(width) = plan.compatible_width() {
        width.write_len(writer, plan.length)?;
    }
    if plan.has_type_literal() {
        writer.write(description.literal())?;
        writer.write(&[0])?;
    }
    Ok(())
}

/// Size `value` and decide its header and length width.
#[inline]
pub fn plan_for<T: Pack + ?Sized>(
    value: &T,
    description: &TypeDescription,
    config: Config,
) -> BufferPlan {
    resolve(SizeCalculator::calculate(value, config), description, config)
}

/// Encode `value` into `writer` under `config`.
///
/// Returns the plan the value was written with; `plan.length` bytes were written.
pub fn pack_into<T, W>(writer: &mut W, value: &T, config: Config) -> WriteResult<BufferPlan>
where
    T: Pack + ?Sized,
    W: Writer + ?Sized,
{
    let description = TypeDescription::cached::<T>(config);
    let plan = plan_for(value, &description, config);
    pack_with_plan(writer, value, &description, plan, config)?;
    Ok(plan)
}

/// Encode `value` with a plan already resolved by [`plan_for`] for the same value and config.
pub fn pack_with_plan<T, W>(
    writer: &mut W,
    value: &T,
    description: &TypeDescription,
    plan: BufferPlan,
    config: Config,
) -> WriteResult<()>
where
    T: Pack + ?Sized,
    W: Writer + ?Sized,
{
    write_header(writer, description, plan, config)?;
    Packer::new(writer, plan.len_width(), config).pack(value, description)?;
    writer.finish()?;
    Ok(())
}
