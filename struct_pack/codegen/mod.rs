//! Build-time generation of the `Pack`/`Unpack` impls that cannot be written generically.
use std::{
    env,
    fs::File,
    io::{BufWriter, Error, Result, Write},
    path::PathBuf,
};

mod tuple;

/// Files whose changes require running the codegen again.
pub(crate) const SOURCES: [&str; 2] = ["codegen/mod.rs", "codegen/tuple.rs"];

/// Tuples from pairs up to this arity encode as `TUPLE ... END`.
const MAX_TUPLE_ARITY: usize = 16;

/// Write `tuples.rs` into `OUT_DIR`, where `lib.rs` includes it.
pub(crate) fn generate() -> Result<()> {
    let out_dir = env::var_os("OUT_DIR").ok_or_else(|| Error::other("OUT_DIR not set"))?;
    let path = PathBuf::from(out_dir).join("tuples.rs");

    let mut out = BufWriter::new(File::create(path)?);
    tuple::generate(MAX_TUPLE_ARITY, &mut out)?;
    out.flush()
}
