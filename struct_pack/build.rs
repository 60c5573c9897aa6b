use std::io::Result;

mod codegen;

fn main() -> Result<()> {
    codegen::generate()?;

    for source in codegen::SOURCES {
        println!("cargo:rerun-if-changed={source}");
    }
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
