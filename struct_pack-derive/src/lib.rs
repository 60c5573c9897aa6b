//! Derive macros for `Pack` and `Unpack`.
//!
//! Container attributes, written as `#[struct_pack(...)]`:
//! - `internal`: refer to the crate as `crate::`, for use inside `struct_pack` itself.
//! - `fixed_layout`: on `#[repr(C)]` structs of fixed-size fields, encode the zero padding of the
//!   in-memory layout between fields so the encoding mirrors the struct byte for byte.
//! - `id = N`: the `u32` id of the type behind a `PolyBox`, in place of its type code.
//!
//! `#[repr(packed)]` types are rejected, as are enums without variants or with more than 255.
//!
//! Refer to the [`struct_pack`](https://docs.rs/struct_pack) crate for examples.
use {
    proc_macro::TokenStream,
    syn::{parse_macro_input, DeriveInput},
};

mod common;
mod pack;
mod unpack;

/// Implement `Pack` for a struct or enum.
#[proc_macro_derive(Pack, attributes(struct_pack))]
pub fn derive_pack(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match pack::generate(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.write_errors().into(),
    }
}

/// Implement `Unpack` for a struct or enum, and `FieldAt<I>` for every field of a struct.
#[proc_macro_derive(Unpack, attributes(struct_pack))]
pub fn derive_unpack(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match unpack::generate(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.write_errors().into(),
    }
}
