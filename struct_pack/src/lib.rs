//! struct_pack is a binary serializer whose buffers carry a 32-bit hash of the exact type layout
//! they were written with.
//!
//! Every encoding starts with that signature, so decoding into a type whose fields differ in
//! order or kind fails up front instead of producing garbage. Types evolve by appending
//! [`Compatible`] fields: they do not change the signature, older readers skip them, and newer
//! readers see them as empty when reading older data.
//!
//! Encoding runs two traversals of the value over one shared dispatch table ([`Pack::visit`]):
//! the size pass computes the exact buffer length, including the narrowest width able to hold
//! every container length, and the write pass fills the buffer.
//!
//! # Quickstart
//!
//! ```
//! # #[cfg(feature = "derive")] {
//! use struct_pack::{Compatible, Pack, Unpack};
//!
//! #[derive(Pack, Unpack, Debug, PartialEq)]
//! struct Person {
//!     id: i32,
//!     name: String,
//! }
//!
//! let person = Person { id: 10, name: "tom".into() };
//! let bytes = struct_pack::serialize(&person).unwrap();
//! // signature, i32, one byte length, "tom"
//! assert_eq!(bytes.len(), 4 + 4 + 1 + 3);
//! assert_eq!(struct_pack::deserialize::<Person>(&bytes).unwrap(), person);
//!
//! // A later version of the same type.
//! #[derive(Pack, Unpack, Debug, PartialEq)]
//! struct PersonV2 {
//!     id: i32,
//!     name: String,
//!     email: Compatible<String, 1>,
//! }
//!
//! let upgraded = struct_pack::deserialize::<PersonV2>(&bytes).unwrap();
//! assert_eq!(upgraded.email, Compatible::none());
//! # }
//! ```
//!
//! # Configuration
//!
//! The header and the integer encoding are chosen per call with a [`Config`]:
//!
//! ```
//! use struct_pack::config::Config;
//!
//! let config = Config::ENABLE_TYPE_INFO | Config::ENCODING_WITH_VARINT;
//! let bytes = struct_pack::serialize_with_config(&vec![1u64, 2, 3], config).unwrap();
//! let decoded: Vec<u64> = struct_pack::deserialize_with_config(&bytes, config).unwrap();
//! assert_eq!(decoded, [1, 2, 3]);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
extern crate alloc;

pub mod config;
pub mod error;
pub use error::{ReadError, ReadResult, WriteError, WriteResult};
pub mod io;
pub mod len;
pub mod pack;
pub mod plan;
pub mod schema;
pub use schema::*;
mod serde;
pub use serde::*;
pub mod signature;
pub use signature::{get_type_code, get_type_literal};
pub mod size;
pub use size::{calculate_one, SizeCalculator, SizeInfo};
pub mod unpack;
pub use {config::Config, pack::Packer, plan::resolve, unpack::Unpacker};
mod util;
pub mod varint;
#[cfg(test)]
mod proptest_config;
#[cfg(feature = "derive")]
pub use struct_pack_derive::*;

// Tuple implementations.
include!(concat!(env!("OUT_DIR"), "/tuples.rs"));
