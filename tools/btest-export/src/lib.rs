//! btest-export library
//!
//! Turns the gzipped JSON test-vector corpus into `.btest` files for the
//! m64k conformance harness. The binary layout itself lives in `m64k-btest`;
//! this crate owns the plumbing around it: gunzip + JSON decode, file
//! discovery, output naming, and atomic writes.

pub mod convert;
pub mod json;

pub use convert::{convert_file, find_inputs, output_path, ConvertStats};
pub use json::read_tests;
