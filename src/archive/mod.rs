//! Delivery archive assembly: folder layout, manifest text and ZIP
//! packaging.

pub mod assembler;
pub mod manifest;

pub use assembler::assemble;
