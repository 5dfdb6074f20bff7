//! Fixed point helpers for 256-bit amounts and their JSON representation.

pub mod math;
pub mod serialization;
pub mod u256_ext;
