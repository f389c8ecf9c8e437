//! Concrete trace source implementations

pub mod csv;
pub mod memory;
