#![allow(dead_code)]

mod archive;
mod registry;

pub use archive::*;
pub use registry::*;
