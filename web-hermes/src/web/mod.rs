//! Browser bindings, only compiled for `wasm32`.
mod env;
mod global;
mod log;
mod worker;

pub use env::*;
pub use global::*;
pub use log::*;
pub use worker::*;
