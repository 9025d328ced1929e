//! Single-spot routes

pub mod handlers;

pub use handlers::*;
