//! HTTP route handlers

pub mod quotes;

pub use quotes::router;
