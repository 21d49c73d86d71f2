//! Core business logic for foodgram.

pub mod services;

pub use services::*;
