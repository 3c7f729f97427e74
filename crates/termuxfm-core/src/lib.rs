//! # termuxfm-core
//!
//! Core crate for Termux File Manager. Contains the storage traits every
//! backend implements, configuration schemas, logical path rules, the
//! script catalogue, and the unified error system.
//!
//! This crate has **no** internal dependencies on other termuxfm crates.

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod scripts;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
