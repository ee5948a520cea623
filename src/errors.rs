//! Error Types
//!
//! This module defines the error types used throughout the compositing core.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ChromaError>`.

use thiserror::Error;

/// The main error type for the compositing core.
#[derive(Error, Debug)]
pub enum ChromaError {
    // ========================================================================
    // Composite Configuration Errors
    // ========================================================================
    /// A parent assignment would have made a composite its own ancestor.
    /// The assignment is rejected and the parent reverts to none.
    #[error("Composite parent assignment rejected, '{0}' would become its own ancestor")]
    CompositeCycle(String),

    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// The requested asset was not found in the store.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// A keyer was asked to bind without a material assigned.
    #[error("Keyer '{0}' has no material assigned")]
    KeyerMaterialMissing(String),
}

/// Alias for `Result<T, ChromaError>`.
pub type Result<T> = std::result::Result<T, ChromaError>;
