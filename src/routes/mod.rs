//! Router Module Index
//!
//! Routes are split by access level so authentication is applied once, at
//! the module boundary, instead of being remembered per endpoint.

/// Routes accessible to anonymous callers (read-only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;
