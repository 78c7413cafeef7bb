//! Core processing modules
//!
//! Turning a captured selection into enhanced text: the request itself and
//! the normalization of whatever the rewriting service answered.

pub mod enhancer;
pub mod normalize;

pub use enhancer::{EnhancementRequester, EnhancementResult, FailureKind, RequesterOptions};
pub use normalize::normalize_payload;
