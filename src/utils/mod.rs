//! Utility modules

pub mod url;

pub use self::url::{extract_domain, is_allowed_domain, is_valid_url};
