//! Prompt Enhancer Library
//!
//! Captures a text selection on a page, sends it to a rewriting webhook
//! and puts the enhanced text back where the selection was.

pub mod config;
pub mod core;
pub mod document;
pub mod error;
pub mod feedback;
pub mod mutator;
pub mod pipeline;
pub mod relay;
pub mod selection;
pub mod status;
pub mod trigger;
pub mod utils;

use std::sync::{Arc, Mutex};

/// State shared between the pipeline components
pub type Shared<T> = Arc<Mutex<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
