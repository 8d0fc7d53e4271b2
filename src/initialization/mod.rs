//! Process-level initialization.
//!
//! Embedding applications usually configure logging themselves; the
//! `spillway` binary uses [`init_logger_with`].

mod logger;

pub use logger::init_logger_with;
