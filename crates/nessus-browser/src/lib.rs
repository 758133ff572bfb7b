//! Browser automation for the Nessus web console.
//!
//! Provides a single-page headless browser, the [`BrowserActions`] seam the
//! web fallback is written against, and a bounded element-visibility waiter.

pub mod actions;
pub mod engine;
pub mod error;
pub mod waiter;

pub use actions::{BrowserActions, Selector};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use waiter::wait_visible;
