//! wintest-core: Desktop automation library
//!
//! This library provides the operations behind the wintest tools: screen and
//! window capture, keyboard and mouse synthesis, window lookup by owning
//! process, and process launch, listing and termination. It includes the
//! native backends, a mock backend for headless testing, and error handling.

pub mod backend;
pub mod capture;
pub mod constants;
pub mod error;
pub mod keys;
pub mod model;
pub mod ops;
pub mod util;
