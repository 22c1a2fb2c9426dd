//! Concurrent hidden-path probing.
//!
//! Splits the scan into a liveness pre-filter (TCP connect), a per-request
//! classifier (valid-status policy + 403 bypass delegation), and a fixed
//! worker pool that drains the wordlist exactly once.

pub mod bypass;
pub mod dispatcher;
pub mod liveness;
pub mod probe;

pub use bypass::BYPASS_VARIANTS;
pub use dispatcher::Dispatcher;
pub use liveness::{expand_cidr, filter_live, is_alive};
pub use probe::{Classifier, OOB_HEADER, USER_AGENTS};
