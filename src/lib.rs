//! Ripple is:
//! * a minimal, push-based event stream core built around lazy, reusable
//!   streams, single-subscription observers and cancellable subscriptions.
//! * a composition toolkit for those streams: observer-level operators
//!   inserted with `lift`, whole-stream transformers applied with `compose`
//!   and serialized delivery for concurrent producers via `serialize`.
pub mod stream;
pub mod sync;
pub mod utils;
