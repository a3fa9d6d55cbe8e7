//! This module contains ripple's event stream core. The module is organized
//! into the following sub modules:
//! * `observable` which implements the [Stream](observable::Stream) type - a
//!   lazy, reusable description of how to produce a sequence of events, along
//!   with the safe and unsafe subscription entry points.
//! * `observer` which implements the event sink side: the
//!   [Observer](observer::Observer) trait, event and fault types, and a
//!   builder for assembling observers out of closures.
//! * `ops` which contains the [Operator](ops::Operator) trait consumed by
//!   `lift` and all of the built-in stream operators.
//! * `subscription` which implements the
//!   [Subscription](subscription::Subscription) cancellation handle tying one
//!   stream execution to the current scope.
//! * `transform` which implements the [Transformer](transform::Transformer)
//!   trait consumed by `compose` and the running average transformer.
pub mod observable;
pub mod observer;
pub mod ops;
mod serialize;
pub mod subscription;
pub mod transform;
