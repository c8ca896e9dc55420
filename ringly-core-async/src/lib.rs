//! An asynchronous wrapper for the `ringly-core` protocol core.
//!
//! `ringly-core` delivers outcomes through [`ringly_core::central::CentralObserver`] and
//! [`ringly_core::peripheral::PeripheralObserver`] callbacks; this crate turns each one-shot
//! outcome into a future and each recurring one into a broadcast stream, so callers can `await`
//! a connect or a write instead of registering an observer and matching on the callback that
//! eventually fires.
//!
//! [`CentralAsync`] wraps [`ringly_core::central::Central`]; [`PeripheralAsync`] wraps the
//! per-peripheral handle it hands back from discovery, connection, and retrieval.

mod central_manager;
pub mod error;
mod peripheral;
mod util;

pub use central_manager::*;
pub use peripheral::PeripheralAsync;
