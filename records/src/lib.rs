//! Best completion times per difficulty.
//!
//! The engine only reports a [`Completion`](sweeper_core::Completion) when a
//! game is won; deciding whether it is a record and keeping it across runs
//! happens here.

pub use error::*;
pub use store::*;
pub use times::*;

mod error;
mod store;
mod times;
