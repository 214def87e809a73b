//! Where dependency working trees come from.

pub mod git;

pub use git::{GitCheckout, SyncOutcome};
