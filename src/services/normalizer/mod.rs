//! Transaction normalization.
//!
//! Resolves the inconsistent payload shapes the ledger network emits into one
//! canonical [`crate::models::TxRecord`].

mod error;
mod resolvers;
mod service;

pub use error::NormalizationError;
pub use resolvers::{TxView, BODY_KEYS};
pub use service::{drops_to_native, normalize};
