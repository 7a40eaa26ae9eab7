//! Block aggregation and matching.
//!
//! - `service`: the single-pass fold from records to [`crate::models::BlockStats`]
//! - `matcher`: the pluggable matcher interface and the destination matcher
//! - `pipeline`: normalization plus aggregation for one block

mod accounts;
mod error;
mod matcher;
mod pipeline;
mod service;

pub use accounts::ActiveAccounts;
pub use error::MatcherError;
pub use matcher::{DestinationMatcher, Matcher};
pub use pipeline::BlockPipeline;
pub use service::{aggregate, BlockAggregator};
