//! Positional label matching over line streams.
//!
//! A [`Matcher`] walks label groups in order. For every line carrying one of
//! a label's anchors it runs the strategies eligible for the label's
//! [`Position`](crate::models::label::Position), highest priority first, and
//! recurses into sub-labels over the captured text.

pub mod between;
pub mod category;
pub mod context;
pub mod directional;
pub mod matcher;
pub mod split;
pub mod state;
pub mod strategy;
pub mod succession;

pub use matcher::{LinkOutcome, LinkResolver, Matcher, NoLinks};
pub use state::MatchState;
pub use strategy::Strategy;
