//! Peak-hour reward issuance
//!
//! Consumes a peak forecast and grants each completed run that happened in a
//! peak hour (within the lookback window) exactly one reward, crediting the
//! runner's point balance by the same amount.

pub mod issuer;

pub use issuer::{list_recent_rewards, RewardIssuer};
