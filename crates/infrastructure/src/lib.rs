//! Argent DNS Infrastructure Layer
//!
//! Upstream pool, bootstrap chain, routing table, bind retry, and the
//! listener/relay plumbing around them.
pub mod dns;
