//! Prefix matching for vanity search.
//!
//! A pattern targets one text of a derived identity:
//! - Address: the mainnet wallet address, fixed `MC` text included
//! - PublicKey: the base58 public key

mod pattern;

pub use pattern::{MatchResult, MatchTarget, Pattern, DEFAULT_MAX_PREFIX_LEN};
