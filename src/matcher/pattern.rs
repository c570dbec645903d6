//! Prefix matching over base58 text.

use std::fmt;

use clap::ValueEnum;

use crate::account::{AddressFlags, AddressTextRange, ChainId};
use crate::crypto::Curve;
use crate::encoding::decode_base58;
use crate::error::{Error, Result};
use crate::identity::{Identity, IdentityPipeline};

/// Longest prefix accepted by default. Expected attempts grow as 58^n.
pub const DEFAULT_MAX_PREFIX_LEN: usize = 9;

/// Which text of a derived identity the prefix is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchTarget {
    /// The mainnet wallet address, including its `MC` prefix
    #[default]
    Address,
    /// The base58 public key
    #[value(name = "pubkey")]
    PublicKey,
}

impl fmt::Display for MatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTarget::Address => write!(f, "address"),
            MatchTarget::PublicKey => write!(f, "pubkey"),
        }
    }
}

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A validated prefix.
#[derive(Debug, Clone)]
pub struct Pattern {
    prefix: String,
    target: MatchTarget,
    /// Leading text every candidate shares, empty when nothing is fixed
    fixed: String,
}

impl Pattern {
    /// Validates `prefix` against the texts `pipeline` can produce.
    pub fn new(
        prefix: impl Into<String>,
        target: MatchTarget,
        pipeline: &IdentityPipeline,
        max_len: usize,
    ) -> Result<Self> {
        match target {
            MatchTarget::Address => {
                Self::address(prefix, pipeline.chain(), pipeline.curve(), max_len)
            }
            MatchTarget::PublicKey => Self::public_key(prefix, max_len),
        }
    }

    /// A prefix of the base58 public key.
    pub fn public_key(prefix: impl Into<String>, max_len: usize) -> Result<Self> {
        Ok(Self {
            prefix: checked_text(prefix.into(), max_len)?,
            target: MatchTarget::PublicKey,
            fixed: String::new(),
        })
    }

    /// A prefix of the mainnet address on `chain`. Rejected when no address
    /// with that header can start with it.
    pub fn address(
        prefix: impl Into<String>,
        chain: ChainId,
        curve: Curve,
        max_len: usize,
    ) -> Result<Self> {
        let prefix = checked_text(prefix.into(), max_len)?;
        let range = AddressTextRange::new(chain, AddressFlags::new(curve, false));

        if !range.admits(&prefix) {
            return Err(Error::UndecodableText {
                alphabet: "base58",
                reason: format!(
                    "addresses on chain {chain} start with \"{}\", none can start with \"{prefix}\"",
                    range.fixed_prefix()
                ),
            });
        }

        Ok(Self {
            prefix,
            target: MatchTarget::Address,
            fixed: range.fixed_prefix().to_string(),
        })
    }

    /// Returns the prefix string.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target(&self) -> MatchTarget {
        self.target
    }

    /// Matches the target text of `identity`.
    #[inline]
    pub fn matches(&self, identity: &Identity) -> MatchResult {
        let text = match self.target {
            MatchTarget::Address => identity.address().to_string(),
            MatchTarget::PublicKey => identity.key_pair().public_key().to_base58(),
        };
        self.matches_text(&text)
    }

    #[inline]
    pub fn matches_text(&self, text: &str) -> MatchResult {
        if text.starts_with(&self.prefix) {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Characters the search actually has to hit. Those fixed by the
    /// address header come for free.
    fn free_chars(&self) -> usize {
        self.prefix.len().saturating_sub(self.fixed.len())
    }

    /// Returns the estimated difficulty (number of attempts to find a match).
    ///
    /// Each free base58 character has up to 58 possible values, so expected
    /// attempts = 58^n. The first free character of an address may have
    /// fewer, which makes this an approximation.
    pub fn estimated_difficulty(&self) -> u64 {
        58u64.saturating_pow(self.free_chars() as u32)
    }

    /// Returns a human-readable difficulty estimate. Each attempt includes a
    /// 2048-round PBKDF2, so thresholds are far lower than for raw key search.
    pub fn difficulty_description(&self) -> String {
        match self.estimated_difficulty() {
            0..=1_000 => "Easy (seconds)".into(),
            1_001..=100_000 => "Medium (minutes)".into(),
            100_001..=10_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

/// Length, emptiness and alphabet checks, in that order.
fn checked_text(prefix: String, max_len: usize) -> Result<String> {
    if prefix.chars().count() > max_len {
        return Err(Error::PrefixTooLong {
            prefix,
            max: max_len,
        });
    }
    if prefix.is_empty() {
        return Err(Error::UndecodableText {
            alphabet: "base58",
            reason: "empty prefix".into(),
        });
    }
    decode_base58(&prefix)?;
    Ok(prefix)
}
