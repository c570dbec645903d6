//! # mc_keygen
//!
//! MetaChain key generator: mnemonic codec, wallet addresses and vanity
//! search.
//!
//! ## Architecture
//!
//! - `mnemonic`: entropy ↔ word list, and words → stretched key material
//! - `crypto`: private/public keys, curve derivers, hashes
//! - `account`: account key states, chain registry, wallet address codec
//! - `identity`: the entropy → mnemonic → keys → addresses pipeline
//! - `matcher`: base58 prefix matching
//! - `worker`: parallel search and worker pool management
//! - `config`: runtime configuration

pub mod account;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod mnemonic;
pub mod worker;

pub use account::{verify_wallet_address, Account, ChainRegistry, KeyPair, WalletAddress};
pub use config::{Config, ConfigError};
pub use crypto::{Curve, KeyDeriver, PrivateKey, PublicKey};
pub use error::{Error, Result};
pub use identity::{Identity, IdentityPipeline};
pub use matcher::{MatchResult, MatchTarget, Pattern};
pub use mnemonic::{Entropy, KeyMaterial, Language, Mnemonic, MnemonicCodec};
pub use worker::{SearchBudget, SearchOutcome, StopReason, VanityResult, WorkerPool};
