//! Runtime configuration for the key generator.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rand::RngCore;

use crate::account::{ChainDef, ChainRegistry};
use crate::crypto::Curve;
use crate::error::Error;
use crate::identity::IdentityPipeline;
use crate::matcher::{MatchTarget, Pattern, DEFAULT_MAX_PREFIX_LEN};
use crate::mnemonic::{Entropy, Language, STANDARD_ENTROPY_LEN};
use crate::worker::SearchBudget;

/// MetaChain key generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Derive one identity from a seed, or from fresh entropy
    Generate(GenerateArgs),
    /// Search random identities for one whose text starts with a prefix
    Search(SearchArgs),
}

/// Options shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Mnemonic dictionary language
    #[arg(short, long, value_enum, default_value_t = Language::English)]
    pub language: Language,

    /// Passphrase mixed into the key stretch
    #[arg(short, long, default_value = "")]
    pub passphrase: String,

    /// Chain the wallet address belongs to
    #[arg(short, long, default_value = "MC")]
    pub chain: String,

    /// Additional chain as NAME=ID (repeatable)
    #[arg(long = "chain-def", value_name = "NAME=ID")]
    pub chain_defs: Vec<ChainDef>,
}

impl IdentityArgs {
    pub fn chains(&self) -> ChainRegistry {
        ChainRegistry::with_alternates(&self.chain_defs)
    }

    /// Builds the derivation pipeline, resolving the chain.
    pub fn pipeline(&self, curve: Curve) -> Result<IdentityPipeline, ConfigError> {
        Ok(IdentityPipeline::new(
            self.language,
            self.passphrase.clone(),
            &self.chains(),
            &self.chain,
            curve,
        )?)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Entropy as hex (default: 32 random bytes)
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Curve of the derived key pair
    #[arg(long, value_enum, default_value_t = Curve::Secp256k1)]
    pub curve: Curve,
}

impl GenerateArgs {
    /// The configured seed, or fresh entropy from `rng`.
    pub fn entropy<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<Entropy, ConfigError> {
        match &self.seed {
            Some(seed) => Entropy::from_hex(seed).map_err(ConfigError::InvalidSeed),
            None => Ok(Entropy::random(rng, STANDARD_ENTROPY_LEN)?),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(seed) = &self.seed {
            Entropy::from_hex(seed).map_err(ConfigError::InvalidSeed)?;
        }
        self.identity.pipeline(self.curve)?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Base58 prefix to search for
    #[arg(short = 'f', long)]
    pub prefix: String,

    /// Text the prefix is matched against
    #[arg(short, long, value_enum, default_value_t = MatchTarget::Address)]
    pub target: MatchTarget,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Throughput report interval in seconds
    #[arg(short, long, default_value_t = 30)]
    pub report_interval: u64,

    /// Longest prefix accepted
    #[arg(long, default_value_t = DEFAULT_MAX_PREFIX_LEN)]
    pub max_prefix_len: usize,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Give up after this many derived identities
    #[arg(long)]
    pub max_attempts: Option<u64>,
}

impl SearchArgs {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            timeout: self.timeout.map(Duration::from_secs),
            max_attempts: self.max_attempts,
        }
    }

    /// Checked against the addresses of the resolved chain.
    pub fn pattern(&self, pipeline: &IdentityPipeline) -> Result<Pattern, ConfigError> {
        Pattern::new(self.prefix.clone(), self.target, pipeline, self.max_prefix_len).map_err(
            |source| ConfigError::InvalidPrefix {
                prefix: self.prefix.clone(),
                source,
            },
        )
    }

    /// Search always derives secp256k1 keys.
    pub fn pipeline(&self) -> Result<IdentityPipeline, ConfigError> {
        self.identity.pipeline(Curve::Secp256k1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count() == 0 {
            return Err(ConfigError::InvalidValue {
                name: "workers",
                reason: "must be at least 1".into(),
            });
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidValue {
                name: "report-interval",
                reason: "must be at least 1 second".into(),
            });
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "max-attempts",
                reason: "must be at least 1".into(),
            });
        }
        self.pattern(&self.pipeline()?)?;
        Ok(())
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Generate(args) => args.validate(),
            Command::Search(args) => args.validate(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid seed: {0}")]
    InvalidSeed(#[source] Error),

    #[error("Invalid prefix \"{prefix}\": {source}")]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: Error,
    },

    #[error("Invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Failed to spawn worker threads: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] Error),
}
