//! Entropy → mnemonic → key material → keys → addresses.

use std::fmt;

use crate::account::{verify_wallet_address, Account, ChainId, ChainRegistry, KeyPair, WalletAddress};
use crate::crypto::{Curve, KeyDeriver};
use crate::error::Result;
use crate::mnemonic::{Entropy, Language, Mnemonic, MnemonicCodec};

/// A fully derived identity.
#[derive(Debug, Clone)]
pub struct Identity {
    entropy: Entropy,
    mnemonic: Mnemonic,
    mnemonic_valid: bool,
    key_pair: KeyPair,
    chain_name: String,
    mainnet: WalletAddress,
    testnet: WalletAddress,
}

impl Identity {
    pub fn entropy(&self) -> &Entropy {
        &self.entropy
    }

    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn is_mnemonic_valid(&self) -> bool {
        self.mnemonic_valid
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    /// The canonical (mainnet) address.
    pub fn address(&self) -> &WalletAddress {
        &self.mainnet
    }

    pub fn testnet_address(&self) -> &WalletAddress {
        &self.testnet
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = self.key_pair.curve();
        let mainnet = self.mainnet.to_string();
        let testnet = self.testnet.to_string();

        writeln!(f, "Using Seed: {}", self.entropy.to_hex())?;
        writeln!(f, "Mnemonic: {}", self.mnemonic)?;
        writeln!(f, "Is Mnemonic valid: {}", self.mnemonic_valid)?;
        writeln!(f, "[base16] Private key: {}", self.key_pair.private_key().to_hex())?;
        writeln!(f, "[base58] Private key: {}", self.key_pair.private_key().to_base58())?;
        writeln!(
            f,
            "[{curve} - base16] The public key is: {}",
            self.key_pair.public_key().to_hex()
        )?;
        writeln!(
            f,
            "[{curve} - base58] The public key is: {}",
            self.key_pair.public_key().to_base58()
        )?;
        writeln!(
            f,
            "The wallet address is (Mainnet | {curve} | {}): {mainnet}",
            self.chain_name
        )?;
        writeln!(
            f,
            "The wallet address is (Testnet | {curve} | {}): {testnet}",
            self.chain_name
        )?;
        writeln!(f, "=============================")?;
        writeln!(
            f,
            "Verifying Mainnet {curve} address: {}",
            verify_wallet_address(&mainnet)
        )?;
        write!(
            f,
            "Verifying Testnet {curve} address: {}",
            verify_wallet_address(&testnet)
        )
    }
}

/// Resolved, immutable inputs of a derivation run.
#[derive(Debug, Clone)]
pub struct IdentityPipeline {
    codec: MnemonicCodec,
    passphrase: String,
    chain_name: String,
    chain: ChainId,
    curve: Curve,
}

impl IdentityPipeline {
    /// Resolves `chain_name` up front so derivations cannot fail on it.
    pub fn new(
        language: Language,
        passphrase: impl Into<String>,
        chains: &ChainRegistry,
        chain_name: &str,
        curve: Curve,
    ) -> Result<Self> {
        Ok(Self {
            codec: MnemonicCodec::new(language),
            passphrase: passphrase.into(),
            chain_name: chain_name.to_string(),
            chain: chains.resolve(chain_name)?,
            curve,
        })
    }

    pub fn codec(&self) -> &MnemonicCodec {
        &self.codec
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Derives an identity on the configured curve.
    pub fn derive(&self, entropy: Entropy) -> Result<Identity> {
        self.derive_with(entropy, self.curve.deriver().as_ref())
    }

    /// Derives an identity using `deriver`, whose curve takes precedence over
    /// the configured one. Workers pass their own deriver to reuse its context.
    pub fn derive_with(&self, entropy: Entropy, deriver: &dyn KeyDeriver) -> Result<Identity> {
        let mnemonic = self.codec.encode(&entropy)?;
        let mnemonic_valid = self.codec.is_valid(mnemonic.words());
        let material = self.codec.decode(mnemonic.words(), &self.passphrase)?;

        let mut account = Account::new(&material);
        account.calc_pub_key_with(deriver)?;
        let mut key_pair = account.into_key_pair()?;

        let mainnet = key_pair.address_for(self.chain, false);
        let testnet = key_pair.address_for(self.chain, true);
        key_pair.set_wallet_address(mainnet);

        Ok(Identity {
            entropy,
            mnemonic,
            mnemonic_valid,
            key_pair,
            chain_name: self.chain_name.clone(),
            mainnet,
            testnet,
        })
    }
}
