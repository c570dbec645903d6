//! Accounts: private key, public key and wallet address.
//!
//! An [`Account`] moves through three states:
//!
//! - `Unkeyed`: nothing loaded
//! - `Keyed`: private key only, the public key is not calculated yet
//! - `PubKeyed`: a [`KeyPair`] with a public key valid for its curve
//!
//! Address operations live on [`KeyPair`], so code holding one can never ask
//! for an address before the public key exists. The same operations on
//! [`Account`] fail with [`Error::PublicKeyMissing`].

mod address;
mod chain;

pub use address::{
    tokenize, untokenize, verify_wallet_address, AddressFlags, AddressTextRange, ChainId,
    WalletAddress, ADDRESS_LEN, WALLET_ADDRESS_STD_PREFIX, WALLET_ADDRESS_VERSION,
};
pub use chain::{ChainDef, ChainRegistry};

use crate::crypto::{Curve, KeyDeriver, PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::mnemonic::KeyMaterial;

/// A private key with its derived public key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    curve: Curve,
    address: Option<WalletAddress>,
}

impl KeyPair {
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Builds the address for `chain` without storing it.
    pub fn address_for(&self, chain: ChainId, testnet: bool) -> WalletAddress {
        WalletAddress::new(chain, self.curve, testnet, &self.public_key)
    }

    /// Resolves `chain_name`, builds the address and stores it as this key
    /// pair's canonical address.
    pub fn wallet_address(
        &mut self,
        chains: &ChainRegistry,
        chain_name: &str,
        testnet: bool,
    ) -> Result<WalletAddress> {
        let address = self.address_for(chains.resolve(chain_name)?, testnet);
        self.address = Some(address);
        Ok(address)
    }

    pub fn set_wallet_address(&mut self, address: WalletAddress) {
        self.address = Some(address);
    }

    /// The canonical address, if one was computed.
    pub fn stored_wallet_address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    /// Verifies the stored address text. False when none is stored.
    pub fn verify_wallet_address(&self) -> bool {
        self.address
            .map(|a| verify_wallet_address(&a.to_string()))
            .unwrap_or(false)
    }
}

/// An account in one of its three key states.
#[derive(Debug, Clone, Default)]
pub enum Account {
    #[default]
    Unkeyed,
    Keyed(PrivateKey),
    PubKeyed(KeyPair),
}

impl Account {
    /// A keyed account whose private key is the stretched key material.
    pub fn new(material: &KeyMaterial) -> Self {
        Account::Keyed(PrivateKey::from_key_material(material))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        Account::Keyed(private_key)
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        match self {
            Account::Unkeyed => None,
            Account::Keyed(private_key) => Some(private_key),
            Account::PubKeyed(pair) => Some(&pair.private_key),
        }
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.key_pair().ok().map(KeyPair::public_key)
    }

    /// Derives the public key on `curve`.
    pub fn calc_pub_key(&mut self, curve: Curve) -> Result<&mut KeyPair> {
        self.calc_pub_key_with(curve.deriver().as_ref())
    }

    /// Derives the public key with `deriver`. On failure the account keeps
    /// its previous state.
    pub fn calc_pub_key_with(&mut self, deriver: &dyn KeyDeriver) -> Result<&mut KeyPair> {
        let curve = deriver.curve();
        let private_key = self
            .private_key()
            .ok_or(Error::KeyDerivationFailed(curve.name()))?;
        let public_key = deriver.derive_public_key(private_key)?;
        let private_key = private_key.clone();

        *self = Account::PubKeyed(KeyPair {
            private_key,
            public_key,
            curve,
            address: None,
        });
        self.key_pair_mut()
    }

    pub fn key_pair(&self) -> Result<&KeyPair> {
        match self {
            Account::PubKeyed(pair) => Ok(pair),
            _ => Err(Error::PublicKeyMissing),
        }
    }

    pub fn key_pair_mut(&mut self) -> Result<&mut KeyPair> {
        match self {
            Account::PubKeyed(pair) => Ok(pair),
            _ => Err(Error::PublicKeyMissing),
        }
    }

    pub fn into_key_pair(self) -> Result<KeyPair> {
        match self {
            Account::PubKeyed(pair) => Ok(pair),
            _ => Err(Error::PublicKeyMissing),
        }
    }

    /// See [`KeyPair::wallet_address`].
    pub fn wallet_address(
        &mut self,
        chains: &ChainRegistry,
        chain_name: &str,
        testnet: bool,
    ) -> Result<WalletAddress> {
        self.key_pair_mut()?
            .wallet_address(chains, chain_name, testnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(fill: u8) -> KeyMaterial {
        KeyMaterial::from_bytes([fill; 64])
    }

    #[test]
    fn test_address_requires_public_key() {
        let chains = ChainRegistry::default();
        let mut account = Account::new(&material(0x11));
        assert_eq!(
            account.wallet_address(&chains, "MC", false),
            Err(Error::PublicKeyMissing)
        );
        assert!(account.public_key().is_none());
        assert_eq!(
            Account::Unkeyed.wallet_address(&chains, "MC", false),
            Err(Error::PublicKeyMissing)
        );
    }

    #[test]
    fn test_calc_pub_key_is_deterministic() {
        let mut a = Account::new(&material(0x11));
        let mut b = Account::new(&material(0x11));
        let pa = *a.calc_pub_key(Curve::Secp256k1).unwrap().public_key();
        let pb = *b.calc_pub_key(Curve::Secp256k1).unwrap().public_key();
        assert_eq!(pa, pb);
        // recalculating on the same account yields the same key
        let again = *a.calc_pub_key(Curve::Secp256k1).unwrap().public_key();
        assert_eq!(pa, again);
    }

    #[test]
    fn test_failed_derivation_keeps_state() {
        let mut account = Account::new(&material(0x00));
        assert_eq!(
            account.calc_pub_key(Curve::Secp256k1).err(),
            Some(Error::KeyDerivationFailed("SECP256k1"))
        );
        assert!(matches!(account, Account::Keyed(_)));

        let mut unkeyed = Account::Unkeyed;
        assert!(unkeyed.calc_pub_key(Curve::Secp256r1).is_err());
        assert!(matches!(unkeyed, Account::Unkeyed));
    }

    #[test]
    fn test_curve_sets_flag_bit() {
        let chains = ChainRegistry::default();
        let mut account = Account::new(&material(0x22));

        let k1 = account
            .calc_pub_key(Curve::Secp256k1)
            .unwrap()
            .wallet_address(&chains, "MC", false)
            .unwrap();
        assert!(k1.flags().is_secp256k1());

        let r1 = account
            .calc_pub_key(Curve::Secp256r1)
            .unwrap()
            .wallet_address(&chains, "MC", false)
            .unwrap();
        assert!(r1.flags().is_secp256r1());
        assert_ne!(k1.payload(), r1.payload());
    }

    #[test]
    fn test_mainnet_and_testnet_verify() {
        let chains = ChainRegistry::default();
        let mut account = Account::new(&material(0x33));
        let pair = account.calc_pub_key(Curve::Secp256k1).unwrap();
        assert!(!pair.verify_wallet_address());

        let main = pair.wallet_address(&chains, "TCT", false).unwrap();
        assert!(pair.verify_wallet_address());
        let test = pair.wallet_address(&chains, "TCT", true).unwrap();
        assert_eq!(pair.stored_wallet_address(), Some(&test));

        assert!(verify_wallet_address(&main.to_string()));
        assert!(verify_wallet_address(&test.to_string()));
        assert_ne!(main.to_string(), test.to_string());
        assert_eq!(main.chain(), ChainId(1));
    }

    #[test]
    fn test_unknown_chain() {
        let chains = ChainRegistry::default();
        let mut account = Account::new(&material(0x44));
        let pair = account.calc_pub_key(Curve::Secp256k1).unwrap();
        assert_eq!(
            pair.wallet_address(&chains, "NOPE", false),
            Err(Error::UnknownChain("NOPE".into()))
        );
        assert!(pair.stored_wallet_address().is_none());
    }
}
