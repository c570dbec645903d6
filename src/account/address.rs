//! Wallet address layout, tokenization and verification.
//!
//! Byte layout (28 bytes):
//!
//! ```text
//! [chain id: 2, big-endian][version: 1][flags: 1][payload: 20][checksum: 4]
//! ```
//!
//! - payload = RIPEMD-160(SHA-256(public key))
//! - checksum = SHA-256(SHA-256(first 24 bytes))[..4]
//!
//! The printable form is `"MC"` followed by the base58 encoding of the layout.

use std::fmt;

use crate::crypto::{hash160, sha256d, Curve, PublicKey};
use crate::encoding::{decode_base58, encode_base58};
use crate::error::{Error, Result};

/// Human-readable prefix of every wallet address.
pub const WALLET_ADDRESS_STD_PREFIX: &str = "MC";

/// Address format version.
pub const WALLET_ADDRESS_VERSION: u8 = 1;

const HEADER_LEN: usize = 4;
const PAYLOAD_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;

/// Total length of the decoded address layout.
pub const ADDRESS_LEN: usize = HEADER_LEN + PAYLOAD_LEN + CHECKSUM_LEN;

/// Numeric chain identifier. `0` is the base chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChainId(pub u16);

impl ChainId {
    pub const BASE: ChainId = ChainId(0);

    pub fn is_base(self) -> bool {
        self == Self::BASE
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address flag byte.
///
/// ```text
/// 0 0 0 0   0 0 0 0
///       |         `- ECDSA curve: 1 = secp256k1, 0 = secp256r1
///       `----------- testnet
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AddressFlags(u8);

impl AddressFlags {
    pub const ECDSA_K1: u8 = 0x01;
    pub const TESTNET: u8 = 0x10;

    pub fn new(curve: Curve, testnet: bool) -> Self {
        let mut bits = 0;
        if curve == Curve::Secp256k1 {
            bits |= Self::ECDSA_K1;
        }
        if testnet {
            bits |= Self::TESTNET;
        }
        Self(bits)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_testnet(self) -> bool {
        self.0 & Self::TESTNET != 0
    }

    pub fn is_secp256k1(self) -> bool {
        self.0 & Self::ECDSA_K1 != 0
    }

    pub fn is_secp256r1(self) -> bool {
        !self.is_secp256k1()
    }
}

/// A decoded wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    chain: ChainId,
    version: u8,
    flags: AddressFlags,
    payload: [u8; PAYLOAD_LEN],
    checksum: [u8; CHECKSUM_LEN],
}

impl WalletAddress {
    /// Builds the current-version address of `public_key` on `chain`.
    pub fn new(chain: ChainId, curve: Curve, testnet: bool, public_key: &PublicKey) -> Self {
        Self::from_parts(
            chain,
            WALLET_ADDRESS_VERSION,
            AddressFlags::new(curve, testnet),
            hash160(public_key.as_bytes()),
        )
    }

    /// Assembles an address from its fields, computing the checksum.
    pub fn from_parts(
        chain: ChainId,
        version: u8,
        flags: AddressFlags,
        payload: [u8; PAYLOAD_LEN],
    ) -> Self {
        let mut address = Self {
            chain,
            version,
            flags,
            payload,
            checksum: [0; CHECKSUM_LEN],
        };
        address.checksum = checksum(&address.to_bytes()[..HEADER_LEN + PAYLOAD_LEN]);
        address
    }

    /// Decodes and verifies a printable address.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = untokenize(text)?;
        if bytes.len() != ADDRESS_LEN {
            return Err(Error::UndecodableText {
                alphabet: "base58",
                reason: format!("address is {} bytes, expected {ADDRESS_LEN}", bytes.len()),
            });
        }

        let (body, stored) = bytes.split_at(HEADER_LEN + PAYLOAD_LEN);
        if checksum(body) != stored {
            return Err(Error::ChecksumMismatch);
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&body[HEADER_LEN..]);
        let mut stored_checksum = [0u8; CHECKSUM_LEN];
        stored_checksum.copy_from_slice(stored);

        Ok(Self {
            chain: ChainId(u16::from_be_bytes([body[0], body[1]])),
            version: body[2],
            flags: AddressFlags(body[3]),
            payload,
            checksum: stored_checksum,
        })
    }

    /// The raw 28-byte layout.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        let mut out = [0u8; ADDRESS_LEN];
        out[..2].copy_from_slice(&self.chain.0.to_be_bytes());
        out[2] = self.version;
        out[3] = self.flags.0;
        out[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN].copy_from_slice(&self.payload);
        out[HEADER_LEN + PAYLOAD_LEN..].copy_from_slice(&self.checksum);
        out
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> AddressFlags {
        self.flags
    }

    pub fn payload(&self) -> &[u8; PAYLOAD_LEN] {
        &self.payload
    }

    pub fn checksum(&self) -> &[u8; CHECKSUM_LEN] {
        &self.checksum
    }

    pub fn is_testnet(&self) -> bool {
        self.flags.is_testnet()
    }

    pub fn is_base_address(&self) -> bool {
        self.chain.is_base()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tokenize(&self.to_bytes()))
    }
}

/// Bounds of the printable text of every address sharing one header.
///
/// Chain id, version and flags fix the leading bytes of the layout, so
/// the leading characters of its text are fixed as well. The lowest and
/// highest texts come from filling payload and checksum with `00` and `ff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTextRange {
    lowest: String,
    highest: String,
    fixed_len: usize,
}

impl AddressTextRange {
    pub fn new(chain: ChainId, flags: AddressFlags) -> Self {
        let mut low = [0x00u8; ADDRESS_LEN];
        let mut high = [0xffu8; ADDRESS_LEN];
        for layout in [&mut low, &mut high] {
            layout[..2].copy_from_slice(&chain.0.to_be_bytes());
            layout[2] = WALLET_ADDRESS_VERSION;
            layout[3] = flags.0;
        }
        let lowest = tokenize(&low);
        let highest = tokenize(&high);

        // Equal-length base58 texts order like the numbers they encode, so
        // everything between the bounds shares their common prefix.
        let fixed_len = if lowest.len() == highest.len() {
            lowest
                .bytes()
                .zip(highest.bytes())
                .take_while(|(l, h)| l == h)
                .count()
        } else {
            let zeros = low.iter().take_while(|b| **b == 0).count();
            WALLET_ADDRESS_STD_PREFIX.len() + zeros
        };

        Self {
            lowest,
            highest,
            fixed_len,
        }
    }

    /// Leading text shared by every address in the range.
    pub fn fixed_prefix(&self) -> &str {
        &self.lowest[..self.fixed_len]
    }

    /// Returns true iff some address in the range can start with `prefix`.
    pub fn admits(&self, prefix: &str) -> bool {
        let fixed = self.fixed_prefix();
        if !prefix.starts_with(fixed) && !fixed.starts_with(prefix) {
            return false;
        }
        if self.lowest.len() != self.highest.len() {
            return prefix.len() <= self.highest.len();
        }
        match (self.lowest.get(..prefix.len()), self.highest.get(..prefix.len())) {
            (Some(low), Some(high)) => low <= prefix && prefix <= high,
            _ => false,
        }
    }
}

/// Encodes an address layout into its printable form.
pub fn tokenize(bytes: &[u8]) -> String {
    format!("{WALLET_ADDRESS_STD_PREFIX}{}", encode_base58(bytes))
}

/// Inverse of [`tokenize`]: strips the prefix and decodes the base58 body.
pub fn untokenize(text: &str) -> Result<Vec<u8>> {
    let body = text
        .strip_prefix(WALLET_ADDRESS_STD_PREFIX)
        .ok_or_else(|| Error::UndecodableText {
            alphabet: "base58",
            reason: format!("missing \"{WALLET_ADDRESS_STD_PREFIX}\" prefix"),
        })?;
    decode_base58(body)
}

/// Returns true iff `text` decodes to a well-formed address whose checksum
/// matches. Needs no key material, so it works on third-party addresses.
pub fn verify_wallet_address(text: &str) -> bool {
    WalletAddress::parse(text).is_ok()
}

fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256d(body);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_k1() -> PublicKey {
        let bytes: [u8; 64] = hex::decode(
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
        )
        .unwrap()
        .try_into()
        .unwrap();
        PublicKey::from_bytes(bytes)
    }

    #[test]
    fn test_known_mainnet_address() {
        let address = WalletAddress::new(ChainId::BASE, Curve::Secp256k1, false, &generator_k1());
        assert_eq!(
            hex::encode(address.to_bytes()),
            "00000101c862aeeb8429dc25a798ba51a422b43d7e712606f0a0a3f9"
        );
        assert_eq!(address.to_string(), "MC112nj8ZQueHSDyA8W34A3sG7pAKZ89ihkGMXN");
    }

    #[test]
    fn test_known_testnet_and_chain_addresses() {
        let testnet = WalletAddress::new(ChainId::BASE, Curve::Secp256k1, true, &generator_k1());
        assert_eq!(testnet.to_string(), "MC112uAYDAeQto7PBDSGSYmCMspWudCGoyd7fsh");

        let other_chain = WalletAddress::new(ChainId(1), Curve::Secp256k1, false, &generator_k1());
        assert_eq!(other_chain.to_string(), "MC18sT3NnBJ1ST8BneKNN8kfwrt4P4F3JQ9wQMT");

        let r1 = WalletAddress::new(ChainId::BASE, Curve::Secp256r1, false, &generator_k1());
        assert_eq!(r1.flags().bits(), 0x00);
        assert!(r1.flags().is_secp256r1());
    }

    #[test]
    fn test_parse_restores_fields() {
        let address = WalletAddress::new(ChainId(7), Curve::Secp256k1, true, &generator_k1());
        let parsed = WalletAddress::parse(&address.to_string()).unwrap();
        assert_eq!(parsed, address);
        assert_eq!(parsed.chain(), ChainId(7));
        assert_eq!(parsed.version(), WALLET_ADDRESS_VERSION);
        assert!(parsed.is_testnet());
        assert!(parsed.flags().is_secp256k1());
    }

    #[test]
    fn test_testnet_flag_changes_checksum_and_text() {
        let main = WalletAddress::new(ChainId::BASE, Curve::Secp256k1, false, &generator_k1());
        let test = WalletAddress::new(ChainId::BASE, Curve::Secp256k1, true, &generator_k1());
        assert_eq!(main.chain(), test.chain());
        assert_eq!(main.version(), test.version());
        assert_eq!(main.payload(), test.payload());
        assert_ne!(main.flags(), test.flags());
        assert_ne!(main.checksum(), test.checksum());
        assert_ne!(main.to_string(), test.to_string());
    }

    #[test]
    fn test_untokenize_inverts_tokenize() {
        let bytes = [0u8, 0, 1, 1, 0xde, 0xad, 0xbe, 0xef];
        assert_eq!(untokenize(&tokenize(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_verify_rejects_corruption() {
        let text = WalletAddress::new(ChainId::BASE, Curve::Secp256k1, false, &generator_k1())
            .to_string();
        assert!(verify_wallet_address(&text));

        let mut bytes = untokenize(&text).unwrap();
        *bytes.last_mut().unwrap() ^= 0x01;
        assert!(!verify_wallet_address(&tokenize(&bytes)));

        assert!(!verify_wallet_address(&text[2..]));
        assert!(!verify_wallet_address("MC0OIl"));
        assert!(!verify_wallet_address("MC"));
        assert!(!verify_wallet_address(""));
    }

    #[test]
    fn test_text_range_fixed_prefix() {
        let k1 = AddressFlags::new(Curve::Secp256k1, false);
        let base = AddressTextRange::new(ChainId::BASE, k1);
        assert_eq!(base.fixed_prefix(), "MC112n");
        assert!(WalletAddress::new(ChainId::BASE, Curve::Secp256k1, false, &generator_k1())
            .to_string()
            .starts_with(base.fixed_prefix()));

        let testnet = AddressTextRange::new(ChainId::BASE, AddressFlags::new(Curve::Secp256k1, true));
        assert_eq!(testnet.fixed_prefix(), "MC112");
        assert_eq!(AddressTextRange::new(ChainId(1), k1).fixed_prefix(), "MC18s");
        assert_eq!(AddressTextRange::new(ChainId(2), k1).fixed_prefix(), "MC1Gi7");
    }

    #[test]
    fn test_text_range_admits() {
        let base = AddressTextRange::new(ChainId::BASE, AddressFlags::new(Curve::Secp256k1, false));
        for ok in ["M", "MC", "MC11", "MC112n", "MC112nQ", "MC112nZ", "MC112np", "MC112nj8"] {
            assert!(base.admits(ok), "{ok}");
        }
        // the seventh character lies between Q and p
        for bad in ["MC1z", "MC11A", "MC2", "MC112nA", "MC112nq", "X"] {
            assert!(!base.admits(bad), "{bad}");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            WalletAddress::parse("XY112nj8"),
            Err(Error::UndecodableText { .. })
        ));
        assert!(matches!(
            WalletAddress::parse(&tokenize(&[1, 2, 3])),
            Err(Error::UndecodableText { .. })
        ));
        let mut bytes = untokenize("MC112nj8ZQueHSDyA8W34A3sG7pAKZ89ihkGMXN").unwrap();
        bytes[3] = 0x11;
        assert_eq!(
            WalletAddress::parse(&tokenize(&bytes)),
            Err(Error::ChecksumMismatch)
        );
    }
}
