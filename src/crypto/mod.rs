//! Cryptographic operations for key and address generation.
//!
//! This module provides:
//! - Public key derivation on secp256k1 and secp256r1
//! - Private/public key containers
//! - The digests used by the address codec

mod keys;

pub use keys::{
    Curve, KeyDeriver, PrivateKey, PublicKey, Secp256k1Deriver, Secp256r1Deriver,
    PRIVATE_KEY_LEN, PUBLIC_KEY_LEN,
};

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes.
pub fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// Double SHA-256, used for address checksums.
pub fn sha256d(input: &[u8]) -> [u8; 32] {
    sha256(&sha256(input))
}

/// RIPEMD-160(SHA-256(input)), the public key digest carried in addresses.
pub fn hash160(input: &[u8]) -> [u8; 20] {
    let digest = Ripemd160::digest(sha256(input));
    let mut output = [0u8; 20];
    output.copy_from_slice(&digest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash160_empty() {
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
