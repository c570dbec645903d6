//! Private/public keys and public key derivation.

use std::fmt;

use clap::ValueEnum;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use secp256k1::{Secp256k1, SecretKey, SignOnly};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding::{encode_base16, encode_base58};
use crate::error::{Error, Result};
use crate::mnemonic::KeyMaterial;

/// Private key length: the full 64 bytes of stretched key material.
pub const PRIVATE_KEY_LEN: usize = 64;

/// Public key length: uncompressed point `X || Y` without the SEC1 tag byte.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Curve used to derive the public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Curve {
    #[default]
    #[value(name = "k1")]
    Secp256k1,
    #[value(name = "r1")]
    Secp256r1,
}

impl Curve {
    pub fn name(self) -> &'static str {
        match self {
            Curve::Secp256k1 => "SECP256k1",
            Curve::Secp256r1 => "SECP256r1",
        }
    }

    /// Returns a fresh deriver for this curve.
    pub fn deriver(self) -> Box<dyn KeyDeriver> {
        match self {
            Curve::Secp256k1 => Box::new(Secp256k1Deriver::new()),
            Curve::Secp256r1 => Box::new(Secp256r1Deriver),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 64-byte private key. The curve scalar is the first 32 bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_key_material(material: &KeyMaterial) -> Self {
        Self(*material.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }

    /// The 32-byte scalar handed to the curve.
    pub fn scalar_bytes(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn to_hex(&self) -> String {
        encode_base16(&self.0)
    }

    pub fn to_base58(&self) -> String {
        encode_base58(&self.0)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A public key: the uncompressed curve point without its tag byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Strips the `0x04` tag from a 65-byte SEC1 uncompressed encoding.
    fn from_sec1_uncompressed(encoded: &[u8], curve: Curve) -> Result<Self> {
        match encoded.split_first() {
            Some((&0x04, point)) if point.len() == PUBLIC_KEY_LEN => {
                let mut bytes = [0u8; PUBLIC_KEY_LEN];
                bytes.copy_from_slice(point);
                Ok(Self(bytes))
            }
            _ => Err(Error::KeyDerivationFailed(curve.name())),
        }
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        encode_base16(&self.0)
    }

    pub fn to_base58(&self) -> String {
        encode_base58(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Derives a public key from a private key on one curve.
pub trait KeyDeriver: Send {
    fn curve(&self) -> Curve;

    /// Fails with [`Error::KeyDerivationFailed`] when the scalar is zero or
    /// not below the curve order.
    fn derive_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey>;
}

/// secp256k1 deriver. Holds its own signing context, so build one per thread.
pub struct Secp256k1Deriver {
    secp: Secp256k1<SignOnly>,
}

impl Secp256k1Deriver {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }
}

impl Default for Secp256k1Deriver {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDeriver for Secp256k1Deriver {
    fn curve(&self) -> Curve {
        Curve::Secp256k1
    }

    #[inline]
    fn derive_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey> {
        let secret = SecretKey::from_slice(private_key.scalar_bytes())
            .map_err(|_| Error::KeyDerivationFailed(Curve::Secp256k1.name()))?;
        let public = secp256k1::PublicKey::from_secret_key(&self.secp, &secret);
        PublicKey::from_sec1_uncompressed(&public.serialize_uncompressed(), Curve::Secp256k1)
    }
}

/// secp256r1 (NIST P-256) deriver.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256r1Deriver;

impl KeyDeriver for Secp256r1Deriver {
    fn curve(&self) -> Curve {
        Curve::Secp256r1
    }

    fn derive_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey> {
        let secret = p256::SecretKey::from_slice(private_key.scalar_bytes())
            .map_err(|_| Error::KeyDerivationFailed(Curve::Secp256r1.name()))?;
        let encoded = secret.public_key().to_encoded_point(false);
        PublicKey::from_sec1_uncompressed(encoded.as_bytes(), Curve::Secp256r1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with_scalar(scalar: [u8; 32]) -> PrivateKey {
        let mut bytes = [0xa5u8; PRIVATE_KEY_LEN];
        bytes[..32].copy_from_slice(&scalar);
        PrivateKey::from_bytes(bytes)
    }

    fn one() -> [u8; 32] {
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        scalar
    }

    #[test]
    fn test_k1_generator_point() {
        let public = Secp256k1Deriver::new()
            .derive_public_key(&key_with_scalar(one()))
            .unwrap();
        assert_eq!(
            public.to_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn test_r1_generator_point() {
        let public = Secp256r1Deriver
            .derive_public_key(&key_with_scalar(one()))
            .unwrap();
        assert_eq!(
            public.to_hex(),
            "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296\
             4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"
        );
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let key = key_with_scalar([0u8; 32]);
        assert_eq!(
            Secp256k1Deriver::new().derive_public_key(&key),
            Err(Error::KeyDerivationFailed("SECP256k1"))
        );
        assert_eq!(
            Secp256r1Deriver.derive_public_key(&key),
            Err(Error::KeyDerivationFailed("SECP256r1"))
        );
    }

    #[test]
    fn test_scalar_above_order_rejected() {
        let key = key_with_scalar([0xff; 32]);
        assert!(Secp256k1Deriver::new().derive_public_key(&key).is_err());
        assert!(Secp256r1Deriver.derive_public_key(&key).is_err());
    }

    #[test]
    fn test_only_scalar_half_matters() {
        let mut a = [0x11u8; PRIVATE_KEY_LEN];
        let mut b = a;
        a[40] = 0;
        b[40] = 1;
        let deriver = Secp256k1Deriver::new();
        assert_eq!(
            deriver.derive_public_key(&PrivateKey::from_bytes(a)).unwrap(),
            deriver.derive_public_key(&PrivateKey::from_bytes(b)).unwrap()
        );
    }
}
