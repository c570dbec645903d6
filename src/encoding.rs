//! Text codecs for keys and addresses.
//!
//! Thin wrappers over `hex` and `bs58` that fold their errors into
//! [`Error::UndecodableText`].

use crate::error::{Error, Result};

/// Encodes bytes as lowercase base16.
#[inline]
pub fn encode_base16(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes base16 text (either case, no `0x` prefix).
pub fn decode_base16(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| Error::UndecodableText {
        alphabet: "base16",
        reason: e.to_string(),
    })
}

/// Encodes bytes with the Bitcoin base58 alphabet.
#[inline]
pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decodes base58 text. Leading `1`s decode to leading zero bytes.
pub fn decode_base58(text: &str) -> Result<Vec<u8>> {
    bs58::decode(text).into_vec().map_err(|e| Error::UndecodableText {
        alphabet: "base58",
        reason: e.to_string(),
    })
}
