//! Entropy ↔ mnemonic conversion and key stretching.
//!
//! Encoding appends `entropy_bits / 32` bits of `SHA-256(entropy)` to the
//! entropy and cuts the result into 11-bit word indices, most significant bit
//! first. Decoding stretches the words with PBKDF2-HMAC-SHA512 (2048 rounds,
//! salt `"mnemonic" + passphrase`) into 64 bytes of key material.

use std::fmt;

use hmac::Hmac;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

use super::dictionary::{Dictionary, Language};

/// Entropy length must be a multiple of this many bytes.
pub const MNEMONIC_SEED_MULTIPLE: usize = 4;

/// Largest accepted entropy; its checksum uses all 256 bits of the digest.
pub const MAX_ENTROPY_LEN: usize = 1024;

/// Entropy length drawn by the generator and the search loop (24 words).
pub const STANDARD_ENTROPY_LEN: usize = 32;

/// Bits per dictionary index.
const BITS_PER_WORD: usize = 11;

/// One checksum bit per this many entropy bits.
const ENTROPY_BITS_PER_CHECKSUM_BIT: usize = 32;

/// Word count of a [`MAX_ENTROPY_LEN`] mnemonic.
const MAX_WORD_COUNT: usize = MAX_ENTROPY_LEN * 8 / ENTROPY_BITS_PER_CHECKSUM_BIT
    * (ENTROPY_BITS_PER_CHECKSUM_BIT + 1)
    / BITS_PER_WORD;

const PBKDF2_ROUNDS: u32 = 2048;
const PASSPHRASE_PREFIX: &str = "mnemonic";

/// Length of the stretched key material in bytes.
pub const KEY_MATERIAL_LEN: usize = 64;

/// Random input to mnemonic generation. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Entropy(Vec<u8>);

impl Entropy {
    /// Wraps `bytes`, checking the length constraints.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if len == 0 || len % MNEMONIC_SEED_MULTIPLE != 0 || len > MAX_ENTROPY_LEN {
            return Err(Error::InvalidEntropyLength(len));
        }
        Ok(Self(bytes))
    }

    /// Parses base16 entropy such as the `--seed` argument.
    pub fn from_hex(text: &str) -> Result<Self> {
        Self::new(crate::encoding::decode_base16(text)?)
    }

    /// Draws `len` fresh bytes from `rng`.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> Result<Self> {
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Number of words this entropy encodes to.
    pub fn word_count(&self) -> usize {
        let bits = self.0.len() * 8;
        (bits + bits / ENTROPY_BITS_PER_CHECKSUM_BIT) / BITS_PER_WORD
    }
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entropy({} bytes)", self.0.len())
    }
}

/// 64 bytes of stretched key material. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_MATERIAL_LEN]);

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_MATERIAL_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_MATERIAL_LEN] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}

/// An ordered word sequence drawn from one dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mnemonic {
    words: Vec<&'static str>,
}

impl Mnemonic {
    pub fn words(&self) -> &[&'static str] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

/// Mnemonic encoder/decoder bound to a single dictionary.
#[derive(Debug, Clone, Copy)]
pub struct MnemonicCodec {
    dictionary: Dictionary,
}

impl MnemonicCodec {
    pub fn new(language: Language) -> Self {
        Self {
            dictionary: Dictionary::new(language),
        }
    }

    pub fn with_dictionary(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Converts entropy into its word sequence.
    pub fn encode(&self, entropy: &Entropy) -> Result<Mnemonic> {
        let entropy = entropy.as_bytes();
        let entropy_bits = entropy.len() * 8;
        let checksum_bits = entropy_bits / ENTROPY_BITS_PER_CHECKSUM_BIT;
        let digest = Sha256::digest(entropy);

        let bit = |i: usize| -> u16 {
            let (bytes, i) = if i < entropy_bits {
                (entropy, i)
            } else {
                (&digest[..], i - entropy_bits)
            };
            u16::from((bytes[i / 8] >> (7 - i % 8)) & 1)
        };

        let word_count = (entropy_bits + checksum_bits) / BITS_PER_WORD;
        let words = (0..word_count)
            .map(|w| {
                let index = (0..BITS_PER_WORD)
                    .fold(0u16, |acc, b| (acc << 1) | bit(w * BITS_PER_WORD + b));
                // index < 2048 by construction
                self.dictionary
                    .word(index)
                    .ok_or(Error::InvalidEntropyLength(entropy.len()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Mnemonic { words })
    }

    /// Parses a whitespace-separated phrase, checking word count and
    /// dictionary membership but not the checksum.
    pub fn parse(&self, phrase: &str) -> Result<Mnemonic> {
        let tokens: Vec<&str> = phrase.split_whitespace().collect();
        let indices = self.indices(&tokens)?;
        let words = indices
            .into_iter()
            .filter_map(|i| self.dictionary.word(i))
            .collect();
        Ok(Mnemonic { words })
    }

    /// Recovers the entropy from `words`, verifying the checksum.
    pub fn entropy<S: AsRef<str>>(&self, words: &[S]) -> Result<Entropy> {
        let indices = self.indices(words)?;

        let total_bits = indices.len() * BITS_PER_WORD;
        let checksum_bits = total_bits / (ENTROPY_BITS_PER_CHECKSUM_BIT + 1);
        let entropy_bits = total_bits - checksum_bits;

        let bit = |i: usize| -> u8 {
            ((indices[i / BITS_PER_WORD] >> (BITS_PER_WORD - 1 - i % BITS_PER_WORD)) & 1) as u8
        };

        let mut entropy = vec![0u8; entropy_bits / 8];
        for i in 0..entropy_bits {
            entropy[i / 8] |= bit(i) << (7 - i % 8);
        }

        let digest = Sha256::digest(&entropy);
        let checksum_ok = (0..checksum_bits)
            .all(|j| bit(entropy_bits + j) == (digest[j / 8] >> (7 - j % 8)) & 1);
        if !checksum_ok {
            entropy.zeroize();
            return Err(Error::ChecksumMismatch);
        }

        Entropy::new(entropy)
    }

    /// Returns true iff every word is known, the count is valid and the
    /// embedded checksum matches.
    pub fn is_valid<S: AsRef<str>>(&self, words: &[S]) -> bool {
        self.entropy(words).is_ok()
    }

    /// Stretches `words` and `passphrase` into key material.
    ///
    /// The checksum is not enforced; call [`is_valid`](Self::is_valid) to
    /// check it.
    pub fn decode<S: AsRef<str>>(&self, words: &[S], passphrase: &str) -> Result<KeyMaterial> {
        self.indices(words)?;

        let mut sentence = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<&str>>()
            .join(" ")
            .nfkd()
            .collect::<String>();
        let mut salt = format!("{PASSPHRASE_PREFIX}{passphrase}")
            .nfkd()
            .collect::<String>();

        let mut output = [0u8; KEY_MATERIAL_LEN];
        let stretched = pbkdf2::pbkdf2::<Hmac<Sha512>>(
            sentence.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            &mut output,
        )
        .map_err(|e| Error::KeyStretching(e.to_string()));

        sentence.zeroize();
        salt.zeroize();
        stretched?;

        let material = KeyMaterial(output);
        output.zeroize();
        Ok(material)
    }

    fn indices<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<u16>> {
        let count = words.len();
        if count == 0 || count % 3 != 0 || count > MAX_WORD_COUNT {
            return Err(Error::InvalidWordCount(count));
        }

        words
            .iter()
            .map(|w| {
                let w = w.as_ref();
                self.dictionary
                    .index_of(w)
                    .ok_or_else(|| Error::UnknownWord(w.to_string()))
            })
            .collect()
    }
}
