//! Error types for mnemonic, key and address operations.

/// Errors raised by the mnemonic codec, the key deriver and the address codec.
///
/// Validity predicates (`MnemonicCodec::is_valid`, `verify_wallet_address`)
/// report failure as `false` instead of returning one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid entropy length {0} bytes, must be a positive multiple of 4 and at most 1024")]
    InvalidEntropyLength(usize),

    #[error("invalid word count {0}, must be a positive multiple of 3")]
    InvalidWordCount(usize),

    #[error("word \"{0}\" is not in the dictionary")]
    UnknownWord(String),

    #[error("mnemonic checksum mismatch")]
    ChecksumMismatch,

    #[error("public key derivation failed on {0}")]
    KeyDerivationFailed(&'static str),

    #[error("public key has not been calculated")]
    PublicKeyMissing,

    #[error("unknown chain \"{0}\"")]
    UnknownChain(String),

    #[error("undecodable {alphabet} text: {reason}")]
    UndecodableText {
        alphabet: &'static str,
        reason: String,
    },

    #[error("prefix \"{prefix}\" is longer than {max} characters")]
    PrefixTooLong { prefix: String, max: usize },

    #[error("PBKDF2 key stretching failed: {0}")]
    KeyStretching(String),
}

pub type Result<T> = std::result::Result<T, Error>;
