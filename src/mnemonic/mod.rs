//! Mnemonic phrases: dictionaries and the entropy ↔ words codec.

mod codec;
mod dictionary;

pub use codec::{
    Entropy, KeyMaterial, Mnemonic, MnemonicCodec, KEY_MATERIAL_LEN, MAX_ENTROPY_LEN,
    MNEMONIC_SEED_MULTIPLE, STANDARD_ENTROPY_LEN,
};
pub use dictionary::{Dictionary, Language, DICTIONARY_SIZE};
