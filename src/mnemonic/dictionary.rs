//! 2048-word dictionaries, one per supported language.
//!
//! Word data comes from the `bip39` crate's wordlists.

use std::fmt;

use clap::ValueEnum;

/// A valid mnemonic dictionary has exactly this many words.
pub const DICTIONARY_SIZE: usize = 2048;

/// Languages with a built-in dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Language {
    #[default]
    #[value(name = "en")]
    English,
    #[value(name = "es")]
    Spanish,
    #[value(name = "ja")]
    Japanese,
    #[value(name = "it")]
    Italian,
    #[value(name = "fr")]
    French,
    #[value(name = "cs")]
    Czech,
    #[value(name = "ko")]
    Korean,
    #[value(name = "zh_Hans")]
    SimplifiedChinese,
    #[value(name = "zh_Hant")]
    TraditionalChinese,
}

impl Language {
    /// Short code used on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::Japanese => "ja",
            Language::Italian => "it",
            Language::French => "fr",
            Language::Czech => "cs",
            Language::Korean => "ko",
            Language::SimplifiedChinese => "zh_Hans",
            Language::TraditionalChinese => "zh_Hant",
        }
    }

    fn wordlist(self) -> &'static [&'static str; DICTIONARY_SIZE] {
        let language = match self {
            Language::English => bip39::Language::English,
            Language::Spanish => bip39::Language::Spanish,
            Language::Japanese => bip39::Language::Japanese,
            Language::Italian => bip39::Language::Italian,
            Language::French => bip39::Language::French,
            Language::Czech => bip39::Language::Czech,
            Language::Korean => bip39::Language::Korean,
            Language::SimplifiedChinese => bip39::Language::SimplifiedChinese,
            Language::TraditionalChinese => bip39::Language::TraditionalChinese,
        };
        language.word_list()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A resolved, read-only dictionary. Cheap to copy and safe to share across
/// threads.
#[derive(Clone, Copy)]
pub struct Dictionary {
    language: Language,
    words: &'static [&'static str; DICTIONARY_SIZE],
}

impl Dictionary {
    /// Resolves the dictionary for `language`.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            words: language.wordlist(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Returns the word at `index`, or `None` when `index` is not an 11-bit value.
    #[inline]
    pub fn word(&self, index: u16) -> Option<&'static str> {
        self.words.get(usize::from(index)).copied()
    }

    /// Returns the index of `word`.
    ///
    /// Linear scan: not every wordlist is sorted by byte order.
    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.words
            .iter()
            .position(|w| *w == word)
            .map(|i| i as u16)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dictionary({})", self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_bounds() {
        let dict = Dictionary::new(Language::English);
        assert_eq!(dict.word(0), Some("abandon"));
        assert_eq!(dict.word(2047), Some("zoo"));
        assert_eq!(dict.word(2048), None);
    }

    #[test]
    fn test_index_lookup_inverts_word_lookup() {
        for language in Language::value_variants() {
            let dict = Dictionary::new(*language);
            for index in [0u16, 1, 1024, 2047] {
                let word = dict.word(index).unwrap();
                assert_eq!(dict.index_of(word), Some(index), "{language}: {word}");
            }
        }
    }

    #[test]
    fn test_unknown_word() {
        let dict = Dictionary::new(Language::English);
        assert_eq!(dict.index_of("notaword"), None);
    }
}
