//! Chain name → chain identifier resolution.

use std::str::FromStr;

use crate::error::{Error, Result};

use super::address::ChainId;

/// Chains every registry knows about.
const BUILTIN_CHAINS: &[(&str, u16)] = &[("MC", 0), ("TCT", 1), ("MINE", 2)];

/// A `NAME=ID` chain definition, as passed with `--chain-def`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDef {
    pub name: String,
    pub id: ChainId,
}

impl FromStr for ChainDef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, id) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=ID, got \"{s}\""))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("empty chain name in \"{s}\""));
        }
        let id = id
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid chain id in \"{s}\": {e}"))?;
        Ok(Self {
            name: name.to_string(),
            id: ChainId(id),
        })
    }
}

/// Known chains. Lookups ignore ASCII case.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<(String, ChainId)>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self {
            chains: BUILTIN_CHAINS
                .iter()
                .map(|(name, id)| (name.to_string(), ChainId(*id)))
                .collect(),
        }
    }
}

impl ChainRegistry {
    /// Built-in chains plus `alternates`. An alternate with a built-in name
    /// replaces it.
    pub fn with_alternates(alternates: &[ChainDef]) -> Self {
        let mut registry = Self::default();
        for def in alternates {
            registry.insert(&def.name, def.id);
        }
        registry
    }

    pub fn insert(&mut self, name: &str, id: ChainId) {
        match self
            .chains
            .iter_mut()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = id,
            None => self.chains.push((name.to_string(), id)),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<ChainId> {
        self.chains
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, id)| *id)
            .ok_or_else(|| Error::UnknownChain(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_chains() {
        let registry = ChainRegistry::default();
        assert_eq!(registry.resolve("MC"), Ok(ChainId::BASE));
        assert_eq!(registry.resolve("mc"), Ok(ChainId::BASE));
        assert_eq!(registry.resolve("TCT"), Ok(ChainId(1)));
        assert_eq!(registry.resolve("MINE"), Ok(ChainId(2)));
        assert_eq!(
            registry.resolve("DOGE"),
            Err(Error::UnknownChain("DOGE".into()))
        );
    }

    #[test]
    fn test_alternates() {
        let defs = vec![
            "DOGE=42".parse::<ChainDef>().unwrap(),
            "TCT=9".parse::<ChainDef>().unwrap(),
        ];
        let registry = ChainRegistry::with_alternates(&defs);
        assert_eq!(registry.resolve("DOGE"), Ok(ChainId(42)));
        assert_eq!(registry.resolve("TCT"), Ok(ChainId(9)));
        assert_eq!(registry.names().count(), 4);
    }

    #[test]
    fn test_chain_def_parse_errors() {
        assert!("DOGE".parse::<ChainDef>().is_err());
        assert!("=1".parse::<ChainDef>().is_err());
        assert!("DOGE=70000".parse::<ChainDef>().is_err());
    }
}
