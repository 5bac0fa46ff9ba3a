//! Deployed-contract lookup.

use crate::error::{ChainError, ChainResult};
use lib_types::Address;
use std::collections::HashMap;

/// Maps contract names to their known deployed addresses.
///
/// Populated from configuration or programmatically; passed explicitly to
/// whatever needs name resolution. There is no process-global registry.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    deployed: HashMap<String, Address>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the deployed address for a contract name
    pub fn register(&mut self, name: impl Into<String>, address: Address) {
        self.deployed.insert(name.into(), address);
    }

    /// Deployed address for a contract name, if known
    pub fn get(&self, name: &str) -> Option<Address> {
        self.deployed.get(name).copied()
    }

    /// Deployed address for a contract name, erring when unknown
    pub fn deployed(&self, name: &str) -> ChainResult<Address> {
        self.get(name)
            .ok_or_else(|| ChainError::NotDeployed(name.to_string()))
    }
}

impl FromIterator<(String, Address)> for ArtifactRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        Self {
            deployed: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ArtifactRegistry::new();
        let addr = Address::new([9u8; 20]);
        registry.register("UController", addr);

        assert_eq!(registry.deployed("UController").unwrap(), addr);
        assert_eq!(registry.get("UController"), Some(addr));
    }

    #[test]
    fn test_unknown_name_errors() {
        let registry = ArtifactRegistry::new();
        let err = registry.deployed("DaoCreator").unwrap_err();
        assert_eq!(err.to_string(), "DaoCreator has not been deployed");
    }
}
