//! JSON-file-backed address registry
//!
//! An external collaborator to the analytics core: report and API
//! consumers resolve a block's postal address through the small trait
//! below, so tests can swap in an in-memory registry.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One registered address. A record with block "*" is the project-wide
/// default used when no exact block entry exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub project: String,
    pub block: String,
    pub street: String,
    pub postal_code: String,
}

/// Lookup by project and block.
///
/// Fallback precedence: exact (project, block) match, then the project's
/// wildcard record (block "*"), then the first record in the registry.
pub trait AddressRegistry {
    fn lookup(&self, project: &str, block: &str) -> Option<&AddressRecord>;
}

/// Registry loaded from a JSON array of address records
#[derive(Debug, Clone, Default)]
pub struct JsonAddressRegistry {
    records: Vec<AddressRecord>,
}

impl JsonAddressRegistry {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading address registry {:?}", path))?;
        let records: Vec<AddressRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing address registry {:?}", path))?;
        info!("Loaded {} address records from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    /// Build a registry directly from records; doubles as the in-memory
    /// fake for tests.
    pub fn from_records(records: Vec<AddressRecord>) -> Self {
        JsonAddressRegistry { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AddressRegistry for JsonAddressRegistry {
    fn lookup(&self, project: &str, block: &str) -> Option<&AddressRecord> {
        self.records
            .iter()
            .find(|r| r.project == project && r.block == block)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|r| r.project == project && r.block == "*")
            })
            .or_else(|| self.records.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(project: &str, block: &str, street: &str) -> AddressRecord {
        AddressRecord {
            project: project.to_string(),
            block: block.to_string(),
            street: street.to_string(),
            postal_code: "238801".to_string(),
        }
    }

    fn registry() -> JsonAddressRegistry {
        JsonAddressRegistry::from_records(vec![
            record("Emerald Court", "10A", "10A Emerald Avenue"),
            record("Emerald Court", "*", "Emerald Avenue"),
            record("Other Gardens", "1", "1 Other Road"),
        ])
    }

    #[test]
    fn test_exact_match_wins() {
        let reg = registry();
        let hit = reg.lookup("Emerald Court", "10A").unwrap();
        assert_eq!(hit.street, "10A Emerald Avenue");
    }

    #[test]
    fn test_wildcard_fallback() {
        let reg = registry();
        let hit = reg.lookup("Emerald Court", "12C").unwrap();
        assert_eq!(hit.block, "*");
        assert_eq!(hit.street, "Emerald Avenue");
    }

    #[test]
    fn test_first_record_fallback() {
        let reg = registry();
        // Unknown project with no wildcard: first available record
        let hit = reg.lookup("Nowhere Heights", "3").unwrap();
        assert_eq!(hit.street, "10A Emerald Avenue");
    }

    #[test]
    fn test_empty_registry_returns_none() {
        let reg = JsonAddressRegistry::from_records(vec![]);
        assert!(reg.lookup("Emerald Court", "10A").is_none());
    }
}
