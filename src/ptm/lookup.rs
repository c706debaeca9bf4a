use crate::errors::{CacheError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const REPLACEMENT_MARKER: &str = "->";

/// A modification placed on a peptide, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ptm {
    pub position: usize,
    pub code: String,
}

impl Ptm {
    pub fn new<S: Into<String>>(position: usize, code: S) -> Self {
        Self {
            position,
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtmDescriptor {
    pub description: String,
}

impl PtmDescriptor {
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Residues replaced by this modification, if it reads `original->modified`.
    pub fn replaced_residues(&self) -> Option<&str> {
        self.description
            .split_once(REPLACEMENT_MARKER)
            .map(|(original, _)| original)
    }
}

/// Resolves a PTM code to its description.
pub trait PtmLookup: Send + Sync {
    fn describe(&self, code: &str) -> Option<PtmDescriptor>;
}

/// Code -> description table, usually read from a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PtmTable {
    descriptions: HashMap<String, String>,
}

impl PtmTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<C: Into<String>, D: Into<String>>(&mut self, code: C, description: D) {
        self.descriptions.insert(code.into(), description.into());
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CacheError::io(path.as_ref(), e))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl<C: Into<String>, D: Into<String>> FromIterator<(C, D)> for PtmTable {
    fn from_iter<I: IntoIterator<Item = (C, D)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (code, description) in iter {
            table.insert(code, description);
        }
        table
    }
}

impl PtmLookup for PtmTable {
    fn describe(&self, code: &str) -> Option<PtmDescriptor> {
        self.descriptions.get(code).map(PtmDescriptor::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_parsing() {
        let phospho = PtmDescriptor::new("Phospho");
        assert_eq!(phospho.replaced_residues(), None);

        let swap = PtmDescriptor::new("PE->X");
        assert_eq!(swap.replaced_residues(), Some("PE"));

        // Only the first marker splits.
        let odd = PtmDescriptor::new("M->K->R");
        assert_eq!(odd.replaced_residues(), Some("M"));
    }

    #[test]
    fn test_table_from_json() {
        let table = PtmTable::from_json(r#"{"21": "Phospho", "1": "Acetyl", "99": "Q->E"}"#)
            .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.describe("21"), Some(PtmDescriptor::new("Phospho")));
        assert_eq!(table.describe("99").unwrap().replaced_residues(), Some("Q"));
        assert_eq!(table.describe("4"), None);
    }

    #[test]
    fn test_table_bad_json() {
        let res = PtmTable::from_json(r#"["Phospho"]"#);
        assert!(matches!(res, Err(CacheError::Config(_))));
    }
}
