use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinEntry {
    pub index: u32, // Dense, assigned in insertion order by the store.
    pub definition: Arc<str>,
    pub sequence: Option<Arc<str>>,
}

/// A protein as read from a FASTA file, before it gets an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub definition: String,
    /// `None` when the header had no sequence lines.
    pub sequence: Option<String>,
}

#[derive(Debug)]
pub struct ProteinRecordBuilder {
    pub definition: Option<String>,
    pub sequence: String,
}

impl ProteinRecordBuilder {
    pub fn new() -> Self {
        Self {
            definition: None,
            sequence: String::new(),
        }
    }

    pub fn with_definition(mut self, definition: &str) -> Self {
        self.definition = Some(definition.to_string());
        self
    }

    pub fn append_sequence(mut self, sequence: &str) -> Self {
        self.sequence.push_str(sequence);
        self
    }

    /// Returns `None` for sequence lines that showed up before any header.
    pub fn build(self) -> Option<ProteinRecord> {
        let definition = self.definition?;
        let sequence = (!self.sequence.is_empty()).then_some(self.sequence);
        Some(ProteinRecord {
            definition,
            sequence,
        })
    }
}

impl Default for ProteinRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
