use super::models::{ProteinRecord, ProteinRecordBuilder};
use crate::errors::{CacheError, Result};
use log::*;
use std::path::Path;
use std::time::Instant;

#[derive(Debug)]
pub struct ProteinSequenceCollection {
    pub records: Vec<ProteinRecord>,
}

impl ProteinSequenceCollection {
    pub fn from_fasta(fasta: &str) -> ProteinSequenceCollection {
        let mut records = vec![];
        let mut current = ProteinRecordBuilder::new();
        for line in fasta.lines() {
            let line = line.trim();
            if let Some(header) = line.strip_prefix('>') {
                let previous = std::mem::take(&mut current);
                records.extend(previous.build());
                current = current.with_definition(header.trim());
            } else {
                current = current.append_sequence(line);
            }
        }
        records.extend(current.build());
        ProteinSequenceCollection { records }
    }

    pub fn from_fasta_file<P: AsRef<Path>>(file: P) -> Result<ProteinSequenceCollection> {
        let st = Instant::now();
        let fasta = std::fs::read_to_string(file.as_ref())
            .map_err(|e| CacheError::io(file.as_ref(), e))?;
        let out = Self::from_fasta(&fasta);
        info!(
            "Parsed {} proteins from {:?} in {:?}",
            out.len(),
            file.as_ref(),
            st.elapsed()
        );
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
