use super::persistence::{self, FileLock};
use crate::config::CacheConfig;
use crate::errors::{CacheError, Result};
use crate::protein::SequenceStore;
use crate::ptm::{annotate_peptide, Ptm, PtmLookup};
use log::{debug, error};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Outcome of adding a protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    New(u32),
    Existing(u32),
}

impl Insertion {
    pub fn index(&self) -> u32 {
        match self {
            Insertion::New(index) | Insertion::Existing(index) => *index,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Insertion::New(_))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    store: SequenceStore,
    pending: Vec<u32>,
    loaded: bool,
}

/// Disk backed, write buffered protein cache.
///
/// The file is read lazily on the first call of any kind. New proteins are
/// queued and appended in batches of `buffer_size`; call [`ProteinCache::flush`]
/// to persist the rest. All in-memory state sits behind a single lock, so the
/// cache can be shared between threads as `&ProteinCache`.
pub struct ProteinCache {
    config: CacheConfig,
    file_lock: FileLock,
    lookup: Arc<dyn PtmLookup>,
    state: RwLock<CacheState>,
}

impl std::fmt::Debug for ProteinCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProteinCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProteinCache {
    pub fn new(config: CacheConfig, lookup: Arc<dyn PtmLookup>) -> Self {
        Self::with_file_lock(config, lookup, FileLock::new())
    }

    /// Use when several caches point at the same file.
    pub fn with_file_lock(
        config: CacheConfig,
        lookup: Arc<dyn PtmLookup>,
        file_lock: FileLock,
    ) -> Self {
        Self {
            config,
            file_lock,
            lookup,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn file_lock(&self) -> &FileLock {
        &self.file_lock
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().map(|s| s.loaded).unwrap_or(false)
    }

    // Caller holds the write lock; flips `loaded` exactly once, even on error.
    fn load_locked(&self, state: &mut CacheState) -> Result<()> {
        if state.loaded {
            return Ok(());
        }
        state.store.clear();
        state.pending.clear();
        state.loaded = true;
        if let Err(e) = persistence::load_into(&self.config.path, &mut state.store, &self.file_lock)
        {
            error!(
                "Error loading protein cache from {:?}, continuing with {} proteins: {}",
                self.config.path,
                state.store.len(),
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Reads the backing file if that has not happened yet.
    ///
    /// Every other operation loads implicitly; there a failed load is only
    /// logged and the cache keeps whatever it managed to read.
    pub fn load(&self) -> Result<()> {
        let mut state = self.state.write()?;
        self.load_locked(&mut state)
    }

    fn read_loaded(&self) -> Result<RwLockReadGuard<'_, CacheState>> {
        {
            let state = self.state.read()?;
            if state.loaded {
                return Ok(state);
            }
        }
        {
            let mut state = self.state.write()?;
            let _ = self.load_locked(&mut state);
        }
        Ok(self.state.read()?)
    }

    fn write_loaded(&self) -> Result<RwLockWriteGuard<'_, CacheState>> {
        let mut state = self.state.write()?;
        let _ = self.load_locked(&mut state);
        Ok(state)
    }

    /// Adds a protein, or returns the index it already has.
    ///
    /// Definitions and sequences may not contain tabs or newlines. If the
    /// insert fills the buffer and the automatic flush fails, the protein
    /// stays cached and queued and [`CacheError::Unflushed`] carries its
    /// index; adding it again returns `Insertion::Existing`.
    pub fn add_protein(&self, definition: &str, sequence: Option<&str>) -> Result<Insertion> {
        check_field("definition", definition)?;
        if let Some(sequence) = sequence {
            check_field("sequence", sequence)?;
        }

        let mut state = self.write_loaded()?;
        if let Some(index) = state.store.index_of(definition) {
            return Ok(Insertion::Existing(index));
        }
        let index = match sequence {
            Some(sequence) => state.store.add_definition_and_sequence(definition, sequence)?,
            None => state.store.add_definition(definition)?,
        };
        state.pending.push(index);
        if state.pending.len() >= self.config.buffer_size {
            write_pending(&self.config, &self.file_lock, &mut state).map_err(|e| {
                CacheError::Unflushed {
                    index,
                    source: Box::new(e),
                }
            })?;
        }
        Ok(Insertion::New(index))
    }

    pub fn add_definition(&self, definition: &str) -> Result<Insertion> {
        self.add_protein(definition, None)
    }

    pub fn add_definition_and_sequence(
        &self,
        definition: &str,
        sequence: &str,
    ) -> Result<Insertion> {
        self.add_protein(definition, Some(sequence))
    }

    /// Persists every queued protein. Returns how many were written.
    pub fn flush(&self) -> Result<usize> {
        let mut state = self.write_loaded()?;
        write_pending(&self.config, &self.file_lock, &mut state)
    }

    /// Proteins added since the last successful flush.
    pub fn pending(&self) -> usize {
        self.state.read().map(|s| s.pending.len()).unwrap_or(0)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_loaded()?.store.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn is_populated(&self) -> Result<bool> {
        Ok(self.read_loaded()?.store.is_populated())
    }

    pub fn index_of(&self, definition: &str) -> Result<Option<u32>> {
        Ok(self.read_loaded()?.store.index_of(definition))
    }

    pub fn definition_of(&self, index: u32) -> Result<Arc<str>> {
        self.read_loaded()?
            .store
            .definition_of(index)
            .cloned()
            .ok_or(CacheError::UnknownIndex(index))
    }

    pub fn sequence_of(&self, index: u32) -> Result<Arc<str>> {
        let state = self.read_loaded()?;
        let entry = state
            .store
            .get(index)
            .ok_or(CacheError::UnknownIndex(index))?;
        entry
            .sequence
            .clone()
            .ok_or(CacheError::MissingSequence(index))
    }

    /// Slices `[offset, offset + length)` out of protein `index` and overlays
    /// `ptms` on it.
    pub fn peptide_sequence(
        &self,
        index: u32,
        offset: usize,
        length: usize,
        ptms: &[Ptm],
    ) -> Result<String> {
        let sequence = self.sequence_of(index)?;
        let peptide = offset
            .checked_add(length)
            .and_then(|end| sequence.get(offset..end))
            .ok_or(CacheError::OutOfRange {
                index,
                offset,
                length,
                sequence_length: sequence.len(),
            })?;
        annotate_peptide(peptide, ptms, self.lookup.as_ref())
    }
}

impl Drop for ProteinCache {
    fn drop(&mut self) {
        let Self {
            config,
            file_lock,
            state,
            ..
        } = self;
        match state.get_mut() {
            Ok(state) => {
                // Failures are logged by write_pending.
                let _ = write_pending(config, file_lock, state);
            }
            Err(_) => error!(
                "Protein cache lock for {:?} poisoned, unflushed proteins are lost",
                config.path
            ),
        }
    }
}

fn write_pending(config: &CacheConfig, lock: &FileLock, state: &mut CacheState) -> Result<usize> {
    if state.pending.is_empty() {
        return Ok(0);
    }
    debug!("Writing {} proteins to {:?}", state.pending.len(), config.path);
    let CacheState { store, pending, .. } = state;
    let entries = pending.iter().filter_map(|&index| store.get(index));
    match persistence::append(&config.path, entries, lock) {
        Ok(written) => {
            pending.clear();
            Ok(written)
        }
        Err(e) => {
            error!(
                "Error writing protein cache to {:?}, keeping {} queued: {}",
                config.path,
                pending.len(),
                e
            );
            Err(e)
        }
    }
}

fn check_field(field: &'static str, value: &str) -> Result<()> {
    if value.contains(['\t', '\n', '\r']) {
        return Err(CacheError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
