//! Disk backed protein cache for peptide lookups.
//!
//! Proteins are deduplicated by definition and given dense indices. New
//! proteins are appended to a tab separated log in batches, and peptides are
//! cut out of cached sequences with their PTMs written inline.

pub mod cache;
pub mod config;
pub mod errors;
pub mod protein;
pub mod ptm;

pub use cache::{FileLock, Insertion, ProteinCache};
pub use config::CacheConfig;
pub use errors::{CacheError, Result};
pub use ptm::{Ptm, PtmDescriptor, PtmLookup, PtmTable};
