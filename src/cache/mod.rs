pub mod persistence;
pub mod protein_cache;

pub use persistence::FileLock;
pub use protein_cache::{Insertion, ProteinCache};
