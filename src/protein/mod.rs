pub mod fasta;
pub mod models;
pub mod store;

pub use models::ProteinEntry;
pub use store::SequenceStore;
