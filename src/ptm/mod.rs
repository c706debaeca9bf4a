pub mod annotate;
pub mod lookup;

pub use annotate::annotate_peptide;
pub use lookup::{Ptm, PtmDescriptor, PtmLookup, PtmTable};
