use super::lookup::{Ptm, PtmLookup};
use crate::errors::{CacheError, Result};
use log::warn;
use std::collections::HashMap;

/// Overlays `ptms` on `peptide`.
///
/// Decorating modifications are written after their residue as
/// `R[description]`. Replacements (`original->modified`) are written as
/// `[description]` in place of the residues they consume; the scan resumes
/// after `original`, clamped to at least one residue and at most the end of
/// the peptide. When two PTMs share a position the later one wins.
pub fn annotate_peptide<L: PtmLookup + ?Sized>(
    peptide: &str,
    ptms: &[Ptm],
    lookup: &L,
) -> Result<String> {
    if ptms.is_empty() {
        return Ok(peptide.to_string());
    }

    let residues: Vec<char> = peptide.chars().collect();
    let mut by_position: HashMap<usize, &Ptm> = HashMap::with_capacity(ptms.len());
    for ptm in ptms {
        if ptm.position == 0 || ptm.position > residues.len() {
            warn!(
                "PTM {} at position {} is outside peptide {} (length {})",
                ptm.code,
                ptm.position,
                peptide,
                residues.len()
            );
            continue;
        }
        by_position.insert(ptm.position, ptm);
    }

    let mut out = String::with_capacity(peptide.len() + 16 * by_position.len());
    let mut pos = 1;
    while pos <= residues.len() {
        let residue = residues[pos - 1];
        let Some(ptm) = by_position.get(&pos) else {
            out.push(residue);
            pos += 1;
            continue;
        };

        let descriptor = lookup
            .describe(&ptm.code)
            .ok_or_else(|| CacheError::UnknownPtm(ptm.code.clone()))?;

        match descriptor.replaced_residues() {
            Some(original) => {
                let remaining = residues.len() - pos + 1;
                let consumed = original.chars().count().clamp(1, remaining);
                out.push('[');
                out.push_str(&descriptor.description);
                out.push(']');
                pos += consumed;
            }
            None => {
                out.push(residue);
                out.push('[');
                out.push_str(&descriptor.description);
                out.push(']');
                pos += 1;
            }
        }
    }
    Ok(out)
}
