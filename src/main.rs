use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use protcache::protein::fasta::ProteinSequenceCollection;
use protcache::{CacheConfig, ProteinCache, Ptm, PtmTable};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Disk backed protein cache for peptide lookups")]
struct Cli {
    /// Cache file to read and append to
    #[arg(short, long, default_value = protcache::config::PROTEIN_CACHE_FILE_NAME)]
    cache: PathBuf,

    /// JSON cache configuration; overrides --cache
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add every protein of a FASTA file to the cache
    Index {
        fasta: PathBuf,

        /// New proteins queued before each write
        #[arg(long)]
        buffer_size: Option<usize>,
    },
    /// Print a peptide cut out of a cached protein
    Peptide {
        #[arg(long)]
        protein: u32,

        #[arg(long)]
        offset: usize,

        #[arg(long)]
        length: usize,

        /// Modification as POSITION:CODE, 1-based within the peptide
        #[arg(long = "ptm", value_parser = parse_ptm)]
        ptms: Vec<Ptm>,

        /// JSON object mapping PTM codes to descriptions
        #[arg(long)]
        ptm_table: Option<PathBuf>,
    },
}

fn parse_ptm(s: &str) -> Result<Ptm, String> {
    let (position, code) = s
        .split_once(':')
        .ok_or_else(|| format!("expected POSITION:CODE, got {:?}", s))?;
    let position = position
        .parse::<usize>()
        .map_err(|e| format!("bad PTM position {:?}: {}", position, e))?;
    if code.is_empty() {
        return Err(format!("missing PTM code in {:?}", s));
    }
    Ok(Ptm::new(position, code))
}

fn index_fasta(cache: &ProteinCache, fasta: &Path) -> anyhow::Result<()> {
    let st = Instant::now();
    let proteins = ProteinSequenceCollection::from_fasta_file(fasta)?;

    let bar = ProgressBar::new(proteins.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} proteins")
            .context("progress bar template")?,
    );

    let new_count = AtomicUsize::new(0);
    proteins
        .records
        .par_iter()
        .try_for_each(|record| -> protcache::Result<()> {
            let inserted = cache.add_protein(&record.definition, record.sequence.as_deref())?;
            if inserted.is_new() {
                new_count.fetch_add(1, Ordering::Relaxed);
            }
            bar.inc(1);
            Ok(())
        })?;
    let written = cache.flush()?;
    bar.finish_and_clear();

    let new_count = new_count.into_inner();
    info!(
        "Indexed {} proteins from {:?} in {:?}: {} new, {} already cached, {} written in the final flush",
        proteins.len(),
        fasta,
        st.elapsed(),
        new_count,
        proteins.len() - new_count,
        written
    );
    println!("{} proteins in cache", cache.len()?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("PROTCACHE_LOG", "warn,protcache=info"))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => CacheConfig::from_json_file(path)
            .with_context(|| format!("reading cache configuration {:?}", path))?,
        None => CacheConfig::new(&cli.cache),
    };

    match cli.command {
        Command::Index { fasta, buffer_size } => {
            if let Some(buffer_size) = buffer_size {
                config = config.with_buffer_size(buffer_size);
            }
            let cache = ProteinCache::new(config, Arc::new(PtmTable::new()));
            index_fasta(&cache, &fasta)?;
        }
        Command::Peptide {
            protein,
            offset,
            length,
            ptms,
            ptm_table,
        } => {
            let table = match ptm_table {
                Some(path) => PtmTable::from_json_file(&path)
                    .with_context(|| format!("reading PTM table {:?}", path))?,
                None => PtmTable::new(),
            };
            let cache = ProteinCache::new(config, Arc::new(table));
            let peptide = cache.peptide_sequence(protein, offset, length, &ptms)?;
            println!("{}", peptide);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ptm() {
        assert_eq!(parse_ptm("3:21").unwrap(), Ptm::new(3, "21"));
        assert!(parse_ptm("3").is_err());
        assert!(parse_ptm("x:21").is_err());
        assert!(parse_ptm("3:").is_err());
    }
}
