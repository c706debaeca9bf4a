//! Append-only, tab separated protein log.
//!
//! Each line is `index<TAB>definition[<TAB>sequence]`. Lines are replayed in
//! file order on load, so the store hands out the same indices it did when the
//! lines were written.

use crate::errors::{CacheError, Result};
use crate::protein::{ProteinEntry, SequenceStore};
use log::{error, info, warn};
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Guards one cache file. Clone it to share between caches over the same path.
#[derive(Debug, Clone, Default)]
pub struct FileLock(Arc<RwLock<()>>);

impl FileLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CacheLine<'a> {
    pub index: &'a str,
    pub definition: &'a str,
    pub sequence: Option<&'a str>,
}

impl<'a> CacheLine<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut fields = line.split('\t');
        let index = fields.next()?;
        let definition = fields.next()?;
        let sequence = fields.next();
        Some(Self {
            index,
            definition,
            sequence,
        })
    }
}

pub(crate) fn write_entry<W: Write>(out: &mut W, entry: &ProteinEntry) -> std::io::Result<()> {
    match &entry.sequence {
        Some(sequence) => writeln!(out, "{}\t{}\t{}", entry.index, entry.definition, sequence),
        None => writeln!(out, "{}\t{}", entry.index, entry.definition),
    }
}

/// Replays `path` into `store`. Returns how many entries were registered.
///
/// A missing file is not an error. Bytes that are not UTF-8 are replaced, and
/// an unterminated last line (an interrupted append) is skipped; `append`
/// drops that same tail before writing, so both agree on the indices. On a
/// read error the entries read so far stay in the store.
pub fn load_into(path: &Path, store: &mut SequenceStore, lock: &FileLock) -> Result<usize> {
    if !path.exists() {
        info!("No protein cache at {:?}, starting empty", path);
        return Ok(0);
    }
    let st = Instant::now();
    let _guard = lock.0.read()?;
    let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut registered = 0;
    let mut line_num = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| CacheError::io(path, e))?;
        if n == 0 {
            break;
        }
        line_num += 1;
        if buf.pop() != Some(b'\n') {
            warn!(
                "Skipping unterminated last line {} in {:?}, left by an interrupted write",
                line_num, path
            );
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            warn!(
                "Line {} of {:?} is not valid UTF-8, bad bytes replaced",
                line_num, path
            );
        }
        let Some(parsed) = CacheLine::parse(&line) else {
            warn!("Skipping malformed line {} in {:?}", line_num, path);
            continue;
        };
        if let Some(existing) = store.index_of(parsed.definition) {
            warn!(
                "Skipping repeated definition on line {} of {:?} (already index {})",
                line_num, path, existing
            );
            continue;
        }
        let index = match parsed.sequence {
            Some(sequence) => store.add_definition_and_sequence(parsed.definition, sequence)?,
            None => store.add_definition(parsed.definition)?,
        };
        if parsed.index.parse::<u32>().ok() != Some(index) {
            log::debug!(
                "Line {} of {:?} recorded index {:?}, assigned {}",
                line_num,
                path,
                parsed.index,
                index
            );
        }
        registered += 1;
    }
    info!(
        "Loaded {} proteins from {:?} in {:?}",
        registered,
        path,
        st.elapsed()
    );
    Ok(registered)
}

/// Cuts an unterminated last line off `file`. Returns the resulting length.
fn drop_partial_tail(file: &mut File) -> std::io::Result<u64> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }
    let mut chunk = vec![0u8; 4096];
    let mut end = len;
    let keep = loop {
        if end == 0 {
            break 0;
        }
        let start = end.saturating_sub(chunk.len() as u64);
        let buf = &mut chunk[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(buf)?;
        if let Some(pos) = buf.iter().rposition(|&b| b == b'\n') {
            break start + pos as u64 + 1;
        }
        end = start;
    };
    if keep < len {
        warn!(
            "Dropping {} bytes of unterminated line at the end of the protein cache",
            len - keep
        );
        file.set_len(keep)?;
    }
    Ok(keep)
}

fn write_entries<'a, I>(file: &File, entries: I) -> std::io::Result<usize>
where
    I: IntoIterator<Item = &'a ProteinEntry>,
{
    let mut out = BufWriter::new(file);
    let mut written = 0;
    for entry in entries {
        write_entry(&mut out, entry)?;
        written += 1;
    }
    out.flush()?;
    drop(out);
    file.sync_data()?;
    Ok(written)
}

/// Appends `entries` to `path` and syncs.
///
/// Either every line is written or the file is truncated back to where it
/// was, so a failed append can be retried without leaving a torn line.
pub fn append<'a, I>(path: &Path, entries: I, lock: &FileLock) -> Result<usize>
where
    I: IntoIterator<Item = &'a ProteinEntry>,
{
    let _guard = lock.0.write()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
    }
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| CacheError::io(path, e))?;
    let start = drop_partial_tail(&mut file).map_err(|e| CacheError::io(path, e))?;

    write_entries(&file, entries).map_err(|e| {
        if let Err(rollback) = file.set_len(start) {
            error!(
                "Could not truncate {:?} back to {} bytes after a failed write: {}",
                path, start, rollback
            );
        }
        CacheError::io(path, e)
    })
}
