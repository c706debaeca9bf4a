use protcache::config::{DEFAULT_BUFFER_SIZE, PROTEIN_CACHE_FILE_NAME};
use protcache::{CacheConfig, Insertion, ProteinCache, Ptm, PtmTable};
use rayon::prelude::*;
use std::sync::Arc;

fn lookup() -> Arc<PtmTable> {
    Arc::new(PtmTable::from_iter([
        ("21", "Phospho"),
        ("35", "Oxidation"),
        ("pe", "PE->X"),
    ]))
}

fn triples(cache: &ProteinCache) -> Vec<(u32, String, Option<String>)> {
    (0..cache.len().unwrap() as u32)
        .map(|i| {
            (
                i,
                cache.definition_of(i).unwrap().to_string(),
                cache.sequence_of(i).ok().map(|s| s.to_string()),
            )
        })
        .collect()
}

#[test]
fn round_trip_reproduces_indices() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::in_directory(dir.path());

    let before = {
        let cache = ProteinCache::new(config.clone(), lookup());
        cache
            .add_definition_and_sequence("sp|P1|ALPHA", "MKPEPTIDEPINK")
            .unwrap();
        cache.add_definition("sp|P2|BETA").unwrap();
        cache.add_definition_and_sequence("sp|P3|GAMMA", "MSTRAND").unwrap();
        assert_eq!(cache.flush().unwrap(), 3);
        triples(&cache)
    };

    let reopened = ProteinCache::new(config, lookup());
    assert_eq!(triples(&reopened), before);
    assert_eq!(
        reopened.add_definition("sp|P2|BETA").unwrap(),
        Insertion::Existing(1)
    );
    assert_eq!(
        reopened.add_definition_and_sequence("sp|P4|DELTA", "PINK").unwrap(),
        Insertion::New(3)
    );
    assert_eq!(reopened.pending(), 1);
    assert_eq!(
        reopened
            .peptide_sequence(0, 2, 7, &[Ptm::new(3, "21")])
            .unwrap(),
        "PE[Phospho]PTIDE"
    );
}

#[test]
fn appends_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::in_directory(dir.path());

    for (definition, sequence) in [("prot_a", "AAAA"), ("prot_b", "BBBB")] {
        let cache = ProteinCache::new(config.clone(), lookup());
        cache.add_definition_and_sequence(definition, sequence).unwrap();
        cache.flush().unwrap();
    }

    let content = std::fs::read_to_string(dir.path().join(PROTEIN_CACHE_FILE_NAME)).unwrap();
    assert_eq!(content, "0\tprot_a\tAAAA\n1\tprot_b\tBBBB\n");
}

#[test]
fn default_buffer_flushes_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ProteinCache::new(CacheConfig::in_directory(dir.path()), lookup());

    for i in 0..DEFAULT_BUFFER_SIZE - 1 {
        cache
            .add_definition_and_sequence(&format!("prot_{i}"), "PEPTIDE")
            .unwrap();
    }
    assert_eq!(cache.pending(), DEFAULT_BUFFER_SIZE - 1);
    assert!(!cache.path().exists());

    cache.add_definition("prot_last").unwrap();
    assert_eq!(cache.pending(), 0);
    let lines = std::fs::read_to_string(cache.path()).unwrap();
    assert_eq!(lines.lines().count(), DEFAULT_BUFFER_SIZE);
    assert_eq!(lines.lines().last(), Some("999\tprot_last"));
}

#[test]
fn concurrent_inserts_deduplicate() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::in_directory(dir.path()).with_buffer_size(64);
    let cache = ProteinCache::new(config.clone(), lookup());

    // 200 distinct proteins, each inserted by 8 tasks.
    let results: Vec<Insertion> = (0..1600)
        .into_par_iter()
        .map(|i| {
            let n = i % 200;
            cache
                .add_definition_and_sequence(&format!("prot_{n}"), &format!("SEQ{n}"))
                .unwrap()
        })
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_new()).count(), 200);
    assert_eq!(cache.len().unwrap(), 200);
    for n in 0..200 {
        let index = cache.index_of(&format!("prot_{n}")).unwrap().unwrap();
        assert_eq!(cache.sequence_of(index).unwrap().as_ref(), format!("SEQ{n}"));
    }
    cache.flush().unwrap();

    let content = std::fs::read_to_string(cache.path()).unwrap();
    assert_eq!(content.lines().count(), 200);

    let reopened = ProteinCache::new(config, lookup());
    assert_eq!(triples(&reopened), triples(&cache));
}

#[test]
fn shared_file_lock_between_caches() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::in_directory(dir.path());
    let writer = ProteinCache::new(config.clone(), lookup());
    writer.add_definition_and_sequence("prot_a", "PEPTIDE").unwrap();
    writer.flush().unwrap();

    let reader = ProteinCache::with_file_lock(config, lookup(), writer.file_lock().clone());
    assert_eq!(reader.index_of("prot_a").unwrap(), Some(0));
    assert_eq!(
        reader.peptide_sequence(0, 0, 7, &[Ptm::new(1, "pe")]).unwrap(),
        "[PE->X]PTIDE"
    );
}

#[test]
fn damaged_log_recovers_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::in_directory(dir.path());
    let path = dir.path().join(PROTEIN_CACHE_FILE_NAME);
    // A line with a stray byte, a junk line, and a write cut off mid-line.
    std::fs::write(
        &path,
        b"0\tprot_a\tAAAA\n1\tprot_\xffb\tBBBB\njunk\n2\tprot_c\n3\tprot_d\tDD",
    )
    .unwrap();

    let before = {
        let cache = ProteinCache::new(config.clone(), lookup());
        assert_eq!(cache.len().unwrap(), 3);
        assert_eq!(cache.index_of("prot_\u{FFFD}b").unwrap(), Some(1));
        assert_eq!(cache.index_of("prot_d").unwrap(), None);
        assert_eq!(
            cache.add_definition_and_sequence("prot_d", "DDDD").unwrap(),
            Insertion::New(3)
        );
        assert_eq!(cache.flush().unwrap(), 1);
        triples(&cache)
    };

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.ends_with(b"\n2\tprot_c\n3\tprot_d\tDDDD\n"));

    let reopened = ProteinCache::new(config, lookup());
    assert_eq!(triples(&reopened), before);
    assert_eq!(reopened.sequence_of(3).unwrap().as_ref(), "DDDD");
    assert_eq!(
        reopened.add_definition("prot_c").unwrap(),
        Insertion::Existing(2)
    );
}
