use tempfile::TempDir;

use super::line_corpus_config;
use crate::{files, Error, ForwardIndex};

#[test]
fn test_three_document_corpus() {
    let tmp = TempDir::new().unwrap();
    let config = line_corpus_config(tmp.path(), "tiny", &["a b", "b c", "a"]);

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), 3);
    assert_eq!(index.unique_terms(), 3);

    // the persisted vocabulary is lexicographic: a=0, b=1, c=2
    assert_eq!(index.term_id("a"), Some(0));
    assert_eq!(index.term_id("b"), Some(1));
    assert_eq!(index.term_id("c"), Some(2));
    assert_eq!(index.term_text(2).as_deref(), Some("c"));
    assert_eq!(index.term_id("z"), None);

    for d in 0..3 {
        assert_eq!(index.search_primary(d).unwrap().primary_key(), d);
    }
    assert_eq!(
        index.search_primary(0).unwrap().counts(),
        &[(0, 1.0), (1, 1.0)]
    );
    assert_eq!(
        index.search_primary(1).unwrap().counts(),
        &[(1, 1.0), (2, 1.0)]
    );
    assert_eq!(index.search_primary(2).unwrap().counts(), &[(0, 1.0)]);

    assert_eq!(
        index.stream_for(1).unwrap().collect::<Vec<_>>(),
        vec![(1, 1.0), (2, 1.0)]
    );
    assert!(index.stream_for(3).is_none());
    assert!(matches!(
        index.search_primary(3),
        Err(Error::InvalidDocId(3))
    ));

    assert_eq!(index.doc_length(0).unwrap(), 2);
    assert_eq!(index.doc_unique_terms(0).unwrap(), 2);
    assert_eq!(index.doc_length(2).unwrap(), 1);

    // every term id below unique_terms() is referenced by some document
    let mut referenced = vec![false; 3];
    for d in 0..3 {
        for (term, _) in index.stream_for(d).unwrap() {
            referenced[term as usize] = true;
        }
    }
    assert!(referenced.iter().all(|&r| r));

    assert!(ForwardIndex::valid(index.directory()));
}

#[test]
fn test_empty_document_keeps_docids_dense() {
    let tmp = TempDir::new().unwrap();
    let config = line_corpus_config(tmp.path(), "gaps", &["a b", "", "b"]);

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), 3);

    let empty = index.search_primary(1).unwrap();
    assert_eq!(empty.primary_key(), 1);
    assert!(empty.is_empty());
    assert_eq!(index.doc_unique_terms(1).unwrap(), 0);
    assert_eq!(index.doc_length(1).unwrap(), 0);

    assert_eq!(index.search_primary(2).unwrap().counts().len(), 1);
}

#[test]
fn test_single_document_corpus() {
    let tmp = TempDir::new().unwrap();
    let config = line_corpus_config(tmp.path(), "one", &["only document here"]);

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), 1);
    assert_eq!(index.unique_terms(), 3);
    assert_eq!(index.term_id("document"), Some(0));
    assert_eq!(index.term_id("here"), Some(1));
    assert_eq!(index.term_id("only"), Some(2));
}

#[test]
fn test_zero_ram_budget_still_completes() {
    let tmp = TempDir::new().unwrap();
    let mut config = line_corpus_config(tmp.path(), "budget", &["a b c", "d e f", "a f"]);
    config.indexer_ram_budget = 0;

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), 3);
    assert_eq!(index.unique_terms(), 6);
}

#[test]
fn test_chunks_are_cleaned_up() {
    let tmp = TempDir::new().unwrap();
    let mut config = line_corpus_config(tmp.path(), "clean", &["a", "b"]);
    // more workers than documents: some produce zero-byte chunks
    config.indexer_threads = Some(4);

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), 2);
    for worker in 0..4 {
        assert!(!index.directory().join(files::chunk(worker)).exists());
    }
}

#[test]
fn test_marker_commits_the_directory() {
    let tmp = TempDir::new().unwrap();
    let config = line_corpus_config(tmp.path(), "commit", &["a b", "c"]);

    let index = ForwardIndex::create(&config).unwrap();
    let dir = index.directory().to_path_buf();
    assert!(ForwardIndex::valid(&dir));
    drop(index);

    // a directory without the marker is treated as absent
    std::fs::remove_file(dir.join(files::UNIQUE_TERMS)).unwrap();
    assert!(!ForwardIndex::valid(&dir));

    let rebuilt = ForwardIndex::open_or_create(&config).unwrap();
    assert!(ForwardIndex::valid(&dir));
    assert_eq!(rebuilt.num_docs(), 2);
    assert_eq!(rebuilt.unique_terms(), 3);
}

#[test]
fn test_reopen_matches_created_index() {
    let tmp = TempDir::new().unwrap();
    let config = line_corpus_config(tmp.path(), "reopen", &["x y", "y z z"]);
    super::write_labels(&config, &["pos", "neg"]);

    let created = ForwardIndex::create(&config).unwrap();
    let reopened = ForwardIndex::open(created.directory()).unwrap();

    assert_eq!(reopened.num_docs(), created.num_docs());
    assert_eq!(reopened.unique_terms(), created.unique_terms());
    assert_eq!(reopened.label(0).unwrap(), "pos");
    assert_eq!(reopened.label(1).unwrap(), "neg");
    assert_eq!(reopened.label_ids().id("neg"), Some(2));
    assert_eq!(
        reopened.search_primary(1).unwrap(),
        created.search_primary(1).unwrap()
    );
    // doc 1 is "y z z": y=0... vocabulary is {x, y, z} sorted
    assert_eq!(reopened.term_id("z"), Some(2));
    assert_eq!(
        reopened.search_primary(1).unwrap().counts(),
        &[(1, 1.0), (2, 2.0)]
    );
}
