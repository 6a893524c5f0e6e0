use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::line_corpus_config;
use crate::index::metadata::{LabelIdMapping, MetadataWriter};
use crate::postings::{PostingsFileWriter, PostingsRecord};
use crate::{files, DocId, ForwardIndex, TermId};

/// Build an inverted fixture directory by transposing a tokenized forward
/// index; weights in the tokenize path are whole counts, so the u64
/// narrowing is exact.
fn invert_fixture(forward: &ForwardIndex, dir: &Path) {
    fs::create_dir_all(dir).unwrap();

    let unique_terms = forward.unique_terms();
    let mut postings: Vec<Vec<(DocId, u64)>> = vec![Vec::new(); unique_terms as usize];
    for doc in 0..forward.num_docs() {
        for (term, weight) in forward.stream_for(doc).unwrap() {
            postings[term as usize].push((doc, weight as u64));
        }
    }

    let mut writer =
        PostingsFileWriter::<u64>::new(&dir.join(files::POSTINGS), unique_terms).unwrap();
    for (term, counts) in postings.into_iter().enumerate() {
        writer
            .write(&PostingsRecord::with_counts(term as TermId, counts))
            .unwrap();
    }
    writer.finish().unwrap();

    for file in [
        files::DOC_LABELS,
        files::LABEL_IDS,
        files::TERM_IDS,
        files::TERM_IDS_INVERSE,
        files::METADATA_DB,
        files::METADATA_INDEX,
    ] {
        fs::copy(forward.directory().join(file), dir.join(file)).unwrap();
    }
}

#[test]
fn test_uninvert_matches_tokenized_index() {
    let tmp = TempDir::new().unwrap();
    let mut config = line_corpus_config(tmp.path(), "equiv", &["a b a", "b c", "a c c"]);

    let tokenized = ForwardIndex::create(&config).unwrap();

    let inverted_dir = tmp.path().join("equiv-inv");
    invert_fixture(&tokenized, &inverted_dir);

    config.forward_index = tmp.path().join("equiv-uninv");
    config.uninvert = true;
    config.inverted_index = Some(inverted_dir);
    let uninverted = ForwardIndex::create(&config).unwrap();

    assert_eq!(uninverted.num_docs(), tokenized.num_docs());
    assert_eq!(uninverted.unique_terms(), tokenized.unique_terms());
    for doc in 0..tokenized.num_docs() {
        assert_eq!(
            uninverted.search_primary(doc).unwrap(),
            tokenized.search_primary(doc).unwrap()
        );
    }

    // both construction paths write the same bytes
    for file in [files::POSTINGS, files::POSTINGS_OFFSETS] {
        assert_eq!(
            fs::read(tokenized.directory().join(file)).unwrap(),
            fs::read(uninverted.directory().join(file)).unwrap(),
            "{file} differs between construction paths"
        );
    }

    // the transient uncompressed file is gone
    assert!(!uninverted
        .directory()
        .join(files::POSTINGS_UNCOMPRESSED)
        .exists());

    // vocabulary and labels were carried over
    assert_eq!(uninverted.term_id("c"), Some(2));
    assert_eq!(uninverted.label(0).unwrap(), tokenized.label(0).unwrap());
}

#[test]
fn test_uninvert_fills_document_gaps() {
    let tmp = TempDir::new().unwrap();
    let inverted_dir = tmp.path().join("gaps-inv");
    fs::create_dir_all(&inverted_dir).unwrap();

    // 7 documents; docs 5 and 6 appear in no term's postings
    let num_docs = 7u64;
    let term_postings: Vec<Vec<(DocId, u64)>> =
        vec![vec![(0, 2), (2, 1)], vec![(1, 1), (4, 3)], vec![(3, 1)]];

    let mut writer = PostingsFileWriter::<u64>::new(
        &inverted_dir.join(files::POSTINGS),
        term_postings.len() as u64,
    )
    .unwrap();
    for (term, counts) in term_postings.iter().enumerate() {
        writer
            .write(&PostingsRecord::with_counts(term as TermId, counts.clone()))
            .unwrap();
    }
    writer.finish().unwrap();

    let mdata = MetadataWriter::new(&inverted_dir, num_docs).unwrap();
    for doc in 0..num_docs {
        mdata.write(doc, 1, 1).unwrap();
    }
    mdata.finish().unwrap();

    let labels: Vec<String> = (0..num_docs).map(|_| "[none]".to_string()).collect();
    fs::write(
        inverted_dir.join(files::DOC_LABELS),
        labels.join("\n") + "\n",
    )
    .unwrap();
    LabelIdMapping::from_labels(&labels)
        .save(&inverted_dir.join(files::LABEL_IDS))
        .unwrap();

    let mut config = line_corpus_config(tmp.path(), "gaps", &["unused"]);
    config.forward_index = tmp.path().join("gaps-fwd");
    config.uninvert = true;
    config.inverted_index = Some(inverted_dir);

    let index = ForwardIndex::create(&config).unwrap();
    assert_eq!(index.num_docs(), num_docs);
    assert_eq!(index.unique_terms(), 3);

    for doc in 0..num_docs {
        assert_eq!(index.search_primary(doc).unwrap().primary_key(), doc);
    }
    assert!(index.search_primary(5).unwrap().is_empty());
    assert!(index.search_primary(6).unwrap().is_empty());
    assert_eq!(index.search_primary(4).unwrap().counts(), &[(1, 3.0)]);
    assert_eq!(
        index.search_primary(0).unwrap().counts(),
        &[(0, 2.0)]
    );
}

#[test]
fn test_uninvert_under_tight_budget() {
    let tmp = TempDir::new().unwrap();
    let mut config = line_corpus_config(
        tmp.path(),
        "tight",
        &["a b c d", "b c d e", "c d e f", "f a"],
    );

    let tokenized = ForwardIndex::create(&config).unwrap();
    let inverted_dir = tmp.path().join("tight-inv");
    invert_fixture(&tokenized, &inverted_dir);

    config.forward_index = tmp.path().join("tight-uninv");
    config.uninvert = true;
    config.inverted_index = Some(inverted_dir);
    // 0 MiB: the inverter must spill on every term and still converge
    config.indexer_ram_budget = 0;

    let uninverted = ForwardIndex::create(&config).unwrap();
    for doc in 0..tokenized.num_docs() {
        assert_eq!(
            uninverted.search_primary(doc).unwrap(),
            tokenized.search_primary(doc).unwrap()
        );
    }
}
