//! Parallel tokenization into per-worker chunks, then the k-way merge that
//! renumbers term ids from insertion order to lexicographic order.
//!
//! Workers share three locks: the corpus (fetch one document per critical
//! section), the vocabulary (term lookup/insert plus the budget check), and
//! progress reporting. Analysis and chunk writes run unlocked. A failed
//! worker raises a poison flag that the others observe at the corpus lock,
//! so the pool drains quickly and the first error surfaces from the driver.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::analyzer::BoxedAnalyzer;
use crate::corpus::Corpus;
use crate::postings::{multiway_merge, ChunkReader, PostingsFileWriter, PostingsRecord};
use crate::vocab::{TermSet, VocabularyWriter};
use crate::{Error, Result};

use super::metadata::{LabelStore, MetadataWriter};
use super::{files, Progress};

struct VocabState {
    terms: TermSet,
    exceeded_budget: bool,
}

/// Tokenize the corpus with `num_workers` threads, writing one chunk file
/// per worker and growing a shared vocabulary, then merge the chunks into
/// the final postings file. Returns the number of unique terms.
pub(crate) fn tokenize_docs(
    dir: &Path,
    docs: &mut dyn Corpus,
    analyzer: &BoxedAnalyzer,
    mdata_writer: &MetadataWriter,
    labels: &LabelStore,
    num_workers: usize,
    ram_budget: u64,
) -> Result<u64> {
    let num_docs = docs.size();
    let num_workers = num_workers.max(1);
    log::info!("tokenizing {num_docs} documents with {num_workers} workers");

    let corpus = Mutex::new(docs);
    let vocab = Mutex::new(VocabState {
        terms: TermSet::new(),
        exceeded_budget: false,
    });
    let progress = Mutex::new(Progress::new("tokenizing documents", num_docs));
    let failed = AtomicBool::new(false);

    let results: Vec<Result<()>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_workers);
        for worker in 0..num_workers {
            let chunk_path = dir.join(files::chunk(worker));
            let analyzer = analyzer.clone_box();
            let corpus = &corpus;
            let vocab = &vocab;
            let progress = &progress;
            let failed = &failed;
            handles.push(scope.spawn(move || {
                let result = worker_loop(
                    chunk_path,
                    analyzer,
                    corpus,
                    vocab,
                    progress,
                    failed,
                    mdata_writer,
                    labels,
                    ram_budget,
                );
                if result.is_err() {
                    failed.store(true, Ordering::Relaxed);
                }
                result
            }));
        }
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|_| Err(Error::WorkerPanic)))
            .collect()
    });
    for result in results {
        result?;
    }

    let vocab = vocab.into_inner().terms;
    merge_chunks(dir, num_workers, vocab, num_docs)
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    chunk_path: PathBuf,
    mut analyzer: BoxedAnalyzer,
    corpus: &Mutex<&mut dyn Corpus>,
    vocab: &Mutex<VocabState>,
    progress: &Mutex<Progress>,
    failed: &AtomicBool,
    mdata_writer: &MetadataWriter,
    labels: &LabelStore,
    ram_budget: u64,
) -> Result<()> {
    let mut chunk = BufWriter::new(File::create(&chunk_path)?);

    loop {
        let doc = {
            let mut docs = corpus.lock();
            if failed.load(Ordering::Relaxed) || !docs.has_next() {
                break;
            }
            docs.next()?
        };

        progress.lock().tick();

        let counts = analyzer.analyze(&doc)?;

        if counts.is_empty() {
            log::warn!("empty document (id = {}) generated", doc.id);
        }

        let length: u64 = counts.iter().map(|(_, weight)| weight.round() as u64).sum();
        mdata_writer.write(doc.id, length, counts.len() as u64)?;
        labels.set(doc.id, &doc.label);

        let mut pd_counts = Vec::with_capacity(counts.len());
        {
            let mut state = vocab.lock();
            for (term, weight) in &counts {
                pd_counts.push((state.terms.insert(term), *weight));
            }
            if !state.exceeded_budget && state.terms.bytes_used() as u64 > ram_budget {
                state.exceeded_budget = true;
                log::warn!(
                    "exceeding RAM budget; indexing cannot proceed without \
                     exceeding specified RAM budget"
                );
            }
        }

        PostingsRecord::with_counts(doc.id, pd_counts).write_packed(&mut chunk)?;
    }

    chunk.flush()?;
    Ok(())
}

/// Merge the per-worker chunks into the final postings file, renumbering
/// term ids from insertion order to lexicographic rank.
///
/// The vocabulary arrives in insertion order: `keys[i]` is the string the
/// workers wrote as term id `i`. Reinserting the sorted keys into the
/// emptied set rebuilds it with lexicographic indices, which also stream to
/// the on-disk vocabulary map.
fn merge_chunks(
    dir: &Path,
    num_chunks: usize,
    mut vocab: TermSet,
    num_docs: u64,
) -> Result<u64> {
    let keys = vocab.extract_keys();

    {
        let mut writer = VocabularyWriter::new(&dir.join(files::TERM_IDS))?;
        let mut sorted_keys = keys.clone();
        sorted_keys.sort_unstable();
        for key in &sorted_keys {
            vocab.insert(key);
            writer.insert(key)?;
        }
        writer.finish()?;
    }
    let unique_terms = vocab.len() as u64;

    let mut chunks = Vec::with_capacity(num_chunks);
    for worker in 0..num_chunks {
        let path = dir.join(files::chunk(worker));
        if !path.exists() {
            continue;
        }
        // a worker that saw no documents leaves a zero-byte chunk behind
        if fs::metadata(&path)?.len() == 0 {
            fs::remove_file(&path)?;
            continue;
        }
        chunks.push(ChunkReader::<f64>::open(&path)?);
    }

    let mut writer = PostingsFileWriter::<f64>::new(&dir.join(files::POSTINGS), num_docs)?;
    multiway_merge(chunks, |record| {
        let mut counts = Vec::with_capacity(record.counts().len());
        for &(old_id, weight) in record.counts() {
            let key = &keys[old_id as usize];
            let new_id = vocab.find(key).ok_or_else(|| {
                Error::Corruption(format!("term `{key}` missing from rebuilt vocabulary"))
            })?;
            counts.push((new_id, weight));
        }
        counts.sort_unstable_by_key(|&(term, _)| term);
        writer.write(&PostingsRecord::with_counts(record.primary_key(), counts))
    })?;
    writer.finish()?;

    Ok(unique_terms)
}
