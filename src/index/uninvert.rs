//! Uninversion: rebuild a forward index from an existing inverted index.
//!
//! The inverted index's term-major postings are fed through the
//! RAM-bounded transposer in term-id order, merged into an uncompressed
//! document-major file, and then compressed: integer counts widen to f64 and
//! every absent document materializes as an empty record so the final file
//! is dense in DocId space. Metadata is copied verbatim from the inverted
//! directory first, because inversion preserves vocabulary and label
//! identity.

use std::fs;
use std::path::{Path, PathBuf};

use crate::mmap::FileBytes;
use crate::postings::{PostingsFileReader, PostingsFileWriter, PostingsInverter, PostingsRecord};
use crate::{Error, Result, TermId};

use super::{files, Progress};

/// The inverted-index interface consumed during uninversion
pub trait InvertedSource {
    /// Number of documents the inverted index covers
    fn num_docs(&self) -> u64;

    /// Number of distinct terms (primary keys of the postings file)
    fn unique_terms(&self) -> u64;

    /// Term-major postings: `(term, [(doc, count)])`
    fn search_primary(&self, term: TermId) -> Result<PostingsRecord<u64>>;

    /// The index directory metadata is copied from
    fn directory(&self) -> &Path;
}

/// Read side of an inverted index directory.
///
/// The postings share this crate's packed format, keyed by term id with
/// integer counts; document count comes from the metadata sidecar.
pub struct InvertedIndexReader {
    dir: PathBuf,
    postings: PostingsFileReader<u64>,
    num_docs: u64,
}

impl InvertedIndexReader {
    pub fn open(dir: &Path) -> Result<Self> {
        let postings = PostingsFileReader::open(&dir.join(files::POSTINGS))?;
        let index = FileBytes::open(&dir.join(files::METADATA_INDEX))?;
        if index.len() % 8 != 0 {
            return Err(Error::Corruption(
                "inverted metadata index has irregular length".to_string(),
            ));
        }
        let num_docs = (index.len() / 8) as u64;
        Ok(Self {
            dir: dir.to_path_buf(),
            postings,
            num_docs,
        })
    }
}

impl InvertedSource for InvertedIndexReader {
    fn num_docs(&self) -> u64 {
        self.num_docs
    }

    fn unique_terms(&self) -> u64 {
        self.postings.num_docs()
    }

    fn search_primary(&self, term: TermId) -> Result<PostingsRecord<u64>> {
        self.postings.find(term)
    }

    fn directory(&self) -> &Path {
        &self.dir
    }
}

/// Copy label, vocabulary, and metadata files from the inverted directory.
///
/// The term-id mappings are tolerated absent: an inverted index produced
/// from pre-vectorized data has no string vocabulary.
pub(crate) fn create_uninverted_metadata(dir: &Path, inverted_dir: &Path) -> Result<()> {
    let required = [
        files::DOC_LABELS,
        files::LABEL_IDS,
        files::METADATA_DB,
        files::METADATA_INDEX,
    ];
    for file in required {
        fs::copy(inverted_dir.join(file), dir.join(file))?;
    }
    for file in [files::TERM_IDS, files::TERM_IDS_INVERSE] {
        let src = inverted_dir.join(file);
        if src.exists() {
            fs::copy(src, dir.join(file))?;
        }
    }
    Ok(())
}

/// Transpose the inverted index into this directory's forward postings file
pub(crate) fn uninvert(dir: &Path, inverted: &dyn InvertedSource, ram_budget: u64) -> Result<()> {
    let mut inverter = PostingsInverter::new(dir, ram_budget);
    let mut progress = Progress::new("uninverting postings", inverted.unique_terms());
    for term in 0..inverted.unique_terms() {
        progress.tick();
        let pdata = inverted.search_primary(term)?;
        inverter.invert(term, pdata.counts())?;
    }
    inverter.merge(&dir.join(files::POSTINGS))?;

    compress(dir, inverted.num_docs())
}

/// Compression pass: rename the uncompressed file aside, widen integer
/// counts to f64, and rewrite through the standard packed writer, which
/// materializes every DocId gap as an empty record.
fn compress(dir: &Path, num_docs: u64) -> Result<()> {
    let path = dir.join(files::POSTINGS);
    let uncompressed = dir.join(files::POSTINGS_UNCOMPRESSED);
    fs::rename(&path, &uncompressed)?;

    {
        let mut writer = PostingsFileWriter::<f64>::new(&path, num_docs)?;
        let mut input = std::io::BufReader::new(fs::File::open(&uncompressed)?);
        while let Some((record, _)) = PostingsRecord::<u64>::read_packed(&mut input)? {
            let counts = record
                .counts()
                .iter()
                .map(|&(term, count)| (term, count as f64))
                .collect();
            writer.write(&PostingsRecord::with_counts(record.primary_key(), counts))?;
        }
        writer.finish()?;
    }

    log::info!(
        "created compressed postings file ({} bytes)",
        fs::metadata(&path)?.len()
    );
    fs::remove_file(&uncompressed)?;
    Ok(())
}
