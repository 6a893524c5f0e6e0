//! Forward index: construction orchestration and the read surface.
//!
//! `ForwardIndex::create` persists the configuration, dispatches on it
//! (libsvm fast path, uninversion, or parallel tokenization), reloads the
//! read surface, and writes the `corpus.uniqueterms` commit marker last.
//! A directory without the marker is treated as absent; construction is
//! monolithic and a partial directory is simply rebuilt.

pub mod metadata;
pub mod uninvert;

mod libsvm;
mod tokenize;

use std::fs;
use std::path::{Path, PathBuf};

use crate::postings::{PostingsFileReader, PostingsRecord, PostingsStream};
use crate::vocab::VocabularyMap;
use crate::{analyzer, corpus, Config, DocId, Error, Result, TermId};

use metadata::{DocMetadata, LabelIdMapping, LabelStore, MetadataWriter};
use uninvert::{InvertedIndexReader, InvertedSource};

/// Standard file names within an index directory
pub mod files {
    pub const CONFIG: &str = "config.toml";
    pub const POSTINGS: &str = "postings.index";
    pub const POSTINGS_OFFSETS: &str = "postings.index.offsets";
    pub const POSTINGS_UNCOMPRESSED: &str = "postings.index.uncompressed";
    pub const TERM_IDS: &str = "termids.mapping";
    pub const TERM_IDS_INVERSE: &str = "termids.mapping.inverse";
    pub const DOC_LABELS: &str = "docs.labels";
    pub const LABEL_IDS: &str = "labelids.mapping";
    pub const METADATA_DB: &str = "metadata.db";
    pub const METADATA_INDEX: &str = "metadata.index";
    pub const UNIQUE_TERMS: &str = "corpus.uniqueterms";

    /// Transient per-worker chunk file name
    pub fn chunk(worker: usize) -> String {
        format!("chunk-{worker}")
    }
}

/// Files that must exist for an index directory to be valid, beyond the
/// commit marker. The term-id mappings are optional: the libsvm path
/// produces none.
const REQUIRED_FILES: [&str; 7] = [
    files::CONFIG,
    files::POSTINGS,
    files::POSTINGS_OFFSETS,
    files::DOC_LABELS,
    files::LABEL_IDS,
    files::METADATA_DB,
    files::METADATA_INDEX,
];

/// A forward index opened for reading
pub struct ForwardIndex {
    dir: PathBuf,
    postings: PostingsFileReader<f64>,
    metadata: DocMetadata,
    labels: Vec<String>,
    label_ids: LabelIdMapping,
    vocab: Option<VocabularyMap>,
    total_unique_terms: u64,
}

impl ForwardIndex {
    /// Build a new index as the configuration describes, then open it
    pub fn create(config: &Config) -> Result<Self> {
        // configuration errors must surface before anything is written
        let is_libsvm = config.is_libsvm_format()?;
        if !is_libsvm && config.uninvert && config.inverted_index.is_none() {
            return Err(Error::Config(
                "uninvert requires the inverted-index key".to_string(),
            ));
        }

        let dir = config.forward_index.clone();
        fs::create_dir_all(&dir)?;
        config.save(&dir.join(files::CONFIG))?;

        let total_unique_terms = if is_libsvm {
            log::info!("creating index from libsvm data: {}", dir.display());
            libsvm::create_postings(&dir, config)?
        } else if config.uninvert {
            log::info!("creating index by uninverting: {}", dir.display());
            let inverted_dir = config.inverted_index.as_ref().ok_or_else(|| {
                Error::Config("uninvert requires the inverted-index key".to_string())
            })?;
            let inverted = InvertedIndexReader::open(inverted_dir)?;
            uninvert::create_uninverted_metadata(&dir, inverted.directory())?;
            uninvert::uninvert(&dir, &inverted, config.ram_budget_bytes())?;
            match VocabularyMap::open(&dir.join(files::TERM_IDS)) {
                Ok(map) => map.len(),
                Err(_) => inverted.unique_terms(),
            }
        } else {
            log::info!("creating forward index: {}", dir.display());
            let mut docs = corpus::from_config(config)?;
            let analyzer = analyzer::from_config(config)?;
            let num_docs = docs.size();
            let num_workers = config.indexer_threads.unwrap_or_else(num_cpus::get);

            let mdata_writer = MetadataWriter::new(&dir, num_docs)?;
            let labels = LabelStore::with_capacity(num_docs);
            let unique_terms = tokenize::tokenize_docs(
                &dir,
                docs.as_mut(),
                &analyzer,
                &mdata_writer,
                &labels,
                num_workers,
                config.ram_budget_bytes(),
            )?;
            mdata_writer.finish()?;
            labels.save(&dir.join(files::DOC_LABELS))?;

            let labels = labels.into_labels();
            LabelIdMapping::from_labels(&labels).save(&dir.join(files::LABEL_IDS))?;
            unique_terms
        };

        // the marker commits the directory; everything else is in place
        fs::write(
            dir.join(files::UNIQUE_TERMS),
            total_unique_terms.to_string(),
        )?;
        log::info!("done creating index: {}", dir.display());

        Self::open(&dir)
    }

    /// Open a valid index, or build it when the directory is absent or
    /// missing its commit marker
    pub fn open_or_create(config: &Config) -> Result<Self> {
        if Self::valid(&config.forward_index) {
            log::info!(
                "loading index from disk: {}",
                config.forward_index.display()
            );
            Self::open(&config.forward_index)
        } else {
            if config.forward_index.exists() {
                log::info!("existing forward index detected as invalid; recreating");
            }
            Self::create(config)
        }
    }

    /// Whether the directory holds a committed index: the marker plus every
    /// required file
    pub fn valid(dir: &Path) -> bool {
        if !dir.join(files::UNIQUE_TERMS).exists() {
            return false;
        }
        REQUIRED_FILES.iter().all(|file| dir.join(file).exists())
    }

    /// Open an existing index directory
    pub fn open(dir: &Path) -> Result<Self> {
        let metadata = DocMetadata::open(dir)?;
        let labels = LabelStore::load(&dir.join(files::DOC_LABELS))?;
        let label_ids = LabelIdMapping::load(&dir.join(files::LABEL_IDS))?;

        let vocab_path = dir.join(files::TERM_IDS);
        let vocab = if vocab_path.exists() {
            Some(VocabularyMap::open(&vocab_path)?)
        } else {
            None
        };

        let postings = PostingsFileReader::open(&dir.join(files::POSTINGS))?;

        let marker = dir.join(files::UNIQUE_TERMS);
        let total_unique_terms = fs::read_to_string(&marker)?
            .trim()
            .parse()
            .map_err(|_| Error::Corruption(format!("malformed marker {}", marker.display())))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            postings,
            metadata,
            labels,
            label_ids,
            vocab,
            total_unique_terms,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn num_docs(&self) -> u64 {
        self.postings.num_docs()
    }

    pub fn unique_terms(&self) -> u64 {
        self.total_unique_terms
    }

    /// The document's postings record
    pub fn search_primary(&self, doc_id: DocId) -> Result<PostingsRecord<f64>> {
        self.postings.find(doc_id)
    }

    /// Lazy (term, weight) pairs for a document, or `None` out of range
    pub fn stream_for(&self, doc_id: DocId) -> Option<PostingsStream<'_, f64>> {
        self.postings.find_stream(doc_id)
    }

    /// The document rendered as a liblinear line:
    /// `<labelId> <termId+1>:<weight> ...`, 1-indexed, ascending by term id
    pub fn liblinear_data(&self, doc_id: DocId) -> Result<String> {
        use std::fmt::Write;

        if doc_id >= self.num_docs() {
            return Err(Error::InvalidDocId(doc_id));
        }

        let label = self.label(doc_id)?;
        let label_id = self.label_ids.id(label).ok_or_else(|| {
            Error::Corruption(format!("label `{label}` missing from label id mapping"))
        })?;

        let mut out = label_id.to_string();
        for (term, weight) in self.stream_for(doc_id).into_iter().flatten() {
            let _ = write!(out, " {}:{}", term + 1, weight);
        }
        Ok(out)
    }

    pub fn label(&self, doc_id: DocId) -> Result<&str> {
        self.labels
            .get(doc_id as usize)
            .map(String::as_str)
            .ok_or(Error::InvalidDocId(doc_id))
    }

    pub fn label_ids(&self) -> &LabelIdMapping {
        &self.label_ids
    }

    /// Sum of the document's rounded term weights
    pub fn doc_length(&self, doc_id: DocId) -> Result<u64> {
        self.metadata.length(doc_id)
    }

    /// Number of distinct terms in the document
    pub fn doc_unique_terms(&self, doc_id: DocId) -> Result<u64> {
        self.metadata.unique_terms(doc_id)
    }

    /// The vocabulary map, absent for libsvm-built indexes
    pub fn vocab(&self) -> Option<&VocabularyMap> {
        self.vocab.as_ref()
    }

    /// Lexicographic rank of a term string, when a vocabulary exists
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.vocab.as_ref()?.find(term)
    }

    /// The term string for an id, when a vocabulary exists
    pub fn term_text(&self, term_id: TermId) -> Option<String> {
        let vocab = self.vocab.as_ref()?;
        vocab.term(term_id).ok().map(str::to_string)
    }
}

/// Interval progress reporter for long construction passes
pub(crate) struct Progress {
    label: &'static str,
    total: u64,
    seen: u64,
    interval: u64,
}

impl Progress {
    pub fn new(label: &'static str, total: u64) -> Self {
        Self {
            label,
            total,
            seen: 0,
            interval: (total / 20).max(1),
        }
    }

    pub fn tick(&mut self) {
        self.seen += 1;
        if self.seen % self.interval == 0 || self.seen == self.total {
            log::debug!("{}: {}/{}", self.label, self.seen, self.total);
        }
    }
}

#[cfg(test)]
mod tests;
