//! Quill - a compact forward-index engine
//!
//! A forward index maps each document to the (term, weight) vector produced
//! by an analyzer pipeline. This library provides:
//! - Parallel tokenization into per-worker chunk files with a shared,
//!   insertion-order vocabulary
//! - K-way chunk merging with insertion-order -> lexicographic term-id
//!   renumbering
//! - A compressed, randomly-addressable packed postings store with a
//!   per-document offset array
//! - Uninversion: rebuilding a forward index from an inverted index under a
//!   bounded RAM budget
//! - A libsvm fast path for pre-vectorized corpora

pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod postings;
pub mod vocab;

mod mmap;

// Re-exports from config
pub use config::{AnalyzerConfig, Config};

// Re-exports from error
pub use error::{Error, Result};

// Re-exports from index
pub use index::uninvert::{InvertedIndexReader, InvertedSource};
pub use index::{files, ForwardIndex};

// Re-exports from postings
pub use postings::{PostingsFileReader, PostingsFileWriter, PostingsRecord, PostingsStream, Weight};

// Re-exports from vocab
pub use vocab::{TermSet, VocabularyMap, VocabularyWriter};

// Re-exports from corpus and analyzer
pub use analyzer::{Analyzer, BoxedAnalyzer, NgramWordAnalyzer};
pub use corpus::{Corpus, Document};

/// Dense document identifier, assigned by the corpus in iteration order
pub type DocId = u64;

/// Dense term identifier
///
/// During tokenization this is the insertion-order index of a string in the
/// shared vocabulary; in the persisted index it is the lexicographic rank of
/// that string. The chunk merge is the sole point that translates between
/// the two.
pub type TermId = u64;
