//! Analyzer pipeline: turns a document into weighted term counts.
//!
//! The indexing core only depends on the `Analyzer` trait; the stock
//! implementation is a word n-gram analyzer over lowercased alphanumeric
//! tokens. Each worker thread clones its own analyzer through the boxed
//! clone, so implementations may keep mutable scratch state.

pub mod libsvm;

use rustc_hash::FxHashMap;

use crate::corpus::Document;
use crate::{Config, Error, Result};

/// Produces the (term, weight) pairs for one document.
///
/// Emission order must be deterministic for a given document; the stock
/// analyzers emit terms in first-occurrence order.
pub trait Analyzer: Send {
    fn analyze(&mut self, doc: &Document) -> Result<Vec<(String, f64)>>;
    fn clone_box(&self) -> BoxedAnalyzer;
}

/// Boxed analyzer for dynamic dispatch
pub type BoxedAnalyzer = Box<dyn Analyzer>;

impl Clone for BoxedAnalyzer {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Word n-gram analyzer: lowercased alphanumeric tokens joined with `_`,
/// weighted by occurrence count
#[derive(Debug, Clone)]
pub struct NgramWordAnalyzer {
    ngram: usize,
}

impl NgramWordAnalyzer {
    pub fn new(ngram: usize) -> Self {
        Self {
            ngram: ngram.max(1),
        }
    }
}

impl Default for NgramWordAnalyzer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Analyzer for NgramWordAnalyzer {
    fn analyze(&mut self, doc: &Document) -> Result<Vec<(String, f64)>> {
        let tokens = tokenize(&doc.content);
        if tokens.len() < self.ngram {
            return Ok(Vec::new());
        }

        // aggregate counts while preserving first-occurrence order
        let mut counts: Vec<(String, f64)> = Vec::new();
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for window in tokens.windows(self.ngram) {
            let gram = window.join("_");
            match seen.get(&gram) {
                Some(&at) => counts[at].1 += 1.0,
                None => {
                    seen.insert(gram.clone(), counts.len());
                    counts.push((gram, 1.0));
                }
            }
        }
        Ok(counts)
    }

    fn clone_box(&self) -> BoxedAnalyzer {
        Box::new(self.clone())
    }
}

/// Chains several analyzers, concatenating their counts
pub struct MultiAnalyzer {
    analyzers: Vec<BoxedAnalyzer>,
}

impl Analyzer for MultiAnalyzer {
    fn analyze(&mut self, doc: &Document) -> Result<Vec<(String, f64)>> {
        let mut counts = Vec::new();
        for analyzer in &mut self.analyzers {
            counts.extend(analyzer.analyze(doc)?);
        }
        Ok(counts)
    }

    fn clone_box(&self) -> BoxedAnalyzer {
        Box::new(MultiAnalyzer {
            analyzers: self.analyzers.clone(),
        })
    }
}

/// Build the analyzer pipeline declared by the `[[analyzers]]` tables.
///
/// The `libsvm` method never reaches this point: the orchestrator routes a
/// libsvm analyzer/corpus pairing to the fast path, and rejects a mixed
/// pairing before construction starts.
pub fn from_config(config: &Config) -> Result<BoxedAnalyzer> {
    if config.analyzers.is_empty() {
        return Err(Error::Config(
            "at least one [[analyzers]] table is required".to_string(),
        ));
    }

    let mut analyzers: Vec<BoxedAnalyzer> = Vec::with_capacity(config.analyzers.len());
    for entry in &config.analyzers {
        match entry.method.as_str() {
            "ngram-word" => analyzers.push(Box::new(NgramWordAnalyzer::new(entry.ngram))),
            "libsvm" => {
                return Err(Error::Config(
                    "libsvm analyzer cannot be combined with a tokenized corpus".to_string(),
                ))
            }
            other => {
                return Err(Error::Config(format!("unknown analyzer method `{other}`")));
            }
        }
    }

    if analyzers.len() == 1 {
        Ok(analyzers.remove(0))
    } else {
        Ok(Box::new(MultiAnalyzer { analyzers }))
    }
}

/// Split on whitespace and strip non-alphanumerics, lowercasing.
///
/// ASCII fast path iterates bytes directly; the Unicode fallback decodes
/// chars only when a word contains non-ASCII bytes.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let cleaned = clean_word(word);
        if !cleaned.is_empty() {
            tokens.push(cleaned);
        }
    }
    tokens
}

#[inline]
fn clean_word(word: &str) -> String {
    if word.is_ascii() {
        let mut result = String::with_capacity(word.len());
        for &b in word.as_bytes() {
            if b.is_ascii_alphanumeric() {
                result.push(b.to_ascii_lowercase() as char);
            }
        }
        result
    } else {
        word.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect()
    }
}
