//! Construction configuration.
//!
//! The config is TOML on disk and is persisted verbatim-equivalent into the
//! index directory as `config.toml` so an index can be reopened without the
//! original file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus;
use crate::{Error, Result};

fn default_ram_budget() -> u64 {
    1024
}

fn default_ngram() -> usize {
    1
}

/// One `[[analyzers]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub method: String,
    #[serde(default = "default_ngram")]
    pub ngram: usize,
}

impl AnalyzerConfig {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            ngram: 1,
        }
    }
}

/// Index construction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Root of the corpus tree
    pub prefix: String,
    /// Dataset directory under the prefix
    pub dataset: String,
    /// Corpus descriptor file name inside the dataset directory
    pub corpus: String,

    /// Directory the forward index is built into
    pub forward_index: PathBuf,

    /// Directory of an existing inverted index, required when `uninvert`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted_index: Option<PathBuf>,

    /// RAM budget in MiB; advisory for tokenization, strict for uninversion
    #[serde(default = "default_ram_budget")]
    pub indexer_ram_budget: u64,

    /// Number of tokenization workers; defaults to the hardware thread count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer_threads: Option<usize>,

    /// Build by uninverting an inverted index instead of tokenizing
    #[serde(default)]
    pub uninvert: bool,

    /// Analyzer pipeline
    #[serde(default)]
    pub analyzers: Vec<AnalyzerConfig>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    pub fn from_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// `<prefix>/<dataset>/<corpus>`, the corpus descriptor file
    pub fn corpus_descriptor_path(&self) -> PathBuf {
        Path::new(&self.prefix).join(&self.dataset).join(&self.corpus)
    }

    /// `<prefix>/<dataset>/<dataset>.dat`, the corpus data file
    pub fn dataset_file(&self) -> PathBuf {
        Path::new(&self.prefix)
            .join(&self.dataset)
            .join(format!("{}.dat", self.dataset))
    }

    /// The configured budget in bytes
    pub fn ram_budget_bytes(&self) -> u64 {
        self.indexer_ram_budget * 1024 * 1024
    }

    /// Whether this index is built straight from a libsvm-formatted corpus.
    ///
    /// Requires the sole analyzer method and the corpus type to agree;
    /// declaring only one of them libsvm is a configuration error.
    pub fn is_libsvm_format(&self) -> Result<bool> {
        let corpus_type = corpus::descriptor_type(self)?;
        let libsvm_corpus = corpus_type == "libsvm-corpus";
        let libsvm_analyzer =
            self.analyzers.len() == 1 && self.analyzers[0].method == "libsvm";

        if libsvm_analyzer && libsvm_corpus {
            return Ok(true);
        }
        if libsvm_corpus || self.analyzers.iter().any(|a| a.method == "libsvm") {
            return Err(Error::Config(
                "both analyzer and corpus type must be libsvm in order to use \
                 libsvm formatted data"
                    .to_string(),
            ));
        }
        Ok(false)
    }
}
