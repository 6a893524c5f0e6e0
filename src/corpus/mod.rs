//! Corpus readers: the document source for index construction.
//!
//! A corpus hands out documents with dense ids in iteration order. The
//! concrete reader is chosen by a small TOML descriptor living at
//! `<prefix>/<dataset>/<corpus>`; the data itself is
//! `<prefix>/<dataset>/<dataset>.dat`.

mod libsvm;
mod line;

pub use libsvm::LibsvmCorpus;
pub use line::LineCorpus;

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Config, DocId, Error, Result};

/// Label given to documents with no label source
pub const NO_LABEL: &str = "[none]";

/// One document as read from a corpus
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub label: String,
    pub content: String,
}

/// A source of documents with dense, monotonically increasing ids
pub trait Corpus: Send {
    /// Total number of documents this corpus will yield
    fn size(&self) -> u64;

    fn has_next(&self) -> bool;

    fn next(&mut self) -> Result<Document>;
}

#[derive(Debug, Deserialize)]
struct CorpusDescriptor {
    #[serde(rename = "type")]
    kind: String,
}

/// The `type` declared in the corpus descriptor file
pub fn descriptor_type(config: &Config) -> Result<String> {
    let path = config.corpus_descriptor_path();
    let text = fs::read_to_string(&path).map_err(|_| {
        Error::Config(format!(
            "corpus configuration file ({}) not present",
            path.display()
        ))
    })?;
    let descriptor: CorpusDescriptor = toml::from_str(&text).map_err(|e| {
        Error::Config(format!("malformed corpus descriptor {}: {e}", path.display()))
    })?;
    Ok(descriptor.kind)
}

/// Open the corpus the configuration points at
pub fn from_config(config: &Config) -> Result<Box<dyn Corpus>> {
    let kind = descriptor_type(config)?;
    let data = config.dataset_file();
    match kind.as_str() {
        "line-corpus" => Ok(Box::new(LineCorpus::open(&data)?)),
        "libsvm-corpus" => Ok(Box::new(LibsvmCorpus::open(&data)?)),
        other => Err(Error::Config(format!("unknown corpus type `{other}`"))),
    }
}

/// Read an optional `<file>.numdocs` sidecar holding an ASCII line count
pub(crate) fn read_numdocs(data_path: &Path) -> Result<Option<u64>> {
    let mut os = data_path.as_os_str().to_os_string();
    os.push(".numdocs");
    let path = std::path::PathBuf::from(os);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    let count = text.trim().parse().map_err(|_| {
        Error::Corpus(format!("malformed numdocs file {}", path.display()))
    })?;
    Ok(Some(count))
}

/// Count newline-delimited records in a file
pub(crate) fn count_lines(path: &Path) -> Result<u64> {
    use std::io::BufRead;
    let file = std::io::BufReader::new(fs::File::open(path)?);
    let mut count = 0u64;
    for line in file.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}
