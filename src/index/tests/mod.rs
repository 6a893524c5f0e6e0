//! End-to-end construction scenarios over real temp directories.

mod basic;
mod uninvert;

use std::fs;
use std::path::Path;

use crate::{AnalyzerConfig, Config};

/// Lay out `<root>/corpora/<name>/` with a line corpus and its descriptor,
/// returning a config that builds into `<root>/<name>-fwd`
pub(crate) fn line_corpus_config(root: &Path, name: &str, docs: &[&str]) -> Config {
    let dataset_dir = root.join("corpora").join(name);
    fs::create_dir_all(&dataset_dir).unwrap();

    let mut data = String::new();
    for doc in docs {
        data.push_str(doc);
        data.push('\n');
    }
    fs::write(dataset_dir.join(format!("{name}.dat")), data).unwrap();
    fs::write(dataset_dir.join("line.toml"), "type = \"line-corpus\"\n").unwrap();

    Config {
        prefix: root.join("corpora").display().to_string(),
        dataset: name.to_string(),
        corpus: "line.toml".to_string(),
        forward_index: root.join(format!("{name}-fwd")),
        inverted_index: None,
        indexer_ram_budget: 1024,
        indexer_threads: Some(2),
        uninvert: false,
        analyzers: vec![AnalyzerConfig::new("ngram-word")],
    }
}

/// Add a `.labels` sidecar next to an existing line corpus
pub(crate) fn write_labels(config: &Config, labels: &[&str]) {
    let mut path = config.dataset_file().into_os_string();
    path.push(".labels");
    let mut text = String::new();
    for label in labels {
        text.push_str(label);
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

/// Lay out a libsvm corpus with its descriptor and matching analyzer
pub(crate) fn libsvm_corpus_config(root: &Path, name: &str, lines: &[&str]) -> Config {
    let dataset_dir = root.join("corpora").join(name);
    fs::create_dir_all(&dataset_dir).unwrap();

    let mut data = String::new();
    for line in lines {
        data.push_str(line);
        data.push('\n');
    }
    fs::write(dataset_dir.join(format!("{name}.dat")), data).unwrap();
    fs::write(
        dataset_dir.join("libsvm.toml"),
        "type = \"libsvm-corpus\"\n",
    )
    .unwrap();

    Config {
        prefix: root.join("corpora").display().to_string(),
        dataset: name.to_string(),
        corpus: "libsvm.toml".to_string(),
        forward_index: root.join(format!("{name}-fwd")),
        inverted_index: None,
        indexer_ram_budget: 1024,
        indexer_threads: None,
        uninvert: false,
        analyzers: vec![AnalyzerConfig::new("libsvm")],
    }
}
