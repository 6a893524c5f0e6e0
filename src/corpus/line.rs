//! Line corpus: one document per line, labels from a `.labels` sidecar.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{DocId, Result};

use super::{count_lines, read_numdocs, Corpus, Document, NO_LABEL};

/// One document per line of `<file>`; if `<file>.labels` exists its k-th
/// line labels the k-th document, otherwise every document gets `[none]`.
/// The document count comes from the labels file, a `.numdocs` sidecar, or
/// a counting pass, in that order.
pub struct LineCorpus {
    input: BufReader<File>,
    labels: Option<BufReader<File>>,
    next_content: Option<String>,
    cur_id: DocId,
    num_docs: u64,
}

impl LineCorpus {
    pub fn open(path: &Path) -> Result<Self> {
        let labels_path = {
            let mut os = path.as_os_str().to_os_string();
            os.push(".labels");
            std::path::PathBuf::from(os)
        };

        let mut num_docs = 0u64;
        let labels = if labels_path.exists() {
            num_docs = count_lines(&labels_path)?;
            Some(BufReader::new(File::open(&labels_path)?))
        } else {
            None
        };

        if num_docs == 0 {
            num_docs = match read_numdocs(path)? {
                Some(count) => count,
                None => count_lines(path)?,
            };
        }

        let mut corpus = Self {
            input: BufReader::new(File::open(path)?),
            labels,
            next_content: None,
            cur_id: 0,
            num_docs,
        };
        corpus.buffer_line()?;
        Ok(corpus)
    }

    fn buffer_line(&mut self) -> Result<()> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            self.next_content = None;
        } else {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            self.next_content = Some(line);
        }
        Ok(())
    }

    fn next_label(&mut self) -> Result<String> {
        let Some(labels) = &mut self.labels else {
            return Ok(NO_LABEL.to_string());
        };
        let mut line = String::new();
        labels.read_line(&mut line)?;
        let label = line.trim();
        if label.is_empty() {
            Ok(NO_LABEL.to_string())
        } else {
            Ok(label.to_string())
        }
    }
}

impl Corpus for LineCorpus {
    fn size(&self) -> u64 {
        self.num_docs
    }

    fn has_next(&self) -> bool {
        self.next_content.is_some()
    }

    fn next(&mut self) -> Result<Document> {
        let label = self.next_label()?;
        let content = self.next_content.take().unwrap_or_default();
        let doc = Document {
            id: self.cur_id,
            label,
            content,
        };
        self.cur_id += 1;
        self.buffer_line()?;
        Ok(doc)
    }
}
