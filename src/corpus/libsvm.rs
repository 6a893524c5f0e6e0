//! Libsvm corpus: pre-vectorized `label idx:weight ...` lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::analyzer::libsvm;
use crate::{DocId, Result};

use super::{count_lines, read_numdocs, Corpus, Document};

/// One pre-vectorized document per line; the label is the leading token.
/// The content handed out is the whole line, which the libsvm fast path
/// parses directly.
pub struct LibsvmCorpus {
    input: BufReader<File>,
    next_content: Option<String>,
    cur_id: DocId,
    num_docs: u64,
}

impl LibsvmCorpus {
    pub fn open(path: &Path) -> Result<Self> {
        let num_docs = match read_numdocs(path)? {
            Some(count) => count,
            None => count_lines(path)?,
        };

        let mut corpus = Self {
            input: BufReader::new(File::open(path)?),
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
}

impl Corpus for LibsvmCorpus {
    fn size(&self) -> u64 {
        self.num_docs
    }

    fn has_next(&self) -> bool {
        self.next_content.is_some()
    }

    fn next(&mut self) -> Result<Document> {
        let content = self.next_content.take().unwrap_or_default();
        let label = libsvm::label(&content)?.to_string();
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
