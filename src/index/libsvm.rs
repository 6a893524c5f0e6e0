//! Libsvm fast path: build the postings file straight from pre-vectorized
//! lines, bypassing tokenization and the vocabulary entirely.

use std::path::Path;

use crate::analyzer::libsvm;
use crate::corpus;
use crate::postings::{PostingsFileWriter, PostingsRecord};
use crate::{Config, Result};

use super::metadata::{LabelIdMapping, LabelStore, MetadataWriter};
use super::{files, Progress};

/// Parse every line and write the packed postings file directly.
///
/// Returns the total unique term count, `max(term id) + 1`. Term ids are
/// already dense in libsvm data, so no vocabulary map is produced.
pub(crate) fn create_postings(dir: &Path, config: &Config) -> Result<u64> {
    let mut docs = corpus::from_config(config)?;
    let num_docs = docs.size();

    let mdata_writer = MetadataWriter::new(dir, num_docs)?;
    let labels = LabelStore::with_capacity(num_docs);
    let mut writer = PostingsFileWriter::<f64>::new(&dir.join(files::POSTINGS), num_docs)?;
    let mut progress = Progress::new("creating postings from libsvm data", num_docs);

    let mut total_unique_terms = 0u64;
    while docs.has_next() {
        let doc = docs.next()?;
        progress.tick();

        let counts = libsvm::counts(&doc.content)?;
        let mut length = 0f64;
        for &(term, weight) in &counts {
            if term + 1 > total_unique_terms {
                total_unique_terms = term + 1;
            }
            length += weight;
        }

        mdata_writer.write(doc.id, length as u64, counts.len() as u64)?;
        labels.set(doc.id, &doc.label);
        writer.write(&PostingsRecord::with_counts(doc.id, counts))?;
    }

    writer.finish()?;
    mdata_writer.finish()?;
    labels.save(&dir.join(files::DOC_LABELS))?;

    let labels = labels.into_labels();
    LabelIdMapping::from_labels(&labels).save(&dir.join(files::LABEL_IDS))?;

    Ok(total_unique_terms)
}
