//! Corpus building: catalog entries → embeddable records.

use crate::splitter::split_descriptor;
use crate::types::{CatalogEntry, CodeMeta, CorpusRecord};

/// Composite text for one fragment. The title and hierarchy give a single
/// bullet's worth of text enough standalone context for the embedding model.
fn composite_text(title: &str, fragment: &str, hierarchy: &str) -> String {
    format!("#{title}\n{fragment}.\n\nPercorso: {hierarchy}")
}

/// Expand every catalog entry into one record per descriptor fragment.
///
/// Record ids are a dense zero-based sequence across all fragments of the
/// whole catalog; they are corpus-local, not catalog codes. Entries whose
/// descriptor is absent or yields no fragments contribute no records.
pub fn build_corpus(entries: &[CatalogEntry]) -> Vec<CorpusRecord> {
    let mut records = Vec::new();
    for entry in entries {
        for fragment in split_descriptor(entry.descriptor.as_deref()) {
            let text = composite_text(&entry.title, &fragment, &entry.hierarchy);
            records.push(CorpusRecord {
                id: records.len(),
                text,
                meta: CodeMeta {
                    code: entry.code.clone(),
                    title: entry.title.clone(),
                    description: entry.descriptor.clone().unwrap_or_default(),
                    activity: entry.activity.clone(),
                },
            });
        }
    }
    tracing::debug!(entries = entries.len(), records = records.len(), "corpus built");
    records
}
