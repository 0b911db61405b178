//! Descriptor splitting.
//!
//! Catalog descriptors mix prose paragraphs with "header:" + bulleted
//! enumerations. Retrieval works far better on short, focused units than on
//! one long paragraph per code, so each paragraph and each bullet item
//! becomes its own fragment.

/// Split a raw descriptor into atomic fragments.
///
/// Blocks are blank-line delimited. A prose block is emitted as-is with
/// trailing newlines stripped. A block containing a header followed by
/// `*` bullets emits one fragment per bullet, the header (minus its trailing
/// colon) prepended to the lower-cased item. A header with zero bullets
/// contributes nothing. An absent descriptor yields no fragments.
pub fn split_descriptor(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for block in text.split("\n\n") {
        if block.trim().is_empty() {
            continue;
        }
        if !block.contains(":\n*") {
            // A bare "Header:" block is a list that lost its bullets, not
            // prose. Headers never stand alone as fragments.
            let trimmed = block.trim();
            if trimmed.ends_with(':') && trimmed.lines().count() == 1 {
                continue;
            }
            items.push(block.trim_end_matches('\n').to_string());
            continue;
        }
        let mut header = String::new();
        for line in block.trim().lines() {
            if let Some(item) = line.strip_prefix('*') {
                if !header.is_empty() {
                    items.push(format!("{} {}", header, item.trim().to_lowercase()));
                }
            } else if !line.is_empty() {
                header = line.trim_end_matches(':').to_string();
            }
        }
    }
    items
}
