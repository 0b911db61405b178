//! Per-code aggregation of fragment matches.

use std::collections::HashMap;

use ateco_core::types::{CandidateRow, SearchMatch};

/// Collapse fragment matches into at most one row per distinct code.
///
/// A group's score is the maximum member score: one strong textual match is
/// enough evidence that the code is relevant, and weaker sibling fragments
/// must not dilute it. Metadata comes from the first-encountered member;
/// fragments of one code disagreeing on title or description is a
/// data-quality problem and gets logged, never silently resolved.
pub fn aggregate(matches: &[SearchMatch]) -> Vec<CandidateRow> {
    let mut rows: Vec<CandidateRow> = Vec::new();
    let mut by_code: HashMap<String, usize> = HashMap::new();

    for m in matches {
        match by_code.get(&m.meta.code) {
            Some(&i) => {
                let row = &mut rows[i];
                if m.meta.title != row.title
                    || m.meta.description != row.description
                    || m.meta.activity != row.activity
                {
                    tracing::warn!(
                        code = %m.meta.code,
                        "fragments of one code disagree on metadata; keeping first-seen values"
                    );
                }
                if m.score > row.score {
                    row.score = m.score;
                }
            }
            None => {
                by_code.insert(m.meta.code.clone(), rows.len());
                rows.push(CandidateRow {
                    code: m.meta.code.clone(),
                    title: m.meta.title.clone(),
                    description: m.meta.description.clone(),
                    activity: m.meta.activity.clone(),
                    score: m.score,
                });
            }
        }
    }

    rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

/// Restrict ranked rows to one activity. Narrows an already-ranked set;
/// never re-ranks.
pub fn filter_by_activity(rows: Vec<CandidateRow>, activity: &str) -> Vec<CandidateRow> {
    rows.into_iter().filter(|r| r.activity.as_deref() == Some(activity)).collect()
}
