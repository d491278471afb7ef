//! Source summaries for retrieved fragments.
//!
//! One line per distinct source, sorted by path:
//! `- <path>[ (topic=<topic>)][, S. <pages>]` with deduplicated, ascending,
//! 1-based page numbers. The output only depends on the set of fragments, not
//! on their order.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Fragment, UNKNOWN_SOURCE};

#[derive(Default)]
struct SourceGroup {
    pages: BTreeSet<u32>,
    topic: Option<String>,
}

/// Normalize a stored source path for grouping and display.
pub fn normalize_source(source: Option<&str>) -> String {
    match source.map(str::trim) {
        Some(s) if !s.is_empty() => s.replace('\\', "/"),
        _ => UNKNOWN_SOURCE.to_string(),
    }
}

pub fn summarize(fragments: &[Fragment]) -> String {
    let mut groups: BTreeMap<String, SourceGroup> = BTreeMap::new();

    for fragment in fragments {
        let group = groups.entry(normalize_source(fragment.source.as_deref())).or_default();
        if let Some(page) = fragment.display_page() {
            group.pages.insert(page);
        }
        if let Some(topic) = fragment.topic.as_deref().filter(|t| !t.is_empty()) {
            // Topic is constant per source in practice; pick the greatest so
            // input order never matters.
            if group.topic.as_deref().map_or(true, |current| topic > current) {
                group.topic = Some(topic.to_string());
            }
        }
    }

    groups
        .into_iter()
        .map(|(source, group)| render_line(&source, &group))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(source: &str, group: &SourceGroup) -> String {
    let mut line = format!("- {source}");
    if let Some(topic) = &group.topic {
        line.push_str(&format!(" (topic={topic})"));
    }
    if !group.pages.is_empty() {
        let pages = group.pages.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
        line.push_str(&format!(", S. {pages}"));
    }
    line
}
