//! Which paths and results survive the active filters.
//!
//! Path-scope filters are checked against each path's precomputed tag set.
//! Result-scope filters are checked against the result's tag set, and global
//! entity searches against the names a result mentions. A filter with a bare
//! `scope/family` id matches any tag of that family.
//!
//! Contradictory filters (the same id included and excluded) are not
//! rejected; nothing can satisfy both, so nothing is visible.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::filter::{ActiveFilters, Filter};
use crate::graph::{Path, PathElement, QueryResult, ResultSet, SubgraphItem, elements};
use crate::tag::{Scope, split_tag_id};

fn has_tag(tags: Option<&HashSet<String>>, id: &str) -> bool {
    let Some(tags) = tags else {
        return false;
    };
    if tags.contains(id) {
        return true;
    }
    if split_tag_id(id).discriminator.is_some() {
        return false;
    }
    tags.iter()
        .any(|t| t.len() > id.len() && t.starts_with(id) && t.as_bytes()[id.len()] == b'/')
}

fn satisfies(tags: Option<&HashSet<String>>, filter: &Filter) -> bool {
    let Some(id) = filter.id.as_deref() else {
        return true;
    };
    has_tag(tags, id) != filter.negated
}

/// Whether `path` is hidden by the active path-scope filters.
///
/// A path with no tag set fails every include filter and passes every
/// exclude filter.
pub fn is_path_filtered(set: &ResultSet, path: &Path, active: &ActiveFilters) -> bool {
    let tags = set.path_tags(&path.id);
    active.in_scope(Scope::Path).any(|f| !satisfies(tags, f))
}

/// Whether a result is shown: it satisfies every result-scope and global
/// filter and keeps at least one unfiltered path, unless hidden paths are
/// shown anyway.
pub fn is_result_visible(
    set: &ResultSet,
    result: &QueryResult,
    active: &ActiveFilters,
    show_hidden_paths: bool,
) -> bool {
    let tags = set.result_tags(&result.id);
    if active.in_scope(Scope::Result).any(|f| !satisfies(tags, f)) {
        return false;
    }

    for filter in active.in_scope(Scope::Global).filter(|f| f.is_entity_filter()) {
        let term = filter.value.trim();
        if term.is_empty() {
            continue;
        }
        if result_mentions(set, result, &term.to_lowercase()) == filter.negated {
            return false;
        }
    }

    show_hidden_paths
        || set
            .result_paths(result)
            .any(|path| !is_path_filtered(set, path, active))
}

/// Results that pass [`is_result_visible`], in payload order.
pub fn visible_results<'a>(
    set: &'a ResultSet,
    active: &ActiveFilters,
    show_hidden_paths: bool,
) -> Vec<&'a QueryResult> {
    set.results
        .iter()
        .filter(|r| is_result_visible(set, r, active, show_hidden_paths))
        .collect()
}

fn result_mentions(set: &ResultSet, result: &QueryResult, needle: &str) -> bool {
    if result.drug_name.to_lowercase().contains(needle) {
        return true;
    }
    set.result_paths(result)
        .any(|path| path_mentions(set, path, &[needle]))
}

/// Any node name or edge predicate of the path contains one of the
/// lowercase `needles`.
pub fn path_mentions(set: &ResultSet, path: &Path, needles: &[&str]) -> bool {
    let hit = |text: &str| {
        let text = text.to_lowercase();
        needles.iter().any(|n| text.contains(n))
    };
    elements(&path.subgraph).any(|element| match element {
        PathElement::Node(id) => set
            .node(id)
            .map_or_else(|| hit(id), |n| n.names.iter().any(|name| hit(name))),
        PathElement::Edge(id) => set.edge(id).is_some_and(|e| hit(&e.predicate)),
        PathElement::CompressedEdges(ids) => ids
            .iter()
            .any(|id| set.edge(id).is_some_and(|e| hit(&e.predicate))),
    })
}

/// Order sibling paths for display.
///
/// With active entity searches, paths mentioning a search term come first
/// and the original order is kept otherwise. Without them, shorter paths come
/// first.
pub fn sort_sibling_paths(set: &ResultSet, paths: &mut [&Path], active: &ActiveFilters) {
    let needles: Vec<String> = active
        .entity_search_terms()
        .into_iter()
        .map(str::to_lowercase)
        .collect();
    if needles.is_empty() {
        paths.sort_by_key(|p| p.len());
        return;
    }
    let needles: Vec<&str> = needles.iter().map(String::as_str).collect();
    paths.sort_by_cached_key(|p| Reverse(path_mentions(set, p, &needles)));
}

/// Content-derived identifier for tooltips and DOM correlation.
///
/// Nodes contribute their primary name, edges their predicate; a compressed
/// group contributes the predicate of its first edge. Whitespace inside a
/// token becomes `-`.
pub fn tooltip_id(set: &ResultSet, subgraph: &[SubgraphItem], separator: &str) -> String {
    elements(subgraph)
        .map(|element| match element {
            PathElement::Node(id) => set.node_name(id).to_string(),
            PathElement::Edge(id) => edge_token(set, id),
            PathElement::CompressedEdges(ids) => ids
                .first()
                .map(|id| edge_token(set, id))
                .unwrap_or_default(),
        })
        .map(|token| token.split_whitespace().collect::<Vec<_>>().join("-"))
        .collect::<Vec<_>>()
        .join(separator)
}

/// [`tooltip_id`] prefixed with the owner's id, for uniqueness across
/// different owners showing the same content.
pub fn scoped_tooltip_id(owner_id: &str, set: &ResultSet, path: &Path, separator: &str) -> String {
    format!(
        "{owner_id}{separator}{}",
        tooltip_id(set, path.display_subgraph(), separator)
    )
}

fn edge_token(set: &ResultSet, id: &str) -> String {
    set.edge(id)
        .map_or_else(|| id.to_string(), |e| e.predicate.clone())
}
