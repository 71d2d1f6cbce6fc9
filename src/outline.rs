//! Hierarchical outline of a result's paths and their support.
//!
//! Top-level paths are keyed `1`, `2`, ... in display order. Support paths of
//! an inferred edge are keyed `{parent}.{ordinal}` with ordinals `a`, `b`, ...
//! The ordinal sequence belongs to the parent path, not to a single edge: it
//! runs through the parent's inferred edges in subgraph order, so with path
//! `1 = [a, x1, b, x2, z]` where `x1` has two support paths and `x2` one, the
//! keys are `1.a`, `1.b` (for `x1`) and `1.c` (for `x2`). An inferred edge
//! repeated in one path is expanded once, at its first position.
//! [`outline_edge_support`] reproduces the same keys for one edge on its own.
//! Each level derives keys only from its parent's key, never from shared
//! counters.
//!
//! Support may be cyclic (an edge supported by a path that contains it). The
//! walk keeps the chain of ancestor edges and paths and cuts any branch that
//! would revisit one, or that would exceed the configured depth.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::filter::ActiveFilters;
use crate::graph::{EdgeId, Path, PathElement, PathId, ResultSet};
use crate::visibility::{is_path_filtered, scoped_tooltip_id, sort_sibling_paths};

/// One path in the outline tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathOutline {
    pub key: String,
    pub path_id: PathId,
    /// Fails the active path filters (only kept when hidden paths are shown).
    pub filtered: bool,
    pub tooltip_id: String,
    /// 0 for top-level paths.
    pub depth: usize,
    /// Inferred edges of this path, with their support outlines.
    pub supports: Vec<EdgeSupport>,
    /// Some support was cut by the cycle or depth guard.
    pub truncated: bool,
}

/// Support paths of one inferred edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSupport {
    pub edge_id: EdgeId,
    pub paths: Vec<PathOutline>,
}

impl PathOutline {
    /// Depth-first search by key.
    pub fn find(&self, key: &str) -> Option<&PathOutline> {
        if self.key == key {
            return Some(self);
        }
        self.children().find_map(|child| child.find(key))
    }

    pub fn children(&self) -> impl Iterator<Item = &PathOutline> {
        self.supports.iter().flat_map(|s| s.paths.iter())
    }

    /// Every key in this subtree, pre-order.
    pub fn keys(&self) -> Vec<String> {
        let mut out = vec![self.key.clone()];
        for child in self.children() {
            out.extend(child.keys());
        }
        out
    }
}

/// Ordinal label for the `index`-th sibling: `a`..`z`, then `aa`, `ab`, ...
pub fn ordinal_label(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

struct Walk<'a> {
    set: &'a ResultSet,
    active: &'a ActiveFilters,
    config: &'a EngineConfig,
    /// Paths on the current ancestor chain.
    path_chain: Vec<&'a str>,
    /// Inferred edges on the current ancestor chain.
    edge_chain: Vec<&'a str>,
}

impl<'a> Walk<'a> {
    fn new(set: &'a ResultSet, active: &'a ActiveFilters, config: &'a EngineConfig) -> Self {
        Self {
            set,
            active,
            config,
            path_chain: Vec::new(),
            edge_chain: Vec::new(),
        }
    }
}

/// Outline every path of a result. Returns an empty list for an unknown id.
///
/// Filtered paths are dropped before keys are assigned, unless
/// `show_hidden_paths` is set, in which case they stay and are flagged.
pub fn outline_result(
    set: &ResultSet,
    result_id: &str,
    active: &ActiveFilters,
    config: &EngineConfig,
) -> Vec<PathOutline> {
    let Some(result) = set.result(result_id) else {
        tracing::debug!(result_id, "outline requested for unknown result");
        return Vec::new();
    };

    let mut paths: Vec<&Path> = set
        .result_paths(result)
        .filter(|p| config.show_hidden_paths || !is_path_filtered(set, p, active))
        .collect();
    sort_sibling_paths(set, &mut paths, active);

    let mut walk = Walk::new(set, active, config);
    paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| walk.path(path, &result.id, (i + 1).to_string(), 0))
        .collect()
}

/// Outline the support of one edge as it appears beneath `parent_key`.
///
/// Ordinals start after the support paths of the inferred edges that precede
/// `edge_id` in `parent_path_id`, so the keys match what [`outline_result`]
/// assigns under the same parent. When the parent path is unknown or does not
/// contain the edge, ordinals start at `a`.
pub fn outline_edge_support(
    set: &ResultSet,
    edge_id: &str,
    parent_key: &str,
    parent_path_id: &str,
    active: &ActiveFilters,
    config: &EngineConfig,
) -> Vec<PathOutline> {
    let mut walk = Walk::new(set, active, config);
    walk.path_chain.push(parent_path_id);
    let mut next_ordinal = set
        .path(parent_path_id)
        .map(|parent| walk.ordinal_offset(parent, edge_id))
        .unwrap_or(0);
    let (support, _) = walk.edge_support(edge_id, parent_key, parent_path_id, 1, &mut next_ordinal);
    support.paths
}

/// Inferred edges of a path in subgraph order, each listed once.
fn inferred_edges<'a>(set: &ResultSet, path: &'a Path) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    path.elements()
        .flat_map(|element| match element {
            PathElement::Node(_) => Vec::new(),
            PathElement::Edge(id) => vec![id],
            PathElement::CompressedEdges(ids) => ids.iter().map(String::as_str).collect(),
        })
        .filter(|id| set.edge(id).is_some_and(|e| e.is_inferred()))
        .filter(|id| seen.insert(*id))
        .collect()
}

impl<'a> Walk<'a> {
    fn path(&mut self, path: &'a Path, owner_id: &str, key: String, depth: usize) -> PathOutline {
        self.path_chain.push(path.id.as_str());

        let mut supports = Vec::new();
        let mut truncated = false;
        let mut next_ordinal = 0;
        for edge_id in inferred_edges(self.set, path) {
            if self.edge_chain.contains(&edge_id) {
                tracing::warn!(edge_id, key = %key, "support cycle: edge already on the chain");
                truncated = true;
                continue;
            }
            if depth + 1 > self.config.max_support_depth {
                tracing::warn!(
                    edge_id,
                    key = %key,
                    max_depth = self.config.max_support_depth,
                    "support depth limit reached"
                );
                truncated = true;
                continue;
            }
            let (support, cut) =
                self.edge_support(edge_id, &key, &path.id, depth + 1, &mut next_ordinal);
            truncated |= cut;
            supports.push(support);
        }

        self.path_chain.pop();
        PathOutline {
            filtered: is_path_filtered(self.set, path, self.active),
            tooltip_id: scoped_tooltip_id(owner_id, self.set, path, &self.config.tooltip_separator),
            key,
            path_id: path.id.clone(),
            depth,
            supports,
            truncated,
        }
    }

    /// Number of keyed support paths under the inferred edges of `parent`
    /// that precede `edge_id`. Zero when `edge_id` is not in `parent`.
    fn ordinal_offset(&self, parent: &'a Path, edge_id: &str) -> usize {
        let edges = inferred_edges(self.set, parent);
        let Some(position) = edges.iter().position(|id| *id == edge_id) else {
            return 0;
        };
        edges[..position]
            .iter()
            .map(|earlier| self.support_paths(earlier).0.len())
            .sum()
    }

    /// Support paths of `edge_id` that will be keyed, in sibling order. The
    /// flag is set when a support path was cut as a cycle.
    fn support_paths(&self, edge_id: &str) -> (Vec<&'a Path>, bool) {
        let mut truncated = false;
        let mut paths: Vec<&'a Path> = Vec::new();
        if let Some(edge) = self.set.edge(edge_id) {
            for support_id in &edge.support {
                if self.path_chain.contains(&support_id.as_str()) {
                    tracing::warn!(edge_id, path_id = %support_id, "support cycle: path already on the chain");
                    truncated = true;
                    continue;
                }
                match self.set.path(support_id) {
                    Some(path) => paths.push(path),
                    None => tracing::warn!(edge_id, path_id = %support_id, "support path missing from payload"),
                }
            }
        }
        sort_sibling_paths(self.set, &mut paths, self.active);
        (paths, truncated)
    }

    /// Outlines for the support of `edge_id`, keyed under `parent_key`.
    /// The flag is set when a support path was cut as a cycle.
    fn edge_support(
        &mut self,
        edge_id: &'a str,
        parent_key: &str,
        owner_id: &str,
        depth: usize,
        next_ordinal: &mut usize,
    ) -> (EdgeSupport, bool) {
        let (paths, truncated) = self.support_paths(edge_id);
        self.edge_chain.push(edge_id);
        let mut outlines = Vec::with_capacity(paths.len());
        for path in paths {
            let key = format!("{parent_key}.{}", ordinal_label(*next_ordinal));
            *next_ordinal += 1;
            outlines.push(self.path(path, owner_id, key, depth));
        }
        self.edge_chain.pop();

        (
            EdgeSupport {
                edge_id: edge_id.to_string(),
                paths: outlines,
            },
            truncated,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, make_tag_filter};
    use crate::graph::{Edge, KnowledgeLevel, Node, QueryResult};
    use std::collections::BTreeMap;

    fn node(id: &str) -> Node {
        Node {
            id: id.into(),
            names: vec![format!("name {id}")],
            types: vec![],
            curies: vec![],
            descriptions: vec![],
            species: None,
            provenance: vec![],
            aras: vec![],
        }
    }

    fn edge(id: &str, support: &[&str]) -> Edge {
        Edge {
            id: id.into(),
            subject: String::new(),
            object: String::new(),
            predicate: "related to".into(),
            knowledge_level: KnowledgeLevel::Inferred,
            provenance: vec![],
            publications: BTreeMap::new(),
            support: support.iter().map(|s| s.to_string()).collect(),
            aras: vec![],
        }
    }

    fn result(id: &str, paths: &[&str]) -> QueryResult {
        QueryResult {
            id: id.into(),
            drug_name: "drug".into(),
            subject: "a".into(),
            object: "z".into(),
            paths: paths.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn base() -> ResultSet {
        let mut set = ResultSet::default();
        for id in ["a", "b", "c", "d", "z"] {
            set.insert_node(node(id));
        }
        set
    }

    #[test]
    fn ordinal_labels() {
        assert_eq!(ordinal_label(0), "a");
        assert_eq!(ordinal_label(1), "b");
        assert_eq!(ordinal_label(25), "z");
        assert_eq!(ordinal_label(26), "aa");
        assert_eq!(ordinal_label(27), "ab");
        assert_eq!(ordinal_label(26 * 27), "aaa");
    }

    #[test]
    fn support_keys_extend_parent_key() {
        let mut set = base();
        set.insert_edge(edge("e_plain", &[]));
        set.insert_edge(edge("e_inf", &["s1", "s2"]));
        set.insert_path(Path::from_ids("p1", &["a", "e_plain", "z"]));
        set.insert_path(Path::from_ids("p2", &["a", "e_plain", "b", "e_plain", "z"]));
        set.insert_path(Path::from_ids("p3", &["a", "e_plain", "b", "e_inf", "c", "e_plain", "z"]));
        set.insert_path(Path::from_ids("s1", &["b", "e_plain", "c"]));
        set.insert_path(Path::from_ids("s2", &["b", "e_plain", "d", "e_plain", "c"]));
        set.results.push(result("r1", &["p1", "p2", "p3"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        let keys: Vec<_> = outline.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);

        let third = &outline[2];
        assert_eq!(third.path_id, "p3");
        assert_eq!(third.supports.len(), 1);
        assert_eq!(third.supports[0].edge_id, "e_inf");
        assert_eq!(third.keys(), vec!["3", "3.a", "3.b"]);
        assert_eq!(third.find("3.b").map(|o| o.path_id.as_str()), Some("s2"));
        assert_eq!(third.find("3.a").map(|o| o.depth), Some(1));
        assert!(!third.truncated);
    }

    #[test]
    fn two_inferred_edges_never_share_keys() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("x1", &["s1"]));
        set.insert_edge(edge("x2", &["s2"]));
        set.insert_path(Path::from_ids("p1", &["a", "x1", "b", "x2", "z"]));
        set.insert_path(Path::from_ids("s1", &["a", "e", "b"]));
        set.insert_path(Path::from_ids("s2", &["b", "e", "z"]));
        set.results.push(result("r1", &["p1"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        let keys = outline[0].keys();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(keys, vec!["1", "1.a", "1.b"]);
    }

    #[test]
    fn edge_support_keys_match_full_outline() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("x1", &["s1", "s3"]));
        set.insert_edge(edge("x2", &["s2"]));
        set.insert_path(Path::from_ids("p1", &["a", "x1", "b", "x2", "z"]));
        set.insert_path(Path::from_ids("s1", &["a", "e", "b"]));
        set.insert_path(Path::from_ids("s3", &["a", "e", "c", "e", "b"]));
        set.insert_path(Path::from_ids("s2", &["b", "e", "z"]));
        set.results.push(result("r1", &["p1"]));

        let active = ActiveFilters::new();
        let config = EngineConfig::default();
        let full = outline_result(&set, "r1", &active, &config);
        assert_eq!(full[0].keys(), vec!["1", "1.a", "1.b", "1.c"]);

        for support in &full[0].supports {
            let lazy = outline_edge_support(&set, &support.edge_id, "1", "p1", &active, &config);
            let lazy_keys: Vec<_> = lazy.iter().map(|o| (o.key.clone(), o.path_id.clone())).collect();
            let full_keys: Vec<_> = support.paths.iter().map(|o| (o.key.clone(), o.path_id.clone())).collect();
            assert_eq!(lazy_keys, full_keys);
        }

        let x2 = outline_edge_support(&set, "x2", "1", "p1", &active, &config);
        assert_eq!(x2[0].key, "1.c");
    }

    #[test]
    fn repeated_inferred_edge_is_expanded_once() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("x1", &["s1"]));
        set.insert_path(Path::from_ids("p1", &["a", "x1", "b", "x1", "z"]));
        set.insert_path(Path::from_ids("s1", &["a", "e", "b"]));
        set.results.push(result("r1", &["p1"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        assert_eq!(outline[0].supports.len(), 1);
        assert_eq!(outline[0].keys(), vec!["1", "1.a"]);
    }

    #[test]
    fn edge_support_outside_parent_starts_at_a() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("x1", &["s1"]));
        set.insert_edge(edge("x2", &["s2"]));
        set.insert_path(Path::from_ids("p1", &["a", "x1", "z"]));
        set.insert_path(Path::from_ids("s1", &["a", "e", "b"]));
        set.insert_path(Path::from_ids("s2", &["b", "e", "z"]));

        let lazy = outline_edge_support(&set, "x2", "1", "p1", &ActiveFilters::new(), &EngineConfig::default());
        assert_eq!(lazy[0].key, "1.a");
    }

    #[test]
    fn nested_support_keys() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("outer", &["mid"]));
        set.insert_edge(edge("inner", &["leaf"]));
        set.insert_path(Path::from_ids("top", &["a", "outer", "z"]));
        set.insert_path(Path::from_ids("mid", &["a", "inner", "z"]));
        set.insert_path(Path::from_ids("leaf", &["a", "e", "z"]));
        set.results.push(result("r1", &["top"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        assert_eq!(outline[0].keys(), vec!["1", "1.a", "1.a.a"]);
        assert_eq!(outline[0].find("1.a.a").map(|o| o.depth), Some(2));
    }

    #[test]
    fn cycles_are_cut() {
        let mut set = base();
        // e1 is justified by a path that uses e1 again.
        set.insert_edge(edge("e1", &["loop"]));
        set.insert_path(Path::from_ids("top", &["a", "e1", "z"]));
        set.insert_path(Path::from_ids("loop", &["a", "e1", "z"]));
        set.results.push(result("r1", &["top"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        let top = &outline[0];
        assert_eq!(top.keys(), vec!["1", "1.a"]);
        let inner = top.find("1.a").unwrap();
        assert!(inner.truncated);
        assert!(inner.supports.is_empty());
    }

    #[test]
    fn self_supporting_path_is_cut() {
        let mut set = base();
        set.insert_edge(edge("e1", &["top"]));
        set.insert_path(Path::from_ids("top", &["a", "e1", "z"]));
        set.results.push(result("r1", &["top"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        assert_eq!(outline[0].keys(), vec!["1"]);
        assert!(outline[0].truncated);
    }

    #[test]
    fn depth_limit_truncates() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("outer", &["mid"]));
        set.insert_edge(edge("inner", &["leaf"]));
        set.insert_path(Path::from_ids("top", &["a", "outer", "z"]));
        set.insert_path(Path::from_ids("mid", &["a", "inner", "z"]));
        set.insert_path(Path::from_ids("leaf", &["a", "e", "z"]));
        set.results.push(result("r1", &["top"]));

        let config = EngineConfig {
            max_support_depth: 1,
            ..EngineConfig::default()
        };
        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &config);
        assert_eq!(outline[0].keys(), vec!["1", "1.a"]);
        assert!(outline[0].find("1.a").unwrap().truncated);
    }

    #[test]
    fn hidden_paths_are_dropped_before_keying() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_path(Path::from_ids("p1", &["a", "e", "z"]));
        set.insert_path(Path::from_ids("p2", &["a", "e", "b", "e", "z"]));
        set.path_tags
            .insert("p2".into(), ["p/pc/Gene".to_string()].into_iter().collect());
        set.results.push(result("r1", &["p1", "p2"]));

        let active = ActiveFilters::new().with(make_tag_filter("Gene", 1.0, 1.0).with_id("p/pc/Gene"));
        let outline = outline_result(&set, "r1", &active, &EngineConfig::default());
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].key, "1");
        assert_eq!(outline[0].path_id, "p2");

        let config = EngineConfig {
            show_hidden_paths: true,
            ..EngineConfig::default()
        };
        let outline = outline_result(&set, "r1", &active, &config);
        assert_eq!(outline.len(), 2);
        assert!(outline[0].filtered);
        assert_eq!(outline[0].path_id, "p1");
        assert!(!outline[1].filtered);
    }

    #[test]
    fn tooltip_is_scoped_to_owner() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("inf", &["s"]));
        set.insert_path(Path::from_ids("top", &["a", "inf", "z"]));
        set.insert_path(Path::from_ids("s", &["a", "e", "z"]));
        set.results.push(result("r1", &["top"]));

        let outline = outline_result(&set, "r1", &ActiveFilters::new(), &EngineConfig::default());
        assert_eq!(outline[0].tooltip_id, "r1_name-a_related-to_name-z");
        let child = outline[0].find("1.a").unwrap();
        assert_eq!(child.tooltip_id, "top_name-a_related-to_name-z");
    }

    #[test]
    fn edge_support_alone() {
        let mut set = base();
        set.insert_edge(edge("e", &[]));
        set.insert_edge(edge("inf", &["s1", "s2"]));
        set.insert_path(Path::from_ids("s1", &["a", "e", "b", "e", "z"]));
        set.insert_path(Path::from_ids("s2", &["a", "e", "z"]));
        let search = ActiveFilters::new().with(Filter::entity_search("name b"));

        let plain = outline_edge_support(&set, "inf", "4", "p4", &ActiveFilters::new(), &EngineConfig::default());
        let order: Vec<_> = plain.iter().map(|o| (o.key.as_str(), o.path_id.as_str())).collect();
        assert_eq!(order, vec![("4.a", "s2"), ("4.b", "s1")]);

        let searched = outline_edge_support(&set, "inf", "4", "p4", &search, &EngineConfig::default());
        assert_eq!(searched[0].path_id, "s1");
    }

    #[test]
    fn unknown_result_is_empty() {
        let set = base();
        assert!(outline_result(&set, "nope", &ActiveFilters::new(), &EngineConfig::default()).is_empty());
    }
}
