//! Compressed (parallel-edge) subgraph helpers.
//!
//! Several raw edges between the same pair of nodes are shown as one hop.
//! Consumers go through [`is_compressed_edge_group`] and [`extract_edge_ids`]
//! rather than matching on [`SubgraphItem::Group`] themselves.

use std::collections::HashMap;

use super::{EdgeId, Path, SubgraphItem};

/// Whether a subgraph item is a group of parallel edges.
pub fn is_compressed_edge_group(item: &SubgraphItem) -> bool {
    matches!(item, SubgraphItem::Group(_))
}

/// All edge ids of a subgraph, in order, with groups expanded.
pub fn extract_edge_ids(subgraph: &[SubgraphItem]) -> Vec<EdgeId> {
    let mut ids = Vec::new();
    for item in subgraph.iter().skip(1).step_by(2) {
        match item {
            SubgraphItem::Id(id) => ids.push(id.clone()),
            SubgraphItem::Group(group) => ids.extend(group.iter().cloned()),
        }
    }
    ids
}

/// Merge paths that visit the same node sequence.
///
/// The first path of each group survives with a `compressed_subgraph` whose
/// edge positions collect every distinct edge id seen at that hop. Paths with
/// a unique node sequence are returned unchanged. Output order follows the
/// first occurrence of each node sequence.
pub fn compress_paths(paths: &[Path]) -> Vec<Path> {
    let mut order: Vec<Vec<&str>> = Vec::new();
    let mut groups: HashMap<Vec<&str>, Vec<&Path>> = HashMap::new();

    for path in paths {
        let key: Vec<&str> = path.node_ids().collect();
        let members = groups.entry(key.clone()).or_default();
        if members.is_empty() {
            order.push(key);
        }
        members.push(path);
    }

    order
        .iter()
        .filter_map(|key| groups.get(key))
        .filter_map(|members| merge(members))
        .collect()
}

fn merge(members: &[&Path]) -> Option<Path> {
    let (first, rest) = members.split_first()?;
    if rest.is_empty() {
        return Some((*first).clone());
    }

    let mut merged = (*first).clone();
    let compressed = first
        .subgraph
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if i % 2 == 0 {
                return item.clone();
            }
            let mut hop: Vec<String> = Vec::new();
            for member in members {
                let Some(at) = member.subgraph.get(i) else {
                    continue;
                };
                let ids: &[String] = match at {
                    SubgraphItem::Id(id) => std::slice::from_ref(id),
                    SubgraphItem::Group(ids) => ids,
                };
                for id in ids {
                    if !hop.contains(id) {
                        hop.push(id.clone());
                    }
                }
            }
            if hop.len() == 1 {
                SubgraphItem::Id(hop.remove(0))
            } else {
                SubgraphItem::Group(hop)
            }
        })
        .collect();

    merged.compressed_subgraph = Some(compressed);
    merged.highlighted = members.iter().any(|p| p.highlighted);
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_expands_groups() {
        let subgraph = vec![
            SubgraphItem::from("n1"),
            SubgraphItem::Group(vec!["e1".into(), "e2".into()]),
            SubgraphItem::from("n2"),
            SubgraphItem::from("e3"),
            SubgraphItem::from("n3"),
        ];
        assert_eq!(extract_edge_ids(&subgraph), vec!["e1", "e2", "e3"]);
        assert!(is_compressed_edge_group(&subgraph[1]));
        assert!(!is_compressed_edge_group(&subgraph[3]));
    }

    #[test]
    fn extract_on_single_node_is_empty() {
        assert!(extract_edge_ids(&[SubgraphItem::from("n1")]).is_empty());
    }

    #[test]
    fn parallel_paths_collapse() {
        let a = Path::from_ids("p1", &["n1", "e1", "n2", "e3", "n3"]);
        let b = Path::from_ids("p2", &["n1", "e2", "n2", "e3", "n3"]);
        let c = Path::from_ids("p3", &["n1", "e4", "n4"]);

        let out = compress_paths(&[a, b, c]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "p1");
        let compressed = out[0].compressed_subgraph.as_ref().unwrap();
        assert_eq!(
            compressed[1],
            SubgraphItem::Group(vec!["e1".into(), "e2".into()])
        );
        assert_eq!(compressed[3], SubgraphItem::from("e3"));
        assert_eq!(out[0].edge_ids(), vec!["e1", "e2", "e3"]);

        assert_eq!(out[1].id, "p3");
        assert!(out[1].compressed_subgraph.is_none());
    }
}
