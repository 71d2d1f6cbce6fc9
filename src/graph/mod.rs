//! Normalized answer graph: nodes, edges, paths and results.
//!
//! Everything is referenced by id. A [`Path`] lists node and edge ids in a
//! flat subgraph where even indices are nodes and odd indices are edges; an
//! odd position may hold a group of parallel edge ids instead of a single id.
//! An [`Edge`] with support paths is inferred: its justification is a list of
//! further paths, which may contain inferred edges of their own.
//!
//! The [`ResultSet`] is the whole normalized payload handed over by the loader,
//! including the precomputed tag memberships and the facet catalogue.

pub mod compress;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::filter::Filter;

pub use compress::{compress_paths, extract_edge_ids, is_compressed_edge_group};

pub type NodeId = String;
pub type EdgeId = String;
pub type PathId = String;
pub type ResultId = String;

/// Species a node belongs to, when the source knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Human,
    Mouse,
    Rat,
    Zebrafish,
    Fly,
    Worm,
    Yeast,
    #[serde(other)]
    Other,
}

/// How an edge's assertion was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    /// Curated or asserted by a primary source.
    Trusted,
    /// Text-mined or otherwise machine-learned.
    Ml,
    /// Produced by a reasoner.
    Inferred,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Knowledge source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infores: Option<String>,
}

/// Snippet of a publication with the matched subject/object spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationSnippet {
    pub text: String,
    #[serde(default)]
    pub subject: Option<Vec<i64>>,
    #[serde(default)]
    pub object: Option<Vec<i64>>,
}

/// Reference to a publication supporting an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PublicationSnippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub curies: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub species: Option<Species>,
    #[serde(default)]
    pub provenance: Vec<Provenance>,
    #[serde(default)]
    pub aras: Vec<String>,
}

impl Node {
    /// First name, falling back to the id.
    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub subject: NodeId,
    pub object: NodeId,
    pub predicate: String,
    #[serde(default)]
    pub knowledge_level: KnowledgeLevel,
    #[serde(default)]
    pub provenance: Vec<Provenance>,
    /// Publications keyed by category (e.g. `PubMed`, `Clinical Trials`).
    #[serde(default)]
    pub publications: BTreeMap<String, Vec<PublicationRef>>,
    /// Ids of the paths justifying this edge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support: Vec<PathId>,
    #[serde(default)]
    pub aras: Vec<String>,
}

impl Edge {
    pub fn is_inferred(&self) -> bool {
        !self.support.is_empty()
    }

    pub fn publication_count(&self) -> usize {
        self.publications.values().map(Vec::len).sum()
    }
}

/// One position in a subgraph: a single id, or parallel edge ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubgraphItem {
    Id(String),
    Group(Vec<String>),
}

impl SubgraphItem {
    /// The single id, or the first id of a group.
    pub fn representative(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id.as_str()),
            Self::Group(ids) => ids.first().map(String::as_str),
        }
    }
}

impl From<&str> for SubgraphItem {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// A subgraph position interpreted by parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathElement<'a> {
    Node(&'a str),
    Edge(&'a str),
    CompressedEdges(&'a [String]),
}

/// Walk a subgraph, interpreting each item by its index parity.
///
/// A group at a node position is malformed; it is yielded as its first id.
pub fn elements(subgraph: &[SubgraphItem]) -> impl Iterator<Item = PathElement<'_>> {
    subgraph.iter().enumerate().filter_map(|(i, item)| {
        match (i % 2 == 0, item) {
            (true, SubgraphItem::Id(id)) => Some(PathElement::Node(id.as_str())),
            (true, SubgraphItem::Group(ids)) => ids.first().map(|id| PathElement::Node(id.as_str())),
            (false, SubgraphItem::Id(id)) => Some(PathElement::Edge(id.as_str())),
            (false, SubgraphItem::Group(ids)) => Some(PathElement::CompressedEdges(ids.as_slice())),
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,
    pub subgraph: Vec<SubgraphItem>,
    #[serde(
        default,
        rename = "compressedSubgraph",
        skip_serializing_if = "Option::is_none"
    )]
    pub compressed_subgraph: Option<Vec<SubgraphItem>>,
    #[serde(default)]
    pub highlighted: bool,
}

impl Path {
    pub fn new(id: impl Into<String>, subgraph: Vec<SubgraphItem>) -> Self {
        Self {
            id: id.into(),
            subgraph,
            compressed_subgraph: None,
            highlighted: false,
        }
    }

    /// Build from plain ids, one per position.
    pub fn from_ids(id: impl Into<String>, ids: &[&str]) -> Self {
        Self::new(id, ids.iter().map(|s| SubgraphItem::from(*s)).collect())
    }

    /// Length of the raw subgraph.
    pub fn len(&self) -> usize {
        self.subgraph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgraph.is_empty()
    }

    /// The subgraph to display: compressed when available.
    pub fn display_subgraph(&self) -> &[SubgraphItem] {
        self.compressed_subgraph.as_deref().unwrap_or(&self.subgraph)
    }

    pub fn elements(&self) -> impl Iterator<Item = PathElement<'_>> {
        elements(self.display_subgraph())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.subgraph
            .iter()
            .step_by(2)
            .filter_map(SubgraphItem::representative)
    }

    /// Edge ids of the display subgraph, groups expanded.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        extract_edge_ids(self.display_subgraph())
    }

    /// Check parity invariants of both subgraphs.
    pub fn validate(&self) -> Result<(), GraphError> {
        validate_subgraph(&self.id, &self.subgraph)?;
        if let Some(compressed) = &self.compressed_subgraph {
            validate_subgraph(&self.id, compressed)?;
        }
        Ok(())
    }
}

fn validate_subgraph(path_id: &str, subgraph: &[SubgraphItem]) -> Result<(), GraphError> {
    if subgraph.len() % 2 == 0 {
        return Err(GraphError::EvenSubgraph {
            path_id: path_id.to_string(),
            len: subgraph.len(),
        });
    }
    for (index, item) in subgraph.iter().enumerate() {
        if let SubgraphItem::Group(ids) = item {
            if index % 2 == 0 {
                return Err(GraphError::GroupAtNode {
                    path_id: path_id.to_string(),
                    index,
                });
            }
            if ids.is_empty() {
                return Err(GraphError::EmptyGroup {
                    path_id: path_id.to_string(),
                    index,
                });
            }
        }
    }
    Ok(())
}

/// A named bundle of candidate paths answering the same question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: ResultId,
    /// `/`-delimited for multi-hop question types.
    pub drug_name: String,
    pub subject: NodeId,
    pub object: NodeId,
    pub paths: Vec<PathId>,
}

impl QueryResult {
    /// The parts of a composite `drug_name`.
    pub fn name_parts(&self) -> impl Iterator<Item = &str> {
        self.drug_name.split('/').map(str::trim).filter(|s| !s.is_empty())
    }
}

/// The normalized payload for one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub nodes: HashMap<NodeId, Node>,
    #[serde(default)]
    pub edges: HashMap<EdgeId, Edge>,
    #[serde(default)]
    pub paths: HashMap<PathId, Path>,
    #[serde(default)]
    pub results: Vec<QueryResult>,
    /// Tag ids each path carries.
    #[serde(default)]
    pub path_tags: HashMap<PathId, HashSet<String>>,
    /// Tag ids each result carries.
    #[serde(default)]
    pub result_tags: HashMap<ResultId, HashSet<String>>,
    /// Every facet the results can be filtered by, with match counts.
    #[serde(default)]
    pub catalogue: HashMap<String, Filter>,
}

impl ResultSet {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Parse {
            message: e.to_string(),
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        self.paths.get(id)
    }

    pub fn result(&self, id: &str) -> Option<&QueryResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn insert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub fn insert_path(&mut self, path: Path) {
        self.paths.insert(path.id.clone(), path);
    }

    /// Paths of a result, skipping ids missing from the payload.
    pub fn result_paths<'a>(&'a self, result: &'a QueryResult) -> impl Iterator<Item = &'a Path> {
        result.paths.iter().filter_map(|id| self.paths.get(id))
    }

    pub fn path_tags(&self, path_id: &str) -> Option<&HashSet<String>> {
        self.path_tags.get(path_id)
    }

    pub fn result_tags(&self, result_id: &str) -> Option<&HashSet<String>> {
        self.result_tags.get(result_id)
    }

    /// Display name of a node, or the id itself when unknown.
    pub fn node_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.nodes.get(id).map(Node::primary_name).unwrap_or(id)
    }

    /// Check every path's parity and every referenced id.
    pub fn validate(&self) -> Result<(), GraphError> {
        for path in self.paths.values() {
            path.validate()?;
            for element in elements(&path.subgraph) {
                match element {
                    PathElement::Node(id) => self.require_node(id)?,
                    PathElement::Edge(id) => self.require_edge(id)?,
                    PathElement::CompressedEdges(ids) => {
                        for id in ids {
                            self.require_edge(id)?;
                        }
                    }
                }
            }
        }
        for edge in self.edges.values() {
            for support in &edge.support {
                if !self.paths.contains_key(support) {
                    return Err(unknown("path", support));
                }
            }
        }
        for result in &self.results {
            for path in &result.paths {
                if !self.paths.contains_key(path) {
                    return Err(unknown("path", path));
                }
            }
        }
        Ok(())
    }

    fn require_node(&self, id: &str) -> Result<(), GraphError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(unknown("node", id))
        }
    }

    fn require_edge(&self, id: &str) -> Result<(), GraphError> {
        if self.edges.contains_key(id) {
            Ok(())
        } else {
            Err(unknown("edge", id))
        }
    }
}

fn unknown(kind: &'static str, id: &str) -> GraphError {
    GraphError::UnknownId {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str) -> Node {
        Node {
            id: id.into(),
            names: vec![name.into()],
            types: vec![],
            curies: vec![],
            descriptions: vec![],
            species: None,
            provenance: vec![],
            aras: vec![],
        }
    }

    fn edge(id: &str, s: &str, o: &str) -> Edge {
        Edge {
            id: id.into(),
            subject: s.into(),
            object: o.into(),
            predicate: "treats".into(),
            knowledge_level: KnowledgeLevel::Trusted,
            provenance: vec![],
            publications: BTreeMap::new(),
            support: vec![],
            aras: vec![],
        }
    }

    #[test]
    fn elements_follow_parity() {
        let path = Path::new(
            "p1",
            vec![
                "n1".into(),
                SubgraphItem::Group(vec!["e1".into(), "e2".into()]),
                "n2".into(),
                "e3".into(),
                "n3".into(),
            ],
        );
        let elems: Vec<_> = path.elements().collect();
        assert_eq!(elems[0], PathElement::Node("n1"));
        assert!(matches!(elems[1], PathElement::CompressedEdges(ids) if ids.len() == 2));
        assert_eq!(elems[3], PathElement::Edge("e3"));
        assert_eq!(path.node_ids().collect::<Vec<_>>(), vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let even = Path::from_ids("p", &["n1", "e1"]);
        assert!(matches!(even.validate(), Err(GraphError::EvenSubgraph { len: 2, .. })));

        let group_at_node = Path::new(
            "p",
            vec![SubgraphItem::Group(vec!["n1".into()]), "e1".into(), "n2".into()],
        );
        assert!(matches!(
            group_at_node.validate(),
            Err(GraphError::GroupAtNode { index: 0, .. })
        ));

        let empty_group = Path::new("p", vec!["n1".into(), SubgraphItem::Group(vec![]), "n2".into()]);
        assert!(matches!(empty_group.validate(), Err(GraphError::EmptyGroup { index: 1, .. })));
    }

    #[test]
    fn result_set_validation_finds_dangling_ids() {
        let mut set = ResultSet::default();
        set.insert_node(node("n1", "aspirin"));
        set.insert_node(node("n2", "pain"));
        set.insert_edge(edge("e1", "n1", "n2"));
        set.insert_path(Path::from_ids("p1", &["n1", "e1", "n2"]));
        assert!(set.validate().is_ok());

        set.insert_path(Path::from_ids("p2", &["n1", "e9", "n2"]));
        assert!(matches!(
            set.validate(),
            Err(GraphError::UnknownId { kind: "edge", .. })
        ));
    }

    #[test]
    fn subgraph_items_deserialize_untagged() {
        let json = r#"{"id":"p1","subgraph":["n1",["e1","e2"],"n2"]}"#;
        let path: Path = serde_json::from_str(json).unwrap();
        assert_eq!(path.subgraph[0], SubgraphItem::Id("n1".into()));
        assert_eq!(
            path.subgraph[1],
            SubgraphItem::Group(vec!["e1".into(), "e2".into()])
        );
        assert!(!path.highlighted);
    }

    #[test]
    fn unknown_species_maps_to_other() {
        let json = r#"{"id":"n1","names":["x"],"species":"axolotl"}"#;
        let n: Node = serde_json::from_str(json).unwrap();
        assert_eq!(n.species, Some(Species::Other));
        assert_eq!(n.primary_name(), "x");
    }

    #[test]
    fn composite_drug_name_splits() {
        let r = QueryResult {
            id: "r1".into(),
            drug_name: "imatinib / ABL1".into(),
            subject: "n1".into(),
            object: "n2".into(),
            paths: vec![],
        };
        assert_eq!(r.name_parts().collect::<Vec<_>>(), vec!["imatinib", "ABL1"]);
    }

    #[test]
    fn inferred_edges_and_publications() {
        let mut e = edge("e1", "n1", "n2");
        assert!(!e.is_inferred());
        e.support.push("p9".into());
        assert!(e.is_inferred());
        e.publications.insert(
            "PubMed".into(),
            vec![PublicationRef {
                id: "PMID:1".into(),
                source: None,
                snippet: None,
            }],
        );
        assert_eq!(e.publication_count(), 1);
    }
}
