//! Rich diagnostic error types for pathfacet.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Most conditions in the filtering and
//! traversal layers are non-fatal and only logged; the errors here cover the
//! places where a caller genuinely has to react (storage, config, malformed
//! payloads).

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for pathfacet.
#[derive(Debug, Error, Diagnostic)]
pub enum PathfacetError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Span(#[from] SpanError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(pathfacet::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(pathfacet::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             Try running with a fresh data directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(pathfacet::store::serde),
        help(
            "Failed to encode or decode a stored seen-status record. \
             The stored format may predate this version; reset the affected query."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("path {path_id} has an even-length subgraph ({len} items)")]
    #[diagnostic(
        code(pathfacet::graph::even_subgraph),
        help("A subgraph must start and end on a node, so its length is always odd.")
    )]
    EvenSubgraph { path_id: String, len: usize },

    #[error("path {path_id} has an edge group at node position {index}")]
    #[diagnostic(
        code(pathfacet::graph::group_at_node),
        help("Compressed edge groups are only valid at odd indices of a subgraph.")
    )]
    GroupAtNode { path_id: String, index: usize },

    #[error("path {path_id} has an empty edge group at index {index}")]
    #[diagnostic(
        code(pathfacet::graph::empty_group),
        help("A compressed edge group must hold at least one edge id.")
    )]
    EmptyGroup { path_id: String, index: usize },

    #[error("unknown {kind} id: {id}")]
    #[diagnostic(
        code(pathfacet::graph::unknown_id),
        help("The id is referenced but not present in the result set payload.")
    )]
    UnknownId { kind: &'static str, id: String },

    #[error("failed to parse result set: {message}")]
    #[diagnostic(
        code(pathfacet::graph::parse),
        help("The payload must be the normalized JSON shape produced by the graph loader.")
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(pathfacet::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {message}")]
    #[diagnostic(
        code(pathfacet::config::parse),
        help("Check the TOML syntax. Every field is optional and has a default.")
    )]
    Parse { message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(pathfacet::config::invalid),
        help("max_support_depth must be positive and storage_key a single non-empty segment.")
    )]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Span errors
// ---------------------------------------------------------------------------

/// Why an emphasis range was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SpanError {
    #[error("span has {arity} bounds, expected 2")]
    #[diagnostic(
        code(pathfacet::span::arity),
        help("A span is a `[start, end]` pair.")
    )]
    Arity { arity: usize },

    #[error("span [{start}, {end}] is out of bounds for text of {len} characters")]
    #[diagnostic(
        code(pathfacet::span::bounds),
        help("Span offsets count characters, not bytes, and `end` is exclusive.")
    )]
    OutOfBounds { start: i64, end: i64, len: usize },

    #[error("span [{start}, {end}] is inverted")]
    #[diagnostic(
        code(pathfacet::span::inverted),
        help("The start offset must not exceed the end offset.")
    )]
    Inverted { start: i64, end: i64 },

    #[error("span is missing")]
    #[diagnostic(code(pathfacet::span::missing))]
    Missing,
}

/// Convenience result type for pathfacet operations.
pub type PathfacetResult<T> = std::result::Result<T, PathfacetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_top_level() {
        let err = StoreError::Serialization {
            message: "bad".into(),
        };
        let top: PathfacetError = err.into();
        assert!(matches!(
            top,
            PathfacetError::Store(StoreError::Serialization { .. })
        ));
    }

    #[test]
    fn graph_error_display_names_the_path() {
        let err = GraphError::EvenSubgraph {
            path_id: "p7".into(),
            len: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("p7"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn span_error_display_mentions_bounds() {
        let err = SpanError::OutOfBounds {
            start: -1,
            end: 3,
            len: 10,
        };
        let msg = format!("{err}");
        assert!(msg.contains("-1"));
        assert!(msg.contains("10"));
    }
}
