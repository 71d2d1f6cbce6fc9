// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # pathfacet
//!
//! Faceted filtering and evidence browsing over a knowledge-graph answer set.
//!
//! ## Architecture
//!
//! - **Tags** (`tag`): `scope/family[/discriminator]` identifiers and the family table
//! - **Filters** (`filter`): filter values, immutable active snapshots, per-family grouping
//! - **Graph** (`graph`): normalized nodes, edges, paths and results; path compression
//! - **Visibility** (`visibility`): which paths and results survive the active filters
//! - **Outline** (`outline`): hierarchical keys for paths and their support, cycle-safe
//! - **Seen status** (`seen`): per-query seen edges/paths with debounced persistence
//! - **Storage** (`store`): memory (DashMap) or durable (redb) key-value backends
//! - **Annotation** (`annotate`): emphasis markers around snippet spans
//!
//! ## Library usage
//!
//! ```no_run
//! use pathfacet::config::EngineConfig;
//! use pathfacet::engine::Engine;
//! use pathfacet::filter::Filter;
//! use pathfacet::graph::ResultSet;
//! use pathfacet::store::MemStore;
//!
//! let json = std::fs::read_to_string("results.json").unwrap();
//! let results = ResultSet::from_json(&json).unwrap();
//! let mut engine = Engine::new(results, MemStore::new(), EngineConfig::default()).unwrap();
//! engine.activate_filter(Filter::entity_search("imatinib"));
//! for result in engine.visible_results() {
//!     println!("{}", result.drug_name);
//! }
//! ```

pub mod annotate;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod graph;
pub mod outline;
pub mod seen;
pub mod store;
pub mod tag;
pub mod visibility;
