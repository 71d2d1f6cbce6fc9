//! Engine facade: top-level API for pathfacet.
//!
//! The `Engine` owns the loaded result set, the active filter snapshot and the
//! seen-status store, and exposes the operations a host UI needs: facet lists,
//! visible results, path outlines, seen toggles and snippet emphasis.

use std::collections::HashMap;

use crate::annotate::{Emphasis, annotate, annotate_snippet};
use crate::config::EngineConfig;
use crate::error::PathfacetResult;
use crate::filter::group::{GroupOptions, GroupedFilters, SortRules, group_filters};
use crate::filter::{ActiveFilters, Filter};
use crate::graph::{Path, PublicationSnippet, QueryResult, ResultSet, compress_paths};
use crate::outline::{PathOutline, outline_edge_support, outline_result};
use crate::seen::SeenStatusStore;
use crate::store::Storage;
use crate::tag::{Family, Scope};
use crate::visibility;

/// The pathfacet engine for one loaded result set.
pub struct Engine<S: Storage> {
    config: EngineConfig,
    results: ResultSet,
    active: ActiveFilters,
    sort_rules: SortRules,
    emphasis: Emphasis,
    seen: SeenStatusStore<S>,
}

impl<S: Storage> Engine<S> {
    /// Validate the payload and open the seen-status store on `storage`.
    pub fn new(results: ResultSet, storage: S, config: EngineConfig) -> PathfacetResult<Self> {
        config.validate()?;
        results.validate()?;

        tracing::info!(
            results = results.results.len(),
            paths = results.paths.len(),
            edges = results.edges.len(),
            facets = results.catalogue.len(),
            "initializing pathfacet engine"
        );

        let seen = SeenStatusStore::open(storage, &config.storage_key, config.flush_delay())?;
        Ok(Self {
            emphasis: config.emphasis(),
            config,
            results,
            active: ActiveFilters::new(),
            sort_rules: SortRules::default(),
            seen,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Current filter snapshot. Compare snapshots with [`ActiveFilters::ptr_eq`].
    pub fn active_filters(&self) -> &ActiveFilters {
        &self.active
    }

    pub fn set_sort_rules(&mut self, rules: SortRules) {
        self.sort_rules = rules;
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    /// Facets of `scope`, grouped by family.
    pub fn grouped_filters(&self, scope: Scope) -> GroupedFilters {
        self.grouped_filters_with_search(scope, HashMap::new())
    }

    /// Facets of `scope` narrowed by a per-family search term.
    pub fn grouped_filters_with_search(
        &self,
        scope: Scope,
        search: HashMap<Family, String>,
    ) -> GroupedFilters {
        let options = GroupOptions {
            rules: self.sort_rules.clone(),
            search,
        };
        group_filters(&self.results.catalogue, scope, &self.active, &options)
    }

    /// Returns whether the snapshot changed.
    pub fn activate_filter(&mut self, filter: Filter) -> bool {
        self.replace_active(self.active.with(filter))
    }

    pub fn deactivate_filter(&mut self, filter: &Filter) -> bool {
        self.replace_active(self.active.without(filter))
    }

    pub fn toggle_filter(&mut self, filter: Filter) -> bool {
        self.replace_active(self.active.toggled(filter))
    }

    pub fn clear_filters(&mut self) -> bool {
        if self.active.is_empty() {
            return false;
        }
        self.replace_active(ActiveFilters::new())
    }

    fn replace_active(&mut self, next: ActiveFilters) -> bool {
        if next.ptr_eq(&self.active) {
            return false;
        }
        tracing::debug!(active = next.len(), "active filters changed");
        self.active = next;
        true
    }

    // -----------------------------------------------------------------------
    // Visibility and outlines
    // -----------------------------------------------------------------------

    pub fn visible_results(&self) -> Vec<&QueryResult> {
        visibility::visible_results(&self.results, &self.active, self.config.show_hidden_paths)
    }

    /// Whether a path is hidden by the active path filters. Unknown ids are
    /// reported as hidden.
    pub fn is_path_filtered(&self, path_id: &str) -> bool {
        self.results
            .path(path_id)
            .is_none_or(|p| visibility::is_path_filtered(&self.results, p, &self.active))
    }

    pub fn outline(&self, result_id: &str) -> Vec<PathOutline> {
        outline_result(&self.results, result_id, &self.active, &self.config)
    }

    /// Outline of one inferred edge's support, keyed beneath `parent_key`.
    pub fn edge_support(&self, edge_id: &str, parent_key: &str, parent_path_id: &str) -> Vec<PathOutline> {
        outline_edge_support(
            &self.results,
            edge_id,
            parent_key,
            parent_path_id,
            &self.active,
            &self.config,
        )
    }

    /// Paths of a result merged by node sequence.
    pub fn compressed_paths(&self, result_id: &str) -> Vec<Path> {
        let Some(result) = self.results.result(result_id) else {
            return Vec::new();
        };
        let paths: Vec<Path> = self.results.result_paths(result).cloned().collect();
        compress_paths(&paths)
    }

    pub fn tooltip_id(&self, owner_id: &str, path_id: &str) -> Option<String> {
        let path = self.results.path(path_id)?;
        Some(visibility::scoped_tooltip_id(
            owner_id,
            &self.results,
            path,
            &self.config.tooltip_separator,
        ))
    }

    // -----------------------------------------------------------------------
    // Seen status
    // -----------------------------------------------------------------------

    pub fn seen(&self) -> &SeenStatusStore<S> {
        &self.seen
    }

    pub fn seen_mut(&mut self) -> &mut SeenStatusStore<S> {
        &mut self.seen
    }

    pub fn toggle_edge_seen(&mut self, pk: &str, edge_id: &str) -> bool {
        self.seen.toggle_edge_seen(pk, edge_id)
    }

    pub fn is_edge_seen(&self, pk: &str, edge_id: &str) -> bool {
        self.seen.is_edge_seen(pk, edge_id)
    }

    /// Every edge of the path (groups expanded) is seen. Unknown paths are
    /// never seen.
    pub fn is_path_seen(&self, pk: &str, path_id: &str) -> bool {
        self.results
            .path(path_id)
            .is_some_and(|p| self.seen.is_path_seen(pk, &p.edge_ids()))
    }

    /// Flush seen-status writes whose quiet window elapsed.
    pub fn poll(&mut self) -> PathfacetResult<bool> {
        Ok(self.seen.poll()?)
    }

    pub fn flush(&mut self) -> PathfacetResult<()> {
        Ok(self.seen.flush_now()?)
    }

    // -----------------------------------------------------------------------
    // Snippets
    // -----------------------------------------------------------------------

    pub fn annotate(&self, text: &str, ranges: &[Option<&[i64]>]) -> String {
        annotate(text, ranges, &self.emphasis)
    }

    pub fn annotate_snippet(&self, snippet: &PublicationSnippet) -> String {
        annotate_snippet(snippet, &self.emphasis)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            results: self.results.results.len(),
            visible_results: self.visible_results().len(),
            paths: self.results.paths.len(),
            edges: self.results.edges.len(),
            nodes: self.results.nodes.len(),
            facets: self.results.catalogue.len(),
            active_filters: self.active.len(),
        }
    }
}

/// Summary counts for the loaded result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub results: usize,
    pub visible_results: usize,
    pub paths: usize,
    pub edges: usize,
    pub nodes: usize,
    pub facets: usize,
    pub active_filters: usize,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "pathfacet engine info")?;
        writeln!(f, "  results:        {} ({} visible)", self.results, self.visible_results)?;
        writeln!(f, "  paths:          {}", self.paths)?;
        writeln!(f, "  edges:          {}", self.edges)?;
        writeln!(f, "  nodes:          {}", self.nodes)?;
        writeln!(f, "  facets:         {}", self.facets)?;
        writeln!(f, "  active filters: {}", self.active_filters)?;
        Ok(())
    }
}

impl<S: Storage> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("results", &self.results.results.len())
            .field("active_filters", &self.active.len())
            .field("config", &self.config)
            .finish()
    }
}
