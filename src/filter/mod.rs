//! Filter values and the active filter set.
//!
//! A [`Filter`] never stores its scope or family; both are decoded from `id`
//! through [`crate::tag`] whenever they are needed.
//!
//! [`ActiveFilters`] is an immutable snapshot. Every change produces a new
//! snapshot, so a host can detect changes with [`ActiveFilters::ptr_eq`].

pub mod group;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tag::{Family, Scope, TagId, tag_id};

/// Default include weight for the entity search template.
pub const ENTITY_INCLUDE_WEIGHT: f64 = 1.0;
/// Default exclude weight for the entity search template.
pub const ENTITY_EXCLUDE_WEIGHT: f64 = 2.0;

/// One selectable (or selected) filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub negated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default = "default_weight")]
    pub include_weight: f64,
    #[serde(default = "default_weight")]
    pub exclude_weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// The canonical free-text entity search template.
pub fn make_entity_search_filter() -> Filter {
    Filter {
        id: Some(tag_id(Family::Str, None)),
        name: "Entity Search".into(),
        value: String::new(),
        negated: false,
        count: None,
        include_weight: ENTITY_INCLUDE_WEIGHT,
        exclude_weight: ENTITY_EXCLUDE_WEIGHT,
    }
}

/// A named facet filter. The classifier assigns its id.
pub fn make_tag_filter(name: impl Into<String>, include_weight: f64, exclude_weight: f64) -> Filter {
    Filter {
        id: None,
        name: name.into(),
        value: String::new(),
        negated: false,
        count: Some(1),
        include_weight,
        exclude_weight,
    }
}

impl Filter {
    /// Entity search for `text`.
    pub fn entity_search(text: impl Into<String>) -> Self {
        Self {
            value: text.into(),
            ..make_entity_search_filter()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn tag(&self) -> Option<TagId<'_>> {
        self.id.as_deref().map(TagId::parse)
    }

    pub fn scope(&self) -> Option<Scope> {
        self.tag().and_then(|t| t.scope)
    }

    pub fn family(&self) -> Option<Family> {
        self.tag().and_then(|t| t.family)
    }

    pub fn is_result_filter(&self) -> bool {
        self.scope() == Some(Scope::Result)
    }

    pub fn is_path_filter(&self) -> bool {
        self.scope() == Some(Scope::Path)
    }

    pub fn is_global_filter(&self) -> bool {
        self.scope() == Some(Scope::Global)
    }

    pub fn is_entity_filter(&self) -> bool {
        self.family() == Some(Family::Str)
    }

    pub fn is_evidence_filter(&self) -> bool {
        self.family() == Some(Family::Ev)
    }

    /// Weight this filter contributes: exclude weight when negated.
    pub fn weight(&self) -> f64 {
        if self.negated {
            self.exclude_weight
        } else {
            self.include_weight
        }
    }

    fn same_identity(&self, other: &Filter) -> bool {
        self.id == other.id && self.value == other.value && self.negated == other.negated
    }
}

/// Immutable snapshot of the user's active filters.
///
/// Deduplicated by `(id, value, negated)`. Include and exclude of the same id
/// may coexist; no path can satisfy both, which simply yields nothing visible.
#[derive(Debug, Clone, Default)]
pub struct ActiveFilters {
    filters: Arc<Vec<Filter>>,
}

impl ActiveFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Self {
        filters.into_iter().fold(Self::new(), |acc, f| acc.with(f))
    }

    /// New snapshot with `filter` added. Returns a clone of `self` when an
    /// identical filter is already active.
    ///
    /// A filter activated without an id is treated as an entity search and
    /// receives the `g/str` id.
    pub fn with(&self, mut filter: Filter) -> Self {
        if filter.id.is_none() {
            filter.id = Some(tag_id(Family::Str, None));
            tracing::debug!(name = %filter.name, "assigned entity search id to filter");
        }
        if self.filters.iter().any(|f| f.same_identity(&filter)) {
            return self.clone();
        }
        let mut next = (*self.filters).clone();
        next.push(filter);
        Self {
            filters: Arc::new(next),
        }
    }

    /// New snapshot with every filter matching `(id, value, negated)` removed.
    pub fn without(&self, filter: &Filter) -> Self {
        if !self.filters.iter().any(|f| f.same_identity(filter)) {
            return self.clone();
        }
        let next = self
            .filters
            .iter()
            .filter(|f| !f.same_identity(filter))
            .cloned()
            .collect();
        Self {
            filters: Arc::new(next),
        }
    }

    /// Add when absent, remove when present.
    pub fn toggled(&self, filter: Filter) -> Self {
        if self.contains(&filter) {
            self.without(&filter)
        } else {
            self.with(filter)
        }
    }

    pub fn contains(&self, filter: &Filter) -> bool {
        self.filters.iter().any(|f| f.same_identity(filter))
    }

    /// Any active filter (either polarity) carries this tag id.
    pub fn has_tag(&self, id: &str) -> bool {
        self.filters.iter().any(|f| f.id.as_deref() == Some(id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn in_scope(&self, scope: Scope) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(move |f| f.scope() == Some(scope))
    }

    pub fn in_family(&self, family: Family) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(move |f| f.family() == Some(family))
    }

    /// Non-negated entity search strings with a non-empty value.
    pub fn entity_search_terms(&self) -> Vec<&str> {
        self.filters
            .iter()
            .filter(|f| f.is_entity_filter() && !f.negated && !f.value.trim().is_empty())
            .map(|f| f.value.trim())
            .collect()
    }

    /// Same snapshot (pointer equality).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.filters, &other.filters)
    }
}

impl<'a> IntoIterator for &'a ActiveFilters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}
