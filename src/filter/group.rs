//! Bucketing and ordering of the facet catalogue.
//!
//! [`group_filters`] is a pure function of the catalogue, the target scope,
//! the active filters and the [`GroupOptions`]. Nothing is cached between
//! calls, so the selected-first pivot always reflects the current selection.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::{ActiveFilters, Filter};
use crate::tag::{Family, Scope, TagId};

/// Ordering between two facet filters of the same family.
pub type Comparator = fn(&Filter, &Filter) -> Ordering;

/// Facets per family, each list in display order.
pub type GroupedFilters = BTreeMap<Family, Vec<Filter>>;

/// Name that always sorts to the end of a family.
pub const OTHER_NAME: &str = "Other";

/// Case-insensitive by name, with [`OTHER_NAME`] last.
pub fn default_order(a: &Filter, b: &Filter) -> Ordering {
    match (a.name == OTHER_NAME, b.name == OTHER_NAME) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

/// Highest match count first, then [`default_order`]. [`OTHER_NAME`] stays
/// last whatever its count.
pub fn by_count_desc(a: &Filter, b: &Filter) -> Ordering {
    (a.name == OTHER_NAME)
        .cmp(&(b.name == OTHER_NAME))
        .then_with(|| b.count.unwrap_or(0).cmp(&a.count.unwrap_or(0)))
        .then_with(|| default_order(a, b))
}

/// Per-family sorting registrations.
///
/// Registering a family switches it to pivot sorting: selected facets first,
/// then the rest, each part ordered by the registered comparator (or
/// [`default_order`] when registered without one).
#[derive(Debug, Clone)]
pub struct SortRules {
    pivots: HashMap<Family, Option<Comparator>>,
}

impl SortRules {
    /// No registrations: every family uses [`default_order`].
    pub fn empty() -> Self {
        Self {
            pivots: HashMap::new(),
        }
    }

    pub fn register(mut self, family: Family, comparator: Option<Comparator>) -> Self {
        self.pivots.insert(family, comparator);
        self
    }

    pub fn is_pivot(&self, family: Family) -> bool {
        self.pivots.contains_key(&family)
    }

    fn comparator(&self, family: Family) -> Comparator {
        self.pivots
            .get(&family)
            .copied()
            .flatten()
            .unwrap_or(default_order)
    }
}

impl Default for SortRules {
    /// ChEBI roles are the large family: pivot by count. Reasoning agents pivot
    /// alphabetically.
    fn default() -> Self {
        Self::empty()
            .register(Family::Role, Some(by_count_desc))
            .register(Family::Ara, None)
    }
}

/// Options for one grouping pass.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub rules: SortRules,
    /// Case-insensitive substring search, per family.
    pub search: HashMap<Family, String>,
}

impl GroupOptions {
    pub fn with_search(mut self, family: Family, term: impl Into<String>) -> Self {
        self.search.insert(family, term.into());
        self
    }
}

/// Bucket every catalogue entry of `scope` by family and order each bucket.
///
/// Entries are returned with `id` set to their catalogue key. Ids that do not
/// decode to a known scope and family are dropped. Families without entries
/// are absent from the map.
pub fn group_filters(
    catalogue: &HashMap<String, Filter>,
    scope: Scope,
    active: &ActiveFilters,
    options: &GroupOptions,
) -> GroupedFilters {
    let mut grouped = GroupedFilters::new();

    for (id, filter) in catalogue {
        let tag = TagId::parse(id);
        let (Some(tag_scope), Some(family)) = (tag.scope, tag.family) else {
            tracing::warn!(tag = %id, "dropping facet with malformed tag id");
            continue;
        };
        if tag_scope != scope || family.scope() != scope {
            continue;
        }
        let mut entry = filter.clone();
        entry.id = Some(id.clone());
        grouped.entry(family).or_default().push(entry);
    }

    for (family, entries) in grouped.iter_mut() {
        // HashMap order is arbitrary; settle it before the stable sorts.
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        sort_family(*family, entries, active, &options.rules);
        if let Some(term) = options.search.get(family) {
            retain_matching(entries, term);
        }
    }

    grouped.retain(|_, entries| !entries.is_empty());
    grouped
}

/// Order one family's facets in place.
pub fn sort_family(family: Family, entries: &mut Vec<Filter>, active: &ActiveFilters, rules: &SortRules) {
    let cmp = rules.comparator(family);
    if !rules.is_pivot(family) {
        entries.sort_by(cmp);
        return;
    }

    let (mut selected, mut rest): (Vec<Filter>, Vec<Filter>) = entries
        .drain(..)
        .partition(|entry| is_selected(entry, family, active));
    selected.sort_by(cmp);
    rest.sort_by(cmp);
    entries.extend(selected);
    entries.extend(rest);
}

fn is_selected(entry: &Filter, family: Family, active: &ActiveFilters) -> bool {
    entry.id.as_deref().is_some_and(|id| {
        active
            .in_family(family)
            .any(|f| f.id.as_deref() == Some(id))
    })
}

fn retain_matching(entries: &mut Vec<Filter>, term: &str) {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return;
    }
    entries.retain(|f| f.name.to_lowercase().contains(&needle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::make_tag_filter;

    fn facet(name: &str, count: u32) -> Filter {
        let mut f = make_tag_filter(name, 1.0, 1.0);
        f.count = Some(count);
        f
    }

    fn catalogue(entries: &[(&str, &str, u32)]) -> HashMap<String, Filter> {
        entries
            .iter()
            .map(|(id, name, count)| (id.to_string(), facet(name, *count)))
            .collect()
    }

    fn names(entries: &[Filter]) -> Vec<&str> {
        entries.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn groups_only_target_scope() {
        let cat = catalogue(&[
            ("r/cc/a", "Drug", 3),
            ("r/tdl/clin", "Tclin", 1),
            ("p/pc/gene", "Gene", 2),
            ("g/str", "Entity Search", 0),
            ("zz/qq", "Broken", 1),
        ]);
        let grouped = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(grouped.len(), 2);
        assert_eq!(names(&grouped[&Family::Cc]), vec!["Drug"]);
        assert_eq!(names(&grouped[&Family::Tdl]), vec!["Tclin"]);
        assert!(!grouped.contains_key(&Family::Pc));

        let paths = group_filters(&cat, Scope::Path, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[&Family::Pc][0].id.as_deref(), Some("p/pc/gene"));
    }

    #[test]
    fn family_in_wrong_scope_is_dropped() {
        let cat = catalogue(&[("p/role/x", "Misplaced", 1)]);
        let grouped = group_filters(&cat, Scope::Path, &ActiveFilters::new(), &GroupOptions::default());
        assert!(grouped.is_empty());
    }

    #[test]
    fn default_order_is_case_insensitive_with_other_last() {
        let cat = catalogue(&[
            ("r/cc/1", "zeta", 1),
            ("r/cc/2", "Other", 1),
            ("r/cc/3", "Alpha", 1),
            ("r/cc/4", "beta", 1),
        ]);
        let grouped = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(names(&grouped[&Family::Cc]), vec!["Alpha", "beta", "zeta", "Other"]);
    }

    #[test]
    fn pivot_puts_selected_first() {
        let cat = catalogue(&[
            ("r/role/a", "antioxidant", 9),
            ("r/role/b", "biomarker", 2),
            ("r/role/c", "carcinogen", 5),
            ("r/role/d", "drug", 7),
        ]);
        let active = ActiveFilters::from_filters([
            facet("biomarker", 2).with_id("r/role/b"),
            facet("carcinogen", 5).with_id("r/role/c").negate(),
        ]);
        let grouped = group_filters(&cat, Scope::Result, &active, &GroupOptions::default());
        // selected by count desc, then the rest by count desc
        assert_eq!(
            names(&grouped[&Family::Role]),
            vec!["carcinogen", "biomarker", "antioxidant", "drug"]
        );
    }

    #[test]
    fn other_stays_last_under_count_sort() {
        let cat = catalogue(&[("r/role/o", "Other", 50), ("r/role/a", "acid", 1)]);
        let grouped = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(names(&grouped[&Family::Role]), vec!["acid", "Other"]);
    }

    #[test]
    fn pivot_recomputes_on_each_call() {
        let cat = catalogue(&[("r/ara/x", "Xray", 1), ("r/ara/a", "Aragorn", 1)]);
        let none = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(names(&none[&Family::Ara]), vec!["Aragorn", "Xray"]);

        let active = ActiveFilters::new().with(facet("Xray", 1).with_id("r/ara/x"));
        let picked = group_filters(&cat, Scope::Result, &active, &GroupOptions::default());
        assert_eq!(names(&picked[&Family::Ara]), vec!["Xray", "Aragorn"]);
    }

    #[test]
    fn unregistered_family_ignores_selection() {
        let cat = catalogue(&[("r/cc/b", "Beta", 1), ("r/cc/a", "Alpha", 1)]);
        let active = ActiveFilters::new().with(facet("Beta", 1).with_id("r/cc/b"));
        let grouped = group_filters(&cat, Scope::Result, &active, &GroupOptions::default());
        assert_eq!(names(&grouped[&Family::Cc]), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn search_term_filters_after_sort() {
        let cat = catalogue(&[
            ("r/role/a", "Antioxidant", 1),
            ("r/role/b", "anti-inflammatory agent", 3),
            ("r/role/c", "Metabolite", 4),
        ]);
        let opts = GroupOptions::default().with_search(Family::Role, "ANTI");
        let grouped = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &opts);
        assert_eq!(
            names(&grouped[&Family::Role]),
            vec!["anti-inflammatory agent", "Antioxidant"]
        );

        let opts = GroupOptions::default().with_search(Family::Role, "nothing");
        let grouped = group_filters(&cat, Scope::Result, &ActiveFilters::new(), &opts);
        assert!(!grouped.contains_key(&Family::Role));
    }

    #[test]
    fn counts_are_passed_through() {
        let cat = catalogue(&[("p/ev/trial", "Clinical Trial", 42)]);
        let grouped = group_filters(&cat, Scope::Path, &ActiveFilters::new(), &GroupOptions::default());
        assert_eq!(grouped[&Family::Ev][0].count, Some(42));
    }
}
