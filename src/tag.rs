//! Tag identifiers: `scope/family[/discriminator]`.
//!
//! A tag id such as `r/role/CHEBI:123` names one selectable facet value. The
//! scope (`r`, `p`, `g`) says where the facet applies, the family groups facets
//! of the same kind, and the optional discriminator picks the concrete value.
//!
//! [`split_tag_id`] is purely structural. [`TagId::parse`] layers the typed
//! [`Scope`] and [`Family`] on top; unknown codes come back as `None` and
//! downstream code treats that as "no match".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity a filter applies at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Evaluated once per result.
    #[serde(rename = "r")]
    Result,
    /// Evaluated once per path.
    #[serde(rename = "p")]
    Path,
    /// Free-text search across everything.
    #[serde(rename = "g")]
    Global,
}

impl Scope {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(Self::Result),
            "p" => Some(Self::Path),
            "g" => Some(Self::Global),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Result => "r",
            Self::Path => "p",
            Self::Global => "g",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Facet family code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Chemical categories of the result subject.
    Cc,
    /// Node categories contained in a path.
    Pc,
    /// Drug indications.
    Di,
    /// ChEBI roles.
    Role,
    /// Reasoning agent that produced the result.
    Ara,
    /// Over-the-counter availability.
    Otc,
    /// Target development level.
    Tdl,
    /// Species.
    Sv,
    /// Evidence type backing a path.
    Ev,
    /// Path type (direct or inferred).
    Pt,
    /// Free-text entity search.
    Str,
}

struct FamilyInfo {
    family: Family,
    code: &'static str,
    scope: Scope,
    caption: &'static str,
}

/// The single lookup table for family metadata.
const FAMILY_TABLE: [FamilyInfo; 11] = [
    FamilyInfo { family: Family::Cc, code: "cc", scope: Scope::Result, caption: "Chemical Categories" },
    FamilyInfo { family: Family::Pc, code: "pc", scope: Scope::Path, caption: "Path Components" },
    FamilyInfo { family: Family::Di, code: "di", scope: Scope::Result, caption: "Drug Indications" },
    FamilyInfo { family: Family::Role, code: "role", scope: Scope::Result, caption: "ChEBI Roles" },
    FamilyInfo { family: Family::Ara, code: "ara", scope: Scope::Result, caption: "Reasoning Agents" },
    FamilyInfo { family: Family::Otc, code: "otc", scope: Scope::Result, caption: "Availability" },
    FamilyInfo { family: Family::Tdl, code: "tdl", scope: Scope::Result, caption: "Target Development Level" },
    FamilyInfo { family: Family::Sv, code: "sv", scope: Scope::Result, caption: "Species" },
    FamilyInfo { family: Family::Ev, code: "ev", scope: Scope::Path, caption: "Evidence Type" },
    FamilyInfo { family: Family::Pt, code: "pt", scope: Scope::Path, caption: "Path Type" },
    FamilyInfo { family: Family::Str, code: "str", scope: Scope::Global, caption: "Entity Search" },
];

/// Families evaluated per result.
pub const RESULT_FAMILIES: [Family; 7] = [
    Family::Cc,
    Family::Di,
    Family::Role,
    Family::Ara,
    Family::Otc,
    Family::Tdl,
    Family::Sv,
];

/// Families evaluated per path.
pub const PATH_FAMILIES: [Family; 3] = [Family::Pc, Family::Pt, Family::Ev];

impl Family {
    fn info(self) -> &'static FamilyInfo {
        // FAMILY_TABLE is declared in enum order.
        &FAMILY_TABLE[self as usize]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        FAMILY_TABLE.iter().find(|i| i.code == code).map(|i| i.family)
    }

    pub fn code(self) -> &'static str {
        self.info().code
    }

    /// The scope this family legally belongs to.
    pub fn scope(self) -> Scope {
        self.info().scope
    }

    /// Human-readable heading for a facet panel.
    pub fn caption(self) -> &'static str {
        self.info().caption
    }

    /// Families of a scope, in panel order.
    pub fn in_scope(scope: Scope) -> &'static [Family] {
        match scope {
            Scope::Result => &RESULT_FAMILIES,
            Scope::Path => &PATH_FAMILIES,
            Scope::Global => &[Family::Str],
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw structural split of a tag id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagParts<'a> {
    pub scope: &'a str,
    pub family: Option<&'a str>,
    pub discriminator: Option<&'a str>,
}

impl TagParts<'_> {
    /// Rejoin the parts with `/`.
    pub fn join(&self) -> String {
        let mut out = self.scope.to_string();
        for part in [self.family, self.discriminator].into_iter().flatten() {
            out.push('/');
            out.push_str(part);
        }
        out
    }
}

/// Split a tag id on `/` into at most three parts.
///
/// The discriminator keeps any further `/` characters, so rejoining the parts
/// always reproduces the input.
pub fn split_tag_id(id: &str) -> TagParts<'_> {
    let mut it = id.splitn(3, '/');
    TagParts {
        scope: it.next().unwrap_or(""),
        family: it.next(),
        discriminator: it.next(),
    }
}

/// A tag id with its scope and family decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagId<'a> {
    pub raw: &'a str,
    pub scope: Option<Scope>,
    pub family: Option<Family>,
    pub discriminator: Option<&'a str>,
}

impl<'a> TagId<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let parts = split_tag_id(raw);
        Self {
            raw,
            scope: Scope::from_code(parts.scope),
            family: parts.family.and_then(Family::from_code),
            discriminator: parts.discriminator,
        }
    }

    /// Scope and family both decode, and the family belongs to that scope.
    pub fn is_well_formed(&self) -> bool {
        matches!((self.scope, self.family), (Some(s), Some(f)) if f.scope() == s)
    }
}

/// Build a tag id from typed parts.
pub fn tag_id(family: Family, discriminator: Option<&str>) -> String {
    match discriminator {
        Some(d) => format!("{}/{}/{d}", family.scope(), family),
        None => format!("{}/{}", family.scope(), family),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_round_trips() {
        for id in ["r/role/CHEBI:123", "g/str", "p/ev", "p/pc/biolink:Gene", "r/ara/infores:a/b"] {
            let parts = split_tag_id(id);
            assert_eq!(parts.join(), id);
        }
    }

    #[test]
    fn discriminator_keeps_slashes() {
        let parts = split_tag_id("r/ara/infores:a/b");
        assert_eq!(parts.scope, "r");
        assert_eq!(parts.family, Some("ara"));
        assert_eq!(parts.discriminator, Some("infores:a/b"));
    }

    #[test]
    fn malformed_ids_decode_to_none() {
        let tag = TagId::parse("bogus");
        assert_eq!(tag.scope, None);
        assert_eq!(tag.family, None);
        assert!(!tag.is_well_formed());

        let tag = TagId::parse("x/role/1");
        assert_eq!(tag.scope, None);
        assert_eq!(tag.family, Some(Family::Role));

        let tag = TagId::parse("");
        assert_eq!(tag.scope, None);
    }

    #[test]
    fn scope_family_mismatch_is_not_well_formed() {
        assert!(TagId::parse("r/role/x").is_well_formed());
        assert!(!TagId::parse("p/role/x").is_well_formed());
        assert!(TagId::parse("g/str").is_well_formed());
    }

    #[test]
    fn table_order_matches_enum_order() {
        for (i, info) in FAMILY_TABLE.iter().enumerate() {
            assert_eq!(info.family as usize, i);
            assert_eq!(Family::from_code(info.code), Some(info.family));
        }
    }

    #[test]
    fn family_scopes_follow_tables() {
        for f in RESULT_FAMILIES {
            assert_eq!(f.scope(), Scope::Result);
        }
        for f in PATH_FAMILIES {
            assert_eq!(f.scope(), Scope::Path);
        }
        assert_eq!(Family::Str.scope(), Scope::Global);
    }

    #[test]
    fn tag_id_builds_from_parts() {
        assert_eq!(tag_id(Family::Role, Some("CHEBI:1")), "r/role/CHEBI:1");
        assert_eq!(tag_id(Family::Str, None), "g/str");
        assert_eq!(tag_id(Family::Ev, None), "p/ev");
    }
}
