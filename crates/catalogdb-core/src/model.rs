//! Module: model
//! Responsibility: static per-collection metadata (fields and supporting indexes).
//! Does not own: predicate evaluation or ordering; query validation reads from here.

///
/// EntityModel
///
/// Declares which fields a collection can be ordered and filtered by. Anything
/// not declared here has no supporting index.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Collection name; also the label used in errors, logs and metrics.
    pub path: &'static str,

    /// Every persisted field name, in wire spelling.
    pub fields: &'static [&'static str],

    /// Fields with an ascending ordered index.
    pub ordered: &'static [&'static str],

    /// Fields supporting equality filters combined with any ordered index.
    pub filters: &'static [&'static str],

    /// Ordered fields holding a lowercased copy of their source text. Only
    /// these can back a case-insensitive prefix search.
    pub lowercase: &'static [&'static str],

    /// Primary lowercase name field used by paged prefix search.
    pub search_field: &'static str,
}

impl EntityModel {
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    #[must_use]
    pub fn is_ordered(&self, field: &str) -> bool {
        self.ordered.contains(&field)
    }

    #[must_use]
    pub fn is_lowercase(&self, field: &str) -> bool {
        self.lowercase.contains(&field)
    }

    #[must_use]
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filters.contains(&field)
    }

    /// Keyword membership is supported wherever a `keywords` field is persisted.
    #[must_use]
    pub fn has_keywords(&self) -> bool {
        self.has_field("keywords")
    }
}
