//! Flat row records produced by a [`RowSource`](crate::source::RowSource) and
//! shared small types.
//!
//! A row carries one (class, property, value-fragment) combination exactly as
//! the store query returned it. The aggregator folds consecutive rows back
//! into nested definitions, so the stream MUST already be sorted by class
//! identifier, then property declaration order, then property identifier.
//! That ordering is the row source's responsibility and is not re-checked.

use regex::Regex;

/// One flat record from the row stream.
#[derive(Debug, Clone, Default)]
pub struct Row {
    /// Facts about the class the row belongs to. Repeated on every row of
    /// the class.
    pub class: ClassFacts,
    /// Facts about one property shape, absent for classes without
    /// properties.
    pub property: Option<PropertyFacts>,
    /// Language partition tag. `None` in single-language compilations
    /// (the source pre-filters to one language); the title's language tag
    /// in multilingual compilations.
    pub lang: Option<String>,
}

/// Class-level fragment of a row.
#[derive(Debug, Clone, Default)]
pub struct ClassFacts {
    /// Graph node identifier of the class/shape.
    pub id: String,
    /// Local short-name override for the definition key.
    pub local_name: Option<String>,
    /// Human title in the row's language.
    pub title: Option<String>,
    /// Human description in the row's language.
    pub description: Option<String>,
    /// Deactivated classes are excluded from the output wholesale.
    pub deactivated: bool,
    /// Target class identifier when the shape constrains an external class.
    pub target_class: Option<String>,
    /// Lower bound on the number of properties an instance may carry.
    pub min_properties: Option<u64>,
    /// Upper bound on the number of properties an instance may carry.
    pub max_properties: Option<u64>,
}

/// Property-level fragment of a row.
#[derive(Debug, Clone, Default)]
pub struct PropertyFacts {
    /// Identifier of the property shape node.
    pub id: String,
    /// The constrained predicate (`sh:path`).
    pub predicate: String,
    /// Local short-name override for the emitted key.
    pub local_name: Option<String>,
    /// Human title in the row's language.
    pub title: Option<String>,
    /// Human description in the row's language.
    pub description: Option<String>,
    /// Deactivated properties are silently excluded from the output.
    pub deactivated: bool,
    /// Value-space datatype identifier.
    pub datatype: Option<String>,
    /// Nested shape reference (`sh:node`). Mutually exclusive with
    /// `datatype`; when both appear the datatype wins.
    pub shape_ref: Option<String>,
    /// Minimum cardinality (`sh:minCount`).
    pub min_count: Option<u64>,
    /// Maximum cardinality (`sh:maxCount`).
    pub max_count: Option<u64>,
    /// Minimum string length (`sh:minLength`).
    pub min_length: Option<u64>,
    /// Maximum string length (`sh:maxLength`).
    pub max_length: Option<u64>,
    /// Regular expression constraint (`sh:pattern`), emitted verbatim.
    pub pattern: Option<String>,
    /// One example literal; repeated rows fold into an example set.
    pub example: Option<String>,
    /// The property carries an inline `sh:in` value list.
    pub inline_values: bool,
    /// External code scheme the values are drawn from.
    pub scheme: Option<String>,
    /// Emit `@type: @id` instead of the literal datatype.
    pub is_identifier: bool,
}

/// Where a property's closed value list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSource {
    /// Values attached to the property shape itself, in list order.
    Inline,
    /// Values of an external code scheme, sorted ascending.
    Scheme(String),
}

/// How titles and descriptions are rendered in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Plain strings; the row stream was filtered to a single language.
    Plain,
    /// Language-tag-keyed objects; rows carry a language partition tag.
    Localized,
}

/// Derives the local name of an IRI: the segment after the last `#` or `/`,
/// or the whole IRI when no such split exists.
pub fn local_name(iri: &str) -> &str {
    match iri.rsplit_once(['#', '/']) {
        Some((_, tail)) if !tail.is_empty() => tail,
        _ => iri,
    }
}

/// Strips characters that are not safe in a definition key. Applied to
/// user-supplied local-name overrides before they become JSON object keys.
pub fn sanitize_key(name: &str) -> String {
    let invalid = Regex::new(r"[^A-Za-z0-9_\-]").unwrap();
    invalid.replace_all(name, "").into_owned()
}
