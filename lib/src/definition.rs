//! Sealed class and property definitions.
//!
//! The aggregator builds these in mutable staging structs and freezes them
//! into the plain values below when a class or property boundary is
//! detected. Nothing mutates a definition after it has been sealed; the
//! translator and assembler only read them.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use crate::types::{local_name, sanitize_key, EnumSource};

/// Titles or descriptions keyed by language tag. Single-language
/// compilations store the one value under the empty tag.
pub type LangText = BTreeMap<String, String>;

/// One class (node shape) reconstructed from the row stream.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    /// Graph node identifier of the class.
    pub id: String,
    /// Local short-name override for the definition key.
    pub local_name: Option<String>,
    /// Titles per language tag.
    pub titles: LangText,
    /// Descriptions per language tag.
    pub descriptions: LangText,
    /// Identifier of the external class this shape targets, if any.
    pub target_class: Option<String>,
    /// Lower bound on the number of properties an instance may carry.
    pub min_properties: Option<u64>,
    /// Upper bound on the number of properties an instance may carry.
    pub max_properties: Option<u64>,
    /// Property definitions in declaration order.
    pub properties: Vec<PropertyDefinition>,
}

impl ClassDefinition {
    /// Key under which the class is emitted in the definitions map:
    /// the sanitized local-name override when one is present, else the
    /// local name derived from the class identifier.
    pub fn key(&self) -> String {
        match self.local_name.as_deref() {
            Some(name) if !name.is_empty() => sanitize_key(name),
            _ => local_name(&self.id).to_string(),
        }
    }

    /// The identifier emitted as the definition's `@id`: the target class
    /// when the shape constrains an external class, else the shape itself.
    pub fn emitted_id(&self) -> &str {
        self.target_class.as_deref().unwrap_or(&self.id)
    }
}

/// One property shape reconstructed from the row stream.
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    /// Identifier of the property shape node.
    pub id: String,
    /// The constrained predicate.
    pub predicate: String,
    /// Local short-name override for the emitted key.
    pub local_name: Option<String>,
    /// Titles per language tag.
    pub titles: LangText,
    /// Descriptions per language tag.
    pub descriptions: LangText,
    /// Minimum cardinality.
    pub min_count: Option<u64>,
    /// Maximum cardinality. Absent means unbounded, which takes the array
    /// branch in the translator.
    pub max_count: Option<u64>,
    /// Minimum string length.
    pub min_length: Option<u64>,
    /// Maximum string length.
    pub max_length: Option<u64>,
    /// Regular expression constraint, emitted verbatim.
    pub pattern: Option<String>,
    /// Value-space datatype identifier.
    pub datatype: Option<String>,
    /// Nested shape reference. Never set together with `datatype`.
    pub shape_ref: Option<String>,
    /// Closed value list source, if the property declares one.
    pub enumeration: Option<EnumSource>,
    /// Emit `@type: @id` instead of the literal datatype.
    pub is_identifier: bool,
    /// Example literals in first-occurrence order, deduplicated.
    pub examples: IndexSet<String>,
}

impl PropertyDefinition {
    /// Key under which the property is emitted: the local-name override
    /// when present, else the predicate's derived local name.
    pub fn key(&self) -> &str {
        match self.local_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => local_name(&self.predicate),
        }
    }

    /// Whether the property must appear in the owning class's `required`
    /// list.
    pub fn required(&self) -> bool {
        self.min_count.is_some_and(|min| min > 0)
    }
}
