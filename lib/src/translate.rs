//! Converts one property's accumulated constraint facts into a JSON Schema
//! property node.
//!
//! The translation applies its steps in order: required-ness, closed value
//! list, datatype or nested-shape reference with the scalar/array cardinality
//! split, string-shape constraints, display format, examples. An absent
//! `maxCount` means unbounded and takes the array branch.

use serde_json::{json, Map, Value};

use crate::datatypes::{json_format, json_type, JsonType};
use crate::definition::{ClassDefinition, LangText, PropertyDefinition};
use crate::error::Result;
use crate::source::EnumerationResolver;
use crate::types::{local_name, EnumSource, TextMode};

/// JSON pointer to the shared multilingual-string definition.
pub(crate) const LANG_STRING_REF: &str = "#/definitions/langString";

/// How nested-shape references are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefStyle {
    /// Point into the document's own definitions map
    /// (`#/definitions/<shape-local-name>`).
    Definitions,
    /// Point at the referenced shape's external schema document
    /// (`<shape-iri>.jschema`); used by single-class documents, which carry
    /// no definitions map.
    External,
}

/// One translated property, ready to be attached to its owning class node.
#[derive(Debug)]
pub struct TranslatedProperty {
    /// Key under which the node is emitted in `properties`.
    pub key: String,
    /// The JSON Schema property node.
    pub node: Value,
    /// Whether the key belongs in the owning class's `required` list.
    pub required: bool,
    /// Whether the node references the shared `langString` definition.
    pub uses_lang_string: bool,
}

/// Renders a language-keyed text map for the requested output mode.
/// Plain mode takes the single pre-filtered value; localized mode emits a
/// language-tag-keyed object. Empty maps render nothing.
pub(crate) fn text_value(text: &LangText, mode: TextMode) -> Option<Value> {
    match mode {
        TextMode::Plain => text.values().next().map(|value| Value::String(value.clone())),
        TextMode::Localized => {
            if text.is_empty() {
                return None;
            }
            let mut object = Map::new();
            for (tag, value) in text {
                object.insert(tag.clone(), Value::String(value.clone()));
            }
            Some(Value::Object(object))
        }
    }
}

/// Translates one sealed property definition into its JSON Schema node.
///
/// The enumeration resolver is consulted once when the property declares a
/// closed value list; an empty result omits the `enum` keyword rather than
/// emitting an empty array. Required-list bookkeeping is left to the caller
/// via [`TranslatedProperty::required`].
pub fn translate(
    class: &ClassDefinition,
    property: &PropertyDefinition,
    mode: TextMode,
    ref_style: RefStyle,
    resolver: &dyn EnumerationResolver,
) -> Result<TranslatedProperty> {
    let mut node = Map::new();
    let mut uses_lang_string = false;

    node.insert("@id".to_string(), Value::String(property.predicate.clone()));
    if let Some(title) = text_value(&property.titles, mode) {
        node.insert("title".to_string(), title);
    }
    if let Some(description) = text_value(&property.descriptions, mode) {
        node.insert("description".to_string(), description);
    }

    if let Some(source) = &property.enumeration {
        let values = match source {
            EnumSource::Inline => resolver.values_for_property(&class.id, &property.id)?,
            EnumSource::Scheme(scheme) => resolver.values_for_scheme(scheme)?,
        };
        if !values.is_empty() {
            node.insert(
                "enum".to_string(),
                Value::Array(values.into_iter().map(Value::String).collect()),
            );
        }
    }

    // Absent maxCount means unbounded.
    let many = property.max_count.map_or(true, |max| max > 1);

    if let Some(datatype) = &property.datatype {
        let type_signal = if property.is_identifier { "@id" } else { datatype.as_str() };
        node.insert("@type".to_string(), Value::String(type_signal.to_string()));

        if let Some(min) = property.min_length {
            node.insert("minLength".to_string(), Value::from(min));
        }
        if let Some(max) = property.max_length {
            node.insert("maxLength".to_string(), Value::from(max));
        }
        if let Some(pattern) = &property.pattern {
            node.insert("pattern".to_string(), Value::String(pattern.clone()));
        }

        let mapped = json_type(datatype);
        if many {
            if let Some(min) = property.min_count {
                node.insert("minItems".to_string(), Value::from(min));
            }
            if let Some(max) = property.max_count {
                node.insert("maxItems".to_string(), Value::from(max));
            }
            node.insert("type".to_string(), Value::String("array".to_string()));
            if let Some(mapped) = mapped {
                let items = if mapped == JsonType::LangString {
                    uses_lang_string = true;
                    json!({ "type": "object", "$ref": LANG_STRING_REF })
                } else {
                    json!({ "type": mapped.as_str() })
                };
                node.insert("items".to_string(), items);
            }
        } else if let Some(mapped) = mapped {
            if mapped == JsonType::LangString {
                uses_lang_string = true;
                node.insert("type".to_string(), Value::String("object".to_string()));
                node.insert("$ref".to_string(), Value::String(LANG_STRING_REF.to_string()));
            } else {
                node.insert("type".to_string(), Value::String(mapped.as_str().to_string()));
            }
        }

        if let Some(format) = json_format(datatype) {
            node.insert("format".to_string(), Value::String(format.to_string()));
        }
    } else if let Some(shape) = &property.shape_ref {
        node.insert("@type".to_string(), Value::String("@id".to_string()));
        let reference = match ref_style {
            RefStyle::Definitions => format!("#/definitions/{}", local_name(shape)),
            RefStyle::External => format!("{}.jschema", shape),
        };
        if many {
            if let Some(min) = property.min_count {
                node.insert("minItems".to_string(), Value::from(min));
            }
            if let Some(max) = property.max_count {
                node.insert("maxItems".to_string(), Value::from(max));
            }
            node.insert("type".to_string(), Value::String("array".to_string()));
            node.insert("items".to_string(), json!({ "type": "object", "$ref": reference }));
        } else {
            node.insert("type".to_string(), Value::String("object".to_string()));
            node.insert("$ref".to_string(), Value::String(reference));
        }
    }

    if !property.examples.is_empty() {
        node.insert(
            "example".to_string(),
            Value::Array(property.examples.iter().cloned().map(Value::String).collect()),
        );
    }

    Ok(TranslatedProperty {
        key: property.key().to_string(),
        node: Value::Object(node),
        required: property.required(),
        uses_lang_string,
    })
}
