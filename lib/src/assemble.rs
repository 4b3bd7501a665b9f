//! Wraps translated class definitions into a top-level schema document.
//!
//! Three output variants exist. A model that declares a root resource is
//! emitted as a draft-04 document whose root composes the root definition
//! through a one-element `allOf`. A multilingual compilation is emitted
//! under a draft-05 JSON-LD marker with language-keyed titles and the shared
//! `langString` definition. Everything else is a flat draft-04 object
//! schema. An empty row stream produces no document at all; callers that
//! need a placeholder can fall back to [`dummy_schema`].

use indexmap::IndexSet;
use log::debug;
use serde_json::{json, Map, Value};

use crate::aggregate::aggregate;
use crate::definition::{ClassDefinition, LangText};
use crate::error::Result;
use crate::source::EnumerationResolver;
use crate::translate::{text_value, translate, RefStyle, TranslatedProperty};
use crate::types::{local_name, Row, TextMode};

/// `$schema` marker of the default and root-composition variants.
pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// `$schema` marker of the multilingual variant.
pub const DRAFT_05_JSONLD: &str = "http://shape2schema.org/api/draft05jsonld.json";

/// Model-level metadata attached to the document root.
#[derive(Debug, Clone, Default)]
pub struct ModelMeta {
    /// Graph identifier of the model.
    pub id: String,
    /// Model titles per language tag.
    pub titles: LangText,
    /// Model descriptions per language tag.
    pub descriptions: LangText,
    /// Declared root resource; selects the root-composition variant.
    pub root: Option<String>,
}

/// The shared multilingual-string type definition.
fn lang_string_definition() -> Value {
    json!({
        "type": "object",
        "title": "Multilingual string",
        "description": "Object type for localized strings",
        "additionalProperties": { "type": "string" }
    })
}

/// Placeholder document for resources that produced no schema.
pub fn dummy_schema() -> String {
    let mut doc = Map::new();
    doc.insert("$schema".to_string(), Value::String(DRAFT_04.to_string()));
    doc.insert("properties".to_string(), Value::Object(Map::new()));
    serde_json::to_string_pretty(&Value::Object(doc)).unwrap_or_default()
}

/// The model identifier as emitted in `@id`: fragment-terminated so that
/// relative references resolve inside the model namespace.
fn model_id(id: &str) -> String {
    if id.ends_with('/') || id.ends_with('#') {
        id.to_string()
    } else {
        format!("{}#", id)
    }
}

/// Builds one class's definition node. Returns the definition key, the node
/// and whether any property referenced the shared `langString` definition.
fn class_definition_node(
    class: &ClassDefinition,
    mode: TextMode,
    resolver: &dyn EnumerationResolver,
) -> Result<(String, Value, bool)> {
    let mut node = Map::new();
    let mut uses_lang_string = false;

    if let Some(title) = text_value(&class.titles, mode) {
        node.insert("title".to_string(), title);
    }
    node.insert("type".to_string(), Value::String("object".to_string()));
    node.insert("@id".to_string(), Value::String(class.emitted_id().to_string()));
    if let Some(description) = text_value(&class.descriptions, mode) {
        node.insert("description".to_string(), description);
    }
    if let Some(min) = class.min_properties {
        node.insert("minProperties".to_string(), Value::from(min));
    }
    if let Some(max) = class.max_properties {
        node.insert("maxProperties".to_string(), Value::from(max));
    }

    let mut properties = Map::new();
    let mut required: IndexSet<String> = IndexSet::new();
    for property in &class.properties {
        let TranslatedProperty { key, node: prop_node, required: is_required, uses_lang_string: lang } =
            translate(class, property, mode, RefStyle::Definitions, resolver)?;
        if is_required {
            required.insert(key.clone());
        }
        uses_lang_string |= lang;
        properties.insert(key, prop_node);
    }

    if !properties.is_empty() {
        node.insert("properties".to_string(), Value::Object(properties));
    }
    if !required.is_empty() {
        node.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }

    Ok((class.key(), Value::Object(node), uses_lang_string))
}

/// Compiles a model-wide row stream into a schema document with one
/// definition per class.
///
/// Returns `Ok(None)` when the stream is empty. The variant is selected by
/// the model metadata and the text mode: a declared root resource wins, then
/// the multilingual marker, then the flat draft-04 form.
pub fn compile_model_schema(
    rows: Vec<Row>,
    meta: &ModelMeta,
    resolver: &dyn EnumerationResolver,
    mode: TextMode,
) -> Result<Option<String>> {
    if rows.is_empty() {
        debug!("no class rows for model {}", meta.id);
        return Ok(None);
    }

    let classes = aggregate(rows)?;

    let mut definitions = Map::new();
    // The multilingual variant always carries the shared definition.
    let mut uses_lang_string = mode == TextMode::Localized;
    for class in &classes {
        let (key, node, lang) = class_definition_node(class, mode, resolver)?;
        uses_lang_string |= lang;
        definitions.insert(key, node);
    }

    let mut doc = Map::new();
    // A declared root wins over the multilingual marker.
    let marker = if meta.root.is_none() && mode == TextMode::Localized {
        DRAFT_05_JSONLD
    } else {
        DRAFT_04
    };
    doc.insert("$schema".to_string(), Value::String(marker.to_string()));

    match mode {
        TextMode::Plain => {
            doc.insert("@id".to_string(), Value::String(model_id(&meta.id)));
        }
        TextMode::Localized => {
            doc.insert("id".to_string(), Value::String(format!("{}.jschema", meta.id)));
        }
    }
    if let Some(title) = text_value(&meta.titles, mode) {
        doc.insert("title".to_string(), title);
    }
    if let Some(description) = text_value(&meta.descriptions, mode) {
        doc.insert("description".to_string(), description);
    }

    doc.insert("type".to_string(), Value::String("object".to_string()));

    if let Some(root) = &meta.root {
        doc.insert(
            "allOf".to_string(),
            json!([{ "$ref": format!("#/definitions/{}", local_name(root)) }]),
        );
    }

    if uses_lang_string {
        definitions.insert("langString".to_string(), lang_string_definition());
    }
    doc.insert("definitions".to_string(), Value::Object(definitions));

    Ok(Some(serde_json::to_string_pretty(&Value::Object(doc))?))
}

/// Compiles the row stream of a single class into a standalone schema
/// document with root-level `properties` and `required`.
///
/// Returns `Ok(None)` when the stream is empty or the class is deactivated;
/// callers may substitute [`dummy_schema`]. Nested-shape references point at
/// the referenced shape's own schema document since there is no definitions
/// map to point into.
pub fn compile_class_schema(
    rows: Vec<Row>,
    resolver: &dyn EnumerationResolver,
) -> Result<Option<String>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let classes = aggregate(rows)?;
    let Some(class) = classes.into_iter().next() else {
        return Ok(None);
    };

    let mut doc = Map::new();
    doc.insert("$schema".to_string(), Value::String(DRAFT_04.to_string()));
    doc.insert("id".to_string(), Value::String(format!("{}.jschema", class.id)));
    doc.insert("@id".to_string(), Value::String(class.id.clone()));
    if let Some(title) = text_value(&class.titles, TextMode::Plain) {
        doc.insert("title".to_string(), title);
    }
    if let Some(description) = text_value(&class.descriptions, TextMode::Plain) {
        doc.insert("description".to_string(), description);
    }
    doc.insert("type".to_string(), Value::String("object".to_string()));
    if let Some(min) = class.min_properties {
        doc.insert("minProperties".to_string(), Value::from(min));
    }
    if let Some(max) = class.max_properties {
        doc.insert("maxProperties".to_string(), Value::from(max));
    }

    let mut properties = Map::new();
    let mut required: IndexSet<String> = IndexSet::new();
    let mut uses_lang_string = false;
    for property in &class.properties {
        let translated = translate(&class, property, TextMode::Plain, RefStyle::External, resolver)?;
        if translated.required {
            required.insert(translated.key.clone());
        }
        uses_lang_string |= translated.uses_lang_string;
        properties.insert(translated.key, translated.node);
    }

    if !properties.is_empty() {
        doc.insert("properties".to_string(), Value::Object(properties));
    }
    if !required.is_empty() {
        doc.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    if uses_lang_string {
        let mut definitions = Map::new();
        definitions.insert("langString".to_string(), lang_string_definition());
        doc.insert("definitions".to_string(), Value::Object(definitions));
    }

    Ok(Some(serde_json::to_string_pretty(&Value::Object(doc))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassFacts, PropertyFacts};

    struct NoEnums;

    impl EnumerationResolver for NoEnums {
        fn values_for_property(&self, _class: &str, _property: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn values_for_scheme(&self, _scheme: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn person_rows() -> Vec<Row> {
        vec![Row {
            class: ClassFacts {
                id: "http://ex.com/ns#Person".to_string(),
                title: Some("Person".to_string()),
                ..ClassFacts::default()
            },
            property: Some(PropertyFacts {
                id: "http://ex.com/ns#Person-name".to_string(),
                predicate: "http://ex.com/ns#name".to_string(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#string".to_string()),
                min_count: Some(1),
                max_count: Some(1),
                ..PropertyFacts::default()
            }),
            lang: None,
        }]
    }

    fn meta() -> ModelMeta {
        ModelMeta {
            id: "http://ex.com/model".to_string(),
            titles: [("".to_string(), "Example model".to_string())].into(),
            descriptions: LangText::new(),
            root: None,
        }
    }

    fn parse(doc: &str) -> Value {
        serde_json::from_str(doc).unwrap()
    }

    #[test]
    fn empty_row_stream_produces_no_schema() {
        assert!(compile_model_schema(Vec::new(), &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .is_none());
        assert!(compile_class_schema(Vec::new(), &NoEnums).unwrap().is_none());
    }

    #[test]
    fn person_definition_matches_the_expected_shape() {
        let doc = compile_model_schema(person_rows(), &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);

        assert_eq!(schema["$schema"], DRAFT_04);
        assert_eq!(schema["@id"], "http://ex.com/model#");
        let person = &schema["definitions"]["Person"];
        assert_eq!(person["type"], "object");
        assert_eq!(person["properties"]["name"]["type"], "string");
        assert_eq!(
            person["properties"]["name"]["@type"],
            "http://www.w3.org/2001/XMLSchema#string"
        );
        assert_eq!(person["required"], json!(["name"]));
    }

    #[test]
    fn required_keys_appear_exactly_once() {
        let mut rows = person_rows();
        let repeat = rows[0].clone();
        rows.push(repeat);
        let doc = compile_model_schema(rows, &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        assert_eq!(schema["definitions"]["Person"]["required"], json!(["name"]));
    }

    #[test]
    fn class_without_active_properties_omits_empty_keys() {
        let rows = vec![Row {
            class: ClassFacts {
                id: "http://ex.com/ns#Empty".to_string(),
                ..ClassFacts::default()
            },
            property: None,
            lang: None,
        }];
        let doc = compile_model_schema(rows, &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        let empty = schema["definitions"]["Empty"].as_object().unwrap();
        assert!(!empty.contains_key("properties"));
        assert!(!empty.contains_key("required"));
    }

    #[test]
    fn declared_root_selects_the_composition_variant() {
        let mut model = meta();
        model.root = Some("http://ex.com/ns#Person".to_string());
        let doc = compile_model_schema(person_rows(), &model, &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        assert_eq!(schema["$schema"], DRAFT_04);
        assert_eq!(schema["allOf"], json!([{ "$ref": "#/definitions/Person" }]));
    }

    #[test]
    fn multilingual_variant_carries_marker_and_lang_string() {
        let mut rows = person_rows();
        rows[0].lang = Some("en".to_string());
        rows[0].property.as_mut().unwrap().title = Some("name".to_string());
        let doc = compile_model_schema(rows, &meta(), &NoEnums, TextMode::Localized)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        assert_eq!(schema["$schema"], DRAFT_05_JSONLD);
        assert_eq!(schema["id"], "http://ex.com/model.jschema");
        assert_eq!(schema["definitions"]["langString"]["title"], "Multilingual string");
        assert_eq!(
            schema["definitions"]["Person"]["properties"]["name"]["title"],
            json!({ "en": "name" })
        );
    }

    #[test]
    fn lang_string_definition_appears_only_when_referenced() {
        let doc = compile_model_schema(person_rows(), &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        assert!(schema["definitions"].as_object().unwrap().get("langString").is_none());

        let mut rows = person_rows();
        rows[0].property.as_mut().unwrap().datatype =
            Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#langString".to_string());
        let doc = compile_model_schema(rows, &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let schema = parse(&doc);
        assert_eq!(schema["definitions"]["langString"]["type"], "object");
    }

    #[test]
    fn single_class_document_uses_external_references() {
        let mut rows = person_rows();
        let class = rows[0].class.clone();
        rows.push(Row {
            class,
            property: Some(PropertyFacts {
                id: "http://ex.com/ns#Person-address".to_string(),
                predicate: "http://ex.com/ns#address".to_string(),
                shape_ref: Some("http://ex.com/ns#Address".to_string()),
                max_count: Some(1),
                ..PropertyFacts::default()
            }),
            lang: None,
        });
        let doc = compile_class_schema(rows, &NoEnums).unwrap().unwrap();
        let schema = parse(&doc);
        assert_eq!(schema["$schema"], DRAFT_04);
        assert_eq!(schema["id"], "http://ex.com/ns#Person.jschema");
        assert_eq!(schema["@id"], "http://ex.com/ns#Person");
        assert_eq!(
            schema["properties"]["address"]["$ref"],
            "http://ex.com/ns#Address.jschema"
        );
        assert_eq!(schema["required"], json!(["name"]));
    }

    #[test]
    fn compilation_is_deterministic() {
        let doc_a = compile_model_schema(person_rows(), &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        let doc_b = compile_model_schema(person_rows(), &meta(), &NoEnums, TextMode::Plain)
            .unwrap()
            .unwrap();
        assert_eq!(doc_a, doc_b);
    }

    #[test]
    fn dummy_schema_has_empty_properties() {
        let schema = parse(&dummy_schema());
        assert_eq!(schema["$schema"], DRAFT_04);
        assert_eq!(schema["properties"], json!({}));
    }
}
