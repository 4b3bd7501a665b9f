use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::NamedNode;
use oxigraph::store::Store;
use serde_json::{json, Value};
use shape2schema::{SchemaWriter, DRAFT_04, DRAFT_05_JSONLD};

const MODEL: &str = "http://example.com/model";

const SHAPES_TTL: &str = r#"@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix dcam: <http://purl.org/dc/dcam/> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
@prefix void: <http://rdfs.org/ns/void#> .
@prefix ex: <http://example.com/ns#> .

<http://example.com/model> rdfs:label "Address book"@en , "Osoitekirja"@fi ;
    rdfs:comment "People and their addresses"@en ;
    void:rootResource ex:Person ;
    dcterms:hasPart ex:Person , ex:Address , ex:Legacy .

ex:Person a sh:NodeShape ;
    sh:name "Person"@en , "Henkilö"@fi ;
    sh:description "A natural person"@en ;
    sh:targetClass <http://example.com/core#Person> ;
    sh:property ex:Person-name , ex:Person-status , ex:Person-address , ex:Person-old .

ex:Person-name sh:order 1 ;
    sh:path ex:name ;
    sh:name "name"@en , "nimi"@fi ;
    sh:datatype xsd:string ;
    sh:minCount 1 ;
    sh:maxCount 1 ;
    sh:minLength 2 ;
    sh:maxLength 10 ;
    sh:pattern "^[a-z]+$" ;
    skos:example "alice" .

ex:Person-status sh:order 2 ;
    sh:path ex:status ;
    sh:name "status"@en , "tila"@fi ;
    sh:in ( "active" "retired" ) .

ex:Person-address sh:order 3 ;
    sh:path ex:address ;
    sh:name "address"@en , "osoite"@fi ;
    sh:node ex:Address ;
    sh:minCount 1 ;
    sh:maxCount 3 .

ex:Person-old sh:order 4 ;
    sh:path ex:obsolete ;
    sh:name "obsolete"@en , "vanhentunut"@fi ;
    sh:deactivated true ;
    sh:datatype xsd:string .

ex:Address a sh:NodeShape ;
    sh:name "Address"@en , "Osoite"@fi ;
    sh:property ex:Address-country .

ex:Address-country sh:order 1 ;
    sh:path ex:country ;
    sh:name "country"@en , "maa"@fi ;
    sh:datatype xsd:string ;
    sh:maxCount 1 ;
    dcam:memberOf <http://example.com/scheme/countries> .

ex:Legacy a sh:NodeShape ;
    sh:name "Legacy"@en , "Vanha"@fi ;
    sh:deactivated true ;
    sh:property ex:Legacy-x .

ex:Legacy-x sh:order 1 ;
    sh:path ex:x ;
    sh:name "x"@en , "x"@fi ;
    sh:datatype xsd:string .

<http://example.com/scheme/countries> a skos:ConceptScheme .
ex:fi a skos:Concept ;
    skos:inScheme <http://example.com/scheme/countries> ;
    dcterms:identifier "FI" .
ex:de a skos:Concept ;
    skos:inScheme <http://example.com/scheme/countries> ;
    dcterms:identifier "DE" .
ex:at a skos:Concept ;
    skos:inScheme <http://example.com/scheme/countries> ;
    dcterms:identifier "AT" .
"#;

fn writer() -> SchemaWriter {
    let store = Store::new().expect("in-memory store");
    let graph = NamedNode::new("http://example.com/graph").expect("graph iri");
    let parser = RdfParser::from_format(RdfFormat::Turtle).with_default_graph(graph);
    store
        .bulk_loader()
        .load_from_reader(parser, SHAPES_TTL.as_bytes())
        .expect("load shapes");
    SchemaWriter::from_store(store)
}

fn model_schema(writer: &SchemaWriter) -> Value {
    let doc = writer
        .model_schema(MODEL, "en")
        .expect("compilation succeeds")
        .expect("model produces a schema");
    serde_json::from_str(&doc).expect("valid json")
}

#[test]
fn model_document_composes_the_declared_root() {
    let schema = model_schema(&writer());
    assert_eq!(schema["$schema"], DRAFT_04);
    assert_eq!(schema["@id"], "http://example.com/model#");
    assert_eq!(schema["title"], "Address book");
    assert_eq!(schema["description"], "People and their addresses");
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["allOf"], json!([{ "$ref": "#/definitions/Person" }]));
}

#[test]
fn person_definition_translates_every_active_property() {
    let schema = model_schema(&writer());
    let person = &schema["definitions"]["Person"];

    assert_eq!(person["title"], "Person");
    assert_eq!(person["@id"], "http://example.com/core#Person");
    assert_eq!(person["description"], "A natural person");
    assert_eq!(person["required"], json!(["name", "address"]));

    let name = &person["properties"]["name"];
    assert_eq!(name["@type"], "http://www.w3.org/2001/XMLSchema#string");
    assert_eq!(name["type"], "string");
    assert_eq!(name["minLength"], 2);
    assert_eq!(name["maxLength"], 10);
    assert_eq!(name["pattern"], "^[a-z]+$");
    assert_eq!(name["example"], json!(["alice"]));
    assert!(name.as_object().unwrap().get("minItems").is_none());

    let address = &person["properties"]["address"];
    assert_eq!(address["@type"], "@id");
    assert_eq!(address["type"], "array");
    assert_eq!(address["minItems"], 1);
    assert_eq!(address["maxItems"], 3);
    assert_eq!(address["items"], json!({ "type": "object", "$ref": "#/definitions/Address" }));

    let props = person["properties"].as_object().unwrap();
    assert!(!props.contains_key("obsolete"));
}

#[test]
fn inline_and_scheme_enumerations_resolve_in_order() {
    let schema = model_schema(&writer());

    let status = &schema["definitions"]["Person"]["properties"]["status"];
    assert_eq!(status["enum"], json!(["active", "retired"]));
    assert!(status.as_object().unwrap().get("type").is_none());

    let country = &schema["definitions"]["Address"]["properties"]["country"];
    assert_eq!(country["enum"], json!(["AT", "DE", "FI"]));
    assert_eq!(country["type"], "string");
}

#[test]
fn deactivated_class_never_reaches_the_definitions_map() {
    let schema = model_schema(&writer());
    let definitions = schema["definitions"].as_object().unwrap();
    assert!(!definitions.contains_key("Legacy"));
    assert!(!definitions.contains_key("langString"));
}

#[test]
fn single_class_document_stands_alone() {
    let writer = writer();
    let doc = writer
        .class_schema("http://example.com/ns#Person", "en")
        .expect("compilation succeeds")
        .expect("class produces a schema");
    let schema: Value = serde_json::from_str(&doc).expect("valid json");

    assert_eq!(schema["$schema"], DRAFT_04);
    assert_eq!(schema["id"], "http://example.com/ns#Person.jschema");
    assert_eq!(schema["@id"], "http://example.com/ns#Person");
    assert_eq!(schema["title"], "Person");
    assert_eq!(schema["required"], json!(["name", "address"]));
    assert_eq!(
        schema["properties"]["address"]["items"]["$ref"],
        "http://example.com/ns#Address.jschema"
    );
}

#[test]
fn multilingual_document_keys_text_by_language() {
    let writer = writer();
    let doc = writer
        .multilingual_model_schema(MODEL)
        .expect("compilation succeeds")
        .expect("model produces a schema");
    let schema: Value = serde_json::from_str(&doc).expect("valid json");

    assert_eq!(schema["$schema"], DRAFT_05_JSONLD);
    assert_eq!(schema["id"], "http://example.com/model.jschema");
    assert_eq!(schema["title"], json!({ "en": "Address book", "fi": "Osoitekirja" }));

    let person = &schema["definitions"]["Person"];
    assert_eq!(person["title"], json!({ "en": "Person", "fi": "Henkilö" }));
    assert_eq!(
        person["properties"]["name"]["title"],
        json!({ "en": "name", "fi": "nimi" })
    );
    assert_eq!(person["required"], json!(["name", "address"]));

    assert_eq!(schema["definitions"]["langString"]["title"], "Multilingual string");
    assert!(!schema["definitions"].as_object().unwrap().contains_key("Legacy"));
}

#[test]
fn unknown_model_produces_no_schema() {
    let writer = writer();
    assert!(writer
        .model_schema("http://example.com/unknown", "en")
        .expect("compilation succeeds")
        .is_none());
    assert!(writer
        .class_schema("http://example.com/ns#NotAClass", "en")
        .expect("compilation succeeds")
        .is_none());
}

#[test]
fn compilation_is_idempotent() {
    let writer = writer();
    let first = writer.model_schema(MODEL, "en").unwrap().unwrap();
    let second = writer.model_schema(MODEL, "en").unwrap().unwrap();
    assert_eq!(first, second);

    let multilingual_first = writer.multilingual_model_schema(MODEL).unwrap().unwrap();
    let multilingual_second = writer.multilingual_model_schema(MODEL).unwrap().unwrap();
    assert_eq!(multilingual_first, multilingual_second);
}
