//! Row source and enumeration resolver interfaces, with an implementation
//! backed by an oxigraph store.
//!
//! The store-backed source issues one SPARQL SELECT per fetch and returns
//! the solutions as flat [`Row`] records, ordered by class identifier, then
//! property declaration order (`sh:order`), then property identifier — the
//! ordering the aggregator requires. Named-graph layouts are supported by
//! querying the union of all graphs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::vocab::rdf;
use oxigraph::model::{BlankNode, NamedNode, Subject, Term};
use oxigraph::sparql::{Query, QueryOptions, QueryResults, QuerySolution};
use oxigraph::store::Store;

use crate::assemble::ModelMeta;
use crate::definition::LangText;
use crate::error::{Result, SchemaError};
use crate::types::{ClassFacts, PropertyFacts, Row};

/// Supplies the ordered row stream a compilation consumes.
///
/// `lang` selects the text handling: `Some(tag)` pre-filters titles and
/// descriptions to one language and the rows carry no language tag; `None`
/// returns one row per (class, property, language) combination with the tag
/// attached, for multilingual compilation.
pub trait RowSource {
    /// Rows for a single class graph, ordered by property declaration order.
    fn class_rows(&self, class: &str, lang: Option<&str>) -> Result<Vec<Row>>;

    /// Rows spanning every class reachable through the model's has-part
    /// relation, ordered by (class, declaration order, property).
    fn model_rows(&self, model: &str, lang: Option<&str>) -> Result<Vec<Row>>;
}

/// Resolves a property's closed value list.
pub trait EnumerationResolver {
    /// Inline values attached to the property shape itself, in list order.
    fn values_for_property(&self, class: &str, property: &str) -> Result<Vec<String>>;

    /// Coded values of an external scheme, sorted ascending.
    fn values_for_scheme(&self, scheme: &str) -> Result<Vec<String>>;
}

const PREFIXES: &str = "\
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX sh: <http://www.w3.org/ns/shacl#>
PREFIX dcterms: <http://purl.org/dc/terms/>
PREFIX dcam: <http://purl.org/dc/dcam/>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
PREFIX void: <http://rdfs.org/ns/void#>
PREFIX s2s: <http://shape2schema.org/ns#>
";

/// Row source and enumeration resolver over an oxigraph [`Store`].
pub struct StoreRowSource {
    store: Store,
}

impl StoreRowSource {
    /// Wraps an existing store. The caller is responsible for having loaded
    /// the shape graphs.
    pub fn new(store: Store) -> Self {
        StoreRowSource { store }
    }

    /// Creates an in-memory store and loads a Turtle file into a named
    /// graph derived from the file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Store::new().map_err(|e| SchemaError::Store(e.to_string()))?;
        let absolute = path.canonicalize()?;
        let graph = NamedNode::new(format!("file://{}", absolute.display()))
            .map_err(|e| SchemaError::Store(e.to_string()))?;
        let file = File::open(path)?;
        let parser = RdfParser::from_format(RdfFormat::Turtle).with_default_graph(graph);
        store
            .bulk_loader()
            .load_from_reader(parser, BufReader::new(file))
            .map_err(|e| SchemaError::Store(e.to_string()))?;
        info!("loaded shapes from {}", path.display());
        Ok(StoreRowSource { store })
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn select(&self, query: &str) -> Result<Vec<QuerySolution>> {
        let mut parsed = Query::parse(query, None)
            .map_err(|e| SchemaError::Query(format!("SPARQL parse error: {:?}", e)))?;
        parsed.dataset_mut().set_default_graph_as_union();
        let results = self
            .store
            .query_opt(parsed, QueryOptions::default())
            .map_err(|e| SchemaError::Query(format!("SPARQL query error: {:?}", e)))?;
        match results {
            QueryResults::Solutions(solutions) => solutions
                .map(|solution| solution.map_err(|e| SchemaError::Query(e.to_string())))
                .collect(),
            _ => Err(SchemaError::Query("unexpected result type for SELECT".to_string())),
        }
    }

    /// Model title and description, or `None` when the model graph carries
    /// no label. The returned metadata has no root resource attached.
    pub fn model_meta(&self, model: &str, lang: Option<&str>) -> Result<Option<ModelMeta>> {
        let query = match lang {
            Some(tag) => format!(
                r#"{PREFIXES}
SELECT ?label ?description WHERE {{
  <{model}> rdfs:label ?label .
  FILTER (langMatches(lang(?label), "{tag}"))
  OPTIONAL {{ <{model}> rdfs:comment ?description . FILTER (langMatches(lang(?description), "{tag}")) }}
}}"#
            ),
            None => format!(
                r#"{PREFIXES}
SELECT ?lang ?label ?description WHERE {{
  <{model}> rdfs:label ?label .
  BIND (lang(?label) AS ?lang)
  OPTIONAL {{ <{model}> rdfs:comment ?description . FILTER (lang(?description) = lang(?label)) }}
}}"#
            ),
        };
        let solutions = self.select(&query)?;
        if solutions.is_empty() {
            return Ok(None);
        }

        let mut titles = LangText::new();
        let mut descriptions = LangText::new();
        for solution in &solutions {
            let tag = if lang.is_none() {
                string(solution, "lang").unwrap_or_default()
            } else {
                String::new()
            };
            if let Some(label) = string(solution, "label") {
                titles.entry(tag.clone()).or_insert(label);
            }
            if let Some(description) = string(solution, "description") {
                descriptions.entry(tag).or_insert(description);
            }
        }
        Ok(Some(ModelMeta {
            id: model.to_string(),
            titles,
            descriptions,
            root: None,
        }))
    }

    /// The model's declared root resource, if any.
    pub fn model_root(&self, model: &str) -> Result<Option<String>> {
        let query = format!(
            r#"{PREFIXES}
SELECT ?root WHERE {{ <{model}> void:rootResource ?root . }}"#
        );
        let solutions = self.select(&query)?;
        Ok(solutions.first().and_then(|solution| iri(solution, "root")))
    }

    fn rows(&self, scope: &str, lang: Option<&str>) -> Result<Vec<Row>> {
        let query = rows_query(scope, lang);
        let solutions = self.select(&query)?;
        debug!("row query returned {} solutions", solutions.len());
        solutions
            .iter()
            .map(|solution| row_from_solution(solution, lang.is_none()))
            .collect()
    }

    fn rdf_list_values(&self, head: Term) -> Result<Vec<String>> {
        let mut values = Vec::new();
        let mut current = head;
        loop {
            let subject: Subject = match &current {
                Term::NamedNode(node) if node.as_ref() == rdf::NIL => break,
                Term::NamedNode(node) => node.clone().into(),
                Term::BlankNode(node) => node.clone().into(),
                _ => break,
            };
            let mut first = None;
            let mut rest = None;
            for quad in self.store.quads_for_pattern(Some(subject.as_ref()), None, None, None) {
                let quad = quad.map_err(|e| SchemaError::Store(e.to_string()))?;
                if quad.predicate.as_ref() == rdf::FIRST {
                    first = Some(quad.object);
                } else if quad.predicate.as_ref() == rdf::REST {
                    rest = Some(quad.object);
                }
            }
            if let Some(Term::Literal(literal)) = first {
                values.push(literal.value().to_string());
            }
            match rest {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(values)
    }
}

impl RowSource for StoreRowSource {
    fn class_rows(&self, class: &str, lang: Option<&str>) -> Result<Vec<Row>> {
        let scope = format!("VALUES ?resource {{ <{class}> }}");
        self.rows(&scope, lang)
    }

    fn model_rows(&self, model: &str, lang: Option<&str>) -> Result<Vec<Row>> {
        let scope = format!("<{model}> dcterms:hasPart ?resource .");
        self.rows(&scope, lang)
    }
}

impl EnumerationResolver for StoreRowSource {
    fn values_for_property(&self, class: &str, property: &str) -> Result<Vec<String>> {
        let sh_property = NamedNode::new_unchecked("http://www.w3.org/ns/shacl#property");
        let sh_in = NamedNode::new_unchecked("http://www.w3.org/ns/shacl#in");
        let class_node = match NamedNode::new(class) {
            Ok(node) => node,
            Err(_) => return Ok(Vec::new()),
        };
        let Some(property_subject) = subject_for(property) else {
            return Ok(Vec::new());
        };
        let property_term = Term::from(property_subject.clone());

        // The list only counts when the property shape hangs off the class.
        let mut linked = self.store.quads_for_pattern(
            Some(class_node.as_ref().into()),
            Some(sh_property.as_ref()),
            Some(property_term.as_ref()),
            None,
        );
        match linked.next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(SchemaError::Store(e.to_string())),
            None => return Ok(Vec::new()),
        }

        let mut heads = self
            .store
            .quads_for_pattern(Some(property_subject.as_ref()), Some(sh_in.as_ref()), None, None);
        match heads.next() {
            Some(Ok(quad)) => self.rdf_list_values(quad.object),
            Some(Err(e)) => Err(SchemaError::Store(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn values_for_scheme(&self, scheme: &str) -> Result<Vec<String>> {
        let query = format!(
            r#"{PREFIXES}
SELECT ?value WHERE {{
  ?code skos:inScheme <{scheme}> .
  ?code dcterms:identifier ?value .
}} ORDER BY ?value"#
        );
        let solutions = self.select(&query)?;
        Ok(solutions
            .iter()
            .filter_map(|solution| string(solution, "value"))
            .collect())
    }
}

/// Builds the row query for one scope (a model's has-part closure or a
/// single class). The single-language form filters titles and descriptions
/// with `langMatches`; the multilingual form requires a class title, binds
/// its language tag and joins property titles on the same tag.
fn rows_query(scope: &str, lang: Option<&str>) -> String {
    match lang {
        Some(tag) => format!(
            r#"{PREFIXES}
SELECT ?resource ?targetClass ?localClassName ?classTitle ?classDeactivated ?classDescription ?minProperties ?maxProperties ?property ?index ?propertyDeactivated ?valueList ?schemeList ?predicate ?id ?title ?description ?datatype ?shapeRef ?min ?max ?minLength ?maxLength ?pattern ?idBoolean ?example
WHERE {{
  {scope}
  ?resource a ?resourceType .
  VALUES ?resourceType {{ rdfs:Class sh:Shape sh:NodeShape }}
  OPTIONAL {{ ?resource s2s:localName ?localClassName . }}
  OPTIONAL {{ ?resource sh:name ?classTitle . FILTER (langMatches(lang(?classTitle), "{tag}")) }}
  OPTIONAL {{ ?resource sh:deactivated ?classDeactivated . }}
  OPTIONAL {{ ?resource s2s:minProperties ?minProperties . }}
  OPTIONAL {{ ?resource s2s:maxProperties ?maxProperties . }}
  OPTIONAL {{ ?resource sh:targetClass ?targetClass . }}
  OPTIONAL {{ ?resource sh:description ?classDescription . FILTER (langMatches(lang(?classDescription), "{tag}")) }}
  OPTIONAL {{
    ?resource sh:property ?property .
    ?property sh:order ?index .
    ?property sh:path ?predicate .
    OPTIONAL {{ ?property s2s:localName ?id . }}
    OPTIONAL {{ ?property sh:name ?title . FILTER (langMatches(lang(?title), "{tag}")) }}
    OPTIONAL {{ ?property sh:description ?description . FILTER (langMatches(lang(?description), "{tag}")) }}
    OPTIONAL {{ ?property sh:deactivated ?propertyDeactivated . }}
    OPTIONAL {{ ?property sh:datatype ?datatype . }}
    OPTIONAL {{ ?property sh:node ?shapeRef . }}
    OPTIONAL {{ ?property sh:minCount ?min . }}
    OPTIONAL {{ ?property sh:maxCount ?max . }}
    OPTIONAL {{ ?property sh:pattern ?pattern . }}
    OPTIONAL {{ ?property sh:minLength ?minLength . }}
    OPTIONAL {{ ?property sh:maxLength ?maxLength . }}
    OPTIONAL {{ ?property skos:example ?example . }}
    OPTIONAL {{ ?property sh:in ?valueList . }}
    OPTIONAL {{ ?property dcam:memberOf ?schemeList . }}
    OPTIONAL {{ ?property s2s:isResourceIdentifier ?idBoolean . }}
  }}
}}
ORDER BY ?resource ?index ?property"#
        ),
        None => format!(
            r#"{PREFIXES}
SELECT ?resource ?targetClass ?localClassName ?classTitle ?classDeactivated ?classDescription ?minProperties ?maxProperties ?lang ?property ?index ?propertyDeactivated ?valueList ?schemeList ?predicate ?id ?title ?description ?datatype ?shapeRef ?min ?max ?minLength ?maxLength ?pattern ?idBoolean ?example
WHERE {{
  {scope}
  ?resource a ?resourceType .
  VALUES ?resourceType {{ rdfs:Class sh:Shape sh:NodeShape }}
  ?resource sh:name ?classTitle .
  BIND (lang(?classTitle) AS ?lang)
  OPTIONAL {{ ?resource s2s:localName ?localClassName . }}
  OPTIONAL {{ ?resource sh:deactivated ?classDeactivated . }}
  OPTIONAL {{ ?resource s2s:minProperties ?minProperties . }}
  OPTIONAL {{ ?resource s2s:maxProperties ?maxProperties . }}
  OPTIONAL {{ ?resource sh:targetClass ?targetClass . }}
  OPTIONAL {{ ?resource sh:description ?classDescription . FILTER (lang(?classDescription) = ?lang) }}
  OPTIONAL {{
    ?resource sh:property ?property .
    ?property sh:order ?index .
    ?property sh:path ?predicate .
    ?property sh:name ?title .
    FILTER (lang(?title) = ?lang)
    OPTIONAL {{ ?property s2s:localName ?id . }}
    OPTIONAL {{ ?property sh:description ?description . FILTER (lang(?description) = ?lang) }}
    OPTIONAL {{ ?property sh:deactivated ?propertyDeactivated . }}
    OPTIONAL {{ ?property sh:datatype ?datatype . }}
    OPTIONAL {{ ?property sh:node ?shapeRef . }}
    OPTIONAL {{ ?property sh:minCount ?min . }}
    OPTIONAL {{ ?property sh:maxCount ?max . }}
    OPTIONAL {{ ?property sh:pattern ?pattern . }}
    OPTIONAL {{ ?property sh:minLength ?minLength . }}
    OPTIONAL {{ ?property sh:maxLength ?maxLength . }}
    OPTIONAL {{ ?property skos:example ?example . }}
    OPTIONAL {{ ?property sh:in ?valueList . }}
    OPTIONAL {{ ?property dcam:memberOf ?schemeList . }}
    OPTIONAL {{ ?property s2s:isResourceIdentifier ?idBoolean . }}
  }}
}}
ORDER BY ?resource ?index ?property ?lang"#
        ),
    }
}

/// Maps one query solution into a flat row. The class and predicate
/// identifiers are required; everything else is optional.
fn row_from_solution(solution: &QuerySolution, multilingual: bool) -> Result<Row> {
    let class_id = iri(solution, "resource").ok_or(SchemaError::MissingField("resource"))?;
    let lang = if multilingual { string(solution, "lang") } else { None };

    let class = ClassFacts {
        id: class_id,
        local_name: string(solution, "localClassName"),
        title: string(solution, "classTitle"),
        description: string(solution, "classDescription"),
        deactivated: boolean(solution, "classDeactivated"),
        target_class: iri(solution, "targetClass"),
        min_properties: unsigned(solution, "minProperties")?,
        max_properties: unsigned(solution, "maxProperties")?,
    };

    let property = match solution.get("property") {
        None => None,
        Some(term) => Some(PropertyFacts {
            id: term_text(term),
            predicate: iri(solution, "predicate").ok_or(SchemaError::MissingField("predicate"))?,
            local_name: string(solution, "id"),
            title: string(solution, "title"),
            description: string(solution, "description"),
            deactivated: boolean(solution, "propertyDeactivated"),
            datatype: iri(solution, "datatype"),
            shape_ref: iri(solution, "shapeRef"),
            min_count: unsigned(solution, "min")?,
            max_count: unsigned(solution, "max")?,
            min_length: unsigned(solution, "minLength")?,
            max_length: unsigned(solution, "maxLength")?,
            pattern: string(solution, "pattern"),
            example: string(solution, "example"),
            inline_values: solution.get("valueList").is_some(),
            scheme: iri(solution, "schemeList"),
            is_identifier: boolean(solution, "idBoolean"),
        }),
    };

    Ok(Row { class, property, lang })
}

fn term_text(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        other => other.to_string(),
    }
}

fn subject_for(id: &str) -> Option<Subject> {
    if let Some(label) = id.strip_prefix("_:") {
        BlankNode::new(label).ok().map(Subject::from)
    } else {
        NamedNode::new(id).ok().map(Subject::from)
    }
}

fn iri(solution: &QuerySolution, name: &str) -> Option<String> {
    match solution.get(name) {
        Some(Term::NamedNode(node)) => Some(node.as_str().to_string()),
        _ => None,
    }
}

fn string(solution: &QuerySolution, name: &str) -> Option<String> {
    match solution.get(name) {
        Some(Term::Literal(literal)) => Some(literal.value().to_string()),
        _ => None,
    }
}

fn unsigned(solution: &QuerySolution, name: &'static str) -> Result<Option<u64>> {
    match solution.get(name) {
        Some(Term::Literal(literal)) => literal
            .value()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| SchemaError::MalformedLiteral {
                field: name,
                value: literal.value().to_string(),
            }),
        _ => Ok(None),
    }
}

fn boolean(solution: &QuerySolution, name: &str) -> bool {
    matches!(
        solution.get(name),
        Some(Term::Literal(literal)) if literal.value() == "true" || literal.value() == "1"
    )
}
