//! Lookup tables mapping value-space datatypes to JSON Schema primitive
//! types and display formats.
//!
//! The tables are pure, read-only static data. Datatypes without a JSON
//! counterpart map to nothing; the `type` keyword is then simply omitted
//! from the output node and `@type` remains the only type signal.

/// JSON Schema primitive type a datatype maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Integer,
    Number,
    Boolean,
    String,
    /// Multilingual string marker; emitted as a reference to the shared
    /// `langString` definition instead of a primitive type name.
    LangString,
}

impl JsonType {
    /// The JSON Schema type name. `LangString` has no primitive name and is
    /// rendered as a `$ref` by the translator.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::String => "string",
            JsonType::LangString => "langString",
        }
    }
}

/// Maps a datatype identifier to its JSON Schema primitive type.
pub fn json_type(datatype: &str) -> Option<JsonType> {
    Some(match datatype {
        "http://www.w3.org/2001/XMLSchema#int"
        | "http://www.w3.org/2001/XMLSchema#integer"
        | "http://www.w3.org/2001/XMLSchema#long" => JsonType::Integer,
        "http://www.w3.org/2001/XMLSchema#float"
        | "http://www.w3.org/2001/XMLSchema#double"
        | "http://www.w3.org/2001/XMLSchema#decimal" => JsonType::Number,
        "http://www.w3.org/2001/XMLSchema#boolean" => JsonType::Boolean,
        "http://www.w3.org/2001/XMLSchema#date"
        | "http://www.w3.org/2001/XMLSchema#dateTime"
        | "http://www.w3.org/2001/XMLSchema#time"
        | "http://www.w3.org/2001/XMLSchema#gYear"
        | "http://www.w3.org/2001/XMLSchema#gMonth"
        | "http://www.w3.org/2001/XMLSchema#gDay"
        | "http://www.w3.org/2001/XMLSchema#string"
        | "http://www.w3.org/2001/XMLSchema#anyURI"
        | "http://www.w3.org/2001/XMLSchema#hexBinary"
        | "http://www.w3.org/2000/01/rdf-schema#Literal" => JsonType::String,
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString" => JsonType::LangString,
        _ => return None,
    })
}

/// Maps a datatype identifier to its JSON Schema `format` keyword, for the
/// datatypes that have a known display format.
pub fn json_format(datatype: &str) -> Option<&'static str> {
    Some(match datatype {
        "http://www.w3.org/2001/XMLSchema#dateTime" => "date-time",
        "http://www.w3.org/2001/XMLSchema#date" => "date",
        "http://www.w3.org/2001/XMLSchema#time" => "time",
        "http://www.w3.org/2001/XMLSchema#anyURI" => "uri",
        _ => return None,
    })
}
