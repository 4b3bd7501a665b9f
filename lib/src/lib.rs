//! Compiles SHACL-style shape graphs into JSON Schema documents.
//!
//! The compiler consumes an ordered stream of flat rows describing node
//! shapes and their property shapes, folds the stream back into class
//! definitions in a single pass, translates each property's constraints
//! into a JSON Schema node, and wraps the result into one of three document
//! variants (flat draft-04, draft-04 with a root `allOf` composition, or a
//! multilingual draft-05 JSON-LD form). The source graph is never
//! materialized in memory; the store is only touched through the row source
//! and the enumeration resolver.
#![deny(clippy::all)]

pub mod aggregate;
pub mod assemble;
pub mod datatypes;
pub mod definition;
pub mod error;
pub mod source;
pub mod translate;
pub mod types;

pub use crate::aggregate::aggregate;
pub use crate::assemble::{
    compile_class_schema, compile_model_schema, dummy_schema, ModelMeta, DRAFT_04, DRAFT_05_JSONLD,
};
pub use crate::definition::{ClassDefinition, LangText, PropertyDefinition};
pub use crate::error::{Result, SchemaError};
pub use crate::source::{EnumerationResolver, RowSource, StoreRowSource};
pub use crate::translate::{translate, RefStyle, TranslatedProperty};
pub use crate::types::{ClassFacts, EnumSource, PropertyFacts, Row, TextMode};

use std::path::Path;

use log::{debug, info};
use oxigraph::store::Store;

/// A simple facade for schema compilation.
///
/// This wires a store-backed row source and enumeration resolver to the
/// compiler pipeline and exposes one method per output document kind. For
/// finer control — a custom [`RowSource`], pre-fetched rows, or a different
/// resolver — use [`compile_model_schema`] and [`compile_class_schema`]
/// directly.
pub struct SchemaWriter {
    source: StoreRowSource,
}

impl SchemaWriter {
    /// Creates a writer over an already-populated store.
    pub fn from_store(store: Store) -> Self {
        SchemaWriter {
            source: StoreRowSource::new(store),
        }
    }

    /// Creates a writer over a Turtle file loaded into a fresh in-memory
    /// store.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(SchemaWriter {
            source: StoreRowSource::from_file(path)?,
        })
    }

    /// The underlying row source.
    pub fn source(&self) -> &StoreRowSource {
        &self.source
    }

    /// Compiles a standalone schema document for one class in the given
    /// language. Returns `Ok(None)` when the class yields no rows; callers
    /// may substitute [`dummy_schema`].
    pub fn class_schema(&self, class: &str, lang: &str) -> Result<Option<String>> {
        let rows = self.source.class_rows(class, Some(lang))?;
        compile_class_schema(rows, &self.source)
    }

    /// Compiles a model-wide schema document in the given language. When
    /// the model declares a root resource the root-composition variant is
    /// produced. Returns `Ok(None)` when the model graph carries no
    /// metadata.
    pub fn model_schema(&self, model: &str, lang: &str) -> Result<Option<String>> {
        let Some(mut meta) = self.source.model_meta(model, Some(lang))? else {
            debug!("no results from model: {}", model);
            return Ok(None);
        };
        meta.root = self.source.model_root(model)?;
        info!("building json schema from model {}", model);
        let rows = self.source.model_rows(model, Some(lang))?;
        compile_model_schema(rows, &meta, &self.source, TextMode::Plain)
    }

    /// Compiles a model-wide schema document with language-keyed titles and
    /// descriptions, spanning every language the shape titles carry.
    pub fn multilingual_model_schema(&self, model: &str) -> Result<Option<String>> {
        let Some(meta) = self.source.model_meta(model, None)? else {
            debug!("no results from model: {}", model);
            return Ok(None);
        };
        info!("building multilingual json schema from model {}", model);
        let rows = self.source.model_rows(model, None)?;
        compile_model_schema(rows, &meta, &self.source, TextMode::Localized)
    }
}
