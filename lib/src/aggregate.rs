//! Folds the flat row stream back into class definitions.
//!
//! The stream is consumed in a single pass with one row of lookahead. A
//! property's accumulation is complete when the next row's (class, property)
//! pair differs from the current one or the stream is exhausted; a class's
//! accumulation is complete when the next row's class differs or the stream
//! is exhausted. On each boundary the mutable staging struct is frozen into
//! an immutable definition.
//!
//! Rows MUST arrive sorted by class identifier, then property declaration
//! order, then property identifier. The aggregator does not re-sort; an
//! unsorted stream produces undefined grouping. That precondition belongs to
//! the row source, not to this module.

use log::debug;

use crate::definition::{ClassDefinition, LangText, PropertyDefinition};
use crate::error::{Result, SchemaError};
use crate::types::{ClassFacts, EnumSource, PropertyFacts, Row};

use indexmap::IndexSet;

/// Mutable accumulator for one class; frozen into a [`ClassDefinition`] at
/// the class boundary.
#[derive(Debug)]
struct ClassStaging {
    id: String,
    local_name: Option<String>,
    titles: LangText,
    descriptions: LangText,
    deactivated: bool,
    target_class: Option<String>,
    min_properties: Option<u64>,
    max_properties: Option<u64>,
    properties: Vec<PropertyDefinition>,
}

impl ClassStaging {
    fn new(facts: &ClassFacts) -> Self {
        ClassStaging {
            id: facts.id.clone(),
            local_name: None,
            titles: LangText::new(),
            descriptions: LangText::new(),
            deactivated: false,
            target_class: None,
            min_properties: None,
            max_properties: None,
            properties: Vec::new(),
        }
    }

    /// Folds one row's class fragment in. The first occurrence of a fact
    /// wins; repeated rows carry the same values.
    fn fold(&mut self, facts: &ClassFacts, lang: Option<&str>) {
        let tag = lang.unwrap_or_default();
        if let Some(title) = &facts.title {
            self.titles.entry(tag.to_string()).or_insert_with(|| title.clone());
        }
        if let Some(description) = &facts.description {
            self.descriptions
                .entry(tag.to_string())
                .or_insert_with(|| description.clone());
        }
        merge(&mut self.local_name, &facts.local_name);
        merge(&mut self.target_class, &facts.target_class);
        merge(&mut self.min_properties, &facts.min_properties);
        merge(&mut self.max_properties, &facts.max_properties);
        self.deactivated |= facts.deactivated;
    }

    fn seal(self) -> ClassDefinition {
        ClassDefinition {
            id: self.id,
            local_name: self.local_name,
            titles: self.titles,
            descriptions: self.descriptions,
            target_class: self.target_class,
            min_properties: self.min_properties,
            max_properties: self.max_properties,
            properties: self.properties,
        }
    }
}

/// Mutable accumulator for one property shape; frozen into a
/// [`PropertyDefinition`] at the property boundary.
#[derive(Debug)]
struct PropertyStaging {
    id: String,
    predicate: String,
    local_name: Option<String>,
    titles: LangText,
    descriptions: LangText,
    min_count: Option<u64>,
    max_count: Option<u64>,
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<String>,
    datatype: Option<String>,
    shape_ref: Option<String>,
    enumeration: Option<EnumSource>,
    is_identifier: bool,
    examples: IndexSet<String>,
}

impl PropertyStaging {
    fn new(facts: &PropertyFacts) -> Self {
        PropertyStaging {
            id: facts.id.clone(),
            predicate: facts.predicate.clone(),
            local_name: None,
            titles: LangText::new(),
            descriptions: LangText::new(),
            min_count: None,
            max_count: None,
            min_length: None,
            max_length: None,
            pattern: None,
            datatype: None,
            shape_ref: None,
            enumeration: None,
            is_identifier: false,
            examples: IndexSet::new(),
        }
    }

    fn fold(&mut self, facts: &PropertyFacts, lang: Option<&str>) {
        let tag = lang.unwrap_or_default();
        if let Some(title) = &facts.title {
            self.titles.entry(tag.to_string()).or_insert_with(|| title.clone());
        }
        if let Some(description) = &facts.description {
            self.descriptions
                .entry(tag.to_string())
                .or_insert_with(|| description.clone());
        }
        merge(&mut self.local_name, &facts.local_name);
        merge(&mut self.min_count, &facts.min_count);
        merge(&mut self.max_count, &facts.max_count);
        merge(&mut self.min_length, &facts.min_length);
        merge(&mut self.max_length, &facts.max_length);
        merge(&mut self.pattern, &facts.pattern);
        merge(&mut self.datatype, &facts.datatype);
        merge(&mut self.shape_ref, &facts.shape_ref);
        if self.enumeration.is_none() {
            if facts.inline_values {
                self.enumeration = Some(EnumSource::Inline);
            } else if let Some(scheme) = &facts.scheme {
                self.enumeration = Some(EnumSource::Scheme(scheme.clone()));
            }
        }
        self.is_identifier |= facts.is_identifier;
        if let Some(example) = &facts.example {
            self.examples.insert(example.clone());
        }
    }

    fn seal(self) -> PropertyDefinition {
        PropertyDefinition {
            id: self.id,
            predicate: self.predicate,
            local_name: self.local_name,
            titles: self.titles,
            descriptions: self.descriptions,
            min_count: self.min_count,
            max_count: self.max_count,
            min_length: self.min_length,
            max_length: self.max_length,
            pattern: self.pattern,
            datatype: self.datatype,
            shape_ref: self.shape_ref,
            enumeration: self.enumeration,
            is_identifier: self.is_identifier,
            examples: self.examples,
        }
    }
}

fn merge<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        *slot = value.clone();
    }
}

/// Consumes an ordered row stream and produces sealed class definitions in
/// stream order.
///
/// Deactivated property rows contribute nothing to the property set; a class
/// whose rows carry the class-level deactivated flag is excluded wholesale.
/// Neither case is an error. An empty stream yields an empty vector.
pub fn aggregate(rows: impl IntoIterator<Item = Row>) -> Result<Vec<ClassDefinition>> {
    let mut rows = rows.into_iter().peekable();
    let mut out: Vec<ClassDefinition> = Vec::new();
    let mut class: Option<ClassStaging> = None;
    let mut property: Option<PropertyStaging> = None;
    let mut processed: u64 = 0;

    while let Some(row) = rows.next() {
        processed += 1;
        if processed == u64::from(u32::MAX) {
            return Err(SchemaError::TooManyRows);
        }

        class
            .get_or_insert_with(|| ClassStaging::new(&row.class))
            .fold(&row.class, row.lang.as_deref());

        if let Some(facts) = &row.property {
            if !facts.deactivated {
                property
                    .get_or_insert_with(|| PropertyStaging::new(facts))
                    .fold(facts, row.lang.as_deref());
            }
        }

        let next = rows.peek();
        let class_boundary = next.map_or(true, |n| n.class.id != row.class.id);
        let property_boundary = class_boundary
            || match (next.and_then(|n| n.property.as_ref()), row.property.as_ref()) {
                (Some(next_prop), Some(current)) => next_prop.id != current.id,
                (None, None) => false,
                _ => true,
            };

        if property_boundary {
            if let Some(sealed) = property.take().map(PropertyStaging::seal) {
                if let Some(staging) = class.as_mut() {
                    staging.properties.push(sealed);
                }
            }
        }
        if class_boundary {
            if let Some(staging) = class.take() {
                if staging.deactivated {
                    debug!("skipping deactivated class {}", staging.id);
                } else {
                    out.push(staging.seal());
                }
            }
        }
    }

    debug!("aggregated {} rows into {} class definitions", processed, out.len());
    Ok(out)
}
