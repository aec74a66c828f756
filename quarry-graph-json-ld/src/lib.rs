//! JSON-LD 1.0 processing library
//!
//! This library converts JSON-LD documents into RDF datasets through a
//! pipeline of value-level transformations:
//!
//! - Context parsing (`@context` → active context)
//! - Document expansion (all IRIs absolute, all values in expanded form)
//! - Node map generation (graph → subject → node object)
//! - RDF materialization (node map → quads)
//!
//! # Example
//!
//! ```
//! use quarry_graph_json_ld::{decode, JsonLdOptions};
//!
//! let dataset = decode(
//!     r#"{"@id": "http://example.org/a", "http://example.org/p": "x"}"#,
//!     &JsonLdOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(dataset.default_graph().len(), 1);
//! ```

pub mod bnode;
pub mod context;
pub mod error;
pub mod expand;
pub mod iri;
pub mod keywords;
pub mod node_map;
pub mod to_rdf;
pub mod value;

pub use bnode::BlankNodeGenerator;
pub use context::{Container, Context, LanguageMapping, TermDefinition};
pub use error::{JsonLdError, Result};
pub use node_map::NodeMap;
pub use quarry_graph_ir::{Dataset, Graph};

use serde_json::Value as JsonValue;
use tracing::debug;

/// Conversion options
///
/// Unknown concerns do not exist in a typed options struct; callers set what
/// they need and `..Default::default()` the rest.
#[derive(Clone, Debug, Default)]
pub struct JsonLdOptions {
    /// Base IRI for resolving relative IRIs
    pub base: Option<String>,

    /// A context applied before the document's own `@context`
    pub expand_context: Option<JsonValue>,

    /// Keep triples with blank node predicates (default: drop them)
    pub produce_generalized_rdf: bool,
}

/// Expand a JSON-LD document.
///
/// Returns the expanded node sequence: every key an absolute IRI, blank node
/// id, or keyword; every property value an array; free-floating values
/// dropped. The input is never mutated.
///
/// # Example
///
/// ```
/// use quarry_graph_json_ld::{expand, JsonLdOptions};
/// use serde_json::json;
///
/// let doc = json!({
///     "@context": {"name": "http://schema.org/name"},
///     "@id": "http://example.org/1",
///     "name": "Test"
/// });
/// let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
/// assert_eq!(expanded[0]["http://schema.org/name"], json!([{"@value": "Test"}]));
/// ```
pub fn expand(document: &JsonValue, options: &JsonLdOptions) -> Result<Vec<JsonValue>> {
    let ctx = Context::with_base(options.base.clone());
    let ctx = match &options.expand_context {
        Some(expand_context) => ctx.update(expand_context)?,
        None => ctx,
    };
    expand::expand_document(document, &ctx)
}

/// Convert a JSON-LD document to an RDF dataset.
///
/// Runs expansion, node map generation, and RDF materialization. The blank
/// node generator lives for exactly this call.
///
/// # Example
///
/// ```
/// use quarry_graph_json_ld::{to_rdf, JsonLdOptions};
/// use serde_json::json;
///
/// let doc = json!({
///     "@id": "http://example.org/a",
///     "http://example.org/p": {"@list": ["x", "y"]}
/// });
/// let dataset = to_rdf(&doc, &JsonLdOptions::default()).unwrap();
/// assert_eq!(dataset.default_graph().len(), 5);
/// ```
pub fn to_rdf(document: &JsonValue, options: &JsonLdOptions) -> Result<Dataset> {
    let expanded = expand(document, options)?;
    let mut gen = BlankNodeGenerator::new();
    let node_map = node_map::generate(&expanded, &mut gen)?;
    let dataset = to_rdf::materialize(&node_map, &mut gen, options.produce_generalized_rdf);
    debug!(
        quads = dataset.len(),
        named_graphs = dataset.graph_names().count(),
        "materialized dataset"
    );
    Ok(dataset)
}

/// Decode JSON-LD text or bytes into an RDF dataset.
///
/// Parses the input as JSON and runs [`to_rdf`].
pub fn decode(input: impl AsRef<[u8]>, options: &JsonLdOptions) -> Result<Dataset> {
    let document: JsonValue = serde_json::from_slice(input.as_ref())?;
    to_rdf(&document, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expand_with_expand_context() {
        let options = JsonLdOptions {
            expand_context: Some(json!({"name": "http://schema.org/name"})),
            ..Default::default()
        };
        let expanded = expand(
            &json!({"@id": "http://example.org/1", "name": "n"}),
            &options,
        )
        .unwrap();

        assert!(expanded[0]
            .as_object()
            .unwrap()
            .contains_key("http://schema.org/name"));
    }

    #[test]
    fn test_expand_with_base_option() {
        let options = JsonLdOptions {
            base: Some("http://base.example/".to_string()),
            ..Default::default()
        };
        let expanded = expand(
            &json!({"@id": "doc", "http://example.org/p": "x"}),
            &options,
        )
        .unwrap();

        assert_eq!(expanded[0]["@id"], "http://base.example/doc");
    }

    #[test]
    fn test_decode_bytes_and_str() {
        let text = r#"{"@id": "http://example.org/a", "http://example.org/p": "x"}"#;
        let from_str = decode(text, &JsonLdOptions::default()).unwrap();
        let from_bytes = decode(text.as_bytes(), &JsonLdOptions::default()).unwrap();
        assert_eq!(from_str, from_bytes);
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode("{not json", &JsonLdOptions::default()).unwrap_err();
        assert!(matches!(err, JsonLdError::Parse(_)));
    }
}
