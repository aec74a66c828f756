//! Active context construction and update
//!
//! The active context is an immutable value: `update` consumes a `@context`
//! value and produces a new context, never mutating the input. The expansion
//! engine only reads the result.
//!
//! Remote context references (string entries) are rejected: the conversion
//! core performs no I/O. Callers that need remote contexts resolve them
//! upstream and pass the resolved object.

use crate::error::{JsonLdError, Result};
use crate::iri::{is_absolute, join, parse_prefix};
use crate::keywords::{is_blank_node_id, is_keyword};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Container mapping of a term definition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    List,
    Set,
    Language,
    Index,
}

impl Container {
    fn from_keyword(kw: &str) -> Option<Self> {
        match kw {
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            "@language" => Some(Container::Language),
            "@index" => Some(Container::Index),
            _ => None,
        }
    }
}

/// Language mapping of a term definition
///
/// `Null` is the explicit "no language" sentinel (`"@language": null` in a
/// term definition); it suppresses the context default language, whereas
/// `Unset` lets the default apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LanguageMapping {
    #[default]
    Unset,
    Null,
    Tag(String),
}

/// A single term definition in the active context
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDefinition {
    /// Expanded IRI (or keyword, for aliases like `"id": "@id"`)
    pub iri_mapping: String,
    /// `@id`, `@vocab`, or an expanded datatype IRI
    pub type_mapping: Option<String>,
    pub language_mapping: LanguageMapping,
    pub container_mapping: Option<Container>,
    pub reverse_property: bool,
}

impl TermDefinition {
    fn simple(iri_mapping: String) -> Self {
        TermDefinition {
            iri_mapping,
            type_mapping: None,
            language_mapping: LanguageMapping::Unset,
            container_mapping: None,
            reverse_property: false,
        }
    }

    /// Check the container mapping against a specific container
    pub fn has_container(&self, container: Container) -> bool {
        self.container_mapping == Some(container)
    }
}

/// The active context
///
/// Term definitions are held in a `BTreeMap`; a `None` entry records a term
/// explicitly decoupled with `"term": null`, which blocks vocabulary-mapping
/// fallback during IRI expansion.
#[derive(Clone, Debug, Default)]
pub struct Context {
    term_defs: BTreeMap<String, Option<TermDefinition>>,
    default_language: Option<String>,
    base_iri: Option<String>,
    vocab_mapping: Option<String>,
}

impl Context {
    /// Create a context with an initial base IRI
    pub fn with_base(base: Option<String>) -> Self {
        Context {
            base_iri: base,
            ..Default::default()
        }
    }

    /// Look up a term definition (nulled terms read as absent)
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.term_defs.get(term).and_then(|d| d.as_ref())
    }

    /// Look up a term slot, distinguishing "absent" from "explicitly nulled"
    pub(crate) fn raw_term(&self, term: &str) -> Option<Option<&TermDefinition>> {
        self.term_defs.get(term).map(|d| d.as_ref())
    }

    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref()
    }

    pub fn vocab_mapping(&self) -> Option<&str> {
        self.vocab_mapping.as_deref()
    }

    /// Produce a new context updated with a `@context` value
    ///
    /// Handles null (reset), arrays (left-to-right fold), and objects. The
    /// receiver is never mutated.
    pub fn update(&self, value: &JsonValue) -> Result<Context> {
        match value {
            JsonValue::Null => Ok(Context::with_base(self.base_iri.clone())),
            JsonValue::Array(items) => {
                let mut result = self.clone();
                for item in items {
                    result = result.update(item)?;
                }
                Ok(result)
            }
            JsonValue::String(s) => Err(JsonLdError::ContextError {
                message: format!("remote context '{}' cannot be resolved (no I/O in the core)", s),
            }),
            JsonValue::Object(map) => self.update_with_object(map),
            other => Err(JsonLdError::ContextError {
                message: format!("@context must be null, a string, an object, or an array: {}", other),
            }),
        }
    }

    fn update_with_object(&self, local: &Map<String, JsonValue>) -> Result<Context> {
        let mut result = self.clone();

        if let Some(base) = local.get("@base") {
            match base {
                JsonValue::Null => result.base_iri = None,
                JsonValue::String(s) if s.is_empty() => result.base_iri = None,
                JsonValue::String(s) => {
                    result.base_iri = Some(match (&result.base_iri, is_absolute(s)) {
                        (Some(current), false) => join(current, s),
                        _ => s.clone(),
                    });
                }
                other => {
                    return Err(JsonLdError::ContextError {
                        message: format!("@base must be a string or null: {}", other),
                    })
                }
            }
        }

        if let Some(vocab) = local.get("@vocab") {
            match vocab {
                JsonValue::Null => result.vocab_mapping = None,
                JsonValue::String(s) => {
                    // A relative vocabulary mapping resolves against the base
                    result.vocab_mapping =
                        Some(match (&result.base_iri, is_absolute(s) || is_blank_node_id(s)) {
                            (Some(base), false) => join(base, s),
                            _ => s.clone(),
                        });
                }
                other => {
                    return Err(JsonLdError::ContextError {
                        message: format!("@vocab must be a string or null: {}", other),
                    })
                }
            }
        }

        if let Some(language) = local.get("@language") {
            match language {
                JsonValue::Null => result.default_language = None,
                JsonValue::String(s) => result.default_language = Some(s.to_lowercase()),
                other => {
                    return Err(JsonLdError::ContextError {
                        message: format!("@language must be a string or null: {}", other),
                    })
                }
            }
        }

        let mut defined: BTreeMap<String, bool> = BTreeMap::new();
        for term in local.keys() {
            if matches!(term.as_str(), "@base" | "@vocab" | "@language") {
                continue;
            }
            create_term_definition(&mut result, local, term, &mut defined)?;
        }

        Ok(result)
    }
}

/// Create one term definition, recursively defining prefixes it depends on.
///
/// The `defined` map guards against cyclic term references.
fn create_term_definition(
    ctx: &mut Context,
    local: &Map<String, JsonValue>,
    term: &str,
    defined: &mut BTreeMap<String, bool>,
) -> Result<()> {
    match defined.get(term) {
        Some(true) => return Ok(()),
        Some(false) => {
            return Err(JsonLdError::ContextError {
                message: format!("cyclic IRI mapping involving term '{}'", term),
            })
        }
        None => {}
    }
    defined.insert(term.to_string(), false);

    if is_keyword(term) {
        return Err(JsonLdError::ContextError {
            message: format!("keywords cannot be redefined: '{}'", term),
        });
    }

    let value = &local[term];
    ctx.term_defs.remove(term);

    // "term": null (or {"@id": null}) decouples the term entirely
    let nulled = value.is_null()
        || matches!(value, JsonValue::Object(m)
            if m.get("@id").is_some_and(JsonValue::is_null) && m.len() == 1);
    if nulled {
        ctx.term_defs.insert(term.to_string(), None);
        defined.insert(term.to_string(), true);
        return Ok(());
    }

    let map;
    let map = match value {
        JsonValue::String(s) => {
            map = Map::from_iter([("@id".to_string(), JsonValue::String(s.clone()))]);
            &map
        }
        JsonValue::Object(m) => m,
        other => {
            return Err(JsonLdError::ContextError {
                message: format!("invalid term definition for '{}': {}", term, other),
            })
        }
    };

    let mut definition;

    if let Some(reverse) = map.get("@reverse") {
        if map.contains_key("@id") {
            return Err(JsonLdError::ContextError {
                message: format!("term '{}' uses both @reverse and @id", term),
            });
        }
        let reverse = reverse.as_str().ok_or_else(|| JsonLdError::ContextError {
            message: format!("@reverse value for term '{}' must be a string", term),
        })?;
        let iri = expand_iri_with_local(ctx, local, defined, reverse, true)?;
        if !iri.contains(':') {
            return Err(JsonLdError::ContextError {
                message: format!("@reverse for term '{}' does not expand to an IRI: {}", term, iri),
            });
        }
        definition = TermDefinition::simple(iri);
        definition.reverse_property = true;
        if let Some(container) = map.get("@container") {
            match container.as_str().and_then(Container::from_keyword) {
                Some(c @ (Container::Set | Container::Index)) => {
                    definition.container_mapping = Some(c)
                }
                _ => {
                    return Err(JsonLdError::ContextError {
                        message: format!(
                            "reverse term '{}' only supports @set and @index containers",
                            term
                        ),
                    })
                }
            }
        }
    } else {
        let iri = match map.get("@id") {
            Some(JsonValue::String(id)) => expand_iri_with_local(ctx, local, defined, id, true)?,
            Some(other) => {
                return Err(JsonLdError::ContextError {
                    message: format!("@id for term '{}' must be a string: {}", term, other),
                })
            }
            None => {
                if let Some((prefix, suffix)) = parse_prefix(term) {
                    if local.contains_key(prefix) {
                        create_term_definition(ctx, local, prefix, defined)?;
                    }
                    match ctx.term(prefix) {
                        Some(def) => format!("{}{}", def.iri_mapping, suffix),
                        None => term.to_string(),
                    }
                } else if term.contains(':') {
                    term.to_string()
                } else if let Some(vocab) = &ctx.vocab_mapping {
                    format!("{}{}", vocab, term)
                } else {
                    return Err(JsonLdError::ContextError {
                        message: format!("term '{}' has no IRI mapping", term),
                    });
                }
            }
        };
        definition = TermDefinition::simple(iri);

        if let Some(type_value) = map.get("@type") {
            let t = type_value.as_str().ok_or_else(|| JsonLdError::ContextError {
                message: format!("@type for term '{}' must be a string", term),
            })?;
            let expanded = match t {
                "@id" | "@vocab" => t.to_string(),
                _ => {
                    let expanded = expand_iri_with_local(ctx, local, defined, t, true)?;
                    if !is_absolute(&expanded) {
                        return Err(JsonLdError::ContextError {
                            message: format!(
                                "@type for term '{}' is not an absolute IRI: {}",
                                term, expanded
                            ),
                        });
                    }
                    expanded
                }
            };
            definition.type_mapping = Some(expanded);
        }

        if let Some(language) = map.get("@language") {
            if map.contains_key("@type") {
                return Err(JsonLdError::ContextError {
                    message: format!("term '{}' uses both @language and @type", term),
                });
            }
            definition.language_mapping = match language {
                JsonValue::Null => LanguageMapping::Null,
                JsonValue::String(s) => LanguageMapping::Tag(s.to_lowercase()),
                other => {
                    return Err(JsonLdError::ContextError {
                        message: format!("@language for term '{}' must be a string or null: {}", term, other),
                    })
                }
            };
        }

        if let Some(container) = map.get("@container") {
            definition.container_mapping = match container.as_str().and_then(Container::from_keyword)
            {
                Some(c) => Some(c),
                None => {
                    return Err(JsonLdError::ContextError {
                        message: format!("invalid @container for term '{}': {}", term, container),
                    })
                }
            };
        }
    }

    ctx.term_defs.insert(term.to_string(), Some(definition));
    defined.insert(term.to_string(), true);
    Ok(())
}

/// IRI expansion during context processing.
///
/// Like `iri::expand_iri` with `vocab` semantics, but terms referenced from
/// the local context being processed are defined on demand first.
fn expand_iri_with_local(
    ctx: &mut Context,
    local: &Map<String, JsonValue>,
    defined: &mut BTreeMap<String, bool>,
    value: &str,
    vocab: bool,
) -> Result<String> {
    if is_keyword(value) {
        return Ok(value.to_string());
    }

    if local.contains_key(value) && defined.get(value) != Some(&true) {
        create_term_definition(ctx, local, value, defined)?;
    }

    if vocab {
        if let Some(Some(def)) = ctx.raw_term(value) {
            return Ok(def.iri_mapping.clone());
        }
    }

    if value.contains(':') {
        if let Some((prefix, suffix)) = parse_prefix(value) {
            if prefix == "_" {
                return Ok(value.to_string());
            }
            if local.contains_key(prefix) && defined.get(prefix) != Some(&true) {
                create_term_definition(ctx, local, prefix, defined)?;
            }
            if let Some(def) = ctx.term(prefix) {
                return Ok(format!("{}{}", def.iri_mapping, suffix));
            }
        }
        return Ok(value.to_string());
    }

    if vocab {
        if let Some(vocab_iri) = &ctx.vocab_mapping {
            return Ok(format!("{}{}", vocab_iri, value));
        }
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_prefix_definitions() {
        let ctx = Context::default()
            .update(&json!({
                "schema": "http://schema.org/",
                "name": "schema:name"
            }))
            .unwrap();

        assert_eq!(ctx.term("schema").unwrap().iri_mapping, "http://schema.org/");
        assert_eq!(ctx.term("name").unwrap().iri_mapping, "http://schema.org/name");
    }

    #[test]
    fn test_forward_reference_between_terms() {
        // "name" references "schema" before it appears lexically
        let ctx = Context::default()
            .update(&json!({
                "name": "schema:name",
                "schema": "http://schema.org/"
            }))
            .unwrap();

        assert_eq!(ctx.term("name").unwrap().iri_mapping, "http://schema.org/name");
    }

    #[test]
    fn test_expanded_term_definition() {
        let ctx = Context::default()
            .update(&json!({
                "xsd": "http://www.w3.org/2001/XMLSchema#",
                "age": {"@id": "http://example.org/age", "@type": "xsd:integer"},
                "knows": {"@id": "http://example.org/knows", "@type": "@id", "@container": "@set"},
                "label": {"@id": "http://example.org/label", "@language": "EN"}
            }))
            .unwrap();

        let age = ctx.term("age").unwrap();
        assert_eq!(
            age.type_mapping.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );

        let knows = ctx.term("knows").unwrap();
        assert_eq!(knows.type_mapping.as_deref(), Some("@id"));
        assert!(knows.has_container(Container::Set));

        // language tags are lowercased at definition time
        let label = ctx.term("label").unwrap();
        assert_eq!(label.language_mapping, LanguageMapping::Tag("en".to_string()));
    }

    #[test]
    fn test_null_language_mapping_is_distinct_from_unset() {
        let ctx = Context::default()
            .update(&json!({
                "@language": "en",
                "plain": {"@id": "http://example.org/plain", "@language": null},
                "tagged": "http://example.org/tagged"
            }))
            .unwrap();

        assert_eq!(ctx.term("plain").unwrap().language_mapping, LanguageMapping::Null);
        assert_eq!(ctx.term("tagged").unwrap().language_mapping, LanguageMapping::Unset);
        assert_eq!(ctx.default_language(), Some("en"));
    }

    #[test]
    fn test_reverse_term_definition() {
        let ctx = Context::default()
            .update(&json!({
                "schema": "http://schema.org/",
                "parent": {"@reverse": "schema:child"}
            }))
            .unwrap();

        let parent = ctx.term("parent").unwrap();
        assert!(parent.reverse_property);
        assert_eq!(parent.iri_mapping, "http://schema.org/child");
    }

    #[test]
    fn test_null_context_resets_but_keeps_base() {
        let ctx = Context::with_base(Some("http://base.example/".to_string()))
            .update(&json!({"@vocab": "http://vocab.example/", "@language": "en"}))
            .unwrap();
        let reset = ctx.update(&JsonValue::Null).unwrap();

        assert!(reset.vocab_mapping().is_none());
        assert!(reset.default_language().is_none());
        assert_eq!(reset.base_iri(), Some("http://base.example/"));
    }

    #[test]
    fn test_array_of_contexts_folds_left_to_right() {
        let ctx = Context::default()
            .update(&json!([
                {"@vocab": "http://first.example/"},
                {"@vocab": "http://second.example/"}
            ]))
            .unwrap();

        assert_eq!(ctx.vocab_mapping(), Some("http://second.example/"));
    }

    #[test]
    fn test_remote_context_rejected() {
        let err = Context::default()
            .update(&json!("http://example.org/context.jsonld"))
            .unwrap_err();
        assert!(matches!(err, JsonLdError::ContextError { .. }));
    }

    #[test]
    fn test_update_does_not_mutate_receiver() {
        let base = Context::default()
            .update(&json!({"a": "http://example.org/a"}))
            .unwrap();
        let _updated = base.update(&json!({"b": "http://example.org/b"})).unwrap();

        assert!(base.term("b").is_none());
    }

    #[test]
    fn test_keyword_alias() {
        let ctx = Context::default()
            .update(&json!({"id": "@id", "type": "@type"}))
            .unwrap();

        assert_eq!(ctx.term("id").unwrap().iri_mapping, "@id");
        assert_eq!(ctx.term("type").unwrap().iri_mapping, "@type");
    }

    #[test]
    fn test_keyword_redefinition_rejected() {
        let err = Context::default()
            .update(&json!({"@id": "http://example.org/id"}))
            .unwrap_err();
        assert!(matches!(err, JsonLdError::ContextError { .. }));
    }
}
