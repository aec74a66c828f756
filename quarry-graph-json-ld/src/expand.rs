//! The Expansion Algorithm
//!
//! A recursive rewrite of the input tree into expanded form: every key an
//! absolute IRI, blank node id, or keyword; every property value an array;
//! scalars lifted into value objects. Free-floating values are dropped.
//!
//! Keys of every mapping are processed in lexicographic order (serde_json's
//! `Map` is BTreeMap-backed, so plain iteration already satisfies this).

use crate::context::{Container, Context};
use crate::error::{JsonLdError, Result};
use crate::iri::{expand_iri, is_absolute};
use crate::keywords::{is_keyword, is_list_object, is_scalar, is_value_object};
use crate::value::expand_value;
use serde_json::{json, Map, Value as JsonValue};
use tracing::trace;

/// Outcome of a single keyword entry in the object walk
///
/// Distinguishes "this entry contributes nothing" from "store this value
/// under the keyword" from "the handler already merged into the result"
/// (reverse maps).
enum KeywordOutcome {
    Drop,
    Put(JsonValue),
    Merged,
}

/// Expand a full document and return the expanded node sequence.
///
/// A top-level result that is a single mapping containing only `@graph`
/// unwraps to that graph's contents.
pub(crate) fn expand_document(input: &JsonValue, ctx: &Context) -> Result<Vec<JsonValue>> {
    let expanded = expand_element(ctx, None, input)?;

    let expanded = match expanded {
        Some(JsonValue::Object(mut m)) if m.len() == 1 && m.contains_key("@graph") => {
            m.remove("@graph")
        }
        other => other,
    };

    let nodes = match expanded {
        None => vec![],
        Some(JsonValue::Array(items)) => items,
        Some(other) => vec![other],
    };
    trace!(nodes = nodes.len(), "expanded document");
    Ok(nodes)
}

/// Expand a single element; `None` means the element was dropped.
pub(crate) fn expand_element(
    ctx: &Context,
    active_property: Option<&str>,
    element: &JsonValue,
) -> Result<Option<JsonValue>> {
    match element {
        JsonValue::Null => Ok(None),

        scalar if is_scalar(scalar) => match active_property {
            // Free-floating scalars are dropped
            None | Some("@graph") => Ok(None),
            Some(property) => Ok(Some(expand_value(ctx, property, scalar))),
        },

        JsonValue::Array(items) => {
            let inside_list = active_property == Some("@list")
                || active_property
                    .and_then(|p| ctx.term(p))
                    .is_some_and(|d| d.has_container(Container::List));

            let mut result = Vec::new();
            for item in items {
                let Some(expanded) = expand_element(ctx, active_property, item)? else {
                    continue;
                };
                if inside_list && (expanded.is_array() || is_list_object(&expanded)) {
                    return Err(JsonLdError::ListOfLists {
                        fragment: element.clone(),
                    });
                }
                match expanded {
                    JsonValue::Array(inner) => result.extend(inner),
                    other => result.push(other),
                }
            }
            Ok(Some(JsonValue::Array(result)))
        }

        JsonValue::Object(map) => expand_object(ctx, active_property, map),

        // is_scalar covered everything else
        _ => unreachable!("non-scalar, non-null, non-composite JSON value"),
    }
}

fn expand_object(
    ctx: &Context,
    active_property: Option<&str>,
    map: &Map<String, JsonValue>,
) -> Result<Option<JsonValue>> {
    let updated;
    let ctx = match map.get("@context") {
        Some(local) => {
            updated = ctx.update(local)?;
            &updated
        }
        None => ctx,
    };

    let mut result = Map::new();

    for (key, value) in map {
        if key == "@context" {
            continue;
        }

        let Some(expanded_property) = expand_iri(key, ctx, false, true) else {
            continue;
        };

        if is_keyword(&expanded_property) {
            if active_property == Some("@reverse") && expanded_property != "@context" {
                return Err(JsonLdError::InvalidReversePropertyMap {
                    keyword: expanded_property,
                });
            }
            if result.contains_key(&expanded_property) {
                return Err(JsonLdError::CollidingKeywords {
                    keyword: expanded_property,
                });
            }
            match expand_keyword(ctx, active_property, &expanded_property, value, &mut result)? {
                KeywordOutcome::Drop | KeywordOutcome::Merged => {}
                KeywordOutcome::Put(v) => {
                    result.insert(expanded_property, v);
                }
            }
        } else if expanded_property.contains(':') {
            expand_term(ctx, key, &expanded_property, value, &mut result)?;
        }
        // Unmapped terms (no colon, no keyword) are discarded
    }

    finalize_object(active_property, result)
}

/// Per-keyword handling of one entry
fn expand_keyword(
    ctx: &Context,
    active_property: Option<&str>,
    keyword: &str,
    value: &JsonValue,
    result: &mut Map<String, JsonValue>,
) -> Result<KeywordOutcome> {
    match keyword {
        "@id" => match value {
            JsonValue::String(s) => {
                let iri = expand_iri(s, ctx, true, false).unwrap_or_else(|| s.clone());
                Ok(KeywordOutcome::Put(JsonValue::String(iri)))
            }
            other => Err(JsonLdError::InvalidIdValue {
                fragment: other.clone(),
            }),
        },

        "@type" => {
            let expand_type = |s: &str| -> JsonValue {
                json!(expand_iri(s, ctx, true, true).unwrap_or_else(|| s.to_string()))
            };
            match value {
                JsonValue::String(s) => Ok(KeywordOutcome::Put(expand_type(s))),
                JsonValue::Array(items) => {
                    let mut types = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            JsonValue::String(s) => types.push(expand_type(s)),
                            _ => {
                                return Err(JsonLdError::InvalidTypeValue {
                                    fragment: value.clone(),
                                })
                            }
                        }
                    }
                    Ok(KeywordOutcome::Put(JsonValue::Array(types)))
                }
                other => Err(JsonLdError::InvalidTypeValue {
                    fragment: other.clone(),
                }),
            }
        }

        "@graph" => match expand_element(ctx, Some("@graph"), value)? {
            None => Ok(KeywordOutcome::Drop),
            Some(v @ JsonValue::Array(_)) => Ok(KeywordOutcome::Put(v)),
            Some(other) => Ok(KeywordOutcome::Put(json!([other]))),
        },

        "@value" => {
            if value.is_null() || is_scalar(value) {
                // A null @value is kept as a sentinel; finalize_object
                // collapses the whole object to null.
                Ok(KeywordOutcome::Put(value.clone()))
            } else {
                Err(JsonLdError::InvalidValueObjectValue {
                    fragment: value.clone(),
                })
            }
        }

        "@language" => match value {
            JsonValue::String(s) => Ok(KeywordOutcome::Put(json!(s.to_lowercase()))),
            other => Err(JsonLdError::InvalidLanguageTaggedString {
                fragment: other.clone(),
            }),
        },

        "@index" => match value {
            JsonValue::String(_) => Ok(KeywordOutcome::Put(value.clone())),
            other => Err(JsonLdError::InvalidIndexValue {
                fragment: other.clone(),
            }),
        },

        "@list" => {
            // Free-floating lists are dropped with their owner
            if matches!(active_property, None | Some("@graph")) {
                return Ok(KeywordOutcome::Drop);
            }
            let items = match expand_element(ctx, active_property, value)? {
                None => vec![],
                Some(JsonValue::Array(items)) => items,
                Some(single) => vec![single],
            };
            if items.iter().any(is_list_object) {
                return Err(JsonLdError::ListOfLists {
                    fragment: value.clone(),
                });
            }
            Ok(KeywordOutcome::Put(JsonValue::Array(items)))
        }

        "@set" => match expand_element(ctx, active_property, value)? {
            None => Ok(KeywordOutcome::Drop),
            Some(v) => Ok(KeywordOutcome::Put(v)),
        },

        "@reverse" => {
            if !value.is_object() {
                return Err(JsonLdError::InvalidReverseValue {
                    fragment: value.clone(),
                });
            }
            let Some(JsonValue::Object(expanded)) =
                expand_element(ctx, Some("@reverse"), value)?
            else {
                return Ok(KeywordOutcome::Merged);
            };

            for (property, value) in &expanded {
                if property == "@reverse" {
                    // Double reversal: these properties attach un-reversed
                    if let JsonValue::Object(inner) = value {
                        for (inner_property, inner_items) in inner {
                            push_items(result, inner_property, as_item_vec(inner_items.clone()));
                        }
                    }
                } else {
                    let items = as_item_vec(value.clone());
                    for item in &items {
                        if is_value_object(item) || is_list_object(item) {
                            return Err(JsonLdError::InvalidReversePropertyValue {
                                fragment: item.clone(),
                            });
                        }
                    }
                    push_into_reverse_map(result, property, items);
                }
            }
            Ok(KeywordOutcome::Merged)
        }

        // Remaining keywords (@container, @base, @vocab, @none, ...) have no
        // meaning in content position
        _ => Ok(KeywordOutcome::Drop),
    }
}

/// Term-branch handling of one entry (expanded property is an IRI or blank
/// node id)
fn expand_term(
    ctx: &Context,
    key: &str,
    expanded_property: &str,
    value: &JsonValue,
    result: &mut Map<String, JsonValue>,
) -> Result<()> {
    let def = ctx.term(key);
    let container = def.and_then(|d| d.container_mapping);

    let expanded = match (container, value) {
        (Some(Container::Language), JsonValue::Object(language_map)) => {
            let mut items = Vec::new();
            for (language, language_value) in language_map {
                for item in as_item_vec(language_value.clone()) {
                    match item {
                        JsonValue::String(s) => {
                            items.push(json!({"@value": s, "@language": language.to_lowercase()}))
                        }
                        other => {
                            return Err(JsonLdError::InvalidLanguageMapValue {
                                fragment: other.clone(),
                            })
                        }
                    }
                }
            }
            Some(JsonValue::Array(items))
        }

        (Some(Container::Index), JsonValue::Object(index_map)) => {
            let mut items = Vec::new();
            for (index, index_value) in index_map {
                let Some(expanded) = expand_element(ctx, Some(key), index_value)? else {
                    continue;
                };
                for mut item in as_item_vec(expanded) {
                    if let JsonValue::Object(m) = &mut item {
                        m.entry("@index".to_string()).or_insert_with(|| json!(index));
                    }
                    items.push(item);
                }
            }
            Some(JsonValue::Array(items))
        }

        _ => expand_element(ctx, Some(key), value)?,
    };

    let Some(expanded) = expanded else {
        return Ok(());
    };

    let expanded = if def.is_some_and(|d| d.has_container(Container::List)) && !is_list_object(&expanded)
    {
        json!({"@list": as_item_vec(expanded)})
    } else {
        expanded
    };

    if def.is_some_and(|d| d.reverse_property) {
        let items = as_item_vec(expanded);
        for item in &items {
            if is_value_object(item) || is_list_object(item) {
                return Err(JsonLdError::InvalidReversePropertyValue {
                    fragment: item.clone(),
                });
            }
        }
        push_into_reverse_map(result, expanded_property, items);
    } else {
        push_items(result, expanded_property, as_item_vec(expanded));
    }
    Ok(())
}

/// Post-processing of an expanded mapping (value-object validation, @type
/// wrapping, @set/@list structural checks, free-floating drops)
fn finalize_object(
    active_property: Option<&str>,
    mut result: Map<String, JsonValue>,
) -> Result<Option<JsonValue>> {
    if result.contains_key("@value") {
        let allowed = ["@value", "@language", "@type", "@index"];
        if result.keys().any(|k| !allowed.contains(&k.as_str()))
            || (result.contains_key("@language") && result.contains_key("@type"))
        {
            return Err(JsonLdError::InvalidValueObject {
                fragment: JsonValue::Object(result),
            });
        }
        if result["@value"].is_null() {
            return Ok(None);
        }
        if result.contains_key("@language") && !result["@value"].is_string() {
            return Err(JsonLdError::InvalidLanguageTaggedValue {
                fragment: JsonValue::Object(result),
            });
        }
        if let Some(type_value) = result.get("@type") {
            if !type_value.as_str().is_some_and(is_absolute) {
                return Err(JsonLdError::InvalidTypedValue {
                    fragment: JsonValue::Object(result),
                });
            }
        }
    } else if let Some(type_value) = result.get("@type").cloned() {
        if !type_value.is_array() {
            result.insert("@type".to_string(), json!([type_value]));
        }
    } else if result.contains_key("@set") {
        check_container_siblings(&result, "@set")?;
        return Ok(result.remove("@set"));
    } else if result.contains_key("@list") {
        check_container_siblings(&result, "@list")?;
    }

    if result.len() == 1 && result.contains_key("@language") {
        return Ok(None);
    }

    if matches!(active_property, None | Some("@graph"))
        && (result.is_empty()
            || result.contains_key("@value")
            || result.contains_key("@list")
            || (result.len() == 1 && result.contains_key("@id")))
    {
        return Ok(None);
    }

    Ok(Some(JsonValue::Object(result)))
}

fn check_container_siblings(result: &Map<String, JsonValue>, container: &str) -> Result<()> {
    if result.keys().any(|k| k != container && k != "@index") {
        return Err(JsonLdError::InvalidSetOrListObject {
            fragment: JsonValue::Object(result.clone()),
        });
    }
    Ok(())
}

/// Treat a value as a sequence of items (arrays splice, anything else is a
/// singleton)
fn as_item_vec(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        other => vec![other],
    }
}

fn push_items(target: &mut Map<String, JsonValue>, key: &str, items: Vec<JsonValue>) {
    let entry = target
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Array(Vec::new()));
    if let JsonValue::Array(array) = entry {
        array.extend(items);
    }
}

fn push_into_reverse_map(result: &mut Map<String, JsonValue>, property: &str, items: Vec<JsonValue>) {
    let reverse = result
        .entry("@reverse".to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if let JsonValue::Object(reverse_map) = reverse {
        push_items(reverse_map, property, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expand(doc: JsonValue) -> Result<Vec<JsonValue>> {
        expand_document(&doc, &Context::default())
    }

    #[test]
    fn test_expand_basic_node() {
        let expanded = expand(json!({
            "@context": {
                "name": "http://schema.org/name",
                "schema": "http://schema.org/"
            },
            "@id": "http://example.org/1",
            "@type": "schema:Person",
            "name": "John Doe"
        }))
        .unwrap();

        assert_eq!(expanded.len(), 1);
        let node = expanded[0].as_object().unwrap();
        assert_eq!(node["@id"], "http://example.org/1");
        assert_eq!(node["@type"], json!(["http://schema.org/Person"]));
        assert_eq!(
            node["http://schema.org/name"],
            json!([{"@value": "John Doe"}])
        );
    }

    #[test]
    fn test_free_floating_scalar_dropped() {
        assert!(expand(json!("hello")).unwrap().is_empty());
        assert!(expand(json!(42)).unwrap().is_empty());
    }

    #[test]
    fn test_top_level_graph_unwraps() {
        let expanded = expand(json!({
            "@graph": [
                {"@id": "http://example.org/a", "http://p.example/q": "x"}
            ]
        }))
        .unwrap();

        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0]["@id"], "http://example.org/a");
    }

    #[test]
    fn test_node_with_only_id_dropped_at_top_level() {
        assert!(expand(json!({"@id": "http://example.org/a"})).unwrap().is_empty());
    }

    #[test]
    fn test_null_value_collapses_object() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "http://p.example/q": {"@value": null}
        }))
        .unwrap();
        // the value dropped, leaving a lone @id, which is then free-floating
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_array_values_splice() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "http://p.example/q": ["x", ["y", "z"]]
        }))
        .unwrap();

        let values = expanded[0]["http://p.example/q"].as_array().unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_list_container_wraps() {
        let expanded = expand(json!({
            "@context": {
                "nick": {"@id": "http://xmlns.com/foaf/0.1/nick", "@container": "@list"}
            },
            "@id": "http://example.org/joe",
            "nick": ["joe", "bob"]
        }))
        .unwrap();

        let nicks = &expanded[0]["http://xmlns.com/foaf/0.1/nick"][0];
        let list = nicks["@list"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], json!({"@value": "joe"}));
    }

    #[test]
    fn test_list_of_lists_rejected() {
        let err = expand(json!({
            "@context": {
                "p": {"@id": "http://example.org/p", "@container": "@list"}
            },
            "@id": "http://example.org/a",
            "p": [["nested"]]
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::ListOfLists { .. }));

        let err = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@list": [{"@list": ["x"]}]}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::ListOfLists { .. }));
    }

    #[test]
    fn test_set_is_stripped() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@set": ["x", "y"]}
        }))
        .unwrap();

        let values = expanded[0]["http://example.org/p"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        assert!(values[0].get("@value").is_some());
    }

    #[test]
    fn test_language_map_container() {
        let expanded = expand(json!({
            "@context": {
                "label": {"@id": "http://example.org/label", "@container": "@language"}
            },
            "@id": "http://example.org/a",
            "label": {"EN": "Hi", "de": "Hallo"}
        }))
        .unwrap();

        let labels = expanded[0]["http://example.org/label"].as_array().unwrap();
        // lexicographic tag order: "EN" before "de" (byte order)
        assert_eq!(labels[0], json!({"@value": "Hi", "@language": "en"}));
        assert_eq!(labels[1], json!({"@value": "Hallo", "@language": "de"}));
    }

    #[test]
    fn test_language_map_rejects_non_strings() {
        let err = expand(json!({
            "@context": {
                "label": {"@id": "http://example.org/label", "@container": "@language"}
            },
            "@id": "http://example.org/a",
            "label": {"en": 5}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidLanguageMapValue { .. }));
    }

    #[test]
    fn test_index_map_container() {
        let expanded = expand(json!({
            "@context": {
                "post": {"@id": "http://example.org/post", "@container": "@index"}
            },
            "@id": "http://example.org/a",
            "post": {"bio": {"http://example.org/body": "B"}, "about": {"http://example.org/body": "A"}}
        }))
        .unwrap();

        let posts = expanded[0]["http://example.org/post"].as_array().unwrap();
        // index keys iterate lexicographically: "about" before "bio"
        assert_eq!(posts[0]["@index"], "about");
        assert_eq!(posts[1]["@index"], "bio");
    }

    #[test]
    fn test_reverse_keyword() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "@reverse": {
                "http://example.org/p": {"@id": "http://example.org/b"}
            }
        }))
        .unwrap();

        let reverse = expanded[0]["@reverse"].as_object().unwrap();
        assert_eq!(
            reverse["http://example.org/p"],
            json!([{"@id": "http://example.org/b"}])
        );
    }

    #[test]
    fn test_reverse_term() {
        let expanded = expand(json!({
            "@context": {
                "parentOf": {"@reverse": "http://example.org/childOf"}
            },
            "@id": "http://example.org/a",
            "parentOf": {"@id": "http://example.org/b"}
        }))
        .unwrap();

        let reverse = expanded[0]["@reverse"].as_object().unwrap();
        assert_eq!(
            reverse["http://example.org/childOf"],
            json!([{"@id": "http://example.org/b"}])
        );
    }

    #[test]
    fn test_reverse_rejects_value_objects() {
        let err = expand(json!({
            "@id": "http://example.org/a",
            "@reverse": {
                "http://example.org/p": "just a string"
            }
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidReversePropertyValue { .. }));
    }

    #[test]
    fn test_keyword_inside_reverse_rejected() {
        let err = expand(json!({
            "@id": "http://example.org/a",
            "@reverse": {"@id": "http://example.org/b"}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidReversePropertyMap { .. }));
    }

    #[test]
    fn test_colliding_keywords() {
        let err = expand(json!({
            "@context": {"id": "@id"},
            "id": "http://example.org/a",
            "@id": "http://example.org/b",
            "http://example.org/p": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::CollidingKeywords { .. }));
    }

    #[test]
    fn test_invalid_id_value() {
        let err = expand(json!({"@id": 5, "http://example.org/p": "x"})).unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidIdValue { .. }));
    }

    #[test]
    fn test_invalid_language_tagged_value() {
        let err = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@value": 1, "@language": "en"}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidLanguageTaggedValue { .. }));
    }

    #[test]
    fn test_value_object_with_forbidden_key() {
        let err = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@value": "x", "@id": "http://example.org/b"}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidValueObject { .. }));
    }

    #[test]
    fn test_typed_value_requires_absolute_iri() {
        let err = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@value": "x", "@type": "notAnIri"}
        }))
        .unwrap_err();
        assert!(matches!(err, JsonLdError::InvalidTypedValue { .. }));
    }

    #[test]
    fn test_language_is_lowercased() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": {"@value": "Hi", "@language": "EN-US"}
        }))
        .unwrap();

        assert_eq!(
            expanded[0]["http://example.org/p"][0]["@language"],
            "en-us"
        );
    }

    #[test]
    fn test_unmapped_terms_discarded() {
        let expanded = expand(json!({
            "@id": "http://example.org/a",
            "unmapped": "dropped",
            "http://example.org/p": "kept"
        }))
        .unwrap();

        let node = expanded[0].as_object().unwrap();
        assert_eq!(node.len(), 2);
        assert!(node.contains_key("http://example.org/p"));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let doc = json!({
            "@context": {
                "name": "http://schema.org/name",
                "knows": {"@id": "http://schema.org/knows", "@type": "@id"}
            },
            "@id": "http://example.org/a",
            "name": "Alice",
            "knows": "http://example.org/b"
        });

        let once = expand(doc).unwrap();
        let again = expand_document(&JsonValue::Array(once.clone()), &Context::default()).unwrap();
        assert_eq!(once, again);
    }
}
