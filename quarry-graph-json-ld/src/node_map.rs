//! Node map generation
//!
//! Flattens expanded output into an ordered mapping
//! graph name → subject id → node object. Every node object gains an `@id`
//! (document blank node ids are re-issued, unidentified nodes get fresh
//! ones), duplicate subjects merge their properties, and embedded node
//! objects are hoisted out and replaced by `{"@id": ...}` references.
//!
//! Both levels of the result are `BTreeMap`s, so iteration during RDF
//! materialization is lexicographic by construction.

use crate::bnode::BlankNodeGenerator;
use crate::error::Result;
use crate::keywords::is_blank_node_id;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

/// graph name → subject id → node object
pub type NodeMap = BTreeMap<String, BTreeMap<String, Map<String, JsonValue>>>;

/// Name of the default graph inside a node map
pub const DEFAULT_GRAPH: &str = "@default";

/// The subject a recursive call attaches its element to
enum SubjectRef {
    /// Normal case: the parent node's id
    Id(String),
    /// Reverse case: a `{"@id": ...}` reference to attach under the
    /// element's own property
    Node(Map<String, JsonValue>),
}

/// Generate the node map for an expanded document.
pub fn generate(expanded: &[JsonValue], gen: &mut BlankNodeGenerator) -> Result<NodeMap> {
    let mut node_map = NodeMap::new();
    node_map.insert(DEFAULT_GRAPH.to_string(), BTreeMap::new());
    for element in expanded {
        populate(element.clone(), &mut node_map, DEFAULT_GRAPH, None, None, None, gen)?;
    }
    Ok(node_map)
}

fn populate(
    element: JsonValue,
    node_map: &mut NodeMap,
    active_graph: &str,
    active_subject: Option<&SubjectRef>,
    active_property: Option<&str>,
    mut list: Option<&mut Vec<JsonValue>>,
    gen: &mut BlankNodeGenerator,
) -> Result<()> {
    let mut obj = match element {
        JsonValue::Array(items) => {
            for item in items {
                populate(
                    item,
                    node_map,
                    active_graph,
                    active_subject,
                    active_property,
                    list.as_deref_mut(),
                    gen,
                )?;
            }
            return Ok(());
        }
        JsonValue::Object(obj) => obj,
        _ => return Ok(()),
    };

    node_map.entry(active_graph.to_string()).or_default();

    // Blank node ids used as types are re-issued like any other
    if let Some(JsonValue::Array(types)) = obj.get_mut("@type") {
        for t in types.iter_mut() {
            if let JsonValue::String(s) = t {
                if is_blank_node_id(s) {
                    *t = JsonValue::String(gen.issue(Some(s)));
                }
            }
        }
    }

    // Value objects merge into the parent's property (deduplicated) or the
    // surrounding list
    if obj.contains_key("@value") {
        let value = JsonValue::Object(obj);
        match list {
            Some(list) => list.push(value),
            None => {
                if let (Some(SubjectRef::Id(subject)), Some(property)) =
                    (active_subject, active_property)
                {
                    let node = node_of(node_map, active_graph, subject);
                    append_unique(node, property, value);
                }
            }
        }
        return Ok(());
    }

    // List objects collect their items through a nested list accumulator
    if let Some(list_value) = obj.remove("@list") {
        let mut result_list = Vec::new();
        populate(
            list_value,
            node_map,
            active_graph,
            active_subject,
            active_property,
            Some(&mut result_list),
            gen,
        )?;
        let list_object = json!({"@list": result_list});
        match list {
            Some(list) => list.push(list_object),
            None => {
                if let (Some(SubjectRef::Id(subject)), Some(property)) =
                    (active_subject, active_property)
                {
                    let node = node_of(node_map, active_graph, subject);
                    append(node, property, list_object);
                }
            }
        }
        return Ok(());
    }

    // Node object: settle its id, register it, link it from the parent, then
    // recurse into its members
    let id = match obj.remove("@id") {
        Some(JsonValue::String(s)) if is_blank_node_id(&s) => gen.issue(Some(&s)),
        Some(JsonValue::String(s)) => s,
        _ => gen.issue(None),
    };

    {
        let graph = node_map.get_mut(active_graph).expect("graph entry exists");
        graph
            .entry(id.clone())
            .or_insert_with(|| Map::from_iter([("@id".to_string(), json!(id))]));
    }

    match (active_subject, active_property) {
        (Some(SubjectRef::Node(reference)), Some(property)) => {
            // Reverse relationship: the parent reference lands on this node
            let node = node_of(node_map, active_graph, &id);
            append_unique(node, property, JsonValue::Object(reference.clone()));
        }
        (Some(SubjectRef::Id(subject)), Some(property)) => {
            let reference = json!({"@id": id});
            match list.as_deref_mut() {
                Some(list) => list.push(reference),
                None => {
                    let node = node_of(node_map, active_graph, subject);
                    append_unique(node, property, reference);
                }
            }
        }
        _ => {
            if let Some(list) = list.as_deref_mut() {
                list.push(json!({"@id": id}));
            }
        }
    }

    if let Some(JsonValue::Array(types)) = obj.remove("@type") {
        let node = node_of(node_map, active_graph, &id);
        for t in types {
            append_unique(node, "@type", t);
        }
    }

    if let Some(index) = obj.remove("@index") {
        let node = node_of(node_map, active_graph, &id);
        node.insert("@index".to_string(), index);
    }

    if let Some(JsonValue::Object(reverse_map)) = obj.remove("@reverse") {
        let referenced = Map::from_iter([("@id".to_string(), json!(id))]);
        for (property, values) in reverse_map {
            for value in as_item_vec(values) {
                populate(
                    value,
                    node_map,
                    active_graph,
                    Some(&SubjectRef::Node(referenced.clone())),
                    Some(&property),
                    None,
                    gen,
                )?;
            }
        }
    }

    if let Some(graph_value) = obj.remove("@graph") {
        node_map.entry(id.clone()).or_default();
        populate(graph_value, node_map, &id, None, None, None, gen)?;
    }

    for (property, value) in obj {
        {
            let node = node_of(node_map, active_graph, &id);
            node.entry(property.clone()).or_insert_with(|| json!([]));
        }
        populate(
            value,
            node_map,
            active_graph,
            Some(&SubjectRef::Id(id.clone())),
            Some(&property),
            None,
            gen,
        )?;
    }

    Ok(())
}

fn node_of<'a>(
    node_map: &'a mut NodeMap,
    graph: &str,
    subject: &str,
) -> &'a mut Map<String, JsonValue> {
    node_map
        .get_mut(graph)
        .expect("graph entry exists")
        .get_mut(subject)
        .expect("subject node exists")
}

fn append_unique(node: &mut Map<String, JsonValue>, property: &str, value: JsonValue) {
    let entry = node
        .entry(property.to_string())
        .or_insert_with(|| json!([]));
    if let JsonValue::Array(array) = entry {
        if !array.contains(&value) {
            array.push(value);
        }
    }
}

fn append(node: &mut Map<String, JsonValue>, property: &str, value: JsonValue) {
    let entry = node
        .entry(property.to_string())
        .or_insert_with(|| json!([]));
    if let JsonValue::Array(array) = entry {
        array.push(value);
    }
}

fn as_item_vec(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_map_for(expanded: JsonValue) -> NodeMap {
        let expanded = match expanded {
            JsonValue::Array(items) => items,
            other => vec![other],
        };
        let mut gen = BlankNodeGenerator::new();
        generate(&expanded, &mut gen).unwrap()
    }

    #[test]
    fn test_simple_node() {
        let map = node_map_for(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": [{"@value": "x"}]
        }));

        let default = &map[DEFAULT_GRAPH];
        let node = &default["http://example.org/a"];
        assert_eq!(node["@id"], "http://example.org/a");
        assert_eq!(node["http://example.org/p"], json!([{"@value": "x"}]));
    }

    #[test]
    fn test_unidentified_node_gets_blank_id() {
        let map = node_map_for(json!({
            "http://example.org/p": [{"@value": "x"}]
        }));

        let default = &map[DEFAULT_GRAPH];
        assert!(default.contains_key("_:b0"));
    }

    #[test]
    fn test_embedded_node_hoisted_to_reference() {
        let map = node_map_for(json!({
            "@id": "http://example.org/a",
            "http://example.org/knows": [
                {"@id": "http://example.org/b", "http://example.org/name": [{"@value": "B"}]}
            ]
        }));

        let default = &map[DEFAULT_GRAPH];
        assert_eq!(
            default["http://example.org/a"]["http://example.org/knows"],
            json!([{"@id": "http://example.org/b"}])
        );
        assert_eq!(
            default["http://example.org/b"]["http://example.org/name"],
            json!([{"@value": "B"}])
        );
    }

    #[test]
    fn test_duplicate_subjects_merge_with_dedup() {
        let map = node_map_for(json!([
            {"@id": "http://example.org/a", "http://example.org/p": [{"@value": "x"}]},
            {"@id": "http://example.org/a", "http://example.org/p": [{"@value": "x"}, {"@value": "y"}]}
        ]));

        let values = &map[DEFAULT_GRAPH]["http://example.org/a"]["http://example.org/p"];
        assert_eq!(values, &json!([{"@value": "x"}, {"@value": "y"}]));
    }

    #[test]
    fn test_document_blank_ids_relabelled() {
        let map = node_map_for(json!([
            {"@id": "_:me", "http://example.org/p": [{"@id": "_:me"}]}
        ]));

        let default = &map[DEFAULT_GRAPH];
        let node = &default["_:b0"];
        assert_eq!(node["http://example.org/p"], json!([{"@id": "_:b0"}]));
    }

    #[test]
    fn test_reverse_inverted() {
        let map = node_map_for(json!({
            "@id": "http://example.org/a",
            "@reverse": {
                "http://example.org/p": [{"@id": "http://example.org/b"}]
            }
        }));

        let default = &map[DEFAULT_GRAPH];
        assert_eq!(
            default["http://example.org/b"]["http://example.org/p"],
            json!([{"@id": "http://example.org/a"}])
        );
    }

    #[test]
    fn test_named_graph_keyed_by_owner() {
        let map = node_map_for(json!({
            "@id": "http://example.org/g",
            "@graph": [
                {"@id": "http://example.org/a", "http://example.org/p": [{"@value": "x"}]}
            ]
        }));

        assert!(map.contains_key("http://example.org/g"));
        assert!(map["http://example.org/g"].contains_key("http://example.org/a"));
        // the graph owner node itself sits in the default graph
        assert!(map[DEFAULT_GRAPH].contains_key("http://example.org/g"));
    }

    #[test]
    fn test_list_preserved_in_order() {
        let map = node_map_for(json!({
            "@id": "http://example.org/a",
            "http://example.org/p": [
                {"@list": [{"@value": "x"}, {"@value": "y"}]}
            ]
        }));

        let values = &map[DEFAULT_GRAPH]["http://example.org/a"]["http://example.org/p"];
        assert_eq!(values, &json!([{"@list": [{"@value": "x"}, {"@value": "y"}]}]));
    }
}
