//! RDF materialization
//!
//! Walks a node map graph by graph and emits quads: `@type` becomes
//! `rdf:type`, list objects become `rdf:first`/`rdf:rest`/`rdf:nil` chains,
//! value objects become canonical literals. Relative IRIs in graph, subject,
//! or predicate position drop the affected scope; blank node predicates are
//! dropped unless generalized RDF is requested.

use crate::bnode::BlankNodeGenerator;
use crate::keywords::{is_blank_node_id, is_keyword, is_list_object};
use crate::iri::is_relative;
use crate::node_map::{NodeMap, DEFAULT_GRAPH};
use quarry_graph_ir::{Dataset, Datatype, Graph, LiteralValue, Term, Triple};
use quarry_vocab::{rdf, xsd};
use serde_json::Value as JsonValue;
use tracing::trace;

pub(crate) fn materialize(
    node_map: &NodeMap,
    gen: &mut BlankNodeGenerator,
    produce_generalized_rdf: bool,
) -> Dataset {
    let mut dataset = Dataset::new();

    for (graph_name, subjects) in node_map {
        if graph_name != DEFAULT_GRAPH && is_relative(graph_name) {
            trace!(graph = %graph_name, "skipping graph with relative name");
            continue;
        }

        let mut graph = Graph::new();
        for (subject, node) in subjects {
            if is_relative(subject) {
                continue;
            }
            let subject_term = node_to_rdf(subject);

            for (property, values) in node {
                let Some(items) = values.as_array() else {
                    // @id and @index carry strings, handled by the keyword skip
                    continue;
                };

                if property == "@type" {
                    for item in items {
                        let Some(type_iri) = item.as_str() else { continue };
                        if is_relative(type_iri) {
                            continue;
                        }
                        graph.add_triple(
                            subject_term.clone(),
                            Term::iri(rdf::TYPE),
                            node_to_rdf(type_iri),
                        );
                    }
                    continue;
                }
                if is_keyword(property) {
                    continue;
                }
                if is_blank_node_id(property) && !produce_generalized_rdf {
                    continue;
                }
                if is_relative(property) {
                    continue;
                }

                let predicate = node_to_rdf(property);
                for item in items {
                    if is_list_object(item) {
                        let list_items = item["@list"].as_array().cloned().unwrap_or_default();
                        let (triples, head) = list_to_rdf(&list_items, gen);
                        graph.add_triple(subject_term.clone(), predicate.clone(), head);
                        graph.extend(triples);
                    } else if let Some(object) = object_to_rdf(item) {
                        graph.add_triple(subject_term.clone(), predicate.clone(), object);
                    }
                }
            }
        }

        if !graph.is_empty() {
            let name = (graph_name != DEFAULT_GRAPH).then_some(graph_name.as_str());
            dataset.add_graph(name, graph);
        }
    }

    dataset
}

/// Convert a node identifier (IRI or `_:` blank node id) to a term
fn node_to_rdf(id: &str) -> Term {
    match id.strip_prefix("_:") {
        Some(label) => Term::blank(label),
        None => Term::iri(id),
    }
}

/// Convert one expanded item (node reference or value object) to an RDF
/// term. Returns `None` for relative-IRI references, which are dropped.
fn object_to_rdf(item: &JsonValue) -> Option<Term> {
    if let Some(id) = item.get("@id").and_then(JsonValue::as_str) {
        if is_relative(id) {
            return None;
        }
        return Some(node_to_rdf(id));
    }

    let value = item.get("@value")?;
    let declared = item.get("@type").and_then(JsonValue::as_str);
    let language = item.get("@language").and_then(JsonValue::as_str);

    let (literal, default_datatype) = match value {
        JsonValue::Bool(b) => (LiteralValue::Boolean(*b), xsd::BOOLEAN),
        JsonValue::Number(n) => {
            // The value's shape picks the canonical lexical form: JSON floats
            // and anything declared xsd:double render as doubles, other
            // numbers as integers. A declared @type only overrides the
            // datatype label below.
            let as_double = !n.is_i64() || declared == Some(xsd::DOUBLE);
            if as_double {
                (LiteralValue::Double(n.as_f64()?), xsd::DOUBLE)
            } else {
                (LiteralValue::Integer(n.as_i64()?), xsd::INTEGER)
            }
        }
        JsonValue::String(s) => {
            let default = if language.is_some() {
                rdf::LANG_STRING
            } else {
                xsd::STRING
            };
            (LiteralValue::string(s), default)
        }
        _ => return None,
    };

    // A language tag always wins over a datatype for the literal kind
    if let Some(language) = language {
        return Some(Term::lang_string(literal.lexical(), language));
    }

    let datatype = Datatype::from_iri(declared.unwrap_or(default_datatype));
    Some(Term::Literal {
        value: literal,
        datatype,
        language: None,
    })
}

/// Materialize a `@list` array as an rdf:first/rdf:rest chain.
///
/// Returns the chain's triples and its head (`rdf:nil` when no item
/// survives `object_to_rdf`).
fn list_to_rdf(items: &[JsonValue], gen: &mut BlankNodeGenerator) -> (Vec<Triple>, Term) {
    let objects: Vec<Term> = items.iter().filter_map(object_to_rdf).collect();
    if objects.is_empty() {
        return (Vec::new(), Term::iri(rdf::NIL));
    }

    let nodes: Vec<Term> = objects
        .iter()
        .map(|_| node_to_rdf(&gen.issue(None)))
        .collect();

    let mut triples = Vec::with_capacity(objects.len() * 2);
    for (i, object) in objects.into_iter().enumerate() {
        triples.push(Triple::new(nodes[i].clone(), Term::iri(rdf::FIRST), object));
        let rest = match nodes.get(i + 1) {
            Some(next) => next.clone(),
            None => Term::iri(rdf::NIL),
        };
        triples.push(Triple::new(nodes[i].clone(), Term::iri(rdf::REST), rest));
    }

    let head = nodes[0].clone();
    (triples, head)
}
