//! Format-agnostic RDF graph intermediate representation
//!
//! This crate provides canonical types for representing RDF graphs and
//! datasets produced by the JSON-LD conversion engine and consumed by
//! whatever sits downstream (formatters, stores, assertions in tests).
//!
//! # Key Design Principles
//!
//! 1. **Expanded IRIs only** - All IRIs are stored in expanded form.
//!
//! 2. **Explicit datatypes** - Literals always have an explicit datatype,
//!    never optional. Plain strings use `xsd:string`, language-tagged
//!    strings use `rdf:langString`.
//!
//! 3. **Canonical lexical forms** - `LiteralValue::lexical()` produces the
//!    XSD canonical representation (`true`/`false`, decimal integers,
//!    `5.5E0`-style doubles) so literals constructed from native values are
//!    already canonicalized.
//!
//! 4. **Bag semantics by default** - `Graph` uses `Vec<Triple>` to preserve
//!    duplicates. Call `dedupe()` explicitly for set semantics.
//!
//! 5. **Deterministic output** - `Graph::sort()` orders triples SPO
//!    lexicographically; `Dataset` iterates named graphs in name order.
//!
//! # Example
//!
//! ```
//! use quarry_graph_ir::{Graph, Term};
//!
//! let mut graph = Graph::new();
//! graph.add_triple(
//!     Term::iri("http://example.org/alice"),
//!     Term::iri("http://xmlns.com/foaf/0.1/name"),
//!     Term::string("Alice"),
//! );
//! graph.sort();
//! ```

pub mod datatype;
mod dataset;
mod graph;
mod term;
mod triple;

pub use dataset::Dataset;
pub use datatype::Datatype;
pub use graph::Graph;
pub use term::{BlankId, LiteralValue, Term};
pub use triple::Triple;
