//! RDF triple (statement)
//!
//! A triple represents a single RDF statement: subject-predicate-object.
//! Ordered collections are represented as real `rdf:first`/`rdf:rest` chains
//! of triples, not positional metadata.

use crate::Term;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An RDF triple (subject-predicate-object)
///
/// # Invariants
///
/// - Subject can be IRI or blank node (not literal)
/// - Predicate must be IRI (blank nodes only under generalized RDF)
/// - Object can be IRI, blank node, or literal
///
/// These invariants are not enforced at construction time; the conversion
/// engine guarantees them for the triples it emits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject (IRI or blank node)
    pub s: Term,
    /// Predicate (IRI)
    pub p: Term,
    /// Object (IRI, blank node, or literal)
    pub o: Term,
}

impl Triple {
    /// Create a new triple
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o }
    }

    /// Get the subject
    pub fn subject(&self) -> &Term {
        &self.s
    }

    /// Get the predicate
    pub fn predicate(&self) -> &Term {
        &self.p
    }

    /// Get the object
    pub fn object(&self) -> &Term {
        &self.o
    }

    /// Check if the predicate is rdf:type
    pub fn is_rdf_type(&self) -> bool {
        matches!(&self.p, Term::Iri(iri) if iri.as_ref() == quarry_vocab::rdf::TYPE)
    }
}

impl PartialOrd for Triple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Triple {
    /// SPO ordering for deterministic sorted output
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.s, &self.p, &self.o).cmp(&(&other.s, &other.p, &other.o))
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.s, self.p, self.o)
    }
}
