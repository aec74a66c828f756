//! RDF datatype representation
//!
//! Datatypes are always explicit in this IR - there is no "untyped" literal.
//! Plain strings default to `xsd:string`, and language-tagged strings use
//! `rdf:langString`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Common XSD and RDF datatype IRIs (re-exported from vocab crate)
pub mod iri {
    pub use quarry_vocab::rdf::{
        FIRST as RDF_FIRST, LANG_STRING as RDF_LANG_STRING, NIL as RDF_NIL, REST as RDF_REST,
        TYPE as RDF_TYPE,
    };
    pub use quarry_vocab::xsd::{
        BOOLEAN as XSD_BOOLEAN, DATE as XSD_DATE, DATE_TIME as XSD_DATE_TIME,
        DECIMAL as XSD_DECIMAL, DOUBLE as XSD_DOUBLE, INTEGER as XSD_INTEGER, LONG as XSD_LONG,
        STRING as XSD_STRING,
    };
}

/// RDF literal datatype (always an expanded IRI)
///
/// Use `Datatype::xsd_string()` for plain strings,
/// `Datatype::rdf_lang_string()` for language-tagged strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Datatype(Arc<str>);

impl Datatype {
    /// Create a datatype from an expanded IRI
    pub fn from_iri(iri: impl AsRef<str>) -> Self {
        Datatype(Arc::from(iri.as_ref()))
    }

    /// xsd:string - default for plain string literals
    pub fn xsd_string() -> Self {
        Self::from_iri(iri::XSD_STRING)
    }

    /// xsd:boolean
    pub fn xsd_boolean() -> Self {
        Self::from_iri(iri::XSD_BOOLEAN)
    }

    /// xsd:integer
    pub fn xsd_integer() -> Self {
        Self::from_iri(iri::XSD_INTEGER)
    }

    /// xsd:double
    pub fn xsd_double() -> Self {
        Self::from_iri(iri::XSD_DOUBLE)
    }

    /// xsd:decimal
    pub fn xsd_decimal() -> Self {
        Self::from_iri(iri::XSD_DECIMAL)
    }

    /// rdf:langString - for language-tagged literals
    pub fn rdf_lang_string() -> Self {
        Self::from_iri(iri::RDF_LANG_STRING)
    }

    /// Get the IRI representation of this datatype
    pub fn as_iri(&self) -> &str {
        &self.0
    }

    /// Check if this is the xsd:string datatype
    pub fn is_xsd_string(&self) -> bool {
        self.0.as_ref() == iri::XSD_STRING
    }

    /// Check if this is the rdf:langString datatype
    pub fn is_lang_string(&self) -> bool {
        self.0.as_ref() == iri::RDF_LANG_STRING
    }

    /// Check if this is a numeric type (integer, long, double, decimal)
    pub fn is_numeric(&self) -> bool {
        quarry_vocab::xsd::is_numeric_datatype(&self.0)
    }
}

impl PartialEq for Datatype {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Datatype {}

impl Hash for Datatype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Datatype {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datatype {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
