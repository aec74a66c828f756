//! IRI predicates and the IRI expansion helper
//!
//! IRI expansion resolves a term, compact IRI, or relative IRI against the
//! active context. `vocab` controls whether term definitions and the
//! vocabulary mapping apply (property and type positions); `document_relative`
//! controls resolution against the base IRI (`@id` positions).

use crate::context::Context;
use crate::keywords::{is_blank_node_id, is_keyword};

/// Parse a compact IRI like "schema:name" into (prefix, suffix).
///
/// Returns None when the string is not CURIE-shaped:
/// - no colon at all
/// - the prefix contains `/` (an absolute IRI like `http://...`)
/// - the suffix starts with `//` (authority part of an absolute IRI)
pub fn parse_prefix(s: &str) -> Option<(&str, &str)> {
    let colon = s.find(':')?;
    let (prefix, suffix) = (&s[..colon], &s[colon + 1..]);
    if prefix.contains('/') || suffix.starts_with("//") || prefix.is_empty() {
        return None;
    }
    Some((prefix, suffix))
}

/// Returns true if the IRI is absolute (has an RFC 3986 scheme).
///
/// An absolute IRI starts with a scheme: `ALPHA *( ALPHA / DIGIT / "+" /
/// "-" / "." ) ":"`. This handles all schemes (http, urn, did, mailto, ...)
/// without a hardcoded list.
pub fn is_absolute(iri: &str) -> bool {
    match iri.find(':') {
        Some(colon) => {
            let scheme = &iri[..colon];
            !scheme.is_empty()
                && scheme.as_bytes()[0].is_ascii_alphabetic()
                && scheme
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
        }
        None => false,
    }
}

/// Returns true for strings that are neither absolute IRIs nor blank node
/// identifiers.
pub fn is_relative(s: &str) -> bool {
    !is_absolute(s) && !is_blank_node_id(s)
}

/// Join a base IRI with a relative reference.
///
/// Fragments append to the base (with any trailing slash trimmed); absolute
/// references pass through; other relative references append after ensuring
/// the base ends with `/` or `#`.
pub fn join(base: &str, relative: &str) -> String {
    if relative.starts_with('#') {
        format!("{}{}", base.trim_end_matches('/'), relative)
    } else if is_absolute(relative) {
        relative.to_string()
    } else if base.ends_with('/') || base.ends_with('#') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

/// Expand a term, compact IRI, or relative IRI against the active context.
///
/// Returns `None` when the value maps to an explicitly nulled term
/// definition; otherwise the expanded string (which callers must still test
/// for IRI-ness: an unmapped term comes back unchanged).
pub fn expand_iri(
    value: &str,
    ctx: &Context,
    document_relative: bool,
    vocab: bool,
) -> Option<String> {
    if is_keyword(value) {
        return Some(value.to_string());
    }

    // Exact term match applies in vocab positions
    if vocab {
        match ctx.raw_term(value) {
            Some(Some(def)) => return Some(def.iri_mapping.clone()),
            Some(None) => return None,
            None => {}
        }
    }

    if value.contains(':') {
        // Blank node ids and absolute IRIs pass through; CURIEs resolve
        // through their prefix's term definition.
        if let Some((prefix, suffix)) = parse_prefix(value) {
            if prefix == "_" {
                return Some(value.to_string());
            }
            if let Some(Some(def)) = ctx.raw_term(prefix) {
                return Some(format!("{}{}", def.iri_mapping, suffix));
            }
        }
        return Some(value.to_string());
    }

    if vocab {
        if let Some(vocab_iri) = ctx.vocab_mapping() {
            return Some(format!("{}{}", vocab_iri, value));
        }
    }

    if document_relative {
        if let Some(base) = ctx.base_iri() {
            return Some(join(base, value));
        }
    }

    Some(value.to_string())
}
