//! Value expansion
//!
//! Turns a scalar into a value object (or node reference) using the active
//! property's term definition.

use crate::context::{Context, LanguageMapping};
use crate::iri::expand_iri;
use serde_json::{json, Value as JsonValue};

/// Expand a scalar value under the given active property.
///
/// Tie-break order: an `@id`/`@vocab` type mapping turns strings into node
/// references; any other type mapping attaches `@type`; strings then pick up
/// a language from the term definition or the context default; everything
/// else becomes a bare `@value` object.
///
/// An explicit null language mapping on the term suppresses the context
/// default language (JSON-LD 1.0 value expansion, step 5).
pub fn expand_value(ctx: &Context, active_property: &str, value: &JsonValue) -> JsonValue {
    let def = ctx.term(active_property);
    let type_mapping = def.and_then(|d| d.type_mapping.as_deref());

    if let JsonValue::String(s) = value {
        match type_mapping {
            Some("@id") => {
                return json!({"@id": expand_iri(s, ctx, true, false)
                    .unwrap_or_else(|| s.clone())});
            }
            Some("@vocab") => {
                return json!({"@id": expand_iri(s, ctx, true, true)
                    .unwrap_or_else(|| s.clone())});
            }
            _ => {}
        }
    }

    if let Some(t) = type_mapping {
        if t != "@id" && t != "@vocab" {
            return json!({"@value": value, "@type": t});
        }
    }

    if value.is_string() {
        let language = match def.map(|d| &d.language_mapping) {
            Some(LanguageMapping::Tag(tag)) => Some(tag.to_lowercase()),
            Some(LanguageMapping::Null) => None,
            _ => ctx.default_language().map(str::to_lowercase),
        };
        if let Some(language) = language {
            return json!({"@value": value, "@language": language});
        }
    }

    json!({"@value": value})
}
