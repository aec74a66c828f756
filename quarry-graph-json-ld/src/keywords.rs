//! JSON-LD keyword set and shared value predicates

use serde_json::Value as JsonValue;

/// The fixed JSON-LD 1.0 keyword set
pub const KEYWORDS: &[&str] = &[
    "@context",
    "@id",
    "@value",
    "@language",
    "@type",
    "@container",
    "@list",
    "@set",
    "@reverse",
    "@index",
    "@base",
    "@vocab",
    "@graph",
    "@none",
];

/// Check if a string is a JSON-LD keyword
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Check if a string has keyword form (`@` followed by a letter)
///
/// Such tokens are reserved even when they are not in the keyword set.
pub fn is_keyword_like(s: &str) -> bool {
    s.len() > 1
        && s.starts_with('@')
        && s[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Check if a string is a blank node identifier (`_:` prefix)
pub fn is_blank_node_id(s: &str) -> bool {
    s.starts_with("_:")
}

/// Check if a JSON value is a scalar (string, number, or boolean)
pub fn is_scalar(v: &JsonValue) -> bool {
    matches!(
        v,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
    )
}

/// Check if an expanded item is a value object (contains `@value`)
pub fn is_value_object(v: &JsonValue) -> bool {
    matches!(v, JsonValue::Object(m) if m.contains_key("@value"))
}

/// Check if an expanded item is a list object (contains `@list`)
pub fn is_list_object(v: &JsonValue) -> bool {
    matches!(v, JsonValue::Object(m) if m.contains_key("@list"))
}
