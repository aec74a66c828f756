use serde_json::Value as JsonValue;
use thiserror::Error;

/// Conversion errors.
///
/// Every error aborts the current conversion; no partial results are
/// returned. Variants carry the offending JSON fragment for diagnostics.
#[derive(Error, Debug)]
pub enum JsonLdError {
    #[error("Invalid context: {message}")]
    ContextError { message: String },

    #[error("A list of lists is not allowed: {fragment}")]
    ListOfLists { fragment: JsonValue },

    #[error("Keyword '{keyword}' is not allowed inside an @reverse value")]
    InvalidReversePropertyMap { keyword: String },

    #[error("Two keys expand to the same keyword '{keyword}'")]
    CollidingKeywords { keyword: String },

    #[error("@id value must be a string: {fragment}")]
    InvalidIdValue { fragment: JsonValue },

    #[error("@type value must be a string or array of strings: {fragment}")]
    InvalidTypeValue { fragment: JsonValue },

    #[error("@value must be a scalar or null: {fragment}")]
    InvalidValueObjectValue { fragment: JsonValue },

    #[error("@language value must be a string: {fragment}")]
    InvalidLanguageTaggedString { fragment: JsonValue },

    #[error("@index value must be a string: {fragment}")]
    InvalidIndexValue { fragment: JsonValue },

    #[error("@reverse value must be an object: {fragment}")]
    InvalidReverseValue { fragment: JsonValue },

    #[error("Value objects and list objects cannot be used as reverse property values: {fragment}")]
    InvalidReversePropertyValue { fragment: JsonValue },

    #[error("Language map values must be strings: {fragment}")]
    InvalidLanguageMapValue { fragment: JsonValue },

    #[error("Invalid value object: {fragment}")]
    InvalidValueObject { fragment: JsonValue },

    #[error("A language-tagged @value must be a string: {fragment}")]
    InvalidLanguageTaggedValue { fragment: JsonValue },

    #[error("@value has a non-IRI @type: {fragment}")]
    InvalidTypedValue { fragment: JsonValue },

    #[error("@set or @list object with disallowed keys: {fragment}")]
    InvalidSetOrListObject { fragment: JsonValue },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JsonLdError>;
