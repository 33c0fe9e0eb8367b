use std::any::type_name;

use serde::de::DeserializeOwned;
use serde_json::Value;

use context_error::*;

/// Custom JSON parser, needed to allow backwards compatibility to older version of JSON formats.
pub trait ParseJson: Sized {
    /// Parse a JSON value element into this structure
    /// # Errors
    /// If the JSON is not valid to the format
    fn from_json_value(value: Value) -> Result<Self, BoxedError<'static, BasicKind>>;

    /// Parse a string containing JSON into this structure
    /// # Errors
    /// If the JSON is not valid to the format
    fn from_json(value: &str) -> Result<Self, BoxedError<'static, BasicKind>> {
        let value = serde_json::from_str::<Value>(value).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                format!("Invalid JSON (for {})", type_name::<Self>()),
                err.to_string(),
                Context::show(value.to_string()),
            )
        })?;
        Self::from_json_value(value)
    }
}

/// Parse a JSON value element into this structure using the serde JSON parser
/// # Errors
/// If the JSON is not valid to the format
#[expect(clippy::needless_pass_by_value)]
pub fn use_serde<T: DeserializeOwned>(value: Value) -> Result<T, BoxedError<'static, BasicKind>> {
    serde_json::from_value(value.clone()).map_err(|err| {
        BoxedError::new(
            BasicKind::Error,
            format!("Could not parse JSON into {}", type_name::<T>()),
            err.to_string(),
            Context::show(value.to_string()),
        )
    })
}

/// Parse a JSON array leniently, every element that could not be parsed is skipped and its error is returned separately
/// # Errors
/// If the JSON value is not an array
pub fn lenient_array<T: ParseJson>(
    value: Value,
) -> Result<(Vec<T>, Vec<BoxedError<'static, BasicKind>>), BoxedError<'static, BasicKind>> {
    if let Value::Array(array) = value {
        let mut errors = Vec::new();
        let mut result = Vec::with_capacity(array.len());
        for element in array {
            match T::from_json_value(element) {
                Ok(element) => result.push(element),
                Err(err) => errors.push(err),
            }
        }
        Ok((result, errors))
    } else {
        Err(BoxedError::new(
            BasicKind::Error,
            format!("Could not parse JSON into a list of {}", type_name::<T>()),
            "The JSON value has to be an array",
            Context::show(value.to_string()),
        ))
    }
}
