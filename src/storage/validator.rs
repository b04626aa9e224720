//! Argument validation shared by the store and its collection handles.

use crate::core::record::describe;
use crate::core::{Record, Result, StoreError};
use serde_json::Value;

/// Validates a table name: a non-empty identifier of letters, digits and
/// underscores that does not start with a digit.
pub fn validate_table_name(name: &str, max_len: usize) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(StoreError::InvalidTableName(
            "Table name cannot be empty".to_string(),
        ));
    };

    if !first.is_alphabetic() && first != '_' {
        return Err(StoreError::InvalidTableName(format!(
            "'{}' must start with a letter or underscore",
            name
        )));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidTableName(format!(
            "'{}' can only contain letters, numbers, and underscores",
            name
        )));
    }

    if name.chars().count() > max_len {
        return Err(StoreError::InvalidTableName(format!(
            "'{}' is too long (max {} characters)",
            name, max_len
        )));
    }

    Ok(())
}

/// Checks that `data` is a plain record or a sequence of plain records and
/// returns owned copies of them, in order.
///
/// Nothing is returned unless every element passes, so callers can append
/// the result without risking a partial insert.
pub fn plain_records(data: &Value, table: &str) -> Result<Vec<Record>> {
    let invalid = || not_a_record(data, table);

    match data {
        Value::Object(record) => Ok(vec![record.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().cloned().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

pub fn not_a_record(data: &Value, table: &str) -> StoreError {
    StoreError::InvalidArgument(format!(
        "add() only takes a plain object or an array of plain objects. \
         Errored whilst trying to add '{}' to '{}'",
        describe(data),
        table
    ))
}
