use crate::core::record::{describe, type_name};
use crate::core::{Record, Result, StoreError};
use serde_json::Value;
use std::fmt;

pub type Changer<'a> = Box<dyn Fn(Record) -> Record + 'a>;

/// Modification applied by `update` and `update_all`.
pub enum Changes<'a> {
    /// Overwrite the given fields, keeping the rest.
    Merge(Record),
    /// Replace the record with whatever the function returns.
    Apply(Changer<'a>),
}

impl<'a> Changes<'a> {
    pub fn merge(fields: Record) -> Self {
        Self::Merge(fields)
    }

    pub fn apply<F>(f: F) -> Self
    where
        F: Fn(Record) -> Record + 'a,
    {
        Self::Apply(Box::new(f))
    }

    /// The record as it reads after these changes. `record` itself is left
    /// untouched, so a panicking function cannot leave it half-changed.
    pub(crate) fn applied(&self, record: &Record) -> Record {
        match self {
            Self::Merge(fields) => {
                let mut updated = record.clone();
                for (key, value) in fields {
                    updated.insert(key.clone(), value.clone());
                }
                updated
            }
            Self::Apply(f) => f(record.clone()),
        }
    }
}

impl fmt::Debug for Changes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge(fields) => f.debug_tuple("Merge").field(fields).finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

pub trait IntoChanges<'a> {
    fn into_changes(self, method: &str) -> Result<Changes<'a>>;
}

impl<'a> IntoChanges<'a> for Changes<'a> {
    fn into_changes(self, _method: &str) -> Result<Changes<'a>> {
        Ok(self)
    }
}

impl<'a> IntoChanges<'a> for Record {
    fn into_changes(self, _method: &str) -> Result<Changes<'a>> {
        Ok(Changes::Merge(self))
    }
}

impl<'a> IntoChanges<'a> for Value {
    fn into_changes(self, method: &str) -> Result<Changes<'a>> {
        match self {
            Value::Object(fields) => Ok(Changes::Merge(fields)),
            other => Err(StoreError::InvalidArgument(format!(
                "Incorrect 2nd argument given to {method}(): expected an object or a function, \
                 got {} {}",
                type_name(&other),
                describe(&other)
            ))),
        }
    }
}
