//! Record selection.
//!
//! A query is either a predicate closure or a "shape": a partial record whose
//! every field must be deeply equal to the candidate's field of the same name.
//! Extra fields on the candidate are ignored, so the empty shape matches
//! everything.

use crate::core::record::{describe, type_name};
use crate::core::{Record, Result, StoreError, values_equal};
use serde_json::Value;
use std::fmt;

pub type Predicate<'a> = Box<dyn Fn(&Record) -> bool + 'a>;

pub enum Query<'a> {
    Predicate(Predicate<'a>),
    Shape(Record),
}

impl<'a> Query<'a> {
    /// Matches every record.
    pub fn all() -> Self {
        Self::Shape(Record::new())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + 'a,
    {
        Self::Predicate(Box::new(f))
    }

    pub fn shape(shape: Record) -> Self {
        Self::Shape(shape)
    }

    pub fn matches(&self, candidate: &Record) -> bool {
        match self {
            Self::Predicate(f) => f(candidate),
            Self::Shape(shape) => shape.iter().all(|(key, expected)| {
                candidate
                    .get(key)
                    .is_some_and(|actual| values_equal(actual, expected))
            }),
        }
    }

    pub fn matches_everything(&self) -> bool {
        matches!(self, Self::Shape(shape) if shape.is_empty())
    }
}

impl Default for Query<'_> {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => write!(f, "<predicate>"),
            Self::Shape(shape) => write!(f, "{}", describe(&Value::Object(shape.clone()))),
        }
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
        }
    }
}

/// Conversion of a caller-supplied argument into a [`Query`].
///
/// `method` is the public operation name and only feeds the error message.
pub trait IntoQuery<'a> {
    fn into_query(self, method: &str) -> Result<Query<'a>>;
}

impl<'a> IntoQuery<'a> for Query<'a> {
    fn into_query(self, _method: &str) -> Result<Query<'a>> {
        Ok(self)
    }
}

impl<'a> IntoQuery<'a> for Record {
    fn into_query(self, _method: &str) -> Result<Query<'a>> {
        Ok(Query::Shape(self))
    }
}

impl<'a> IntoQuery<'a> for Value {
    fn into_query(self, method: &str) -> Result<Query<'a>> {
        match self {
            Value::Object(shape) => Ok(Query::Shape(shape)),
            other => Err(StoreError::InvalidArgument(format!(
                "Incorrect query argument given to {method}(). The {method} method either takes \
                 an object or a function as a query, got {} {}",
                type_name(&other),
                describe(&other)
            ))),
        }
    }
}
