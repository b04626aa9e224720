// ============================================================================
// ElephantDB Library
// ============================================================================

//! In-process, in-memory record store.
//!
//! A [`Store`] owns a fixed set of named tables, each an ordered sequence of
//! plain JSON records. All reads and writes go through a [`Collection`]
//! handle bound to one table:
//!
//! ```
//! use elephantdb::{Changes, Query, Store};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(["dogs"]);
//! let dogs = store.select("dogs")?;
//!
//! dogs.add(json!({"id": 5, "name": "Bruce", "age": 2}))?;
//! dogs.add(json!({"id": 3, "name": "Olive", "age": 4}))?;
//!
//! let bruce = dogs.find(json!({"name": "Bruce"}))?.expect("Bruce was added");
//! assert_eq!(bruce["id"], json!(5));
//!
//! let olive = dogs.update(json!({"id": 3}), json!({"age": 6}))?;
//! assert_eq!(olive["age"], json!(6));
//!
//! let young = dogs.find_all(Query::predicate(|d| d["age"].as_i64() < Some(5)))?;
//! assert_eq!(young.len(), 1);
//!
//! dogs.update_all(Query::all(), Changes::apply(|mut d| {
//!     d.insert("good".into(), json!(true));
//!     d
//! }))?;
//! assert_eq!(store.dump()?["dogs"].len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Records are copied on the way in and on the way out, so nothing a caller
//! holds ever aliases stored data.

pub mod config;
pub mod core;
pub mod query;
pub mod storage;

pub use crate::config::StoreConfig;
pub use crate::core::{Dump, Record, Result, StoreError};
pub use crate::query::{Changes, IntoChanges, IntoQuery, Query};
pub use crate::storage::{Collection, Store};
