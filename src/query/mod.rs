//! Query and update arguments.
//!
//! - `query.rs` - predicate / shape selection
//! - `changes.rs` - merge / function updates

mod changes;
mod query;

pub use changes::{Changer, Changes, IntoChanges};
pub use query::{IntoQuery, Predicate, Query};
