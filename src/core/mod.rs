pub mod error;
pub mod record;

pub use error::{Result, StoreError};
pub use record::{Dump, Record, records_equal, values_equal};
