pub mod collection;
pub mod store;
mod table;
pub mod validator;

pub use collection::Collection;
pub use store::Store;
