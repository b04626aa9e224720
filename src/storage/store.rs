use super::collection::Collection;
use super::table::{Table, TableHandle};
use super::validator::validate_table_name;
use crate::config::StoreConfig;
use crate::core::{Dump, Result, StoreError};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory store of named tables.
///
/// The table set is fixed at construction, so the name map needs no lock;
/// each table has its own. Cloning a `Store` is cheap and yields another
/// handle onto the same tables.
#[derive(Clone)]
pub struct Store {
    tables: Arc<BTreeMap<String, TableHandle>>,
    config: StoreConfig,
}

impl Store {
    /// Create a store with an empty table for each name.
    ///
    /// Repeated names collapse into a single table.
    ///
    /// ```
    /// use elephantdb::Store;
    ///
    /// let store = Store::new(["dogs", "cats"]);
    /// assert!(store.table_exists("dogs"));
    /// ```
    pub fn new<I, S>(table_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables: BTreeMap<String, TableHandle> = table_names
            .into_iter()
            .map(|name| (name.into(), Table::handle()))
            .collect();

        debug!("Created store with {} table(s)", tables.len());

        Self {
            tables: Arc::new(tables),
            config: StoreConfig::default(),
        }
    }

    /// Create a store with custom configuration, validating table names
    /// when the configuration asks for it.
    pub fn with_config<I, S>(table_names: I, config: StoreConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = BTreeMap::new();
        for name in table_names {
            let name = name.into();
            if config.validate_table_names {
                validate_table_name(&name, config.max_table_name_len)?;
            }
            tables.insert(name, Table::handle());
        }

        debug!(
            "Created store with {} table(s), lazy_select={}",
            tables.len(),
            config.lazy_select
        );

        Ok(Self {
            tables: Arc::new(tables),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get a handle bound to `table_name`.
    ///
    /// Fails with `TableNotFound` for an undeclared name unless the store
    /// was configured with `lazy_select`.
    pub fn select(&self, table_name: &str) -> Result<Collection> {
        let table = self.tables.get(table_name).cloned();
        if table.is_none() && !self.config.lazy_select {
            return Err(StoreError::TableNotFound(table_name.to_string()));
        }

        Ok(Collection::new(
            table_name.to_string(),
            table,
            self.config.max_commit_attempts,
        ))
    }

    /// Deep copy of every table, independent of the live store.
    ///
    /// Tables are copied one at a time; each table's copy is consistent on
    /// its own.
    pub fn dump(&self) -> Result<Dump> {
        let mut dump = Dump::new();
        for (name, table) in self.tables.iter() {
            let table = table.read()?;
            dump.insert(name.clone(), table.rows().to_vec());
        }
        Ok(dump)
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in sorted order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}
