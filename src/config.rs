/// Store configuration
///
/// Built with chained setters:
///
/// ```
/// use elephantdb::StoreConfig;
///
/// let config = StoreConfig::new()
///     .validate_table_names(true)
///     .max_table_name_len(32);
/// assert!(config.validate_table_names);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Reject table names that are not identifiers at construction
    pub validate_table_names: bool,

    /// Longest accepted table name when validation is on
    pub max_table_name_len: usize,

    /// Let `select` hand out handles for undeclared tables, which then
    /// read as empty instead of failing
    pub lazy_select: bool,

    /// How many times a write re-runs its query against a fresh snapshot
    /// when the table changed underneath it before giving up
    pub max_commit_attempts: usize,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            validate_table_names: false,
            max_table_name_len: 64,
            lazy_select: false,
            max_commit_attempts: 16,
        }
    }

    /// Turn table name validation on or off
    pub fn validate_table_names(mut self, validate: bool) -> Self {
        self.validate_table_names = validate;
        self
    }

    /// Set the maximum table name length
    pub fn max_table_name_len(mut self, len: usize) -> Self {
        self.max_table_name_len = len;
        self
    }

    /// Set the retry bound for writes racing other writers
    pub fn max_commit_attempts(mut self, attempts: usize) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    /// Treat undeclared tables as empty on `select`
    pub fn lazy_select(mut self, lazy: bool) -> Self {
        self.lazy_select = lazy;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
