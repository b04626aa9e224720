use super::table::{Edit, TableHandle};
use super::validator::{not_a_record, plain_records};
use crate::core::{Record, Result, StoreError};
use crate::query::{IntoChanges, IntoQuery};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Handle onto one table of a [`Store`](super::Store).
///
/// The handle owns no records. Every call goes to the store's table, so all
/// handles on the same table see each other's writes immediately. Records
/// cross the boundary by copy in both directions.
///
/// Queries and change functions never run under a lock. Reads evaluate them
/// over a snapshot; writes do the same and then commit the resulting edit
/// only if the table is still at the version the snapshot was taken from,
/// retrying otherwise. A predicate may therefore read from any table,
/// including its own, and may be called more than once per record when
/// other writers race it.
#[derive(Clone)]
pub struct Collection {
    name: String,
    /// `None` for an undeclared table handed out by a lazy `select`
    table: Option<TableHandle>,
    max_commit_attempts: usize,
}

impl Collection {
    pub(crate) fn new(name: String, table: Option<TableHandle>, max_commit_attempts: usize) -> Self {
        Self {
            name,
            table,
            max_commit_attempts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> Result<&TableHandle> {
        self.table
            .as_ref()
            .ok_or_else(|| StoreError::TableNotFound(self.name.clone()))
    }

    /// Copy of the rows and the version they were read at. An undeclared
    /// table reads as empty.
    fn snapshot(&self) -> Result<(Vec<Record>, u64)> {
        match &self.table {
            Some(table) => Ok(table.read()?.snapshot()),
            None => Ok((Vec::new(), 0)),
        }
    }

    /// Runs `prepare` over a snapshot with no lock held and commits the edit
    /// it returns if nobody wrote to the table in between.
    fn modify<R>(
        &self,
        method: &str,
        prepare: impl Fn(&[Record]) -> Result<(Edit, R)>,
    ) -> Result<R> {
        for _ in 0..self.max_commit_attempts {
            let (rows, version) = self.snapshot()?;
            let (edit, result) = prepare(&rows)?;
            if edit.is_empty() {
                return Ok(result);
            }

            let mut table = self.table()?.write()?;
            if table.version() == version {
                debug!("{}: changed {} record(s) in '{}'", method, edit.len(), self.name);
                table.apply(edit);
                return Ok(result);
            }
            debug!("{}: '{}' changed while preparing, retrying", method, self.name);
        }

        Err(StoreError::Conflict(format!(
            "{}() gave up on '{}' after {} attempt(s); the table kept changing",
            method, self.name, self.max_commit_attempts
        )))
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Append a record, or an array of records, to the table.
    ///
    /// Every element must be a JSON object; if any is not, nothing is
    /// inserted. The caller's value is handed back unchanged; the table keeps
    /// its own copy.
    ///
    /// ```
    /// use elephantdb::Store;
    /// use serde_json::json;
    ///
    /// let dogs = Store::new(["dogs"]).select("dogs")?;
    /// let added = dogs.add(json!([{"name": "Bruce"}, {"name": "Winston"}]))?;
    /// assert_eq!(added, json!([{"name": "Bruce"}, {"name": "Winston"}]));
    /// assert_eq!(dogs.count()?, 2);
    /// # Ok::<(), elephantdb::StoreError>(())
    /// ```
    pub fn add(&self, data: Value) -> Result<Value> {
        let records = plain_records(&data, &self.name)?;
        self.append(records)?;
        Ok(data)
    }

    pub fn add_record(&self, record: Record) -> Result<Record> {
        self.append(vec![record.clone()])?;
        Ok(record)
    }

    pub fn add_records(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        self.append(records.clone())?;
        Ok(records)
    }

    /// Serialize `value` and append it. It must serialize to a JSON object.
    pub fn add_serialized<T: Serialize>(&self, value: &T) -> Result<Record> {
        match serde_json::to_value(value)? {
            Value::Object(record) => self.add_record(record),
            other => Err(not_a_record(&other, &self.name)),
        }
    }

    fn append(&self, records: Vec<Record>) -> Result<()> {
        // Tables are never created after construction, lazy or not.
        let mut table = self.table()?.write()?;

        debug!("add: appending {} record(s) to '{}'", records.len(), self.name);
        table.append(records);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// First record matching `query`, in insertion order.
    pub fn find<'q>(&self, query: impl IntoQuery<'q>) -> Result<Option<Record>> {
        let query = query.into_query("find")?;
        let (rows, _) = self.snapshot()?;
        Ok(rows.into_iter().find(|r| query.matches(r)))
    }

    /// Every record matching `query`, in insertion order.
    /// Pass [`Query::all()`](crate::Query::all) or `json!({})` to get the
    /// whole table.
    pub fn find_all<'q>(&self, query: impl IntoQuery<'q>) -> Result<Vec<Record>> {
        let query = query.into_query("findAll")?;
        let (rows, _) = self.snapshot()?;
        if query.matches_everything() {
            return Ok(rows);
        }
        Ok(rows.into_iter().filter(|r| query.matches(r)).collect())
    }

    pub fn find_as<'q, T: DeserializeOwned>(&self, query: impl IntoQuery<'q>) -> Result<Option<T>> {
        self.find(query)?
            .map(|record| serde_json::from_value(Value::Object(record)))
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn find_all_as<'q, T: DeserializeOwned>(&self, query: impl IntoQuery<'q>) -> Result<Vec<T>> {
        self.find_all(query)?
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(StoreError::from))
            .collect()
    }

    pub fn count(&self) -> Result<usize> {
        match &self.table {
            Some(table) => Ok(table.read()?.rows().len()),
            None => Ok(0),
        }
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Apply `changes` to the first record matching `query` and return a copy
    /// of the result.
    ///
    /// Unlike `find` and `delete`, finding nothing is an error.
    pub fn update<'q, 'c>(
        &self,
        query: impl IntoQuery<'q>,
        changes: impl IntoChanges<'c>,
    ) -> Result<Record> {
        let query = query.into_query("update")?;
        let changes = changes.into_changes("update")?;

        self.modify("update", |rows| {
            let i = rows.iter().position(|r| query.matches(r)).ok_or_else(|| {
                StoreError::NotFound(format!(
                    "update() found no record in '{}' to update for query {}",
                    self.name, query
                ))
            })?;

            let updated = changes.applied(&rows[i]);
            Ok((Edit::Replace(vec![(i, updated.clone())]), updated))
        })
    }

    /// Apply `changes` to every record matching `query`. Matching is decided
    /// before any record is changed. Returns copies of the updated records,
    /// or an empty vector when nothing matched.
    pub fn update_all<'q, 'c>(
        &self,
        query: impl IntoQuery<'q>,
        changes: impl IntoChanges<'c>,
    ) -> Result<Vec<Record>> {
        let query = query.into_query("updateAll")?;
        let changes = changes.into_changes("updateAll")?;

        self.modify("updateAll", |rows| {
            let replaced: Vec<(usize, Record)> = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| query.matches(r))
                .map(|(i, r)| (i, changes.applied(r)))
                .collect();

            let updated: Vec<Record> = replaced.iter().map(|(_, r)| r.clone()).collect();
            Ok((Edit::Replace(replaced), updated))
        })
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Remove the first record matching `query` and return it, or `None` if
    /// nothing matched. Only that one occurrence is removed, even when other
    /// records are structurally equal to it.
    pub fn delete<'q>(&self, query: impl IntoQuery<'q>) -> Result<Option<Record>> {
        let query = query.into_query("delete")?;

        self.modify("delete", |rows| {
            Ok(match rows.iter().position(|r| query.matches(r)) {
                Some(i) => (Edit::Remove(vec![i]), Some(rows[i].clone())),
                None => (Edit::Remove(Vec::new()), None),
            })
        })
    }

    /// Remove every record matching `query` and return them in table order.
    pub fn delete_all<'q>(&self, query: impl IntoQuery<'q>) -> Result<Vec<Record>> {
        let query = query.into_query("deleteAll")?;

        self.modify("deleteAll", |rows| {
            let (positions, removed): (Vec<usize>, Vec<Record>) = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| query.matches(r))
                .map(|(i, r)| (i, r.clone()))
                .unzip();

            Ok((Edit::Remove(positions), removed))
        })
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("declared", &self.table.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Store;
    use super::*;
    use crate::config::StoreConfig;
    use crate::query::{Changes, Query};
    use serde_json::json;

    fn dogs() -> Collection {
        let dogs = Store::new(["dogs"]).select("dogs").unwrap();
        dogs.add(json!([
            {"id": 5, "name": "Bruce", "age": 2},
            {"id": 3, "name": "Olive", "age": 4}
        ]))
        .unwrap();
        dogs
    }

    #[test]
    fn test_add_is_all_or_nothing() {
        let dogs = dogs();
        let err = dogs.add(json!([{"id": 9}, "nope"])).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(dogs.count().unwrap(), 2);
    }

    #[test]
    fn test_add_records_keeps_order() {
        let dogs = dogs();
        let fresh: Vec<Record> = vec![
            json!({"id": 1}).as_object().cloned().unwrap(),
            json!({"id": 2}).as_object().cloned().unwrap(),
        ];
        dogs.add_records(fresh).unwrap();

        let ids: Vec<i64> = dogs
            .find_all(Query::all())
            .unwrap()
            .iter()
            .map(|d| d["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![5, 3, 1, 2]);
    }

    #[test]
    fn test_update_all_matches_before_changing() {
        let dogs = dogs();
        // Bumping age could make Bruce match again; he must be changed once.
        let updated = dogs
            .update_all(
                Query::predicate(|d| d["age"].as_i64().is_some_and(|a| a < 4)),
                Changes::apply(|mut d| {
                    let age = d["age"].as_i64().unwrap();
                    d.insert("age".into(), json!(age + 1));
                    d
                }),
            )
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(dogs.find(json!({"id": 5})).unwrap().unwrap()["age"], json!(3));
    }

    #[test]
    fn test_delete_all_keeps_order_of_rest() {
        let dogs = dogs();
        dogs.add(json!({"id": 8, "name": "Poppy", "age": 1})).unwrap();

        let removed = dogs.delete_all(json!({"id": 3})).unwrap();
        assert_eq!(removed.len(), 1);

        let names: Vec<String> = dogs
            .find_all(Query::all())
            .unwrap()
            .into_iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Bruce", "Poppy"]);
    }

    #[test]
    fn test_write_racing_its_own_table_retries_then_gives_up() {
        let store = Store::with_config(["dogs"], StoreConfig::new().max_commit_attempts(3)).unwrap();
        let dogs = store.select("dogs").unwrap();
        dogs.add(json!({"id": 1})).unwrap();

        // Every evaluation writes to the table, so no snapshot survives.
        let writer = dogs.clone();
        let err = dogs
            .update(
                Query::predicate(move |_| writer.add(json!({"id": 2})).is_ok()),
                json!({"id": 3}),
            )
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(err.to_string().contains("update()"));
        assert!(dogs.find(json!({"id": 3})).unwrap().is_none());
    }

    #[test]
    fn test_write_commits_after_one_retry() {
        let dogs = dogs();
        let writer = dogs.clone();
        let raced = std::cell::Cell::new(false);

        // The first evaluation sneaks in a write; the second sees it.
        let updated = dogs
            .update(
                Query::predicate(|d| {
                    if !raced.replace(true) {
                        writer.add(json!({"id": 7, "name": "Poppy"})).unwrap();
                    }
                    d["id"] == 3
                }),
                json!({"age": 9}),
            )
            .unwrap();

        assert_eq!(updated["age"], json!(9));
        assert_eq!(dogs.count().unwrap(), 3);
        assert_eq!(dogs.find(json!({"id": 3})).unwrap().unwrap()["age"], json!(9));
    }

    #[test]
    fn test_lazy_handle_rejects_add() {
        let store = Store::with_config(["dogs"], StoreConfig::new().lazy_select(true)).unwrap();
        let cats = store.select("cats").unwrap();

        assert!(matches!(
            cats.add(json!({"name": "Tom"})),
            Err(StoreError::TableNotFound(_))
        ));
        assert!(cats.find(json!({})).unwrap().is_none());
        assert!(cats.delete(json!({})).unwrap().is_none());
        assert!(cats.update_all(json!({}), json!({"a": 1})).unwrap().is_empty());
        assert!(cats.update(json!({}), json!({"a": 1})).unwrap_err().is_not_found());
        assert!(store.dump().unwrap().get("cats").is_none());
    }
}
