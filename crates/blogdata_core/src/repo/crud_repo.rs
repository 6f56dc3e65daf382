//! Generic CRUD repository with optimistic locking.
//!
//! # Responsibility
//! - Derive insert/select/update/delete statements from `Entity` metadata.
//! - Enforce the version check on every guarded mutation.
//!
//! # Invariants
//! - Insert writes version 0; a taken id is `DuplicateKey`.
//! - Update and guarded delete constrain on id AND the caller's version; a
//!   zero row count is always `ConcurrencyConflict`, never not-found.
//! - Stored NULL versions compare as 0.
//! - Entities are taken by value and returned anew; nothing is mutated in
//!   place.

use crate::db::{ConnectionProvider, DbError};
use crate::error::{DataError, DataResult};
use crate::repo::entity::{DerivedQuery, Entity};
use crate::sql::binding::Params;
use crate::sql::client::SqlClient;
use log::{debug, warn};
use rusqlite::ffi;
use rusqlite::types::Value;
use std::marker::PhantomData;

/// SQLite repository for one entity type.
pub struct SqlRepository<E, P> {
    client: SqlClient<P>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, P: ConnectionProvider> SqlRepository<E, P> {
    pub fn new(provider: P) -> Self {
        Self {
            client: SqlClient::new(provider),
            _entity: PhantomData,
        }
    }

    /// Statement builder sharing this repository's provider.
    pub fn client(&self) -> &SqlClient<P> {
        &self.client
    }

    /// Inserts a new entity or updates an existing one.
    ///
    /// An entity without a version is new; one with a version must match the
    /// stored version.
    pub fn save(&self, entity: E) -> DataResult<E> {
        match entity.version() {
            None => self.insert(entity),
            Some(_) => self.update(entity),
        }
    }

    /// Saves each entity in turn, stopping at the first failure.
    pub fn save_all<I>(&self, entities: I) -> DataResult<Vec<E>>
    where
        I: IntoIterator<Item = E>,
    {
        entities.into_iter().map(|entity| self.save(entity)).collect()
    }

    /// Inserts `entity` with version 0.
    pub fn insert(&self, entity: E) -> DataResult<E> {
        entity.validate()?;

        let columns = all_columns::<E>();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            E::TABLE,
            columns.join(", ")
        );

        let id = entity.id_value();
        let mut values = vec![id.clone()];
        values.extend(entity.data_values());
        values.push(Value::Integer(0));

        match self.client.execute(&sql, Params::Positional(values)) {
            Ok(_) => {
                debug!("event=entity_insert module=repo status=ok table={}", E::TABLE);
                Ok(entity.with_version(0))
            }
            Err(err) if is_duplicate_key(&err) => {
                warn!(
                    "event=entity_insert module=repo status=error table={} error_code=duplicate_key",
                    E::TABLE
                );
                Err(DataError::DuplicateKey {
                    table: E::TABLE,
                    id: value_label(&id),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces the row matching id and current version, bumping the version.
    ///
    /// The entity must carry the version it was read with; `None` is
    /// `MissingVersion` and a version that cannot grow is `VersionOverflow`.
    pub fn update(&self, entity: E) -> DataResult<E> {
        entity.validate()?;
        let id = entity.id_value();
        let expected = entity.version().ok_or_else(|| DataError::MissingVersion {
            table: E::TABLE,
            id: value_label(&id),
        })?;
        let next = expected
            .checked_add(1)
            .ok_or_else(|| DataError::VersionOverflow {
                table: E::TABLE,
                id: value_label(&id),
                version: expected,
            })?;

        let mut assigned = E::DATA_COLUMNS.to_vec();
        assigned.push(E::VERSION_COLUMN);
        let assignments = assigned
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ? AND COALESCE({}, 0) = ?",
            E::TABLE,
            E::ID_COLUMN,
            E::VERSION_COLUMN
        );

        let mut values = entity.data_values();
        values.push(Value::Integer(next));
        values.push(id.clone());
        values.push(Value::Integer(expected));

        let changed = self.client.execute(&sql, Params::Positional(values))?;
        self.check_guarded(changed, "entity_update", &id, expected)?;
        Ok(entity.with_version(next))
    }

    pub fn find_all(&self) -> DataResult<Vec<E>> {
        self.client.query(&select_sql::<E>(), Params::None)
    }

    pub fn find_by_id(&self, id: impl Into<Value>) -> DataResult<Option<E>> {
        let sql = format!("{} WHERE {} = ?", select_sql::<E>(), E::ID_COLUMN);
        self.client.query_one(&sql, Params::positional([id]))
    }

    /// Zero matches is `None`; more than one is a cardinality failure.
    ///
    /// `value` is ignored by finders that bind nothing, such as `IsNull`.
    pub fn find_by(&self, finder: &DerivedQuery, value: impl Into<Value>) -> DataResult<Option<E>> {
        let sql = format!("{} WHERE {}", select_sql::<E>(), finder.condition());
        self.client.query_one(&sql, finder.params(value.into()))
    }

    pub fn find_all_by(&self, finder: &DerivedQuery, value: impl Into<Value>) -> DataResult<Vec<E>> {
        let sql = format!("{} WHERE {}", select_sql::<E>(), finder.condition());
        self.client.query(&sql, finder.params(value.into()))
    }

    pub fn exists_by_id(&self, id: impl Into<Value>) -> DataResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?) AS present",
            E::TABLE,
            E::ID_COLUMN
        );
        let rows = self.client.sql(sql).bind(id).query_rows()?;
        Ok(matches!(
            rows.first().and_then(|row| row.get("present")),
            Some(Value::Integer(1))
        ))
    }

    pub fn count(&self) -> DataResult<u64> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", E::TABLE);
        let rows = self.client.sql(sql).query_rows()?;
        let total = rows
            .first()
            .map(|row| row.int("total"))
            .transpose()?
            .unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Removes the row with `id` regardless of version.
    ///
    /// Returns the affected row count; 0 means nothing matched.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> DataResult<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", E::TABLE, E::ID_COLUMN);
        self.client.execute(&sql, Params::positional([id]))
    }

    /// Removes the row with `id` only while its version is still `version`.
    pub fn delete_versioned(&self, id: impl Into<Value>, version: i64) -> DataResult<()> {
        let id = id.into();
        let sql = format!(
            "DELETE FROM {} WHERE {} = ? AND COALESCE({}, 0) = ?",
            E::TABLE,
            E::ID_COLUMN,
            E::VERSION_COLUMN
        );
        let changed = self.client.execute(
            &sql,
            Params::Positional(vec![id.clone(), Value::Integer(version)]),
        )?;
        self.check_guarded(changed, "entity_delete", &id, version)
    }

    /// Deletes `entity`, version-guarded when it carries a version.
    pub fn delete(&self, entity: &E) -> DataResult<usize> {
        match entity.version() {
            Some(version) => self
                .delete_versioned(entity.id_value(), version)
                .map(|()| 1),
            None => self.delete_by_id(entity.id_value()),
        }
    }

    pub fn delete_all(&self) -> DataResult<usize> {
        self.client
            .execute(&format!("DELETE FROM {}", E::TABLE), Params::None)
    }

    fn check_guarded(
        &self,
        changed: usize,
        event: &str,
        id: &Value,
        expected_version: i64,
    ) -> DataResult<()> {
        if changed == 0 {
            warn!(
                "event={event} module=repo status=error table={} error_code=concurrency_conflict",
                E::TABLE
            );
            return Err(DataError::ConcurrencyConflict {
                table: E::TABLE,
                id: value_label(id),
                expected_version,
            });
        }
        debug!("event={event} module=repo status=ok table={}", E::TABLE);
        Ok(())
    }
}

fn all_columns<E: Entity>() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(E::DATA_COLUMNS.len() + 2);
    columns.push(E::ID_COLUMN);
    columns.extend_from_slice(E::DATA_COLUMNS);
    columns.push(E::VERSION_COLUMN);
    columns
}

fn select_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {}", all_columns::<E>().join(", "), E::TABLE)
}

fn is_duplicate_key(err: &DataError) -> bool {
    matches!(
        err,
        DataError::Storage(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                )
    )
}

fn value_label(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Integer(number) => number.to_string(),
        other => format!("{other:?}"),
    }
}
