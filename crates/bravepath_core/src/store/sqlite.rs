//! SQLite-backed document store.
//!
//! # Responsibility
//! - Implement the document store contract over the canonical `documents`
//!   table (JSON bodies, JSON1 field filters).
//! - Keep SQL details inside this persistence boundary.
//!
//! # Invariants
//! - Batches run under `BEGIN IMMEDIATE` so writers serialize at the store.
//! - Version preconditions are re-checked inside the transaction; a stale
//!   version never silently overwrites a newer write.
//! - Insert order (`id`) is the creation order used for descending queries.

use super::{Document, DocumentStore, FieldFilter, StoreError, StoreResult, WriteBatch, WriteOp};
use crate::db::DbError;
use crate::policy::Collection;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

/// Document store over one SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn apply(&self, batch: &WriteBatch) -> StoreResult<()> {
        for op in batch.ops() {
            match op {
                WriteOp::Insert {
                    collection,
                    key,
                    body,
                } => self.apply_insert(*collection, key, body)?,
                WriteOp::Update {
                    collection,
                    key,
                    expected_version,
                    body,
                } => {
                    self.check_version(*collection, key, *expected_version)?;
                    self.conn
                        .execute(
                            "UPDATE documents
                             SET body = ?3, version = version + 1
                             WHERE collection = ?1 AND doc_key = ?2;",
                            params![collection.as_str(), key, body.to_string()],
                        )
                        .map_err(map_sqlite)?;
                }
                WriteOp::Delete {
                    collection,
                    key,
                    expected_version,
                } => {
                    self.check_version(*collection, key, *expected_version)?;
                    self.conn
                        .execute(
                            "DELETE FROM documents WHERE collection = ?1 AND doc_key = ?2;",
                            params![collection.as_str(), key],
                        )
                        .map_err(map_sqlite)?;
                }
            }
        }
        Ok(())
    }

    fn apply_insert(&self, collection: Collection, key: &str, body: &Value) -> StoreResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO documents (collection, doc_key, body, version)
             VALUES (?1, ?2, ?3, 1);",
            params![collection.as_str(), key, body.to_string()],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(StoreError::KeyExists {
                collection,
                key: key.to_string(),
            }),
            Err(err) => Err(map_sqlite(err)),
        }
    }

    fn check_version(
        &self,
        collection: Collection,
        key: &str,
        expected_version: u64,
    ) -> StoreResult<()> {
        let current: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM documents WHERE collection = ?1 AND doc_key = ?2;",
                params![collection.as_str(), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sqlite)?;

        match current {
            Some(version) if version as u64 == expected_version => Ok(()),
            _ => Err(StoreError::Conflict {
                collection,
                key: key.to_string(),
            }),
        }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT body, version FROM documents
                 WHERE collection = ?1 AND doc_key = ?2;",
                params![collection.as_str(), key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(map_sqlite)?;

        row.map(|(body, version)| parse_document(collection, key.to_string(), body, version))
            .transpose()
    }

    fn query(
        &self,
        collection: Collection,
        filters: &[FieldFilter<'_>],
    ) -> StoreResult<Vec<Document>> {
        let mut sql = String::from(
            "SELECT doc_key, body, version FROM documents WHERE collection = ?1",
        );
        let mut bindings: Vec<SqlValue> = vec![SqlValue::Text(collection.as_str().to_string())];

        for (index, (field, value)) in filters.iter().enumerate() {
            check_field_name(field)?;
            sql.push_str(&format!(
                " AND json_extract(body, '$.{field}') = ?{}",
                index + 2
            ));
            bindings.push(filter_binding(value)?);
        }
        sql.push_str(" ORDER BY id DESC;");

        let mut stmt = self.conn.prepare(&sql).map_err(map_sqlite)?;
        let rows = stmt
            .query_map(params_from_iter(bindings), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(map_sqlite)?;

        let mut documents = Vec::new();
        for row in rows {
            let (key, body, version) = row.map_err(map_sqlite)?;
            documents.push(parse_document(collection, key, body, version)?);
        }
        Ok(documents)
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE;")
            .map_err(map_sqlite)?;

        match self.apply(&batch) {
            Ok(()) => match self.conn.execute_batch("COMMIT;") {
                Ok(()) => Ok(()),
                Err(err) => {
                    let _ = self.conn.execute_batch("ROLLBACK;");
                    Err(map_sqlite(err))
                }
            },
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

fn parse_document(
    collection: Collection,
    key: String,
    body: String,
    version: i64,
) -> StoreResult<Document> {
    let body: Value = serde_json::from_str(&body).map_err(|err| {
        StoreError::InvalidData(format!(
            "document {}/{key} holds malformed JSON: {err}",
            collection.as_str()
        ))
    })?;
    Ok(Document {
        collection,
        key,
        body,
        version: version as u64,
    })
}

fn check_field_name(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!(
            "unsupported filter field name: {field}"
        )))
    }
}

fn filter_binding(value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real))
            .ok_or_else(|| StoreError::InvalidData("unsupported numeric filter".to_string())),
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidData(
            "filter values must be JSON scalars".to_string(),
        )),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == ErrorCode::ConstraintViolation
    )
}

fn map_sqlite(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == ErrorCode::DatabaseBusy || code.code == ErrorCode::DatabaseLocked =>
        {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Db(DbError::Sqlite(err)),
    }
}
