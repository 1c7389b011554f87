//! In-process data store
//!
//! Behaves like the hosted store as far as PaperFlow can observe: server-assigned
//! identities and creation times, column defaults, ordered selects, all-or-nothing
//! multi-row inserts, and updates that succeed even when no row matches. Failures can
//! be injected per table and operation.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use tracing::debug;
use uuid::Uuid;

use super::{DataStore, Order, SelectQuery, TableKind};
use crate::error::{StoreError, StoreResult};

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
}

#[derive(Clone, Debug)]
struct StoredRow {
    seq: u64,
    value: Value,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<TableKind, Vec<StoredRow>>,
    failures: HashMap<(TableKind, StoreOp), String>,
    next_seq: u64,
}

/// Data store held in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` on `table` fail with `message` until cleared
    pub fn fail(&self, table: TableKind, op: StoreOp, message: &str) {
        self.inner
            .write()
            .failures
            .insert((table, op), message.to_string());
    }

    /// Remove an injected failure
    pub fn clear_failure(&self, table: TableKind, op: StoreOp) {
        self.inner.write().failures.remove(&(table, op));
    }

    /// Raw rows of a table in insertion order
    pub fn rows(&self, table: TableKind) -> Vec<Value> {
        self.inner
            .read()
            .tables
            .get(&table)
            .map(|rows| rows.iter().map(|r| r.value.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of rows in a table
    pub fn count(&self, table: TableKind) -> usize {
        self.inner
            .read()
            .tables
            .get(&table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_failure(&self, table: TableKind, op: StoreOp) -> StoreResult<()> {
        match self.inner.read().failures.get(&(table, op)) {
            Some(message) => Err(StoreError::Unavailable {
                table,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Column defaults the hosted schema applies on insert
fn column_defaults(table: TableKind) -> Value {
    match table {
        TableKind::Sections => json!({
            "body": null,
            "kari_notes": null,
            "category": null,
            "updated_at": null,
        }),
        TableKind::Notes => json!({ "resolved": false }),
        TableKind::Pushes => json!({ "message": null }),
        TableKind::Acknowledgments => json!({
            "acknowledged": false,
            "acknowledged_at": null,
        }),
    }
}

fn materialize(table: TableKind, row: Value, now: DateTime<Utc>) -> StoreResult<Value> {
    let Value::Object(fields) = row else {
        return Err(StoreError::UnexpectedResponse(format!(
            "{} insert expects JSON objects",
            table
        )));
    };

    let mut created = Map::new();
    created.insert("id".to_string(), json!(Uuid::new_v4()));
    created.insert("created_at".to_string(), json!(now));
    if let Value::Object(defaults) = column_defaults(table) {
        created.extend(defaults);
    }
    created.extend(fields);
    Ok(Value::Object(created))
}

fn matches(row: &Value, query: &SelectQuery) -> bool {
    query
        .filters
        .iter()
        .all(|f| row.get(&f.column) == Some(&f.value))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        // nulls sort last ascending
        (Some(Value::Null) | None, _) => Ordering::Greater,
        (_, Some(Value::Null) | None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [StoredRow], order: &Order) {
    rows.sort_by(|a, b| {
        let by_column = compare_values(a.value.get(&order.column), b.value.get(&order.column));
        // later inserts win ties in descending order, as with a creation timestamp
        let ordering = by_column.then(a.seq.cmp(&b.seq));
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: TableKind, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        self.check_failure(table, StoreOp::Select)?;

        let inner = self.inner.read();
        let mut rows: Vec<StoredRow> = inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches(&r.value, query)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }

        Ok(rows.into_iter().map(|r| r.value).collect())
    }

    async fn insert(&self, table: TableKind, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        self.check_failure(table, StoreOp::Insert)?;

        let now = Utc::now();
        let created = rows
            .into_iter()
            .map(|row| materialize(table, row, now))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut inner = self.inner.write();
        let mut stored = Vec::with_capacity(created.len());
        for value in &created {
            inner.next_seq += 1;
            stored.push(StoredRow {
                seq: inner.next_seq,
                value: value.clone(),
            });
        }
        inner.tables.entry(table).or_default().extend(stored);

        debug!("Inserted {} row(s) into {}", created.len(), table);
        Ok(created)
    }

    async fn update(&self, table: TableKind, id: Uuid, patch: Value) -> StoreResult<()> {
        self.check_failure(table, StoreOp::Update)?;

        let Value::Object(fields) = patch else {
            return Err(StoreError::UnexpectedResponse(format!(
                "{} update expects a JSON object",
                table
            )));
        };

        let id = json!(id);
        let mut inner = self.inner.write();
        let row = inner
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r.value.get("id") == Some(&id)));

        match row {
            Some(row) => {
                if let Value::Object(existing) = &mut row.value {
                    existing.extend(fields);
                }
            }
            None => debug!("Update on {} matched no row", table),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_identity_and_defaults() {
        let store = MemoryStore::new();
        let created = store
            .insert(
                TableKind::Acknowledgments,
                vec![json!({ "push_id": Uuid::nil(), "employee_name": "Alice" })],
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        let row = &created[0];
        assert!(row["id"].as_str().is_some());
        assert_eq!(row["acknowledged"], json!(false));
        assert_eq!(row["acknowledged_at"], Value::Null);
        assert_eq!(store.count(TableKind::Acknowledgments), 1);
    }

    #[tokio::test]
    async fn test_descending_order_puts_newest_first() {
        let store = MemoryStore::new();
        for text in ["first", "second", "third"] {
            store
                .insert(TableKind::Notes, vec![json!({ "note": text })])
                .await
                .unwrap();
        }

        let query = SelectQuery::new().order(Some(Order::desc("created_at")));
        let rows = store.select(TableKind::Notes, &query).await.unwrap();
        let texts: Vec<_> = rows.iter().filter_map(|r| r["note"].as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_ascending_numeric_order() {
        let store = MemoryStore::new();
        store
            .insert(
                TableKind::Sections,
                vec![json!({ "sort_order": 10 }), json!({ "sort_order": 2 })],
            )
            .await
            .unwrap();

        let query = SelectQuery::new().order(Some(Order::asc("sort_order")));
        let rows = store.select(TableKind::Sections, &query).await.unwrap();
        assert_eq!(rows[0]["sort_order"], json!(2));
        assert_eq!(rows[1]["sort_order"], json!(10));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let created = store
            .insert(TableKind::Notes, vec![json!({ "note": "x", "resolved": false })])
            .await
            .unwrap();
        let id: Uuid = serde_json::from_value(created[0]["id"].clone()).unwrap();

        store
            .update(TableKind::Notes, id, json!({ "resolved": true }))
            .await
            .unwrap();

        let rows = store.rows(TableKind::Notes);
        assert_eq!(rows[0]["resolved"], json!(true));
        assert_eq!(rows[0]["note"], json!("x"));
    }

    #[tokio::test]
    async fn test_update_without_match_succeeds() {
        let store = MemoryStore::new();
        let result = store
            .update(TableKind::Notes, Uuid::new_v4(), json!({ "resolved": true }))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_table_untouched() {
        let store = MemoryStore::new();
        store.fail(TableKind::Pushes, StoreOp::Insert, "offline");

        let err = store
            .insert(TableKind::Pushes, vec![json!({ "pushed_to": ["A"] })])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { table: TableKind::Pushes, .. }));
        assert_eq!(store.count(TableKind::Pushes), 0);

        store.clear_failure(TableKind::Pushes, StoreOp::Insert);
        assert!(
            store
                .insert(TableKind::Pushes, vec![json!({ "pushed_to": ["A"] })])
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_insert_rejects_non_object_rows() {
        let store = MemoryStore::new();
        let err = store
            .insert(TableKind::Notes, vec![json!({ "note": "ok" }), json!(42)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedResponse(_)));
        assert_eq!(store.count(TableKind::Notes), 0);
    }
}
