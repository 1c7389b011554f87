//! Tabular data store abstraction
//!
//! The store is the only persistence PaperFlow has. It exposes three operations per
//! table (`select`, `insert`, `update`) over JSON rows; the typed helpers in [`table`]
//! convert to and from the record types in `paperflow-api`.

pub mod memory;
pub mod supabase;
pub mod table;

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;

pub use table::{Acknowledgments, Notes, Pushes, Sections, Table};

/// The four tables PaperFlow reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Sections,
    Notes,
    Pushes,
    Acknowledgments,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Sections,
        TableKind::Notes,
        TableKind::Pushes,
        TableKind::Acknowledgments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Sections => "sections",
            TableKind::Notes => "notes",
            TableKind::Pushes => "pushes",
            TableKind::Acknowledgments => "acknowledgments",
        }
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote table names for each [`TableKind`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub sections: String,
    pub notes: String,
    pub pushes: String,
    pub acknowledgments: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            sections: "contract_sections".to_string(),
            notes: "contract_notes".to_string(),
            pushes: "policy_pushes".to_string(),
            acknowledgments: "push_acknowledgments".to_string(),
        }
    }
}

impl TableNames {
    pub fn name(&self, table: TableKind) -> &str {
        match table {
            TableKind::Sections => &self.sections,
            TableKind::Notes => &self.notes,
            TableKind::Pushes => &self.pushes,
            TableKind::Acknowledgments => &self.acknowledgments,
        }
    }
}

/// Sort key for a select
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }
}

/// Equality predicate on one column
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Predicate and ordering for a select. All filters must match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, order: Option<Order>) -> Self {
        self.order = order;
        self
    }
}

/// Generic tabular data store
///
/// Rows travel as JSON objects. Identities (`id`) and creation times are assigned by
/// the store on insert and returned with the created rows.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Read the rows of `table` matching `query`, in the query's order
    async fn select(&self, table: TableKind, query: &SelectQuery) -> StoreResult<Vec<Value>>;

    /// Insert `rows` as one request and return the created rows
    async fn insert(&self, table: TableKind, rows: Vec<Value>) -> StoreResult<Vec<Value>>;

    /// Merge `patch` into the row with identity `id`
    async fn update(&self, table: TableKind, id: Uuid, patch: Value) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_names_default() {
        let names = TableNames::default();
        assert_eq!(names.name(TableKind::Sections), "contract_sections");
        assert_eq!(names.name(TableKind::Notes), "contract_notes");
        assert_eq!(names.name(TableKind::Pushes), "policy_pushes");
        assert_eq!(names.name(TableKind::Acknowledgments), "push_acknowledgments");
    }

    #[test]
    fn test_table_names_partial_override() {
        let names: TableNames = serde_json::from_value(json!({ "notes": "notes_v2" })).unwrap();
        assert_eq!(names.notes, "notes_v2");
        assert_eq!(names.sections, "contract_sections");
    }

    #[test]
    fn test_select_query_builder() {
        let query = SelectQuery::new()
            .eq("push_id", "abc")
            .order(Some(Order::desc("created_at")));
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].value, json!("abc"));
        assert_eq!(query.order, Some(Order::desc("created_at")));
    }
}
