//! Typed access to the four tables

use paperflow_api::{
    Acknowledgment, AcknowledgmentPatch, NewAcknowledgment, NewNote, NewPush, NewSection, Note,
    NotePatch, Push, Section, SectionPatch,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use super::{DataStore, Order, SelectQuery, TableKind};
use crate::error::{StoreError, StoreResult};

/// Binds a [`TableKind`] to its row, insert and patch types
pub trait Table {
    const KIND: TableKind;
    type Row: DeserializeOwned + Send;
    type Insert: Serialize + Sync;
    type Patch: Serialize + Sync;

    /// Read order used for the bulk load
    fn default_order() -> Option<Order>;
}

pub struct Sections;
pub struct Notes;
pub struct Pushes;
pub struct Acknowledgments;

impl Table for Sections {
    const KIND: TableKind = TableKind::Sections;
    type Row = Section;
    type Insert = NewSection;
    type Patch = SectionPatch;

    fn default_order() -> Option<Order> {
        Some(Order::asc("sort_order"))
    }
}

impl Table for Notes {
    const KIND: TableKind = TableKind::Notes;
    type Row = Note;
    type Insert = NewNote;
    type Patch = NotePatch;

    fn default_order() -> Option<Order> {
        Some(Order::desc("created_at"))
    }
}

impl Table for Pushes {
    const KIND: TableKind = TableKind::Pushes;
    type Row = Push;
    type Insert = NewPush;
    type Patch = ();

    fn default_order() -> Option<Order> {
        Some(Order::desc("created_at"))
    }
}

impl Table for Acknowledgments {
    const KIND: TableKind = TableKind::Acknowledgments;
    type Row = Acknowledgment;
    type Insert = NewAcknowledgment;
    type Patch = AcknowledgmentPatch;

    fn default_order() -> Option<Order> {
        None
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

/// Every row of a table, in the table's default order
pub async fn select_all<T: Table>(store: &dyn DataStore) -> StoreResult<Vec<T::Row>> {
    let query = SelectQuery::new().order(T::default_order());
    select_where::<T>(store, query).await
}

/// Rows matching `query`
pub async fn select_where<T: Table>(
    store: &dyn DataStore,
    query: SelectQuery,
) -> StoreResult<Vec<T::Row>> {
    let rows = store.select(T::KIND, &query).await?;
    decode_rows(rows)
}

/// Insert records as one request, returning the created rows
pub async fn insert<T: Table>(
    store: &dyn DataStore,
    records: &[T::Insert],
) -> StoreResult<Vec<T::Row>> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let created = store.insert(T::KIND, rows).await?;
    decode_rows(created)
}

/// Merge a patch into one row
pub async fn update<T: Table>(
    store: &dyn DataStore,
    id: Uuid,
    patch: &T::Patch,
) -> StoreResult<()> {
    let patch = serde_json::to_value(patch)?;
    store.update(T::KIND, id, patch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use paperflow_api::{DocType, NoteType, SectionDraft};

    #[tokio::test]
    async fn test_insert_and_select_sections_in_sort_order() {
        let store = MemoryStore::new();
        let second = SectionDraft::new(DocType::Contract, "2", "Wages", "text").into_insert(2);
        let first = SectionDraft::new(DocType::Handbook, "1", "Scope", "text").into_insert(1);

        insert::<Sections>(&store, &[second]).await.unwrap();
        insert::<Sections>(&store, &[first]).await.unwrap();

        let sections = select_all::<Sections>(&store).await.unwrap();
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Scope", "Wages"]);
    }

    #[tokio::test]
    async fn test_update_note_resolved() {
        let store = MemoryStore::new();
        let created = insert::<Notes>(
            &store,
            &[NewNote {
                section_id: Uuid::new_v4(),
                author: "Kari".to_string(),
                note: "clarify".to_string(),
                note_type: NoteType::Question,
                resolved: false,
            }],
        )
        .await
        .unwrap();

        update::<Notes>(&store, created[0].id, &NotePatch::resolved(true))
            .await
            .unwrap();

        let notes = select_all::<Notes>(&store).await.unwrap();
        assert!(notes[0].resolved);
    }

    #[tokio::test]
    async fn test_select_where_filters_acknowledgments() {
        let store = MemoryStore::new();
        let push_a = Uuid::new_v4();
        let push_b = Uuid::new_v4();
        insert::<Acknowledgments>(
            &store,
            &[
                NewAcknowledgment::stub(push_a, "Alice"),
                NewAcknowledgment::stub(push_b, "Bob"),
            ],
        )
        .await
        .unwrap();

        let query = SelectQuery::new().eq("push_id", push_a.to_string());
        let acks = select_where::<Acknowledgments>(&store, query).await.unwrap();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].employee_name, "Alice");
    }
}
