//! Remote writes requested by workflow transitions, and their outcomes
//!
//! A transition on [`crate::AppState`] never talks to the store itself. It returns an
//! [`Effect`]; the driver executes it and feeds the [`Completion`] back into the state,
//! which patches the cache and may ask for follow-up effects.

use chrono::{DateTime, Utc};
use paperflow_api::{
    Acknowledgment, AcknowledgmentPatch, NewAcknowledgment, NewNote, NewPush, NewSection, Note,
    NotePatch, Push, Section, SectionPatch,
};
use paperflow_client::store::table::{self, Acknowledgments, Notes, Pushes, Sections, Table};
use paperflow_client::{DataStore, StoreError, StoreResult};
use tracing::debug;
use uuid::Uuid;

/// A remote write to issue
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    InsertSection(NewSection),
    /// `patch` is what the caller asked for; `updated_at` is stamped on the remote row only
    UpdateSection {
        id: Uuid,
        patch: SectionPatch,
        updated_at: DateTime<Utc>,
    },
    InsertNote(NewNote),
    UpdateNote {
        id: Uuid,
        patch: NotePatch,
    },
    InsertPush(NewPush),
    /// One stub per recipient, written as a single multi-row insert
    InsertAcknowledgments {
        push_id: Uuid,
        stubs: Vec<NewAcknowledgment>,
    },
    UpdateAcknowledgment {
        id: Uuid,
        patch: AcknowledgmentPatch,
    },
}

impl Effect {
    pub fn describe(&self) -> &'static str {
        match self {
            Effect::InsertSection(_) => "add section",
            Effect::UpdateSection { .. } => "update section",
            Effect::InsertNote(_) => "add note",
            Effect::UpdateNote { .. } => "update note",
            Effect::InsertPush(_) => "create push",
            Effect::InsertAcknowledgments { .. } => "create acknowledgments",
            Effect::UpdateAcknowledgment { .. } => "update acknowledgment",
        }
    }
}

/// Outcome of an executed [`Effect`]
#[derive(Debug)]
pub enum Completion {
    SectionInserted(StoreResult<Section>),
    SectionUpdated {
        id: Uuid,
        patch: SectionPatch,
        result: StoreResult<()>,
    },
    NoteInserted(StoreResult<Note>),
    NoteUpdated {
        id: Uuid,
        patch: NotePatch,
        result: StoreResult<()>,
    },
    PushInserted(StoreResult<Push>),
    AcknowledgmentsInserted {
        push_id: Uuid,
        result: StoreResult<Vec<Acknowledgment>>,
    },
    AcknowledgmentUpdated {
        id: Uuid,
        patch: AcknowledgmentPatch,
        result: StoreResult<()>,
    },
}

impl Completion {
    pub fn describe(&self) -> &'static str {
        match self {
            Completion::SectionInserted(_) => "add section",
            Completion::SectionUpdated { .. } => "update section",
            Completion::NoteInserted(_) => "add note",
            Completion::NoteUpdated { .. } => "update note",
            Completion::PushInserted(_) => "create push",
            Completion::AcknowledgmentsInserted { .. } => "create acknowledgments",
            Completion::AcknowledgmentUpdated { .. } => "update acknowledgment",
        }
    }

    /// The store error, when the write failed
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Completion::SectionInserted(result) => result.as_ref().err(),
            Completion::NoteInserted(result) => result.as_ref().err(),
            Completion::PushInserted(result) => result.as_ref().err(),
            Completion::AcknowledgmentsInserted { result, .. } => result.as_ref().err(),
            Completion::SectionUpdated { result, .. }
            | Completion::NoteUpdated { result, .. }
            | Completion::AcknowledgmentUpdated { result, .. } => result.as_ref().err(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error().is_none()
    }
}

async fn insert_one<T: Table>(store: &dyn DataStore, record: T::Insert) -> StoreResult<T::Row> {
    let mut created = table::insert::<T>(store, &[record]).await?;
    match created.pop() {
        Some(row) if created.is_empty() => Ok(row),
        _ => Err(StoreError::UnexpectedResponse(format!(
            "{} insert did not return exactly one row",
            T::KIND
        ))),
    }
}

/// Issue one effect against the store.
pub async fn execute(store: &dyn DataStore, effect: Effect) -> Completion {
    debug!("Executing {}", effect.describe());
    match effect {
        Effect::InsertSection(section) => {
            Completion::SectionInserted(insert_one::<Sections>(store, section).await)
        }
        Effect::UpdateSection {
            id,
            patch,
            updated_at,
        } => {
            let result = table::update::<Sections>(store, id, &patch.stamped(updated_at)).await;
            Completion::SectionUpdated { id, patch, result }
        }
        Effect::InsertNote(note) => Completion::NoteInserted(insert_one::<Notes>(store, note).await),
        Effect::UpdateNote { id, patch } => {
            let result = table::update::<Notes>(store, id, &patch).await;
            Completion::NoteUpdated { id, patch, result }
        }
        Effect::InsertPush(push) => Completion::PushInserted(insert_one::<Pushes>(store, push).await),
        Effect::InsertAcknowledgments { push_id, stubs } => {
            let result = table::insert::<Acknowledgments>(store, &stubs).await;
            Completion::AcknowledgmentsInserted { push_id, result }
        }
        Effect::UpdateAcknowledgment { id, patch } => {
            let result = table::update::<Acknowledgments>(store, id, &patch).await;
            Completion::AcknowledgmentUpdated { id, patch, result }
        }
    }
}
