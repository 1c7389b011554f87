//! Workspace: drives [`AppState`] transitions against a data store
//!
//! The state lock is only held to plan or apply; it is never held across a store call,
//! so operations may overlap and their completions land in whatever order they finish.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use paperflow_api::{DocType, Note, NoteDraft, Push, PushDraft, Section, SectionDraft, SectionPatch};
use paperflow_client::store::table::{self, Acknowledgments, Notes, Pushes, Sections};
use paperflow_client::{DataStore, StoreError};
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::effect::{Completion, Effect, execute};
use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{AppState, LoadedTables, Notice};

/// Author recorded on notes when the caller leaves it blank
pub const DEFAULT_AUTHOR: &str = "Kari";

/// One signed-in user's view of the shared tables
pub struct Workspace {
    store: Arc<dyn DataStore>,
    state: RwLock<AppState>,
    acting_user: String,
    default_author: String,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("acting_user", &self.acting_user)
            .field("default_author", &self.default_author)
            .finish_non_exhaustive()
    }
}

fn unexpected(completion: &Completion) -> WorkflowError {
    WorkflowError::Store(StoreError::UnexpectedResponse(format!(
        "unexpected completion for {}",
        completion.describe()
    )))
}

impl Workspace {
    /// Workspace acting as `acting_user`, recorded as the sender of pushes
    pub fn new(store: Arc<dyn DataStore>, acting_user: &str) -> Self {
        Self {
            store,
            state: RwLock::new(AppState::new()),
            acting_user: acting_user.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_default_author(mut self, author: &str) -> Self {
        self.default_author = author.to_string();
        self
    }

    pub fn acting_user(&self) -> &str {
        &self.acting_user
    }

    /// Read all four tables concurrently and replace the cache.
    ///
    /// A table whose read fails is loaded empty.
    pub async fn load_all(&self) {
        let store = self.store.as_ref();
        let (sections, notes, pushes, acknowledgments) = tokio::join!(
            table::select_all::<Sections>(store),
            table::select_all::<Notes>(store),
            table::select_all::<Pushes>(store),
            table::select_all::<Acknowledgments>(store)
        );

        let tables = LoadedTables {
            sections: or_empty("sections", sections),
            notes: or_empty("notes", notes),
            pushes: or_empty("pushes", pushes),
            acknowledgments: or_empty("acknowledgments", acknowledgments),
        };
        info!(
            "Loaded {} section(s), {} note(s), {} push(es), {} acknowledgment(s)",
            tables.sections.len(),
            tables.notes.len(),
            tables.pushes.len(),
            tables.acknowledgments.len()
        );
        self.state.write().load(tables);
    }

    /// Execute an effect, apply its completion, then any follow-ups it asks for.
    ///
    /// Returns every completion in execution order; the first is the one for `effect`.
    async fn drive(&self, effect: Effect) -> Vec<Completion> {
        let mut queue = VecDeque::from([effect]);
        let mut completions = Vec::new();
        while let Some(effect) = queue.pop_front() {
            let completion = execute(self.store.as_ref(), effect).await;
            let follow_ups = self.state.write().apply(&completion);
            queue.extend(follow_ups);
            completions.push(completion);
        }
        completions
    }

    /// Run a single-write workflow and return its completion
    async fn drive_one(&self, effect: Effect) -> Completion {
        let mut completions = self.drive(effect).await;
        completions.swap_remove(0)
    }

    // ============== Sections ==============

    pub async fn add_section(&self, draft: SectionDraft) -> WorkflowResult<Section> {
        let effect = self.state.read().plan_add_section(draft)?;
        match self.drive_one(effect).await {
            Completion::SectionInserted(result) => Ok(result?),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn update_section(&self, id: Uuid, patch: SectionPatch) -> WorkflowResult<()> {
        let effect = self.state.read().plan_update_section(id, patch, Utc::now())?;
        match self.drive_one(effect).await {
            Completion::SectionUpdated { result, .. } => Ok(result?),
            other => Err(unexpected(&other)),
        }
    }

    // ============== Notes ==============

    /// Add a note to the active section. A blank author is replaced by the default author.
    pub async fn add_note(&self, mut draft: NoteDraft) -> WorkflowResult<Note> {
        if draft.author.trim().is_empty() {
            draft.author = self.default_author.clone();
        }
        let effect = self.state.read().plan_add_note(draft)?;
        match self.drive_one(effect).await {
            Completion::NoteInserted(result) => Ok(result?),
            other => Err(unexpected(&other)),
        }
    }

    /// Set `resolved` to `!current`
    pub async fn toggle_resolved(&self, note_id: Uuid, current: bool) -> WorkflowResult<()> {
        let effect = self.state.read().plan_toggle_resolved(note_id, current)?;
        match self.drive_one(effect).await {
            Completion::NoteUpdated { result, .. } => Ok(result?),
            other => Err(unexpected(&other)),
        }
    }

    // ============== Pushes ==============

    /// Push the active section and write one acknowledgment stub per recipient.
    ///
    /// When the push is written but the stubs are not, the push stays in the cache
    /// with no acknowledgments and [`WorkflowError::PartialFanout`] is returned; see
    /// [`Workspace::repair_fanout`].
    pub async fn create_push(&self, draft: PushDraft) -> WorkflowResult<Push> {
        let effect = self
            .state
            .read()
            .plan_create_push(&self.acting_user, draft)?;

        let mut completions = self.drive(effect).await.into_iter();
        let push = match completions.next() {
            Some(Completion::PushInserted(result)) => result?,
            Some(other) => return Err(unexpected(&other)),
            None => return Err(StoreError::UnexpectedResponse("no completion".to_string()).into()),
        };

        for completion in completions {
            if let Completion::AcknowledgmentsInserted {
                push_id,
                result: Err(source),
            } = completion
            {
                return Err(WorkflowError::PartialFanout { push_id, source });
            }
        }
        Ok(push)
    }

    /// Set `acknowledged` to `!current`, stamping or clearing `acknowledged_at`
    pub async fn toggle_acknowledgment(&self, ack_id: Uuid, current: bool) -> WorkflowResult<()> {
        let effect = self
            .state
            .read()
            .plan_toggle_acknowledgment(ack_id, current, Utc::now())?;
        match self.drive_one(effect).await {
            Completion::AcknowledgmentUpdated { result, .. } => Ok(result?),
            other => Err(unexpected(&other)),
        }
    }

    /// Write the acknowledgment stubs a push is missing. Returns how many were written.
    pub async fn repair_fanout(&self, push_id: Uuid) -> WorkflowResult<usize> {
        let effect = self.state.write().plan_repair_fanout(push_id)?;
        match self.drive_one(effect).await {
            Completion::AcknowledgmentsInserted { result, .. } => {
                let created = result?;
                info!("Repaired push {} with {} acknowledgment(s)", push_id, created.len());
                Ok(created.len())
            }
            other => Err(unexpected(&other)),
        }
    }

    // ============== Selection ==============

    pub fn select_section(&self, id: Uuid) -> bool {
        self.state.write().select_section(id)
    }

    pub fn clear_selection(&self) {
        self.state.write().clear_selection();
    }

    pub fn set_search(&self, search: &str) {
        self.state.write().set_search(search);
    }

    pub fn set_doc_filter(&self, doc_type: Option<DocType>) {
        self.state.write().set_doc_filter(doc_type);
    }

    // ============== Reading ==============

    /// Run `f` against the current state
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read())
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.state.write().take_notices()
    }
}

fn or_empty<T>(table: &str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to load {}, showing none: {}", table, e);
            Vec::new()
        }
    }
}
