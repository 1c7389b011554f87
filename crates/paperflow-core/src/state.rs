//! Application state: the local cache of the four tables plus selection and filters
//!
//! Workflows are split in two halves. A `plan_*` method validates the request against
//! the current state and returns the [`Effect`] to issue, without changing anything.
//! [`AppState::apply`] takes the [`Completion`] of an executed effect, patches the
//! cache when the write succeeded (or records a [`Notice`] when it failed) and returns
//! any follow-up effects. Completions may be applied in any order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paperflow_api::{
    Acknowledgment, AcknowledgmentPatch, DocType, NewAcknowledgment, NewPush, Note, NoteDraft,
    NotePatch, Push, PushDraft, Section, SectionDraft, SectionPatch, validate_body,
    validate_note_text, validate_section_number, validate_title,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::effect::{Completion, Effect};
use crate::error::{Skip, WorkflowResult};
use crate::reconcile::{FanoutGap, FanoutState, fanout_gaps, missing_recipients};
use crate::recipients::parse_recipients;
use crate::views::{self, AckTally, SectionBadges, SectionFilter, Stats};

/// A failed write, queued for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What the user was doing, e.g. "create push"
    pub action: &'static str,
    pub message: String,
}

/// Result of the initial bulk load, one entry per table
#[derive(Debug, Clone, Default)]
pub struct LoadedTables {
    pub sections: Vec<Section>,
    pub notes: Vec<Note>,
    pub pushes: Vec<Push>,
    pub acknowledgments: Vec<Acknowledgment>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    sections: Vec<Section>,
    notes: Vec<Note>,
    pushes: Vec<Push>,
    acknowledgments: Vec<Acknowledgment>,
    active_section: Option<Uuid>,
    filter: SectionFilter,
    loading: bool,
    fanouts: HashMap<Uuid, FanoutState>,
    notices: Vec<Notice>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Empty state, loading until [`AppState::load`] is called
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            notes: Vec::new(),
            pushes: Vec::new(),
            acknowledgments: Vec::new(),
            active_section: None,
            filter: SectionFilter::default(),
            loading: true,
            fanouts: HashMap::new(),
            notices: Vec::new(),
        }
    }

    /// Replace the cache wholesale with freshly read tables.
    pub fn load(&mut self, snapshot: LoadedTables) {
        self.sections = snapshot.sections;
        self.notes = snapshot.notes;
        self.pushes = snapshot.pushes;
        self.acknowledgments = snapshot.acknowledgments;
        // stub writes still in flight outlive a reload
        self.fanouts.retain(|_, state| *state == FanoutState::Pending);
        if let Some(id) = self.active_section
            && self.section(id).is_none()
        {
            self.active_section = None;
        }
        self.loading = false;
    }

    // ============== Accessors ==============

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn pushes(&self) -> &[Push] {
        &self.pushes
    }

    pub fn acknowledgments(&self) -> &[Acknowledgment] {
        &self.acknowledgments
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn filter(&self) -> &SectionFilter {
        &self.filter
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn section(&self, id: Uuid) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn push(&self, id: Uuid) -> Option<&Push> {
        self.pushes.iter().find(|p| p.id == id)
    }

    pub fn acknowledgment(&self, id: Uuid) -> Option<&Acknowledgment> {
        self.acknowledgments.iter().find(|a| a.id == id)
    }

    /// Fan-out progress of a push; `None` once its stubs are written
    pub fn fanout_state(&self, push_id: Uuid) -> Option<FanoutState> {
        self.fanouts.get(&push_id).copied()
    }

    // ============== Selection and filters ==============

    pub fn active_section(&self) -> Option<&Section> {
        self.active_section.and_then(|id| self.section(id))
    }

    /// Select a cached section. Returns false, leaving the selection as is, for unknown ids.
    pub fn select_section(&mut self, id: Uuid) -> bool {
        if self.section(id).is_none() {
            return false;
        }
        self.active_section = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.active_section = None;
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.to_string();
    }

    pub fn set_doc_filter(&mut self, doc_type: Option<DocType>) {
        self.filter.doc_type = doc_type;
    }

    // ============== Views ==============

    /// Sections passing the current filter
    pub fn visible_sections(&self) -> Vec<&Section> {
        views::filter_sections(&self.sections, &self.filter)
    }

    pub fn badges(&self, section_id: Uuid) -> SectionBadges {
        views::section_badges(section_id, &self.notes, &self.pushes)
    }

    pub fn stats(&self) -> Stats {
        views::stats(
            &self.sections,
            &self.notes,
            &self.pushes,
            &self.acknowledgments,
        )
    }

    pub fn ack_tally(&self, push_id: Uuid) -> AckTally {
        views::ack_tally(push_id, &self.acknowledgments)
    }

    /// Notes of the active section, newest first
    pub fn active_notes(&self) -> Vec<&Note> {
        match self.active_section {
            Some(id) => views::section_notes(id, &self.notes),
            None => Vec::new(),
        }
    }

    /// Pushes of the active section, newest first
    pub fn active_pushes(&self) -> Vec<&Push> {
        match self.active_section {
            Some(id) => views::section_pushes(id, &self.pushes),
            None => Vec::new(),
        }
    }

    pub fn push_acknowledgments(&self, push_id: Uuid) -> Vec<&Acknowledgment> {
        views::push_acknowledgments(push_id, &self.acknowledgments)
    }

    /// Pushes with fewer acknowledgments than recipients
    pub fn fanout_gaps(&self) -> Vec<FanoutGap> {
        fanout_gaps(&self.pushes, &self.acknowledgments)
    }

    // ============== Transitions ==============

    fn active_section_id(&self) -> Result<Uuid, Skip> {
        self.active_section
            .filter(|id| self.section(*id).is_some())
            .ok_or(Skip::NoActiveSection)
    }

    pub fn plan_add_section(&self, draft: SectionDraft) -> WorkflowResult<Effect> {
        validate_title(&draft.title)
            .and_then(|_| validate_section_number(&draft.section_number))
            .and_then(|_| validate_body(&draft.body))
            .map_err(|e| Skip::InvalidSection(e.code.to_string()))?;

        // Count + 1, not max + 1: the order hint is never reassigned
        let sort_order = self.sections.len() as i64 + 1;
        Ok(Effect::InsertSection(draft.into_insert(sort_order)))
    }

    pub fn plan_update_section(
        &self,
        id: Uuid,
        patch: SectionPatch,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Effect> {
        if self.section(id).is_none() {
            return Err(Skip::UnknownRecord(id).into());
        }
        if patch.is_empty() {
            return Err(Skip::EmptyPatch.into());
        }
        let checks = [
            patch.title.as_deref().map(validate_title),
            patch.section_number.as_deref().map(validate_section_number),
            patch.body.as_deref().map(validate_body),
        ];
        for check in checks.into_iter().flatten() {
            check.map_err(|e| Skip::InvalidSection(e.code.to_string()))?;
        }

        Ok(Effect::UpdateSection {
            id,
            patch,
            updated_at: now,
        })
    }

    /// Note on the active section
    pub fn plan_add_note(&self, draft: NoteDraft) -> WorkflowResult<Effect> {
        let section_id = self.active_section_id()?;
        if draft.note.trim().is_empty() {
            return Err(Skip::EmptyNote.into());
        }
        validate_note_text(&draft.note).map_err(|e| Skip::InvalidNote(e.code.to_string()))?;

        Ok(Effect::InsertNote(draft.into_insert(section_id)))
    }

    pub fn plan_toggle_resolved(&self, id: Uuid, current: bool) -> WorkflowResult<Effect> {
        if self.note(id).is_none() {
            return Err(Skip::UnknownRecord(id).into());
        }
        Ok(Effect::UpdateNote {
            id,
            patch: NotePatch::resolved(!current),
        })
    }

    /// Push the active section to the recipients in `draft`, as `acting_user`
    pub fn plan_create_push(&self, acting_user: &str, draft: PushDraft) -> WorkflowResult<Effect> {
        let section_id = self.active_section_id()?;
        let recipients = parse_recipients(&draft.recipients);
        if recipients.is_empty() {
            return Err(Skip::EmptyRecipients.into());
        }

        Ok(Effect::InsertPush(NewPush {
            section_id,
            pushed_by: acting_user.to_string(),
            pushed_to: recipients,
            push_method: draft.push_method,
            message: draft.message.filter(|m| !m.trim().is_empty()),
        }))
    }

    pub fn plan_toggle_acknowledgment(
        &self,
        id: Uuid,
        current: bool,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Effect> {
        if self.acknowledgment(id).is_none() {
            return Err(Skip::UnknownRecord(id).into());
        }
        Ok(Effect::UpdateAcknowledgment {
            id,
            patch: AcknowledgmentPatch::toggled_from(current, now),
        })
    }

    /// Re-issue the stubs a push is missing and mark its fan-out pending again.
    ///
    /// Refused while a stub write for the push is still in flight.
    pub fn plan_repair_fanout(&mut self, push_id: Uuid) -> WorkflowResult<Effect> {
        let push = self.push(push_id).ok_or(Skip::UnknownRecord(push_id))?;
        if self.fanout_state(push_id) == Some(FanoutState::Pending) {
            return Err(Skip::FanoutInFlight(push_id).into());
        }
        let missing = missing_recipients(push, &self.acknowledgments);
        if missing.is_empty() {
            return Err(Skip::NoFanoutGap(push_id).into());
        }

        self.fanouts.insert(push_id, FanoutState::Pending);
        Ok(stub_effect(push_id, &missing))
    }

    /// Patch the cache with the outcome of an executed effect.
    ///
    /// Returns the effects that must follow: a created push asks for its stubs.
    pub fn apply(&mut self, completion: &Completion) -> Vec<Effect> {
        match completion {
            Completion::SectionInserted(Ok(section)) => {
                info!("Section {} added", section.section_number);
                self.sections.push(section.clone());
            }
            Completion::SectionUpdated {
                id,
                patch,
                result: Ok(()),
            } => {
                if let Some(section) = self.sections.iter_mut().find(|s| s.id == *id) {
                    section.apply_patch(patch);
                }
            }
            Completion::NoteInserted(Ok(note)) => {
                self.notes.insert(0, note.clone());
            }
            Completion::NoteUpdated {
                id,
                patch,
                result: Ok(()),
            } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == *id) {
                    note.apply_patch(patch);
                }
            }
            Completion::PushInserted(Ok(push)) => {
                info!(
                    "Push {} created for {} recipient(s)",
                    push.id,
                    push.pushed_to.len()
                );
                self.pushes.insert(0, push.clone());
                self.fanouts.insert(push.id, FanoutState::Pending);
                return vec![stub_effect(push.id, &push.pushed_to)];
            }
            Completion::AcknowledgmentsInserted {
                push_id,
                result: Ok(acks),
            } => {
                self.fanouts.remove(push_id);
                // a reload may already have brought these rows in
                for ack in acks {
                    if self.acknowledgment(ack.id).is_none() {
                        self.acknowledgments.push(ack.clone());
                    }
                }
            }
            Completion::AcknowledgmentsInserted {
                push_id,
                result: Err(e),
            } => {
                warn!("Push {} has no acknowledgments: {}", push_id, e);
                self.fanouts.insert(*push_id, FanoutState::Failed);
                self.notify("create acknowledgments", e.to_string());
            }
            Completion::AcknowledgmentUpdated {
                id,
                patch,
                result: Ok(()),
            } => {
                if let Some(ack) = self.acknowledgments.iter_mut().find(|a| a.id == *id) {
                    ack.apply_patch(patch);
                }
            }
            failed => {
                if let Some(e) = failed.error() {
                    let action = failed.describe();
                    error!("Failed to {}: {}", action, e);
                    self.notify(action, e.to_string());
                }
            }
        }
        Vec::new()
    }

    fn notify(&mut self, action: &'static str, message: String) {
        self.notices.push(Notice { action, message });
    }
}

fn stub_effect(push_id: Uuid, recipients: &[String]) -> Effect {
    Effect::InsertAcknowledgments {
        push_id,
        stubs: recipients
            .iter()
            .map(|name| NewAcknowledgment::stub(push_id, name))
            .collect(),
    }
}
