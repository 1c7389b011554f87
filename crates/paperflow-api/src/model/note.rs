//! Discussion notes attached to sections

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of discussion a note carries. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    General,
    Negotiation,
    Question,
    ProposedChange,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::General => "general",
            NoteType::Negotiation => "negotiation",
            NoteType::Question => "question",
            NoteType::ProposedChange => "proposed_change",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoteType::General => "General",
            NoteType::Negotiation => "Negotiation",
            NoteType::Question => "Question",
            NoteType::ProposedChange => "Proposed Change",
        }
    }
}

impl Display for NoteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(NoteType::General),
            "negotiation" => Ok(NoteType::Negotiation),
            "question" => Ok(NoteType::Question),
            "proposed_change" => Ok(NoteType::ProposedChange),
            _ => Err(format!("Invalid note type: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub section_id: Uuid,
    pub author: String,
    pub note: String,
    pub note_type: NoteType,
    #[serde(default)]
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// An unresolved note of type question
    pub fn is_open_question(&self) -> bool {
        self.note_type == NoteType::Question && !self.resolved
    }

    pub fn apply_patch(&mut self, patch: &NotePatch) {
        if let Some(resolved) = patch.resolved {
            self.resolved = resolved;
        }
    }
}

/// Caller input for a new note
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteDraft {
    pub author: String,
    pub note: String,
    pub note_type: NoteType,
}

impl NoteDraft {
    pub fn new(author: &str, note: &str, note_type: NoteType) -> Self {
        Self {
            author: author.to_string(),
            note: note.to_string(),
            note_type,
        }
    }

    pub fn into_insert(self, section_id: Uuid) -> NewNote {
        NewNote {
            section_id,
            author: self.author,
            note: self.note,
            note_type: self.note_type,
            resolved: false,
        }
    }
}

/// Insert payload for the notes table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewNote {
    pub section_id: Uuid,
    pub author: String,
    pub note: String,
    pub note_type: NoteType,
    pub resolved: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
}

impl NotePatch {
    pub fn resolved(resolved: bool) -> Self {
        Self {
            resolved: Some(resolved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note(note_type: NoteType, resolved: bool) -> Note {
        Note {
            id: Uuid::new_v4(),
            section_id: Uuid::new_v4(),
            author: "Kari".to_string(),
            note: "Does this cover weekends?".to_string(),
            note_type,
            resolved,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_note_type_round_trips_wire_name() {
        assert_eq!(
            serde_json::to_value(NoteType::ProposedChange).unwrap(),
            json!("proposed_change")
        );
        assert_eq!(
            "proposed_change".parse::<NoteType>().unwrap(),
            NoteType::ProposedChange
        );
        assert_eq!(NoteType::ProposedChange.label(), "Proposed Change");
        assert_eq!(NoteType::default(), NoteType::General);
    }

    #[test]
    fn test_open_question() {
        assert!(note(NoteType::Question, false).is_open_question());
        assert!(!note(NoteType::Question, true).is_open_question());
        assert!(!note(NoteType::Negotiation, false).is_open_question());
    }

    #[test]
    fn test_apply_patch_flips_resolved_only() {
        let mut n = note(NoteType::Question, false);
        let before = n.clone();
        n.apply_patch(&NotePatch::resolved(true));
        assert!(n.resolved);
        assert_eq!(n.note, before.note);
        assert_eq!(n.note_type, before.note_type);

        n.apply_patch(&NotePatch::default());
        assert!(n.resolved);
    }

    #[test]
    fn test_draft_insert_starts_unresolved() {
        let section_id = Uuid::new_v4();
        let insert = NoteDraft::new("Kari", "ask union rep", NoteType::Question).into_insert(section_id);
        assert_eq!(insert.section_id, section_id);
        assert!(!insert.resolved);
        let value = serde_json::to_value(&insert).unwrap();
        assert_eq!(value["note_type"], json!("question"));
    }
}
