//! Derived views over the cached tables
//!
//! Everything here is recomputed from the raw collections on demand; nothing is stored.

use std::fmt::{Display, Formatter};

use paperflow_api::{Acknowledgment, DocType, Note, Push, Section};
use serde::Serialize;
use uuid::Uuid;

/// Section list filter: document type AND search text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    /// `None` shows both document types
    pub doc_type: Option<DocType>,
    pub search: String,
}

impl SectionFilter {
    pub fn matches(&self, section: &Section) -> bool {
        if let Some(doc_type) = self.doc_type
            && section.doc_type != doc_type
        {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }

        let needle = self.search.to_lowercase();
        section.title.to_lowercase().contains(&needle)
            || section.section_number.to_lowercase().contains(&needle)
            || section.body_text().to_lowercase().contains(&needle)
    }
}

/// Sections passing `filter`, in cache order
pub fn filter_sections<'a>(sections: &'a [Section], filter: &SectionFilter) -> Vec<&'a Section> {
    sections.iter().filter(|s| filter.matches(s)).collect()
}

/// Per-section counts shown next to a section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionBadges {
    pub notes: usize,
    pub open_questions: usize,
    pub pushes: usize,
}

pub fn section_badges(section_id: Uuid, notes: &[Note], pushes: &[Push]) -> SectionBadges {
    let mut badges = SectionBadges {
        pushes: pushes.iter().filter(|p| p.section_id == section_id).count(),
        ..Default::default()
    };
    for note in notes.iter().filter(|n| n.section_id == section_id) {
        badges.notes += 1;
        if note.is_open_question() {
            badges.open_questions += 1;
        }
    }
    badges
}

/// Dashboard totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub sections: usize,
    pub notes: usize,
    pub open_questions: usize,
    pub pushes: usize,
    pub pending_acknowledgments: usize,
}

pub fn stats(
    sections: &[Section],
    notes: &[Note],
    pushes: &[Push],
    acknowledgments: &[Acknowledgment],
) -> Stats {
    Stats {
        sections: sections.len(),
        notes: notes.len(),
        open_questions: notes.iter().filter(|n| n.is_open_question()).count(),
        pushes: pushes.len(),
        pending_acknowledgments: acknowledgments.iter().filter(|a| !a.acknowledged).count(),
    }
}

/// Acknowledged over total for one push. Displays as `acked/total`, `0/0` when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AckTally {
    pub acked: usize,
    pub total: usize,
}

impl AckTally {
    /// Every recipient acknowledged. A push without acknowledgments is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.acked == self.total
    }
}

impl Display for AckTally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.acked, self.total)
    }
}

pub fn ack_tally(push_id: Uuid, acknowledgments: &[Acknowledgment]) -> AckTally {
    acknowledgments
        .iter()
        .filter(|a| a.push_id == push_id)
        .fold(AckTally::default(), |mut tally, ack| {
            tally.total += 1;
            if ack.acknowledged {
                tally.acked += 1;
            }
            tally
        })
}

pub fn section_notes(section_id: Uuid, notes: &[Note]) -> Vec<&Note> {
    notes.iter().filter(|n| n.section_id == section_id).collect()
}

pub fn section_pushes(section_id: Uuid, pushes: &[Push]) -> Vec<&Push> {
    pushes.iter().filter(|p| p.section_id == section_id).collect()
}

pub fn push_acknowledgments(push_id: Uuid, acknowledgments: &[Acknowledgment]) -> Vec<&Acknowledgment> {
    acknowledgments
        .iter()
        .filter(|a| a.push_id == push_id)
        .collect()
}
