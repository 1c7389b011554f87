//! Record models
//!
//! Each table gets three shapes: the stored row, the insert payload (no server-assigned
//! columns), and a patch carrying only the columns an update touches.

pub mod note;
pub mod push;
pub mod section;

pub use note::{NewNote, Note, NoteDraft, NotePatch, NoteType};
pub use push::{
    Acknowledgment, AcknowledgmentPatch, NewAcknowledgment, NewPush, Push, PushDraft, PushMethod,
};
pub use section::{DocType, NewSection, Section, SectionDraft, SectionPatch};
