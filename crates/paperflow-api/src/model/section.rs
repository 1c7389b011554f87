//! Contract and handbook sections

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which document a section belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    #[default]
    Contract,
    Handbook,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Contract => "contract",
            DocType::Handbook => "handbook",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            DocType::Contract => "Contract",
            DocType::Handbook => "Handbook",
        }
    }
}

impl Display for DocType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contract" => Ok(DocType::Contract),
            "handbook" => Ok(DocType::Handbook),
            _ => Err(format!("Invalid doc type: {}", s)),
        }
    }
}

/// One numbered unit of a contract or handbook, as stored remotely
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub doc_type: DocType,
    pub section_number: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Free-text annotation kept alongside the official wording
    #[serde(default, rename = "kari_notes", alias = "annotation")]
    pub annotation: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub sort_order: i64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Section {
    /// Body text, with a missing body read as empty
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Merge the columns present in `patch` into this row.
    pub fn apply_patch(&mut self, patch: &SectionPatch) {
        if let Some(doc_type) = patch.doc_type {
            self.doc_type = doc_type;
        }
        if let Some(section_number) = &patch.section_number {
            self.section_number = section_number.clone();
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = Some(body.clone());
        }
        if let Some(annotation) = &patch.annotation {
            self.annotation = Some(annotation.clone());
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
    }
}

/// Caller input for a new section; the workflow assigns `sort_order`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionDraft {
    pub doc_type: DocType,
    pub section_number: String,
    pub title: String,
    pub body: String,
    pub annotation: Option<String>,
    pub category: Option<String>,
}

impl SectionDraft {
    pub fn new(doc_type: DocType, section_number: &str, title: &str, body: &str) -> Self {
        Self {
            doc_type,
            section_number: section_number.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    pub fn with_annotation(mut self, annotation: &str) -> Self {
        self.annotation = Some(annotation.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Turn the draft into an insert payload at the given position.
    pub fn into_insert(self, sort_order: i64) -> NewSection {
        NewSection {
            doc_type: self.doc_type,
            section_number: self.section_number,
            title: self.title,
            body: self.body,
            annotation: self.annotation.filter(|a| !a.trim().is_empty()),
            category: self.category,
            sort_order,
        }
    }
}

/// Insert payload for the sections table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewSection {
    pub doc_type: DocType,
    pub section_number: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "kari_notes", skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub sort_order: i64,
}

/// Partial update for a section; absent columns are left untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "kari_notes", skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SectionPatch {
    pub fn title(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn body(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    pub fn annotation(annotation: &str) -> Self {
        Self {
            annotation: Some(annotation.to_string()),
            ..Default::default()
        }
    }

    /// True when the patch touches no column at all
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Copy of this patch carrying a modification time, as sent to the store.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(now),
            ..self.clone()
        }
    }
}
