//! Policy pushes and their per-recipient acknowledgments

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a section was distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushMethod {
    #[default]
    Email,
    Print,
    InPerson,
    App,
}

impl PushMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushMethod::Email => "email",
            PushMethod::Print => "print",
            PushMethod::InPerson => "in_person",
            PushMethod::App => "app",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PushMethod::Email => "Email",
            PushMethod::Print => "Print",
            PushMethod::InPerson => "In Person",
            PushMethod::App => "App",
        }
    }
}

impl Display for PushMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PushMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(PushMethod::Email),
            "print" => Ok(PushMethod::Print),
            "in_person" => Ok(PushMethod::InPerson),
            "app" => Ok(PushMethod::App),
            _ => Err(format!("Invalid push method: {}", s)),
        }
    }
}

/// A record of distributing one section to a list of named recipients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Push {
    pub id: Uuid,
    pub section_id: Uuid,
    pub pushed_by: String,
    /// Recipient names in input order; duplicates are kept
    pub pushed_to: Vec<String>,
    pub push_method: PushMethod,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller input for a new push. `recipients` is the raw comma-separated text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PushDraft {
    pub recipients: String,
    pub push_method: PushMethod,
    pub message: Option<String>,
}

impl PushDraft {
    pub fn new(recipients: &str, push_method: PushMethod) -> Self {
        Self {
            recipients: recipients.to_string(),
            push_method,
            message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// Insert payload for the pushes table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewPush {
    pub section_id: Uuid,
    pub pushed_by: String,
    pub pushed_to: Vec<String>,
    pub push_method: PushMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-recipient receipt belonging to a push
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub id: Uuid,
    pub push_id: Uuid,
    pub employee_name: String,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Acknowledgment {
    pub fn apply_patch(&mut self, patch: &AcknowledgmentPatch) {
        self.acknowledged = patch.acknowledged;
        self.acknowledged_at = patch.acknowledged_at;
    }
}

/// Insert payload for an acknowledgment stub
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewAcknowledgment {
    pub push_id: Uuid,
    pub employee_name: String,
    pub acknowledged: bool,
}

impl NewAcknowledgment {
    /// Unacknowledged stub for one recipient
    pub fn stub(push_id: Uuid, employee_name: &str) -> Self {
        Self {
            push_id,
            employee_name: employee_name.to_string(),
            acknowledged: false,
        }
    }
}

/// Full acknowledgment state as written by a toggle.
///
/// Both columns are always sent: `acknowledged_at` serializes as `null` when cleared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcknowledgmentPatch {
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl AcknowledgmentPatch {
    pub fn acknowledge(now: DateTime<Utc>) -> Self {
        Self {
            acknowledged: true,
            acknowledged_at: Some(now),
        }
    }

    pub fn revoke() -> Self {
        Self {
            acknowledged: false,
            acknowledged_at: None,
        }
    }

    /// The state that follows `current` when toggled at `now`.
    pub fn toggled_from(current: bool, now: DateTime<Utc>) -> Self {
        if current {
            Self::revoke()
        } else {
            Self::acknowledge(now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_method_wire_names() {
        assert_eq!(serde_json::to_value(PushMethod::InPerson).unwrap(), json!("in_person"));
        assert_eq!("app".parse::<PushMethod>().unwrap(), PushMethod::App);
        assert!("fax".parse::<PushMethod>().is_err());
        assert_eq!(PushMethod::InPerson.to_string(), "in_person");
    }

    #[test]
    fn test_revoke_serializes_explicit_null() {
        let value = serde_json::to_value(AcknowledgmentPatch::revoke()).unwrap();
        assert_eq!(value, json!({ "acknowledged": false, "acknowledged_at": null }));
    }

    #[test]
    fn test_toggled_from() {
        let now = Utc::now();
        assert_eq!(
            AcknowledgmentPatch::toggled_from(false, now),
            AcknowledgmentPatch::acknowledge(now)
        );
        assert_eq!(
            AcknowledgmentPatch::toggled_from(true, now),
            AcknowledgmentPatch::revoke()
        );
    }

    #[test]
    fn test_acknowledgment_defaults_from_row() {
        let row = json!({
            "id": Uuid::nil(),
            "push_id": Uuid::nil(),
            "employee_name": "Alice"
        });
        let ack: Acknowledgment = serde_json::from_value(row).unwrap();
        assert!(!ack.acknowledged);
        assert!(ack.acknowledged_at.is_none());
    }

    #[test]
    fn test_new_push_omits_missing_message() {
        let insert = NewPush {
            section_id: Uuid::nil(),
            pushed_by: "kari@example.com".to_string(),
            pushed_to: vec!["Alice".to_string(), "Bob".to_string()],
            push_method: PushMethod::Email,
            message: None,
        };
        let value = serde_json::to_value(&insert).unwrap();
        assert!(value.get("message").is_none());
        assert_eq!(value["pushed_to"], json!(["Alice", "Bob"]));
    }
}
