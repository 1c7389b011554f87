//! Push fan-out tracking and gap detection
//!
//! Creating a push is two writes: the push row, then one acknowledgment stub per
//! recipient. Nothing spans them, so a push can end up with fewer acknowledgments
//! than recipients. The state tracks fan-outs in flight, and [`fanout_gaps`] finds
//! pushes whose stubs are missing so they can be re-issued on request.

use std::collections::HashMap;

use paperflow_api::{Acknowledgment, Push};
use serde::Serialize;
use uuid::Uuid;

/// Where a push's acknowledgment fan-out stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutState {
    /// Push written, stubs not yet written
    Pending,
    /// Stub write failed; the push is visible without acknowledgments
    Failed,
}

/// Recipients of one push that have no acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutGap {
    pub push_id: Uuid,
    pub missing: Vec<String>,
}

/// Recipients of `push` without a matching acknowledgment.
///
/// Matching is by name and respects duplicates: a push to `Bob, Bob` with one
/// acknowledgment for Bob is missing one Bob.
pub fn missing_recipients(push: &Push, acknowledgments: &[Acknowledgment]) -> Vec<String> {
    let mut present: HashMap<&str, usize> = HashMap::new();
    for ack in acknowledgments.iter().filter(|a| a.push_id == push.id) {
        *present.entry(ack.employee_name.as_str()).or_default() += 1;
    }

    push.pushed_to
        .iter()
        .filter(|name| match present.get_mut(name.as_str()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// Every push with fewer acknowledgments than recipients, in push order
pub fn fanout_gaps(pushes: &[Push], acknowledgments: &[Acknowledgment]) -> Vec<FanoutGap> {
    pushes
        .iter()
        .filter_map(|push| {
            let missing = missing_recipients(push, acknowledgments);
            (!missing.is_empty()).then_some(FanoutGap {
                push_id: push.id,
                missing,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paperflow_api::PushMethod;

    fn push(recipients: &[&str]) -> Push {
        Push {
            id: Uuid::new_v4(),
            section_id: Uuid::new_v4(),
            pushed_by: "kari@example.com".to_string(),
            pushed_to: recipients.iter().map(|r| r.to_string()).collect(),
            push_method: PushMethod::Email,
            message: None,
            created_at: Utc::now(),
        }
    }

    fn ack(push_id: Uuid, name: &str) -> Acknowledgment {
        Acknowledgment {
            id: Uuid::new_v4(),
            push_id,
            employee_name: name.to_string(),
            acknowledged: false,
            acknowledged_at: None,
        }
    }

    #[test]
    fn test_complete_push_has_no_gap() {
        let p = push(&["Alice", "Bob"]);
        let acks = vec![ack(p.id, "Bob"), ack(p.id, "Alice")];

        assert!(missing_recipients(&p, &acks).is_empty());
        assert!(fanout_gaps(&[p], &acks).is_empty());
    }

    #[test]
    fn test_push_without_stubs() {
        let p = push(&["Alice", "Bob"]);
        let gaps = fanout_gaps(std::slice::from_ref(&p), &[]);

        assert_eq!(
            gaps,
            vec![FanoutGap {
                push_id: p.id,
                missing: vec!["Alice".to_string(), "Bob".to_string()],
            }]
        );
    }

    #[test]
    fn test_duplicate_recipients_counted_separately() {
        let p = push(&["Bob", "Alice", "Bob"]);
        let acks = vec![ack(p.id, "Bob"), ack(p.id, "Alice")];

        assert_eq!(missing_recipients(&p, &acks), vec!["Bob".to_string()]);
    }

    #[test]
    fn test_acknowledgments_of_other_pushes_ignored() {
        let p = push(&["Alice"]);
        let other = push(&["Alice"]);
        let acks = vec![ack(other.id, "Alice")];

        let gaps = fanout_gaps(&[p.clone(), other], &acks);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].push_id, p.id);
    }
}
