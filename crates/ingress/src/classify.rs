use serde_json::Value;
use triage_core::EventKind;

/// Classifies a raw webhook body into an `EventKind` using the priority
/// order: issue notes, then issue actions, then a direct `event_name`
/// match. Anything else is unhandled. Missing keys at any step simply
/// fall through to the next rule rather than erroring.
pub fn classify(body: &Value) -> Option<EventKind> {
    if let Some(kind) = classify_issue_note(body) {
        return Some(kind);
    }
    if let Some(kind) = classify_issue_action(body) {
        return Some(kind);
    }
    classify_event_name(body)
}

fn classify_issue_note(body: &Value) -> Option<EventKind> {
    if body.get("object_kind")?.as_str()? != "note" {
        return None;
    }
    let attrs = body.get("object_attributes")?;
    if attrs.get("noteable_type")?.as_str()? != "Issue" {
        return None;
    }
    let created_at = attrs.get("created_at")?.as_str()?;
    let updated_at = attrs.get("updated_at")?.as_str()?;
    Some(if created_at == updated_at {
        EventKind::IssueNoteCreate
    } else {
        EventKind::IssueNoteUpdate
    })
}

fn classify_issue_action(body: &Value) -> Option<EventKind> {
    if body.get("object_kind")?.as_str()? != "issue" {
        return None;
    }
    let action = body.get("object_attributes")?.get("action")?.as_str()?;
    EventKind::from_issue_action(action)
}

fn classify_event_name(body: &Value) -> Option<EventKind> {
    let name = body.get("event_name")?.as_str()?;
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_name_match_classifies_user_create() {
        let body = json!({"event_name": "user_create", "email": "a@b", "user_id": 7});
        assert_eq!(classify(&body), Some(EventKind::UserCreate));
    }

    #[test]
    fn issue_note_created_at_equal_updated_at_is_create() {
        let body = json!({
            "object_kind": "note",
            "object_attributes": {
                "noteable_type": "Issue",
                "created_at": "2024-01-01T00:00:00.000Z",
                "updated_at": "2024-01-01T00:00:00.000Z",
            }
        });
        assert_eq!(classify(&body), Some(EventKind::IssueNoteCreate));
    }

    #[test]
    fn issue_note_differing_timestamps_is_update() {
        let body = json!({
            "object_kind": "note",
            "object_attributes": {
                "noteable_type": "Issue",
                "created_at": "2024-01-01T00:00:00.000Z",
                "updated_at": "2024-01-02T00:00:00.000Z",
            }
        });
        assert_eq!(classify(&body), Some(EventKind::IssueNoteUpdate));
    }

    #[test]
    fn issue_action_maps_to_issue_kind() {
        let body = json!({
            "object_kind": "issue",
            "object_attributes": {"action": "reopen"}
        });
        assert_eq!(classify(&body), Some(EventKind::IssueReopen));
    }

    #[test]
    fn unrecognized_body_is_unhandled() {
        let body = json!({"something": "else"});
        assert_eq!(classify(&body), None);
    }

    #[test]
    fn note_with_missing_keys_falls_through_rather_than_erroring() {
        let body = json!({"object_kind": "note"});
        assert_eq!(classify(&body), None);
    }
}
