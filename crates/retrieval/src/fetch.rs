use serde_json::Value;
use triage_core::EventKind;
use triage_platform::PlatformClient;

use crate::error::RetrievalError;

fn field_i64<'a>(payload: &'a Value, path: &[&str], name: &'static str) -> Result<i64, RetrievalError> {
    let mut current = payload;
    for key in path {
        current = current.get(key).ok_or(RetrievalError::MissingField(name))?;
    }
    current.as_i64().ok_or(RetrievalError::MissingField(name))
}

/// Fetches the authoritative object for a single (non-snippet) event,
/// per the per-kind dispatch table in the retrieval contract.
pub async fn fetch_object(
    kind: EventKind,
    payload: &Value,
    platform: &PlatformClient,
) -> Result<Value, RetrievalError> {
    if kind.is_user() {
        let user_id = field_i64(payload, &["user_id"], "user_id")?;
        return Ok(platform.get_user(user_id).await?);
    }

    if kind.is_project() {
        let project_id = field_i64(payload, &["project_id"], "project_id")?;
        return Ok(platform.get_project(project_id).await?);
    }

    if kind.is_issue() {
        let project_id = field_i64(payload, &["object_attributes", "project_id"], "object_attributes.project_id")?;
        let issue_iid = field_i64(payload, &["object_attributes", "id"], "object_attributes.id")?;
        return Ok(platform.get_issue(project_id, issue_iid).await?);
    }

    if kind.is_issue_note() {
        let project_id = field_i64(payload, &["project_id"], "project_id")?;
        let issue_iid = field_i64(payload, &["issue", "id"], "issue.id")?;
        let note_id = field_i64(payload, &["object_attributes", "id"], "object_attributes.id")?;
        return Ok(platform.get_issue_note(project_id, issue_iid, note_id).await?);
    }

    if kind.is_group() {
        let group_id = field_i64(payload, &["group_id"], "group_id")?;
        return Ok(platform.get_group(group_id).await?);
    }

    unreachable!("snippet_check is handled by the caller via fetch_untrusted_snippets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_field_is_reported_by_name() {
        let payload = json!({});
        let err = field_i64(&payload, &["user_id"], "user_id").unwrap_err();
        assert!(matches!(err, RetrievalError::MissingField("user_id")));
    }

    #[test]
    fn nested_field_is_extracted() {
        let payload = json!({"object_attributes": {"project_id": 42}});
        let value = field_i64(&payload, &["object_attributes", "project_id"], "x").unwrap();
        assert_eq!(value, 42);
    }
}
