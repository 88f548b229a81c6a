use serde_json::Value;
use tracing::debug;
use triage_core::EventKind;
use triage_platform::PlatformClient;

use crate::error::VerificationError;
use crate::group::pick_highest_access_member;

/// Extracts the email address to run the trust decision against. Group
/// kinds require an extra platform API round trip: fetch the member
/// list, pick the highest-access member (last-seen wins on ties), and
/// fall back to a direct user lookup if that member's email is blank.
/// Snippet kind never has an email — verification for it is deferred.
pub async fn extract_email(
    kind: EventKind,
    payload: &Value,
    platform: &PlatformClient,
) -> Result<Option<String>, VerificationError> {
    if kind.is_snippet() {
        return Ok(None);
    }

    if kind.is_project() {
        return Ok(payload.get("owner_email").and_then(Value::as_str).map(str::to_string));
    }

    if kind.is_user() {
        return Ok(payload.get("email").and_then(Value::as_str).map(str::to_string));
    }

    if kind.is_issue() || kind.is_issue_note() {
        return Ok(payload
            .get("user")
            .and_then(|u| u.get("email"))
            .and_then(Value::as_str)
            .map(str::to_string));
    }

    if kind.is_group() {
        let group_id = payload
            .get("group_id")
            .and_then(Value::as_i64)
            .ok_or(VerificationError::EmailNotFound)?;

        let members = platform.get_group_members(group_id).await?;
        let Some(top) = pick_highest_access_member(&members) else {
            return Ok(None);
        };

        if let Some(email) = top.email.as_ref().filter(|e| !e.is_empty()) {
            return Ok(Some(email.clone()));
        }

        debug!(group_id, user_id = top.id, "member email blank, falling back to user lookup");
        let user = platform.get_user(top.id).await?;
        return Ok(user.get("email").and_then(Value::as_str).map(str::to_string));
    }

    unreachable!("every EventKind variant is covered by one of the branches above")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn project_kind_reads_owner_email() {
        let platform = PlatformClient::new("http://localhost", "token", std::time::Duration::from_secs(1));
        let payload = json!({"owner_email": "owner@example.com"});
        let email = extract_email(EventKind::ProjectCreate, &payload, &platform)
            .await
            .unwrap();
        assert_eq!(email.as_deref(), Some("owner@example.com"));
    }

    #[tokio::test]
    async fn user_kind_reads_email() {
        let platform = PlatformClient::new("http://localhost", "token", std::time::Duration::from_secs(1));
        let payload = json!({"email": "u@example.com"});
        let email = extract_email(EventKind::UserCreate, &payload, &platform)
            .await
            .unwrap();
        assert_eq!(email.as_deref(), Some("u@example.com"));
    }

    #[tokio::test]
    async fn issue_kind_reads_nested_user_email() {
        let platform = PlatformClient::new("http://localhost", "token", std::time::Duration::from_secs(1));
        let payload = json!({"user": {"email": "reporter@example.com"}});
        let email = extract_email(EventKind::IssueOpen, &payload, &platform)
            .await
            .unwrap();
        assert_eq!(email.as_deref(), Some("reporter@example.com"));
    }

    #[tokio::test]
    async fn snippet_kind_has_no_email() {
        let platform = PlatformClient::new("http://localhost", "token", std::time::Duration::from_secs(1));
        let email = extract_email(EventKind::SnippetCheck, &json!({}), &platform)
            .await
            .unwrap();
        assert!(email.is_none());
    }

    #[tokio::test]
    async fn issue_kind_missing_user_yields_none_not_error() {
        let platform = PlatformClient::new("http://localhost", "token", std::time::Duration::from_secs(1));
        let email = extract_email(EventKind::IssueOpen, &json!({}), &platform)
            .await
            .unwrap();
        assert!(email.is_none());
    }
}
