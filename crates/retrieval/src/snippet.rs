use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use triage_platform::PlatformClient;

use crate::error::RetrievalError;

#[derive(Debug, Deserialize)]
struct VerifyEmailResponse {
    domain_verified: bool,
    user_verified: bool,
}

/// Lists public snippets and keeps only the ones authored by an
/// untrusted email, by delegating the trust decision to the
/// verification service's `/verify_email` endpoint — keeping the two
/// stages decoupled, as the design notes recommend, rather than reaching
/// into verification's trust list directly.
pub async fn fetch_untrusted_snippets(
    platform: &PlatformClient,
    http: &reqwest::Client,
    verify_email_url: &str,
) -> Result<Vec<Value>, RetrievalError> {
    let snippets = platform.list_public_snippets().await?;
    let mut kept = Vec::new();

    for snippet in snippets {
        let email = snippet
            .get("author")
            .and_then(|a| a.get("email"))
            .and_then(Value::as_str);

        let Some(email) = email else {
            // No author email on the snippet — cannot judge trust, so
            // keep it (same opaque-payload tolerance the notification
            // and verification stages apply elsewhere).
            kept.push(snippet);
            continue;
        };

        match verify_email(http, verify_email_url, email).await {
            Ok(verdict) if verdict.domain_verified || verdict.user_verified => {
                // trusted author — drop
            }
            Ok(_) => kept.push(snippet),
            Err(e) => {
                warn!(error = %e, "verify_email call failed, keeping snippet conservatively");
                kept.push(snippet);
            }
        }
    }

    Ok(kept)
}

async fn verify_email(
    http: &reqwest::Client,
    base_url: &str,
    email: &str,
) -> Result<VerifyEmailResponse, RetrievalError> {
    let url = format!("{base_url}/verify_email");
    let response = http
        .post(&url)
        .json(&serde_json::json!({"email": email}))
        .send()
        .await
        .map_err(|e| RetrievalError::VerifyCall(e.to_string()))?;

    response
        .json::<VerifyEmailResponse>()
        .await
        .map_err(|e| RetrievalError::VerifyCall(e.to_string()))
}
