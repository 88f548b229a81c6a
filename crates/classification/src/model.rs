use serde_json::Value;
use triage_core::{ClassificationEnvelope, EventKind};
use triage_pipeline::{retry_with_policy, Attempt, RetryPolicy};

use crate::error::ClassificationError;

const RETRYABLE_STATUS: [u16; 5] = [500, 502, 503, 504, 429];

async fn call_once(http: &reqwest::Client, model_base_url: &str, kind: EventKind, object: &Value) -> Attempt<Value, ClassificationError> {
    let url = format!("{model_base_url}/predict_{kind}");
    let response = match http.post(&url).json(object).send().await {
        Ok(r) => r,
        Err(e) => return Attempt::Retryable(ClassificationError::RequestFailed(e.to_string())),
    };

    let status = response.status().as_u16();
    if status == 200 {
        return match response.json::<Value>().await {
            Ok(v) => Attempt::Success(v),
            Err(e) => Attempt::Permanent(ClassificationError::Decode(e.to_string())),
        };
    }

    if RETRYABLE_STATUS.contains(&status) {
        Attempt::Retryable(ClassificationError::RequestFailed(format!("status {status}")))
    } else {
        Attempt::Permanent(ClassificationError::RequestFailed(format!("status {status}")))
    }
}

/// Derives `prediction` from a raw `score` when the model server omits
/// an explicit integer prediction: `1` iff `score > 0.5`, per the
/// exact-0.5 boundary case (`prediction = 0` at `score == 0.5`).
fn derive_prediction(response: &Value) -> (u8, f64) {
    let score = response.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let prediction = match response.get("prediction").and_then(Value::as_u64) {
        Some(p) => p as u8,
        None => u8::from(score > 0.5),
    };
    (prediction, score)
}

/// Scores `object` against the model server and produces a
/// `ClassificationEnvelope`. On request failure after retry exhaustion,
/// or any non-200 response, this never errors out — it returns the
/// `N/A` envelope, per the spec's explicit pick over dropping the
/// record.
pub async fn classify(http: &reqwest::Client, model_base_url: &str, kind: EventKind, object: Value) -> ClassificationEnvelope {
    let policy = RetryPolicy::linear();
    let result = retry_with_policy(&policy, |_attempt| call_once(http, model_base_url, kind, &object)).await;

    match result {
        Ok(response) => {
            let (prediction, score) = derive_prediction(&response);
            ClassificationEnvelope::scored(object, prediction, score)
        }
        Err(_) => ClassificationEnvelope::unavailable(object),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derives_prediction_from_score_at_threshold() {
        let (prediction, score) = derive_prediction(&json!({"score": 0.5}));
        assert_eq!(prediction, 0);
        assert_eq!(score, 0.5);

        let (prediction, _) = derive_prediction(&json!({"score": 0.51}));
        assert_eq!(prediction, 1);
    }

    #[test]
    fn explicit_prediction_is_preferred_over_derived() {
        let (prediction, _) = derive_prediction(&json!({"prediction": 1, "score": 0.1}));
        assert_eq!(prediction, 1);
    }
}
