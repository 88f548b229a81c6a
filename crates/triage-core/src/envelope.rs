use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prediction outcome on a `classification` record: a binary verdict, or
/// the `"N/A"` sentinel used when the model server could not be reached
/// after retry exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Binary(u8),
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Prediction {
    pub fn is_spam(&self) -> bool {
        matches!(self, Prediction::Binary(1))
    }

    pub fn label(&self) -> &'static str {
        if self.is_spam() {
            "Spam"
        } else {
            "Not Spam"
        }
    }
}

/// The payload shape carried on the `classification` stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationEnvelope {
    pub event_data: Value,
    pub prediction: Prediction,
    pub score: f64,
}

impl ClassificationEnvelope {
    pub fn scored(event_data: Value, prediction: u8, score: f64) -> Self {
        let score = (score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        Self {
            event_data,
            prediction: Prediction::Binary(prediction),
            score,
        }
    }

    /// Model server unreachable or returned a non-200 response after the
    /// retry budget was exhausted.
    pub fn unavailable(event_data: Value) -> Self {
        Self {
            event_data,
            prediction: Prediction::NotAvailable,
            score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_rounded_to_three_decimals() {
        let env = ClassificationEnvelope::scored(Value::Null, 1, 0.873_449);
        assert_eq!(env.score, 0.873);
    }

    #[test]
    fn unavailable_has_na_prediction_and_zero_score() {
        let env = ClassificationEnvelope::unavailable(Value::Null);
        assert_eq!(env.prediction, Prediction::NotAvailable);
        assert_eq!(env.score, 0.0);
        assert_eq!(env.prediction.label(), "Not Spam");
    }

    #[test]
    fn spam_label_only_for_prediction_one() {
        assert_eq!(Prediction::Binary(1).label(), "Spam");
        assert_eq!(Prediction::Binary(0).label(), "Not Spam");
    }
}
