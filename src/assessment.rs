//! Question assessment form
//!
//! Validates the three form fields locally, submits them, and keeps the
//! latest result or error for display. Only one submission may be in flight.

use crate::transport::{NormalizedError, RequestContext, Transport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const ASSESSMENTS_PATH: &str = "/api/v1/assessments/";

const MISSING_FIELDS: &str = "Please fill all fields.";
const ALREADY_SUBMITTING: &str = "An assessment is already being submitted";

/// Server verdict for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    #[serde(default)]
    pub difficulty_score: Option<f64>,
    #[serde(default)]
    pub advice: Option<String>,
}

#[derive(Default)]
struct FormState {
    submitting: bool,
    result: Option<AssessmentResult>,
    error: Option<NormalizedError>,
}

/// One assessment form instance
pub struct AssessmentForm<T> {
    transport: T,
    state: Mutex<FormState>,
}

impl<T: Transport> AssessmentForm<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: Mutex::new(FormState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    #[must_use]
    pub fn result(&self) -> Option<AssessmentResult> {
        self.lock().result.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<NormalizedError> {
        self.lock().error.clone()
    }

    /// Drop the displayed result and error
    ///
    /// # Errors
    /// Validation error while a submission is in flight.
    pub fn clear(&self) -> Result<(), NormalizedError> {
        let mut state = self.lock();
        if state.submitting {
            return Err(NormalizedError::validation(ALREADY_SUBMITTING));
        }
        state.result = None;
        state.error = None;
        Ok(())
    }

    /// Submit one question for assessment.
    ///
    /// Any previous result is discarded as soon as the submission starts.
    ///
    /// # Errors
    /// Validation error (nothing sent) when a field is blank or a submission
    /// is in flight; otherwise whatever the transport or decoding produced.
    pub async fn submit(
        &self,
        question: &str,
        major: &str,
        level: &str,
    ) -> Result<AssessmentResult, NormalizedError> {
        {
            let mut state = self.lock();
            if state.submitting {
                // Leave the in-flight submission's display state alone
                return Err(NormalizedError::validation(ALREADY_SUBMITTING));
            }
            state.result = None;
            state.error = None;

            if [question, major, level].iter().any(|f| f.trim().is_empty()) {
                let err = NormalizedError::validation(MISSING_FIELDS);
                state.error = Some(err.clone());
                return Err(err);
            }
            state.submitting = true;
        }

        let mut guard = SubmittingGuard { owner: self, armed: true };

        let request = RequestContext::post(ASSESSMENTS_PATH)
            .with_json(json!({
                "question": question,
                "major": major,
                "level": level,
            }))
            .authenticated();

        let outcome = match self.transport.execute(request).await {
            Ok(body) => body
                .into_json()
                .ok_or_else(|| NormalizedError::decode("Assessment reply was not JSON"))
                .and_then(decode_result),
            Err(e) => Err(e),
        };

        {
            let mut state = self.lock();
            state.submitting = false;
            match &outcome {
                Ok(result) => {
                    tracing::info!(
                        difficulty = ?result.difficulty_score,
                        has_advice = result.advice.is_some(),
                        "Assessment received"
                    );
                    state.result = Some(result.clone());
                }
                Err(e) => {
                    tracing::warn!(kind = e.kind.as_str(), error = %e.message, "Assessment failed");
                    state.error = Some(e.clone());
                }
            }
        }

        guard.armed = false;
        outcome
    }
}

fn decode_result(value: serde_json::Value) -> Result<AssessmentResult, NormalizedError> {
    if !value.is_object() {
        return Err(NormalizedError::decode("Assessment reply is not a JSON object"));
    }
    serde_json::from_value(value)
        .map_err(|e| NormalizedError::decode(format!("Failed to parse assessment: {e}")))
}

/// Re-enables the form if a `submit` future is dropped mid-flight
struct SubmittingGuard<'a, T: Transport> {
    owner: &'a AssessmentForm<T>,
    armed: bool,
}

impl<T: Transport> Drop for SubmittingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.owner.lock().submitting = false;
        }
    }
}
