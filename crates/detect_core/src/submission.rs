//! Submission state machine and interpretation of classification replies.

use crate::catalog::Category;
use crate::staging::FileDescriptor;
use serde::Deserialize;
use serde_json::Value;

/// Message shown whenever the failure carries no server-supplied text.
pub const GENERIC_ERROR_MESSAGE: &str = "Error analyzing image";

/// Multipart field name that carries the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// Verdict for one submitted image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub cancer_detected: bool,
    /// Display name of the category the image was analyzed for.
    pub category_label: String,
    /// Confidence in [0,1].
    pub confidence: f64,
    pub details: String,
}

impl AnalysisResult {
    /// Builds a result; `details` is always derived locally from the verdict.
    pub fn new(category: &Category, cancer_detected: bool, confidence: f64) -> Self {
        let details = if cancer_detected {
            format!(
                "Potential {} detected. Please consult with a doctor.",
                category.name
            )
        } else {
            "No cancer detected.".to_string()
        };
        Self {
            cancer_detected,
            category_label: category.name.clone(),
            confidence,
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded(AnalysisResult),
    Failed(String),
}

/// Everything a backend needs to perform one analysis.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub category_id: String,
    pub file: FileDescriptor,
}

/// Raw HTTP reply as seen by the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RemoteReply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Performs the remote call. Implementations block until the reply arrives;
/// the workflow runs them off the UI thread.
pub trait AnalysisBackend: Send + Sync {
    fn analyze(&self, request: &UploadRequest) -> Result<RemoteReply, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("server rejected the image with HTTP {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("confidence is not a finite number: {0}")]
    InvalidConfidence(f64),
    #[error("could not start upload worker: {0}")]
    Worker(std::io::Error),
}

impl SubmissionError {
    /// Text safe to show to the user. Only a server-supplied `error` string is
    /// passed through; everything else maps to the generic message.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerdictBody {
    cancer_detected: bool,
    confidence: f64,
}

/// Turns a raw reply into a result for `category`.
pub fn interpret_reply(
    reply: &RemoteReply,
    category: &Category,
) -> Result<AnalysisResult, SubmissionError> {
    if !reply.is_success() {
        let message = serde_json::from_slice::<Value>(&reply.body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
        return Err(SubmissionError::Rejected {
            status: reply.status,
            message,
        });
    }
    let body: VerdictBody = serde_json::from_slice(&reply.body)?;
    let confidence = checked_confidence(body.confidence)?;
    Ok(AnalysisResult::new(category, body.cancer_detected, confidence))
}

/// Clamps out-of-range confidences into [0,1]; non-finite values are rejected.
pub fn checked_confidence(raw: f64) -> Result<f64, SubmissionError> {
    if !raw.is_finite() {
        return Err(SubmissionError::InvalidConfidence(raw));
    }
    if !(0.0..=1.0).contains(&raw) {
        tracing::warn!("confidence {raw} outside [0,1]; clamping");
    }
    Ok(raw.clamp(0.0, 1.0))
}

/// Identifies one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// How a completion was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result became the new state.
    Applied,
    /// The request was outstanding but its file had been replaced; the result was
    /// dropped and the state returned to `Idle`.
    Stale,
    /// The ticket no longer matches anything (after a reset); nothing changed.
    Orphaned,
}

#[derive(Debug)]
struct Outstanding {
    ticket: Ticket,
    stale: bool,
}

/// Owns the [`SubmissionState`] and enforces a single outstanding request.
#[derive(Debug, Default)]
pub struct SubmissionCoordinator {
    state: SubmissionState,
    outstanding: Option<Outstanding>,
    next_ticket: u64,
}

impl SubmissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight)
    }

    /// Starts a submission. Returns `None` while another one is in flight.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.is_in_flight() {
            return None;
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding = Some(Outstanding {
            ticket,
            stale: false,
        });
        self.state = SubmissionState::InFlight;
        Some(ticket)
    }

    /// Called when a new file is staged. An in-flight request keeps the state
    /// `InFlight` but its eventual result will be discarded; a shown result is
    /// dropped.
    pub fn file_replaced(&mut self) {
        match self.state {
            SubmissionState::InFlight => {
                if let Some(outstanding) = self.outstanding.as_mut() {
                    outstanding.stale = true;
                }
            }
            SubmissionState::Succeeded(_) | SubmissionState::Failed(_) => {
                self.state = SubmissionState::Idle;
            }
            SubmissionState::Idle => {}
        }
    }

    /// Applies the outcome of the request identified by `ticket`.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, SubmissionError>,
    ) -> Completion {
        let stale = match &self.outstanding {
            Some(o) if o.ticket == ticket => o.stale,
            _ => {
                match &outcome {
                    Ok(_) => tracing::debug!("ignoring completion for orphaned {ticket:?}"),
                    Err(err) => tracing::warn!("discarding failed orphaned {ticket:?}: {err}"),
                }
                return Completion::Orphaned;
            }
        };
        self.outstanding = None;
        if stale {
            match &outcome {
                Ok(_) => tracing::warn!("discarding result of {ticket:?}: staged file changed"),
                Err(err) => tracing::warn!("discarding failed {ticket:?} after file change: {err}"),
            }
            self.state = SubmissionState::Idle;
            return Completion::Stale;
        }
        self.state = match outcome {
            Ok(result) => {
                tracing::info!(
                    "analysis finished: detected={} confidence={:.3}",
                    result.cancer_detected,
                    result.confidence
                );
                SubmissionState::Succeeded(result)
            }
            Err(err) => {
                match &err {
                    SubmissionError::Rejected { status, message } => {
                        tracing::warn!("analysis rejected (HTTP {status}): {message:?}")
                    }
                    other => tracing::error!("analysis failed: {other}"),
                }
                SubmissionState::Failed(err.user_message())
            }
        };
        Completion::Applied
    }

    /// Dismisses a failure alert, keeping the staged file for another attempt.
    pub fn acknowledge_failure(&mut self) {
        if matches!(self.state, SubmissionState::Failed(_)) {
            self.state = SubmissionState::Idle;
        }
    }

    /// Back to `Idle`; any outstanding request becomes orphaned.
    pub fn reset(&mut self) {
        if let Some(outstanding) = self.outstanding.take() {
            tracing::debug!("orphaning in-flight submission {:?}", outstanding.ticket);
        }
        self.state = SubmissionState::Idle;
    }
}
