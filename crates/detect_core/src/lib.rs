//! Core of the image analysis workflow: a category catalog, single-file staging,
//! one-at-a-time submission to a remote classifier, and the view model for its
//! verdict.

pub mod catalog;
pub mod client;
pub mod config;
pub mod presenter;
pub mod staging;
pub mod submission;
pub mod workflow;

pub use catalog::{Category, CategoryCatalog, CategoryIcon, CategoryStyle};
pub use client::HttpAnalysisClient;
pub use config::{AppConfig, ConfigError};
pub use presenter::{ResultView, Tone, VerdictView, format_confidence, format_size_mb};
pub use staging::{FileDescriptor, FileStagingArea, NoPreview, PreviewProvider, StagedFile};
pub use submission::{
    AnalysisBackend, AnalysisResult, Completion, GENERIC_ERROR_MESSAGE, RemoteReply,
    SubmissionError, SubmissionState, Ticket, TransportError, UploadRequest,
};
pub use workflow::{DetectionSession, DetectionWorkflow, Waker, WorkflowError};
