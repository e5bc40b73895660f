//! The detection workflow for one category: staging, submission and reset.

use crate::catalog::{Category, CategoryCatalog, CategoryStyle};
use crate::presenter::{self, ResultView};
use crate::staging::{FileDescriptor, FileStagingArea, PreviewProvider, StagedFile};
use crate::submission::{
    AnalysisBackend, AnalysisResult, Completion, SubmissionCoordinator, SubmissionError,
    SubmissionState, Ticket, UploadRequest, interpret_reply,
};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cancer type not found: {0}")]
    CategoryNotFound(String),
    #[error("no file staged")]
    NoFileStaged,
    #[error("an analysis is already running")]
    AlreadyInFlight,
    #[error("could not start the analysis: {0}")]
    WorkerUnavailable(String),
}

/// Called from the upload thread after a result has been queued.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

struct Finished {
    ticket: Ticket,
    outcome: Result<AnalysisResult, SubmissionError>,
}

/// State of one detection view. Results of background submissions are queued
/// and applied by [`DetectionWorkflow::poll`] on the owning thread.
pub struct DetectionWorkflow<P: PreviewProvider> {
    category: Category,
    style: CategoryStyle,
    staging: FileStagingArea<P>,
    coordinator: SubmissionCoordinator,
    backend: Arc<dyn AnalysisBackend>,
    tx: Sender<Finished>,
    rx: Receiver<Finished>,
    waker: Option<Waker>,
}

impl<P: PreviewProvider> DetectionWorkflow<P> {
    pub fn open(
        catalog: &CategoryCatalog,
        category_id: &str,
        backend: Arc<dyn AnalysisBackend>,
        provider: P,
    ) -> Result<Self, WorkflowError> {
        let category = catalog
            .find(category_id)
            .cloned()
            .ok_or_else(|| WorkflowError::CategoryNotFound(category_id.to_string()))?;
        let style = catalog.style_for(&category.id);
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            category,
            style,
            staging: FileStagingArea::new(provider),
            coordinator: SubmissionCoordinator::new(),
            backend,
            tx,
            rx,
            waker: None,
        })
    }

    /// Installs a callback run after each background result is queued, e.g. to
    /// request a repaint.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn style(&self) -> CategoryStyle {
        self.style
    }

    pub fn staged(&self) -> Option<&StagedFile<P::Preview>> {
        self.staging.staged()
    }

    pub fn has_preview(&self) -> bool {
        self.staging.has_preview()
    }

    pub fn drag_active(&self) -> bool {
        self.staging.drag_active()
    }

    pub fn state(&self) -> &SubmissionState {
        self.coordinator.state()
    }

    pub fn view(&self) -> ResultView {
        presenter::render(self.coordinator.state())
    }

    pub fn can_submit(&self) -> bool {
        self.staging.staged().is_some() && !self.coordinator.is_in_flight()
    }

    /// Stages `file`. Allowed in every state; while a submission is in flight
    /// its result will be discarded when it arrives.
    pub fn select_file(&mut self, file: FileDescriptor) {
        self.staging.select_file(file);
        self.coordinator.file_replaced();
    }

    pub fn drag_enter(&mut self) {
        self.staging.drag_enter();
    }

    pub fn drag_over(&mut self) {
        self.staging.drag_over();
    }

    pub fn drag_leave(&mut self) {
        self.staging.drag_leave();
    }

    /// Stages the first dropped file; returns whether anything was staged.
    pub fn drop_files<I>(&mut self, files: I) -> bool
    where
        I: IntoIterator<Item = FileDescriptor>,
    {
        let staged = self.staging.drop_files(files);
        if staged {
            self.coordinator.file_replaced();
        }
        staged
    }

    /// Uploads the staged file on a background thread.
    pub fn submit(&mut self) -> Result<Ticket, WorkflowError> {
        let file = self
            .staging
            .staged()
            .ok_or(WorkflowError::NoFileStaged)?
            .file()
            .clone();
        let ticket = self
            .coordinator
            .begin()
            .ok_or(WorkflowError::AlreadyInFlight)?;
        tracing::info!(
            "submitting {} for {} as {ticket:?}",
            file.name,
            self.category.id
        );

        let request = UploadRequest {
            category_id: self.category.id.clone(),
            file,
        };
        let backend = Arc::clone(&self.backend);
        let category = self.category.clone();
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let spawned = thread::Builder::new()
            .name("analysis-upload".into())
            .spawn(move || {
                let outcome = backend
                    .analyze(&request)
                    .map_err(SubmissionError::from)
                    .and_then(|reply| interpret_reply(&reply, &category));
                if tx.send(Finished { ticket, outcome }).is_err() {
                    tracing::debug!("workflow closed before {ticket:?} finished");
                    return;
                }
                if let Some(wake) = waker {
                    wake();
                }
            });
        match spawned {
            Ok(_) => Ok(ticket),
            Err(e) => Err(self.abandon(ticket, e)),
        }
    }

    /// Settles `ticket` as failed when its upload thread could not be started.
    /// The state shows the generic alert and the error is also returned.
    fn abandon(&mut self, ticket: Ticket, cause: std::io::Error) -> WorkflowError {
        let reason = cause.to_string();
        self.coordinator.finish(ticket, Err(SubmissionError::Worker(cause)));
        WorkflowError::WorkerUnavailable(reason)
    }

    /// Applies every queued completion without blocking.
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(done) => completions.push(self.coordinator.finish(done.ticket, done.outcome)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        completions
    }

    /// Blocks until one completion arrives or `timeout` elapses.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(done) => Some(self.coordinator.finish(done.ticket, done.outcome)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Dismisses the failure alert; the staged file stays for a retry.
    pub fn acknowledge_alert(&mut self) {
        self.coordinator.acknowledge_failure();
    }

    /// Clears the staged file (and its preview) and returns to `Idle`.
    pub fn reset(&mut self) {
        self.staging.clear();
        self.coordinator.reset();
    }
}

/// A detection view: either a workflow for a known category or the not-found
/// guard, which refuses every interaction.
pub enum DetectionSession<P: PreviewProvider> {
    NotFound { requested: String },
    Ready(Box<DetectionWorkflow<P>>),
}

impl<P: PreviewProvider> DetectionSession<P> {
    pub fn open(
        catalog: &CategoryCatalog,
        category_id: &str,
        backend: Arc<dyn AnalysisBackend>,
        provider: P,
    ) -> Self {
        match DetectionWorkflow::open(catalog, category_id, backend, provider) {
            Ok(workflow) => DetectionSession::Ready(Box::new(workflow)),
            Err(e) => {
                tracing::warn!("{e}");
                DetectionSession::NotFound {
                    requested: category_id.to_string(),
                }
            }
        }
    }

    pub fn workflow(&self) -> Option<&DetectionWorkflow<P>> {
        match self {
            DetectionSession::Ready(workflow) => Some(&**workflow),
            DetectionSession::NotFound { .. } => None,
        }
    }

    pub fn workflow_mut(&mut self) -> Result<&mut DetectionWorkflow<P>, WorkflowError> {
        match self {
            DetectionSession::Ready(workflow) => Ok(&mut **workflow),
            DetectionSession::NotFound { requested } => {
                Err(WorkflowError::CategoryNotFound(requested.clone()))
            }
        }
    }

    pub fn select_file(&mut self, file: FileDescriptor) -> Result<(), WorkflowError> {
        self.workflow_mut()?.select_file(file);
        Ok(())
    }

    pub fn drop_files<I>(&mut self, files: I) -> Result<bool, WorkflowError>
    where
        I: IntoIterator<Item = FileDescriptor>,
    {
        Ok(self.workflow_mut()?.drop_files(files))
    }

    pub fn submit(&mut self) -> Result<Ticket, WorkflowError> {
        self.workflow_mut()?.submit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::tests::{CountingProvider, jpeg};
    use crate::submission::{GENERIC_ERROR_MESSAGE, RemoteReply, TransportError};

    struct Canned(RemoteReply);

    impl AnalysisBackend for Canned {
        fn analyze(&self, _request: &UploadRequest) -> Result<RemoteReply, TransportError> {
            Ok(self.0.clone())
        }
    }

    fn workflow(reply: RemoteReply) -> DetectionWorkflow<CountingProvider> {
        DetectionWorkflow::open(
            &CategoryCatalog::builtin(),
            "kidney",
            Arc::new(Canned(reply)),
            CountingProvider::default(),
        )
        .expect("known category")
    }

    #[test]
    fn submit_without_file_is_refused() {
        let mut wf = workflow(RemoteReply::json(200, "{}"));
        assert!(!wf.can_submit());
        assert_eq!(wf.submit(), Err(WorkflowError::NoFileStaged));
        assert_eq!(wf.state(), &SubmissionState::Idle);
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        let mut wf = workflow(RemoteReply::json(
            200,
            r#"{"cancerDetected": false, "confidence": 0.2}"#,
        ));
        wf.select_file(jpeg("k.jpg", 8));
        wf.submit().expect("first submit");
        assert!(!wf.can_submit());
        assert_eq!(wf.submit(), Err(WorkflowError::AlreadyInFlight));
        assert_eq!(
            wf.wait_for_completion(Duration::from_secs(5)),
            Some(Completion::Applied)
        );
        assert!(matches!(wf.state(), SubmissionState::Succeeded(_)));
        assert!(wf.can_submit());
    }

    #[test]
    fn failed_worker_start_is_returned_and_shown() {
        let mut wf = workflow(RemoteReply::json(200, "{}"));
        wf.select_file(jpeg("k.jpg", 8));
        let ticket = wf.coordinator.begin().expect("ticket");

        let err = wf.abandon(ticket, std::io::Error::other("no threads left"));
        assert_eq!(err, WorkflowError::WorkerUnavailable("no threads left".into()));
        assert_eq!(
            wf.state(),
            &SubmissionState::Failed(GENERIC_ERROR_MESSAGE.into())
        );
        assert!(wf.can_submit());
    }

    #[test]
    fn selecting_after_result_discards_it() {
        let mut wf = workflow(RemoteReply::json(
            200,
            r#"{"cancerDetected": true, "confidence": 0.6}"#,
        ));
        wf.select_file(jpeg("a.jpg", 8));
        wf.submit().expect("submit");
        wf.wait_for_completion(Duration::from_secs(5));
        wf.select_file(jpeg("b.jpg", 8));
        assert_eq!(wf.state(), &SubmissionState::Idle);
        assert_eq!(wf.view(), ResultView::Nothing);
    }

    #[test]
    fn waker_fires_after_result_is_queued() {
        let (wake_tx, wake_rx) = mpsc::channel();
        let wake_tx = std::sync::Mutex::new(wake_tx);
        let mut wf = workflow(RemoteReply::json(
            200,
            r#"{"cancerDetected": false, "confidence": 0.2}"#,
        ));
        wf.set_waker(Arc::new(move || {
            if let Ok(tx) = wake_tx.lock() {
                let _ = tx.send(());
            }
        }));
        wf.select_file(jpeg("a.jpg", 8));
        wf.submit().expect("submit");
        wake_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("waker called");
        assert_eq!(wf.poll(), vec![Completion::Applied]);
    }

    #[test]
    fn failure_alert_can_be_acknowledged_and_retried() {
        let mut wf = workflow(RemoteReply::json(500, r#"{"error": "model unavailable"}"#));
        wf.select_file(jpeg("a.jpg", 8));
        wf.submit().expect("submit");
        wf.wait_for_completion(Duration::from_secs(5));
        assert_eq!(wf.view(), ResultView::Alert("model unavailable".into()));
        wf.acknowledge_alert();
        assert_eq!(wf.state(), &SubmissionState::Idle);
        assert!(wf.staged().is_some());
        assert!(wf.can_submit());
    }

    #[test]
    fn not_found_session_refuses_everything() {
        let mut session = DetectionSession::open(
            &CategoryCatalog::builtin(),
            "pancreas",
            Arc::new(Canned(RemoteReply::json(200, "{}"))),
            CountingProvider::default(),
        );
        assert!(session.workflow().is_none());
        let err = WorkflowError::CategoryNotFound("pancreas".into());
        assert_eq!(session.select_file(jpeg("a.jpg", 1)), Err(err.clone()));
        assert_eq!(session.drop_files(vec![jpeg("a.jpg", 1)]), Err(err.clone()));
        assert_eq!(session.submit(), Err(err));
    }
}
