//! Run-session use case: the capture-and-upload flow

use std::time::Duration;

use thiserror::Error;

use crate::domain::session::{
    InvalidPhaseTransition, Session, SessionComplete, SessionFlow,
};
use crate::domain::transfer::RetryPolicy;

use super::ports::{
    AudioCue, AudioCueType, CaptureDevice, CollectorClient, DeviceError, FinalizeError,
    RecordError, RetryDecision, SegmentPayload, SessionPrompter, SessionStore, SpanRecorder,
    StoreError,
};
use super::transfer::{upload_with_backoff, TransferError};

/// Errors from the session flow
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Capture device unavailable: {0}")]
    Device(#[from] DeviceError),

    #[error("Recording failed: {0}")]
    Record(#[from] RecordError),

    /// The user declined the manual retry; progress stays at this step
    #[error("Step {step} abandoned: {source}")]
    Abandoned { step: u32, source: TransferError },

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error("Session state store failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Phase(#[from] InvalidPhaseTransition),

    #[error(transparent)]
    Session(#[from] SessionComplete),
}

/// Output of a completed session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Steps uploaded during this run (steps already persisted before a
    /// resume are not counted)
    pub steps_uploaded: u32,
}

/// Callbacks for progress and status updates
#[derive(Default)]
pub struct FlowCallbacks {
    /// Called when a step's upload begins, with the segment size
    pub on_upload_started: Option<Box<dyn Fn(u32, &str) + Send + Sync>>,
    /// Called before each automatic backoff wait, with (retries_remaining, delay)
    pub on_retry_wait: Option<Box<dyn Fn(u32, Duration) + Send + Sync>>,
    /// Called when a transfer has finally failed and awaits the user
    pub on_upload_failed: Option<Box<dyn Fn(u32, &TransferError) + Send + Sync>>,
    /// Called after a step's transfer succeeded and progress was persisted
    pub on_step_completed: Option<Box<dyn Fn(u32) + Send + Sync>>,
    /// Called when finalization starts
    pub on_finalizing: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Drives a session end to end: acquire the capture source once, then for
/// each step record a span, upload it with bounded backoff (falling back
/// to a user-driven retry with a fresh budget), persist the advanced step,
/// and finally release the source, notify the collector, and clear the
/// persisted state.
///
/// Step n+1 never starts recording before step n's transfer succeeded or
/// was explicitly abandoned; the linear control flow below is the only
/// scheduler.
pub struct RunSessionUseCase<D, R, C, S, P, A>
where
    D: CaptureDevice,
    R: SpanRecorder,
    C: CollectorClient,
    S: SessionStore,
    P: SessionPrompter,
    A: AudioCue,
{
    device: D,
    recorder: R,
    collector: C,
    store: S,
    prompter: P,
    cue: A,
    policy: RetryPolicy,
}

impl<D, R, C, S, P, A> RunSessionUseCase<D, R, C, S, P, A>
where
    D: CaptureDevice,
    R: SpanRecorder,
    C: CollectorClient,
    S: SessionStore,
    P: SessionPrompter,
    A: AudioCue,
{
    pub fn new(
        device: D,
        recorder: R,
        collector: C,
        store: S,
        prompter: P,
        cue: A,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            device,
            recorder,
            collector,
            store,
            prompter,
            cue,
            policy,
        }
    }

    /// Execute the session flow for the given (fresh or resumed) session
    pub async fn execute(
        &self,
        mut session: Session,
        prompts: &[String],
        callbacks: FlowCallbacks,
    ) -> Result<SessionOutcome, FlowError> {
        let first_step = session.current_step();

        // A session resumed past its last step goes straight to
        // finalization; no reason to touch the microphone.
        if !session.is_complete() {
            self.device.acquire().await?;

            let mut flow = SessionFlow::new();
            flow.grant(first_step)?;

            let steps_result = self
                .record_steps(&mut session, &mut flow, prompts, &callbacks)
                .await;

            // The source is released exactly once, before finalization,
            // whether the steps succeeded or the session was abandoned.
            self.device.release().await;
            steps_result?;
        }

        if let Some(cb) = &callbacks.on_finalizing {
            cb();
        }
        self.collector
            .finalize(
                session.identity_token(),
                session.destination_folder(),
                session.step_count(),
            )
            .await?;
        self.store.clear().await?;

        Ok(SessionOutcome {
            steps_uploaded: session.step_count() - first_step,
        })
    }

    async fn record_steps(
        &self,
        session: &mut Session,
        flow: &mut SessionFlow,
        prompts: &[String],
        callbacks: &FlowCallbacks,
    ) -> Result<(), FlowError> {
        while !session.is_complete() {
            let step = session.current_step();

            self.recorder.begin(step).await?;
            let _ = self.cue.play(AudioCueType::SpanStart).await;

            let prompt = prompts
                .get(step as usize)
                .map(String::as_str)
                .unwrap_or("");
            self.prompter
                .wait_for_advance(step, session.step_count(), prompt)
                .await;

            let segment = self.recorder.end().await?;
            let _ = self.cue.play(AudioCueType::SpanStop).await;

            flow.begin_transfer()?;
            if let Some(cb) = &callbacks.on_upload_started {
                cb(step, &segment.human_readable_size());
            }

            // The finalized blob is built once; every attempt below,
            // automatic or manual, resends it unchanged.
            let payload = SegmentPayload::new(
                session.identity_token(),
                session.destination_folder(),
                session.question_index(),
                segment,
            );

            loop {
                let result = upload_with_backoff(
                    &self.collector,
                    &payload,
                    self.policy,
                    |retries_remaining, delay| {
                        if let Some(cb) = &callbacks.on_retry_wait {
                            cb(retries_remaining, delay);
                        }
                    },
                )
                .await;

                match result {
                    Ok(_) => {
                        flow.transfer_succeeded(session.step_count())?;
                        break;
                    }
                    Err(err) => {
                        flow.transfer_failed()?;
                        let _ = self.cue.play(AudioCueType::UploadFailed).await;
                        if let Some(cb) = &callbacks.on_upload_failed {
                            cb(step, &err);
                        }
                        match self.prompter.retry_decision(step, &err).await {
                            RetryDecision::Retry => {
                                flow.manual_retry()?;
                            }
                            RetryDecision::Abort => {
                                return Err(FlowError::Abandoned { step, source: err });
                            }
                        }
                    }
                }
            }

            session.advance()?;
            self.store.save(&session.to_state()).await?;
            if let Some(cb) = &callbacks.on_step_completed {
                cb(step);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AudioCueError, UploadError, UploadReceipt,
    };
    use crate::domain::segment::{SegmentData, SegmentEncoding};
    use crate::domain::session::SessionState;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockDevice {
        live: AtomicBool,
        acquisitions: AtomicU32,
        releases: AtomicU32,
        deny: bool,
    }

    #[async_trait]
    impl CaptureDevice for MockDevice {
        async fn acquire(&self) -> Result<(), DeviceError> {
            if self.deny {
                return Err(DeviceError::AccessDenied("permission denied".into()));
            }
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            self.live.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn release(&self) {
            if self.live.swap(false, Ordering::SeqCst) {
                self.releases.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct MockRecorder {
        begun: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl SpanRecorder for MockRecorder {
        async fn begin(&self, step: u32) -> Result<(), RecordError> {
            self.begun.lock().unwrap().push(step);
            Ok(())
        }

        async fn end(&self) -> Result<SegmentData, RecordError> {
            let step = *self.begun.lock().unwrap().last().unwrap();
            Ok(SegmentData::new(
                vec![step as u8; 4],
                SegmentEncoding::Flac,
            ))
        }
    }

    #[derive(Default)]
    struct MockCollector {
        upload_errors: Mutex<Vec<UploadError>>,
        uploads: Mutex<Vec<SegmentPayload>>,
        finalized: Mutex<Vec<u32>>,
        fail_finalize: bool,
    }

    #[async_trait]
    impl CollectorClient for MockCollector {
        async fn upload_segment(
            &self,
            payload: &SegmentPayload,
        ) -> Result<UploadReceipt, UploadError> {
            self.uploads.lock().unwrap().push(payload.clone());
            let mut errors = self.upload_errors.lock().unwrap();
            if errors.is_empty() {
                Ok(UploadReceipt::default())
            } else {
                Err(errors.remove(0))
            }
        }

        async fn finalize(&self, _: &str, _: &str, count: u32) -> Result<(), FinalizeError> {
            if self.fail_finalize {
                return Err(FinalizeError {
                    message: "collector unreachable".into(),
                });
            }
            self.finalized.lock().unwrap().push(count);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockStore {
        state: Mutex<Option<SessionState>>,
    }

    #[async_trait]
    impl SessionStore for MockStore {
        async fn load(&self) -> Result<Option<SessionState>, StoreError> {
            Ok(self.state.lock().unwrap().clone())
        }

        async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
            *self.state.lock().unwrap() = Some(state.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<(), StoreError> {
            *self.state.lock().unwrap() = None;
            Ok(())
        }

        fn path(&self) -> PathBuf {
            PathBuf::from("/tmp/mock-session.json")
        }
    }

    struct MockPrompter {
        decisions: Mutex<Vec<RetryDecision>>,
    }

    impl MockPrompter {
        fn advancing() -> Self {
            Self {
                decisions: Mutex::new(Vec::new()),
            }
        }

        fn with_decisions(decisions: Vec<RetryDecision>) -> Self {
            Self {
                decisions: Mutex::new(decisions),
            }
        }
    }

    #[async_trait]
    impl SessionPrompter for MockPrompter {
        async fn wait_for_advance(&self, _step: u32, _count: u32, _prompt: &str) {}

        async fn retry_decision(&self, _step: u32, _error: &TransferError) -> RetryDecision {
            let mut decisions = self.decisions.lock().unwrap();
            if decisions.is_empty() {
                RetryDecision::Abort
            } else {
                decisions.remove(0)
            }
        }
    }

    struct MockCue;

    #[async_trait]
    impl AudioCue for MockCue {
        async fn play(&self, _cue_type: AudioCueType) -> Result<(), AudioCueError> {
            Ok(())
        }
    }

    fn prompts() -> Vec<String> {
        (1..=5).map(|n| format!("prompt {}", n)).collect()
    }

    fn use_case(
        device: MockDevice,
        collector: MockCollector,
        prompter: MockPrompter,
    ) -> RunSessionUseCase<MockDevice, MockRecorder, MockCollector, MockStore, MockPrompter, MockCue>
    {
        RunSessionUseCase::new(
            device,
            MockRecorder::default(),
            collector,
            MockStore::default(),
            prompter,
            MockCue,
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn full_session_uploads_every_step_and_finalizes() {
        let use_case = use_case(
            MockDevice::default(),
            MockCollector::default(),
            MockPrompter::advancing(),
        );

        let session = Session::new(5, "tok", "folder");
        let outcome = use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap();

        assert_eq!(outcome.steps_uploaded, 5);
        let uploads = use_case.collector.uploads.lock().unwrap();
        let indices: Vec<u32> = uploads.iter().map(|p| p.question_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(*use_case.collector.finalized.lock().unwrap(), vec![5]);
        assert!(use_case.store.state.lock().unwrap().is_none());
        assert_eq!(use_case.device.releases.load(Ordering::SeqCst), 1);
        assert!(!use_case.device.is_live());
    }

    #[tokio::test]
    async fn denied_device_is_fatal_before_any_recording() {
        let device = MockDevice {
            deny: true,
            ..Default::default()
        };
        let use_case = use_case(device, MockCollector::default(), MockPrompter::advancing());

        let session = Session::new(5, "tok", "folder");
        let err = use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Device(_)));
        assert!(use_case.recorder.begun.lock().unwrap().is_empty());
        assert!(use_case.collector.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn progress_persisted_after_each_step() {
        let use_case = use_case(
            MockDevice::default(),
            MockCollector::default(),
            MockPrompter::advancing(),
        );

        let saved_steps = Arc::new(Mutex::new(Vec::new()));
        let saved_clone = Arc::clone(&saved_steps);
        let callbacks = FlowCallbacks {
            on_step_completed: Some(Box::new(move |step| {
                saved_clone.lock().unwrap().push(step);
            })),
            ..Default::default()
        };

        let session = Session::new(3, "tok", "folder");
        use_case.execute(session, &prompts(), callbacks).await.unwrap();

        assert_eq!(*saved_steps.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn resumed_session_starts_at_persisted_step() {
        let use_case = use_case(
            MockDevice::default(),
            MockCollector::default(),
            MockPrompter::advancing(),
        );

        let state = SessionState {
            current_step: 3,
            identity_token: "tok".into(),
            destination_folder: "folder".into(),
        };
        let session = Session::resume(state, 5);
        let outcome = use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap();

        assert_eq!(outcome.steps_uploaded, 2);
        let uploads = use_case.collector.uploads.lock().unwrap();
        let indices: Vec<u32> = uploads.iter().map(|p| p.question_index).collect();
        assert_eq!(indices, vec![4, 5]);
        assert_eq!(*use_case.recorder.begun.lock().unwrap(), vec![3, 4]);
    }

    #[tokio::test]
    async fn already_complete_session_skips_capture_and_finalizes() {
        let use_case = use_case(
            MockDevice::default(),
            MockCollector::default(),
            MockPrompter::advancing(),
        );

        let state = SessionState {
            current_step: 5,
            identity_token: "tok".into(),
            destination_folder: "folder".into(),
        };
        let session = Session::resume(state, 5);
        use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap();

        assert_eq!(use_case.device.acquisitions.load(Ordering::SeqCst), 0);
        assert!(use_case.collector.uploads.lock().unwrap().is_empty());
        assert_eq!(*use_case.collector.finalized.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn manual_retry_resends_same_payload_with_fresh_budget() {
        // Budget 0 here, so the first 500 goes straight to the manual
        // decision; one manual retry succeeds.
        let collector = MockCollector {
            upload_errors: Mutex::new(vec![UploadError::Transient {
                status: Some(500),
                message: "HTTP 500".into(),
            }]),
            ..Default::default()
        };
        let use_case = RunSessionUseCase::new(
            MockDevice::default(),
            MockRecorder::default(),
            collector,
            MockStore::default(),
            MockPrompter::with_decisions(vec![RetryDecision::Retry]),
            MockCue,
            RetryPolicy::new(0, Duration::from_millis(1)),
        );

        let session = Session::new(1, "tok", "folder");
        use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap();

        let uploads = use_case.collector.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].segment, uploads[1].segment);
        assert_eq!(uploads[0].question_index, uploads[1].question_index);
    }

    #[tokio::test]
    async fn abort_keeps_persisted_progress_at_failed_step() {
        let collector = MockCollector {
            upload_errors: Mutex::new(vec![UploadError::Rejected {
                status: 401,
                message: "Invalid Token".into(),
            }]),
            ..Default::default()
        };
        let use_case = RunSessionUseCase::new(
            MockDevice::default(),
            MockRecorder::default(),
            collector,
            MockStore::default(),
            MockPrompter::with_decisions(vec![RetryDecision::Abort]),
            MockCue,
            RetryPolicy::new(3, Duration::from_millis(1)),
        );

        // Simulate a resumed session that already finished steps 0-1
        let state = SessionState {
            current_step: 2,
            identity_token: "tok".into(),
            destination_folder: "folder".into(),
        };
        use_case.store.save(&state).await.unwrap();

        let session = Session::resume(state, 5);
        let err = use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap_err();

        match err {
            FlowError::Abandoned { step, source } => {
                assert_eq!(step, 2);
                assert!(matches!(source, TransferError::Client { status: 401, .. }));
            }
            other => panic!("expected abandonment, got {:?}", other),
        }
        // Device released despite the abort; state still points at step 2
        assert!(!use_case.device.is_live());
        let stored = use_case.store.load().await.unwrap().unwrap();
        assert_eq!(stored.current_step, 2);
        assert!(use_case.collector.finalized.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalize_failure_leaves_state_intact() {
        let collector = MockCollector {
            fail_finalize: true,
            ..Default::default()
        };
        let use_case = RunSessionUseCase::new(
            MockDevice::default(),
            MockRecorder::default(),
            collector,
            MockStore::default(),
            MockPrompter::advancing(),
            MockCue,
            RetryPolicy::new(3, Duration::from_millis(1)),
        );

        let session = Session::new(2, "tok", "folder");
        let err = use_case
            .execute(session, &prompts(), FlowCallbacks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Finalize(_)));
        // All steps were uploaded and persisted; only the clear is withheld
        let stored = use_case.store.load().await.unwrap().unwrap();
        assert_eq!(stored.current_step, 2);
    }
}
