//! Core state machine implementation
//!
//! One task owns the input controller, the submission machine and the
//! viewport class. Commands from the presentation layer and completions from
//! collaborators (classifier, speech sessions) are handled one at a time.
//! Collaborator work runs in spawned tasks so nothing here ever waits on the
//! network or the microphone.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::classify::{Classifier, ClassifyError};
use crate::events::StateEvent;
use crate::speech::{RecognitionOptions, SpeechCapability, SpeechSession, SpeechSignal};

use super::error::ReflectionError;
use super::input::{InputController, SignalOutcome};
use super::model::{ClassificationResult, ReflectionState, ViewportClass};
use super::submission::SubmissionMachine;

/// Actions the presentation layer can trigger
#[derive(Debug)]
pub enum Command {
    SetText {
        text: String,
    },
    Submit {
        reply: oneshot::Sender<Result<(), ReflectionError>>,
    },
    StartDictation {
        reply: oneshot::Sender<Result<(), ReflectionError>>,
    },
    Resize {
        width: u32,
    },
    Snapshot {
        reply: oneshot::Sender<ReflectionState>,
    },
}

/// Results reported back by collaborator tasks
#[derive(Debug)]
enum Completion {
    Classified {
        outcome: Result<ClassificationResult, ClassifyError>,
    },
    Speech {
        session: u64,
        signal: SpeechSignal,
    },
}

/// The state machine that owns every piece of reflection state
pub struct StateMachine {
    input: InputController,
    submission: SubmissionMachine,
    viewport: ViewportClass,
    notice: Option<ReflectionError>,
    classifier: Arc<dyn Classifier>,
    speech: Option<Arc<dyn SpeechCapability>>,
    options: RecognitionOptions,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Channel for emitting state events
    event_tx: broadcast::Sender<StateEvent>,
}

impl StateMachine {
    /// Create a new state machine
    pub fn new(
        classifier: Arc<dyn Classifier>,
        speech: Option<Arc<dyn SpeechCapability>>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            input: InputController::new(),
            submission: SubmissionMachine::new(),
            viewport: ViewportClass::default(),
            notice: None,
            classifier,
            speech,
            options: RecognitionOptions::default(),
            completion_tx,
            completion_rx,
            event_tx,
        }
    }

    /// Immutable snapshot of the current state
    pub fn snapshot(&self) -> ReflectionState {
        ReflectionState {
            text: self.input.text().to_string(),
            submission: self.submission.status(),
            error: self.submission.error_message().map(str::to_string),
            result: self.submission.result().cloned(),
            history: self.submission.history().to_vec(),
            dictation: self.input.dictation(),
            notice: self.notice.map(|n| n.user_message().to_string()),
            viewport: self.viewport,
        }
    }

    /// Run the state machine until every command sender is dropped
    pub async fn run(&mut self, mut command_rx: mpsc::Receiver<Command>) {
        info!("state machine started in Idle state");

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }

        info!("state machine stopped");
    }

    /// Handle a single command from the presentation layer
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetText { text } => self.set_text(text),
            Command::Submit { reply } => {
                let _ = reply.send(self.submit());
            }
            Command::StartDictation { reply } => {
                let _ = reply.send(self.start_dictation());
            }
            Command::Resize { width } => self.resize(width),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Replace the reflection text
    pub fn set_text(&mut self, text: String) {
        self.input.set_text(text);
        self.emit(StateEvent::TextChanged {
            text: self.input.text().to_string(),
        });
    }

    /// Validate the current text and dispatch one classification request
    pub fn submit(&mut self) -> Result<(), ReflectionError> {
        let payload = match self.submission.begin(self.input.text()) {
            Ok(payload) => payload,
            Err(ReflectionError::Busy) => return Err(ReflectionError::Busy),
            Err(kind) => {
                // The submission error replaces any dictation notice
                self.notice = None;
                self.emit(StateEvent::submission_failed(kind));
                return Err(kind);
            }
        };

        self.notice = None;
        self.emit(StateEvent::SubmissionStarted);

        let classifier = Arc::clone(&self.classifier);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = classifier.classify(&payload).await;
            let _ = completion_tx.send(Completion::Classified { outcome });
        });

        Ok(())
    }

    /// Start a dictation session on the speech capability
    pub fn start_dictation(&mut self) -> Result<(), ReflectionError> {
        match self
            .input
            .start_dictation(self.speech.as_deref(), &self.options)
        {
            Ok(Some((session, signals))) => {
                self.notice = None;
                self.emit(StateEvent::DictationStarted);
                self.forward_session(session, signals);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(kind) => {
                warn!(kind = kind.code(), "dictation unavailable");
                self.raise_notice(kind);
                Err(kind)
            }
        }
    }

    /// Recompute the viewport class for a new window width
    pub fn resize(&mut self, width: u32) {
        let viewport = ViewportClass::from_width(width);
        if viewport != self.viewport {
            debug!(width, from = ?self.viewport, to = ?viewport, "viewport changed");
            self.viewport = viewport;
            self.emit(StateEvent::ViewportChanged { viewport });
        }
    }

    /// Wait for one collaborator completion and fold it in
    #[cfg(test)]
    pub async fn process_next_completion(&mut self) {
        if let Some(completion) = self.completion_rx.recv().await {
            self.handle_completion(completion);
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Classified { outcome } => self.settle_submission(outcome),
            Completion::Speech { session, signal } => self.handle_speech_signal(session, signal),
        }
    }

    fn settle_submission(&mut self, outcome: Result<ClassificationResult, ClassifyError>) {
        if !self.submission.is_analyzing() {
            warn!("classification completed with no submission in flight");
            return;
        }

        let event = match self.submission.settle(outcome) {
            Ok(result) => {
                self.notice = None;
                StateEvent::SubmissionSucceeded {
                    emotion: result.emotion,
                    confidence: result.confidence,
                }
            }
            Err(kind) => StateEvent::submission_failed(kind),
        };
        self.emit(event);

        // Settling always empties the buffer, whatever the outcome
        self.input.clear_text();
        self.emit(StateEvent::TextChanged {
            text: String::new(),
        });
    }

    fn handle_speech_signal(&mut self, session: u64, signal: SpeechSignal) {
        match self.input.apply_signal(session, signal) {
            SignalOutcome::Transcript(text) => {
                self.emit(StateEvent::TextChanged { text });
            }
            SignalOutcome::Failed(diagnostic) => {
                warn!(session, %diagnostic, "speech recognition error");
                self.raise_notice(ReflectionError::DictationFailure);
            }
            SignalOutcome::Ended => {
                self.emit(StateEvent::DictationEnded);
            }
            SignalOutcome::Ignored => {}
        }
    }

    /// Pump a session's signals into the completion channel
    ///
    /// A session that closes without `End` is ended on its behalf.
    fn forward_session(&self, session: u64, mut signals: SpeechSession) {
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                let is_end = signal == SpeechSignal::End;
                if completion_tx
                    .send(Completion::Speech { session, signal })
                    .is_err()
                    || is_end
                {
                    return;
                }
            }
            debug!(session, "speech session closed without end signal");
            let _ = completion_tx.send(Completion::Speech {
                session,
                signal: SpeechSignal::End,
            });
        });
    }

    fn raise_notice(&mut self, kind: ReflectionError) {
        self.notice = Some(kind);
        self.emit(StateEvent::notice(kind));
    }

    fn emit(&self, event: StateEvent) {
        debug!(%event, "emitting state event");
        let _ = self.event_tx.send(event);
    }
}
