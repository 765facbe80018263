//! Speech capability backed by an external recognizer program
//!
//! The program is expected to listen for one utterance and print the
//! transcript on stdout. Recognition options are passed through the
//! environment.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{RecognitionOptions, SpeechCapability, SpeechError, SpeechSession, SpeechSignal};

/// Runs `program args..` once per recognition session
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line. Returns None when blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn recognize(&self, options: &RecognitionOptions) -> SpeechSignal {
        let output = Command::new(&self.program)
            .args(&self.args)
            .env("SPEECH_LANG", &options.lang)
            .env("SPEECH_MAX_ALTERNATIVES", options.max_alternatives.to_string())
            .env("SPEECH_INTERIM_RESULTS", options.interim_results.to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return SpeechSignal::Error {
                    diagnostic: format!("failed to run {}: {}", self.program, e),
                }
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return SpeechSignal::Error {
                diagnostic: format!("recognizer exited with {}: {}", output.status, stderr.trim()),
            };
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let alternatives: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(options.max_alternatives.max(1) as usize)
            .map(str::to_string)
            .collect();

        if alternatives.is_empty() {
            SpeechSignal::Error {
                diagnostic: "no speech detected".to_string(),
            }
        } else {
            SpeechSignal::Result { alternatives }
        }
    }
}

impl SpeechCapability for CommandSpeech {
    fn name(&self) -> &str {
        &self.program
    }

    fn start(&self, options: &RecognitionOptions) -> Result<SpeechSession, SpeechError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SpeechError::StartFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(4);
        let recognizer = self.clone();
        let options = options.clone();

        info!(program = %self.program, lang = %options.lang, "starting recognizer");

        handle.spawn(async move {
            let signal = recognizer.recognize(&options).await;
            debug!(?signal, "recognizer finished");
            let _ = tx.send(signal).await;
            let _ = tx.send(SpeechSignal::End).await;
        });

        Ok(rx)
    }
}
