//! Local text-to-speech with a VITS model

use super::{SpeechCompletion, SpeechOutcome, SpeechOutput, Utterance, VoiceInfo};
use crate::audio::AudioOutput;
use crate::config::TtsModelConfig;
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PLAYBACK_POLL: Duration = Duration::from_millis(20);

enum Command {
    Speak {
        utterance: Utterance,
        generation: u64,
        done: Sender<SpeechOutcome>,
    },
    Shutdown,
}

/// Speech output backed by a sherpa-onnx VITS voice.
///
/// Synthesis and playback run on a worker thread that owns the model and
/// the output stream. Cancelling bumps a generation counter; the worker
/// drops anything queued under an older generation.
pub struct VitsSpeechOutput {
    voice: VoiceInfo,
    command_tx: Sender<Command>,
    generation: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    worker: Option<thread::JoinHandle<()>>,
}

impl VitsSpeechOutput {
    pub fn new(config: &TtsModelConfig) -> Result<Self> {
        if !Path::new(&config.model_path).exists() {
            return Err(ParleyError::ModelLoadError(format!(
                "Model not found: {}",
                config.model_path.display()
            )));
        }

        if !Path::new(&config.tokens_path).exists() {
            return Err(ParleyError::ModelLoadError(format!(
                "Tokens file not found: {}",
                config.tokens_path.display()
            )));
        }

        let (command_tx, command_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let generation = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = {
            let config = config.clone();
            let generation = Arc::clone(&generation);
            let pending = Arc::clone(&pending);
            thread::Builder::new()
                .name("parley-tts".into())
                .spawn(move || run_worker(config, command_rx, ready_tx, generation, pending))?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                return Err(ParleyError::SpeechError("TTS worker exited during startup".into()));
            }
        }

        Ok(Self {
            voice: VoiceInfo::new(config.name.clone(), config.language.clone()),
            command_tx,
            generation,
            pending,
            worker: Some(worker),
        })
    }
}

impl SpeechOutput for VitsSpeechOutput {
    fn is_available(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        vec![self.voice.clone()]
    }

    fn speak(&mut self, utterance: Utterance) -> Result<SpeechCompletion> {
        let (done, completion) = SpeechCompletion::channel();
        let generation = self.generation.load(Ordering::SeqCst);

        self.pending.fetch_add(1, Ordering::SeqCst);
        self.command_tx
            .send(Command::Speak {
                utterance,
                generation,
                done,
            })
            .map_err(|e| {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                ParleyError::ChannelError(format!("TTS worker gone: {}", e))
            })?;

        Ok(completion)
    }

    fn is_busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    fn cancel(&mut self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("Speech cancelled");
        Ok(())
    }
}

impl Drop for VitsSpeechOutput {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn path_string(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run_worker(
    config: TtsModelConfig,
    command_rx: Receiver<Command>,
    ready_tx: Sender<Result<()>>,
    generation: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
) {
    info!("Loading VITS TTS model from: {}", config.model_path.display());

    let mut tts = VitsTts::new(VitsTtsConfig {
        model: config.model_path.to_string_lossy().into_owned(),
        tokens: config.tokens_path.to_string_lossy().into_owned(),
        lexicon: path_string(&config.lexicon_path),
        data_dir: path_string(&config.data_dir),
        ..Default::default()
    });

    let output = match AudioOutput::new() {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to open audio output: {}", e);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let _ = ready_tx.send(Ok(()));
    info!("TTS worker ready");

    while let Ok(command) = command_rx.recv() {
        let (utterance, utterance_gen, done) = match command {
            Command::Speak {
                utterance,
                generation,
                done,
            } => (utterance, generation, done),
            Command::Shutdown => break,
        };

        let is_current = || generation.load(Ordering::SeqCst) == utterance_gen;

        let outcome = if !is_current() {
            SpeechOutcome::Cancelled
        } else {
            match tts.create(&utterance.text, config.speaker_id, utterance.rate) {
                Ok(audio) if is_current() => {
                    let samples: Vec<f32> = audio
                        .samples
                        .iter()
                        .map(|s| s * utterance.volume.clamp(0.0, 1.0))
                        .collect();

                    match output.play(&samples, audio.sample_rate as u32) {
                        Ok(()) => {
                            while output.queued() > 0 && is_current() {
                                thread::sleep(PLAYBACK_POLL);
                            }
                            if is_current() {
                                SpeechOutcome::Finished
                            } else {
                                output.clear();
                                SpeechOutcome::Cancelled
                            }
                        }
                        Err(e) => SpeechOutcome::Failed(e.to_string()),
                    }
                }
                Ok(_) => SpeechOutcome::Cancelled,
                Err(e) => {
                    warn!("Synthesis failed: {}", e);
                    SpeechOutcome::Failed(format!("Synthesis failed: {}", e))
                }
            }
        };

        debug!("Utterance ended: {:?}", outcome);
        pending.fetch_sub(1, Ordering::SeqCst);
        let _ = done.send(outcome);
    }

    output.clear();
    info!("TTS worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_model_rejected() {
        let config = TtsModelConfig {
            name: "Piper".into(),
            language: "en-US".into(),
            model_path: PathBuf::from("/nonexistent/voice.onnx"),
            tokens_path: PathBuf::from("/nonexistent/tokens.txt"),
            lexicon_path: None,
            data_dir: None,
            speaker_id: 0,
        };
        assert!(matches!(
            VitsSpeechOutput::new(&config),
            Err(ParleyError::ModelLoadError(_))
        ));
    }
}
