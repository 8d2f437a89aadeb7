//! Audio playback for the welcome greeting and answer cues.
//!
//! The output device is owned by a dedicated thread ([`AudioService`]); the rest
//! of the application sends [`AudioEvent`]s through a cloneable [`AudioSender`].
//! Playback is a presentation side effect, so every failure here is logged and
//! swallowed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rodio::buffer::SamplesBuffer;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Sample rate of the synthesized greeting
pub const WELCOME_SAMPLE_RATE: u32 = 24_000;

/// Channel count of the synthesized greeting
pub const WELCOME_CHANNELS: u16 = 1;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PCM payload has an odd byte length ({0})")]
    OddLength(usize),

    #[error("Audio payload is empty")]
    Empty,
}

/// Decoded 16-bit PCM audio ready for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl PcmClip {
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        Duration::from_millis(frames * 1000 / self.sample_rate.max(1) as u64)
    }
}

/// Decode the provider's base64 greeting into little-endian 16-bit samples.
pub fn decode_welcome_audio(encoded: &str) -> Result<PcmClip, AudioError> {
    let bytes = STANDARD.decode(encoded.trim())?;

    if bytes.is_empty() {
        return Err(AudioError::Empty);
    }
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddLength(bytes.len()));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(PcmClip {
        sample_rate: WELCOME_SAMPLE_RATE,
        channels: WELCOME_CHANNELS,
        samples,
    })
}

/// Something for the audio thread to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Welcome(PcmClip),
    CorrectCue,
    IncorrectCue,
    Cheer,
}

impl AudioEvent {
    /// Tone sequence (frequency in Hz, length in ms) for the synthesized cues.
    pub fn cue_notes(&self) -> &'static [(f32, u64)] {
        match self {
            AudioEvent::Welcome(_) => &[],
            // bright two-tone "ting"
            AudioEvent::CorrectCue => &[(880.0, 110), (1318.5, 220)],
            AudioEvent::IncorrectCue => &[(233.1, 160), (196.0, 280)],
            // C major arpeggio
            AudioEvent::Cheer => &[
                (523.3, 140),
                (659.3, 140),
                (784.0, 140),
                (1046.5, 420),
            ],
        }
    }
}

/// Cloneable handle for queueing audio
#[derive(Clone, Debug)]
pub struct AudioSender {
    tx: mpsc::Sender<AudioEvent>,
}

impl AudioSender {
    pub fn play(&self, event: AudioEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Audio service has stopped - dropping audio event");
        }
    }
}

/// Create the channel connecting an [`AudioSender`] to an [`AudioService`].
pub fn create_audio_channel() -> (AudioSender, mpsc::Receiver<AudioEvent>) {
    let (tx, rx) = mpsc::channel();
    (AudioSender { tx }, rx)
}

/// Owns the output device and plays queued events
pub struct AudioService {
    rx: mpsc::Receiver<AudioEvent>,
    volume: f32,
}

impl AudioService {
    pub fn new(rx: mpsc::Receiver<AudioEvent>, volume: f32) -> Self {
        Self { rx, volume }
    }

    /// Run the service on its own thread.
    ///
    /// The thread exits once every [`AudioSender`] has been dropped.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("bevuihoc-audio".to_string())
            .spawn(move || self.run())
    }

    fn run(self) {
        // OutputStream is not Send, so it has to be opened on this thread
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("No audio output device available, audio disabled: {}", e);
                while self.rx.recv().is_ok() {}
                return;
            }
        };

        tracing::debug!("Audio service started (volume {:.2})", self.volume);

        while let Ok(event) = self.rx.recv() {
            if self.volume <= 0.0 {
                continue;
            }

            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::warn!("Failed to create audio sink: {}", e);
                    continue;
                }
            };
            sink.set_volume(self.volume);

            match event {
                AudioEvent::Welcome(clip) => {
                    tracing::debug!("Playing welcome clip ({:?})", clip.duration());
                    sink.append(SamplesBuffer::new(
                        clip.channels,
                        clip.sample_rate,
                        clip.samples,
                    ));
                }
                cue => {
                    for &(frequency, millis) in cue.cue_notes() {
                        sink.append(
                            SineWave::new(frequency)
                                .take_duration(Duration::from_millis(millis))
                                .amplify(0.25),
                        );
                    }
                }
            }

            // Let the clip finish on rodio's mixer thread
            sink.detach();
        }

        tracing::debug!("Audio service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian_samples() {
        // 0x0001 = 1, 0xFFFF = -1, 0x7FFF = i16::MAX
        let encoded = STANDARD.encode([0x01, 0x00, 0xFF, 0xFF, 0xFF, 0x7F]);
        let clip = decode_welcome_audio(&encoded).unwrap();

        assert_eq!(clip.samples, vec![1, -1, i16::MAX]);
        assert_eq!(clip.sample_rate, 24_000);
        assert_eq!(clip.channels, 1);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(matches!(
            decode_welcome_audio("not base64!"),
            Err(AudioError::Base64(_))
        ));
        assert!(matches!(
            decode_welcome_audio(&STANDARD.encode([1, 2, 3])),
            Err(AudioError::OddLength(3))
        ));
        assert!(matches!(decode_welcome_audio(""), Err(AudioError::Empty)));
    }

    #[test]
    fn test_clip_duration() {
        let clip = PcmClip {
            sample_rate: 24_000,
            channels: 1,
            samples: vec![0; 48_000],
        };
        assert_eq!(clip.duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_cues_have_notes() {
        assert_eq!(AudioEvent::CorrectCue.cue_notes().len(), 2);
        assert!(!AudioEvent::IncorrectCue.cue_notes().is_empty());
        assert!(AudioEvent::Welcome(PcmClip {
            sample_rate: 1,
            channels: 1,
            samples: vec![]
        })
        .cue_notes()
        .is_empty());
    }

    #[test]
    fn test_sender_after_receiver_dropped() {
        let (sender, rx) = create_audio_channel();
        drop(rx);
        // must not panic
        sender.play(AudioEvent::CorrectCue);
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (sender, rx) = create_audio_channel();
        sender.play(AudioEvent::IncorrectCue);
        sender.play(AudioEvent::Cheer);

        assert_eq!(rx.try_recv().unwrap(), AudioEvent::IncorrectCue);
        assert_eq!(rx.try_recv().unwrap(), AudioEvent::Cheer);
    }
}
