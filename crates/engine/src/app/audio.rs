/// Music and sound-effect playback. Track and effect names are file names
/// relative to the sounds directory.
pub trait AudioService {
    /// Loops `track` as background music. Requesting the track that is
    /// already playing does not restart it.
    fn play_music(&mut self, track: &str);
    fn stop_music(&mut self);
    fn play_effect(&mut self, effect: &str);
    fn current_music(&self) -> Option<&str>;
}

/// Audio sink that only tracks which music would be playing.
#[derive(Debug, Default)]
pub struct SilentAudio {
    current_music: Option<String>,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioService for SilentAudio {
    fn play_music(&mut self, track: &str) {
        if self.current_music.as_deref() != Some(track) {
            self.current_music = Some(track.to_string());
        }
    }

    fn stop_music(&mut self) {
        self.current_music = None;
    }

    fn play_effect(&mut self, _effect: &str) {}

    fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioAudio;

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{info, warn};

    use super::AudioService;

    const MUSIC_VOLUME: f32 = 0.5;

    pub struct RodioAudio {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sounds_dir: PathBuf,
        music_sink: Option<Sink>,
        effect_sinks: Vec<Sink>,
        current_music: Option<String>,
    }

    impl RodioAudio {
        /// Opens the default output device. Returns `None` when no device is available.
        pub fn new(sounds_dir: PathBuf) -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    info!(sounds_dir = %sounds_dir.display(), "audio_initialized");
                    Some(Self {
                        _stream: stream,
                        handle,
                        sounds_dir,
                        music_sink: None,
                        effect_sinks: Vec::new(),
                        current_music: None,
                    })
                }
                Err(error) => {
                    warn!(error = %error, "audio_init_failed");
                    None
                }
            }
        }

        fn open_source(&self, name: &str) -> Option<Decoder<BufReader<File>>> {
            let path = self.sounds_dir.join(name);
            match open_decoder(&path) {
                Ok(decoder) => Some(decoder),
                Err(reason) => {
                    warn!(sound = name, path = %path.display(), reason = %reason, "audio_load_failed");
                    None
                }
            }
        }

        fn new_sink(&self) -> Option<Sink> {
            match Sink::try_new(&self.handle) {
                Ok(sink) => Some(sink),
                Err(error) => {
                    warn!(error = %error, "audio_sink_failed");
                    None
                }
            }
        }
    }

    fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, String> {
        let file = File::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
        Decoder::new(BufReader::new(file)).map_err(|error| format!("decode_failed:{error}"))
    }

    impl AudioService for RodioAudio {
        fn play_music(&mut self, track: &str) {
            if self.current_music.as_deref() == Some(track) {
                return;
            }
            self.stop_music();
            let Some(source) = self.open_source(track) else {
                return;
            };
            let Some(sink) = self.new_sink() else {
                return;
            };
            sink.set_volume(MUSIC_VOLUME);
            sink.append(source.repeat_infinite());
            self.music_sink = Some(sink);
            self.current_music = Some(track.to_string());
            info!(track, "music_started");
        }

        fn stop_music(&mut self) {
            if let Some(sink) = self.music_sink.take() {
                sink.stop();
            }
            self.current_music = None;
        }

        fn play_effect(&mut self, effect: &str) {
            self.effect_sinks.retain(|sink| !sink.empty());
            let Some(source) = self.open_source(effect) else {
                return;
            };
            let Some(sink) = self.new_sink() else {
                return;
            };
            sink.append(source);
            self.effect_sinks.push(sink);
        }

        fn current_music(&self) -> Option<&str> {
            self.current_music.as_deref()
        }
    }
}
