use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A closed set of numbered menu entries.
///
/// Menu keys are the 1-based position in `ALL`. Every entry also has a short
/// `name` so the same value can be given on the command line.
pub trait Menu: Copy + Sized + 'static {
    const TITLE: &'static str;
    const ALL: &'static [Self];

    fn name(&self) -> &'static str;

    fn label(&self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        let index: usize = key.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    fn parse_choice(input: &str) -> Result<Self> {
        let input = input.trim();
        Self::from_key(input)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.name().eq_ignore_ascii_case(input))
            })
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                Error::InvalidChoice(format!(
                    "'{}' (expected 1-{} or one of: {})",
                    input,
                    Self::ALL.len(),
                    names.join(", ")
                ))
            })
    }
}

macro_rules! menu_parsing {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self> {
                    <$ty as Menu>::parse_choice(s)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

menu_parsing!(Mode, AudioCodec, AudioQuality, VideoContainer, Resolution);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Audio,
    Video,
}

impl Menu for Mode {
    const TITLE: &'static str = "Select download mode:";
    const ALL: &'static [Self] = &[Mode::Audio, Mode::Video];

    fn name(&self) -> &'static str {
        match self {
            Mode::Audio => "audio",
            Mode::Video => "video",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Mode::Audio => "Audio only (tagged)",
            Mode::Video => "Video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Wav,
}

impl AudioCodec {
    /// File extension yt-dlp gives the converted audio
    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "m4a",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "wav",
        }
    }

    /// `--audio-format` value; AAC is asked for in an M4A container so it can
    /// carry tags
    pub fn ytdlp_format(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "m4a",
            other => other.name(),
        }
    }
}

impl Menu for AudioCodec {
    const TITLE: &'static str = "Select audio format:";
    const ALL: &'static [Self] = &[
        AudioCodec::Mp3,
        AudioCodec::Aac,
        AudioCodec::Flac,
        AudioCodec::Wav,
    ];

    fn name(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "aac",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "wav",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "MP3",
            AudioCodec::Aac => "AAC",
            AudioCodec::Flac => "FLAC",
            AudioCodec::Wav => "WAV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    Kbps128,
    Kbps192,
    Kbps256,
    Kbps320,
}

impl AudioQuality {
    pub fn kbps(&self) -> u32 {
        match self {
            AudioQuality::Kbps128 => 128,
            AudioQuality::Kbps192 => 192,
            AudioQuality::Kbps256 => 256,
            AudioQuality::Kbps320 => 320,
        }
    }
}

impl Menu for AudioQuality {
    const TITLE: &'static str = "Select audio quality:";
    const ALL: &'static [Self] = &[
        AudioQuality::Kbps128,
        AudioQuality::Kbps192,
        AudioQuality::Kbps256,
        AudioQuality::Kbps320,
    ];

    fn name(&self) -> &'static str {
        match self {
            AudioQuality::Kbps128 => "128kbps",
            AudioQuality::Kbps192 => "192kbps",
            AudioQuality::Kbps256 => "256kbps",
            AudioQuality::Kbps320 => "320kbps",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AudioQuality::Kbps128 => "Standard (128kbps)",
            AudioQuality::Kbps192 => "Good (192kbps)",
            AudioQuality::Kbps256 => "High (256kbps)",
            AudioQuality::Kbps320 => "Highest (320kbps)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    Mkv,
    Webm,
}

impl VideoContainer {
    pub fn extension(&self) -> &'static str {
        self.name()
    }
}

impl Menu for VideoContainer {
    const TITLE: &'static str = "Select video format:";
    const ALL: &'static [Self] = &[VideoContainer::Mp4, VideoContainer::Mkv, VideoContainer::Webm];

    fn name(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Mkv => "mkv",
            VideoContainer::Webm => "webm",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "MP4",
            VideoContainer::Mkv => "MKV",
            VideoContainer::Webm => "WebM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    P1080,
    P1440,
    P2160,
    P4320,
}

impl Resolution {
    pub fn height(&self) -> u32 {
        match self {
            Resolution::P1080 => 1080,
            Resolution::P1440 => 1440,
            Resolution::P2160 => 2160,
            Resolution::P4320 => 4320,
        }
    }
}

impl Menu for Resolution {
    const TITLE: &'static str = "Select video resolution:";
    const ALL: &'static [Self] = &[
        Resolution::P1080,
        Resolution::P1440,
        Resolution::P2160,
        Resolution::P4320,
    ];

    fn name(&self) -> &'static str {
        match self {
            Resolution::P1080 => "1080p",
            Resolution::P1440 => "1440p",
            Resolution::P2160 => "2160p",
            Resolution::P4320 => "4320p",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Resolution::P1080 => "Full HD (1080p)",
            Resolution::P1440 => "2K (1440p)",
            Resolution::P2160 => "4K (2160p)",
            Resolution::P4320 => "8K (4320p)",
        }
    }
}

/// What to produce for every URL in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Audio {
        codec: AudioCodec,
        quality: AudioQuality,
    },
    Video {
        container: VideoContainer,
        resolution: Resolution,
    },
}

impl MediaFormat {
    pub fn mode(&self) -> Mode {
        match self {
            MediaFormat::Audio { .. } => Mode::Audio,
            MediaFormat::Video { .. } => Mode::Video,
        }
    }

    /// Bracketed part of the output filename, e.g. `320kbps` or `1080p`
    pub fn quality_tag(&self) -> &'static str {
        match self {
            MediaFormat::Audio { quality, .. } => quality.name(),
            MediaFormat::Video { resolution, .. } => resolution.name(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Audio { codec, .. } => codec.extension(),
            MediaFormat::Video { container, .. } => container.extension(),
        }
    }

    /// Whether finished files get title/artist/album/cover tags
    pub fn is_taggable(&self) -> bool {
        matches!(self, MediaFormat::Audio { .. })
    }
}
