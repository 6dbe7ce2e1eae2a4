use std::path::PathBuf;

/// End-of-track and end-of-playlist behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Repeat off",
            Self::All => "Repeat all",
            Self::One => "Repeat one",
        }
    }
}

/// One playable entry of the fixed playlist. `index` is the track's
/// position in playlist order, assigned once at registry load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub composer: Option<String>,
    pub performer: Option<String>,
    pub source: PathBuf,
    pub cover: Option<PathBuf>,
    pub index: usize,
}

impl Track {
    /// "composer — performer" line under the title; the separator is
    /// dropped when either side is missing.
    pub fn subtitle(&self) -> String {
        match (self.composer.as_deref(), self.performer.as_deref()) {
            (Some(composer), Some(performer)) => format!("{composer} — {performer}"),
            (Some(composer), None) => composer.to_string(),
            (None, Some(performer)) => performer.to_string(),
            (None, None) => String::new(),
        }
    }
}
