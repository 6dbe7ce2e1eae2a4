use crate::model::Track;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "jukebox";
const TRACKS_FILE: &str = "tracks.json";

/// Raw registry record as declared in the tracks file. `file` is the only
/// field that decides playability; records without it never enter the
/// playlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub performer: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub cover: Option<PathBuf>,
}

pub fn registry_path() -> Result<PathBuf> {
    if let Ok(override_path) = env::var("JUKEBOX_TRACKS") {
        return Ok(PathBuf::from(override_path));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join(APP_DIR)
        .join(TRACKS_FILE))
}

pub fn load_registry(path: &Path) -> Result<Vec<RegistryEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read track registry {}", path.display()))?;
    let entries: Vec<RegistryEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse track registry {}", path.display()))?;
    Ok(entries)
}

/// Builds the fixed playlist: declared order preserved, sourceless entries
/// dropped, duplicate ids resolved first-wins, indices contiguous from 0.
pub fn build_playlist(entries: Vec<RegistryEntry>) -> Vec<Track> {
    let mut seen = HashSet::new();
    let mut playlist = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(source) = entry.file else {
            continue;
        };
        if !seen.insert(entry.id.clone()) {
            continue;
        }
        playlist.push(Track {
            id: entry.id,
            title: entry.title,
            composer: entry.composer,
            performer: entry.performer,
            source,
            cover: entry.cover,
            index: playlist.len(),
        });
    }

    playlist
}
