//! Track listing as served by the music REST API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One item of `GET /api/music`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrack {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl MusicTrack {
    pub fn extension(&self) -> Option<&str> {
        self.metadata.get("extension").and_then(serde_json::Value::as_str)
    }

    /// Stored file name: `<fileHash>.<extension>`.
    pub fn stream_file(&self) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{ext}", self.file_hash),
            None => self.file_hash.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.author.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.author, self.title)
        }
    }
}

/// The fetched track list plus the editor's current selection.
#[derive(Clone, Debug, Default)]
pub struct Library {
    tracks: Vec<MusicTrack>,
    selected: Option<usize>,
}

impl Library {
    pub fn new(tracks: Vec<MusicTrack>) -> Self {
        Self {
            tracks,
            selected: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn tracks(&self) -> &[MusicTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Selects `index` if it exists; returns whether the selection changed.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() || self.selected == Some(index) {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// The selected track, falling back to the first one.
    pub fn current(&self) -> Option<&MusicTrack> {
        self.tracks.get(self.selected.unwrap_or(0))
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        match self.selected {
            Some(idx) if idx + 1 < self.tracks.len() => Some(idx + 1),
            Some(_) => None,
            None if self.tracks.len() > 1 => Some(1),
            None => None,
        }
    }

    pub fn prev_index(&self) -> Option<usize> {
        match self.selected {
            Some(idx) if idx > 0 => Some(idx - 1),
            _ => None,
        }
    }

    /// Stream URL of `track` under `base`.
    pub fn stream_url(base: &str, track: &MusicTrack) -> String {
        format!("{}/{}", base.trim_end_matches('/'), track.stream_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {"_id": "a1", "title": "Intro", "author": "Nova", "album": "First", "genre": "ambient",
         "year": 2021, "fileHash": "f00d", "metadata": {"extension": "mp3"},
         "createdAt": "2024-01-01", "updatedAt": "2024-01-02"},
        {"_id": "b2", "title": "Outro", "fileHash": "beef", "posterUrl": "/p.png"},
        {"_id": "c3", "title": "Bonus", "fileHash": "cafe", "metadata": {"extension": "flac"}}
    ]"#;

    #[test]
    fn parses_listing_with_optional_fields() {
        let library = Library::from_json(LISTING).unwrap();
        assert_eq!(library.tracks().len(), 3);

        let first = &library.tracks()[0];
        assert_eq!(first.id, "a1");
        assert_eq!(first.year, Some(2021));
        assert_eq!(first.display_name(), "Nova - Intro");

        let second = &library.tracks()[1];
        assert_eq!(second.poster_url.as_deref(), Some("/p.png"));
        assert_eq!(second.extension(), None);
        assert_eq!(second.display_name(), "Outro");
    }

    #[test]
    fn stream_url_joins_hash_and_extension() {
        let library = Library::from_json(LISTING).unwrap();
        let base = "http://localhost:3000/api/music/stream/";
        assert_eq!(
            Library::stream_url(base, &library.tracks()[0]),
            "http://localhost:3000/api/music/stream/f00d.mp3"
        );
        assert_eq!(library.tracks()[1].stream_file(), "beef");
    }

    #[test]
    fn current_falls_back_to_first_track() {
        let mut library = Library::from_json(LISTING).unwrap();
        assert_eq!(library.current().map(|t| t.id.as_str()), Some("a1"));
        assert_eq!(library.next_index(), Some(1));
        assert_eq!(library.prev_index(), None);

        assert!(library.select(2));
        assert!(!library.select(2));
        assert!(!library.select(7));
        assert_eq!(library.current().map(|t| t.id.as_str()), Some("c3"));
        assert_eq!(library.next_index(), None);
        assert_eq!(library.prev_index(), Some(1));
    }

    #[test]
    fn empty_library_has_no_navigation() {
        let library = Library::default();
        assert!(library.current().is_none());
        assert_eq!(library.next_index(), None);
    }
}
