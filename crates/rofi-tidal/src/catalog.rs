//! Catalog collaborator: search, metadata and stream URLs.
//!
//! The dispatcher only sees the [`Catalog`] trait.  The Tidal HTTP client in
//! `tidal.rs` is the production implementation.

use async_trait::async_trait;
use tidal_proto::payload::{CatalogId, Payload};

pub const UNKNOWN_ARTIST: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("no playable stream for track {0}")]
    NoStream(CatalogId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRef {
    pub id: CatalogId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: CatalogId,
    pub name: String,
    pub artist: Option<String>,
    pub album: Option<AlbumRef>,
    pub track_number: Option<u32>,
    pub duration_secs: Option<u64>,
}

impl Track {
    pub fn artist_name(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn payload(&self) -> Payload {
        Payload::Track {
            track_id: self.id.clone(),
            name: self.name.clone(),
            artist: self.artist_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: CatalogId,
    pub name: String,
    pub artist: Option<String>,
}

impl Album {
    pub fn artist_name(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn payload(&self) -> Payload {
        Payload::Album {
            album_id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// An album with its tracks in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumListing {
    pub album: Album,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Tracks,
    Albums,
}

impl SearchKind {
    pub fn api_name(self) -> &'static str {
        match self {
            SearchKind::Tracks => "TRACKS",
            SearchKind::Albums => "ALBUMS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search(
        &self,
        query: &str,
        kinds: &[SearchKind],
        limit: u32,
    ) -> Result<SearchResults, CatalogError>;

    async fn fetch_album(&self, id: &CatalogId) -> Result<AlbumListing, CatalogError>;

    async fn fetch_track(&self, id: &CatalogId) -> Result<Track, CatalogError>;

    async fn resolve_playable_url(&self, track_id: &CatalogId) -> Result<String, CatalogError>;
}
