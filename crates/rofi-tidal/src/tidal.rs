//! Tidal v1 REST client implementing [`Catalog`].
//!
//! Uses the bearer token from the cached session as-is.  Expired or revoked
//! tokens simply fail the live check; refreshing is the login helper's job.

use crate::catalog::{
    Album, AlbumListing, AlbumRef, Catalog, CatalogError, SearchKind, SearchResults, Track,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tidal_proto::config::CatalogConfig;
use tidal_proto::payload::CatalogId;
use tidal_proto::session::{SessionError, SessionRecord};
use tracing::debug;

/// Tidal pages list endpoints; one page is plenty for an album.
const ALBUM_TRACK_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    country_code: String,
    #[serde(default)]
    user_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumRef {
    id: CatalogId,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTrack {
    id: CatalogId,
    title: String,
    #[serde(default)]
    artist: Option<ApiArtist>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    album: Option<ApiAlbumRef>,
    #[serde(default)]
    track_number: Option<u32>,
    #[serde(default)]
    duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    id: CatalogId,
    title: String,
    #[serde(default)]
    artist: Option<ApiArtist>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Page<ApiTrack>>,
    #[serde(default)]
    albums: Option<Page<ApiAlbum>>,
}

#[derive(Debug, Deserialize)]
struct StreamUrls {
    #[serde(default)]
    urls: Vec<String>,
}

fn artist_name(primary: Option<ApiArtist>, all: Vec<ApiArtist>) -> Option<String> {
    primary
        .or_else(|| all.into_iter().next())
        .map(|a| a.name)
}

impl From<ApiTrack> for Track {
    fn from(t: ApiTrack) -> Self {
        Track {
            id: t.id,
            name: t.title,
            artist: artist_name(t.artist, t.artists),
            album: t.album.map(|a| AlbumRef {
                id: a.id,
                name: a.title,
            }),
            track_number: t.track_number,
            duration_secs: t.duration,
        }
    }
}

impl From<ApiAlbum> for Album {
    fn from(a: ApiAlbum) -> Self {
        Album {
            id: a.id,
            name: a.title,
            artist: artist_name(a.artist, a.artists),
        }
    }
}

pub struct TidalCatalog {
    http: reqwest::Client,
    api_base: String,
    authorization: String,
    country_code: String,
    audio_quality: String,
}

impl TidalCatalog {
    /// Live check: the session is only usable if `/sessions` accepts the
    /// token.  The reply also tells us which regional catalog to query.
    pub async fn login(record: &SessionRecord, config: &CatalogConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SessionError::Rejected(e.to_string()))?;
        let api_base = config.api_base.trim_end_matches('/').to_string();
        let authorization = record.authorization();

        let response = http
            .get(format!("{}/sessions", api_base))
            .header(reqwest::header::AUTHORIZATION, &authorization)
            .send()
            .await
            .map_err(|e| SessionError::Rejected(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SessionError::Rejected(format!(
                "status {}",
                response.status().as_u16()
            )));
        }
        let info: SessionInfo = response
            .json()
            .await
            .map_err(|e| SessionError::Rejected(e.to_string()))?;
        debug!(
            "tidal: session ok user={:?} country={}",
            info.user_id, info.country_code
        );

        Ok(Self {
            http,
            api_base,
            authorization,
            country_code: info.country_code,
            audio_quality: config.audio_quality.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("tidal: GET {}", path);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .query(&[("countryCode", self.country_code.as_str())])
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Catalog for TidalCatalog {
    async fn search(
        &self,
        query: &str,
        kinds: &[SearchKind],
        limit: u32,
    ) -> Result<SearchResults, CatalogError> {
        let types = kinds
            .iter()
            .map(|k| k.api_name())
            .collect::<Vec<_>>()
            .join(",");
        let response: SearchResponse = self
            .get(
                "/search",
                &[
                    ("query", query.to_string()),
                    ("types", types),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(SearchResults {
            tracks: response
                .tracks
                .map(|p| p.items.into_iter().map(Track::from).collect())
                .unwrap_or_default(),
            albums: response
                .albums
                .map(|p| p.items.into_iter().map(Album::from).collect())
                .unwrap_or_default(),
        })
    }

    async fn fetch_album(&self, id: &CatalogId) -> Result<AlbumListing, CatalogError> {
        let album: ApiAlbum = self.get(&format!("/albums/{}", id), &[]).await?;
        let page: Page<ApiTrack> = self
            .get(
                &format!("/albums/{}/tracks", id),
                &[("limit", ALBUM_TRACK_PAGE.to_string())],
            )
            .await?;
        Ok(AlbumListing {
            album: album.into(),
            tracks: page.items.into_iter().map(Track::from).collect(),
        })
    }

    async fn fetch_track(&self, id: &CatalogId) -> Result<Track, CatalogError> {
        let track: ApiTrack = self.get(&format!("/tracks/{}", id), &[]).await?;
        Ok(track.into())
    }

    async fn resolve_playable_url(&self, track_id: &CatalogId) -> Result<String, CatalogError> {
        let streams: StreamUrls = self
            .get(
                &format!("/tracks/{}/urlpostpaywall", track_id),
                &[
                    ("urlusagemode", "STREAM".to_string()),
                    ("audioquality", self.audio_quality.clone()),
                    ("assetpresentation", "FULL".to_string()),
                ],
            )
            .await?;
        streams
            .urls
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NoStream(track_id.clone()))
    }
}
