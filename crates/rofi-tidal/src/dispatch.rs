//! Menu dispatcher: one invocation's input → side effects → one menu.
//!
//! Decision order, first match wins:
//!
//! ```text
//!   payload {t, n, a}       → start track, save album context, list album
//!   payload {view_al, n}    → list album
//!   "Back"                  → top-level menu
//!   contains pause / play   → toggle pause, top-level menu
//!   contains "Stop"         → stop, top-level menu
//!   other non-empty text    → search
//!   nothing                 → top-level menu
//! ```

use crate::catalog::{Catalog, CatalogError, SearchKind, Track};
use crate::player::{NowPlaying, Player, PlayerError, PlayerState};
use tidal_proto::context::{ContextStore, PlaybackContext};
use tidal_proto::menu::{
    format_duration, MenuDocument, MenuItem, BACK, ICON_ALBUM, ICON_PAUSE, ICON_PLAY, ICON_STOP,
    ICON_TRACK,
};
use tidal_proto::payload::{CatalogId, Payload};
use tracing::{debug, warn};

pub const MAIN_PROMPT: &str = "Tidal";
pub const LOGIN_REQUIRED: &str = "Login Required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    PlayTrack {
        track_id: CatalogId,
        name: String,
        artist: String,
    },
    ViewAlbum {
        album_id: CatalogId,
        name: String,
    },
    MainMenu,
    TogglePause,
    Stop,
    Search(String),
}

impl Action {
    /// Interpret the launcher's input.  `info` is the raw `ROFI_INFO` text.
    pub fn decide(selection: Option<&str>, info: Option<&str>) -> Self {
        if let Some(raw) = info.filter(|raw| !raw.trim().is_empty()) {
            match Payload::decode(raw) {
                Some(Payload::Track {
                    track_id,
                    name,
                    artist,
                }) => {
                    return Action::PlayTrack {
                        track_id,
                        name,
                        artist,
                    }
                }
                Some(Payload::Album { album_id, name }) => {
                    return Action::ViewAlbum { album_id, name }
                }
                None => debug!("dispatch: ignoring unrecognised payload {:?}", raw),
            }
        }

        let selection = selection.unwrap_or_default();
        let lowered = selection.to_lowercase();
        if selection == BACK {
            Action::MainMenu
        } else if lowered.contains("pause") || lowered.contains("play") {
            Action::TogglePause
        } else if selection.contains("Stop") {
            Action::Stop
        } else if !selection.trim().is_empty() {
            Action::Search(selection.trim().to_string())
        } else {
            Action::MainMenu
        }
    }

    pub fn needs_catalog(&self) -> bool {
        matches!(
            self,
            Action::PlayTrack { .. } | Action::ViewAlbum { .. } | Action::Search(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
enum PlayError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

pub struct Dispatcher<'a, P, C> {
    player: &'a P,
    catalog: Option<&'a C>,
    contexts: &'a ContextStore,
    search_limit: u32,
}

impl<'a, P: Player, C: Catalog> Dispatcher<'a, P, C> {
    /// `catalog` is `None` when no usable session could be opened.
    pub fn new(
        player: &'a P,
        catalog: Option<&'a C>,
        contexts: &'a ContextStore,
        search_limit: u32,
    ) -> Self {
        Self {
            player,
            catalog,
            contexts,
            search_limit,
        }
    }

    pub async fn run(&self, action: Action) -> MenuDocument {
        match action {
            Action::MainMenu => self.main_menu().await,
            Action::TogglePause => {
                self.player.toggle_pause().await;
                self.main_menu().await
            }
            Action::Stop => {
                self.player.stop().await;
                self.main_menu().await
            }
            Action::Search(query) => match self.catalog {
                Some(catalog) => self.search(catalog, &query).await,
                None => login_required(),
            },
            Action::ViewAlbum { album_id, name } => match self.catalog {
                Some(catalog) => self.album_listing(catalog, &album_id, &name).await,
                None => login_required(),
            },
            Action::PlayTrack {
                track_id,
                name,
                artist,
            } => match self.catalog {
                Some(catalog) => self.play_track(catalog, &track_id, &name, &artist).await,
                None => login_required(),
            },
        }
    }

    async fn play_track(
        &self,
        catalog: &C,
        track_id: &CatalogId,
        name: &str,
        artist: &str,
    ) -> MenuDocument {
        match self.start_track(catalog, track_id, name, artist).await {
            // Show the sibling tracks straight away.
            Ok(Some(context)) => self.album_listing(catalog, &context.id, &context.name).await,
            Ok(None) => self.main_menu().await,
            Err(e) => {
                warn!("dispatch: failed to play track {}: {}", track_id, e);
                let mut doc = self.main_menu().await;
                doc.items.insert(0, MenuItem::error(format!("Error: {}", e)));
                doc
            }
        }
    }

    async fn start_track(
        &self,
        catalog: &C,
        track_id: &CatalogId,
        name: &str,
        artist: &str,
    ) -> Result<Option<PlaybackContext>, PlayError> {
        let track = catalog.fetch_track(track_id).await?;
        let context = track
            .album
            .as_ref()
            .map(|album| PlaybackContext::new(album.id.clone(), album.name.clone()));

        let url = catalog.resolve_playable_url(track_id).await?;
        self.player
            .start(&url, &format!("{} - {}", name, artist))
            .await?;

        // Only a track that actually started replaces the album context.
        if let Some(context) = &context {
            if let Err(e) = self.contexts.save(context) {
                warn!("dispatch: could not save album context: {}", e);
            }
        }
        Ok(context)
    }

    async fn main_menu(&self) -> MenuDocument {
        let now = self.player.now_playing().await;
        let mut doc = MenuDocument::new().prompt(MAIN_PROMPT);
        doc.end_section = true;

        let Some(title) = now.title.as_deref() else {
            return doc.message("Type to search...");
        };

        let playing = now.state == PlayerState::Playing;
        let icon = if playing { "⏸" } else { "▶" };
        doc = doc.message(format!("{} {}", icon, title));

        if let Some(context) = self.contexts.load() {
            doc.push(
                MenuItem::new(format!("💿 View Album: {}", context.name))
                    .with_icon(ICON_ALBUM)
                    .with_payload(context.album_payload()),
            );
        }

        doc.push(if playing {
            MenuItem::new("⏸ Pause").with_icon(ICON_PAUSE)
        } else {
            MenuItem::new("▶ Play").with_icon(ICON_PLAY)
        });
        doc.push(MenuItem::new("⏹ Stop").with_icon(ICON_STOP));
        doc
    }

    async fn search(&self, catalog: &C, query: &str) -> MenuDocument {
        let mut doc = MenuDocument::new()
            .prompt(format!("Search: {}", query))
            .message("Select to play (Tracks) or view (Albums)");
        doc.push(MenuItem::new(BACK));

        // Two lookups so tracks still show if the album search fails.
        let outcome = async {
            let tracks = catalog
                .search(query, &[SearchKind::Tracks], self.search_limit)
                .await?
                .tracks;
            for track in tracks.iter().take(self.search_limit as usize) {
                doc.push(
                    MenuItem::new(format!("🎵 {} - {}", track.name, track.artist_name()))
                        .with_icon(ICON_TRACK)
                        .with_payload(track.payload()),
                );
            }

            let albums = catalog
                .search(query, &[SearchKind::Albums], self.search_limit)
                .await?
                .albums;
            for album in albums.iter().take(self.search_limit as usize) {
                doc.push(
                    MenuItem::new(format!("💿 {} - {}", album.name, album.artist_name()))
                        .with_icon(ICON_ALBUM)
                        .with_payload(album.payload()),
                );
            }
            Ok::<_, CatalogError>(())
        }
        .await;

        if let Err(e) = outcome {
            warn!("dispatch: search {:?} failed: {}", query, e);
            doc.push(MenuItem::error("Search Failed"));
        }
        doc
    }

    async fn album_listing(&self, catalog: &C, album_id: &CatalogId, name: &str) -> MenuDocument {
        let mut doc = MenuDocument::new()
            .prompt(format!("Album: {}", name))
            .message("Select track to play");
        doc.push(MenuItem::new(BACK));

        let listing = match catalog.fetch_album(album_id).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("dispatch: album {} failed: {}", album_id, e);
                doc.push(MenuItem::error("Failed to load album"));
                return doc;
            }
        };

        let now = self.player.now_playing().await;
        for (position, track) in listing.tracks.iter().enumerate() {
            doc.push(
                MenuItem::new(album_row(track, position + 1, &now))
                    .with_icon(ICON_TRACK)
                    .with_payload(track.payload()),
            );
        }
        doc
    }
}

/// `"<marker><name> [<m:ss>]"`.  The marker is "▶ " when the player title
/// contains the track name (mpv only exposes titles, not ids), otherwise the
/// track number, or the 1-based `position` in the listing when the catalog
/// has none.
fn album_row(track: &Track, position: usize, now: &NowPlaying) -> String {
    let is_current = now
        .title
        .as_deref()
        .is_some_and(|title| title.contains(track.name.as_str()));
    let prefix = if is_current {
        "▶ ".to_string()
    } else {
        match track.track_number {
            Some(number) => format!("{}. ", number),
            None => format!("{}. ", position),
        }
    };
    let duration = track.duration_secs.map(format_duration).unwrap_or_default();
    format!("{}{} [{}]", prefix, track.name, duration)
}

fn login_required() -> MenuDocument {
    let mut doc = MenuDocument::new();
    doc.push(MenuItem::error(LOGIN_REQUIRED));
    doc
}
