//! Playlist manager
//!
//! Owns an ordered list of [`PlaylistEntry`] values, the current index and
//! a change serial that observers poll instead of comparing lists. The
//! manager is single-owner; wrap it in a lock to share it.

use mediarepo_core::{
    indexed_ids, Collection, Cookie, MediaCatalog, MediaError, MediaType, MediaTypeMask, Resolved,
    TitleSet,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PlaylistConfig;
use crate::entry::PlaylistEntry;
use crate::shuffle::select_shuffled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Sequential with wraparound
    #[default]
    Normal,
    /// Anti-repeat random order
    Shuffle,
    /// Finished entries are removed
    Jukebox,
    /// Jukebox that refills itself from a category
    RandomCat,
}

/// What the playback driver has to do after a playlist operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistChange {
    NoAction,
    /// The current index now names a different entry
    NewItem,
    /// The list went from empty to non-empty
    NewSelection,
    /// Nothing left to play
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

pub struct PlaylistManager {
    config: PlaylistConfig,
    entries: Vec<PlaylistEntry>,
    current: Option<usize>,
    serial: u32,
    last_list_item_id: u32,
    mode: PlayMode,
    random_category: Option<(MediaType, u16)>,
    rng: StdRng,
}

impl PlaylistManager {
    pub fn new(config: PlaylistConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Manager with a deterministic random source
    pub fn with_seed(config: PlaylistConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PlaylistConfig, rng: StdRng) -> Self {
        Self {
            mode: config.mode,
            config,
            entries: Vec::new(),
            current: None,
            serial: 0,
            last_list_item_id: 0,
            random_category: None,
            rng,
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        if mode == self.mode {
            return;
        }
        if mode == PlayMode::Shuffle {
            for entry in self.entries.iter_mut() {
                entry.played = false;
            }
        }
        info!(from = ?self.mode, to = ?mode, "Playlist mode changed");
        self.mode = mode;
    }

    /// Category that RandomCat mode refills from
    pub fn set_random_category(&mut self, media_type: MediaType, category_id: u16) {
        self.random_category = Some((media_type, category_id));
    }

    pub fn random_category(&self) -> Option<(MediaType, u16)> {
        self.random_category
    }

    /// Change serial, bumped on every structural change
    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn item_at(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&PlaylistEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    fn bump_serial(&mut self) {
        self.serial = self.serial.wrapping_add(1);
    }

    fn next_list_item_id(&mut self) -> u32 {
        self.last_list_item_id = self.last_list_item_id.wrapping_add(1);
        if self.last_list_item_id == 0 {
            self.last_list_item_id = 1;
        }
        self.last_list_item_id
    }

    /// Resolve a cookie and add the entries it expands to.
    ///
    /// With `enqueue` false the new entries replace the list. Nothing is
    /// changed when the request is rejected.
    pub fn add_media(
        &mut self,
        catalog: &MediaCatalog,
        cookie: &Cookie,
        enqueue: bool,
        mask: MediaTypeMask,
        user_data: u32,
    ) -> Result<PlaylistChange, MediaError> {
        if !mask.contains(cookie.media_type()) {
            return Err(MediaError::rejected(format!(
                "{} media not accepted for cookie {}",
                cookie.media_type(),
                cookie
            )));
        }
        let resolved = catalog
            .resolve(cookie)
            .map_err(|e| MediaError::rejected(format!("cookie {} does not resolve: {}", cookie, e)))?;

        let mut added = expand(catalog, cookie, resolved, user_data)?;
        if added.is_empty() {
            return Err(MediaError::rejected(format!("cookie {} has nothing to play", cookie)));
        }

        let kept = if enqueue { self.entries.len() } else { 0 };
        if kept + added.len() > self.config.max_items {
            return Err(MediaError::rejected(format!(
                "playlist limit of {} entries reached ({} + {})",
                self.config.max_items,
                kept,
                added.len()
            )));
        }

        if !enqueue {
            self.entries.clear();
            self.current = None;
        }
        let was_empty = self.entries.is_empty();
        for entry in added.iter_mut() {
            entry.list_item_id = self.next_list_item_id();
        }
        let count = added.len();
        self.entries.append(&mut added);
        self.bump_serial();
        debug!(cookie = %cookie, added = count, total = self.entries.len(), "Added media to playlist");

        if was_empty {
            self.current = Some(0);
            Ok(PlaylistChange::NewSelection)
        } else {
            Ok(PlaylistChange::NoAction)
        }
    }

    /// Remove the entry at `index`, keeping the current entry stable
    pub fn remove_item_at(&mut self, index: usize) -> Result<PlaylistChange, MediaError> {
        if index >= self.entries.len() {
            return Err(MediaError::Index {
                index,
                len: self.entries.len(),
            });
        }
        self.entries.remove(index);
        self.bump_serial();

        if self.entries.is_empty() {
            self.current = None;
            return Ok(PlaylistChange::Stop);
        }
        let Some(current) = self.current else {
            return Ok(PlaylistChange::NoAction);
        };
        if index < current {
            self.current = Some(current - 1);
            Ok(PlaylistChange::NoAction)
        } else if index == current {
            // The following entry slid into place; wrap when the last one went
            if current >= self.entries.len() {
                self.current = Some(0);
            }
            Ok(PlaylistChange::NewItem)
        } else {
            Ok(PlaylistChange::NoAction)
        }
    }

    pub fn remove_item_by_id(&mut self, list_item_id: u32) -> Result<PlaylistChange, MediaError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.list_item_id == list_item_id)
            .ok_or_else(|| MediaError::not_found(format!("playlist item {}", list_item_id)))?;
        self.remove_item_at(index)
    }

    /// Make the entry at `index` current
    pub fn select_item_at(&mut self, index: usize) -> Result<PlaylistChange, MediaError> {
        if index >= self.entries.len() {
            return Err(MediaError::Index {
                index,
                len: self.entries.len(),
            });
        }
        if self.current == Some(index) {
            return Ok(PlaylistChange::NoAction);
        }
        self.current = Some(index);
        Ok(PlaylistChange::NewItem)
    }

    pub fn clear(&mut self) -> PlaylistChange {
        if self.entries.is_empty() {
            return PlaylistChange::NoAction;
        }
        self.entries.clear();
        self.current = None;
        self.bump_serial();
        PlaylistChange::Stop
    }

    /// Move on from the current entry according to the play mode
    pub fn select_new_item(&mut self, catalog: &MediaCatalog, direction: Direction) -> PlaylistChange {
        match self.mode {
            PlayMode::Jukebox | PlayMode::RandomCat => self.select_jukebox(catalog),
            PlayMode::Shuffle => {
                if let Some(entry) = self.current.and_then(|i| self.entries.get_mut(i)) {
                    entry.played = true;
                }
                match select_shuffled(&mut self.rng, &mut self.entries, self.current) {
                    Some(next) => {
                        self.current = Some(next);
                        PlaylistChange::NewItem
                    }
                    None => PlaylistChange::Stop,
                }
            }
            PlayMode::Normal => {
                let len = self.entries.len();
                if len == 0 {
                    return PlaylistChange::Stop;
                }
                let next = match (self.current, direction) {
                    (None, _) => 0,
                    (Some(i), Direction::Next) => (i + 1) % len,
                    (Some(i), Direction::Previous) => (i + len - 1) % len,
                };
                self.current = Some(next);
                PlaylistChange::NewItem
            }
        }
    }

    fn select_jukebox(&mut self, catalog: &MediaCatalog) -> PlaylistChange {
        let finished = self.current.take();
        if let Some(index) = finished {
            if index < self.entries.len() {
                self.entries.remove(index);
                self.bump_serial();
            }
        }
        if self.mode == PlayMode::RandomCat {
            self.refill(catalog);
        }
        if self.entries.is_empty() {
            self.current = None;
            return PlaylistChange::Stop;
        }
        let next = finished.filter(|i| *i < self.entries.len()).unwrap_or(0);
        self.current = Some(next);
        PlaylistChange::NewItem
    }

    /// Top up the list from the random category when it runs low
    fn refill(&mut self, catalog: &MediaCatalog) {
        if self.entries.len() > self.config.refill_threshold {
            return;
        }
        let Some((media_type, category_id)) = self.random_category else {
            warn!("Random category mode without a category, cannot refill");
            return;
        };
        let candidates = catalog.collections_in_category(media_type, category_id);
        if candidates.is_empty() {
            warn!(media_type = %media_type, category = category_id, "Random category is empty");
            return;
        }

        let mask = MediaTypeMask::of(&[media_type]);
        for _ in 0..self.config.refill_batch {
            let cookie = candidates[self.rng.random_range(0..candidates.len())];
            if let Err(e) = self.add_media(catalog, &cookie, true, mask, 0) {
                debug!(cookie = %cookie, error = %e, "Random category refill stopped");
                break;
            }
        }
    }
}

/// Expand a resolved cookie into playlist entries
fn expand(
    catalog: &MediaCatalog,
    cookie: &Cookie,
    resolved: Resolved<'_>,
    user_data: u32,
) -> Result<Vec<PlaylistEntry>, MediaError> {
    let media_type = cookie.media_type();
    let category_id = cookie.category_id();
    let mut out = Vec::new();

    match resolved {
        Resolved::Category(_) => {
            return Err(MediaError::rejected(format!(
                "category cookie {} cannot be played",
                cookie
            )));
        }
        Resolved::TitleSet { title_set, .. } => {
            for (index, collection_id) in indexed_ids(&title_set.collection_ids) {
                let Some(collection) = catalog.collection(media_type, collection_id) else {
                    continue;
                };
                let collection_cookie =
                    Cookie::collection(media_type, category_id, title_set.base.id, index);
                expand_collection(catalog, collection_cookie, title_set, collection, user_data, &mut out);
            }
        }
        Resolved::Collection {
            title_set,
            collection,
            ..
        } => expand_collection(catalog, *cookie, title_set, collection, user_data, &mut out),
        Resolved::Item {
            title_set,
            collection,
            item,
            ..
        } => out.push(PlaylistEntry::for_item(*cookie, title_set, collection, item, user_data)),
    }
    Ok(out)
}

fn expand_collection(
    catalog: &MediaCatalog,
    cookie: Cookie,
    title_set: &TitleSet,
    collection: &Collection,
    user_data: u32,
    out: &mut Vec<PlaylistEntry>,
) {
    if collection.location_type.is_monolithic() {
        out.push(PlaylistEntry::for_collection(cookie, title_set, collection, user_data));
        return;
    }

    let (Some(title_set_id), Some(collection_index)) =
        (cookie.title_set_id(), cookie.collection_index())
    else {
        return;
    };
    let media_type = cookie.media_type();
    for (index, item_id) in indexed_ids(&collection.item_ids) {
        let Some(item) = catalog.item(media_type, item_id) else {
            continue;
        };
        let item_cookie = Cookie::item(
            media_type,
            cookie.category_id(),
            title_set_id,
            collection_index,
            index,
        );
        out.push(PlaylistEntry::for_item(item_cookie, title_set, collection, item, user_data));
    }
}
