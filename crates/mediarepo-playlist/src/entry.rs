//! Playlist entries

use mediarepo_core::{Collection, Cookie, Item, MediaType, TitleSet};

/// One playable unit in the playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// Unique, non-zero id assigned when the entry was added
    pub list_item_id: u32,
    /// Collection cookie for monolithic collections, item cookie otherwise
    pub cookie: Cookie,
    pub media_type: MediaType,
    pub name: String,
    pub title_set_name: String,
    pub artist: String,
    pub location: String,
    /// Duration in seconds, 0 when unknown
    pub duration: u32,
    /// Caller data passed to `add_media`
    pub user_data: u32,
    /// Already picked by the shuffle selector in the current round
    pub played: bool,
}

impl PlaylistEntry {
    /// Entry playing a whole collection as one unit
    pub(crate) fn for_collection(
        cookie: Cookie,
        title_set: &TitleSet,
        collection: &Collection,
        user_data: u32,
    ) -> Self {
        let artist = if collection.rollup.artist.is_empty() {
            &collection.artist
        } else {
            &collection.rollup.artist
        };
        Self {
            list_item_id: 0,
            cookie,
            media_type: cookie.media_type(),
            name: collection.base.name.clone(),
            title_set_name: title_set.base.name.clone(),
            artist: artist.clone(),
            location: collection.location.clone(),
            duration: collection.rollup.duration.max(collection.duration),
            user_data,
            played: false,
        }
    }

    /// Entry playing a single item
    pub(crate) fn for_item(
        cookie: Cookie,
        title_set: &TitleSet,
        collection: &Collection,
        item: &Item,
        user_data: u32,
    ) -> Self {
        let artist = if item.artist.is_empty() {
            &collection.artist
        } else {
            &item.artist
        };
        Self {
            list_item_id: 0,
            cookie,
            media_type: cookie.media_type(),
            name: item.base.name.clone(),
            title_set_name: title_set.base.name.clone(),
            artist: artist.clone(),
            location: item.location.clone(),
            duration: item.duration,
            user_data,
            played: false,
        }
    }
}
