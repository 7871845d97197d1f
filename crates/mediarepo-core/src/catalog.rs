//! Media catalog container
//!
//! The catalog owns every entity, keyed by (media type, surrogate id).
//! Parent/child links are plain ids resolved through the catalog, so
//! consumers only ever receive borrowed references.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::artist_index::{build_artist_index, ArtistIndex};
use crate::base::CatalogEntity;
use crate::category::Category;
use crate::collection::{indexed_ids, Collection};
use crate::config::CatalogConfig;
use crate::cookie::{Cookie, CookieKind, MediaType};
use crate::error::MediaError;
use crate::finalize::FinalizeOptions;
use crate::image::Image;
use crate::item::Item;
use crate::title_set::TitleSet;

/// Entities of a single media type
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    pub(crate) categories: BTreeMap<u16, Category>,
    pub(crate) images: BTreeMap<u16, Image>,
    pub(crate) items: BTreeMap<u16, Item>,
    pub(crate) collections: BTreeMap<u16, Collection>,
    pub(crate) title_sets: BTreeMap<u16, TitleSet>,
    pub(crate) artist_index: Vec<ArtistIndex>,
}

impl MediaStore {
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.images.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn title_sets(&self) -> impl Iterator<Item = &TitleSet> {
        self.title_sets.values()
    }

    pub fn artist_index(&self) -> &[ArtistIndex] {
        &self.artist_index
    }

    /// Total number of owned entities (the artist index is not counted)
    pub fn len(&self) -> usize {
        self.categories.len()
            + self.images.len()
            + self.items.len()
            + self.collections.len()
            + self.title_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entity references along a resolved cookie path
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Category(&'a Category),
    TitleSet {
        category: &'a Category,
        title_set: &'a TitleSet,
    },
    Collection {
        category: &'a Category,
        title_set: &'a TitleSet,
        collection: &'a Collection,
    },
    Item {
        category: &'a Category,
        title_set: &'a TitleSet,
        collection: &'a Collection,
        item: &'a Item,
    },
}

impl<'a> Resolved<'a> {
    pub fn kind(&self) -> CookieKind {
        match self {
            Resolved::Category(_) => CookieKind::Category,
            Resolved::TitleSet { .. } => CookieKind::TitleSet,
            Resolved::Collection { .. } => CookieKind::Collection,
            Resolved::Item { .. } => CookieKind::Item,
        }
    }

    pub fn category(&self) -> &'a Category {
        match *self {
            Resolved::Category(category)
            | Resolved::TitleSet { category, .. }
            | Resolved::Collection { category, .. }
            | Resolved::Item { category, .. } => category,
        }
    }

    pub fn title_set(&self) -> Option<&'a TitleSet> {
        match *self {
            Resolved::Category(_) => None,
            Resolved::TitleSet { title_set, .. }
            | Resolved::Collection { title_set, .. }
            | Resolved::Item { title_set, .. } => Some(title_set),
        }
    }

    pub fn collection(&self) -> Option<&'a Collection> {
        match *self {
            Resolved::Collection { collection, .. } | Resolved::Item { collection, .. } => {
                Some(collection)
            }
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&'a Item> {
        match *self {
            Resolved::Item { item, .. } => Some(item),
            _ => None,
        }
    }
}

/// In-memory media catalog
#[derive(Debug, Clone)]
pub struct MediaCatalog {
    stores: [MediaStore; MediaType::COUNT],
    /// Reject duplicate ids instead of replacing
    strict: bool,
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaCatalog {
    /// Create an empty catalog in strict mode
    pub fn new() -> Self {
        Self::with_strict(true)
    }

    pub fn with_strict(strict: bool) -> Self {
        Self {
            stores: Default::default(),
            strict,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::with_strict(config.strict)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn store(&self, media_type: MediaType) -> &MediaStore {
        &self.stores[media_type.index()]
    }

    pub(crate) fn store_mut(&mut self, media_type: MediaType) -> &mut MediaStore {
        &mut self.stores[media_type.index()]
    }

    /// Total number of entities across all media types
    pub fn len(&self) -> usize {
        self.stores.iter().map(MediaStore::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_category(&mut self, media_type: MediaType, category: Category) -> Result<(), MediaError> {
        let strict = self.strict;
        insert_entity(&mut self.store_mut(media_type).categories, media_type, category, strict)
    }

    pub fn add_image(&mut self, media_type: MediaType, image: Image) -> Result<(), MediaError> {
        let strict = self.strict;
        insert_entity(&mut self.store_mut(media_type).images, media_type, image, strict)
    }

    pub fn add_item(&mut self, media_type: MediaType, item: Item) -> Result<(), MediaError> {
        let strict = self.strict;
        insert_entity(&mut self.store_mut(media_type).items, media_type, item, strict)
    }

    pub fn add_collection(
        &mut self,
        media_type: MediaType,
        collection: Collection,
    ) -> Result<(), MediaError> {
        let strict = self.strict;
        insert_entity(&mut self.store_mut(media_type).collections, media_type, collection, strict)
    }

    pub fn add_title_set(
        &mut self,
        media_type: MediaType,
        title_set: TitleSet,
    ) -> Result<(), MediaError> {
        let strict = self.strict;
        insert_entity(&mut self.store_mut(media_type).title_sets, media_type, title_set, strict)
    }

    pub fn category(&self, media_type: MediaType, id: u16) -> Option<&Category> {
        self.store(media_type).categories.get(&id)
    }

    pub fn image(&self, media_type: MediaType, id: u16) -> Option<&Image> {
        self.store(media_type).images.get(&id)
    }

    pub fn item(&self, media_type: MediaType, id: u16) -> Option<&Item> {
        self.store(media_type).items.get(&id)
    }

    pub fn collection(&self, media_type: MediaType, id: u16) -> Option<&Collection> {
        self.store(media_type).collections.get(&id)
    }

    pub fn title_set(&self, media_type: MediaType, id: u16) -> Option<&TitleSet> {
        self.store(media_type).title_sets.get(&id)
    }

    /// Builder access; published catalogs are never mutated
    pub fn item_mut(&mut self, media_type: MediaType, id: u16) -> Option<&mut Item> {
        self.store_mut(media_type).items.get_mut(&id)
    }

    pub fn collection_mut(&mut self, media_type: MediaType, id: u16) -> Option<&mut Collection> {
        self.store_mut(media_type).collections.get_mut(&id)
    }

    pub fn title_set_mut(&mut self, media_type: MediaType, id: u16) -> Option<&mut TitleSet> {
        self.store_mut(media_type).title_sets.get_mut(&id)
    }

    pub fn artist_index(&self, media_type: MediaType) -> &[ArtistIndex] {
        &self.store(media_type).artist_index
    }

    /// Resolve a cookie to the entities along its path
    pub fn resolve(&self, cookie: &Cookie) -> Result<Resolved<'_>, MediaError> {
        let media_type = cookie.media_type();
        let store = self.store(media_type);

        let category = store.categories.get(&cookie.category_id()).ok_or_else(|| {
            MediaError::not_found(format!("{} category {:#x}", media_type, cookie.category_id()))
        })?;
        let Some(title_set_id) = cookie.title_set_id() else {
            return Ok(Resolved::Category(category));
        };

        let title_set = store.title_sets.get(&title_set_id).ok_or_else(|| {
            MediaError::not_found(format!("{} title set {:#x}", media_type, title_set_id))
        })?;
        let Some(collection_index) = cookie.collection_index() else {
            return Ok(Resolved::TitleSet { category, title_set });
        };

        let collection_id = title_set.collection_id_at(collection_index)?;
        let collection = store.collections.get(&collection_id).ok_or_else(|| {
            MediaError::not_found(format!("{} collection {:#x}", media_type, collection_id))
        })?;
        let Some(item_index) = cookie.item_index() else {
            return Ok(Resolved::Collection {
                category,
                title_set,
                collection,
            });
        };

        let item_id = collection.item_id_at(item_index)?;
        let item = store
            .items
            .get(&item_id)
            .ok_or_else(|| MediaError::not_found(format!("{} item {:#x}", media_type, item_id)))?;
        Ok(Resolved::Item {
            category,
            title_set,
            collection,
            item,
        })
    }

    /// Recompute every rollup, bottom-up, and rebuild the artist indexes.
    ///
    /// Collections are finalized before title sets so title sets see fresh
    /// collection rollups. Running this twice yields identical results.
    pub fn finalize(&mut self, opts: &FinalizeOptions) {
        for media_type in MediaType::ALL {
            let MediaStore {
                items,
                collections,
                title_sets,
                artist_index,
                ..
            } = self.store_mut(media_type);

            for collection in collections.values_mut() {
                collection.finalize(media_type, items, opts);
            }
            for title_set in title_sets.values_mut() {
                title_set.finalize(collections, items, opts);
            }
            *artist_index = build_artist_index(title_sets);

            debug!(
                media_type = %media_type,
                collections = collections.len(),
                title_sets = title_sets.len(),
                artists = artist_index.len(),
                "Finalized catalog"
            );
        }
    }

    /// Rebuild only the artist index of one media type
    pub fn rebuild_artist_index(&mut self, media_type: MediaType) {
        let store = self.store_mut(media_type);
        store.artist_index = build_artist_index(&store.title_sets);
    }

    /// Collection cookies for every collection tagged with the category
    pub fn collections_in_category(&self, media_type: MediaType, category_id: u16) -> Vec<Cookie> {
        let store = self.store(media_type);
        let mut out = Vec::new();
        for title_set in store.title_sets.values() {
            for (index, collection_id) in indexed_ids(&title_set.collection_ids) {
                let Some(collection) = store.collections.get(&collection_id) else {
                    continue;
                };
                let tagged = collection.rollup.category_ids.contains(&category_id)
                    || collection.category_ids.contains(&category_id);
                if tagged {
                    out.push(Cookie::collection(
                        media_type,
                        category_id,
                        title_set.base.id,
                        index,
                    ));
                }
            }
        }
        out
    }
}

fn insert_entity<T: CatalogEntity>(
    map: &mut BTreeMap<u16, T>,
    media_type: MediaType,
    value: T,
    strict: bool,
) -> Result<(), MediaError> {
    let id = value.id();
    if id == 0 {
        return Err(MediaError::rejected(format!(
            "{} '{}' uses reserved id 0",
            T::KIND,
            value.name()
        )));
    }
    if map.contains_key(&id) {
        if strict {
            return Err(MediaError::rejected(format!(
                "duplicate {} id {:#x} in {} catalog",
                T::KIND,
                id,
                media_type
            )));
        }
        warn!(media_type = %media_type, id = id, kind = T::KIND, "Replacing duplicate catalog entry");
    }
    map.insert(id, value);
    Ok(())
}
