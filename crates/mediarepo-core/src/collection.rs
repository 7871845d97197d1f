//! Collections - a specific edition or medium of a title set

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::base::{CatalogEntity, EntityBase};
use crate::cookie::MediaType;
use crate::error::MediaError;
use crate::finalize::{rollup_artist, FinalizeOptions};
use crate::item::Item;
use crate::wire::{FieldStep, WireFormat};

pub const COLLECTION_MAGIC: u32 = 0x434F_4C4C;

/// Where a collection's media lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationType {
    /// The whole collection is one file (movie, disc image)
    #[default]
    FileCollection = 0,
    /// Each item is its own file
    FileItem = 1,
    /// A slot in a disc changer
    Changer = 2,
}

impl LocationType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LocationType::FileCollection),
            1 => Some(LocationType::FileItem),
            2 => Some(LocationType::Changer),
            _ => None,
        }
    }

    /// True when the collection plays as a single unit
    pub fn is_monolithic(self) -> bool {
        self != LocationType::FileItem
    }
}

/// Values recomputed by [`Collection::finalize`], never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionRollup {
    pub artist: String,
    pub year: u16,
    pub duration: u32,
    pub category_ids: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub base: EntityBase,
    /// Item ids in play order; position + 1 is the cookie index
    pub item_ids: Vec<u16>,
    pub category_ids: Vec<u16>,
    pub location_type: LocationType,
    pub location: String,
    pub artist: String,
    pub cast: String,
    pub rating_text: String,
    pub description: String,
    pub label: String,
    pub lead_actor: String,
    pub aspect_ratio: String,
    pub media_format: String,
    pub poster_path: String,
    pub anamorphic: bool,
    pub is_playlist: bool,
    pub year: u16,
    /// Duration in seconds, 0 when unknown
    pub duration: u32,
    pub rollup: CollectionRollup,
}

impl Collection {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            base: EntityBase::new(id, name),
            ..Default::default()
        }
    }

    /// Resolve a 1-based cookie index to an item id
    pub fn item_id_at(&self, index: u16) -> Result<u16, MediaError> {
        position(&self.item_ids, index)
    }

    /// Recompute the rollup from authored values and, for music, child items.
    ///
    /// Dangling item ids are skipped.
    pub fn finalize(
        &mut self,
        media_type: MediaType,
        items: &BTreeMap<u16, Item>,
        opts: &FinalizeOptions,
    ) {
        let mut rollup = CollectionRollup {
            artist: self.artist.clone(),
            year: self.year,
            duration: self.duration,
            category_ids: self.category_ids.clone(),
        };

        if media_type == MediaType::Music {
            let children: Vec<&Item> = self
                .item_ids
                .iter()
                .filter_map(|id| items.get(id))
                .collect();

            if let Some(artist) = rollup_artist(children.iter().map(|i| i.artist.as_str()), opts) {
                rollup.artist = artist;
            }
            if let Some(year) = children.iter().map(|i| i.year).filter(|y| *y != 0).min() {
                rollup.year = year;
            }
            if self.duration == 0 {
                rollup.duration = children
                    .iter()
                    .fold(0u32, |acc, i| acc.saturating_add(i.duration));
            }
            for category_id in children.iter().flat_map(|i| i.category_ids.iter()) {
                if !rollup.category_ids.contains(category_id) {
                    rollup.category_ids.push(*category_id);
                }
            }
        }

        self.rollup = rollup;
    }
}

/// Map a 1-based position to the id stored there
pub(crate) fn position(ids: &[u16], index: u16) -> Result<u16, MediaError> {
    if index == 0 {
        return Err(MediaError::Index {
            index: 0,
            len: ids.len(),
        });
    }
    ids.get(index as usize - 1)
        .copied()
        .ok_or(MediaError::Index {
            index: index as usize,
            len: ids.len(),
        })
}

/// Pair each id with its 1-based cookie index. Ids past the last
/// addressable position are left out.
pub fn indexed_ids(ids: &[u16]) -> impl Iterator<Item = (u16, u16)> + '_ {
    ids.iter()
        .take(u16::MAX as usize)
        .enumerate()
        .map(|(pos, id)| (pos as u16 + 1, *id))
}

impl CatalogEntity for Collection {
    const KIND: &'static str = "collection";

    fn base(&self) -> &EntityBase {
        &self.base
    }
}

impl WireFormat for Collection {
    const TYPE_NAME: &'static str = "Collection";
    const MAGIC: Option<u32> = Some(COLLECTION_MAGIC);
    const FORMAT_VERSION: u16 = 4;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<Collection>] = &[
            FieldStep::new(
                1,
                |c, w| {
                    c.base.encode(w);
                    w.put_ids(&c.item_ids);
                    w.put_ids(&c.category_ids);
                    w.put_u8(c.location_type as u8);
                    w.put_str(&c.location);
                    w.put_str(&c.artist);
                    w.put_u16(c.year);
                    w.put_u32(c.duration);
                },
                |c, r| {
                    c.base = EntityBase::decode(r)?;
                    c.item_ids = r.get_ids()?;
                    c.category_ids = r.get_ids()?;
                    let raw = r.get_u8()?;
                    c.location_type = LocationType::from_u8(raw).ok_or_else(|| {
                        MediaError::format(format!("unknown collection location type {}", raw))
                    })?;
                    c.location = r.get_str()?;
                    c.artist = r.get_str()?;
                    c.year = r.get_u16()?;
                    c.duration = r.get_u32()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                2,
                |c, w| {
                    w.put_str(&c.cast);
                    w.put_str(&c.rating_text);
                    w.put_str(&c.description);
                    w.put_str(&c.label);
                },
                |c, r| {
                    c.cast = r.get_str()?;
                    c.rating_text = r.get_str()?;
                    c.description = r.get_str()?;
                    c.label = r.get_str()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                3,
                |c, w| {
                    w.put_str(&c.lead_actor);
                    w.put_str(&c.aspect_ratio);
                    w.put_str(&c.media_format);
                    w.put_str(&c.poster_path);
                },
                |c, r| {
                    c.lead_actor = r.get_str()?;
                    c.aspect_ratio = r.get_str()?;
                    c.media_format = r.get_str()?;
                    c.poster_path = r.get_str()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                4,
                |c, w| {
                    w.put_bool(c.anamorphic);
                    w.put_bool(c.is_playlist);
                },
                |c, r| {
                    c.anamorphic = r.get_bool()?;
                    c.is_playlist = r.get_bool()?;
                    Ok(())
                },
            ),
        ];
        STEPS
    }
}
