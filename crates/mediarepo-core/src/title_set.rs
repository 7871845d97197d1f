//! Title sets - the top-level named work (an album, a movie title)

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::base::{CatalogEntity, EntityBase};
use crate::collection::{position, Collection};
use crate::error::MediaError;
use crate::finalize::{derive_sort_title, rollup_artist, FinalizeOptions};
use crate::item::Item;
use crate::wire::{FieldStep, WireFormat};

pub const TITLE_SET_MAGIC: u32 = 0x5449_544C;

/// Values derived by [`TitleSet::finalize`]. Never authoritative, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSetRollup {
    pub artist: String,
    pub year: u16,
    pub media_format: String,
    pub is_playlist: bool,
    pub bit_depth: u16,
    pub bit_rate: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub rating: u16,
    pub sort_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSet {
    pub base: EntityBase,
    /// Collection ids; position + 1 is the cookie index
    pub collection_ids: Vec<u16>,
    /// Authored sort title, empty to derive one from the name
    pub sort_title: String,
    pub artist: String,
    /// Whole seconds once persisted, like `EntityBase::last_modified`
    pub added: DateTime<Utc>,
    pub user_rating: u16,
    pub seq_num: u32,
    pub rollup: TitleSetRollup,
}

impl TitleSet {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            base: EntityBase::new(id, name),
            ..Default::default()
        }
    }

    /// Resolve a 1-based cookie index to a collection id
    pub fn collection_id_at(&self, index: u16) -> Result<u16, MediaError> {
        position(&self.collection_ids, index)
    }

    /// Recompute every derived value from the (already finalized) child
    /// collections and their items. Dangling ids are skipped.
    pub fn finalize(
        &mut self,
        collections: &BTreeMap<u16, Collection>,
        items: &BTreeMap<u16, Item>,
        opts: &FinalizeOptions,
    ) {
        let children: Vec<&Collection> = self
            .collection_ids
            .iter()
            .filter_map(|id| collections.get(id))
            .collect();

        let mut rollup = TitleSetRollup {
            artist: rollup_artist(children.iter().map(|c| c.rollup.artist.as_str()), opts)
                .unwrap_or_else(|| self.artist.clone()),
            year: children
                .iter()
                .map(|c| c.rollup.year)
                .filter(|y| *y != 0)
                .min()
                .unwrap_or(0),
            media_format: children
                .iter()
                .map(|c| c.media_format.as_str())
                .find(|f| !f.is_empty())
                .unwrap_or_default()
                .to_string(),
            is_playlist: children.iter().any(|c| c.is_playlist),
            sort_title: if self.sort_title.is_empty() {
                derive_sort_title(&self.base.name, opts)
            } else {
                self.sort_title.clone()
            },
            ..Default::default()
        };

        for item in children
            .iter()
            .flat_map(|c| c.item_ids.iter())
            .filter_map(|id| items.get(id))
        {
            rollup.bit_depth = rollup.bit_depth.max(item.bit_depth);
            rollup.bit_rate = rollup.bit_rate.max(item.bit_rate);
            rollup.channels = rollup.channels.max(item.channels);
            rollup.sample_rate = rollup.sample_rate.max(item.sample_rate);
            rollup.rating = rollup.rating.max(item.rating);
        }

        self.rollup = rollup;
    }
}

impl CatalogEntity for TitleSet {
    const KIND: &'static str = "title set";

    fn base(&self) -> &EntityBase {
        &self.base
    }
}

impl WireFormat for TitleSet {
    const TYPE_NAME: &'static str = "TitleSet";
    const MAGIC: Option<u32> = Some(TITLE_SET_MAGIC);
    const FORMAT_VERSION: u16 = 3;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<TitleSet>] = &[
            FieldStep::new(
                1,
                |t, w| {
                    t.base.encode(w);
                    w.put_ids(&t.collection_ids);
                    w.put_str(&t.sort_title);
                    w.put_str(&t.artist);
                },
                |t, r| {
                    t.base = EntityBase::decode(r)?;
                    t.collection_ids = r.get_ids()?;
                    t.sort_title = r.get_str()?;
                    t.artist = r.get_str()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                2,
                |t, w| {
                    w.put_time(&t.added);
                    w.put_u16(t.user_rating);
                },
                |t, r| {
                    t.added = r.get_time()?;
                    t.user_rating = r.get_u16()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                3,
                |t, w| w.put_u32(t.seq_num),
                |t, r| {
                    t.seq_num = r.get_u32()?;
                    Ok(())
                },
            ),
        ];
        STEPS
    }
}
