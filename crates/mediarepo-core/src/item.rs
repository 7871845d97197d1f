//! Items - leaf playable units (tracks, chapters, pictures)

use crate::base::{CatalogEntity, EntityBase};
use crate::wire::{FieldStep, WireFormat};

pub const ITEM_MAGIC: u32 = 0x4954_454D;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub base: EntityBase,
    /// Duration in seconds
    pub duration: u32,
    pub bit_depth: u16,
    pub bit_rate: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub rating: u16,
    pub year: u16,
    pub artist: String,
    /// File path or other location the host plays from
    pub location: String,
    pub category_ids: Vec<u16>,
}

impl Item {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            base: EntityBase::new(id, name),
            ..Default::default()
        }
    }
}

impl CatalogEntity for Item {
    const KIND: &'static str = "item";

    fn base(&self) -> &EntityBase {
        &self.base
    }
}

impl WireFormat for Item {
    const TYPE_NAME: &'static str = "Item";
    const MAGIC: Option<u32> = Some(ITEM_MAGIC);
    const FORMAT_VERSION: u16 = 4;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<Item>] = &[
            FieldStep::new(
                1,
                |i, w| {
                    i.base.encode(w);
                    w.put_u32(i.duration);
                    w.put_str(&i.location);
                    w.put_str(&i.artist);
                    w.put_ids(&i.category_ids);
                },
                |i, r| {
                    i.base = EntityBase::decode(r)?;
                    i.duration = r.get_u32()?;
                    i.location = r.get_str()?;
                    i.artist = r.get_str()?;
                    i.category_ids = r.get_ids()?;
                    Ok(())
                },
            ),
            // Play count, now tracked by the host's listening history
            FieldStep::retired(
                1,
                4,
                |_, w| w.put_u32(0),
                |_, r| {
                    r.get_u32()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                2,
                |i, w| {
                    w.put_u16(i.bit_depth);
                    w.put_u32(i.bit_rate);
                    w.put_u16(i.channels);
                    w.put_u32(i.sample_rate);
                },
                |i, r| {
                    i.bit_depth = r.get_u16()?;
                    i.bit_rate = r.get_u32()?;
                    i.channels = r.get_u16()?;
                    i.sample_rate = r.get_u32()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                3,
                |i, w| {
                    w.put_u16(i.rating);
                    w.put_u16(i.year);
                },
                |i, r| {
                    i.rating = r.get_u16()?;
                    i.year = r.get_u16()?;
                    Ok(())
                },
            ),
        ];
        STEPS
    }
}
