//! Cover and poster art references

use crate::base::{CatalogEntity, EntityBase};
use crate::wire::{FieldStep, WireFormat};

pub const IMAGE_MAGIC: u32 = 0x494D_4147;

/// Art references for a title set or collection.
///
/// Pixel buffers are loaded on demand by the host and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub base: EntityBase,
    pub large_art_path: String,
    pub large_art_id: String,
    pub small_art_path: String,
    pub small_art_id: String,
    pub poster_art_path: String,
    pub poster_art_id: String,
    /// Runtime only
    pub large_pixels: Option<Vec<u8>>,
    /// Runtime only
    pub small_pixels: Option<Vec<u8>>,
}

impl Image {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            base: EntityBase::new(id, name),
            ..Default::default()
        }
    }

    /// Drop the loaded pixel buffers
    pub fn clear_pixels(&mut self) {
        self.large_pixels = None;
        self.small_pixels = None;
    }
}

impl CatalogEntity for Image {
    const KIND: &'static str = "image";

    fn base(&self) -> &EntityBase {
        &self.base
    }
}

impl WireFormat for Image {
    const TYPE_NAME: &'static str = "Image";
    const MAGIC: Option<u32> = Some(IMAGE_MAGIC);
    const FORMAT_VERSION: u16 = 3;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<Image>] = &[
            FieldStep::new(
                1,
                |i, w| {
                    i.base.encode(w);
                    w.put_str(&i.large_art_path);
                    w.put_str(&i.large_art_id);
                    w.put_str(&i.small_art_path);
                    w.put_str(&i.small_art_id);
                },
                |i, r| {
                    i.base = EntityBase::decode(r)?;
                    i.large_art_path = r.get_str()?;
                    i.large_art_id = r.get_str()?;
                    i.small_art_path = r.get_str()?;
                    i.small_art_id = r.get_str()?;
                    Ok(())
                },
            ),
            // Byte size of the large art, dropped once art moved out of band
            FieldStep::retired(
                1,
                3,
                |_, w| w.put_u32(0),
                |_, r| {
                    r.get_u32()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                2,
                |i, w| {
                    w.put_str(&i.poster_art_path);
                    w.put_str(&i.poster_art_id);
                },
                |i, r| {
                    i.poster_art_path = r.get_str()?;
                    i.poster_art_id = r.get_str()?;
                    Ok(())
                },
            ),
        ];
        STEPS
    }
}
