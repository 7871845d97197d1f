//! Categories - named groupings that items and collections belong to

use crate::base::{CatalogEntity, EntityBase};
use crate::wire::{FieldStep, WireFormat};

pub const CATEGORY_MAGIC: u32 = 0x4341_5447;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub base: EntityBase,
}

impl Category {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            base: EntityBase::new(id, name),
        }
    }
}

impl CatalogEntity for Category {
    const KIND: &'static str = "category";

    fn base(&self) -> &EntityBase {
        &self.base
    }
}

impl WireFormat for Category {
    const TYPE_NAME: &'static str = "Category";
    const MAGIC: Option<u32> = Some(CATEGORY_MAGIC);
    const FORMAT_VERSION: u16 = 1;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<Category>] = &[FieldStep::new(
            1,
            |c, w| c.base.encode(w),
            |c, r| {
                c.base = EntityBase::decode(r)?;
                Ok(())
            },
        )];
        STEPS
    }
}
