//! Fields common to every catalog entity

use chrono::{DateTime, Utc};

use crate::wire::{FieldStep, WireFormat};

/// Common base fields, persisted as a nested frame inside each entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityBase {
    /// Surrogate id, 0 is never valid
    pub id: u16,
    /// Associated image id, 0 when there is none
    pub image_id: u16,
    pub alt_id: u32,
    pub load_order: u32,
    /// Persisted as whole seconds, sub-second precision does not survive
    /// a round trip
    pub last_modified: DateTime<Utc>,
    pub name: String,
    /// Persistent unique id, stable across catalog rebuilds
    pub unique_id: String,
    pub alt_id_str: String,
}

impl EntityBase {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl WireFormat for EntityBase {
    const TYPE_NAME: &'static str = "EntityBase";
    const MAGIC: Option<u32> = None;
    const FORMAT_VERSION: u16 = 3;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<EntityBase>] = &[
            FieldStep::new(
                1,
                |b, w| {
                    w.put_u16(b.id);
                    w.put_str(&b.name);
                    w.put_str(&b.unique_id);
                    w.put_u16(b.image_id);
                },
                |b, r| {
                    b.id = r.get_u16()?;
                    b.name = r.get_str()?;
                    b.unique_id = r.get_str()?;
                    b.image_id = r.get_u16()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                2,
                |b, w| {
                    w.put_u32(b.alt_id);
                    w.put_str(&b.alt_id_str);
                    w.put_u32(b.load_order);
                },
                |b, r| {
                    b.alt_id = r.get_u32()?;
                    b.alt_id_str = r.get_str()?;
                    b.load_order = r.get_u32()?;
                    Ok(())
                },
            ),
            FieldStep::new(
                3,
                |b, w| w.put_time(&b.last_modified),
                |b, r| {
                    b.last_modified = r.get_time()?;
                    Ok(())
                },
            ),
        ];
        STEPS
    }
}

/// Access to the base fields of a catalog entity
pub trait CatalogEntity {
    /// Singular type name used in logs and errors
    const KIND: &'static str;

    fn base(&self) -> &EntityBase;

    fn id(&self) -> u16 {
        self.base().id
    }

    fn name(&self) -> &str {
        &self.base().name
    }
}

#[cfg(test)]
pub(crate) fn sample_base(id: u16, name: &str) -> EntityBase {
    EntityBase {
        id,
        image_id: 9,
        alt_id: 0xDEAD,
        load_order: 4,
        last_modified: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        name: name.to_string(),
        unique_id: format!("uid-{}", id),
        alt_id_str: format!("alt-{}", id),
    }
}
