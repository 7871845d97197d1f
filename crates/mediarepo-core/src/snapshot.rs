//! Whole-catalog snapshot format
//!
//! Layout: `CATALOG_MAGIC FRAME_START version:u16`, then for every media
//! type its ordinal byte followed by counted sections of categories, images,
//! items, collections and title sets (and, from version 2, artist indexes),
//! then `FRAME_END`.
//!
//! Decoded catalogs carry no rollups; run [`MediaCatalog::finalize`] after
//! loading.

use std::collections::BTreeMap;
use tracing::debug;

use crate::artist_index::ArtistIndex;
use crate::base::CatalogEntity;
use crate::catalog::{MediaCatalog, MediaStore};
use crate::cookie::MediaType;
use crate::error::MediaError;
use crate::wire::{WireFormat, WireReader, WireWriter, FRAME_END, FRAME_START};

pub const CATALOG_MAGIC: u32 = 0x4D52_4350;

/// Version 2 added the artist index sections
pub const CATALOG_FORMAT_VERSION: u16 = 2;

impl MediaCatalog {
    /// Encode the whole catalog at the current snapshot version
    pub fn encode(&self) -> Vec<u8> {
        self.encode_as(CATALOG_FORMAT_VERSION)
    }

    pub fn encode_as(&self, version: u16) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_u32(CATALOG_MAGIC);
        w.put_u8(FRAME_START);
        w.put_u16(version);
        for media_type in MediaType::ALL {
            let store = self.store(media_type);
            w.put_u8(media_type.ordinal() as u8);
            write_section(&mut w, store.categories.values());
            write_section(&mut w, store.images.values());
            write_section(&mut w, store.items.values());
            write_section(&mut w, store.collections.values());
            write_section(&mut w, store.title_sets.values());
            if version >= 2 {
                write_section(&mut w, store.artist_index.iter());
            }
        }
        w.put_u8(FRAME_END);
        w.into_bytes()
    }

    /// Decode a snapshot into a brand-new strict catalog
    pub fn decode(data: &[u8]) -> Result<MediaCatalog, MediaError> {
        let mut r = WireReader::new(data);
        let magic = r.get_u32()?;
        if magic != CATALOG_MAGIC {
            return Err(MediaError::format(format!(
                "bad catalog magic: expected {:#010x}, found {:#010x}",
                CATALOG_MAGIC, magic
            )));
        }
        r.expect_marker(FRAME_START, "catalog")?;
        let version = r.get_u16()?;
        if version == 0 || version > CATALOG_FORMAT_VERSION {
            return Err(MediaError::format(format!(
                "unsupported catalog format version {} (known: 1..={})",
                version, CATALOG_FORMAT_VERSION
            )));
        }

        let mut catalog = MediaCatalog::new();
        for media_type in MediaType::ALL {
            let ordinal = r.get_u8()?;
            if ordinal as u16 != media_type.ordinal() {
                return Err(MediaError::format(format!(
                    "catalog section for media type {} found where {} was expected",
                    ordinal, media_type
                )));
            }
            let store = catalog.store_mut(media_type);
            read_section(&mut r, &mut store.categories, media_type)?;
            read_section(&mut r, &mut store.images, media_type)?;
            read_section(&mut r, &mut store.items, media_type)?;
            read_section(&mut r, &mut store.collections, media_type)?;
            read_section(&mut r, &mut store.title_sets, media_type)?;
            if version >= 2 {
                read_artist_index(&mut r, store)?;
            }
        }
        r.expect_marker(FRAME_END, "catalog")?;

        debug!(
            version = version,
            entities = catalog.len(),
            bytes = data.len(),
            "Decoded catalog snapshot"
        );
        Ok(catalog)
    }
}

fn write_section<'a, T: WireFormat + 'a>(w: &mut WireWriter, values: impl ExactSizeIterator<Item = &'a T>) {
    w.put_u32(values.len() as u32);
    for value in values {
        value.encode(w);
    }
}

fn read_count(r: &mut WireReader<'_>) -> Result<usize, MediaError> {
    let count = r.get_u32()? as usize;
    // Every frame is at least marker + version + marker bytes
    if count > r.remaining() / 4 {
        return Err(MediaError::format(format!(
            "section count {} exceeds remaining data",
            count
        )));
    }
    Ok(count)
}

fn read_section<T: WireFormat + CatalogEntity>(
    r: &mut WireReader<'_>,
    map: &mut BTreeMap<u16, T>,
    media_type: MediaType,
) -> Result<(), MediaError> {
    for _ in 0..read_count(r)? {
        let value = T::decode(r)?;
        let id = value.id();
        if id == 0 {
            return Err(MediaError::format(format!(
                "{} {} in snapshot uses reserved id 0",
                media_type,
                T::KIND
            )));
        }
        if map.insert(id, value).is_some() {
            return Err(MediaError::format(format!(
                "duplicate {} {} id {:#x} in snapshot",
                media_type,
                T::KIND,
                id
            )));
        }
    }
    Ok(())
}

fn read_artist_index(r: &mut WireReader<'_>, store: &mut MediaStore) -> Result<(), MediaError> {
    let count = read_count(r)?;
    store.artist_index = (0..count)
        .map(|_| ArtistIndex::decode(r))
        .collect::<Result<_, _>>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::music_catalog;
    use crate::category::Category;
    use crate::finalize::FinalizeOptions;

    #[test]
    fn test_snapshot_round_trip() {
        let mut catalog = music_catalog();
        catalog
            .add_category(MediaType::Movie, Category::new(4, "Drama"))
            .unwrap();
        catalog.finalize(&FinalizeOptions::default());

        let decoded = MediaCatalog::decode(&catalog.encode()).unwrap();
        assert_eq!(decoded.len(), catalog.len());
        assert_eq!(decoded.category(MediaType::Movie, 4).unwrap().name(), "Drama");
        assert_eq!(decoded.artist_index(MediaType::Music), catalog.artist_index(MediaType::Music));

        // Rollups are not persisted
        let title_set = decoded.title_set(MediaType::Music, 10).unwrap();
        assert!(title_set.rollup.artist.is_empty());
        assert_eq!(title_set.collection_ids, vec![100, 101]);
    }

    #[test]
    fn test_snapshot_finalize_after_load_matches() {
        let opts = FinalizeOptions::default();
        let mut catalog = music_catalog();
        catalog.finalize(&opts);

        let mut decoded = MediaCatalog::decode(&catalog.encode()).unwrap();
        decoded.finalize(&opts);
        assert_eq!(
            decoded.title_set(MediaType::Music, 10),
            catalog.title_set(MediaType::Music, 10)
        );
    }

    #[test]
    fn test_snapshot_v1_has_no_artist_index() {
        let mut catalog = music_catalog();
        catalog.finalize(&FinalizeOptions::default());
        let decoded = MediaCatalog::decode(&catalog.encode_as(1)).unwrap();
        assert!(decoded.artist_index(MediaType::Music).is_empty());
        assert_eq!(decoded.len(), catalog.len());
    }

    #[test]
    fn test_snapshot_rejects_bad_header() {
        let bytes = music_catalog().encode();
        let mut bad_magic = bytes.clone();
        bad_magic[0] ^= 1;
        assert!(matches!(MediaCatalog::decode(&bad_magic), Err(MediaError::Format(_))));

        assert!(MediaCatalog::decode(&music_catalog().encode_as(0)).is_err());
        assert!(MediaCatalog::decode(&music_catalog().encode_as(3)).is_err());
        assert!(MediaCatalog::decode(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_snapshot_rejects_duplicate_ids() {
        let mut w = WireWriter::new();
        w.put_u32(CATALOG_MAGIC);
        w.put_u8(FRAME_START);
        w.put_u16(1);
        w.put_u8(MediaType::Movie.ordinal() as u8);
        w.put_u32(2);
        Category::new(1, "Drama").encode(&mut w);
        Category::new(1, "Drama again").encode(&mut w);
        match MediaCatalog::decode(w.as_bytes()) {
            Err(MediaError::Format(msg)) => assert!(msg.contains("duplicate")),
            other => panic!("expected format error, got {:?}", other.map(|c| c.len())),
        }
    }
}
