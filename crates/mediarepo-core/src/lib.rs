//! Mediarepo Core - media catalog model, addressing and persistence
//!
//! This crate provides the in-memory media catalog:
//! - Cookie codec for compact hierarchical entity addresses
//! - Catalog entities with a versioned binary format
//! - The catalog container with cookie resolution and finalize rollups
//! - Artist browse indexes and whole-catalog snapshots

pub mod artist_index;
pub mod base;
pub mod catalog;
pub mod category;
pub mod collection;
pub mod config;
pub mod cookie;
pub mod error;
pub mod finalize;
pub mod image;
pub mod item;
pub mod snapshot;
pub mod title_set;
pub mod wire;

pub use artist_index::{build_artist_index, ArtistIndex};
pub use base::{CatalogEntity, EntityBase};
pub use catalog::{MediaCatalog, MediaStore, Resolved};
pub use category::Category;
pub use collection::{indexed_ids, Collection, CollectionRollup, LocationType};
pub use config::{load_config, CatalogConfig};
pub use cookie::{Cookie, CookieKind, MediaType, MediaTypeMask};
pub use error::MediaError;
pub use finalize::{derive_sort_title, FinalizeOptions};
pub use image::Image;
pub use item::Item;
pub use snapshot::CATALOG_FORMAT_VERSION;
pub use title_set::{TitleSet, TitleSetRollup};
pub use wire::{FieldStep, WireFormat, WireReader, WireWriter, MAX_LIST_IDS};
