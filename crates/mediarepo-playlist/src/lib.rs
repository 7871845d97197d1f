//! Mediarepo Playlist - playback playlist manager
//!
//! Turns catalog cookies into playable entries and picks what plays next in
//! normal, shuffle, jukebox or random-category mode.

pub mod config;
pub mod entry;
pub mod playlist;
mod shuffle;

pub use config::{load_config, PlaylistConfig};
pub use entry::PlaylistEntry;
pub use playlist::{Direction, PlayMode, PlaylistChange, PlaylistManager};
