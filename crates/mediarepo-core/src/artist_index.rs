//! Artist browse index - artist name to title sets

use std::collections::BTreeMap;

use crate::title_set::TitleSet;
use crate::wire::{FieldStep, WireFormat};

/// Title sets by one artist, ordered by sort title. Holds ids only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistIndex {
    pub artist: String,
    pub title_set_ids: Vec<u16>,
}

impl WireFormat for ArtistIndex {
    const TYPE_NAME: &'static str = "ArtistIndex";
    const MAGIC: Option<u32> = None;
    const FORMAT_VERSION: u16 = 1;

    fn steps() -> &'static [FieldStep<Self>] {
        const STEPS: &[FieldStep<ArtistIndex>] = &[FieldStep::new(
            1,
            |a, w| {
                w.put_str(&a.artist);
                w.put_ids(&a.title_set_ids);
            },
            |a, r| {
                a.artist = r.get_str()?;
                a.title_set_ids = r.get_ids()?;
                Ok(())
            },
        )];
        STEPS
    }
}

fn index_artist(title_set: &TitleSet) -> &str {
    if title_set.rollup.artist.is_empty() {
        &title_set.artist
    } else {
        &title_set.rollup.artist
    }
}

/// Group title sets by artist and sort each group by sort title.
///
/// Grouping is an exact, case-sensitive match on the artist string, so
/// "Beatles" and "beatles" produce two entries. Title sets without an
/// artist are left out.
pub fn build_artist_index(title_sets: &BTreeMap<u16, TitleSet>) -> Vec<ArtistIndex> {
    let mut groups: BTreeMap<&str, Vec<&TitleSet>> = BTreeMap::new();
    for title_set in title_sets.values() {
        let artist = index_artist(title_set);
        if artist.is_empty() {
            continue;
        }
        groups.entry(artist).or_default().push(title_set);
    }

    groups
        .into_iter()
        .map(|(artist, mut members)| {
            members.sort_by(|a, b| {
                a.rollup
                    .sort_title
                    .cmp(&b.rollup.sort_title)
                    .then(a.base.id.cmp(&b.base.id))
            });
            ArtistIndex {
                artist: artist.to_string(),
                title_set_ids: members.iter().map(|t| t.base.id).collect(),
            }
        })
        .collect()
}
