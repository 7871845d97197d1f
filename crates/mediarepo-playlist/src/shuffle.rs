//! Anti-repeat shuffle selection
//!
//! Every entry carries a played flag. Candidates are the unplayed entries;
//! once every entry has played the flags are reset and the whole list is
//! eligible again, so selection always makes progress.

use rand::Rng;

use crate::entry::PlaylistEntry;

/// Pick the next entry index and mark it played. None only for an empty list.
pub(crate) fn select_shuffled<R: Rng>(
    rng: &mut R,
    entries: &mut [PlaylistEntry],
    current: Option<usize>,
) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }

    let mut pool: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.played)
        .map(|(i, _)| i)
        .collect();
    if pool.is_empty() {
        for entry in entries.iter_mut() {
            entry.played = false;
        }
        pool = (0..entries.len()).collect();
    }

    let choice = match pool.len() {
        1 => pool[0],
        2 => {
            if Some(pool[0]) == current {
                pool[1]
            } else {
                pool[0]
            }
        }
        n => pool[mixed_draw(rng) as usize % n],
    };
    entries[choice].played = true;
    Some(choice)
}

/// Three draws folded together with shifts and XOR
fn mixed_draw<R: Rng>(rng: &mut R) -> u32 {
    let a: u32 = rng.random();
    let b: u32 = rng.random();
    let c: u32 = rng.random();
    a ^ (b << 11) ^ (c >> 7)
}
