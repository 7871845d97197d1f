//! Rollup helpers shared by the collection and title set finalize passes

use serde::{Deserialize, Serialize};

/// Options controlling derived values computed by finalize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeOptions {
    /// Leading words stripped (once, case-insensitively) when deriving sort titles
    #[serde(default = "default_trivial_words")]
    pub trivial_words: Vec<String>,
    /// Artist used when children disagree
    #[serde(default = "default_various_artists")]
    pub various_artists: String,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            trivial_words: default_trivial_words(),
            various_artists: default_various_artists(),
        }
    }
}

fn default_trivial_words() -> Vec<String> {
    ["a", "an", "and", "the", "of", "by", "with"]
        .iter()
        .map(|w| w.to_string())
        .collect()
}

fn default_various_artists() -> String {
    "Various Artists".to_string()
}

impl FinalizeOptions {
    pub fn is_trivial_word(&self, word: &str) -> bool {
        self.trivial_words
            .iter()
            .any(|trivial| trivial.eq_ignore_ascii_case(word))
    }
}

/// Derive a sort title: drop one leading trivial word, then upper-case.
///
/// A title made of a single trivial word keeps that word.
pub fn derive_sort_title(name: &str, opts: &FinalizeOptions) -> String {
    let trimmed = name.trim();
    let stripped = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) if opts.is_trivial_word(first) && !rest.trim().is_empty() => {
            rest.trim_start()
        }
        _ => trimmed,
    };
    stripped.to_uppercase()
}

/// Artist rollup over children: the shared artist when all non-empty
/// artists agree, the various-artists label when they differ, and None when
/// no child carries an artist.
pub fn rollup_artist<'a>(
    artists: impl IntoIterator<Item = &'a str>,
    opts: &FinalizeOptions,
) -> Option<String> {
    let mut first: Option<&str> = None;
    for artist in artists.into_iter().filter(|a| !a.is_empty()) {
        match first {
            None => first = Some(artist),
            Some(seen) if seen != artist => return Some(opts.various_artists.clone()),
            Some(_) => {}
        }
    }
    first.map(str::to_string)
}
