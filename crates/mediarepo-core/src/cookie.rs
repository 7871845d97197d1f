//! Cookie codec - compact hierarchical text addresses for catalog entities
//!
//! A cookie is a comma-separated list of hex fields:
//! `mediaType,categoryId[,titleSetId[,collectionIndex[,itemIndex]]]`
//!
//! The category and title set fields are surrogate ids. The collection and
//! item fields are 1-based positions within the parent's membership list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MediaError;

/// Maximum number of fields in a cookie
pub const MAX_FIELDS: usize = 5;

/// Minimum number of fields in a cookie (media type + category)
pub const MIN_FIELDS: usize = 2;

/// Upper bound on cookie text length: 4 hex digits per field plus separators
pub const MAX_COOKIE_LEN: usize = MAX_FIELDS * 4 + (MAX_FIELDS - 1);

/// Kind of media held by a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie = 0,
    Music = 1,
    Pic = 2,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Movie, MediaType::Music, MediaType::Pic];
    pub const COUNT: usize = Self::ALL.len();

    pub fn ordinal(self) -> u16 {
        self as u16
    }

    pub fn from_ordinal(ordinal: u16) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Slot of this media type in per-type arrays
    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::Movie => "movie",
            MediaType::Music => "music",
            MediaType::Pic => "pic",
        };
        write!(f, "{}", name)
    }
}

/// Set of acceptable media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaTypeMask(u8);

impl MediaTypeMask {
    pub const NONE: MediaTypeMask = MediaTypeMask(0);
    pub const ALL: MediaTypeMask = MediaTypeMask(0b111);

    pub fn of(types: &[MediaType]) -> Self {
        Self(types.iter().fold(0, |acc, t| acc | t.bit()))
    }

    pub fn with(self, media_type: MediaType) -> Self {
        Self(self.0 | media_type.bit())
    }

    pub fn contains(self, media_type: MediaType) -> bool {
        self.0 & media_type.bit() != 0
    }
}

/// Hierarchy depth a cookie addresses, derived purely from its field count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookieKind {
    Category,
    TitleSet,
    Collection,
    Item,
}

impl CookieKind {
    pub fn field_count(self) -> usize {
        match self {
            CookieKind::Category => 2,
            CookieKind::TitleSet => 3,
            CookieKind::Collection => 4,
            CookieKind::Item => 5,
        }
    }

    fn from_field_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(CookieKind::Category),
            3 => Some(CookieKind::TitleSet),
            4 => Some(CookieKind::Collection),
            5 => Some(CookieKind::Item),
            _ => None,
        }
    }
}

/// A parsed cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cookie {
    media_type: MediaType,
    /// Category id, title set id, collection index, item index
    ids: [u16; MAX_FIELDS - 1],
    /// Number of meaningful entries in `ids`
    depth: usize,
}

impl Cookie {
    pub fn category(media_type: MediaType, category_id: u16) -> Self {
        Self {
            media_type,
            ids: [category_id, 0, 0, 0],
            depth: 1,
        }
    }

    pub fn title_set(media_type: MediaType, category_id: u16, title_set_id: u16) -> Self {
        Self {
            media_type,
            ids: [category_id, title_set_id, 0, 0],
            depth: 2,
        }
    }

    pub fn collection(
        media_type: MediaType,
        category_id: u16,
        title_set_id: u16,
        collection_index: u16,
    ) -> Self {
        Self {
            media_type,
            ids: [category_id, title_set_id, collection_index, 0],
            depth: 3,
        }
    }

    pub fn item(
        media_type: MediaType,
        category_id: u16,
        title_set_id: u16,
        collection_index: u16,
        item_index: u16,
    ) -> Self {
        Self {
            media_type,
            ids: [category_id, title_set_id, collection_index, item_index],
            depth: 4,
        }
    }

    /// Parse cookie text
    pub fn parse(text: &str) -> Result<Self, MediaError> {
        if text.len() > MAX_COOKIE_LEN {
            return Err(MediaError::format(format!(
                "cookie is {} chars, limit is {}",
                text.len(),
                MAX_COOKIE_LEN
            )));
        }

        let mut fields = [0u16; MAX_FIELDS];
        let mut count = 0;
        for field in text.split(',') {
            if count == MAX_FIELDS {
                return Err(MediaError::format(format!(
                    "cookie '{}' has more than {} fields",
                    text, MAX_FIELDS
                )));
            }
            fields[count] = parse_hex_field(field)
                .ok_or_else(|| MediaError::format(format!("bad cookie field '{}'", field)))?;
            count += 1;
        }

        if count < MIN_FIELDS {
            return Err(MediaError::format(format!(
                "cookie '{}' needs at least {} fields",
                text, MIN_FIELDS
            )));
        }

        let media_type = MediaType::from_ordinal(fields[0]).ok_or_else(|| {
            MediaError::format(format!("media type ordinal {} out of range", fields[0]))
        })?;

        let mut ids = [0u16; MAX_FIELDS - 1];
        ids[..count - 1].copy_from_slice(&fields[1..count]);
        Ok(Self {
            media_type,
            ids,
            depth: count - 1,
        })
    }

    pub fn kind(&self) -> CookieKind {
        // depth is always 1..=4, so the field count is always a known kind
        CookieKind::from_field_count(self.depth + 1).unwrap_or(CookieKind::Item)
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn category_id(&self) -> u16 {
        self.ids[0]
    }

    pub fn title_set_id(&self) -> Option<u16> {
        self.field(1)
    }

    /// 1-based position of the collection within its title set
    pub fn collection_index(&self) -> Option<u16> {
        self.field(2)
    }

    /// 1-based position of the item within its collection
    pub fn item_index(&self) -> Option<u16> {
        self.field(3)
    }

    /// Cookie one level up the hierarchy, None for a category cookie
    pub fn parent(&self) -> Option<Cookie> {
        if self.depth <= 1 {
            return None;
        }
        let mut parent = *self;
        parent.depth -= 1;
        parent.ids[parent.depth] = 0;
        Some(parent)
    }

    fn field(&self, slot: usize) -> Option<u16> {
        (slot < self.depth).then(|| self.ids[slot])
    }
}

fn parse_hex_field(field: &str) -> Option<u16> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    // from_str_radix overflows past 0xFFFF, which also rejects long fields
    u16::from_str_radix(field, 16).ok()
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.media_type.ordinal())?;
        for id in &self.ids[..self.depth] {
            write!(f, ",{:X}", id)?;
        }
        Ok(())
    }
}

impl FromStr for Cookie {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cookie::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_kind() {
        let c = Cookie::parse("1,2A").unwrap();
        assert_eq!(c.kind(), CookieKind::Category);
        assert_eq!(c.media_type(), MediaType::Music);
        assert_eq!(c.category_id(), 0x2a);
        assert_eq!(c.title_set_id(), None);

        let c = Cookie::parse("0,1,ff,2,10").unwrap();
        assert_eq!(c.kind(), CookieKind::Item);
        assert_eq!(c.media_type(), MediaType::Movie);
        assert_eq!(c.title_set_id(), Some(0xff));
        assert_eq!(c.collection_index(), Some(2));
        assert_eq!(c.item_index(), Some(0x10));
    }

    #[test]
    fn test_round_trip_all_depths() {
        let cookies = [
            Cookie::category(MediaType::Pic, 0xFFFF),
            Cookie::title_set(MediaType::Music, 3, 0xBEEF),
            Cookie::collection(MediaType::Movie, 1, 2, 3),
            Cookie::item(MediaType::Music, 0xABCD, 0x1234, 0xFFFF, 1),
        ];
        for cookie in cookies {
            let text = cookie.to_string();
            let parsed: Cookie = text.parse().unwrap();
            assert_eq!(parsed, cookie, "round trip of {}", text);
            assert_eq!(parsed.kind(), cookie.kind());
        }
    }

    #[test]
    fn test_format_is_uppercase_hex() {
        let cookie = Cookie::item(MediaType::Music, 0xab, 0xcd, 1, 0x1f);
        assert_eq!(cookie.to_string(), "1,AB,CD,1,1F");
    }

    #[test]
    fn test_rejects_too_few_fields() {
        assert!(matches!(Cookie::parse(""), Err(MediaError::Format(_))));
        assert!(matches!(Cookie::parse("1"), Err(MediaError::Format(_))));
    }

    #[test]
    fn test_rejects_too_many_fields() {
        assert!(matches!(
            Cookie::parse("1,1,1,1,1,1"),
            Err(MediaError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_bad_fields() {
        assert!(Cookie::parse("1,2G").is_err());
        assert!(Cookie::parse("1,,2").is_err());
        assert!(Cookie::parse(" 1,2").is_err());
        assert!(Cookie::parse("1,10000").is_err());
        assert!(Cookie::parse("1,-1").is_err());
    }

    #[test]
    fn test_rejects_overlong_text() {
        let text = "0001,0002,0003,0004,00005";
        assert!(text.len() > MAX_COOKIE_LEN);
        assert!(Cookie::parse(text).is_err());
        assert!(Cookie::parse("0001,0002,0003,0004,0005").is_ok());
    }

    #[test]
    fn test_rejects_unknown_media_type() {
        assert!(Cookie::parse("3,1").is_err());
        assert!(Cookie::parse("2,1").is_ok());
    }

    #[test]
    fn test_parent() {
        let item = Cookie::item(MediaType::Music, 1, 2, 3, 4);
        let col = item.parent().unwrap();
        assert_eq!(col, Cookie::collection(MediaType::Music, 1, 2, 3));
        assert_eq!(col.parent().unwrap().parent().unwrap(), Cookie::category(MediaType::Music, 1));
        assert!(Cookie::category(MediaType::Music, 1).parent().is_none());
    }

    #[test]
    fn test_media_type_mask() {
        let mask = MediaTypeMask::of(&[MediaType::Music]);
        assert!(mask.contains(MediaType::Music));
        assert!(!mask.contains(MediaType::Movie));
        assert!(mask.with(MediaType::Movie).contains(MediaType::Movie));
        assert!(!MediaTypeMask::NONE.contains(MediaType::Pic));
        assert!(MediaTypeMask::ALL.contains(MediaType::Pic));
    }
}
