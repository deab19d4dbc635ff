//! Character record model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a record, shared by the local cache and the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Record ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single move in a character's move list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Move {
    pub name: String,
    /// Input notation, e.g. `df+1`
    pub command: String,
    pub hit_level: String,
    pub damage: u32,
    pub startup: String,
    pub description: String,
}

/// A combo route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Combo {
    pub name: String,
    pub inputs: Vec<String>,
    pub damage: u32,
    pub difficulty: String,
    pub notes: String,
}

/// Frame advantage values for one move. Values stay textual (`"+4~+5"`, `"i10"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameData {
    pub startup: String,
    pub on_block: String,
    pub on_hit: String,
    pub on_counter_hit: String,
}

/// Per-language overrides: language code -> field name -> text
pub type Translations = BTreeMap<String, BTreeMap<String, String>>;

/// A fighting-game character profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    /// Named stats (power, speed, range, ...)
    pub stats: BTreeMap<String, i64>,
    pub fighting_style: String,
    pub country: String,
    pub difficulty: String,
    pub move_list: Vec<Move>,
    pub combos: Vec<Combo>,
    /// Keyed by move name
    pub frame_data: BTreeMap<String, FrameData>,
    pub translations: Translations,
    pub created_by: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    pub updated_by: String,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    pub is_official: bool,
    pub version: i64,
    /// Local-only flag. Never sent to or read from the remote store.
    pub is_favorite: bool,
}

impl Record {
    /// Create an empty record with the given id and name
    #[must_use]
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: String::new(),
            thumbnail_url: None,
            stats: BTreeMap::new(),
            fighting_style: String::new(),
            country: String::new(),
            difficulty: String::new(),
            move_list: Vec::new(),
            combos: Vec::new(),
            frame_data: BTreeMap::new(),
            translations: BTreeMap::new(),
            created_by: String::new(),
            created_at: 0,
            updated_by: String::new(),
            updated_at: 0,
            is_official: false,
            version: 0,
            is_favorite: false,
        }
    }

    /// Whether `caller_id` may modify or delete this record
    #[must_use]
    pub fn can_be_modified_by(&self, caller_id: &str, is_admin: bool) -> bool {
        is_admin || (!self.created_by.is_empty() && self.created_by == caller_id)
    }

    /// Name in the requested language, falling back to the default name
    #[must_use]
    pub fn localized_name(&self, language: &str) -> &str {
        self.translations
            .get(language)
            .and_then(|fields| fields.get("name"))
            .map_or(self.name.as_str(), String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_unique() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_id_parse_rejects_blank() {
        assert!("  ".parse::<RecordId>().is_err());
        let parsed: RecordId = " jin ".parse().unwrap();
        assert_eq!(parsed.as_str(), "jin");
    }

    #[test]
    fn test_record_new_is_not_favorite() {
        let record = Record::new("jin", "Jin Kazama");
        assert!(!record.is_favorite);
        assert_eq!(record.version, 0);
        assert!(record.move_list.is_empty());
    }

    #[test]
    fn test_owner_and_admin_can_modify() {
        let mut record = Record::new("jin", "Jin Kazama");
        record.created_by = "u1".to_string();
        assert!(record.can_be_modified_by("u1", false));
        assert!(!record.can_be_modified_by("u2", false));
        assert!(record.can_be_modified_by("u2", true));
    }

    #[test]
    fn test_unowned_record_requires_admin() {
        let record = Record::new("jin", "Jin Kazama");
        assert!(!record.can_be_modified_by("", false));
    }

    #[test]
    fn test_localized_name_falls_back() {
        let mut record = Record::new("jin", "Jin Kazama");
        record.translations.insert(
            "ja".to_string(),
            BTreeMap::from([("name".to_string(), "風間仁".to_string())]),
        );
        assert_eq!(record.localized_name("ja"), "風間仁");
        assert_eq!(record.localized_name("fr"), "Jin Kazama");
    }
}
