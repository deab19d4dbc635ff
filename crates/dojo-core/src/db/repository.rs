//! Record repository implementation

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{Record, RecordId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

const RECORD_COLUMNS: &str = "id, name, description, image_url, thumbnail_url, stats, \
     fighting_style, country, difficulty, move_list, combos, frame_data, translations, \
     created_by, created_at, updated_by, updated_at, is_official, version, is_favorite";

/// Trait for record storage operations
pub trait RecordRepository {
    /// Get a record by ID
    fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// List every cached record ordered by name
    fn list_all(&self) -> Result<Vec<Record>>;

    /// List favorite records ordered by name
    fn list_favorites(&self) -> Result<Vec<Record>>;

    /// IDs of every record currently marked favorite
    fn favorite_ids(&self) -> Result<HashSet<RecordId>>;

    /// Insert or replace a record by ID
    fn upsert(&self, record: &Record) -> Result<()>;

    /// Set the local favorite flag, returns false when the record is not cached
    fn set_favorite(&self, id: &RecordId, is_favorite: bool) -> Result<bool>;

    /// Delete a record, returns false when nothing was deleted
    fn delete(&self, id: &RecordId) -> Result<bool>;

    /// Delete every record, returns the number removed
    fn delete_all(&self) -> Result<usize>;

    /// Case-insensitive (Unicode) substring search over id, name, description and style
    fn search(&self, query: &str) -> Result<Vec<Record>>;
}

/// `SQLite` implementation of `RecordRepository`
///
/// Works on a plain connection or inside a transaction.
pub struct SqliteRecordRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRecordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_records(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Parse a record from a database row selected with `RECORD_COLUMNS`
    fn parse_record(row: &Row<'_>) -> rusqlite::Result<Record> {
        let id: String = row.get(0)?;
        Ok(Record {
            id: RecordId::from(id),
            name: row.get(1)?,
            description: row.get(2)?,
            image_url: row.get(3)?,
            thumbnail_url: row.get(4)?,
            stats: json_column(row, 5)?,
            fighting_style: row.get(6)?,
            country: row.get(7)?,
            difficulty: row.get(8)?,
            move_list: json_column(row, 9)?,
            combos: json_column(row, 10)?,
            frame_data: json_column(row, 11)?,
            translations: json_column(row, 12)?,
            created_by: row.get(13)?,
            created_at: row.get(14)?,
            updated_by: row.get(15)?,
            updated_at: row.get(16)?,
            is_official: row.get::<_, i32>(17)? != 0,
            version: row.get(18)?,
            is_favorite: row.get::<_, i32>(19)? != 0,
        })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?"),
                params![id.as_str()],
                Self::parse_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<Record>> {
        self.query_records(
            &format!("SELECT {RECORD_COLUMNS} FROM records ORDER BY name COLLATE NOCASE, id"),
            [],
        )
    }

    fn list_favorites(&self) -> Result<Vec<Record>> {
        self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE is_favorite = 1
                 ORDER BY name COLLATE NOCASE, id"
            ),
            [],
        )
    }

    fn favorite_ids(&self) -> Result<HashSet<RecordId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM records WHERE is_favorite = 1")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|id| id.map(RecordId::from))
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    fn upsert(&self, record: &Record) -> Result<()> {
        if record.id.is_blank() {
            return Err(Error::InvalidInput(
                "Record ID cannot be empty".to_string(),
            ));
        }

        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO records ({RECORD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
            ),
            params![
                record.id.as_str(),
                record.name,
                record.description,
                record.image_url,
                record.thumbnail_url,
                to_json(&record.stats)?,
                record.fighting_style,
                record.country,
                record.difficulty,
                to_json(&record.move_list)?,
                to_json(&record.combos)?,
                to_json(&record.frame_data)?,
                to_json(&record.translations)?,
                record.created_by,
                record.created_at,
                record.updated_by,
                record.updated_at,
                i32::from(record.is_official),
                record.version,
                i32::from(record.is_favorite),
            ],
        )?;
        Ok(())
    }

    fn set_favorite(&self, id: &RecordId, is_favorite: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE records SET is_favorite = ? WHERE id = ?",
            params![i32::from(is_favorite), id.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn delete(&self, id: &RecordId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM records WHERE id = ?", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM records", [])?)
    }

    fn search(&self, query: &str) -> Result<Vec<Record>> {
        let needle = query.trim().to_lowercase();
        let records = self.list_all()?;
        if needle.is_empty() {
            return Ok(records);
        }

        // Unicode case folding on both sides; SQLite's lower() is ASCII-only.
        Ok(records
            .into_iter()
            .filter(|record| {
                [
                    record.id.as_str(),
                    record.name.as_str(),
                    record.description.as_str(),
                    record.fighting_style.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect())
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    serde_json::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Combo, FrameData, Move};
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn jin() -> Record {
        let mut record = Record::new("jin", "Jin Kazama");
        record.description = "Heir of the Mishima Zaibatsu".to_string();
        record.fighting_style = "Karate".to_string();
        record.stats.insert("power".to_string(), 8);
        record.move_list.push(Move {
            name: "Electric Wind God Fist".to_string(),
            command: "f,n,d,df+2".to_string(),
            hit_level: "h".to_string(),
            damage: 25,
            startup: "i13".to_string(),
            description: String::new(),
        });
        record.combos.push(Combo {
            name: "Launcher".to_string(),
            inputs: vec!["df+2".to_string(), "1".to_string()],
            damage: 60,
            ..Combo::default()
        });
        record.frame_data.insert(
            "Electric Wind God Fist".to_string(),
            FrameData {
                startup: "i13".to_string(),
                on_block: "+5".to_string(),
                on_hit: "launch".to_string(),
                on_counter_hit: "launch".to_string(),
            },
        );
        record
    }

    #[test]
    fn test_upsert_and_get_roundtrips_composites() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        let record = jin();
        repo.upsert(&record).unwrap();

        let fetched = repo.get(&record.id).unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[test]
    fn test_upsert_replaces_existing_row() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        let mut renamed = jin();
        renamed.name = "Jin".to_string();
        repo.upsert(&renamed).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Jin");
    }

    #[test]
    fn test_upsert_rejects_blank_id() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());
        let err = repo.upsert(&Record::new("  ", "Nobody")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_list_orders_by_name_case_insensitively() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&Record::new("3", "paul Phoenix")).unwrap();
        repo.upsert(&Record::new("1", "King")).unwrap();
        repo.upsert(&Record::new("2", "Asuka Kazama")).unwrap();

        let names = repo
            .list_all()
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Asuka Kazama", "King", "paul Phoenix"]);
    }

    #[test]
    fn test_favorites() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        repo.upsert(&Record::new("kazuya", "Kazuya Mishima")).unwrap();

        assert!(repo.set_favorite(&RecordId::from("jin"), true).unwrap());
        assert!(!repo.set_favorite(&RecordId::from("heihachi"), true).unwrap());

        let favorites = repo.list_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id.as_str(), "jin");
        assert_eq!(
            repo.favorite_ids().unwrap(),
            HashSet::from([RecordId::from("jin")])
        );
    }

    #[test]
    fn test_search_matches_name_case_insensitively() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        repo.upsert(&Record::new("kazuya", "Kazuya Mishima")).unwrap();

        let results = repo.search("JIN").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Jin Kazama");
    }

    #[test]
    fn test_search_covers_description_and_style() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        repo.upsert(&Record::new("kazuya", "Kazuya Mishima")).unwrap();

        assert_eq!(repo.search("karate").unwrap().len(), 1);
        assert_eq!(repo.search("zaibatsu").unwrap().len(), 1);
        assert_eq!(repo.search("kaz").unwrap().len(), 2);
        assert_eq!(repo.search("   ").unwrap().len(), 2);
        assert!(repo.search("100%").unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_letters() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&Record::new("eliza", "Éliza")).unwrap();
        repo.upsert(&Record::new("lili", "Lili")).unwrap();

        let results = repo.search("é").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "eliza");
        assert_eq!(repo.search("ÉLIZA").unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        assert!(repo.delete(&RecordId::from("jin")).unwrap());
        assert!(!repo.delete(&RecordId::from("jin")).unwrap());
        assert!(repo.get(&RecordId::from("jin")).unwrap().is_none());
    }

    #[test]
    fn test_delete_all() {
        let db = setup();
        let repo = SqliteRecordRepository::new(db.connection());

        repo.upsert(&jin()).unwrap();
        repo.upsert(&Record::new("kazuya", "Kazuya Mishima")).unwrap();
        assert_eq!(repo.delete_all().unwrap(), 2);
        assert!(repo.list_all().unwrap().is_empty());
    }
}
