//! Mapping between `Record` and remote documents.
//!
//! Documents carry camelCase scalar fields; composite fields travel as
//! JSON-encoded strings. The local favorite flag never crosses this boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::{Record, RecordId};

/// One document as stored by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Decode one element of a list response. A bad shape fails only that element.
pub fn document_from_value(value: Value) -> Result<Document> {
    serde_json::from_value(value)
        .map_err(|error| Error::Validation(format!("malformed document: {error}")))
}

/// Build the wire document for a record. `is_favorite` is dropped.
pub fn record_to_document(record: &Record) -> Result<Document> {
    let mut fields = Map::new();
    fields.insert("name".into(), record.name.clone().into());
    fields.insert("description".into(), record.description.clone().into());
    fields.insert("imageUrl".into(), record.image_url.clone().into());
    if let Some(thumbnail_url) = &record.thumbnail_url {
        fields.insert("thumbnailUrl".into(), thumbnail_url.clone().into());
    }
    fields.insert("stats".into(), serde_json::to_string(&record.stats)?.into());
    fields.insert("fightingStyle".into(), record.fighting_style.clone().into());
    fields.insert("country".into(), record.country.clone().into());
    fields.insert("difficulty".into(), record.difficulty.clone().into());
    fields.insert(
        "moveList".into(),
        serde_json::to_string(&record.move_list)?.into(),
    );
    fields.insert("combos".into(), serde_json::to_string(&record.combos)?.into());
    fields.insert(
        "frameData".into(),
        serde_json::to_string(&record.frame_data)?.into(),
    );
    fields.insert(
        "translations".into(),
        serde_json::to_string(&record.translations)?.into(),
    );
    fields.insert("createdBy".into(), record.created_by.clone().into());
    fields.insert("createdAt".into(), record.created_at.into());
    fields.insert("updatedBy".into(), record.updated_by.clone().into());
    fields.insert("updatedAt".into(), record.updated_at.into());
    fields.insert("isOfficial".into(), record.is_official.into());
    fields.insert("version".into(), record.version.into());

    Ok(Document {
        id: record.id.to_string(),
        fields,
    })
}

/// Decode a remote document. Fails with `Error::Validation` on malformed input.
pub fn document_to_record(document: &Document) -> Result<Record> {
    let id = document.id.trim();
    if id.is_empty() {
        return Err(Error::Validation("document has a blank id".to_string()));
    }

    let reader = FieldReader {
        id,
        fields: &document.fields,
    };
    Ok(Record {
        id: RecordId::from(id),
        name: reader.string("name")?,
        description: reader.string("description")?,
        image_url: reader.string("imageUrl")?,
        thumbnail_url: reader.optional_string("thumbnailUrl")?,
        stats: reader.json("stats")?,
        fighting_style: reader.string("fightingStyle")?,
        country: reader.string("country")?,
        difficulty: reader.string("difficulty")?,
        move_list: reader.json("moveList")?,
        combos: reader.json("combos")?,
        frame_data: reader.json("frameData")?,
        translations: reader.json("translations")?,
        created_by: reader.string("createdBy")?,
        created_at: reader.integer("createdAt")?,
        updated_by: reader.string("updatedBy")?,
        updated_at: reader.integer("updatedAt")?,
        is_official: reader.boolean("isOfficial")?,
        version: reader.integer("version")?,
        is_favorite: false,
    })
}

struct FieldReader<'a> {
    id: &'a str,
    fields: &'a Map<String, Value>,
}

impl FieldReader<'_> {
    fn present(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    fn wrong_type(&self, key: &str, expected: &str) -> Error {
        Error::Validation(format!(
            "document {}: field `{key}` is not {expected}",
            self.id
        ))
    }

    fn string(&self, key: &str) -> Result<String> {
        match self.present(key) {
            None => Ok(String::new()),
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(self.wrong_type(key, "a string")),
        }
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>> {
        let value = self.string(key)?;
        Ok(Some(value).filter(|value| !value.trim().is_empty()))
    }

    fn integer(&self, key: &str) -> Result<i64> {
        match self.present(key) {
            None => Ok(0),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| self.wrong_type(key, "an integer")),
        }
    }

    fn boolean(&self, key: &str) -> Result<bool> {
        match self.present(key) {
            None => Ok(false),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.wrong_type(key, "a boolean")),
        }
    }

    /// Composite field: a JSON-encoded string, or inline JSON from older writers.
    fn json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let decoded = match self.present(key) {
            None => return Ok(T::default()),
            Some(Value::String(encoded)) if encoded.trim().is_empty() => return Ok(T::default()),
            Some(Value::String(encoded)) => serde_json::from_str(encoded),
            Some(value @ (Value::Array(_) | Value::Object(_))) => T::deserialize(value),
            Some(_) => return Err(self.wrong_type(key, "JSON text")),
        };
        decoded.map_err(|error| {
            Error::Validation(format!(
                "document {}: field `{key}` does not decode: {error}",
                self.id
            ))
        })
    }
}
