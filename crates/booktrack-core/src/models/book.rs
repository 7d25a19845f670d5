use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Server-defined query parameters accepted by `GET /books`.
pub type BookFilters = BTreeMap<String, String>;

/// A book as stored by the service. The service owns the record; clients
/// only hold copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BookRecord")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
}

/// Wire form of a book. Documents may carry `_id`, `id`, or both (when the
/// server also emits virtuals); `_id` wins.
#[derive(Deserialize)]
struct BookRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    description: String,
}

impl TryFrom<BookRecord> for Book {
    type Error = String;

    fn try_from(record: BookRecord) -> Result<Self, Self::Error> {
        let id = record
            .underscore_id
            .or(record.id)
            .ok_or_else(|| "book is missing `_id`".to_string())?;
        Ok(Self {
            id,
            title: record.title,
            author: record.author,
            genre: record.genre,
            description: record.description,
        })
    }
}

/// The four user-editable fields sent on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
}

impl BookFields {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            description: description.into(),
        }
    }

    /// Every field is required. Returns a validation error naming each
    /// empty field.
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("author", &self.author),
            ("genre", &self.genre),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::missing_fields(missing))
        }
    }
}

impl From<&Book> for BookFields {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            description: book.description.clone(),
        }
    }
}
