// Copyright 2024 The Catalog Sync Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sink document shapes and the schema check that stands between the
//! adapter and the loader. A row that doesn't match its kind's shape is
//! dropped (never raises) — `serde_json`'s own type checking does the
//! heavy lifting: a bare scalar where a list is expected is always
//! rejected, `null` is accepted for every optional scalar and list field,
//! and `directors`/`director` is the one list field that must reject
//! `null` even though it may be an empty list. This is exactly the rule
//! pinned by `test_all_data_valid`, `test_one_row_valid` (a `genre: 1234`
//! row must be dropped), and `test_empty_director`.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::process_kind::ProcessKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDocument {
    pub id: Uuid,
    pub imdb_rating: Option<f32>,
    pub genres: Option<Vec<NamedEntity>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub persons: Option<Vec<Uuid>>,
    pub directors_names: Option<Vec<String>>,
    pub actors_names: Option<Vec<String>>,
    pub writers_names: Option<Vec<String>>,
    pub actors: Option<Vec<NamedEntity>>,
    pub writers: Option<Vec<NamedEntity>>,
    /// Non-nullable even when empty — a `null` here must be rejected.
    pub directors: Vec<NamedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreDocument {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDocument {
    pub id: Uuid,
    pub full_name: String,
    pub actor: Vec<Uuid>,
    pub writer: Vec<Uuid>,
    pub director: Vec<Uuid>,
    pub other: Vec<Uuid>,
    pub films: Vec<Uuid>,
}

/// A validated document ready for the loader, tagged with the `_id` the
/// loader upserts by (kept alongside the typed payload rather than
/// re-derived, since the payload's own `id` field name differs in case from
/// the wire `_id`).
pub enum SinkDocument {
    Movie(MovieDocument),
    Genre(GenreDocument),
    Person(PersonDocument),
}

impl SinkDocument {
    pub fn id(&self) -> Uuid {
        match self {
            SinkDocument::Movie(d) => d.id,
            SinkDocument::Genre(d) => d.id,
            SinkDocument::Person(d) => d.id,
        }
    }

    /// Re-serializes the validated, typed document. Going through the typed
    /// struct rather than forwarding the original JSON means the sink only
    /// ever sees the canonical shape for its kind, never stray columns a
    /// query builder happened to project.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            SinkDocument::Movie(d) => serde_json::to_value(d),
            SinkDocument::Genre(d) => serde_json::to_value(d),
            SinkDocument::Person(d) => serde_json::to_value(d),
        }
        .expect("sink document types are always serializable")
    }
}

/// Attempts to parse `row` (already adapted: `_id` set, `modified_state`
/// stripped) against `kind`'s schema. Returns `None` and logs at warn on
/// mismatch — the validator never raises (`spec.md` §4.6).
pub fn validate(kind: ProcessKind, row: serde_json::Value) -> Option<SinkDocument> {
    let row_for_log = kind;
    let result = match kind.target_index() {
        "movies" => serde_json::from_value::<MovieDocument>(row).map(SinkDocument::Movie),
        "genres" => serde_json::from_value::<GenreDocument>(row).map(SinkDocument::Genre),
        "persons" => serde_json::from_value::<PersonDocument>(row).map(SinkDocument::Person),
        other => unreachable!("process kind maps to one of three indexes, got {other}"),
    };

    match result {
        Ok(doc) => Some(doc),
        Err(err) => {
            warn!(kind = %row_for_log, error = %err, "row failed schema validation, dropping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_movie_row() -> serde_json::Value {
        json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "imdb_rating": 8.5,
            "genres": [{"id": "00000000-0000-0000-0000-000000000002", "name": "Drama"}],
            "title": "A Movie",
            "description": "About things",
            "persons": [],
            "directors_names": [],
            "actors_names": [],
            "writers_names": [],
            "actors": [],
            "writers": [],
            "directors": [],
        })
    }

    #[test]
    fn one_row_valid() {
        let doc = validate(ProcessKind::MovieFilmWork, valid_movie_row());
        assert!(doc.is_some());
    }

    #[test]
    fn empty_director_list_is_accepted_but_null_director_is_rejected() {
        assert!(validate(ProcessKind::MovieFilmWork, valid_movie_row()).is_some());

        let mut bad = valid_movie_row();
        bad["directors"] = serde_json::Value::Null;
        assert!(validate(ProcessKind::MovieFilmWork, bad).is_none());
    }

    #[test]
    fn scalar_value_for_a_list_field_is_rejected() {
        let mut bad = valid_movie_row();
        bad["genres"] = json!(1234);
        assert!(validate(ProcessKind::MovieFilmWork, bad).is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut bad = valid_movie_row();
        bad.as_object_mut().unwrap().remove("id");
        assert!(validate(ProcessKind::MovieFilmWork, bad).is_none());
    }

    #[test]
    fn optional_scalar_accepts_null() {
        let mut row = valid_movie_row();
        row["imdb_rating"] = serde_json::Value::Null;
        row["description"] = serde_json::Value::Null;
        assert!(validate(ProcessKind::MovieFilmWork, row).is_some());
    }

    #[test]
    fn null_is_accepted_for_every_list_field_except_directors() {
        let mut row = valid_movie_row();
        row["genre"] = serde_json::Value::Null;
        row["title"] = serde_json::Value::Null;
        row["genres"] = serde_json::Value::Null;
        row["persons"] = serde_json::Value::Null;
        row["directors_names"] = serde_json::Value::Null;
        row["actors_names"] = serde_json::Value::Null;
        row["writers_names"] = serde_json::Value::Null;
        row["actors"] = serde_json::Value::Null;
        row["writers"] = serde_json::Value::Null;
        row["directors"] = json!([]);
        assert!(validate(ProcessKind::MovieFilmWork, row).is_some());
    }
}
