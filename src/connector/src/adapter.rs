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

//! Reshapes one extracted row into a document bound for the validator.
//! Pure, allocation-minimal, and total over its input (`spec.md` §4.5).

use serde_json::{Map, Value};

/// A row after adapting: `modified_state` is gone, and `id` has been lifted
/// out as the bulk-index key while staying in `body` as an ordinary field
/// (the sink document shapes in `spec.md` §3 all carry `id` themselves).
pub struct AdaptedRow {
    pub id: String,
    pub body: Value,
}

/// Returns `None` for a row with no usable `id` — the extractor's queries
/// always project one, so this only guards against a malformed upstream
/// row rather than a real expected case.
pub fn adapt(mut row: Map<String, Value>) -> Option<AdaptedRow> {
    row.remove("modified_state");
    let id = row.get("id")?.as_str()?.to_string();
    Some(AdaptedRow {
        id,
        body: Value::Object(row),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_modified_state_and_lifts_id() {
        let mut row = Map::new();
        row.insert("id".into(), json!("00000000-0000-0000-0000-000000000001"));
        row.insert("modified_state".into(), json!("2023-01-01 00:00:00.000001"));
        row.insert("name".into(), json!("Drama"));

        let adapted = adapt(row).unwrap();
        assert_eq!(adapted.id, "00000000-0000-0000-0000-000000000001");
        assert!(adapted.body.get("modified_state").is_none());
        assert_eq!(adapted.body.get("name").unwrap(), "Drama");
    }

    #[test]
    fn row_without_id_is_rejected() {
        let mut row = Map::new();
        row.insert("name".into(), json!("Drama"));
        assert!(adapt(row).is_none());
    }
}
