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

//! One SQL builder per [`ProcessKind`], selected by [`build_query`]. The
//! watermark is interpolated as a string literal rather than bound as a
//! parameter: it never contains attacker-controlled input (it is read back
//! from our own state store), but a malformed value can still reach here if
//! the store is tampered with externally, so [`catalog_sync_common::time::parse_watermark`]
//! validation happens before a query is ever built — this module only
//! formats an already-validated timestamp or falls back to an unbounded scan.

use catalog_sync_common::time::{format_watermark, WATERMARK_FORMAT};
use chrono::NaiveDateTime;

use crate::process_kind::ProcessKind;

/// Builds the SQL for one run of `kind`, given its last committed watermark
/// (`None` means "from the beginning"). The result set is unbounded — the
/// watermark is the only filter — since `DB_BUFFER_SIZE` governs how many
/// rows the extractor pulls off the stream per batch, not how many rows a
/// run processes in total; a `LIMIT` here would silently truncate backlogs
/// larger than one batch and would make rows tied on the exact watermark
/// boundary timestamp unreachable on the next run.
pub fn build_query(kind: ProcessKind, watermark: Option<NaiveDateTime>) -> String {
    match kind {
        ProcessKind::MovieFilmWork => movie_family_query(
            None,
            "fw.modified",
            watermark,
            "fw.modified",
            "fw.modified",
        ),
        ProcessKind::MoviePerson => movie_family_query(
            Some(person_driving_set(watermark)),
            "fw.id IN (SELECT id FROM driving_set)",
            None,
            "driving_set.ord",
            "driving_set.ord",
        ),
        ProcessKind::MovieGenre => movie_family_query(
            Some(genre_driving_set(watermark)),
            "fw.id IN (SELECT id FROM driving_set)",
            None,
            "driving_set.ord",
            "driving_set.ord",
        ),
        ProcessKind::GenreCreatedLink => genre_link_query(watermark),
        ProcessKind::PersonCreatedLink => person_link_query(watermark),
        ProcessKind::GenreModified => genre_modified_query(watermark),
        ProcessKind::PersonModified => person_modified_query(watermark),
    }
}

/// `WHERE col > 'watermark'`, degrading to `TRUE` when there is none.
fn watermark_predicate(column: &str, watermark: Option<NaiveDateTime>) -> String {
    match watermark {
        Some(ts) => format!("{column} > '{}'", format_watermark(ts)),
        None => "TRUE".to_string(),
    }
}

fn person_driving_set(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "driving_set AS (
    SELECT pfw.film_work_id AS id, max(p.modified) AS ord
    FROM content.person p
    JOIN content.person_film_work pfw ON pfw.person_id = p.id
    WHERE {}
    GROUP BY pfw.film_work_id
)",
        watermark_predicate("p.modified", watermark)
    )
}

fn genre_driving_set(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "driving_set AS (
    SELECT gfw.film_work_id AS id, max(g.modified) AS ord
    FROM content.genre g
    JOIN content.genre_film_work gfw ON gfw.genre_id = g.id
    WHERE {}
    GROUP BY gfw.film_work_id
)",
        watermark_predicate("g.modified", watermark)
    )
}

/// The shared denormalized filmwork projection. `driving_cte`, when present,
/// is prepended as a `WITH` clause and `fw_filter` references it; otherwise
/// `fw_filter` is evaluated directly against `fw`. `order_expr`/`state_expr`
/// pick the column the row stream is ordered by and watermarked on — either
/// `fw.modified` or the driving set's aggregated `ord`.
fn movie_family_query(
    driving_cte: Option<String>,
    fw_filter: &str,
    direct_watermark: Option<NaiveDateTime>,
    order_expr: &str,
    state_expr: &str,
) -> String {
    let with_clause = match &driving_cte {
        Some(cte) => format!("WITH {cte}\n"),
        None => String::new(),
    };
    let fw_where = if driving_cte.is_some() {
        fw_filter.to_string()
    } else {
        watermark_predicate(fw_filter, direct_watermark)
    };
    let join = if driving_cte.is_some() {
        "JOIN driving_set ON driving_set.id = fw.id\n"
    } else {
        ""
    };

    format!(
        "{with_clause}SELECT
    fw.id,
    fw.rating AS imdb_rating,
    fw.title,
    fw.description,
    COALESCE(json_agg(DISTINCT jsonb_build_object('id', g.id, 'name', g.name))
        FILTER (WHERE g.id IS NOT NULL), '[]') AS genres,
    array_remove(array_agg(DISTINCT p.id), NULL) AS persons,
    array_remove(array_agg(DISTINCT p.full_name) FILTER (WHERE pfw.role = 'director'), NULL) AS directors_names,
    array_remove(array_agg(DISTINCT p.full_name) FILTER (WHERE pfw.role = 'actor'), NULL) AS actors_names,
    array_remove(array_agg(DISTINCT p.full_name) FILTER (WHERE pfw.role = 'writer'), NULL) AS writers_names,
    COALESCE(json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'director'), '[]') AS directors,
    COALESCE(json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'actor'), '[]') AS actors,
    COALESCE(json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name))
        FILTER (WHERE pfw.role = 'writer'), '[]') AS writers,
    {state_expr} AS modified_state
FROM content.film_work fw
{join}LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
LEFT JOIN content.genre g ON g.id = gfw.genre_id
LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
LEFT JOIN content.person p ON p.id = pfw.person_id
WHERE {fw_where}
GROUP BY fw.id{group_by_ord}
ORDER BY {order_expr}",
        group_by_ord = if driving_cte.is_some() {
            ", driving_set.ord"
        } else {
            ""
        },
    )
}

fn genre_link_query(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "SELECT
    g.id,
    g.name,
    g.description,
    max(gfw.created) AS modified_state
FROM content.genre g
JOIN content.genre_film_work gfw ON gfw.genre_id = g.id
WHERE {}
GROUP BY g.id
ORDER BY modified_state",
        watermark_predicate("gfw.created", watermark)
    )
}

fn genre_modified_query(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "SELECT
    g.id,
    g.name,
    g.description,
    g.modified AS modified_state
FROM content.genre g
WHERE {}
ORDER BY g.modified",
        watermark_predicate("g.modified", watermark)
    )
}

/// Shared by the person link and person-modified families: four disjoint
/// film-id arrays by role plus a `films` union. The `other` bucket is
/// whatever isn't `actor`/`director`/`writer` — see `DESIGN.md` for why that
/// is left as-is rather than "corrected".
fn person_aggregate_select() -> &'static str {
    "p.id,
    p.full_name,
    array_remove(array_agg(DISTINCT pfw.film_work_id) FILTER (WHERE pfw.role = 'actor'), NULL) AS actor,
    array_remove(array_agg(DISTINCT pfw.film_work_id) FILTER (WHERE pfw.role = 'director'), NULL) AS director,
    array_remove(array_agg(DISTINCT pfw.film_work_id) FILTER (WHERE pfw.role = 'writer'), NULL) AS writer,
    array_remove(array_agg(DISTINCT pfw.film_work_id)
        FILTER (WHERE pfw.role NOT IN ('actor', 'director', 'writer')), NULL) AS other,
    array_remove(array_agg(DISTINCT pfw.film_work_id), NULL) AS films"
}

fn person_link_query(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "SELECT
    {select},
    max(pfw.created) AS modified_state
FROM content.person p
JOIN content.person_film_work pfw ON pfw.person_id = p.id
WHERE {where_clause}
GROUP BY p.id
ORDER BY modified_state",
        select = person_aggregate_select(),
        where_clause = watermark_predicate("pfw.created", watermark),
    )
}

fn person_modified_query(watermark: Option<NaiveDateTime>) -> String {
    format!(
        "SELECT
    {select},
    max(p.modified) AS modified_state
FROM content.person p
LEFT JOIN content.person_film_work pfw ON pfw.person_id = p.id
WHERE {where_clause}
GROUP BY p.id
ORDER BY modified_state",
        select = person_aggregate_select(),
        where_clause = watermark_predicate("p.modified", watermark),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_watermark_degrades_to_full_scan() {
        let sql = build_query(ProcessKind::MovieFilmWork, None);
        assert!(sql.contains("WHERE TRUE"));
    }

    #[test]
    fn present_watermark_is_formatted_with_microsecond_precision() {
        let ts = NaiveDateTime::parse_from_str("2023-01-01 00:00:00.000003", WATERMARK_FORMAT)
            .unwrap();
        let sql = build_query(ProcessKind::GenreModified, Some(ts));
        assert!(sql.contains("2023-01-01 00:00:00.000003"));
    }

    #[test]
    fn movie_person_uses_a_driving_cte_ordered_by_aggregated_modified() {
        let sql = build_query(ProcessKind::MoviePerson, None);
        assert!(sql.starts_with("WITH driving_set"));
        assert!(sql.contains("ORDER BY driving_set.ord"));
    }

    #[test]
    fn every_kind_orders_rows_by_its_own_modified_state_expression() {
        for kind in ProcessKind::ALL {
            let sql = build_query(kind, None);
            assert!(sql.contains("modified_state") || sql.contains("ord"));
        }
    }

    #[test]
    fn no_query_bounds_the_result_set_with_a_limit_clause() {
        for kind in ProcessKind::ALL {
            let sql = build_query(kind, None);
            assert!(!sql.to_uppercase().contains("LIMIT"));
        }
    }
}
