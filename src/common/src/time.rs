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

use chrono::NaiveDateTime;

/// Microsecond-precision watermark format: `YYYY-MM-DD HH:MM:SS.ffffff`.
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Serializes a watermark for storage. Per `spec.md` §3, watermarks carry
/// microsecond precision.
pub fn format_watermark(ts: NaiveDateTime) -> String {
    ts.format(WATERMARK_FORMAT).to_string()
}

/// Parses a stored watermark. A missing or unparsable value is treated as
/// "from the beginning" (`spec.md` §3) — callers see `None` for both cases
/// and degrade the query's `WHERE` clause to a full scan.
pub fn parse_watermark(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), WATERMARK_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_microsecond_precision() {
        let ts = NaiveDateTime::parse_from_str("2023-01-01 00:00:00.000003", WATERMARK_FORMAT)
            .unwrap();
        let formatted = format_watermark(ts);
        assert_eq!(formatted, "2023-01-01 00:00:00.000003");
        assert_eq!(parse_watermark(&formatted), Some(ts));
    }

    #[test]
    fn unparsable_watermark_is_none() {
        assert_eq!(parse_watermark("not a date"), None);
        assert_eq!(parse_watermark(""), None);
    }
}
