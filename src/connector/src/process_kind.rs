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

use std::fmt;

/// One of the seven ETL streams. Declaration order here is the scheduler's
/// sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    MovieFilmWork,
    MovieGenre,
    MoviePerson,
    GenreCreatedLink,
    PersonCreatedLink,
    GenreModified,
    PersonModified,
}

impl ProcessKind {
    /// The fixed sweep order the scheduler iterates in.
    pub const ALL: [ProcessKind; 7] = [
        ProcessKind::MovieFilmWork,
        ProcessKind::MovieGenre,
        ProcessKind::MoviePerson,
        ProcessKind::GenreCreatedLink,
        ProcessKind::PersonCreatedLink,
        ProcessKind::GenreModified,
        ProcessKind::PersonModified,
    ];

    /// The sink index this kind's documents belong to.
    pub fn target_index(self) -> &'static str {
        match self {
            ProcessKind::MovieFilmWork | ProcessKind::MovieGenre | ProcessKind::MoviePerson => {
                "movies"
            }
            ProcessKind::GenreCreatedLink | ProcessKind::GenreModified => "genres",
            ProcessKind::PersonCreatedLink | ProcessKind::PersonModified => "persons",
        }
    }

    /// The state-store key this kind's watermark is persisted under.
    pub fn watermark_key(self) -> &'static str {
        match self {
            ProcessKind::MovieFilmWork => "modified_film_work",
            ProcessKind::MovieGenre => "modified_film_work_genre",
            ProcessKind::MoviePerson => "modified_film_work_person",
            ProcessKind::GenreCreatedLink => "modified_genre_created_link",
            ProcessKind::PersonCreatedLink => "modified_person_created_link",
            ProcessKind::GenreModified => "modified_genre",
            ProcessKind::PersonModified => "modified_person",
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessKind::MovieFilmWork => "movie_film_work",
            ProcessKind::MovieGenre => "movie_genre",
            ProcessKind::MoviePerson => "movie_person",
            ProcessKind::GenreCreatedLink => "genre_created_link",
            ProcessKind::PersonCreatedLink => "person_created_link",
            ProcessKind::GenreModified => "genre_modified",
            ProcessKind::PersonModified => "person_modified",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_order_matches_declaration_order() {
        assert_eq!(ProcessKind::ALL[0], ProcessKind::MovieFilmWork);
        assert_eq!(ProcessKind::ALL[6], ProcessKind::PersonModified);
    }

    #[test]
    fn every_kind_targets_one_of_three_indexes() {
        for kind in ProcessKind::ALL {
            assert!(["movies", "genres", "persons"].contains(&kind.target_index()));
        }
    }
}
