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

//! Source connectivity, the seven process kinds' SQL, document shapes, and
//! the sink loader — everything between a watermark and an indexed
//! document.

pub mod adapter;
pub mod documents;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod process_kind;
pub mod query;
pub mod state_store;
pub mod testing;
