// Copyright 2026 science-bridges contributors
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

//! Thin MCP bridge servers for scientific-computing APIs.
//!
//! Three independent bridges share this crate: facility status (NERSC
//! and ALCF health views), an event fabric (login, topics, produce and
//! bounded-window consume) and a federation forwarder (compute,
//! transfer, search and flows REST APIs).

pub mod fabric;
pub mod facility;
pub mod federation;
pub mod server;
pub mod service;

pub use service::{global_config, AppError, AppResult, BridgeConfig, GLOBAL_CONFIG};
