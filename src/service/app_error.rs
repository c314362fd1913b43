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

use rmcp::ErrorData;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// general errors
    #[error("illegal state: {0}")]
    IllegalStateError(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("config file error: {0}")]
    ConfigFileError(#[from] config::ConfigError),

    /// bridge errors
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("{op} failed: {cause}")]
    Upstream { op: &'static str, cause: String },

    #[error("{upstream} response has an unexpected format: {cause}")]
    MalformedResponse {
        upstream: &'static str,
        cause: String,
    },

    #[error("fetch aborted: {0}")]
    FetchAborted(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Wrap an upstream API failure, naming the operation that failed.
    pub fn upstream(op: &'static str, cause: impl ToString) -> Self {
        AppError::Upstream {
            op,
            cause: cause.to_string(),
        }
    }

    pub fn malformed(upstream: &'static str, cause: impl ToString) -> Self {
        AppError::MalformedResponse {
            upstream,
            cause: cause.to_string(),
        }
    }
}

impl From<AppError> for ErrorData {
    fn from(value: AppError) -> Self {
        match &value {
            AppError::InvalidValue(_) | AppError::NotFound(_) => {
                ErrorData::invalid_params(value.to_string(), None)
            }
            _ => ErrorData::internal_error(value.to_string(), None),
        }
    }
}
