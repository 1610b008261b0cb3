// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File references recorded against an application. The bytes live in the
//! upload store; only metadata is kept here.

use crate::domain::application::ApplicationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFile {
    pub id: i64,
    pub application_id: ApplicationId,
    pub filename: String,
    pub original_name: String,
    pub file_type: String,
    pub file_category: Option<String>,
    pub file_path: String,
    pub file_size: Option<i64>,
    pub upload_date: DateTime<Utc>,
}

/// Metadata supplied by the upload layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    #[serde(default)]
    pub original_name: Option<String>,
    pub file_type: String,
    #[serde(default)]
    pub file_category: Option<String>,
    pub file_path: String,
    #[serde(default)]
    pub file_size: Option<i64>,
}

impl FileMetadata {
    /// Names the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.filename.trim().is_empty() {
            Some("filename")
        } else if self.file_type.trim().is_empty() {
            Some("file_type")
        } else if self.file_path.trim().is_empty() {
            Some("file_path")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewApplicationFile {
    pub application_id: ApplicationId,
    pub metadata: FileMetadata,
    pub upload_date: DateTime<Utc>,
}

impl NewApplicationFile {
    pub fn into_file(self, id: i64) -> ApplicationFile {
        let FileMetadata {
            filename,
            original_name,
            file_type,
            file_category,
            file_path,
            file_size,
        } = self.metadata;
        ApplicationFile {
            id,
            application_id: self.application_id,
            original_name: original_name.unwrap_or_else(|| filename.clone()),
            filename,
            file_type,
            file_category,
            file_path,
            file_size,
            upload_date: self.upload_date,
        }
    }
}
