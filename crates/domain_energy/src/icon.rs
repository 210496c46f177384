//! Icons shown against reference data

use core_kernel::{record_accessors, IconId, Record, RecordMeta};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Directory icon files are stored under
pub const ICON_DIR: &str = "icons";

/// An uploaded icon image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IconTbl {
    pub id: IconId,
    #[validate(length(max = 2048))]
    pub name: Option<String>,
    /// Stored path, relative to the media root
    #[validate(length(min = 1, max = 2048))]
    pub file: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl IconTbl {
    /// Creates an icon whose file lives under [`ICON_DIR`]
    pub fn new(name: impl Into<String>, file_name: &str) -> Self {
        let file_name = file_name.trim_start_matches('/');
        Self {
            id: IconId::new_v7(),
            name: Some(name.into()),
            file: format!("{ICON_DIR}/{file_name}"),
            meta: RecordMeta::new(),
        }
    }
}

impl Record for IconTbl {
    record_accessors!(IconId);
}
