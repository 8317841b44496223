//! Engine configuration.
//!
//! Every field has a default, so a configuration document only needs to
//! name what it changes:
//!
//! ```
//! use listdata::ListDataConfig;
//!
//! let yaml = "
//! pagination:
//!   default_page_size: 25
//! search:
//!   highlight_pre: '['
//!   highlight_post: ']'
//! ";
//! let config = ListDataConfig::from_yaml_str(yaml).unwrap();
//! assert_eq!(config.pagination.default_page_size, 25);
//! assert_eq!(config.pagination.max_page_size, 100);
//! assert_eq!(config.search.highlight_context, 50);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ListDataError, Result};
use crate::pagination::PaginationConfig;
use crate::search::SearchConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDataConfig {
    pub search: SearchConfig,
    pub pagination: PaginationConfig,
}

impl ListDataConfig {
    /// Parses a YAML configuration document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|e| ListDataError::Config(e.to_string()))
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| ListDataError::Config(e.to_string()))
    }
}
