//! Hash list model: content hashes of published site assets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Singleton record mapping asset keys to content hashes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashList {
    #[serde(default)]
    pub hashes: HashMap<String, String>,
}
