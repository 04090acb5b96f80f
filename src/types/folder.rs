use serde::{Deserialize, Serialize};

/// A user-defined named collection of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}
