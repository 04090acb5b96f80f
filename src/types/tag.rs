use serde::{Deserialize, Serialize};

/// Colours a new tag may be given. Chosen at random once, then fixed.
pub const TAG_PALETTE: [&str; 8] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#14b8a6", "#3b82f6", "#8b5cf6", "#ec4899",
];

/// A label cross-referencing links and folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Link ids that have used this tag. Grows only.
    pub links: Vec<String>,
    /// Folder ids that have used this tag. Grows only.
    pub folders: Vec<String>,
    pub created_at: i64,
}
