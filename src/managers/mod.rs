// linkvault state managers
// Managers own the synchronous SQLite operations: users, folders, links, tags.

pub mod folder_manager;
pub mod link_manager;
pub mod tag_manager;
pub mod user_manager;
