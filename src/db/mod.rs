pub mod bookmarks;
pub mod careers;
pub mod password_reset_tokens;
pub mod quiz_questions;
pub mod users;
