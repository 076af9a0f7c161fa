//! Data models for Libris

pub mod book;
pub mod category;
pub mod history;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookSummary};
pub use category::Category;
pub use history::{HistoryEntry, HistoryEvent};
pub use review::Review;
pub use user::{Role, User, UserClaims, UserSummary};
