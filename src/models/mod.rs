//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod reference;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetails, AuthorInput};
pub use book::{Book, BookDetails, BookInput};
pub use book_instance::{BookInstance, LoanStatus};
pub use reference::{Genre, Language};
pub use user::{Capability, User, UserClaims};
