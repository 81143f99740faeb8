//! Immutable paper and author records and the arena that holds them

mod author;
mod paper;
mod store;

pub use author::{Author, AuthorBuilder};
pub use paper::{Paper, PaperBuilder};
pub use store::RecordStore;
