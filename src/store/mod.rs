//! Persistence for the catalog.
//!
//! [`CatalogStore`] is the seam between page handlers and storage. The
//! browsing surface only reads; the write operations exist for the seeding
//! command and tests, standing in for administrative tooling.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::filter::BookFilter;
use crate::models::{Author, Book, NewAuthor, NewBook, NewPublisher, Publisher};

pub trait CatalogStore: Send + Sync {
    // --- Publishers ---

    /// All publishers ordered by name.
    fn publishers(&self) -> Result<Vec<Publisher>>;

    fn publisher(&self, id: i64) -> Result<Option<Publisher>>;

    // --- Authors ---

    /// All authors ordered by name.
    fn authors(&self) -> Result<Vec<Author>>;

    fn author(&self, id: i64) -> Result<Option<Author>>;

    /// Authors of one book ordered by name.
    fn authors_of(&self, book_id: i64) -> Result<Vec<Author>>;

    // --- Books ---

    /// Books matching `filter`, ordered by title.
    fn books(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    fn book(&self, id: i64) -> Result<Option<Book>>;

    /// Most recently published book of a publisher, if it has any.
    fn latest_book(&self, publisher_id: i64) -> Result<Option<Book>>;

    /// Books written by one author ordered by title.
    fn books_by_author(&self, author_id: i64) -> Result<Vec<Book>>;

    // --- Administrative writes ---

    fn add_publisher(&self, publisher: NewPublisher) -> Result<Publisher>;

    fn add_author(&self, author: NewAuthor) -> Result<Author>;

    /// Inserts a book. Fails with `Invalid` when the publisher or any author
    /// does not exist.
    fn add_book(&self, book: NewBook) -> Result<Book>;

    /// Associates an author with a book. Linking twice is a no-op.
    fn link_author(&self, book_id: i64, author_id: i64) -> Result<()>;

    /// Deletes a publisher and, by cascade, its books. Returns whether the
    /// publisher existed.
    fn delete_publisher(&self, id: i64) -> Result<bool>;

    /// Deletes an author and its book associations; books are kept.
    fn delete_author(&self, id: i64) -> Result<bool>;
}
