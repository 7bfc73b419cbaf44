use super::CatalogStore;
use crate::error::{CatalogError, Result};
use crate::filter::{title_order, BookFilter};
use crate::models::{Author, Book, NewAuthor, NewBook, NewPublisher, Publisher};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Catalog {
    last_publisher_id: i64,
    last_author_id: i64,
    last_book_id: i64,
    publishers: Vec<Publisher>,
    authors: Vec<Author>,
    books: Vec<Book>,
    /// (book_id, author_id) pairs.
    links: BTreeSet<(i64, i64)>,
}

/// Next id for a table: one past the largest id ever seen, like SQLite's
/// `AUTOINCREMENT`.
fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

/// In-memory catalog, used by tests and by `serve --memory`.
///
/// Mirrors the SQLite store's ordering and cascade rules so either can sit
/// behind the page handlers.
#[derive(Default)]
pub struct MemoryStore {
    catalog: Mutex<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        // the catalog has no invariants a panicking writer could half-apply
        self.catalog.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CatalogStore for MemoryStore {
    fn publishers(&self) -> Result<Vec<Publisher>> {
        let mut publishers = self.lock().publishers.clone();
        publishers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(publishers)
    }

    fn publisher(&self, id: i64) -> Result<Option<Publisher>> {
        Ok(self.lock().publishers.iter().find(|p| p.id == id).cloned())
    }

    fn authors(&self) -> Result<Vec<Author>> {
        let mut authors = self.lock().authors.clone();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(authors)
    }

    fn author(&self, id: i64) -> Result<Option<Author>> {
        Ok(self.lock().authors.iter().find(|a| a.id == id).cloned())
    }

    fn authors_of(&self, book_id: i64) -> Result<Vec<Author>> {
        let catalog = self.lock();
        let mut authors: Vec<Author> = catalog
            .authors
            .iter()
            .filter(|author| catalog.links.contains(&(book_id, author.id)))
            .cloned()
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(authors)
    }

    fn books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let books = self.lock().books.clone();
        Ok(filter.apply(books))
    }

    fn book(&self, id: i64) -> Result<Option<Book>> {
        Ok(self.lock().books.iter().find(|b| b.id == id).cloned())
    }

    fn latest_book(&self, publisher_id: i64) -> Result<Option<Book>> {
        let catalog = self.lock();
        let latest = catalog
            .books
            .iter()
            .filter(|book| book.publisher_id == publisher_id)
            .max_by(|a, b| {
                a.publication_date
                    .cmp(&b.publication_date)
                    .then(a.id.cmp(&b.id))
            })
            .cloned();
        Ok(latest)
    }

    fn books_by_author(&self, author_id: i64) -> Result<Vec<Book>> {
        let catalog = self.lock();
        let mut books: Vec<Book> = catalog
            .books
            .iter()
            .filter(|book| catalog.links.contains(&(book.id, author_id)))
            .cloned()
            .collect();
        books.sort_by(title_order);
        Ok(books)
    }

    fn add_publisher(&self, publisher: NewPublisher) -> Result<Publisher> {
        publisher.check().map_err(CatalogError::Invalid)?;
        let mut catalog = self.lock();
        let created = Publisher {
            id: next_id(&mut catalog.last_publisher_id),
            name: publisher.name,
            description: publisher.description,
            logo: publisher.logo,
        };
        catalog.publishers.push(created.clone());
        Ok(created)
    }

    fn add_author(&self, author: NewAuthor) -> Result<Author> {
        author.check().map_err(CatalogError::Invalid)?;
        let mut catalog = self.lock();
        let created = Author {
            id: next_id(&mut catalog.last_author_id),
            name: author.name,
            biography: author.biography,
            photo: author.photo,
        };
        catalog.authors.push(created.clone());
        Ok(created)
    }

    fn add_book(&self, book: NewBook) -> Result<Book> {
        book.check().map_err(CatalogError::Invalid)?;
        let mut catalog = self.lock();
        if !catalog.publishers.iter().any(|p| p.id == book.publisher_id) {
            return Err(CatalogError::Invalid(format!(
                "publisher {} does not exist",
                book.publisher_id
            )));
        }
        if let Some(missing) = book
            .author_ids
            .iter()
            .find(|id| !catalog.authors.iter().any(|a| a.id == **id))
        {
            return Err(CatalogError::Invalid(format!(
                "author {} does not exist",
                missing
            )));
        }

        let created = Book {
            id: next_id(&mut catalog.last_book_id),
            publisher_id: book.publisher_id,
            title: book.title,
            publication_date: book.publication_date,
            stock: book.stock,
            isbn: book.isbn,
            summary: book.summary,
            cover_image: book.cover_image,
        };
        for author_id in book.author_ids {
            catalog.links.insert((created.id, author_id));
        }
        catalog.books.push(created.clone());
        Ok(created)
    }

    fn link_author(&self, book_id: i64, author_id: i64) -> Result<()> {
        let mut catalog = self.lock();
        if !catalog.books.iter().any(|b| b.id == book_id) {
            return Err(CatalogError::Invalid(format!("book {} does not exist", book_id)));
        }
        if !catalog.authors.iter().any(|a| a.id == author_id) {
            return Err(CatalogError::Invalid(format!(
                "author {} does not exist",
                author_id
            )));
        }
        catalog.links.insert((book_id, author_id));
        Ok(())
    }

    fn delete_publisher(&self, id: i64) -> Result<bool> {
        let mut catalog = self.lock();
        let before = catalog.publishers.len();
        catalog.publishers.retain(|p| p.id != id);
        if catalog.publishers.len() == before {
            return Ok(false);
        }
        let doomed: BTreeSet<i64> = catalog
            .books
            .iter()
            .filter(|b| b.publisher_id == id)
            .map(|b| b.id)
            .collect();
        catalog.books.retain(|b| !doomed.contains(&b.id));
        catalog.links.retain(|(book_id, _)| !doomed.contains(book_id));
        Ok(true)
    }

    fn delete_author(&self, id: i64) -> Result<bool> {
        let mut catalog = self.lock();
        let before = catalog.authors.len();
        catalog.authors.retain(|a| a.id != id);
        if catalog.authors.len() == before {
            return Ok(false);
        }
        catalog.links.retain(|(_, author_id)| *author_id != id);
        Ok(true)
    }
}
