use super::CatalogStore;
use crate::db;
use crate::error::{CatalogError, Result};
use crate::filter::BookFilter;
use crate::models::{Author, Book, NewAuthor, NewBook, NewPublisher, Publisher};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const PUBLISHER_COLUMNS: &str = "publishers.id, publishers.name, publishers.description, publishers.logo";
const AUTHOR_COLUMNS: &str = "authors.id, authors.name, authors.biography, authors.photo";
const BOOK_COLUMNS: &str = "books.id, books.publisher_id, books.title, books.publication_date, \
    books.stock, books.isbn, books.summary, books.cover_image";

/// SQLite-backed catalog. Each operation opens its own connection, so the
/// store holds no connection state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        db::init_db(&path)?;
        log::info!("catalog database ready at {}", path.display());
        Ok(Self { path })
    }

    fn connect(&self) -> Result<Connection> {
        db::connect(&self.path)
    }
}

fn publisher_from_row(row: &Row) -> rusqlite::Result<Publisher> {
    Ok(Publisher {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        logo: row.get(3)?,
    })
}

fn author_from_row(row: &Row) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        biography: row.get(2)?,
        photo: row.get(3)?,
    })
}

fn book_from_row(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        publisher_id: row.get(1)?,
        title: row.get(2)?,
        publication_date: row.get(3)?,
        stock: row.get(4)?,
        isbn: row.get(5)?,
        summary: row.get(6)?,
        cover_image: row.get(7)?,
    })
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

fn exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE id = ?1", table),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl CatalogStore for SqliteStore {
    fn publishers(&self) -> Result<Vec<Publisher>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM publishers ORDER BY publishers.name, publishers.id",
            PUBLISHER_COLUMNS
        ))?;
        let rows = stmt.query_map([], publisher_from_row)?;
        collect(rows)
    }

    fn publisher(&self, id: i64) -> Result<Option<Publisher>> {
        let conn = self.connect()?;
        let publisher = conn
            .query_row(
                &format!("SELECT {} FROM publishers WHERE publishers.id = ?1", PUBLISHER_COLUMNS),
                params![id],
                publisher_from_row,
            )
            .optional()?;
        Ok(publisher)
    }

    fn authors(&self) -> Result<Vec<Author>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM authors ORDER BY authors.name, authors.id",
            AUTHOR_COLUMNS
        ))?;
        let rows = stmt.query_map([], author_from_row)?;
        collect(rows)
    }

    fn author(&self, id: i64) -> Result<Option<Author>> {
        let conn = self.connect()?;
        let author = conn
            .query_row(
                &format!("SELECT {} FROM authors WHERE authors.id = ?1", AUTHOR_COLUMNS),
                params![id],
                author_from_row,
            )
            .optional()?;
        Ok(author)
    }

    fn authors_of(&self, book_id: i64) -> Result<Vec<Author>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book_authors \
             JOIN authors ON authors.id = book_authors.author_id \
             WHERE book_authors.book_id = ?1 \
             ORDER BY authors.name, authors.id",
            AUTHOR_COLUMNS
        ))?;
        let rows = stmt.query_map(params![book_id], author_from_row)?;
        collect(rows)
    }

    fn books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let conn = self.connect()?;
        let (predicate, values) = filter.where_clause();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM books WHERE {} ORDER BY books.title, books.id",
            BOOK_COLUMNS, predicate
        ))?;
        let rows = stmt.query_map(params_from_iter(values), book_from_row)?;
        collect(rows)
    }

    fn book(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.connect()?;
        let book = conn
            .query_row(
                &format!("SELECT {} FROM books WHERE books.id = ?1", BOOK_COLUMNS),
                params![id],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }

    fn latest_book(&self, publisher_id: i64) -> Result<Option<Book>> {
        let conn = self.connect()?;
        let book = conn
            .query_row(
                &format!(
                    "SELECT {} FROM books WHERE books.publisher_id = ?1 \
                     ORDER BY books.publication_date DESC, books.id DESC LIMIT 1",
                    BOOK_COLUMNS
                ),
                params![publisher_id],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }

    fn books_by_author(&self, author_id: i64) -> Result<Vec<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book_authors \
             JOIN books ON books.id = book_authors.book_id \
             WHERE book_authors.author_id = ?1 \
             ORDER BY books.title, books.id",
            BOOK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![author_id], book_from_row)?;
        collect(rows)
    }

    fn add_publisher(&self, publisher: NewPublisher) -> Result<Publisher> {
        publisher.check().map_err(CatalogError::Invalid)?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO publishers (name, description, logo) VALUES (?1, ?2, ?3)",
            params![publisher.name, publisher.description, publisher.logo],
        )?;
        let id = conn.last_insert_rowid();
        log::info!("added publisher {}: {}", id, publisher.name);
        Ok(Publisher {
            id,
            name: publisher.name,
            description: publisher.description,
            logo: publisher.logo,
        })
    }

    fn add_author(&self, author: NewAuthor) -> Result<Author> {
        author.check().map_err(CatalogError::Invalid)?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO authors (name, biography, photo) VALUES (?1, ?2, ?3)",
            params![author.name, author.biography, author.photo],
        )?;
        let id = conn.last_insert_rowid();
        log::info!("added author {}: {}", id, author.name);
        Ok(Author {
            id,
            name: author.name,
            biography: author.biography,
            photo: author.photo,
        })
    }

    fn add_book(&self, book: NewBook) -> Result<Book> {
        book.check().map_err(CatalogError::Invalid)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        if !exists(&tx, "publishers", book.publisher_id)? {
            return Err(CatalogError::Invalid(format!(
                "publisher {} does not exist",
                book.publisher_id
            )));
        }
        tx.execute(
            "INSERT INTO books (publisher_id, title, publication_date, stock, isbn, summary, cover_image) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                book.publisher_id,
                book.title,
                book.publication_date,
                book.stock,
                book.isbn,
                book.summary,
                book.cover_image
            ],
        )?;
        let id = tx.last_insert_rowid();
        for author_id in &book.author_ids {
            if !exists(&tx, "authors", *author_id)? {
                return Err(CatalogError::Invalid(format!(
                    "author {} does not exist",
                    author_id
                )));
            }
            tx.execute(
                "INSERT OR IGNORE INTO book_authors (book_id, author_id) VALUES (?1, ?2)",
                params![id, author_id],
            )?;
        }
        tx.commit()?;

        log::info!("added book {}: {}", id, book.title);
        Ok(Book {
            id,
            publisher_id: book.publisher_id,
            title: book.title,
            publication_date: book.publication_date,
            stock: book.stock,
            isbn: book.isbn,
            summary: book.summary,
            cover_image: book.cover_image,
        })
    }

    fn link_author(&self, book_id: i64, author_id: i64) -> Result<()> {
        let conn = self.connect()?;
        if !exists(&conn, "books", book_id)? {
            return Err(CatalogError::Invalid(format!("book {} does not exist", book_id)));
        }
        if !exists(&conn, "authors", author_id)? {
            return Err(CatalogError::Invalid(format!(
                "author {} does not exist",
                author_id
            )));
        }
        conn.execute(
            "INSERT OR IGNORE INTO book_authors (book_id, author_id) VALUES (?1, ?2)",
            params![book_id, author_id],
        )?;
        Ok(())
    }

    fn delete_publisher(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM publishers WHERE id = ?1", params![id])?;
        if removed > 0 {
            log::info!("deleted publisher {} and its books", id);
        }
        Ok(removed > 0)
    }

    fn delete_author(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM authors WHERE id = ?1", params![id])?;
        if removed > 0 {
            log::info!("deleted author {}", id);
        }
        Ok(removed > 0)
    }
}
