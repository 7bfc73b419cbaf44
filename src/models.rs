use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>, // image path relative to the media root
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub biography: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub publisher_id: i64,
    pub title: String,
    pub publication_date: NaiveDate,
    pub stock: u32,
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
}

/// Field limits enforced when entities are written.
pub const PUBLISHER_NAME_MAX: usize = 100;
pub const AUTHOR_NAME_MAX: usize = 50;
pub const BOOK_TITLE_MAX: usize = 100;
pub const ISBN_MAX: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct NewPublisher {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
    pub name: String,
    pub biography: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub publisher_id: i64,
    pub author_ids: Vec<i64>,
    pub title: String,
    pub publication_date: NaiveDate,
    pub stock: u32,
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
}

impl NewPublisher {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        check_text("publisher name", &self.name, PUBLISHER_NAME_MAX)
    }
}

impl NewAuthor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        check_text("author name", &self.name, AUTHOR_NAME_MAX)
    }
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        publisher_id: i64,
        author_ids: Vec<i64>,
        publication_date: NaiveDate,
    ) -> Self {
        Self {
            publisher_id,
            author_ids,
            title: title.into(),
            publication_date,
            stock: 0,
            isbn: None,
            summary: None,
            cover_image: None,
        }
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Shape checks that do not need the store. Publisher and author
    /// existence is verified by the store on insert.
    pub(crate) fn check(&self) -> Result<(), String> {
        check_text("book title", &self.title, BOOK_TITLE_MAX)?;
        if let Some(isbn) = &self.isbn {
            if isbn.chars().count() > ISBN_MAX {
                return Err(format!("isbn is longer than {} characters", ISBN_MAX));
            }
        }
        if self.author_ids.is_empty() {
            return Err("a book needs at least one author".to_string());
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    if value.chars().count() > max {
        return Err(format!("{} is longer than {} characters", field, max));
    }
    Ok(())
}
