//! Maintenance commands that sit beside the server: sample data and a smoke
//! check against a running instance.

use crate::error::{CatalogError, Result};
use crate::filter::BookFilter;
use crate::models::{NewAuthor, NewBook, NewPublisher};
use crate::store::CatalogStore;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use std::fmt;
use std::time::Duration;

const SAMPLE_PUBLISHER: &str = "Editorial Prueba";
const SAMPLE_AUTHOR: &str = "Autor Prueba";
const SAMPLE_BOOK: &str = "Libro de Prueba";

const CHECK_TIMEOUT_SECS: u64 = 5;
const CHECK_PATHS: [&str; 4] = ["/", "/books/", "/books/1/", "/authors/1/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub publisher_id: i64,
    pub author_id: i64,
    pub book_id: i64,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created/ensured sample data:")?;
        writeln!(f, "Publisher id: {}", self.publisher_id)?;
        writeln!(f, "Author id: {}", self.author_id)?;
        write!(f, "Book id: {}", self.book_id)
    }
}

/// Ensures the sample publisher, author and book exist and are linked.
/// Safe to run repeatedly.
pub fn seed(store: &dyn CatalogStore) -> Result<SeedReport> {
    let publisher = match store
        .publishers()?
        .into_iter()
        .find(|p| p.name == SAMPLE_PUBLISHER)
    {
        Some(existing) => existing,
        None => store.add_publisher(NewPublisher {
            name: SAMPLE_PUBLISHER.to_string(),
            description: Some("Editorial para pruebas".to_string()),
            logo: None,
        })?,
    };

    let author = match store.authors()?.into_iter().find(|a| a.name == SAMPLE_AUTHOR) {
        Some(existing) => existing,
        None => store.add_author(NewAuthor {
            name: SAMPLE_AUTHOR.to_string(),
            biography: Some("Biografía de prueba".to_string()),
            photo: None,
        })?,
    };

    let book = match store
        .books(&BookFilter::all().search(SAMPLE_BOOK))?
        .into_iter()
        .find(|b| b.title == SAMPLE_BOOK)
    {
        Some(existing) => existing,
        None => {
            let published = NaiveDate::from_ymd_opt(2020, 1, 1)
                .ok_or_else(|| CatalogError::Invalid("sample publication date".to_string()))?;
            store.add_book(
                NewBook::new(SAMPLE_BOOK, publisher.id, vec![author.id], published).with_stock(5),
            )?
        }
    };
    store.link_author(book.id, author.id)?;

    Ok(SeedReport {
        publisher_id: publisher.id,
        author_id: author.id,
        book_id: book.id,
    })
}

#[derive(Debug, Clone)]
pub struct UrlCheck {
    pub url: String,
    pub outcome: std::result::Result<u16, String>,
}

impl fmt::Display for UrlCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(status) => write!(f, "{} -> {}", self.url, status),
            Err(reason) => write!(f, "{} -> ERROR: {}", self.url, reason),
        }
    }
}

/// Requests the core pages of a running server. A failing URL is reported,
/// not raised; only a client that cannot be built is an error.
pub fn check_urls(base_url: &str) -> Result<Vec<UrlCheck>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(CHECK_TIMEOUT_SECS))
        .build()?;
    let base = base_url.trim_end_matches('/');

    let mut checks = Vec::new();
    for path in CHECK_PATHS {
        let url = format!("{}{}", base, path);
        let outcome = client
            .get(&url)
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|err| err.to_string());
        if let Err(reason) = &outcome {
            log::warn!("check failed for {}: {}", url, reason);
        }
        checks.push(UrlCheck { url, outcome });
    }
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn seed_is_idempotent() {
        let store = MemoryStore::new();
        let first = seed(&store).unwrap();
        let second = seed(&store).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.publishers().unwrap().len(), 1);
        assert_eq!(store.authors().unwrap().len(), 1);

        let book = store.book(first.book_id).unwrap().unwrap();
        assert_eq!(book.stock, 5);
        assert_eq!(store.authors_of(book.id).unwrap().len(), 1);
    }

    #[test]
    fn seed_report_lists_ids() {
        let report = SeedReport {
            publisher_id: 1,
            author_id: 2,
            book_id: 3,
        };
        assert_eq!(
            report.to_string(),
            "Created/ensured sample data:\nPublisher id: 1\nAuthor id: 2\nBook id: 3"
        );
    }

    #[test]
    fn unreachable_server_is_reported_per_url() {
        let checks = check_urls("http://127.0.0.1:1/").unwrap();
        assert_eq!(checks.len(), CHECK_PATHS.len());
        assert_eq!(checks[0].url, "http://127.0.0.1:1/");
        assert!(checks.iter().all(|c| c.outcome.is_err()));
        assert!(checks[1].to_string().starts_with("http://127.0.0.1:1/books/ -> ERROR: "));
    }
}
