//! Page handlers. Each one reads from a [`CatalogStore`] and returns the
//! context for one template; nothing here knows about HTTP.

use crate::error::{CatalogError, Result};
use crate::filter::BookFilter;
use crate::forms::{NewsletterForm, NewsletterParams, SearchForm, SearchParams, Subscription};
use crate::models::{Author, Book, Publisher};
use crate::store::CatalogStore;
use serde::Serialize;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const BOOK_LIST_TEMPLATE: &str = "books.html";
pub const BOOK_DETAIL_TEMPLATE: &str = "book.html";
pub const PUBLISHER_LIST_TEMPLATE: &str = "publishers.html";
pub const PUBLISHER_DETAIL_TEMPLATE: &str = "publisher.html";
pub const AUTHOR_LIST_TEMPLATE: &str = "authors.html";
pub const AUTHOR_DETAIL_TEMPLATE: &str = "author.html";
pub const NEWSLETTER_TEMPLATE: &str = "newsletter.html";

#[derive(Debug, Serialize)]
pub struct PublisherHighlight {
    pub publisher: Publisher,
    pub latest_book: Option<Book>,
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub publishers: Vec<PublisherHighlight>,
}

#[derive(Debug, Serialize)]
pub struct BookListPage {
    pub books: Vec<Book>,
    pub form: SearchForm,
    pub publishers: Vec<Publisher>,
}

#[derive(Debug, Serialize)]
pub struct BookDetailPage {
    pub book: Book,
    pub publisher: Publisher,
    pub authors: Vec<Author>,
}

#[derive(Debug, Serialize)]
pub struct PublisherListPage {
    pub publishers: Vec<Publisher>,
}

#[derive(Debug, Serialize)]
pub struct PublisherDetailPage {
    pub publisher: Publisher,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct AuthorListPage {
    pub authors: Vec<Author>,
}

#[derive(Debug, Serialize)]
pub struct AuthorDetailPage {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct NewsletterPage {
    pub form: NewsletterForm,
    pub subscription: Option<Subscription>,
}

/// Front page: every publisher with its most recently published book.
pub fn index(store: &dyn CatalogStore) -> Result<IndexPage> {
    let mut publishers = Vec::new();
    for publisher in store.publishers()? {
        let latest_book = store.latest_book(publisher.id)?;
        publishers.push(PublisherHighlight {
            publisher,
            latest_book,
        });
    }
    Ok(IndexPage { publishers })
}

/// Book listing with search. An invalid form runs no filter: the page shows
/// the whole catalog alongside the field errors.
pub fn book_list(store: &dyn CatalogStore, params: SearchParams) -> Result<BookListPage> {
    let publishers = store.publishers()?;
    let (form, filter) = SearchForm::bind(params, &publishers);
    let books = match filter {
        Some(filter) => store.books(&filter)?,
        None => {
            log::info!("rejected book search: {:?}", form.errors.keys().collect::<Vec<_>>());
            store.books(&BookFilter::all())?
        }
    };
    Ok(BookListPage {
        books,
        form,
        publishers,
    })
}

pub fn book_detail(store: &dyn CatalogStore, book_id: i64) -> Result<BookDetailPage> {
    let book = store
        .book(book_id)?
        .ok_or_else(|| CatalogError::not_found("book", book_id))?;
    let publisher = store
        .publisher(book.publisher_id)?
        .ok_or_else(|| CatalogError::not_found("publisher", book.publisher_id))?;
    let authors = store.authors_of(book.id)?;
    Ok(BookDetailPage {
        book,
        publisher,
        authors,
    })
}

pub fn publisher_list(store: &dyn CatalogStore) -> Result<PublisherListPage> {
    Ok(PublisherListPage {
        publishers: store.publishers()?,
    })
}

pub fn publisher_detail(store: &dyn CatalogStore, publisher_id: i64) -> Result<PublisherDetailPage> {
    let publisher = store
        .publisher(publisher_id)?
        .ok_or_else(|| CatalogError::not_found("publisher", publisher_id))?;
    let books = store.books(&BookFilter::all().publisher(publisher.id))?;
    Ok(PublisherDetailPage { publisher, books })
}

pub fn author_list(store: &dyn CatalogStore) -> Result<AuthorListPage> {
    Ok(AuthorListPage {
        authors: store.authors()?,
    })
}

pub fn author_detail(store: &dyn CatalogStore, author_id: i64) -> Result<AuthorDetailPage> {
    let author = store
        .author(author_id)?
        .ok_or_else(|| CatalogError::not_found("author", author_id))?;
    let books = store.books_by_author(author.id)?;
    Ok(AuthorDetailPage { author, books })
}

pub fn newsletter_form() -> NewsletterPage {
    NewsletterPage {
        form: NewsletterForm::unbound(),
        subscription: None,
    }
}

/// Validates a subscription. Accepted values are acknowledged and then
/// dropped; there is no subscriber list to store them in.
pub fn newsletter_subscribe(params: NewsletterParams) -> NewsletterPage {
    let (form, subscription) = NewsletterForm::bind(params);
    if let Some(subscription) = &subscription {
        log::info!(
            "newsletter subscription accepted domain={} news={}",
            email_domain(&subscription.email),
            subscription.subscribe_to_news
        );
    }
    NewsletterPage { form, subscription }
}

/// The part of an address that is safe to log.
fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, domain)| domain).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAuthor, NewBook, NewPublisher};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two publishers, one without books; three books by one author.
    fn catalog() -> MemoryStore {
        let store = MemoryStore::new();
        let planeta = store.add_publisher(NewPublisher::named("Planeta")).unwrap();
        store.add_publisher(NewPublisher::named("Anagrama")).unwrap();
        let ana = store.add_author(NewAuthor::named("Ana")).unwrap();
        for (title, stock, published) in [
            ("Zorro", 0, date(2001, 1, 1)),
            ("Ala", 5, date(2015, 6, 1)),
            ("Azul", 10, date(2009, 2, 2)),
        ] {
            store
                .add_book(NewBook::new(title, planeta.id, vec![ana.id], published).with_stock(stock))
                .unwrap();
        }
        store
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    fn query(search: &str, publisher: &str, min_stock: &str) -> SearchParams {
        SearchParams {
            search: Some(search.to_string()),
            publisher: Some(publisher.to_string()),
            min_stock: Some(min_stock.to_string()),
        }
    }

    #[test]
    fn index_pairs_publishers_with_latest_book() {
        let page = index(&catalog()).unwrap();
        let summary: Vec<(&str, Option<&str>)> = page
            .publishers
            .iter()
            .map(|h| {
                (
                    h.publisher.name.as_str(),
                    h.latest_book.as_ref().map(|b| b.title.as_str()),
                )
            })
            .collect();
        assert_eq!(summary, vec![("Anagrama", None), ("Planeta", Some("Ala"))]);
    }

    #[test]
    fn book_list_filters_by_min_stock() {
        let page = book_list(&catalog(), query("", "", "5")).unwrap();
        assert!(page.form.is_valid());
        assert_eq!(titles(&page.books), vec!["Ala", "Azul"]);
    }

    #[test]
    fn book_list_without_query_lists_everything() {
        let page = book_list(&catalog(), SearchParams::default()).unwrap();
        assert_eq!(titles(&page.books), vec!["Ala", "Azul", "Zorro"]);
        assert_eq!(page.publishers.len(), 2);
    }

    #[test]
    fn invalid_search_does_not_filter() {
        let page = book_list(&catalog(), query("<zorro>", "", "5")).unwrap();
        assert_eq!(page.form.errors["search"].code, "invalid_chars");
        assert_eq!(titles(&page.books), vec!["Ala", "Azul", "Zorro"]);
    }

    #[test]
    fn book_detail_resolves_publisher_and_authors() {
        let store = catalog();
        let page = book_detail(&store, 2).unwrap();
        assert_eq!(page.book.title, "Ala");
        assert_eq!(page.publisher.name, "Planeta");
        assert_eq!(page.authors.len(), 1);
    }

    #[test]
    fn missing_entities_are_not_found() {
        let store = catalog();
        assert!(book_detail(&store, 404).unwrap_err().is_not_found());
        assert!(publisher_detail(&store, 404).unwrap_err().is_not_found());
        assert!(author_detail(&store, 404).unwrap_err().is_not_found());
    }

    #[test]
    fn publisher_detail_lists_books_by_title() {
        let store = catalog();
        let page = publisher_detail(&store, 1).unwrap();
        assert_eq!(titles(&page.books), vec!["Ala", "Azul", "Zorro"]);
        let empty = publisher_detail(&store, 2).unwrap();
        assert!(empty.books.is_empty());
    }

    #[test]
    fn author_pages() {
        let store = catalog();
        assert_eq!(author_list(&store).unwrap().authors.len(), 1);
        let page = author_detail(&store, 1).unwrap();
        assert_eq!(titles(&page.books), vec!["Ala", "Azul", "Zorro"]);
    }

    #[test]
    fn publisher_list_is_ordered_by_name() {
        let names: Vec<String> = publisher_list(&catalog())
            .unwrap()
            .publishers
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Anagrama", "Planeta"]);
    }

    #[test]
    fn only_the_email_domain_is_logged() {
        assert_eq!(email_domain("ana@libreria.es"), "libreria.es");
        assert_eq!(email_domain("\"a@b\"@correo.es"), "correo.es");
        assert_eq!(email_domain("sin-arroba"), "");
    }

    #[test]
    fn newsletter_round() {
        assert!(newsletter_form().subscription.is_none());

        let accepted = newsletter_subscribe(NewsletterParams {
            email: Some("ana@libreria.es".to_string()),
            name: Some("Ana".to_string()),
            subscribe_to_news: None,
        });
        assert!(accepted.form.errors.is_empty());
        assert_eq!(accepted.subscription.map(|s| s.name), Some("Ana".to_string()));

        let rejected = newsletter_subscribe(NewsletterParams {
            email: Some("ana@libreria.es".to_string()),
            name: Some("Ana 2".to_string()),
            subscribe_to_news: None,
        });
        assert!(rejected.subscription.is_none());
        assert_eq!(rejected.form.errors["name"].code, "invalid_name");
    }
}
