//! Form binding: raw request parameters in, cleaned values or per-field
//! errors out. The bound state is serializable so templates can re-render
//! the submitted values next to their errors.

use crate::filter::BookFilter;
use crate::models::Publisher;
use crate::validation::{self, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub code: &'static str,
    pub message: String,
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Field name → failure. Ordered so rendering is stable.
pub type FieldErrors = BTreeMap<&'static str, FieldError>;

/// Query parameters of the book list page. All optional.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SearchParams {
    pub search: Option<String>,
    pub publisher: Option<String>,
    pub min_stock: Option<String>,
}

impl SearchParams {
    /// Collects decoded query pairs. A repeated key keeps its last value and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "search" => params.search = Some(value),
                "publisher" => params.publisher = Some(value),
                "min_stock" => params.min_stock = Some(value),
                _ => {}
            }
        }
        params
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchForm {
    pub values: SearchParams,
    pub errors: FieldErrors,
}

impl SearchForm {
    /// Cleans every field, collecting all failures rather than stopping at
    /// the first. `choices` are the selectable publishers.
    pub fn bind(values: SearchParams, choices: &[Publisher]) -> (Self, Option<BookFilter>) {
        let mut errors = FieldErrors::new();
        let mut filter = BookFilter::all();

        match validation::clean_search(values.search.as_deref().unwrap_or("")) {
            Ok(search) => filter.search = search,
            Err(err) => {
                errors.insert("search", err.into());
            }
        }
        match validation::clean_publisher(values.publisher.as_deref().unwrap_or(""), choices) {
            Ok(publisher_id) => filter.publisher_id = publisher_id,
            Err(err) => {
                errors.insert("publisher", err.into());
            }
        }
        match validation::clean_min_stock(values.min_stock.as_deref().unwrap_or("")) {
            Ok(min_stock) => filter.min_stock = min_stock,
            Err(err) => {
                errors.insert("min_stock", err.into());
            }
        }

        let filter = errors.is_empty().then_some(filter);
        (SearchForm { values, errors }, filter)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Body of the newsletter subscription POST.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NewsletterParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub subscribe_to_news: Option<String>,
}

impl NewsletterParams {
    /// Same rules as [`SearchParams::from_pairs`].
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "email" => params.email = Some(value),
                "name" => params.name = Some(value),
                "subscribe_to_news" => params.subscribe_to_news = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// A subscription that passed validation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Subscription {
    pub email: String,
    pub name: String,
    pub subscribe_to_news: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsletterForm {
    pub values: NewsletterParams,
    pub errors: FieldErrors,
}

impl NewsletterForm {
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn bind(values: NewsletterParams) -> (Self, Option<Subscription>) {
        let mut errors = FieldErrors::new();

        let email = match validation::clean_email(values.email.as_deref().unwrap_or("")) {
            Ok(email) => Some(email),
            Err(err) => {
                errors.insert("email", err.into());
                None
            }
        };
        let name = match validation::clean_name(values.name.as_deref().unwrap_or("")) {
            Ok(name) => Some(name),
            Err(err) => {
                errors.insert("name", err.into());
                None
            }
        };
        let subscribe_to_news = validation::clean_checkbox(values.subscribe_to_news.as_deref());

        let subscription = match (email, name) {
            (Some(email), Some(name)) => Some(Subscription {
                email,
                name,
                subscribe_to_news,
            }),
            _ => None,
        };
        (NewsletterForm { values, errors }, subscription)
    }
}
