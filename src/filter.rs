//! Book search and filter criteria.
//!
//! A [`BookFilter`] is the cleaned output of the book search form. It can be
//! evaluated in memory ([`BookFilter::apply`]) or rendered as a parameterized
//! SQL predicate ([`BookFilter::where_clause`]); both give the same answer.

use crate::models::Book;
use rusqlite::types::Value;
use std::cmp::Ordering;

/// Name of the SQL scalar function the SQLite store registers for
/// Unicode-aware lowercasing.
pub const LOWER_FN: &str = "unicode_lower";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub publisher_id: Option<i64>,
    pub min_stock: Option<i64>,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn publisher(mut self, publisher_id: i64) -> Self {
        self.publisher_id = Some(publisher_id);
        self
    }

    pub fn min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = Some(min_stock);
        self
    }

    /// Search needle, lowercased. Empty text counts as no search.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.needle().is_none() && self.publisher_id.is_none() && self.min_stock.is_none()
    }

    pub fn matches(&self, book: &Book) -> bool {
        if let Some(needle) = self.needle() {
            let in_title = book.title.to_lowercase().contains(&needle);
            let in_isbn = book
                .isbn
                .as_deref()
                .map(|isbn| isbn.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_isbn {
                return false;
            }
        }
        if let Some(publisher_id) = self.publisher_id {
            if book.publisher_id != publisher_id {
                return false;
            }
        }
        if let Some(min_stock) = self.min_stock {
            if i64::from(book.stock) < min_stock {
                return false;
            }
        }
        true
    }

    /// Filters `books` and returns the survivors in catalog order.
    pub fn apply<I>(&self, books: I) -> Vec<Book>
    where
        I: IntoIterator<Item = Book>,
    {
        let mut selected: Vec<Book> = books.into_iter().filter(|book| self.matches(book)).collect();
        selected.sort_by(title_order);
        selected
    }

    /// SQL predicate over the `books` table plus its positional parameters.
    /// Returns `"1"` with no parameters when nothing is filtered.
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = vec![];
        let mut params: Vec<Value> = vec![];

        if let Some(needle) = self.needle() {
            params.push(Value::Text(needle));
            let index = params.len();
            clauses.push(format!(
                "(instr({lower}(books.title), ?{index}) > 0 \
                 OR instr({lower}(books.isbn), ?{index}) > 0)",
                lower = LOWER_FN,
                index = index
            ));
        }
        if let Some(publisher_id) = self.publisher_id {
            params.push(Value::Integer(publisher_id));
            clauses.push(format!("books.publisher_id = ?{}", params.len()));
        }
        if let Some(min_stock) = self.min_stock {
            params.push(Value::Integer(min_stock));
            clauses.push(format!("books.stock >= ?{}", params.len()));
        }

        if clauses.is_empty() {
            ("1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

/// Catalog order: title ascending, then id so equal titles stay stable.
pub fn title_order(a: &Book, b: &Book) -> Ordering {
    a.title.cmp(&b.title).then(a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn book(id: i64, title: &str, stock: u32, publisher_id: i64, isbn: Option<&str>) -> Book {
        Book {
            id,
            publisher_id,
            title: title.to_string(),
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            stock,
            isbn: isbn.map(str::to_string),
            summary: None,
            cover_image: None,
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book(1, "Zorro", 0, 1, Some("978-0-06-077900-9")),
            book(2, "Ala", 5, 1, None),
            book(3, "Azul", 10, 2, Some("84-376-0494-X")),
        ]
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn no_filter_orders_by_title() {
        let result = BookFilter::all().apply(shelf());
        assert_eq!(titles(&result), vec!["Ala", "Azul", "Zorro"]);
    }

    #[test]
    fn min_stock_keeps_title_order() {
        let result = BookFilter::all().min_stock(5).apply(shelf());
        assert_eq!(titles(&result), vec!["Ala", "Azul"]);
    }

    #[test]
    fn min_stock_zero_is_a_filter_that_keeps_everything() {
        let filter = BookFilter::all().min_stock(0);
        assert!(!filter.is_empty());
        assert_eq!(filter.apply(shelf()).len(), 3);
    }

    #[test]
    fn min_stock_matches_exactly_the_stocked_subset() {
        for m in [0, 1, 5, 6, 10, 11] {
            let result = BookFilter::all().min_stock(m).apply(shelf());
            let mut expected: Vec<Book> = shelf()
                .into_iter()
                .filter(|b| i64::from(b.stock) >= m)
                .collect();
            expected.sort_by(title_order);
            assert_eq!(result, expected, "min_stock {}", m);
        }
    }

    #[test]
    fn min_stock_beyond_any_stock_matches_nothing() {
        let filter = BookFilter::all().min_stock(5_000_000_000);
        assert!(filter.apply(shelf()).is_empty());
        assert!(!filter.matches(&book(9, "Lleno", u32::MAX, 1, None)));
    }

    #[test]
    fn search_is_case_insensitive_on_title() {
        let result = BookFilter::all().search("ZUL").apply(shelf());
        assert_eq!(titles(&result), vec!["Azul"]);
    }

    #[test]
    fn search_matches_isbn() {
        let result = BookFilter::all().search("0494-x").apply(shelf());
        assert_eq!(titles(&result), vec!["Azul"]);
    }

    #[test]
    fn search_handles_accented_titles() {
        let books = vec![book(1, "Él y Ella", 1, 1, None)];
        let result = BookFilter::all().search("él").apply(books);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_search_is_no_filter() {
        let filter = BookFilter::all().search("");
        assert!(filter.is_empty());
        assert_eq!(filter.apply(shelf()), BookFilter::all().apply(shelf()));
    }

    #[test]
    fn filters_combine_with_and() {
        let filter = BookFilter::all().search("a").publisher(1).min_stock(1);
        assert_eq!(titles(&filter.apply(shelf())), vec!["Ala"]);
    }

    #[test]
    fn where_clause_without_filters() {
        let (sql, params) = BookFilter::all().where_clause();
        assert_eq!(sql, "1");
        assert!(params.is_empty());
    }

    #[test]
    fn where_clause_numbers_parameters_in_order() {
        let (sql, params) = BookFilter::all()
            .search("Ala")
            .publisher(7)
            .min_stock(0)
            .where_clause();
        assert!(sql.contains("instr(unicode_lower(books.title), ?1) > 0"));
        assert!(sql.contains("books.publisher_id = ?2"));
        assert!(sql.contains("books.stock >= ?3"));
        assert_eq!(
            params,
            vec![
                Value::Text("ala".to_string()),
                Value::Integer(7),
                Value::Integer(0)
            ]
        );
    }
}
