//! HTML rendering.
//!
//! Templates live as stand-alone files under `src/templates/` and are
//! compiled into the binary here, so a deployed server needs nothing on
//! disk. They are minijinja templates; names ending in `.html` get HTML
//! auto-escaping, which is what keeps catalog text from turning into markup.
//!
//! Partials start with an underscore and are only ever `include`d.

use crate::error::Result;
use minijinja::Environment;
use serde::Serialize;

pub const NOT_FOUND_TEMPLATE: &str = "404.html";

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("_book_row.html", include_str!("templates/_book_row.html")),
    ("_errors.html", include_str!("templates/_errors.html")),
    ("index.html", include_str!("templates/index.html")),
    ("books.html", include_str!("templates/books.html")),
    ("book.html", include_str!("templates/book.html")),
    ("publishers.html", include_str!("templates/publishers.html")),
    ("publisher.html", include_str!("templates/publisher.html")),
    ("authors.html", include_str!("templates/authors.html")),
    ("author.html", include_str!("templates/author.html")),
    ("newsletter.html", include_str!("templates/newsletter.html")),
    (NOT_FOUND_TEMPLATE, include_str!("templates/404.html")),
];

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Loads every template. A syntax error in any of them fails here, at
    /// startup, rather than on the first request that needs it.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, template: &str, context: S) -> Result<String> {
        let template = self.env.get_template(template)?;
        Ok(template.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{NewsletterParams, SearchParams};
    use crate::models::{NewAuthor, NewBook, NewPublisher};
    use crate::pages;
    use crate::store::{CatalogStore, MemoryStore};
    use chrono::NaiveDate;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let publisher = store
            .add_publisher(NewPublisher::named("Planeta & Cía"))
            .unwrap();
        let author = store.add_author(NewAuthor::named("Ana")).unwrap();
        store
            .add_book(
                NewBook::new(
                    "<Ala>",
                    publisher.id,
                    vec![author.id],
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                )
                .with_stock(3),
            )
            .unwrap();
        store
    }

    #[test]
    fn every_page_renders() {
        let renderer = Renderer::new().unwrap();
        let store = store();
        renderer
            .render(pages::INDEX_TEMPLATE, pages::index(&store).unwrap())
            .unwrap();
        renderer
            .render(
                pages::BOOK_LIST_TEMPLATE,
                pages::book_list(&store, SearchParams::default()).unwrap(),
            )
            .unwrap();
        renderer
            .render(pages::BOOK_DETAIL_TEMPLATE, pages::book_detail(&store, 1).unwrap())
            .unwrap();
        renderer
            .render(pages::PUBLISHER_LIST_TEMPLATE, pages::publisher_list(&store).unwrap())
            .unwrap();
        renderer
            .render(
                pages::PUBLISHER_DETAIL_TEMPLATE,
                pages::publisher_detail(&store, 1).unwrap(),
            )
            .unwrap();
        renderer
            .render(pages::AUTHOR_LIST_TEMPLATE, pages::author_list(&store).unwrap())
            .unwrap();
        renderer
            .render(pages::AUTHOR_DETAIL_TEMPLATE, pages::author_detail(&store, 1).unwrap())
            .unwrap();
        renderer
            .render(pages::NEWSLETTER_TEMPLATE, pages::newsletter_form())
            .unwrap();
    }

    #[test]
    fn catalog_text_is_escaped() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render(pages::BOOK_DETAIL_TEMPLATE, pages::book_detail(&store(), 1).unwrap())
            .unwrap();
        assert!(html.contains("&lt;Ala&gt;"));
        assert!(html.contains("Planeta &amp; Cía"));
        assert!(!html.contains("<Ala>"));
    }

    #[test]
    fn form_errors_render_with_their_code() {
        let renderer = Renderer::new().unwrap();
        let params = SearchParams {
            search: Some("a;b".to_string()),
            ..SearchParams::default()
        };
        let html = renderer
            .render(pages::BOOK_LIST_TEMPLATE, pages::book_list(&store(), params).unwrap())
            .unwrap();
        assert!(html.contains(r#"data-code="invalid_chars""#));
        assert!(html.contains(r#"value="a;b""#));
    }

    #[test]
    fn newsletter_confirmation_renders() {
        let renderer = Renderer::new().unwrap();
        let page = pages::newsletter_subscribe(NewsletterParams {
            email: Some("ana@libreria.es".to_string()),
            name: Some("Ana".to_string()),
            subscribe_to_news: Some("on".to_string()),
        });
        let html = renderer.render(pages::NEWSLETTER_TEMPLATE, page).unwrap();
        assert!(html.contains("Gracias, Ana"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let renderer = Renderer::new().unwrap();
        assert!(renderer.render("missing.html", ()).is_err());
    }
}
