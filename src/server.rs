//! HTTP surface: the routing table, request extraction and response mapping.

use crate::error::{CatalogError, Result};
use crate::forms::{NewsletterParams, SearchParams};
use crate::pages;
use crate::render::{Renderer, NOT_FOUND_TEMPLATE};
use crate::store::CatalogStore;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn CatalogStore>,
    renderer: Arc<Renderer>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>) -> Result<Self> {
        Ok(Self {
            store,
            renderer: Arc::new(Renderer::new()?),
        })
    }

    /// Runs a blocking store read on the blocking pool.
    async fn read<T, F>(&self, read: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CatalogStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || read(store.as_ref()))
            .await
            .map_err(|err| CatalogError::Task(err.to_string()))?
    }

    /// Renders `template` with the page context, mapping failures to a 404
    /// page or a bare 500.
    fn respond<C: Serialize>(&self, template: &str, page: Result<C>) -> Response {
        let rendered = page.and_then(|context| self.renderer.render(template, context));
        match rendered {
            Ok(body) => Html(body).into_response(),
            Err(err) => self.failure(err),
        }
    }

    fn failure(&self, err: CatalogError) -> Response {
        if err.is_not_found() {
            log::info!("not found: {}", err);
            return self.not_found(&err.to_string());
        }
        log::error!("request failed: {}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }

    fn not_found(&self, message: &str) -> Response {
        #[derive(Serialize)]
        struct NotFoundPage<'a> {
            message: &'a str,
        }

        match self.renderer.render(NOT_FOUND_TEMPLATE, NotFoundPage { message }) {
            Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
            Err(err) => {
                log::error!("failed to render not-found page: {}", err);
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
        }
    }
}

/// Path ids follow integer path converters: anything that is not an integer
/// simply matches no record.
fn parse_id(entity: &'static str, raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| CatalogError::not_found(entity, raw))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/books/", get(book_list))
        .route("/books/:id/", get(book_detail))
        .route("/publishers/", get(publisher_list))
        .route("/publishers/:id/", get(publisher_detail))
        .route("/authors/", get(author_list))
        .route("/authors/:id/", get(author_detail))
        .route(
            "/newsletter/subscribe/",
            get(newsletter_form).post(newsletter_subscribe),
        )
        .fallback(fallback)
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
}

async fn index(State(state): State<AppState>) -> Response {
    let page = state.read(pages::index).await;
    state.respond(pages::INDEX_TEMPLATE, page)
}

async fn book_list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = SearchParams::from_pairs(pairs);
    let page = state.read(move |store| pages::book_list(store, params)).await;
    state.respond(pages::BOOK_LIST_TEMPLATE, page)
}

async fn book_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let page = match parse_id("book", &id) {
        Ok(id) => state.read(move |store| pages::book_detail(store, id)).await,
        Err(err) => Err(err),
    };
    state.respond(pages::BOOK_DETAIL_TEMPLATE, page)
}

async fn publisher_list(State(state): State<AppState>) -> Response {
    let page = state.read(pages::publisher_list).await;
    state.respond(pages::PUBLISHER_LIST_TEMPLATE, page)
}

async fn publisher_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let page = match parse_id("publisher", &id) {
        Ok(id) => state.read(move |store| pages::publisher_detail(store, id)).await,
        Err(err) => Err(err),
    };
    state.respond(pages::PUBLISHER_DETAIL_TEMPLATE, page)
}

async fn author_list(State(state): State<AppState>) -> Response {
    let page = state.read(pages::author_list).await;
    state.respond(pages::AUTHOR_LIST_TEMPLATE, page)
}

async fn author_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let page = match parse_id("author", &id) {
        Ok(id) => state.read(move |store| pages::author_detail(store, id)).await,
        Err(err) => Err(err),
    };
    state.respond(pages::AUTHOR_DETAIL_TEMPLATE, page)
}

async fn newsletter_form(State(state): State<AppState>) -> Response {
    state.respond(pages::NEWSLETTER_TEMPLATE, Ok(pages::newsletter_form()))
}

async fn newsletter_subscribe(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let params = NewsletterParams::from_pairs(pairs);
    state.respond(
        pages::NEWSLETTER_TEMPLATE,
        Ok(pages::newsletter_subscribe(params)),
    )
}

/// Unknown paths without a trailing slash are redirected to the slashed
/// form, everything else is a 404.
async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if !path.ends_with('/') {
        let target = slashed_target(path, uri.query());
        return Redirect::permanent(&target).into_response();
    }
    state.not_found(&format!("no page at {}", path))
}

/// Redirect target for a path missing its trailing slash. Leading slashes
/// and backslashes collapse to one `/` so the target always stays on this
/// host (`//other.host` would otherwise read as a protocol-relative URL).
fn slashed_target(path: &str, query: Option<&str>) -> String {
    let local = path.trim_start_matches(['/', '\\']);
    match query {
        Some(query) => format!("/{}/?{}", local, query),
        None => format!("/{}/", local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slashed_target_keeps_the_query() {
        assert_eq!(slashed_target("/books", Some("min_stock=1")), "/books/?min_stock=1");
        assert_eq!(slashed_target("/authors", None), "/authors/");
    }

    #[test]
    fn slashed_target_never_leaves_the_host() {
        assert_eq!(slashed_target("//evil.example", None), "/evil.example/");
        assert_eq!(slashed_target("/\\evil.example", None), "/evil.example/");
        assert_eq!(slashed_target("///evil.example/x", Some("a=1")), "/evil.example/x/?a=1");
    }
}
