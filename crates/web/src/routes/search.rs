//! Public book search.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::PageContext;
use crate::models::Book;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search results template.
#[derive(Template, WebTemplate)]
#[template(path = "books/search_result.html")]
pub struct SearchResultTemplate {
    pub page: PageContext,
    pub query: String,
    pub books: Vec<Book>,
}

/// Books whose title or author contains `q`, ignoring case.
///
/// Open to anonymous visitors. A missing query lists every book.
#[instrument(skip(state, page))]
pub async fn search_results(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<SearchQuery>,
) -> Result<SearchResultTemplate> {
    let query = query.q.unwrap_or_default();
    let books = state.catalog().search_books(&query).await?;

    tracing::debug!(results = books.len(), "Search complete");
    Ok(SearchResultTemplate { page, query, books })
}
