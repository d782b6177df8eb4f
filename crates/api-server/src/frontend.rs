use axum::response::Html;
use axum::{routing::get, Router};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub fn frontend_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
