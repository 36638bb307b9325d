use axum::response::{IntoResponse, Redirect};

// axum handler for the bare root, everything starts at the login surface
pub async fn root() -> impl IntoResponse {
    Redirect::to("/login")
}
