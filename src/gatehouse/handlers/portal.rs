use axum::response::{Html, IntoResponse};

// Served without touching the gate or the database: this page must stay up
// as the diversion target even when admission itself cannot decide.
const PORTAL_PAGE: &str = r"<!DOCTYPE html>
<html lang='en'>
<head>
<meta charset='utf-8'>
<meta name='viewport' content='width=device-width, initial-scale=1'>
<title>Portal</title>
</head>
<body>
<main>
<h1>Portal</h1>
<p>Welcome. If you have an account, continue to the <a href='/login'>sign-in page</a>.</p>
</main>
</body>
</html>
";

#[utoipa::path(
    get,
    path= "/portal",
    responses (
        (status = 200, description = "Public portal page", content_type = "text/html")
    ),
    tag = "gate",
)]
/// Serve the public portal page, the diversion target for key mismatches.
pub async fn portal() -> impl IntoResponse {
    Html(PORTAL_PAGE)
}
