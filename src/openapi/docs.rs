//! Static documentation page.
//!
//! The page only bootstraps Swagger UI from its public bundle and points it
//! at the document path; no UI assets are served by the gateway itself.

use axum::body::Bytes;

const SWAGGER_UI_VERSION: &str = "5.17.14";

/// Render the page for a given document path.
pub fn render_docs_page(document_path: &str) -> Bytes {
    let document_path = serde_json::to_string(document_path).unwrap_or_else(|_| "\"/\"".into());
    Bytes::from(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>API documentation</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: {document_path}, dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##
    ))
}
