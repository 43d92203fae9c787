use axum::response::{Html, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

impl Health {
    fn at(now: DateTime<Utc>) -> Self {
        Self {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

pub async fn health_check() -> Json<Health> {
    Json(Health::at(Utc::now()))
}

/// Stoplight Elements page reading `/openapi.json`.
pub async fn serve_docs() -> Html<&'static str> {
    Html(DOCS_PAGE)
}

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>Daily Prompt API</title>
  <script src="https://unpkg.com/@stoplight/elements@8/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@8/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="/openapi.json" router="hash" layout="sidebar" hideExport="true"></elements-api>
</body>
</html>"#;
