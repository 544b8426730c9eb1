// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the dashboard.
//!
//! Handles GET / (HTML report), GET /api/report (JSON), GET /health.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use relato_core::traits::ActivityStore;
use relato_core::{Activity, RelatoError};

/// Shared state for dashboard request handlers.
#[derive(Clone)]
pub struct DashboardState {
    /// Read-only handle to the activity store.
    pub store: Arc<dyn ActivityStore + Send + Sync>,
}

/// Response body for GET /api/report.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// One entry per user with at least one activity.
    pub users: Vec<UserReport>,
}

/// All activities for a single user, newest first.
#[derive(Debug, Serialize)]
pub struct UserReport {
    pub user_id: i64,
    pub activities: Vec<Activity>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// GET /api/report
///
/// Returns every user's activities as JSON, newest first per user.
pub async fn get_report(State(state): State<DashboardState>) -> Response {
    match build_report(state.store.as_ref()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "failed to build report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to read activities".into(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /
///
/// Renders the full report as a single static HTML page. Media is
/// referenced through the /media file route.
pub async fn get_index(State(state): State<DashboardState>) -> Response {
    match build_report(state.store.as_ref()).await {
        Ok(report) => Html(render_report(&report)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to build report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Erro ao carregar os registros</h1>".to_string()),
            )
                .into_response()
        }
    }
}

/// Collects the per-user report from the store.
pub async fn build_report(
    store: &(dyn ActivityStore + Send + Sync),
) -> Result<ReportResponse, RelatoError> {
    let mut users = Vec::new();
    for user_id in store.list_users().await? {
        let activities = store.list_activities(user_id).await?;
        users.push(UserReport {
            user_id: user_id.0,
            activities,
        });
    }
    Ok(ReportResponse { users })
}

/// Renders the report as a self-contained HTML document.
fn render_report(report: &ReportResponse) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Relato</title>\n<style>\n\
         body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }\n\
         .activity { border: 1px solid #ccc; border-radius: 8px; padding: 1rem; margin: 1rem 0; }\n\
         .activity h3 { margin-top: 0; }\n\
         .caption { color: #555; font-style: italic; }\n\
         .ts { color: #888; font-size: 0.85em; }\n\
         img { max-width: 100%; border-radius: 4px; }\n\
         </style>\n</head>\n<body>\n<h1>📒 Relato</h1>\n",
    );

    if report.users.is_empty() {
        out.push_str("<p>Nenhum registro ainda.</p>\n");
    }

    for user in &report.users {
        out.push_str(&format!("<h2>Usuário {}</h2>\n", user.user_id));
        for activity in &user.activities {
            render_activity(&mut out, activity);
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_activity(out: &mut String, activity: &Activity) {
    out.push_str("<div class=\"activity\">\n");
    out.push_str(&format!(
        "<h3>{}</h3>\n<p class=\"ts\">{}</p>\n",
        escape_html(&activity.id.0),
        activity.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));
    for note in &activity.notes {
        out.push_str(&format!(
            "<p>{} <span class=\"ts\">{}</span></p>\n",
            escape_html(&note.text),
            note.timestamp.format("%H:%M:%S"),
        ));
    }
    for media in &activity.media {
        out.push_str(&format!(
            "<p><img src=\"/media/{}\" alt=\"foto\" loading=\"lazy\"></p>\n",
            escape_html(&media.filename),
        ));
        if let Some(ref caption) = media.caption {
            out.push_str(&format!(
                "<p class=\"caption\">{}</p>\n",
                escape_html(caption)
            ));
        }
    }
    out.push_str("</div>\n");
}

/// Minimal HTML entity escaping for user-provided text.
fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    use relato_config::model::StorageConfig;
    use relato_core::{NewMedia, NoteKind, UserId};
    use relato_storage::SqliteStore;

    async fn seeded_store() -> (Arc<SqliteStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: relato_config::model::StorageBackend::Sqlite,
            database_path: dir.path().join("relato.db").display().to_string(),
            data_dir: dir.path().join("media").display().to_string(),
        };
        let store = Arc::new(SqliteStore::new(config));
        store.initialize().await.unwrap();

        let user = UserId(42);
        let first = store
            .create_activity(user, Some("trocar a válvula"), false)
            .await
            .unwrap();
        store
            .append_note(user, &first, "comprei a peça", Some(11), NoteKind::Note)
            .await
            .unwrap();
        let second = store.create_activity(user, None, false).await.unwrap();
        store
            .append_media(
                user,
                &second,
                NewMedia {
                    filename: "antes.jpg".into(),
                    data: vec![0xFF, 0xD8, 0xFF],
                    caption: Some("estado inicial".into()),
                    message_id: Some(12),
                },
            )
            .await
            .unwrap();

        (store, dir)
    }

    #[tokio::test]
    async fn report_lists_users_and_activities() {
        let (store, _dir) = seeded_store().await;
        let report = build_report(store.as_ref()).await.unwrap();

        assert_eq!(report.users.len(), 1);
        assert_eq!(report.users[0].user_id, 42);
        assert_eq!(report.users[0].activities.len(), 2);
        // Newest first.
        assert!(report.users[0].activities[0].media.len() == 1);
    }

    #[tokio::test]
    async fn report_serializes_to_json() {
        let (store, _dir) = seeded_store().await;
        let report = build_report(store.as_ref()).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        let users = json["users"].as_array().unwrap();
        assert_eq!(users[0]["user_id"], 42);
        let activities = users[0]["activities"].as_array().unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0]["media"][0]["caption"], "estado inicial");
    }

    #[tokio::test]
    async fn html_report_embeds_notes_and_media() {
        let (store, _dir) = seeded_store().await;
        let report = build_report(store.as_ref()).await.unwrap();
        let html = render_report(&report);

        assert!(html.contains("trocar a válvula"));
        assert!(html.contains("comprei a peça"));
        assert!(html.contains("src=\"/media/42/"));
        assert!(html.contains("estado inicial"));
    }

    #[tokio::test]
    async fn html_report_escapes_user_text() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: relato_config::model::StorageBackend::Sqlite,
            database_path: dir.path().join("relato.db").display().to_string(),
            data_dir: dir.path().join("media").display().to_string(),
        };
        let store = Arc::new(SqliteStore::new(config));
        store.initialize().await.unwrap();
        store
            .create_activity(UserId(1), Some("<script>alert(1)</script>"), false)
            .await
            .unwrap();

        let report = build_report(store.as_ref()).await.unwrap();
        let html = render_report(&report);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn empty_store_renders_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: relato_config::model::StorageBackend::Sqlite,
            database_path: dir.path().join("relato.db").display().to_string(),
            data_dir: dir.path().join("media").display().to_string(),
        };
        let store = Arc::new(SqliteStore::new(config));
        store.initialize().await.unwrap();

        let report = build_report(store.as_ref()).await.unwrap();
        assert!(report.users.is_empty());
        assert!(render_report(&report).contains("Nenhum registro"));
    }
}
