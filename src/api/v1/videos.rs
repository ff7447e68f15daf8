use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::store::{NewVideo, SortDirection, Video};
use crate::InnerState;

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[tracing::instrument(name = "Get all videos", skip(inner, params))]
pub async fn list_videos(
    State(inner): State<InnerState>,
    params: Result<Query<ListVideosParams>, QueryRejection>,
) -> Result<Json<Vec<Video>>, AppError> {
    let Query(params) = params?;

    let direction = params
        .sort
        .as_deref()
        .map(str::parse::<SortDirection>)
        .transpose()?
        .unwrap_or_default();

    let videos = inner.store.list(direction).await?;
    Ok(Json(videos))
}

#[tracing::instrument(name = "Create video", skip(inner, payload))]
pub async fn create_video(
    State(inner): State<InnerState>,
    payload: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let Json(payload) = payload?;

    let new_video = NewVideo::new(payload.title, payload.tags)?;
    let video = inner.store.create(new_video).await?;

    Ok((StatusCode::CREATED, Json(video)))
}

#[cfg(test)]
mod tests {
    use crate::api::create_app;
    use crate::store::{memory_store, seed::parse_seed};
    use crate::InnerState;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use chrono::DateTime;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn empty_app() -> Router {
        create_app(InnerState {
            store: memory_store().await,
        })
    }

    async fn seeded_app() -> Router {
        let store = memory_store().await;
        let dataset = parse_seed(include_str!("../../../videos.json")).unwrap();
        store.seed_if_empty(&dataset).await.unwrap();
        create_app(InnerState { store })
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn created_at_values(json: &Value) -> Vec<DateTime<chrono::FixedOffset>> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|v| DateTime::parse_from_rfc3339(v["created_at"].as_str().unwrap()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn list_returns_seeded_videos() {
        let response = get(seeded_app().await, "/api/videos").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let videos = json.as_array().unwrap();
        assert!(!videos.is_empty());
        assert!(videos[0]["id"].is_string());
        assert!(videos[0]["title"].is_string());
        assert!(videos[0]["tags"].is_array());
    }

    #[tokio::test]
    async fn list_ascending_is_non_decreasing() {
        let json = body_json(get(seeded_app().await, "/api/videos?sort=asc").await).await;
        let times = created_at_values(&json);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn list_descending_is_non_increasing() {
        let json = body_json(get(seeded_app().await, "/api/videos?sort=desc").await).await;
        let times = created_at_values(&json);
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn list_defaults_to_descending() {
        let default = body_json(get(seeded_app().await, "/api/videos").await).await;
        let desc = body_json(get(seeded_app().await, "/api/videos?sort=desc").await).await;
        assert_eq!(default, desc);
    }

    #[tokio::test]
    async fn list_rejects_unknown_sort() {
        for uri in ["/api/videos?sort=invalid", "/api/videos?sort=", "/api/videos?sort=ASC"] {
            let response = get(seeded_app().await, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

            let json = body_json(response).await;
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn list_reports_corrupt_rows_as_internal_error() {
        let store = memory_store().await;
        sqlx::query(
            "INSERT INTO videos (id, title, thumbnail_url, created_at, tags) VALUES ('v-001', 'Broken', 'https://x.test/1', '2024-01-01T00:00:00Z', '{not json')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let response = get(create_app(InnerState { store }), "/api/videos").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["status"], 500);
    }

    #[tokio::test]
    async fn create_returns_full_record() {
        let response = post_json(
            empty_app().await,
            "/api/videos",
            json!({ "title": "  My first upload  ", "tags": ["intro", "demo"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["id"], "v-001");
        assert_eq!(json["title"], "My first upload");
        assert_eq!(json["tags"], json!(["intro", "demo"]));
        assert_eq!(json["duration"], 0);
        assert_eq!(json["views"], 0);
        assert!(!json["thumbnail_url"].as_str().unwrap().is_empty());
        assert!(!json["created_at"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_without_tags_yields_empty_list() {
        let response = post_json(empty_app().await, "/api/videos", json!({ "title": "Untagged" })).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["tags"], json!([]));
    }

    #[tokio::test]
    async fn create_assigns_consecutive_ids() {
        let app = empty_app().await;

        let first = body_json(post_json(app.clone(), "/api/videos", json!({ "title": "One" })).await).await;
        let second = body_json(post_json(app.clone(), "/api/videos", json!({ "title": "Two" })).await).await;
        assert_eq!(first["id"], "v-001");
        assert_eq!(second["id"], "v-002");

        let listed = body_json(get(app, "/api/videos").await).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_missing_or_blank_title() {
        for body in [json!({}), json!({ "title": "" }), json!({ "title": "   ", "tags": ["x"] })] {
            let response = post_json(empty_app().await, "/api/videos", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let json = body_json(response).await;
            assert!(json["error"].as_str().unwrap().to_lowercase().contains("title"));
        }
    }

    #[tokio::test]
    async fn create_rejects_bad_tags() {
        for body in [
            json!({ "title": "ok", "tags": [""] }),
            json!({ "title": "ok", "tags": [1, 2] }),
            json!({ "title": "ok", "tags": "a,b" }),
        ] {
            let response = post_json(empty_app().await, "/api/videos", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_json(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let response = empty_app()
            .await
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/videos")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
}
