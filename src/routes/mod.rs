//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one reading session per connection)
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/article", get(http::http_get_article))
        .route("/api/v1/reading/activities", get(http::http_get_activities))
        .route("/api/v1/quiz", get(http::http_get_quiz))
        .route("/api/v1/quiz/answer", post(http::http_post_answer))
        .route("/api/v1/culture/compare", post(http::http_post_compare))
        .route("/api/v1/culture/debate", get(http::http_get_debate))
        .route("/api/v1/culture/debate/score", post(http::http_post_debate_score))
        .route("/api/v1/tutor/message", post(http::http_post_tutor_message))
        .route("/api/v1/pinyin", post(http::http_post_pinyin))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{state_with, FakeCollaborator, Outcome};

    fn app(outcome: Outcome) -> Router {
        build_router(Arc::new(state_with(Arc::new(FakeCollaborator::failing(outcome)))))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req.header(CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_and_article() {
        let (status, v) = call(app(Outcome::Ok), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v, json!({"ok": true}));

        let (_, v) = call(app(Outcome::Ok), "GET", "/api/v1/article", None).await;
        assert_eq!(v["title"], "为什么要简化汉字");
        assert_eq!(v["sections"].as_array().map(|a| a.len()), Some(5));
        assert_eq!(v["sections"][0]["id"], "intro");
    }

    #[tokio::test]
    async fn activities_and_debate_hide_nothing_but_the_answer_key() {
        let (_, v) = call(app(Outcome::Ok), "GET", "/api/v1/reading/activities", None).await;
        assert_eq!(v["signposts"], json!(["首先", "其次", "最后", "综上所述"]));
        assert_eq!(v["huntTargets"][1]["term"], "印刷术");

        let (_, v) = call(app(Outcome::Ok), "GET", "/api/v1/culture/debate", None).await;
        assert_eq!(v["arguments"].as_array().map(|a| a.len()), Some(6));
        assert!(v["arguments"][0].get("side").is_none());
        assert_eq!(v["presetConcepts"][0], "Horse (Ma)");
    }

    #[tokio::test]
    async fn quiz_is_a_bare_question_list() {
        let (status, v) = call(app(Outcome::Ok), "GET", "/api/v1/quiz", None).await;
        assert_eq!(status, StatusCode::OK);
        let questions = v.as_array().expect("quiz body is an array");
        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0]["id"], 1);
        assert!(questions[0]["question"].is_string());
    }

    #[tokio::test]
    async fn quiz_answer_paths() {
        let body = json!({"questionId": 1, "answer": "缺乏美感"});
        let (status, v) = call(app(Outcome::Ok), "POST", "/api/v1/quiz/answer", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v, json!({"questionId": 1, "isCorrect": true, "feedback": "Correct per text."}));

        let (status, v) = call(app(Outcome::Unconfigured), "POST", "/api/v1/quiz/answer", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["feedback"], "API Key missing");

        let (status, _) =
            call(app(Outcome::Ok), "POST", "/api/v1/quiz/answer", Some(json!({"questionId": 42, "answer": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            call(app(Outcome::Ok), "POST", "/api/v1/quiz/answer", Some(json!({"questionId": 1, "answer": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compare_and_debate_score() {
        let (status, v) =
            call(app(Outcome::Ok), "POST", "/api/v1/culture/compare", Some(json!({"concept": "Horse (Ma)"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["traditional"], "馬");
        assert_eq!(v["concept"], "Horse (Ma)");

        let (status, _) =
            call(app(Outcome::Ok), "POST", "/api/v1/culture/compare", Some(json!({"concept": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let placements = json!({"placements": {"a1": "anti", "a3": "anti", "a5": "pro"}});
        let (_, v) = call(app(Outcome::Ok), "POST", "/api/v1/culture/debate/score", Some(placements)).await;
        assert_eq!(v["score"], 2);
        assert_eq!(v["sorted"], 3);
        assert_eq!(v["total"], 6);
    }

    #[tokio::test]
    async fn tutor_and_pinyin() {
        let body = json!({"history": [{"role": "model", "text": "你好"}], "text": "什么是平民？"});
        let (_, v) = call(app(Outcome::Transport), "POST", "/api/v1/tutor/message", Some(body)).await;
        assert_eq!(v["text"], crate::logic::TUTOR_APOLOGY);

        let (_, v) = call(app(Outcome::Ok), "POST", "/api/v1/pinyin", Some(json!({"text": "平民"}))).await;
        assert_eq!(v["pinyin"], "píng mín");
    }
}
