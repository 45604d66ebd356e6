use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quiz_backend::models::quiz::QuizSet;
use quiz_backend::routes;
use quiz_backend::services::{eval_service::EvalService, notify_service::NotifyService};
use quiz_backend::AppState;

const MODEL: &str = "gemini-2.0-flash";

fn app(eval_service: Option<EvalService>) -> Router {
    let quizzes = Arc::new(QuizSet::load("quizzes.json").expect("load quizzes.json"));
    let client = reqwest::Client::new();
    let state = AppState {
        quizzes,
        eval_service,
        notify_service: NotifyService::new(None, client),
    };
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/quiz", get(routes::quiz::get_default_quiz))
        .route("/api/quiz/:id", get(routes::quiz::get_quiz_by_id))
        .route("/api/submit", post(routes::submit::submit_quiz))
        .with_state(state)
}

fn eval_against(mock: &MockServer) -> EvalService {
    EvalService::new(
        "test-key".to_string(),
        mock.uri(),
        MODEL.to_string(),
        Duration::from_secs(5),
        reqwest::Client::new(),
    )
}

fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", MODEL)
}

fn gemini_reply(payload_text: &str) -> JsonValue {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": payload_text }] }
        }]
    })
}

async fn submit(app: Router, body: String) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn grades_submission_end_to_end() {
    let mock = MockServer::start().await;
    // Fenced payload: the markdown wrapper must be stripped before parsing.
    let payload = "```json\n{\"grades\": [\
        {\"id\": \"meditative_vs_contemplative\", \"score\": 2, \"analysis\": \"Partially right.\", \"sample_answer\": \"Meditation uses words, contemplation rests in silence.\"},\
        {\"id\": \"may_crowning\", \"score\": 4, \"analysis\": \"Good depth.\", \"sample_answer\": \"It honors Mary as Queen of Heaven.\"}\
    ], \"holistic_feedback\": \"Nice work overall.\"}\n```";
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(body_string_contains("may_crowning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(payload)))
        .expect(1)
        .mount(&mock)
        .await;

    let body = json!({
        "name": "Alice Example",
        "answers": {
            "book_title": "The Imitation of Christ",
            "sacramental_examples": ["Holy Water", "Ashes"],
            "moral_act_parts": ["The Object Chosen", "The Intention", "The Weather"],
            "may_crowning": "It crowns a statue of Mary with flowers.",
            "meditative_vs_contemplative": "One thinks, one rests."
        }
    });
    let (status, report) = submit(app(Some(eval_against(&mock))), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    // 2 (book) + 1.5 (2/4 hits) + 1.5 (2/3 hits - 0.5 miss) + 4 + 2 from the evaluator.
    assert_eq!(report["total_score"], json!(11.0));
    assert_eq!(report["max_score"], json!(52.0));
    assert_eq!(report["holistic_feedback"], json!("Nice work overall."));

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 20);
    // Definition order is preserved end to end.
    assert_eq!(results[0]["id"], json!("book_title"));
    assert_eq!(results[8]["id"], json!("sacramental_examples"));
    assert_eq!(results[19]["id"], json!("practical_steps"));

    let maxima: f64 = results
        .iter()
        .map(|r| r["max_points"].as_f64().unwrap())
        .sum();
    assert_eq!(maxima, report["max_score"].as_f64().unwrap());

    let multi = &results[8];
    assert_eq!(multi["points"], json!(1.5));
    assert_eq!(multi["is_correct"], json!(false));
    assert_eq!(multi["user_answer"], json!("Holy Water, Ashes"));

    // Graded out of order by the evaluator, merged back by id.
    let essay = results.iter().find(|r| r["id"] == json!("may_crowning")).unwrap();
    assert_eq!(essay["points"], json!(4.0));
    assert_eq!(essay["analysis"], json!("Good depth."));

    // The unanswered essay was omitted by the evaluator: zero plus explanation.
    let omitted = results
        .iter()
        .find(|r| r["id"] == json!("conflict_reality"))
        .unwrap();
    assert_eq!(omitted["points"], json!(0.0));
    assert!(!omitted["analysis"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn evaluator_failure_degrades_to_objective_only() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let body = json!({
        "answers": {
            "book_title": "The Imitation of Christ",
            "may_crowning": "A long and thoughtful essay."
        }
    });
    let (status, report) = submit(app(Some(eval_against(&mock))), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_score"], json!(2.0));
    assert!(report["holistic_feedback"]
        .as_str()
        .unwrap()
        .contains("Error generating AI feedback"));

    for r in report["results"].as_array().unwrap() {
        if r["type"] == json!("free_text") {
            assert_eq!(r["points"], json!(0.0));
            assert!(!r["analysis"].as_str().unwrap().is_empty());
        }
    }
}

#[tokio::test]
async fn unparsable_evaluator_payload_degrades_to_objective_only() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("not json at all")))
        .mount(&mock)
        .await;

    let body = json!({ "answers": { "daily_bread": "Spiritual and physical" } });
    let (status, report) = submit(app(Some(eval_against(&mock))), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_score"], json!(2.0));
    assert!(report["holistic_feedback"]
        .as_str()
        .unwrap()
        .contains("Error generating AI feedback"));
}

#[tokio::test]
async fn malformed_body_is_graded_as_unanswered() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "{\"grades\": [], \"holistic_feedback\": \"Nothing to grade.\"}",
        )))
        .mount(&mock)
        .await;

    let (status, report) =
        submit(app(Some(eval_against(&mock))), "{not valid json".to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_score"], json!(0.0));
    assert_eq!(report["max_score"], json!(52.0));
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 20);
    for r in results {
        assert_eq!(r["user_answer"], json!("No Answer"));
    }
}

#[tokio::test]
async fn missing_credential_returns_fixed_error_report() {
    let body = json!({ "answers": { "book_title": "The Imitation of Christ" } });
    let (status, report) = submit(app(None), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_score"], json!(0.0));
    assert_eq!(report["max_score"], json!(0.0));
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], json!("error"));
    assert!(results[0]["analysis"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn unknown_quiz_variant_is_a_not_found() {
    let body = json!({ "quiz": "does-not-exist", "answers": {} });
    let req = Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app(None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_quiz_view_hides_correct_answers() {
    let req = Request::builder()
        .method("GET")
        .uri("/api/quiz")
        .body(Body::empty())
        .unwrap();
    let resp = app(None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let view: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(view["id"], json!("confirmation-homework"));
    assert_eq!(view["total_questions"], json!(20));
    assert_eq!(view["max_score"], json!(52.0));
    for q in view["questions"].as_array().unwrap() {
        assert!(q.get("correct").is_none());
    }

    let req = Request::builder()
        .method("GET")
        .uri("/api/quiz/no-such-quiz")
        .body(Body::empty())
        .unwrap();
    let resp = app(None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
