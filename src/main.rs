use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use quiz_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new()?;
    if app_state.eval_service.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; free-text grading runs in degraded mode");
    }
    info!(
        quizzes = app_state.quizzes.quizzes.len(),
        "Loaded quiz definitions from {}", config.quiz_file
    );

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/quiz", get(routes::quiz::get_default_quiz))
        .route("/api/quiz/:id", get(routes::quiz::get_quiz_by_id))
        .route("/api/submit", post(routes::submit::submit_quiz));

    info!("Serving static assets from: {}", config.static_dir);
    let app = api
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
