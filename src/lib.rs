pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::error::{Error, Result};
use crate::models::quiz::QuizSet;
use crate::services::{eval_service::EvalService, notify_service::NotifyService};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub quizzes: Arc<QuizSet>,
    /// `None` when no evaluator credential is configured: objective grading
    /// still runs, submissions get the fixed configuration-error report.
    pub eval_service: Option<EvalService>,
    pub notify_service: NotifyService,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.eval_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Cannot build HTTP client: {}", e)))?;

        let quizzes = Arc::new(QuizSet::load(&config.quiz_file)?);

        let eval_service = config.gemini_api_key.clone().map(|api_key| {
            EvalService::new(
                api_key,
                config.gemini_base_url.clone(),
                config.gemini_model.clone(),
                Duration::from_secs(config.eval_timeout_secs),
                http_client.clone(),
            )
        });
        let notify_service = NotifyService::new(config.results_webhook_url.clone(), http_client);

        Ok(Self {
            quizzes,
            eval_service,
            notify_service,
        })
    }
}
