use crate::dto::submit_dto::ReportResponse;
use crate::error::{Error, Result};
use crate::services::grading_service::round_to_tenth;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Summary of a graded submission, posted to the optional results webhook so
/// an external backend can archive or relay the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportNotification {
    pub submission_id: uuid::Uuid,
    pub quiz_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
    pub percent_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub holistic_feedback: String,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub report: ReportResponse,
}

impl ReportNotification {
    pub fn from_report(
        report: &ReportResponse,
        student_name: Option<String>,
        parent_email: Option<String>,
    ) -> Self {
        let percent = if report.max_score > 0.0 {
            round_to_tenth(report.total_score / report.max_score * 100.0)
        } else {
            0.0
        };
        Self {
            submission_id: report.submission_id,
            quiz_id: report.quiz_id.clone(),
            student_name,
            parent_email,
            percent_score: percent,
            total_score: report.total_score,
            max_score: report.max_score,
            holistic_feedback: report.holistic_feedback.clone(),
            submitted_at: chrono::Utc::now(),
            report: report.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NotifyService {
    client: Client,
    webhook_url: Option<String>,
}

impl NotifyService {
    pub fn new(webhook_url: Option<String>, client: Client) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    /// Fire-and-forget delivery; a webhook failure never fails the request.
    pub fn notify(&self, payload: ReportNotification) {
        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let submission_id = payload.submission_id;
            match Self::send(&client, &url, &payload).await {
                Ok(()) => info!(%submission_id, "Report delivered to results webhook"),
                Err(e) => warn!(%submission_id, error = %e, "Results webhook delivery failed"),
            }
        });
    }

    async fn send(client: &Client, url: &str, payload: &ReportNotification) -> Result<()> {
        let res = client.post(url).json(payload).send().await?;
        if !res.status().is_success() {
            return Err(Error::Internal(format!(
                "Results webhook responded with {}",
                res.status()
            )));
        }
        Ok(())
    }
}
