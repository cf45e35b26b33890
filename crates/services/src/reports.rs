//! Abuse report intake. Reports are stored and never read back here.

use std::sync::Arc;

use chrono::Utc;
use domains::{DomainError, Report, ReportReason, ReportRepository, Result, UserId};
use tracing::{info, instrument};
use uuid::Uuid;

/// Raw report fields as submitted by a client.
#[derive(Debug, Clone, Default)]
pub struct ReportSubmission {
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    #[instrument(skip(self, submission), fields(reporter = %reporter_id))]
    pub async fn submit_report(
        &self,
        reporter_id: &UserId,
        submission: ReportSubmission,
    ) -> Result<Report> {
        let post_id = parse_target(submission.post_id.as_deref(), "Invalid post id")?;
        let comment_id = parse_target(submission.comment_id.as_deref(), "Invalid comment id")?;
        if post_id.is_none() && comment_id.is_none() {
            return Err(DomainError::invalid("Must specify post or comment to report"));
        }

        let reason: ReportReason = match submission.reason.as_deref().map(str::trim) {
            None | Some("") => return Err(DomainError::invalid("Reason is required")),
            Some(raw) => raw.parse()?,
        };

        let report = Report {
            id: Uuid::now_v7(),
            reporter_id: reporter_id.clone(),
            post_id,
            comment_id,
            reason,
            description: submission
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            created_at: Utc::now(),
        };
        self.reports.insert_report(report.clone()).await?;

        info!(report_id = %report.id, reason = reason.as_str(), "report submitted");
        Ok(report)
    }
}

/// Empty strings count as "not given".
fn parse_target(raw: Option<&str>, invalid: &str) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| DomainError::invalid(invalid)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockReportRepository;

    fn service_expecting(times: usize) -> ReportService {
        let mut reports = MockReportRepository::new();
        reports.expect_insert_report().times(times).returning(|_| Ok(()));
        ReportService::new(Arc::new(reports))
    }

    #[tokio::test]
    async fn requires_a_target() {
        let err = service_expecting(0)
            .submit_report(
                &UserId::new("r"),
                ReportSubmission {
                    reason: Some("spam".into()),
                    post_id: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::invalid("Must specify post or comment to report"));
    }

    #[tokio::test]
    async fn requires_a_known_reason() {
        let target = Some(Uuid::now_v7().to_string());
        let missing = service_expecting(0)
            .submit_report(
                &UserId::new("r"),
                ReportSubmission {
                    comment_id: target.clone(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(missing, DomainError::invalid("Reason is required"));

        let unknown = service_expecting(0)
            .submit_report(
                &UserId::new("r"),
                ReportSubmission {
                    comment_id: target,
                    reason: Some("boring".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(unknown, DomainError::invalid("Invalid report reason"));
    }

    #[tokio::test]
    async fn stores_trimmed_description() {
        let post_id = Uuid::now_v7();
        let report = service_expecting(1)
            .submit_report(
                &UserId::new("r"),
                ReportSubmission {
                    post_id: Some(post_id.to_string()),
                    reason: Some("hate_speech".into()),
                    description: Some("  rude  ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.post_id, Some(post_id));
        assert_eq!(report.comment_id, None);
        assert_eq!(report.reason, ReportReason::HateSpeech);
        assert_eq!(report.description, "rude");
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid_input() {
        let err = service_expecting(0)
            .submit_report(
                &UserId::new("r"),
                ReportSubmission {
                    post_id: Some("not-a-uuid".into()),
                    reason: Some("spam".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::invalid("Invalid post id"));
    }
}
