//! Reporting - moderation reports filed by one user against another.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::client::DataClient;
use crate::domain::foundation::{present, DataResult, ReportId, UserId, ValidationError};
use crate::domain::schema::{Report, ReportColumn, ReportPatch};

/// Relative path of an attached `.txt` file.
static LINK_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\w|\.|/[a-z_\-\s0-9.]+)+\.txt$").expect("link path pattern is valid")
});

crate::pick! {
    /// Id of a written report.
    pub struct ReportKey from Report {
        id: ReportId = ReportColumn::Id,
    }
}

fn check_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::empty_field("description"));
    }
    Ok(description.to_string())
}

/// Report access.
#[derive(Clone)]
pub struct Reports {
    client: DataClient,
}

impl Reports {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// Reports filed by `reporter`, newest first.
    pub async fn by_reporter(&self, reporter: UserId) -> DataResult<Vec<Report>> {
        self.client
            .from::<Report>()
            .select::<Report>()
            .eq(ReportColumn::CreatedById, reporter)
            .order(ReportColumn::CreatedAt, false)
            .many()
            .await
    }

    /// Reports filed against `reported`, newest first.
    pub async fn by_reported(&self, reported: UserId) -> DataResult<Vec<Report>> {
        self.client
            .from::<Report>()
            .select::<Report>()
            .eq(ReportColumn::CreatedOnId, reported)
            .order(ReportColumn::CreatedAt, false)
            .many()
            .await
    }

    /// Starts a report filed by `reporter`.
    pub fn compose(&self, reporter: UserId) -> ReportComposer {
        ReportComposer {
            client: self.client.clone(),
            reporter,
            draft: ReportPatch::default(),
        }
    }

    pub async fn remove(
        &self,
        reports: impl IntoIterator<Item = ReportId>,
    ) -> DataResult<Vec<ReportKey>> {
        self.client
            .from::<Report>()
            .delete()
            .is_in(ReportColumn::Id, reports)
            .returning::<ReportKey>()
            .many()
            .await
    }

    /// Closes the reports, stamped with today's date.
    pub async fn close(&self, reports: impl IntoIterator<Item = ReportId>) -> DataResult<Vec<Report>> {
        self.close_on(Utc::now().date_naive(), reports).await
    }

    pub(crate) async fn close_on(
        &self,
        date: NaiveDate,
        reports: impl IntoIterator<Item = ReportId>,
    ) -> DataResult<Vec<Report>> {
        let patch = ReportPatch {
            is_closed: Some(true),
            closed_date: Some(Some(date)),
            ..Default::default()
        };
        self.client
            .from::<Report>()
            .update(&patch)?
            .is_in(ReportColumn::Id, reports)
            .many()
            .await
    }

    /// Reopens the reports and clears their closing date.
    pub async fn open(&self, reports: impl IntoIterator<Item = ReportId>) -> DataResult<Vec<ReportKey>> {
        let patch = ReportPatch {
            is_closed: Some(false),
            closed_date: Some(None),
            ..Default::default()
        };
        self.client
            .from::<Report>()
            .update(&patch)?
            .is_in(ReportColumn::Id, reports)
            .returning::<ReportKey>()
            .many()
            .await
    }

    pub async fn set_description(&self, report: ReportId, description: &str) -> DataResult<ReportKey> {
        let patch = ReportPatch {
            description: Some(check_description(description)?),
            ..Default::default()
        };
        self.client
            .from::<Report>()
            .update(&patch)?
            .eq(ReportColumn::Id, report)
            .returning::<ReportKey>()
            .one()
            .await
    }
}

/// A report being written. Single use: `report` consumes it.
pub struct ReportComposer {
    client: DataClient,
    reporter: UserId,
    draft: ReportPatch,
}

impl ReportComposer {
    pub fn description(&mut self, description: &str) -> DataResult<&mut Self> {
        self.draft.description = Some(check_description(description)?);
        Ok(self)
    }

    /// Attaches supporting information stored as a relative `.txt` path.
    pub fn link(&mut self, path: &str) -> DataResult<&mut Self> {
        if !LINK_PATH.is_match(path) {
            return Err(ValidationError::invalid_format(
                "linked_information",
                "expected a relative .txt path",
            )
            .into());
        }
        self.draft.linked_information = Some(Some(path.to_string()));
        Ok(self)
    }

    /// Files the report against `target`. A description is required.
    pub async fn report(self, target: UserId) -> DataResult<ReportKey> {
        if target == self.reporter {
            return Err(ValidationError::invalid_format("created_on_id", "cannot report yourself").into());
        }
        let mut draft = self.draft;
        present("description", draft.description.as_ref())?;
        draft.created_by_id = Some(self.reporter);
        draft.created_on_id = Some(target);

        self.client
            .from::<Report>()
            .insert(&draft)?
            .returning::<ReportKey>()
            .one()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn reports() -> (Arc<InMemoryBackend>, Reports) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), Reports::new(DataClient::new(backend)))
    }

    #[tokio::test]
    async fn link_accepts_only_text_files() {
        let (_, reports) = reports();
        let mut composer = reports.compose(UserId::random());

        assert!(composer.link("evidence/chat-log.txt").is_ok());
        assert!(composer.link("evidence/photo.png").is_err());
        assert!(composer.link("").is_err());
        assert_eq!(
            composer.draft.linked_information,
            Some(Some("evidence/chat-log.txt".to_string()))
        );
    }

    #[tokio::test]
    async fn report_sends_reporter_and_target() {
        let (backend, reports) = reports();
        backend.respond_with("Reports", json!({ "id": 17 }));
        let (reporter, target) = (UserId::random(), UserId::random());

        let mut composer = reports.compose(reporter);
        composer.description("Asked for payment off-platform").unwrap();
        let key = composer.report(target).await.unwrap();

        assert_eq!(key.id, ReportId::new(17));
        let sent = &backend.requests()[0];
        assert_eq!(sent.select, "id");
        assert_eq!(
            sent.body,
            Some(json!({
                "created_by_id": reporter,
                "created_on_id": target,
                "description": "Asked for payment off-platform",
            }))
        );
    }

    #[tokio::test]
    async fn report_without_description_fails_before_any_request() {
        let (backend, reports) = reports();
        let result = reports.compose(UserId::random()).report(UserId::random()).await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn close_marks_reports_closed_with_date() {
        let (backend, reports) = reports();
        backend.respond_with("Reports", json!([]));
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

        reports
            .close_on(date, [ReportId::new(1), ReportId::new(2)])
            .await
            .unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(
            sent.body,
            Some(json!({ "is_closed": true, "closed_date": "2024-04-02" }))
        );
        assert_eq!(sent.param("id").as_deref(), Some("in.(1,2)"));
    }

    #[tokio::test]
    async fn open_clears_the_closing_date() {
        let (backend, reports) = reports();
        backend.respond_with("Reports", json!([]));

        reports.open([ReportId::new(4)]).await.unwrap();

        assert_eq!(
            backend.requests()[0].body,
            Some(json!({ "is_closed": false, "closed_date": null }))
        );
    }
}
