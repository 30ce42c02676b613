use tracing::info;
use validator::Validate;

use crate::entities::participant::participant_thing;
use crate::entities::report::{report_thing, ReasonInput, Report, ReportStatus};
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::interfaces::repositories::report_ifce::ReportRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;
use crate::services::notification_service::NotificationService;

#[derive(Debug, Clone)]
pub enum AppealOutcome {
    Appealed(Report),
    AlreadyAppealed,
}

/// Participant reports and their appeals. Operators only read them; no
/// report changes strikes or status on its own.
pub struct ReportService<'a> {
    state: &'a CtxState,
}

impl<'a> ReportService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn file_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: &str,
    ) -> AppResult<Report> {
        if reporter_id == reported_id {
            return Err(AppError::Validation {
                description: "participant can not report itself".to_string(),
            });
        }
        let input = ReasonInput::new(reason);
        input.validate()?;

        let db = &self.state.db;
        let reporter = participant_thing(reporter_id);
        let reported = participant_thing(reported_id);
        not_found(db.participants.get(&reporter).await?, reporter_id)?;
        not_found(db.participants.get(&reported).await?, reported_id)?;

        let report = db.reports.create(&reporter, &reported, input.reason).await?;
        info!("{reporter_id} filed report {} against {reported_id}", report.id);
        NotificationService::new(self.state)
            .on_report_filed(&report)
            .await;
        Ok(report)
    }

    /// Only the reported participant may appeal, once.
    pub async fn appeal(
        &self,
        appellant_id: &str,
        report_id: &str,
        reason: &str,
    ) -> AppResult<AppealOutcome> {
        let input = ReasonInput::new(reason);
        input.validate()?;

        let db = &self.state.db;
        let appellant = participant_thing(appellant_id);
        let report_id_thing = report_thing(report_id);
        let report = db
            .reports
            .get(&report_id_thing)
            .await?
            .filter(|r| r.reported == appellant);
        let report = not_found(report, report_id)?;
        if report.status == ReportStatus::Appealed {
            return Ok(AppealOutcome::AlreadyAppealed);
        }

        match db
            .reports
            .appeal(&report_id_thing, &appellant, input.reason)
            .await?
        {
            Some(report) => {
                info!("{appellant_id} appealed report {report_id}");
                NotificationService::new(self.state)
                    .on_report_appealed(&report)
                    .await;
                Ok(AppealOutcome::Appealed(report))
            }
            None => Ok(AppealOutcome::AlreadyAppealed),
        }
    }

    /// Newest first.
    pub async fn reports_by(&self, reporter_id: &str) -> AppResult<Vec<Report>> {
        self.state
            .db
            .reports
            .list_by_reporter(&participant_thing(reporter_id))
            .await
    }

    /// Newest first.
    pub async fn reports_against(&self, reported_id: &str) -> AppResult<Vec<Report>> {
        self.state
            .db
            .reports
            .list_against(&participant_thing(reported_id))
            .await
    }

    pub async fn latest_reports(&self, limit: u32) -> AppResult<Vec<Report>> {
        self.state.db.reports.latest(limit).await
    }
}
