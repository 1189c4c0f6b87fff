use chrono::NaiveDate;

use crate::db::{Db, LanguageId, StoreResult};
use crate::statistic::{
    csv_file_name, tally, to_csv, OrderBy, ResultCell, StatisticReport, StatisticStructure,
    StructureRow, SubjectTally, SubjectTotal,
};

// ---------------------------------------------------------------------------
// StatisticRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait StatisticRepository: Send + Sync {
    /// `NotFound` unless the survey is live.
    fn ensure_survey(&self, survey_id: i64) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Live combinations sorted by group, question and answer order.
    fn structure_rows(
        &self,
        survey_id: i64,
        language: LanguageId,
    ) -> impl std::future::Future<Output = StoreResult<Vec<StructureRow>>> + Send;

    /// Live subjects with at least one recorded vote.
    fn subject_totals(
        &self,
        survey_id: i64,
        language: LanguageId,
    ) -> impl std::future::Future<Output = StoreResult<Vec<SubjectTotal>>> + Send;

    fn result_cells(
        &self,
        survey_id: i64,
    ) -> impl std::future::Future<Output = StoreResult<Vec<ResultCell>>> + Send;
}

/// A rendered CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// StatisticService
// ---------------------------------------------------------------------------

pub struct StatisticService<R: StatisticRepository = Db> {
    repo: R,
}

impl<R: StatisticRepository + Clone> Clone for StatisticService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: StatisticRepository> StatisticService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn structure(
        &self,
        survey_id: i64,
        language: LanguageId,
    ) -> StoreResult<StatisticStructure> {
        self.repo.ensure_survey(survey_id).await?;
        let rows = self.repo.structure_rows(survey_id, language).await?;
        Ok(StatisticStructure::from_rows(rows))
    }

    /// One tally per subject that has votes. Empty when nobody answered yet.
    pub async fn data(
        &self,
        survey_id: i64,
        language: LanguageId,
        order_by: OrderBy,
    ) -> StoreResult<Vec<SubjectTally>> {
        self.repo.ensure_survey(survey_id).await?;

        let totals = self.repo.subject_totals(survey_id, language).await?;
        if totals.is_empty() {
            return Ok(Vec::new());
        }

        let cells = self.repo.result_cells(survey_id).await?;
        Ok(tally(totals, &cells, order_by))
    }

    /// `None` while the survey has no recorded results.
    pub async fn report(
        &self,
        survey_id: i64,
        language: LanguageId,
        order_by: OrderBy,
    ) -> StoreResult<Option<StatisticReport>> {
        let tallies = self.data(survey_id, language, order_by).await?;
        if tallies.is_empty() {
            return Ok(None);
        }

        let structure = self.structure(survey_id, language).await?;
        Ok(Some(StatisticReport::new(&structure, &tallies)))
    }

    /// CSV of all tallies by subject name, `None` while nothing was recorded.
    pub async fn export_csv(
        &self,
        survey_id: i64,
        language: LanguageId,
        date: NaiveDate,
    ) -> StoreResult<Option<CsvExport>> {
        let tallies = self.data(survey_id, language, OrderBy::SubjectName).await?;
        if tallies.is_empty() {
            return Ok(None);
        }

        let structure = self.structure(survey_id, language).await?;
        tracing::info!("exporting statistic of survey {survey_id} with {} subjects", tallies.len());

        Ok(Some(CsvExport {
            file_name: csv_file_name(survey_id, date),
            content: to_csv(&structure, &tallies),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
