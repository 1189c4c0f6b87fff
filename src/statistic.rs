//! Survey statistics: the layout of a survey as report columns, per-subject
//! tallies of recorded answers and their CSV rendering.
//!
//! Everything here is pure; [`crate::services::statistic`] loads the rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::Translation;

/// One live `(group, question, answer)` combination of a survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureRow {
    pub group_id: i64,
    pub group_title: Translation,
    pub question_id: i64,
    pub question_title: Translation,
    pub answer_id: i64,
    pub answer_title: Translation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerNode {
    pub id: i64,
    pub title: Translation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionNode {
    pub id: i64,
    pub title: Translation,
    pub answers: Vec<AnswerNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupNode {
    pub id: i64,
    pub title: Translation,
    pub questions: Vec<QuestionNode>,
}

/// Groups, questions and answers of a survey in display order. Groups without
/// questions and questions without answers are not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticStructure {
    pub groups: Vec<GroupNode>,
}

/// Report column for one answer, labelled `group.question.answer` by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub group_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub label: String,
}

impl StatisticStructure {
    /// Build the tree from rows sorted by group, question and answer order.
    pub fn from_rows(rows: impl IntoIterator<Item = StructureRow>) -> Self {
        let mut groups: Vec<GroupNode> = Vec::new();

        for row in rows {
            if groups.last().map(|g| g.id) != Some(row.group_id) {
                groups.push(GroupNode {
                    id: row.group_id,
                    title: row.group_title,
                    questions: Vec::new(),
                });
            }
            let Some(group) = groups.last_mut() else {
                continue;
            };

            if group.questions.last().map(|q| q.id) != Some(row.question_id) {
                group.questions.push(QuestionNode {
                    id: row.question_id,
                    title: row.question_title,
                    answers: Vec::new(),
                });
            }
            let Some(question) = group.questions.last_mut() else {
                continue;
            };

            question.answers.push(AnswerNode {
                id: row.answer_id,
                title: row.answer_title,
            });
        }

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Answer columns in traversal order.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        for (g, group) in self.groups.iter().enumerate() {
            for (q, question) in group.questions.iter().enumerate() {
                for (a, answer) in question.answers.iter().enumerate() {
                    columns.push(Column {
                        group_id: group.id,
                        question_id: question.id,
                        answer_id: answer.id,
                        label: format!("{}.{}.{}", g + 1, q + 1, a + 1),
                    });
                }
            }
        }
        columns
    }
}

/// Sum of all recorded votes of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectTotal {
    pub subject_id: i64,
    pub name: Translation,
    pub total: i64,
}

/// Recorded count of one answer for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ResultCell {
    pub subject_id: i64,
    pub group_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub count: i64,
}

type Counts = BTreeMap<i64, BTreeMap<i64, BTreeMap<i64, i64>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectTally {
    pub subject_id: i64,
    pub name: Translation,
    pub total: i64,
    /// group id → question id → answer id → count, recorded combinations only.
    pub results: Counts,
}

impl SubjectTally {
    pub fn new(total: SubjectTotal) -> Self {
        Self {
            subject_id: total.subject_id,
            name: total.name,
            total: total.total,
            results: BTreeMap::new(),
        }
    }

    /// Count of a combination, 0 when nothing was recorded.
    pub fn count(&self, group_id: i64, question_id: i64, answer_id: i64) -> i64 {
        self.results
            .get(&group_id)
            .and_then(|questions| questions.get(&question_id))
            .and_then(|answers| answers.get(&answer_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn percentage(&self, count: i64) -> String {
        percentage(count, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    SubjectName,
    ResultCount,
}

/// `-` for an empty total, otherwise the share rounded half up to two decimals.
pub fn percentage(count: i64, total: i64) -> String {
    if total <= 0 {
        return "-".to_string();
    }
    // Hundredths of a percent, rounded in integers so ties never go to even
    let hundredths = (20_000 * count + total) / (2 * total);
    format!("{}.{:02}%", hundredths / 100, hundredths % 100)
}

fn by_name(a: &SubjectTally, b: &SubjectTally) -> Ordering {
    a.name
        .text()
        .cmp(b.name.text())
        .then_with(|| a.subject_id.cmp(&b.subject_id))
}

pub fn sort_tallies(tallies: &mut [SubjectTally], order_by: OrderBy) {
    match order_by {
        OrderBy::SubjectName => tallies.sort_by(by_name),
        OrderBy::ResultCount => {
            tallies.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| by_name(a, b)))
        }
    }
}

/// One tally per subject total, filled with the cells of those subjects.
pub fn tally(totals: Vec<SubjectTotal>, cells: &[ResultCell], order_by: OrderBy) -> Vec<SubjectTally> {
    let mut tallies: Vec<SubjectTally> = totals.into_iter().map(SubjectTally::new).collect();
    let index: BTreeMap<i64, usize> = tallies
        .iter()
        .enumerate()
        .map(|(i, tally)| (tally.subject_id, i))
        .collect();

    for cell in cells {
        let Some(&i) = index.get(&cell.subject_id) else {
            continue;
        };
        tallies[i]
            .results
            .entry(cell.group_id)
            .or_default()
            .entry(cell.question_id)
            .or_default()
            .insert(cell.answer_id, cell.count);
    }

    sort_tallies(&mut tallies, order_by);
    tallies
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCell {
    pub count: i64,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub subject_id: i64,
    pub name: String,
    pub total: i64,
    pub cells: Vec<ReportCell>,
}

/// Tallies laid out on the structure's columns, one cell per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticReport {
    pub columns: Vec<Column>,
    pub rows: Vec<ReportRow>,
}

impl StatisticReport {
    pub fn new(structure: &StatisticStructure, tallies: &[SubjectTally]) -> Self {
        let columns = structure.columns();
        let rows = tallies
            .iter()
            .map(|tally| ReportRow {
                subject_id: tally.subject_id,
                name: tally.name.to_string(),
                total: tally.total,
                cells: columns
                    .iter()
                    .map(|column| {
                        let count = tally.count(column.group_id, column.question_id, column.answer_id);
                        ReportCell {
                            count,
                            percentage: tally.percentage(count),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(cells: &[String]) -> String {
    let fields: Vec<String> = cells.iter().map(|cell| csv_field(cell)).collect();
    fields.join(",")
}

/// Three header lines (group titles, question titles, answer positions) and
/// one line per tally: `name,total,count...` in column order.
pub fn to_csv(structure: &StatisticStructure, tallies: &[SubjectTally]) -> String {
    let columns = structure.columns();
    let width = columns.len() + 2;

    let mut groups = vec![String::new(); width];
    let mut questions = vec![String::new(); width];
    let mut positions = vec!["Subject".to_string(), "Count".to_string()];

    let mut cell = 2;
    for group in &structure.groups {
        groups[cell] = group.title.to_string();
        for question in &group.questions {
            questions[cell] = question.title.to_string();
            for position in 1..=question.answers.len() {
                positions.push(position.to_string());
                cell += 1;
            }
        }
    }

    let mut lines = vec![csv_line(&groups), csv_line(&questions), csv_line(&positions)];
    for tally in tallies {
        let mut row = vec![tally.name.to_string(), tally.total.to_string()];
        row.extend(
            columns
                .iter()
                .map(|c| tally.count(c.group_id, c.question_id, c.answer_id).to_string()),
        );
        lines.push(csv_line(&row));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

pub fn csv_file_name(survey_id: i64, date: NaiveDate) -> String {
    format!("survey_{survey_id}_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LanguageId;

    fn row(g: i64, q: i64, a: i64) -> StructureRow {
        StructureRow {
            group_id: g,
            group_title: Translation::translated(format!("G{g}")),
            question_id: q,
            question_title: Translation::translated(format!("Q{q}")),
            answer_id: a,
            answer_title: Translation::translated(format!("A{a}")),
        }
    }

    fn total(subject_id: i64, name: &str, total: i64) -> SubjectTotal {
        SubjectTotal {
            subject_id,
            name: Translation::translated(name),
            total,
        }
    }

    fn cell(subject_id: i64, g: i64, q: i64, a: i64, count: i64) -> ResultCell {
        ResultCell {
            subject_id,
            group_id: g,
            question_id: q,
            answer_id: a,
            count,
        }
    }

    #[test]
    fn structure_nests_sorted_rows() {
        let structure =
            StatisticStructure::from_rows([row(1, 10, 100), row(1, 10, 101), row(1, 11, 102), row(2, 20, 200)]);

        assert_eq!(structure.groups.len(), 2);
        assert_eq!(structure.groups[0].questions.len(), 2);
        assert_eq!(structure.groups[0].questions[0].answers.len(), 2);

        let labels: Vec<String> = structure.columns().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, ["1.1.1", "1.1.2", "1.2.1", "2.1.1"]);
    }

    #[test]
    fn worked_example_percentages() {
        let tallies = tally(
            vec![total(1, "S1", 3)],
            &[cell(1, 1, 5, 10, 2), cell(1, 1, 5, 11, 1)],
            OrderBy::SubjectName,
        );

        let s1 = &tallies[0];
        assert_eq!(s1.count(1, 5, 10), 2);
        assert_eq!(s1.count(1, 5, 11), 1);
        assert_eq!(s1.percentage(2), "66.67%");
        assert_eq!(s1.percentage(1), "33.33%");
    }

    #[test]
    fn missing_combinations_are_zero() {
        let tallies = tally(vec![total(1, "S1", 0)], &[], OrderBy::SubjectName);
        assert_eq!(tallies[0].count(1, 2, 3), 0);
        assert_eq!(tallies[0].percentage(0), "-");
        assert_eq!(percentage(0, 4), "0.00%");
    }

    #[test]
    fn percentage_ties_round_up() {
        assert_eq!(percentage(1, 800), "0.13%");
        assert_eq!(percentage(3, 800), "0.38%");
        assert_eq!(percentage(5, 800), "0.63%");
        assert_eq!(percentage(2, 3), "66.67%");
        assert_eq!(percentage(1, 3), "33.33%");
        assert_eq!(percentage(7, 7), "100.00%");
    }

    #[test]
    fn result_count_order_breaks_ties_by_name() {
        let totals = vec![total(1, "Beta", 2), total(2, "Alpha", 2), total(3, "Gamma", 5)];

        let by_count = tally(totals.clone(), &[], OrderBy::ResultCount);
        let names: Vec<&str> = by_count.iter().map(|t| t.name.text()).collect();
        assert_eq!(names, ["Gamma", "Alpha", "Beta"]);

        let by_name = tally(totals, &[], OrderBy::SubjectName);
        let names: Vec<&str> = by_name.iter().map(|t| t.name.text()).collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn cells_of_unknown_subjects_are_ignored() {
        let tallies = tally(vec![total(1, "S1", 1)], &[cell(9, 1, 1, 1, 4)], OrderBy::SubjectName);
        assert!(tallies[0].results.is_empty());
    }

    #[test]
    fn csv_aligns_titles_over_answer_columns() {
        let structure = StatisticStructure::from_rows([row(1, 10, 100), row(1, 10, 101), row(1, 11, 102)]);
        let tallies = tally(
            vec![total(7, "S1", 3)],
            &[cell(7, 1, 10, 100, 2), cell(7, 1, 11, 102, 1)],
            OrderBy::SubjectName,
        );

        let csv = to_csv(&structure, &tallies);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            [",,G1,,", ",,Q10,,Q11", "Subject,Count,1,2,1", "S1,3,2,0,1"]
        );
        for line in &lines {
            assert_eq!(line.split(',').count(), structure.columns().len() + 2);
        }
    }

    #[test]
    fn csv_quotes_special_fields() {
        let structure = StatisticStructure::from_rows([StructureRow {
            group_title: Translation::translated("Food, drinks"),
            question_title: Translation::fallback("Say \"hi\"", LanguageId(2)),
            ..row(1, 1, 1)
        }]);
        let csv = to_csv(&structure, &[]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], ",,\"Food, drinks\"");
        assert_eq!(lines[1], ",,\"[Say \"\"hi\"\"]\"");
    }

    #[test]
    fn report_has_one_cell_per_column() {
        let structure = StatisticStructure::from_rows([row(1, 10, 100), row(1, 10, 101)]);
        let tallies = tally(vec![total(1, "S1", 4)], &[cell(1, 1, 10, 101, 4)], OrderBy::SubjectName);

        let report = StatisticReport::new(&structure, &tallies);
        assert_eq!(report.rows[0].cells.len(), 2);
        assert_eq!(report.rows[0].cells[0].percentage, "0.00%");
        assert_eq!(report.rows[0].cells[1].percentage, "100.00%");
    }

    #[test]
    fn file_name_carries_survey_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(csv_file_name(12, date), "survey_12_2024-03-09.csv");
    }
}
