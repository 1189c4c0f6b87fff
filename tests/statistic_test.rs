mod common;

use chrono::NaiveDate;
use common::{content, create_fixture, create_survey, create_test_db, question, subject, DE, EN};
use surveyor::db::Db;
use surveyor::models::Submission;
use surveyor::services::statistic::StatisticService;
use surveyor::statistic::OrderBy;

async fn vote(db: &Db, survey_id: i64, subject_id: i64, answers: Vec<i64>) {
    db.submit_survey(
        survey_id,
        &Submission {
            subject_id: Some(subject_id),
            user_id: None,
            answers,
        },
    )
    .await
    .expect("submit survey");
}

#[tokio::test]
async fn two_to_one_vote_gives_rounded_percentages() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let (a, b) = (fixture.answer_ids[0], fixture.answer_ids[1]);
    let s1 = db
        .create_subject(fixture.survey_id, EN, &subject("S1", None))
        .await
        .unwrap();

    vote(&db, fixture.survey_id, s1, vec![a]).await;
    vote(&db, fixture.survey_id, s1, vec![a]).await;
    vote(&db, fixture.survey_id, s1, vec![b]).await;

    let statistics = StatisticService::new(db.clone());
    let tallies = statistics
        .data(fixture.survey_id, EN, OrderBy::SubjectName)
        .await
        .unwrap();

    assert_eq!(tallies.len(), 1);
    let tally = &tallies[0];
    assert_eq!(tally.total, 3);
    assert_eq!(tally.count(fixture.group_id, fixture.question_id, a), 2);
    assert_eq!(tally.count(fixture.group_id, fixture.question_id, b), 1);
    assert_eq!(tally.percentage(2), "66.67%");
    assert_eq!(tally.percentage(1), "33.33%");
}

#[tokio::test]
async fn tallies_follow_the_requested_order() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    let a = fixture.answer_ids[0];

    let mut subjects = Vec::new();
    for name in ["Bremen", "Aachen", "Cologne"] {
        subjects.push(
            db.create_subject(fixture.survey_id, EN, &subject(name, None))
                .await
                .unwrap(),
        );
    }
    let &[bremen, aachen, cologne] = &subjects[..] else {
        panic!("expected three subjects");
    };
    vote(&db, fixture.survey_id, cologne, vec![a]).await;
    vote(&db, fixture.survey_id, cologne, vec![a]).await;
    vote(&db, fixture.survey_id, bremen, vec![a]).await;
    vote(&db, fixture.survey_id, aachen, vec![a]).await;

    let statistics = StatisticService::new(db.clone());

    let by_name = statistics
        .data(fixture.survey_id, EN, OrderBy::SubjectName)
        .await
        .unwrap();
    let ids: Vec<i64> = by_name.iter().map(|t| t.subject_id).collect();
    assert_eq!(ids, [aachen, bremen, cologne]);

    let by_count = statistics
        .data(fixture.survey_id, EN, OrderBy::ResultCount)
        .await
        .unwrap();
    let ids: Vec<i64> = by_count.iter().map(|t| t.subject_id).collect();
    assert_eq!(ids, [cologne, aachen, bremen]);
}

#[tokio::test]
async fn subjects_without_votes_are_left_out() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    let voted = db
        .create_subject(fixture.survey_id, EN, &subject("Voted", None))
        .await
        .unwrap();
    db.create_subject(fixture.survey_id, EN, &subject("Silent", None))
        .await
        .unwrap();
    vote(&db, fixture.survey_id, voted, vec![fixture.answer_ids[0]]).await;

    let statistics = StatisticService::new(db.clone());
    let tallies = statistics
        .data(fixture.survey_id, EN, OrderBy::SubjectName)
        .await
        .unwrap();
    assert_eq!(tallies.len(), 1);
    assert_eq!(tallies[0].subject_id, voted);
}

#[tokio::test]
async fn structure_follows_item_order_and_skips_deleted_items() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B", "C"]).await;
    let second = db
        .create_question(fixture.group_id, EN, &question("Drink"))
        .await
        .unwrap();
    let water = db.create_answer(second, EN, &content("Water")).await.unwrap();

    db.move_up(surveyor::db::OrderedTable::Question, second)
        .await
        .unwrap();
    db.delete_answer(fixture.answer_ids[1]).await.unwrap();

    let statistics = StatisticService::new(db.clone());
    let structure = statistics.structure(fixture.survey_id, DE).await.unwrap();

    let group = &structure.groups[0];
    assert_eq!(group.title.to_string(), "[Food]");
    assert_eq!(group.questions[0].id, second);
    assert_eq!(group.questions[0].answers[0].id, water);

    let answers: Vec<i64> = group.questions[1].answers.iter().map(|a| a.id).collect();
    assert_eq!(answers, [fixture.answer_ids[0], fixture.answer_ids[2]]);

    let labels: Vec<String> = structure.columns().into_iter().map(|c| c.label).collect();
    assert_eq!(labels, ["1.1.1", "1.2.1", "1.2.2"]);
}

#[tokio::test]
async fn unanswered_survey_has_no_report_or_export() {
    let db = create_test_db().await;
    let survey_id = create_survey(&db, "Quiet").await;

    let statistics = StatisticService::new(db.clone());
    assert!(statistics
        .report(survey_id, EN, OrderBy::ResultCount)
        .await
        .unwrap()
        .is_none());

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert!(statistics.export_csv(survey_id, EN, date).await.unwrap().is_none());
}

#[tokio::test]
async fn csv_export_has_one_column_per_answer() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let drink = db
        .create_question(fixture.group_id, EN, &question("Drink"))
        .await
        .unwrap();
    let water = db.create_answer(drink, EN, &content("Water")).await.unwrap();
    let s1 = db
        .create_subject(fixture.survey_id, EN, &subject("S1", None))
        .await
        .unwrap();
    vote(&db, fixture.survey_id, s1, vec![fixture.answer_ids[1], water]).await;

    let statistics = StatisticService::new(db.clone());
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let export = statistics
        .export_csv(fixture.survey_id, EN, date)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(export.file_name, format!("survey_{}_2024-05-01.csv", fixture.survey_id));
    let lines: Vec<&str> = export.content.lines().collect();
    assert_eq!(
        lines,
        [
            ",,Food,,",
            ",,Favourite dish,,Drink",
            "Subject,Count,1,2,1",
            "S1,2,0,1,1",
        ]
    );
}

#[tokio::test]
async fn deleted_answers_drop_out_of_the_totals() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let s1 = db
        .create_subject(fixture.survey_id, EN, &subject("S1", None))
        .await
        .unwrap();
    vote(&db, fixture.survey_id, s1, vec![fixture.answer_ids[0], fixture.answer_ids[1]]).await;

    db.delete_answer(fixture.answer_ids[0]).await.unwrap();

    let statistics = StatisticService::new(db.clone());
    let tallies = statistics
        .data(fixture.survey_id, EN, OrderBy::SubjectName)
        .await
        .unwrap();
    assert_eq!(tallies[0].total, 1);
    assert_eq!(tallies[0].percentage(1), "100.00%");
}
