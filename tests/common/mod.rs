#![allow(dead_code)]

use surveyor::db::{Db, LanguageId};
use surveyor::models::{ContentInput, QuestionInput, SubjectInput, SurveyInput};

pub const EN: LanguageId = LanguageId(1);
pub const DE: LanguageId = LanguageId(2);

pub async fn create_test_db() -> Db {
    create_test_db_with_url().await.0
}

/// Test database plus its URL, for tests that open a second connection.
pub async fn create_test_db_with_url() -> (Db, String) {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("surveyor_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}", path.display());
    let db = Db::new(url.clone())
        .await
        .expect("failed to create test database");
    (db, url)
}

pub fn content(title: &str) -> ContentInput {
    ContentInput {
        title: title.to_string(),
        description: None,
    }
}

pub fn question(title: &str) -> QuestionInput {
    QuestionInput {
        title: title.to_string(),
        description: None,
        question_type: Default::default(),
    }
}

pub fn subject(name: &str, parent_id: Option<i64>) -> SubjectInput {
    SubjectInput {
        name: name.to_string(),
        parent_id,
    }
}

pub fn survey(title: &str) -> SurveyInput {
    SurveyInput {
        title: title.to_string(),
        description: None,
        use_subjects: true,
        use_answers: true,
    }
}

pub async fn create_survey(db: &Db, title: &str) -> i64 {
    db.create_survey(&survey(title)).await.expect("create survey")
}

/// Survey with one group, one question and the given answers.
pub struct Fixture {
    pub survey_id: i64,
    pub group_id: i64,
    pub question_id: i64,
    pub answer_ids: Vec<i64>,
}

pub async fn create_fixture(db: &Db, answers: &[&str]) -> Fixture {
    let survey_id = create_survey(db, "Lunch").await;
    let group_id = db
        .create_question_group(survey_id, EN, &content("Food"))
        .await
        .expect("create group");
    let question_id = db
        .create_question(group_id, EN, &question("Favourite dish"))
        .await
        .expect("create question");

    let mut answer_ids = Vec::new();
    for title in answers {
        answer_ids.push(
            db.create_answer(question_id, EN, &content(title))
                .await
                .expect("create answer"),
        );
    }

    Fixture {
        survey_id,
        group_id,
        question_id,
        answer_ids,
    }
}
