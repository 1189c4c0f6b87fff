mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use common::{content, create_fixture, create_test_db, subject, EN};
use surveyor::db::{Db, LanguageId};
use surveyor::models::Submission;
use surveyor::{names, router, AppState};
use tower::ServiceExt;

fn app(db: Db) -> axum::Router {
    router(AppState::new(db, LanguageId(1)))
}

async fn send(app: &axum::Router, req: Request<Body>) -> Response {
    app.clone()
        .oneshot(req)
        .await
        .expect("router should respond")
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request build should succeed")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request build should succeed")
}

#[tokio::test]
async fn survey_can_be_created_and_read() {
    let app = app(create_test_db().await);

    let resp = send(
        &app,
        json_request(Method::POST, "/surveys", r#"{"title":"Lunch","description":null}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    let id = created["id"].as_i64().unwrap();

    let resp = send(&app, get(&names::survey_url(id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let survey: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(survey["title"], "Lunch");
}

#[tokio::test]
async fn empty_title_is_a_bad_request() {
    let app = app(create_test_db().await);
    let resp = send(&app, json_request(Method::POST, "/surveys", r#"{"title":"  "}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_survey_is_not_found() {
    let app = app(create_test_db().await);
    let resp = send(&app, get("/surveys/999")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "Could not load the survey.");
}

#[tokio::test]
async fn moving_the_first_item_up_is_a_localized_conflict() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let app = app(db);

    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("{}/move-up", names::answer_url(fixture.answer_ids[0])))
        .header(header::COOKIE, format!("{}=de", names::LOCALE_COOKIE_NAME))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_text(resp).await,
        "Der Eintrag konnte nicht verschoben werden."
    );
}

#[tokio::test]
async fn move_down_reports_the_new_order() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let app = app(db);

    let uri = format!("{}/move-down", names::answer_url(fixture.answer_ids[0]));
    let resp = send(&app, json_request(Method::POST, &uri, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let moved: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(moved["order"], 2);
}

#[tokio::test]
async fn content_language_header_selects_the_translation() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    let app = app(db);

    let req = Request::builder()
        .method(Method::PUT)
        .uri(names::question_group_url(fixture.group_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(names::CONTENT_LANGUAGE_HEADER, "2")
        .body(Body::from(r#"{"title":"Essen"}"#))
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = Request::builder()
        .uri(names::question_group_url(fixture.group_id))
        .header(names::CONTENT_LANGUAGE_HEADER, "2")
        .body(Body::empty())
        .unwrap();
    let group: serde_json::Value = serde_json::from_str(&body_text(send(&app, req).await).await).unwrap();
    assert_eq!(group["title"]["kind"], "translated");
    assert_eq!(group["title"]["text"], "Essen");

    let req = Request::builder()
        .uri(names::question_group_url(fixture.group_id))
        .header(names::CONTENT_LANGUAGE_HEADER, "german")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_parent_subject_is_a_conflict() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    let parent = db
        .create_subject(fixture.survey_id, EN, &subject("Germany", None))
        .await
        .unwrap();
    db.create_subject(fixture.survey_id, EN, &subject("Berlin", Some(parent)))
        .await
        .unwrap();
    let app = app(db);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri(names::subject_url(parent))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unanswered_survey_statistic() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    let app = app(db);

    let resp = send(&app, get(&format!("/surveys/{}/statistic", fixture.survey_id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(page["answered"], false);
    assert_eq!(page["message"], "This survey has not been answered yet.");

    let resp = send(&app, get(&format!("/surveys/{}/statistic.csv", fixture.survey_id))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn answered_survey_statistic_and_export() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A", "B"]).await;
    let s1 = db
        .create_subject(fixture.survey_id, EN, &subject("S1", None))
        .await
        .unwrap();
    db.create_answer(fixture.question_id, EN, &content("C"))
        .await
        .unwrap();
    db.submit_survey(
        fixture.survey_id,
        &Submission {
            subject_id: Some(s1),
            user_id: Some("u1".to_string()),
            answers: vec![fixture.answer_ids[0], fixture.answer_ids[0], fixture.answer_ids[1]],
        },
    )
    .await
    .unwrap();
    let app = app(db);

    let resp = send(
        &app,
        get(&format!(
            "/surveys/{}/statistic?order_by=result_count",
            fixture.survey_id
        )),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(page["answered"], true);
    assert_eq!(page["report"]["columns"][0]["label"], "1.1.1");
    let cells = &page["report"]["rows"][0]["cells"];
    assert_eq!(cells[0]["percentage"], "66.67%");
    assert_eq!(cells[1]["percentage"], "33.33%");
    assert_eq!(cells[2]["count"], 0);

    let resp = send(&app, get(&format!("/surveys/{}/statistic.csv", fixture.survey_id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with(&format!(
        "attachment; filename=\"survey_{}_",
        fixture.survey_id
    )));
    let csv = body_text(resp).await;
    assert!(csv.lines().any(|line| line == "S1,3,2,1,0"));
}

async fn create(app: &axum::Router, uri: &str, body: &str) -> (String, i64) {
    let resp = send(app, json_request(Method::POST, uri, body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()[header::LOCATION]
        .to_str()
        .expect("ascii location")
        .to_string();
    let created: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    (location, created["id"].as_i64().unwrap())
}

async fn json_list(app: &axum::Router, uri: &str) -> Vec<serde_json::Value> {
    let resp = send(app, get(uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_str(&body_text(resp).await).unwrap()
}

#[tokio::test]
async fn created_items_carry_their_location() {
    let app = app(create_test_db().await);

    let (location, survey_id) = create(&app, "/surveys", r#"{"title":"Lunch"}"#).await;
    assert_eq!(location, names::survey_url(survey_id));
    assert_eq!(send(&app, get(&location)).await.status(), StatusCode::OK);

    let (location, group_id) =
        create(&app, &format!("/surveys/{survey_id}/groups"), r#"{"title":"Food"}"#).await;
    assert_eq!(location, names::question_group_url(group_id));

    let (location, question_id) =
        create(&app, &format!("/groups/{group_id}/questions"), r#"{"title":"Dish"}"#).await;
    assert_eq!(location, names::question_url(question_id));
    assert_eq!(send(&app, get(&location)).await.status(), StatusCode::OK);

    let (location, answer_id) =
        create(&app, &format!("/questions/{question_id}/answers"), r#"{"title":"Pizza"}"#).await;
    assert_eq!(location, names::answer_url(answer_id));

    let (location, subject_id) = create(
        &app,
        &format!("/surveys/{survey_id}/subjects"),
        r#"{"name":"Berlin","parent_id":null}"#,
    )
    .await;
    assert_eq!(location, names::subject_url(subject_id));
    assert_eq!(send(&app, get(&location)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn switched_off_subjects_and_answers_are_not_listed() {
    let db = create_test_db().await;
    let fixture = create_fixture(&db, &["A"]).await;
    db.create_subject(fixture.survey_id, EN, &subject("S1", None))
        .await
        .unwrap();
    let app = app(db);

    let subjects_uri = format!("/surveys/{}/subjects", fixture.survey_id);
    let answers_uri = format!("/questions/{}/answers", fixture.question_id);
    assert_eq!(json_list(&app, &subjects_uri).await.len(), 1);
    assert_eq!(json_list(&app, &answers_uri).await.len(), 1);

    let resp = send(
        &app,
        json_request(
            Method::PUT,
            &names::survey_url(fixture.survey_id),
            r#"{"title":"Lunch","use_subjects":false,"use_answers":false}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(json_list(&app, &subjects_uri).await.is_empty());
    assert!(json_list(&app, &answers_uri).await.is_empty());

    let resp = send(&app, get(&names::survey_url(fixture.survey_id))).await;
    let survey: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(survey["use_subjects"], false);
    assert_eq!(survey["use_answers"], false);
}
