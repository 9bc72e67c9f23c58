//! End-to-end tests driving the router in-process.

use acu_auth::MemorySessionStore;
use acu_auth::password::hash_password;
use acu_core::Gender;
use acu_server::{AppConfig, AppState, create_router};
use acu_store::{AssignRequest, NewIdentity, StaffDraft, Store, StudentDraft};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use chrono::NaiveDate;
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@school.test";
const ADMIN_PASSWORD: &str = "s3cret-pass";

/// A browser stand-in that keeps the session cookie between requests.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(state: AppState) -> Self {
        Self {
            app: create_router(state),
            cookie: None,
        }
    }

    async fn send(&mut self, req: Request<Body>) -> Response {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        if let Some(set) = resp.headers().get(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        resp
    }

    async fn get(&mut self, uri: &str) -> Response {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(c) = &self.cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = &self.cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(form.to_string())).unwrap()).await
    }

    async fn get_text(&mut self, uri: &str) -> (StatusCode, String) {
        let resp = self.get(uri).await;
        let status = resp.status();
        (status, body_text(resp).await)
    }

    async fn log_in(&mut self, email: &str, password: &str) {
        let resp = self
            .post("/login/", &format!("email={}", urlencoding::encode(email)))
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let resp = self
            .post("/login/", &format!("password={}", urlencoding::encode(password)))
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
    }
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &Response) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A school with one stream, three subjects and a teacher specialized in
/// two of them. Returns (staff id, stream id, [math, biology, chemistry]).
async fn seed_school(store: &Store) -> (i64, i64, [i64; 3]) {
    store
        .create_identity(&NewIdentity {
            username: "admin".into(),
            email: ADMIN_EMAIL.into(),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            is_admin: true,
        })
        .await
        .unwrap();

    let class = store.ensure_class("Grade 7").await.unwrap();
    let stream = store.ensure_stream(class.id, "East").await.unwrap();
    let math = store.ensure_subject(class.id, "Mathematics").await.unwrap();
    let bio = store.ensure_subject(class.id, "Biology").await.unwrap();
    let chem = store.ensure_subject(class.id, "Chemistry").await.unwrap();
    let staff = store
        .register_staff(&StaffDraft {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@school.test".into(),
            gender: Gender::Female,
            position: "Teacher".into(),
            department: "Sciences".into(),
            address: "Nairobi".into(),
            phone: None,
            specializations: vec![math.id, bio.id],
        })
        .await
        .unwrap();
    (staff.id, stream.id, [math.id, bio.id, chem.id])
}

async fn app() -> (AppState, Client) {
    let store = Store::in_memory().await.unwrap();
    let state = AppState::new(AppConfig::default(), store);
    let client = Client::new(state.clone());
    (state, client)
}

#[tokio::test]
async fn test_healthz() {
    let (_, mut client) = app().await;
    let (status, body) = client.get_text("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn test_pages_require_login() {
    let (_, mut client) = app().await;
    let resp = client.get("/staff/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/?next=%2Fstaff%2F");
}

#[tokio::test]
async fn test_unknown_email_stays_on_email_step() {
    let (state, mut client) = app().await;
    seed_school(&state.store).await;

    let resp = client.post("/login/", "email=nobody%40school.test").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains("A user with this email does not exist."));
    assert!(page.contains(r#"name="email""#));
    assert!(!page.contains(r#"name="password""#));
}

#[tokio::test]
async fn test_admin_login_and_logout() {
    let (state, mut client) = app().await;
    seed_school(&state.store).await;

    client.post("/login/", "email=Admin%40School.test").await;
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains(r#"name="password""#));

    let resp = client.post("/login/", "password=wrong-password").await;
    assert_eq!(location(&resp), "/login/");
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains("Invalid password."));
    assert!(page.contains(r#"name="password""#));

    let anonymous_cookie = client.cookie.clone();
    let resp = client
        .post("/login/", &format!("password={ADMIN_PASSWORD}"))
        .await;
    assert_eq!(location(&resp), "/");
    assert_ne!(client.cookie, anonymous_cookie, "session id rotates on login");

    let (status, page) = client.get_text("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Login successful!"));

    let resp = client.get("/logout/").await;
    assert_eq!(location(&resp), "/login/");
    let resp = client.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_reset_returns_to_email_step() {
    let (state, mut client) = app().await;
    seed_school(&state.store).await;

    client.post("/login/", "email=admin%40school.test").await;
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains(r#"name="password""#));

    let resp = client.get("/login/?reset=true").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/");
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains(r#"name="email""#));
    assert!(!page.contains(r#"name="password""#));

    let resp = client
        .post("/login/", &format!("password={ADMIN_PASSWORD}"))
        .await;
    assert_eq!(location(&resp), "/login/", "a password alone no longer logs in");
    let resp = client.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    client.post("/login/", "email=jane%40school.test").await;
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains(r#"name="confirm_password""#));
    client.get("/login/?reset=true").await;
    let resp = client
        .post("/login/", "password=longenough&confirm_password=longenough")
        .await;
    assert_eq!(location(&resp), "/login/");
    assert!(state.store.identity_by_email("jane@school.test").await.unwrap().is_none());
}

#[tokio::test]
async fn test_anonymous_visits_leave_no_sessions() {
    let store = Store::in_memory().await.unwrap();
    let sessions = Arc::new(MemorySessionStore::new());
    let state = AppState {
        sessions: sessions.clone(),
        ..AppState::new(AppConfig::default(), store)
    };
    seed_school(&state.store).await;
    let app = create_router(state.clone());

    for _ in 0..500 {
        let req = Request::builder().uri("/login/").body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }
    assert!(sessions.is_empty().await);

    let mut client = Client::new(state);
    let resp = client.post("/login/", "email=admin%40school.test").await;
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=86400"), "{cookie}");
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn test_staff_first_login_creates_password() {
    let (state, mut client) = app().await;
    seed_school(&state.store).await;

    client.post("/login/", "email=jane%40school.test").await;
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains(r#"name="confirm_password""#));

    client
        .post("/login/", "password=longenough&confirm_password=different1")
        .await;
    let (_, page) = client.get_text("/login/").await;
    assert!(page.contains("Passwords do not match."));
    assert!(page.contains(r#"name="confirm_password""#));
    assert!(state.store.identity_by_email("jane@school.test").await.unwrap().is_none());

    let resp = client
        .post("/login/", "password=longenough&confirm_password=longenough")
        .await;
    assert_eq!(location(&resp), "/");
    let (_, page) = client.get_text("/").await;
    assert!(page.contains("Password created successfully! Welcome, Staff!"));

    let identity = state
        .store
        .identity_by_email("jane@school.test")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.username, "jane");
}

#[tokio::test]
async fn test_assign_stream_is_idempotent() {
    let (state, mut client) = app().await;
    let (staff_id, stream_id, [math, bio, _]) = seed_school(&state.store).await;
    state
        .store
        .create_period("2025", ymd(2025, 1, 6), ymd(2025, 11, 28), true)
        .await
        .unwrap();
    client.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let form = format!("staff={staff_id}&stream={stream_id}&subjects={math}&subjects={bio}");
    for expected in [2, 0] {
        let resp = client.post("/assign-stream/", &form).await;
        assert_eq!(location(&resp), "/assign-stream/");
        let (_, page) = client.get_text("/assign-stream/").await;
        assert!(
            page.contains(&format!("Assigned {expected} subject(s) to Jane Doe for Grade 7 East.")),
            "expected {expected} newly created"
        );
    }
    assert_eq!(state.store.teaching_assignments(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_assign_stream_rejects_ineligible_subject() {
    let (state, mut client) = app().await;
    let (staff_id, stream_id, [math, _, chem]) = seed_school(&state.store).await;
    state
        .store
        .create_period("2025", ymd(2025, 1, 6), ymd(2025, 11, 28), true)
        .await
        .unwrap();
    client.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let form = format!("staff={staff_id}&stream={stream_id}&subjects={math}&subjects={chem}");
    client.post("/assign-stream/", &form).await;
    let (_, page) = client.get_text("/assign-stream/").await;
    assert!(page.contains("Subjects: select a valid choice."));
    assert!(state.store.teaching_assignments(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assign_stream_without_period() {
    let (state, mut client) = app().await;
    let (staff_id, stream_id, [math, _, _]) = seed_school(&state.store).await;
    client.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let resp = client
        .post(
            "/assign-stream/",
            &format!("staff={staff_id}&stream={stream_id}&subjects={math}"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let (_, page) = client.get_text("/assign-stream/").await;
    assert!(page.contains("No academic period has been set up."));
    assert!(state.store.teaching_assignments(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_teacher_subjects_endpoint() {
    let (state, mut client) = app().await;
    let (staff_id, stream_id, [math, bio, _]) = seed_school(&state.store).await;
    client.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = client
        .get_text(&format!(
            "/ajax/get-teacher-subjects/?staff_id={staff_id}&stream_id={stream_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            { "id": bio, "name": "Biology" },
            { "id": math, "name": "Mathematics" },
        ])
    );

    let (_, body) = client
        .get_text("/ajax/get-teacher-subjects/?staff_id=abc&stream_id=")
        .await;
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_students_cannot_manage_directory() {
    let (state, mut client) = app().await;
    let (_, stream_id, _) = seed_school(&state.store).await;
    let stream = state.store.stream_by_id(stream_id).await.unwrap().unwrap();
    state
        .store
        .register_student(&StudentDraft {
            admission_number: "A-001".into(),
            first_name: "Sam".into(),
            last_name: "Otieno".into(),
            email: Some("sam@school.test".into()),
            gender: Gender::Male,
            class_id: stream.class_id,
            stream_id,
            address: "Kisumu".into(),
            phone: None,
        })
        .await
        .unwrap();

    client.post("/login/", "email=sam%40school.test").await;
    let resp = client
        .post("/login/", "password=studentpw&confirm_password=studentpw")
        .await;
    assert_eq!(location(&resp), "/");

    let resp = client.get("/staff/").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let (status, _) = client.get_text("/homework/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_staff_through_form() {
    let (state, mut client) = app().await;
    seed_school(&state.store).await;
    client.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, page) = client.get_text("/register_staff/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Agriculture"), "default subjects are seeded");

    let resp = client
        .post(
            "/register_staff/",
            "first_name=Tom&last_name=Kip&email=tom%40school.test&gender=M&position=Teacher\
             &department=Humanities&address=Eldoret",
        )
        .await;
    assert_eq!(location(&resp), "/staff/");
    let (_, page) = client.get_text("/staff/").await;
    assert!(page.contains("Staff member registered successfully!"));
    assert!(page.contains("tom@school.test"));

    let resp = client
        .post("/register_staff/", "first_name=&last_name=Kip&email=bad&gender=M")
        .await;
    assert_eq!(location(&resp), "/register_staff/");
}

#[tokio::test]
async fn test_homework_set_handed_in_and_graded() {
    let (state, mut teacher) = app().await;
    let (staff_id, stream_id, [math, _, _]) = seed_school(&state.store).await;
    let period = state
        .store
        .create_period("2025", ymd(2025, 1, 6), ymd(2025, 11, 28), true)
        .await
        .unwrap();
    state
        .store
        .assign_subjects(
            &AssignRequest {
                staff_id,
                stream_id,
                subject_ids: vec![math],
            },
            &period,
        )
        .await
        .unwrap();
    let stream = state.store.stream_by_id(stream_id).await.unwrap().unwrap();
    let student = state
        .store
        .register_student(&StudentDraft {
            admission_number: "A-002".into(),
            first_name: "Amina".into(),
            last_name: "Wanjiru".into(),
            email: Some("amina@school.test".into()),
            gender: Gender::Female,
            class_id: stream.class_id,
            stream_id,
            address: "Nakuru".into(),
            phone: None,
        })
        .await
        .unwrap();
    for (username, email) in [("jane", "jane@school.test"), ("amina", "amina@school.test")] {
        state
            .store
            .create_identity(&NewIdentity {
                username: username.into(),
                email: email.into(),
                password_hash: hash_password("classroom1").unwrap(),
                is_admin: false,
            })
            .await
            .unwrap();
    }

    teacher.log_in("jane@school.test", "classroom1").await;
    let resp = teacher
        .post(
            "/homework/",
            &format!(
                "title=Fractions&description=Exercise+4&kind=HOMEWORK&subject={math}\
                 &stream={stream_id}&term=&total_marks=20&due_at=2099-01-01T17%3A00"
            ),
        )
        .await;
    let homework_url = location(&resp).to_string();
    let homework = state.store.homework_by_staff(staff_id).await.unwrap().remove(0);
    assert_eq!(homework_url, format!("/homework/{}/", homework.id));

    let mut pupil = Client::new(state.clone());
    pupil.log_in("amina@school.test", "classroom1").await;
    let (_, page) = pupil.get_text("/homework/").await;
    assert!(page.contains("Fractions"));
    let resp = pupil
        .post(&format!("{homework_url}submit/"), "body=3%2F4")
        .await;
    assert_eq!(location(&resp), homework_url);
    let (_, page) = pupil.get_text(&homework_url).await;
    assert!(page.contains("Homework submitted successfully."));

    let submission = state
        .store
        .submission_for(homework.id, student.id)
        .await
        .unwrap()
        .unwrap();
    let resp = teacher
        .post(
            &format!("/submissions/{}/grade/", submission.id),
            "marks=16&remarks=Well+done",
        )
        .await;
    assert_eq!(location(&resp), homework_url);
    let graded = state
        .store
        .submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(graded.marks, Some(16.0));
    assert_eq!(graded.status, "GRADED");

    let resp = pupil.post(&format!("/submissions/{}/grade/", submission.id), "marks=20").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
