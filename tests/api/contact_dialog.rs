use std::{net::TcpListener, sync::Arc, time::Duration};

use portfolio::{
    dialog::{ContactDialog, DialogTimings, ScrollLock, SubmissionStatus, SubmitRejected},
    domain::{ContactField, ContactForm},
};
use serde_json::json;
use tokio::time::Instant;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::helper::{spawn_app, spawn_app_with};

fn contact_url(server: &MockServer) -> reqwest::Url {
    reqwest::Url::parse(&format!("{}/api/contact", server.uri())).unwrap()
}

fn ada() -> ContactForm {
    ContactForm::new("Ada", "ada@x.com", "hi")
}

fn fill_in(dialog: &ContactDialog, form: &ContactForm) {
    dialog.set_field(ContactField::Name, &form.name);
    dialog.set_field(ContactField::Email, &form.email);
    dialog.set_field(ContactField::Message, &form.message);
}

async fn mock_endpoint(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn success_returns_to_idle_with_cleared_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .and(body_json(json!({ "name": "Ada", "email": "ada@x.com", "message": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let lock = ScrollLock::new();
    let dialog = ContactDialog::new(contact_url(&server), Arc::clone(&lock));
    dialog.open();
    fill_in(&dialog, &ada());
    assert_eq!(dialog.status(), SubmissionStatus::Idle);

    let start = Instant::now();
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Success));
    assert_eq!(dialog.status(), SubmissionStatus::Success);
    assert!(dialog.is_open());
    assert!(!dialog.is_submit_enabled());

    tokio::time::pause();
    let mut rx = dialog.subscribe();

    // 2秒后关闭对话框，表单内容保留到关闭动画结束
    rx.wait_for(|s| !s.is_open()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(!lock.is_locked());
    assert_eq!(dialog.status(), SubmissionStatus::Success);
    assert_eq!(dialog.form(), ada());

    rx.wait_for(|s| s.status() == SubmissionStatus::Idle)
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(2300));
    assert_eq!(dialog.form(), ContactForm::default());
}

#[tokio::test]
async fn failure_keeps_fields_and_returns_to_idle() {
    let server = MockServer::start().await;
    mock_endpoint(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to send message" })),
        1,
    )
    .await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());

    let start = Instant::now();
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));
    assert_eq!(dialog.form(), ada());

    tokio::time::pause();
    dialog
        .subscribe()
        .wait_for(|s| s.status() == SubmissionStatus::Idle)
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(dialog.form(), ada());
    assert!(dialog.is_open());
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = reqwest::Url::parse(&format!("http://127.0.0.1:{port}/api/contact")).unwrap();

    let dialog = ContactDialog::new(url, ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());

    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));
    assert_eq!(dialog.form(), ada());
}

#[tokio::test]
async fn slow_endpoint_times_out_as_error() {
    let server = MockServer::start().await;
    mock_endpoint(
        &server,
        ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
        1,
    )
    .await;

    let timings = DialogTimings {
        request_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new()).with_timings(timings);
    dialog.open();
    fill_in(&dialog, &ada());

    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));
}

#[tokio::test]
async fn only_one_submission_in_flight() {
    let server = MockServer::start().await;
    mock_endpoint(
        &server,
        ResponseTemplate::new(200).set_delay(Duration::from_millis(200)),
        1,
    )
    .await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());
    assert!(dialog.is_submit_enabled());

    let (first, second) = tokio::join!(dialog.submit(), async {
        tokio::task::yield_now().await;
        assert_eq!(dialog.status(), SubmissionStatus::Submitting);
        assert!(!dialog.is_submit_enabled());
        dialog.submit().await
    });

    assert_eq!(first, Ok(SubmissionStatus::Success));
    assert_eq!(second, Err(SubmitRejected::AlreadySubmitting));
}

#[tokio::test]
async fn incomplete_form_never_leaves_idle() {
    let server = MockServer::start().await;
    mock_endpoint(&server, ResponseTemplate::new(200), 0).await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    dialog.open();
    dialog.set_field(ContactField::Name, "Ada");
    dialog.set_field(ContactField::Message, "hi");

    assert_eq!(dialog.submit().await, Err(SubmitRejected::IncompleteForm));
    assert_eq!(dialog.status(), SubmissionStatus::Idle);
}

#[tokio::test]
async fn closed_dialog_cannot_submit() {
    let server = MockServer::start().await;
    mock_endpoint(&server, ResponseTemplate::new(200), 0).await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    fill_in(&dialog, &ada());

    assert_eq!(dialog.submit().await, Err(SubmitRejected::DialogClosed));
}

#[tokio::test]
async fn open_and_close_restores_scroll() {
    let server = MockServer::start().await;
    let lock = ScrollLock::new();
    let dialog = ContactDialog::new(contact_url(&server), Arc::clone(&lock));

    dialog.open();
    assert!(lock.is_locked());
    dialog.close();
    assert!(!lock.is_locked());

    // 重复打开只持有一次锁
    dialog.open();
    dialog.open();
    dialog.close();
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn dropping_an_open_dialog_restores_scroll() {
    let server = MockServer::start().await;
    let lock = ScrollLock::new();

    let dialog = ContactDialog::new(contact_url(&server), Arc::clone(&lock));
    dialog.open();
    assert!(lock.is_locked());
    drop(dialog);

    assert!(!lock.is_locked());
}

#[tokio::test]
async fn closing_keeps_status_and_fields() {
    let server = MockServer::start().await;
    mock_endpoint(&server, ResponseTemplate::new(500), 1).await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));

    dialog.close();
    assert_eq!(dialog.status(), SubmissionStatus::Error);
    assert_eq!(dialog.form(), ada());
}

#[tokio::test]
async fn reopen_after_success_settles_pending_reset() {
    let server = MockServer::start().await;
    mock_endpoint(&server, ResponseTemplate::new(200), 1).await;

    let lock = ScrollLock::new();
    let dialog = ContactDialog::new(contact_url(&server), Arc::clone(&lock));
    dialog.open();
    fill_in(&dialog, &ada());
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Success));

    dialog.close();
    dialog.open();
    assert_eq!(dialog.status(), SubmissionStatus::Idle);
    assert_eq!(dialog.form(), ContactForm::default());

    // 旧的定时器已取消，不会关闭新打开的对话框
    tokio::time::pause();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(dialog.is_open());
    assert!(lock.is_locked());
    assert_eq!(dialog.status(), SubmissionStatus::Idle);
}

#[tokio::test]
async fn reopen_after_error_keeps_fields() {
    let server = MockServer::start().await;
    mock_endpoint(&server, ResponseTemplate::new(500), 1).await;

    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));

    dialog.close();
    dialog.open();
    assert_eq!(dialog.status(), SubmissionStatus::Idle);
    assert_eq!(dialog.form(), ada());
}

#[tokio::test]
async fn resubmitting_cancels_the_error_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mock_endpoint(&server, ResponseTemplate::new(200), 1).await;

    let timings = DialogTimings {
        error_display: Duration::from_secs(1),
        ..Default::default()
    };
    let dialog = ContactDialog::new(contact_url(&server), ScrollLock::new()).with_timings(timings);
    dialog.open();
    fill_in(&dialog, &ada());

    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));
    assert!(dialog.is_submit_enabled());
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Success));

    // 若错误重置仍在，1秒后会把状态改回idle
    tokio::time::pause();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(dialog.status(), SubmissionStatus::Success);
    assert!(dialog.is_open());
    assert_eq!(
        dialog.submit().await,
        Err(SubmitRejected::AlreadySent)
    );
}

#[tokio::test]
async fn dialog_against_running_app() {
    let app = spawn_app().await;

    let dialog = ContactDialog::for_page(app.contact_url());
    dialog.open();
    assert!(ScrollLock::global().is_locked());
    fill_in(&dialog, &ada());
    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Success));

    let sent = app.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reply_to, "ada@x.com");
}

#[tokio::test]
async fn unconfigured_app_surfaces_as_error() {
    let app = spawn_app_with(None).await;

    let dialog = ContactDialog::new(app.contact_url(), ScrollLock::new());
    dialog.open();
    fill_in(&dialog, &ada());

    assert_eq!(dialog.submit().await, Ok(SubmissionStatus::Error));
    assert_eq!(dialog.form(), ada());
}
