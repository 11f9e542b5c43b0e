use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use dashboard::{router, AppState};
use serde_json::Value;
use shared::{Config, Dashboard, FakeSymbolApi, ListedSymbol, StockSymbol, SymbolId};
use tower::ServiceExt;

struct Harness {
    fake: Arc<FakeSymbolApi>,
    dashboard: Arc<Dashboard>,
    app: Router,
}

fn harness(fake: FakeSymbolApi) -> Harness {
    let config = Config::default();
    let fake = Arc::new(fake);
    let dashboard = Arc::new(Dashboard::new(fake.clone(), config.timezone));
    let app = router(AppState::new(dashboard.clone(), &config));
    Harness { fake, dashboard, app }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post(app: &Router, uri: &str, form: &str) -> StatusCode {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    if response.status() == StatusCode::SEE_OTHER {
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
    response.status()
}

#[tokio::test]
async fn index_lists_symbols_with_local_time() {
    let h = harness(FakeSymbolApi::default());
    h.fake.symbols.lock().await.push(StockSymbol {
        id: SymbolId::Int(1),
        code: "FPT".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    });

    let (status, html) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Danh sách mã chứng khoán (1)"));
    assert!(html.contains(r#"<span class="code">FPT</span>"#));
    assert!(html.contains("07:00:00 1/1/2024"));
    assert!(html.contains(r#"action="/symbols/1/delete""#));
    assert!(!html.contains(r#"class="send" disabled"#));
}

#[tokio::test]
async fn empty_list_disables_send() {
    let h = harness(FakeSymbolApi::default());

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains("Chưa có mã nào. Hãy thêm mã đầu tiên!"));
    assert!(html.contains(r#"class="send" disabled"#));

    assert_eq!(post(&h.app, "/report/send", "").await, StatusCode::SEE_OTHER);
    assert_eq!(h.fake.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn add_form_creates_uppercased_symbol() {
    let h = harness(FakeSymbolApi::default());

    assert_eq!(post(&h.app, "/symbols", "code=vnm").await, StatusCode::SEE_OTHER);

    let codes: Vec<String> = h.fake.symbols.lock().await.iter().map(|s| s.code.clone()).collect();
    assert_eq!(codes, vec!["VNM"]);

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains(r#"<span class="code">VNM</span>"#));
    assert!(html.contains(r#"value="""#));
}

#[tokio::test]
async fn blank_code_never_reaches_backend() {
    let h = harness(FakeSymbolApi::default());

    assert_eq!(post(&h.app, "/symbols", "code=+++").await, StatusCode::SEE_OTHER);
    assert_eq!(post(&h.app, "/symbols", "").await, StatusCode::SEE_OTHER);
    assert_eq!(h.fake.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_add_shows_backend_message_and_keeps_input() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT"]));

    post(&h.app, "/symbols", "code=fpt").await;

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains("Symbol FPT already exists"));
    assert!(html.contains(r#"value="fpt""#));
    assert_eq!(h.fake.symbols.lock().await.len(), 1);
}

#[tokio::test]
async fn delete_asks_for_confirmation_first() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT", "VNM"]));

    post(&h.app, "/symbols/1/delete", "").await;
    assert_eq!(h.fake.delete_calls.load(Ordering::SeqCst), 0);

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains("Xác nhận xóa FPT?"));
    assert!(html.contains(r#"action="/symbols/1/delete/confirm""#));

    post(&h.app, "/symbols/1/delete/confirm", "").await;
    assert_eq!(h.fake.delete_calls.load(Ordering::SeqCst), 1);

    let (_, html) = get(&h.app, "/").await;
    assert!(!html.contains("Xác nhận xóa"));
    assert!(!html.contains(r#"<span class="code">FPT</span>"#));
    assert!(html.contains(r#"<span class="code">VNM</span>"#));
}

#[tokio::test]
async fn cancelled_delete_keeps_symbol() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT"]));

    post(&h.app, "/symbols/1/delete", "").await;
    post(&h.app, "/symbols/cancel-delete", "").await;

    let (_, html) = get(&h.app, "/").await;
    assert!(!html.contains("Xác nhận xóa"));
    assert!(html.contains(r#"<span class="code">FPT</span>"#));
    assert_eq!(h.fake.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn send_report_settles_with_acknowledgement() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT"]));

    get(&h.app, "/").await;
    assert_eq!(post(&h.app, "/report/send", "").await, StatusCode::SEE_OTHER);

    let mut settled = false;
    for _ in 0..100 {
        if h.dashboard.view().await.send.is_success() {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(settled);
    assert_eq!(h.fake.send_calls.load(Ordering::SeqCst), 1);

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains(FakeSymbolApi::REPORT_MESSAGE));
}

#[tokio::test]
async fn pending_report_shows_progress_and_ignores_repeat() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT"]));
    let gate = h.fake.hold_reports().await;

    post(&h.app, "/report/send", "").await;
    post(&h.app, "/report/send", "").await;

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains("Đang gửi báo cáo... (30-60 giây)"));
    assert!(html.contains(r#"<meta http-equiv="refresh" content="3">"#));

    gate.add_permits(1);
    for _ in 0..100 {
        if !h.dashboard.view().await.send.is_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.fake.send_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn state_endpoint_returns_view_json() {
    let h = harness(FakeSymbolApi::with_codes(&["FPT"]));

    let (status, body) = get(&h.app, "/api/state").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["list_status"], "loaded");
    assert_eq!(json["rows"][0]["code"], "FPT");
    assert_eq!(json["rows"][0]["id"], 1);
    assert_eq!(json["controls"]["send_enabled"], true);
    assert_eq!(json["send"]["status"], "idle");
}

#[tokio::test]
async fn health_and_version() {
    let h = harness(FakeSymbolApi::default());

    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["status"], "ok");

    let (status, body) = get(&h.app, "/version").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "dashboard");
    assert!(json["commit"].is_string());
}

#[tokio::test]
async fn add_input_is_wired_to_suggestions() {
    let h = harness(FakeSymbolApi::default());
    h.fake.listed.lock().await.push(ListedSymbol {
        symbol: "VNM".to_string(),
        organ_name: Some("Vinamilk".to_string()),
    });

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains(r#"list="symbol-suggestions""#));
    assert!(html.contains(r#"<datalist id="symbol-suggestions">"#));

    let (status, body) = get(&h.app, "/api/suggestions?q=vn").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["symbol"], "VNM");
    assert_eq!(json[0]["organName"], "Vinamilk");
    assert_eq!(h.fake.search_calls.load(Ordering::SeqCst), 1);

    let (_, body) = get(&h.app, "/api/suggestions").await;
    assert_eq!(body, "[]");
    assert_eq!(h.fake.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_add_while_pending_is_ignored() {
    let h = harness(FakeSymbolApi::default());
    let gate = h.fake.hold_creates().await;

    let first = tokio::spawn({
        let app = h.app.clone();
        async move { post(&app, "/symbols", "code=vnm").await }
    });
    for _ in 0..100 {
        if h.dashboard.view().await.add.is_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (_, html) = get(&h.app, "/").await;
    assert!(html.contains("⏳ Thêm mã"));

    assert_eq!(post(&h.app, "/symbols", "code=vnm").await, StatusCode::SEE_OTHER);
    assert_eq!(h.fake.create_calls.load(Ordering::SeqCst), 1);

    gate.add_permits(1);
    assert_eq!(first.await.unwrap(), StatusCode::SEE_OTHER);
    assert_eq!(h.fake.symbols.lock().await.len(), 1);
    assert_eq!(h.fake.create_calls.load(Ordering::SeqCst), 1);
}
