//! Event handler contract: `{ wishlistUrl, scrollLoops }` in, `{ statusCode, body }` out
use std::sync::Arc;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use wishlist_harvest_lib::application::{EventHandler, HandlerResponse, HarvestEvent};
use wishlist_harvest_lib::infrastructure::{HarvestConfig, ReplayOpener};
use wishlist_harvest_lib::test_utils::{render_wishlist_page, sample_items};
use wishlist_harvest_lib::WishlistSnapshot;

const URL: &str = "https://www.example.com/hz/wishlist/ls/3KXYZ";

fn handler_for(frames: Vec<String>) -> EventHandler {
    EventHandler::new(HarvestConfig::default(), Arc::new(ReplayOpener::new(frames)))
}

fn error_body(response: &HandlerResponse) -> Value {
    serde_json::from_str(&response.body).expect("error body is JSON")
}

#[tokio::test(start_paused = true)]
async fn successful_harvest_returns_pretty_snapshot() {
    let items = sample_items(4);
    let handler = handler_for(vec![render_wishlist_page(&items)]);

    let response = handler.handle(&HarvestEvent::new(URL), CancellationToken::new()).await;

    assert_eq!(response.status_code, 200);
    assert!(response.body.contains('\n'));
    let snapshot = WishlistSnapshot::from_json(&response.body).unwrap();
    assert_eq!(snapshot.items(), items.as_slice());
}

#[tokio::test(start_paused = true)]
async fn scroll_loops_reveal_lazily_loaded_items() {
    let items = sample_items(6);
    let frames = vec![
        render_wishlist_page(&items[..2]),
        render_wishlist_page(&items[..4]),
        render_wishlist_page(&items),
    ];

    let shallow = handler_for(frames.clone())
        .handle(&HarvestEvent::new(URL).with_scroll_loops(1), CancellationToken::new())
        .await;
    let deep = handler_for(frames)
        .handle(&HarvestEvent::new(URL).with_scroll_loops(3), CancellationToken::new())
        .await;

    assert_eq!(WishlistSnapshot::from_json(&shallow.body).unwrap().item_count(), 4);
    assert_eq!(WishlistSnapshot::from_json(&deep.body).unwrap().item_count(), 6);
}

#[tokio::test(start_paused = true)]
async fn raw_event_json_is_accepted() {
    let handler = handler_for(vec![render_wishlist_page(&sample_items(1))]);
    let raw = json!({ "wishlistUrl": URL, "scrollLoops": 0 }).to_string();

    let response = handler.handle_json(&raw, CancellationToken::new()).await;

    assert!(response.is_success());
}

#[tokio::test]
async fn invalid_events_get_400() {
    let handler = handler_for(vec![String::new()]);

    let missing_url = handler.handle_json(r#"{"scrollLoops":2}"#, CancellationToken::new()).await;
    let bad_scheme = handler
        .handle(&HarvestEvent::new("file:///etc/passwd"), CancellationToken::new())
        .await;

    assert_eq!(missing_url.status_code, 400);
    assert_eq!(bad_scheme.status_code, 400);
    assert_eq!(error_body(&bad_scheme)["retryable"], json!(false));
}

#[tokio::test(start_paused = true)]
async fn inconsistent_lengths_get_422() {
    let html = render_wishlist_page(&sample_items(3)).replace(
        r#"<span id="itemComment_I0002"></span>"#,
        "",
    );
    let handler = handler_for(vec![html]);

    let response = handler.handle(&HarvestEvent::new(URL), CancellationToken::new()).await;

    assert_eq!(response.status_code, 422);
    let body = error_body(&response);
    assert_eq!(body["retryable"], json!(true));
    assert!(body["error"].as_str().unwrap().contains("comment"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_gets_499() {
    let handler = handler_for(vec![render_wishlist_page(&sample_items(2))]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let response = handler.handle(&HarvestEvent::new(URL), cancel).await;

    assert_eq!(response.status_code, 499);
}

#[tokio::test(start_paused = true)]
async fn invalid_configuration_gets_500() {
    let mut config = HarvestConfig::default();
    config.selectors.name.selector = "a[id^=".to_string();
    let handler = EventHandler::new(config, Arc::new(ReplayOpener::new(vec![String::new()])));

    let response = handler.handle(&HarvestEvent::new(URL), CancellationToken::new()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(error_body(&response)["retryable"], json!(false));
}
