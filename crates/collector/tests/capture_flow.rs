//! End-to-end capture flow: interaction occurrences on a replay surface
//! become normalized records, delivered over the wire contract.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use clickpulse_collector::{
    capture_sink, CaptureEngine, ClickSignal, CollectorConfig, HttpDispatcher, ReplaySurface,
    ScrollSignal, SubmitSignal, SurfaceEvent, TargetInfo, TargetRole,
};

fn click(target: TargetInfo, x: i64, y: i64) -> SurfaceEvent {
    SurfaceEvent::Click(ClickSignal {
        element: None,
        target,
        x,
        y,
    })
}

#[tokio::test]
async fn test_interaction_sequence_produces_ordered_records() {
    let surface = Arc::new(ReplaySurface::new("https://example.com/", "Home"));
    let sink = capture_sink();
    let engine = CaptureEngine::install(surface.clone(), sink.clone(), &CollectorConfig::default());

    surface.emit(click(
        TargetInfo {
            role: TargetRole::Link,
            element_id: "nav-courses".into(),
            text_content: Some("Courses".into()),
            ..Default::default()
        },
        100,
        40,
    ));
    // Drain before navigating so the click is captured at its own location
    tokio::time::sleep(Duration::from_millis(10)).await;
    surface.navigate("https://example.com/courses", "Courses");
    surface.emit(SurfaceEvent::Submit(SubmitSignal { form_id: None }));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let records = sink.records();
    let ids: Vec<&str> = records.iter().map(|r| r.element_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["page_view", "nav-courses", "page_view", "form_submission"]
    );

    // Pointer coordinates only on the click
    assert_eq!(records[1].click_x, Some(100));
    assert!(records
        .iter()
        .enumerate()
        .all(|(i, r)| (i == 1) == r.click_x.is_some()));

    // Page URLs reflect the location at capture time
    assert_eq!(records[1].page_url, "https://example.com/");
    assert_eq!(records[2].page_url, "https://example.com/courses");

    engine.detach();
}

#[tokio::test]
async fn test_wire_contract() {
    // Accept one connection and hand the raw request back to the test
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 2048];
            loop {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        buf.extend_from_slice(&chunk[..n]);
                        let header_end =
                            buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4);
                        if let Some(header_end) = header_end {
                            let headers =
                                String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                            let body_len: usize = headers
                                .lines()
                                .find_map(|l| l.strip_prefix("content-length:"))
                                .and_then(|v| v.trim().parse().ok())
                                .unwrap_or(0);
                            if buf.len() >= header_end + body_len {
                                break;
                            }
                        }
                    }
                }
            }
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await;
            let _ = socket.shutdown().await;
            let _ = request_tx.send(buf);
        }
    });

    let surface = Arc::new(ReplaySurface::new("https://example.com/pricing", "Pricing"));
    let config = CollectorConfig {
        endpoint,
        ..Default::default()
    };
    let dispatcher = Arc::new(HttpDispatcher::new(&config).unwrap());
    let engine = CaptureEngine::install(surface.clone(), dispatcher, &config);

    // First request is the installation page view
    let raw = request_rx.recv().await.unwrap();
    let text = String::from_utf8_lossy(&raw);
    let (head, body) = text.split_once("\r\n\r\n").unwrap();

    assert!(head.starts_with("POST /track_click HTTP/1.1"));
    assert!(head.to_lowercase().contains("content-type: application/json"));

    let payload: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(payload["page_url"], "https://example.com/pricing");
    assert_eq!(payload["element_id"], "page_view");
    assert_eq!(payload["element_class"], "navigation");
    assert_eq!(payload["element_text"], "Pricing");
    assert_eq!(payload["click_x"], serde_json::Value::Null);
    assert_eq!(payload["click_y"], serde_json::Value::Null);
    // Exactly the base shape plus timestamp
    assert_eq!(payload.as_object().unwrap().len(), 7);
    assert!(payload["timestamp"].as_str().unwrap().parse::<chrono::DateTime<chrono::Utc>>().is_ok());

    // A click goes out as its own request, never batched
    surface.emit(click(
        TargetInfo {
            role: TargetRole::Button,
            element_id: "cta".into(),
            text_content: Some("Start trial".into()),
            ..Default::default()
        },
        10,
        20,
    ));
    let raw = request_rx.recv().await.unwrap();
    let text = String::from_utf8_lossy(&raw);
    let (_, body) = text.split_once("\r\n\r\n").unwrap();
    let payload: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(payload["element_id"], "cta");
    assert_eq!(payload["click_x"], 10);
    assert_eq!(payload["click_y"], 20);

    engine.detach();
}

#[tokio::test(start_paused = true)]
async fn test_scroll_quiescence_across_navigation() {
    let surface = Arc::new(ReplaySurface::new("https://example.com/a", "A"));
    let sink = capture_sink();
    let _engine = CaptureEngine::install(surface.clone(), sink.clone(), &CollectorConfig::default());

    surface.emit(SurfaceEvent::Scroll(ScrollSignal { offset_y: 250.0 }));
    tokio::time::sleep(Duration::from_millis(200)).await;
    // Location changes while the debounce is pending; the emitted record
    // reads the location at emission time.
    surface.navigate("https://example.com/b", "B");
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(sink.count_id("scroll_event"), 1);
    let scroll = sink
        .records()
        .into_iter()
        .find(|r| r.element_id == "scroll_event")
        .unwrap();
    assert_eq!(scroll.page_url, "https://example.com/b");
    assert_eq!(scroll.element_text, "Scrolled to 250px");
}
