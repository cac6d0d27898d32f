//! Full request-lifecycle flows through the interceptor.

#![allow(clippy::unwrap_used)]

use relay_core::intercept::{Interceptor, NetEvent, RequestId, Stage};
use serde_json::{Value, json};

fn raw_headers(pairs: &[(&str, &str)]) -> Value {
    Value::Array(pairs.iter().map(|(name, value)| json!({"name": name, "value": value})).collect())
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// The full two-phase lifecycle of one intercepted request: capture at
/// send, enrich at receive, prune at completion.
#[test]
fn request_lifecycle_send_receive_complete() {
    init_logging();
    let mut interceptor = Interceptor::new();
    interceptor.add_observer(Stage::HeadersReceived, |_, event| {
        // An observer that rewrites based on the send-phase auth header.
        let auth = event.request_headers.as_ref()?.get("authorization")?;
        Some(json!({"sawAuth": auth}))
    });

    let id = RequestId::from(7_u64);

    // Send phase: the network layer has added the auth token by now.
    let send_raw = raw_headers(&[("Authorization", "Bearer abc"), ("Accept", "*/*")]);
    interceptor.capture_request(&id, &send_raw);

    // Receive phase: the event's own raw request headers lack the token.
    let mut event = NetEvent {
        raw_request_headers: Some(raw_headers(&[("Accept", "*/*")])),
        raw_response_headers: Some(raw_headers(&[("Content-Type", "application/pdf")])),
        ..NetEvent::default()
    };
    let directive = interceptor.dispatch(Stage::HeadersReceived, &id, &mut event);

    assert_eq!(directive, Some(json!({"sawAuth": "Bearer abc"})));
    assert_eq!(event.response_headers.unwrap().get("content-type"), Some("application/pdf"));

    // Terminal event: the capture is gone, a fresh dispatch only sees the
    // event's own headers.
    interceptor.release(&id);
    let mut event = NetEvent {
        raw_request_headers: Some(raw_headers(&[("Accept", "*/*")])),
        ..NetEvent::default()
    };
    interceptor.dispatch(Stage::HeadersReceived, &id, &mut event);
    assert!(event.request_headers.unwrap().get("authorization").is_none());
}

/// Requests interleave; each keeps its own capture.
#[test]
fn interleaved_requests_do_not_cross_captures() {
    let mut interceptor = Interceptor::new();
    interceptor.add_observer(Stage::HeadersReceived, |_, _| None);

    let first = RequestId::from(1_u64);
    let second = RequestId::from(2_u64);
    interceptor.capture_request(&first, &raw_headers(&[("X-Req", "one")]));
    interceptor.capture_request(&second, &raw_headers(&[("X-Req", "two")]));
    interceptor.release(&first);

    let mut event = NetEvent::default();
    interceptor.dispatch(Stage::HeadersReceived, &second, &mut event);
    assert_eq!(event.request_headers.unwrap().get("x-req"), Some("two"));

    let mut event = NetEvent::default();
    interceptor.dispatch(Stage::HeadersReceived, &first, &mut event);
    assert!(event.request_headers.is_none());
}

/// An errored request flows through the error stage and is then pruned
/// like any other terminal event.
#[test]
fn error_stage_observers_see_the_event() {
    let mut interceptor = Interceptor::new();
    let id = RequestId::from(3_u64);
    interceptor.capture_request(&id, &raw_headers(&[("Accept", "*/*")]));

    interceptor.add_observer(Stage::ErrorOccurred, |request_id, _| {
        Some(json!({"failed": request_id.to_string()}))
    });
    let directive = interceptor.dispatch(Stage::ErrorOccurred, &id, &mut NetEvent::default());
    assert_eq!(directive, Some(json!({"failed": "3"})));

    interceptor.release(&id);
    assert!(interceptor.captured(&id).is_none());
}
