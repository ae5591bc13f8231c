//! Router harness for handler tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, header},
    response::Response,
};
use chrono::{TimeZone, Utc};
use tower::ServiceExt;

use crate::code::FixedClock;
use crate::config::DiscountPolicy;
use crate::directory::InMemoryDirectory;
use crate::provision::tests::RecordingPlatform;
use crate::state::AppState;

pub struct TestApp {
    router: Router,
    pub platform: Arc<RecordingPlatform>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_platform(RecordingPlatform::default())
    }

    pub fn with_failing_code_step() -> Self {
        Self::with_platform(RecordingPlatform {
            fail_code: true,
            ..Default::default()
        })
    }

    fn with_platform(platform: RecordingPlatform) -> Self {
        let platform = Arc::new(platform);
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let state = AppState::new(
            Arc::new(InMemoryDirectory::new()),
            platform.clone(),
            Arc::new(clock),
            DiscountPolicy::default(),
        );

        Self {
            router: crate::app(state, &[]),
            platform,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> Response {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
