//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across the integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::Once;
use std::time::Duration;
use tracing::Level;

static INIT: Once = Once::new();

/// Initialize tracing once per test binary
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

/// Waits until `condition` holds, giving spawned tasks the chance to run.
pub async fn eventually(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {}", description);
}
