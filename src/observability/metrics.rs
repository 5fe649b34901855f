//! Metrics recording.
//!
//! # Metrics
//! - `gateway_listeners_started_total` (counter): listeners bound, by scheme
//! - `gateway_connections_total` (counter): accepted WebSocket sessions, by scheme
//! - `gateway_active_connections` (gauge): open WebSocket sessions, by scheme
//! - `gateway_sessions` (gauge): entries in the session registry

use ::metrics::{counter, gauge};

use crate::net::Scheme;

pub fn record_listener_started(scheme: Scheme) {
    counter!("gateway_listeners_started_total", "scheme" => scheme.as_str()).increment(1);
}

pub fn record_connection_opened(scheme: Scheme) {
    counter!("gateway_connections_total", "scheme" => scheme.as_str()).increment(1);
    gauge!("gateway_active_connections", "scheme" => scheme.as_str()).increment(1.0);
}

pub fn record_connection_closed(scheme: Scheme) {
    gauge!("gateway_active_connections", "scheme" => scheme.as_str()).decrement(1.0);
}

pub fn record_session_count(count: usize) {
    gauge!("gateway_sessions").set(count as f64);
}
