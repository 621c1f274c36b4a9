//! Response bodies of the system endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Region;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` once the broker has shut down.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Connected websocket observers.
    pub observers: usize,
    /// Connected MQTT clients.
    pub mqtt_clients: usize,
}

/// Snapshot of the region counters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountersResponse {
    /// Counters of regions 1 to 4, in order.
    #[schema(value_type = Vec<i64>)]
    pub regions: [i64; Region::COUNT],
    /// MQTT client publishes accepted since startup.
    pub publishes: u64,
}
