//! Primary/secondary endpoint health monitoring.

use super::{NodeError, RpcClient};
use crate::cache::TtlCell;
use crate::config::ServerConfig;

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Which configured endpoint a read goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Primary,
    Secondary,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Primary => "primary",
            EndpointRole::Secondary => "secondary",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeHealth {
    #[serde(rename = "rpc")]
    pub url: String,
    pub ok: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub block: Option<u64>,
}

impl NodeHealth {
    /// Placeholder for an endpoint that has not been probed.
    pub fn unknown(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ok: false,
            latency_ms: None,
            error: None,
            block: None,
        }
    }
}

/// Probe results for all endpoints plus the selected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcHealth {
    pub primary: NodeHealth,
    pub secondary: Option<NodeHealth>,
    pub using: EndpointRole,
}

impl RpcHealth {
    /// The secondary is used only if the primary failed and the secondary
    /// answered. With both down the primary stays selected.
    pub fn select(primary: NodeHealth, secondary: Option<NodeHealth>) -> Self {
        let using = match &secondary {
            Some(s) if !primary.ok && s.ok => EndpointRole::Secondary,
            _ => EndpointRole::Primary,
        };
        Self {
            primary,
            secondary,
            using,
        }
    }

    pub fn active(&self) -> &NodeHealth {
        match (self.using, &self.secondary) {
            (EndpointRole::Secondary, Some(s)) => s,
            _ => &self.primary,
        }
    }

    /// True when the selected endpoint itself failed its probe.
    pub fn is_degraded(&self) -> bool {
        !self.active().ok
    }
}

/// Probe one endpoint. Never fails; errors are folded into the result.
pub async fn probe_endpoint(client: &RpcClient) -> NodeHealth {
    let start = Instant::now();
    let elapsed_ms = |start: Instant| start.elapsed().as_millis() as u64;

    match client.client_version().await {
        Ok(_) => {
            let block = client.block_number().await.ok();
            NodeHealth {
                url: client.url().to_string(),
                ok: true,
                latency_ms: Some(elapsed_ms(start)),
                error: None,
                block,
            }
        }
        Err(e) => NodeHealth {
            url: client.url().to_string(),
            ok: false,
            latency_ms: Some(elapsed_ms(start)),
            error: Some(e.to_string()),
            block: None,
        },
    }
}

/// Cached health monitor over the configured endpoints.
pub struct HealthMonitor {
    primary: RpcClient,
    secondary: Option<RpcClient>,
    cell: TtlCell<RpcHealth>,
}

impl HealthMonitor {
    pub fn new(primary: RpcClient, secondary: Option<RpcClient>, ttl: Duration) -> Self {
        Self {
            primary,
            secondary,
            cell: TtlCell::new(ttl),
        }
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self, NodeError> {
        let timeout = Duration::from_secs(cfg.rpc_timeout_secs);
        let primary = RpcClient::new(&cfg.primary_rpc, timeout)?;
        let secondary = cfg
            .secondary_rpc
            .as_deref()
            .map(|url| RpcClient::new(url, timeout))
            .transpose()?;

        Ok(Self::new(
            primary,
            secondary,
            Duration::from_secs(cfg.rpc_health_ttl_secs),
        ))
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Client for `role`, falling back to the primary when no secondary exists.
    pub fn client(&self, role: EndpointRole) -> &RpcClient {
        match (role, &self.secondary) {
            (EndpointRole::Secondary, Some(s)) => s,
            _ => &self.primary,
        }
    }

    /// Current health, probing the endpoints when the cached result expired.
    pub async fn check_health(&self) -> RpcHealth {
        self.cell
            .get_or_refresh(|| async {
                let (primary, secondary) = tokio::join!(probe_endpoint(&self.primary), async {
                    match &self.secondary {
                        Some(client) => Some(probe_endpoint(client).await),
                        None => None,
                    }
                });

                let health = RpcHealth::select(primary, secondary);
                if health.is_degraded() {
                    tracing::warn!(
                        "No healthy node endpoint; primary error: {}",
                        health.primary.error.as_deref().unwrap_or("unknown")
                    );
                } else {
                    tracing::debug!("Node health refreshed, using {}", health.using);
                }
                health
            })
            .await
    }
}
