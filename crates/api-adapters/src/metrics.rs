//! Prometheus metrics exposed on `GET /metrics`.

use std::fmt::Write;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Content-changing operations, used as the `operation` label.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum WriteOp {
    CreatePost,
    Repost,
    DeletePost,
    CreateComment,
    DeleteComment,
    React,
    Report,
}

impl WriteOp {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOp::CreatePost => "create_post",
            WriteOp::Repost => "repost",
            WriteOp::DeletePost => "delete_post",
            WriteOp::CreateComment => "create_comment",
            WriteOp::DeleteComment => "delete_comment",
            WriteOp::React => "react",
            WriteOp::Report => "report",
        }
    }
}

impl EncodeLabelValue for WriteOp {
    fn encode(&self, encoder: &mut LabelValueEncoder<'_>) -> Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct WriteLabels {
    operation: WriteOp,
}

pub struct ApiMetrics {
    registry: Registry,
    writes: Family<WriteLabels, Counter>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let writes = Family::<WriteLabels, Counter>::default();
        registry.register(
            "content_writes",
            "Successful content writes by operation",
            writes.clone(),
        );
        Self { registry, writes }
    }

    pub fn record(&self, operation: WriteOp) {
        self.writes.get_or_create(&WriteLabels { operation }).inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}
