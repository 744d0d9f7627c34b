//! Metric slots.
//!
//! A slot pairs the reader(s) of one metric with the parser that interprets
//! their output. Collecting a slot means read, parse, return; slots never
//! share state with each other.

use crate::error::{CollectError, ParseError};
use crate::parser::{join_usage_and_inodes, InodeUsage};
use crate::reader::Reader;
use crate::snapshot::{DiskUsage, MetricId, MetricValue};

pub type ScalarParser = fn(&str) -> Result<f64, ParseError>;
pub type DiskUsageParser = fn(&str) -> Result<Vec<DiskUsage>, ParseError>;
pub type InodeParser = fn(&str) -> Result<Vec<InodeUsage>, ParseError>;

enum Source {
    Scalar {
        reader: Box<dyn Reader>,
        parse: ScalarParser,
    },
    DiskUsage {
        usage: Box<dyn Reader>,
        parse_usage: DiskUsageParser,
        inodes: Option<(Box<dyn Reader>, InodeParser)>,
    },
}

/// One entry of the collector's slot table.
pub struct MetricSlot {
    metric: MetricId,
    source: Source,
}

impl MetricSlot {
    /// A single-value metric read by `reader` and parsed by `parse`.
    pub fn scalar(metric: MetricId, reader: impl Reader + 'static, parse: ScalarParser) -> Self {
        debug_assert_ne!(metric, MetricId::DiskUsage, "disk usage is not a scalar");
        Self {
            metric,
            source: Source::Scalar {
                reader: Box::new(reader),
                parse,
            },
        }
    }

    /// The disk usage metric. With an inode source both tables are read and
    /// left-joined; without one the usage parser must fill the inode fields.
    pub fn disk_usage(
        usage: impl Reader + 'static,
        parse_usage: DiskUsageParser,
        inodes: Option<(Box<dyn Reader>, InodeParser)>,
    ) -> Self {
        Self {
            metric: MetricId::DiskUsage,
            source: Source::DiskUsage {
                usage: Box::new(usage),
                parse_usage,
                inodes,
            },
        }
    }

    pub fn metric(&self) -> MetricId {
        self.metric
    }

    /// Describes the probe(s) behind this slot.
    pub fn describe(&self) -> String {
        match &self.source {
            Source::Scalar { reader, .. } => reader.describe(),
            Source::DiskUsage {
                usage,
                inodes: Some((inodes, _)),
                ..
            } => format!("{} + {}", usage.describe(), inodes.describe()),
            Source::DiskUsage { usage, .. } => usage.describe(),
        }
    }

    /// Reads and parses the metric once.
    ///
    /// For the two-table disk usage slot both reads run concurrently and a
    /// failure of either fails the slot.
    pub async fn collect(&self) -> Result<MetricValue, CollectError> {
        match &self.source {
            Source::Scalar { reader, parse } => {
                let raw = reader.read().await?;
                Ok(MetricValue::Scalar(parse(&raw)?))
            }
            Source::DiskUsage {
                usage,
                parse_usage,
                inodes: None,
            } => {
                let raw = usage.read().await?;
                Ok(MetricValue::DiskUsage(parse_usage(&raw)?))
            }
            Source::DiskUsage {
                usage,
                parse_usage,
                inodes: Some((inode_reader, parse_inodes)),
            } => {
                let (usage_raw, inode_raw) = tokio::try_join!(usage.read(), inode_reader.read())?;
                let disks = parse_usage(&usage_raw)?;
                let inodes = parse_inodes(&inode_raw)?;
                Ok(MetricValue::DiskUsage(join_usage_and_inodes(disks, &inodes)))
            }
        }
    }
}

impl std::fmt::Debug for MetricSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSlot")
            .field("metric", &self.metric)
            .field("source", &self.describe())
            .finish()
    }
}
