use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::SoftCacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for soft cache snapshots.
///
/// Writes in the Prometheus text exposition format so the output can be
/// scraped directly or forwarded to an OpenTelemetry collector.
///
/// ```
/// use blobcache::metrics::exporter::PrometheusTextExporter;
/// use blobcache::metrics::snapshot::SoftCacheMetricsSnapshot;
/// use blobcache::metrics::traits::MetricsExporter;
///
/// let exporter = PrometheusTextExporter::new("blob_strings", Vec::new());
/// exporter.export(&SoftCacheMetricsSnapshot { hits: 3, ..Default::default() });
///
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("blob_strings_hits_total 3"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: impl std::fmt::Display) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<SoftCacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &SoftCacheMetricsSnapshot) {
        self.write_metric("counter", "lookups_total", snapshot.attempts);
        self.write_metric("counter", "hits_total", snapshot.hits);
        self.write_metric("counter", "misses_total", snapshot.misses());
        self.write_metric("counter", "inserts_total", snapshot.inserts);
        self.write_metric("counter", "updates_total", snapshot.updates);
        self.write_metric("counter", "evictions_total", snapshot.evictions);
        self.write_metric("counter", "removes_total", snapshot.removes);
        self.write_metric("counter", "reclaimed_total", snapshot.reclaimed);
        self.write_metric("gauge", "hit_rate", snapshot.hit_rate());
        self.write_metric("gauge", "cache_len", snapshot.cache_len);
        self.write_metric("gauge", "capacity", snapshot.capacity);
        self.write_metric("gauge", "chunks", snapshot.chunks);
    }
}
