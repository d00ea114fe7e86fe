//! Append-only metric stream
//!
//! Samples are seconds for latency streams and 0.0/1.0 for success
//! streams. Nothing is ever pruned.

use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Samples {
    values: Vec<f64>,
    count: u64,
    success_count: u64,
}

/// One SLI stream with interior locking
#[derive(Debug, Default)]
pub struct Metric {
    inner: RwLock<Samples>,
}

impl Metric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw sample
    pub fn record(&self, value: f64) {
        let mut inner = self.inner.write();
        inner.values.push(value);
        inner.count += 1;
    }

    /// Append a success/failure sample
    pub fn record_outcome(&self, success: bool) {
        let mut inner = self.inner.write();
        inner.values.push(if success { 1.0 } else { 0.0 });
        inner.count += 1;
        if success {
            inner.success_count += 1;
        }
    }

    /// Nearest-rank percentile (`p` in 0..=100), 0.0 when empty
    pub fn percentile(&self, p: f64) -> f64 {
        let mut values = self.inner.read().values.clone();
        values.sort_by(f64::total_cmp);
        percentile(&values, p)
    }

    /// `success_count / count`, 1.0 when no samples
    pub fn success_rate(&self) -> f64 {
        let inner = self.inner.read();
        if inner.count == 0 {
            return 1.0;
        }
        inner.success_count as f64 / inner.count as f64
    }

    pub fn len(&self) -> usize {
        self.inner.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(count, success_count)`
    pub fn counts(&self) -> (u64, u64) {
        let inner = self.inner.read();
        (inner.count, inner.success_count)
    }
}

/// Nearest-rank percentile over an ascending slice.
///
/// Index is `ceil(p/100 * n) - 1`, clamped to the slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[index]
}
