use std::io::Write;

use serde::{Serialize, Deserialize};

/// How a logged value should be treated by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    /// Value describes a single step.
    pub on_step: bool,
    /// Value describes a whole epoch.
    pub on_epoch: bool,
    /// Show the value in the progress display.
    pub prog_bar: bool,
}

impl LogOptions {
    /// Epoch-level value shown in the progress display.
    pub fn epoch() -> Self {
        LogOptions { on_step: false, on_epoch: true, prog_bar: true }
    }

    /// Epoch-level value kept out of the progress display.
    pub fn epoch_quiet() -> Self {
        LogOptions { on_step: false, on_epoch: true, prog_bar: false }
    }
}

/// One emitted scalar, e.g. `"val/acc" = 0.91` at epoch 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub key: String,
    pub value: f64,
    pub epoch: usize,
    pub options: LogOptions,
}

/// Receives named scalars from the lifecycle controller.
pub trait MetricSink {
    fn log(&mut self, record: MetricRecord);
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn log(&mut self, record: MetricRecord) {
        (**self).log(record)
    }
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn log(&mut self, record: MetricRecord) {
        (**self).log(record)
    }
}

/// Keeps every record in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<MetricRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// All values logged under `key`, in order.
    pub fn values(&self, key: &str) -> Vec<f64> {
        self.records.iter().filter(|r| r.key == key).map(|r| r.value).collect()
    }

    pub fn last(&self, key: &str) -> Option<f64> {
        self.records.iter().rev().find(|r| r.key == key).map(|r| r.value)
    }
}

impl MetricSink for MemorySink {
    fn log(&mut self, record: MetricRecord) {
        self.records.push(record);
    }
}

/// Forwards progress-bar values to the `log` facade at info level and the
/// rest at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MetricSink for LogSink {
    fn log(&mut self, record: MetricRecord) {
        if record.options.prog_bar {
            log::info!("epoch {} {} = {:.6}", record.epoch, record.key, record.value);
        } else {
            log::debug!("epoch {} {} = {:.6}", record.epoch, record.key, record.value);
        }
    }
}

/// Writes one JSON object per record, newline-delimited.
///
/// Write failures are reported through `log::warn!` and otherwise ignored;
/// losing a metric line must not abort a training run.
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        JsonlSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricSink for JsonlSink<W> {
    fn log(&mut self, record: MetricRecord) {
        let result = serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            log::warn!("dropping metric '{}': {}", record.key, e);
        }
    }
}

/// Sends each record to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: MetricSink, B: MetricSink> MetricSink for Tee<A, B> {
    fn log(&mut self, record: MetricRecord) {
        self.0.log(record.clone());
        self.1.log(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, value: f64) -> MetricRecord {
        MetricRecord { key: key.into(), value, epoch: 1, options: LogOptions::epoch() }
    }

    #[test]
    fn memory_sink_filters_by_key() {
        let mut sink = MemorySink::new();
        sink.log(record("val/acc", 0.5));
        sink.log(record("val/loss", 1.0));
        sink.log(record("val/acc", 0.6));
        assert_eq!(sink.values("val/acc"), vec![0.5, 0.6]);
        assert_eq!(sink.last("val/loss"), Some(1.0));
        assert_eq!(sink.last("test/acc"), None);
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let mut sink = JsonlSink::new(Vec::new());
        sink.log(record("train/loss", 0.25));
        sink.log(record("train/acc", 1.0));
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: MetricRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, record("train/loss", 0.25));
    }

    #[test]
    fn tee_duplicates_records() {
        let mut a = MemorySink::new();
        let mut b = MemorySink::new();
        Tee(&mut a, &mut b).log(record("x", 1.0));
        assert_eq!(a.records.len(), 1);
        assert_eq!(b.records.len(), 1);
    }
}
