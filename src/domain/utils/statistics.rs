use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;

use crate::error::Result;

/// `tracing` target of per-run analytics events.
pub const ANALYTICS_TARGET: &str = "analytics";

/// Columns of the statistics file. Each event sets some of them; the rest
/// are written as "NA".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatParameter {
    /// Milliseconds since the collector was started.
    Time,

    /// "WORKFLOW" for a planned workflow, "BATCH" for the run summary.
    LogDescription,

    WorkflowName,
    RequestType,
    NumDatasets,
    NumBlocks,
    SizeBytes,
    NumEvents,
    NumLumis,
    CpuHours,
    RequiredCopies,

    /// Size of the allowed-site set.
    NumAllowedSites,

    /// Storage nodes already holding input blocks.
    NumCurrentNodes,

    NumWarnings,

    /// Time to plan, in ms.
    ProcessingTime,
}

impl StatParameter {
    /// Column order of the CSV file.
    pub const ALL: [StatParameter; 15] = [
        StatParameter::Time,
        StatParameter::LogDescription,
        StatParameter::WorkflowName,
        StatParameter::RequestType,
        StatParameter::NumDatasets,
        StatParameter::NumBlocks,
        StatParameter::SizeBytes,
        StatParameter::NumEvents,
        StatParameter::NumLumis,
        StatParameter::CpuHours,
        StatParameter::RequiredCopies,
        StatParameter::NumAllowedSites,
        StatParameter::NumCurrentNodes,
        StatParameter::NumWarnings,
        StatParameter::ProcessingTime,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            StatParameter::Time => "Time",
            StatParameter::LogDescription => "LogDescription",
            StatParameter::WorkflowName => "WorkflowName",
            StatParameter::RequestType => "RequestType",
            StatParameter::NumDatasets => "NumDatasets",
            StatParameter::NumBlocks => "NumBlocks",
            StatParameter::SizeBytes => "SizeBytes",
            StatParameter::NumEvents => "NumEvents",
            StatParameter::NumLumis => "NumLumis",
            StatParameter::CpuHours => "CpuHours",
            StatParameter::RequiredCopies => "RequiredCopies",
            StatParameter::NumAllowedSites => "NumAllowedSites",
            StatParameter::NumCurrentNodes => "NumCurrentNodes",
            StatParameter::NumWarnings => "NumWarnings",
            StatParameter::ProcessingTime => "ProcessingTime",
        }
    }
}

/// store values in their native format, only format them when writing to the CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl StatValue {
    fn render(&self) -> String {
        match self {
            StatValue::Text(t) => t.clone(),
            StatValue::Integer(i) => i.to_string(),
            StatValue::Float(f) => f.to_string(),
            StatValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<u64> for StatValue {
    fn from(v: u64) -> Self {
        StatValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        StatValue::from(v as u64)
    }
}

impl From<u32> for StatValue {
    fn from(v: u32) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl From<bool> for StatValue {
    fn from(v: bool) -> Self {
        StatValue::Bool(v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }

    fn row(&self) -> Vec<String> {
        StatParameter::ALL.iter().map(|p| self.data.get(p).map_or_else(|| "NA".to_string(), StatValue::render)).collect()
    }
}

enum StatsMessage {
    Log(StatisticEvent),
    Shutdown,
}

/// Handle for recording statistics events. Writing happens on a background
/// thread, so `add_event` never blocks the planner.
pub struct StatsCollector {
    sender: mpsc::Sender<StatsMessage>,
    worker: Option<thread::JoinHandle<()>>,
    started: std::time::Instant,
}

impl StatsCollector {
    /// Writes to `filename`, or stdout when `None`.
    pub fn init(filename: Option<&str>) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match filename {
            Some(f) => Box::new(File::create(f)?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::with_writer(writer))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || Self::worker_loop(rx, writer));
        StatsCollector { sender: tx, worker: Some(worker), started: std::time::Instant::now() }
    }

    fn worker_loop(rx: mpsc::Receiver<StatsMessage>, writer: Box<dyn Write + Send>) {
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        let headers: Vec<&str> = StatParameter::ALL.iter().map(StatParameter::header).collect();
        if let Err(e) = csv_wtr.write_record(&headers) {
            log::error!("Stats Error: Failed to write headers: {}", e);
        }

        for msg in rx {
            match msg {
                StatsMessage::Log(event) => {
                    if let Err(e) = csv_wtr.write_record(event.row()) {
                        log::error!("Stats Error: Failed to write record: {}", e);
                    }
                }
                StatsMessage::Shutdown => break,
            }
        }

        if let Err(e) = csv_wtr.flush() {
            log::error!("Stats Error: Failed to flush: {}", e);
        }
    }

    /// Stamps the event with the elapsed time unless it carries one.
    pub fn add_event(&self, mut event: StatisticEvent) {
        if event.get(StatParameter::Time).is_none() {
            event.set(StatParameter::Time, self.started.elapsed().as_millis() as u64);
        }

        // A dead writer thread only loses statistics.
        let _ = self.sender.send(StatsMessage::Log(event));
    }

    /// Flushes pending rows and waits for the writer thread.
    pub fn shutdown(&mut self) {
        let _ = self.sender.send(StatsMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Stats Error: writer thread panicked");
            }
        }
    }
}

impl Drop for StatsCollector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_header_and_rows_in_column_order() {
        let buffer = SharedBuffer::default();
        let mut stats = StatsCollector::with_writer(Box::new(buffer.clone()));

        let mut event = StatisticEvent::new();
        event.set(StatParameter::Time, 7u64).set(StatParameter::LogDescription, "WORKFLOW").set(StatParameter::WorkflowName, "wf");
        stats.add_event(event);
        stats.shutdown();

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Time;LogDescription;WorkflowName;"));
        assert!(lines[1].starts_with("7;WORKFLOW;wf;NA;"));
    }
}
