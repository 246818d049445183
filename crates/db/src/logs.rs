//! `DbLogLayer` — a `tracing_subscriber::Layer` that sinks `INFO`-and-above
//! events into the `logs` table. Wired in optionally by the CLI's `--logs`
//! flag, mirroring `original_source/database/logs.py::DBLogs.db_sink`.
//!
//! `on_event` never touches the pool directly — it hands the record off to
//! an unbounded channel so logging never blocks the traced code on a DB
//! round-trip; a single background task drains the channel and writes.

use std::fmt;

use chrono::Utc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::DbPool;

struct LogRecord {
    logger_name: String,
    log_level: String,
    module: String,
    caller: String,
    line: i32,
    message: String,
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

pub struct DbLogLayer {
    tx: UnboundedSender<LogRecord>,
}

impl DbLogLayer {
    pub fn new(pool: DbPool) -> Self {
        let (tx, mut rx) = unbounded_channel::<LogRecord>();

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(e) = crate::repository::logs::insert(
                    &pool,
                    Utc::now(),
                    &record.logger_name,
                    &record.log_level,
                    &record.module,
                    &record.caller,
                    record.line,
                    &record.message,
                )
                .await
                {
                    eprintln!("db log sink: failed to persist row: {e}");
                }
            }
        });

        Self { tx }
    }
}

impl<S: Subscriber> Layer<S> for DbLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > Level::INFO {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let _ = self.tx.send(LogRecord {
            logger_name: meta.target().to_string(),
            log_level: meta.level().to_string(),
            module: meta.target().to_string(),
            caller: meta.file().unwrap_or("").to_string(),
            line: meta.line().unwrap_or(0) as i32,
            message: visitor.0,
        });
    }
}
