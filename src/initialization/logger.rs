//! Logger initialization.
//!
//! Plain output is meant for a terminal; JSON output puts one object per line
//! and lifts structured fields (the `host` and `cause` of a failed probe) to
//! top-level keys so a log pipeline can select host failures directly.

use std::io::Write;

use chrono::{SecondsFormat, Utc};
use colored::{Color, Colorize};
use log::kv::{Error as KvError, Key, Value, VisitSource};
use log::{Level, LevelFilter, Record};
use serde_json::json;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Gathers a record's key-value pairs as strings.
#[derive(Default)]
struct Fields(Vec<(String, String)>);

impl<'kvs> VisitSource<'kvs> for Fields {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), KvError> {
        self.0.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

fn fields(record: &Record<'_>) -> Vec<(String, String)> {
    let mut fields = Fields::default();
    // Visiting in-memory pairs cannot fail
    let _ = record.key_values().visit(&mut fields);
    fields.0
}

/// One JSON log line; structured fields sit beside `msg`.
fn json_line(record: &Record<'_>) -> serde_json::Value {
    let mut line = json!({
        "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": record.level().as_str(),
        "target": record.target(),
        "msg": record.args().to_string(),
    });
    if let Some(object) = line.as_object_mut() {
        for (key, value) in fields(record) {
            object.entry(key).or_insert(serde_json::Value::String(value));
        }
    }
    line
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Magenta,
    }
}

/// Initializes the logger with the specified level and format.
///
/// `level` applies to this crate and is the default for everything else;
/// `RUST_LOG` is read first, so per-module directives there still take effect
/// for other crates. TLS and HTTP internals are capped so a debug run stays
/// readable.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=rustls=debug cert_status --hosts hosts --once --log-level debug
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("rustls", LevelFilter::Warn);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("cert_status", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = format!("{:<5}", record.level());
                write!(
                    buf,
                    "{} {}",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    level.color(level_color(record.level()))
                )?;
                // Our own records speak for themselves; name foreign ones
                if !record.target().starts_with("cert_status") {
                    write!(buf, " [{}]", record.target())?;
                }
                writeln!(buf, " {}", record.args())
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
