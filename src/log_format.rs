//! Beacon log line format.
//!
//! Default tracing format: `TIMESTAMP LEVEL span1:span2: target: message`
//! This format:            `HH:MM:SS LEVEL target: span1{callsign=..}: message`
//!
//! Span fields are kept because the beacon spans carry the callsign.

use chrono::Local;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter that puts the target before the span context
pub struct TargetFirstFormat {
    ansi: bool,
}

impl TargetFirstFormat {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn level_color(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "\x1b[31m", // Red
            Level::WARN => "\x1b[33m",  // Yellow
            Level::INFO => "\x1b[32m",  // Green
            Level::DEBUG => "\x1b[34m", // Blue
            Level::TRACE => "\x1b[35m", // Magenta
        }
    }
}

impl Default for TargetFirstFormat {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<S, N> FormatEvent<S, N> for TargetFirstFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        write!(writer, "{} ", Local::now().format("%H:%M:%S"))?;

        let level = metadata.level();
        if self.ansi {
            write!(writer, "{}{:>5}\x1b[0m ", Self::level_color(level), level)?;
        } else {
            write!(writer, "{:>5} ", level)?;
        }

        write!(writer, "{}: ", metadata.target())?;

        if let Some(scope) = ctx.event_scope() {
            let mut first = true;
            for span in scope.from_root() {
                if !first {
                    write!(writer, ":")?;
                }
                write!(writer, "{}", span.name())?;

                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, "{{{}}}", fields)?;
                }
                first = false;
            }
            if !first {
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`) plus this format
pub fn init_logging(ansi: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ignore the error if a subscriber is already installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(TargetFirstFormat::new(ansi))
        .try_init();
}
