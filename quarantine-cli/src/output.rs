// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging, colors and stdout.

use clap::{
    builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    Args, ValueEnum,
};
use owo_colors::{style, OwoColorize, Style};
use std::{
    fmt,
    io::{BufWriter, Write},
};
use swrite::{swrite, SWrite};
use tracing::{
    field::{Field, Visit},
    level_filters::LevelFilter,
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    filter::Targets,
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Log target for lines that continue the previous message, like `Caused by:` chains. Events
/// with this target are printed without a level heading.
pub(crate) const NO_HEADING: &str = "quarantine_cli::no_heading";

/// Environment variable holding a `tracing` target filter, e.g. `quarantine_tracker=debug`.
const LOG_ENV: &str = "QUARANTINE_LOG";

pub(crate) const fn clap_styles() -> Styles {
    let heading = AnsiColor::Green.on_default().effects(Effects::BOLD);
    let literal = AnsiColor::Cyan.on_default().effects(Effects::BOLD);
    Styles::styled()
        .header(heading)
        .usage(heading)
        .literal(literal)
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(literal)
        .invalid(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
}

#[derive(Copy, Clone, Debug, Args)]
#[command(next_help_heading = "Output options")]
pub(crate) struct OutputOpts {
    /// Log debug messages
    #[arg(long, short, env = "QUARANTINE_VERBOSE")]
    verbose: bool,

    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        value_name = "WHEN",
        env = "CARGO_TERM_COLOR"
    )]
    color: Color,
}

impl OutputOpts {
    /// Installs the logger and decides whether stderr gets colors.
    pub(crate) fn init(self) -> OutputContext {
        let stderr_color = self.color.should_colorize(supports_color::Stream::Stderr);
        install_logger(self.verbose, stderr_color);
        OutputContext { stderr_color }
    }
}

/// Output settings for this invocation, decided once at startup.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    stderr_color: bool,
}

impl OutputContext {
    /// Returns styles for messages printed to stderr.
    pub fn stderr_styles(&self) -> StderrStyles {
        if self.stderr_color {
            StderrStyles { bold: style().bold() }
        } else {
            StderrStyles::default()
        }
    }
}

/// Styles for messages printed to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

impl Color {
    fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

fn install_logger(verbose: bool, colorize: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = std::env::var(LOG_ENV).unwrap_or_default();
    let (targets, filter_error) = match filter.trim() {
        "" => (Targets::new().with_default(default_level), None),
        filter => match filter.parse::<Targets>() {
            Ok(targets) => (targets, None),
            Err(err) => (Targets::new().with_default(default_level), Some(err)),
        },
    };

    let layer = tracing_subscriber::fmt::layer()
        .event_format(HeadingFormatter {
            styles: LevelStyles::new(colorize),
        })
        .with_writer(std::io::stderr)
        .with_filter(targets);

    // A logger may already be installed if the app runs more than once in a process.
    if tracing_subscriber::registry().with(layer).try_init().is_ok() {
        if let Some(err) = filter_error {
            tracing::warn!("ignoring invalid {LOG_ENV} value `{filter}`: {err}");
        }
    }
}

/// Prints events as `<level>: <message>`, like cargo.
struct HeadingFormatter {
    styles: LevelStyles,
}

impl<S, N> FormatEvent<S, N> for HeadingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != NO_HEADING {
            let (heading, heading_style) = self.styles.heading(*metadata.level());
            write!(writer, "{}: ", heading.style(heading_style))?;
        }

        let mut message = MessageVisitor::default();
        event.record(&mut message);
        writeln!(writer, "{}", message.0)
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            swrite!(self.0, "{value:?}");
        }
    }
}

#[derive(Debug, Default)]
struct LevelStyles {
    error: Style,
    warning: Style,
    info: Style,
    trace: Style,
}

impl LevelStyles {
    fn new(colorize: bool) -> Self {
        if !colorize {
            return Self::default();
        }
        Self {
            error: style().red().bold(),
            warning: style().yellow().bold(),
            info: style().bold(),
            trace: style().dimmed(),
        }
    }

    fn heading(&self, level: Level) -> (&'static str, Style) {
        match level {
            Level::ERROR => ("error", self.error),
            Level::WARN => ("warning", self.warning),
            Level::INFO => ("info", self.info),
            Level::DEBUG => ("debug", self.info),
            Level::TRACE => ("trace", self.trace),
        }
    }
}

/// Where results are printed.
#[derive(Debug, Default)]
pub enum OutputWriter {
    /// The process's stdout.
    #[default]
    Stdout,

    /// An in-memory buffer, for tests.
    #[cfg(test)]
    Buffer(Vec<u8>),
}

impl OutputWriter {
    pub(crate) fn stdout(&mut self) -> Box<dyn Write + '_> {
        match self {
            Self::Stdout => Box::new(BufWriter::new(std::io::stdout().lock())),
            #[cfg(test)]
            Self::Buffer(buf) => Box::new(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncolored_headings() {
        let styles = LevelStyles::new(false);
        assert_eq!(styles.heading(Level::WARN).0, "warning");
        assert_eq!(
            format!("{}", "error".style(styles.heading(Level::ERROR).1)),
            "error"
        );
    }

    #[test]
    fn buffer_captures_stdout() {
        let mut output_writer = OutputWriter::Buffer(Vec::new());
        {
            let mut stdout = output_writer.stdout();
            write!(stdout, "| Test |").expect("writing to a buffer succeeds");
            stdout.flush().expect("flushing a buffer succeeds");
        }
        let OutputWriter::Buffer(buf) = output_writer else {
            unreachable!("output writer is a buffer")
        };
        assert_eq!(buf, b"| Test |");
    }
}
