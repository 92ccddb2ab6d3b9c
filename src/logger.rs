//! Diagnostics
//!
//! The client reports everything it ignores or gives up on through the [`log`] facade. By default
//! that means whatever logger the process registered with `log`. A [`ClientConfig`] can route a
//! single client's diagnostics to its own [`log::Log`] instead.
//!
//! [`DefaultLogger`] is a small stdout logger that can be registered with [`install`] when the
//! host application has no logger of its own.
//!
//! [`ClientConfig`]: crate::ClientConfig
use log::kv::{Key, Source, Value};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a diagnostic, and the threshold of a [`DefaultLogger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Debug,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Whether a logger with threshold `self` prints a message of severity `message`.
    ///
    /// Note this is not an ordering: an `Info` threshold hides `Debug` messages, and a `Debug`
    /// threshold hides `Info` messages.
    pub fn admits(&self, message: Severity) -> bool {
        use Severity::*;
        match (self, message) {
            (Info, Debug) => false,
            (Info, _) => true,
            (Debug, Info) => false,
            (Debug, _) => true,
            (Warn, Warn | Error | Fatal) => true,
            (Warn, _) => false,
            (Error, Error | Fatal) => true,
            (Error, _) => false,
            (Fatal, Fatal) => true,
            (Fatal, _) => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => Self::Error,
            Level::Warn => Self::Warn,
            Level::Info => Self::Info,
            Level::Debug | Level::Trace => Self::Debug,
        }
    }
}

/// A stdout logger
///
/// Lines look like `2024-05-01 10:00:00[ warn ]  [ client.rs:120 ] request timed out`.
#[derive(Debug)]
pub struct DefaultLogger {
    threshold: Mutex<Severity>,
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl DefaultLogger {
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold: Mutex::new(threshold),
        }
    }

    pub fn threshold(&self) -> Severity {
        *self.threshold.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_threshold(&self, threshold: Severity) {
        *self.threshold.lock().unwrap_or_else(PoisonError::into_inner) = threshold;
    }

    /// Prints one line if `severity` passes the threshold.
    ///
    /// This is the only way to emit a [`Severity::Fatal`] line; `log` has no such level.
    pub fn write(&self, severity: Severity, file: &str, line: u32, message: fmt::Arguments<'_>) {
        // Held for the whole write so concurrent lines don't interleave
        let threshold = self.threshold.lock().unwrap_or_else(PoisonError::into_inner);
        if !threshold.admits(severity) {
            return;
        }

        let now = jiff::Zoned::now().strftime("%Y-%m-%d %H:%M:%S").to_string();
        let line = format_line(&now, severity, file, line, message);
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }
}

impl Log for DefaultLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.threshold().admits(metadata.level().into())
    }

    fn log(&self, record: &Record) {
        let file = record.file().unwrap_or("<unknown>");
        let line = record.line().unwrap_or(0);

        match record.key_values().get(Key::from_str("error")) {
            Some(error) => self.write(
                record.level().into(),
                file,
                line,
                format_args!("{} ({error})", record.args()),
            ),
            None => self.write(record.level().into(), file, line, *record.args()),
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

fn format_line(
    timestamp: &str,
    severity: Severity,
    file: &str,
    line: u32,
    message: fmt::Arguments<'_>,
) -> String {
    let file = file.rsplit(['/', '\\']).next().unwrap_or(file);
    format!(
        "{timestamp}[ {} ]  [ {file}:{line} ] {message}",
        severity.label()
    )
}

/// Registers a [`DefaultLogger`] as the process-wide `log` logger
///
/// # Errors
///
/// Fails if a logger was already registered.
pub fn install(threshold: Severity) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(DefaultLogger::new(threshold)))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

/// Where a client's diagnostics go
///
/// Either the process-wide `log` logger, or one supplied for a single client.
#[derive(Clone, Default)]
pub(crate) struct Sink {
    custom: Option<Arc<dyn Log>>,
}

impl Sink {
    pub(crate) fn new(custom: Arc<dyn Log>) -> Self {
        Self {
            custom: Some(custom),
        }
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        target: &'static str,
        file: &'static str,
        line: u32,
        error: Option<&dyn fmt::Display>,
        args: fmt::Arguments<'_>,
    ) {
        let logger: &dyn Log = match &self.custom {
            Some(custom) => custom.as_ref(),
            None if level <= log::max_level() => log::logger(),
            None => return,
        };

        let error_kv;
        let mut builder = Record::builder();
        builder
            .args(args)
            .level(level)
            .target(target)
            .module_path_static(Some(target))
            .file_static(Some(file))
            .line(Some(line));

        if let Some(error) = &error {
            error_kv = ("error", Value::from_display(error));
            builder.key_values(&error_kv);
        }

        let record = builder.build();
        if logger.enabled(record.metadata()) {
            logger.log(&record);
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.custom {
            Some(_) => f.write_str("Sink(custom)"),
            None => f.write_str("Sink(global)"),
        }
    }
}

// Logs through a `Sink`, tagging the message with the call site.
//
// diag!(sink, Warn, "read failed");
// diag!(sink, Warn, error = err; "read failed");
macro_rules! diag {
    ($sink:expr, $level:ident, error = $err:expr; $($arg:tt)+) => {
        $sink.emit(
            log::Level::$level,
            module_path!(),
            file!(),
            line!(),
            Some(&$err as &dyn std::fmt::Display),
            format_args!($($arg)+),
        )
    };
    ($sink:expr, $level:ident, $($arg:tt)+) => {
        $sink.emit(
            log::Level::$level,
            module_path!(),
            file!(),
            line!(),
            None,
            format_args!($($arg)+),
        )
    };
}
pub(crate) use diag;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Captures every record it is handed
    #[derive(Default)]
    pub(crate) struct Capture {
        pub(crate) lines: Mutex<Vec<(Level, String)>>,
    }

    impl Log for Capture {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            let mut message = record.args().to_string();
            if let Some(error) = record.key_values().get(Key::from_str("error")) {
                message = format!("{message} ({error})");
            }
            self.lines.lock().unwrap().push((record.level(), message));
        }

        fn flush(&self) {}
    }

    #[test]
    fn gating_table() {
        use Severity::*;
        let all = [Info, Debug, Warn, Error, Fatal];
        let expected = [
            (Info, [true, false, true, true, true]),
            (Debug, [false, true, true, true, true]),
            (Warn, [false, false, true, true, true]),
            (Error, [false, false, false, true, true]),
            (Fatal, [false, false, false, false, true]),
        ];

        for (threshold, row) in expected {
            for (message, admitted) in all.iter().zip(row) {
                assert_eq!(
                    threshold.admits(*message),
                    admitted,
                    "threshold {threshold:?}, message {message:?}"
                );
            }
        }
    }

    #[test]
    fn trace_counts_as_debug() {
        assert_eq!(Severity::from(Level::Trace), Severity::Debug);
        let logger = DefaultLogger::new(Severity::Warn);
        assert!(!logger.enabled(&Metadata::builder().level(Level::Trace).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
    }

    #[test]
    fn threshold_can_change() {
        let logger = DefaultLogger::default();
        assert_eq!(logger.threshold(), Severity::Info);
        logger.set_threshold(Severity::Fatal);
        assert!(!logger.enabled(&Metadata::builder().level(Level::Error).build()));
    }

    #[test]
    fn line_format() {
        let line = format_line(
            "2024-05-01 10:00:00",
            Severity::Warn,
            "src/client.rs",
            42,
            format_args!("request {} timed out", 7),
        );
        assert_eq!(
            line,
            "2024-05-01 10:00:00[ warn ]  [ client.rs:42 ] request 7 timed out"
        );
    }

    #[test]
    fn custom_sink_receives_errors_as_key_values() {
        let capture = Arc::new(Capture::default());
        let sink = Sink::new(capture.clone());
        let err = std::io::Error::other("boom");

        diag!(sink, Warn, error = err; "write failed for {}", "request");
        diag!(sink, Debug, "nothing to see");

        let lines = capture.lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                (Level::Warn, "write failed for request (boom)".to_string()),
                (Level::Debug, "nothing to see".to_string()),
            ]
        );
    }
}
