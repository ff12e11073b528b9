//! Log channels for sent requests and received responses.
//!
//! Each direction of an exchange is written to its own channel so that operators can enable them
//! independently. [`TracingChannel`] is the default: it emits `tracing` events on the
//! [`SENT_TARGET`] and [`RECEIVED_TARGET`] targets, which subscribers can filter like any other
//! target (for example `RUST_LOG=rest_tracing::received=debug`).

use tracing::Level;

/// Target of the events describing sent requests.
pub const SENT_TARGET: &str = "rest_tracing::sent";
/// Target of the events describing received responses.
pub const RECEIVED_TARGET: &str = "rest_tracing::received";

/// A destination for rendered exchange log lines.
///
/// Implementations are shared by every clone of the logging service and called concurrently, so
/// they must be safe for unsynchronized reads.
///
/// # Examples
///
/// ```rust
/// use rest_tracing::LogChannel;
/// use tracing::Level;
///
/// #[derive(Debug)]
/// struct Stdout;
///
/// impl LogChannel for Stdout {
///     fn is_enabled(&self, level: Level) -> bool {
///         level <= Level::INFO
///     }
///
///     fn log(&self, level: Level, message: &str) {
///         println!("{level} {message}");
///     }
/// }
/// ```
pub trait LogChannel: Send + Sync + 'static {
    /// Whether a line at `level` would be recorded.
    fn is_enabled(&self, level: Level) -> bool;

    /// Record one line at `level`.
    fn log(&self, level: Level, message: &str);
}

/// [`LogChannel`] backed by the current `tracing` subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingChannel {
    /// Events on [`SENT_TARGET`].
    Sent,
    /// Events on [`RECEIVED_TARGET`].
    Received,
}

// `tracing` needs the target and level as constants at each callsite.
macro_rules! enabled_at {
    ($target:expr, $level:expr) => {
        if $level == Level::ERROR {
            tracing::enabled!(target: $target, Level::ERROR)
        } else if $level == Level::WARN {
            tracing::enabled!(target: $target, Level::WARN)
        } else if $level == Level::INFO {
            tracing::enabled!(target: $target, Level::INFO)
        } else if $level == Level::DEBUG {
            tracing::enabled!(target: $target, Level::DEBUG)
        } else {
            tracing::enabled!(target: $target, Level::TRACE)
        }
    };
}

macro_rules! event_at {
    ($target:expr, $level:expr, $message:expr) => {
        if $level == Level::ERROR {
            tracing::event!(target: $target, Level::ERROR, "{}", $message)
        } else if $level == Level::WARN {
            tracing::event!(target: $target, Level::WARN, "{}", $message)
        } else if $level == Level::INFO {
            tracing::event!(target: $target, Level::INFO, "{}", $message)
        } else if $level == Level::DEBUG {
            tracing::event!(target: $target, Level::DEBUG, "{}", $message)
        } else {
            tracing::event!(target: $target, Level::TRACE, "{}", $message)
        }
    };
}

impl LogChannel for TracingChannel {
    fn is_enabled(&self, level: Level) -> bool {
        match self {
            TracingChannel::Sent => enabled_at!(SENT_TARGET, level),
            TracingChannel::Received => enabled_at!(RECEIVED_TARGET, level),
        }
    }

    fn log(&self, level: Level, message: &str) {
        match self {
            TracingChannel::Sent => event_at!(SENT_TARGET, level, message),
            TracingChannel::Received => event_at!(RECEIVED_TARGET, level, message),
        }
    }
}
