//! Live-status sinks for short human-readable collector messages.

use tokio::sync::mpsc;
use tracing::info;

/// Destination for live-status messages.
///
/// Messages are advisory text; nothing in the collector reads them back.
/// Several collection units may share one sink. Messages from one unit keep
/// their order; messages from different units interleave freely.
#[derive(Debug, Clone, Default)]
pub enum StatusSink {
    /// Send each message through an unbounded channel.
    ///
    /// Use `StatusSink::channel()` to create this variant and get the receiver.
    Channel(mpsc::UnboundedSender<String>),

    /// Log each message at `info` level through `tracing`.
    Log,

    /// Drop every message.
    #[default]
    Discard,
}

impl StatusSink {
    /// Create a channel sink and return both the sink and the receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statwatch_collector::StatusSink;
    ///
    /// let (sink, mut rx) = StatusSink::channel();
    /// sink.emit("[rs0] collection begins");
    /// assert_eq!(rx.try_recv().unwrap(), "[rs0] collection begins");
    /// ```
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (StatusSink::Channel(tx), rx)
    }

    /// Emit one message.
    pub fn emit(&self, message: impl Into<String>) {
        match self {
            StatusSink::Channel(tx) => {
                // Best effort: a dropped receiver just means nobody is listening
                let _ = tx.send(message.into());
            }
            StatusSink::Log => {
                let message = message.into();
                info!(target: "statwatch::status", "{}", message);
            }
            StatusSink::Discard => {}
        }
    }
}
