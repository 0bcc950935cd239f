//! Messages the market pushes towards whatever front end is attached.

use log::{info, warn};
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Work started; not terminal.
    Progress { message: String },
    /// Terminal result of an operation or query.
    Result { status: Status, message: String },
    /// Terminal result of a cancellation request.
    CancelResult { status: Status, message: String },
}

impl Notice {
    pub fn progress(message: impl Into<String>) -> Self {
        Notice::Progress { message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::Result {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Notice::Result {
            status: Status::Fail,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notice::Progress { .. })
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

/// Writes every notice to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Progress { message } => info!("⏳ [MARKET] {}", message),
            Notice::Result { status: Status::Success, message }
            | Notice::CancelResult { status: Status::Success, message } => info!("✅ [MARKET] {}", message),
            Notice::Result { status: Status::Fail, message }
            | Notice::CancelResult { status: Status::Fail, message } => warn!("❌ [MARKET] {}", message),
        }
    }
}

/// Forwards notices over an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // receiver gone means nobody is listening anymore
        let _ = self.tx.send(notice);
    }
}
