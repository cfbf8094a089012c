//! Cancellation tokens and abort signals
//!
//! A [`CancelToken`] is the caller's handle: cancelling it rejects every
//! request it was attached to with the recorded [`Cancel`] reason. An
//! [`AbortSignal`] is the adapter's handle towards the underlying fetch client,
//! created fresh for each request.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Reason a request was cancelled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cancel {
    message: Option<String>,
}

impl Cancel {
    /// Create a cancellation reason
    pub fn new(message: Option<&str>) -> Self {
        Self {
            message: message.map(str::to_string),
        }
    }

    /// Message supplied when cancelling
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "Cancel: {}", message),
            None => write!(f, "Cancel"),
        }
    }
}

impl std::error::Error for Cancel {}

/// Caller-held cancellation handle
///
/// Clones observe the same cancellation. Create one with
/// [`CancelToken::source`].
#[derive(Debug, Clone)]
pub struct CancelToken {
    token: CancellationToken,
    reason: Arc<OnceLock<Cancel>>,
}

impl CancelToken {
    /// Create a new token together with the source that fires it
    pub fn source() -> CancelTokenSource {
        CancelTokenSource {
            token: CancelToken {
                token: CancellationToken::new(),
                reason: Arc::new(OnceLock::new()),
            },
        }
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancellation reason, once cancelled
    pub fn reason(&self) -> Option<&Cancel> {
        self.reason.get()
    }

    /// Fail with the cancellation reason if cancellation was requested
    pub fn throw_if_requested(&self) -> Result<(), Cancel> {
        match self.reason.get() {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    /// Wait until cancellation is requested and return the reason
    pub async fn cancelled(&self) -> Cancel {
        self.token.cancelled().await;
        self.reason.get().cloned().unwrap_or_default()
    }
}

/// Owner side of a [`CancelToken`]
#[derive(Debug, Clone)]
pub struct CancelTokenSource {
    token: CancelToken,
}

impl CancelTokenSource {
    /// Token to attach to requests
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Request cancellation
    ///
    /// Only the first call records a reason; later calls are no-ops.
    pub fn cancel(&self, message: Option<&str>) {
        if self.token.reason.set(Cancel::new(message)).is_ok() {
            tracing::debug!(?message, "Cancellation requested");
            self.token.token.cancel();
        }
    }
}

/// Signal observed by the underlying client to abort an in-flight request
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Whether the request has been aborted
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the request is aborted
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

/// Owner side of an [`AbortSignal`]
#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Create a controller with a fresh signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal to hand to the underlying client
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort the request
    pub fn abort(&self) {
        self.signal.token.cancel();
    }
}
