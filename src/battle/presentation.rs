//! The seam between phases and whatever renders them.
//!
//! A phase that needs the outside world to catch up (an animation, a
//! confirmation) hands a [`CompletionToken`] to the [`Presentation`] and awaits
//! it. Nothing else in the battle moves until the completion resolves.

use async_trait::async_trait;
use schema::{BattlerIndex, FieldPosition, Move, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationCue {
    MoveAnimation { battler: BattlerIndex, move_: Move },
    Faint { battler: BattlerIndex },
    SwitchIn { battler: BattlerIndex },
    FieldPosition { side: Side, position: FieldPosition },
}

impl fmt::Display for PresentationCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentationCue::MoveAnimation { battler, move_ } => {
                write!(f, "{} animation for {}", move_, battler)
            }
            PresentationCue::Faint { battler } => write!(f, "faint of {}", battler),
            PresentationCue::SwitchIn { battler } => write!(f, "switch-in at {}", battler),
            PresentationCue::FieldPosition { side, position } => {
                write!(f, "{} side moving to {}", side, position)
            }
        }
    }
}

/// The named signal a suspended phase is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionToken {
    pub id: u64,
    pub cue: PresentationCue,
    /// How long the cue is expected to take.
    pub duration: Duration,
    /// Number of battle events emitted before the phase suspended.
    pub events_flushed: usize,
}

impl fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "completion #{} ({})", self.id, self.cue)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion #{0} was dropped before it fired")]
    Dropped(u64),

    #[error("presentation layer has shut down")]
    Closed,
}

#[async_trait]
pub trait Presentation: Send + Sync {
    /// Resolves once the cue behind `token` has finished.
    async fn await_completion(&self, token: &CompletionToken) -> Result<(), CompletionError>;
}

/// Headless: every cue completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPresentation;

#[async_trait]
impl Presentation for InstantPresentation {
    async fn await_completion(&self, _token: &CompletionToken) -> Result<(), CompletionError> {
        Ok(())
    }
}

/// Completes each cue after its duration has elapsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedPresentation;

#[async_trait]
impl Presentation for TimedPresentation {
    async fn await_completion(&self, token: &CompletionToken) -> Result<(), CompletionError> {
        tokio::time::sleep(token.duration).await;
        Ok(())
    }
}

/// A cue waiting for the host to report completion.
#[derive(Debug)]
pub struct PendingCompletion {
    pub token: CompletionToken,
    reply: oneshot::Sender<()>,
}

impl PendingCompletion {
    /// Fire the completion. Dropping a `PendingCompletion` instead stalls the
    /// phase that is waiting on it.
    pub fn complete(self) {
        // The waiting phase may already have timed out.
        let _ = self.reply.send(());
    }
}

/// Host-driven presentation: every cue is forwarded over a channel and the
/// phase resumes when the host calls [`PendingCompletion::complete`].
#[derive(Debug, Clone)]
pub struct ChannelPresentation {
    tx: mpsc::UnboundedSender<PendingCompletion>,
}

impl ChannelPresentation {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Presentation for ChannelPresentation {
    async fn await_completion(&self, token: &CompletionToken) -> Result<(), CompletionError> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(PendingCompletion {
                token: token.clone(),
                reply,
            })
            .map_err(|_| CompletionError::Closed)?;
        debug!(%token, "waiting on host completion");
        done.await.map_err(|_| CompletionError::Dropped(token.id))
    }
}
