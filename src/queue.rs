//! Queue items and their lifecycle.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{error::FramezipError, source::SourceVideo};

/// Processing status of a queued video.
///
/// Statuses only move forward: `Pending → Processing → {Done | Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    /// Waiting to be processed.
    Pending,
    /// Currently being processed.
    Processing,
    /// Processed successfully.
    Done,
    /// Processing failed; the item carries the message.
    Error,
}

impl ItemStatus {
    /// Returns `true` for `Done` and `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Error)
    }

    /// Whether an item may move from `self` to `next`.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Pending, ItemStatus::Processing)
                | (ItemStatus::Processing, ItemStatus::Done)
                | (ItemStatus::Processing, ItemStatus::Error)
        )
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Done => "done",
            ItemStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A video in the batch queue together with its status.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// The queued video.
    pub source: SourceVideo,
    status: ItemStatus,
    error: Option<String>,
}

impl QueueItem {
    /// A new `Pending` item.
    pub fn new(source: SourceVideo) -> Self {
        Self {
            source,
            status: ItemStatus::Pending,
            error: None,
        }
    }

    /// Current status.
    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Error message recorded when the item failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Move to `Processing`.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::InvalidTransition`] unless the item is `Pending`.
    pub fn start(&mut self) -> Result<(), FramezipError> {
        self.transition(ItemStatus::Processing)
    }

    /// Move to `Done`.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::InvalidTransition`] unless the item is
    /// `Processing`.
    pub fn complete(&mut self) -> Result<(), FramezipError> {
        self.transition(ItemStatus::Done)
    }

    /// Move to `Error`, recording `message`.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::InvalidTransition`] unless the item is
    /// `Processing`.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), FramezipError> {
        self.transition(ItemStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: ItemStatus) -> Result<(), FramezipError> {
        if !self.status.can_transition_to(next) {
            return Err(FramezipError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
