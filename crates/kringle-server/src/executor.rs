//! Action execution.
//!
//! Carries out the [`EventAction`]s produced by the event manager:
//! persistence goes to [`Storage`], notifications to a [`Notifier`], log
//! actions to `tracing`. Delivery mechanics (email, SMS) live behind the
//! `Notifier` trait and are not part of this crate.

use crate::{
    error::ServerError,
    event_manager::{EventAction, EventId, LogLevel, NotificationKind, ParticipantId},
    storage::Storage,
};

/// Policy for handling notification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// Log failure and continue to next recipient.
    #[default]
    BestEffort,

    /// Abort execution on the first failed notification.
    Required,
}

/// Error reported by a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification to participant {recipient} failed: {reason}")]
pub struct NotifyError {
    /// Recipient that could not be notified.
    pub recipient: ParticipantId,
    /// Failure description.
    pub reason: String,
}

/// Notification sink.
pub trait Notifier {
    /// Tell `recipient` about `kind` for `event_id`.
    fn notify(
        &self,
        event_id: EventId,
        kind: NotificationKind,
        recipient: ParticipantId,
    ) -> Result<(), NotifyError>;
}

/// Notifier that only records notifications in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        event_id: EventId,
        kind: NotificationKind,
        recipient: ParticipantId,
    ) -> Result<(), NotifyError> {
        tracing::info!("notify participant {} of {:?} for event {:032x}", recipient, kind, event_id);
        Ok(())
    }
}

/// Summary of one [`ActionExecutor::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    /// Assignment records written.
    pub persisted: usize,
    /// Notifications delivered.
    pub notified: usize,
    /// Notifications that failed under `NotifyPolicy::BestEffort`.
    pub failed_notifications: usize,
}

/// Applies event actions to storage and notifier.
#[derive(Debug)]
pub struct ActionExecutor<'a, S, N> {
    storage: &'a S,
    notifier: &'a N,
    policy: NotifyPolicy,
}

impl<'a, S, N> ActionExecutor<'a, S, N>
where
    S: Storage,
    N: Notifier,
{
    /// Create an executor.
    pub fn new(storage: &'a S, notifier: &'a N, policy: NotifyPolicy) -> Self {
        Self { storage, notifier, policy }
    }

    /// Execute actions in order.
    ///
    /// # Errors
    ///
    /// - `ServerError::Storage` if persistence fails (later actions are skipped)
    /// - `ServerError::Notify` under `NotifyPolicy::Required`
    pub fn execute(&self, actions: Vec<EventAction>) -> Result<ExecutionReport, ServerError> {
        let mut report = ExecutionReport::default();

        for action in actions {
            match action {
                EventAction::PersistAssignments { event_id, records } => {
                    self.storage.store_assignments(event_id, &records)?;
                    report.persisted += records.len();
                },

                EventAction::Notify { event_id, kind, recipients } => {
                    for recipient in recipients {
                        match self.notifier.notify(event_id, kind, recipient) {
                            Ok(()) => report.notified += 1,
                            Err(e) => match self.policy {
                                NotifyPolicy::BestEffort => {
                                    tracing::warn!("{}", e);
                                    report.failed_notifications += 1;
                                },
                                NotifyPolicy::Required => return Err(e.into()),
                            },
                        }
                    }
                },

                EventAction::Log { level, message } => match level {
                    LogLevel::Debug => tracing::debug!("{}", message),
                    LogLevel::Info => tracing::info!("{}", message),
                    LogLevel::Warn => tracing::warn!("{}", message),
                },
            }
        }

        Ok(report)
    }
}
