// Broadcast service - delivers direct messages one recipient at a time.
//
// Two policies live here:
// - a transient send failure is retried exactly once after `retry_delay`;
//   a refusal (recipient has DMs off) is never retried
// - every delivery attempt is followed by `send_interval`, so a broadcast to
//   a big guild is paced instead of tripping the platform rate limit

use super::announcement_models::{BroadcastConfig, BroadcastReport, Recipient};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient doesn't accept direct messages from us.
    #[error("Recipient refused direct messages")]
    Refused,

    #[error("Transient send failure: {0}")]
    Transient(String),
}

/// Sends one direct message.
#[async_trait]
pub trait DirectMessenger: Send + Sync {
    async fn send_direct(&self, user_id: u64, content: &str) -> Result<(), DeliveryError>;
}

pub struct BroadcastService {
    config: BroadcastConfig,
}

impl BroadcastService {
    pub fn new(config: BroadcastConfig) -> Self {
        Self { config }
    }

    /// Deliver a single message, retrying once on a transient failure.
    pub async fn deliver<M: DirectMessenger>(
        &self,
        messenger: &M,
        user_id: u64,
        content: &str,
    ) -> Result<(), DeliveryError> {
        match messenger.send_direct(user_id, content).await {
            Err(DeliveryError::Transient(reason)) => {
                tracing::debug!(user_id, "Transient DM failure, retrying once: {}", reason);
                tokio::time::sleep(self.config.retry_delay).await;
                messenger.send_direct(user_id, content).await
            }
            other => other,
        }
    }

    /// Deliver `content` to every non-bot recipient, in order.
    pub async fn broadcast<M: DirectMessenger>(
        &self,
        messenger: &M,
        recipients: &[Recipient],
        content: &str,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for recipient in recipients {
            if recipient.is_bot {
                report.skipped_bots += 1;
                continue;
            }

            match self.deliver(messenger, recipient.user_id, content).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::debug!(user_id = recipient.user_id, "Announcement not delivered: {}", e);
                    report.failed += 1;
                }
            }

            tokio::time::sleep(self.config.send_interval).await;
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            skipped_bots = report.skipped_bots,
            "Announcement broadcast finished"
        );
        report
    }
}

impl Default for BroadcastService {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use tokio::time::{Duration, Instant};

    /// Scripted messenger: each user gets a queue of results to hand out.
    struct ScriptedMessenger {
        scripts: DashMap<u64, Vec<Result<(), DeliveryError>>>,
        attempts: DashMap<u64, u32>,
    }

    impl ScriptedMessenger {
        fn new() -> Self {
            Self {
                scripts: DashMap::new(),
                attempts: DashMap::new(),
            }
        }

        fn script(&self, user_id: u64, results: Vec<Result<(), DeliveryError>>) {
            self.scripts.insert(user_id, results);
        }

        fn attempts(&self, user_id: u64) -> u32 {
            self.attempts.get(&user_id).map(|a| *a).unwrap_or(0)
        }
    }

    #[async_trait]
    impl DirectMessenger for ScriptedMessenger {
        async fn send_direct(&self, user_id: u64, _content: &str) -> Result<(), DeliveryError> {
            *self.attempts.entry(user_id).or_insert(0) += 1;
            match self.scripts.get_mut(&user_id) {
                Some(mut script) if !script.is_empty() => script.remove(0),
                _ => Ok(()),
            }
        }
    }

    fn humans(ids: &[u64]) -> Vec<Recipient> {
        ids.iter()
            .map(|&user_id| Recipient {
                user_id,
                is_bot: false,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_sends_succeed() {
        let service = BroadcastService::default();
        let messenger = ScriptedMessenger::new();
        let mut recipients = humans(&[1, 2, 3, 4]);
        recipients.push(Recipient {
            user_id: 99,
            is_bot: true,
        });

        let report = service.broadcast(&messenger, &recipients, "hello").await;

        assert_eq!(
            report,
            BroadcastReport {
                sent: 4,
                failed: 0,
                skipped_bots: 1
            }
        );
        assert_eq!(messenger.attempts(99), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusals_count_as_failed_without_retry() {
        let service = BroadcastService::default();
        let messenger = ScriptedMessenger::new();
        messenger.script(2, vec![Err(DeliveryError::Refused)]);
        messenger.script(4, vec![Err(DeliveryError::Refused)]);

        let report = service
            .broadcast(&messenger, &humans(&[1, 2, 3, 4, 5]), "hello")
            .await;

        assert_eq!(report.sent, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(messenger.attempts(2), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_once() {
        let service = BroadcastService::default();
        let messenger = ScriptedMessenger::new();
        messenger.script(1, vec![Err(DeliveryError::Transient("502".to_string()))]);
        messenger.script(
            2,
            vec![
                Err(DeliveryError::Transient("502".to_string())),
                Err(DeliveryError::Transient("502".to_string())),
            ],
        );

        let report = service.broadcast(&messenger, &humans(&[1, 2]), "hello").await;

        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(messenger.attempts(1), 2);
        assert_eq!(messenger.attempts(2), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_is_throttled() {
        let service = BroadcastService::default();
        let messenger = ScriptedMessenger::new();
        let started = Instant::now();

        service
            .broadcast(&messenger, &humans(&[1, 2, 3, 4]), "hello")
            .await;

        assert!(Instant::now() - started >= Duration::from_millis(4 * 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_waits_before_retry() {
        let service = BroadcastService::default();
        let messenger = ScriptedMessenger::new();
        messenger.script(1, vec![Err(DeliveryError::Transient("timeout".to_string()))]);
        let started = Instant::now();

        assert_eq!(service.deliver(&messenger, 1, "hi").await, Ok(()));
        assert!(Instant::now() - started >= Duration::from_secs(1));
    }
}
