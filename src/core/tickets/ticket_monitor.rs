// Ticket close monitor - asks idle ticket channels whether they can be closed,
// waits for a "yes" or a deadline, then deletes the channel.
//
// Per channel the flow is a small state machine:
//
//   AwaitingReply -> Confirmed | TimedOut -> Deleting -> Closed
//
// with Cancelled reachable from any state when the channel is deleted
// externally. At most one watch exists per channel; the `watches` table is
// the single source of truth for that.
//
// NO Discord dependencies here - channel operations go through `TicketChannels`.

use super::ticket_models::{
    TicketConfig, TicketWatch, WatchOutcome, WatchState, CLOSURE_PROMPT, TIMEOUT_NOTICE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Channel no longer exists")]
    ChannelGone,

    #[error("Platform error: {0}")]
    Platform(String),
}

// ============================================================================
// PORT
// ============================================================================

/// Channel operations the monitor needs from the chat platform.
#[async_trait]
pub trait TicketChannels: Send + Sync {
    /// Post a message in the channel, returning its id.
    async fn send_notice(&self, channel_id: u64, content: &str) -> Result<u64, TicketError>;

    async fn delete_channel(&self, channel_id: u64) -> Result<(), TicketError>;

    /// Timestamp of the newest message, `None` for an empty channel.
    async fn last_message_at(&self, channel_id: u64)
        -> Result<Option<DateTime<Utc>>, TicketError>;

    /// Text channels whose parent is one of `categories`.
    async fn channels_in_categories(&self, categories: &[u64]) -> Result<Vec<u64>, TicketError>;
}

/// Wakes a watch that is blocked in `AwaitingReply`.
#[derive(Debug)]
enum WatchSignal {
    Affirmed,
    Cancelled,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct TicketCloseMonitor<C: TicketChannels> {
    channels: C,
    config: TicketConfig,
    // Channel ID -> the one active watch on it
    watches: DashMap<u64, TicketWatch>,
    // Channel ID -> pending reply waiter; only present while AwaitingReply
    waiters: DashMap<u64, oneshot::Sender<WatchSignal>>,
}

impl<C: TicketChannels> TicketCloseMonitor<C> {
    pub fn new(channels: C, config: TicketConfig) -> Self {
        Self {
            channels,
            config,
            watches: DashMap::new(),
            waiters: DashMap::new(),
        }
    }

    pub fn config(&self) -> &TicketConfig {
        &self.config
    }

    pub fn is_watching(&self, channel_id: u64) -> bool {
        self.watches.contains_key(&channel_id)
    }

    /// Snapshot of the watch on a channel, if any.
    pub fn active_watch(&self, channel_id: u64) -> Option<TicketWatch> {
        self.watches.get(&channel_id).map(|watch| watch.clone())
    }

    pub fn active_watch_count(&self) -> usize {
        self.watches.len()
    }

    /// A channel with no messages at all counts as idle.
    pub fn is_idle(&self, last_message_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_message_at {
            None => true,
            Some(last) => now.signed_duration_since(last) >= to_chrono(self.config.idle_threshold),
        }
    }

    /// Ticket channels that have gone quiet and are not already watched.
    ///
    /// A lookup failure on one channel is logged and skipped so a single
    /// broken channel doesn't stall the whole sweep.
    pub async fn find_idle_channels(&self, now: DateTime<Utc>) -> Result<Vec<u64>, TicketError> {
        if self.config.categories.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self
            .channels
            .channels_in_categories(&self.config.categories)
            .await?;

        let mut idle = Vec::new();
        for channel_id in candidates {
            if self.is_watching(channel_id) {
                continue;
            }

            match self.channels.last_message_at(channel_id).await {
                Ok(last) if self.is_idle(last, now) => idle.push(channel_id),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(channel_id, "Failed to read last ticket message: {}", e);
                }
            }
        }

        Ok(idle)
    }

    /// Run one full watch on a channel: prompt, wait, notice, grace, delete.
    ///
    /// Returns `AlreadyWatching` without posting anything if another watch
    /// owns the channel. The timeout branch is terminal: once the closing
    /// notice is out, the channel is deleted; it never re-arms the wait.
    pub async fn watch_channel(&self, channel_id: u64) -> Result<WatchOutcome, TicketError> {
        let (reply_tx, mut reply_rx) = oneshot::channel();

        // Reserve the slot before the first await so concurrent callers
        // can't both post a prompt.
        match self.watches.entry(channel_id) {
            Entry::Occupied(_) => {
                tracing::debug!(channel_id, "Ticket already watched, not prompting again");
                return Ok(WatchOutcome::AlreadyWatching);
            }
            Entry::Vacant(slot) => {
                slot.insert(TicketWatch {
                    channel_id,
                    prompt_message_id: None,
                    deadline: Utc::now()
                        .checked_add_signed(to_chrono(self.config.reply_window))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                    state: WatchState::AwaitingReply,
                });
            }
        }
        self.waiters.insert(channel_id, reply_tx);

        match self.channels.send_notice(channel_id, CLOSURE_PROMPT).await {
            Ok(message_id) => {
                if let Some(mut watch) = self.watches.get_mut(&channel_id) {
                    watch.prompt_message_id = Some(message_id);
                }
                tracing::info!(channel_id, "Posted ticket closure prompt");
            }
            Err(TicketError::ChannelGone) => {
                self.finish(channel_id);
                return Ok(WatchOutcome::Cancelled);
            }
            Err(e) => {
                self.finish(channel_id);
                return Err(e);
            }
        }

        let signal = match tokio::time::timeout(self.config.reply_window, &mut reply_rx).await {
            Ok(Ok(signal)) => Some(signal),
            Ok(Err(_)) => Some(WatchSignal::Cancelled),
            Err(_) => {
                // Unregister first; a reply that slipped in just before is still honored.
                self.waiters.remove(&channel_id);
                reply_rx.try_recv().ok()
            }
        };

        let (outcome, state, notice) = match signal {
            Some(WatchSignal::Affirmed) => (
                WatchOutcome::Confirmed,
                WatchState::Confirmed,
                self.config.confirm_notice(),
            ),
            Some(WatchSignal::Cancelled) => {
                self.finish(channel_id);
                return Ok(WatchOutcome::Cancelled);
            }
            None => (
                WatchOutcome::TimedOut,
                WatchState::TimedOut,
                TIMEOUT_NOTICE.to_string(),
            ),
        };

        if !self.transition(channel_id, state) {
            self.finish(channel_id);
            return Ok(WatchOutcome::Cancelled);
        }

        match self.channels.send_notice(channel_id, &notice).await {
            Ok(_) => {}
            Err(TicketError::ChannelGone) => {
                self.finish(channel_id);
                return Ok(WatchOutcome::Cancelled);
            }
            Err(e) => {
                tracing::warn!(channel_id, "Failed to post closing notice: {}", e);
            }
        }

        tokio::time::sleep(self.config.grace_delay).await;

        // The channel may have been deleted while we slept.
        if !self.transition(channel_id, WatchState::Deleting) {
            self.finish(channel_id);
            return Ok(WatchOutcome::Cancelled);
        }

        let deleted = self.channels.delete_channel(channel_id).await;
        match deleted {
            Ok(()) => {
                self.transition(channel_id, WatchState::Closed);
                self.finish(channel_id);
                tracing::info!(channel_id, ?outcome, "Ticket channel closed");
                Ok(outcome)
            }
            Err(TicketError::ChannelGone) => {
                self.finish(channel_id);
                Ok(WatchOutcome::Cancelled)
            }
            Err(e) => {
                self.finish(channel_id);
                Err(e)
            }
        }
    }

    /// Feed a new channel message to the watch on that channel.
    ///
    /// Returns `true` if the message confirmed a pending closure. Messages
    /// in unwatched channels, and non-affirmative ones, change nothing.
    pub fn on_message(&self, channel_id: u64, content: &str) -> bool {
        if !self.waiters.contains_key(&channel_id) || !self.config.is_affirmative(content) {
            return false;
        }

        match self.waiters.remove(&channel_id) {
            Some((_, waiter)) => waiter.send(WatchSignal::Affirmed).is_ok(),
            None => false,
        }
    }

    /// The channel was deleted by someone else. Returns `true` if it was watched.
    pub fn on_channel_deleted(&self, channel_id: u64) -> bool {
        let watched = match self.watches.get_mut(&channel_id) {
            Some(mut watch) => {
                watch.state = WatchState::Cancelled;
                true
            }
            None => false,
        };

        if let Some((_, waiter)) = self.waiters.remove(&channel_id) {
            let _ = waiter.send(WatchSignal::Cancelled);
        }

        if watched {
            tracing::info!(channel_id, "Watched ticket channel was deleted externally");
        }
        watched
    }

    /// Move a watch to `state` unless it was cancelled. Returns whether it moved.
    fn transition(&self, channel_id: u64, state: WatchState) -> bool {
        match self.watches.get_mut(&channel_id) {
            Some(mut watch) if watch.state != WatchState::Cancelled => {
                watch.state = state;
                true
            }
            _ => false,
        }
    }

    fn finish(&self, channel_id: u64) {
        self.waiters.remove(&channel_id);
        self.watches.remove(&channel_id);
    }
}

impl<C: TicketChannels + 'static> TicketCloseMonitor<C> {
    /// Start a watch task for every idle ticket channel.
    ///
    /// Returns how many watches were spawned. Each task logs its own outcome.
    pub async fn sweep(self: Arc<Self>) -> Result<usize, TicketError> {
        let idle = self.find_idle_channels(Utc::now()).await?;
        let started = idle.len();

        for channel_id in idle {
            let monitor = Arc::clone(&self);
            tokio::spawn(async move {
                match monitor.watch_channel(channel_id).await {
                    Ok(outcome) => {
                        tracing::debug!(channel_id, ?outcome, "Ticket watch finished");
                    }
                    Err(e) => {
                        tracing::error!(channel_id, "Ticket watch failed: {}", e);
                    }
                }
            });
        }

        Ok(started)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Notice(u64, String),
        Delete(u64),
    }

    /// Records every channel action with the (paused) tokio clock.
    struct MockChannels {
        log: Mutex<Vec<(Action, Instant)>>,
        last_messages: DashMap<u64, Option<DateTime<Utc>>>,
        gone: DashSet<u64>,
        next_message_id: AtomicU64,
    }

    impl MockChannels {
        fn new() -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                last_messages: DashMap::new(),
                gone: DashSet::new(),
                next_message_id: AtomicU64::new(1000),
            }
        }

        fn actions(&self) -> Vec<Action> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .map(|(action, _)| action.clone())
                .collect()
        }

        fn timed_actions(&self) -> Vec<(Action, Instant)> {
            self.log.lock().unwrap().clone()
        }

        fn prompt_count(&self, channel_id: u64) -> usize {
            self.actions()
                .iter()
                .filter(|a| **a == Action::Notice(channel_id, CLOSURE_PROMPT.to_string()))
                .count()
        }
    }

    #[async_trait]
    impl TicketChannels for MockChannels {
        async fn send_notice(&self, channel_id: u64, content: &str) -> Result<u64, TicketError> {
            if self.gone.contains(&channel_id) {
                return Err(TicketError::ChannelGone);
            }
            self.log.lock().unwrap().push((
                Action::Notice(channel_id, content.to_string()),
                Instant::now(),
            ));
            Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn delete_channel(&self, channel_id: u64) -> Result<(), TicketError> {
            if self.gone.contains(&channel_id) {
                return Err(TicketError::ChannelGone);
            }
            self.log
                .lock()
                .unwrap()
                .push((Action::Delete(channel_id), Instant::now()));
            self.gone.insert(channel_id);
            Ok(())
        }

        async fn last_message_at(
            &self,
            channel_id: u64,
        ) -> Result<Option<DateTime<Utc>>, TicketError> {
            self.last_messages
                .get(&channel_id)
                .map(|last| *last)
                .ok_or(TicketError::ChannelGone)
        }

        async fn channels_in_categories(
            &self,
            _categories: &[u64],
        ) -> Result<Vec<u64>, TicketError> {
            let mut channels: Vec<u64> = self.last_messages.iter().map(|e| *e.key()).collect();
            channels.sort();
            Ok(channels)
        }
    }

    fn monitor() -> Arc<TicketCloseMonitor<MockChannels>> {
        let config = TicketConfig {
            categories: vec![1],
            ..Default::default()
        };
        Arc::new(TicketCloseMonitor::new(MockChannels::new(), config))
    }

    fn spawn_watch(
        monitor: &Arc<TicketCloseMonitor<MockChannels>>,
        channel_id: u64,
    ) -> tokio::task::JoinHandle<Result<WatchOutcome, TicketError>> {
        let monitor = Arc::clone(monitor);
        tokio::spawn(async move { monitor.watch_channel(channel_id).await })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[test]
    fn test_idle_threshold() {
        let monitor = monitor();
        let now = Utc::now();

        assert!(monitor.is_idle(None, now));
        assert!(monitor.is_idle(Some(now - chrono::Duration::days(2)), now));
        assert!(monitor.is_idle(Some(now - chrono::Duration::days(1)), now));
        assert!(!monitor.is_idle(Some(now - chrono::Duration::hours(23)), now));
    }

    #[tokio::test]
    async fn test_find_idle_channels() {
        let monitor = monitor();
        let now = Utc::now();
        monitor
            .channels
            .last_messages
            .insert(10, Some(now - chrono::Duration::days(3)));
        monitor
            .channels
            .last_messages
            .insert(11, Some(now - chrono::Duration::minutes(5)));
        monitor.channels.last_messages.insert(12, None);

        let idle = monitor.find_idle_channels(now).await.unwrap();

        assert_eq!(idle, vec![10, 12]);
    }

    #[tokio::test]
    async fn test_no_categories_means_no_tickets() {
        let monitor = Arc::new(TicketCloseMonitor::new(
            MockChannels::new(),
            TicketConfig::default(),
        ));
        monitor.channels.last_messages.insert(10, None);

        assert!(monitor.find_idle_channels(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_emits_prompt_notice_delete() {
        let monitor = monitor();
        let grace = monitor.config().grace_delay;
        let window = monitor.config().reply_window;
        let started = Instant::now();

        let outcome = monitor.watch_channel(7).await.unwrap();

        assert_eq!(outcome, WatchOutcome::TimedOut);
        let timed = monitor.channels.timed_actions();
        let actions: Vec<Action> = timed.iter().map(|(a, _)| a.clone()).collect();
        assert_eq!(
            actions,
            vec![
                Action::Notice(7, CLOSURE_PROMPT.to_string()),
                Action::Notice(7, TIMEOUT_NOTICE.to_string()),
                Action::Delete(7),
            ]
        );
        assert!(timed[1].1 - started >= window);
        assert!(timed[2].1 - timed[1].1 >= grace);
        assert!(!monitor.is_watching(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_affirmative_reply_confirms() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        let watch = monitor.active_watch(7).unwrap();
        assert_eq!(watch.state, WatchState::AwaitingReply);
        assert!(watch.prompt_message_id.is_some());

        // Other channels and non-matching replies don't count.
        assert!(!monitor.on_message(8, "yes"));
        assert!(!monitor.on_message(7, "not yet, still waiting on a fix"));
        assert!(monitor.on_message(7, "Yes, thanks!"));

        let outcome = handle.await.unwrap().unwrap();

        assert_eq!(outcome, WatchOutcome::Confirmed);
        assert_eq!(
            monitor.channels.actions(),
            vec![
                Action::Notice(7, CLOSURE_PROMPT.to_string()),
                Action::Notice(7, "Ticket will be closed in 5 minutes.".to_string()),
                Action::Delete(7),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_watch_is_rejected() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        let second = monitor.watch_channel(7).await.unwrap();

        assert_eq!(second, WatchOutcome::AlreadyWatching);
        assert_eq!(monitor.channels.prompt_count(7), 1);

        assert_eq!(handle.await.unwrap().unwrap(), WatchOutcome::TimedOut);
        assert_eq!(monitor.channels.prompt_count(7), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_delete_while_waiting() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        monitor.channels.gone.insert(7);
        assert!(monitor.on_channel_deleted(7));

        assert_eq!(handle.await.unwrap().unwrap(), WatchOutcome::Cancelled);
        assert!(!monitor.channels.actions().contains(&Action::Delete(7)));
        assert!(!monitor.is_watching(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_delete_during_grace() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        assert!(monitor.on_message(7, "sure"));
        settle().await;
        assert_eq!(monitor.active_watch(7).unwrap().state, WatchState::Confirmed);

        assert!(monitor.on_channel_deleted(7));

        assert_eq!(handle.await.unwrap().unwrap(), WatchOutcome::Cancelled);
        assert!(!monitor.channels.actions().contains(&Action::Delete(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_vanishing_during_grace_cancels_delete() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        assert!(monitor.on_message(7, "sure"));
        settle().await;
        assert_eq!(monitor.active_watch(7).unwrap().state, WatchState::Confirmed);

        // Gone before the grace delay ends, and no delete event arrives.
        monitor.channels.gone.insert(7);

        assert_eq!(handle.await.unwrap().unwrap(), WatchOutcome::Cancelled);
        assert_eq!(
            monitor.channels.actions(),
            vec![
                Action::Notice(7, CLOSURE_PROMPT.to_string()),
                Action::Notice(7, "Ticket will be closed in 5 minutes.".to_string()),
            ]
        );
        assert!(!monitor.is_watching(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanished_channel_fails_harmlessly() {
        let monitor = monitor();
        let handle = spawn_watch(&monitor, 7);
        settle().await;

        // Deleted without us seeing the event.
        monitor.channels.gone.insert(7);

        assert_eq!(handle.await.unwrap().unwrap(), WatchOutcome::Cancelled);
        assert!(!monitor.is_watching(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_starts_one_watch_per_idle_channel() {
        let monitor = monitor();
        monitor.channels.last_messages.insert(10, None);
        monitor.channels.last_messages.insert(11, None);
        monitor
            .channels
            .last_messages
            .insert(12, Some(Utc::now()));

        let started = Arc::clone(&monitor).sweep().await.unwrap();
        settle().await;

        assert_eq!(started, 2);
        assert_eq!(monitor.active_watch_count(), 2);

        // Watched channels are skipped by the next sweep.
        let again = Arc::clone(&monitor).sweep().await.unwrap();
        assert_eq!(again, 0);
        assert_eq!(monitor.channels.prompt_count(10), 1);
        assert_eq!(monitor.channels.prompt_count(11), 1);
    }
}
