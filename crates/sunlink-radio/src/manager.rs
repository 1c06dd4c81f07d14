//! Transmission manager.
//!
//! Owns the outgoing message queue and drives the radio one payload per
//! tick. The manager enforces a minimum gap between sends, retries a
//! failed payload with quadratically growing backoff, gives up for good
//! past a retry ceiling, and reports when the link has been silent longer
//! than a grace period. It knows nothing about sensors or indicators; the
//! embedding loop reacts to the returned [`TickOutcome`].

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sunlink_message::{encode_message, Message};
use tracing::{debug, info, warn};

use crate::link::{LinkConfig, RadioError, RadioLink};

// ============================================================================
// Configuration
// ============================================================================

/// Tuning knobs for the transmission manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioManagerConfig {
    /// Queue depth above which same-kind eviction starts. The queue
    /// steadies at one past this value.
    pub eviction_threshold: usize,
    /// Failed attempts allowed for one payload before the manager gives
    /// up on the link entirely.
    pub retry_ceiling: u32,
    /// Base of the retry backoff curve in milliseconds. The wait after
    /// failed attempt `n` is `backoff_base_ms * n * n`.
    pub backoff_base_ms: u64,
    /// Minimum gap between consecutive sends, in milliseconds, so the
    /// receiving side can keep up.
    pub min_send_gap_ms: u64,
    /// How long the link may stay idle before a tick reports silence,
    /// in milliseconds.
    pub silence_grace_ms: u64,
}

impl Default for RadioManagerConfig {
    fn default() -> Self {
        RadioManagerConfig {
            eviction_threshold: 8,
            retry_ceiling: 10,
            backoff_base_ms: 100,
            min_send_gap_ms: 100,
            silence_grace_ms: 5000,
        }
    }
}

impl RadioManagerConfig {
    /// Set the same-kind eviction threshold.
    pub fn with_eviction_threshold(mut self, threshold: usize) -> Self {
        self.eviction_threshold = threshold;
        self
    }

    /// Set the retry ceiling.
    pub fn with_retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = ceiling;
        self
    }

    /// Set the backoff curve base in milliseconds.
    pub fn with_backoff_base_ms(mut self, base_ms: u64) -> Self {
        self.backoff_base_ms = base_ms;
        self
    }

    /// Set the minimum gap between sends in milliseconds.
    pub fn with_min_send_gap_ms(mut self, gap_ms: u64) -> Self {
        self.min_send_gap_ms = gap_ms;
        self
    }

    /// Set the silence grace period in milliseconds.
    pub fn with_silence_grace_ms(mut self, grace_ms: u64) -> Self {
        self.silence_grace_ms = grace_ms;
        self
    }
}

// ============================================================================
// Tick Outcome and Stats
// ============================================================================

/// What a single [`RadioManager::tick`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to send, nothing to report.
    Idle,
    /// A payload went out.
    Sent,
    /// The send gap has not elapsed yet; the queue was left untouched.
    Throttled,
    /// A send failed and the backoff delay was slept off.
    Backoff {
        /// Failed attempts so far for the payload in flight.
        retries: u32,
    },
    /// The retry ceiling was passed; transmissions are abandoned until
    /// the next power cycle.
    GaveUp,
    /// The link has been silent past the grace period.
    Silent,
}

/// Counters kept by the manager.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RadioStats {
    /// Payloads transmitted.
    pub sent: u64,
    /// Write attempts the hardware reported as failed.
    pub send_failures: u64,
    /// Queued messages dropped to make room for fresher ones.
    pub evicted: u64,
    /// Times the retry ceiling was passed.
    pub give_ups: u64,
    /// Silence reports raised.
    pub silence_reports: u64,
}

// ============================================================================
// Manager
// ============================================================================

/// Bounded transmit queue plus retry and health bookkeeping on top of a
/// [`RadioLink`].
pub struct RadioManager<R: RadioLink> {
    radio: R,
    link: LinkConfig,
    config: RadioManagerConfig,
    queue: VecDeque<Message>,
    // Payload being retried. Kept out of the queue so eviction cannot
    // touch it.
    pending: Option<Message>,
    retries: u32,
    job_done: bool,
    error: bool,
    // None until the first successful send after boot or power-up.
    last_send: Option<Instant>,
    last_activity: Instant,
    last_health_check: Instant,
    stats: RadioStats,
}

impl<R: RadioLink> RadioManager<R> {
    /// Validate the link parameters, bring the radio up, and return the
    /// manager ready to queue messages.
    pub fn new(
        mut radio: R,
        link: LinkConfig,
        config: RadioManagerConfig,
    ) -> Result<Self, RadioError> {
        link.validate()?;
        radio.configure(&link)?;
        info!(
            "RadioManager: radio up, channel {} payload {}B",
            link.channel, link.payload_size
        );
        let now = Instant::now();
        Ok(RadioManager {
            radio,
            link,
            config,
            queue: VecDeque::new(),
            pending: None,
            retries: 0,
            job_done: false,
            error: false,
            last_send: None,
            last_activity: now,
            last_health_check: now,
            stats: RadioStats::default(),
        })
    }

    /// Queue a message for transmission.
    ///
    /// When the queue is already past the eviction threshold and the
    /// oldest entry is the same kind as the incoming one, the oldest is
    /// dropped first: fresher telemetry supersedes stale telemetry of the
    /// same kind, while other kinds keep their place.
    pub fn enqueue(&mut self, message: Message) {
        if self.queue.len() > self.config.eviction_threshold {
            let same_kind = self
                .queue
                .front()
                .is_some_and(|front| front.kind() == message.kind());
            if same_kind {
                self.queue.pop_front();
                self.stats.evicted += 1;
                debug!(
                    "RadioManager: evicted oldest {} message, queue at {}",
                    message.kind(),
                    self.queue.len()
                );
            }
        }
        self.queue.push_back(message);
    }

    /// Advance the manager: send at most one payload and report what
    /// happened.
    pub fn tick(&mut self) -> TickOutcome {
        if self.job_done {
            return TickOutcome::Idle;
        }

        // Pull the next message unless a retry is in flight.
        if self.pending.is_none() {
            self.pending = self.queue.pop_front();
        }
        let Some(message) = self.pending else {
            return self.check_silence();
        };

        if let Some(last) = self.last_send {
            if last.elapsed() < Duration::from_millis(self.config.min_send_gap_ms) {
                return TickOutcome::Throttled;
            }
        }

        let payload = encode_message(&message);
        if self.radio.write(&payload) {
            debug!("RadioManager: sent {}", message);
            self.pending = None;
            self.retries = 0;
            self.error = false;
            let now = Instant::now();
            self.last_send = Some(now);
            self.last_activity = now;
            self.stats.sent += 1;
            TickOutcome::Sent
        } else {
            self.on_send_failure(&message)
        }
    }

    fn on_send_failure(&mut self, message: &Message) -> TickOutcome {
        self.stats.send_failures += 1;
        self.retries += 1;
        if self.retries > self.config.retry_ceiling {
            warn!(
                "RadioManager: {} failed {} times, giving up",
                message.kind(),
                self.retries
            );
            self.job_done = true;
            self.error = true;
            self.stats.give_ups += 1;
            return TickOutcome::GaveUp;
        }
        let n = u64::from(self.retries);
        let delay = Duration::from_millis(self.config.backoff_base_ms * n * n);
        debug!(
            "RadioManager: send failed (attempt {}), backing off {}ms",
            self.retries,
            delay.as_millis()
        );
        thread::sleep(delay);
        TickOutcome::Backoff {
            retries: self.retries,
        }
    }

    fn check_silence(&mut self) -> TickOutcome {
        let grace = Duration::from_millis(self.config.silence_grace_ms);
        if self.last_activity.elapsed() > grace && self.last_health_check.elapsed() > grace {
            self.last_health_check = Instant::now();
            self.stats.silence_reports += 1;
            info!(
                "RadioManager: nothing sent for {}ms",
                self.last_activity.elapsed().as_millis()
            );
            return TickOutcome::Silent;
        }
        TickOutcome::Idle
    }

    /// Stop transmissions and put the radio to sleep. Queued and
    /// in-flight messages are dropped; fresh telemetry repopulates the
    /// queue after power-up.
    pub fn power_down(&mut self) {
        let dropped = self.queue.len() + usize::from(self.pending.is_some());
        info!("RadioManager: powering down, dropping {} messages", dropped);
        self.job_done = true;
        self.queue.clear();
        self.pending = None;
        self.radio.power_down();
    }

    /// Wake the radio, reapply link parameters, and reset retry and
    /// health state.
    pub fn power_up(&mut self) -> Result<(), RadioError> {
        self.radio.power_up();
        self.radio.configure(&self.link)?;
        self.job_done = false;
        self.error = false;
        self.retries = 0;
        self.last_send = None;
        let now = Instant::now();
        self.last_activity = now;
        self.last_health_check = now;
        info!("RadioManager: powered up");
        Ok(())
    }

    /// True once the manager has given up or been powered down.
    pub fn job_done(&self) -> bool {
        self.job_done
    }

    /// True while the link is in the failed state.
    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued and nothing is mid-retry.
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.pending.is_none()
    }

    /// Failed attempts for the payload currently in flight.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn stats(&self) -> RadioStats {
        self.stats
    }

    pub fn config(&self) -> &RadioManagerConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRadio;
    use sunlink_message::{decode_message, ChargerMessage, StatusMessage};

    fn fast_config() -> RadioManagerConfig {
        RadioManagerConfig::default()
            .with_backoff_base_ms(1)
            .with_min_send_gap_ms(0)
    }

    fn manager_with(config: RadioManagerConfig) -> (RadioManager<MockRadio>, MockRadio) {
        let radio = MockRadio::new();
        let handle = radio.clone();
        let manager = RadioManager::new(radio, LinkConfig::default(), config).unwrap();
        (manager, handle)
    }

    fn charger(voltage: f32) -> Message {
        Message::Charger(ChargerMessage {
            battery_voltage: voltage,
            ..Default::default()
        })
    }

    #[test]
    fn test_sends_queued_message() {
        let (mut manager, radio) = manager_with(fast_config());
        let msg = charger(12.8);
        manager.enqueue(msg);

        assert_eq!(manager.tick(), TickOutcome::Sent);
        assert!(manager.is_drained());
        assert_eq!(manager.stats().sent, 1);

        let sent = radio.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_message(&sent[0]).unwrap(), msg);
    }

    #[test]
    fn test_first_send_is_not_throttled() {
        // A fresh manager has never sent, so the gap check must not apply.
        let (mut manager, _radio) = manager_with(RadioManagerConfig::default());
        manager.enqueue(charger(12.8));
        assert_eq!(manager.tick(), TickOutcome::Sent);
    }

    #[test]
    fn test_respects_send_gap() {
        let config = fast_config().with_min_send_gap_ms(50);
        let (mut manager, _radio) = manager_with(config);
        manager.enqueue(charger(12.8));
        manager.enqueue(charger(12.9));

        assert_eq!(manager.tick(), TickOutcome::Sent);
        assert_eq!(manager.tick(), TickOutcome::Throttled);
        assert_eq!(manager.queue_len(), 0, "throttled message stays in flight");

        thread::sleep(Duration::from_millis(60));
        assert_eq!(manager.tick(), TickOutcome::Sent);
        assert_eq!(manager.stats().sent, 2);
    }

    #[test]
    fn test_failure_backs_off_then_gives_up() {
        let config = fast_config().with_retry_ceiling(2);
        let (mut manager, radio) = manager_with(config);
        radio.set_always_fail(true);
        manager.enqueue(charger(12.8));

        assert_eq!(manager.tick(), TickOutcome::Backoff { retries: 1 });
        assert_eq!(manager.tick(), TickOutcome::Backoff { retries: 2 });
        assert_eq!(manager.tick(), TickOutcome::GaveUp);

        assert!(manager.job_done());
        assert!(manager.has_error());
        assert_eq!(radio.write_calls(), 3, "ceiling + 1 attempts in total");
        assert_eq!(manager.stats().give_ups, 1);
        assert_eq!(manager.stats().send_failures, 3);

        // Give-up is terminal and reported exactly once.
        assert_eq!(manager.tick(), TickOutcome::Idle);
        assert_eq!(radio.write_calls(), 3);
    }

    #[test]
    fn test_same_message_retried_until_it_goes_out() {
        let (mut manager, radio) = manager_with(fast_config());
        radio.script_writes(&[false, true]);
        let msg = charger(12.8);
        manager.enqueue(msg);

        assert_eq!(manager.tick(), TickOutcome::Backoff { retries: 1 });
        assert_eq!(manager.tick(), TickOutcome::Sent);
        assert_eq!(manager.retries(), 0, "success resets the retry counter");

        let sent = radio.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_message(&sent[0]).unwrap(), msg, "same payload, not a successor");
    }

    #[test]
    fn test_eviction_keeps_queue_bounded() {
        let (mut manager, _radio) = manager_with(fast_config());
        for i in 0..100 {
            manager.enqueue(charger(12.0 + i as f32 / 100.0));
        }
        // Steady state is one past the threshold.
        assert_eq!(manager.queue_len(), 9);
        assert_eq!(manager.stats().evicted, 91);
    }

    #[test]
    fn test_eviction_drops_the_oldest_first() {
        let (mut manager, radio) = manager_with(fast_config());
        for i in 0..10 {
            manager.enqueue(charger(i as f32));
        }
        assert_eq!(manager.queue_len(), 9);
        assert_eq!(manager.stats().evicted, 1);

        assert_eq!(manager.tick(), TickOutcome::Sent);
        let sent = radio.sent();
        let first = decode_message(&sent[0]).unwrap();
        // Message 0 was evicted, so message 1 leads the queue.
        assert_eq!(first, charger(1.0));
    }

    #[test]
    fn test_eviction_requires_matching_kind() {
        let config = fast_config().with_eviction_threshold(2);
        let (mut manager, _radio) = manager_with(config);
        manager.enqueue(charger(1.0));
        manager.enqueue(charger(2.0));
        manager.enqueue(charger(3.0));
        // Queue is past the threshold, but the front is a charger message,
        // so a status message must not evict it.
        manager.enqueue(Message::Status(StatusMessage::default()));
        assert_eq!(manager.queue_len(), 4);
        assert_eq!(manager.stats().evicted, 0);

        manager.enqueue(charger(4.0));
        assert_eq!(manager.queue_len(), 4);
        assert_eq!(manager.stats().evicted, 1);
    }

    #[test]
    fn test_power_down_clears_queue() {
        let (mut manager, radio) = manager_with(fast_config());
        manager.enqueue(charger(12.8));
        manager.enqueue(charger(12.9));

        manager.power_down();
        assert!(manager.job_done());
        assert!(manager.is_drained());
        assert!(radio.is_powered_down());

        assert_eq!(manager.tick(), TickOutcome::Idle);
        assert_eq!(radio.write_calls(), 0);
    }

    #[test]
    fn test_power_up_restores_service() {
        let (mut manager, radio) = manager_with(fast_config());
        manager.power_down();
        manager.power_up().unwrap();

        assert!(!manager.job_done());
        assert!(!radio.is_powered_down());
        assert!(manager.is_drained(), "the queue is not repopulated");

        manager.enqueue(charger(12.8));
        assert_eq!(manager.tick(), TickOutcome::Sent);
    }

    #[test]
    fn test_power_up_clears_the_failed_state() {
        let config = fast_config().with_retry_ceiling(1);
        let (mut manager, radio) = manager_with(config);
        radio.set_always_fail(true);
        manager.enqueue(charger(12.8));
        manager.tick();
        assert_eq!(manager.tick(), TickOutcome::GaveUp);

        radio.set_always_fail(false);
        manager.power_down();
        manager.power_up().unwrap();
        assert!(!manager.has_error());
        assert_eq!(manager.retries(), 0);

        manager.enqueue(charger(12.9));
        assert_eq!(manager.tick(), TickOutcome::Sent);
    }

    #[test]
    fn test_silence_reported_once_per_grace_period() {
        let config = fast_config().with_silence_grace_ms(40);
        let (mut manager, _radio) = manager_with(config);

        assert_eq!(manager.tick(), TickOutcome::Idle);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(manager.tick(), TickOutcome::Silent);
        // The report arms a fresh grace period.
        assert_eq!(manager.tick(), TickOutcome::Idle);
        assert_eq!(manager.stats().silence_reports, 1);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(manager.tick(), TickOutcome::Silent);
        assert_eq!(manager.stats().silence_reports, 2);
    }

    #[test]
    fn test_sending_defers_silence() {
        let config = fast_config().with_silence_grace_ms(40);
        let (mut manager, _radio) = manager_with(config);

        thread::sleep(Duration::from_millis(50));
        manager.enqueue(charger(12.8));
        assert_eq!(manager.tick(), TickOutcome::Sent, "pending work wins over silence");
        assert_eq!(manager.tick(), TickOutcome::Idle, "the send counts as activity");
    }

    #[test]
    fn test_init_failure_propagates() {
        let radio = MockRadio::new();
        radio.set_fail_configure(true);
        let result = RadioManager::new(radio, LinkConfig::default(), RadioManagerConfig::default());
        assert!(matches!(result, Err(RadioError::InitFailed(_))));
    }

    #[test]
    fn test_invalid_link_rejected_before_touching_hardware() {
        let radio = MockRadio::new();
        let handle = radio.clone();
        let link = LinkConfig {
            channel: 200,
            ..Default::default()
        };
        let result = RadioManager::new(radio, link, RadioManagerConfig::default());
        assert!(matches!(result, Err(RadioError::ChannelOutOfRange { .. })));
        assert!(handle.configured().is_none());
    }
}
