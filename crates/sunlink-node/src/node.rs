//! Cooperative run loop.
//!
//! One logical task pump: each round drains whatever bytes the source has,
//! feeds them through the parser, routes completed frames into the transmit
//! queue, then gives the transmission manager one tick and reacts to its
//! outcome. Nothing here blocks beyond the manager's bounded backoff and the
//! configured tick pause.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use sunlink_message::Message;
use sunlink_radio::{RadioError, RadioLink, RadioManager, RadioStats, TickOutcome};
use vedirect_protocol::{FrameEvent, FrameParser, ParserStats};

use crate::config::NodeConfig;
use crate::context::NodeContext;
use crate::router::{comm_failure_status, FrameRouter, RouterStats};
use crate::sensor::SensorProvider;
use crate::source::TelemetrySource;

/// Bytes drained from the source per poll round.
const READ_CHUNK: usize = 64;
/// Indicator pulse length while a send is backing off.
const RETRY_PULSE: Duration = Duration::from_millis(50);

/// Totals from a run, one section per pipeline stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeReport {
    pub parser: ParserStats,
    pub router: RouterStats,
    pub radio: RadioStats,
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames {} valid / {} invalid / {} empty; messages {} routed / {} dropped; \
             radio {} sent / {} failed / {} evicted",
            self.parser.frames_valid,
            self.parser.frames_invalid,
            self.parser.frames_empty,
            self.router.routed,
            self.router.dropped(),
            self.radio.sent,
            self.radio.send_failures,
            self.radio.evicted,
        )
    }
}

/// The assembled pipeline: byte source, parser, router, transmission
/// manager, and run-loop context.
pub struct Node<T: TelemetrySource, S: SensorProvider, R: RadioLink> {
    name: String,
    source: T,
    sensor: S,
    parser: FrameParser,
    router: FrameRouter,
    manager: RadioManager<R>,
    context: NodeContext,
    tick_interval: Duration,
}

impl<T: TelemetrySource, S: SensorProvider, R: RadioLink> Node<T, S, R> {
    pub fn new(
        source: T,
        sensor: S,
        manager: RadioManager<R>,
        context: NodeContext,
        config: &NodeConfig,
    ) -> Self {
        let mut router = FrameRouter::new();
        if !config.supplemental_pids.is_empty() {
            router = router.with_supplemental_pids(config.supplemental_pids.clone());
        }
        Node {
            name: config.name.clone(),
            source,
            sensor,
            parser: FrameParser::new(),
            router,
            manager,
            context,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
        }
    }

    /// One cooperative round: ingest available bytes, then tick the
    /// transmission manager and react to what it did.
    pub fn poll(&mut self) -> TickOutcome {
        let mut buf = [0u8; READ_CHUNK];
        let n = self.source.read(&mut buf);
        for &byte in &buf[..n] {
            if let Some(event) = self.parser.feed(byte) {
                self.on_frame(event);
            }
        }

        let outcome = self.manager.tick();
        self.react(outcome);
        outcome
    }

    fn on_frame(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::Valid(frame) => {
                if let Some(message) = self.router.route(&frame, &self.sensor) {
                    self.manager.enqueue(message);
                }
            }
            // Already counted and logged by the parser.
            FrameEvent::InvalidChecksum | FrameEvent::Empty => {}
        }
    }

    fn react(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Backoff { .. } => self.context.pulse_led(RETRY_PULSE),
            TickOutcome::Silent => {
                warn!(
                    "Node[{}]: telemetry silent, queueing comm-failure status",
                    self.name
                );
                let status = comm_failure_status(&self.sensor, self.context.uptime_ms());
                self.manager.enqueue(Message::Status(status));
            }
            TickOutcome::GaveUp => {
                error!("Node[{}]: radio gave up after repeated failures", self.name);
            }
            TickOutcome::Idle | TickOutcome::Sent | TickOutcome::Throttled => {}
        }
    }

    /// Poll at the configured interval until the stop flag is raised, the
    /// radio gives up, or a finite source is exhausted with the queue
    /// drained.
    pub fn run(&mut self, stop: &AtomicBool) -> NodeReport {
        info!("Node[{}]: run loop started", self.name);
        while !stop.load(Ordering::Relaxed) {
            self.poll();
            if self.manager.job_done() {
                break;
            }
            if self.source.exhausted() && self.manager.is_drained() {
                info!("Node[{}]: source exhausted and queue drained", self.name);
                break;
            }
            thread::sleep(self.tick_interval);
        }
        self.report()
    }

    /// Stop transmissions, drop queued work, and reset the parser so a
    /// partial frame does not straddle the power cycle.
    pub fn power_down(&mut self) {
        info!("Node[{}]: powering down", self.name);
        self.manager.power_down();
        self.parser.reset();
    }

    pub fn power_up(&mut self) -> Result<(), RadioError> {
        info!("Node[{}]: powering up", self.name);
        self.manager.power_up()
    }

    /// True once the radio passed its retry ceiling and gave up.
    pub fn has_error(&self) -> bool {
        self.manager.has_error()
    }

    pub fn report(&self) -> NodeReport {
        NodeReport {
            parser: self.parser.stats(),
            router: self.router.stats(),
            radio: self.manager.stats(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use sunlink_message::{decode_message, STATUS_FLAG_COMM_FAILURE};
    use sunlink_radio::mock::MockRadio;
    use sunlink_radio::RadioManagerConfig;
    use vedirect_protocol::encode_frame;

    use crate::context::StatusLed;
    use crate::sensor::FixedSensor;
    use crate::source::ReplaySource;

    fn fast_config() -> NodeConfig {
        NodeConfig::default().with_tick_interval_ms(1).with_transmit(
            RadioManagerConfig::default()
                .with_min_send_gap_ms(0)
                .with_backoff_base_ms(1),
        )
    }

    fn build_node<T: TelemetrySource>(
        source: T,
        sensor: FixedSensor,
        config: &NodeConfig,
    ) -> (Node<T, FixedSensor, MockRadio>, MockRadio) {
        let radio = MockRadio::new();
        let handle = radio.clone();
        let manager = RadioManager::new(
            radio,
            config.radio.link_config().unwrap(),
            config.transmit.clone(),
        )
        .unwrap();
        let node = Node::new(source, sensor, manager, NodeContext::default(), config);
        (node, handle)
    }

    /// Source whose chunks the test hands over while the node runs.
    #[derive(Clone, Default)]
    struct ScriptedSource {
        chunks: Rc<RefCell<VecDeque<Vec<u8>>>>,
    }

    impl ScriptedSource {
        fn push(&self, bytes: &[u8]) {
            for chunk in bytes.chunks(32) {
                self.chunks.borrow_mut().push_back(chunk.to_vec());
            }
        }
    }

    impl TelemetrySource for ScriptedSource {
        fn read(&mut self, buf: &mut [u8]) -> usize {
            match self.chunks.borrow_mut().pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    n
                }
                None => 0,
            }
        }
    }

    /// Source that never yields and never exhausts, for silence tests.
    struct IdleSource;

    impl TelemetrySource for IdleSource {
        fn read(&mut self, _buf: &mut [u8]) -> usize {
            0
        }
    }

    #[derive(Clone, Default)]
    struct CountingLed {
        pulses: Rc<RefCell<u32>>,
    }

    impl StatusLed for CountingLed {
        fn pulse(&mut self, _duration: Duration) {
            *self.pulses.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_replay_reaches_the_radio() {
        let bytes = encode_frame(&[
            ("PID", "0xA057"),
            ("V", "12800"),
            ("I", "-1500"),
            ("VPV", "24000"),
            ("PPV", "18"),
        ]);
        let config = fast_config();
        let sensor = FixedSensor::default().with_temperature(21.5);
        let (mut node, radio) = build_node(ReplaySource::new(bytes), sensor, &config);

        let stop = AtomicBool::new(false);
        let report = node.run(&stop);

        assert_eq!(report.parser.frames_valid, 1);
        assert_eq!(report.router.routed, 1);
        assert_eq!(report.radio.sent, 1);

        let sent = radio.sent();
        let Message::Charger(charger) = decode_message(&sent[0]).unwrap() else {
            panic!("Expected a charger payload");
        };
        assert_eq!(charger.battery_voltage, 12.8);
        assert_eq!(charger.temperature, 21.5);
    }

    #[test]
    fn test_stop_flag_halts_the_loop() {
        let bytes = encode_frame(&[("PID", "0xA057"), ("V", "12800")]);
        let config = fast_config();
        let (mut node, radio) = build_node(ReplaySource::new(bytes), FixedSensor::default(), &config);

        let stop = AtomicBool::new(true);
        let report = node.run(&stop);

        assert_eq!(report.radio.sent, 0);
        assert!(radio.sent().is_empty());
    }

    #[test]
    fn test_backoff_pulses_the_indicator() {
        let bytes = encode_frame(&[("PID", "0xA057"), ("V", "12800")]);
        let config = fast_config().with_transmit(
            RadioManagerConfig::default()
                .with_min_send_gap_ms(0)
                .with_backoff_base_ms(1)
                .with_retry_ceiling(2),
        );
        let radio = MockRadio::new();
        let handle = radio.clone();
        handle.set_always_fail(true);
        let manager = RadioManager::new(
            radio,
            config.radio.link_config().unwrap(),
            config.transmit.clone(),
        )
        .unwrap();
        let led = CountingLed::default();
        let mut node = Node::new(
            ReplaySource::new(bytes),
            FixedSensor::default(),
            manager,
            NodeContext::new(Box::new(led.clone())),
            &config,
        );

        let stop = AtomicBool::new(false);
        let report = node.run(&stop);

        // Two backoff rounds pulse the indicator, the third attempt gives up.
        assert_eq!(*led.pulses.borrow(), 2);
        assert!(node.has_error());
        assert_eq!(report.radio.give_ups, 1);
        assert_eq!(handle.write_calls(), 3);
    }

    #[test]
    fn test_silence_synthesizes_a_heartbeat() {
        let config = fast_config().with_transmit(
            RadioManagerConfig::default()
                .with_min_send_gap_ms(0)
                .with_silence_grace_ms(30),
        );
        let (mut node, radio) = build_node(IdleSource, FixedSensor::default(), &config);

        assert_eq!(node.poll(), TickOutcome::Idle);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(node.poll(), TickOutcome::Silent);
        assert_eq!(node.poll(), TickOutcome::Sent);

        let sent = radio.sent();
        let Message::Status(status) = decode_message(&sent[0]).unwrap() else {
            panic!("Expected a status payload");
        };
        assert_eq!(status.flags & STATUS_FLAG_COMM_FAILURE, STATUS_FLAG_COMM_FAILURE);
        assert_eq!(status.temperature, 20.0);
        assert_eq!(status.battery_voltage, 12.6);
    }

    #[test]
    fn test_power_cycle_resets_the_parser() {
        let frame_bytes = encode_frame(&[("PID", "0xA057"), ("V", "12800")]);
        let source = ScriptedSource::default();
        let config = fast_config();
        let (mut node, radio) = build_node(source.clone(), FixedSensor::default(), &config);

        // Half a frame goes in, then the node power-cycles mid-record.
        source.push(&frame_bytes[..frame_bytes.len() / 2]);
        node.poll();
        node.power_down();
        node.power_up().unwrap();

        source.push(&frame_bytes);
        for _ in 0..6 {
            node.poll();
        }

        let report = node.report();
        assert_eq!(report.parser.frames_valid, 1);
        assert_eq!(report.parser.frames_invalid, 0);
        let sent = radio.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            decode_message(&sent[0]).unwrap(),
            Message::Charger(_)
        ));
    }

    #[test]
    fn test_report_display_summarizes_the_stages() {
        let mut report = NodeReport::default();
        report.parser.frames_valid = 4;
        report.router.routed = 3;
        report.radio.sent = 3;

        let line = report.to_string();
        assert!(line.contains("4 valid"));
        assert!(line.contains("3 routed"));
        assert!(line.contains("3 sent"));
    }
}
