//! Frame router.
//!
//! Turns validated telemetry frames into typed radio messages. A frame with a
//! `PID` field is classified by device class and mapped to the matching
//! variant with the wire scale factors applied; a frame without one is a
//! history frame, routable only while the last classified identity belongs to
//! the supplemental-eligible set. Every routed variant consults the local
//! sensor first: a not-ready sensor or a stale temperature drops the frame
//! instead of shipping a bad reading.

use tracing::debug;

use sunlink_message::{
    BatteryHistoryMessage, BatteryMessage, ChargerMessage, InverterMessage, Message,
    StatusMessage, STATUS_FLAG_COMM_FAILURE,
};
use vedirect_protocol::{
    classify, DeviceClass, Frame, BATTERY_MONITOR_IDS, FIELD_AC_APPARENT_POWER, FIELD_AC_CURRENT,
    FIELD_AC_VOLTAGE, FIELD_ALARM, FIELD_AUX_VOLTAGE, FIELD_CHARGED_ENERGY, FIELD_CONSUMED,
    FIELD_CURRENT, FIELD_CYCLE_COUNT, FIELD_DEEPEST_DISCHARGE, FIELD_DISCHARGED_ENERGY,
    FIELD_ERROR, FIELD_MAX_VOLTAGE, FIELD_MIN_VOLTAGE, FIELD_MODE, FIELD_MPPT, FIELD_OFF_REASON,
    FIELD_PANEL_POWER, FIELD_PANEL_VOLTAGE, FIELD_PEAK_POWER, FIELD_PID, FIELD_POWER, FIELD_SOC,
    FIELD_STATE, FIELD_TIME_TO_GO, FIELD_VOLTAGE, FIELD_WARNING, FIELD_YIELD_TODAY,
};

use crate::sensor::SensorProvider;

/// Counters kept by the router.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    /// Frames that produced a message.
    pub routed: u64,
    /// Frames dropped for an unclassifiable device id.
    pub dropped_unknown_pid: u64,
    /// Frames dropped for an unparseable device id.
    pub dropped_malformed_pid: u64,
    /// History frames dropped without an eligible last identity.
    pub dropped_no_identity: u64,
    /// Frames dropped because the local sensor was not ready or stale.
    pub dropped_stale_sensor: u64,
}

impl RouterStats {
    /// Total frames dropped across all reasons.
    pub fn dropped(&self) -> u64 {
        self.dropped_unknown_pid
            + self.dropped_malformed_pid
            + self.dropped_no_identity
            + self.dropped_stale_sensor
    }
}

/// Maps validated frames to typed messages.
pub struct FrameRouter {
    // Raw PID of the most recent classified frame, for history correlation.
    last_identity: Option<u16>,
    supplemental_pids: Vec<u16>,
    stats: RouterStats,
}

impl Default for FrameRouter {
    fn default() -> Self {
        FrameRouter::new()
    }
}

impl FrameRouter {
    /// Router with the built-in battery-monitor set as the
    /// supplemental-eligible identities.
    pub fn new() -> Self {
        FrameRouter {
            last_identity: None,
            supplemental_pids: BATTERY_MONITOR_IDS.to_vec(),
            stats: RouterStats::default(),
        }
    }

    /// Replace the supplemental-eligible identity set.
    pub fn with_supplemental_pids(mut self, pids: Vec<u16>) -> Self {
        self.supplemental_pids = pids;
        self
    }

    /// Route one validated frame, returning the message to transmit if the
    /// frame classifies and the sensor gate passes.
    pub fn route(&mut self, frame: &Frame, sensor: &dyn SensorProvider) -> Option<Message> {
        match frame.get(FIELD_PID) {
            Some(raw_pid) => {
                let Some(pid) = frame.hex16(FIELD_PID) else {
                    self.stats.dropped_malformed_pid += 1;
                    debug!("FrameRouter: unparseable PID {:?}, frame dropped", raw_pid);
                    return None;
                };
                self.route_identified(pid, frame, sensor)
            }
            None => self.route_history(frame, sensor),
        }
    }

    fn route_identified(
        &mut self,
        pid: u16,
        frame: &Frame,
        sensor: &dyn SensorProvider,
    ) -> Option<Message> {
        let Some(class) = classify(pid) else {
            self.stats.dropped_unknown_pid += 1;
            debug!("FrameRouter: unknown device 0x{:04X}, frame dropped", pid);
            return None;
        };
        // The identity sticks even when the sensor gate drops this frame,
        // so a following history frame still correlates.
        self.last_identity = Some(pid);

        let temperature = self.gated_temperature(sensor)?;
        let message = match class {
            DeviceClass::ChargeController => Message::Charger(build_charger(frame, temperature)),
            DeviceClass::Inverter => Message::Inverter(build_inverter(frame, temperature)),
            DeviceClass::BatteryMonitor => Message::Battery(build_battery(frame)),
        };
        self.stats.routed += 1;
        debug!("FrameRouter: 0x{:04X} -> {}", pid, message.kind());
        Some(message)
    }

    fn route_history(&mut self, frame: &Frame, sensor: &dyn SensorProvider) -> Option<Message> {
        let eligible = self
            .last_identity
            .is_some_and(|pid| self.supplemental_pids.contains(&pid));
        if !eligible {
            self.stats.dropped_no_identity += 1;
            debug!("FrameRouter: history frame without eligible identity, dropped");
            return None;
        }

        let temperature = self.gated_temperature(sensor)?;
        self.stats.routed += 1;
        Some(Message::BatteryHistory(build_history(frame, temperature)))
    }

    /// Current temperature, or `None` (with the drop recorded) when the
    /// sensor is not ready or the reading is stale.
    fn gated_temperature(&mut self, sensor: &dyn SensorProvider) -> Option<f32> {
        if !sensor.ready() {
            self.stats.dropped_stale_sensor += 1;
            debug!("FrameRouter: sensor not ready, frame dropped");
            return None;
        }
        let reading = sensor.temperature();
        if !reading.current {
            self.stats.dropped_stale_sensor += 1;
            debug!("FrameRouter: temperature reading stale, frame dropped");
            return None;
        }
        Some(reading.value)
    }

    /// Raw PID of the most recent classified frame.
    pub fn last_identity(&self) -> Option<u16> {
        self.last_identity
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }
}

/// Status message carrying the latest sensor snapshot and the
/// communication-failure flag, synthesized when telemetry goes silent.
pub fn comm_failure_status(sensor: &dyn SensorProvider, uptime_ms: u32) -> StatusMessage {
    StatusMessage {
        uptime_ms,
        battery_voltage: sensor.battery_voltage().value,
        temperature: sensor.temperature().value,
        humidity: sensor.humidity().value,
        baro_pressure: sensor.baro_pressure().value,
        flags: STATUS_FLAG_COMM_FAILURE,
    }
}

// ============================================================================
// Field extraction
// ============================================================================

// Missing or malformed numerics decode as zero so a partial frame still
// routes; each miss is logged rather than counted.

fn raw(frame: &Frame, tag: &str) -> i64 {
    frame.decimal(tag).unwrap_or_else(|| {
        debug!("FrameRouter: field {} missing or malformed, using 0", tag);
        0
    })
}

fn scaled(frame: &Frame, tag: &str, divisor: f32) -> f32 {
    raw(frame, tag) as f32 / divisor
}

fn raw_u8(frame: &Frame, tag: &str) -> u8 {
    raw(frame, tag).clamp(0, i64::from(u8::MAX)) as u8
}

fn raw_u16(frame: &Frame, tag: &str) -> u16 {
    raw(frame, tag).clamp(0, i64::from(u16::MAX)) as u16
}

fn raw_i8(frame: &Frame, tag: &str) -> i8 {
    raw(frame, tag).clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8
}

fn raw_i16(frame: &Frame, tag: &str) -> i16 {
    raw(frame, tag).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

fn hex_or_zero(frame: &Frame, tag: &str) -> u32 {
    frame.hex32(tag).unwrap_or_else(|| {
        debug!("FrameRouter: field {} missing or malformed, using 0", tag);
        0
    })
}

fn build_charger(frame: &Frame, temperature: f32) -> ChargerMessage {
    ChargerMessage {
        battery_voltage: scaled(frame, FIELD_VOLTAGE, 1000.0),
        battery_current: scaled(frame, FIELD_CURRENT, 1000.0),
        panel_voltage: scaled(frame, FIELD_PANEL_VOLTAGE, 1000.0),
        panel_power: raw(frame, FIELD_PANEL_POWER) as f32,
        state: raw_u8(frame, FIELD_STATE),
        mppt_mode: raw_u8(frame, FIELD_MPPT),
        error: raw_u8(frame, FIELD_ERROR),
        off_reason: hex_or_zero(frame, FIELD_OFF_REASON),
        // H20 arrives in 0.01 kWh steps; ten times that is watt-hours.
        yield_today: (raw(frame, FIELD_YIELD_TODAY) * 10).clamp(0, i64::from(u16::MAX)) as u16,
        peak_power_today: raw_u16(frame, FIELD_PEAK_POWER),
        temperature,
    }
}

fn build_inverter(frame: &Frame, temperature: f32) -> InverterMessage {
    InverterMessage {
        battery_voltage: scaled(frame, FIELD_VOLTAGE, 1000.0),
        ac_current: scaled(frame, FIELD_AC_CURRENT, 10.0),
        ac_voltage: scaled(frame, FIELD_AC_VOLTAGE, 100.0),
        ac_apparent_power: raw_u16(frame, FIELD_AC_APPARENT_POWER),
        state: raw_u8(frame, FIELD_STATE),
        mode: raw_i8(frame, FIELD_MODE),
        off_reason: hex_or_zero(frame, FIELD_OFF_REASON),
        alarm: raw_u16(frame, FIELD_ALARM),
        warning: raw_u16(frame, FIELD_WARNING),
        temperature,
    }
}

fn build_battery(frame: &Frame) -> BatteryMessage {
    BatteryMessage {
        voltage: scaled(frame, FIELD_VOLTAGE, 1000.0),
        aux_voltage: scaled(frame, FIELD_AUX_VOLTAGE, 1000.0),
        current: scaled(frame, FIELD_CURRENT, 1000.0),
        power: raw_i16(frame, FIELD_POWER),
        consumed: scaled(frame, FIELD_CONSUMED, 1000.0),
        soc: raw_u16(frame, FIELD_SOC),
        time_to_go: raw_i16(frame, FIELD_TIME_TO_GO),
        alarm: raw_u16(frame, FIELD_ALARM),
    }
}

fn build_history(frame: &Frame, temperature: f32) -> BatteryHistoryMessage {
    BatteryHistoryMessage {
        deepest_discharge: scaled(frame, FIELD_DEEPEST_DISCHARGE, 1000.0),
        cycle_count: raw_u16(frame, FIELD_CYCLE_COUNT),
        min_voltage: scaled(frame, FIELD_MIN_VOLTAGE, 1000.0),
        max_voltage: scaled(frame, FIELD_MAX_VOLTAGE, 1000.0),
        discharged_energy: (raw(frame, FIELD_DISCHARGED_ENERGY) * 10) as f32,
        charged_energy: (raw(frame, FIELD_CHARGED_ENERGY) * 10) as f32,
        temperature,
    }
}

// ============================================================================
// Tests
// ============================================================================
