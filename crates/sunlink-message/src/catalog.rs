//! Message types and wire constants.

use std::fmt;

// ============================================================================
// Wire Constants
// ============================================================================

/// Largest encoded message size, which is also the fixed payload width of
/// the radio link. [`ChargerMessage`] fills it exactly.
pub const MAX_WIRE_LEN: usize = 32;

/// Wire ID of [`StatusMessage`].
pub const MSG_STATUS_ID: u8 = 1;
/// Wire ID of [`ChargerMessage`].
pub const MSG_CHARGER_ID: u8 = 2;
/// Wire ID of [`InverterMessage`].
pub const MSG_INVERTER_ID: u8 = 3;
/// Wire ID of [`BatteryMessage`].
pub const MSG_BATTERY_ID: u8 = 4;
/// Wire ID of [`BatteryHistoryMessage`].
pub const MSG_BATTERY_HISTORY_ID: u8 = 5;

/// Status flag bit: the VE.Direct device has stopped producing frames.
pub const STATUS_FLAG_COMM_FAILURE: u8 = 0x01;

// ============================================================================
// Message Types
// ============================================================================

/// Node health report. Sent on demand and as a heartbeat when the
/// VE.Direct side goes quiet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusMessage {
    /// Milliseconds since the node booted.
    pub uptime_ms: u32,
    /// Battery rail voltage measured by the node itself, in volts.
    pub battery_voltage: f32,
    /// Ambient temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Barometric pressure in hPa.
    pub baro_pressure: f32,
    /// Status bits (`STATUS_FLAG_*`).
    pub flags: u8,
}

impl StatusMessage {
    /// id(1) + uptime(4) + voltage(4) + temperature(4) + humidity(4) +
    /// pressure(4) + flags(1).
    pub const WIRE_LEN: usize = 22;
}

/// Telemetry from an MPPT solar charge controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargerMessage {
    /// Battery voltage in volts (`V`).
    pub battery_voltage: f32,
    /// Battery current in amps, negative when discharging (`I`).
    pub battery_current: f32,
    /// Panel voltage in volts (`VPV`).
    pub panel_voltage: f32,
    /// Panel power in watts (`PPV`).
    pub panel_power: f32,
    /// Charger operation state (`CS`).
    pub state: u8,
    /// MPPT tracker mode (`MPPT`).
    pub mppt_mode: u8,
    /// Device error code (`ERR`).
    pub error: u8,
    /// Off-reason bitmask (`OR`).
    pub off_reason: u32,
    /// Energy yielded today in watt-hours (`H20`).
    pub yield_today: u16,
    /// Peak power today in watts (`H21`).
    pub peak_power_today: u16,
    /// Ambient temperature at the node in degrees Celsius.
    pub temperature: f32,
}

impl ChargerMessage {
    /// id(1) + 4 voltages/currents/powers(16) + state(1) + mppt(1) +
    /// error(1) + off_reason(4) + yield(2) + peak(2) + temperature(4).
    pub const WIRE_LEN: usize = 32;
}

/// Telemetry from a Phoenix inverter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverterMessage {
    /// Battery voltage in volts (`V`).
    pub battery_voltage: f32,
    /// AC output current in amps (`AC_OUT_I`).
    pub ac_current: f32,
    /// AC output voltage in volts (`AC_OUT_V`).
    pub ac_voltage: f32,
    /// AC apparent power in VA (`AC_OUT_S`).
    pub ac_apparent_power: u16,
    /// Inverter operation state (`CS`).
    pub state: u8,
    /// Device mode (`MODE`), signed per the VE.Direct register.
    pub mode: i8,
    /// Off-reason bitmask (`OR`).
    pub off_reason: u32,
    /// Alarm bitmask (`AR`).
    pub alarm: u16,
    /// Warning bitmask (`WARN`).
    pub warning: u16,
    /// Ambient temperature at the node in degrees Celsius.
    pub temperature: f32,
}

impl InverterMessage {
    /// id(1) + battery(4) + ac_current(4) + ac_voltage(4) + apparent(2) +
    /// state(1) + mode(1) + off_reason(4) + alarm(2) + warning(2) +
    /// temperature(4).
    pub const WIRE_LEN: usize = 29;
}

/// Live readings from a BMV or SmartShunt battery monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryMessage {
    /// Main battery voltage in volts (`V`).
    pub voltage: f32,
    /// Auxiliary (starter) battery voltage in volts (`VS`).
    pub aux_voltage: f32,
    /// Battery current in amps, negative when discharging (`I`).
    pub current: f32,
    /// Instantaneous power in watts (`P`).
    pub power: i16,
    /// Consumed charge in amp-hours, negative below full (`CE`).
    pub consumed: f32,
    /// State of charge in tenths of a percent (`SOC`).
    pub soc: u16,
    /// Minutes until empty at the present rate, -1 when charging (`TTG`).
    pub time_to_go: i16,
    /// Alarm bitmask (`AR`).
    pub alarm: u16,
}

impl BatteryMessage {
    /// id(1) + voltage(4) + aux(4) + current(4) + power(2) + consumed(4) +
    /// soc(2) + ttg(2) + alarm(2).
    pub const WIRE_LEN: usize = 25;
}

/// History registers from a battery monitor. Sent on frames that carry
/// only `H*` fields and no product ID.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryHistoryMessage {
    /// Depth of the deepest discharge in amp-hours (`H2`).
    pub deepest_discharge: f32,
    /// Number of charge cycles (`H4`).
    pub cycle_count: u16,
    /// Minimum main battery voltage seen, in volts (`H7`).
    pub min_voltage: f32,
    /// Maximum main battery voltage seen, in volts (`H15`).
    pub max_voltage: f32,
    /// Total energy drawn in watt-hours (`H17`).
    pub discharged_energy: f32,
    /// Total energy absorbed in watt-hours (`H18`).
    pub charged_energy: f32,
    /// Ambient temperature at the node in degrees Celsius.
    pub temperature: f32,
}

impl BatteryHistoryMessage {
    /// id(1) + deepest(4) + cycles(2) + min(4) + max(4) + discharged(4) +
    /// charged(4) + temperature(4).
    pub const WIRE_LEN: usize = 27;
}

// ============================================================================
// Message Enum
// ============================================================================

/// Any payload the node can transmit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Status(StatusMessage),
    Charger(ChargerMessage),
    Inverter(InverterMessage),
    Battery(BatteryMessage),
    BatteryHistory(BatteryHistoryMessage),
}

/// Message kind without the payload. Used for queue bookkeeping, where
/// newer telemetry of the same kind supersedes older.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Status,
    Charger,
    Inverter,
    Battery,
    BatteryHistory,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Status(_) => MessageKind::Status,
            Message::Charger(_) => MessageKind::Charger,
            Message::Inverter(_) => MessageKind::Inverter,
            Message::Battery(_) => MessageKind::Battery,
            Message::BatteryHistory(_) => MessageKind::BatteryHistory,
        }
    }

    /// Wire ID written as the first encoded byte.
    pub fn id(&self) -> u8 {
        match self {
            Message::Status(_) => MSG_STATUS_ID,
            Message::Charger(_) => MSG_CHARGER_ID,
            Message::Inverter(_) => MSG_INVERTER_ID,
            Message::Battery(_) => MSG_BATTERY_ID,
            Message::BatteryHistory(_) => MSG_BATTERY_HISTORY_ID,
        }
    }

    /// Encoded size in bytes.
    pub fn wire_len(&self) -> usize {
        match self {
            Message::Status(_) => StatusMessage::WIRE_LEN,
            Message::Charger(_) => ChargerMessage::WIRE_LEN,
            Message::Inverter(_) => InverterMessage::WIRE_LEN,
            Message::Battery(_) => BatteryMessage::WIRE_LEN,
            Message::BatteryHistory(_) => BatteryHistoryMessage::WIRE_LEN,
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Status => "status",
            MessageKind::Charger => "charger",
            MessageKind::Inverter => "inverter",
            MessageKind::Battery => "battery",
            MessageKind::BatteryHistory => "battery-history",
        };
        f.write_str(name)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "up={}ms, V={:.2}V, T={:.1}C, H={:.1}%, P={:.1}hPa, flags=0x{:02X}",
            self.uptime_ms,
            self.battery_voltage,
            self.temperature,
            self.humidity,
            self.baro_pressure,
            self.flags
        )
    }
}

impl fmt::Display for ChargerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V={:.2}V, I={:.2}A, VPV={:.2}V, PPV={:.1}W, CS={}, MPPT={}, ERR={}, \
             OR=0x{:08X}, H20={}Wh, H21={}W, T={:.1}C",
            self.battery_voltage,
            self.battery_current,
            self.panel_voltage,
            self.panel_power,
            self.state,
            self.mppt_mode,
            self.error,
            self.off_reason,
            self.yield_today,
            self.peak_power_today,
            self.temperature
        )
    }
}

impl fmt::Display for InverterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V={:.2}V, AC_I={:.2}A, AC_V={:.1}V, AC_S={}VA, CS={}, MODE={}, \
             OR=0x{:08X}, AR=0x{:04X}, WARN=0x{:04X}, T={:.1}C",
            self.battery_voltage,
            self.ac_current,
            self.ac_voltage,
            self.ac_apparent_power,
            self.state,
            self.mode,
            self.off_reason,
            self.alarm,
            self.warning,
            self.temperature
        )
    }
}

impl fmt::Display for BatteryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V={:.2}V, VS={:.2}V, I={:.2}A, P={}W, CE={:.1}Ah, SOC={:.1}%, \
             TTG={}min, AR=0x{:04X}",
            self.voltage,
            self.aux_voltage,
            self.current,
            self.power,
            self.consumed,
            f32::from(self.soc) / 10.0,
            self.time_to_go,
            self.alarm
        )
    }
}

impl fmt::Display for BatteryHistoryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H2={:.1}Ah, H4={}, H7={:.2}V, H15={:.2}V, H17={:.0}Wh, H18={:.0}Wh, T={:.1}C",
            self.deepest_discharge,
            self.cycle_count,
            self.min_voltage,
            self.max_voltage,
            self.discharged_energy,
            self.charged_energy,
            self.temperature
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind())?;
        match self {
            Message::Status(m) => m.fmt(f),
            Message::Charger(m) => m.fmt(f),
            Message::Inverter(m) => m.fmt(f),
            Message::Battery(m) => m.fmt(f),
            Message::BatteryHistory(m) => m.fmt(f),
        }
    }
}
