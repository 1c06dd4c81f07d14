//! Field tags and framing constants
//!
//! These constants name the VE.Direct text-mode fields consumed by the node.
//! Raw wire units are noted per tag; scaling to engineering units happens at
//! the point of use.

// ============================================================================
// Framing
// ============================================================================

/// Reserved field name that closes a frame. Devices send `Checksum`; names
/// are normalized to uppercase during accumulation before comparison.
pub const CHECKSUM_NAME: &str = "CHECKSUM";
/// Field names longer than this are truncated while parsing.
pub const MAX_NAME_LEN: usize = 8;
/// Field values longer than this are truncated while parsing.
pub const MAX_VALUE_LEN: usize = 32;

// ============================================================================
// Identity
// ============================================================================

/// Device product id, hex string (e.g. `0xA057`).
pub const FIELD_PID: &str = "PID";

// ============================================================================
// Battery / main channel
// ============================================================================

/// Battery or main channel voltage, mV.
pub const FIELD_VOLTAGE: &str = "V";
/// Battery or main channel current, mA.
pub const FIELD_CURRENT: &str = "I";
/// Secondary (starter) battery voltage, mV.
pub const FIELD_AUX_VOLTAGE: &str = "VS";
/// Instantaneous power, W, signed.
pub const FIELD_POWER: &str = "P";
/// Consumed charge, mAh, negative while discharging.
pub const FIELD_CONSUMED: &str = "CE";
/// State of charge, tenths of a percent.
pub const FIELD_SOC: &str = "SOC";
/// Time to go, minutes (`-1` while not discharging).
pub const FIELD_TIME_TO_GO: &str = "TTG";

// ============================================================================
// Charger (MPPT)
// ============================================================================

/// Panel voltage, mV.
pub const FIELD_PANEL_VOLTAGE: &str = "VPV";
/// Panel power, W.
pub const FIELD_PANEL_POWER: &str = "PPV";
/// Operating state (off/bulk/absorption/float...).
pub const FIELD_STATE: &str = "CS";
/// Tracker operation sub-state.
pub const FIELD_MPPT: &str = "MPPT";
/// Off-reason bitfield, hex string.
pub const FIELD_OFF_REASON: &str = "OR";
/// Device error code.
pub const FIELD_ERROR: &str = "ERR";
/// Yield today, 0.01 kWh increments.
pub const FIELD_YIELD_TODAY: &str = "H20";
/// Peak power today, W.
pub const FIELD_PEAK_POWER: &str = "H21";

// ============================================================================
// Inverter
// ============================================================================

/// AC output current, 0.1 A increments.
pub const FIELD_AC_CURRENT: &str = "AC_OUT_I";
/// AC output voltage, 0.01 V increments.
pub const FIELD_AC_VOLTAGE: &str = "AC_OUT_V";
/// AC apparent power, VA.
pub const FIELD_AC_APPARENT_POWER: &str = "AC_OUT_S";
/// Device mode, signed (inverter on / off / eco).
pub const FIELD_MODE: &str = "MODE";
/// Alarm reason bitfield.
pub const FIELD_ALARM: &str = "AR";
/// Warning reason bitfield.
pub const FIELD_WARNING: &str = "WARN";

// ============================================================================
// Battery monitor history
// ============================================================================

/// Deepest discharge, mAh.
pub const FIELD_DEEPEST_DISCHARGE: &str = "H2";
/// Charge cycle count.
pub const FIELD_CYCLE_COUNT: &str = "H4";
/// Minimum recorded voltage, mV.
pub const FIELD_MIN_VOLTAGE: &str = "H7";
/// Maximum recorded voltage, mV.
pub const FIELD_MAX_VOLTAGE: &str = "H15";
/// Discharged energy, 0.01 kWh increments.
pub const FIELD_DISCHARGED_ENERGY: &str = "H17";
/// Charged energy, 0.01 kWh increments.
pub const FIELD_CHARGED_ENERGY: &str = "H18";
