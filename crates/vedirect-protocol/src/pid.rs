//! Device identification from the `PID` field.
//!
//! Victron publishes a product ID per device model. We only need the coarse
//! device class, so the tables below list the model IDs per class and
//! [`classify`] maps an ID to its class.

/// Coarse device class behind a VE.Direct port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// MPPT solar charge controllers (BlueSolar, SmartSolar).
    ChargeController,
    /// Phoenix inverters.
    Inverter,
    /// BMV and SmartShunt battery monitors.
    BatteryMonitor,
}

/// Product IDs of MPPT charge controllers.
pub const CHARGE_CONTROLLER_IDS: &[u16] = &[
    0xA040, // BlueSolar MPPT 75|50
    0xA041, // BlueSolar MPPT 150|35
    0xA042, // BlueSolar MPPT 75|15
    0xA043, // BlueSolar MPPT 100|15
    0xA044, // BlueSolar MPPT 100|30
    0xA045, // BlueSolar MPPT 100|50
    0xA046, // BlueSolar MPPT 150|70
    0xA047, // BlueSolar MPPT 150|100
    0xA049, // BlueSolar MPPT 100|50 rev2
    0xA04A, // BlueSolar MPPT 100|30 rev2
    0xA04B, // BlueSolar MPPT 150|35 rev2
    0xA04C, // BlueSolar MPPT 75|10
    0xA04D, // BlueSolar MPPT 150|45
    0xA04E, // BlueSolar MPPT 150|60
    0xA04F, // BlueSolar MPPT 150|85
    0xA050, // SmartSolar MPPT 250|100
    0xA051, // SmartSolar MPPT 150|100
    0xA052, // SmartSolar MPPT 150|85
    0xA053, // SmartSolar MPPT 75|15
    0xA054, // SmartSolar MPPT 75|10
    0xA055, // SmartSolar MPPT 100|15
    0xA056, // SmartSolar MPPT 100|30
    0xA057, // SmartSolar MPPT 100|50
    0xA058, // SmartSolar MPPT 150|35
    0xA059, // SmartSolar MPPT 150|100 rev2
    0xA05A, // SmartSolar MPPT 150|85 rev2
    0xA05B, // SmartSolar MPPT 250|70
    0xA05C, // SmartSolar MPPT 250|85
    0xA05D, // SmartSolar MPPT 250|60
    0xA05E, // SmartSolar MPPT 250|45
    0xA05F, // SmartSolar MPPT 100|20
    0xA060, // SmartSolar MPPT 100|20 48V
    0xA061, // SmartSolar MPPT 150|45
    0xA062, // SmartSolar MPPT 150|60
    0xA063, // SmartSolar MPPT 150|70
    0xA064, // SmartSolar MPPT 250|85 rev2
    0xA065, // SmartSolar MPPT 250|100 rev2
    0xA066, // BlueSolar MPPT 100|20
    0xA067, // BlueSolar MPPT 100|20 48V
    0xA068, // SmartSolar MPPT 250|60 rev2
    0xA069, // SmartSolar MPPT 250|70 rev2
    0xA06A, // SmartSolar MPPT 150|45 rev2
    0xA06B, // SmartSolar MPPT 150|60 rev2
    0xA06C, // SmartSolar MPPT 150|70 rev2
    0xA06D, // SmartSolar MPPT 150|85 rev3
    0xA06E, // SmartSolar MPPT 150|100 rev3
];

/// Product IDs of Phoenix inverters.
pub const INVERTER_IDS: &[u16] = &[
    0xA201, // Phoenix Inverter 12V 250VA 230V
    0xA202, // Phoenix Inverter 24V 250VA 230V
    0xA204, // Phoenix Inverter 48V 250VA 230V
    0xA211, // Phoenix Inverter 12V 375VA 230V
    0xA212, // Phoenix Inverter 24V 375VA 230V
    0xA214, // Phoenix Inverter 48V 375VA 230V
    0xA221, // Phoenix Inverter 12V 500VA 230V
    0xA222, // Phoenix Inverter 24V 500VA 230V
    0xA224, // Phoenix Inverter 48V 500VA 230V
    0xA231, // Phoenix Inverter 12V 250VA 230V
    0xA232, // Phoenix Inverter 24V 250VA 230V
    0xA234, // Phoenix Inverter 48V 250VA 230V
    0xA239, // Phoenix Inverter 12V 250VA 120V
    0xA23A, // Phoenix Inverter 24V 250VA 120V
    0xA23C, // Phoenix Inverter 48V 250VA 120V
    0xA241, // Phoenix Inverter 12V 375VA 230V
    0xA242, // Phoenix Inverter 24V 375VA 230V
    0xA244, // Phoenix Inverter 48V 375VA 230V
    0xA249, // Phoenix Inverter 12V 375VA 120V
    0xA24A, // Phoenix Inverter 24V 375VA 120V
    0xA24C, // Phoenix Inverter 48V 375VA 120V
    0xA251, // Phoenix Inverter 12V 500VA 230V
    0xA252, // Phoenix Inverter 24V 500VA 230V
    0xA254, // Phoenix Inverter 48V 500VA 230V
    0xA259, // Phoenix Inverter 12V 500VA 120V
    0xA25A, // Phoenix Inverter 24V 500VA 120V
    0xA25C, // Phoenix Inverter 48V 500VA 120V
    0xA261, // Phoenix Inverter 12V 800VA 230V
    0xA262, // Phoenix Inverter 24V 800VA 230V
    0xA264, // Phoenix Inverter 48V 800VA 230V
    0xA269, // Phoenix Inverter 12V 800VA 120V
    0xA26A, // Phoenix Inverter 24V 800VA 120V
    0xA26C, // Phoenix Inverter 48V 800VA 120V
    0xA271, // Phoenix Inverter 12V 1200VA 230V
    0xA272, // Phoenix Inverter 24V 1200VA 230V
    0xA274, // Phoenix Inverter 48V 1200VA 230V
    0xA279, // Phoenix Inverter 12V 1200VA 120V
    0xA27A, // Phoenix Inverter 24V 1200VA 120V
    0xA27C, // Phoenix Inverter 48V 1200VA 120V
    0xA2FA, // Phoenix Inverter 12V 1600VA 230V Smart
    0xA2FB, // Phoenix Inverter 24V 1600VA 230V Smart
    0xA2FC, // Phoenix Inverter 48V 1600VA 230V Smart
    0xA2FD, // Phoenix Inverter 12V 2000VA 230V Smart
    0xA2FE, // Phoenix Inverter 24V 2000VA 230V Smart
];

/// Product IDs of battery monitors.
pub const BATTERY_MONITOR_IDS: &[u16] = &[
    0x0203, // BMV-700
    0x0204, // BMV-702
    0x0205, // BMV-700H
    0xA381, // BMV-712 Smart
    0xA382, // BMV-710H Smart
    0xA383, // BMV-712 Smart rev2
    0xA389, // SmartShunt 500A/50mV
    0xA38A, // SmartShunt 1000A/50mV
    0xA38B, // SmartShunt 2000A/50mV
];

/// Look up the device class for a product ID. Unknown IDs return `None`.
pub fn classify(pid: u16) -> Option<DeviceClass> {
    if CHARGE_CONTROLLER_IDS.contains(&pid) {
        Some(DeviceClass::ChargeController)
    } else if INVERTER_IDS.contains(&pid) {
        Some(DeviceClass::Inverter)
    } else if BATTERY_MONITOR_IDS.contains(&pid) {
        Some(DeviceClass::BatteryMonitor)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids_classify() {
        assert_eq!(classify(0xA057), Some(DeviceClass::ChargeController));
        assert_eq!(classify(0xA2FA), Some(DeviceClass::Inverter));
        assert_eq!(classify(0x0203), Some(DeviceClass::BatteryMonitor));
        assert_eq!(classify(0xA389), Some(DeviceClass::BatteryMonitor));
    }

    #[test]
    fn test_unknown_id_is_none() {
        assert_eq!(classify(0x0000), None);
        assert_eq!(classify(0xFFFF), None);
        assert_eq!(classify(0xA300), None);
    }

    #[test]
    fn test_class_tables_are_disjoint() {
        for pid in CHARGE_CONTROLLER_IDS {
            assert!(!INVERTER_IDS.contains(pid));
            assert!(!BATTERY_MONITOR_IDS.contains(pid));
        }
        for pid in INVERTER_IDS {
            assert!(!BATTERY_MONITOR_IDS.contains(pid));
        }
    }
}
