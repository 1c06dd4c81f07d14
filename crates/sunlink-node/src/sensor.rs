//! Environmental sensor seam.
//!
//! The router only consumes readings; acquisition (I2C driver, ADC sampling,
//! staleness tracking) lives behind [`SensorProvider`]. A reading carries its
//! own currency flag so the caller can tell a fresh value from one the driver
//! has been holding since before the staleness threshold.

/// One sensor value plus whether it is newer than the driver's staleness
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Measured value in engineering units.
    pub value: f32,
    /// True when the value is fresher than the staleness threshold.
    pub current: bool,
}

impl Reading {
    /// A fresh reading.
    pub const fn current(value: f32) -> Self {
        Reading {
            value,
            current: true,
        }
    }

    /// A reading older than the staleness threshold.
    pub const fn stale(value: f32) -> Self {
        Reading {
            value,
            current: false,
        }
    }
}

/// Environmental sensor collaborator consumed by the router and the
/// heartbeat path.
pub trait SensorProvider {
    /// True once the driver has completed at least one acquisition cycle.
    fn ready(&self) -> bool;

    /// Ambient temperature, degrees Celsius.
    fn temperature(&self) -> Reading;

    /// Relative humidity, percent.
    fn humidity(&self) -> Reading;

    /// Barometric pressure, hectopascals.
    fn baro_pressure(&self) -> Reading;

    /// Node supply battery voltage, volts.
    fn battery_voltage(&self) -> Reading;
}

/// Sensor with fixed values, for tests and stream replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSensor {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Barometric pressure in hectopascals.
    pub baro_pressure: f32,
    /// Supply battery voltage in volts.
    pub battery_voltage: f32,
    /// Reported by [`SensorProvider::ready`].
    pub ready: bool,
    /// Currency flag attached to every reading.
    pub current: bool,
}

impl Default for FixedSensor {
    fn default() -> Self {
        FixedSensor {
            temperature: 20.0,
            humidity: 45.0,
            baro_pressure: 1013.25,
            battery_voltage: 12.6,
            ready: true,
            current: true,
        }
    }
}

impl FixedSensor {
    /// Set the temperature value.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the readiness flag.
    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    /// Set the currency flag attached to every reading.
    pub fn with_current(mut self, current: bool) -> Self {
        self.current = current;
        self
    }
}

impl SensorProvider for FixedSensor {
    fn ready(&self) -> bool {
        self.ready
    }

    fn temperature(&self) -> Reading {
        Reading {
            value: self.temperature,
            current: self.current,
        }
    }

    fn humidity(&self) -> Reading {
        Reading {
            value: self.humidity,
            current: self.current,
        }
    }

    fn baro_pressure(&self) -> Reading {
        Reading {
            value: self.baro_pressure,
            current: self.current,
        }
    }

    fn battery_voltage(&self) -> Reading {
        Reading {
            value: self.battery_voltage,
            current: self.current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sensor_defaults_are_current() {
        let sensor = FixedSensor::default();
        assert!(sensor.ready());
        assert_eq!(sensor.temperature(), Reading::current(20.0));
        assert_eq!(sensor.battery_voltage().value, 12.6);
    }

    #[test]
    fn test_staleness_flows_through_every_reading() {
        let sensor = FixedSensor::default().with_current(false);
        assert!(sensor.ready());
        assert!(!sensor.temperature().current);
        assert!(!sensor.humidity().current);
        assert_eq!(sensor.temperature(), Reading::stale(20.0));
    }
}
