//! Message encoding and decoding.
//!
//! Every message encodes to `id(1) + fields`, all multi-byte fields
//! little-endian, at a fixed size per ID. Decoding dispatches on the ID
//! byte and requires the exact layout length; anything else is rejected
//! before any field is read.

use crate::catalog::{
    BatteryHistoryMessage, BatteryMessage, ChargerMessage, InverterMessage, Message,
    StatusMessage, MSG_BATTERY_HISTORY_ID, MSG_BATTERY_ID, MSG_CHARGER_ID, MSG_INVERTER_ID,
    MSG_STATUS_ID,
};
use crate::error::DecodeError;

// ============================================================================
// Encoding
// ============================================================================

/// Encode a message to bytes. The first byte is the message ID.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.wire_len());
    buf.push(msg.id());
    match msg {
        Message::Status(m) => encode_status(m, &mut buf),
        Message::Charger(m) => encode_charger(m, &mut buf),
        Message::Inverter(m) => encode_inverter(m, &mut buf),
        Message::Battery(m) => encode_battery(m, &mut buf),
        Message::BatteryHistory(m) => encode_battery_history(m, &mut buf),
    }
    debug_assert_eq!(buf.len(), msg.wire_len());
    buf
}

/// Format: uptime_ms(4) + battery_voltage(4) + temperature(4) +
/// humidity(4) + baro_pressure(4) + flags(1)
fn encode_status(msg: &StatusMessage, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&msg.uptime_ms.to_le_bytes());
    buf.extend_from_slice(&msg.battery_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.temperature.to_le_bytes());
    buf.extend_from_slice(&msg.humidity.to_le_bytes());
    buf.extend_from_slice(&msg.baro_pressure.to_le_bytes());
    buf.push(msg.flags);
}

/// Format: battery_voltage(4) + battery_current(4) + panel_voltage(4) +
/// panel_power(4) + state(1) + mppt_mode(1) + error(1) + off_reason(4) +
/// yield_today(2) + peak_power_today(2) + temperature(4)
fn encode_charger(msg: &ChargerMessage, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&msg.battery_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.battery_current.to_le_bytes());
    buf.extend_from_slice(&msg.panel_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.panel_power.to_le_bytes());
    buf.push(msg.state);
    buf.push(msg.mppt_mode);
    buf.push(msg.error);
    buf.extend_from_slice(&msg.off_reason.to_le_bytes());
    buf.extend_from_slice(&msg.yield_today.to_le_bytes());
    buf.extend_from_slice(&msg.peak_power_today.to_le_bytes());
    buf.extend_from_slice(&msg.temperature.to_le_bytes());
}

/// Format: battery_voltage(4) + ac_current(4) + ac_voltage(4) +
/// ac_apparent_power(2) + state(1) + mode(1) + off_reason(4) + alarm(2) +
/// warning(2) + temperature(4)
fn encode_inverter(msg: &InverterMessage, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&msg.battery_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.ac_current.to_le_bytes());
    buf.extend_from_slice(&msg.ac_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.ac_apparent_power.to_le_bytes());
    buf.push(msg.state);
    buf.extend_from_slice(&msg.mode.to_le_bytes());
    buf.extend_from_slice(&msg.off_reason.to_le_bytes());
    buf.extend_from_slice(&msg.alarm.to_le_bytes());
    buf.extend_from_slice(&msg.warning.to_le_bytes());
    buf.extend_from_slice(&msg.temperature.to_le_bytes());
}

/// Format: voltage(4) + aux_voltage(4) + current(4) + power(2) +
/// consumed(4) + soc(2) + time_to_go(2) + alarm(2)
fn encode_battery(msg: &BatteryMessage, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&msg.voltage.to_le_bytes());
    buf.extend_from_slice(&msg.aux_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.current.to_le_bytes());
    buf.extend_from_slice(&msg.power.to_le_bytes());
    buf.extend_from_slice(&msg.consumed.to_le_bytes());
    buf.extend_from_slice(&msg.soc.to_le_bytes());
    buf.extend_from_slice(&msg.time_to_go.to_le_bytes());
    buf.extend_from_slice(&msg.alarm.to_le_bytes());
}

/// Format: deepest_discharge(4) + cycle_count(2) + min_voltage(4) +
/// max_voltage(4) + discharged_energy(4) + charged_energy(4) +
/// temperature(4)
fn encode_battery_history(msg: &BatteryHistoryMessage, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&msg.deepest_discharge.to_le_bytes());
    buf.extend_from_slice(&msg.cycle_count.to_le_bytes());
    buf.extend_from_slice(&msg.min_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.max_voltage.to_le_bytes());
    buf.extend_from_slice(&msg.discharged_energy.to_le_bytes());
    buf.extend_from_slice(&msg.charged_energy.to_le_bytes());
    buf.extend_from_slice(&msg.temperature.to_le_bytes());
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a received payload.
pub fn decode_message(data: &[u8]) -> Result<Message, DecodeError> {
    let id = *data.first().ok_or(DecodeError::Empty)?;
    match id {
        MSG_STATUS_ID => decode_status(data).map(Message::Status),
        MSG_CHARGER_ID => decode_charger(data).map(Message::Charger),
        MSG_INVERTER_ID => decode_inverter(data).map(Message::Inverter),
        MSG_BATTERY_ID => decode_battery(data).map(Message::Battery),
        MSG_BATTERY_HISTORY_ID => decode_battery_history(data).map(Message::BatteryHistory),
        other => Err(DecodeError::UnknownId(other)),
    }
}

fn check_len(id: u8, expected: usize, data: &[u8]) -> Result<(), DecodeError> {
    if data.len() != expected {
        return Err(DecodeError::WrongLength {
            id,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn decode_status(data: &[u8]) -> Result<StatusMessage, DecodeError> {
    check_len(MSG_STATUS_ID, StatusMessage::WIRE_LEN, data)?;
    Ok(StatusMessage {
        uptime_ms: read_u32(data, 1),
        battery_voltage: read_f32(data, 5),
        temperature: read_f32(data, 9),
        humidity: read_f32(data, 13),
        baro_pressure: read_f32(data, 17),
        flags: data[21],
    })
}

fn decode_charger(data: &[u8]) -> Result<ChargerMessage, DecodeError> {
    check_len(MSG_CHARGER_ID, ChargerMessage::WIRE_LEN, data)?;
    Ok(ChargerMessage {
        battery_voltage: read_f32(data, 1),
        battery_current: read_f32(data, 5),
        panel_voltage: read_f32(data, 9),
        panel_power: read_f32(data, 13),
        state: data[17],
        mppt_mode: data[18],
        error: data[19],
        off_reason: read_u32(data, 20),
        yield_today: read_u16(data, 24),
        peak_power_today: read_u16(data, 26),
        temperature: read_f32(data, 28),
    })
}

fn decode_inverter(data: &[u8]) -> Result<InverterMessage, DecodeError> {
    check_len(MSG_INVERTER_ID, InverterMessage::WIRE_LEN, data)?;
    Ok(InverterMessage {
        battery_voltage: read_f32(data, 1),
        ac_current: read_f32(data, 5),
        ac_voltage: read_f32(data, 9),
        ac_apparent_power: read_u16(data, 13),
        state: data[15],
        mode: data[16] as i8,
        off_reason: read_u32(data, 17),
        alarm: read_u16(data, 21),
        warning: read_u16(data, 23),
        temperature: read_f32(data, 25),
    })
}

fn decode_battery(data: &[u8]) -> Result<BatteryMessage, DecodeError> {
    check_len(MSG_BATTERY_ID, BatteryMessage::WIRE_LEN, data)?;
    Ok(BatteryMessage {
        voltage: read_f32(data, 1),
        aux_voltage: read_f32(data, 5),
        current: read_f32(data, 9),
        power: read_i16(data, 13),
        consumed: read_f32(data, 15),
        soc: read_u16(data, 19),
        time_to_go: read_i16(data, 21),
        alarm: read_u16(data, 23),
    })
}

fn decode_battery_history(data: &[u8]) -> Result<BatteryHistoryMessage, DecodeError> {
    check_len(MSG_BATTERY_HISTORY_ID, BatteryHistoryMessage::WIRE_LEN, data)?;
    Ok(BatteryHistoryMessage {
        deepest_discharge: read_f32(data, 1),
        cycle_count: read_u16(data, 5),
        min_voltage: read_f32(data, 7),
        max_voltage: read_f32(data, 11),
        discharged_energy: read_f32(data, 15),
        charged_energy: read_f32(data, 19),
        temperature: read_f32(data, 23),
    })
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MAX_WIRE_LEN;

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::Status(StatusMessage {
                uptime_ms: 86_400_000,
                battery_voltage: 12.6,
                temperature: 21.5,
                humidity: 45.0,
                baro_pressure: 1013.25,
                flags: 0x01,
            }),
            Message::Charger(ChargerMessage {
                battery_voltage: 12.8,
                battery_current: -1.5,
                panel_voltage: 24.0,
                panel_power: 18.0,
                state: 3,
                mppt_mode: 2,
                error: 0,
                off_reason: 0x0000_0001,
                yield_today: 18_250,
                peak_power_today: 120,
                temperature: 21.5,
            }),
            Message::Inverter(InverterMessage {
                battery_voltage: 24.0,
                ac_current: 5.0,
                ac_voltage: 230.0,
                ac_apparent_power: 1200,
                state: 9,
                mode: 2,
                off_reason: 0,
                alarm: 0x0001,
                warning: 0x0040,
                temperature: 19.0,
            }),
            Message::Battery(BatteryMessage {
                voltage: 12.52,
                aux_voltage: 12.1,
                current: -2.4,
                power: -30,
                consumed: -24.1,
                soc: 875,
                time_to_go: -1,
                alarm: 0,
            }),
            Message::BatteryHistory(BatteryHistoryMessage {
                deepest_discharge: -102.4,
                cycle_count: 41,
                min_voltage: 11.2,
                max_voltage: 14.6,
                discharged_energy: 5230.0,
                charged_energy: 6120.0,
                temperature: 18.5,
            }),
        ]
    }

    #[test]
    fn test_every_variant_encodes_to_its_layout_size() {
        for msg in sample_messages() {
            let encoded = encode_message(&msg);
            assert_eq!(encoded.len(), msg.wire_len(), "{:?}", msg.kind());
            assert!(encoded.len() <= MAX_WIRE_LEN);
            assert_eq!(encoded[0], msg.id());
        }
    }

    #[test]
    fn test_every_variant_survives_a_roundtrip() {
        for msg in sample_messages() {
            let encoded = encode_message(&msg);
            let decoded = decode_message(&encoded).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn test_charger_layout_golden_bytes() {
        let msg = Message::Charger(ChargerMessage {
            battery_voltage: 12.8,
            battery_current: -1.5,
            off_reason: 0x0000_0001,
            yield_today: 18_250,
            temperature: 21.5,
            ..Default::default()
        });
        let encoded = encode_message(&msg);

        assert_eq!(encoded[0], MSG_CHARGER_ID);
        assert_eq!(&encoded[1..5], &12.8f32.to_le_bytes());
        assert_eq!(&encoded[5..9], &(-1.5f32).to_le_bytes());
        assert_eq!(&encoded[20..24], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(&encoded[24..26], &18_250u16.to_le_bytes());
        assert_eq!(&encoded[28..32], &21.5f32.to_le_bytes());
    }

    #[test]
    fn test_battery_preserves_signed_fields() {
        let msg = Message::Battery(BatteryMessage {
            current: -2.4,
            power: -30,
            time_to_go: -1,
            ..Default::default()
        });
        let decoded = decode_message(&encode_message(&msg)).unwrap();
        if let Message::Battery(m) = decoded {
            assert_eq!(m.power, -30);
            assert_eq!(m.time_to_go, -1);
            assert!((m.current - (-2.4)).abs() < f32::EPSILON);
        } else {
            panic!("Expected Battery message");
        }
    }

    #[test]
    fn test_decode_empty_payload_fails() {
        assert_eq!(decode_message(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn test_decode_unknown_id_fails() {
        let err = decode_message(&[0x2A, 0, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownId(0x2A));
    }

    #[test]
    fn test_decode_truncated_payload_fails() {
        let mut encoded = encode_message(&Message::Charger(ChargerMessage::default()));
        encoded.pop();
        let err = decode_message(&encoded).unwrap_err();
        assert_eq!(
            err,
            DecodeError::WrongLength {
                id: MSG_CHARGER_ID,
                expected: 32,
                actual: 31,
            }
        );
    }

    #[test]
    fn test_decode_padded_payload_fails() {
        let mut encoded = encode_message(&Message::Status(StatusMessage::default()));
        encoded.push(0);
        let err = decode_message(&encoded).unwrap_err();
        assert!(matches!(err, DecodeError::WrongLength { id: 1, .. }));
    }
}
