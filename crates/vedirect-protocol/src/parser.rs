//! Byte-oriented frame parser.
//!
//! The parser is a state machine fed one byte at a time from the serial
//! receive buffer. It reconstructs tab-separated records, accumulates them
//! into a [`Frame`], and verifies the trailing checksum record:
//!
//! ```text
//! IDLE --\n--> RECORD_BEGIN --> RECORD_NAME --\t--> RECORD_VALUE --\n--+
//!   ^                              |                                   |
//!   |                              +--\t, name == CHECKSUM             |
//!   |                              v                                   |
//!   +------------------- CHECKSUM_RECORD <---+      (commit, next record)
//! ```
//!
//! A `:` byte anywhere outside the checksum record diverts into a hex-record
//! side state; hex payloads are unsupported and drained until their `\n`
//! terminator, without touching the checksum accumulator or the partial
//! frame. Every transition is defined for every byte value, so line noise
//! can degrade data but never wedge the automaton.

use log::{debug, trace};

use crate::fields::{CHECKSUM_NAME, MAX_NAME_LEN, MAX_VALUE_LEN};
use crate::frame::Frame;

/// Bounded accumulation buffer for field text.
///
/// Bytes past the capacity are counted but not stored, so an oversized field
/// truncates instead of faulting or desynchronizing the checksum.
#[derive(Debug)]
struct FieldBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
    overflowed: bool,
}

impl<const N: usize> FieldBuf<N> {
    const fn new() -> Self {
        FieldBuf {
            buf: [0; N],
            len: 0,
            overflowed: false,
        }
    }

    fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    fn push(&mut self, byte: u8) {
        if self.len < N {
            self.buf[self.len] = byte;
            self.len += 1;
        } else {
            self.overflowed = true;
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Parser states. `HexRecord` is the side state; the rest form the record
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Waiting for the line feed that opens the next record.
    Idle,
    /// A record just opened; the next byte starts the field name.
    RecordBegin,
    /// Accumulating the field name until a tab.
    RecordName,
    /// Accumulating the field value until a line feed.
    RecordValue,
    /// Checksum record recognized; the next byte closes the frame.
    ChecksumRecord,
    /// Draining an unsupported hex record until its `\n` terminator.
    HexRecord,
}

/// Outcome of a completed frame, delivered synchronously from
/// [`FrameParser::feed`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Checksum verified; the accumulated fields are handed over.
    Valid(Frame),
    /// Nonzero checksum residue; the frame content was discarded.
    InvalidChecksum,
    /// A checksum record closed a frame that carried no fields.
    Empty,
}

/// Running totals kept by the parser.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParserStats {
    /// Frames that passed checksum validation.
    pub frames_valid: u64,
    /// Frames rejected for a nonzero checksum residue.
    pub frames_invalid: u64,
    /// Checksum records that closed an empty frame.
    pub frames_empty: u64,
    /// Hex records drained and dropped.
    pub hex_records: u64,
    /// Committed fields whose name or value hit its length bound.
    pub fields_truncated: u64,
}

/// Incremental VE.Direct text-frame parser.
#[derive(Debug)]
pub struct FrameParser {
    state: ParserState,
    checksum: u8,
    name: FieldBuf<MAX_NAME_LEN>,
    value: FieldBuf<MAX_VALUE_LEN>,
    frame: Frame,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        FrameParser::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        FrameParser {
            state: ParserState::Idle,
            checksum: 0,
            name: FieldBuf::new(),
            value: FieldBuf::new(),
            frame: Frame::new(),
            stats: ParserStats::default(),
        }
    }

    /// Consume one received byte. Never blocks; returns the frame-complete
    /// event when this byte closed a frame.
    pub fn feed(&mut self, byte: u8) -> Option<FrameEvent> {
        // A hex record can interrupt the text stream anywhere except the
        // checksum byte itself. Its trigger, payload, and terminator stay
        // out of the checksum.
        if byte == b':'
            && self.state != ParserState::ChecksumRecord
            && self.state != ParserState::HexRecord
        {
            self.state = ParserState::HexRecord;
            self.stats.hex_records += 1;
            trace!("FrameParser: hex record started, draining");
            return None;
        }
        if self.state != ParserState::HexRecord {
            self.checksum = self.checksum.wrapping_add(byte);
        }

        match self.state {
            ParserState::Idle => {
                if byte == b'\n' {
                    self.state = ParserState::RecordBegin;
                }
                None
            }
            ParserState::RecordBegin => {
                self.name.clear();
                self.state = ParserState::RecordName;
                self.on_name_byte(byte);
                None
            }
            ParserState::RecordName => {
                self.on_name_byte(byte);
                None
            }
            ParserState::RecordValue => {
                match byte {
                    b'\n' => {
                        self.commit_field();
                        self.state = ParserState::RecordBegin;
                    }
                    b'\r' => {}
                    _ => self.value.push(byte),
                }
                None
            }
            ParserState::ChecksumRecord => Some(self.close_frame()),
            ParserState::HexRecord => {
                if byte == b'\n' {
                    self.state = ParserState::Idle;
                }
                None
            }
        }
    }

    /// Discard any partial frame and return to `Idle`. Used on power
    /// transitions; normal error recovery happens inside [`feed`].
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.checksum = 0;
        self.name.clear();
        self.value.clear();
        self.frame = Frame::new();
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    fn on_name_byte(&mut self, byte: u8) {
        if byte == b'\t' {
            if !self.name.overflowed && self.name.as_bytes() == CHECKSUM_NAME.as_bytes() {
                self.state = ParserState::ChecksumRecord;
            } else {
                self.value.clear();
                self.state = ParserState::RecordValue;
            }
        } else {
            self.name.push(byte.to_ascii_uppercase());
        }
    }

    fn commit_field(&mut self) {
        if self.name.overflowed || self.value.overflowed {
            self.stats.fields_truncated += 1;
        }
        let name = String::from_utf8_lossy(self.name.as_bytes()).into_owned();
        let value = String::from_utf8_lossy(self.value.as_bytes()).into_owned();
        trace!("FrameParser: field {}={}", name, value);
        self.frame.insert(name, value);
    }

    fn close_frame(&mut self) -> FrameEvent {
        let event = if self.checksum != 0 {
            self.stats.frames_invalid += 1;
            debug!(
                "FrameParser: checksum residue 0x{:02X}, frame dropped",
                self.checksum
            );
            FrameEvent::InvalidChecksum
        } else if self.frame.is_empty() {
            self.stats.frames_empty += 1;
            debug!("FrameParser: empty frame dropped");
            FrameEvent::Empty
        } else {
            self.stats.frames_valid += 1;
            FrameEvent::Valid(self.frame.take())
        };
        self.frame = Frame::new();
        self.checksum = 0;
        self.state = ParserState::Idle;
        event
    }
}
