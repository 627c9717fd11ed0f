//! Length-prefixed, checksummed frames on top of the blocking primitives.
//!
//! A frame looks like this on the wire:
//!
//! ```text
//! LENGTH ...payload... CHECKSUM-LSB CHECKSUM-MSB
//! ```
//!
//! The checksum is the 16-bit sum of the payload bytes. There is no start
//! byte and nothing to resynchronize on: the length byte is trusted. If it
//! gets corrupted, the receiver reads the wrong number of payload bytes and
//! blocks for as long as the missing ones take to arrive (forever, if they
//! never do). The sum also can't see reordered bytes.

use core::fmt;
use log::{debug, warn};
use pretty_hex::*;

use crate::buffer::{payload_len, ByteBuffer};
use crate::checksum::{Checksum, ChecksumAccum};
use crate::config::FramePayloadCapacity;
use crate::traits::{ReadByte, WriteByte};

pub const MAX_PAYLOAD: usize = 255;

pub type FramePayload = ByteBuffer<FramePayloadCapacity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The checksum computed over the received payload doesn't match the
    /// one that was transmitted. Retransmission is up to the caller.
    ChecksumMismatch {
        calculated: ChecksumAccum,
        received: ChecksumAccum,
    },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ChecksumMismatch {
                calculated,
                received,
            } => write!(
                f,
                "checksum mismatch: calculated {:04x} received {:04x}",
                calculated, received
            ),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Frame {
    payload: FramePayload,
    checksum: Checksum,
}

impl Frame {
    /// Builds a frame from the bytes of `data` preceding `terminator`. Only
    /// the first 255 of those fit in a frame; the rest is dropped.
    pub fn new(data: &[u8], terminator: u8) -> Self {
        let len = payload_len(data, terminator);
        if len > MAX_PAYLOAD {
            warn!(
                "Frame payload of {} bytes truncated to {}",
                len, MAX_PAYLOAD
            );
        }
        let payload = FramePayload::from_slice(&data[..len.min(MAX_PAYLOAD)]);
        let mut checksum = Checksum::new();
        checksum.accum_bytes(payload.data());
        Frame { payload, checksum }
    }

    pub fn len(&self) -> u8 {
        self.payload.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.data()
    }

    pub fn checksum(&self) -> ChecksumAccum {
        self.checksum.value()
    }

    /// Writes the frame out, checksum LSB first.
    pub fn write_to<W: WriteByte + ?Sized>(&self, writer: &mut W) {
        debug!("Sending frame len: {} checksum: {:04x}", self.len(), self.checksum());
        writer.write_byte(self.len());
        writer.write_bytes(self.payload.data());
        writer.write_byte(self.checksum.lsb());
        writer.write_byte(self.checksum.msb());
    }

    /// Reads one frame. The payload is only returned if the checksum matches.
    pub fn read_from<R: ReadByte + ?Sized>(reader: &mut R) -> Result<Frame, FrameError> {
        let mut payload = FramePayload::new();
        read_frame(reader, &mut payload)?;
        let mut checksum = Checksum::new();
        checksum.accum_bytes(payload.data());
        Ok(Frame { payload, checksum })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame len: {} checksum: {:04x} {:?}",
            self.len(),
            self.checksum(),
            self.payload.data().hex_dump()
        )
    }
}

/// Encodes the bytes of `data` preceding `terminator` as a frame.
pub fn write_frame<W: WriteByte + ?Sized>(writer: &mut W, data: &[u8], terminator: u8) {
    Frame::new(data, terminator).write_to(writer);
}

/// Reads one frame into `payload`.
///
/// The payload is stored even when the checksum doesn't match, so the caller
/// can look at what arrived.
pub fn read_frame<R: ReadByte + ?Sized>(
    reader: &mut R,
    payload: &mut FramePayload,
) -> Result<(), FrameError> {
    payload.reset();
    let len = reader.read_byte();
    let mut checksum = Checksum::new();
    for _ in 0..len {
        let byte = reader.read_byte();
        checksum.accum(byte);
        // A u8 length always fits in the payload buffer.
        payload.append(byte).ok();
    }

    // LSB is transmitted first
    let lsb = reader.read_byte();
    let msb = reader.read_byte();
    let received = Checksum::from_le_bytes(lsb, msb);

    if checksum.value() != received {
        warn!(
            "Checksum mismatch: Rcvd {:04x} Expected {:04x} {:?}",
            received,
            checksum.value(),
            payload.data().hex_dump()
        );
        return Err(FrameError::ChecksumMismatch {
            calculated: checksum.value(),
            received,
        });
    }
    debug!("Received frame len: {}", len);
    Ok(())
}
