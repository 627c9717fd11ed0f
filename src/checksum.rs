pub type ChecksumAccum = u16;

const CHECKSUM_INIT: ChecksumAccum = 0;

/// 16-bit additive checksum: the plain sum of the bytes with natural
/// wraparound, no initial offset and no polynomial.
///
/// Reordering bytes, or errors that cancel out in the sum, go undetected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    val: ChecksumAccum,
}

impl Default for Checksum {
    fn default() -> Self {
        Self { val: CHECKSUM_INIT }
    }
}

impl Checksum {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn accum(&mut self, byte: u8) {
        self.val = self.val.wrapping_add(byte as ChecksumAccum);
    }

    pub fn accum_bytes(&mut self, bytes: &[u8]) -> ChecksumAccum {
        for byte in bytes.iter() {
            self.accum(*byte);
        }
        self.val
    }

    pub fn reset(&mut self) {
        self.val = CHECKSUM_INIT;
    }

    pub fn value(&self) -> ChecksumAccum {
        self.val
    }

    pub fn lsb(&self) -> u8 {
        (self.val & 0x00ff) as u8
    }

    pub fn msb(&self) -> u8 {
        ((self.val >> 8) & 0x00ff) as u8
    }

    /// Reassembles a checksum transmitted LSB first.
    pub fn from_le_bytes(lsb: u8, msb: u8) -> ChecksumAccum {
        ((msb as ChecksumAccum) << 8) | (lsb as ChecksumAccum)
    }
}
