//! Serial line configuration and build-time capacities.

use typenum::{U10, U255, U256};

/// String terminator used by the Proteus virtual terminal (carriage return).
pub const PROTEUS_VT_TERMINATOR: u8 = 0x0d;

/// Classic NUL string terminator.
pub const NULL_TERMINATOR: u8 = 0x00;

pub const DEFAULT_TERMINATOR: u8 = PROTEUS_VT_TERMINATOR;

/// Number of bytes the receive stack can hold.
pub type StackCapacity = U10;

/// Size of the buffers owned by the asynchronous transfer engine. The
/// transfer cursor covers 0..=255, so 256 bytes is the largest useful size.
pub type TransferCapacity = U256;

/// Largest payload a checksum frame can carry (the length field is one byte).
pub type FramePayloadCapacity = U255;

c_like_enum! {
  SpeedMode {
    Normal = 0,
    Double = 1,
  }
}

c_like_enum! {
  CpuFrequency {
    Mhz4 = 0,
    Mhz8 = 1,
    Mhz16 = 2,
  }
}

c_like_enum! {
  BaudRate {
    B2400 = 0,
    B4800 = 1,
    B9600 = 2,
    B14400 = 3,
    B19200 = 4,
    B28800 = 5,
  }
}

c_like_enum! {
  SyncMode {
    Synchronous = 0,
    Asynchronous = 1,
  }
}

// Values are the UPM1:UPM0 bit pattern.
c_like_enum! {
  Parity {
    Disabled = 0,
    Even = 2,
    Odd = 3,
  }
}

c_like_enum! {
  DataBits {
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
  }
}

c_like_enum! {
  StopBits {
    One = 1,
    Two = 2,
  }
}

// Indexed by [speed mode][cpu frequency][baud rate].
const BAUD_DIVISORS: [[[u16; 6]; 3]; 2] = [
    [
        [103, 51, 25, 16, 12, 8],
        [207, 103, 51, 34, 25, 16],
        [416, 207, 103, 68, 51, 34],
    ],
    [
        [207, 103, 51, 34, 25, 16],
        [416, 207, 103, 68, 51, 34],
        [832, 416, 207, 138, 103, 68],
    ],
];

/// Settings handed to [`SerialPort::configure`] by [`Serial::init`].
///
/// [`SerialPort::configure`]: ../traits/trait.SerialPort.html#tymethod.configure
/// [`Serial::init`]: ../struct.Serial.html#method.init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub speed: SpeedMode,
    pub cpu: CpuFrequency,
    pub baud: BaudRate,
    pub sync: SyncMode,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,

    /// Sentinel byte that ends a string for every non-frame string API.
    pub terminator: u8,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            speed: SpeedMode::Double,
            cpu: CpuFrequency::Mhz8,
            baud: BaudRate::B9600,
            sync: SyncMode::Asynchronous,
            parity: Parity::Odd,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::Two,
            terminator: DEFAULT_TERMINATOR,
        }
    }
}

impl UartConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_terminator(mut self, terminator: u8) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_baud(mut self, baud: BaudRate) -> Self {
        self.baud = baud;
        self
    }

    /// Value for the baud rate register.
    pub fn baud_divisor(&self) -> u16 {
        BAUD_DIVISORS[self.speed as usize][self.cpu as usize][self.baud as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_board() {
        let config = UartConfig::default();
        assert_eq!(config.terminator, 0x0d);
        assert_eq!(config.parity, Parity::Odd);
        assert_eq!(config.stop_bits, StopBits::Two);
        assert_eq!(config.baud_divisor(), 103);
    }

    #[test]
    fn test_baud_divisor() {
        let mut config = UartConfig::new().with_baud(BaudRate::B2400);
        config.speed = SpeedMode::Normal;
        config.cpu = CpuFrequency::Mhz16;
        assert_eq!(config.baud_divisor(), 416);

        config.speed = SpeedMode::Double;
        config.baud = BaudRate::B28800;
        assert_eq!(config.baud_divisor(), 68);

        config.cpu = CpuFrequency::Mhz4;
        config.speed = SpeedMode::Normal;
        assert_eq!(config.baud_divisor(), 8);
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(Parity::from_u8(3), Some(Parity::Odd));
        assert_eq!(Parity::from_u8(1), None);
        assert_eq!(DataBits::from_u8(9), Some(DataBits::Nine));
        assert_eq!(BaudRate::ALL.len(), 6);
        assert_eq!(
            UartConfig::new().with_terminator(NULL_TERMINATOR).terminator,
            0
        );
    }
}
