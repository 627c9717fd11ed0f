use core::convert::Infallible;

use crate::callback::Source;
use crate::config::UartConfig;
use crate::exti::{Edge, ExtiLine};
use crate::Poll;

// Values are the bit positions in the status register.
c_like_enum! {
  /// Status bits of the serial peripheral.
  StatusFlag {
    /// The data register is empty and can take the next byte.
    TransmitReady = 5,
    /// The last byte has been shifted out completely.
    TransmitComplete = 6,
    /// A received byte is waiting in the data register.
    ReceiveComplete = 7,
  }
}

// Declared in hardware priority order, highest first.
c_like_enum! {
  /// The three interrupt sources of the serial peripheral.
  UartInterrupt {
    RxComplete = 0,
    DataRegisterEmpty = 1,
    TxComplete = 2,
  }
}

impl Source for UartInterrupt {
    fn index(self) -> usize {
        self as usize
    }
}

/// Register level access to the serial peripheral.
///
/// Implementors only provide the raw register operations. The byte-transfer
/// primitives everything else is built on are provided methods.
pub trait SerialPort {
    /// Programs baud rate, frame format and speed mode.
    fn configure(&mut self, config: &UartConfig);

    /// Writes the data register. Starts a transmission as a side effect.
    fn write_data(&mut self, byte: u8);

    /// Reads the data register. Clears the receive complete flag as a side
    /// effect.
    fn read_data(&mut self) -> u8;

    /// Reads a status bit.
    fn flag(&self, flag: StatusFlag) -> bool;

    fn set_transmitter(&mut self, enabled: bool);

    fn set_receiver(&mut self, enabled: bool);

    fn set_interrupt(&mut self, source: UartInterrupt, enabled: bool);

    /// Writes `byte` right away. The caller must know the data register is
    /// ready; nothing is reported if it wasn't.
    fn send_no_block(&mut self, byte: u8) {
        self.write_data(byte);
    }

    /// Writes `byte` if the data register is ready.
    fn try_send(&mut self, byte: u8) -> Poll<()> {
        if self.flag(StatusFlag::TransmitReady) {
            self.write_data(byte);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Spins until the data register is ready, then writes `byte`. There is
    /// no timeout.
    fn send_busy_wait(&mut self, byte: u8) {
        nb::block!(self.try_send(byte)).unwrap_or_else(|e: Infallible| match e {})
    }

    /// Reads the data register whether or not a byte arrived, so the value
    /// may be stale.
    fn receive_no_block(&mut self) -> u8 {
        self.read_data()
    }

    /// Checks the receive complete flag once. Returns the byte if one
    /// arrived, `WouldBlock` with no side effect otherwise.
    fn receive_periodic_check(&mut self) -> Poll<u8> {
        if self.flag(StatusFlag::ReceiveComplete) {
            Ok(self.read_data())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Spins until a byte has been received and returns it. There is no
    /// timeout.
    fn receive_busy_wait(&mut self) -> u8 {
        nb::block!(self.receive_periodic_check()).unwrap_or_else(|e: Infallible| match e {})
    }
}

/// Register level access to the external interrupt lines.
pub trait ExtiController {
    /// Selects the edge that fires `line`.
    fn set_trigger(&mut self, line: ExtiLine, edge: Edge);

    fn set_enabled(&mut self, line: ExtiLine, enabled: bool);
}

/// Sink for the blocking protocol paths.
pub trait WriteByte {
    fn write_byte(&mut self, byte: u8);

    fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_byte(*byte);
        }
    }
}

/// Source for the blocking protocol paths.
pub trait ReadByte {
    /// Returns the next byte, waiting for as long as it takes.
    fn read_byte(&mut self) -> u8;
}

/// Adapts a [`SerialPort`] to [`WriteByte`]/[`ReadByte`] using the
/// busy-wait primitives.
pub struct BusyWait<'a, P: ?Sized>(pub &'a mut P);

impl<P: SerialPort + ?Sized> WriteByte for BusyWait<'_, P> {
    fn write_byte(&mut self, byte: u8) {
        self.0.send_busy_wait(byte);
    }
}

impl<P: SerialPort + ?Sized> ReadByte for BusyWait<'_, P> {
    fn read_byte(&mut self) -> u8 {
        self.0.receive_busy_wait()
    }
}
