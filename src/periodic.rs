//! Transfers advanced by polling from the foreground loop.
//!
//! Each call sends at most one byte and returns straight away. The TX
//! complete interrupt only raises a flag saying the previous byte is out, so
//! the caller keeps calling until it gets `Ok(())`.

use core::fmt;
use log::{debug, warn};

use crate::buffer::payload_len;
use crate::traits::{SerialPort, UartInterrupt};
use crate::Serial;

/// An asynchronous send is still running, so a periodic-check send can't
/// start. Nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderBusy;

impl fmt::Display for SenderBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("asynchronous send in progress")
    }
}

pub(crate) struct PeriodicSender {
    active: bool,
    cursor: usize,
    tx_done: bool,
    terminator_sent: bool,
}

impl PeriodicSender {
    pub(crate) fn new() -> Self {
        Self {
            active: false,
            cursor: 0,
            tx_done: true,
            terminator_sent: false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    fn reset(&mut self) {
        self.active = false;
        self.cursor = 0;
        self.tx_done = true;
        self.terminator_sent = false;
    }

    /// One step of the transfer. `Ok(())` once every byte has been sent and
    /// the last one has left the shift register.
    fn poll<P: SerialPort + ?Sized>(
        &mut self,
        port: &mut P,
        data: &[u8],
        terminator: u8,
        append_terminator: bool,
    ) -> nb::Result<(), SenderBusy> {
        if !self.tx_done {
            return Err(nb::Error::WouldBlock);
        }

        let end = payload_len(data, terminator);
        if self.cursor < end {
            port.send_no_block(data[self.cursor]);
            self.cursor += 1;
            self.tx_done = false;
            return Err(nb::Error::WouldBlock);
        }

        if append_terminator && !self.terminator_sent {
            port.send_no_block(terminator);
            self.terminator_sent = true;
            self.tx_done = false;
            return Err(nb::Error::WouldBlock);
        }

        debug!("Periodic-check send of {} bytes complete", self.cursor);
        self.reset();
        Ok(())
    }
}

fn tx_done_handler<P: SerialPort, U>(serial: &mut Serial<P, U>) {
    serial.periodic.tx_done = true;
}

impl<P: SerialPort, U> Serial<P, U> {
    fn periodic_check(&mut self, data: &[u8], append_terminator: bool) -> nb::Result<(), SenderBusy> {
        if !self.periodic.active {
            if self.tx.is_busy() {
                warn!("Periodic-check send refused: asynchronous send running");
                return Err(nb::Error::Other(SenderBusy));
            }
            self.periodic.active = true;
            self.callbacks.set(UartInterrupt::TxComplete, tx_done_handler);
            self.port.set_interrupt(UartInterrupt::TxComplete, true);
        }

        let terminator = self.config.terminator;
        let result = self
            .periodic
            .poll(&mut self.port, data, terminator, append_terminator);
        if result.is_ok() {
            self.port.set_interrupt(UartInterrupt::TxComplete, false);
        }
        result
    }

    /// Sends the bytes of `buffer` preceding the terminator, one per call.
    ///
    /// Must be called with the same `buffer` until it returns `Ok(())`. A
    /// transfer that is abandoned halfway stays in progress; the next call
    /// carries on from where it stopped. Asynchronous sends are refused for
    /// as long as it's in progress.
    ///
    /// Returns `SenderBusy` without writing anything if an asynchronous send
    /// is running.
    pub fn send_buffer_periodic_check(&mut self, buffer: &[u8]) -> nb::Result<(), SenderBusy> {
        self.periodic_check(buffer, false)
    }

    /// Like [`send_buffer_periodic_check`], followed by exactly one
    /// terminator.
    ///
    /// [`send_buffer_periodic_check`]: #method.send_buffer_periodic_check
    pub fn send_string_periodic_check(&mut self, string: &[u8]) -> nb::Result<(), SenderBusy> {
        self.periodic_check(string, true)
    }
}

#[cfg(test)]
mod tests {
    use super::SenderBusy;
    use crate::buffer::TransferBuffer;
    use crate::config::UartConfig;
    use crate::testutils::{setup_log, MockPort};
    use crate::traits::UartInterrupt;
    use crate::{Serial, TxState};

    fn new_serial() -> Serial<MockPort> {
        setup_log();
        let mut serial = Serial::new(MockPort::new(), UartConfig::default(), ());
        serial.init();
        serial
    }

    // Polls until done, delivering TX complete after every byte the way the
    // hardware would. Returns the number of polls.
    fn poll_to_completion<F>(serial: &mut Serial<MockPort>, mut send: F) -> usize
    where
        F: FnMut(&mut Serial<MockPort>) -> nb::Result<(), SenderBusy>,
    {
        let mut polls = 0;
        loop {
            let written = serial.port().writes;
            polls += 1;
            assert!(polls < 1000);
            match send(serial) {
                Ok(()) => return polls,
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(err)) => panic!("{}", err),
            }
            if serial.port().writes > written {
                serial.deliver(UartInterrupt::TxComplete);
            }
        }
    }

    #[test]
    fn test_send_string() {
        let mut serial = new_serial();
        let polls = poll_to_completion(&mut serial, |s| s.send_string_periodic_check(b"Hi"));
        // One per byte, one for the terminator and the final one.
        assert_eq!(polls, 4);
        assert_eq!(serial.port().tx, b"Hi\r".to_vec());
        assert!(!serial.port().interrupt_enabled(UartInterrupt::TxComplete));
    }

    #[test]
    fn test_send_string_already_terminated() {
        let mut serial = new_serial();
        let polls = poll_to_completion(&mut serial, |s| s.send_string_periodic_check(b"Hi\rxx"));
        assert_eq!(polls, 4);
        assert_eq!(serial.port().tx, b"Hi\r".to_vec());
    }

    #[test]
    fn test_send_buffer() {
        let mut serial = new_serial();
        let polls = poll_to_completion(&mut serial, |s| s.send_buffer_periodic_check(b"abc\rdef"));
        assert_eq!(polls, 4);
        assert_eq!(serial.port().tx, b"abc".to_vec());
    }

    #[test]
    fn test_pending_until_tx_complete() {
        let mut serial = new_serial();
        assert!(serial.send_buffer_periodic_check(b"ab").is_err());
        assert_eq!(serial.port().tx, b"a".to_vec());

        // The first byte isn't out yet, so nothing more is written.
        for _ in 0..5 {
            assert_eq!(
                serial.send_buffer_periodic_check(b"ab"),
                Err(nb::Error::WouldBlock)
            );
        }
        assert_eq!(serial.port().tx, b"a".to_vec());

        serial.deliver(UartInterrupt::TxComplete);
        assert!(serial.send_buffer_periodic_check(b"ab").is_err());
        assert_eq!(serial.port().tx, b"ab".to_vec());

        serial.deliver(UartInterrupt::TxComplete);
        assert_eq!(serial.send_buffer_periodic_check(b"ab"), Ok(()));
    }

    #[test]
    fn test_back_to_back_transfers() {
        let mut serial = new_serial();
        poll_to_completion(&mut serial, |s| s.send_string_periodic_check(b"one"));
        poll_to_completion(&mut serial, |s| s.send_string_periodic_check(b"two"));
        assert_eq!(serial.port().tx, b"one\rtwo\r".to_vec());
    }

    #[test]
    fn test_empty_buffer() {
        let mut serial = new_serial();
        assert_eq!(serial.send_buffer_periodic_check(b""), Ok(()));
        assert!(serial.port().tx.is_empty());
    }

    #[test]
    fn test_refused_during_async_send() {
        let mut serial = new_serial();
        serial
            .send_string_async(TransferBuffer::from_slice(b"hello"))
            .unwrap();

        assert_eq!(
            serial.send_buffer_periodic_check(b"xy"),
            Err(nb::Error::Other(SenderBusy))
        );
        assert_eq!(serial.port().tx, b"h".to_vec());

        while serial.port().interrupt_enabled(UartInterrupt::TxComplete) {
            serial.deliver(UartInterrupt::TxComplete);
        }
        assert_eq!(serial.tx_state(), TxState::Complete);
        assert_eq!(serial.port().tx, b"hello\r".to_vec());

        // The wire is idle once the send is complete, taken back or not.
        poll_to_completion(&mut serial, |s| s.send_buffer_periodic_check(b"xy"));
        assert_eq!(serial.port().tx, b"hello\rxy".to_vec());
        assert_eq!(serial.take_sent().unwrap().data(), b"hello");
    }
}
