//! Interrupt driven transfers that advance one byte per interrupt.
//!
//! Each direction has a single engine. While a transfer is running the
//! engine owns the buffer; it's handed back once the transfer is complete,
//! and starting another transfer in the same direction before that is
//! refused.

use core::fmt;
use log::{debug, warn};

use crate::buffer::TransferBuffer;
use crate::traits::{SerialPort, UartInterrupt};
use crate::Serial;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Sending,
    /// The payload is out, the closing terminator is on its way.
    AppendingTerminator,
    /// The buffer can be taken back with [`Serial::take_sent`].
    ///
    /// [`Serial::take_sent`]: ../struct.Serial.html#method.take_sent
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    Idle,
    Receiving,
    /// The buffer can be taken back with [`Serial::take_received`].
    ///
    /// [`Serial::take_received`]: ../struct.Serial.html#method.take_received
    Complete,
}

/// Whether a transfer is delimited by the string terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Buffer transfer: the terminator only marks the end of the data.
    Unterminated,
    /// String transfer: exactly one terminator goes over the wire.
    Terminated,
}

/// A transfer in the same direction is still running, or the buffer of the
/// last one hasn't been taken back yet. Holds the buffer that was passed in.
pub struct TransferBusy(pub TransferBuffer);

impl TransferBusy {
    pub fn into_inner(self) -> TransferBuffer {
        self.0
    }
}

impl fmt::Debug for TransferBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransferBusy(..)")
    }
}

impl fmt::Display for TransferBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transfer already in progress")
    }
}

pub(crate) struct AsyncSender {
    state: TxState,
    termination: Termination,
    cursor: usize,
    end: usize,
    buffer: Option<TransferBuffer>,
}

impl AsyncSender {
    pub(crate) fn new() -> Self {
        Self {
            state: TxState::Idle,
            termination: Termination::Unterminated,
            cursor: 1,
            end: 0,
            buffer: None,
        }
    }

    /// Whether bytes of a send are still going out.
    pub(crate) fn is_busy(&self) -> bool {
        match self.state {
            TxState::Sending | TxState::AppendingTerminator => true,
            TxState::Idle | TxState::Complete => false,
        }
    }

    /// Writes the first byte. Returns whether the TX complete interrupt needs
    /// to be armed to carry on.
    fn start<P: SerialPort + ?Sized>(
        &mut self,
        port: &mut P,
        buffer: TransferBuffer,
        terminator: u8,
        termination: Termination,
    ) -> Result<bool, TransferBusy> {
        if self.state != TxState::Idle {
            warn!("Asynchronous send refused: {:?}", self.state);
            return Err(TransferBusy(buffer));
        }

        self.termination = termination;
        self.end = buffer.payload_len(terminator);
        self.cursor = 1;
        if self.end > 0 {
            port.send_no_block(buffer.data()[0]);
            self.state = TxState::Sending;
        } else if termination == Termination::Terminated {
            port.send_no_block(terminator);
            self.state = TxState::AppendingTerminator;
        } else {
            self.state = TxState::Complete;
        }
        debug!("Asynchronous send of {} bytes: {:?}", self.end, self.state);
        self.buffer = Some(buffer);
        Ok(self.state != TxState::Complete)
    }

    /// Advances on TX complete. Returns whether the interrupt stays armed.
    fn on_tx_complete<P: SerialPort + ?Sized>(&mut self, port: &mut P, terminator: u8) -> bool {
        match self.state {
            TxState::Sending => {
                if self.cursor < self.end {
                    if let Some(buffer) = &self.buffer {
                        port.send_no_block(buffer.data()[self.cursor]);
                    }
                    self.cursor += 1;
                    true
                } else if self.termination == Termination::Terminated {
                    port.send_no_block(terminator);
                    self.state = TxState::AppendingTerminator;
                    true
                } else {
                    self.finish();
                    false
                }
            }
            TxState::AppendingTerminator => {
                self.finish();
                false
            }
            TxState::Idle | TxState::Complete => {
                warn!("TX complete without an asynchronous send running");
                false
            }
        }
    }

    fn finish(&mut self) {
        self.cursor = 1;
        self.state = TxState::Complete;
        debug!("Asynchronous send complete");
    }

    fn take(&mut self) -> Option<TransferBuffer> {
        if self.state == TxState::Complete {
            self.state = TxState::Idle;
            self.buffer.take()
        } else {
            None
        }
    }

    fn stop(&mut self) -> Option<TransferBuffer> {
        if self.is_busy() {
            debug!("Asynchronous send stopped after {} bytes", self.cursor);
        }
        self.cursor = 1;
        self.state = TxState::Idle;
        self.buffer.take()
    }
}

pub(crate) struct AsyncReceiver {
    state: RxState,
    termination: Termination,
    dropped: usize,
    buffer: Option<TransferBuffer>,
}

impl AsyncReceiver {
    pub(crate) fn new() -> Self {
        Self {
            state: RxState::Idle,
            termination: Termination::Unterminated,
            dropped: 0,
            buffer: None,
        }
    }

    fn start(&mut self, mut buffer: TransferBuffer, termination: Termination) -> Result<(), TransferBusy> {
        if self.state != RxState::Idle {
            warn!("Asynchronous receive refused: {:?}", self.state);
            return Err(TransferBusy(buffer));
        }
        buffer.reset();
        self.termination = termination;
        self.dropped = 0;
        self.buffer = Some(buffer);
        self.state = RxState::Receiving;
        debug!("Asynchronous receive started ({:?})", termination);
        Ok(())
    }

    /// Consumes one byte on RX complete. Returns whether the interrupt stays
    /// armed.
    fn on_rx_complete<P: SerialPort + ?Sized>(&mut self, port: &mut P, terminator: u8) -> bool {
        // Reading the data register clears the interrupt flag, so it's read
        // even when there's nowhere to put the byte.
        let byte = port.receive_no_block();
        if self.state != RxState::Receiving {
            warn!("RX complete without an asynchronous receive running");
            return false;
        }

        if self.termination == Termination::Terminated && byte == terminator {
            self.state = RxState::Complete;
            debug!("Asynchronous receive complete");
            return false;
        }

        let stored = match &mut self.buffer {
            Some(buffer) => buffer.append(byte).is_ok(),
            None => false,
        };
        if !stored {
            self.dropped += 1;
            warn!("Receive buffer full, dropped 0x{:02x}", byte);
        }
        true
    }

    pub(crate) fn is_receiving(&self) -> bool {
        self.state == RxState::Receiving
    }

    /// Number of bytes received so far, i.e. the cursor position.
    fn cursor(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buffer| buffer.len())
    }

    fn stop(&mut self) -> Option<TransferBuffer> {
        self.state = RxState::Idle;
        self.buffer.take()
    }

    fn take(&mut self) -> Option<TransferBuffer> {
        if self.state == RxState::Complete {
            self.state = RxState::Idle;
            self.buffer.take()
        } else {
            None
        }
    }
}

fn tx_complete_handler<P: SerialPort, U>(serial: &mut Serial<P, U>) {
    let terminator = serial.config.terminator;
    if !serial.tx.on_tx_complete(&mut serial.port, terminator) {
        serial.port.set_interrupt(UartInterrupt::TxComplete, false);
    }
}

fn rx_complete_handler<P: SerialPort, U>(serial: &mut Serial<P, U>) {
    let terminator = serial.config.terminator;
    if !serial.rx.on_rx_complete(&mut serial.port, terminator) {
        serial.port.set_interrupt(UartInterrupt::RxComplete, false);
    }
}

impl<P: SerialPort, U> Serial<P, U> {
    fn start_send(&mut self, buffer: TransferBuffer, termination: Termination) -> Result<(), TransferBusy> {
        if self.periodic.is_active() {
            warn!("Asynchronous send refused: periodic-check send running");
            return Err(TransferBusy(buffer));
        }
        let terminator = self.config.terminator;
        if self.tx.start(&mut self.port, buffer, terminator, termination)? {
            self.callbacks.set(UartInterrupt::TxComplete, tx_complete_handler);
            self.port.set_interrupt(UartInterrupt::TxComplete, true);
        }
        Ok(())
    }

    fn start_receive(&mut self, buffer: TransferBuffer, termination: Termination) -> Result<(), TransferBusy> {
        self.rx.start(buffer, termination)?;
        self.callbacks.set(UartInterrupt::RxComplete, rx_complete_handler);
        self.port.set_interrupt(UartInterrupt::RxComplete, true);
        Ok(())
    }

    /// Starts sending the bytes of `buffer` preceding the terminator and
    /// returns right away. The remaining bytes go out from the TX complete
    /// interrupt, one per interrupt.
    ///
    /// The first byte is written without checking that the data register is
    /// ready. Refused while another send is running, and until the buffer of
    /// the last one has been taken back with [`take_sent`].
    ///
    /// [`take_sent`]: #method.take_sent
    pub fn send_buffer_async(&mut self, buffer: TransferBuffer) -> Result<(), TransferBusy> {
        self.start_send(buffer, Termination::Unterminated)
    }

    /// Like [`send_buffer_async`], but exactly one terminator follows the
    /// payload, whether or not `string` ends in one.
    ///
    /// [`send_buffer_async`]: #method.send_buffer_async
    pub fn send_string_async(&mut self, string: TransferBuffer) -> Result<(), TransferBusy> {
        self.start_send(string, Termination::Terminated)
    }

    /// Receives into `buffer` from the RX complete interrupt until
    /// [`stop_receive`] is called. Bytes past the capacity are dropped.
    ///
    /// [`stop_receive`]: #method.stop_receive
    pub fn receive_buffer_async(&mut self, buffer: TransferBuffer) -> Result<(), TransferBusy> {
        self.start_receive(buffer, Termination::Unterminated)
    }

    /// Receives into `buffer` from the RX complete interrupt until the
    /// terminator arrives. The terminator isn't stored.
    ///
    /// Refused until the string of the last receive has been taken back with
    /// [`take_received`].
    ///
    /// [`take_received`]: #method.take_received
    pub fn receive_string_async(&mut self, buffer: TransferBuffer) -> Result<(), TransferBusy> {
        self.start_receive(buffer, Termination::Terminated)
    }

    pub fn tx_state(&self) -> TxState {
        self.tx.state
    }

    pub fn rx_state(&self) -> RxState {
        self.rx.state
    }

    /// Number of bytes the running (or last) receive has stored.
    pub fn rx_cursor(&self) -> usize {
        self.rx.cursor()
    }

    /// Number of bytes the running (or last) receive had to drop.
    pub fn rx_dropped(&self) -> usize {
        self.rx.dropped
    }

    /// Hands back the buffer of a completed send. `None` while the send is
    /// still running or if there is none.
    pub fn take_sent(&mut self) -> Option<TransferBuffer> {
        self.tx.take()
    }

    /// Hands back the buffer of a completed receive, holding the bytes before
    /// the terminator.
    pub fn take_received(&mut self) -> Option<TransferBuffer> {
        self.rx.take()
    }

    /// Ends the running send, disables the TX complete interrupt and hands
    /// back the buffer. A byte already in the data register still goes out.
    pub fn stop_send(&mut self) -> Option<TransferBuffer> {
        self.port.set_interrupt(UartInterrupt::TxComplete, false);
        self.tx.stop()
    }

    /// Ends the running receive, disables the RX complete interrupt and hands
    /// back the buffer with what arrived so far.
    pub fn stop_receive(&mut self) -> Option<TransferBuffer> {
        self.port.set_interrupt(UartInterrupt::RxComplete, false);
        self.rx.stop()
    }
}
