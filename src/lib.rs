//! Interrupt driven services for a byte oriented serial link.
//!
//! [`Serial`] wraps a [`SerialPort`] register interface and adds:
//!
//! - busy-wait, periodic-check and interrupt driven transfers of single
//!   bytes, buffers and terminated strings,
//! - length-prefixed frames protected by an additive checksum,
//! - one callback slot per serial interrupt source.
//!
//! Interrupts reach the driver either directly, by calling
//! [`Serial::deliver`] from the interrupt vector, or through a [`Mailbox`]
//! posted from the vector and drained by [`Serial::dispatch`] in the
//! foreground loop.
//!
//! [`BoundedStack`]/[`SharedStack`] carry received bytes from an interrupt
//! handler to the foreground, and [`ExternalInterrupts`] handles the edge
//! triggered external interrupt lines the same way the serial interrupts are
//! handled.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

use core::convert::Infallible;
use log::{debug, info, trace, warn};

#[macro_use]
pub mod macros;

pub mod asynchronous;
pub mod buffer;
pub mod callback;
pub mod checksum;
pub mod config;
pub mod exti;
pub mod frame;
pub mod periodic;
pub mod stack;
pub mod traits;

#[cfg(test)]
mod testutils;

pub use asynchronous::{RxState, TransferBusy, TxState};
pub use periodic::SenderBusy;
pub use buffer::{ByteBuffer, TransferBuffer};
pub use callback::{Callback, CallbackRegistry, Mailbox};
pub use config::UartConfig;
pub use exti::{Edge, ExtiLine, ExternalInterrupts};
pub use frame::{Frame, FrameError, FramePayload};
pub use stack::{BoundedStack, SharedStack, StackError};
pub use traits::{ExtiController, SerialPort, StatusFlag, UartInterrupt};

use asynchronous::{AsyncReceiver, AsyncSender};
use buffer::payload_len;
use periodic::PeriodicSender;
use traits::BusyWait;

/// Result of a non-blocking operation: `Err(nb::Error::WouldBlock)` while
/// it's still pending, `Ok` once it's done.
pub type Poll<T> = nb::Result<T, Infallible>;

pub const UART_INTERRUPT_COUNT: usize = 3;

/// Mailbox for events posted from the serial interrupt vectors.
pub type UartMailbox = Mailbox<UartInterrupt, UART_INTERRUPT_COUNT>;

/// Serial driver.
///
/// `app` is state owned on behalf of the application. Callbacks registered
/// with [`set_callback`] get the whole driver, so they reach the port, the
/// engines and the application state through it.
///
/// [`set_callback`]: #method.set_callback
pub struct Serial<P, U = ()> {
    port: P,
    config: UartConfig,
    callbacks: CallbackRegistry<UartInterrupt, Serial<P, U>, UART_INTERRUPT_COUNT>,
    tx: AsyncSender,
    rx: AsyncReceiver,
    periodic: PeriodicSender,
    app: U,
}

impl<P: SerialPort, U> Serial<P, U> {
    pub fn new(port: P, config: UartConfig, app: U) -> Self {
        Self {
            port,
            config,
            callbacks: CallbackRegistry::new(),
            tx: AsyncSender::new(),
            rx: AsyncReceiver::new(),
            periodic: PeriodicSender::new(),
            app,
        }
    }

    /// Programs the peripheral from the configuration and enables both the
    /// transmitter and the receiver.
    pub fn init(&mut self) {
        info!(
            "Serial init: divisor {} parity {:?} data bits {:?} stop bits {:?}",
            self.config.baud_divisor(),
            self.config.parity,
            self.config.data_bits,
            self.config.stop_bits
        );
        self.port.configure(&self.config);
        self.port.set_receiver(true);
        self.port.set_transmitter(true);
    }

    pub fn enable_transmitter(&mut self) {
        self.port.set_transmitter(true);
    }

    pub fn disable_transmitter(&mut self) {
        self.port.set_transmitter(false);
    }

    pub fn enable_receiver(&mut self) {
        self.port.set_receiver(true);
    }

    pub fn disable_receiver(&mut self) {
        self.port.set_receiver(false);
    }

    pub fn enable_interrupt(&mut self, source: UartInterrupt) {
        debug!("Enabling {:?} interrupt", source);
        self.port.set_interrupt(source, true);
    }

    pub fn disable_interrupt(&mut self, source: UartInterrupt) {
        debug!("Disabling {:?} interrupt", source);
        self.port.set_interrupt(source, false);
    }

    /// Installs the handler for `source`, replacing the previous one. Takes
    /// effect immediately.
    ///
    /// The asynchronous and periodic-check transfers install their own
    /// handlers in these same slots. Replacing one of those while its
    /// transfer is running stalls the transfer until [`stop_send`] or
    /// [`stop_receive`] is called.
    ///
    /// [`stop_send`]: #method.stop_send
    /// [`stop_receive`]: #method.stop_receive
    pub fn set_callback(&mut self, source: UartInterrupt, handler: Callback<Self>) {
        let running = match source {
            UartInterrupt::TxComplete => self.tx.is_busy() || self.periodic.is_active(),
            UartInterrupt::RxComplete => self.rx.is_receiving(),
            UartInterrupt::DataRegisterEmpty => false,
        };
        if running {
            warn!("Replacing {:?} callback of a running transfer", source);
        }
        self.callbacks.set(source, handler);
    }

    /// Runs the handler registered for `source`. This is what the interrupt
    /// vector calls.
    ///
    /// A handler that doesn't touch the data register leaves the hardware
    /// flag set, so the interrupt fires again straight away.
    pub fn deliver(&mut self, source: UartInterrupt) {
        match self.callbacks.get(source) {
            Some(handler) => handler(self),
            None => trace!("No callback for {:?}", source),
        }
    }

    /// Delivers every event pending in `mailbox`, in hardware priority order.
    /// Returns how many were delivered.
    pub fn dispatch(&mut self, mailbox: &UartMailbox) -> usize {
        let mut delivered = 0;
        for &source in UartInterrupt::ALL {
            if mailbox.take(source) {
                self.deliver(source);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn send_no_block(&mut self, byte: u8) {
        self.port.send_no_block(byte);
    }

    pub fn send_busy_wait(&mut self, byte: u8) {
        self.port.send_busy_wait(byte);
    }

    pub fn receive_no_block(&mut self) -> u8 {
        self.port.receive_no_block()
    }

    pub fn receive_busy_wait(&mut self) -> u8 {
        self.port.receive_busy_wait()
    }

    pub fn receive_periodic_check(&mut self) -> Poll<u8> {
        self.port.receive_periodic_check()
    }

    /// Sends the bytes of `buffer` preceding the terminator, blocking until
    /// the last one is in the data register.
    pub fn send_buffer_busy_wait(&mut self, buffer: &[u8]) {
        let len = payload_len(buffer, self.config.terminator);
        for byte in &buffer[..len] {
            self.port.send_busy_wait(*byte);
        }
    }

    /// Like [`send_buffer_busy_wait`], followed by exactly one terminator.
    ///
    /// [`send_buffer_busy_wait`]: #method.send_buffer_busy_wait
    pub fn send_string_busy_wait(&mut self, string: &[u8]) {
        self.send_buffer_busy_wait(string);
        self.port.send_busy_wait(self.config.terminator);
    }

    /// Receives bytes into `buffer` until the terminator arrives. The
    /// terminator itself isn't stored. Returns the number of bytes stored;
    /// bytes that don't fit are read and dropped.
    pub fn receive_string_busy_wait(&mut self, buffer: &mut TransferBuffer) -> usize {
        buffer.reset();
        let mut dropped = 0;
        loop {
            let byte = self.port.receive_busy_wait();
            if byte == self.config.terminator {
                break;
            }
            if buffer.append(byte).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("Receive buffer full, dropped {} bytes", dropped);
        }
        buffer.len()
    }

    /// Sends the bytes of `data` preceding the terminator as a checksummed
    /// frame. Blocks until the last byte is in the data register.
    pub fn send_frame(&mut self, data: &[u8]) {
        let terminator = self.config.terminator;
        frame::write_frame(&mut BusyWait(&mut self.port), data, terminator);
    }

    /// Receives one checksummed frame into `payload`. Blocks until the whole
    /// frame has arrived; a corrupted length byte makes this wait for the
    /// wrong number of bytes.
    pub fn receive_frame(&mut self, payload: &mut FramePayload) -> Result<(), FrameError> {
        frame::read_frame(&mut BusyWait(&mut self.port), payload)
    }

    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    pub fn terminator(&self) -> u8 {
        self.config.terminator
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn app(&self) -> &U {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut U {
        &mut self.app
    }

    pub fn into_parts(self) -> (P, U) {
        (self.port, self.app)
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
