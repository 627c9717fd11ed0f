use simple_logger;
use std::collections::VecDeque;
use std::sync::Once;
use std::vec::Vec;

use super::config::UartConfig;
use super::exti::{Edge, ExtiLine, LINE_COUNT};
use super::traits::{ExtiController, ReadByte, SerialPort, StatusFlag, UartInterrupt, WriteByte};
use super::UART_INTERRUPT_COUNT;

static INIT: Once = Once::new();

pub fn setup_log() {
    INIT.call_once(|| {
        simple_logger::init().unwrap();
    });
}

/// Serial peripheral model. The transmitter is always ready; received bytes
/// are queued by the test.
pub struct MockPort {
    pub config: Option<UartConfig>,
    pub transmitter: bool,
    pub receiver: bool,
    pub interrupts: [bool; UART_INTERRUPT_COUNT],
    /// Everything written to the data register.
    pub tx: Vec<u8>,
    /// Number of data register writes.
    pub writes: usize,
    pub rx: VecDeque<u8>,
    last_rx: u8,
}

impl MockPort {
    pub fn new() -> Self {
        MockPort {
            config: None,
            transmitter: false,
            receiver: false,
            interrupts: [false; UART_INTERRUPT_COUNT],
            tx: Vec::new(),
            writes: 0,
            rx: VecDeque::new(),
            last_rx: 0,
        }
    }

    pub fn interrupt_enabled(&self, source: UartInterrupt) -> bool {
        self.interrupts[source as usize]
    }

    pub fn queue_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.tx, Vec::new())
    }
}

impl SerialPort for MockPort {
    fn configure(&mut self, config: &UartConfig) {
        self.config = Some(*config);
    }

    fn write_data(&mut self, byte: u8) {
        self.tx.push(byte);
        self.writes += 1;
    }

    fn read_data(&mut self) -> u8 {
        if let Some(byte) = self.rx.pop_front() {
            self.last_rx = byte;
        }
        self.last_rx
    }

    fn flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::TransmitReady | StatusFlag::TransmitComplete => true,
            StatusFlag::ReceiveComplete => !self.rx.is_empty(),
        }
    }

    fn set_transmitter(&mut self, enabled: bool) {
        self.transmitter = enabled;
    }

    fn set_receiver(&mut self, enabled: bool) {
        self.receiver = enabled;
    }

    fn set_interrupt(&mut self, source: UartInterrupt, enabled: bool) {
        self.interrupts[source as usize] = enabled;
    }
}

/// External interrupt controller model recording what was programmed.
pub struct MockLines {
    pub trigger: [Option<Edge>; LINE_COUNT],
    pub enabled: [bool; LINE_COUNT],
}

impl MockLines {
    pub fn new() -> Self {
        MockLines {
            trigger: [None; LINE_COUNT],
            enabled: [false; LINE_COUNT],
        }
    }
}

impl ExtiController for MockLines {
    fn set_trigger(&mut self, line: ExtiLine, edge: Edge) {
        self.trigger[line as usize] = Some(edge);
    }

    fn set_enabled(&mut self, line: ExtiLine, enabled: bool) {
        self.enabled[line as usize] = enabled;
    }
}

impl WriteByte for Vec<u8> {
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }
}

/// Reads from a fixed slice. Running off the end is a test bug, so it panics
/// instead of blocking.
pub struct SliceReader<'a> {
    bytes: &'a [u8],
    idx: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        SliceReader { bytes, idx: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.idx
    }
}

impl ReadByte for SliceReader<'_> {
    fn read_byte(&mut self) -> u8 {
        let byte = self.bytes[self.idx];
        self.idx += 1;
        byte
    }
}
