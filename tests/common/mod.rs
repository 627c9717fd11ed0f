#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Once;

use uart_services::{
    ExtiController, ExtiLine, Edge, SerialPort, StatusFlag, UartConfig, UartInterrupt,
};

static INIT: Once = Once::new();

pub fn setup_log() {
    INIT.call_once(|| {
        simple_logger::init().unwrap();
    });
}

/// Serial port whose transmitter is always ready and whose receiver reads
/// bytes the test feeds it.
#[derive(Default)]
pub struct TestPort {
    pub tx: Vec<u8>,
    pub rx: VecDeque<u8>,
    pub interrupts: [bool; 3],
    last_rx: u8,
}

impl TestPort {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn interrupt_enabled(&self, source: UartInterrupt) -> bool {
        self.interrupts[source as usize]
    }
}

impl SerialPort for TestPort {
    fn configure(&mut self, _config: &UartConfig) {}

    fn write_data(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn read_data(&mut self) -> u8 {
        if let Some(byte) = self.rx.pop_front() {
            self.last_rx = byte;
        }
        self.last_rx
    }

    fn flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::ReceiveComplete => !self.rx.is_empty(),
            _ => true,
        }
    }

    fn set_transmitter(&mut self, _enabled: bool) {}

    fn set_receiver(&mut self, _enabled: bool) {}

    fn set_interrupt(&mut self, source: UartInterrupt, enabled: bool) {
        self.interrupts[source as usize] = enabled;
    }
}

#[derive(Default)]
pub struct TestLines {
    pub trigger: [Option<Edge>; 3],
    pub enabled: [bool; 3],
}

impl ExtiController for TestLines {
    fn set_trigger(&mut self, line: ExtiLine, edge: Edge) {
        self.trigger[line as usize] = Some(edge);
    }

    fn set_enabled(&mut self, line: ExtiLine, enabled: bool) {
        self.enabled[line as usize] = enabled;
    }
}
