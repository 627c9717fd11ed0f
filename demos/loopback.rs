use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{info, warn, Level};
use pretty_hex::*;
use structopt::StructOpt;

use uart_services::{
    FramePayload, RxState, Serial, SerialPort, StatusFlag, TransferBuffer, UartConfig,
    UartInterrupt,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "loopback")]
struct Opt {
    /// Payload to send
    #[structopt(default_value = "Hello World")]
    payload: String,

    /// Swap the first two payload bytes on the wire
    #[structopt(short, long)]
    swap: bool,

    /// Flip a bit of the first payload byte on the wire
    #[structopt(short, long)]
    flip: bool,

    /// Turn on verbose messages
    #[structopt(short, long)]
    verbose: bool,
}

type Wire = Rc<RefCell<VecDeque<u8>>>;

/// One end of a software serial link.
struct WirePort {
    outgoing: Wire,
    incoming: Wire,
    interrupts: [bool; 3],
    last_rx: u8,
}

impl WirePort {
    fn pair() -> (WirePort, WirePort) {
        let a_to_b = Wire::default();
        let b_to_a = Wire::default();
        let a = WirePort {
            outgoing: a_to_b.clone(),
            incoming: b_to_a.clone(),
            interrupts: [false; 3],
            last_rx: 0,
        };
        let b = WirePort {
            outgoing: b_to_a,
            incoming: a_to_b,
            interrupts: [false; 3],
            last_rx: 0,
        };
        (a, b)
    }

    fn interrupt_enabled(&self, source: UartInterrupt) -> bool {
        self.interrupts[source as usize]
    }
}

impl SerialPort for WirePort {
    fn configure(&mut self, config: &UartConfig) {
        info!("Baud divisor: {}", config.baud_divisor());
    }

    fn write_data(&mut self, byte: u8) {
        self.outgoing.borrow_mut().push_back(byte);
    }

    fn read_data(&mut self) -> u8 {
        if let Some(byte) = self.incoming.borrow_mut().pop_front() {
            self.last_rx = byte;
        }
        self.last_rx
    }

    fn flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::ReceiveComplete => !self.incoming.borrow().is_empty(),
            StatusFlag::TransmitReady | StatusFlag::TransmitComplete => true,
        }
    }

    fn set_transmitter(&mut self, _enabled: bool) {}

    fn set_receiver(&mut self, _enabled: bool) {}

    fn set_interrupt(&mut self, source: UartInterrupt, enabled: bool) {
        self.interrupts[source as usize] = enabled;
    }
}

fn corrupt(wire: &Wire, opt: &Opt) {
    let mut wire = wire.borrow_mut();
    if opt.swap && wire.len() > 4 {
        wire.swap(1, 2);
        warn!("Swapped payload bytes 0 and 1");
    }
    if opt.flip && wire.len() > 3 {
        wire[1] ^= 0x01;
        warn!("Flipped bit 0 of payload byte 0");
    }
}

fn frame_demo(sender: &mut Serial<WirePort>, receiver: &mut Serial<WirePort>, opt: &Opt) {
    sender.send_frame(opt.payload.as_bytes());
    {
        let wire = sender.port().outgoing.borrow();
        let bytes: Vec<u8> = wire.iter().copied().collect();
        println!("Frame on the wire: {:?}", bytes.hex_dump());
    }
    corrupt(&sender.port().outgoing, opt);

    let mut payload = FramePayload::new();
    match receiver.receive_frame(&mut payload) {
        Ok(()) => println!("Frame received: {:?}", payload.data().hex_dump()),
        Err(err) => println!("Frame rejected: {}", err),
    }
}

fn async_demo(sender: &mut Serial<WirePort>, receiver: &mut Serial<WirePort>, opt: &Opt) {
    if let Err(busy) = receiver.receive_string_async(TransferBuffer::new()) {
        println!("Receiver busy: {}", busy);
        return;
    }
    if let Err(busy) = sender.send_string_async(TransferBuffer::from_slice(opt.payload.as_bytes())) {
        println!("Sender busy: {}", busy);
        return;
    }

    // Each byte on the wire raises RX complete on the far end, and each byte
    // sent raises TX complete on the near end.
    loop {
        while receiver.port().flag(StatusFlag::ReceiveComplete)
            && receiver.port().interrupt_enabled(UartInterrupt::RxComplete)
        {
            receiver.deliver(UartInterrupt::RxComplete);
        }
        if !sender.port().interrupt_enabled(UartInterrupt::TxComplete) {
            break;
        }
        sender.deliver(UartInterrupt::TxComplete);
    }

    if receiver.rx_state() == RxState::Complete {
        if let Some(buffer) = receiver.take_received() {
            println!("String received: {} bytes", buffer.len());
            buffer.dump();
        }
    } else {
        println!("Receive still running, {} bytes so far", receiver.rx_cursor());
    }
    sender.take_sent();
}

fn main() {
    let opt = Opt::from_args();

    let level = if opt.verbose { Level::Debug } else { Level::Info };
    simple_logger::init_with_level(level).unwrap();

    if opt.verbose {
        println!("{:#?}", opt);
    }

    let (a, b) = WirePort::pair();
    let mut sender = Serial::new(a, UartConfig::default(), ());
    let mut receiver = Serial::new(b, UartConfig::default(), ());
    sender.init();
    receiver.init();

    frame_demo(&mut sender, &mut receiver, &opt);
    async_demo(&mut sender, &mut receiver, &opt);
}
