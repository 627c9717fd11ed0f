mod common;

use proptest::prelude::*;

use common::{setup_log, TestPort};
use uart_services::{FrameError, FramePayload, Serial, UartConfig};

const CR: u8 = 0x0d;

fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no terminator", |b| *b != CR), 0..=255)
}

fn encode(data: &[u8]) -> Vec<u8> {
    let mut serial = Serial::new(TestPort::new(), UartConfig::default(), ());
    serial.send_frame(data);
    serial.into_parts().0.tx
}

fn decode(wire: &[u8]) -> (Result<(), FrameError>, Vec<u8>) {
    let mut port = TestPort::new();
    port.feed(wire);
    let mut serial = Serial::new(port, UartConfig::default(), ());
    let mut payload = FramePayload::new();
    let result = serial.receive_frame(&mut payload);
    assert!(serial.port().rx.is_empty());
    (result, payload.data().to_vec())
}

proptest! {
    #[test]
    fn frame_round_trip(data in payload()) {
        setup_log();
        let wire = encode(&data);
        prop_assert_eq!(wire.len(), data.len() + 3);
        prop_assert_eq!(wire[0] as usize, data.len());

        let (result, received) = decode(&wire);
        prop_assert_eq!(result, Ok(()));
        prop_assert_eq!(received, data);
    }

    #[test]
    fn single_byte_corruption_is_detected(
        data in payload(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        setup_log();
        let mut wire = encode(&data);
        // The length byte is trusted, so corrupting it breaks framing rather
        // than the checksum. Leave it alone.
        let idx = 1 + position.index(wire.len() - 1);
        wire[idx] ^= mask;

        let (result, _) = decode(&wire);
        prop_assert!(
            matches!(result, Err(FrameError::ChecksumMismatch { .. })),
            "flip at {} not detected",
            idx
        );
    }

    #[test]
    fn reordered_payload_is_not_detected(data in prop::collection::vec(
        any::<u8>().prop_filter("no terminator", |b| *b != CR),
        2..=255,
    )) {
        setup_log();
        let mut wire = encode(&data);
        let last = data.len();
        wire.swap(1, last);

        let (result, received) = decode(&wire);
        prop_assert_eq!(result, Ok(()));
        prop_assert_eq!(received[0], data[last - 1]);
    }
}

#[test]
fn oversized_payload_is_truncated() {
    setup_log();
    let data = vec![0x20u8; 400];
    let wire = encode(&data);
    assert_eq!(wire[0], 255);
    let (result, received) = decode(&wire);
    assert_eq!(result, Ok(()));
    assert_eq!(received, &data[..255]);
}
