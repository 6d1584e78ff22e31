//! Test doubles to simulate the CAN bus and delay provider during
//! integration tests.
use j1939_claim::protocol::management::name::Name;
use j1939_claim::protocol::transport::{
    can_frame::CanFrame,
    can_id::CanId,
    traits::{can_bus::CanBus, delay::Delay},
    PGN_ADDRESS_CLAIM,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};

#[allow(dead_code)]
/// One end of a loopback CAN link: frames written here pop out of the
/// peer endpoint, and vice versa.
pub struct MockCanBus {
    tx: mpsc::UnboundedSender<CanFrame>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<CanFrame>>>,
}

#[allow(dead_code)]
impl MockCanBus {
    /// Wire two endpoints back to back. By convention the first one goes
    /// to the device under test and the second plays the rest of the bus.
    pub fn create_pair() -> (Self, Self) {
        let (near_tx, near_rx) = mpsc::unbounded_channel();
        let (far_tx, far_rx) = mpsc::unbounded_channel();
        let endpoint = |tx, rx: mpsc::UnboundedReceiver<CanFrame>| Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        };
        (endpoint(near_tx, far_rx), endpoint(far_tx, near_rx))
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        // Fails only when the peer endpoint was dropped.
        self.tx.send(frame.clone()).map_err(drop)
    }

    async fn recv(&mut self) -> Result<CanFrame, Self::Error> {
        self.rx.lock().await.recv().await.ok_or(())
    }
}

#[allow(dead_code)]
/// Delay provider that lets `tokio::time` drive the protocol windows.
pub struct MockDelay;

impl Delay for MockDelay {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }
}

#[allow(dead_code)]
/// Build a competing address-claim frame as a remote node would emit it.
pub fn claim_frame(name: u64, address: u8) -> CanFrame {
    let id = CanId::builder(PGN_ADDRESS_CLAIM, address)
        .to_destination(255)
        .with_priority(6)
        .build()
        .unwrap();
    CanFrame {
        id,
        data: Name::from_raw(name).to_le_bytes(),
        len: 8,
    }
}

#[allow(dead_code)]
/// Build a generic application frame (PDU2 broadcast, non-claim).
pub fn data_frame(pgn: u32, address: u8) -> CanFrame {
    let id = CanId::builder(pgn, address).with_priority(3).build().unwrap();
    CanFrame {
        id,
        data: [1, 2, 3, 4, 5, 6, 7, 8],
        len: 8,
    }
}
