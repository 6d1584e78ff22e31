//! Automated lifecycle management for J1939 source addresses: initial
//! claim, conflict detection, defense, and reclaim.
//!
//! The manager is the single-threaded cooperative dispatcher the state
//! machine assumes: it owns the CAN bus, the delay provider, the shared
//! [`Network`] registry, and one [`AddressClaimer`], serializing inbound
//! frames and contention timeouts into it and flushing its outbound
//! frames back to the bus.
use core::fmt::Debug;

use futures_util::future::{select, Either};
use futures_util::pin_mut;
use heapless::Deque;

use crate::error::ClaimError;
use crate::protocol::management::address_claimer::{
    AddressClaimer, ClaimHandler, ClaimState, ContentionTimer,
};
use crate::protocol::management::name::Name;
use crate::protocol::management::network::Network;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::{can_bus::CanBus, delay::Delay};
use crate::protocol::transport::{ADDRESS_MAX_UNICAST, ADDRESS_NULL, CLAIM_WINDOW_MS};

//==================================================================================ADAPTERS

/// Contention-timer adapter polled by the manager's event loop.
///
/// The claimer arms it synchronously; the manager turns the armed flag
/// into a real delay on its [`Delay`] provider and the restart flag into
/// a rebuilt contention window.
#[derive(Debug, Default)]
pub struct WindowTimer {
    armed: bool,
    restarted: bool,
}

impl WindowTimer {
    /// Whether a contention deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume the restart flag set by the latest `arm` call.
    pub fn take_restart(&mut self) -> bool {
        core::mem::replace(&mut self.restarted, false)
    }
}

impl ContentionTimer for WindowTimer {
    fn arm(&mut self, _duration_ms: u32) {
        self.armed = true;
        self.restarted = true;
    }

    fn cancel(&mut self) {
        self.armed = false;
    }
}

/// Claim-handler adapter buffering outbound frames until the manager
/// flushes them to the bus.
#[derive(Default)]
pub struct FrameQueue {
    outbound: Deque<CanFrame, 8>,
}

impl FrameQueue {
    /// Next buffered frame, oldest first.
    pub fn pop(&mut self) -> Option<CanFrame> {
        self.outbound.pop_front()
    }
}

impl ClaimHandler for FrameQueue {
    fn on_address(&mut self, _name: Name, _address: u8) {
        #[cfg(feature = "defmt")]
        defmt::info!("{:#X} gained address {}", _name.raw(), _address);
    }

    fn on_lose_address(&mut self, _name: Name) {
        #[cfg(feature = "defmt")]
        defmt::warn!("{:#X} lost its address", _name.raw());
    }

    fn on_frame(&mut self, frame: CanFrame) {
        // The state machine emits at most one frame per event and the
        // manager flushes after every event, so the queue never fills.
        let _ = self.outbound.push_back(frame);
    }

    fn on_error(&mut self, _what: &'static str, _code: i32) {
        #[cfg(feature = "defmt")]
        defmt::error!("claim scheduler error in {}: {}", _what, _code);
    }
}

//==================================================================================MANAGER

/// J1939-compliant address manager. Handles the initial claim, address
/// defense, and automatic reclaim after preemption.
pub struct AddressManager<C: CanBus, D: Delay> {
    /// CAN bus implementation used to send/receive frames.
    can_bus: C,
    /// Asynchronous delay provider driving the contention window.
    delay: D,
    /// NAME/address registry for the attached segment.
    network: Network,
    /// State machine claiming for the local NAME.
    claimer: AddressClaimer<WindowTimer, FrameQueue>,
    /// Preferred address used for the initial claim.
    preferred_address: u8,
}

impl<C: CanBus, D: Delay> AddressManager<C, D>
where
    C::Error: Debug,
{
    /// Build an idle manager; call [`Self::claim`] to contend. The
    /// preferred address is clamped into the unicast range.
    pub fn new(can_bus: C, delay: D, name: Name, preferred_address: u8) -> Self {
        let mut claimer = AddressClaimer::new(WindowTimer::default(), name);
        claimer.bind_callbacks(FrameQueue::default());
        Self {
            can_bus,
            delay,
            network: Network::new(),
            claimer,
            preferred_address: preferred_address.min(ADDRESS_MAX_UNICAST),
        }
    }

    /// Address currently held by the local NAME.
    pub fn current_address(&self) -> Option<u8> {
        self.claimer.current_address()
    }

    /// Registry view of the attached segment.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Send a frame on the CAN bus.
    pub async fn send(&mut self, frame: &CanFrame) -> Result<(), C::Error> {
        self.can_bus.send(frame).await
    }

    /// Run the claim procedure until it resolves.
    ///
    /// Returns the claimed address, `ADDRESS_NULL` when the NAME is not
    /// arbitrary-address capable and lost its only candidate, or
    /// [`ClaimError::NoAddressAvailable`] when the dynamic window is
    /// exhausted.
    pub async fn claim(&mut self) -> Result<u8, ClaimError<C::Error>> {
        self.claimer
            .start_address_claim(&mut self.network, self.preferred_address);
        self.flush().await?;

        loop {
            match self.claimer.state() {
                ClaimState::Claimed { address } => return Ok(address),
                ClaimState::CannotClaim => {
                    if self.claimer.name().is_arbitrary_address_capable() {
                        return Err(ClaimError::NoAddressAvailable);
                    }
                    return Ok(ADDRESS_NULL);
                }
                _ => {}
            }
            self.step().await?;
        }
    }

    /// Receive the next application frame.
    ///
    /// Address-management traffic (claims, requests) is consumed by the
    /// state machine on the way: defenses, request replies, and reclaims
    /// after preemption happen transparently inside this call.
    pub async fn recv(&mut self) -> Result<CanFrame, ClaimError<C::Error>> {
        loop {
            // A preemption may have re-opened the contention window.
            if self.claimer.timer().is_armed() {
                self.step().await?;
                continue;
            }

            let frame = self
                .can_bus
                .recv()
                .await
                .map_err(ClaimError::ReceiveError)?;

            if frame.id.is_address_management() {
                self.claimer.process(&mut self.network, &frame);
                self.flush().await?;
                continue;
            }

            return Ok(frame);
        }
    }

    /// Run one contention-window round: wait for either the deadline or
    /// an inbound frame, dispatch it, and flush the claimer's output.
    /// Returns when the window resolved or was restarted.
    async fn step(&mut self) -> Result<(), ClaimError<C::Error>> {
        let Self {
            can_bus,
            delay,
            network,
            claimer,
            ..
        } = self;

        if !claimer.timer().is_armed() {
            return Ok(());
        }

        claimer.timer_mut().take_restart();
        let window = delay.delay_ms(CLAIM_WINDOW_MS);
        pin_mut!(window);

        loop {
            let inbound = {
                let recv = can_bus.recv();
                pin_mut!(recv);

                match select(window.as_mut(), recv).await {
                    Either::Left(((), _)) => None,
                    Either::Right((result, _)) => Some(result),
                }
            }; // recv borrow is dropped here

            match inbound {
                None => claimer.on_timeout(network),
                Some(Ok(frame)) => {
                    if frame.id.is_address_management() {
                        claimer.process(network, &frame);
                    }
                }
                Some(Err(e)) => return Err(ClaimError::ReceiveError(e)),
            }

            Self::flush_parts(can_bus, claimer).await?;

            // A re-armed timer needs a fresh delay future; a disarmed one
            // means the contention resolved. Either way the caller takes
            // over. Only an untouched window keeps this loop running.
            if claimer.timer_mut().take_restart() || !claimer.timer().is_armed() {
                return Ok(());
            }
        }
    }

    async fn flush(&mut self) -> Result<(), ClaimError<C::Error>> {
        Self::flush_parts(&mut self.can_bus, &mut self.claimer).await
    }

    async fn flush_parts(
        can_bus: &mut C,
        claimer: &mut AddressClaimer<WindowTimer, FrameQueue>,
    ) -> Result<(), ClaimError<C::Error>> {
        loop {
            let frame = claimer.handler_mut().and_then(FrameQueue::pop);
            let Some(frame) = frame else {
                return Ok(());
            };
            can_bus.send(&frame).await.map_err(ClaimError::SendError)?;
        }
    }
}
