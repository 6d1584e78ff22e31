//! SAE J1939 dynamic address claiming (PGN 60928): claim an address,
//! defend it against lower-priority NAMEs, yield to higher-priority ones,
//! and answer address requests.
//!
//! The state machine is sans-I/O: inbound frames and the contention
//! timeout are pushed in through [`AddressClaimer::process`] and
//! [`AddressClaimer::on_timeout`], outputs leave through the bound
//! [`ClaimHandler`], and the single-shot [`ContentionTimer`] is the only
//! scheduling primitive it requires. The shared [`Network`] registry is
//! injected into every operation by the owning dispatcher.
use crate::error::ExtractionError;
use crate::protocol::management::name::Name;
use crate::protocol::management::network::{ClaimOutcome, Network};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::{
    ADDRESS_GLOBAL, ADDRESS_NULL, CLAIM_WINDOW_MS, DYNAMIC_ADDRESS_MAX, DYNAMIC_ADDRESS_MIN,
    PGN_ADDRESS_CLAIM, PGN_ISO_REQUEST,
};

//==================================================================================SEAMS

/// Single-shot contention timer supplied by the host scheduler.
///
/// The claimer arms it on every claim emitted while contending and
/// cancels it when the contention resolves; the host calls
/// [`AddressClaimer::on_timeout`] when the armed deadline expires.
pub trait ContentionTimer {
    /// Arm (or re-arm) the timer. A later `arm` resets the deadline.
    fn arm(&mut self, duration_ms: u32);
    /// Drop the pending deadline, if any.
    fn cancel(&mut self);
}

/// Outputs of the state machine. All four callbacks are required in
/// production; `on_frame` is the only egress path for bus traffic.
///
/// Callbacks run synchronously from within `process`/`on_timeout`; do not
/// call back into the claimer from inside them.
pub trait ClaimHandler {
    /// The local NAME won the contention and owns `address`.
    fn on_address(&mut self, name: Name, address: u8);
    /// A NAME lost its address: the local one on preemption, or a remote
    /// one evicted from the registry by an observed claim.
    fn on_lose_address(&mut self, name: Name);
    /// An outbound claim, cannot-claim, or defense frame to transmit.
    fn on_frame(&mut self, frame: CanFrame);
    /// Host scheduler or transport failure. Never used for recoverable
    /// protocol events.
    fn on_error(&mut self, what: &'static str, code: i32);
}

//==================================================================================FRAME_ARCHETYPES

/// Build an address-claim frame (PGN 60928) for the provided NAME.
pub fn build_address_claim_frame(name: Name, address: u8) -> CanFrame {
    CanFrame {
        id: CanId::builder(PGN_ADDRESS_CLAIM, address)
            .to_destination(ADDRESS_GLOBAL)
            .with_priority(6)
            .build()
            .expect("PGN 60928 to the global destination always produces a valid CanId"),
        data: name.to_le_bytes(),
        len: 8,
    }
}

/// Build a cannot-claim frame: an address claim sent from the null
/// address, announcing that the NAME holds no address.
pub fn build_cannot_claim_frame(name: Name) -> CanFrame {
    build_address_claim_frame(name, ADDRESS_NULL)
}

/// Build an ISO request (PGN 59904) asking `destination` for its address
/// claim. The source is the null address: the requester does not need an
/// address of its own to ask.
pub fn build_address_request_frame(destination: u8) -> CanFrame {
    let mut data = [0xFFu8; 8];
    data[0..3].copy_from_slice(&PGN_ADDRESS_CLAIM.to_le_bytes()[0..3]);
    CanFrame {
        id: CanId::builder(PGN_ISO_REQUEST, ADDRESS_NULL)
            .to_destination(destination)
            .with_priority(6)
            .build()
            .expect("PGN 59904 always produces a valid CanId"),
        data,
        len: 3,
    }
}

/// Extract the NAME from an address-claim frame (PGN 60928).
pub fn name_from_claim(frame: &CanFrame) -> Result<Name, ExtractionError> {
    if frame.id.pgn() != PGN_ADDRESS_CLAIM {
        return Err(ExtractionError::InvalidIncomingFrame);
    }
    if frame.len != 8 {
        return Err(ExtractionError::InvalidDataLen);
    }
    Ok(Name::from_le_bytes(frame.data))
}

/// Whether an ISO request frame asks for the address-claim PGN.
fn requests_address_claim(frame: &CanFrame) -> bool {
    frame.len == 3 && frame.data[0..3] == PGN_ADDRESS_CLAIM.to_le_bytes()[0..3]
}

//==================================================================================STATE_MACHINE

/// Claim progress of one local NAME.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimState {
    /// No address owned, not contending.
    Idle,
    /// A claim for `address` is on the bus; the contention window runs.
    Claiming { address: u8 },
    /// The contention window elapsed unchallenged; `address` is ours.
    Claimed { address: u8 },
    /// Lost arbitration with no fallback address left.
    CannotClaim,
}

/// State machine claiming one address for one local NAME.
///
/// The registry outlives the claimer and is shared among all claimers on
/// the same segment; the owning dispatcher passes it `&mut` into each
/// operation and serializes calls (no re-entrancy, no concurrency).
pub struct AddressClaimer<T: ContentionTimer, H: ClaimHandler> {
    name: Name,
    state: ClaimState,
    timer: T,
    handler: Option<H>,
}

impl<T: ContentionTimer, H: ClaimHandler> AddressClaimer<T, H> {
    /// New claimer in the [`ClaimState::Idle`] state, callbacks unbound.
    pub fn new(timer: T, name: Name) -> Self {
        Self {
            name,
            state: ClaimState::Idle,
            timer,
            handler: None,
        }
    }

    /// Install the output callbacks. Until bound, outputs are discarded.
    pub fn bind_callbacks(&mut self, handler: H) {
        self.handler = Some(handler);
    }

    /// The local NAME this claimer contends for.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Current claim state.
    pub fn state(&self) -> ClaimState {
        self.state
    }

    /// Address owned by the local NAME, once claimed.
    pub fn current_address(&self) -> Option<u8> {
        match self.state {
            ClaimState::Claimed { address } => Some(address),
            _ => None,
        }
    }

    /// The contention timer handed over at construction.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutable access to the contention timer (host adapters poll it).
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Mutable access to the bound handler (host adapters drain it).
    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    /// Begin contending for `preferred_address`. Only meaningful from
    /// [`ClaimState::Idle`] or [`ClaimState::CannotClaim`]; ignored while
    /// a claim is already running or held.
    pub fn start_address_claim(&mut self, network: &mut Network, preferred_address: u8) {
        match self.state {
            ClaimState::Idle | ClaimState::CannotClaim => {}
            _ => return,
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Starting address claim for {:#X} at {}",
            self.name.raw(),
            preferred_address
        );

        self.pursue(network, preferred_address);
    }

    /// Feed one decoded inbound frame. Only address-claim (PGN 60928) and
    /// address-request (PGN 59904 for 60928) frames are acted upon;
    /// everything else, including malformed variants of those two, is
    /// silently dropped.
    pub fn process(&mut self, network: &mut Network, frame: &CanFrame) {
        match frame.id.pgn() {
            PGN_ADDRESS_CLAIM => {
                let Ok(claimant) = name_from_claim(frame) else {
                    return;
                };
                self.handle_address_claim(network, claimant, frame.id.source_address());
            }
            PGN_ISO_REQUEST => {
                if !requests_address_claim(frame) {
                    return;
                }
                self.handle_address_request(frame.id.destination().unwrap_or(ADDRESS_GLOBAL));
            }
            _ => {}
        }
    }

    /// The armed contention deadline expired.
    pub fn on_timeout(&mut self, network: &mut Network) {
        let ClaimState::Claiming { address } = self.state else {
            return;
        };

        if network.find_address(self.name) == Some(address) {
            self.timer.cancel();
            self.state = ClaimState::Claimed { address };

            #[cfg(feature = "defmt")]
            defmt::info!("Claimed address {} for {:#X}", address, self.name.raw());

            if let Some(handler) = self.handler.as_mut() {
                handler.on_address(self.name, address);
            }
        } else {
            // The slot was taken while the window ran; fall back instead
            // of claiming an address the registry shows as foreign.
            self.arbitrate(network);
        }
    }

    /// Stop contending and drop the local entry from the registry. The
    /// pending deadline is cancelled; no further callbacks fire.
    pub fn release(&mut self, network: &mut Network) {
        self.timer.cancel();
        network.release(self.name);
        self.state = ClaimState::Idle;
    }

    //==============================================================================EVENTS

    fn handle_address_claim(&mut self, network: &mut Network, claimant: Name, source_address: u8) {
        // Echo of our own claim (loopback); nothing to arbitrate.
        if claimant == self.name {
            return;
        }

        // Registry bookkeeping happens for every observed claim, whatever
        // the local state. A claim from the null address means the sender
        // lost its address.
        if source_address == ADDRESS_NULL {
            network.release(claimant);
        } else if let Ok(ClaimOutcome::Reassigned { evicted }) =
            network.try_address_claim(claimant, source_address)
        {
            // A local eviction is reported by the state handling below,
            // before any fallback claim goes out.
            if evicted != self.name {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_lose_address(evicted);
                }
            }
        }

        match self.state {
            ClaimState::Claiming { address } if address == source_address => {
                if self.name.has_priority_over(claimant) {
                    // Defend the pending claim and restart the window.
                    self.send_claim(address);
                    self.timer.arm(CLAIM_WINDOW_MS);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Lost contention for {} against {:#X}",
                        address,
                        claimant.raw()
                    );
                    self.arbitrate(network);
                }
            }
            ClaimState::Claimed { address } if address == source_address => {
                if self.name.has_priority_over(claimant) {
                    self.send_claim(address);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Preempted at {} by {:#X}", address, claimant.raw());

                    if let Some(handler) = self.handler.as_mut() {
                        handler.on_lose_address(self.name);
                    }
                    self.arbitrate(network);
                }
            }
            _ => {}
        }
    }

    fn handle_address_request(&mut self, destination: u8) {
        match self.state {
            // Without an address, any request gets a cannot-claim reply.
            ClaimState::Idle | ClaimState::CannotClaim => self.send_cannot_claim(),
            ClaimState::Claiming { address }
                if destination == address || destination == ADDRESS_GLOBAL =>
            {
                self.send_claim(address);
                self.timer.arm(CLAIM_WINDOW_MS);
            }
            ClaimState::Claimed { address }
                if destination == address || destination == ADDRESS_GLOBAL =>
            {
                self.send_claim(address);
            }
            _ => {}
        }
    }

    //==============================================================================ACTIONS

    /// Tentatively take `candidate` in the registry and put the matching
    /// claim on the bus, or fall back when the registry refuses.
    fn pursue(&mut self, network: &mut Network, candidate: u8) {
        match network.try_address_claim(self.name, candidate) {
            Ok(ClaimOutcome::Accepted) => {
                self.state = ClaimState::Claiming { address: candidate };
                self.send_claim(candidate);
                self.timer.arm(CLAIM_WINDOW_MS);
            }
            Ok(ClaimOutcome::Reassigned { evicted }) => {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_lose_address(evicted);
                }
                self.state = ClaimState::Claiming { address: candidate };
                self.send_claim(candidate);
                self.timer.arm(CLAIM_WINDOW_MS);
            }
            // Held by a lower NAME: contending is pointless, arbitrate now.
            Ok(ClaimOutcome::Rejected { .. }) => self.arbitrate(network),
            // Out-of-range candidate; treat like any malformed input.
            Err(_) => {}
        }
    }

    /// Arbitration after losing an address (J1939-81): arbitrary-address
    /// capable NAMEs walk the dynamic window upward for the first free
    /// address, everyone else gives up.
    fn arbitrate(&mut self, network: &mut Network) {
        if self.name.is_arbitrary_address_capable() {
            if let Some(address) = network.find_available(DYNAMIC_ADDRESS_MIN, DYNAMIC_ADDRESS_MAX)
            {
                self.pursue(network, address);
                return;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("No address available for {:#X}", self.name.raw());

        self.timer.cancel();
        self.state = ClaimState::CannotClaim;
        self.send_cannot_claim();
    }

    fn send_claim(&mut self, address: u8) {
        if let Some(handler) = self.handler.as_mut() {
            handler.on_frame(build_address_claim_frame(self.name, address));
        }
    }

    fn send_cannot_claim(&mut self) {
        if let Some(handler) = self.handler.as_mut() {
            handler.on_frame(build_cannot_claim_frame(self.name));
        }
    }
}
