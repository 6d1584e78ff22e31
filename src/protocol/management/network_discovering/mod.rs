//! Network discovery service: broadcast an ISO Request (PGN 59904) for
//! address claims and harvest the PGN 60928 responses into the shared
//! registry to enumerate neighbouring controllers.
use crate::error::ClaimError;
use crate::protocol::management::address_claimer::{build_address_request_frame, name_from_claim};
use crate::protocol::management::network::{ClaimOutcome, Network};
use crate::protocol::transport::traits::{can_bus::CanBus, delay::Delay};
use crate::protocol::transport::{ADDRESS_GLOBAL, DISCOVERY_WINDOW_MS, PGN_ADDRESS_CLAIM};
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Broadcast a request and gather the claims it provokes.
///
/// Every well-formed claim is arbitrated into `network`, so an already
/// populated registry is updated rather than duplicated. Returns the
/// number of claims that produced or changed an entry.
pub async fn discover_network<C: CanBus, D: Delay>(
    can_bus: &mut C,
    delay: &mut D,
    network: &mut Network,
) -> Result<usize, ClaimError<C::Error>>
where
    C::Error: core::fmt::Debug,
{
    let request = build_address_request_frame(ADDRESS_GLOBAL);
    can_bus.send(&request).await.map_err(ClaimError::SendError)?;

    let mut registered = 0;
    let listen = delay.delay_ms(DISCOVERY_WINDOW_MS);
    pin_mut!(listen);

    loop {
        let recv = can_bus.recv();
        pin_mut!(recv);

        // Whichever completes first: the listening window or a frame.
        match select(listen.as_mut(), recv).await {
            Either::Left(_) => return Ok(registered),
            Either::Right((incoming, _)) => match incoming {
                Ok(frame) => {
                    if frame.id.pgn() != PGN_ADDRESS_CLAIM {
                        continue;
                    }
                    let Ok(name) = name_from_claim(&frame) else {
                        continue;
                    };
                    // Claims from the null address (cannot-claim) carry no
                    // usable pairing; the unicast check drops them.
                    let address = frame.id.source_address();
                    if network.find_address(name) == Some(address) {
                        continue;
                    }
                    if let Ok(ClaimOutcome::Accepted | ClaimOutcome::Reassigned { .. }) =
                        network.try_address_claim(name, address)
                    {
                        registered += 1;
                    }
                }
                Err(e) => return Err(ClaimError::ReceiveError(e)),
            },
        }
    }
}
