//! J1939 transport layer: CAN frame representation, 29-bit identifier
//! management, and bus abstraction traits.
//!
//! ## J1939 Address & Timing Constants
//!
//! The constants below come from SAE J1939 and J1939-81 (network
//! management). Addresses 0x00–0xFD are assignable to controller
//! applications; the two top values are reserved for the null and global
//! addresses.

pub mod can_frame;
pub mod can_id;
pub mod traits;

/// Global (broadcast) destination address. Never owned by a controller.
pub const ADDRESS_GLOBAL: u8 = 0xFF;

/// Null address: "no address yet / cannot claim". Used as the source of
/// cannot-claim frames and of requests sent before an address is owned.
pub const ADDRESS_NULL: u8 = 0xFE;

/// Highest assignable unicast address.
pub const ADDRESS_MAX_UNICAST: u8 = 0xFD;

/// Number of assignable unicast addresses (0x00–0xFD).
pub const UNICAST_ADDRESS_COUNT: usize = 254;

/// PGN of the Address Claimed / Cannot Claim message (0x00EE00).
pub const PGN_ADDRESS_CLAIM: u32 = 60928;

/// PGN of the ISO Request message (0x00EA00), used to request address
/// claims from the network.
pub const PGN_ISO_REQUEST: u32 = 59904;

/// PDU format byte of the address-claim PGN.
pub const PF_ADDRESS_CLAIM: u8 = 0xEE;

/// PDU format byte of the ISO request PGN.
pub const PF_REQUEST: u8 = 0xEA;

/// First address of the dynamic window available to arbitrary-address
/// capable NAMEs after losing arbitration.
pub const DYNAMIC_ADDRESS_MIN: u8 = 0x80;

/// Last address of the dynamic window.
pub const DYNAMIC_ADDRESS_MAX: u8 = 0xF7;

/// Contention window after emitting an address claim (ms). A claim that
/// stays unchallenged for this long is won (J1939-81).
pub const CLAIM_WINDOW_MS: u32 = 250;

/// Listening window used when enumerating the network after a broadcast
/// request (ms). Balances completeness and responsiveness.
pub const DISCOVERY_WINDOW_MS: u32 = 300;
