//! Registry of the NAME/address pairings observed on one CAN segment.
//!
//! The registry is the authoritative view of who owns which of the 254
//! unicast addresses. It applies the J1939-81 contention rule on every
//! claim (the numerically lower NAME wins) and keeps the mapping
//! injective: one address per NAME, one NAME per address. It performs no
//! locking; callers serialize access (single-threaded dispatcher, or one
//! mailbox task per bus).
use crate::error::NetworkError;
use crate::protocol::management::name::Name;
use crate::protocol::transport::{ADDRESS_MAX_UNICAST, UNICAST_ADDRESS_COUNT};

/// Result of submitting a claim to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimOutcome {
    /// The address was free (or already owned by the claimant).
    Accepted,
    /// The claimant out-prioritized the previous owner, which lost its
    /// entry. The caller decides whether the eviction needs a callback.
    Reassigned { evicted: Name },
    /// The address stays with a lower NAME; the claimant gains nothing.
    Rejected { winner: Name },
}

/// Bidirectional partial map between NAMEs and unicast addresses.
///
/// Backed by one slot per address, so lookups by address are O(1) and
/// lookups by NAME scan the 254 slots. Every mutation is a complete
/// transaction; no call can leave the map half-updated.
#[derive(Debug)]
pub struct Network {
    slots: [Option<Name>; UNICAST_ADDRESS_COUNT],
    occupied: usize,
}

impl Network {
    /// Empty registry.
    pub const fn new() -> Self {
        Self {
            slots: [None; UNICAST_ADDRESS_COUNT],
            occupied: 0,
        }
    }

    /// Submit a claim of `address` by `name` and arbitrate against the
    /// current owner, if any:
    ///
    /// - free slot (or already ours) → [`ClaimOutcome::Accepted`];
    /// - held by a higher NAME → the owner is evicted,
    ///   [`ClaimOutcome::Reassigned`];
    /// - held by a lower NAME → [`ClaimOutcome::Rejected`], any entry the
    ///   claimant owns elsewhere is left intact.
    ///
    /// A winning claimant that owned another address is moved, keeping at
    /// most one entry per NAME.
    pub fn try_address_claim(
        &mut self,
        name: Name,
        address: u8,
    ) -> Result<ClaimOutcome, NetworkError> {
        if address > ADDRESS_MAX_UNICAST {
            return Err(NetworkError::InvalidAddress(address));
        }

        let slot = address as usize;
        match self.slots[slot] {
            Some(owner) if owner == name => Ok(ClaimOutcome::Accepted),
            Some(other) if name.has_priority_over(other) => {
                self.slots[slot] = None;
                self.occupied -= 1;
                self.release(name);
                self.slots[slot] = Some(name);
                self.occupied += 1;
                Ok(ClaimOutcome::Reassigned { evicted: other })
            }
            Some(other) => Ok(ClaimOutcome::Rejected { winner: other }),
            None => {
                self.release(name);
                self.slots[slot] = Some(name);
                self.occupied += 1;
                Ok(ClaimOutcome::Accepted)
            }
        }
    }

    /// Remove `name`'s entry, if any.
    pub fn release(&mut self, name: Name) {
        if let Some(address) = self.find_address(name) {
            self.slots[address as usize] = None;
            self.occupied -= 1;
        }
    }

    /// Address currently owned by `name`.
    pub fn find_address(&self, name: Name) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| *slot == Some(name))
            .map(|slot| slot as u8)
    }

    /// NAME currently owning `address`.
    pub fn find_name(&self, address: u8) -> Option<Name> {
        if address > ADDRESS_MAX_UNICAST {
            return None;
        }
        self.slots[address as usize]
    }

    /// Whether `address` is within the unicast range and unoccupied.
    pub fn available(&self, address: u8) -> bool {
        address <= ADDRESS_MAX_UNICAST && self.slots[address as usize].is_none()
    }

    /// First free address in the inclusive range `first..=last`, scanning
    /// upward. Used for the dynamic window walk after a lost contention.
    pub fn find_available(&self, first: u8, last: u8) -> Option<u8> {
        (first..=last.min(ADDRESS_MAX_UNICAST)).find(|address| self.available(*address))
    }

    /// Whether `name` currently owns an address on this segment.
    pub fn in_network(&self, name: Name) -> bool {
        self.find_address(name).is_some()
    }

    /// Number of NAMEs registered. Always equals [`Self::address_size`]
    /// since the map is injective.
    pub fn name_size(&self) -> usize {
        self.address_size()
    }

    /// Number of occupied unicast addresses.
    pub fn address_size(&self) -> usize {
        self.occupied
    }

    /// Whether every unicast address is occupied.
    pub fn is_full(&self) -> bool {
        self.occupied == UNICAST_ADDRESS_COUNT
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.slots = [None; UNICAST_ADDRESS_COUNT];
        self.occupied = 0;
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
