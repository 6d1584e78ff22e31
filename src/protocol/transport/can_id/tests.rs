//! Unit tests for the `CanId` accessors and builder.
use super::*;
use crate::protocol::transport::{ADDRESS_GLOBAL, PGN_ADDRESS_CLAIM, PGN_ISO_REQUEST};

//==================================================================================CAN_ID
#[test]
/// Field extraction on an address-claim identifier (PDU1 to global).
fn test_address_claim_id_fields() {
    // priority 6, PF 0xEE, PS 0xFF, SA 0x42
    let can_id = CanId(0x18EEFF42);
    assert_eq!(can_id.priority(), 6);
    assert_eq!(can_id.data_page(), 0);
    assert_eq!(can_id.pf(), 0xEE);
    assert_eq!(can_id.ps(), 0xFF);
    assert_eq!(can_id.source_address(), 0x42);
    assert_eq!(can_id.pgn(), PGN_ADDRESS_CLAIM);
    assert_eq!(can_id.destination(), Some(ADDRESS_GLOBAL));
    assert!(can_id.is_address_management());
}

#[test]
/// PDU2 identifiers fold the PS byte into the PGN and have no destination.
fn test_pdu2_id_fields() {
    // priority 3, PF 0xFE, PS 0xF1 (PGN 65265), SA 0x21
    let can_id = CanId(0x0CFEF121);
    assert_eq!(can_id.priority(), 3);
    assert_eq!(can_id.pgn(), 65265);
    assert_eq!(can_id.destination(), None);
    assert!(!can_id.is_address_management());
}

#[test]
/// The request filter matches PF 0xEA regardless of destination.
fn test_request_filter() {
    let global = CanId(0x18EAFFFE);
    assert_eq!(global.pgn(), PGN_ISO_REQUEST);
    assert!(global.is_address_management());

    let directed = CanId(0x18EA2A10);
    assert_eq!(directed.destination(), Some(0x2A));
    assert!(directed.is_address_management());
}
//==================================================================================CAN_ID_BUILDER
#[test]
/// Validates builder scenarios: broadcast, addressed, and error handling.
fn test_builder() {
    // Addressed message (PDU1): address claim to the global destination
    let claim_id = CanId::builder(PGN_ADDRESS_CLAIM, 0x42)
        .to_destination(ADDRESS_GLOBAL)
        .with_priority(6)
        .build()
        .expect("claim id must build");
    assert_eq!(claim_id.0, 0x18EEFF42);

    // Broadcast (PDU2): engine temperature, destination stays None
    let broadcast_id = CanId::builder(65262, 0x10).with_priority(6).build();
    assert!(broadcast_id.is_ok());

    // Misconfiguration: a PDU1 PGN without a destination cannot build
    let invalid_id = CanId::builder(PGN_ISO_REQUEST, 0x10).build();
    assert!(matches!(
        invalid_id,
        Err(CanIdBuildError::InvalidForBroadcast)
    ));

    // Misconfiguration: a PDU2 PGN cannot be addressed
    let invalid_id = CanId::builder(65262, 0x10).to_destination(0x20).build();
    assert!(matches!(
        invalid_id,
        Err(CanIdBuildError::InvalidForAddressedMessage { pf: 0xFE })
    ));
}

#[test]
/// Round trip: fields fed into the builder come back out of the accessors.
fn test_builder_accessor_round_trip() {
    let id = CanId::builder(PGN_ISO_REQUEST, 0x80)
        .to_destination(0x2A)
        .with_priority(6)
        .build()
        .expect("request id must build");
    assert_eq!(id.priority(), 6);
    assert_eq!(id.pgn(), PGN_ISO_REQUEST);
    assert_eq!(id.destination(), Some(0x2A));
    assert_eq!(id.source_address(), 0x80);
}

#[test]
/// The priority must be capped to 3 bits to avoid touching the reserved field.
fn test_priority_masks_extra_bits() {
    let can_id = CanId::builder(65262, 35)
        .with_priority(0b1111_0000)
        .build()
        .expect("CanId must build");

    assert_eq!(can_id.0 & (1 << 29), 0, "Reserved bit 29 must remain clear");
    assert_eq!(can_id.priority(), 0);
}
