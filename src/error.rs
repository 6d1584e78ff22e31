//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (CAN ID construction,
//! address claiming, frame extraction, registry misuse).
use thiserror_no_std::Error;

#[derive(Error, Debug)]
/// Errors that can occur while building a 29-bit CAN identifier.
pub enum CanIdBuildError {
    /// Attempt to build a broadcast message (PDU2) with PF < 240.
    #[error("Invalid for broadcast message: PF is too low")]
    InvalidForBroadcast,
    /// Attempt to build an addressed message (PDU1) with PF ≥ 240.
    #[error("Invalid for addressed message: PF is too high: {pf}")]
    InvalidForAddressedMessage { pf: u8 },
    /// In PDU1 the lower 8 bits of the PGN must remain zero.
    #[error("PDU1 PGNs require PS = 0")]
    PsMustBeNullForPdu1,
}

#[derive(Debug, Error)]
/// Failures while extracting information from a raw CAN frame.
pub enum ExtractionError {
    /// The frame does not carry the expected PGN.
    #[error("Invalid incoming J1939 frame")]
    InvalidIncomingFrame,
    /// Payload length does not match the message definition.
    #[error("Invalid data length")]
    InvalidDataLen,
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Registry misuse detected by the network map.
pub enum NetworkError {
    /// Only unicast addresses (0x00–0xFD) can own a registry entry.
    #[error("Address {0:#04X} is outside the unicast range")]
    InvalidAddress(u8),
}

#[derive(Error, Debug)]
/// Errors encountered while claiming or defending an address.
pub enum ClaimError<E: core::fmt::Debug> {
    /// CAN bus rejected the frame during transmission.
    #[error("CAN bus send error: {0:?}")]
    SendError(E),

    /// Unable to receive frames from the bus.
    #[error("CAN bus receive error: {0:?}")]
    ReceiveError(E),

    /// No free address was available in the dynamic window.
    #[error("No address available")]
    NoAddressAvailable,

    /// Failed to extract the NAME from a claim frame.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
