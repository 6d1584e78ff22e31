//! `j1939-claim` library: the address-claim layer of SAE J1939 over a CAN
//! bus in a `no_std` environment. The crate exposes the 29-bit identifier
//! codec, the NAME/address network registry, and the dynamic address-claim
//! state machine, plus async drivers that bind them to a CAN bus.
#![no_std]
//==================================================================================
/// Domain and low-level errors (CAN identifier construction, claim
/// procedure failures, frame extraction, and registry misuse).
pub mod error;
/// SAE J1939 protocol implementation: CAN transport primitives and
/// network management (address claiming, registry, discovery).
pub mod protocol;
//==================================================================================
