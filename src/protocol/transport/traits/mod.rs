//! Abstraction traits used by the transport layer (CAN bus and delay).
pub mod can_bus;
pub mod delay;
