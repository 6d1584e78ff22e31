//! Network management logic: NAME field manipulation, the NAME/address
//! registry, dynamic address claiming, and neighbour discovery.
pub mod address_claimer;
pub mod address_manager;
pub mod address_supervisor;
pub mod name;
pub mod network;
pub mod network_discovering;
