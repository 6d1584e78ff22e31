//! SAE J1939 NAME field implementation (64 bits). The NAME uniquely
//! identifies a controller application on the network and decides every
//! address contention: the numerically lower NAME wins. The module
//! provides a typed wrapper around the raw `u64` plus safe
//! accessors/builders.
//!
//! # Bit layout (LSB first)
//!
//! ```text
//! Bits  0-20  (21 bits) : Identity number
//! Bits 21-31  (11 bits) : Manufacturer code
//! Bits 32-34  ( 3 bits) : ECU instance
//! Bits 35-39  ( 5 bits) : Function instance
//! Bits 40-47  ( 8 bits) : Function
//! Bit  48     ( 1 bit ) : Reserved
//! Bits 49-55  ( 7 bits) : Vehicle system
//! Bits 56-59  ( 4 bits) : Vehicle system instance
//! Bits 60-62  ( 3 bits) : Industry group
//! Bit  63     ( 1 bit ) : Arbitrary Address Capable
//! ```

use core::fmt;

/// Wrapper around the J1939 NAME field (64 bits).
///
/// The NAME travels on the bus as the 8-byte little-endian payload of the
/// address-claim PGN (60928). Contention compares NAMEs as unsigned
/// integers, so `Ord` on the wrapper is contention order.
///
/// # Example
///
/// ```
/// use j1939_claim::protocol::management::name::Name;
///
/// let name = Name::builder()
///     .identity_number(123456)
///     .manufacturer_code(172)
///     .function(25)
///     .vehicle_system(2)
///     .arbitrary_address_capable(true)
///     .build();
///
/// assert_eq!(name.identity_number(), 123456);
/// assert_eq!(name.manufacturer_code(), 172);
/// assert!(name.is_arbitrary_address_capable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Name(u64);

impl Name {
    /// Build a `Name` from the raw value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the underlying `u64`.
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Create a builder to construct a `Name`.
    #[inline]
    pub const fn builder() -> NameBuilder {
        NameBuilder::new()
    }

    /// Reconstruct a `Name` from the 8-byte little-endian claim payload.
    #[inline]
    pub const fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    /// Little-endian payload of an address-claim frame for this NAME.
    #[inline]
    pub const fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    // Individual accessors for NAME sub-fields.

    /// Identity number (bits 0-20, 21 bits).
    ///
    /// Identifies the unit within the manufacturer lineup.
    #[inline]
    pub const fn identity_number(&self) -> u32 {
        (self.0 & 0x1F_FFFF) as u32
    }

    /// Manufacturer code (bits 21-31, 11 bits).
    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        ((self.0 >> 21) & 0x7FF) as u16
    }

    /// ECU instance (bits 32-34, 3 bits).
    #[inline]
    pub const fn ecu_instance(&self) -> u8 {
        ((self.0 >> 32) & 0x07) as u8
    }

    /// Function instance (bits 35-39, 5 bits).
    #[inline]
    pub const fn function_instance(&self) -> u8 {
        ((self.0 >> 35) & 0x1F) as u8
    }

    /// Function (bits 40-47, 8 bits).
    #[inline]
    pub const fn function(&self) -> u8 {
        ((self.0 >> 40) & 0xFF) as u8
    }

    /// Reserved bit (bit 48).
    #[inline]
    pub const fn reserved(&self) -> bool {
        ((self.0 >> 48) & 0x01) != 0
    }

    /// Vehicle system (bits 49-55, 7 bits).
    #[inline]
    pub const fn vehicle_system(&self) -> u8 {
        ((self.0 >> 49) & 0x7F) as u8
    }

    /// Vehicle system instance (bits 56-59, 4 bits).
    #[inline]
    pub const fn vehicle_system_instance(&self) -> u8 {
        ((self.0 >> 56) & 0x0F) as u8
    }

    /// Industry group (bits 60-62, 3 bits).
    #[inline]
    pub const fn industry_group(&self) -> u8 {
        ((self.0 >> 60) & 0x07) as u8
    }

    /// Arbitrary Address Capable bit (bit 63).
    ///
    /// Indicates whether the controller may move to the dynamic window
    /// (0x80-0xF7) after losing a contention.
    #[inline]
    pub const fn is_arbitrary_address_capable(&self) -> bool {
        ((self.0 >> 63) & 0x01) != 0
    }

    /// Contention rule of J1939-81: the numerically lower NAME wins.
    #[inline]
    pub const fn has_priority_over(&self, other: Name) -> bool {
        self.0 < other.0
    }
}

impl From<u64> for Name {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Name> for u64 {
    #[inline]
    fn from(name: Name) -> Self {
        name.raw()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name {{ identity: {}, mfg: {}, func: {}, system: {}, ecu: {}, aac: {} }}",
            self.identity_number(),
            self.manufacturer_code(),
            self.function(),
            self.vehicle_system(),
            self.ecu_instance(),
            self.is_arbitrary_address_capable()
        )
    }
}

/// Fluent builder used to construct a `Name`.
///
/// # Example
///
/// ```
/// use j1939_claim::protocol::management::name::Name;
///
/// let name = Name::builder()
///     .identity_number(12345)
///     .manufacturer_code(172)
///     .arbitrary_address_capable(true)
///     .build();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NameBuilder {
    raw: u64,
}

impl NameBuilder {
    /// Initialize the builder with all fields cleared.
    #[inline]
    pub const fn new() -> Self {
        Self { raw: 0 }
    }

    /// Set the identity number (bits 0-20, 21 bits).
    ///
    /// # Panics
    /// Panics when the value does not fit in 21 bits (> 0x1FFFFF).
    #[inline]
    pub const fn identity_number(mut self, value: u32) -> Self {
        assert!(value <= 0x1F_FFFF, "Identity number must fit in 21 bits");
        self.raw = (self.raw & !0x1F_FFFF) | (value as u64 & 0x1F_FFFF);
        self
    }

    /// Set the manufacturer code (bits 21-31, 11 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 11 bits (> 0x7FF).
    #[inline]
    pub const fn manufacturer_code(mut self, value: u16) -> Self {
        assert!(value <= 0x7FF, "Manufacturer code must fit in 11 bits");
        self.raw = (self.raw & !(0x7FF << 21)) | ((value as u64 & 0x7FF) << 21);
        self
    }

    /// Set the ECU instance (bits 32-34, 3 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 3 bits (> 0x07).
    #[inline]
    pub const fn ecu_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x07, "ECU instance must fit in 3 bits");
        self.raw = (self.raw & !(0x07 << 32)) | ((value as u64 & 0x07) << 32);
        self
    }

    /// Set the function instance (bits 35-39, 5 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 5 bits (> 0x1F).
    #[inline]
    pub const fn function_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x1F, "Function instance must fit in 5 bits");
        self.raw = (self.raw & !(0x1F << 35)) | ((value as u64 & 0x1F) << 35);
        self
    }

    /// Set the function (bits 40-47, 8 bits).
    #[inline]
    pub const fn function(mut self, value: u8) -> Self {
        self.raw = (self.raw & !(0xFF << 40)) | ((value as u64) << 40);
        self
    }

    /// Update the reserved bit (bit 48).
    #[inline]
    pub const fn reserved(mut self, value: bool) -> Self {
        self.raw = (self.raw & !(0x01 << 48)) | ((value as u64) << 48);
        self
    }

    /// Set the vehicle system (bits 49-55, 7 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 7 bits (> 0x7F).
    #[inline]
    pub const fn vehicle_system(mut self, value: u8) -> Self {
        assert!(value <= 0x7F, "Vehicle system must fit in 7 bits");
        self.raw = (self.raw & !(0x7F << 49)) | ((value as u64 & 0x7F) << 49);
        self
    }

    /// Set the vehicle system instance (bits 56-59, 4 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 4 bits (> 0x0F).
    #[inline]
    pub const fn vehicle_system_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x0F, "Vehicle system instance must fit in 4 bits");
        self.raw = (self.raw & !(0x0F << 56)) | ((value as u64 & 0x0F) << 56);
        self
    }

    /// Set the industry group (bits 60-62, 3 bits).
    ///
    /// # Panics
    /// Panics when the value exceeds 3 bits (> 0x07).
    #[inline]
    pub const fn industry_group(mut self, value: u8) -> Self {
        assert!(value <= 0x07, "Industry group must fit in 3 bits");
        self.raw = (self.raw & !(0x07 << 60)) | ((value as u64 & 0x07) << 60);
        self
    }

    /// Configure the Arbitrary Address Capable bit (bit 63).
    #[inline]
    pub const fn arbitrary_address_capable(mut self, value: bool) -> Self {
        self.raw = (self.raw & !(0x01 << 63)) | ((value as u64) << 63);
        self
    }

    /// Build the final `Name`.
    #[inline]
    pub const fn build(self) -> Name {
        Name(self.raw)
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_number_extraction() {
        let name = Name::builder().identity_number(0x1ABCDE).build();
        assert_eq!(name.identity_number(), 0x1ABCDE);
    }

    #[test]
    fn test_manufacturer_code_extraction() {
        let name = Name::builder().manufacturer_code(172).build();
        assert_eq!(name.manufacturer_code(), 172);
    }

    #[test]
    fn test_arbitrary_address_capable_bit() {
        let name_aac = Name::builder().arbitrary_address_capable(true).build();
        assert!(name_aac.is_arbitrary_address_capable());
        assert_eq!(name_aac.raw() & (1u64 << 63), 1u64 << 63);

        let name_fixed = Name::builder().arbitrary_address_capable(false).build();
        assert!(!name_fixed.is_arbitrary_address_capable());
        assert_eq!(name_fixed.raw() & (1u64 << 63), 0);
    }

    #[test]
    fn test_all_fields() {
        let name = Name::builder()
            .identity_number(123456)
            .manufacturer_code(172)
            .ecu_instance(3)
            .function_instance(12)
            .function(130)
            .vehicle_system(25)
            .vehicle_system_instance(7)
            .industry_group(2)
            .arbitrary_address_capable(true)
            .build();

        assert_eq!(name.identity_number(), 123456);
        assert_eq!(name.manufacturer_code(), 172);
        assert_eq!(name.ecu_instance(), 3);
        assert_eq!(name.function_instance(), 12);
        assert_eq!(name.function(), 130);
        assert!(!name.reserved());
        assert_eq!(name.vehicle_system(), 25);
        assert_eq!(name.vehicle_system_instance(), 7);
        assert_eq!(name.industry_group(), 2);
        assert!(name.is_arbitrary_address_capable());
    }

    #[test]
    fn test_raw_round_trip() {
        let raw_value = 0x8123456789ABCDEF;
        let name = Name::from_raw(raw_value);
        assert_eq!(name.raw(), raw_value);

        let converted: u64 = name.into();
        assert_eq!(converted, raw_value);
    }

    #[test]
    fn test_payload_round_trip() {
        let name = Name::builder()
            .identity_number(0x12345)
            .manufacturer_code(0x2AB)
            .function(0xAA)
            .vehicle_system(0x33)
            .industry_group(0x04)
            .arbitrary_address_capable(true)
            .build();

        let restored = Name::from_le_bytes(name.to_le_bytes());
        assert_eq!(name, restored);
    }

    #[test]
    fn test_contention_order() {
        let winner = Name::from_raw(0x1234_5678_90AB_CDEE);
        let loser = Name::from_raw(0x1234_5678_90AB_CDEF);

        assert!(winner.has_priority_over(loser));
        assert!(!loser.has_priority_over(winner));
        assert!(winner < loser);
    }
}
