use core::fmt;

/// The number of bytes a [`FlakeId`] occupies on the wire.
pub const FLAKE_ID_SIZE: usize = core::mem::size_of::<i64>();

/// A 64-bit Snowflake-style identifier.
///
/// - 42 bits timestamp (ms since the configured epoch)
/// - 10 bits machine ID
/// - 12 bits sequence
///
/// The machine ID and sequence together form the 22-bit *discriminator* that
/// keeps identifiers minted within the same millisecond apart.
///
/// ```text
///  Bit Index:  63             22 21             12 11             0
///              +----------------+-----------------+---------------+
///              | timestamp (42) | machine ID (10) | sequence (12) |
///              +----------------+-----------------+---------------+
///              |<----- MSB ---------- 64 bits --------- LSB ----->|
/// ```
///
/// On the wire the value is a big-endian two's-complement `i64`. The
/// timestamp is always extracted with an unsigned shift, so the sign bit never
/// bleeds into the discriminator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i64", into = "i64"))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlakeId {
    id: u64,
}

impl FlakeId {
    /// Bitmask for extracting the 42-bit timestamp field. Occupies bits 22
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << 42) - 1;

    /// Bitmask for extracting the 10-bit machine ID field. Occupies bits 12
    /// through 21.
    pub const MACHINE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Bitmask covering the whole 22-bit discriminator (machine ID and
    /// sequence).
    pub const DISCRIMINATOR_MASK: u64 = (1 << 22) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the machine ID to its correct position (bit 12).
    pub const MACHINE_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the three components into an identifier. Out-of-range inputs are
    /// masked to their field width.
    pub const fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_id = (machine_id & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_id | sequence,
        }
    }

    /// Extracts the timestamp (milliseconds since the epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the machine ID.
    pub const fn machine_id(&self) -> u64 {
        (self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Extracts the low 22 bits (machine ID and sequence).
    pub const fn discriminator(&self) -> u64 {
        self.id & Self::DISCRIMINATOR_MASK
    }

    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    pub const fn max_machine_id() -> u64 {
        Self::MACHINE_ID_MASK
    }

    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Reinterprets the bits as the signed value sent on the wire.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    pub const fn from_i64(raw: i64) -> Self {
        Self { id: raw as u64 }
    }

    /// Big-endian wire encoding.
    pub const fn to_be_bytes(&self) -> [u8; FLAKE_ID_SIZE] {
        self.to_i64().to_be_bytes()
    }

    pub const fn from_be_bytes(bytes: [u8; FLAKE_ID_SIZE]) -> Self {
        Self::from_i64(i64::from_be_bytes(bytes))
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub const fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.machine_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    pub const fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_components(ts, self.machine_id(), 0)
    }
}

/// Recovers the elapsed milliseconds since the epoch from a raw wire value.
///
/// The shift is unsigned: `decode(-1)` is `2^42 - 1`, not `-1`.
///
/// ```
/// use flakeid::{FlakeId, decode};
///
/// let id = FlakeId::from_components(1_000, 3, 7);
/// assert_eq!(decode(id.to_i64()), 1_000);
/// ```
pub const fn decode(raw: i64) -> u64 {
    (raw as u64) >> FlakeId::TIMESTAMP_SHIFT
}

impl From<i64> for FlakeId {
    fn from(raw: i64) -> Self {
        Self::from_i64(raw)
    }
}

impl From<FlakeId> for i64 {
    fn from(id: FlakeId) -> Self {
        id.to_i64()
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i64())
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakeId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flake_id_fields_and_bounds() {
        let ts = FlakeId::max_timestamp();
        let mid = FlakeId::max_machine_id();
        let seq = FlakeId::max_sequence();

        let id = FlakeId::from_components(ts, mid, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.machine_id(), mid);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.discriminator(), FlakeId::DISCRIMINATOR_MASK);
        assert_eq!(id.to_raw(), u64::MAX);
        assert_eq!(id.to_i64(), -1);
    }

    #[test]
    fn test_components_are_masked() {
        let id = FlakeId::from_components(1, FlakeId::MACHINE_ID_MASK + 2, FlakeId::SEQUENCE_MASK + 3);
        assert_eq!(id.timestamp(), 1);
        assert_eq!(id.machine_id(), 1);
        assert_eq!(id.sequence(), 2);
    }

    #[test]
    fn test_decode_is_unsigned_shift() {
        assert_eq!(decode(0), 0);
        assert_eq!(decode(1), 0);
        assert_eq!(decode(1 << 22), 1);
        assert_eq!(decode(-1), FlakeId::TIMESTAMP_MASK);
        assert_eq!(decode(i64::MIN), 1 << 41);
        assert_eq!(decode(i64::MAX), (1 << 41) - 1);
    }

    #[test]
    fn test_wire_bytes_boundaries() {
        for raw in [0, 1, -1, i64::MAX, i64::MIN] {
            let id = FlakeId::from_i64(raw);
            let bytes = id.to_be_bytes();
            assert_eq!(bytes, raw.to_be_bytes());
            assert_eq!(FlakeId::from_be_bytes(bytes).to_i64(), raw);
        }
    }

    #[test]
    fn test_wire_bytes_are_big_endian() {
        let id = FlakeId::from_components(1, 0, 0);
        assert_eq!(id.to_be_bytes(), [0, 0, 0, 0, 0, 0x40, 0, 0]);
    }

    #[test]
    fn test_ordering_follows_timestamp_then_discriminator() {
        let a = FlakeId::from_components(10, 5, 4095);
        let b = FlakeId::from_components(11, 0, 0);
        let c = FlakeId::from_components(11, 0, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_rollover_resets_sequence() {
        let id = FlakeId::from_components(10, 7, 42).rollover_to_timestamp(11);
        assert_eq!(id.timestamp(), 11);
        assert_eq!(id.machine_id(), 7);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn test_display_is_signed_decimal() {
        assert_eq!(FlakeId::from_i64(-1).to_string(), "-1");
        assert_eq!(FlakeId::from_components(1, 0, 0).to_string(), "4194304");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_signed_integer() {
        let id = FlakeId::from_components(1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_i64().to_string());
        let back: FlakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
