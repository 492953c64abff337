// ── IPv4 address arithmetic ──
//
// Pure functions over dotted-quad strings and 32-bit integers. No state,
// no I/O. Parse failures are always returned to the caller; callers decide
// whether to skip (dashboards), log (reconciliation), or surface
// (explicit address CRUD).

use std::net::Ipv4Addr;

use crate::error::CoreError;

/// Parse a dotted-quad IPv4 string into a big-endian 32-bit integer.
///
/// Rejects anything `Ipv4Addr` rejects: wrong segment count, non-numeric
/// segments, octets above 255, leading `+`/whitespace.
pub fn to_int(address: &str) -> Result<u32, CoreError> {
    address
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| CoreError::invalid_address(address))
}

/// Render a 32-bit integer back to dotted-quad form.
pub fn from_int(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

/// The bitmask with `prefix_len` leading one-bits.
///
/// `prefix_len` above 32 saturates to a full mask.
pub fn mask_bits(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        1..=31 => u32::MAX << (32 - u32::from(prefix_len)),
        _ => u32::MAX,
    }
}

/// Whether `address` falls inside the subnet `network_base/prefix_len`.
pub fn belongs_to_subnet(address: &str, network_base: &str, prefix_len: u8) -> Result<bool, CoreError> {
    let ip = to_int(address)?;
    let base = to_int(network_base)?;
    let mask = mask_bits(prefix_len);
    Ok((ip & mask) == (base & mask))
}

/// Usable host count for a prefix length: `2^(32-p) - 2` (network and
/// broadcast excluded), clamped to 0 for /31 and /32.
pub fn capacity(prefix_len: u8) -> u32 {
    if prefix_len >= 31 {
        return 0;
    }
    let hosts = 1u64 << (32 - u32::from(prefix_len));
    u32::try_from(hosts - 2).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn to_int_parses_dotted_quad() {
        assert_eq!(to_int("10.0.10.1").unwrap(), 0x0A00_0A01);
        assert_eq!(to_int("0.0.0.0").unwrap(), 0);
        assert_eq!(to_int("255.255.255.255").unwrap(), u32::MAX);
    }

    #[test]
    fn to_int_rejects_malformed_input() {
        for bad in ["", "10.0.10", "10.0.10.1.5", "10.0.10.256", "a.b.c.d", "10..0.1"] {
            assert!(to_int(bad).is_err(), "expected parse failure for {bad:?}");
        }
    }

    #[test]
    fn round_trip_preserves_rendering() {
        for ip in ["10.0.10.55", "192.168.1.1", "0.0.0.0", "255.255.255.255"] {
            assert_eq!(from_int(to_int(ip).unwrap()), ip);
        }
    }

    #[test]
    fn mask_bits_edges() {
        assert_eq!(mask_bits(0), 0);
        assert_eq!(mask_bits(24), 0xFFFF_FF00);
        assert_eq!(mask_bits(30), 0xFFFF_FFFC);
        assert_eq!(mask_bits(31), 0xFFFF_FFFE);
        assert_eq!(mask_bits(32), u32::MAX);
    }

    #[test]
    fn membership_for_slash_24() {
        assert!(belongs_to_subnet("10.0.10.55", "10.0.10.0", 24).unwrap());
        assert!(!belongs_to_subnet("10.0.11.1", "10.0.10.0", 24).unwrap());
    }

    #[test]
    fn membership_for_slash_32_requires_exact_host() {
        assert!(!belongs_to_subnet("10.0.10.1", "10.0.10.0", 32).unwrap());
        assert!(belongs_to_subnet("10.0.10.0", "10.0.10.0", 32).unwrap());
    }

    #[test]
    fn membership_for_slash_0_matches_everything() {
        assert!(belongs_to_subnet("1.2.3.4", "200.1.1.1", 0).unwrap());
    }

    #[test]
    fn membership_propagates_parse_failures() {
        assert!(belongs_to_subnet("not-an-ip", "10.0.10.0", 24).is_err());
        assert!(belongs_to_subnet("10.0.10.1", "bogus", 24).is_err());
    }

    #[test]
    fn capacity_edges() {
        assert_eq!(capacity(24), 254);
        assert_eq!(capacity(30), 2);
        assert_eq!(capacity(31), 0);
        assert_eq!(capacity(32), 0);
        assert_eq!(capacity(0), u32::MAX - 1);
    }
}
