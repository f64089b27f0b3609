use std::fmt;

use serde::{Deserialize, Serialize};

/// Random seed for a simulation. Left unset, the engine derives one from
/// the highest-resolution clock the operating system provides.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed(Option<u64>);

impl Seed {
    pub fn unset() -> Self {
        Seed(None)
    }

    /// Derives a 32-bit seed from the textual form of an arbitrary value,
    /// so equal textual forms always seed identically.
    pub fn derived(value: impl fmt::Display) -> Self {
        Seed(Some(u64::from(adler32(value.to_string().as_bytes()))))
    }

    pub fn value(self) -> Option<u64> {
        self.0
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Seed(Some(seed))
    }
}

// Negative integers have no direct unsigned representation; they take the
// same textual-derivation path as any other non-integer value.
impl From<i64> for Seed {
    fn from(seed: i64) -> Self {
        if seed >= 0 {
            Seed(Some(seed as u64))
        } else {
            Seed::derived(seed)
        }
    }
}

impl From<&str> for Seed {
    fn from(seed: &str) -> Self {
        Seed::derived(seed)
    }
}

impl From<String> for Seed {
    fn from(seed: String) -> Self {
        Seed::derived(seed)
    }
}

/// Adler-32 checksum (RFC 1950), the derivation hash for textual seeds.
fn adler32(data: &[u8]) -> u32 {
    const MODULUS: u32 = 65521;
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + u32::from(byte)) % MODULUS;
        b = (b + a) % MODULUS;
    }
    (b << 16) | a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adler32_known_vector() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
        assert_eq!(adler32(b""), 1);
    }

    #[test]
    fn integers_in_range_are_used_directly() {
        assert_eq!(Seed::from(42u64).value(), Some(42));
        assert_eq!(Seed::from(u64::MAX).value(), Some(u64::MAX));
        assert_eq!(Seed::from(7i64).value(), Some(7));
    }

    #[test]
    fn textual_derivation_is_deterministic() {
        let a = Seed::from("entangle");
        let b = Seed::from("entangle");
        assert_eq!(a, b);
        assert!(a.value().unwrap() <= u64::from(u32::MAX));
        assert_ne!(a, Seed::from("entangled"));
    }

    #[test]
    fn negative_integers_take_the_derived_path() {
        assert_eq!(Seed::from(-1i64), Seed::derived("-1"));
        assert_ne!(Seed::from(-1i64).value(), None);
    }

    #[test]
    fn unset_by_default() {
        assert_eq!(Seed::default().value(), None);
        assert_eq!(Seed::unset(), Seed::default());
    }
}
