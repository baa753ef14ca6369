//! Participant Id or a lookup target
use std::fmt::{self, Debug, Formatter};

use rand::Rng;
use sha2::{Digest, Sha256};

/// The size of participant ids in bytes.
pub const ID_SIZE: usize = 32;
/// The size of participant ids in bits.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Participant Id or a lookup target
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    /// Derive an [Id] from an address string.
    ///
    /// Deterministic one-way hash; distinct addresses are assumed to yield
    /// distinct ids, collisions are not detected.
    pub fn from_address(address: &str) -> Id {
        let digest = Sha256::digest(address.as_bytes());

        Id(digest.into())
    }

    pub fn random() -> Id {
        let mut rng = rand::thread_rng();

        Id(rng.gen())
    }

    /// Like [Id::random] but with a caller-supplied generator, for seeded
    /// deterministic simulations.
    pub fn from_rng<R: Rng>(rng: &mut R) -> Id {
        Id(rng.gen())
    }

    /// XOR distance between this Id and a target Id, as an unsigned 256-bit
    /// integer.
    ///
    /// Symmetric, and zero iff both ids are equal.
    pub fn xor(&self, other: &Id) -> Distance {
        let mut bytes = [0u8; ID_SIZE];

        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }

        Distance(bytes)
    }

    /// The routing table bucket index for `other` in a table owned by this
    /// Id: the length of the shared binary prefix of the two ids, equal to
    /// `255 - bitlength(xor distance)`.
    ///
    /// `None` when the ids are equal (a participant never stores itself).
    pub fn bucket_index(&self, other: &Id) -> Option<u8> {
        for i in 0..ID_SIZE {
            let xor = self.0[i] ^ other.0[i];

            if xor != 0 {
                // leading zero bits so far + leading zeros of this byte
                return Some((i as u32 * 8 + xor.leading_zeros()) as u8);
            }
        }

        None
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// XOR distance between two [Id]s, ordered as an unsigned big-endian
/// 256-bit integer. Smaller is closer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance(pub(crate) [u8; ID_SIZE]);

impl Distance {
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}

impl Debug for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Distance(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}
