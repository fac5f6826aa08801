//! Trait definitions

use ::kem::{Decapsulate, Encapsulate};
use core::fmt::Debug;
use rand_core::CryptoRngCore;

use crate::error::Error;
use crate::param::ArraySize;
use crate::{Ciphertext, Seed, SharedKey};

#[cfg(feature = "deterministic")]
use crate::util::B32;

/// An object with a fixed-size byte encoding.
pub trait EncodedSizeUser: Sized {
    /// The size of the encoded object.
    type EncodedSize: ArraySize;

    /// Parse an object from its encoded form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the encoding fails validation: an
    /// encapsulation key whose coefficients are not canonical mod q, or a
    /// decapsulation key whose embedded key hash is inconsistent.
    fn from_bytes(enc: &Encoded<Self>) -> Result<Self, Error>;

    /// Serialize an object to its encoded form.
    fn as_bytes(&self) -> Encoded<Self>;
}

/// A byte array encoding a value of the indicated size.
pub type Encoded<T> = hybrid_array::Array<u8, <T as EncodedSizeUser>::EncodedSize>;

/// A KEM that ties together all the types related to one parameter set.
pub trait KemCore {
    /// The size of a shared key generated by this KEM.
    type SharedKeySize: ArraySize;

    /// The size of a ciphertext encapsulating a shared key.
    type CiphertextSize: ArraySize;

    /// A decapsulation key for this KEM.
    type DecapsulationKey: Decapsulate<Ciphertext<Self>, SharedKey<Self>>
        + EncodedSizeUser
        + Debug
        + PartialEq;

    /// An encapsulation key for this KEM.
    type EncapsulationKey: Encapsulate<Ciphertext<Self>, SharedKey<Self>>
        + EncodedSizeUser
        + Clone
        + Debug
        + PartialEq;

    /// Generate a new (decapsulation key, encapsulation key) pair, drawing
    /// the required randomness from the provided RNG.
    fn generate(
        rng: &mut impl CryptoRngCore,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey);

    /// Deterministically derive a key pair from a 64-byte `d || z` seed.
    fn from_seed(seed: Seed) -> (Self::DecapsulationKey, Self::EncapsulationKey);

    /// Deterministically generate a key pair from the two 32-byte seeds
    /// `d` and `z`.  Useful for testing against known-answer vectors.
    #[cfg(feature = "deterministic")]
    fn generate_deterministic(
        d: &B32,
        z: &B32,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey);
}

/// A KEM that can encapsulate with externally supplied randomness.
///
/// # ⚠️ Warning
///
/// Never call this with anything but fresh uniform random bytes.  It exists
/// so that encapsulation can be checked against known-answer vectors.
#[cfg(feature = "deterministic")]
pub trait EncapsulateDeterministic<EK, SS> {
    /// Possible error types
    type Error: Debug;

    /// Encapsulate with the given message value.
    ///
    /// # Errors
    ///
    /// Infallible for the KEM implemented by this crate.
    fn encapsulate_deterministic(&self, m: &B32) -> Result<(EK, SS), Self::Error>;
}
