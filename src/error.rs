use core::fmt::{self, Display};

/// Errors arising while parsing keys and ciphertexts from bytes.
///
/// Parsing is the only fallible surface of the crate: once a key or
/// ciphertext has been accepted, every operation on it is infallible.
/// In particular, decapsulating an adversarial ciphertext is *not* an
/// error; it silently yields the implicit-rejection key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// An encapsulation key, decapsulation key, or seed had a length other
    /// than the one prescribed by the parameter set.
    InvalidKeyLength,

    /// A ciphertext had a length other than the one prescribed by the
    /// parameter set.
    InvalidCiphertextLength,

    /// A key of the correct length failed validation: an encapsulation key
    /// whose encoded coefficients are not canonical (the FIPS 203 modulus
    /// check), or a decapsulation key whose embedded key hash does not
    /// match the recomputed value (the hash check).
    InvalidKey,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyLength => f.write_str("invalid key length"),
            Self::InvalidCiphertextLength => f.write_str("invalid ciphertext length"),
            Self::InvalidKey => f.write_str("invalid key"),
        }
    }
}

impl core::error::Error for Error {}
