#![no_std]
#![doc = include_str!("../README.md")]
#![allow(non_snake_case)] // Allow notation matching FIPS 203
#![allow(clippy::clone_on_copy)] // Be explicit about moving data
#![deny(missing_docs)] // Require all public interfaces to be documented
#![warn(clippy::pedantic)] // Be pedantic by default
#![warn(clippy::integer_division_remainder_used)] // Be judicious about using `/` and `%`

//! # Usage
//!
//! ```
//! use mlkem::{MlKem768, KemCore};
//! use kem::{Decapsulate, Encapsulate};
//!
//! let mut rng = rand::thread_rng();
//!
//! // Generate a (decapsulation key, encapsulation key) pair
//! let (dk, ek) = MlKem768::generate(&mut rng);
//!
//! // Encapsulate a shared key to the holder of the decapsulation key, receive the shared
//! // secret `k_send` and the encapsulated form `ct`.
//! let (ct, k_send) = ek.encapsulate(&mut rng).unwrap();
//!
//! // Decapsulate the shared key and verify that it was faithfully received.
//! let k_recv = dk.decapsulate(&ct).unwrap();
//! assert_eq!(k_send, k_recv);
//! ```

/// The inevitable utility module
mod util;

/// Arithmetic in the ring `R_q` and its NTT image: field elements,
/// polynomials, vectors, matrices, and the sampling algorithms
mod algebra;

/// Wrappers for the SHA3 / SHAKE hash oracles
mod crypto;

/// Lossy compression and decompression of ring elements
mod compress;

/// Bit-packed encoding and decoding of polynomials
mod encode;

/// Boundary errors
mod error;

/// The K-PKE component scheme
mod pke;

/// The ML-KEM key-encapsulation mechanism
pub mod kem;

/// Parameter sets and the compile-time size machinery
mod param;

/// Trait definitions
mod traits;

use core::fmt::Debug;
use hybrid_array::{
    Array,
    typenum::{U2, U3, U4, U5, U10, U11, U64},
};

pub use hybrid_array as array;

pub use error::Error;
pub use ml_kem_512::MlKem512Params;
pub use ml_kem_768::MlKem768Params;
pub use ml_kem_1024::MlKem1024Params;
pub use param::{
    ArraySize, CbdSamplingSize, EncodingSize, KemParams, ParameterSet, PkeParams,
    VectorEncodingSize,
};
pub use traits::*;

#[cfg(feature = "deterministic")]
pub use util::B32;

/// An ML-KEM seed: the 64-byte string `d || z`, which fully determines a key
/// pair and is the preferred serialization of a decapsulation (private) key.
pub type Seed = Array<u8, U64>;

/// ML-KEM-512 is the parameter set for security category 1, corresponding to
/// key search on a block cipher with a 128-bit key.
pub mod ml_kem_512 {
    use super::{Debug, ParameterSet, U2, U3, U4, U10, kem};

    /// The parameters of ML-KEM-512: `k = 2`, `eta_1 = 3`, `eta_2 = 2`,
    /// `d_u = 10`, `d_v = 4`.
    #[derive(Default, Clone, Debug, PartialEq)]
    pub struct MlKem512Params;

    impl ParameterSet for MlKem512Params {
        type K = U2;
        type Eta1 = U3;
        type Eta2 = U2;
        type Du = U10;
        type Dv = U4;
    }

    /// An ML-KEM-512 decapsulation key
    pub type DecapsulationKey = kem::DecapsulationKey<MlKem512Params>;

    /// An ML-KEM-512 encapsulation key
    pub type EncapsulationKey = kem::EncapsulationKey<MlKem512Params>;
}

/// ML-KEM-768 is the parameter set for security category 3, corresponding to
/// key search on a block cipher with a 192-bit key.
pub mod ml_kem_768 {
    use super::{Debug, ParameterSet, U2, U3, U4, U10, kem};

    /// The parameters of ML-KEM-768: `k = 3`, `eta_1 = 2`, `eta_2 = 2`,
    /// `d_u = 10`, `d_v = 4`.
    #[derive(Default, Clone, Debug, PartialEq)]
    pub struct MlKem768Params;

    impl ParameterSet for MlKem768Params {
        type K = U3;
        type Eta1 = U2;
        type Eta2 = U2;
        type Du = U10;
        type Dv = U4;
    }

    /// An ML-KEM-768 decapsulation key
    pub type DecapsulationKey = kem::DecapsulationKey<MlKem768Params>;

    /// An ML-KEM-768 encapsulation key
    pub type EncapsulationKey = kem::EncapsulationKey<MlKem768Params>;
}

/// ML-KEM-1024 is the parameter set for security category 5, corresponding to
/// key search on a block cipher with a 256-bit key.
pub mod ml_kem_1024 {
    use super::{Debug, ParameterSet, U2, U4, U5, U11, kem};

    /// The parameters of ML-KEM-1024: `k = 4`, `eta_1 = 2`, `eta_2 = 2`,
    /// `d_u = 11`, `d_v = 5`.
    #[derive(Default, Clone, Debug, PartialEq)]
    pub struct MlKem1024Params;

    impl ParameterSet for MlKem1024Params {
        type K = U4;
        type Eta1 = U2;
        type Eta2 = U2;
        type Du = U11;
        type Dv = U5;
    }

    /// An ML-KEM-1024 decapsulation key
    pub type DecapsulationKey = kem::DecapsulationKey<MlKem1024Params>;

    /// An ML-KEM-1024 encapsulation key
    pub type EncapsulationKey = kem::EncapsulationKey<MlKem1024Params>;
}

/// A shared key produced by the KEM `K`
pub type SharedKey<K> = Array<u8, <K as KemCore>::SharedKeySize>;

/// A ciphertext produced by the KEM `K`
pub type Ciphertext<K> = Array<u8, <K as KemCore>::CiphertextSize>;

/// ML-KEM with the parameter set for security category 1, corresponding to key
/// search on a block cipher with a 128-bit key.
pub type MlKem512 = kem::Kem<MlKem512Params>;

/// ML-KEM with the parameter set for security category 3, corresponding to key
/// search on a block cipher with a 192-bit key.
pub type MlKem768 = kem::Kem<MlKem768Params>;

/// ML-KEM with the parameter set for security category 5, corresponding to key
/// search on a block cipher with a 256-bit key.
pub type MlKem1024 = kem::Kem<MlKem1024Params>;
