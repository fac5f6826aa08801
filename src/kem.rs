use core::convert::Infallible;
use core::marker::PhantomData;
use hybrid_array::typenum::U32;
use rand_core::CryptoRngCore;
use subtle::{ConditionallySelectable, ConstantTimeEq};

use crate::crypto::{G, H, J, rand};
use crate::error::Error;
use crate::param::{DecapsulationKeySize, EncapsulationKeySize, EncodedCiphertext, KemParams};
use crate::pke::{DecryptionKey, EncryptionKey};
use crate::util::B32;
use crate::{Encoded, EncodedSizeUser, Seed};

#[cfg(feature = "zeroize")]
use zeroize::{Zeroize, ZeroizeOnDrop};

// Re-export traits from the `kem` crate
pub use ::kem::{Decapsulate, Encapsulate};

/// A shared key resulting from an ML-KEM transaction
pub(crate) type SharedKey = B32;

/// A `DecapsulationKey` provides the ability to generate a new key pair, and
/// decapsulate an encapsulated shared key.
#[derive(Clone, Debug)]
pub struct DecapsulationKey<P>
where
    P: KemParams,
{
    dk_pke: DecryptionKey<P>,
    ek: EncapsulationKey<P>,
    d: Option<B32>,
    z: B32,
}

// Handwritten to omit `d` from the comparison, so keys parsed from the
// expanded form compare equal to the seed-generated keys they came from.
impl<P> PartialEq for DecapsulationKey<P>
where
    P: KemParams,
{
    fn eq(&self, other: &Self) -> bool {
        let dk_pke = self.dk_pke.as_bytes();
        let other_dk_pke = other.dk_pke.as_bytes();
        bool::from(dk_pke.as_slice().ct_eq(other_dk_pke.as_slice()))
            && self.ek == other.ek
            && self.z == other.z
    }
}

#[cfg(feature = "zeroize")]
impl<P> Drop for DecapsulationKey<P>
where
    P: KemParams,
{
    fn drop(&mut self) {
        self.dk_pke.zeroize();
        if let Some(d) = &mut self.d {
            d.as_mut_slice().zeroize();
        }
        self.z.as_mut_slice().zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl<P> ZeroizeOnDrop for DecapsulationKey<P> where P: KemParams {}

impl<P> DecapsulationKey<P>
where
    P: KemParams,
{
    /// Create a `DecapsulationKey` from a 64-byte `d || z` seed.  This is the
    /// preferred serialization for private keys.
    #[must_use]
    pub fn from_seed(seed: Seed) -> Self {
        let (d, z) = seed.split();
        Self::generate_deterministic(d, z)
    }

    /// Create a `DecapsulationKey` from a seed presented as a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] unless the slice is 64 bytes long.
    pub fn from_seed_slice(seed: &[u8]) -> Result<Self, Error> {
        let seed = Seed::try_from(seed).map_err(|_| Error::InvalidKeyLength)?;
        Ok(Self::from_seed(seed))
    }

    /// Serialize the seed this key was generated from.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.  Please treat it with care.
    ///
    /// # Returns
    ///
    /// - `Some` if the key was created from a seed.
    /// - `None` if the key was parsed from the expanded form.
    #[must_use]
    pub fn to_seed(&self) -> Option<Seed> {
        self.d.clone().map(|d| d.concat(self.z.clone()))
    }

    /// Get the [`EncapsulationKey`] which corresponds to this
    /// `DecapsulationKey`.
    pub fn encapsulation_key(&self) -> &EncapsulationKey<P> {
        &self.ek
    }

    /// Decapsulate a ciphertext presented as a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCiphertextLength`] if the slice length does not
    /// match the parameter set.  A well-formed but forged ciphertext is *not*
    /// an error; it yields the implicit-rejection key.
    pub fn decapsulate_slice(&self, ciphertext: &[u8]) -> Result<SharedKey, Error> {
        let ct = EncodedCiphertext::<P>::try_from(ciphertext)
            .map_err(|_| Error::InvalidCiphertextLength)?;
        Ok(self.decapsulate_inner(&ct))
    }

    pub(crate) fn generate(rng: &mut impl CryptoRngCore) -> Self {
        let d: B32 = rand(rng);
        let z: B32 = rand(rng);
        Self::generate_deterministic(d, z)
    }

    #[must_use]
    #[allow(clippy::similar_names)] // allow dk_pke, ek_pke, following FIPS 203
    pub(crate) fn generate_deterministic(d: B32, z: B32) -> Self {
        let (dk_pke, ek_pke) = DecryptionKey::generate(&d);
        let ek = EncapsulationKey::new(ek_pke);
        let d = Some(d);
        Self { dk_pke, ek, d, z }
    }

    /// Algorithm 18: `ML-KEM.Decaps_internal(dk, c)`
    fn decapsulate_inner(&self, ciphertext: &EncodedCiphertext<P>) -> SharedKey {
        let m_prime = self.dk_pke.decrypt(ciphertext);
        let (k_prime, r_prime) = G(&[&m_prime, &self.ek.h]);

        // The implicit-rejection key is always derived, so that the work done
        // does not depend on whether the ciphertext verifies.
        let k_bar = J(&[self.z.as_slice(), ciphertext.as_slice()]);
        let c_prime = self.ek.ek_pke.encrypt(&m_prime, &r_prime);

        // A single byte-fold comparison across the whole ciphertext, then a
        // mask-based selection between the two candidate keys.
        let selector = ciphertext.as_slice().ct_eq(c_prime.as_slice());
        let mut shared_key = k_bar;
        for (out, k) in shared_key.iter_mut().zip(k_prime.iter()) {
            out.conditional_assign(k, selector);
        }
        shared_key
    }
}

impl<P> From<Seed> for DecapsulationKey<P>
where
    P: KemParams,
{
    fn from(seed: Seed) -> Self {
        Self::from_seed(seed)
    }
}

impl<P> EncodedSizeUser for DecapsulationKey<P>
where
    P: KemParams,
{
    type EncodedSize = DecapsulationKeySize<P>;

    #[allow(clippy::similar_names)] // allow dk_pke, ek_pke, following FIPS 203
    fn from_bytes(enc: &Encoded<Self>) -> Result<Self, Error> {
        let (dk_pke, ek_pke, h, z) = P::split_dk(enc);
        let ek_pke = EncryptionKey::from_bytes(&ek_pke)?;
        let ek = EncapsulationKey::new(ek_pke);

        // Hash check: the embedded H(ek) must match the recomputed value.
        if ek.h != h {
            return Err(Error::InvalidKey);
        }

        Ok(Self {
            dk_pke: DecryptionKey::from_bytes(&dk_pke),
            ek,
            d: None,
            z,
        })
    }

    fn as_bytes(&self) -> Encoded<Self> {
        let dk_pke = self.dk_pke.as_bytes();
        let ek = self.ek.as_bytes();
        P::concat_dk(dk_pke, ek, self.ek.h.clone(), self.z.clone())
    }
}

impl<P> TryFrom<&[u8]> for DecapsulationKey<P>
where
    P: KemParams,
{
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Error> {
        let enc = Encoded::<Self>::try_from(data).map_err(|_| Error::InvalidKeyLength)?;
        Self::from_bytes(&enc)
    }
}

impl<P> Decapsulate<EncodedCiphertext<P>, SharedKey> for DecapsulationKey<P>
where
    P: KemParams,
{
    type Error = Infallible;

    fn decapsulate(&self, encapsulated_key: &EncodedCiphertext<P>) -> Result<SharedKey, Infallible> {
        Ok(self.decapsulate_inner(encapsulated_key))
    }
}

/// An `EncapsulationKey` provides the ability to encapsulate a shared key so
/// that it can only be decapsulated by the holder of the corresponding
/// decapsulation key.
#[derive(Clone, Debug, PartialEq)]
pub struct EncapsulationKey<P>
where
    P: KemParams,
{
    ek_pke: EncryptionKey<P>,
    h: B32,
}

impl<P> EncapsulationKey<P>
where
    P: KemParams,
{
    pub(crate) fn new(ek_pke: EncryptionKey<P>) -> Self {
        // The key hash is fixed per key, so it is computed once up front.
        let h = H(ek_pke.as_bytes());
        Self { ek_pke, h }
    }

    /// Algorithm 17: `ML-KEM.Encaps_internal(ek, m)`
    fn encapsulate_inner(&self, m: &B32) -> (EncodedCiphertext<P>, SharedKey) {
        // The shared key is bound to the encapsulation key by hashing in H(ek).
        let (shared_key, r) = G(&[m, &self.h]);
        let ciphertext = self.ek_pke.encrypt(m, &r);
        (ciphertext, shared_key)
    }
}

impl<P> EncodedSizeUser for EncapsulationKey<P>
where
    P: KemParams,
{
    type EncodedSize = EncapsulationKeySize<P>;

    fn from_bytes(enc: &Encoded<Self>) -> Result<Self, Error> {
        Ok(Self::new(EncryptionKey::from_bytes(enc)?))
    }

    fn as_bytes(&self) -> Encoded<Self> {
        self.ek_pke.as_bytes()
    }
}

impl<P> TryFrom<&[u8]> for EncapsulationKey<P>
where
    P: KemParams,
{
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Error> {
        let enc = Encoded::<Self>::try_from(data).map_err(|_| Error::InvalidKeyLength)?;
        Self::from_bytes(&enc)
    }
}

impl<P> Encapsulate<EncodedCiphertext<P>, SharedKey> for EncapsulationKey<P>
where
    P: KemParams,
{
    type Error = Infallible;

    fn encapsulate(
        &self,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(EncodedCiphertext<P>, SharedKey), Infallible> {
        let m: B32 = rand(rng);
        Ok(self.encapsulate_inner(&m))
    }
}

#[cfg(feature = "deterministic")]
impl<P> crate::EncapsulateDeterministic<EncodedCiphertext<P>, SharedKey> for EncapsulationKey<P>
where
    P: KemParams,
{
    type Error = Infallible;

    fn encapsulate_deterministic(
        &self,
        m: &B32,
    ) -> Result<(EncodedCiphertext<P>, SharedKey), Infallible> {
        Ok(self.encapsulate_inner(m))
    }
}

/// An implementation of overall ML-KEM functionality.  Generic over parameter
/// sets, but then ties together all of the other related types and sizes.
#[derive(Clone)]
pub struct Kem<P>
where
    P: KemParams,
{
    _phantom: PhantomData<P>,
}

impl<P> crate::KemCore for Kem<P>
where
    P: KemParams,
{
    type SharedKeySize = U32;
    type CiphertextSize = P::CiphertextSize;
    type DecapsulationKey = DecapsulationKey<P>;
    type EncapsulationKey = EncapsulationKey<P>;

    fn generate(rng: &mut impl CryptoRngCore) -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        let dk = DecapsulationKey::generate(rng);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }

    fn from_seed(seed: Seed) -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        let dk = DecapsulationKey::from_seed(seed);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }

    #[cfg(feature = "deterministic")]
    fn generate_deterministic(
        d: &B32,
        z: &B32,
    ) -> (Self::DecapsulationKey, Self::EncapsulationKey) {
        let dk = DecapsulationKey::generate_deterministic(d.clone(), z.clone());
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
    }
}
