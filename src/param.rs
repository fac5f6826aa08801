//! Compile-time logic for parameter-set-dependent object sizes.
//!
//! [`ParameterSet`] captures the parameters in the form given by FIPS 203.
//! [`EncodingSize`], [`VectorEncodingSize`], and [`CbdSamplingSize`] are
//! "upstream" of `ParameterSet`: they provide basic facts about the sizes of
//! encoded objects.  [`PkeParams`] and [`KemParams`] are "downstream": they
//! derive the sizes relevant to K-PKE and ML-KEM.  To keep complicated trait
//! bounds from leaking into the rest of the crate, any operation that needs to
//! know how sizes decompose (flattening encoded vectors, splitting a
//! serialized key into its fields) also lives behind these traits.

use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Rem, Sub};
use hybrid_array::{
    Array,
    typenum::{Gcd, Gcf, Prod, Quot, Sum, U0, U2, U3, U4, U6, U8, U12, U16, U32, U64, U384},
};

use crate::algebra::{FieldElement, NttVector};
use crate::encode::Encode;
use crate::util::{B32, Flatten, Unflatten};

/// An array length with the auxiliary properties the rest of the crate needs.
pub trait ArraySize: hybrid_array::ArraySize + PartialEq + Debug {}

impl<T> ArraySize for T where T: hybrid_array::ArraySize + PartialEq + Debug {}

/// A bit width `d` usable for encoding polynomial coefficients.
pub trait EncodingSize: ArraySize {
    /// The size of an encoded polynomial at this width, `32 * d` bytes.
    type EncodedPolynomialSize: ArraySize;
    /// The number of coefficients per encoding unit.
    type ValueStep: ArraySize;
    /// The number of bytes per encoding unit.
    type ByteStep: ArraySize;
}

type EncodingUnit<D> = Quot<Prod<D, U8>, Gcf<D, U8>>;

/// The size of a polynomial encoded at width `D`.
pub type EncodedPolynomialSize<D> = <D as EncodingSize>::EncodedPolynomialSize;

/// A polynomial encoded at width `D`.
pub type EncodedPolynomial<D> = Array<u8, EncodedPolynomialSize<D>>;

impl<D> EncodingSize for D
where
    D: ArraySize + Mul<U8> + Gcd<U8> + Mul<U32>,
    Prod<D, U32>: ArraySize,
    Prod<D, U8>: Div<Gcf<D, U8>>,
    EncodingUnit<D>: Div<D> + Div<U8>,
    Quot<EncodingUnit<D>, D>: ArraySize,
    Quot<EncodingUnit<D>, U8>: ArraySize,
{
    type EncodedPolynomialSize = Prod<D, U32>;
    type ValueStep = Quot<EncodingUnit<D>, D>;
    type ByteStep = Quot<EncodingUnit<D>, U8>;
}

/// A bit width that can also describe encoded vectors of `K` polynomials.
pub trait VectorEncodingSize<K>: EncodingSize
where
    K: ArraySize,
{
    /// The size of an encoded vector at this width, `K * 32 * d` bytes.
    type EncodedPolynomialVectorSize: ArraySize;

    /// Concatenate `K` encoded polynomials into one encoded vector.
    fn flatten(polys: Array<EncodedPolynomial<Self>, K>) -> EncodedPolynomialVector<Self, K>;

    /// View an encoded vector as `K` encoded polynomials.
    fn unflatten(vec: &EncodedPolynomialVector<Self, K>) -> Array<&EncodedPolynomial<Self>, K>;
}

/// The size of a vector of `K` polynomials encoded at width `D`.
pub type EncodedPolynomialVectorSize<D, K> =
    <D as VectorEncodingSize<K>>::EncodedPolynomialVectorSize;

/// A vector of `K` polynomials encoded at width `D`.
pub type EncodedPolynomialVector<D, K> = Array<u8, EncodedPolynomialVectorSize<D, K>>;

impl<D, K> VectorEncodingSize<K> for D
where
    D: EncodingSize,
    K: ArraySize,
    D::EncodedPolynomialSize: Mul<K>,
    Prod<D::EncodedPolynomialSize, K>:
        ArraySize + Div<K, Output = D::EncodedPolynomialSize> + Rem<K, Output = U0>,
{
    type EncodedPolynomialVectorSize = Prod<D::EncodedPolynomialSize, K>;

    fn flatten(polys: Array<EncodedPolynomial<Self>, K>) -> EncodedPolynomialVector<Self, K> {
        polys.flatten()
    }

    fn unflatten(vec: &EncodedPolynomialVector<Self, K>) -> Array<&EncodedPolynomial<Self>, K> {
        vec.unflatten()
    }
}

/// A CBD parameter `eta`, together with the lookup table taking a `2 * eta`-bit
/// sample to its centered-binomial value embedded in the field.
pub trait CbdSamplingSize: ArraySize {
    /// The width at which a PRF block is decoded for CBD sampling.
    type SampleSize: EncodingSize;
    /// The size of the lookup table, `2^(2 * eta)`.
    type OnesSize: ArraySize;
    /// `ONES[v] = (popcount of the low eta bits of v) - (popcount of the high
    /// eta bits of v)`, embedded in `[0, q)`.
    const ONES: Array<FieldElement, Self::OnesSize>;
}

#[allow(clippy::cast_possible_truncation)]
const fn cbd_ones<const N: usize>(eta: u32) -> [FieldElement; N] {
    let mask = (1u32 << eta) - 1;
    let mut table = [FieldElement(0); N];
    let mut v = 0;
    while v < N {
        let x = (v as u32 & mask).count_ones() as u16;
        let y = ((v as u32 >> eta) & mask).count_ones() as u16;
        table[v] = FieldElement((FieldElement::Q + x - y) % FieldElement::Q);
        v += 1;
    }
    table
}

impl CbdSamplingSize for U2 {
    type SampleSize = U4;
    type OnesSize = U16;
    const ONES: Array<FieldElement, U16> = Array(cbd_ones::<16>(2));
}

impl CbdSamplingSize for U3 {
    type SampleSize = U6;
    type OnesSize = U64;
    const ONES: Array<FieldElement, U64> = Array(cbd_ones::<64>(3));
}

/// A `ParameterSet` captures the parameters describing one instance of ML-KEM.
/// There are three, corresponding to the three security levels.
pub trait ParameterSet: Default + Clone + Debug + PartialEq {
    /// The dimension of vectors and matrices over the ring.
    type K: ArraySize;

    /// The CBD parameter for sampling secrets and errors in key generation,
    /// and the `y` vector in encryption.
    type Eta1: CbdSamplingSize;

    /// The CBD parameter for sampling the error terms in encryption.
    type Eta2: CbdSamplingSize;

    /// The compression width for the `u` vector of a ciphertext.
    type Du: VectorEncodingSize<Self::K>;

    /// The compression width for the `v` polynomial of a ciphertext.
    type Dv: EncodingSize;
}

type EncodedUSize<P> = EncodedPolynomialVectorSize<<P as ParameterSet>::Du, <P as ParameterSet>::K>;
type EncodedVSize<P> = EncodedPolynomialSize<<P as ParameterSet>::Dv>;

type EncodedU<P> = Array<u8, EncodedUSize<P>>;
type EncodedV<P> = Array<u8, EncodedVSize<P>>;

/// Sizes and byte-layout operations derived from a parameter set, relevant to
/// the K-PKE component scheme.
pub trait PkeParams: ParameterSet {
    /// The size of an NTT-domain vector encoded at full width, `384 * K`.
    type NttVectorSize: ArraySize;
    /// The size of an encryption key, `384 * K + 32`.
    type EncryptionKeySize: ArraySize;
    /// The size of a ciphertext, `32 * (du * K + dv)`.
    type CiphertextSize: ArraySize;

    /// Encode an NTT-domain vector at the full 12-bit width.
    fn encode_u12(p: &NttVector<Self::K>) -> EncodedNttVector<Self>;

    /// Decode an NTT-domain vector from the full 12-bit width.
    fn decode_u12(v: &EncodedNttVector<Self>) -> NttVector<Self::K>;

    /// Assemble a ciphertext `c1 || c2`.
    fn concat_ct(u: EncodedU<Self>, v: EncodedV<Self>) -> EncodedCiphertext<Self>;

    /// Split a ciphertext into `(c1, c2)`.
    fn split_ct(ct: &EncodedCiphertext<Self>) -> (EncodedU<Self>, EncodedV<Self>);

    /// Assemble an encryption key `t_hat || rho`.
    fn concat_ek(t_hat: EncodedNttVector<Self>, rho: B32) -> EncodedEncryptionKey<Self>;

    /// Split an encryption key into `(t_hat, rho)`.
    fn split_ek(ek: &EncodedEncryptionKey<Self>) -> (EncodedNttVector<Self>, B32);
}

/// An NTT-domain vector encoded at the full 12-bit width.
pub type EncodedNttVector<P> = Array<u8, <P as PkeParams>::NttVectorSize>;

/// A serialized K-PKE decryption key.
pub type EncodedDecryptionKey<P> = Array<u8, <P as PkeParams>::NttVectorSize>;

/// A serialized K-PKE encryption key.
pub type EncodedEncryptionKey<P> = Array<u8, <P as PkeParams>::EncryptionKeySize>;

/// A serialized ciphertext.
pub type EncodedCiphertext<P> = Array<u8, <P as PkeParams>::CiphertextSize>;

impl<P> PkeParams for P
where
    P: ParameterSet,
    U384: Mul<P::K>,
    Prod<U384, P::K>: ArraySize + Add<U32> + Div<P::K, Output = U384> + Rem<P::K, Output = U0>,
    EncodedUSize<P>: Add<EncodedVSize<P>>,
    Sum<EncodedUSize<P>, EncodedVSize<P>>:
        ArraySize + Sub<EncodedUSize<P>, Output = EncodedVSize<P>>,
    EncodedPolynomialVectorSize<U12, P::K>: Add<U32>,
    Sum<EncodedPolynomialVectorSize<U12, P::K>, U32>:
        ArraySize + Sub<EncodedPolynomialVectorSize<U12, P::K>, Output = U32>,
{
    type NttVectorSize = EncodedPolynomialVectorSize<U12, P::K>;
    type EncryptionKeySize = Sum<Self::NttVectorSize, U32>;
    type CiphertextSize = Sum<EncodedUSize<P>, EncodedVSize<P>>;

    fn encode_u12(p: &NttVector<Self::K>) -> EncodedNttVector<Self> {
        Encode::<U12>::encode(p)
    }

    fn decode_u12(v: &EncodedNttVector<Self>) -> NttVector<Self::K> {
        Encode::<U12>::decode(v)
    }

    fn concat_ct(u: EncodedU<Self>, v: EncodedV<Self>) -> EncodedCiphertext<Self> {
        u.concat(v)
    }

    fn split_ct(ct: &EncodedCiphertext<Self>) -> (EncodedU<Self>, EncodedV<Self>) {
        ct.clone().split()
    }

    fn concat_ek(t_hat: EncodedNttVector<Self>, rho: B32) -> EncodedEncryptionKey<Self> {
        t_hat.concat(rho)
    }

    fn split_ek(ek: &EncodedEncryptionKey<Self>) -> (EncodedNttVector<Self>, B32) {
        ek.clone().split()
    }
}

/// Sizes and byte-layout operations derived from a parameter set, relevant to
/// the ML-KEM wrapper.
pub trait KemParams: PkeParams {
    /// The size of a serialized decapsulation key, `768 * K + 96`.
    type DecapsulationKeySize: ArraySize;

    /// Assemble a decapsulation key `dk_pke || ek || H(ek) || z`.
    fn concat_dk(
        dk: EncodedDecryptionKey<Self>,
        ek: EncodedEncryptionKey<Self>,
        h: B32,
        z: B32,
    ) -> EncodedDecapsulationKey<Self>;

    /// Split a decapsulation key into `(dk_pke, ek, H(ek), z)`.
    fn split_dk(
        enc: &EncodedDecapsulationKey<Self>,
    ) -> (
        EncodedDecryptionKey<Self>,
        EncodedEncryptionKey<Self>,
        B32,
        B32,
    );
}

/// The size of a serialized decapsulation key.
pub type DecapsulationKeySize<P> = <P as KemParams>::DecapsulationKeySize;

/// The size of a serialized encapsulation key.
pub type EncapsulationKeySize<P> = <P as PkeParams>::EncryptionKeySize;

/// A serialized decapsulation key.
pub type EncodedDecapsulationKey<P> = Array<u8, <P as KemParams>::DecapsulationKeySize>;

impl<P> KemParams for P
where
    P: PkeParams,
    P::NttVectorSize: Add<P::EncryptionKeySize>,
    Sum<P::NttVectorSize, P::EncryptionKeySize>:
        ArraySize + Add<U32> + Sub<P::NttVectorSize, Output = P::EncryptionKeySize>,
    Sum<Sum<P::NttVectorSize, P::EncryptionKeySize>, U32>: ArraySize
        + Add<U32>
        + Sub<Sum<P::NttVectorSize, P::EncryptionKeySize>, Output = U32>,
    Sum<Sum<Sum<P::NttVectorSize, P::EncryptionKeySize>, U32>, U32>:
        ArraySize + Sub<Sum<Sum<P::NttVectorSize, P::EncryptionKeySize>, U32>, Output = U32>,
{
    type DecapsulationKeySize = Sum<Sum<Sum<P::NttVectorSize, P::EncryptionKeySize>, U32>, U32>;

    fn concat_dk(
        dk: EncodedDecryptionKey<Self>,
        ek: EncodedEncryptionKey<Self>,
        h: B32,
        z: B32,
    ) -> EncodedDecapsulationKey<Self> {
        dk.concat(ek).concat(h).concat(z)
    }

    fn split_dk(
        enc: &EncodedDecapsulationKey<Self>,
    ) -> (
        EncodedDecryptionKey<Self>,
        EncodedEncryptionKey<Self>,
        B32,
        B32,
    ) {
        // Parse from the right, mirroring the concatenation order above.
        let (rest, z): (
            Array<u8, Sum<Sum<P::NttVectorSize, P::EncryptionKeySize>, U32>>,
            B32,
        ) = enc.clone().split();
        let (rest, h): (Array<u8, Sum<P::NttVectorSize, P::EncryptionKeySize>>, B32) =
            rest.split();
        let (dk_pke, ek_pke) = rest.split();
        (dk_pke, ek_pke, h, z)
    }
}
