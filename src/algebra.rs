use core::ops::{Add, Mul, Neg, Sub};
use hybrid_array::{Array, typenum::U256};
use sha3::digest::XofReader;

use crate::crypto::{PRF, PrfOutput, XOF};
use crate::encode::Encode;
use crate::param::{ArraySize, CbdSamplingSize};
use crate::util::{B32, Truncate};

#[cfg(feature = "zeroize")]
use zeroize::{DefaultIsZeroes, Zeroize};

/// The raw integer type underlying a field element.
pub type Integer = u16;

/// An element of GF(q).  Values are always canonical, i.e. in `[0, q)`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FieldElement(pub Integer);

#[cfg(feature = "zeroize")]
impl DefaultIsZeroes for FieldElement {}

impl FieldElement {
    /// The prime modulus, `q = 3329`.
    pub const Q: Integer = 3329;

    /// The modulus as a `u32`, for intermediate products.
    pub const Q32: u32 = Self::Q as u32;

    /// The modulus as a `u64`, for compile-time table generation.
    pub const Q64: u64 = Self::Q as u64;

    const BARRETT_SHIFT: usize = 24;
    const BARRETT_MULTIPLIER: u64 = (1 << Self::BARRETT_SHIFT) / Self::Q64;

    /// Reduce a value in `[0, 2q)` to its canonical representative, without
    /// branching on the value.
    const fn reduce_once(x: Integer) -> Integer {
        let t = x.wrapping_sub(Self::Q);
        // The top bit of `t` is set iff the subtraction borrowed, i.e. x < q.
        t.wrapping_add((t >> 15).wrapping_mul(Self::Q))
    }

    /// Barrett reduction of a value up to `2 * (q - 1)^2`, covering a product
    /// of canonical values as well as the sum of two such products.
    #[allow(clippy::cast_possible_truncation)]
    const fn barrett_reduce(x: u32) -> Integer {
        let quotient = ((x as u64 * Self::BARRETT_MULTIPLIER) >> Self::BARRETT_SHIFT) as u32;
        // The estimated quotient is off by at most one, so the remainder here
        // is in [0, 2q).
        Self::reduce_once((x - quotient * Self::Q32) as Integer)
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        FieldElement(Self::reduce_once(self.0 + rhs.0))
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: FieldElement) -> FieldElement {
        FieldElement(Self::reduce_once(self.0 + Self::Q - rhs.0))
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        FieldElement(Self::barrett_reduce(u32::from(self.0) * u32::from(rhs.0)))
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement(Self::reduce_once(Self::Q - self.0))
    }
}

/// An element of the ring `R_q`: a polynomial over GF(q) of degree at most
/// 255, held in the coefficient domain.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Polynomial(pub Array<FieldElement, U256>);

#[cfg(feature = "zeroize")]
impl Zeroize for Polynomial {
    fn zeroize(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(Array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(Array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl Mul<&Polynomial> for FieldElement {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(Array::from_fn(|i| self * rhs.0[i]))
    }
}

impl Polynomial {
    /// Algorithm 8: `SamplePolyCBD_eta(B)`
    ///
    /// Instead of the bitwise manipulation in the algorithm as written, the
    /// PRF block is decoded into `2 * eta`-bit integers, and each is mapped
    /// through a precomputed table of popcount differences.
    pub(crate) fn sample_cbd<Eta>(b: &PrfOutput<Eta>) -> Self
    where
        Eta: CbdSamplingSize,
    {
        let vals: Polynomial = Encode::<Eta::SampleSize>::decode(b);
        Self(Array::from_fn(|i| Eta::ONES[usize::from(vals.0[i].0)]))
    }

    /// Algorithm 9: `NTT(f)`
    ///
    /// The in-place Cooley-Tukey ladder, seven layers of butterflies over a
    /// stack-resident array.
    pub fn ntt(&self) -> NttPolynomial {
        let mut f = self.0;

        let mut i = 1;
        for len in [128, 64, 32, 16, 8, 4, 2] {
            for start in (0..256).step_by(2 * len) {
                let zeta = ZETA_POW_BITREV[i];
                i += 1;

                for j in start..(start + len) {
                    let t = zeta * f[j + len];
                    f[j + len] = f[j] - t;
                    f[j] = f[j] + t;
                }
            }
        }

        NttPolynomial(f)
    }
}

/// An element of `T_q`, the image of `R_q` under the NTT: 128 degree-one
/// residues, stored as interleaved coefficient pairs.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct NttPolynomial(pub Array<FieldElement, U256>);

#[cfg(feature = "zeroize")]
impl Zeroize for NttPolynomial {
    fn zeroize(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl Add<&NttPolynomial> for &NttPolynomial {
    type Output = NttPolynomial;

    fn add(self, rhs: &NttPolynomial) -> NttPolynomial {
        NttPolynomial(Array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl NttPolynomial {
    /// Algorithm 10: `NTT^{-1}(f_hat)`
    ///
    /// The Gentleman-Sande ladder run in the reverse schedule, followed by
    /// scaling with `3303 = 128^{-1} mod q`.
    pub fn ntt_inverse(&self) -> Polynomial {
        let mut f = self.0;

        let mut i = 127;
        for len in [2, 4, 8, 16, 32, 64, 128] {
            for start in (0..256).step_by(2 * len) {
                let zeta = ZETA_POW_BITREV[i];
                i -= 1;

                for j in start..(start + len) {
                    let t = f[j];
                    f[j] = t + f[j + len];
                    f[j + len] = zeta * (f[j + len] - t);
                }
            }
        }

        FieldElement(3303) * &Polynomial(f)
    }
}

/// Algorithm 11: `MultiplyNTTs(f_hat, g_hat)`
impl Mul<&NttPolynomial> for &NttPolynomial {
    type Output = NttPolynomial;

    fn mul(self, rhs: &NttPolynomial) -> NttPolynomial {
        let mut out = NttPolynomial::default();

        for i in 0..128 {
            let (c0, c1) = base_case_multiply(
                self.0[2 * i],
                self.0[2 * i + 1],
                rhs.0[2 * i],
                rhs.0[2 * i + 1],
                i,
            );

            out.0[2 * i] = c0;
            out.0[2 * i + 1] = c1;
        }

        out
    }
}

/// Algorithm 12: `BaseCaseMultiply(a0, a1, b0, b1, gamma)`
///
/// This is the hot loop.  Products are accumulated in `u32` so that each
/// output coefficient costs the minimum number of reductions.
#[inline]
fn base_case_multiply(
    a0: FieldElement,
    a1: FieldElement,
    b0: FieldElement,
    b1: FieldElement,
    i: usize,
) -> (FieldElement, FieldElement) {
    let a0 = u32::from(a0.0);
    let a1 = u32::from(a1.0);
    let b0 = u32::from(b0.0);
    let b1 = u32::from(b1.0);
    let gamma = u32::from(GAMMA[i].0);

    let b1g = u32::from(FieldElement::barrett_reduce(b1 * gamma));

    let c0 = FieldElement::barrett_reduce(a0 * b0 + a1 * b1g);
    let c1 = FieldElement::barrett_reduce(a0 * b1 + a1 * b0);
    (FieldElement(c0), FieldElement(c1))
}

/// `zeta = 17` generates the group of 256th roots of unity in GF(q).
const ZETA: u64 = 17;

const fn bitrev7(x: usize) -> usize {
    ((x & 0b000_0001) << 6)
        | ((x & 0b000_0010) << 4)
        | ((x & 0b000_0100) << 2)
        | (x & 0b000_1000)
        | ((x & 0b001_0000) >> 2)
        | ((x & 0b010_0000) >> 4)
        | ((x & 0b100_0000) >> 6)
}

/// `ZETA_POW_BITREV[i] = zeta^{BitRev_7(i)}`
///
/// Since the powers of zeta used by the NTT are fixed, they are computed once
/// at compile time.  Operator overloading and `for` loops are unavailable in
/// `const` context, hence the manual reductions and `while` loops.  The
/// resulting values match the first table in Appendix A of FIPS 203.
#[allow(clippy::cast_possible_truncation)]
const ZETA_POW_BITREV: [FieldElement; 128] = {
    let mut pow = [0u16; 128];
    let mut i = 0;
    let mut curr = 1u64;
    while i < 128 {
        pow[i] = curr as u16;
        i += 1;
        curr = (curr * ZETA) % FieldElement::Q64;
    }

    let mut table = [FieldElement(0); 128];
    let mut i = 0;
    while i < 128 {
        table[i] = FieldElement(pow[bitrev7(i)]);
        i += 1;
    }
    table
};

/// `GAMMA[i] = zeta^{2 * BitRev_7(i) + 1}`, the twist of the `i`-th degree-one
/// residue ring.  Matches the second table in Appendix A of FIPS 203.
#[allow(clippy::cast_possible_truncation)]
const GAMMA: [FieldElement; 128] = {
    let mut table = [FieldElement(0); 128];
    let mut i = 0;
    while i < 128 {
        let z = ZETA_POW_BITREV[i].0 as u64;
        table[i] = FieldElement(((z * z * ZETA) % FieldElement::Q64) as u16);
        i += 1;
    }
    table
};

/// Algorithm 7: `SampleNTT(B)`
///
/// Uniform rejection sampling from an XOF stream.  Each 3-byte block yields
/// two 12-bit candidates; candidates at or above q are discarded.  The number
/// of squeezed blocks is input-dependent, but the output is always a full
/// polynomial, already in the NTT domain.
pub(crate) fn sample_ntt(xof: &mut impl XofReader) -> NttPolynomial {
    struct CandidateReader<'a> {
        xof: &'a mut dyn XofReader,
        data: [u8; 96],
        start: usize,
        saved: Option<Integer>,
    }

    impl<'a> CandidateReader<'a> {
        fn new(xof: &'a mut impl XofReader) -> Self {
            let mut out = Self {
                xof,
                data: [0u8; 96],
                start: 0,
                saved: None,
            };
            out.xof.read(&mut out.data);
            out
        }

        fn next(&mut self) -> FieldElement {
            if let Some(val) = self.saved.take() {
                return FieldElement(val);
            }

            loop {
                if self.start == self.data.len() {
                    self.xof.read(&mut self.data);
                    self.start = 0;
                }

                let b = &self.data[self.start..self.start + 3];
                self.start += 3;

                let d1 = Integer::from(b[0]) + ((Integer::from(b[1]) & 0xf) << 8);
                let d2 = (Integer::from(b[1]) >> 4) + (Integer::from(b[2]) << 4);

                if d1 < FieldElement::Q {
                    if d2 < FieldElement::Q {
                        self.saved = Some(d2);
                    }
                    return FieldElement(d1);
                }

                if d2 < FieldElement::Q {
                    return FieldElement(d2);
                }
            }
        }
    }

    let mut reader = CandidateReader::new(xof);
    NttPolynomial(Array::from_fn(|_| reader.next()))
}

/// A length-`K` vector of ring elements in the coefficient domain.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct PolynomialVector<K: ArraySize>(pub Array<Polynomial, K>);

#[cfg(feature = "zeroize")]
impl<K: ArraySize> Zeroize for PolynomialVector<K> {
    fn zeroize(&mut self) {
        for poly in &mut self.0 {
            poly.zeroize();
        }
    }
}

impl<K: ArraySize> Add for PolynomialVector<K> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(Array::from_fn(|i| &self.0[i] + &rhs.0[i]))
    }
}

impl<K: ArraySize> PolynomialVector<K> {
    /// Sample all `K` polynomials from the centered binomial distribution,
    /// stepping the PRF nonce from `start_n`.
    pub(crate) fn sample_cbd<Eta>(sigma: &B32, start_n: u8) -> Self
    where
        Eta: CbdSamplingSize,
    {
        Self(Array::from_fn(|i| {
            let prf_output = PRF::<Eta>(sigma, start_n + i.truncate());
            Polynomial::sample_cbd::<Eta>(&prf_output)
        }))
    }

    /// Apply the NTT to every entry.
    pub fn ntt(&self) -> NttVector<K> {
        NttVector(self.0.iter().map(Polynomial::ntt).collect())
    }
}

/// A length-`K` vector of NTT-domain elements.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct NttVector<K: ArraySize>(pub Array<NttPolynomial, K>);

#[cfg(feature = "zeroize")]
impl<K: ArraySize> Zeroize for NttVector<K> {
    fn zeroize(&mut self) {
        for poly in &mut self.0 {
            poly.zeroize();
        }
    }
}

impl<K: ArraySize> Add<&NttVector<K>> for &NttVector<K> {
    type Output = NttVector<K>;

    fn add(self, rhs: &NttVector<K>) -> NttVector<K> {
        NttVector(Array::from_fn(|i| &self.0[i] + &rhs.0[i]))
    }
}

/// The dot product of two NTT-domain vectors.
impl<K: ArraySize> Mul<&NttVector<K>> for &NttVector<K> {
    type Output = NttPolynomial;

    fn mul(self, rhs: &NttVector<K>) -> NttPolynomial {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .map(|(a, b)| a * b)
            .fold(NttPolynomial::default(), |acc, x| &acc + &x)
    }
}

impl<K: ArraySize> NttVector<K> {
    /// Apply the inverse NTT to every entry.
    pub fn ntt_inverse(&self) -> PolynomialVector<K> {
        PolynomialVector(self.0.iter().map(NttPolynomial::ntt_inverse).collect())
    }
}

/// A `K x K` matrix of NTT-domain elements.  Each inner vector is a row, so
/// multiplying by a column vector on the right is just `K` dot products.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct NttMatrix<K: ArraySize>(Array<NttVector<K>, K>);

impl<K: ArraySize> Mul<&NttVector<K>> for &NttMatrix<K> {
    type Output = NttVector<K>;

    fn mul(self, rhs: &NttVector<K>) -> NttVector<K> {
        NttVector(self.0.iter().map(|row| row * rhs).collect())
    }
}

impl<K: ArraySize> NttMatrix<K> {
    /// Expand the seed `rho` into the uniform matrix `A_hat`, entry `(i, j)`
    /// drawn from `XOF(rho || j || i)`.  With `transpose` set, the transposed
    /// matrix is produced directly by swapping the sampling indices.
    pub(crate) fn sample_uniform(rho: &B32, transpose: bool) -> Self {
        Self(Array::from_fn(|i| {
            NttVector(Array::from_fn(|j| {
                let (i, j) = if transpose { (j, i) } else { (i, j) };
                let mut xof = XOF(rho, j.truncate(), i.truncate());
                sample_ntt(&mut xof)
            }))
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hybrid_array::typenum::{U2, U3};
    use rand::Rng;

    fn random_poly(rng: &mut impl Rng) -> Polynomial {
        Polynomial(Array::from_fn(|_| {
            FieldElement(rng.gen::<Integer>() % FieldElement::Q)
        }))
    }

    fn random_ntt_poly(rng: &mut impl Rng) -> NttPolynomial {
        NttPolynomial(Array::from_fn(|_| {
            FieldElement(rng.gen::<Integer>() % FieldElement::Q)
        }))
    }

    /// Multiplication in `R_q` the slow way: a 512-term convolution folded
    /// with `X^256 = -1`.
    fn poly_mul(lhs: &Polynomial, rhs: &Polynomial) -> Polynomial {
        let mut out = Polynomial::default();
        for (i, x) in lhs.0.iter().enumerate() {
            for (j, y) in rhs.0.iter().enumerate() {
                let (sign, index) = if i + j < 256 {
                    (FieldElement(1), i + j)
                } else {
                    (FieldElement(FieldElement::Q - 1), i + j - 256)
                };

                out.0[index] = out.0[index] + (sign * *x * *y);
            }
        }
        out
    }

    // A polynomial with only a scalar component, to make simple test cases
    fn const_ntt(x: Integer) -> NttPolynomial {
        let mut p = Polynomial::default();
        p.0[0] = FieldElement(x);
        p.ntt()
    }

    #[test]
    fn field_ops() {
        for (a, b) in [(0, 0), (1, 3328), (3328, 3328), (1664, 1665), (17, 2500)] {
            let x = FieldElement(a);
            let y = FieldElement(b);
            let a32 = u32::from(a);
            let b32 = u32::from(b);

            assert_eq!(u32::from((x + y).0), (a32 + b32) % FieldElement::Q32);
            assert_eq!(
                u32::from((x - y).0),
                (FieldElement::Q32 + a32 - b32) % FieldElement::Q32
            );
            assert_eq!(u32::from((x * y).0), (a32 * b32) % FieldElement::Q32);
            assert_eq!(
                u32::from((-x).0),
                (FieldElement::Q32 - a32) % FieldElement::Q32
            );
        }
    }

    #[test]
    fn zeta_tables() {
        // Spot-check against Appendix A of FIPS 203.
        assert_eq!(ZETA_POW_BITREV[0].0, 1);
        assert_eq!(ZETA_POW_BITREV[1].0, 1729);
        assert_eq!(ZETA_POW_BITREV[2].0, 2580);
        assert_eq!(ZETA_POW_BITREV[127].0, 2154);
        assert_eq!(GAMMA[0].0, 17);
        assert_eq!(GAMMA[1].0, FieldElement::Q - 17);
        assert_eq!(GAMMA[127].0, FieldElement::Q - 2154);
    }

    #[test]
    fn polynomial_ops() {
        let f = Polynomial(Array::from_fn(|i| FieldElement(i as Integer)));
        let g = Polynomial(Array::from_fn(|i| FieldElement(2 * i as Integer)));
        let sum = Polynomial(Array::from_fn(|i| FieldElement(3 * i as Integer)));
        assert_eq!(&f + &g, sum);
        assert_eq!(&sum - &g, f);
        assert_eq!(FieldElement(3) * &f, sum);
    }

    #[test]
    fn ntt_round_trip() {
        // The zero polynomial maps to zero and back.
        let zero = Polynomial::default();
        assert_eq!(zero.ntt(), NttPolynomial::default());
        assert_eq!(NttPolynomial::default().ntt_inverse(), zero);

        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let f = random_poly(&mut rng);
            assert_eq!(f.ntt().ntt_inverse(), f);
        }
    }

    #[test]
    fn ntt_multiplication() {
        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let f = random_poly(&mut rng);
            let g = random_poly(&mut rng);

            // NTT is a homomorphism with respect to addition...
            let fg = &f + &g;
            assert_eq!((&f.ntt() + &g.ntt()).ntt_inverse(), fg);

            // ... and multiplication.
            let fg = poly_mul(&f, &g);
            assert_eq!((&f.ntt() * &g.ntt()).ntt_inverse(), fg);
        }
    }

    #[test]
    fn ntt_ring_laws() {
        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let a = random_ntt_poly(&mut rng);
            let b = random_ntt_poly(&mut rng);
            let c = random_ntt_poly(&mut rng);

            // Associativity
            assert_eq!(&(&a * &b) * &c, &a * &(&b * &c));

            // Distributivity on both sides
            assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
            assert_eq!(&(&b + &c) * &a, &(&b * &a) + &(&c * &a));
        }
    }

    #[test]
    fn ntt_vector_ops() {
        let v1: NttVector<U3> = NttVector(Array([const_ntt(1), const_ntt(1), const_ntt(1)]));
        let v2: NttVector<U3> = NttVector(Array([const_ntt(2), const_ntt(2), const_ntt(2)]));
        let v3: NttVector<U3> = NttVector(Array([const_ntt(3), const_ntt(3), const_ntt(3)]));
        assert_eq!(&v1 + &v2, v3);

        assert_eq!(&v1 * &v2, const_ntt(6));
        assert_eq!(&v1 * &v3, const_ntt(9));
        assert_eq!(&v2 * &v3, const_ntt(18));
    }

    #[test]
    fn ntt_matrix_ops() {
        let a: NttMatrix<U3> = NttMatrix(Array([
            NttVector(Array([const_ntt(1), const_ntt(2), const_ntt(3)])),
            NttVector(Array([const_ntt(4), const_ntt(5), const_ntt(6)])),
            NttVector(Array([const_ntt(7), const_ntt(8), const_ntt(9)])),
        ]));
        let v_in: NttVector<U3> = NttVector(Array([const_ntt(1), const_ntt(2), const_ntt(3)]));
        let v_out: NttVector<U3> = NttVector(Array([const_ntt(14), const_ntt(32), const_ntt(50)]));
        assert_eq!(&a * &v_in, v_out);
    }

    #[test]
    fn matrix_transposed_sampling() {
        // Sampling with `transpose` set yields exactly the transpose of the
        // matrix sampled without it.
        let rho = B32::default();
        let a: NttMatrix<U3> = NttMatrix::sample_uniform(&rho, false);
        let at: NttMatrix<U3> = NttMatrix::sample_uniform(&rho, true);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(a.0[i].0[j], at.0[j].0[i]);
            }
        }
    }

    #[test]
    fn sample_ntt_range() {
        for seed in 0..8u8 {
            let rho = B32::from_fn(|_| seed);
            let mut xof = XOF(&rho, 0, seed);
            let f = sample_ntt(&mut xof);
            for x in &f.0 {
                assert!(x.0 < FieldElement::Q);
            }
        }
    }

    #[test]
    fn sample_cbd_range() {
        // Every coefficient lies in [0, eta] or [q - eta, q).
        fn check<Eta: CbdSamplingSize>(eta: Integer) {
            for seed in 0..8u8 {
                let sigma = B32::from_fn(|_| seed);
                let f = Polynomial::sample_cbd::<Eta>(&PRF::<Eta>(&sigma, 0));
                for x in &f.0 {
                    assert!(x.0 <= eta || x.0 >= FieldElement::Q - eta, "x = {}", x.0);
                }
            }
        }

        check::<U2>(2);
        check::<U3>(3);
    }

    #[test]
    fn sample_cbd_zero_block() {
        // An all-zero PRF block samples the zero polynomial.
        let zero2 = PrfOutput::<U2>::default();
        assert_eq!(Polynomial::sample_cbd::<U2>(&zero2), Polynomial::default());

        let zero3 = PrfOutput::<U3>::default();
        assert_eq!(Polynomial::sample_cbd::<U3>(&zero3), Polynomial::default());
    }

    #[test]
    fn sample_vector_nonce_stepping() {
        // Entry i of a sampled vector is the polynomial PRF'd at nonce
        // start_n + i.
        let sigma = B32::default();
        let v: PolynomialVector<U2> = PolynomialVector::sample_cbd::<U2>(&sigma, 3);
        let p4 = Polynomial::sample_cbd::<U2>(&PRF::<U2>(&sigma, 4));
        assert_eq!(v.0[1], p4);
    }
}
