use crate::algebra::{FieldElement, Integer, Polynomial, PolynomialVector};
use crate::param::{ArraySize, EncodingSize};
use crate::util::Truncate;

/// Constants used to compress and decompress at bit width `D`.
pub trait CompressionFactor: EncodingSize {
    /// `2^(d - 1)`, the rounding offset for decompression.
    const POW2_HALF: u32;
    /// `2^d - 1`
    const MASK: Integer;
    /// The shift of the division-free reduction.
    const DIV_SHIFT: usize;
    /// `ceil(2^DIV_SHIFT / q)`
    const DIV_MUL: u64;
}

impl<T> CompressionFactor for T
where
    T: EncodingSize,
{
    const POW2_HALF: u32 = 1 << (T::USIZE - 1);
    const MASK: Integer = ((1 as Integer) << T::USIZE) - 1;
    const DIV_SHIFT: usize = 36;
    const DIV_MUL: u64 = (1u64 << T::DIV_SHIFT).div_ceil(FieldElement::Q64);
}

/// Objects that can be compressed and decompressed in place.
pub trait Compress {
    /// Apply `Compress_d` to every coefficient.
    fn compress<D: CompressionFactor>(&mut self) -> &Self;

    /// Apply `Decompress_d` to every coefficient.
    fn decompress<D: CompressionFactor>(&mut self) -> &Self;
}

impl Compress for FieldElement {
    // Equation 4.7: Compress_d(x) = round((2^d / q) x) mod 2^d
    //
    // Since q is odd, x * 2^d / q is never exactly half an integer, so
    //
    //   round(x 2^d / q) = floor((x 2^d + (q - 1) / 2) / q)
    //
    // The division is replaced by a multiply-shift with a rounded-up
    // reciprocal.  At shift 36 the approximation error stays below 1/q for
    // every numerator that can arise (x < q, d <= 12), so the result is exact,
    // and the final mask performs the wrap at 2^d.
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        const HALF_Q: u64 = (FieldElement::Q64 - 1) >> 1;
        let x = u64::from(self.0);
        let y = (((x << D::USIZE) + HALF_Q) * D::DIV_MUL) >> D::DIV_SHIFT;
        self.0 = y.truncate() & D::MASK;
        self
    }

    // Equation 4.8: Decompress_d(y) = round((q / 2^d) y)
    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        let x = u32::from(self.0);
        let y = (x * FieldElement::Q32 + D::POW2_HALF) >> D::USIZE;
        self.0 = y.truncate();
        self
    }
}

impl Compress for Polynomial {
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.compress::<D>();
        }
        self
    }

    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.decompress::<D>();
        }
        self
    }
}

impl<K: ArraySize> Compress for PolynomialVector<K> {
    fn compress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.compress::<D>();
        }
        self
    }

    fn decompress<D: CompressionFactor>(&mut self) -> &Self {
        for x in &mut self.0 {
            x.decompress::<D>();
        }
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hybrid_array::typenum::{U1, U4, U5, U6, U10, U11, U12, Unsigned};
    use num_rational::Ratio;

    // Rational-arithmetic references for the two maps.
    #[allow(clippy::cast_possible_truncation)]
    fn exact_compress<D: CompressionFactor>(x: u16) -> u16 {
        let frac = Ratio::new(u32::from(x) * (1 << D::USIZE), FieldElement::Q32);
        (frac.round().to_integer() as u16) & D::MASK
    }

    #[allow(clippy::cast_possible_truncation)]
    fn exact_decompress<D: CompressionFactor>(y: u16) -> u16 {
        let frac = Ratio::new(u32::from(y) * FieldElement::Q32, 1 << D::USIZE);
        frac.round().to_integer() as u16
    }

    fn compress_matches_exact<D: CompressionFactor>() {
        for x in 0..FieldElement::Q {
            let mut actual = FieldElement(x);
            actual.compress::<D>();
            assert_eq!(actual.0, exact_compress::<D>(x), "x = {x}, d = {}", D::USIZE);
        }
    }

    fn decompress_matches_exact<D: CompressionFactor>() {
        for y in 0..(1 << D::USIZE) {
            let mut actual = FieldElement(y);
            actual.decompress::<D>();
            assert_eq!(actual.0, exact_decompress::<D>(y), "y = {y}, d = {}", D::USIZE);
        }
    }

    // Compress(Decompress(y)) = y for every y in [0, 2^d), d < 12.
    fn decompress_then_compress_is_identity<D: CompressionFactor>() {
        for y in 0..(1 << D::USIZE) {
            let mut x = FieldElement(y);
            x.decompress::<D>();
            x.compress::<D>();
            assert_eq!(x.0, y, "y = {y}, d = {}", D::USIZE);
        }
    }

    // |Decompress(Compress(x)) - x| stays within the FIPS 203 bound, as a
    // circular distance mod q.
    fn round_trip_error_is_bounded<D: CompressionFactor>(bound: u16) {
        for x in 0..FieldElement::Q {
            let mut y = FieldElement(x);
            y.compress::<D>();
            y.decompress::<D>();

            let forward = (FieldElement::Q + y.0 - x) % FieldElement::Q;
            let error = forward.min(FieldElement::Q - forward);
            assert!(
                error <= bound,
                "x = {x}, error = {error}, d = {}",
                D::USIZE
            );
        }
    }

    #[test]
    fn compress_known_answers() {
        assert_eq!(exact_compress::<U1>(0), 0);
        let mut x = FieldElement(0);
        x.compress::<U1>();
        assert_eq!(x.0, 0);

        // (q + 1) / 2 is just past the halfway point and rounds up.
        let mut x = FieldElement((FieldElement::Q + 1) / 2);
        x.compress::<U1>();
        assert_eq!(x.0, 1);

        let mut y = FieldElement(0);
        y.decompress::<U1>();
        assert_eq!(y.0, 0);

        let mut y = FieldElement(1);
        y.decompress::<U1>();
        assert_eq!(y.0, (FieldElement::Q + 1) / 2);
    }

    #[test]
    fn compress_exact() {
        compress_matches_exact::<U1>();
        compress_matches_exact::<U4>();
        compress_matches_exact::<U5>();
        compress_matches_exact::<U6>();
        compress_matches_exact::<U10>();
        compress_matches_exact::<U11>();
        compress_matches_exact::<U12>();

        decompress_matches_exact::<U1>();
        decompress_matches_exact::<U4>();
        decompress_matches_exact::<U5>();
        decompress_matches_exact::<U6>();
        decompress_matches_exact::<U10>();
        decompress_matches_exact::<U11>();
        decompress_matches_exact::<U12>();
    }

    #[test]
    fn decompress_compress_identity() {
        decompress_then_compress_is_identity::<U1>();
        decompress_then_compress_is_identity::<U4>();
        decompress_then_compress_is_identity::<U5>();
        decompress_then_compress_is_identity::<U10>();
        decompress_then_compress_is_identity::<U11>();
    }

    #[test]
    fn round_trip_error() {
        round_trip_error_is_bounded::<U10>(2);
        round_trip_error_is_bounded::<U11>(2);
    }
}
