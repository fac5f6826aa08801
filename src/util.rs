use core::mem::ManuallyDrop;
use core::ops::{Div, Mul, Rem};
use core::ptr;
use hybrid_array::{
    Array, ArraySize,
    typenum::{Prod, Quot, U0, U32, Unsigned},
};

/// A 32-byte array, the ubiquitous unit of seeds, hashes, and shared keys.
pub type B32 = Array<u8, U32>;

/// Lossless narrowing of an unsigned integer whose value is known to fit the
/// target type.
pub trait Truncate<T> {
    /// Convert to the narrower type, discarding the (zero) high-order bits.
    fn truncate(self) -> T;
}

macro_rules! define_truncate {
    ($from:ident, $to:ident) => {
        impl Truncate<$to> for $from {
            fn truncate(self) -> $to {
                // Masking first makes the narrowing conversion value-preserving.
                #[allow(clippy::cast_possible_truncation)]
                {
                    (self & $from::from($to::MAX)) as $to
                }
            }
        }
    };
}

define_truncate!(u32, u16);
define_truncate!(u64, u16);
define_truncate!(u128, u16);
define_truncate!(usize, u8);

/// A sequence of fixed-size chunks that can be merged into one contiguous array.
pub trait Flatten<T, M: ArraySize> {
    /// The size of the merged array.
    type OutputSize: ArraySize;

    /// Merge the chunks.
    fn flatten(self) -> Array<T, Self::OutputSize>;
}

impl<T, N, M> Flatten<T, Prod<M, N>> for Array<Array<T, M>, N>
where
    N: ArraySize,
    M: ArraySize + Mul<N>,
    Prod<M, N>: ArraySize,
{
    type OutputSize = Prod<M, N>;

    fn flatten(self) -> Array<T, Self::OutputSize> {
        // [[T; M]; N] and [T; M * N] have identical memory layouts.
        let whole = ManuallyDrop::new(self);
        unsafe { ptr::read(whole.as_ptr().cast()) }
    }
}

/// A borrowed array viewed as a sequence of equal-size chunks.
pub trait Unflatten<M>
where
    M: ArraySize,
{
    /// The chunk type.
    type Part;

    /// Split into chunks.
    fn unflatten(self) -> Array<Self::Part, M>;
}

impl<'a, T, N, M> Unflatten<M> for &'a Array<T, N>
where
    N: ArraySize + Div<M> + Rem<M, Output = U0>,
    M: ArraySize,
    Quot<N, M>: ArraySize,
{
    type Part = &'a Array<T, Quot<N, M>>;

    fn unflatten(self) -> Array<Self::Part, M> {
        let part_size = Quot::<N, M>::USIZE;
        let mut ptr: *const T = self.as_ptr();
        Array::from_fn(|_| unsafe {
            // In-bounds because N = part_size * M, checked by the Rem bound.
            let part = &*(ptr.cast());
            ptr = ptr.add(part_size);
            part
        })
    }
}
