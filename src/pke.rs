use hybrid_array::typenum::{U1, Unsigned};

use crate::algebra::{NttMatrix, NttVector, Polynomial, PolynomialVector};
use crate::compress::Compress;
use crate::crypto::{G, PRF};
use crate::encode::Encode;
use crate::error::Error;
use crate::param::{
    EncodedCiphertext, EncodedDecryptionKey, EncodedEncryptionKey, PkeParams,
};
use crate::util::B32;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// A K-PKE decryption key: the secret vector `s_hat`, kept in the NTT domain.
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptionKey<P>
where
    P: PkeParams,
{
    s_hat: NttVector<P::K>,
}

#[cfg(feature = "zeroize")]
impl<P> Zeroize for DecryptionKey<P>
where
    P: PkeParams,
{
    fn zeroize(&mut self) {
        self.s_hat.zeroize();
    }
}

impl<P> DecryptionKey<P>
where
    P: PkeParams,
{
    /// Algorithm 13: `K-PKE.KeyGen(d)`
    ///
    /// Generate a decryption/encryption key pair from the seed `d`.
    pub fn generate(d: &B32) -> (Self, EncryptionKey<P>) {
        // Derive the matrix seed and the sampling seed.  The parameter k is
        // folded into the hash input to domain-separate the parameter sets.
        let (rho, sigma) = G(&[&d[..], &[P::K::U8]]);

        let a_hat: NttMatrix<P::K> = NttMatrix::sample_uniform(&rho, false);
        let s: PolynomialVector<P::K> = PolynomialVector::sample_cbd::<P::Eta1>(&sigma, 0);
        let e: PolynomialVector<P::K> = PolynomialVector::sample_cbd::<P::Eta1>(&sigma, P::K::U8);

        let s_hat = s.ntt();
        let e_hat = e.ntt();

        let t_hat = &(&a_hat * &s_hat) + &e_hat;

        let dk = DecryptionKey { s_hat };
        let ek = EncryptionKey { t_hat, rho };
        (dk, ek)
    }

    /// Algorithm 15: `K-PKE.Decrypt(dk_PKE, c)`
    pub fn decrypt(&self, ciphertext: &EncodedCiphertext<P>) -> B32 {
        let (c1, c2) = P::split_ct(ciphertext);

        let mut u: PolynomialVector<P::K> = Encode::<P::Du>::decode(&c1);
        u.decompress::<P::Du>();

        let mut v: Polynomial = Encode::<P::Dv>::decode(&c2);
        v.decompress::<P::Dv>();

        let u_hat = u.ntt();
        let su = (&self.s_hat * &u_hat).ntt_inverse();
        let mut w = &v - &su;
        Encode::<U1>::encode(w.compress::<U1>())
    }

    /// Serialize to bytes: `ByteEncode_12` of each entry of `s_hat`.
    pub fn as_bytes(&self) -> EncodedDecryptionKey<P> {
        P::encode_u12(&self.s_hat)
    }

    /// Parse from bytes.  Never fails: `ByteDecode_12` reduces mod q.
    pub fn from_bytes(enc: &EncodedDecryptionKey<P>) -> Self {
        let s_hat = P::decode_u12(enc);
        Self { s_hat }
    }
}

/// A K-PKE encryption key: the public vector `t_hat` in the NTT domain,
/// together with the matrix seed `rho`.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionKey<P>
where
    P: PkeParams,
{
    t_hat: NttVector<P::K>,
    rho: B32,
}

impl<P> EncryptionKey<P>
where
    P: PkeParams,
{
    /// Algorithm 14: `K-PKE.Encrypt(ek_PKE, m, r)`
    ///
    /// Encrypt the 32-byte message under this key with the sampling seed `r`.
    pub fn encrypt(&self, message: &B32, randomness: &B32) -> EncodedCiphertext<P> {
        let y = PolynomialVector::<P::K>::sample_cbd::<P::Eta1>(randomness, 0);
        let e1 = PolynomialVector::<P::K>::sample_cbd::<P::Eta2>(randomness, P::K::U8);

        let prf_output = PRF::<P::Eta2>(randomness, 2 * P::K::U8);
        let e2: Polynomial = Polynomial::sample_cbd::<P::Eta2>(&prf_output);

        // The matrix is regenerated transposed; entry (i, j) of A_hat^T is
        // sampled the way entry (j, i) of A_hat is.
        let a_hat_t = NttMatrix::<P::K>::sample_uniform(&self.rho, true);
        let y_hat: NttVector<P::K> = y.ntt();

        let ay = (&a_hat_t * &y_hat).ntt_inverse();
        let mut u = ay + e1;

        let mut mu: Polynomial = Encode::<U1>::decode(message);
        mu.decompress::<U1>();

        let ty = (&self.t_hat * &y_hat).ntt_inverse();
        let mut v = &(&ty + &e2) + &mu;

        let c1 = Encode::<P::Du>::encode(u.compress::<P::Du>());
        let c2 = Encode::<P::Dv>::encode(v.compress::<P::Dv>());
        P::concat_ct(c1, c2)
    }

    /// Serialize to bytes: `ByteEncode_12(t_hat) || rho`.
    pub fn as_bytes(&self) -> EncodedEncryptionKey<P> {
        let t_hat = P::encode_u12(&self.t_hat);
        P::concat_ek(t_hat, self.rho.clone())
    }

    /// Parse from bytes, performing the FIPS 203 modulus check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if any encoded coefficient of `t_hat` is
    /// not canonical, i.e. the key fails to re-encode to the input bytes.
    pub fn from_bytes(enc: &EncodedEncryptionKey<P>) -> Result<Self, Error> {
        let (t_hat_bytes, rho) = P::split_ek(enc);
        let t_hat = P::decode_u12(&t_hat_bytes);

        if P::encode_u12(&t_hat) != t_hat_bytes {
            return Err(Error::InvalidKey);
        }

        Ok(Self { t_hat, rho })
    }
}
