//! SM9 BN256 base field.
//!
//! p = 0xb640000002a3a6f1d603ab4ff58ec74521f2934b1a7aeedbe56f9b27e351457d,
//! p = 5 (mod 8). Elements are four little-endian 64-bit limbs in
//! Montgomery form (`a * R mod p`, R = 2^256). The modulus uses the top
//! bit of the last limb, so sums and reductions track a fifth carry word.
//! Every operation runs in constant time.

use std::fmt;

use num_bigint::BigUint;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};

use super::FieldElement;

/// p, little-endian limbs.
pub const MODULUS: [u64; 4] = [
    0xe56f9b27e351457d,
    0x21f2934b1a7aeedb,
    0xd603ab4ff58ec745,
    0xb640000002a3a6f1,
];

/// -p^-1 mod 2^64
const INV: u64 = 0x892bc42c2f2ee42b;

/// R mod p
const R: Fp = Fp([
    0x1a9064d81caeba83,
    0xde0d6cb4e5851124,
    0x29fc54b00a7138ba,
    0x49bffffffd5c590e,
]);

/// R^2 mod p
const R2: Fp = Fp([
    0x27dea312b417e2d2,
    0x88f8105fae1a5d3f,
    0xe479b522d6706e7b,
    0x2ea795a656f62fbd,
]);

/// R^3 mod p
const R3: Fp = Fp([
    0x130257769df5827e,
    0x36920fc0837ec76e,
    0xcbec24519c22a142,
    0x219be84a7c687090,
]);

/// a + b + carry, returning the result and the new carry.
#[inline(always)]
const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + (b as u128) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// a - (b + borrow), returning the result and the new borrow (all ones
/// on underflow).
#[inline(always)]
const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let ret = (a as u128).wrapping_sub((b as u128) + ((borrow >> 63) as u128));
    (ret as u64, (ret >> 64) as u64)
}

/// a + (b * c) + carry, returning the result and the new carry.
#[inline(always)]
const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + ((b as u128) * (c as u128)) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// Element of the SM9 base field, in Montgomery form.
#[derive(Clone, Copy, Default)]
pub struct Fp(pub(crate) [u64; 4]);

impl Fp {
    pub const ZERO: Fp = Fp([0, 0, 0, 0]);
    pub const ONE: Fp = R;

    /// Wrap limbs that are already in Montgomery form.
    pub const fn from_montgomery(limbs: [u64; 4]) -> Fp {
        Fp(limbs)
    }

    /// Construct from a u64 value.
    pub fn from_u64(v: u64) -> Fp {
        Fp([v, 0, 0, 0]).mul(R2)
    }

    /// The modulus as a big integer.
    pub fn modulus() -> BigUint {
        BigUint::from_slice(&limbs_to_u32(&MODULUS))
    }

    /// Parse a canonical big-endian encoding. Fails (in constant time) when
    /// the value is not below p.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> CtOption<Fp> {
        let limbs = bytes_to_limbs(bytes);

        let (_, borrow) = sbb(limbs[0], MODULUS[0], 0);
        let (_, borrow) = sbb(limbs[1], MODULUS[1], borrow);
        let (_, borrow) = sbb(limbs[2], MODULUS[2], borrow);
        let (_, borrow) = sbb(limbs[3], MODULUS[3], borrow);
        // borrow is all ones exactly when the value is below p
        let is_some = (borrow as u8) & 1;

        CtOption::new(Fp(limbs).mul(R2), Choice::from(is_some))
    }

    /// Reduce a 512-bit big-endian value modulo p.
    pub fn from_bytes_wide(bytes: &[u8; 64]) -> Fp {
        let mut hi = [0u8; 32];
        let mut lo = [0u8; 32];
        hi.copy_from_slice(&bytes[..32]);
        lo.copy_from_slice(&bytes[32..]);
        // hi * 2^256 + lo, both halves lifted into Montgomery form
        let hi = Fp(bytes_to_limbs(&hi)).mul(R3);
        let lo = Fp(bytes_to_limbs(&lo)).mul(R2);
        hi.add(lo)
    }

    /// Canonical big-endian encoding.
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let canonical = Fp::montgomery_reduce(self.0[0], self.0[1], self.0[2], self.0[3], 0, 0, 0, 0);
        let mut out = [0u8; 32];
        for (i, limb) in canonical.0.iter().enumerate() {
            out[(3 - i) * 8..(4 - i) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_bytes_be())
    }

    /// Reduce an arbitrary integer modulo p.
    pub fn from_biguint(v: &BigUint) -> Fp {
        let reduced = v % Fp::modulus();
        let digits = reduced.to_bytes_be();
        let mut bytes = [0u8; 64];
        bytes[64 - digits.len()..].copy_from_slice(&digits);
        Fp::from_bytes_wide(&bytes)
    }

    /// Subtract p from (hi : limbs) if the value is at least p. Requires
    /// the value to be below 2p.
    #[inline(always)]
    const fn subtract_p(limbs: [u64; 4], hi: u64) -> Fp {
        let (d0, borrow) = sbb(limbs[0], MODULUS[0], 0);
        let (d1, borrow) = sbb(limbs[1], MODULUS[1], borrow);
        let (d2, borrow) = sbb(limbs[2], MODULUS[2], borrow);
        let (d3, borrow) = sbb(limbs[3], MODULUS[3], borrow);
        let (_, borrow) = sbb(hi, 0, borrow);

        // borrow = all ones: value < p, keep it
        Fp([
            (limbs[0] & borrow) | (d0 & !borrow),
            (limbs[1] & borrow) | (d1 & !borrow),
            (limbs[2] & borrow) | (d2 & !borrow),
            (limbs[3] & borrow) | (d3 & !borrow),
        ])
    }

    #[allow(clippy::too_many_arguments)]
    #[inline(always)]
    const fn montgomery_reduce(
        t0: u64,
        t1: u64,
        t2: u64,
        t3: u64,
        t4: u64,
        t5: u64,
        t6: u64,
        t7: u64,
    ) -> Fp {
        let k = t0.wrapping_mul(INV);
        let (_, carry) = mac(t0, k, MODULUS[0], 0);
        let (r1, carry) = mac(t1, k, MODULUS[1], carry);
        let (r2, carry) = mac(t2, k, MODULUS[2], carry);
        let (r3, carry) = mac(t3, k, MODULUS[3], carry);
        let (r4, carry2) = adc(t4, 0, carry);

        let k = r1.wrapping_mul(INV);
        let (_, carry) = mac(r1, k, MODULUS[0], 0);
        let (r2, carry) = mac(r2, k, MODULUS[1], carry);
        let (r3, carry) = mac(r3, k, MODULUS[2], carry);
        let (r4, carry) = mac(r4, k, MODULUS[3], carry);
        let (r5, carry2) = adc(t5, carry2, carry);

        let k = r2.wrapping_mul(INV);
        let (_, carry) = mac(r2, k, MODULUS[0], 0);
        let (r3, carry) = mac(r3, k, MODULUS[1], carry);
        let (r4, carry) = mac(r4, k, MODULUS[2], carry);
        let (r5, carry) = mac(r5, k, MODULUS[3], carry);
        let (r6, carry2) = adc(t6, carry2, carry);

        let k = r3.wrapping_mul(INV);
        let (_, carry) = mac(r3, k, MODULUS[0], 0);
        let (r4, carry) = mac(r4, k, MODULUS[1], carry);
        let (r5, carry) = mac(r5, k, MODULUS[2], carry);
        let (r6, carry) = mac(r6, k, MODULUS[3], carry);
        let (r7, carry2) = adc(t7, carry2, carry);

        // (carry2 : r4..r7) < 2p
        Fp::subtract_p([r4, r5, r6, r7], carry2)
    }
}

fn bytes_to_limbs(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[(3 - i) * 8..(4 - i) * 8]);
        *limb = u64::from_be_bytes(word);
    }
    limbs
}

fn limbs_to_u32(limbs: &[u64; 4]) -> [u32; 8] {
    let mut out = [0u32; 8];
    for (i, limb) in limbs.iter().enumerate() {
        out[2 * i] = *limb as u32;
        out[2 * i + 1] = (*limb >> 32) as u32;
    }
    out
}

impl FieldElement for Fp {
    const ZERO: Self = Fp::ZERO;
    const ONE: Self = Fp::ONE;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (d0, carry) = adc(self.0[0], rhs.0[0], 0);
        let (d1, carry) = adc(self.0[1], rhs.0[1], carry);
        let (d2, carry) = adc(self.0[2], rhs.0[2], carry);
        let (d3, carry) = adc(self.0[3], rhs.0[3], carry);
        Fp::subtract_p([d0, d1, d2, d3], carry)
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let (d0, borrow) = sbb(self.0[0], rhs.0[0], 0);
        let (d1, borrow) = sbb(self.0[1], rhs.0[1], borrow);
        let (d2, borrow) = sbb(self.0[2], rhs.0[2], borrow);
        let (d3, borrow) = sbb(self.0[3], rhs.0[3], borrow);

        // add p back on underflow
        let (d0, carry) = adc(d0, MODULUS[0] & borrow, 0);
        let (d1, carry) = adc(d1, MODULUS[1] & borrow, carry);
        let (d2, carry) = adc(d2, MODULUS[2] & borrow, carry);
        let (d3, _) = adc(d3, MODULUS[3] & borrow, carry);
        Fp([d0, d1, d2, d3])
    }

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self.0, rhs.0);

        let (t0, carry) = mac(0, a[0], b[0], 0);
        let (t1, carry) = mac(0, a[0], b[1], carry);
        let (t2, carry) = mac(0, a[0], b[2], carry);
        let (t3, t4) = mac(0, a[0], b[3], carry);

        let (t1, carry) = mac(t1, a[1], b[0], 0);
        let (t2, carry) = mac(t2, a[1], b[1], carry);
        let (t3, carry) = mac(t3, a[1], b[2], carry);
        let (t4, t5) = mac(t4, a[1], b[3], carry);

        let (t2, carry) = mac(t2, a[2], b[0], 0);
        let (t3, carry) = mac(t3, a[2], b[1], carry);
        let (t4, carry) = mac(t4, a[2], b[2], carry);
        let (t5, t6) = mac(t5, a[2], b[3], carry);

        let (t3, carry) = mac(t3, a[3], b[0], 0);
        let (t4, carry) = mac(t4, a[3], b[1], carry);
        let (t5, carry) = mac(t5, a[3], b[2], carry);
        let (t6, t7) = mac(t6, a[3], b[3], carry);

        Fp::montgomery_reduce(t0, t1, t2, t3, t4, t5, t6, t7)
    }

    #[inline]
    fn neg(self) -> Self {
        let (d0, borrow) = sbb(MODULUS[0], self.0[0], 0);
        let (d1, borrow) = sbb(MODULUS[1], self.0[1], borrow);
        let (d2, borrow) = sbb(MODULUS[2], self.0[2], borrow);
        let (d3, _) = sbb(MODULUS[3], self.0[3], borrow);

        // p - 0 must come out as 0
        let mask = (((self.0[0] | self.0[1] | self.0[2] | self.0[3]) == 0) as u64).wrapping_sub(1);
        Fp([d0 & mask, d1 & mask, d2 & mask, d3 & mask])
    }
}

impl ConstantTimeEq for Fp {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl ConditionallySelectable for Fp {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Fp([
            u64::conditional_select(&a.0[0], &b.0[0], choice),
            u64::conditional_select(&a.0[1], &b.0[1], choice),
            u64::conditional_select(&a.0[2], &b.0[2], choice),
            u64::conditional_select(&a.0[3], &b.0[3], choice),
        ])
    }
}

impl PartialEq for Fp {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for Fp {}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in self.to_bytes_be() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn random(rng: &mut StdRng) -> Fp {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        Fp::from_bytes_wide(&bytes)
    }

    #[test]
    fn test_modulus_value() {
        assert_eq!(
            format!("{:x}", Fp::modulus()),
            "b640000002a3a6f1d603ab4ff58ec74521f2934b1a7aeedbe56f9b27e351457d"
        );
    }

    #[test]
    fn test_one_round_trips() {
        assert_eq!(Fp::ONE.to_biguint(), BigUint::from(1u32));
        assert_eq!(Fp::from_u64(1), Fp::ONE);
        assert_eq!(Fp::ZERO.to_biguint(), BigUint::from(0u32));
    }

    #[test]
    fn test_p_minus_one_boundary() {
        let p_minus_1 = Fp::from_biguint(&(Fp::modulus() - 1u32));
        assert_eq!(p_minus_1, Fp::ONE.neg());
        assert_eq!(p_minus_1.add(Fp::ONE), Fp::ZERO);
        assert_eq!(p_minus_1.add(p_minus_1), Fp::from_u64(2).neg());
        assert_eq!(p_minus_1.mul(p_minus_1), Fp::ONE);
        assert_eq!(Fp::ZERO.sub(Fp::ONE), p_minus_1);
    }

    #[test]
    fn test_from_bytes_rejects_noncanonical() {
        let mut p_bytes = [0u8; 32];
        let digits = Fp::modulus().to_bytes_be();
        p_bytes.copy_from_slice(&digits);
        assert!(bool::from(Fp::from_bytes_be(&p_bytes).is_none()));
        assert!(bool::from(Fp::from_bytes_be(&[0xff; 32]).is_none()));

        let below = Fp::modulus() - 1u32;
        let mut below_bytes = [0u8; 32];
        below_bytes.copy_from_slice(&below.to_bytes_be());
        let parsed = Fp::from_bytes_be(&below_bytes).unwrap();
        assert_eq!(parsed.to_bytes_be(), below_bytes);
    }

    #[test]
    fn test_arithmetic_matches_biguint() {
        let mut rng = StdRng::seed_from_u64(0x5139);
        let p = Fp::modulus();
        for _ in 0..200 {
            let a = random(&mut rng);
            let b = random(&mut rng);
            let (x, y) = (a.to_biguint(), b.to_biguint());
            assert_eq!(a.add(b).to_biguint(), (&x + &y) % &p);
            assert_eq!(a.sub(b).to_biguint(), (&x + &p - &y) % &p);
            assert_eq!(a.mul(b).to_biguint(), (&x * &y) % &p);
            assert_eq!(a.square().to_biguint(), (&x * &x) % &p);
            assert_eq!(a.neg().to_biguint(), (&p - &x) % &p);
        }
    }

    #[test]
    fn test_from_bytes_wide_reduces() {
        let bytes = [0xffu8; 64];
        let expected = (BigUint::from(1u32) << 512u32) - 1u32;
        assert_eq!(
            Fp::from_bytes_wide(&bytes).to_biguint(),
            expected % Fp::modulus()
        );
    }

    #[test]
    fn test_fermat() {
        let mut rng = StdRng::seed_from_u64(7);
        let p_minus_1 = Fp::modulus() - 1u32;
        for _ in 0..4 {
            let a = random(&mut rng);
            assert_eq!(a.pow_vartime(&p_minus_1), Fp::ONE);
        }
    }

    #[test]
    fn test_debug_is_canonical_hex() {
        assert_eq!(
            format!("{:?}", Fp::from_u64(0xabc)),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
    }
}
