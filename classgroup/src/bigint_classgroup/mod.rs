// Copyright 2018 POA Networks Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Binary quadratic forms over `num_bigint::BigInt`.
//!
//! A form `(a, b, c)` of discriminant `D = b² − 4ac < 0` is kept reduced:
//! `a > 0`, `|b| ≤ a ≤ c`, and `b ≥ 0` whenever `|b| = a` or `a = c`.  The
//! reduced representative of a class is unique, which is what makes the
//! fixed-width serialization canonical.

use crate::{BigNum, ClassGroup};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::ops::{Mul, MulAssign};

mod bignum;

/// A class group element backed by `num_bigint::BigInt` coefficients.
///
/// `c` is carried alongside `a` and `b` so composition does not have to
/// rederive it, but it never travels on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigintClassGroup {
    a: BigInt,
    b: BigInt,
    c: BigInt,
    discriminant: BigInt,
}

/// Extended Euclid: returns `(g, x, y)` with `g = a·x + b·y` and `g ≥ 0`.
pub fn ext_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let q: BigInt = &old_r / &r;
        let next = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next);
        let next = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next);
        let next = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next);
    }
    if old_r.is_negative() {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}

/// Modular inverse of `a` modulo `m`.  `None` when `gcd(a, m) ≠ 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let (g, x, _) = ext_gcd(a, m);
    if g.is_one() {
        Some(x.mod_floor(m))
    } else {
        None
    }
}

/// Solves `a·μ ≡ b (mod m)` for `μ ∈ [0, v)` where `v = m / gcd(a, m)`,
/// returning `(μ, v)`.
///
/// # Panics
///
/// The divisions of `b` and `m` by `gcd(a, m)` must both be exact; a
/// non-zero remainder means the congruence has no solution, which cannot
/// happen when composing two forms of the same discriminant.
fn solve_linear_congruence(a: &BigInt, b: &BigInt, m: &BigInt) -> (BigInt, BigInt) {
    let (g, d, _) = ext_gcd(a, m);
    let (q, r) = b.div_rem(&g);
    assert!(r.is_zero(), "linear congruence has no solution");
    let (v, r) = m.div_rem(&g);
    assert!(r.is_zero(), "gcd does not divide the modulus");
    let mu = (q * d).mod_floor(&v);
    (mu, v)
}

impl BigintClassGroup {
    /// Builds and reduces a form, checking that `(a, b)` actually describe
    /// one: `a > 0` and `4a | b² − D`.
    fn checked_from_ab(a: BigInt, b: BigInt, discriminant: BigInt) -> Option<Self> {
        if !a.is_positive() {
            return None;
        }
        let four_a: BigInt = &a << 2;
        let (c, rem) = (&b * &b - &discriminant).div_rem(&four_a);
        if !rem.is_zero() {
            return None;
        }
        let mut form = BigintClassGroup { a, b, c, discriminant };
        form.reduce();
        Some(form)
    }

    /// Replaces `b` by its representative in `(−a, a]` modulo `2a` and
    /// fixes `c` up accordingly.
    fn normalize(&mut self) {
        let two_a: BigInt = &self.a << 1;
        let mut r = self.b.mod_floor(&two_a);
        if r > self.a {
            r -= &two_a;
        }
        let (delta, rem) = ((&r - &self.b) * (&r + &self.b)).div_rem(&(&two_a << 1));
        debug_assert!(rem.is_zero());
        self.c += delta;
        self.b = r;
    }

    /// Reduces to the canonical representative.  Idempotent.
    fn reduce(&mut self) {
        self.normalize();
        while self.a > self.c || (self.a == self.c && self.b.is_negative()) {
            let two_c: BigInt = &self.c << 1;
            let s = (&self.c + &self.b).div_floor(&two_c);
            let new_a = self.c.clone();
            let new_b = &self.c * (&s << 1) - &self.b;
            let new_c = &self.c * &s * &s - &self.b * &s + &self.a;
            self.a = new_a;
            self.b = new_b;
            self.c = new_c;
            self.normalize();
        }
    }

    /// Composition of two forms of the same discriminant.
    fn compose(lhs: &Self, rhs: &Self) -> Self {
        assert_eq!(
            lhs.discriminant, rhs.discriminant,
            "cannot compose forms of different discriminants"
        );
        // b₁ and b₂ have the parity of D, so both halvings are exact.
        let g: BigInt = (&lhs.b + &rhs.b) / BigInt::from(2u64);
        let h: BigInt = (&rhs.b - &lhs.b) / BigInt::from(2u64);
        let w: BigInt = lhs.a.gcd(&rhs.a).gcd(&g);
        let j = w.clone();
        let s: BigInt = &lhs.a / &w;
        let t: BigInt = &rhs.a / &w;
        let u: BigInt = &g / &w;
        let st: BigInt = &s * &t;
        let (mu, v) = solve_linear_congruence(&(&t * &u), &(&h * &u + &s * &lhs.c), &st);
        let (lambda, _) = solve_linear_congruence(&(&t * &v), &(&h - &t * &mu), &s);
        let k: BigInt = &mu + &v * &lambda;
        let (l, rem) = (&k * &t - &h).div_rem(&s);
        assert!(rem.is_zero(), "composition: s does not divide k·t − h");
        let (m, rem) = (&t * &u * &k - &h * &u - &lhs.c * &s).div_rem(&st);
        assert!(rem.is_zero(), "composition: s·t does not divide t·u·k − h·u − c·s");
        let new_b: BigInt = &j * &u - (&k * &t + &l * &s);
        let new_c: BigInt = &k * &l - &j * &m;
        let mut out = BigintClassGroup {
            a: st,
            b: new_b,
            c: new_c,
            discriminant: lhs.discriminant.clone(),
        };
        out.reduce();
        out
    }
}

impl ClassGroup for BigintClassGroup {
    type BigNum = BigInt;

    fn from_ab_discriminant(a: BigInt, b: BigInt, discriminant: BigInt) -> Self {
        Self::checked_from_ab(a, b, discriminant)
            .expect("(a, b) does not describe a form of this discriminant")
    }

    fn from_bytes(buf: &[u8], discriminant: BigInt) -> Option<Self> {
        let half = buf.len() / 2;
        let a = <BigInt as BigNum>::from_signed_bytes_be(&buf[..half]);
        let b = <BigInt as BigNum>::from_signed_bytes_be(&buf[half..]);
        Self::checked_from_ab(a, b, discriminant)
    }

    fn identity_for_discriminant(discriminant: BigInt) -> Self {
        Self::from_ab_discriminant(BigInt::one(), BigInt::one(), discriminant)
    }

    fn identity(&self) -> Self {
        Self::identity_for_discriminant(self.discriminant.clone())
    }

    fn discriminant(&self) -> &BigInt {
        &self.discriminant
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<(), usize> {
        if buf.len() % 2 != 0 {
            return Err(buf.len() / 2 + 1);
        }
        let half = buf.len() / 2;
        let (a_buf, b_buf) = buf.split_at_mut(half);
        self.a.write_signed_bytes_be(a_buf)?;
        self.b.write_signed_bytes_be(b_buf)
    }

    fn serialized_size(&self) -> usize {
        2 * ((self.discriminant.bit_length() + 16) >> 4)
    }

    fn multiply(&mut self, rhs: &Self) {
        *self = Self::compose(self, rhs);
    }

    fn square(&mut self) {
        *self = Self::compose(self, self);
    }

    fn pow(&mut self, exponent: BigInt) {
        assert!(!exponent.is_negative(), "negative exponent");
        if exponent.is_zero() {
            *self = self.identity();
            return;
        }
        let base = self.clone();
        let bits = exponent.bits();
        for i in (0..bits - 1).rev() {
            self.square();
            if exponent.bit(i) {
                self.multiply(&base);
            }
        }
    }
}

impl<'a, 'b> Mul<&'b BigintClassGroup> for &'a BigintClassGroup {
    type Output = BigintClassGroup;
    fn mul(self, rhs: &'b BigintClassGroup) -> BigintClassGroup {
        BigintClassGroup::compose(self, rhs)
    }
}

impl<'a> MulAssign<&'a BigintClassGroup> for BigintClassGroup {
    fn mul_assign(&mut self, rhs: &'a BigintClassGroup) {
        self.multiply(rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ClassGroup;

    fn d256() -> BigInt {
        BigInt::parse_bytes(
            b"-94244082954491557865740412536462075406760295174154720908408968004709609548271",
            10,
        )
        .unwrap()
    }

    fn generator() -> BigintClassGroup {
        BigintClassGroup::from_ab_discriminant(2u64.into(), 1u64.into(), d256())
    }

    fn check_invariant(f: &BigintClassGroup) {
        assert_eq!(&f.b * &f.b - ((&f.a * &f.c) << 2), f.discriminant);
        assert!(f.a.is_positive());
        assert!(f.b.abs() <= f.a);
        assert!(f.a <= f.c);
    }

    #[test]
    fn discriminant_preserved_everywhere() {
        let x = generator();
        check_invariant(&x);
        let mut y = &x * &x;
        check_invariant(&y);
        y.square();
        check_invariant(&y);
        y.repeated_square(7);
        check_invariant(&y);
        y.pow(12345u64.into());
        check_invariant(&y);
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut x = generator();
        x.repeated_square(3);
        let before = x.clone();
        x.reduce();
        assert_eq!(before, x);
    }

    #[test]
    fn identity_laws() {
        let x = generator();
        let id = x.identity();
        assert_eq!(&x * &id, x);
        assert_eq!(&id * &x, x);
        assert_eq!(&id * &id, id);
    }

    #[test]
    fn square_is_self_composition() {
        let mut x = generator();
        x.repeated_square(2);
        let composed = &x * &x;
        let mut squared = x.clone();
        squared.square();
        assert_eq!(composed, squared);
    }

    #[test]
    fn repeated_square_is_folded_composition() {
        let x = generator();
        let mut by_squaring = x.clone();
        by_squaring.repeated_square(3);
        // x^(2³) by plain composition
        let mut by_composition = x.clone();
        for _ in 0..3 {
            by_composition = &by_composition * &by_composition;
        }
        assert_eq!(by_squaring, by_composition);
    }

    #[test]
    fn pow_edge_cases() {
        let x = generator();
        let mut p = x.clone();
        p.pow(0u64.into());
        assert_eq!(p, x.identity());
        let mut p = x.clone();
        p.pow(1u64.into());
        assert_eq!(p, x);
        let mut id = x.identity();
        id.pow(123_456u64.into());
        assert_eq!(id, x.identity());
    }

    #[test]
    fn pow_matches_repeated_square() {
        let x = generator();
        let mut p = x.clone();
        p.pow(32u64.into());
        let mut s = x.clone();
        s.repeated_square(5);
        assert_eq!(p, s);
    }

    #[test]
    fn pow_matches_composition_chain() {
        let x = generator();
        let mut p = x.clone();
        p.pow(3u64.into());
        let cubed = &(&x * &x) * &x;
        assert_eq!(p, cubed);
    }

    #[test]
    fn known_serializations() {
        let x = generator();
        assert_eq!(x.serialized_size(), 34);
        let mut buf = vec![0u8; 34];
        x.serialize(&mut buf).unwrap();
        let mut expected = vec![0u8; 34];
        expected[16] = 2;
        expected[33] = 1;
        assert_eq!(buf, expected);

        let id = x.identity();
        id.serialize(&mut buf).unwrap();
        expected[16] = 1;
        assert_eq!(buf, expected);

        // x³ = (8, −7, ·): a negative b exercises the 0xFF fill.
        let mut cube = x.clone();
        cube.pow(3u64.into());
        cube.serialize(&mut buf).unwrap();
        let mut expected = vec![0u8; 17];
        expected[16] = 8;
        expected.extend_from_slice(&[0xFF; 16]);
        expected.push(0xF9);
        assert_eq!(buf, expected);
    }

    #[test]
    fn serialize_round_trip() {
        let mut x = generator();
        x.repeated_square(10);
        let mut buf = vec![0u8; x.serialized_size()];
        x.serialize(&mut buf).unwrap();
        let back = BigintClassGroup::from_bytes(&buf, d256()).unwrap();
        assert_eq!(back, x);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        // a = 0
        assert!(BigintClassGroup::from_bytes(&[0u8; 34], d256()).is_none());
        // a < 0
        assert!(BigintClassGroup::from_bytes(&[0xFF; 34], d256()).is_none());
        // a = 2, b = 0: b² − D = −D ≡ 7 (mod 8) is not divisible by 8
        let mut buf = [0u8; 34];
        buf[16] = 2;
        assert!(BigintClassGroup::from_bytes(&buf, d256()).is_none());
    }

    #[test]
    fn ext_gcd_bezout() {
        let a = BigInt::from(240u64);
        let b = BigInt::from(46u64);
        let (g, x, y) = ext_gcd(&a, &b);
        assert_eq!(g, BigInt::from(2u64));
        assert_eq!(&a * &x + &b * &y, g);
        // sign normalization
        let (g, x, y) = ext_gcd(&BigInt::from(-240i64), &b);
        assert!(g.is_positive());
        assert_eq!(BigInt::from(-240i64) * x + b * y, g);
    }

    #[test]
    fn mod_inverse_basic() {
        let m = BigInt::from(97u64);
        let a = BigInt::from(35u64);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!((a * inv).mod_floor(&m), BigInt::one());
        assert!(mod_inverse(&BigInt::from(14u64), &BigInt::from(21u64)).is_none());
    }

    #[test]
    fn solve_linear_congruence_basic() {
        // 4·μ ≡ 2 (mod 6): g = 2, v = 3, μ = 2
        let (mu, v) = solve_linear_congruence(
            &BigInt::from(4u64),
            &BigInt::from(2u64),
            &BigInt::from(6u64),
        );
        assert_eq!(v, BigInt::from(3u64));
        assert_eq!((BigInt::from(4u64) * &mu).mod_floor(&BigInt::from(6u64)), BigInt::from(2u64));
        assert!(mu >= BigInt::zero() && mu < v);
    }
}
