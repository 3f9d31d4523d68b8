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

//! Class groups of binary quadratic forms of negative discriminant.
//!
//! This crate provides the group arithmetic that verifiable delay functions
//! are built on: composition and reduction of forms `(a, b, c)` with
//! `b² − 4ac = D` for a fixed negative discriminant `D`, together with the
//! capability traits ([`ClassGroup`], [`BigNum`], [`BigNumExt`]) that let
//! protocol code stay generic over the backing implementation.  The one
//! backing implementation provided here, [`bigint_classgroup::BigintClassGroup`],
//! stores its coefficients as `num_bigint::BigInt`.

use num_integer::Integer;
use num_traits::{Signed, ToPrimitive};
use std::{
    fmt::{Debug, Display},
    hash::Hash,
    ops::{Add, Mul, MulAssign, Neg, Shl, Shr, Sub},
};

pub mod bigint_classgroup;

pub use self::bigint_classgroup::BigintClassGroup;

/// An arbitrary-precision signed integer, as required by class group
/// arithmetic and by the verifiable delay functions built on top of it.
///
/// The operator bounds cover what generic protocol code needs; everything
/// with less common semantics (two's-complement byte I/O, modular
/// exponentiation, deterministic Miller–Rabin) is a named method.
pub trait BigNum:
    Sized
    + Clone
    + Default
    + Debug
    + Display
    + Hash
    + Integer
    + Signed
    + ToPrimitive
    + Neg<Output = Self>
    + From<u64>
    + From<i64>
    + Add<u64, Output = Self>
    + Sub<u64, Output = Self>
    + Shl<usize, Output = Self>
    + Shr<usize, Output = Self>
    + for<'a> Mul<&'a Self, Output = Self>
{
    /// Interprets `buf` as an **unsigned** big-endian integer.  An empty
    /// buffer denotes zero.
    fn from_unsigned_bytes_be(buf: &[u8]) -> Self;

    /// Interprets `buf` as a two's-complement big-endian **signed**
    /// integer: the high bit of the first byte is the sign.  An empty
    /// buffer denotes zero.
    fn from_signed_bytes_be(buf: &[u8]) -> Self;

    /// Writes `self` right-aligned into `out` in two's-complement
    /// big-endian form.  Unused leading bytes are `0x00` for non-negative
    /// values and `0xFF` for negative ones, so the result round-trips
    /// through [`BigNum::from_signed_bytes_be`] exactly.
    ///
    /// Fails with the minimum required width if `out` is too small.
    fn write_signed_bytes_be(&self, out: &mut [u8]) -> Result<(), usize>;

    /// The number of bits in `|self|`; zero for zero.
    fn bit_length(&self) -> usize;

    /// Sets bit `bit` (zero-indexed from the least significant).
    fn setbit(&mut self, bit: usize);

    /// `self = base^exponent mod modulus`.  The result is non-negative.
    /// The exponent must be non-negative and the modulus positive.
    fn mod_powm(&mut self, base: &Self, exponent: &Self, modulus: &Self);

    /// Miller–Rabin primality check using the first `iterations` primes as
    /// witnesses, preceded by small-prime trial division.  Deterministic:
    /// no randomness is consumed.
    fn probab_prime(&self, iterations: u32) -> bool;
}

/// Extra operations needed by the discriminant sieve.
pub trait BigNumExt: BigNum {
    /// Floor remainder of `self` by `m`.
    fn frem_u32(&self, m: u32) -> u32;
    /// Ceiling remainder: `m⋅⌈self/m⌉ − self`, i.e. `(−self) mod m`.
    fn crem_u16(&self, m: u16) -> u16;
}

/// An element of a class group: a reduced binary quadratic form of a fixed
/// negative discriminant.
///
/// `&x * &y` composes two forms into a new one; the `multiply`, `square`,
/// `repeated_square` and `pow` methods mutate in place.  Every operation
/// preserves the discriminant and returns reduced forms.
pub trait ClassGroup:
    Sized + Clone + PartialEq + Eq + Debug + Hash + for<'a> MulAssign<&'a Self>
{
    type BigNum: BigNumExt;

    /// Constructs a form from `a`, `b`, and the discriminant, deriving
    /// `c = (b² − D)/(4a)` and reducing.
    ///
    /// # Panics
    ///
    /// Panics if `a ≤ 0` or if `4a` does not divide `b² − D`.  Callers with
    /// untrusted input must use [`ClassGroup::from_bytes`] instead.
    fn from_ab_discriminant(a: Self::BigNum, b: Self::BigNum, discriminant: Self::BigNum) -> Self;

    /// Deserializes a form from the fixed-width wire format produced by
    /// [`ClassGroup::serialize`]: `a` followed by `b`, each two's-complement
    /// big-endian in half the buffer.  Returns `None` if the bytes do not
    /// describe a form of the given discriminant.
    fn from_bytes(buf: &[u8], discriminant: Self::BigNum) -> Option<Self>;

    /// The principal form: the group identity for `discriminant`.
    fn identity_for_discriminant(discriminant: Self::BigNum) -> Self;

    /// The identity of the group `self` belongs to.
    fn identity(&self) -> Self;

    fn discriminant(&self) -> &Self::BigNum;

    /// Serializes `self` into `buf`: `a` then `b`, each right-aligned
    /// two's-complement big-endian in `buf.len()/2` bytes.  `c` is not
    /// written; it is recomputed on deserialization.
    ///
    /// Fails with the minimum per-coordinate width if `buf` is too small
    /// (or of odd length).
    fn serialize(&self, buf: &mut [u8]) -> Result<(), usize>;

    /// The default total serialized size for this form's discriminant:
    /// `2·((bit_length(−D) + 16) >> 4)` bytes.
    fn serialized_size(&self) -> usize;

    /// `self = self · rhs`.
    fn multiply(&mut self, rhs: &Self);

    /// `self = self²` — identical to composing `self` with itself.
    fn square(&mut self);

    /// `iterations` successive in-place squarings.
    fn repeated_square(&mut self, iterations: u64) {
        for _ in 0..iterations {
            self.square()
        }
    }

    /// `self = self^exponent` by left-to-right binary exponentiation.
    /// An exponent of zero yields the identity; one is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `exponent` is negative.
    fn pow(&mut self, exponent: Self::BigNum);
}
