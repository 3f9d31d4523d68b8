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

//! [`BigNum`] and [`BigNumExt`] for `num_bigint::BigInt`.

use crate::{BigNum, BigNumExt};
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Trial divisors tried before the witness loop.
const SMALL_PRIMES: [u64; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Deterministic Miller–Rabin witnesses: the first fifteen primes.  Callers
/// select how many are consulted.
const WITNESSES: [u64; 15] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

impl BigNum for BigInt {
    fn from_unsigned_bytes_be(buf: &[u8]) -> Self {
        BigInt::from_bytes_be(Sign::Plus, buf)
    }

    fn from_signed_bytes_be(buf: &[u8]) -> Self {
        BigInt::from_signed_bytes_be(buf)
    }

    fn write_signed_bytes_be(&self, out: &mut [u8]) -> Result<(), usize> {
        let bytes = self.to_signed_bytes_be();
        if bytes.len() > out.len() {
            return Err(bytes.len());
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let split = out.len() - bytes.len();
        for byte in &mut out[..split] {
            *byte = fill;
        }
        out[split..].copy_from_slice(&bytes);
        Ok(())
    }

    fn bit_length(&self) -> usize {
        self.bits() as usize
    }

    fn setbit(&mut self, bit: usize) {
        self.set_bit(bit as u64, true)
    }

    fn mod_powm(&mut self, base: &Self, exponent: &Self, modulus: &Self) {
        *self = base.modpow(exponent, modulus)
    }

    fn probab_prime(&self, iterations: u32) -> bool {
        let two = BigInt::from(2u64);
        if self < &two {
            return false;
        }
        for &p in &SMALL_PRIMES {
            let p = BigInt::from(p);
            if *self == p {
                return true;
            }
            if (self % &p).is_zero() {
                return false;
            }
        }
        // self is odd and > 97²: write self − 1 = d·2^s.
        let n_minus_1: BigInt = self - 1u64;
        let s = n_minus_1.trailing_zeros().expect("nonzero");
        let d: BigInt = &n_minus_1 >> s as usize;
        'witness: for &a in WITNESSES.iter().take(iterations as usize) {
            let mut x = BigInt::from(a).modpow(&d, self);
            if x.is_one() || x == n_minus_1 {
                continue;
            }
            for _ in 0..s - 1 {
                x = x.modpow(&two, self);
                if x == n_minus_1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

impl BigNumExt for BigInt {
    fn frem_u32(&self, m: u32) -> u32 {
        self.mod_floor(&BigInt::from(m))
            .to_u32()
            .expect("remainder fits the modulus")
    }

    fn crem_u16(&self, m: u16) -> u16 {
        let r = self.frem_u32(u32::from(m)) as u16;
        if r == 0 {
            0
        } else {
            m - r
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BigNum;

    #[test]
    fn signed_bytes_round_trip() {
        for &v in &[0i64, 1, -1, 127, 128, -128, -129, 255, 256, -255, -256, i64::MAX, i64::MIN] {
            let n = BigInt::from(v);
            let mut buf = [0u8; 17];
            n.write_signed_bytes_be(&mut buf).unwrap();
            assert_eq!(<BigInt as BigNum>::from_signed_bytes_be(&buf), n, "value {}", v);
        }
    }

    #[test]
    fn signed_bytes_sign_fill() {
        let mut buf = [0u8; 4];
        BigInt::from(-1i64).write_signed_bytes_be(&mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF]);
        BigInt::from(1i64).write_signed_bytes_be(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 1]);
    }

    #[test]
    fn signed_bytes_width_check() {
        let mut buf = [0u8; 1];
        // 128 needs two bytes in two's complement
        assert_eq!(BigInt::from(128u64).write_signed_bytes_be(&mut buf), Err(2));
        assert_eq!(BigInt::from(127u64).write_signed_bytes_be(&mut buf), Ok(()));
    }

    #[test]
    fn empty_buffer_is_zero() {
        assert!(<BigInt as BigNum>::from_signed_bytes_be(&[]).is_zero());
        assert!(<BigInt as BigNum>::from_unsigned_bytes_be(&[]).is_zero());
    }

    #[test]
    fn primality_small() {
        for &(n, expected) in &[
            (0i64, false),
            (1, false),
            (2, true),
            (3, true),
            (4, false),
            (97, true),
            (98, false),
            (7919, true),
            (7917, false),
        ] {
            assert_eq!(BigInt::from(n).probab_prime(10), expected, "n = {}", n);
        }
    }

    #[test]
    fn primality_large() {
        // 2¹²⁷ − 1 is a Mersenne prime; 2⁶⁷ − 1 famously is not.
        let m127: BigInt = (BigInt::from(1u64) << 127) - 1u64;
        assert!(m127.probab_prime(10));
        let m67: BigInt = (BigInt::from(1u64) << 67) - 1u64;
        assert!(!m67.probab_prime(10));
    }

    #[test]
    fn ceiling_remainder() {
        let n = BigInt::from(10u64);
        assert_eq!(n.frem_u32(7), 3);
        assert_eq!(n.crem_u16(7), 4);
        assert_eq!(BigInt::from(14u64).crem_u16(7), 0);
    }

    #[test]
    fn bit_length_and_setbit() {
        assert_eq!(BigInt::zero().bit_length(), 0);
        assert_eq!(BigInt::from(255u64).bit_length(), 8);
        assert_eq!(BigInt::from(256u64).bit_length(), 9);
        let mut n = BigInt::zero();
        n.setbit(39);
        assert_eq!(n, BigInt::from(1u64) << 39);
    }
}
