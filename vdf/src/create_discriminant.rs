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

//! Deterministic construction of a discriminant from a seed.
//!
//! The discriminant of a VDF instance is a negative prime `≡ 1 (mod 8)`.
//! Rather than shipping one, it is searched for deterministically: the seed
//! is expanded to `length` bits of entropy, the candidate is shifted into a
//! residue class that no small prime can divide, and a windowed sieve walks
//! the class until Miller–Rabin accepts.  The `M`/`RESIDUES`/`SIEVE_INFO`
//! tables are generated by `build.rs`.

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

use bit_vec::BitVec;
use classgroup::BigNumExt;
use sha2::{digest::FixedOutput, Digest, Sha256};

/// Expands `seed` into `byte_count` bytes: SHA-256 of `seed` followed by a
/// big-endian 2-byte counter, concatenated until enough bytes exist.
fn random_bytes_from_seed(seed: &[u8], byte_count: usize) -> Vec<u8> {
    assert!(byte_count <= 32 * ((1 << 16) - 1));
    let mut blob = Vec::with_capacity(byte_count);
    let mut extra: u16 = 0;
    while blob.len() < byte_count {
        let mut hasher = Sha256::new();
        hasher.input(seed);
        hasher.input(&[(extra >> 8) as u8, extra as u8]);
        blob.extend_from_slice(&hasher.fixed_result()[..]);
        extra += 1;
    }
    blob.truncate(byte_count);
    blob
}

/// Creates a discriminant from a seed and a bit length.
///
/// The result is deterministic in `(seed, length)`, negative, `≡ 1 (mod 8)`,
/// of roughly `length` bits, and `−D` is prime except with negligible
/// probability.
pub fn create_discriminant<T: BigNumExt>(seed: &[u8], length: u16) -> T {
    // Bits of `length` that do not fill a whole byte.
    let extra: u8 = (length as u8) & 7;
    let byte_count = ((usize::from(length) + 7) >> 3) + 2;
    let entropy = random_bytes_from_seed(seed, byte_count);
    let (candidate_bytes, last_2) = entropy.split_at(byte_count - 2);
    let numerator = (usize::from(last_2[0]) << 8) | usize::from(last_2[1]);

    // Trim to exactly `length` bits and force the top bit.
    let mut n = T::from_unsigned_bytes_be(candidate_bytes) >> usize::from((8 - extra) & 7);
    n.setbit(usize::from(length - 1));
    debug_assert!(n >= T::zero());

    // Move n into the selected residue class: n ≡ r (mod M) with
    // r ≡ 7 (mod 8) and r coprime to the odd factors of M.
    let residue = RESIDUES[numerator % RESIDUES.len()];
    let rem = n.frem_u32(M);
    if residue > rem {
        n = n + u64::from(residue - rem);
    } else {
        n = n - u64::from(rem - residue);
    }

    loop {
        // Mark every i < 2¹⁶ for which some sieve prime divides n + M·i.
        // p | n + M·i  ⇔  i ≡ −n·M⁻¹ (mod p), and −n mod p is crem_u16.
        let mut sieve = BitVec::from_elem(1 << 16, false);
        for &(p, q) in SIEVE_INFO.iter() {
            let mut i = (usize::from(n.crem_u16(p)) * usize::from(q)) % usize::from(p);
            while i < sieve.len() {
                sieve.set(i, true);
                i += usize::from(p);
            }
        }

        for (i, marked) in sieve.iter().enumerate() {
            if marked {
                continue;
            }
            let offset = u64::from(M) * i as u64;
            n = n + offset;
            debug_assert_eq!(n.frem_u32(8), 7);
            if n.probab_prime(2) {
                return -n;
            }
            n = n - offset;
        }

        // Window exhausted; slide it and sieve again.
        n = n + u64::from(M) * (1 << 16);
    }
}
