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

//! Wesolowski's VDF: a single-element proof `π = x^⌊2^t/B⌋` for a
//! Fiat–Shamir prime challenge `B`, checked as `π^B · x^(2^t mod B) = y`.

use super::proof_of_time::iterate_squarings;
use classgroup::{BigNum, BigNumExt, BigintClassGroup, ClassGroup};
use num_bigint::BigInt;
use sha2::{digest::FixedOutput, Digest, Sha256};
use std::{cmp::Eq, hash::Hash, ops::Mul};

use super::InvalidIterations as Bad;

#[derive(Debug, Clone)]
pub struct WesolowskiVDF {
    int_size_bits: u16,
}

#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Debug)]
pub struct WesolowskiVDFParams(pub u16);

impl super::VDFParams for WesolowskiVDFParams {
    type VDF = WesolowskiVDF;
    fn new(self) -> Self::VDF {
        WesolowskiVDF {
            int_size_bits: self.0,
        }
    }
}

impl super::VDF for WesolowskiVDF {
    fn check_difficulty(&self, difficulty: u64) -> Result<(), Bad> {
        if difficulty == 0 {
            Err(Bad("Difficulty must be positive".to_owned()))
        } else if difficulty > usize::MAX as u64 {
            Err(Bad("Cannot have more than usize::MAX iterations".to_owned()))
        } else {
            Ok(())
        }
    }

    fn solve(&self, challenge: &[u8], difficulty: u64) -> Result<Vec<u8>, Bad> {
        let discriminant: BigInt = super::create_discriminant(challenge, self.int_size_bits);
        self.solve_with_discriminant(&discriminant, difficulty)
    }

    fn solve_with_discriminant(
        &self,
        discriminant: &BigInt,
        difficulty: u64,
    ) -> Result<Vec<u8>, Bad> {
        self.check_difficulty(difficulty)?;
        Ok(create_proof_of_time_wesolowski::<BigInt, BigintClassGroup>(
            discriminant.clone(),
            difficulty as usize,
            self.int_size_bits,
        ))
    }

    fn verify(
        &self,
        challenge: &[u8],
        difficulty: u64,
        alleged_solution: &[u8],
    ) -> Result<(), super::InvalidProof> {
        let discriminant: BigInt = super::create_discriminant(challenge, self.int_size_bits);
        self.verify_with_discriminant(&discriminant, difficulty, alleged_solution)
    }

    fn verify_with_discriminant(
        &self,
        discriminant: &BigInt,
        difficulty: u64,
        alleged_solution: &[u8],
    ) -> Result<(), super::InvalidProof> {
        self.check_difficulty(difficulty)
            .map_err(|_| super::InvalidProof)?;
        check_proof_of_time_wesolowski::<BigInt, BigintClassGroup>(
            discriminant.clone(),
            alleged_solution,
            difficulty,
            self.int_size_bits,
        )
        .map_err(|()| super::InvalidProof)
    }
}

/// To quote the original Python code:
///
/// > Create `L` and `k` parameters from papers, based on how many iterations
/// > need to be performed, and how much memory should be used.
pub fn approximate_parameters(t: f64) -> (usize, u8, u64) {
    let log_memory = (10_000_000.0f64).log2();
    let log_t = (t as f64).log2();
    let l = if log_t - log_memory > 0. {
        2.0f64.powf(log_memory - 20.).ceil()
    } else {
        1.
    };

    let intermediate = t * (2.0f64).ln() / (2.0 * l);
    let k = (intermediate.ln() - intermediate.ln().ln() + 0.25)
        .round()
        .max(1.);

    let w = (t / (t / k + l * (2.0f64).powf(k + 1.0)) - 2.0).floor();
    (l as _, k as _, w as _)
}

fn u64_to_bytes(q: u64) -> [u8; 8] {
    [
        (q >> 56) as u8,
        (q >> 48) as u8,
        (q >> 40) as u8,
        (q >> 32) as u8,
        (q >> 24) as u8,
        (q >> 16) as u8,
        (q >> 8) as u8,
        q as u8,
    ]
}

/// Quote:
///
/// > Creates a random prime based on input s.
fn hash_prime<T: BigNum>(seed: &[&[u8]]) -> T {
    let mut j = 0u64;
    loop {
        let mut hasher = Sha256::new();
        hasher.input(b"prime");
        hasher.input(u64_to_bytes(j));
        for i in seed {
            hasher.input(i);
        }
        let n = T::from_unsigned_bytes_be(&hasher.fixed_result()[..16]);
        if n.probab_prime(2) {
            break n;
        }
        j += 1;
    }
}

/// The `k`-bit digit of `⌊2^t / b⌋` at digit position `i` (counting from
/// the least significant base-`2^k` digit).
fn get_block<T: BigNum>(i: u64, k: usize, t: u64, b: &T) -> usize {
    let mut res = T::zero();
    res.mod_powm(&T::from(2u64), &T::from(t - (k as u64) * (i + 1)), b);
    (res << k)
        .div_floor(b)
        .to_usize()
        .expect("block is less than 2^k")
}

/// Evaluates `x^⌊2^t / b⌋` from the cached powers `powers[i·k·l] = x^(2^ikl)`
/// by windowed long division: the quotient is consumed `k` bits at a time,
/// `l` digit positions per pass, and each pass buckets the cached powers by
/// digit value before folding the buckets in through the `k = k₀ + k₁` split.
fn eval_optimized<T, V, U>(x: &V, b: &T, t: u64, k: u8, l: usize, powers: &U) -> V
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T>,
    U: for<'a> std::ops::Index<&'a u64, Output = V>,
{
    let k = usize::from(k);
    let k1 = k / 2;
    let k0 = k - k1;
    let kl = (k * l) as u64;
    let mut pi = x.identity();
    for j in (0..l).rev() {
        pi.pow(T::from(1u64) << k);

        let mut ys: Vec<V> = vec![x.identity(); 1 << k];
        for i in 0..=t / kl {
            let position = i * l as u64 + j as u64;
            if t < (k as u64) * (position + 1) {
                continue;
            }
            let block = get_block(position, k, t, b);
            ys[block] *= &powers[&(i * kl)];
        }

        for b1 in 0..1usize << k1 {
            let mut z = x.identity();
            for b0 in 0..1usize << k0 {
                z *= &ys[(b1 << k0) | b0];
            }
            z.pow(T::from((b1 << k0) as u64));
            pi *= &z;
        }
        for b0 in 0..1usize << k0 {
            let mut z = x.identity();
            for b1 in 0..1usize << k1 {
                z *= &ys[(b1 << k0) | b0];
            }
            z.pow(T::from(b0 as u64));
            pi *= &z;
        }
    }
    pi
}

/// Generates a proof of `iterations` sequential squarings starting from
/// `x = (2, 1, ·)`: `y ‖ π`, each form in `2·((int_size_bits + 16) >> 4)`
/// bytes.
pub fn create_proof_of_time_wesolowski<T, V>(
    discriminant: T,
    iterations: usize,
    int_size_bits: u16,
) -> Vec<u8>
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T> + Eq + Hash,
    for<'a, 'b> &'a V: Mul<&'b V, Output = V>,
{
    let x = V::from_ab_discriminant(T::from(2u64), T::from(1u64), discriminant);
    assert!((iterations as u128) < (1u128 << 53));

    let (l, k, _) = approximate_parameters(iterations as f64);
    let q = l.checked_mul(k as usize).expect("bug");

    let powers = iterate_squarings(
        x.clone(),
        (0..=iterations / q + 1)
            .map(|i| (i * q) as u64)
            .chain(Some(iterations as u64)),
    );
    let y = &powers[&(iterations as u64)];

    let element_len = 2 * ((usize::from(int_size_bits) + 16) >> 4);
    let mut x_buf = vec![0u8; element_len];
    x.serialize(&mut x_buf[..])
        .expect(super::INCORRECT_BUFFER_SIZE);
    let mut y_buf = vec![0u8; element_len];
    y.serialize(&mut y_buf[..])
        .expect(super::INCORRECT_BUFFER_SIZE);

    let b: T = hash_prime(&[&x_buf[..], &y_buf[..]]);
    let proof = eval_optimized(&x, &b, iterations as u64, k, l, &powers);

    let mut proof_buf = vec![0u8; element_len];
    proof
        .serialize(&mut proof_buf[..])
        .expect(super::INCORRECT_BUFFER_SIZE);
    y_buf.extend_from_slice(&proof_buf);
    y_buf
}

/// Verify a proof, according to the Wesolowski paper.
pub fn verify_proof<T: BigNum, V: ClassGroup<BigNum = T>>(
    mut x: V,
    y: &V,
    mut proof: V,
    t: u64,
    int_size_bits: usize,
) -> Result<(), ()> {
    let element_len = 2 * ((int_size_bits + 16) >> 4);
    let mut x_buf = vec![0u8; element_len];
    x.serialize(&mut x_buf[..])
        .expect(super::INCORRECT_BUFFER_SIZE);
    let mut y_buf = vec![0u8; element_len];
    y.serialize(&mut y_buf[..])
        .expect(super::INCORRECT_BUFFER_SIZE);
    let b = hash_prime(&[&x_buf[..], &y_buf[..]]);
    let mut r = T::zero();
    r.mod_powm(&T::from(2u64), &T::from(t), &b);
    proof.pow(b);
    x.pow(r);
    proof.multiply(&x);
    if &proof == y {
        Ok(())
    } else {
        Err(())
    }
}

/// Checks a proof blob: exactly `4·((int_size_bits + 16) >> 4)` bytes,
/// `y` followed by `π`.
pub fn check_proof_of_time_wesolowski<T, V>(
    discriminant: T,
    proof_blob: &[u8],
    iterations: u64,
    int_size_bits: u16,
) -> Result<(), ()>
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T>,
{
    if (usize::MAX - 16) < int_size_bits.into() {
        return Err(());
    }
    let int_size = (usize::from(int_size_bits) + 16) >> 4;
    if int_size * 4 != proof_blob.len() {
        return Err(());
    }

    let x = V::from_ab_discriminant(T::from(2u64), T::from(1u64), discriminant.clone());
    let (result_bytes, proof_bytes) = proof_blob.split_at(2 * int_size);
    let proof = V::from_bytes(proof_bytes, discriminant.clone()).ok_or(())?;
    let y = V::from_bytes(result_bytes, discriminant).ok_or(())?;

    verify_proof(x, &y, proof, iterations, int_size_bits.into())
}
