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

//! Pietrzak's VDF: the halving protocol.
//!
//! Each round publishes the midpoint `μ = x^(2^(t/2))` of the remaining
//! squaring chain, folds a Fiat–Shamir challenge `r` into both endpoints
//! (`x ← x^r·μ`, `y ← μ^r·y`), and halves `t`.  The proof is the sequence
//! of midpoints; the verifier replays the folding and checks the short
//! chain that remains.

use super::proof_of_time::iterate_squarings;
use classgroup::{BigNum, BigNumExt, BigintClassGroup, ClassGroup};
use num_bigint::BigInt;
use sha2::{digest::FixedOutput, Digest, Sha256};
use std::{collections::HashMap, hash::Hash, ops::Mul};

use super::InvalidIterations as Bad;

/// How far from the tail of the halving schedule the protocol stops.  The
/// last `δ` halvings are cheaper to verify directly than to prove.
const DELTA: usize = 8;

#[derive(Debug, Clone)]
pub struct PietrzakVDF {
    int_size_bits: u16,
}

/// Parameters for a Pietrzak VDF: the integer width in bits.  Widths of
/// 256, 512, 1024 and 2048 are what callers use in practice.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Debug)]
pub struct PietrzakVDFParams(pub u16);

impl super::VDFParams for PietrzakVDFParams {
    type VDF = PietrzakVDF;
    fn new(self) -> Self::VDF {
        PietrzakVDF {
            int_size_bits: self.0,
        }
    }
}

impl super::VDF for PietrzakVDF {
    fn check_difficulty(&self, difficulty: u64) -> Result<(), Bad> {
        if difficulty < 66 || difficulty & 1 != 0 {
            Err(Bad("Difficulty must be even and at least 66".to_owned()))
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
        Ok(create_proof_of_time_pietrzak::<BigInt, BigintClassGroup>(
            discriminant.clone(),
            difficulty,
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
        check_proof_of_time_pietrzak::<BigInt, BigintClassGroup>(
            discriminant.clone(),
            alleged_solution,
            difficulty,
            self.int_size_bits,
        )
        .map_err(|()| super::InvalidProof)
    }
}

/// How many rounds worth of intermediate powers to cache ahead of time:
/// `round((ln x − ln ln x + 0.25) / (2 ln 2))` for `x = (t/16)·ln 2`.
fn approximate_i(t: u64) -> u64 {
    let x = (t as f64 / 16.0) * std::f64::consts::LN_2;
    let w = x.ln() - x.ln().ln() + 0.25;
    (w / (2.0 * std::f64::consts::LN_2)).round() as u64
}

/// All non-empty subset sums of `numbers`.
fn sum_combinations<I: Iterator<Item = u64>>(numbers: I) -> Vec<u64> {
    let mut combinations = vec![0];
    for i in numbers {
        let mut new_combinations = combinations.clone();
        for j in combinations {
            new_combinations.push(i + j);
        }
        combinations = new_combinations;
    }
    combinations.retain(|&x| x != 0);
    combinations
}

/// The iteration indices the prover wants cached: every subset sum of the
/// first `approximate_i(t)` halvings of `t` (these are exactly the indices
/// the cached-μ construction reads), plus `t` itself for the output.
fn cache_indices_for_count(t: u64) -> Vec<u64> {
    let i = approximate_i(t);
    let mut curr_t = t;
    let mut intermediate_ts = Vec::with_capacity(i as usize);
    for _ in 0..i {
        curr_t >>= 1;
        intermediate_ts.push(curr_t);
        if curr_t & 1 == 1 {
            curr_t += 1;
        }
    }
    let mut indices = sum_combinations(intermediate_ts.into_iter());
    indices.sort_unstable();
    indices.dedup();
    indices.push(t);
    indices
}

/// Where the halving schedule for `t` stops: `delta` positions back from
/// the tail of the sequence `t, t/2, …, 2, 1` (halvings rounded up to
/// even).
fn calculate_final_t(t: u64, delta: usize) -> u64 {
    let mut curr_t = t;
    let mut ts = Vec::new();
    while curr_t != 2 {
        ts.push(curr_t);
        curr_t >>= 1;
        if curr_t & 1 == 1 {
            curr_t += 1;
        }
    }
    ts.push(2);
    ts.push(1);
    assert!(
        ts.len() >= delta,
        "difficulty too small for the halving protocol"
    );
    ts[ts.len() - delta]
}

/// The Fiat–Shamir challenge for one round: the low 16 bytes of
/// `SHA-256(serialize(x) ‖ serialize(y) ‖ serialize(μ))`, as an unsigned
/// integer.
///
/// `x` and `y` are the *initial* input and output of the whole protocol,
/// not the current round's folded values — the round state never enters
/// the hash.  Both sides must agree on this to interoperate.
fn generate_r_value<T, V>(x: &V, y: &V, mu: &V, int_size_bits: u16) -> T
where
    T: BigNum,
    V: ClassGroup<BigNum = T>,
{
    let element_len = 2 * ((usize::from(int_size_bits) + 16) >> 4);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; element_len];
    for element in &[x, y, mu] {
        element
            .serialize(&mut buf[..])
            .expect(super::INCORRECT_BUFFER_SIZE);
        hasher.input(&buf);
    }
    T::from_unsigned_bytes_be(&hasher.fixed_result()[..16])
}

/// Runs the halving rounds and returns the midpoints `μ₁ … μ_r`.
///
/// For the first `approximate_i(t)` rounds the round state
/// `x_j` stays expressible over the original `x`:
/// `x_j = ∏_{S ⊆ {0..j-1}} x^((∏_{k∉S} r_k) · 2^(Σ_{k∈S} ts_k))`,
/// so `μ_j = x_j^(2^half_t)` is assembled from cached powers — one term
/// per odd `numerator`, whose bits above the lowest choose, for each
/// earlier round, between contributing its `ts` to the iteration offset
/// (bit set) and its `r` to the exponent (bit clear).  Later rounds square
/// the folded `x_j` directly.
fn generate_proof<T, V>(
    x: &V,
    t: u64,
    delta: usize,
    y: &V,
    powers: &HashMap<u64, V>,
    int_size_bits: u16,
) -> Vec<V>
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T>,
    for<'a, 'b> &'a V: Mul<&'b V, Output = V>,
{
    let i = approximate_i(t);
    let final_t = calculate_final_t(t, delta);
    let mut mus = Vec::new();
    let mut rs: Vec<T> = Vec::new();
    let mut ts: Vec<u64> = Vec::new();

    let mut x_round = x.clone();
    let mut y_round = y.clone();
    let mut curr_t = t;
    let mut round_index = 0usize;

    while curr_t != final_t {
        debug_assert_eq!(curr_t & 1, 0);
        let half_t = curr_t >> 1;
        ts.push(half_t);

        let mu = if (round_index as u64) < i {
            let denominator: u64 = 1 << (round_index + 1);
            let num_bits = round_index;
            let mut mu = x.identity();
            let mut numerator: u64 = 1;
            while numerator < denominator {
                let mut t_sum = half_t;
                let mut r_prod = T::one();
                for b in 0..num_bits {
                    if numerator & (1 << (num_bits - b)) != 0 {
                        t_sum += ts[b];
                    } else {
                        r_prod = r_prod * &rs[b];
                    }
                }
                let mut term = powers[&t_sum].clone();
                term.pow(r_prod);
                mu *= &term;
                numerator += 2;
            }
            mu
        } else {
            let mut mu = x_round.clone();
            mu.repeated_square(half_t);
            mu
        };

        let r: T = generate_r_value(x, y, &mu, int_size_bits);

        x_round.pow(r.clone());
        x_round *= &mu;
        let mut mu_r = mu.clone();
        mu_r.pow(r.clone());
        y_round = &mu_r * &y_round;

        mus.push(mu);
        rs.push(r);

        curr_t >>= 1;
        if curr_t & 1 != 0 {
            curr_t += 1;
            y_round.square();
        }
        round_index += 1;
    }
    mus
}

/// Generates a proof of `iterations` sequential squarings starting from
/// `x = (2, 1, ·)`: `y ‖ μ₁ ‖ … ‖ μ_r`, each form in
/// `2·((int_size_bits + 16) >> 4)` bytes.
pub fn create_proof_of_time_pietrzak<T, V>(
    discriminant: T,
    iterations: u64,
    int_size_bits: u16,
) -> Vec<u8>
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T> + Eq + Hash,
    for<'a, 'b> &'a V: Mul<&'b V, Output = V>,
{
    let x = V::from_ab_discriminant(T::from(2u64), T::from(1u64), discriminant);
    let powers = iterate_squarings(x.clone(), cache_indices_for_count(iterations).into_iter());
    let y = powers[&iterations].clone();

    let mus = generate_proof(&x, iterations, DELTA, &y, &powers, int_size_bits);

    let element_len = 2 * ((usize::from(int_size_bits) + 16) >> 4);
    let mut out = vec![0u8; element_len * (mus.len() + 1)];
    y.serialize(&mut out[..element_len])
        .expect(super::INCORRECT_BUFFER_SIZE);
    for (mu, chunk) in mus.iter().zip(out[element_len..].chunks_mut(element_len)) {
        mu.serialize(chunk).expect(super::INCORRECT_BUFFER_SIZE);
    }
    out
}

/// Checks a proof blob: `y` followed by the round midpoints, each form in
/// `2·((int_size_bits + 16) >> 4)` bytes.
pub fn check_proof_of_time_pietrzak<T, V>(
    discriminant: T,
    proof_blob: &[u8],
    iterations: u64,
    int_size_bits: u16,
) -> Result<(), ()>
where
    T: BigNumExt,
    V: ClassGroup<BigNum = T>,
    for<'a, 'b> &'a V: Mul<&'b V, Output = V>,
{
    let element_len = 2 * ((usize::from(int_size_bits) + 16) >> 4);
    if proof_blob.is_empty() || proof_blob.len() % element_len != 0 {
        return Err(());
    }

    let x = V::from_ab_discriminant(T::from(2u64), T::from(1u64), discriminant.clone());
    let y = V::from_bytes(&proof_blob[..element_len], discriminant.clone()).ok_or(())?;

    let mut x_round = x.clone();
    let mut y_round = y.clone();
    let mut curr_t = iterations;
    for chunk in proof_blob[element_len..].chunks(element_len) {
        let mu = V::from_bytes(chunk, discriminant.clone()).ok_or(())?;
        let r: T = generate_r_value(&x, &y, &mu, int_size_bits);

        x_round.pow(r.clone());
        x_round *= &mu;
        let mut mu_r = mu;
        mu_r.pow(r);
        y_round *= &mu_r;

        curr_t >>= 1;
        if curr_t & 1 != 0 {
            curr_t += 1;
            y_round.square();
        }
    }

    // What remains is short enough to check by brute force.
    x_round.repeated_square(curr_t);
    if x_round == y_round {
        Ok(())
    } else {
        Err(())
    }
}

#[cfg(test)]
mod test {
    use super::super::{InvalidProof, VDFParams, VDF};
    use super::*;

    fn d256() -> BigInt {
        BigInt::parse_bytes(
            b"-94244082954491557865740412536462075406760295174154720908408968004709609548271",
            10,
        )
        .unwrap()
    }

    #[test]
    fn halving_schedule() {
        assert_eq!(calculate_final_t(66, DELTA), 66);
        assert_eq!(calculate_final_t(130, DELTA), 66);
        assert_eq!(calculate_final_t(258, DELTA), 66);
        assert_eq!(calculate_final_t(1024, DELTA), 128);
    }

    #[test]
    fn cache_sizing() {
        assert_eq!(approximate_i(66), 1);
        assert_eq!(approximate_i(1024), 2);
        assert_eq!(cache_indices_for_count(130), vec![65, 130]);
        assert_eq!(cache_indices_for_count(1024), vec![256, 512, 768, 1024]);
    }

    #[test]
    fn subset_sums() {
        let mut sums = sum_combinations([1u64, 2, 4].iter().cloned());
        sums.sort_unstable();
        assert_eq!(sums, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(sum_combinations(std::iter::empty()).is_empty());
    }

    #[test]
    fn difficulty_validation() {
        let vdf = PietrzakVDFParams(256).new();
        assert!(vdf.check_difficulty(66).is_ok());
        assert!(vdf.check_difficulty(64).is_err());
        assert!(vdf.check_difficulty(65).is_err());
        assert!(vdf.check_difficulty(67).is_err());
        assert!(vdf.check_difficulty(0).is_err());
        assert!(vdf.solve_with_discriminant(&d256(), 100).is_err());
        assert_eq!(
            vdf.verify_with_discriminant(&d256(), 100, &[]),
            Err(InvalidProof)
        );
    }

    #[test]
    fn known_proof_66() {
        // Difficulty 66 is the protocol floor: no rounds at all, the proof
        // is just y.
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve_with_discriminant(&d256(), 66).unwrap();
        assert_eq!(
            hex::encode(&proof),
            "006b93ca6edbb6cd2031cfad61cb0a0d18002981f46b363517a09a175a960a7b0b79"
        );
        vdf.verify_with_discriminant(&d256(), 66, &proof).unwrap();
    }

    #[test]
    fn known_proof_130() {
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve_with_discriminant(&d256(), 130).unwrap();
        assert_eq!(proof.len(), 68);
        assert_eq!(
            hex::encode(&proof),
            "0042d31449636e2402dc318be9c3d4eae000412e3666e697c98276c85c2f6a848157\
             00400c8e6db140c851eb0c4b03555138cfffcd58cf25a1a18cd340a1024b6d3c647b"
        );
        vdf.verify_with_discriminant(&d256(), 130, &proof).unwrap();
    }

    #[test]
    fn known_proof_258() {
        // 258 halves twice before hitting the schedule floor: exactly two
        // midpoints follow y.
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve_with_discriminant(&d256(), 258).unwrap();
        assert_eq!(proof.len(), 3 * 34);
        assert_eq!(
            hex::encode(&proof),
            "004f930349bb1716745b84da355e43dc33ffd8dc89a1a8a1dd10b698bc42843f6ba5\
             0021aea421ddab10e2a161df6960404839fff6ef98d01f5aeb09db86df8a6f50d179\
             0051d91ddaccd5af37e53bed3f9c87f98cffef630e9f8a50ca18a5ce43d883b679bf"
        );
        vdf.verify_with_discriminant(&d256(), 258, &proof).unwrap();
    }

    #[test]
    fn cached_and_direct_rounds_agree() {
        // 1024 needs three rounds, of which only the first two are in the
        // cached regime, so this exercises both μ constructions and the
        // odd-halving y adjustment (1024 → 512 → 256 → 128 stays even, so
        // also check a difficulty that goes odd).
        let vdf = PietrzakVDFParams(256).new();
        for &t in &[1024u64, 258, 1250] {
            let proof = vdf.solve_with_discriminant(&d256(), t).unwrap();
            vdf.verify_with_discriminant(&d256(), t, &proof).unwrap();
        }
    }

    #[test]
    fn solving_is_deterministic() {
        let vdf = PietrzakVDFParams(256).new();
        assert_eq!(
            vdf.solve_with_discriminant(&d256(), 258).unwrap(),
            vdf.solve_with_discriminant(&d256(), 258).unwrap()
        );
    }

    #[test]
    fn tampered_proofs_are_rejected() {
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve_with_discriminant(&d256(), 258).unwrap();
        for &byte in &[0usize, 37, 70, 101] {
            let mut bad = proof.clone();
            bad[byte] ^= 0x01;
            assert_eq!(
                vdf.verify_with_discriminant(&d256(), 258, &bad),
                Err(InvalidProof),
                "flipping a bit of byte {} must invalidate the proof",
                byte
            );
        }
    }

    #[test]
    fn truncated_proofs_are_rejected() {
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve_with_discriminant(&d256(), 258).unwrap();
        // dropping a whole μ keeps the length a multiple of the element
        // size but breaks the final equation
        assert_eq!(
            vdf.verify_with_discriminant(&d256(), 258, &proof[..68]),
            Err(InvalidProof)
        );
        assert_eq!(
            vdf.verify_with_discriminant(&d256(), 258, &proof[..50]),
            Err(InvalidProof)
        );
        assert_eq!(
            vdf.verify_with_discriminant(&d256(), 258, &[]),
            Err(InvalidProof)
        );
    }

    #[test]
    fn challenge_round_trip() {
        let vdf = PietrzakVDFParams(256).new();
        let proof = vdf.solve(b"\xaa\xbb\xcc", 258).unwrap();
        vdf.verify(b"\xaa\xbb\xcc", 258, &proof).unwrap();
        assert_eq!(vdf.verify(b"\xaa\xbb\xcd", 258, &proof), Err(InvalidProof));
    }
}
