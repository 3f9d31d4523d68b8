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

//! Generates the constant tables used by the discriminant builder:
//!
//! * `M` — the residue-class modulus `8·3·5·7·11·13`.
//! * `RESIDUES` — every `r ∈ [0, M)` with `r ≡ 7 (mod 8)` and `r` coprime
//!   to the odd factors of `M`, so candidates land in classes that cannot
//!   be divisible by any factor of `M`.
//! * `SIEVE_INFO` — every odd prime `p < 2¹⁶` not dividing `M`, paired
//!   with `M⁻¹ mod p`, which turns "is `n + M·i` divisible by `p`" into a
//!   stride over sieve indices `i`.

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const ODD_FACTORS: [u64; 5] = [3, 5, 7, 11, 13];
const M: u64 = 8 * 3 * 5 * 7 * 11 * 13;
const SIEVE_PRIME_LIMIT: usize = 1 << 16;

fn small_primes() -> Vec<u64> {
    let mut composite = vec![false; SIEVE_PRIME_LIMIT];
    let mut primes = Vec::new();
    for n in 2..SIEVE_PRIME_LIMIT {
        if composite[n] {
            continue;
        }
        primes.push(n as u64);
        let mut multiple = n * n;
        while multiple < SIEVE_PRIME_LIMIT {
            composite[multiple] = true;
            multiple += n;
        }
    }
    primes
}

fn mod_inverse(a: u64, p: u64) -> u64 {
    let (mut old_r, mut r) = (i128::from(a % p), i128::from(p));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        let next = old_r - q * r;
        old_r = std::mem::replace(&mut r, next);
        let next = old_s - q * s;
        old_s = std::mem::replace(&mut s, next);
    }
    assert_eq!(old_r, 1, "{} is not invertible modulo {}", a, p);
    let mut inv = old_s % i128::from(p);
    if inv < 0 {
        inv += i128::from(p);
    }
    inv as u64
}

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest = Path::new(&out_dir).join("constants.rs");
    let mut out = BufWriter::new(File::create(&dest).expect("cannot create constants.rs"));

    let residues: Vec<u64> = (7..M)
        .step_by(8)
        .filter(|x| ODD_FACTORS.iter().all(|p| x % p != 0))
        .collect();

    let sieve_info: Vec<(u64, u64)> = small_primes()
        .into_iter()
        .filter(|&p| p > 2 && M % p != 0)
        .map(|p| (p, mod_inverse(M % p, p)))
        .collect();

    writeln!(out, "const M: u32 = {};", M).unwrap();
    writeln!(out, "static RESIDUES: [u32; {}] = {:?};", residues.len(), residues).unwrap();
    writeln!(
        out,
        "static SIEVE_INFO: [(u16, u16); {}] = {:?};",
        sieve_info.len(),
        sieve_info
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
