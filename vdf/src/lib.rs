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

//! An implementation of Verifiable Delay Functions (VDFs) in Rust.
//!
//! A VDF maps a challenge and a difficulty `t` to a proof that can only be
//! produced by `t` *sequential* squarings in the class group of a negative
//! prime discriminant, yet verifies in far less than `t` work.  Two
//! constructions are provided behind the same [`VDF`] trait:
//!
//! * [`PietrzakVDF`] — the halving protocol.  Proofs contain `O(log t)`
//!   group elements.  Difficulties must be even and at least 66.
//! * [`WesolowskiVDF`] — the prime-challenge quotient protocol.  Proofs
//!   are a single group element next to the output.  Any difficulty from 1
//!   up is accepted.
//!
//! Everything is deterministic: the same `(challenge, difficulty)` pair
//! yields byte-identical proofs.  The discriminant is normally derived from
//! the challenge by [`create_discriminant`]; callers that already hold a
//! suitable discriminant (negative, `≡ 1 (mod 8)`, `−D` prime) can pass it
//! directly through the `_with_discriminant` entry points.
//!
//! ```rust
//! use vdf::{PietrzakVDFParams, VDFParams, WesolowskiVDFParams, VDF};
//!
//! let pietrzak_vdf = PietrzakVDFParams(512).new();
//! let solution = pietrzak_vdf.solve(b"\xaa", 66).unwrap();
//! assert!(pietrzak_vdf.verify(b"\xaa", 66, &solution).is_ok());
//!
//! let wesolowski_vdf = WesolowskiVDFParams(512).new();
//! let solution = wesolowski_vdf.solve(b"\xaa", 100).unwrap();
//! assert!(wesolowski_vdf.verify(b"\xaa", 100, &solution).is_ok());
//! ```

use num_bigint::BigInt;
use std::{error::Error, fmt};

mod create_discriminant;
mod proof_of_time;
mod proof_pietrzak;
mod proof_wesolowski;

pub use crate::create_discriminant::create_discriminant;
pub use crate::proof_of_time::iterate_squarings;
pub use crate::proof_pietrzak::{PietrzakVDF, PietrzakVDFParams};
pub use crate::proof_wesolowski::{WesolowskiVDF, WesolowskiVDFParams};

/// Message for the `expect` on serializing into a buffer we sized ourselves.
pub(crate) const INCORRECT_BUFFER_SIZE: &str =
    "serialization failed: incorrect buffer size (this is a bug)";

/// An invalid proof of sequential work.
///
/// Deliberately opaque: whether the blob had the wrong length, failed to
/// deserialize, or failed the protocol equation is not disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidProof;

impl fmt::Display for InvalidProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid proof")
    }
}

impl Error for InvalidProof {}

/// A difficulty that the chosen construction cannot accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIterations(String);

impl fmt::Display for InvalidIterations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for InvalidIterations {}

/// Parameters from which a [`VDF`] is built.  The only parameter either
/// construction takes is the integer width, in bits, used on the wire.
pub trait VDFParams: Copy + Clone {
    type VDF: VDF;
    fn new(self) -> Self::VDF;
}

/// A Verifiable Delay Function.
pub trait VDF: fmt::Debug {
    /// Checks that `difficulty` is valid for this construction.  Cheap;
    /// called by `solve` and `verify` before any heavy work.
    fn check_difficulty(&self, difficulty: u64) -> Result<(), InvalidIterations>;

    /// Solves with the discriminant derived from `challenge`.
    fn solve(&self, challenge: &[u8], difficulty: u64) -> Result<Vec<u8>, InvalidIterations>;

    /// Solves over the class group of the given discriminant, which must be
    /// negative, `≡ 1 (mod 8)`, and have `−D` prime.
    fn solve_with_discriminant(
        &self,
        discriminant: &BigInt,
        difficulty: u64,
    ) -> Result<Vec<u8>, InvalidIterations>;

    /// Verifies `alleged_solution` with the discriminant derived from
    /// `challenge`.
    fn verify(
        &self,
        challenge: &[u8],
        difficulty: u64,
        alleged_solution: &[u8],
    ) -> Result<(), InvalidProof>;

    /// Verifies over the class group of the given discriminant.
    fn verify_with_discriminant(
        &self,
        discriminant: &BigInt,
        difficulty: u64,
        alleged_solution: &[u8],
    ) -> Result<(), InvalidProof>;
}
