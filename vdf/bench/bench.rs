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

use criterion::{criterion_group, criterion_main, Criterion};
use num_bigint::BigInt;
use std::hint::black_box;
use vdf::{PietrzakVDFParams, VDFParams, WesolowskiVDFParams, VDF};

fn d256() -> BigInt {
    BigInt::parse_bytes(
        b"-94244082954491557865740412536462075406760295174154720908408968004709609548271",
        10,
    )
    .unwrap()
}

fn benchmarks(c: &mut Criterion) {
    let discriminant = d256();
    let wesolowski = WesolowskiVDFParams(256).new();
    let pietrzak = PietrzakVDFParams(256).new();
    let wesolowski_proof = wesolowski
        .solve_with_discriminant(&discriminant, 1000)
        .unwrap();
    let pietrzak_proof = pietrzak
        .solve_with_discriminant(&discriminant, 1000)
        .unwrap();

    c.bench_function("wesolowski solve t=1000", |b| {
        b.iter(|| {
            wesolowski
                .solve_with_discriminant(black_box(&discriminant), 1000)
                .unwrap()
        })
    });
    c.bench_function("wesolowski verify t=1000", |b| {
        b.iter(|| {
            wesolowski
                .verify_with_discriminant(&discriminant, 1000, black_box(&wesolowski_proof))
                .unwrap()
        })
    });
    c.bench_function("pietrzak solve t=1000", |b| {
        b.iter(|| {
            pietrzak
                .solve_with_discriminant(black_box(&discriminant), 1000)
                .unwrap()
        })
    });
    c.bench_function("pietrzak verify t=1000", |b| {
        b.iter(|| {
            pietrzak
                .verify_with_discriminant(&discriminant, 1000, black_box(&pietrzak_proof))
                .unwrap()
        })
    });
    c.bench_function("create_discriminant 512", |b| {
        b.iter(|| vdf::create_discriminant::<BigInt>(black_box(b"\xaa"), 512))
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
