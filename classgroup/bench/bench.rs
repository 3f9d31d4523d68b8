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

use classgroup::{BigintClassGroup, ClassGroup};
use criterion::{criterion_group, criterion_main, Criterion};
use num_bigint::BigInt;
use std::hint::black_box;

fn generator() -> BigintClassGroup {
    let d = BigInt::parse_bytes(
        b"-94244082954491557865740412536462075406760295174154720908408968004709609548271",
        10,
    )
    .unwrap();
    BigintClassGroup::from_ab_discriminant(2u64.into(), 1u64.into(), d)
}

fn benchmarks(c: &mut Criterion) {
    let mut x = generator();
    x.repeated_square(16);
    let y = {
        let mut y = x.clone();
        y.square();
        y
    };

    c.bench_function("square 256-bit", |b| {
        b.iter(|| {
            let mut f = black_box(x.clone());
            f.square();
            f
        })
    });
    c.bench_function("multiply 256-bit", |b| {
        b.iter(|| black_box(&x) * black_box(&y))
    });
    c.bench_function("repeated_square 100", |b| {
        b.iter(|| {
            let mut f = black_box(x.clone());
            f.repeated_square(100);
            f
        })
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
