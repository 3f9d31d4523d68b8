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

use classgroup::ClassGroup;
use std::collections::HashMap;

/// Computes `x^(2^i)` for every requested iteration index `i`.
///
/// The indices are walked once in ascending order with a single running
/// form, so the cost is `max(indices)` squarings plus one clone per entry.
/// Duplicate indices collapse; an empty iterator yields an empty map.
pub fn iterate_squarings<V, U>(mut x: V, powers_to_calculate: U) -> HashMap<u64, V>
where
    V: ClassGroup,
    U: Iterator<Item = u64>,
{
    let mut powers_calculated = HashMap::new();
    let mut powers_to_calculate: Vec<u64> = powers_to_calculate.collect();
    powers_to_calculate.sort_unstable();

    let mut previous_power: u64 = 0;
    for &current_power in &powers_to_calculate {
        x.repeated_square(current_power - previous_power);
        powers_calculated.insert(current_power, x.clone());
        previous_power = current_power;
    }

    powers_calculated
}
