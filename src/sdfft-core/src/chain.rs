// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Radix chain composition.
//!
//! The chain owns the stage arena and the wiring: depth schedule per
//! decimation order, combine roles per radix, the delayed-enable skew each
//! stage needs to stay aligned with its data, and the subset of stages a
//! runtime-selected size keeps active. Bypassed stages are skipped
//! entirely and contribute no latency.

use crate::numeric::StageKernel;
use crate::params::{Decimation, Direction, FftParams, Radix};
use crate::stage::{SdfStage, StageRole};

pub struct RadixChain<K: StageKernel> {
    stages: Vec<SdfStage<K>>,
    /// Indices of the active stages in flow order.
    active: Vec<usize>,
    latency: usize,
    radix: Radix,
    decimation: Decimation,
    adder_regs: usize,
    mult_regs: usize,
    full_runtime: bool,
}

impl<K: StageKernel> RadixChain<K> {
    /// Build the full-size chain for a validated configuration.
    pub fn build(params: &FftParams, kernel: &K) -> Self {
        let n = params.stages();
        let mut stages = Vec::with_capacity(n);
        for j in 0..n {
            let depth = match params.decimation {
                Decimation::InFrequency => 1usize << (n - 1 - j),
                Decimation::InTime => 1usize << j,
            };
            stages.push(SdfStage::new(
                kernel,
                j,
                depth,
                role_for(params.radix, j, n, depth),
                params.decimation,
                params.mem_threshold,
                params.adder_regs,
                params.mult_regs,
            ));
        }
        let mut chain = Self {
            stages,
            active: Vec::new(),
            latency: 0,
            radix: params.radix,
            decimation: params.decimation,
            adder_regs: params.adder_regs,
            mult_regs: params.mult_regs,
            full_runtime: params.full_runtime_radix22,
        };
        chain.configure(n as u8, kernel);
        chain
    }

    /// Select the active size. The active stages are those whose delay
    /// depth is below the selected size; for the fully-runtime radix-2^2
    /// chain the group roles are re-derived to match.
    pub fn configure(&mut self, log2_size: u8, kernel: &K) {
        let n_max = self.stages.len();
        let n = log2_size as usize;
        self.active = match self.decimation {
            Decimation::InFrequency => (n_max - n..n_max).collect(),
            Decimation::InTime => (0..n).collect(),
        };
        if self.radix == Radix::Radix22 && self.full_runtime {
            for (p, &j) in self.active.iter().enumerate() {
                let depth = self.stages[j].depth();
                let role = role_for(self.radix, p, n, depth);
                if role != self.stages[j].role() {
                    self.stages[j].assign_role(kernel, role, self.adder_regs, self.mult_regs);
                }
            }
        }
        let mut skew = 0;
        for &j in &self.active {
            self.stages[j].set_skew(skew);
            skew += self.stages[j].latency();
        }
        self.latency = skew;
        tracing::debug!(size = 1usize << n, latency = self.latency, "chain configured");
    }

    /// Cumulative step latency of the active chain (delay lines plus
    /// pipeline registers).
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Active stage indices in flow order.
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Advance every active stage by one chain-enabled step.
    pub fn step(&mut self, kernel: &mut K, x: K::Sample, direction: Direction) -> K::Sample {
        let mut v = x;
        for i in 0..self.active.len() {
            let j = self.active[i];
            v = self.stages[j].step(kernel, v, direction);
        }
        v
    }
}

/// Combine role of the stage at flow position `p` of an `n`-stage chain.
fn role_for(radix: Radix, p: usize, n: usize, depth: usize) -> StageRole {
    match radix {
        Radix::Radix2 => StageRole::Butterfly {
            twiddled: depth > 1,
        },
        Radix::Radix22 => {
            if n % 2 == 1 && p == n - 1 {
                // Odd stage counts leave a plain closing stage.
                StageRole::Butterfly { twiddled: false }
            } else if p % 2 == 0 {
                StageRole::Butterfly { twiddled: false }
            } else {
                StageRole::Dragonfly {
                    twiddled: depth > 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Float64Kernel;
    use crate::params::{FftParams, Numeric};

    fn build(params: &FftParams) -> (RadixChain<Float64Kernel>, Float64Kernel) {
        assert_eq!(params.validate(), Ok(()));
        assert!(matches!(params.numeric, Numeric::Float64));
        let kernel = Float64Kernel::from_params(params).unwrap();
        (RadixChain::build(params, &kernel), kernel)
    }

    #[test]
    fn test_latency_counts_delay_lines_and_registers() {
        let params = FftParams {
            size: 16,
            adder_regs: 1,
            mult_regs: 2,
            ..Default::default()
        };
        let (chain, _) = build(&params);
        // Depths 8+4+2+1 = 15; four adder registers; the depth-1 stage has
        // no rotator, so three multiplier pairs.
        assert_eq!(chain.latency(), 15 + 4 + 3 * 2);
    }

    #[test]
    fn test_runtime_subset_is_the_shallow_end() {
        let params = FftParams {
            size: 64,
            runtime_size: true,
            adder_regs: 1,
            mult_regs: 0,
            ..Default::default()
        };
        let (mut chain, kernel) = build(&params);
        chain.configure(3, &kernel);
        assert_eq!(chain.active(), &[3, 4, 5], "depths 4, 2, 1 stay active");
        assert_eq!(chain.latency(), 7 + 3);

        let params = FftParams {
            decimation: Decimation::InTime,
            ..params
        };
        let (mut chain, kernel) = build(&params);
        chain.configure(3, &kernel);
        assert_eq!(chain.active(), &[0, 1, 2], "depths 1, 2, 4 stay active");
    }

    #[test]
    fn test_radix22_role_pattern() {
        let params = FftParams {
            size: 32,
            radix: Radix::Radix22,
            ..Default::default()
        };
        let (chain, _) = build(&params);
        let roles: Vec<_> = chain.active().iter().map(|&j| chain.stages[j].role()).collect();
        assert_eq!(
            roles,
            vec![
                StageRole::Butterfly { twiddled: false },
                StageRole::Dragonfly { twiddled: true },
                StageRole::Butterfly { twiddled: false },
                StageRole::Dragonfly { twiddled: true },
                StageRole::Butterfly { twiddled: false },
            ],
            "two dual-stage groups plus a plain closing stage"
        );
    }
}
