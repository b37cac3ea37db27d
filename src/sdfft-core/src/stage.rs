// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Single-path delay-feedback stage unit.
//!
//! A stage owns one delay line and combines the sample leaving it with the
//! sample arriving, one exchange per enabled step. The free-running phase
//! counter alternates the delay line between filling (pass the delayed
//! value on, store the newcomer) and combining (butterfly the pair, emit
//! the sum, feed the difference back). Everything freezes while the
//! stage's delayed enable has not yet caught up with the chain-wide one.

use crate::numeric::StageKernel;
use crate::params::{Decimation, Direction};

/// Delay-line storage. Both forms are plain FIFOs of a fixed depth; the
/// register chain shifts on every exchange, the memory form moves a pointer
/// instead.
#[derive(Debug, Clone)]
enum DelayLine<S> {
    Regs(Vec<S>),
    Mem { buf: Vec<S>, pos: usize },
}

impl<S: Copy + Default> DelayLine<S> {
    fn new(depth: usize, mem_threshold: usize) -> Self {
        if depth >= mem_threshold {
            Self::Mem {
                buf: vec![S::default(); depth],
                pos: 0,
            }
        } else {
            Self::Regs(vec![S::default(); depth])
        }
    }

    /// The value leaving the line this step.
    fn front(&self) -> S {
        match self {
            Self::Regs(regs) => regs[regs.len() - 1],
            Self::Mem { buf, pos } => buf[*pos],
        }
    }

    /// Complete the exchange begun by [`front`]: store the new value.
    fn push(&mut self, x: S) {
        match self {
            Self::Regs(regs) => {
                for i in (1..regs.len()).rev() {
                    regs[i] = regs[i - 1];
                }
                regs[0] = x;
            }
            Self::Mem { buf, pos } => {
                buf[*pos] = x;
                *pos = (*pos + 1) % buf.len();
            }
        }
    }

    fn reset(&mut self) {
        if let Self::Mem { pos, .. } = self {
            *pos = 0;
        }
    }
}

/// Combine role of a stage within the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    /// Plain add/subtract combine, with the stage's own twiddle set when
    /// the span is wide enough to need one.
    Butterfly { twiddled: bool },
    /// Second butterfly of a radix-2^2 group: trivial quarter rotation on
    /// part of the combine phase, plus the group twiddle multiplier on the
    /// output when the group span needs one.
    Dragonfly { twiddled: bool },
}

impl StageRole {
    pub fn twiddled(&self) -> bool {
        match *self {
            Self::Butterfly { twiddled } | Self::Dragonfly { twiddled } => twiddled,
        }
    }
}

/// One delay-feedback computation stage.
pub struct SdfStage<K: StageKernel> {
    /// Physical position in the chain; addresses the kernel's per-stage
    /// formats and status.
    index: usize,
    depth: usize,
    role: StageRole,
    decimation: Decimation,
    dline: DelayLine<K::Sample>,
    twiddles: Vec<K::Twiddle>,
    /// Enable delay: chain-enabled steps to sit out before the phase
    /// counter starts, i.e. the cumulative latency of everything upstream.
    skew: usize,
    steps: usize,
    /// Ring modelling the arithmetic pipeline registers.
    pipe: Vec<K::Sample>,
    ppos: usize,
}

impl<K: StageKernel> SdfStage<K> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kernel: &K,
        index: usize,
        depth: usize,
        role: StageRole,
        decimation: Decimation,
        mem_threshold: usize,
        adder_regs: usize,
        mult_regs: usize,
    ) -> Self {
        let mut stage = Self {
            index,
            depth,
            role,
            decimation,
            dline: DelayLine::new(depth, mem_threshold),
            twiddles: Vec::new(),
            skew: 0,
            steps: 0,
            pipe: Vec::new(),
            ppos: 0,
        };
        stage.assign_role(kernel, role, adder_regs, mult_regs);
        stage
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn role(&self) -> StageRole {
        self.role
    }

    /// Pipeline registers plus the delay line: the stage's total step
    /// latency.
    pub fn latency(&self) -> usize {
        self.depth + self.pipe.len()
    }

    pub fn set_skew(&mut self, skew: usize) {
        self.skew = skew;
    }

    /// Re-derive the combine role and twiddle tables; used by the
    /// fully-runtime radix-2^2 chain when the selected size changes.
    pub fn assign_role(&mut self, kernel: &K, role: StageRole, adder_regs: usize, mult_regs: usize) {
        self.role = role;
        self.twiddles = match role {
            StageRole::Butterfly { twiddled: true } => {
                let span = 2 * self.depth;
                (0..self.depth).map(|k| kernel.twiddle(k, span)).collect()
            }
            StageRole::Dragonfly { twiddled: true } => {
                // Group twiddles in emission order, one entry per phase of
                // the four quarter-spans.
                let span = 4 * self.depth;
                const FACTOR: [usize; 4] = [3, 0, 2, 1];
                (0..span)
                    .map(|t| kernel.twiddle(FACTOR[t / self.depth] * (t % self.depth), span))
                    .collect()
            }
            _ => Vec::new(),
        };
        let lat = adder_regs + if role.twiddled() { mult_regs } else { 0 };
        self.pipe = vec![K::Sample::default(); lat];
        self.ppos = 0;
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.ppos = 0;
        self.dline.reset();
    }

    /// Advance one chain-enabled step.
    pub fn step(&mut self, kernel: &mut K, x: K::Sample, direction: Direction) -> K::Sample {
        let t = self.steps;
        self.steps += 1;
        if t < self.skew {
            // Local enable has not arrived yet; hold everything.
            return K::Sample::default();
        }
        let t = t - self.skew;
        let out = match self.role {
            StageRole::Butterfly { .. } => self.step_butterfly(kernel, x, t, direction),
            StageRole::Dragonfly { twiddled } => {
                self.step_dragonfly(kernel, x, t, direction, twiddled)
            }
        };
        self.push_pipe(out)
    }

    fn step_butterfly(
        &mut self,
        kernel: &mut K,
        x: K::Sample,
        t: usize,
        direction: Direction,
    ) -> K::Sample {
        let pos = t % self.depth;
        let combine = (t / self.depth) & 1 == 1;
        let delayed = self.dline.front();
        match (combine, self.decimation) {
            (true, Decimation::InFrequency) => {
                let (sum, diff) = kernel.butterfly(self.index, delayed, x);
                self.dline.push(diff);
                sum
            }
            (false, Decimation::InFrequency) => {
                // The previous half-block's differences leave through the
                // rotator.
                self.dline.push(x);
                match self.role.twiddled() {
                    true => kernel.mul_twiddle(self.index, delayed, &self.twiddles[pos], direction),
                    false => delayed,
                }
            }
            (true, Decimation::InTime) => {
                // Rotate the late operand before the combine.
                let b = match self.role.twiddled() {
                    true => kernel.mul_twiddle(self.index, x, &self.twiddles[pos], direction),
                    false => x,
                };
                let (sum, diff) = kernel.butterfly(self.index, delayed, b);
                self.dline.push(diff);
                sum
            }
            (false, Decimation::InTime) => {
                self.dline.push(x);
                delayed
            }
        }
    }

    fn step_dragonfly(
        &mut self,
        kernel: &mut K,
        x: K::Sample,
        t: usize,
        direction: Direction,
        twiddled: bool,
    ) -> K::Sample {
        let phase = t % (4 * self.depth);
        let quarter = phase / self.depth;
        let combine = quarter & 1 == 1;
        let delayed = self.dline.front();
        let out = if combine {
            // The second combine half carries the trivial quarter rotation.
            let b = if quarter == 3 {
                kernel.rotate_quarter(x, direction)
            } else {
                x
            };
            let (sum, diff) = kernel.butterfly(self.index, delayed, b);
            self.dline.push(diff);
            sum
        } else {
            self.dline.push(x);
            delayed
        };
        if twiddled {
            kernel.mul_twiddle(self.index, out, &self.twiddles[phase], direction)
        } else {
            out
        }
    }

    fn push_pipe(&mut self, v: K::Sample) -> K::Sample {
        if self.pipe.is_empty() {
            return v;
        }
        let out = self.pipe[self.ppos];
        self.pipe[self.ppos] = v;
        self.ppos = (self.ppos + 1) % self.pipe.len();
        out
    }
}
