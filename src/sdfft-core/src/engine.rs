// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Top-level streaming transform engine.
//!
//! [`SdfFft`] validates a configuration, assembles one radix chain with the
//! optional permutation stage on the decimation-appropriate side, and
//! exposes the flow-controlled streaming interface: one [`step`] call per
//! discrete time step resolves both handshakes, derives the chain-wide
//! enable and advances the pipeline. Samples are never dropped, duplicated
//! or reordered under any ready/valid schedule; every accepted input
//! produces exactly one output a fixed number of enabled steps later.
//!
//! [`step`]: SdfFft::step

use crate::bitrev::BitRevStage;
use crate::chain::RadixChain;
use crate::control::{CtrlFsm, CtrlState, StepConds};
use crate::error::{ControlError, ParamError};
use crate::numeric::StageKernel;
use crate::params::{Decimation, Direction, FftParams, Radix, TrimSel};

/// One sample plus its window-boundary marker, both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<S> {
    pub sample: S,
    /// Marks the final sample of a window.
    pub last: bool,
}

impl<S> Frame<S> {
    pub fn new(sample: S, last: bool) -> Self {
        Self { sample, last }
    }
}

/// Outcome of one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult<S> {
    /// The offered input sample was taken this step.
    pub accepted: bool,
    /// A sample delivered to the (ready) consumer this step.
    pub output: Option<Frame<S>>,
    /// The engine is draining a fully ingested window.
    pub busy: bool,
}

/// Where the permutation stage sits relative to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permute {
    Before,
    After,
    None,
}

/// Runtime control registers; a register is `Some` only when the
/// configuration asked for it, otherwise it does not exist in the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRegs {
    /// Selected transform size as log2; writable only while idle.
    pub size_log2: Option<u8>,
    pub direction: Option<Direction>,
    /// Per-stage trim retention selection.
    pub retention: Option<Vec<TrimSel>>,
}

/// Streaming single-path delay-feedback transform engine.
pub struct SdfFft<K: StageKernel> {
    params: FftParams,
    kernel: K,
    fsm: CtrlFsm,
    chain: RadixChain<K>,
    bitrev: Option<BitRevStage<K::Sample>>,
    placement: Permute,
    regs: RuntimeRegs,
    log2_size: u8,
    direction: Direction,
    /// Enabled steps since the window started.
    enabled_steps: usize,
    out_count: usize,
    out_slot: Option<Frame<K::Sample>>,
}

impl<K: StageKernel> SdfFft<K> {
    /// Validate the configuration and assemble the engine. Every validator
    /// must pass; a failure here is fatal and nothing is built.
    pub fn new(params: FftParams) -> Result<Self, ParamError> {
        params.validate()?;
        let kernel = K::from_params(&params)?;
        let chain = RadixChain::build(&params, &kernel);
        let placement = match (params.bit_reverse, params.decimation) {
            (false, _) => Permute::None,
            (true, Decimation::InTime) => Permute::Before,
            (true, Decimation::InFrequency) => Permute::After,
        };
        let bitrev = (placement != Permute::None).then(|| BitRevStage::new(params.size));
        let regs = RuntimeRegs {
            size_log2: params.runtime_size.then(|| params.stages() as u8),
            direction: params.runtime_direction.then_some(params.direction),
            retention: params
                .runtime_retention
                .then(|| vec![params.retention; params.stages()]),
        };
        tracing::debug!(
            size = params.size,
            radix = ?params.radix,
            decimation = ?params.decimation,
            "engine assembled"
        );
        Ok(Self {
            log2_size: params.stages() as u8,
            direction: params.direction,
            params,
            kernel,
            fsm: CtrlFsm::new(),
            chain,
            bitrev,
            placement,
            regs,
            enabled_steps: 0,
            out_count: 0,
            out_slot: None,
        })
    }

    pub fn params(&self) -> &FftParams {
        &self.params
    }

    /// Currently selected transform size.
    pub fn size(&self) -> usize {
        1usize << self.log2_size
    }

    /// True only while the engine drains a fully ingested window.
    pub fn busy(&self) -> bool {
        self.fsm.busy()
    }

    /// Enabled steps between accepting a sample and emitting its
    /// transformed counterpart, for the current configuration.
    pub fn latency(&self) -> usize {
        let permute = if self.bitrev.is_some() { self.size() } else { 0 };
        self.chain.latency() + permute
    }

    /// The runtime register surface of this configuration.
    pub fn registers(&self) -> &RuntimeRegs {
        &self.regs
    }

    /// Net power-of-two scaling the trim schedule applies to the output.
    pub fn scale_shift(&self) -> u32 {
        self.chain
            .active()
            .iter()
            .filter(|&&j| self.kernel.trims_at(j))
            .count() as u32
    }

    /// Sticky per-stage overflow flags, present only when configured.
    pub fn overflow(&self) -> Option<&[bool]> {
        self.params.overflow_status.then(|| self.kernel.overflow())
    }

    pub fn clear_overflow(&mut self) {
        self.kernel.clear_overflow();
    }

    /// Select the transform size; only while idle, and for radix-2^2 only
    /// with the log2 parity the chain was built with unless the fully
    /// runtime-configurable variant was requested.
    pub fn set_size_log2(&mut self, log2: u8) -> Result<(), ControlError> {
        if !self.params.runtime_size {
            return Err(ControlError::NotConfigured);
        }
        if self.fsm.state() != CtrlState::Idle {
            return Err(ControlError::NotIdle(self.fsm.state().name()));
        }
        let max = self.params.stages() as u8;
        let min = match self.params.radix {
            Radix::Radix2 => 1,
            Radix::Radix22 => 2,
        };
        if log2 < min || log2 > max {
            return Err(ControlError::SizeOutOfRange { got: log2, max });
        }
        if self.params.radix == Radix::Radix22
            && !self.params.full_runtime_radix22
            && log2 % 2 != max % 2
        {
            return Err(ControlError::SizeParity);
        }
        self.log2_size = log2;
        self.chain.configure(log2, &self.kernel);
        if let Some(br) = self.bitrev.as_mut() {
            br.configure(1usize << log2);
        }
        self.regs.size_log2 = Some(log2);
        tracing::debug!(size = self.size(), "transform size selected");
        Ok(())
    }

    /// Select the transform direction; only while idle.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), ControlError> {
        if !self.params.runtime_direction {
            return Err(ControlError::NotConfigured);
        }
        if self.fsm.state() != CtrlState::Idle {
            return Err(ControlError::NotIdle(self.fsm.state().name()));
        }
        self.direction = direction;
        self.regs.direction = Some(direction);
        Ok(())
    }

    /// Select one stage's trim retention.
    pub fn set_retention(&mut self, stage: usize, sel: TrimSel) -> Result<(), ControlError> {
        if !self.params.runtime_retention {
            return Err(ControlError::NotConfigured);
        }
        if stage >= self.params.stages() {
            return Err(ControlError::StageOutOfRange(stage));
        }
        self.kernel.set_retention(stage, sel);
        if let Some(retention) = self.regs.retention.as_mut() {
            retention[stage] = sel;
        }
        Ok(())
    }

    /// Evaluate one discrete time step.
    ///
    /// `input` is the producer's offer (sample plus last marker);
    /// `out_ready` is the consumer's willingness to take a sample this
    /// step. Acceptance needs offer and readiness on the respective side;
    /// a stalled handshake freezes the pipeline without losing anything.
    pub fn step(&mut self, input: Option<Frame<K::Sample>>, out_ready: bool) -> StepResult<K::Sample> {
        let busy = self.fsm.busy();
        let out_pending = self.out_slot.is_some();
        let out_fire = out_pending && out_ready;
        // Input is withheld while flushing and whenever advancing would
        // overwrite an undelivered output.
        let in_ready = self.fsm.accepts_input() && !(out_pending && !out_ready);
        let (in_fire, last_in, x) = match input {
            Some(frame) if in_ready => (true, frame.last, frame.sample),
            _ => (false, false, K::Sample::default()),
        };
        let enable = in_fire || (busy && out_ready);

        let delivered = if out_fire { self.out_slot.take() } else { None };
        let last_out = delivered.as_ref().map_or(false, |f| f.last);

        if enable {
            self.advance(x);
        }

        let changed = self.fsm.advance(StepConds {
            in_fire,
            last_in,
            out_fire,
            last_out,
        });
        if changed && self.fsm.state() == CtrlState::Idle {
            self.reset_window();
        }

        StepResult {
            accepted: in_fire,
            output: delivered,
            busy,
        }
    }

    /// One chain-enabled step: push a sample in, move every stage, stage
    /// the egress sample for delivery on a later step.
    fn advance(&mut self, x: K::Sample) {
        let e = self.enabled_steps;
        self.enabled_steps += 1;
        let size = self.size();
        let total = self.latency();
        let chain_latency = self.chain.latency();
        let direction = self.direction;

        let mut v = x;
        if self.placement == Permute::Before {
            if let Some(br) = self.bitrev.as_mut() {
                v = br.step(v, e < size).unwrap_or_default();
            }
        }
        v = self.chain.step(&mut self.kernel, v, direction);
        let egress = match self.placement {
            Permute::After => match self.bitrev.as_mut() {
                Some(br) => br.step(v, e >= chain_latency && e < chain_latency + size),
                None => None,
            },
            _ => (e >= total && e < total + size).then_some(v),
        };
        if let Some(sample) = egress {
            if self.out_count < size {
                self.out_count += 1;
                self.out_slot = Some(Frame::new(sample, self.out_count == size));
            }
        }
    }

    fn reset_window(&mut self) {
        self.enabled_steps = 0;
        self.out_count = 0;
        self.chain.reset();
        if let Some(br) = self.bitrev.as_mut() {
            br.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitrev::reverse_bits;
    use crate::numeric::{FixedKernel, Float64Kernel};
    use crate::params::{MultStructure, Numeric, RoundMode};
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    type FloatFft = SdfFft<Float64Kernel>;
    type FixedFft = SdfFft<FixedKernel>;

    fn dft(input: &[Complex<f64>], inverse: bool) -> Vec<Complex<f64>> {
        let n = input.len();
        let sign = if inverse { 2.0 } else { -2.0 };
        (0..n)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .map(|(t, &x)| {
                        let angle = sign * PI * ((k * t) % n) as f64 / n as f64;
                        x * Complex::new(angle.cos(), angle.sin())
                    })
                    .sum()
            })
            .collect()
    }

    fn noise(n: usize, seed: u64) -> Vec<Complex<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    /// Feed one window under the given ready/valid schedules and collect
    /// exactly one window of output.
    fn drive_schedule<K: StageKernel>(
        engine: &mut SdfFft<K>,
        window: &[K::Sample],
        mut offer_at: impl FnMut(usize) -> bool,
        mut ready_at: impl FnMut(usize) -> bool,
    ) -> Vec<K::Sample> {
        let n = window.len();
        let mut fed = 0;
        let mut outs = Vec::new();
        for step in 0..200_000 {
            let offer = (fed < n && offer_at(step))
                .then(|| Frame::new(window[fed], fed + 1 == n));
            let result = engine.step(offer, ready_at(step));
            if result.accepted {
                fed += 1;
            }
            if let Some(frame) = result.output {
                outs.push(frame.sample);
                assert_eq!(
                    frame.last,
                    outs.len() == n,
                    "last marker only on the final output"
                );
                if frame.last {
                    return outs;
                }
            }
        }
        panic!("engine did not produce a full window within the step limit");
    }

    fn drive<K: StageKernel>(engine: &mut SdfFft<K>, window: &[K::Sample]) -> Vec<K::Sample> {
        drive_schedule(engine, window, |_| true, |_| true)
    }

    fn assert_close(got: &[Complex<f64>], want: &[Complex<f64>], tol: f64, label: &str) {
        assert_eq!(got.len(), want.len());
        for (k, (g, w)) in got.iter().zip(want).enumerate() {
            assert!(
                (g - w).norm() <= tol,
                "{label}: bin {k} expected {w} got {g}"
            );
        }
    }

    #[test]
    fn test_dif_radix2_matches_reference() {
        for &size in &[2usize, 4, 8, 16, 32, 64] {
            let params = FftParams {
                size,
                ..Default::default()
            };
            let mut engine = FloatFft::new(params).unwrap();
            let input = noise(size, size as u64);
            let out = drive(&mut engine, &input);
            assert_close(&out, &dft(&input, false), 1e-9, "dif radix-2");
        }
    }

    #[test]
    fn test_dit_radix2_matches_reference() {
        for &size in &[4usize, 8, 16, 32] {
            let params = FftParams {
                size,
                decimation: Decimation::InTime,
                ..Default::default()
            };
            let mut engine = FloatFft::new(params).unwrap();
            let input = noise(size, 100 + size as u64);
            let out = drive(&mut engine, &input);
            assert_close(&out, &dft(&input, false), 1e-9, "dit radix-2");
        }
    }

    #[test]
    fn test_radix22_matches_reference() {
        // Even and odd stage counts exercise both the paired groups and
        // the plain closing stage.
        for &size in &[4usize, 8, 16, 32, 64] {
            let params = FftParams {
                size,
                radix: Radix::Radix22,
                ..Default::default()
            };
            let mut engine = FloatFft::new(params).unwrap();
            let input = noise(size, 200 + size as u64);
            let out = drive(&mut engine, &input);
            assert_close(&out, &dft(&input, false), 1e-9, "dif radix-2^2");
        }
    }

    #[test]
    fn test_inverse_direction_matches_reference() {
        let params = FftParams {
            size: 16,
            direction: Direction::Inverse,
            ..Default::default()
        };
        let mut engine = FloatFft::new(params).unwrap();
        let input = noise(16, 3);
        let out = drive(&mut engine, &input);
        assert_close(&out, &dft(&input, true), 1e-9, "inverse");
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let size = 16usize;
        let input = noise(size, 4);
        let mut forward = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        let mut inverse = FloatFft::new(FftParams {
            size,
            direction: Direction::Inverse,
            ..Default::default()
        })
        .unwrap();
        let spectrum = drive(&mut forward, &input);
        let restored = drive(&mut inverse, &spectrum);
        // No 1/N normalization in either direction.
        let scaled: Vec<_> = input.iter().map(|&x| x * size as f64).collect();
        assert_close(&restored, &scaled, 1e-8, "round trip");
    }

    #[test]
    fn test_all_ones_concentrates_in_bin_zero() {
        let params = FftParams {
            size: 8,
            ..Default::default()
        };
        let mut engine = FloatFft::new(params).unwrap();
        let input = vec![Complex::new(1.0, 0.0); 8];
        let out = drive(&mut engine, &input);
        assert!((out[0] - Complex::new(8.0, 0.0)).norm() < 1e-9);
        for bin in &out[1..] {
            assert!(bin.norm() < 1e-9, "energy outside bin 0: {bin}");
        }
    }

    #[test]
    fn test_without_permutation_output_is_bit_reversed() {
        let size = 16usize;
        let input = noise(size, 5);
        let mut engine = FloatFft::new(FftParams {
            size,
            bit_reverse: false,
            ..Default::default()
        })
        .unwrap();
        let out = drive(&mut engine, &input);
        let reference = dft(&input, false);
        let bits = size.trailing_zeros();
        for k in 0..size {
            let want = reference[reverse_bits(k, bits)];
            assert!((out[k] - want).norm() < 1e-9, "position {k}");
        }
    }

    #[test]
    fn test_backpressure_never_loses_or_reorders() {
        let size = 16usize;
        let input = noise(size, 6);
        let mut reference_engine = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        let reference = drive(&mut reference_engine, &input);

        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let stalls: Vec<(bool, bool)> = (0..200_000)
                .map(|_| (rng.gen_bool(0.6), rng.gen_bool(0.5)))
                .collect();
            let mut engine = FloatFft::new(FftParams {
                size,
                ..Default::default()
            })
            .unwrap();
            let out = drive_schedule(
                &mut engine,
                &input,
                |step| stalls[step].0,
                |step| stalls[step].1,
            );
            assert_close(&out, &reference, 1e-12, "stalled schedule");
        }
    }

    #[test]
    fn test_drain_freezes_until_consumer_is_ready() {
        let size = 8usize;
        let input = noise(size, 7);
        let mut engine = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        // Ingest the whole window against a never-ready consumer.
        let mut fed = 0;
        while fed < size {
            let offer = Some(Frame::new(input[fed], fed + 1 == size));
            if engine.step(offer, false).accepted {
                fed += 1;
            }
        }
        // The drain must freeze completely: no output, no state decay.
        for _ in 0..100 {
            let result = engine.step(None, false);
            assert!(result.output.is_none(), "sample advanced past a stalled consumer");
            assert!(result.busy);
        }
        // Releasing the consumer yields the full, correct window.
        let mut outs = Vec::new();
        for _ in 0..10_000 {
            if let Some(frame) = engine.step(None, true).output {
                outs.push(frame.sample);
                if frame.last {
                    break;
                }
            }
        }
        assert_close(&outs, &dft(&input, false), 1e-9, "frozen drain");
    }

    #[test]
    fn test_busy_spans_the_drain_exactly() {
        let size = 8usize;
        let input = noise(size, 8);
        let mut engine = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        let mut fed = 0;
        let mut accepted_last = None;
        let mut delivered_last = None;
        for step in 0..10_000 {
            let offer = (fed < size).then(|| Frame::new(input[fed], fed + 1 == size));
            let result = engine.step(offer, true);
            if result.accepted {
                fed += 1;
                if fed == size {
                    accepted_last = Some(step);
                    assert!(!result.busy, "busy rises the step after the last accept");
                }
            }
            match (accepted_last, delivered_last) {
                (Some(a), None) if step > a => {
                    assert!(result.busy, "busy holds through the drain (step {step})")
                }
                (_, Some(d)) if step > d => assert!(!result.busy),
                _ => {}
            }
            if let Some(frame) = result.output {
                if frame.last {
                    delivered_last = Some(step);
                }
            }
            if delivered_last.is_some_and(|d| step > d + 4) {
                break;
            }
        }
        assert!(accepted_last.is_some() && delivered_last.is_some());
    }

    #[test]
    fn test_back_to_back_windows() {
        let size = 8usize;
        let mut engine = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        for seed in 10..13 {
            let input = noise(size, seed);
            let out = drive(&mut engine, &input);
            assert_close(&out, &dft(&input, false), 1e-9, "repeated window");
        }
    }

    #[test]
    fn test_runtime_resize() {
        let params = FftParams {
            size: 1024,
            runtime_size: true,
            ..Default::default()
        };
        let mut engine = FloatFft::new(params).unwrap();
        let full_latency = engine.latency();
        engine.set_size_log2(4).unwrap();
        assert_eq!(engine.size(), 16);
        assert!(engine.latency() < full_latency);

        let input = noise(16, 20);
        let out = drive(&mut engine, &input);
        assert_close(&out, &dft(&input, false), 1e-9, "resized transform");

        // Mid-window the size register is locked.
        engine.step(Some(Frame::new(Complex::new(1.0, 0.0), false)), true);
        assert_eq!(
            engine.set_size_log2(5),
            Err(ControlError::NotIdle("processing"))
        );
    }

    #[test]
    fn test_size_register_rejections() {
        let mut fixed_size = FloatFft::new(FftParams {
            size: 64,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(fixed_size.set_size_log2(4), Err(ControlError::NotConfigured));

        let mut engine = FloatFft::new(FftParams {
            size: 64,
            runtime_size: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            engine.set_size_log2(7),
            Err(ControlError::SizeOutOfRange { got: 7, max: 6 })
        );

        // Radix-2^2 keeps log2 parity unless fully runtime-configurable.
        let mut engine = FloatFft::new(FftParams {
            size: 256,
            radix: Radix::Radix22,
            runtime_size: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(engine.set_size_log2(5), Err(ControlError::SizeParity));
        assert_eq!(engine.set_size_log2(4), Ok(()));
    }

    #[test]
    fn test_fully_runtime_radix22_takes_any_size() {
        let params = FftParams {
            size: 256,
            radix: Radix::Radix22,
            runtime_size: true,
            full_runtime_radix22: true,
            ..Default::default()
        };
        let mut engine = FloatFft::new(params).unwrap();
        for &log2 in &[5u8, 4, 3] {
            engine.set_size_log2(log2).unwrap();
            let size = 1usize << log2;
            let input = noise(size, 30 + log2 as u64);
            let out = drive(&mut engine, &input);
            assert_close(&out, &dft(&input, false), 1e-9, "odd/even runtime size");
        }
    }

    #[test]
    fn test_register_surface_matches_configuration() {
        let bare = FloatFft::new(FftParams {
            size: 16,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            bare.registers(),
            &RuntimeRegs {
                size_log2: None,
                direction: None,
                retention: None
            }
        );
        assert_eq!(bare.overflow(), None);

        let loaded = FloatFft::new(FftParams {
            size: 16,
            runtime_size: true,
            runtime_direction: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(loaded.registers().size_log2, Some(4));
        assert_eq!(loaded.registers().direction, Some(Direction::Forward));
    }

    #[test]
    fn test_runtime_direction_switch() {
        let params = FftParams {
            size: 16,
            runtime_direction: true,
            ..Default::default()
        };
        let mut engine = FloatFft::new(params).unwrap();
        let input = noise(16, 40);
        let fwd = drive(&mut engine, &input);
        assert_close(&fwd, &dft(&input, false), 1e-9, "forward pass");

        engine.set_direction(Direction::Inverse).unwrap();
        let inv = drive(&mut engine, &input);
        assert_close(&inv, &dft(&input, true), 1e-9, "inverse pass");
    }

    #[test]
    fn test_matches_rustfft() {
        use rustfft::FftPlanner;
        let size = 64usize;
        let input = noise(size, 50);
        let mut engine = FloatFft::new(FftParams {
            size,
            ..Default::default()
        })
        .unwrap();
        let out = drive(&mut engine, &input);

        let mut buffer: Vec<rustfft::num_complex::Complex<f64>> = input
            .iter()
            .map(|&x| rustfft::num_complex::Complex::new(x.re, x.im))
            .collect();
        FftPlanner::new().plan_fft_forward(size).process(&mut buffer);
        for (k, (g, w)) in out.iter().zip(&buffer).enumerate() {
            assert!(
                (g.re - w.re).abs() < 1e-9 && (g.im - w.im).abs() < 1e-9,
                "bin {k} diverges from the planner reference"
            );
        }
    }

    #[test]
    fn test_fixed_all_ones_is_exact() {
        let params = FftParams {
            size: 8,
            numeric: Numeric::Fixed { width: 16, frac: 8 },
            ..Default::default()
        };
        let mut engine = FixedFft::new(params).unwrap();
        assert_eq!(engine.scale_shift(), 3, "three trimming stages");
        let one = Complex::new(256i64, 0);
        let out = drive(&mut engine, &vec![one; 8]);
        assert_eq!(out[0], Complex::new(256, 0), "8 * 1.0 / 2^3");
        for bin in &out[1..] {
            assert_eq!(*bin, Complex::new(0, 0));
        }
    }

    #[test]
    fn test_fixed_tracks_reference_within_tolerance() {
        let size = 16usize;
        let frac = 12u32;
        let params = FftParams {
            size,
            numeric: Numeric::Fixed { width: 16, frac },
            round: RoundMode::HalfEven,
            mult_structure: MultStructure::ThreeMult,
            ..Default::default()
        };
        let mut engine = FixedFft::new(params).unwrap();
        let input = noise(size, 60);
        let scale = (1i64 << frac) as f64;
        let window: Vec<Complex<i64>> = input
            .iter()
            .map(|x| Complex::new((x.re * scale) as i64, (x.im * scale) as i64))
            .collect();
        let out = drive(&mut engine, &window);

        let quantized: Vec<Complex<f64>> = window
            .iter()
            .map(|x| Complex::new(x.re as f64 / scale, x.im as f64 / scale))
            .collect();
        let shift = engine.scale_shift();
        let reference = dft(&quantized, false);
        for (k, (g, w)) in out.iter().zip(&reference).enumerate() {
            let got = Complex::new(g.re as f64, g.im as f64) / scale;
            let want = w / (1u32 << shift) as f64;
            assert!(
                (got - want).norm() < 8.0 / scale,
                "bin {k}: got {got}, want {want}"
            );
        }
    }

    #[test]
    fn test_fixed_overflow_raises_sticky_flags() {
        let params = FftParams {
            size: 8,
            numeric: Numeric::Fixed { width: 8, frac: 0 },
            retention: TrimSel::KeepLsb,
            overflow_status: true,
            ..Default::default()
        };
        let mut engine = FixedFft::new(params).unwrap();
        let loud = Complex::new(100i64, 0);
        let _ = drive(&mut engine, &vec![loud; 8]);
        let flags = engine.overflow().expect("status configured");
        assert!(flags.iter().any(|&f| f), "no stage reported the clip");
        engine.clear_overflow();
        assert!(engine.overflow().unwrap().iter().all(|&f| !f));
    }

    #[test]
    fn test_retention_register() {
        let params = FftParams {
            size: 8,
            numeric: Numeric::Fixed { width: 16, frac: 8 },
            runtime_retention: true,
            ..Default::default()
        };
        let mut engine = FixedFft::new(params).unwrap();
        assert_eq!(engine.scale_shift(), 3);
        engine.set_retention(0, TrimSel::KeepLsb).unwrap();
        assert_eq!(
            engine.scale_shift(),
            2,
            "a keep-LSB stage no longer scales the output"
        );
        assert_eq!(
            engine.registers().retention.as_deref(),
            Some(&[TrimSel::KeepLsb, TrimSel::KeepMsb, TrimSel::KeepMsb][..])
        );
        assert_eq!(
            engine.set_retention(3, TrimSel::KeepLsb),
            Err(ControlError::StageOutOfRange(3))
        );

        let mut fixed = FixedFft::new(FftParams {
            size: 8,
            numeric: Numeric::Fixed { width: 16, frac: 8 },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            fixed.set_retention(0, TrimSel::KeepLsb),
            Err(ControlError::NotConfigured)
        );
    }

    #[test]
    fn test_latency_is_the_documented_step_count() {
        let params = FftParams {
            size: 16,
            adder_regs: 1,
            mult_regs: 2,
            ..Default::default()
        };
        let engine = FloatFft::new(params).unwrap();
        // Delay lines 15, adders 4, rotator pairs 3, permutation window 16.
        assert_eq!(engine.latency(), 15 + 4 + 6 + 16);
    }
}
