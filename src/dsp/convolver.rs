use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/*
Partitioned Convolution
=======================

Convolution reverb runs the signal through a recorded (or synthesized)
impulse response: every input sample triggers a scaled copy of the whole IR.
Direct convolution costs IR-length multiplies per sample, which is hopeless
for a 1.5 second IR at 48kHz (72,000 taps). Doing it in the frequency domain
turns the convolution into a pointwise multiply.

Vocabulary
----------

  partition   A fixed-size slice of the impulse response (P frames). The IR
              is split into K = ceil(len / P) partitions.

  spectrum    The FFT of a partition, zero-padded to 2P so the circular
              convolution does not wrap into the part we keep.

  FDL         Frequency-domain delay line: the spectra of the last K input
              windows. Input window k ago is multiplied with IR partition k.

  overlap-save  Each FFT covers the previous block and the current one (2P
              frames); after the inverse FFT only the last P frames are
              valid output and the first P are discarded.


Per Block of P Input Frames
---------------------------

  window  = [previous P inputs | current P inputs]
  X_0     = FFT(window)                       push into FDL
  Y       = Σ_k X_k · H_k                     k = 0..K
  y       = IFFT(Y) / 2P
  output  = y[P..2P]

The output of a block is only known once its last input frame arrives, so
the convolver has a latency of exactly one partition. Frames are pushed one
at a time and the output of the previous block is played meanwhile.

Placeholder impulse responses are silent; a silent or missing IR skips all
FFT work and outputs zeros.
*/

/// Frames per partition (and the convolver's latency).
pub const PARTITION_SIZE: usize = 256;

pub struct Convolver {
    partition: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    ir_spectra: Vec<Vec<Complex<f32>>>,
    history: Vec<Vec<Complex<f32>>>,
    history_pos: usize,
    window: Vec<f32>,
    output: Vec<f32>,
    fill: usize,
    accum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new() -> Self {
        Self::with_partition(PARTITION_SIZE)
    }

    pub fn with_partition(partition: usize) -> Self {
        let partition = partition.max(1);
        let fft_len = partition * 2;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        Self {
            partition,
            fft,
            ifft,
            ir_spectra: Vec::new(),
            history: Vec::new(),
            history_pos: 0,
            window: vec![0.0; fft_len],
            output: vec![0.0; partition],
            fill: 0,
            accum: vec![Complex::default(); fft_len],
            scratch: vec![Complex::default(); scratch_len],
        }
    }

    pub fn latency(&self) -> usize {
        self.partition
    }

    /// True when there is no audible impulse response to convolve with.
    pub fn is_bypassed(&self) -> bool {
        self.ir_spectra.is_empty()
    }

    /// Install a new impulse response, resetting all convolution state.
    ///
    /// Allocates; call from the control domain.
    pub fn set_impulse_response(&mut self, ir: &[f32]) {
        let fft_len = self.partition * 2;
        self.ir_spectra.clear();
        self.history.clear();

        if ir.iter().all(|&s| s == 0.0) {
            self.reset();
            return;
        }

        for chunk in ir.chunks(self.partition) {
            let mut spectrum = vec![Complex::default(); fft_len];
            for (bin, &sample) in spectrum.iter_mut().zip(chunk) {
                bin.re = sample;
            }
            self.fft.process_with_scratch(&mut spectrum, &mut self.scratch);
            self.ir_spectra.push(spectrum);
        }

        self.history = vec![vec![Complex::default(); fft_len]; self.ir_spectra.len()];
        self.reset();
    }

    pub fn clear_impulse_response(&mut self) {
        self.ir_spectra.clear();
        self.history.clear();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.output.fill(0.0);
        self.fill = 0;
        self.history_pos = 0;
        for spectrum in &mut self.history {
            spectrum.fill(Complex::default());
        }
    }

    /// Push one input frame, returning the wet output one partition behind.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        if self.is_bypassed() {
            return 0.0;
        }

        let out = self.output[self.fill];
        self.window[self.partition + self.fill] = input;
        self.fill += 1;

        if self.fill == self.partition {
            self.process_partition();
            self.fill = 0;
        }

        out
    }

    /// Replace each frame of `block` with its wet output.
    pub fn process_block(&mut self, block: &mut [f32]) {
        if self.is_bypassed() {
            block.fill(0.0);
            return;
        }
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    fn process_partition(&mut self) {
        let partitions = self.ir_spectra.len();
        let fft_len = self.partition * 2;

        let newest = &mut self.history[self.history_pos];
        for (bin, &sample) in newest.iter_mut().zip(&self.window) {
            *bin = Complex::new(sample, 0.0);
        }
        self.fft.process_with_scratch(newest, &mut self.scratch);

        self.accum.fill(Complex::default());
        for (k, ir) in self.ir_spectra.iter().enumerate() {
            let input = &self.history[(self.history_pos + partitions - k) % partitions];
            for ((acc, x), h) in self.accum.iter_mut().zip(input).zip(ir) {
                *acc += x * h;
            }
        }

        self.ifft.process_with_scratch(&mut self.accum, &mut self.scratch);

        let scale = 1.0 / fft_len as f32;
        for (out, bin) in self.output.iter_mut().zip(&self.accum[self.partition..]) {
            *out = bin.re * scale;
        }

        self.window.copy_within(self.partition.., 0);
        self.history_pos = (self.history_pos + 1) % partitions;
    }
}

impl Default for Convolver {
    fn default() -> Self {
        Self::new()
    }
}
