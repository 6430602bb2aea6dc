use crate::{
    context::RenderCtx,
    dsp::{buffer::SampleBuffer, convolver::Convolver, param::AudioParam},
    effects::EffectNode,
    MAX_BLOCK_SIZE,
};

/// Wet level of the convolution path.
pub const WET_GAIN: f32 = 0.3;

/// Convolution reverb: dry at unity plus the convolved signal at 30%.
///
/// The impulse response is content supplied by the engine's resource load.
/// Until one is installed (or while it is silent) the stage passes the dry
/// signal through untouched.
pub struct ReverbStage {
    convolver: Convolver,
    wet: AudioParam,
    wet_buffer: Vec<f32>,
}

impl ReverbStage {
    pub fn new() -> Self {
        Self {
            convolver: Convolver::new(),
            wet: AudioParam::new(WET_GAIN),
            wet_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn set_impulse_response(&mut self, ir: &SampleBuffer) {
        self.convolver.set_impulse_response(ir.as_slice());
        log::info!(
            "reverb impulse response installed ({:.2}s{})",
            ir.duration(),
            if self.convolver.is_bypassed() { ", silent" } else { "" }
        );
    }

    pub fn has_impulse_response(&self) -> bool {
        !self.convolver.is_bypassed()
    }

    pub fn wet_mut(&mut self) -> &mut AudioParam {
        &mut self.wet
    }
}

impl Default for ReverbStage {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectNode for ReverbStage {
    fn render_block(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        if self.convolver.is_bypassed() {
            return;
        }

        for (chunk_idx, chunk) in buffer.chunks_mut(MAX_BLOCK_SIZE).enumerate() {
            let offset = chunk_idx * MAX_BLOCK_SIZE;
            let convolved = &mut self.wet_buffer[..chunk.len()];
            convolved.copy_from_slice(chunk);
            self.convolver.process_block(convolved);

            for (i, (sample, &w)) in chunk.iter_mut().zip(convolved.iter()).enumerate() {
                *sample += w * self.wet.value_at(ctx.time_at(offset + i));
            }
        }
    }

    fn reset(&mut self) {
        self.convolver.reset();
    }
}
