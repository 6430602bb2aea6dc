//! The shared effect bus every voice plays into.
//!
//! Topology is fixed at construction: input → chorus → reverb → output. Each
//! stage processes a block in place, so the chain is just the stages run back
//! to back over the bus buffer.

/// Dry plus LFO-swept delay.
pub mod chorus;
/// Fixed two-stage chain and its output routing.
pub mod chain;
/// Dry plus convolution wet path.
pub mod reverb;

pub use chain::{Bus, EffectChain};
pub use chorus::ChorusStage;
pub use reverb::ReverbStage;

use crate::context::RenderCtx;

/// Core trait for in-place effect stages.
pub trait EffectNode: Send {
    fn render_block(&mut self, buffer: &mut [f32], ctx: &RenderCtx);

    /// Clear internal history (delay lines, convolution state).
    fn reset(&mut self) {}
}

impl EffectNode for Box<dyn EffectNode> {
    fn render_block(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(buffer, ctx)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
