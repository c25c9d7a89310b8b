//! Ping-pong bookkeeping for the feedback pass.
//!
//! The feedback pass renders into one of two equally sized targets while the
//! shader samples the other. [`FrameState`] tracks which slot is written this
//! frame and [`FeedbackPair`] hands out the matching write/read targets, so
//! the "exactly one target is current" rule lives in one place.

/// Index of the target written by the next frame. The other slot holds the
/// previous frame and is only ever read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameState {
    current_index: usize,
}

impl FrameState {
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn previous_index(&self) -> usize {
        1 - self.current_index
    }

    /// Swaps the roles of the two targets. Called once per submitted frame.
    pub fn toggle(&mut self) {
        self.current_index = 1 - self.current_index;
    }
}

/// The two off-screen targets of the feedback loop.
#[derive(Debug)]
pub struct FeedbackPair<T> {
    slots: [T; 2],
}

impl<T> FeedbackPair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
        }
    }

    /// Target rendered into for `frame`.
    pub fn write(&self, frame: FrameState) -> &T {
        &self.slots[frame.current_index()]
    }

    /// Target sampled as the previous frame for `frame`.
    pub fn read(&self, frame: FrameState) -> &T {
        &self.slots[frame.previous_index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn into_inner(self) -> [T; 2] {
        self.slots
    }
}

/// Per-channel decay and blend weight used by the feedback shader.
///
/// The shader computes `mix(fresh, previous * decay, blend_weight)` per channel,
/// so with a constant `fresh` colour each channel follows
/// `x' = (1 - w) * fresh + w * decay * x` and settles geometrically on
/// [`FeedbackBlend::steady_state`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackBlend {
    pub decay: [f32; 3],
    pub blend_weight: f32,
}

impl Default for FeedbackBlend {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FeedbackBlend {
    /// `Default::default` in const position.
    pub const DEFAULT: Self = Self {
        decay: [0.98, 0.97, 0.99],
        blend_weight: 0.75,
    };

    pub fn new(decay: [f32; 3], blend_weight: f32) -> Self {
        Self {
            decay,
            blend_weight,
        }
    }

    /// One feedback step on the CPU, mirroring the WGSL blend and the clamp
    /// applied by an 8-bit unorm render target.
    pub fn apply(&self, fresh: [f32; 3], previous: [f32; 3]) -> [f32; 3] {
        let w = self.blend_weight;
        std::array::from_fn(|i| {
            let blended = (1.0 - w) * fresh[i] + w * previous[i] * self.decay[i];
            blended.clamp(0.0, 1.0)
        })
    }

    /// Fixed point of [`FeedbackBlend::apply`] for a constant `fresh` colour.
    ///
    /// Returns `None` for channels that do not converge (`w * decay >= 1`).
    pub fn steady_state(&self, fresh: [f32; 3]) -> [Option<f32>; 3] {
        let w = self.blend_weight;
        std::array::from_fn(|i| {
            let gain = w * self.decay[i];
            if gain >= 1.0 {
                return None;
            }
            Some(((1.0 - w) * fresh[i] / (1.0 - gain)).clamp(0.0, 1.0))
        })
    }

    /// Override constants handed to the feedback pipeline.
    pub fn pipeline_constants(&self) -> [(&'static str, f64); 4] {
        [
            ("DECAY_R", f64::from(self.decay[0])),
            ("DECAY_G", f64::from(self.decay[1])),
            ("DECAY_B", f64::from(self.decay[2])),
            ("BLEND_WEIGHT", f64::from(self.blend_weight)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates_slots() {
        let mut frame = FrameState::default();
        assert_eq!(frame.current_index(), 0);
        assert_eq!(frame.previous_index(), 1);
        frame.toggle();
        assert_eq!(frame.current_index(), 1);
        assert_eq!(frame.previous_index(), 0);
        frame.toggle();
        assert_eq!(frame.current_index(), 0);
    }

    #[test]
    fn pair_never_reads_and_writes_the_same_slot() {
        let pair = FeedbackPair::new("a", "b");
        let mut frame = FrameState::default();
        for _ in 0..4 {
            assert_ne!(pair.write(frame), pair.read(frame));
            frame.toggle();
        }
    }

    #[test]
    fn previous_write_becomes_next_read() {
        let pair = FeedbackPair::new(10, 20);
        let mut frame = FrameState::default();
        let written = *pair.write(frame);
        frame.toggle();
        assert_eq!(*pair.read(frame), written);
    }

    #[test]
    fn blend_converges_to_steady_state() {
        let blend = FeedbackBlend::default();
        let fresh = [0.2, 0.5, 0.1];
        let mut colour = [0.0; 3];
        for _ in 0..200 {
            colour = blend.apply(fresh, colour);
        }
        let expected = blend.steady_state(fresh);
        for (value, target) in colour.iter().zip(expected) {
            let target = target.expect("converging channel");
            assert!((value - target).abs() < 1e-4, "{value} vs {target}");
        }
    }

    #[test]
    fn blend_clips_to_unit_range() {
        let blend = FeedbackBlend::new([1.0, 1.0, 1.0], 0.9);
        let out = blend.apply([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        assert_eq!(out, [1.0, 1.0, 1.0]);
        let out = blend.apply([-1.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn unit_gain_has_no_steady_state() {
        let blend = FeedbackBlend::new([1.0, 0.5, 0.5], 1.0);
        let state = blend.steady_state([0.3, 0.3, 0.3]);
        assert!(state[0].is_none());
        assert!(state[1].is_some());
    }

    #[test]
    fn pipeline_constants_follow_blend() {
        let blend = FeedbackBlend::new([1.0, 0.98, 0.97], 0.87);
        let constants = blend.pipeline_constants();
        assert_eq!(constants[0], ("DECAY_R", 1.0));
        assert_eq!(constants[3].0, "BLEND_WEIGHT");
        assert!((constants[3].1 - 0.87).abs() < 1e-6);
    }
}
