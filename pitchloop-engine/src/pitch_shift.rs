use crate::ring::RingBuffer;


/// Size of the history buffer; must stay a power of two.
pub const HISTORY_SIZE: usize = 65536;
pub const DEFAULT_WINDOW_SIZE: usize = 1000;
pub const DEFAULT_CROSSFADE_SIZE: usize = 1000;

/// Granular pitch shifter. Two read taps, one grain apart, sweep through a
/// circular history of the input at a rate set by the shift, and are
/// crossfaded as the current tap wraps around the window.
///
/// All state carries over between calls to [`PitchShifter::process`], so a
/// signal may be split into blocks at any point without changing the output.
pub struct PitchShifter {
    history: RingBuffer,
    // read phase recurrence: rec[0] is the current value, rec[1] the previous
    rec: [f32; 2],
    iota: usize,
    window_size: f32,
    crossfade_size: f32,
}

impl Default for PitchShifter {
    fn default() -> Self {
        PitchShifter::new()
    }
}

impl PitchShifter {
    pub fn new() -> PitchShifter {
        PitchShifter::with_sizes(DEFAULT_WINDOW_SIZE, DEFAULT_CROSSFADE_SIZE)
    }

    pub fn with_sizes(window_size: usize, crossfade_size: usize) -> PitchShifter {
        assert!(window_size > 0 && window_size < HISTORY_SIZE / 2);
        assert!(crossfade_size > 0);

        PitchShifter {
            history: RingBuffer::new(HISTORY_SIZE),
            rec: [0.0; 2],
            iota: 0,
            window_size: window_size as f32,
            crossfade_size: crossfade_size as f32,
        }
    }

    /// Pitch shifts `input` by `semitones` and adds the result into `output`.
    pub fn process(&mut self, semitones: f32, input: &[f32], output: &mut [f32]) {
        let window = self.window_size;
        let step = (1.0 + window) - 2f32.powf(semitones / 12.0);
        let inv_crossfade = 1.0 / self.crossfade_size;
        let window_minus_one = window - 1.0;

        for (x, out) in input.iter().zip(output.iter_mut()) {
            self.history.write(self.iota, *x);

            self.rec[0] = (self.rec[1] + step) % window;
            let phase = self.rec[0];

            // tap in the current grain
            let i1 = phase as i32;
            let i2 = i1 + 1;
            let fade = (inv_crossfade * phase).min(1.0);

            // tap in the previous grain, one window further back
            let prev_phase = window + phase;
            let i5 = prev_phase as i32;

            let prev = (prev_phase - i5 as f32) * self.history.delayed(self.iota, i5 + 1)
                + (i5 as f32 - (phase + window_minus_one)) * self.history.delayed(self.iota, i5);

            let cur = (phase - i1 as f32) * self.history.delayed(self.iota, i2)
                + (i2 as f32 - phase) * self.history.delayed(self.iota, i1);

            *out += (1.0 - fade) * prev + fade * cur;

            self.rec[1] = self.rec[0];
            self.iota = self.iota.wrapping_add(1);
        }
    }
}
