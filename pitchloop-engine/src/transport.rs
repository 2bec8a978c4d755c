use pitchloop_common::music::{MetricStructure, Tempo, TimeSignature};


/// A beat boundary reported by the transport.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Tick {
    pub bar: u64,
    /// beat within the bar; 0 is the downbeat
    pub beat: u8,
}

impl Tick {
    pub fn is_bar(&self) -> bool {
        self.beat == 0
    }
}

/// Counts frames and reports beat and bar boundaries. The engine splits each
/// audio block at the boundaries so that ticks land on the exact frame.
pub struct Transport {
    metric_structure: MetricStructure,
    sample_rate: usize,
    frames_per_beat: usize,
    // frames since the last boundary
    position: usize,
    // index of the next beat to be reported
    beat: u64,
    tick_pending: bool,
}

impl Transport {
    pub fn new(metric_structure: MetricStructure, sample_rate: usize) -> Transport {
        let frames_per_beat = metric_structure.tempo.frames_per_beat(sample_rate).max(1);
        Transport {
            metric_structure,
            sample_rate,
            frames_per_beat,
            position: 0,
            beat: 0,
            tick_pending: true,
        }
    }

    pub fn metric_structure(&self) -> MetricStructure {
        self.metric_structure
    }

    pub fn frames_per_beat(&self) -> usize {
        self.frames_per_beat
    }

    /// Frames until the next boundary; 0 when sitting on one.
    pub fn frames_until_tick(&self) -> usize {
        if self.tick_pending {
            0
        } else {
            self.frames_per_beat - self.position
        }
    }

    /// Returns the boundary at the current frame, at most once.
    pub fn take_tick(&mut self) -> Option<Tick> {
        if !self.tick_pending {
            return None;
        }
        self.tick_pending = false;

        let ts = self.metric_structure.time_signature;
        let tick = Tick {
            bar: ts.measure(self.beat),
            beat: ts.beat_of_measure(self.beat),
        };
        self.beat += 1;
        Some(tick)
    }

    /// Moves forward by `frames`, which must not cross the next boundary.
    pub fn advance(&mut self, frames: usize) {
        if frames == 0 {
            return;
        }
        assert!(
            frames <= self.frames_until_tick(),
            "advanced {} frames past a beat boundary",
            frames
        );

        self.position += frames;
        if self.position >= self.frames_per_beat {
            self.position = 0;
            self.tick_pending = true;
        }
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.metric_structure.tempo = tempo;
        self.frames_per_beat = tempo.frames_per_beat(self.sample_rate).max(1);
        if !self.tick_pending && self.position >= self.frames_per_beat {
            self.position = 0;
            self.tick_pending = true;
        }
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.metric_structure.time_signature = time_signature;
        self.reset();
    }

    /// Back to the downbeat of the first bar.
    pub fn reset(&mut self) {
        self.position = 0;
        self.beat = 0;
        self.tick_pending = true;
    }
}
