use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_per_beat() {
        let tempo = Tempo::from_bpm(120.0).unwrap();
        assert_eq!(22050, tempo.frames_per_beat(44100));
        assert_eq!(24000, tempo.frames_per_beat(48000));

        let tempo = Tempo::from_bpm(90.0).unwrap();
        assert_eq!(29400, tempo.frames_per_beat(44100));
    }

    #[test]
    fn test_bpm_round_trip() {
        assert_eq!(120.0, Tempo::from_bpm(120.0).unwrap().bpm());
        assert_eq!(97.5, Tempo::from_bpm(97.5).unwrap().bpm());
    }

    #[test]
    fn test_tempo_below_one_micro_bpm() {
        assert_eq!(None, Tempo::from_bpm(0.0000001));
        assert_eq!(None, Tempo::from_bpm(0.0));
        assert_eq!(None, Tempo::from_bpm(-60.0));
        assert_eq!(None, Tempo::from_bpm(f32::NAN));
        assert_eq!(None, Tempo::from_bpm(f32::INFINITY));
        assert_eq!(None, Tempo::new(0));

        // rounds up to one micro-bpm
        assert_eq!(Tempo::new(1), Tempo::from_bpm(0.0000008));
        assert!(MetricStructure::new(4, 4, 0.0000001).is_none());
    }

    #[test]
    fn test_time_signature() {
        assert!(TimeSignature::new(4, 4).is_some());
        assert!(TimeSignature::new(7, 8).is_some());
        assert!(TimeSignature::new(3, 3).is_none());
        assert!(TimeSignature::new(4, 0).is_none());
        assert!(TimeSignature::new(0, 4).is_none());
    }

    #[test]
    fn test_beat_normalization() {
        let ts = TimeSignature::new(3, 4).unwrap();
        assert_eq!(0, ts.beat_of_measure(0));
        assert_eq!(1, ts.beat_of_measure(1));
        assert_eq!(0, ts.beat_of_measure(3));
        assert_eq!(2, ts.beat_of_measure(5));
        assert_eq!(1, ts.measure(5));
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct TimeSignature {
    pub upper: u8,
    pub lower: u8,
}

impl TimeSignature {
    pub fn new(upper: u8, lower: u8) -> Option<TimeSignature> {
        if upper == 0 || lower == 0 || (lower & (lower - 1)) != 0 {
            // lower must be a power of 2
            return None;
        }
        Some(TimeSignature { upper, lower })
    }

    // converts from beat-of-song to beat-of-measure
    pub fn beat_of_measure(&self, beat: u64) -> u8 {
        (beat % self.upper as u64) as u8
    }

    pub fn measure(&self, beat: u64) -> u64 {
        beat / self.upper as u64
    }
}

/// Tempo stored in micro-bpm so that it can be compared and hashed exactly.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct Tempo {
    bpm: u64,
}

impl Tempo {
    /// Builds a tempo from micro-bpm; zero is not a tempo.
    pub fn new(bpm: u64) -> Option<Tempo> {
        if bpm == 0 {
            return None;
        }
        Some(Tempo { bpm })
    }

    /// Returns `None` for tempos that are not finite and positive, and for
    /// tempos below one micro-bpm.
    pub fn from_bpm(bpm: f32) -> Option<Tempo> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return None;
        }
        Tempo::new((bpm as f64 * 1_000_000.0).round() as u64)
    }

    pub fn bpm(&self) -> f32 {
        (self.bpm as f64 / 1_000_000.0) as f32
    }

    pub fn frames_per_beat(&self, sample_rate: usize) -> usize {
        ((sample_rate as f64) / (self.bpm as f64 / 60_000_000.0)) as usize
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct MetricStructure {
    pub time_signature: TimeSignature,
    pub tempo: Tempo,
}

impl MetricStructure {
    pub fn new(upper: u8, lower: u8, bpm: f32) -> Option<MetricStructure> {
        Some(MetricStructure {
            time_signature: TimeSignature::new(upper, lower)?,
            tempo: Tempo::from_bpm(bpm)?,
        })
    }

    pub fn beats_per_bar(&self) -> u8 {
        self.time_signature.upper
    }
}
