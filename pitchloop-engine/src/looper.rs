use crate::pitch_shift::PitchShifter;
use pitchloop_common::api::{Buffers, ClipState, LooperCommand, LooperState};
use pitchloop_common::clamp;
use pitchloop_common::controller::ControllerFeedback;
use pitchloop_common::gui_channel::{GuiEvent, GuiSender};
use pitchloop_common::midi::MidiEvent;


/// Longest loop that can be recorded.
pub const MAX_LOOP_SECONDS: usize = 60;
pub const MIN_LOOP_BEATS: u32 = 4;
pub const DEFAULT_FRAMES_PER_BEAT: usize = 120;
/// Frames of playback that are pitch shifted at a time.
pub const SCRATCH_SIZE: usize = 1024;

// note numbers and controllers, received on the track's channel
pub const NOTE_RECORD: u8 = 48;
pub const NOTE_STOP: u8 = 52;
pub const NOTE_PLAY: u8 = 53;
pub const CC_VOLUME: u8 = 7;

/// A single track. Requests to record, play or stop are queued and take effect
/// on the next call to [`Looper::bar`]. Playback is pitch shifted so that the
/// recorded material fits the loop length at the current tempo.
///
/// All buffers are allocated up front; nothing in here allocates, locks or
/// blocks once constructed.
pub struct Looper {
    track: u32,
    state: LooperState,

    fpb: usize,
    gain: f32,
    num_beats: u32,
    played_beats: u32,
    stop_record_on_bar: bool,

    end_point: usize,
    play_point: usize,
    last_written_sample_index: usize,
    sample: Box<[f32]>,

    scratch: Box<[f32]>,
    semitone_shift: f32,
    pitch_shifter: PitchShifter,

    gui_sender: GuiSender,
}

impl Looper {
    pub fn new(track: u32, sample_rate: usize, gui_sender: GuiSender) -> Looper {
        Looper::with_capacity(track, sample_rate * MAX_LOOP_SECONDS, gui_sender)
    }

    /// Creates a looper that can record at most `capacity` frames.
    pub fn with_capacity(track: u32, capacity: usize, gui_sender: GuiSender) -> Looper {
        debug!("creating looper {} with {} frames", track, capacity);
        Looper {
            track,
            state: LooperState::Stopped,
            fpb: DEFAULT_FRAMES_PER_BEAT,
            gain: 1.0,
            num_beats: MIN_LOOP_BEATS,
            played_beats: 0,
            stop_record_on_bar: false,
            end_point: 0,
            play_point: 0,
            last_written_sample_index: 0,
            sample: vec![0f32; capacity].into_boxed_slice(),
            scratch: vec![0f32; SCRATCH_SIZE].into_boxed_slice(),
            semitone_shift: 0.0,
            pitch_shifter: PitchShifter::new(),
            gui_sender,
        }
    }

    pub fn track(&self) -> u32 {
        self.track
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    pub fn clip_state(&self) -> ClipState {
        self.state.clip_state(self.has_loop())
    }

    pub fn num_beats(&self) -> u32 {
        self.num_beats
    }

    pub fn played_beats(&self) -> u32 {
        self.played_beats
    }

    pub fn play_point(&self) -> usize {
        self.play_point
    }

    pub fn end_point(&self) -> usize {
        self.end_point
    }

    pub fn last_written_sample_index(&self) -> usize {
        self.last_written_sample_index
    }

    pub fn capacity(&self) -> usize {
        self.sample.len()
    }

    /// Everything written by the current or last recording.
    pub fn recorded_samples(&self) -> &[f32] {
        &self.sample[..self.last_written_sample_index]
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn semitone_shift(&self) -> f32 {
        self.semitone_shift
    }

    pub fn frames_per_beat(&self) -> usize {
        self.fpb
    }

    pub fn set_frames_per_beat(&mut self, fpb: usize) {
        self.fpb = fpb;
    }

    fn has_loop(&self) -> bool {
        self.end_point > 0 || self.last_written_sample_index > 0
    }

    /// Applies a raw MIDI message. Only messages on this track's channel are
    /// considered; everything unmapped is ignored.
    pub fn midi<C: ControllerFeedback + ?Sized>(&mut self, data: &[u8], controller: &mut C) {
        let event = match MidiEvent::from_bytes(data) {
            Some(event) => event,
            None => return,
        };

        if event.channel() as u32 != self.track {
            return;
        }

        match event {
            MidiEvent::NoteOn {
                note: NOTE_RECORD, ..
            } => self.set_state(LooperState::RecordQueued, controller),
            MidiEvent::NoteOn {
                note: NOTE_PLAY, ..
            } => self.set_state(LooperState::PlayQueued, controller),
            MidiEvent::NoteOn {
                note: NOTE_STOP, ..
            } => self.set_state(LooperState::StopQueued, controller),
            MidiEvent::NoteOff {
                note: NOTE_RECORD, ..
            } => self.set_state(LooperState::StopQueued, controller),
            MidiEvent::ControllerChange {
                controller: CC_VOLUME,
                data,
                ..
            } => self.set_gain(data as f32 / 127.0, controller),
            _ => {}
        }
    }

    pub fn handle_command<C: ControllerFeedback + ?Sized>(
        &mut self,
        command: LooperCommand,
        controller: &mut C,
    ) {
        use LooperCommand::*;
        match command {
            Record => self.set_state(LooperState::RecordQueued, controller),
            Play => self.set_state(LooperState::PlayQueued, controller),
            Stop => self.set_state(LooperState::StopQueued, controller),
            SetGain(gain) => self.set_gain(gain, controller),
            SetLoopLength(factor) => self.set_loop_length(factor),
        }
    }

    fn set_state<C: ControllerFeedback + ?Sized>(&mut self, state: LooperState, controller: &mut C) {
        if self.state == LooperState::Recording {
            self.stop_record_on_bar = true;
        }
        self.state = state;
        controller.record(self.track, state == LooperState::RecordQueued);
        self.send_state();
    }

    fn set_gain<C: ControllerFeedback + ?Sized>(&mut self, gain: f32, controller: &mut C) {
        if gain.is_nan() {
            return;
        }
        self.gain = clamp(gain, 0.0, 1.0);
        controller.volume(self.track, self.gain);
    }

    fn send_state(&self) {
        self.gui_sender.send_update(GuiEvent::LooperStateChange {
            track: self.track,
            state: self.state,
            clip: self.clip_state(),
        });
    }

    /// Scales the loop length by `factor`, keeping at least
    /// [`MIN_LOOP_BEATS`] beats.
    pub fn set_loop_length(&mut self, factor: f32) {
        // float to int casts saturate, and NaN becomes 0
        let beats = (self.num_beats as f32 * factor) as u32;
        self.num_beats = beats.max(MIN_LOOP_BEATS);

        self.gui_sender.send_update(GuiEvent::LoopLength {
            track: self.track,
            beats: self.num_beats,
        });
        self.gui_sender.print(format_args!(
            "Looper {} loop length = {} beats",
            self.track, self.num_beats
        ));
    }

    fn update_pitch_shift(&mut self) {
        let length = self.num_beats as f32 * self.fpb as f32;
        self.semitone_shift = if self.end_point == 0 || length == 0.0 {
            0.0
        } else {
            let playback_speed = self.end_point as f32 / length;
            -12.0 * playback_speed.log2()
        };
    }

    pub fn process(&mut self, nframes: usize, buffers: &mut Buffers) {
        let nframes = nframes.min(buffers.len());
        self.update_pitch_shift();

        if self.state == LooperState::Playing {
            let gain = self.gain;
            let mut start = 0;
            while start < nframes {
                let len = (nframes - start).min(self.scratch.len());
                for s in self.scratch[..len].iter_mut() {
                    *s = if self.play_point < self.end_point {
                        self.sample[self.play_point] * gain
                    } else {
                        0.0
                    };
                    self.play_point += 1;
                }

                self.pitch_shifter.process(
                    self.semitone_shift,
                    &self.scratch[..len],
                    &mut buffers.output[start..start + len],
                );
                start += len;
            }
        } else if self.state == LooperState::Recording || self.stop_record_on_bar {
            let start = self.last_written_sample_index;
            let len = nframes.min(self.sample.len() - start);
            self.sample[start..start + len].copy_from_slice(&buffers.input[..len]);
            self.last_written_sample_index += len;
        }
    }

    /// Reports how far playback is through the loop. Only a playing looper
    /// reports; the engine calls this once per audio callback.
    pub fn send_progress(&self) {
        if self.state != LooperState::Playing {
            return;
        }
        let length = self.fpb as f32 * self.num_beats as f32;
        let fraction = if length > 0.0 {
            clamp(self.play_point as f32 / length, 0.0, 1.0)
        } else {
            0.0
        };
        self.gui_sender.send_update(GuiEvent::Progress {
            track: self.track,
            fraction,
        });
    }

    pub fn beat(&mut self) {
        if self.state == LooperState::Recording || self.stop_record_on_bar {
            self.num_beats = self.num_beats.saturating_add(1);
        }
        self.played_beats = self.played_beats.saturating_add(1);
    }

    /// Commits whatever is queued. Calling this again with nothing queued has
    /// no effect.
    pub fn bar(&mut self) {
        if self.stop_record_on_bar {
            self.stop_record_on_bar = false;
            self.end_point = self.last_written_sample_index;
            self.num_beats = self.num_beats.max(MIN_LOOP_BEATS);

            if self.last_written_sample_index >= self.sample.len() {
                self.gui_sender.print(format_args!(
                    "Looper {} recording truncated at {} frames",
                    self.track,
                    self.sample.len()
                ));
            }
            self.gui_sender.print(format_args!(
                "Looper {} recorded {} frames over {} beats",
                self.track, self.end_point, self.num_beats
            ));
        }

        if self.played_beats >= self.num_beats {
            self.play_point = 0;
            self.played_beats = 0;
        }

        match self.state {
            LooperState::RecordQueued => {
                self.gui_sender
                    .print(format_args!("Looper {} Q->Recording", self.track));
                self.state = LooperState::Recording;
                self.num_beats = 0;
                self.played_beats = 0;
                self.last_written_sample_index = 0;
                self.end_point = 0;
                self.play_point = 0;
                self.send_state();
            }
            LooperState::PlayQueued => {
                self.gui_sender
                    .print(format_args!("Looper {} Q->Playing", self.track));
                self.state = LooperState::Playing;
                self.play_point = 0;
                self.played_beats = 0;
                self.end_point = self.last_written_sample_index;
                self.send_state();
            }
            LooperState::StopQueued => {
                self.gui_sender
                    .print(format_args!("Looper {} Q->Stopped", self.track));
                self.state = LooperState::Stopped;
                self.end_point = self.last_written_sample_index;
                self.send_state();
            }
            _ => {}
        }
    }
}
