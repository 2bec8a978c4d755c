#[macro_use]
extern crate log;

use crate::looper::Looper;
use crate::transport::Transport;
use crossbeam_channel::Receiver;
use pitchloop_common::api::{Buffers, Command, LooperState};
use pitchloop_common::config::Config;
use pitchloop_common::controller::ControllerFeedback;
use pitchloop_common::error::ConfigError;
use pitchloop_common::gui_channel::{GuiEvent, GuiSender};
use pitchloop_common::music::{MetricStructure, Tempo, TimeSignature};

pub mod looper;
pub mod pitch_shift;
pub mod ring;
pub mod transport;


#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineState {
    Stopped,
    Active,
}

/// Owns one [`Looper`] per track and drives them from the audio callback:
/// it applies queued commands and MIDI, then runs the loopers over the block,
/// stopping at every beat so that beat and bar transitions land on the exact
/// frame.
pub struct Engine {
    state: EngineState,
    transport: Transport,
    monitor_input: bool,

    command_input: Receiver<Command>,
    gui_sender: GuiSender,

    loopers: Vec<Looper>,
}

impl Engine {
    pub fn new(
        config: &Config,
        sample_rate: usize,
        gui_sender: GuiSender,
        command_input: Receiver<Command>,
    ) -> Result<Engine, ConfigError> {
        config.validate()?;
        let transport = Transport::new(config.metric_structure()?, sample_rate);

        let mut loopers = Vec::with_capacity(config.tracks);
        for track in 0..config.tracks as u32 {
            let mut looper = Looper::new(track, sample_rate, gui_sender.clone());
            looper.set_frames_per_beat(transport.frames_per_beat());
            loopers.push(looper);
        }

        info!(
            "Starting engine with {} tracks at {} Hz, {} frames per beat",
            loopers.len(),
            sample_rate,
            transport.frames_per_beat()
        );

        Ok(Engine {
            state: EngineState::Active,
            transport,
            monitor_input: config.monitor_input,
            command_input,
            gui_sender,
            loopers,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn metric_structure(&self) -> MetricStructure {
        self.transport.metric_structure()
    }

    pub fn loopers(&self) -> &[Looper] {
        &self.loopers
    }

    pub fn looper(&self, track: u32) -> Option<&Looper> {
        self.loopers.get(track as usize)
    }

    fn start(&mut self) {
        if self.state != EngineState::Active {
            self.state = EngineState::Active;
            self.gui_sender.print(format_args!("Engine started"));
        }
    }

    fn stop(&mut self) {
        self.state = EngineState::Stopped;
        self.transport.reset();
        self.gui_sender.print(format_args!("Engine stopped"));
    }

    fn set_tempo(&mut self, tempo: Tempo) {
        self.transport.set_tempo(tempo);
        let fpb = self.transport.frames_per_beat();
        for looper in &mut self.loopers {
            looper.set_frames_per_beat(fpb);
        }
        self.gui_sender.print(format_args!(
            "Tempo {} bpm, {} frames per beat",
            tempo.bpm(),
            fpb
        ));
    }

    fn handle_command<C: ControllerFeedback + ?Sized>(
        &mut self,
        command: Command,
        controller: &mut C,
    ) {
        match command {
            Command::Looper(lc, track) => match self.loopers.get_mut(track as usize) {
                Some(looper) => looper.handle_command(lc, controller),
                None => self
                    .gui_sender
                    .print(format_args!("No looper for track {}", track)),
            },
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::StartStop => match self.state {
                EngineState::Active => self.stop(),
                EngineState::Stopped => self.start(),
            },
            Command::SetTempoBPM(bpm) => match Tempo::from_bpm(bpm) {
                Some(tempo) => self.set_tempo(tempo),
                None => self.gui_sender.print(format_args!("Invalid tempo {}", bpm)),
            },
            Command::SetTimeSignature(upper, lower) => match TimeSignature::new(upper, lower) {
                Some(ts) => self.transport.set_time_signature(ts),
                None => self.gui_sender.print(format_args!(
                    "Invalid time signature {}/{}",
                    upper, lower
                )),
            },
        }
    }

    /// Runs one audio callback. Loopers add into `output`, which the caller
    /// clears beforehand; with input monitoring on, `output` is overwritten
    /// with `input` first.
    pub fn process<C: ControllerFeedback + ?Sized>(
        &mut self,
        controller: &mut C,
        input: &[f32],
        output: &mut [f32],
        midi_events: &[[u8; 3]],
    ) {
        while let Ok(command) = self.command_input.try_recv() {
            self.handle_command(command, controller);
        }

        for event in midi_events {
            for looper in &mut self.loopers {
                looper.midi(event, controller);
            }
        }

        let frames = input.len().min(output.len());
        if self.monitor_input {
            output[..frames].copy_from_slice(&input[..frames]);
        }

        if self.state != EngineState::Active {
            return;
        }

        let mut start = 0;
        while start < frames {
            if let Some(tick) = self.transport.take_tick() {
                self.gui_sender.send_update(GuiEvent::Beat {
                    bar: tick.bar,
                    beat: tick.beat,
                });
                for looper in &mut self.loopers {
                    looper.beat();
                    if tick.is_bar() {
                        looper.bar();
                    }
                }
            }

            let len = self.transport.frames_until_tick().min(frames - start);
            let mut buffers = Buffers::new(&input[start..start + len], &mut output[start..start + len]);
            for looper in &mut self.loopers {
                looper.process(len, &mut buffers);
            }

            self.transport.advance(len);
            start += len;
        }

        for looper in &self.loopers {
            looper.send_progress();
        }
    }
}
