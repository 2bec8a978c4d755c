use serde::{Deserialize, Serialize};
use std::str::FromStr;


/// The per-track state machine. The `*Queued` states are requests that take
/// effect at the next bar.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LooperState {
    Stopped,
    RecordQueued,
    Recording,
    PlayQueued,
    Playing,
    StopQueued,
}

impl LooperState {
    pub fn clip_state(&self, has_loop: bool) -> ClipState {
        match self {
            LooperState::Stopped if has_loop => ClipState::Loaded,
            LooperState::Stopped => ClipState::Empty,
            LooperState::RecordQueued | LooperState::PlayQueued => ClipState::Queued,
            LooperState::Recording => ClipState::Recording,
            LooperState::Playing => ClipState::Playing,
            LooperState::StopQueued => ClipState::Stopping,
        }
    }
}

/// How a clip selector should draw a track.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClipState {
    Empty,
    Loaded,
    Queued,
    Playing,
    Recording,
    Stopping,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum LooperCommand {
    Record,
    Play,
    Stop,

    SetGain(f32),
    SetLoopLength(f32),
}

impl LooperCommand {
    pub fn from_str(command: &str, args: &[&str]) -> Result<LooperCommand, String> {
        use LooperCommand::*;

        let float_arg = || {
            args.get(0)
                .and_then(|s| f32::from_str(s).ok())
                .ok_or(format!("{} expects a numeric argument", command))
        };

        match command {
            "Record" => Ok(Record),
            "Play" => Ok(Play),
            "Stop" => Ok(Stop),
            "SetGain" => float_arg().map(SetGain),
            "SetLoopLength" => float_arg().map(SetLoopLength),
            _ => Err(format!("{} is not a valid command", command)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Command {
    Looper(LooperCommand, u32),

    Start,
    Stop,
    StartStop,

    SetTempoBPM(f32),
    SetTimeSignature(u8, u8),
}

impl Command {
    pub fn from_str(command: &str, args: &[&str]) -> Result<Command, String> {
        match command {
            "Start" => Ok(Command::Start),
            "Stop" => Ok(Command::Stop),
            "StartStop" => Ok(Command::StartStop),

            "SetTempoBPM" => args
                .get(0)
                .and_then(|s| f32::from_str(s).ok())
                .filter(|bpm| *bpm > 0.0)
                .map(Command::SetTempoBPM)
                .ok_or("SetTempoBPM expects a single positive argument, the bpm".to_string()),

            "SetTimeSignature" => {
                let upper = args.get(0).and_then(|s| u8::from_str(s).ok());
                let lower = args.get(1).and_then(|s| u8::from_str(s).ok());
                match (upper, lower) {
                    (Some(upper), Some(lower)) => Ok(Command::SetTimeSignature(upper, lower)),
                    _ => Err("SetTimeSignature expects two arguments, upper and lower".to_string()),
                }
            }

            _ => {
                let track = args
                    .get(0)
                    .ok_or(format!("{} expects a track", command))
                    .and_then(|s| {
                        u32::from_str(s).map_err(|_| format!("{} expects a track number", command))
                    })?;

                let lc = LooperCommand::from_str(command, &args[1..])?;
                Ok(Command::Looper(lc, track))
            }
        }
    }
}

/// The audio slices handed to a looper for one callback (or part of one).
/// Loopers add into `output`; the host is responsible for clearing it.
pub struct Buffers<'a> {
    pub input: &'a [f32],
    pub output: &'a mut [f32],
}

impl<'a> Buffers<'a> {
    pub fn new(input: &'a [f32], output: &'a mut [f32]) -> Buffers<'a> {
        Buffers { input, output }
    }

    pub fn len(&self) -> usize {
        self.input.len().min(self.output.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
