use arrayvec::ArrayVec;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender, TrySendError};
use pitchloop_common::api::Command;
use pitchloop_common::config::Config;
use pitchloop_common::controller::{ControllerUpdater, GuiController};
use pitchloop_common::error::ConfigError;
use pitchloop_common::gui_channel::{log_pending, GuiReceiver, GuiSender};
use pitchloop_engine::Engine;
use std::fmt;
use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

/// MIDI messages handled per callback; the rest of a burst is dropped.
const MAX_MIDI_EVENTS: usize = 128;
const COMMAND_QUEUE_SIZE: usize = 100;
const GUI_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub enum HostError {
    Jack(jack::Error),
    Config(ConfigError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Jack(e) => write!(f, "jack error: {:?}", e),
            HostError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HostError {}

impl From<jack::Error> for HostError {
    fn from(e: jack::Error) -> Self {
        HostError::Jack(e)
    }
}

impl From<ConfigError> for HostError {
    fn from(e: ConfigError) -> Self {
        HostError::Config(e)
    }
}

struct Notifications {
    sample_rate: usize,
}

impl jack::NotificationHandler for Notifications {
    fn thread_init(&self, _: &jack::Client) {
        debug!("JACK: thread init");
    }

    fn sample_rate(&mut self, _: &jack::Client, srate: jack::Frames) -> jack::Control {
        if srate as usize == self.sample_rate {
            return jack::Control::Continue;
        }
        // loop buffers are sized for the sample rate we started with
        error!("JACK: sample rate changed to {}, shutting down", srate);
        jack::Control::Quit
    }

    fn xrun(&mut self, _: &jack::Client) -> jack::Control {
        warn!("JACK: xrun occurred");
        jack::Control::Continue
    }
}

// drains the gui channel into the log until told to stop
fn gui_listener(
    receiver: GuiReceiver,
    stop: crossbeam_channel::Receiver<()>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut overwritten = 0;
        loop {
            log_pending(&receiver);

            if receiver.overwritten() != overwritten {
                overwritten = receiver.overwritten();
                debug!("{} gui events were dropped", overwritten);
            }

            match stop.recv_timeout(GUI_POLL_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log_pending(&receiver);
    })
}

fn send_command(sender: &Sender<Command>, command: Command) {
    match sender.try_send(command) {
        Ok(()) => {}
        Err(TrySendError::Full(c)) => warn!("Command queue is full, dropping {:?}", c),
        Err(TrySendError::Disconnected(_)) => error!("Engine is no longer running"),
    }
}

/// Reads commands like `Record 0` or `SetTempoBPM 90` from stdin until `q`
/// or end of input.
fn command_prompt(sender: &Sender<Command>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        };

        let mut parts = line.split_whitespace();
        let name = match parts.next() {
            Some("q") => break,
            Some(name) => name,
            None => continue,
        };
        let args: Vec<&str> = parts.collect();

        match Command::from_str(name, &args) {
            Ok(command) => send_command(sender, command),
            Err(e) => warn!("{}", e),
        }
    }
}

pub fn jack_main(config: Config) -> Result<(), HostError> {
    let (client, _status) =
        jack::Client::new("pitchloop", jack::ClientOptions::NO_START_SERVER)?;

    let input = client.register_port("in", jack::AudioIn::default())?;
    let mut output = client.register_port("out", jack::AudioOut::default())?;
    let midi_in = client.register_port("midi_in", jack::MidiIn::default())?;

    let (gui_sender, gui_receiver) = GuiSender::new(config.gui_queue_size);
    let (command_sender, command_receiver) = bounded(COMMAND_QUEUE_SIZE);

    let sample_rate = client.sample_rate();
    let mut engine = Engine::new(
        &config,
        sample_rate,
        gui_sender.clone(),
        command_receiver,
    )?;
    let mut controllers =
        ControllerUpdater::new(vec![Box::new(GuiController::new(gui_sender))]);

    let process_callback =
        move |_client: &jack::Client, ps: &jack::ProcessScope| -> jack::Control {
            let out = output.as_mut_slice(ps);
            for v in out.iter_mut() {
                *v = 0.0;
            }

            let mut midi: ArrayVec<[u8; 3], MAX_MIDI_EVENTS> = ArrayVec::new();
            for event in midi_in.iter(ps) {
                if let Ok(bytes) = <[u8; 3]>::try_from(event.bytes) {
                    if midi.try_push(bytes).is_err() {
                        break;
                    }
                }
            }

            engine.process(&mut controllers, input.as_slice(ps), out, &midi);
            jack::Control::Continue
        };
    let process = jack::ClosureProcessHandler::new(process_callback);

    let active_client = client.activate_async(Notifications { sample_rate }, process)?;
    info!("pitchloop is running; type a command, or q to quit");

    let (stop_tx, stop_rx) = bounded(1);
    let listener = gui_listener(gui_receiver, stop_rx);

    command_prompt(&command_sender);

    let deactivated = active_client.deactivate();
    let _ = stop_tx.send(());
    if listener.join().is_err() {
        warn!("Gui listener panicked");
    }
    deactivated?;

    Ok(())
}
