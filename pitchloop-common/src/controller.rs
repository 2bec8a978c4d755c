//! Feedback from the looper to control surfaces (LEDs, motor faders, the gui).
//!
//! All of these are called synchronously from the audio thread, so
//! implementations must not block, lock, or allocate.

use crate::gui_channel::{GuiEvent, GuiSender};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        records: usize,
        volumes: usize,
    }

    impl ControllerFeedback for Counter {
        fn record(&mut self, _track: u32, _active: bool) {
            self.records += 1;
        }

        fn volume(&mut self, _track: u32, _gain: f32) {
            self.volumes += 1;
        }
    }

    #[test]
    fn test_defaults_are_noops() {
        let mut c = Counter::default();
        c.mute(0, true);
        c.clip_select(0, true);
        c.record(0, true);
        c.volume(0, 0.5);
        assert_eq!(1, c.records);
        assert_eq!(1, c.volumes);
    }

    #[test]
    fn test_gui_controller() {
        let (sender, receiver) = GuiSender::new(16);
        let mut c = GuiController::new(sender);

        c.record(2, true);
        c.mute(2, false);
        c.clip_select(1, true);
        c.volume(3, 0.25);

        let events: Vec<GuiEvent> = receiver.try_iter().collect();
        assert_eq!(4, events.len());
        assert!(matches!(
            events[0],
            GuiEvent::Record {
                track: 2,
                active: true
            }
        ));
        assert!(matches!(
            events[1],
            GuiEvent::Mute {
                track: 2,
                muted: false
            }
        ));
        assert!(matches!(
            events[2],
            GuiEvent::ClipSelect {
                track: 1,
                selected: true
            }
        ));
        match events[3] {
            GuiEvent::Volume { track, gain } => {
                assert_eq!(3, track);
                assert_eq!(0.25, gain);
            }
            ref e => panic!("unexpected event {:?}", e),
        }
    }

    #[test]
    fn test_updater_fans_out() {
        let (a, rx_a) = GuiSender::new(16);
        let (b, rx_b) = GuiSender::new(16);

        let mut updater = ControllerUpdater::new(vec![
            Box::new(GuiController::new(a)),
            Box::new(GuiController::new(b)),
        ]);
        assert_eq!(2, updater.len());

        updater.record(0, true);
        updater.volume(0, 1.0);

        assert_eq!(2, rx_a.try_iter().count());
        assert_eq!(2, rx_b.try_iter().count());
    }
}

/// State changes a looper reports to the outside world. Only `record` is
/// mandatory; the rest default to doing nothing.
pub trait ControllerFeedback {
    fn mute(&mut self, _track: u32, _muted: bool) {}

    fn clip_select(&mut self, _track: u32, _selected: bool) {}

    fn record(&mut self, track: u32, active: bool);

    fn volume(&mut self, _track: u32, _gain: f32) {}
}

/// Discards all feedback.
impl ControllerFeedback for () {
    fn record(&mut self, _track: u32, _active: bool) {}
}

/// Forwards feedback into the gui channel.
#[derive(Clone)]
pub struct GuiController {
    gui_sender: GuiSender,
}

impl GuiController {
    pub fn new(gui_sender: GuiSender) -> GuiController {
        GuiController { gui_sender }
    }
}

impl ControllerFeedback for GuiController {
    fn mute(&mut self, track: u32, muted: bool) {
        self.gui_sender.send_update(GuiEvent::Mute { track, muted });
    }

    fn clip_select(&mut self, track: u32, selected: bool) {
        self.gui_sender
            .send_update(GuiEvent::ClipSelect { track, selected });
    }

    fn record(&mut self, track: u32, active: bool) {
        self.gui_sender.send_update(GuiEvent::Record { track, active });
    }

    fn volume(&mut self, track: u32, gain: f32) {
        self.gui_sender.send_update(GuiEvent::Volume { track, gain });
    }
}

/// Broadcasts feedback to every registered controller. The set of controllers
/// is fixed when the updater is built, before the audio thread starts.
pub struct ControllerUpdater {
    controllers: Vec<Box<dyn ControllerFeedback + Send>>,
}

impl ControllerUpdater {
    pub fn new(controllers: Vec<Box<dyn ControllerFeedback + Send>>) -> ControllerUpdater {
        ControllerUpdater { controllers }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl ControllerFeedback for ControllerUpdater {
    fn mute(&mut self, track: u32, muted: bool) {
        for c in &mut self.controllers {
            c.mute(track, muted);
        }
    }

    fn clip_select(&mut self, track: u32, selected: bool) {
        for c in &mut self.controllers {
            c.clip_select(track, selected);
        }
    }

    fn record(&mut self, track: u32, active: bool) {
        for c in &mut self.controllers {
            c.record(track, active);
        }
    }

    fn volume(&mut self, track: u32, gain: f32) {
        for c in &mut self.controllers {
            c.volume(track, gain);
        }
    }
}
