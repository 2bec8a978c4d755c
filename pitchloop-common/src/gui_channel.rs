use crate::api::{ClipState, LooperState};
use arrayvec::ArrayVec;
use crossbeam_queue::ArrayQueue;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_message() {
        let mut m = LogMessage::new();
        write!(m, "Looper {} Q->{}", 3, "Recording").unwrap();
        assert_eq!("Looper 3 Q->Recording", m.as_str());
    }

    #[test]
    fn test_log_message_truncates() {
        let mut m = LogMessage::new();
        let long = "x".repeat(LOG_MESSAGE_SIZE + 40);
        let _ = write!(m, "{}", long);
        assert_eq!(LOG_MESSAGE_SIZE, m.as_str().len());
    }

    #[test]
    fn test_send_and_drain() {
        let (sender, receiver) = GuiSender::new(8);

        sender.send_update(GuiEvent::Progress {
            track: 1,
            fraction: 0.25,
        });
        sender.print(format_args!("hello {}", 5));

        let events: Vec<GuiEvent> = receiver.try_iter().collect();
        assert_eq!(2, events.len());
        match &events[0] {
            GuiEvent::Progress { track, fraction } => {
                assert_eq!(1, *track);
                assert_eq!(0.25, *fraction);
            }
            e => panic!("unexpected event {:?}", e),
        }
        match &events[1] {
            GuiEvent::Print(m) => assert_eq!("hello 5", m.as_str()),
            e => panic!("unexpected event {:?}", e),
        }

        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_queue_overwrites_oldest() {
        let (sender, receiver) = GuiSender::new(4);

        for beat in 0..10u8 {
            sender.send_update(GuiEvent::Beat { bar: 0, beat });
        }

        let beats: Vec<u8> = receiver
            .try_iter()
            .map(|e| match e {
                GuiEvent::Beat { beat, .. } => beat,
                e => panic!("unexpected event {:?}", e),
            })
            .collect();

        assert_eq!(vec![6, 7, 8, 9], beats);
        assert_eq!(6, receiver.overwritten());
    }

    #[test]
    fn test_disconnected() {
        let sender = GuiSender::disconnected();
        sender.send_update(GuiEvent::Beat { bar: 0, beat: 0 });
        sender.print(format_args!("nobody is listening"));
    }

    #[test]
    fn test_clones_share_queue() {
        let (sender, receiver) = GuiSender::new(8);
        let other = sender.clone();
        sender.send_update(GuiEvent::LoopLength { track: 0, beats: 4 });
        other.send_update(GuiEvent::LoopLength { track: 1, beats: 8 });
        assert_eq!(2, receiver.try_iter().count());
    }
}

pub const LOG_MESSAGE_SIZE: usize = 256;

/// A fixed-capacity text line that can be formatted on the audio thread
/// without allocating. Text past the capacity is cut off.
#[derive(Clone)]
pub struct LogMessage {
    buffer: ArrayVec<u8, LOG_MESSAGE_SIZE>,
}

impl LogMessage {
    pub fn new() -> Self {
        LogMessage {
            buffer: ArrayVec::new(),
        }
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }
}

impl Default for LogMessage {
    fn default() -> Self {
        LogMessage::new()
    }
}

impl fmt::Debug for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl Write for LogMessage {
    fn write(&mut self, s: &[u8]) -> io::Result<usize> {
        let n = s.len().min(self.buffer.remaining_capacity());
        self.buffer
            .try_extend_from_slice(&s[..n])
            .map_err(|_| io::Error::new(io::ErrorKind::WriteZero, "log message full"))?;
        // report the whole slice as consumed so that formatting silently truncates
        Ok(s.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Notifications from the audio thread. None of the variants own heap data, so
/// events can be created and dropped on the audio thread.
#[derive(Clone, Debug)]
pub enum GuiEvent {
    Print(LogMessage),
    Progress {
        track: u32,
        fraction: f32,
    },
    LooperStateChange {
        track: u32,
        state: LooperState,
        clip: ClipState,
    },
    LoopLength {
        track: u32,
        beats: u32,
    },

    Record {
        track: u32,
        active: bool,
    },
    Mute {
        track: u32,
        muted: bool,
    },
    ClipSelect {
        track: u32,
        selected: bool,
    },
    Volume {
        track: u32,
        gain: f32,
    },

    Beat {
        bar: u64,
        beat: u8,
    },
}

struct Shared {
    queue: ArrayQueue<GuiEvent>,
    overwritten: AtomicU64,
}

/// Producer half of the gui channel. Sending never blocks: when the queue is
/// full the oldest unread event is replaced.
#[derive(Clone)]
pub struct GuiSender {
    shared: Option<Arc<Shared>>,
}

pub struct GuiReceiver {
    shared: Arc<Shared>,
}

impl GuiSender {
    pub fn new(capacity: usize) -> (GuiSender, GuiReceiver) {
        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(capacity.max(1)),
            overwritten: AtomicU64::new(0),
        });

        (
            GuiSender {
                shared: Some(shared.clone()),
            },
            GuiReceiver { shared },
        )
    }

    pub fn disconnected() -> GuiSender {
        GuiSender { shared: None }
    }

    pub fn send_update(&self, event: GuiEvent) {
        if let Some(shared) = &self.shared {
            if shared.queue.force_push(event).is_some() {
                shared.overwritten.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn print(&self, args: fmt::Arguments) {
        if self.shared.is_none() {
            return;
        }

        let mut message = LogMessage::new();
        // truncation is the only possible failure, and that is acceptable here
        let _ = message.write_fmt(args);
        self.send_update(GuiEvent::Print(message));
    }
}

impl GuiReceiver {
    pub fn try_recv(&self) -> Option<GuiEvent> {
        self.shared.queue.pop()
    }

    pub fn try_iter(&self) -> impl Iterator<Item = GuiEvent> + '_ {
        std::iter::from_fn(move || self.try_recv())
    }

    /// Number of events that were replaced before they could be read.
    pub fn overwritten(&self) -> u64 {
        self.shared.overwritten.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }
}

/// Logs events that are pending on `receiver`; used by headless consumers.
pub fn log_pending(receiver: &GuiReceiver) {
    for event in receiver.try_iter() {
        match event {
            GuiEvent::Print(m) => info!("{}", m.as_str()),
            GuiEvent::Progress { .. } | GuiEvent::Beat { .. } => trace!("{:?}", event),
            e => debug!("{:?}", e),
        }
    }
}
