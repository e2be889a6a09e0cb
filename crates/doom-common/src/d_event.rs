// d_event.rs — input events, the event queue and per-tic commands
//
// The host's input thread posts events; the simulation thread drains them at
// the start of each tic.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    KeyDown,
    KeyUp,
    Mouse,
}

/// A host input event. For keys `data1` is the key code; for the mouse
/// `data1` holds buttons and `data2`/`data3` the x/y motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub ev_type: EventType,
    pub data1: i32,
    pub data2: i32,
    pub data3: i32,
}

impl Event {
    pub fn key_down(key: i32) -> Self {
        Self { ev_type: EventType::KeyDown, data1: key, data2: 0, data3: 0 }
    }

    pub fn key_up(key: i32) -> Self {
        Self { ev_type: EventType::KeyUp, data1: key, data2: 0, data3: 0 }
    }

    pub fn mouse(buttons: i32, dx: i32, dy: i32) -> Self {
        Self { ev_type: EventType::Mouse, data1: buttons, data2: dx, data3: dy }
    }
}

// ============================================================
// Tic commands
// ============================================================

bitflags::bitflags! {
    /// `TicCmd::buttons`. When `SPECIAL` is set the low bits carry a
    /// `BTS_*` code instead of the action buttons.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Buttons: u8 {
        const ATTACK     = 0x01;
        const USE        = 0x02;
        const CHANGE     = 0x04;
        const WEAPONMASK = 0x08 | 0x10 | 0x20;
        const SPECIAL    = 0x80;
    }
}

pub const BT_WEAPONSHIFT: u8 = 3;
pub const BT_SPECIALMASK: u8 = 3;

pub const BTS_PAUSE: u8 = 1;
pub const BTS_SAVEGAME: u8 = 2;
pub const BTS_SAVEMASK: u8 = 4 | 8 | 16;
pub const BTS_SAVESHIFT: u8 = 2;

/// One player's input for one tic. Only the first four fields are stored
/// in demos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicCmd {
    /// *2048 for move
    pub forwardmove: i8,
    /// *2048 for move
    pub sidemove: i8,
    /// <<16 for angle delta
    pub angleturn: i16,
    pub consistancy: i16,
    pub chatchar: u8,
    pub buttons: u8,
}

impl TicCmd {
    pub fn button_flags(&self) -> Buttons {
        Buttons::from_bits_truncate(self.buttons)
    }
}

// ============================================================
// Event queue
// ============================================================

pub const MAXEVENTS: usize = 64;

/// Bounded single-consumer input queue.
pub struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Producer handle for the host input thread.
    pub fn sender(&self) -> EventQueueSender {
        EventQueueSender {
            sender: self.sender.clone(),
        }
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued right now; never blocks.
    pub fn drain(&self) -> impl Iterator<Item = Event> + '_ {
        self.receiver.try_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(MAXEVENTS)
    }
}

#[derive(Clone)]
pub struct EventQueueSender {
    sender: Sender<Event>,
}

impl EventQueueSender {
    /// Returns `false` if the event was dropped (queue full or closed).
    pub fn post_event(&self, ev: Event) -> bool {
        match self.sender.try_send(ev) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_in_order() {
        let q = EventQueue::new(8);
        let tx = q.sender();
        assert!(tx.post_event(Event::key_down(1)));
        assert!(tx.post_event(Event::key_up(1)));
        let got: Vec<Event> = q.drain().collect();
        assert_eq!(got, vec![Event::key_down(1), Event::key_up(1)]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_queue_full_drops_events() {
        let q = EventQueue::new(2);
        let tx = q.sender();
        assert!(tx.post_event(Event::key_down(1)));
        assert!(tx.post_event(Event::key_down(2)));
        assert!(!tx.post_event(Event::key_down(3)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_cross_thread_producer() {
        let q = EventQueue::default();
        let tx = q.sender();
        let handle = std::thread::spawn(move || {
            for k in 0..10 {
                tx.post_event(Event::mouse(0, k, 0));
            }
        });
        handle.join().unwrap();
        let sum: i32 = q.drain().map(|e| e.data2).sum();
        assert_eq!(sum, 45);
    }

    #[test]
    fn test_button_flags() {
        let cmd = TicCmd { buttons: 0x83, ..Default::default() };
        let b = cmd.button_flags();
        assert!(b.contains(Buttons::SPECIAL));
        assert_eq!(cmd.buttons & BT_SPECIALMASK, BTS_PAUSE | BTS_SAVEGAME);
    }
}
