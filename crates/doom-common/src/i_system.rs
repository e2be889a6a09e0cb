// i_system.rs — host collaborator interfaces
//
// Window, audio and console live outside the engine. The core talks to them
// only through these traits; null implementations are provided for headless
// runs and tests.

use crate::doomdef::{SCREENHEIGHT, SCREENWIDTH};

/// Receives a palette and a finished indexed-color frame.
pub trait GraphicsSink {
    fn initialize(&mut self);
    /// 256 RGB triples.
    fn update_palette(&mut self, palette: &[u8]);
    /// `SCREENWIDTH * SCREENHEIGHT` palette indices.
    fn screen_ready(&mut self, screen: &[u8]);
}

pub type SoundHandle = i32;

/// Plays raw samples and songs on behalf of the engine.
pub trait SoundSink {
    fn start_sound(
        &mut self,
        id: usize,
        samples: &[u8],
        sample_rate: u16,
        volume: i32,
        separation: i32,
        pitch: i32,
        priority: i32,
    ) -> SoundHandle;
    fn update_sound_params(&mut self, handle: SoundHandle, volume: i32, separation: i32, pitch: i32);
    fn stop_sound(&mut self, handle: SoundHandle);
    fn sound_is_playing(&self, handle: SoundHandle) -> bool;

    fn register_song(&mut self, data: &[u8]) -> i32;
    fn play_song(&mut self, handle: i32, looping: bool);
    fn pause_song(&mut self, handle: i32);
    fn resume_song(&mut self, handle: i32);
    fn stop_song(&mut self, handle: i32);
    fn unregister_song(&mut self, handle: i32);
}

/// Text output for the banner and diagnostics.
pub trait ConsoleSink: Send {
    fn write(&mut self, text: &str);
    fn set_title(&mut self, title: &str);
}

// ============================================================
// Null implementations
// ============================================================

/// Counts frames and keeps the last one; draws nothing.
#[derive(Debug, Default)]
pub struct NullGraphics {
    pub frames: u64,
    pub palette_updates: u64,
    pub last_frame: Vec<u8>,
}

impl GraphicsSink for NullGraphics {
    fn initialize(&mut self) {
        self.last_frame = vec![0; SCREENWIDTH * SCREENHEIGHT];
    }

    fn update_palette(&mut self, _palette: &[u8]) {
        self.palette_updates += 1;
    }

    fn screen_ready(&mut self, screen: &[u8]) {
        self.frames += 1;
        self.last_frame.clear();
        self.last_frame.extend_from_slice(screen);
    }
}

/// Records sound starts; every sound finishes immediately.
#[derive(Debug, Default)]
pub struct NullSound {
    pub started: Vec<usize>,
    next_handle: SoundHandle,
}

impl SoundSink for NullSound {
    fn start_sound(
        &mut self,
        id: usize,
        _samples: &[u8],
        _sample_rate: u16,
        _volume: i32,
        _separation: i32,
        _pitch: i32,
        _priority: i32,
    ) -> SoundHandle {
        self.started.push(id);
        self.next_handle += 1;
        self.next_handle
    }

    fn update_sound_params(&mut self, _handle: SoundHandle, _volume: i32, _separation: i32, _pitch: i32) {}
    fn stop_sound(&mut self, _handle: SoundHandle) {}
    fn sound_is_playing(&self, _handle: SoundHandle) -> bool {
        false
    }

    fn register_song(&mut self, _data: &[u8]) -> i32 {
        1
    }
    fn play_song(&mut self, _handle: i32, _looping: bool) {}
    fn pause_song(&mut self, _handle: i32) {}
    fn resume_song(&mut self, _handle: i32) {}
    fn stop_song(&mut self, _handle: i32) {}
    fn unregister_song(&mut self, _handle: i32) {}
}
