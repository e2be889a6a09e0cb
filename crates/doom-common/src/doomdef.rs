// doomdef.rs — global definitions shared by every subsystem

/// Engine version; recorded in and checked against demo headers.
pub const VERSION: u8 = 109;

pub const MAXPLAYERS: usize = 4;

/// Simulation rate, tics per second.
pub const TICRATE: i32 = 35;

/// Tic commands buffered per player.
pub const BACKUPTICS: usize = 12;

pub const SCREENWIDTH: usize = 320;
pub const SCREENHEIGHT: usize = 200;

/// Which game data set is loaded. Decides level naming, episode limits and
/// which monsters exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    /// DOOM 1 shareware, E1 only.
    Shareware,
    /// DOOM 1 registered, E1..E3.
    Registered,
    /// DOOM 2 and the Final DOOM IWADs, MAP01..MAP32.
    Commercial,
    /// Ultimate DOOM, E1..E4.
    Retail,
    #[default]
    Indetermined,
}

/// Mission pack for commercial mode; selects level titles only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMission {
    #[default]
    Doom,
    Doom2,
    PackTnt,
    PackPlut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Skill {
    Baby,
    Easy,
    #[default]
    Medium,
    Hard,
    Nightmare,
}

impl Skill {
    /// Zero-based skill index (as stored in demo headers). Out-of-range
    /// values clamp to the nearest skill.
    pub fn from_index(n: i32) -> Self {
        match n {
            i32::MIN..=0 => Skill::Baby,
            1 => Skill::Easy,
            2 => Skill::Medium,
            3 => Skill::Hard,
            _ => Skill::Nightmare,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }
}

/// Top-level game screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    Level,
    Intermission,
    Finale,
    #[default]
    DemoScreen,
    /// Screen transition marker; never ticked.
    Wipe,
}

/// One-shot transition request, drained at the start of each tic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameAction {
    #[default]
    Nothing,
    LoadLevel,
    NewGame,
    LoadGame,
    SaveGame,
    PlayDemo,
    Completed,
    Victory,
    WorldDone,
    Screenshot,
}

// ============================================================
// Key codes (host key translation targets)
// ============================================================

pub const KEY_RIGHTARROW: i32 = 0xae;
pub const KEY_LEFTARROW: i32 = 0xac;
pub const KEY_UPARROW: i32 = 0xad;
pub const KEY_DOWNARROW: i32 = 0xaf;
pub const KEY_ESCAPE: i32 = 27;
pub const KEY_ENTER: i32 = 13;
pub const KEY_TAB: i32 = 9;
pub const KEY_PAUSE: i32 = 0xff;
pub const KEY_RSHIFT: i32 = 0x80 + 0x36;
pub const KEY_RCTRL: i32 = 0x80 + 0x1d;
pub const KEY_RALT: i32 = 0x80 + 0x38;
pub const KEY_F12: i32 = 0x80 + 0x58;
