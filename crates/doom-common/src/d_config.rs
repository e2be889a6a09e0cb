// d_config.rs — startup configuration and game mode identification

use std::path::{Path, PathBuf};

use crate::doomdef::{GameMission, GameMode, Skill};
use crate::m_argv::ComArgs;

/// Default demo buffer size in kilobytes.
pub const DEFAULT_MAXDEMO_KB: usize = 128;

/// IWAD file names, in search order, with the data set each one implies.
pub const IWAD_NAMES: &[(&str, GameMode, GameMission)] = &[
    ("doom2.wad", GameMode::Commercial, GameMission::Doom2),
    ("plutonia.wad", GameMode::Commercial, GameMission::PackPlut),
    ("tnt.wad", GameMode::Commercial, GameMission::PackTnt),
    ("doomu.wad", GameMode::Retail, GameMission::Doom),
    ("doom.wad", GameMode::Registered, GameMission::Doom),
    ("doom1.wad", GameMode::Shareware, GameMission::Doom),
];

/// `-warp` arguments; interpretation depends on the game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warp {
    /// `-warp m` (commercial) or a lone episode number.
    Single(i32),
    /// `-warp e m`
    EpisodeMap(i32, i32),
}

/// Everything the command line can configure.
#[derive(Debug, Clone)]
pub struct DoomConfig {
    pub iwad: Option<PathBuf>,
    pub pwads: Vec<PathBuf>,
    pub skill: Skill,
    pub start_episode: i32,
    pub start_map: i32,
    pub warp: Option<Warp>,
    /// Start a level immediately instead of the demo loop.
    pub autostart: bool,
    /// 0 = cooperative/single, 1 = deathmatch, 2 = altdeath.
    pub deathmatch: i32,
    pub respawnparm: bool,
    pub fastparm: bool,
    pub nomonsters: bool,
    pub playdemo: Option<String>,
    pub timedemo: Option<String>,
    pub record: Option<String>,
    pub maxdemo_kb: usize,
    pub devparm: bool,
    /// Host-side cap on tics to run; `None` runs until quit.
    pub max_tics: Option<u64>,
}

impl Default for DoomConfig {
    fn default() -> Self {
        Self {
            iwad: None,
            pwads: Vec::new(),
            skill: Skill::Medium,
            start_episode: 1,
            start_map: 1,
            warp: None,
            autostart: false,
            deathmatch: 0,
            respawnparm: false,
            fastparm: false,
            nomonsters: false,
            playdemo: None,
            timedemo: None,
            record: None,
            maxdemo_kb: DEFAULT_MAXDEMO_KB,
            devparm: false,
            max_tics: None,
        }
    }
}

impl DoomConfig {
    pub fn from_args(args: &ComArgs) -> Self {
        let mut cfg = DoomConfig::default();

        cfg.iwad = args.parm_value("-iwad").map(PathBuf::from);
        cfg.pwads = args.parm_values("-file").into_iter().map(PathBuf::from).collect();

        cfg.nomonsters = args.check_parm("-nomonsters").is_some();
        cfg.respawnparm = args.check_parm("-respawn").is_some();
        cfg.fastparm = args.check_parm("-fast").is_some();
        cfg.devparm = args.check_parm("-devparm").is_some();

        if args.check_parm("-altdeath").is_some() {
            cfg.deathmatch = 2;
        } else if args.check_parm("-deathmatch").is_some() {
            cfg.deathmatch = 1;
        }

        // -skill is 1-based on the command line
        if let Some(n) = args.parm_value("-skill").and_then(|s| s.parse::<i32>().ok()) {
            cfg.skill = Skill::from_index(n - 1);
            cfg.autostart = true;
        }

        if let Some(n) = args.parm_value("-episode").and_then(|s| s.parse::<i32>().ok()) {
            cfg.start_episode = n;
            cfg.start_map = 1;
            cfg.autostart = true;
        }

        let warp: Vec<i32> = args
            .parm_values("-warp")
            .iter()
            .filter_map(|s| s.parse::<i32>().ok())
            .collect();
        cfg.warp = match warp.as_slice() {
            [] => None,
            [m] => Some(Warp::Single(*m)),
            [e, m, ..] => Some(Warp::EpisodeMap(*e, *m)),
        };
        if cfg.warp.is_some() {
            cfg.autostart = true;
        }

        cfg.playdemo = args.parm_value("-playdemo").map(str::to_string);
        cfg.timedemo = args.parm_value("-timedemo").map(str::to_string);
        cfg.record = args.parm_value("-record").map(str::to_string);
        if cfg.record.is_some() {
            cfg.autostart = true;
        }
        if let Some(kb) = args.parm_value("-maxdemo").and_then(|s| s.parse::<usize>().ok()) {
            cfg.maxdemo_kb = kb;
        }
        cfg.max_tics = args.parm_value("-maxtics").and_then(|s| s.parse::<u64>().ok());

        cfg
    }

    /// Applies `-warp` for the identified game mode.
    pub fn resolve_warp(&mut self, mode: GameMode) {
        match (self.warp, mode) {
            (Some(Warp::Single(m)), GameMode::Commercial) => {
                self.start_map = m;
            }
            (Some(Warp::Single(e)), _) => {
                self.start_episode = e;
                self.start_map = 1;
            }
            (Some(Warp::EpisodeMap(_, m)), GameMode::Commercial) => {
                self.start_map = m;
            }
            (Some(Warp::EpisodeMap(e, m)), _) => {
                self.start_episode = e;
                self.start_map = m;
            }
            (None, _) => {}
        }
    }

    /// All archives in load order: the IWAD first, then patch WADs.
    pub fn wad_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::with_capacity(1 + self.pwads.len());
        if let Some(ref iwad) = self.iwad {
            files.push(iwad.clone());
        }
        files.extend(self.pwads.iter().cloned());
        files
    }
}

/// Game mode implied by an IWAD file name, if it is one of the known ones.
pub fn identify_by_filename(path: &Path) -> Option<(GameMode, GameMission)> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    IWAD_NAMES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, mode, mission)| (mode, mission))
}

/// Looks for a known IWAD in `dir`.
pub fn find_iwad(dir: &Path) -> Option<PathBuf> {
    IWAD_NAMES
        .iter()
        .map(|(name, _, _)| dir.join(name))
        .find(|p| p.is_file())
}
