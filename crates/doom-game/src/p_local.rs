// p_local.rs — play simulation context and shared constants

use doom_common::doomdef::{GameMode, Skill, MAXPLAYERS};
use doom_common::m_fixed::{Fixed, FRACBITS, FRACUNIT};
use doom_common::m_random::Random;

use crate::p_tick::{ThinkerId, ThinkerList};
use crate::p_user::Player;
use crate::r_defs::Level;
use crate::s_sound::SoundQueue;

pub const FLOATSPEED: Fixed = Fixed(FRACUNIT * 4);

pub const MAXHEALTH: i32 = 100;
pub const VIEWHEIGHT: Fixed = Fixed(41 * FRACUNIT);

/// Mapblocks are used to check movement against lines and things.
pub const MAPBLOCKUNITS: i32 = 128;
pub const MAPBLOCKSIZE: i32 = MAPBLOCKUNITS * FRACUNIT;
pub const MAPBLOCKSHIFT: i32 = FRACBITS + 7;
pub const MAPBTOFRAC: i32 = MAPBLOCKSHIFT - FRACBITS;

/// Largest radius of any map object; widens block searches.
pub const MAXRADIUS: Fixed = Fixed(32 * FRACUNIT);

pub const GRAVITY: Fixed = Fixed(FRACUNIT);
pub const MAXMOVE: Fixed = Fixed(30 * FRACUNIT);
pub const STOPSPEED: Fixed = Fixed(0x1000);
pub const FRICTION: Fixed = Fixed(0xe800);

/// Highest step a walker may climb.
pub const MAXSTEP: Fixed = Fixed(24 * FRACUNIT);

/// Spawn z sentinels resolved against the floor or ceiling of the spawn spot.
pub const ONFLOORZ: Fixed = Fixed::MIN;
pub const ONCEILINGZ: Fixed = Fixed::MAX;

pub const MAX_DEATHMATCH_STARTS: usize = 10;

/// How a level exit was requested from inside the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRequest {
    Normal,
    Secret,
}

/// Everything the play simulation touches during a tic.
pub struct PlayContext {
    pub level: Level,
    pub thinkers: ThinkerList,
    pub random: Random,

    pub players: [Player; MAXPLAYERS],
    pub playeringame: [bool; MAXPLAYERS],
    pub consoleplayer: usize,

    pub gamemode: GameMode,
    pub skill: Skill,
    pub gameepisode: i32,
    pub gamemap: i32,
    /// 0 = cooperative, 1 = deathmatch, 2 = altdeath.
    pub deathmatch: i32,
    pub netgame: bool,
    pub respawnmonsters: bool,
    pub nomonsters: bool,
    pub paused: bool,

    pub activeceilings: Vec<ThinkerId>,
    pub activeplats: Vec<ThinkerId>,

    /// Bumped before each search that marks lines as visited.
    pub validcount: i32,

    pub sounds: SoundQueue,
    pub exit_request: Option<ExitRequest>,
}

impl Default for PlayContext {
    fn default() -> Self {
        Self {
            level: Level::default(),
            thinkers: ThinkerList::new(),
            random: Random::new(),
            players: Default::default(),
            playeringame: [true, false, false, false],
            consoleplayer: 0,
            gamemode: GameMode::Indetermined,
            skill: Skill::default(),
            gameepisode: 1,
            gamemap: 1,
            deathmatch: 0,
            netgame: false,
            respawnmonsters: false,
            nomonsters: false,
            paused: false,
            activeceilings: Vec::new(),
            activeplats: Vec::new(),
            validcount: 1,
            sounds: SoundQueue::default(),
            exit_request: None,
        }
    }
}

impl PlayContext {
    pub fn new(gamemode: GameMode) -> Self {
        Self { gamemode, ..Self::default() }
    }

    pub fn leveltime(&self) -> i32 {
        self.level.leveltime
    }

    pub fn next_validcount(&mut self) -> i32 {
        self.validcount = self.validcount.wrapping_add(1);
        self.validcount
    }
}
