// wi_stuff.rs — intermission screen state (tallies and the next-level pause)
//
// Only the timing and counting are kept; drawing the screen belongs to the
// presentation layer.

use doom_common::d_event::Buttons;
use doom_common::doomdef::{GameMode, MAXPLAYERS, TICRATE};

use crate::p_user::Player;
use crate::s_sound::{Sfx, SoundQueue};

/// Seconds the "entering" location screen stays up.
const SHOWNEXTLOCDELAY: i32 = 4;

/// Par times in seconds, by episode and map.
const PARS: [[i32; 10]; 4] = [
    [0; 10],
    [0, 30, 75, 120, 90, 165, 180, 180, 30, 165],
    [0, 90, 90, 90, 120, 90, 360, 240, 30, 170],
    [0, 90, 45, 90, 150, 90, 90, 165, 30, 135],
];

const CPARS: [i32; 32] = [
    30, 90, 120, 120, 90, 150, 120, 120, 270, 90, //  1-10
    210, 150, 150, 150, 210, 150, 420, 150, 210, 150, // 11-20
    240, 150, 180, 150, 150, 300, 330, 420, 300, 180, // 21-30
    120, 30, // 31-32
];

/// Par time in tics; 0 when the level has none (episode 4).
pub fn par_time(gamemode: GameMode, episode: i32, map: i32) -> i32 {
    let secs = if gamemode == GameMode::Commercial {
        CPARS.get((map - 1).max(0) as usize).copied().unwrap_or(0)
    } else {
        PARS.get(episode.max(0) as usize)
            .and_then(|row| row.get(map.max(0) as usize))
            .copied()
            .unwrap_or(0)
    };
    TICRATE * secs
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WbPlayer {
    pub in_game: bool,
    pub skills: i32,
    pub sitems: i32,
    pub ssecret: i32,
    /// Level time in tics.
    pub stime: i32,
    pub frags: [i32; MAXPLAYERS],
}

/// What the finished level hands to the intermission.
#[derive(Debug, Clone, Copy, Default)]
pub struct WbStart {
    /// Episode, 0-based.
    pub epsd: i32,
    pub didsecret: bool,
    /// Previous and next levels, 0-based.
    pub last: i32,
    pub next: i32,
    pub maxkills: i32,
    pub maxitems: i32,
    pub maxsecret: i32,
    pub partime: i32,
    pub pnum: usize,
    pub plyr: [WbPlayer; MAXPLAYERS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiState {
    StatCount,
    ShowNextLoc,
    NoState,
}

/// Result of an intermission tic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiAction {
    Continue,
    WorldDone,
}

/// Percent of `n` over `total`, 100 when there was nothing to count.
fn percent(n: i32, total: i32) -> i32 {
    if total <= 0 {
        100
    } else {
        n * 100 / total
    }
}

#[derive(Debug, Clone)]
pub struct Intermission {
    pub wbs: WbStart,
    pub state: WiState,
    gamemode: GameMode,
    /// Used for timing of background animation.
    pub bcnt: i32,
    cnt: i32,
    acceleratestage: bool,
    sp_state: i32,
    pause: i32,
    pub cnt_kills: i32,
    pub cnt_items: i32,
    pub cnt_secret: i32,
    pub cnt_time: i32,
    pub cnt_par: i32,
}

impl Intermission {
    pub fn start(wbs: WbStart, gamemode: GameMode) -> Self {
        Self {
            wbs,
            state: WiState::StatCount,
            gamemode,
            bcnt: 0,
            cnt: 0,
            acceleratestage: false,
            sp_state: 1,
            pause: TICRATE,
            cnt_kills: -1,
            cnt_items: -1,
            cnt_secret: -1,
            cnt_time: -1,
            cnt_par: -1,
        }
    }

    /// Any new attack or use press skips ahead.
    fn check_for_accelerate(&mut self, players: &mut [Player; MAXPLAYERS], playeringame: &[bool; MAXPLAYERS]) {
        for (player, &ingame) in players.iter_mut().zip(playeringame) {
            if !ingame {
                continue;
            }
            let buttons = player.cmd.button_flags();
            if buttons.contains(Buttons::ATTACK) {
                if !player.attackdown {
                    self.acceleratestage = true;
                }
                player.attackdown = true;
            } else {
                player.attackdown = false;
            }
            if buttons.contains(Buttons::USE) {
                if !player.usedown {
                    self.acceleratestage = true;
                }
                player.usedown = true;
            } else {
                player.usedown = false;
            }
        }
    }

    fn init_no_state(&mut self) {
        self.state = WiState::NoState;
        self.acceleratestage = false;
        self.cnt = 10;
    }

    fn init_show_next_loc(&mut self) {
        self.state = WiState::ShowNextLoc;
        self.acceleratestage = false;
        self.cnt = SHOWNEXTLOCDELAY * TICRATE;
    }

    fn update_stats(&mut self, sounds: &mut SoundQueue) {
        let me = self.wbs.plyr[self.wbs.pnum];
        let kills = percent(me.skills, self.wbs.maxkills);
        let items = percent(me.sitems, self.wbs.maxitems);
        let secret = percent(me.ssecret, self.wbs.maxsecret);
        let time = me.stime / TICRATE;
        let par = self.wbs.partime / TICRATE;

        if self.acceleratestage && self.sp_state != 10 {
            self.acceleratestage = false;
            self.cnt_kills = kills;
            self.cnt_items = items;
            self.cnt_secret = secret;
            self.cnt_time = time;
            self.cnt_par = par;
            sounds.start(None, Sfx::Barexp);
            self.sp_state = 10;
        }

        let tick_sound = self.bcnt & 3 == 0;
        match self.sp_state {
            2 => {
                self.cnt_kills += 2;
                if tick_sound {
                    sounds.start(None, Sfx::Pistol);
                }
                if self.cnt_kills >= kills {
                    self.cnt_kills = kills;
                    sounds.start(None, Sfx::Barexp);
                    self.sp_state += 1;
                }
            }
            4 => {
                self.cnt_items += 2;
                if tick_sound {
                    sounds.start(None, Sfx::Pistol);
                }
                if self.cnt_items >= items {
                    self.cnt_items = items;
                    sounds.start(None, Sfx::Barexp);
                    self.sp_state += 1;
                }
            }
            6 => {
                self.cnt_secret += 2;
                if tick_sound {
                    sounds.start(None, Sfx::Pistol);
                }
                if self.cnt_secret >= secret {
                    self.cnt_secret = secret;
                    sounds.start(None, Sfx::Barexp);
                    self.sp_state += 1;
                }
            }
            8 => {
                if tick_sound {
                    sounds.start(None, Sfx::Pistol);
                }
                self.cnt_time = (self.cnt_time + 3).min(time);
                self.cnt_par += 3;
                if self.cnt_par >= par {
                    self.cnt_par = par;
                    if self.cnt_time >= time {
                        sounds.start(None, Sfx::Barexp);
                        self.sp_state += 1;
                    }
                }
            }
            10 => {
                if self.acceleratestage {
                    sounds.start(None, Sfx::Swtchn);
                    if self.gamemode == GameMode::Commercial {
                        self.init_no_state();
                    } else {
                        self.init_show_next_loc();
                    }
                }
            }
            s if s & 1 != 0 => {
                self.pause -= 1;
                if self.pause == 0 {
                    self.sp_state += 1;
                    self.pause = TICRATE;
                }
            }
            _ => {}
        }
    }

    /// Advances one tic. Player commands drive the skip-ahead.
    pub fn ticker(
        &mut self,
        players: &mut [Player; MAXPLAYERS],
        playeringame: &[bool; MAXPLAYERS],
        sounds: &mut SoundQueue,
    ) -> WiAction {
        self.bcnt += 1;

        if self.bcnt == 1 {
            // intermission music
            if self.gamemode == GameMode::Commercial {
                sounds.change_music("dm2int", true);
            } else {
                sounds.change_music("inter", true);
            }
        }

        self.check_for_accelerate(players, playeringame);

        match self.state {
            WiState::StatCount => self.update_stats(sounds),
            WiState::ShowNextLoc => {
                self.cnt -= 1;
                if self.cnt == 0 || self.acceleratestage {
                    self.init_no_state();
                }
            }
            WiState::NoState => {
                self.cnt -= 1;
                if self.cnt == 0 {
                    return WiAction::WorldDone;
                }
            }
        }
        WiAction::Continue
    }
}
