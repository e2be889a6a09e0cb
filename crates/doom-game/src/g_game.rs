// g_game.rs — game session: tic dispatch, level flow and demos

/*
Copyright (C) 1993-1996 Id Software, Inc.

This program is free software; you can redistribute it and/or
modify it under the terms of the GNU General Public License
as published by the Free Software Foundation; either version 2
of the License, or (at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.

See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program; if not, write to the Free Software
Foundation, Inc., 59 Temple Place - Suite 330, Boston, MA  02111-1307, USA.
*/

use std::time::Instant;

use doom_common::common::{com_dprintf, com_printf, i_error};
use doom_common::d_config::DoomConfig;
use doom_common::d_event::{
    Buttons, Event, EventType, TicCmd, BTS_PAUSE, BTS_SAVEGAME, BT_SPECIALMASK,
};
use doom_common::doom_error::{DoomError, DoomResult};
use doom_common::doomdef::*;
use doom_common::m_fixed::{Fixed, FRACBITS};
use doom_common::w_wad::{LumpStore, PuTag};
use doom_common::wadfiles::MapThing;

use crate::d_main::DemoLoop;
use crate::f_finale::{Finale, FinaleAction};
use crate::g_demo::{DemoHeader, DemoReader, DemoRecorder, DemoSink};
use crate::p_local::{ExitRequest, PlayContext};
use crate::p_map::check_position;
use crate::p_mobj::spawn_player;
use crate::p_setup::setup_level;
use crate::p_tick::p_ticker;
use crate::p_user::PlayerState;
use crate::s_sound::{level_music, Sfx, SoundSystem};
use crate::wi_stuff::{par_time, Intermission, WbPlayer, WbStart, WiAction};

pub const NUMKEYS: usize = 256;

const FORWARDMOVE: [i8; 2] = [0x19, 0x32];
const SIDEMOVE: [i8; 2] = [0x18, 0x28];
const ANGLETURN: [i16; 3] = [640, 1280, 320];
/// For accelerative turning.
const SLOWTURNTICS: i32 = 6;
const MAXPLMOVE: i32 = FORWARDMOVE[1] as i32;

const KEY_FIRE: i32 = KEY_RCTRL;
const KEY_USE: i32 = b' ' as i32;
const KEY_STRAFE: i32 = KEY_RALT;
const KEY_SPEED: i32 = KEY_RSHIFT;
const KEY_STRAFELEFT: i32 = b',' as i32;
const KEY_STRAFERIGHT: i32 = b'.' as i32;

/// One running game: the play simulation plus everything around it.
pub struct GameSession {
    pub ctx: PlayContext,
    pub store: LumpStore,
    pub config: DoomConfig,
    pub sound: SoundSystem,

    pub gamestate: GameState,
    pub gameaction: GameAction,
    pub gametic: i32,
    /// Commands for each player, indexed by tic modulo `BACKUPTICS`.
    pub netcmds: [[TicCmd; BACKUPTICS]; MAXPLAYERS],
    pub usergame: bool,
    pub skytexture: &'static str,
    pub demoloop: DemoLoop,

    // parameters for a deferred new game
    d_skill: Skill,
    d_episode: i32,
    d_map: i32,

    respawnparm: bool,
    fastparm: bool,

    secretexit: bool,
    pub wminfo: WbStart,
    pub intermission: Option<Intermission>,
    pub finale: Option<Finale>,

    // demo state
    pub demoplayback: bool,
    pub demorecording: bool,
    pub netdemo: bool,
    pub singledemo: bool,
    pub timingdemo: bool,
    defdemoname: String,
    demo_reader: Option<DemoReader>,
    demo_recorder: Option<DemoRecorder>,
    demo_sink: Box<dyn DemoSink>,
    starttime: Option<Instant>,

    /// Set when the session has nothing left to do.
    pub quit_requested: bool,

    // command building
    gamekeydown: [bool; NUMKEYS],
    mousebuttons: [bool; 3],
    mousex: i32,
    turnheld: i32,
    sendpause: bool,
}

impl GameSession {
    pub fn new(config: DoomConfig, store: LumpStore, gamemode: GameMode, demo_sink: Box<dyn DemoSink>) -> Self {
        let mut ctx = PlayContext::new(gamemode);
        ctx.deathmatch = config.deathmatch;
        ctx.nomonsters = config.nomonsters;
        for player in ctx.players.iter_mut() {
            player.playerstate = PlayerState::Live;
        }

        Self {
            ctx,
            store,
            d_skill: config.skill,
            d_episode: config.start_episode,
            d_map: config.start_map,
            respawnparm: config.respawnparm,
            fastparm: config.fastparm,
            config,
            sound: SoundSystem::new(),
            gamestate: GameState::DemoScreen,
            gameaction: GameAction::Nothing,
            gametic: 0,
            netcmds: [[TicCmd::default(); BACKUPTICS]; MAXPLAYERS],
            usergame: false,
            skytexture: "SKY1",
            demoloop: DemoLoop::default(),
            secretexit: false,
            wminfo: WbStart::default(),
            intermission: None,
            finale: None,
            demoplayback: false,
            demorecording: false,
            netdemo: false,
            singledemo: false,
            timingdemo: false,
            defdemoname: String::new(),
            demo_reader: None,
            demo_recorder: None,
            demo_sink,
            starttime: None,
            quit_requested: false,
            gamekeydown: [false; NUMKEYS],
            mousebuttons: [false; 3],
            mousex: 0,
            turnheld: 0,
            sendpause: false,
        }
    }

    pub fn gamemode(&self) -> GameMode {
        self.ctx.gamemode
    }

    // ============================================================
    // Input
    // ============================================================

    /// Gets info needed to make ticcmds for the players. Returns true if
    /// the event was eaten.
    pub fn responder(&mut self, ev: &Event) -> bool {
        // any other key ends the demo loop and leaves the title up
        if self.gameaction == GameAction::Nothing
            && !self.singledemo
            && (self.demoplayback || self.gamestate == GameState::DemoScreen)
        {
            let pressed = ev.ev_type == EventType::KeyDown || (ev.ev_type == EventType::Mouse && ev.data1 != 0);
            if !pressed {
                return false;
            }
            if self.demoplayback {
                self.stop_playback();
            }
            self.demoloop.halt();
            self.gamestate = GameState::DemoScreen;
            return true;
        }

        match ev.ev_type {
            EventType::KeyDown => {
                if ev.data1 == KEY_PAUSE {
                    self.sendpause = true;
                    return true;
                }
                if let Some(down) = self.gamekeydown.get_mut(ev.data1 as usize) {
                    *down = true;
                }
                // eat key down events
                true
            }
            EventType::KeyUp => {
                if let Some(down) = self.gamekeydown.get_mut(ev.data1 as usize) {
                    *down = false;
                }
                // always let key up events filter down
                false
            }
            EventType::Mouse => {
                for (i, b) in self.mousebuttons.iter_mut().enumerate() {
                    *b = ev.data1 & (1 << i) != 0;
                }
                self.mousex += ev.data2;
                true
            }
        }
    }

    fn key(&self, key: i32) -> bool {
        self.gamekeydown.get(key as usize).copied().unwrap_or(false)
    }

    /// Builds a ticcmd from all of the available inputs.
    pub fn build_ticcmd(&mut self) -> TicCmd {
        let mut cmd = TicCmd::default();

        let strafe = self.key(KEY_STRAFE) || self.mousebuttons[2];
        let speed = usize::from(self.key(KEY_SPEED));
        let right = self.key(KEY_RIGHTARROW);
        let left = self.key(KEY_LEFTARROW);

        // use two stage accelerative turning on the keyboard
        if right || left {
            self.turnheld += 1;
        } else {
            self.turnheld = 0;
        }
        let tspeed = if self.turnheld < SLOWTURNTICS { 2 } else { speed };

        let mut forward: i32 = 0;
        let mut side: i32 = 0;

        if strafe {
            if right {
                side += SIDEMOVE[speed] as i32;
            }
            if left {
                side -= SIDEMOVE[speed] as i32;
            }
        } else {
            if right {
                cmd.angleturn = cmd.angleturn.wrapping_sub(ANGLETURN[tspeed]);
            }
            if left {
                cmd.angleturn = cmd.angleturn.wrapping_add(ANGLETURN[tspeed]);
            }
        }

        if self.key(KEY_UPARROW) {
            forward += FORWARDMOVE[speed] as i32;
        }
        if self.key(KEY_DOWNARROW) {
            forward -= FORWARDMOVE[speed] as i32;
        }
        if self.key(KEY_STRAFERIGHT) {
            side += SIDEMOVE[speed] as i32;
        }
        if self.key(KEY_STRAFELEFT) {
            side -= SIDEMOVE[speed] as i32;
        }

        let mut buttons = Buttons::empty();
        if self.key(KEY_FIRE) || self.mousebuttons[0] {
            buttons |= Buttons::ATTACK;
        }
        if self.key(KEY_USE) {
            buttons |= Buttons::USE;
        }
        if self.mousebuttons[1] {
            forward += FORWARDMOVE[speed] as i32;
        }

        if strafe {
            side += self.mousex * 2;
        } else {
            cmd.angleturn = cmd.angleturn.wrapping_sub((self.mousex * 0x8) as i16);
        }
        self.mousex = 0;

        cmd.forwardmove = forward.clamp(-MAXPLMOVE, MAXPLMOVE) as i8;
        cmd.sidemove = side.clamp(-MAXPLMOVE, MAXPLMOVE) as i8;
        cmd.buttons = buttons.bits();

        // special buttons
        if self.sendpause {
            self.sendpause = false;
            cmd.buttons = (Buttons::SPECIAL.bits()) | BTS_PAUSE;
        }
        cmd
    }

    /// Stores a command for `player` at the current tic.
    pub fn set_ticcmd(&mut self, player: usize, cmd: TicCmd) {
        let buf = self.gametic as usize % BACKUPTICS;
        self.netcmds[player][buf] = cmd;
    }

    // ============================================================
    // G_Ticker
    // ============================================================

    /// Make ticcmd_ts for the players, run actions, then advance the
    /// current screen one tic.
    pub fn ticker(&mut self) -> DoomResult<()> {
        // do player reborns if needed
        for i in 0..MAXPLAYERS {
            if self.ctx.playeringame[i] && self.ctx.players[i].playerstate == PlayerState::Reborn {
                self.do_reborn(i)?;
            }
        }

        // do things to change the game state
        while self.gameaction != GameAction::Nothing {
            match self.gameaction {
                GameAction::LoadLevel => self.do_load_level()?,
                GameAction::NewGame => self.do_new_game()?,
                GameAction::PlayDemo => self.do_play_demo()?,
                GameAction::Completed => self.do_completed(),
                GameAction::Victory => self.start_finale(),
                GameAction::WorldDone => self.do_world_done()?,
                GameAction::LoadGame | GameAction::SaveGame | GameAction::Screenshot => {
                    com_dprintf(&format!("G_Ticker: {:?} is not supported\n", self.gameaction));
                    self.gameaction = GameAction::Nothing;
                }
                GameAction::Nothing => {}
            }
        }

        // get commands, check consistancy, and build new consistancy check
        let buf = self.gametic as usize % BACKUPTICS;
        let mut demo_done = false;
        for i in 0..MAXPLAYERS {
            if !self.ctx.playeringame[i] {
                continue;
            }
            let mut cmd = self.netcmds[i][buf];
            if self.demoplayback {
                demo_done |= !self.read_demo_ticcmd(&mut cmd);
            }
            if self.demorecording {
                demo_done |= !self.write_demo_ticcmd(&mut cmd);
            }
            self.ctx.players[i].cmd = cmd;
        }
        if demo_done {
            self.check_demo_status()?;
        }

        // check for special buttons
        for i in 0..MAXPLAYERS {
            if !self.ctx.playeringame[i] {
                continue;
            }
            let buttons = self.ctx.players[i].cmd.buttons;
            if buttons & Buttons::SPECIAL.bits() == 0 {
                continue;
            }
            match buttons & BT_SPECIALMASK {
                BTS_PAUSE => self.ctx.paused = !self.ctx.paused,
                BTS_SAVEGAME => com_dprintf("G_Ticker: savegame request ignored\n"),
                _ => {}
            }
        }

        // do main actions
        match self.gamestate {
            GameState::Level => {
                p_ticker(&mut self.ctx);
                match self.ctx.exit_request.take() {
                    Some(ExitRequest::Normal) => self.exit_level(),
                    Some(ExitRequest::Secret) => self.secret_exit_level(),
                    None => {}
                }
            }
            GameState::Intermission => {
                if let Some(wi) = self.intermission.as_mut() {
                    let action = wi.ticker(&mut self.ctx.players, &self.ctx.playeringame, &mut self.ctx.sounds);
                    if action == WiAction::WorldDone {
                        self.world_done();
                    }
                }
            }
            GameState::Finale => {
                if let Some(f) = self.finale.as_mut() {
                    let action = f.ticker(&self.ctx.players, &self.ctx.playeringame, &mut self.ctx.sounds);
                    if action == FinaleAction::WorldDone {
                        self.gameaction = GameAction::WorldDone;
                    }
                }
            }
            GameState::DemoScreen => self.demoloop.page_ticker(),
            GameState::Wipe => {}
        }

        self.gametic += 1;
        Ok(())
    }

    // ============================================================
    // Level flow
    // ============================================================

    /// Can be called by the startup code or the menu task.
    pub fn defered_init_new(&mut self, skill: Skill, episode: i32, map: i32) {
        self.d_skill = skill;
        self.d_episode = episode;
        self.d_map = map;
        self.gameaction = GameAction::NewGame;
    }

    fn do_new_game(&mut self) -> DoomResult<()> {
        self.demoplayback = false;
        self.netdemo = false;
        self.ctx.netgame = false;
        self.ctx.deathmatch = 0;
        self.ctx.playeringame = [true, false, false, false];
        self.respawnparm = false;
        self.fastparm = false;
        self.ctx.nomonsters = false;
        self.ctx.consoleplayer = 0;
        self.init_new(self.d_skill, self.d_episode, self.d_map)?;
        self.gameaction = GameAction::Nothing;
        Ok(())
    }

    /// Starts a new game at `episode`/`map`, clamping both to what the
    /// current game mode has.
    pub fn init_new(&mut self, skill: Skill, episode: i32, map: i32) -> DoomResult<()> {
        self.ctx.paused = false;

        let gamemode = self.gamemode();
        let episode = match gamemode {
            GameMode::Retail => episode.clamp(1, 4),
            GameMode::Shareware => 1,
            _ => episode.clamp(1, 3),
        };
        let mut map = map.max(1);
        if map > 9 && gamemode != GameMode::Commercial {
            map = 9;
        }

        self.ctx.random.clear();
        self.ctx.respawnmonsters = skill == Skill::Nightmare || self.respawnparm;

        // force players to be initialized upon first level load
        for player in self.ctx.players.iter_mut() {
            player.playerstate = PlayerState::Reborn;
        }

        self.usergame = true;
        self.ctx.paused = false;
        self.demoplayback = false;
        self.ctx.gameepisode = episode;
        self.ctx.gamemap = map;
        self.ctx.skill = skill;

        // set the sky map for the episode
        self.skytexture = if gamemode == GameMode::Commercial {
            commercial_sky(map)
        } else {
            match episode {
                2 => "SKY2",
                3 => "SKY3",
                4 => "SKY4",
                _ => "SKY1",
            }
        };

        self.do_load_level()
    }

    fn do_load_level(&mut self) -> DoomResult<()> {
        // the sky texture changes at the start of the new episode blocks
        if self.gamemode() == GameMode::Commercial {
            self.skytexture = commercial_sky(self.ctx.gamemap);
        }

        self.gamestate = GameState::Level;
        self.intermission = None;
        self.finale = None;

        for (player, &ingame) in self.ctx.players.iter_mut().zip(&self.ctx.playeringame) {
            if ingame && player.playerstate == PlayerState::Dead {
                player.playerstate = PlayerState::Reborn;
            }
            player.frags = [0; MAXPLAYERS];
        }

        let (episode, map) = (self.ctx.gameepisode, self.ctx.gamemap);
        setup_level(&mut self.ctx, &mut self.store, episode, map)?;

        if self.ctx.deathmatch != 0 {
            for i in 0..MAXPLAYERS {
                if self.ctx.playeringame[i] {
                    self.ctx.players[i].mo = None;
                    self.deathmatch_spawn_player(i)?;
                }
            }
        }

        let music = level_music(self.gamemode(), episode, map);
        self.ctx.sounds.change_music(&music, true);

        self.gameaction = GameAction::Nothing;

        // clear cmd building stuff
        self.gamekeydown = [false; NUMKEYS];
        self.mousebuttons = [false; 3];
        self.mousex = 0;
        self.sendpause = false;
        self.ctx.paused = false;

        log::info!("{} loaded at gametic {}", self.ctx.level.name, self.gametic);
        Ok(())
    }

    /// Returns false if the player cannot be respawned at the given
    /// mapthing spot because something is occupying it.
    pub fn check_spot(&mut self, playernum: usize, mthing: &MapThing) -> bool {
        let x = Fixed((mthing.x as i32) << FRACBITS);
        let y = Fixed((mthing.y as i32) << FRACBITS);

        let mo = match self.ctx.players[playernum].mo {
            Some(mo) if self.ctx.thinkers.is_live(mo) => mo,
            _ => {
                // first spawn of level, before corpses
                return (0..playernum).all(|i| {
                    match self.ctx.players[i].mo.and_then(|id| self.ctx.thinkers.mobj(id)) {
                        Some(other) => other.x != x || other.y != y,
                        None => true,
                    }
                });
            }
        };

        if !check_position(&mut self.ctx, mo, x, y).fits {
            return false;
        }

        self.ctx.sounds.start(None, Sfx::Telept);
        true
    }

    /// Spawns a player at one of the random deathmatch spots. Called at
    /// level load and each death.
    pub fn deathmatch_spawn_player(&mut self, playernum: usize) -> DoomResult<()> {
        let selections = self.ctx.level.deathmatchstarts.len();
        if selections < 4 {
            return Err(i_error(format!("Only {} deathmatch spots, 4 required", selections)));
        }

        for _ in 0..20 {
            let i = self.ctx.random.p_random() as usize % selections;
            let mut spot = self.ctx.level.deathmatchstarts[i];
            if self.check_spot(playernum, &spot) {
                spot.thing_type = playernum as i16 + 1;
                spawn_player(&mut self.ctx, &spot);
                return Ok(());
            }
        }

        // no good spot, so the player will probably get stuck
        if let Some(spot) = self.ctx.level.playerstarts[playernum] {
            spawn_player(&mut self.ctx, &spot);
        }
        Ok(())
    }

    fn do_reborn(&mut self, playernum: usize) -> DoomResult<()> {
        if !self.ctx.netgame {
            // reload the level from scratch
            self.gameaction = GameAction::LoadLevel;
            return Ok(());
        }

        // first dissasociate the corpse
        if let Some(mo) = self.ctx.players[playernum].mo.and_then(|id| self.ctx.thinkers.mobj_mut(id)) {
            mo.player = None;
        }

        if self.ctx.deathmatch != 0 {
            return self.deathmatch_spawn_player(playernum);
        }

        if let Some(spot) = self.ctx.level.playerstarts[playernum] {
            if self.check_spot(playernum, &spot) {
                spawn_player(&mut self.ctx, &spot);
                return Ok(());
            }
        }

        // try to spawn at one of the other players spots
        for i in 0..MAXPLAYERS {
            if let Some(mut spot) = self.ctx.level.playerstarts[i] {
                if self.check_spot(playernum, &spot) {
                    spot.thing_type = playernum as i16 + 1;
                    spawn_player(&mut self.ctx, &spot);
                    return Ok(());
                }
            }
        }

        // he's going to be inside something. Too bad.
        if let Some(spot) = self.ctx.level.playerstarts[playernum] {
            spawn_player(&mut self.ctx, &spot);
        }
        Ok(())
    }

    pub fn exit_level(&mut self) {
        self.secretexit = false;
        self.gameaction = GameAction::Completed;
    }

    /// Here's for the german edition.
    pub fn secret_exit_level(&mut self) {
        // IF NO WOLF3D LEVELS, NO SECRET EXIT!
        self.secretexit = !(self.gamemode() == GameMode::Commercial && self.store.check_num_for_name("map31").is_none());
        self.gameaction = GameAction::Completed;
    }

    fn do_completed(&mut self) {
        self.gameaction = GameAction::Nothing;

        for (player, &ingame) in self.ctx.players.iter_mut().zip(&self.ctx.playeringame) {
            if ingame {
                // take away cards and stuff
                player.damagecount = 0;
                player.bonuscount = 0;
            }
        }

        let gamemode = self.gamemode();
        let (episode, map) = (self.ctx.gameepisode, self.ctx.gamemap);
        if gamemode != GameMode::Commercial {
            match map {
                8 => {
                    self.gameaction = GameAction::Victory;
                    return;
                }
                9 => {
                    for player in self.ctx.players.iter_mut() {
                        player.didsecret = true;
                    }
                }
                _ => {}
            }
        }

        let consoleplayer = self.ctx.consoleplayer;
        let mut wminfo = WbStart {
            didsecret: self.ctx.players[consoleplayer].didsecret,
            epsd: episode - 1,
            last: map - 1,
            ..WbStart::default()
        };

        // wminfo.next is 0 biased, unlike gamemap
        wminfo.next = if gamemode == GameMode::Commercial {
            match (self.secretexit, map) {
                (true, 15) => 30,
                (true, 31) => 31,
                (false, 31) | (false, 32) => 15,
                _ => map,
            }
        } else if self.secretexit {
            // go to secret level
            8
        } else if map == 9 {
            // returning from secret level
            match episode {
                1 => 3,
                2 => 5,
                3 => 6,
                _ => 2,
            }
        } else {
            // go to next level
            map
        };

        wminfo.maxkills = self.ctx.level.totalkills;
        wminfo.maxitems = self.ctx.level.totalitems;
        wminfo.maxsecret = self.ctx.level.totalsecret;
        wminfo.partime = par_time(gamemode, episode, map);
        wminfo.pnum = consoleplayer;

        let leveltime = self.ctx.leveltime();
        for (i, plyr) in wminfo.plyr.iter_mut().enumerate() {
            let player = &self.ctx.players[i];
            *plyr = WbPlayer {
                in_game: self.ctx.playeringame[i],
                skills: player.killcount,
                sitems: player.itemcount,
                ssecret: player.secretcount,
                stime: leveltime,
                frags: player.frags,
            };
        }

        self.wminfo = wminfo;
        self.gamestate = GameState::Intermission;
        self.intermission = Some(Intermission::start(wminfo, gamemode));
    }

    /// The intermission is over; pick the finale or the next level.
    pub fn world_done(&mut self) {
        self.gameaction = GameAction::WorldDone;

        let consoleplayer = self.ctx.consoleplayer;
        if self.secretexit {
            self.ctx.players[consoleplayer].didsecret = true;
        }

        if self.gamemode() == GameMode::Commercial {
            match self.ctx.gamemap {
                15 | 31 if self.secretexit => self.start_finale(),
                6 | 11 | 20 | 30 => self.start_finale(),
                _ => {}
            }
        }
    }

    fn do_world_done(&mut self) -> DoomResult<()> {
        self.gamestate = GameState::Level;
        self.ctx.gamemap = self.wminfo.next + 1;
        self.do_load_level()?;
        self.gameaction = GameAction::Nothing;
        Ok(())
    }

    fn start_finale(&mut self) {
        self.gameaction = GameAction::Nothing;
        self.gamestate = GameState::Finale;
        self.intermission = None;
        let (episode, map) = (self.ctx.gameepisode, self.ctx.gamemap);
        self.finale = Some(Finale::start(self.gamemode(), episode, map, &mut self.ctx.sounds));
    }

    // ============================================================
    // Demo recording
    // ============================================================

    pub fn record_demo(&mut self, name: &str) {
        self.usergame = false;
        self.demo_recorder = Some(DemoRecorder::new(name, self.config.maxdemo_kb));
        self.demorecording = true;
    }

    fn demo_header(&self) -> DemoHeader {
        DemoHeader {
            version: VERSION,
            skill: self.ctx.skill,
            episode: self.ctx.gameepisode,
            map: self.ctx.gamemap,
            deathmatch: self.ctx.deathmatch,
            respawnparm: self.respawnparm,
            fastparm: self.fastparm,
            nomonsters: self.ctx.nomonsters,
            consoleplayer: self.ctx.consoleplayer,
            playeringame: self.ctx.playeringame,
        }
    }

    pub fn begin_recording(&mut self) {
        let header = self.demo_header();
        if let Some(rec) = self.demo_recorder.as_mut() {
            rec.begin(&header);
        }
    }

    /// Returns false when the demo buffer is full.
    fn write_demo_ticcmd(&mut self, cmd: &mut TicCmd) -> bool {
        match self.demo_recorder.as_mut() {
            Some(rec) => rec.write_ticcmd(cmd),
            None => true,
        }
    }

    // ============================================================
    // Demo playback
    // ============================================================

    pub fn defer_play_demo(&mut self, name: &str) {
        self.defdemoname = name.to_string();
        self.gameaction = GameAction::PlayDemo;
    }

    pub fn time_demo(&mut self, name: &str) {
        self.timingdemo = true;
        self.defer_play_demo(name);
    }

    fn do_play_demo(&mut self) -> DoomResult<()> {
        self.gameaction = GameAction::Nothing;

        if self.store.check_num_for_name(&self.defdemoname).is_none() && !self.singledemo && !self.timingdemo {
            // the demo loop simply moves on
            self.demoloop.advance_demo();
            return Ok(());
        }
        let data = self.store.cache_lump_name(&self.defdemoname, PuTag::Static)?;

        let (header, reader) = match DemoReader::new(data) {
            Ok(r) => r,
            Err(err @ DoomError::DemoVersion { .. }) => {
                com_printf(&format!("{}\n", err));
                if self.singledemo || self.timingdemo {
                    self.quit_requested = true;
                } else {
                    self.demoloop.advance_demo();
                }
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.ctx.playeringame = header.playeringame;
        self.ctx.consoleplayer = header.consoleplayer;
        self.ctx.deathmatch = header.deathmatch;
        self.respawnparm = header.respawnparm;
        self.fastparm = header.fastparm;
        self.ctx.nomonsters = header.nomonsters;
        if header.is_netdemo() {
            self.ctx.netgame = true;
            self.netdemo = true;
        }

        self.init_new(header.skill, header.episode, header.map)?;
        self.usergame = false;
        self.demoplayback = true;
        self.demo_reader = Some(reader);

        if self.timingdemo {
            self.starttime = Some(Instant::now());
        }
        com_dprintf(&format!("Playing demo {}\n", self.defdemoname));
        Ok(())
    }

    /// Returns false at the end of the demo.
    fn read_demo_ticcmd(&mut self, cmd: &mut TicCmd) -> bool {
        match self.demo_reader.as_mut() {
            Some(reader) => reader.read_ticcmd(cmd),
            None => false,
        }
    }

    fn stop_playback(&mut self) {
        self.demoplayback = false;
        self.demo_reader = None;
        self.netdemo = false;
        self.ctx.netgame = false;
        self.ctx.deathmatch = 0;
        self.ctx.playeringame = [true, false, false, false];
        self.respawnparm = false;
        self.fastparm = false;
        self.ctx.nomonsters = false;
        self.ctx.consoleplayer = 0;
    }

    /// Called after a death or level completion to allow demos to be
    /// cleaned up. Returns true if a new demo loop action will take place.
    pub fn check_demo_status(&mut self) -> DoomResult<bool> {
        if self.timingdemo {
            let realtics = self
                .starttime
                .map(|t| (t.elapsed().as_secs_f64() * TICRATE as f64) as i64)
                .unwrap_or(0);
            com_printf(&format!("timed {} gametics in {} realtics\n", self.gametic, realtics));
            self.timingdemo = false;
            self.stop_playback();
            self.quit_requested = true;
            return Ok(false);
        }

        if self.demoplayback {
            if self.singledemo {
                self.stop_playback();
                self.quit_requested = true;
                return Ok(false);
            }
            self.stop_playback();
            self.demoloop.advance_demo();
            return Ok(true);
        }

        if self.demorecording {
            self.demorecording = false;
            if let Some(rec) = self.demo_recorder.take() {
                let (name, data) = rec.finish();
                self.demo_sink.write_demo(&name, &data)?;
                log::info!("demo {} recorded ({} bytes)", name, data.len());
            }
            self.quit_requested = true;
        }
        Ok(false)
    }

    /// Recorded demos still in flight, by name and current size.
    pub fn recording_len(&self) -> Option<usize> {
        self.demo_recorder.as_ref().map(|r| r.len())
    }
}

fn commercial_sky(map: i32) -> &'static str {
    if map < 12 {
        "SKY1"
    } else if map < 21 {
        "SKY2"
    } else {
        "SKY3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_demo::MemoryDemoSink;
    use doom_common::wadfiles::{WadBuilder, WadKind};

    fn session(gamemode: GameMode) -> GameSession {
        let wad = WadBuilder::new().lump("PLAYPAL", vec![0; 768]).build(WadKind::Iwad);
        let store = LumpStore::from_bytes("test.wad", wad).unwrap();
        GameSession::new(DoomConfig::default(), store, gamemode, Box::new(MemoryDemoSink::default()))
    }

    #[test]
    fn test_build_ticcmd_from_keys() {
        let mut s = session(GameMode::Registered);
        s.gamestate = GameState::Level;
        s.responder(&Event::key_down(KEY_UPARROW));
        s.responder(&Event::key_down(KEY_RCTRL));
        let cmd = s.build_ticcmd();
        assert_eq!(cmd.forwardmove, 0x19);
        assert_eq!(cmd.button_flags(), Buttons::ATTACK);

        s.responder(&Event::key_down(KEY_RSHIFT));
        assert_eq!(s.build_ticcmd().forwardmove, 0x32);

        s.responder(&Event::key_up(KEY_UPARROW));
        s.responder(&Event::key_up(KEY_RCTRL));
        s.responder(&Event::key_up(KEY_RSHIFT));
        assert_eq!(s.build_ticcmd(), TicCmd::default());
    }

    #[test]
    fn test_turning_accelerates_after_slow_tics() {
        let mut s = session(GameMode::Registered);
        s.gamestate = GameState::Level;
        s.responder(&Event::key_down(KEY_LEFTARROW));
        let turns: Vec<i16> = (0..8).map(|_| s.build_ticcmd().angleturn).collect();
        assert_eq!(&turns[..5], &[320; 5]);
        assert_eq!(turns[6], 640);
    }

    #[test]
    fn test_pause_key_sends_special_button() {
        let mut s = session(GameMode::Registered);
        s.gamestate = GameState::Level;
        assert!(s.responder(&Event::key_down(KEY_PAUSE)));
        let cmd = s.build_ticcmd();
        assert_eq!(cmd.buttons, Buttons::SPECIAL.bits() | BTS_PAUSE);
        // only once
        assert_eq!(s.build_ticcmd().buttons, 0);
    }

    #[test]
    fn test_key_on_title_halts_demo_loop() {
        let mut s = session(GameMode::Registered);
        assert_eq!(s.gamestate, GameState::DemoScreen);
        assert!(!s.responder(&Event::key_up(KEY_ENTER)));
        assert!(s.responder(&Event::key_down(KEY_ENTER)));
        assert!(s.demoloop.halted);
    }

    #[test]
    fn test_init_new_clamps_episode_and_map() {
        let mut s = session(GameMode::Shareware);
        // no level lumps, so the load itself fails after clamping
        assert!(s.init_new(Skill::Hard, 3, 12).is_err());
        assert_eq!((s.ctx.gameepisode, s.ctx.gamemap), (1, 9));
        assert_eq!(s.ctx.skill, Skill::Hard);
        assert!(!s.ctx.respawnmonsters);

        let mut s = session(GameMode::Retail);
        assert!(s.init_new(Skill::Nightmare, 7, 0).is_err());
        assert_eq!((s.ctx.gameepisode, s.ctx.gamemap), (4, 1));
        assert_eq!(s.skytexture, "SKY4");
        assert!(s.ctx.respawnmonsters);
    }

    #[test]
    fn test_completed_picks_next_map() {
        let mut s = session(GameMode::Registered);
        s.ctx.gameepisode = 2;
        s.ctx.gamemap = 9;
        s.exit_level();
        s.do_completed();
        assert_eq!(s.gamestate, GameState::Intermission);
        assert_eq!(s.wminfo.next, 5);
        assert!(s.wminfo.didsecret);

        s.ctx.gamemap = 3;
        s.secretexit = true;
        s.do_completed();
        assert_eq!(s.wminfo.next, 8);

        s.ctx.gamemap = 8;
        s.exit_level();
        s.do_completed();
        assert_eq!(s.gameaction, GameAction::Victory);
    }

    #[test]
    fn test_world_done_starts_commercial_finale() {
        let mut s = session(GameMode::Commercial);
        s.ctx.gamemap = 6;
        s.world_done();
        assert_eq!(s.gamestate, GameState::Finale);
        assert_eq!(s.gameaction, GameAction::Nothing);

        let mut s = session(GameMode::Commercial);
        s.ctx.gamemap = 15;
        s.world_done();
        assert_eq!(s.gameaction, GameAction::WorldDone);
    }

    #[test]
    fn test_deathmatch_needs_four_starts() {
        let mut s = session(GameMode::Registered);
        let err = s.deathmatch_spawn_player(0).unwrap_err();
        assert!(err.is_fatal());
    }
}
