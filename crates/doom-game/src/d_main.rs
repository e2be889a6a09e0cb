// d_main.rs — startup, the title/demo loop and the per-tic driver

use doom_common::common::{com_printf, com_set_title};
use doom_common::d_config::{identify_by_filename, DoomConfig};
use doom_common::d_event::{EventQueue, EventQueueSender};
use doom_common::doom_error::DoomResult;
use doom_common::doomdef::{GameAction, GameMode, GameState, SCREENHEIGHT, SCREENWIDTH, VERSION};
use doom_common::i_system::{GraphicsSink, SoundSink};
use doom_common::w_wad::{LumpStore, PuTag};

use crate::g_demo::DemoSink;
use crate::g_game::GameSession;
use crate::p_user::PlayerState;

// ============================================================
// Title pages and attract-mode demos
// ============================================================

/// Position in the title page / demo rotation.
#[derive(Debug, Clone)]
pub struct DemoLoop {
    pub demosequence: i32,
    pub pagetic: i32,
    pub pagename: &'static str,
    /// Set when the next step of the rotation is due.
    pub advancedemo: bool,
    /// A key was pressed; stay on the current page.
    pub halted: bool,
}

impl Default for DemoLoop {
    fn default() -> Self {
        Self {
            demosequence: -1,
            pagetic: 0,
            pagename: "TITLEPIC",
            advancedemo: false,
            halted: false,
        }
    }
}

impl DemoLoop {
    /// Counts down the page on screen.
    pub fn page_ticker(&mut self) {
        if self.halted {
            return;
        }
        self.pagetic -= 1;
        if self.pagetic < 0 {
            self.advance_demo();
        }
    }

    /// Called after each demo or intro demosequence finishes.
    pub fn advance_demo(&mut self) {
        if !self.halted {
            self.advancedemo = true;
        }
    }

    pub fn halt(&mut self) {
        self.halted = true;
        self.advancedemo = false;
    }
}

impl GameSession {
    /// Starts the title page rotation from the beginning.
    pub fn start_title(&mut self) {
        self.gameaction = GameAction::Nothing;
        self.demoloop = DemoLoop::default();
        self.demoloop.advance_demo();
    }

    /// Moves to the next page or demo. Runs between tics.
    pub fn do_advance_demo(&mut self) {
        let consoleplayer = self.ctx.consoleplayer;
        self.ctx.players[consoleplayer].playerstate = PlayerState::Live;
        self.demoloop.advancedemo = false;
        self.usergame = false;
        self.ctx.paused = false;
        self.gameaction = GameAction::Nothing;

        let gamemode = self.gamemode();
        let commercial = gamemode == GameMode::Commercial;
        let pages = if gamemode == GameMode::Retail { 7 } else { 6 };
        self.demoloop.demosequence = (self.demoloop.demosequence + 1) % pages;

        match self.demoloop.demosequence {
            0 => {
                self.demoloop.pagetic = if commercial { 35 * 11 } else { 170 };
                self.gamestate = GameState::DemoScreen;
                self.demoloop.pagename = "TITLEPIC";
                self.ctx.sounds.change_music(if commercial { "dm2ttl" } else { "intro" }, false);
            }
            1 => self.defer_play_demo("demo1"),
            2 => {
                self.demoloop.pagetic = 200;
                self.gamestate = GameState::DemoScreen;
                self.demoloop.pagename = "CREDIT";
            }
            3 => self.defer_play_demo("demo2"),
            4 => {
                self.gamestate = GameState::DemoScreen;
                if commercial {
                    self.demoloop.pagetic = 35 * 11;
                    self.demoloop.pagename = "TITLEPIC";
                    self.ctx.sounds.change_music("dm2ttl", false);
                } else {
                    self.demoloop.pagetic = 200;
                    self.demoloop.pagename = if gamemode == GameMode::Retail { "CREDIT" } else { "HELP2" };
                }
            }
            5 => self.defer_play_demo("demo3"),
            // THIS IS THE NEW DEMO FOR THE ULTIMATE VERSION
            _ => self.defer_play_demo("demo4"),
        }
        log::debug!("demo loop step {} ({})", self.demoloop.demosequence, self.demoloop.pagename);
    }
}

// ============================================================
// Startup
// ============================================================

/// Game mode from the IWAD file name, else from which level markers the
/// loaded archives carry.
pub fn identify_version(config: &DoomConfig, store: &LumpStore) -> GameMode {
    if let Some((mode, _)) = config.iwad.as_deref().and_then(identify_by_filename) {
        return mode;
    }
    let has = |name: &str| store.lump_num_quiet(name).is_some();
    if has("MAP01") {
        GameMode::Commercial
    } else if has("E4M1") {
        GameMode::Retail
    } else if has("E2M1") {
        GameMode::Registered
    } else if has("E1M1") {
        GameMode::Shareware
    } else {
        GameMode::Indetermined
    }
}

fn startup_title(gamemode: GameMode) -> String {
    let version = format!("v{}.{}", VERSION / 100, VERSION % 100);
    match gamemode {
        GameMode::Retail => format!("The Ultimate DOOM Startup {}", version),
        GameMode::Shareware => format!("DOOM Shareware Startup {}", version),
        GameMode::Registered => format!("DOOM Registered Startup {}", version),
        GameMode::Commercial => format!("DOOM 2: Hell on Earth {}", version),
        GameMode::Indetermined => format!("Public DOOM - {}", version),
    }
}

/// Owns the session and the host collaborators; one `run_tic` per 35th of
/// a second.
pub struct DoomMain {
    pub session: GameSession,
    events: EventQueue,
    graphics: Box<dyn GraphicsSink>,
    sound: Box<dyn SoundSink>,
    screen: Vec<u8>,
    music_paused: bool,
    pub tics_run: u64,
}

impl DoomMain {
    /// Loads the configured archives and starts whatever the command line
    /// asked for.
    pub fn new(
        config: DoomConfig,
        graphics: Box<dyn GraphicsSink>,
        sound: Box<dyn SoundSink>,
        demo_sink: Box<dyn DemoSink>,
    ) -> DoomResult<Self> {
        let files = config.wad_files();
        let store = LumpStore::load(files.as_slice())?;
        Self::with_store(config, store, graphics, sound, demo_sink)
    }

    pub fn with_store(
        mut config: DoomConfig,
        mut store: LumpStore,
        mut graphics: Box<dyn GraphicsSink>,
        sound: Box<dyn SoundSink>,
        demo_sink: Box<dyn DemoSink>,
    ) -> DoomResult<Self> {
        let gamemode = identify_version(&config, &store);
        let title = startup_title(gamemode);
        com_set_title(&title);
        com_printf(&format!("{}\n", title));
        if config.devparm {
            com_printf("Development mode ON.\n");
        }
        config.resolve_warp(gamemode);

        graphics.initialize();
        if let Some(lump) = store.lump_num_quiet("PLAYPAL") {
            let palette = store.cache_lump_num(lump, PuTag::Cache)?;
            graphics.update_palette(&palette[..palette.len().min(768)]);
        }

        let (skill, episode, map) = (config.skill, config.start_episode, config.start_map);
        let record = config.record.clone();
        let playdemo = config.playdemo.clone();
        let timedemo = config.timedemo.clone();
        let autostart = config.autostart;

        let mut session = GameSession::new(config, store, gamemode, demo_sink);

        if let Some(name) = record {
            session.record_demo(&name);
        }

        if let Some(name) = playdemo {
            session.singledemo = true;
            session.defer_play_demo(&name);
        } else if let Some(name) = timedemo {
            session.time_demo(&name);
        } else if autostart {
            session.init_new(skill, episode, map)?;
        } else {
            session.start_title();
        }

        if session.demorecording {
            session.begin_recording();
        }

        Ok(Self {
            session,
            events: EventQueue::default(),
            graphics,
            sound,
            screen: vec![0; SCREENWIDTH * SCREENHEIGHT],
            music_paused: false,
            tics_run: 0,
        })
    }

    /// Producer handle for the host input thread.
    pub fn event_sender(&self) -> EventQueueSender {
        self.events.sender()
    }

    /// Events, command building, one game tic, then sound and the frame.
    pub fn run_tic(&mut self) -> DoomResult<()> {
        for ev in self.events.drain() {
            self.session.responder(&ev);
        }

        let cmd = self.session.build_ticcmd();
        let consoleplayer = self.session.ctx.consoleplayer;
        self.session.set_ticcmd(consoleplayer, cmd);

        if self.session.demoloop.advancedemo {
            self.session.do_advance_demo();
        }
        self.session.ticker()?;

        let s = &mut self.session;
        s.sound.start_cues(&mut s.ctx, &mut s.store, self.sound.as_mut())?;
        s.sound.update(&s.ctx, self.sound.as_mut());
        if s.ctx.paused != self.music_paused {
            self.music_paused = s.ctx.paused;
            if self.music_paused {
                s.sound.pause_music(self.sound.as_mut());
            } else {
                s.sound.resume_music(self.sound.as_mut());
            }
        }

        self.graphics.screen_ready(&self.screen);
        self.tics_run += 1;
        Ok(())
    }

    pub fn finished(&self) -> bool {
        self.session.quit_requested
    }

    /// Flushes an in-progress recording and silences the sound sink.
    pub fn shutdown(&mut self) -> DoomResult<()> {
        if self.session.demorecording {
            self.session.check_demo_status()?;
        }
        self.session.sound.stop_all(self.sound.as_mut());
        self.session.sound.stop_music(self.sound.as_mut());
        Ok(())
    }
}
