mod common;

use common::*;
use doom_common::d_config::DoomConfig;
use doom_common::d_event::{Buttons, TicCmd};
use doom_common::doomdef::{GameMode, GameState, Skill, VERSION};
use doom_common::m_fixed::Fixed;
use doom_game::g_demo::{DEMOMARKER, DEMO_HEADER_SIZE, DEMO_TICCMD_SIZE};
use doom_game::g_game::GameSession;

const TICS: usize = 40;

fn session_with(lumps: Vec<(String, Vec<u8>)>, sink: SharedDemoSink) -> GameSession {
    let store = store_from(lumps).unwrap();
    GameSession::new(DoomConfig::default(), store, GameMode::Registered, Box::new(sink))
}

fn position(game: &GameSession) -> (Fixed, Fixed) {
    let mo = game.ctx.players[0].mo.and_then(|id| game.ctx.thinkers.mobj(id)).unwrap();
    (mo.x, mo.y)
}

/// Walks forward, turning left for a while halfway through.
fn scripted_cmd(tic: usize) -> TicCmd {
    TicCmd {
        forwardmove: 0x19,
        sidemove: if tic % 7 == 0 { 0x18 } else { 0 },
        angleturn: if (10..20).contains(&tic) { 640 } else { 0 },
        buttons: if tic == 5 { Buttons::USE.bits() } else { 0 },
        ..TicCmd::default()
    }
}

/// Records a short walk and returns the lump plus the positions seen.
fn record() -> (Vec<u8>, Vec<(Fixed, Fixed)>) {
    let sink = SharedDemoSink::default();
    let mut game = session_with(level_lumps("E1M1", &TestLevel::default()), sink.clone());

    game.record_demo("demo1");
    game.init_new(Skill::Hard, 1, 1).unwrap();
    game.begin_recording();

    let mut positions = Vec::new();
    for tic in 0..TICS {
        game.set_ticcmd(0, scripted_cmd(tic));
        game.ticker().unwrap();
        positions.push(position(&game));
    }
    assert_eq!(game.recording_len(), Some(DEMO_HEADER_SIZE + TICS * DEMO_TICCMD_SIZE));

    game.check_demo_status().unwrap();
    assert!(game.quit_requested);
    assert!(!game.demorecording);

    let mut demos = sink.take();
    assert_eq!(demos.len(), 1);
    let (name, data) = demos.remove(0);
    assert_eq!(name, "demo1");
    (data, positions)
}

#[test]
fn test_recorded_lump_layout() {
    let (data, _) = record();
    assert_eq!(data.len(), DEMO_HEADER_SIZE + TICS * DEMO_TICCMD_SIZE + 1);
    assert_eq!(&data[..4], &[VERSION, Skill::Hard.index() as u8, 1, 1]);
    assert_eq!(&data[9..13], &[1, 0, 0, 0]);
    assert_eq!(data[DEMO_HEADER_SIZE], 0x19);
    assert_eq!(data.last(), Some(&DEMOMARKER));
}

#[test]
fn test_playback_reproduces_recording() {
    let (data, recorded) = record();
    assert_ne!(recorded.last().unwrap().0, Fixed::from_int(64));

    let mut lumps = level_lumps("E1M1", &TestLevel::default());
    lumps.push(("DEMO1".into(), data));
    let mut game = session_with(lumps, SharedDemoSink::default());
    game.singledemo = true;
    game.defer_play_demo("demo1");

    let mut replayed = Vec::new();
    for _ in 0..TICS {
        game.set_ticcmd(0, TicCmd::default());
        game.ticker().unwrap();
        assert!(game.demoplayback);
        replayed.push(position(&game));
    }
    assert_eq!(game.ctx.skill, Skill::Hard);
    assert_eq!(replayed, recorded);

    // the end marker stops a single demo and asks to quit
    game.ticker().unwrap();
    assert!(!game.demoplayback);
    assert!(game.quit_requested);
}

#[test]
fn test_timedemo_finishes() {
    let (data, _) = record();
    let mut lumps = level_lumps("E1M1", &TestLevel::default());
    lumps.push(("DEMO1".into(), data));
    let mut game = session_with(lumps, SharedDemoSink::default());
    game.time_demo("demo1");

    let mut tics = 0;
    while !game.quit_requested {
        game.ticker().unwrap();
        tics += 1;
        assert!(tics <= TICS + 1, "timedemo ran past its end marker");
    }
    assert_eq!(tics, TICS + 1);
    assert!(!game.timingdemo);
}

#[test]
fn test_wrong_version_only_skips_demo() {
    let mut lumps = vec![("PLAYPAL".to_string(), vec![0; 768])];
    let mut bad = vec![0u8; DEMO_HEADER_SIZE];
    bad[0] = 110;
    bad.push(DEMOMARKER);
    lumps.push(("DEMO1".into(), bad));

    // in the attract loop the next page comes up
    let mut game = session_with(lumps.clone(), SharedDemoSink::default());
    game.defer_play_demo("demo1");
    game.ticker().unwrap();
    assert!(!game.demoplayback);
    assert!(!game.quit_requested);
    assert!(game.demoloop.advancedemo);
    assert_eq!(game.gamestate, GameState::DemoScreen);

    // a demo named on the command line has nothing to fall back to
    let mut game = session_with(lumps, SharedDemoSink::default());
    game.singledemo = true;
    game.defer_play_demo("demo1");
    game.ticker().unwrap();
    assert!(game.quit_requested);
}
