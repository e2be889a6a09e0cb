mod common;

use common::*;
use doom_common::d_config::DoomConfig;
use doom_common::d_event::{Buttons, TicCmd, BTS_PAUSE};
use doom_common::doomdef::{GameMode, GameState, Skill};
use doom_game::g_demo::MemoryDemoSink;
use doom_game::g_game::GameSession;
use doom_game::p_user::PlayerState;

fn session(markers: &[&str]) -> GameSession {
    let store = store_with_levels(markers);
    GameSession::new(DoomConfig::default(), store, GameMode::Registered, Box::<MemoryDemoSink>::default())
}

fn tick(game: &mut GameSession, buttons: u8) {
    let cmd = TicCmd { buttons, ..TicCmd::default() };
    game.set_ticcmd(0, cmd);
    game.ticker().unwrap();
}

#[test]
fn test_exit_sector_leads_to_next_map() {
    let mut game = session(&["E1M1", "E1M2"]);
    game.init_new(Skill::Medium, 1, 1).unwrap();
    assert_eq!(game.gamestate, GameState::Level);
    tick(&mut game, 0);

    // off the damage tic, low health in an exit sector ends the level
    game.ctx.level.sectors[0].special = 11;
    game.ctx.players[0].health = 10;
    tick(&mut game, 0);
    tick(&mut game, 0);
    assert_eq!(game.gamestate, GameState::Intermission);
    assert_eq!(game.wminfo.last, 0);
    assert_eq!(game.wminfo.next, 1);
    assert!(game.intermission.is_some());

    // each fresh press skips a stage of the tally
    let mut tics = 0;
    while game.gamestate != GameState::Level {
        let buttons = if tics % 2 == 0 { Buttons::ATTACK.bits() } else { 0 };
        tick(&mut game, buttons);
        tics += 1;
        assert!(tics < 200, "intermission did not finish");
    }
    assert_eq!(game.ctx.gamemap, 2);
    assert_eq!(game.ctx.level.name, "E1M2");
    assert!(game.intermission.is_none());
    assert_eq!(game.ctx.players[0].playerstate, PlayerState::Live);
}

#[test]
fn test_secret_exit_goes_to_map9() {
    let mut game = session(&["E1M3"]);
    game.init_new(Skill::Medium, 1, 3).unwrap();
    game.secret_exit_level();
    tick(&mut game, 0);
    assert_eq!(game.gamestate, GameState::Intermission);
    assert_eq!(game.wminfo.next, 8);
}

#[test]
fn test_pause_freezes_level_time() {
    let mut game = session(&["E1M1"]);
    game.init_new(Skill::Medium, 1, 1).unwrap();
    tick(&mut game, 0);
    assert_eq!(game.ctx.level.leveltime, 1);

    let pause = Buttons::SPECIAL.bits() | BTS_PAUSE;
    tick(&mut game, pause);
    assert!(game.ctx.paused);
    for _ in 0..5 {
        tick(&mut game, 0);
    }
    assert_eq!(game.ctx.level.leveltime, 1);

    tick(&mut game, pause);
    assert!(!game.ctx.paused);
    tick(&mut game, 0);
    assert_eq!(game.ctx.level.leveltime, 3);
}

#[test]
fn test_episode_end_shows_finale() {
    let mut game = session(&["E1M8"]);
    game.init_new(Skill::Medium, 1, 8).unwrap();
    game.exit_level();
    tick(&mut game, 0);

    assert_eq!(game.gamestate, GameState::Finale);
    assert!(game.intermission.is_none());
    let finale = game.finale.as_ref().unwrap();
    assert_eq!(finale.flat, "FLOOR4_8");
}

#[test]
fn test_dead_player_reloads_level() {
    let mut game = session(&["E1M1"]);
    game.init_new(Skill::Medium, 1, 1).unwrap();
    for _ in 0..10 {
        tick(&mut game, 0);
    }
    game.ctx.players[0].health = 0;
    game.ctx.players[0].playerstate = PlayerState::Reborn;

    tick(&mut game, 0);
    assert_eq!(game.gamestate, GameState::Level);
    assert_eq!(game.ctx.level.leveltime, 1);
    assert_eq!(game.ctx.players[0].health, 100);
    assert_eq!(game.ctx.players[0].playerstate, PlayerState::Live);
    let mo = game.ctx.thinkers.mobj(game.ctx.players[0].mo.unwrap()).unwrap();
    assert_eq!(mo.health, 100);
}
