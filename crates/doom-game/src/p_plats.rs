// p_plats.rs — lifts and perpetual platforms

use doom_common::doomdef::TICRATE;
use doom_common::m_fixed::{Fixed, FRACUNIT};

use crate::p_floor::{move_plane, MoveResult, Plane};
use crate::p_local::PlayContext;
use crate::p_spec::{
    find_highest_floor_surrounding, find_lowest_floor_surrounding, find_next_highest_floor,
    find_sector_from_tag,
};
use crate::p_tick::{Thinker, ThinkerId};
use crate::s_sound::{Sfx, SoundSource};

pub const PLATSPEED: Fixed = Fixed(FRACUNIT);
/// Seconds a lift waits at either end.
pub const PLATWAIT: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatStatus {
    Up,
    Down,
    Waiting,
    InStasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatKind {
    PerpetualRaise,
    DownWaitUpStay,
    BlazeDWUS,
    RaiseToNearestAndChange,
}

#[derive(Debug, Clone)]
pub struct Plat {
    pub sector: usize,
    pub speed: Fixed,
    pub low: Fixed,
    pub high: Fixed,
    pub wait: i32,
    pub count: i32,
    pub status: PlatStatus,
    pub oldstatus: PlatStatus,
    pub crush: bool,
    pub tag: i16,
    pub kind: PlatKind,
}

fn plat_state(ctx: &PlayContext, id: ThinkerId) -> Option<Plat> {
    match ctx.thinkers.get(id) {
        Some(Thinker::Platform(p)) => Some(p.clone()),
        _ => None,
    }
}

fn with_plat(ctx: &mut PlayContext, id: ThinkerId, f: impl FnOnce(&mut Plat)) {
    if let Some(Thinker::Platform(p)) = ctx.thinkers.get_mut(id) {
        f(p);
    }
}

fn remove_active_plat(ctx: &mut PlayContext, id: ThinkerId, sector: usize) {
    if let Some(sec) = ctx.level.sectors.get_mut(sector) {
        sec.special_data = None;
    }
    ctx.thinkers.remove(id);
    ctx.activeplats.retain(|&p| p != id);
}

/// Move a plat up and down.
pub fn t_plat_raise(ctx: &mut PlayContext, id: ThinkerId) {
    let mut plat = match plat_state(ctx, id) {
        Some(p) => p,
        None => return,
    };
    let origin = Some(SoundSource::Sector(plat.sector));

    match plat.status {
        PlatStatus::Up => {
            let res = move_plane(ctx, plat.sector, plat.speed, plat.high, plat.crush, Plane::Floor, 1);

            if plat.kind == PlatKind::RaiseToNearestAndChange && ctx.leveltime() & 7 == 0 {
                ctx.sounds.start(origin, Sfx::Stnmov);
            }

            if res == MoveResult::Crushed && !plat.crush {
                plat.count = plat.wait;
                plat.status = PlatStatus::Down;
                ctx.sounds.start(origin, Sfx::Pstart);
            } else if res == MoveResult::PastDest {
                plat.count = plat.wait;
                plat.status = PlatStatus::Waiting;
                ctx.sounds.start(origin, Sfx::Pstop);

                if plat.kind != PlatKind::PerpetualRaise {
                    remove_active_plat(ctx, id, plat.sector);
                    return;
                }
            }
        }
        PlatStatus::Down => {
            let res = move_plane(ctx, plat.sector, plat.speed, plat.low, false, Plane::Floor, -1);
            if res == MoveResult::PastDest {
                plat.count = plat.wait;
                plat.status = PlatStatus::Waiting;
                ctx.sounds.start(origin, Sfx::Pstop);
            }
        }
        PlatStatus::Waiting => {
            plat.count -= 1;
            if plat.count == 0 {
                let floor = ctx
                    .level
                    .sectors
                    .get(plat.sector)
                    .map_or(Fixed::ZERO, |s| s.floorheight);
                plat.status = if floor == plat.low {
                    PlatStatus::Up
                } else {
                    PlatStatus::Down
                };
                ctx.sounds.start(origin, Sfx::Pstart);
            }
        }
        PlatStatus::InStasis => {}
    }

    with_plat(ctx, id, |p| *p = plat);
}

fn activate_in_stasis(ctx: &mut PlayContext, tag: i16) {
    for id in ctx.activeplats.clone() {
        with_plat(ctx, id, |p| {
            if p.tag == tag && p.status == PlatStatus::InStasis {
                p.status = p.oldstatus;
            }
        });
    }
}

/// Starts a platform in every idle sector tagged `tag`.
pub fn ev_do_plat(ctx: &mut PlayContext, tag: i16, kind: PlatKind) -> bool {
    let mut rtn = false;

    // activate all plats that are in stasis
    if kind == PlatKind::PerpetualRaise {
        activate_in_stasis(ctx, tag);
    }

    let mut secnum = None;
    while let Some(s) = find_sector_from_tag(&ctx.level, tag, secnum) {
        secnum = Some(s);
        if ctx.level.sectors[s].special_data.is_some() {
            continue;
        }
        rtn = true;

        let floorheight = ctx.level.sectors[s].floorheight;
        let origin = Some(SoundSource::Sector(s));
        let mut plat = Plat {
            sector: s,
            speed: PLATSPEED,
            low: floorheight,
            high: floorheight,
            wait: TICRATE * PLATWAIT,
            count: 0,
            status: PlatStatus::Down,
            oldstatus: PlatStatus::Down,
            crush: false,
            tag,
            kind,
        };

        match kind {
            PlatKind::RaiseToNearestAndChange => {
                plat.speed = PLATSPEED / 2;
                plat.high = find_next_highest_floor(&ctx.level, s, floorheight);
                plat.wait = 0;
                plat.status = PlatStatus::Up;
                // no more damage, if applicable
                ctx.level.sectors[s].special = 0;
                ctx.sounds.start(origin, Sfx::Stnmov);
            }
            PlatKind::DownWaitUpStay | PlatKind::BlazeDWUS => {
                plat.speed = if kind == PlatKind::BlazeDWUS {
                    PLATSPEED * 8
                } else {
                    PLATSPEED * 4
                };
                plat.low = find_lowest_floor_surrounding(&ctx.level, s).min(floorheight);
                ctx.sounds.start(origin, Sfx::Pstart);
            }
            PlatKind::PerpetualRaise => {
                plat.low = find_lowest_floor_surrounding(&ctx.level, s).min(floorheight);
                plat.high = find_highest_floor_surrounding(&ctx.level, s).max(floorheight);
                plat.status = if ctx.random.p_random() & 1 == 0 {
                    PlatStatus::Up
                } else {
                    PlatStatus::Down
                };
                ctx.sounds.start(origin, Sfx::Pstart);
            }
        }

        let id = ctx.thinkers.add(Thinker::Platform(plat));
        ctx.level.sectors[s].special_data = Some(id);
        ctx.activeplats.push(id);
    }
    rtn
}

/// Freezes moving platforms tagged `tag`.
pub fn ev_stop_plat(ctx: &mut PlayContext, tag: i16) {
    for id in ctx.activeplats.clone() {
        with_plat(ctx, id, |p| {
            if p.status != PlatStatus::InStasis && p.tag == tag {
                p.oldstatus = p.status;
                p.status = PlatStatus::InStasis;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::p_spec::tests::two_rooms;
    use crate::p_tick::run_thinkers;

    fn run(ctx: &mut PlayContext, tics: usize) {
        for _ in 0..tics {
            run_thinkers(ctx);
        }
    }

    #[test]
    fn test_down_wait_up_stay() {
        // lift at 64 next to a floor at 0
        let mut ctx = two_rooms(64, 0);
        ctx.level.sectors[0].tag = 9;
        assert!(ev_do_plat(&mut ctx, 9, PlatKind::DownWaitUpStay));
        let id = ctx.activeplats[0];

        // 4 units per tic, plus the tic that reaches the bottom
        run(&mut ctx, 17);
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::ZERO);
        assert_eq!(plat_state(&ctx, id).unwrap().status, PlatStatus::Waiting);

        run(&mut ctx, (TICRATE * PLATWAIT) as usize);
        assert_eq!(plat_state(&ctx, id).unwrap().status, PlatStatus::Up);

        run(&mut ctx, 17);
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::from_int(64));
        assert!(ctx.activeplats.is_empty());
        assert!(!ctx.thinkers.is_live(id));
    }

    #[test]
    fn test_stop_and_restart_perpetual() {
        let mut ctx = two_rooms(0, 32);
        ctx.level.sectors[0].tag = 2;
        ev_do_plat(&mut ctx, 2, PlatKind::PerpetualRaise);
        let id = ctx.activeplats[0];
        let plat = plat_state(&ctx, id).unwrap();
        assert_eq!((plat.low, plat.high), (Fixed::ZERO, Fixed::from_int(32)));

        run(&mut ctx, 3);
        ev_stop_plat(&mut ctx, 2);
        let frozen = ctx.level.sectors[0].floorheight;
        let before = plat_state(&ctx, id).unwrap().oldstatus;
        run(&mut ctx, 20);
        assert_eq!(ctx.level.sectors[0].floorheight, frozen);

        ev_do_plat(&mut ctx, 2, PlatKind::PerpetualRaise);
        assert_eq!(plat_state(&ctx, id).unwrap().status, before);
        assert_eq!(ctx.activeplats.len(), 1);
    }

    #[test]
    fn test_raise_to_nearest_clears_special() {
        let mut ctx = two_rooms(0, 16);
        ctx.level.sectors[0].special = 7;
        ctx.level.sectors[0].tag = 3;
        ev_do_plat(&mut ctx, 3, PlatKind::RaiseToNearestAndChange);
        assert_eq!(ctx.level.sectors[0].special, 0);
        run(&mut ctx, 40);
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::from_int(16));
        assert!(ctx.activeplats.is_empty());
    }
}
