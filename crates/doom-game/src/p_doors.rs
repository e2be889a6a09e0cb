// p_doors.rs — vertical doors

use doom_common::doomdef::TICRATE;
use doom_common::m_fixed::{Fixed, FRACUNIT};

use crate::p_floor::{move_plane, MoveResult, Plane};
use crate::p_local::PlayContext;
use crate::p_spec::{find_lowest_ceiling_surrounding, find_sector_from_tag};
use crate::p_tick::{Thinker, ThinkerId};
use crate::s_sound::{Sfx, SoundSource};

pub const VDOORSPEED: Fixed = Fixed(FRACUNIT * 2);
/// Tics a raised door stays open.
pub const VDOORWAIT: i32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    /// Open, wait, close.
    Normal,
    Close30ThenOpen,
    Close,
    Open,
    RaiseIn5Mins,
    BlazeRaise,
    BlazeOpen,
    BlazeClose,
}

#[derive(Debug, Clone)]
pub struct VDoor {
    pub kind: DoorKind,
    pub sector: usize,
    pub topheight: Fixed,
    pub speed: Fixed,
    /// 1 = up, 0 = waiting at top, -1 = down, 2 = initial wait.
    pub direction: i32,
    /// Tics to wait at the top.
    pub topwait: i32,
    /// Countdown while waiting.
    pub topcountdown: i32,
}

fn door_state(ctx: &PlayContext, id: ThinkerId) -> Option<VDoor> {
    match ctx.thinkers.get(id) {
        Some(Thinker::Door(d)) => Some(d.clone()),
        _ => None,
    }
}

fn store(ctx: &mut PlayContext, id: ThinkerId, door: VDoor) {
    if let Some(Thinker::Door(d)) = ctx.thinkers.get_mut(id) {
        *d = door;
    }
}

fn finish(ctx: &mut PlayContext, id: ThinkerId, sector: usize) {
    if let Some(sec) = ctx.level.sectors.get_mut(sector) {
        sec.special_data = None;
    }
    ctx.thinkers.remove(id);
}

pub fn t_vertical_door(ctx: &mut PlayContext, id: ThinkerId) {
    let mut door = match door_state(ctx, id) {
        Some(d) => d,
        None => return,
    };
    let origin = Some(SoundSource::Sector(door.sector));

    match door.direction {
        0 => {
            // waiting
            door.topcountdown -= 1;
            if door.topcountdown == 0 {
                match door.kind {
                    DoorKind::BlazeRaise => {
                        door.direction = -1;
                        ctx.sounds.start(origin, Sfx::Bdcls);
                    }
                    DoorKind::Normal => {
                        door.direction = -1;
                        ctx.sounds.start(origin, Sfx::Dorcls);
                    }
                    DoorKind::Close30ThenOpen => {
                        door.direction = 1;
                        ctx.sounds.start(origin, Sfx::Doropn);
                    }
                    _ => {}
                }
            }
        }
        2 => {
            // initial wait
            door.topcountdown -= 1;
            if door.topcountdown == 0 && door.kind == DoorKind::RaiseIn5Mins {
                door.direction = 1;
                door.kind = DoorKind::Normal;
                ctx.sounds.start(origin, Sfx::Doropn);
            }
        }
        -1 => {
            let floor = ctx
                .level
                .sectors
                .get(door.sector)
                .map_or(Fixed::ZERO, |s| s.floorheight);
            let res = move_plane(ctx, door.sector, door.speed, floor, false, Plane::Ceiling, -1);
            match res {
                MoveResult::PastDest => match door.kind {
                    DoorKind::BlazeRaise | DoorKind::BlazeClose => {
                        finish(ctx, id, door.sector);
                        ctx.sounds.start(origin, Sfx::Bdcls);
                        return;
                    }
                    DoorKind::Normal | DoorKind::Close => {
                        finish(ctx, id, door.sector);
                        return;
                    }
                    DoorKind::Close30ThenOpen => {
                        door.direction = 0;
                        door.topcountdown = TICRATE * 30;
                    }
                    _ => {}
                },
                MoveResult::Crushed => match door.kind {
                    // do not go back up
                    DoorKind::BlazeClose | DoorKind::Close => {}
                    _ => {
                        door.direction = 1;
                        ctx.sounds.start(origin, Sfx::Doropn);
                    }
                },
                MoveResult::Ok => {}
            }
        }
        1 => {
            let res = move_plane(
                ctx,
                door.sector,
                door.speed,
                door.topheight,
                false,
                Plane::Ceiling,
                1,
            );
            if res == MoveResult::PastDest {
                match door.kind {
                    DoorKind::BlazeRaise | DoorKind::Normal => {
                        // wait at top
                        door.direction = 0;
                        door.topcountdown = door.topwait;
                    }
                    DoorKind::Close30ThenOpen | DoorKind::BlazeOpen | DoorKind::Open => {
                        finish(ctx, id, door.sector);
                        return;
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }

    store(ctx, id, door);
}

/// Starts a door in every idle sector tagged `tag`.
pub fn ev_do_door(ctx: &mut PlayContext, tag: i16, kind: DoorKind) -> bool {
    let mut rtn = false;
    let mut secnum = None;

    while let Some(s) = find_sector_from_tag(&ctx.level, tag, secnum) {
        secnum = Some(s);
        if ctx.level.sectors[s].special_data.is_some() {
            continue;
        }
        rtn = true;

        let ceiling = ctx.level.sectors[s].ceilingheight;
        let lowest = find_lowest_ceiling_surrounding(&ctx.level, s) - Fixed::from_int(4);
        let origin = Some(SoundSource::Sector(s));

        let mut door = VDoor {
            kind,
            sector: s,
            topheight: lowest,
            speed: VDOORSPEED,
            direction: 1,
            topwait: VDOORWAIT,
            topcountdown: 0,
        };

        match kind {
            DoorKind::BlazeClose => {
                door.direction = -1;
                door.speed = VDOORSPEED * 4;
                ctx.sounds.start(origin, Sfx::Bdcls);
            }
            DoorKind::Close => {
                door.direction = -1;
                ctx.sounds.start(origin, Sfx::Dorcls);
            }
            DoorKind::Close30ThenOpen => {
                door.topheight = ceiling;
                door.direction = -1;
                ctx.sounds.start(origin, Sfx::Dorcls);
            }
            DoorKind::BlazeRaise | DoorKind::BlazeOpen => {
                door.speed = VDOORSPEED * 4;
                if door.topheight != ceiling {
                    ctx.sounds.start(origin, Sfx::Bdopn);
                }
            }
            DoorKind::Normal | DoorKind::Open | DoorKind::RaiseIn5Mins => {
                if door.topheight != ceiling {
                    ctx.sounds.start(origin, Sfx::Doropn);
                }
            }
        }

        let id = ctx.thinkers.add(Thinker::Door(door));
        ctx.level.sectors[s].special_data = Some(id);
    }
    rtn
}

/// Sector special 10: closes 30 seconds into the level.
pub fn spawn_door_close_in30(ctx: &mut PlayContext, secnum: usize) {
    let door = VDoor {
        kind: DoorKind::Normal,
        sector: secnum,
        topheight: Fixed::ZERO,
        speed: VDOORSPEED,
        direction: 0,
        topwait: 0,
        topcountdown: 30 * TICRATE,
    };
    let id = ctx.thinkers.add(Thinker::Door(door));
    let sec = &mut ctx.level.sectors[secnum];
    sec.special_data = Some(id);
    sec.special = 0;
}

/// Sector special 14: opens five minutes into the level.
pub fn spawn_door_raise_in5mins(ctx: &mut PlayContext, secnum: usize) {
    let door = VDoor {
        kind: DoorKind::RaiseIn5Mins,
        sector: secnum,
        topheight: find_lowest_ceiling_surrounding(&ctx.level, secnum) - Fixed::from_int(4),
        speed: VDOORSPEED,
        direction: 2,
        topwait: VDOORWAIT,
        topcountdown: 5 * 60 * TICRATE,
    };
    let id = ctx.thinkers.add(Thinker::Door(door));
    let sec = &mut ctx.level.sectors[secnum];
    sec.special_data = Some(id);
    sec.special = 0;
}
