// p_floor.rs — floor movers and the shared plane mover

use doom_common::m_fixed::{Fixed, FRACUNIT};
use doom_common::wadfiles::LineFlags;

use crate::p_local::PlayContext;
use crate::p_map::change_sector;
use crate::p_spec::{
    find_highest_floor_surrounding, find_lowest_ceiling_surrounding,
    find_lowest_floor_surrounding, find_next_highest_floor, find_sector_from_tag,
};
use crate::p_tick::{Thinker, ThinkerId};
use crate::s_sound::{Sfx, SoundSource};

pub const FLOORSPEED: Fixed = Fixed(FRACUNIT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Ok,
    Crushed,
    PastDest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Floor,
    Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorKind {
    /// Lower floor to highest surrounding floor.
    LowerFloor,
    /// Lower floor to lowest surrounding floor.
    LowerFloorToLowest,
    /// Lower floor to highest surrounding floor, very fast.
    TurboLower,
    /// Raise floor to lowest surrounding ceiling.
    RaiseFloor,
    /// Raise floor to next highest surrounding floor.
    RaiseFloorToNearest,
    RaiseFloor24,
    RaiseFloorCrush,
    RaiseFloorTurbo,
    /// Lower to lowest surrounding floor and take on that sector's
    /// flat and special.
    LowerAndChange,
}

#[derive(Debug, Clone)]
pub struct FloorMove {
    pub kind: FloorKind,
    pub crush: bool,
    pub sector: usize,
    pub direction: i32,
    pub newspecial: i16,
    pub texture: Option<String>,
    pub floordestheight: Fixed,
    pub speed: Fixed,
}

/// Moves a floor or ceiling one step towards `dest`. A move that leaves
/// something not fitting is undone unless `crush` allows it.
pub fn move_plane(
    ctx: &mut PlayContext,
    sector: usize,
    speed: Fixed,
    dest: Fixed,
    crush: bool,
    plane: Plane,
    direction: i32,
) -> MoveResult {
    let (floor, ceiling) = match ctx.level.sectors.get(sector) {
        Some(s) => (s.floorheight, s.ceilingheight),
        None => return MoveResult::Ok,
    };

    let set = |ctx: &mut PlayContext, h: Fixed| {
        let s = &mut ctx.level.sectors[sector];
        match plane {
            Plane::Floor => s.floorheight = h,
            Plane::Ceiling => s.ceilingheight = h,
        }
    };

    let lastpos = match plane {
        Plane::Floor => floor,
        Plane::Ceiling => ceiling,
    };

    match (plane, direction) {
        (Plane::Floor, -1) | (Plane::Ceiling, -1) if lastpos - speed < dest => {
            set(ctx, dest);
            if change_sector(ctx, sector, crush) {
                set(ctx, lastpos);
                change_sector(ctx, sector, crush);
            }
            MoveResult::PastDest
        }
        (Plane::Floor, 1) | (Plane::Ceiling, 1) if lastpos + speed > dest => {
            set(ctx, dest);
            if change_sector(ctx, sector, crush) {
                set(ctx, lastpos);
                change_sector(ctx, sector, crush);
            }
            MoveResult::PastDest
        }
        (Plane::Floor, -1) => {
            // down
            set(ctx, lastpos - speed);
            if change_sector(ctx, sector, crush) {
                set(ctx, lastpos);
                change_sector(ctx, sector, crush);
                return MoveResult::Crushed;
            }
            MoveResult::Ok
        }
        (Plane::Floor, 1) => {
            set(ctx, lastpos + speed);
            if change_sector(ctx, sector, crush) {
                if crush {
                    return MoveResult::Crushed;
                }
                set(ctx, lastpos);
                change_sector(ctx, sector, crush);
                return MoveResult::Crushed;
            }
            MoveResult::Ok
        }
        (Plane::Ceiling, -1) => {
            set(ctx, lastpos - speed);
            if change_sector(ctx, sector, crush) {
                if crush {
                    return MoveResult::Crushed;
                }
                set(ctx, lastpos);
                change_sector(ctx, sector, crush);
                return MoveResult::Crushed;
            }
            MoveResult::Ok
        }
        (Plane::Ceiling, 1) => {
            set(ctx, lastpos + speed);
            change_sector(ctx, sector, crush);
            MoveResult::Ok
        }
        _ => MoveResult::Ok,
    }
}

fn floor_state(ctx: &PlayContext, id: ThinkerId) -> Option<FloorMove> {
    match ctx.thinkers.get(id) {
        Some(Thinker::Floor(f)) => Some(f.clone()),
        _ => None,
    }
}

/// Per-tic update of a moving floor.
pub fn t_move_floor(ctx: &mut PlayContext, id: ThinkerId) {
    let floor = match floor_state(ctx, id) {
        Some(f) => f,
        None => return,
    };

    let res = move_plane(
        ctx,
        floor.sector,
        floor.speed,
        floor.floordestheight,
        floor.crush,
        Plane::Floor,
        floor.direction,
    );

    if ctx.leveltime() & 7 == 0 {
        ctx.sounds
            .start(Some(SoundSource::Sector(floor.sector)), Sfx::Stnmov);
    }

    if res != MoveResult::PastDest {
        return;
    }

    if let Some(sec) = ctx.level.sectors.get_mut(floor.sector) {
        sec.special_data = None;
        if floor.direction == -1 && floor.kind == FloorKind::LowerAndChange {
            sec.special = floor.newspecial;
            if let Some(texture) = floor.texture {
                sec.floorpic = texture;
            }
        }
    }
    ctx.thinkers.remove(id);
    ctx.sounds
        .start(Some(SoundSource::Sector(floor.sector)), Sfx::Pstop);
}

/// Flat and special of the sector across a two-sided line whose floor is
/// at `height`.
fn model_sector_for_floor(ctx: &PlayContext, secnum: usize, height: Fixed) -> Option<(String, i16)> {
    let level = &ctx.level;
    level.sectors[secnum].lines.iter().find_map(|&ld| {
        let line = &level.lines[ld];
        if !line.flags.contains(LineFlags::TWOSIDED) {
            return None;
        }
        let other = level.next_sector(ld, secnum)?;
        let s = &level.sectors[other];
        (s.floorheight == height).then(|| (s.floorpic.clone(), s.special))
    })
}

/// Starts a floor mover in every idle sector tagged `tag`.
pub fn ev_do_floor(ctx: &mut PlayContext, tag: i16, kind: FloorKind) -> bool {
    let mut rtn = false;
    let mut secnum = None;

    while let Some(s) = find_sector_from_tag(&ctx.level, tag, secnum) {
        secnum = Some(s);
        if ctx.level.sectors[s].special_data.is_some() {
            continue;
        }
        rtn = true;

        let sec = &ctx.level.sectors[s];
        let mut floor = FloorMove {
            kind,
            crush: false,
            sector: s,
            direction: -1,
            newspecial: 0,
            texture: None,
            floordestheight: sec.floorheight,
            speed: FLOORSPEED,
        };

        match kind {
            FloorKind::LowerFloor => {
                floor.floordestheight = find_highest_floor_surrounding(&ctx.level, s);
            }
            FloorKind::LowerFloorToLowest => {
                floor.floordestheight = find_lowest_floor_surrounding(&ctx.level, s);
            }
            FloorKind::TurboLower => {
                floor.speed = FLOORSPEED * 4;
                floor.floordestheight = find_highest_floor_surrounding(&ctx.level, s);
                if floor.floordestheight != sec.floorheight {
                    floor.floordestheight += Fixed::from_int(8);
                }
            }
            FloorKind::RaiseFloor | FloorKind::RaiseFloorCrush => {
                floor.crush = kind == FloorKind::RaiseFloorCrush;
                floor.direction = 1;
                let mut dest = find_lowest_ceiling_surrounding(&ctx.level, s);
                if dest > sec.ceilingheight {
                    dest = sec.ceilingheight;
                }
                if floor.crush {
                    dest -= Fixed::from_int(8);
                }
                floor.floordestheight = dest;
            }
            FloorKind::RaiseFloorTurbo => {
                floor.direction = 1;
                floor.speed = FLOORSPEED * 4;
                floor.floordestheight = find_next_highest_floor(&ctx.level, s, sec.floorheight);
            }
            FloorKind::RaiseFloorToNearest => {
                floor.direction = 1;
                floor.floordestheight = find_next_highest_floor(&ctx.level, s, sec.floorheight);
            }
            FloorKind::RaiseFloor24 => {
                floor.direction = 1;
                floor.floordestheight = sec.floorheight + Fixed::from_int(24);
            }
            FloorKind::LowerAndChange => {
                floor.floordestheight = find_lowest_floor_surrounding(&ctx.level, s);
                if let Some((texture, special)) =
                    model_sector_for_floor(ctx, s, floor.floordestheight)
                {
                    floor.texture = Some(texture);
                    floor.newspecial = special;
                }
            }
        }

        let id = ctx.thinkers.add(Thinker::Floor(floor));
        ctx.level.sectors[s].special_data = Some(id);
    }
    rtn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::p_spec::tests::two_rooms;
    use crate::p_tick::run_thinkers;

    #[test]
    fn test_lower_to_neighbour_and_finish() {
        // sector 0 floor 64, neighbour floor 0
        let mut ctx = two_rooms(64, 0);
        ctx.level.sectors[0].tag = 7;
        assert!(ev_do_floor(&mut ctx, 7, FloorKind::LowerFloorToLowest));
        let id = ctx.level.sectors[0].special_data.unwrap();

        // a second trigger does nothing while the sector is busy
        assert!(!ev_do_floor(&mut ctx, 7, FloorKind::LowerFloorToLowest));

        for _ in 0..64 {
            run_thinkers(&mut ctx);
        }
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::ZERO);
        assert!(ctx.thinkers.is_live(id));

        // the step that would pass the destination ends the move
        run_thinkers(&mut ctx);
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::ZERO);
        assert_eq!(ctx.level.sectors[0].special_data, None);
        assert!(!ctx.thinkers.is_live(id));
        assert!(ctx.sounds.drain().any(|c| c.sfx == Sfx::Pstop));
    }

    #[test]
    fn test_raise_24() {
        let mut ctx = two_rooms(0, 0);
        ctx.level.sectors[1].tag = 3;
        assert!(ev_do_floor(&mut ctx, 3, FloorKind::RaiseFloor24));
        for _ in 0..30 {
            run_thinkers(&mut ctx);
        }
        assert_eq!(ctx.level.sectors[1].floorheight, Fixed::from_int(24));
    }

    #[test]
    fn test_lower_and_change_takes_model_special() {
        let mut ctx = two_rooms(16, 0);
        ctx.level.sectors[1].special = 9;
        ctx.level.sectors[1].floorpic = "NUKAGE1".into();
        ctx.level.sectors[0].tag = 2;
        ev_do_floor(&mut ctx, 2, FloorKind::LowerAndChange);
        for _ in 0..20 {
            run_thinkers(&mut ctx);
        }
        assert_eq!(ctx.level.sectors[0].special, 9);
        assert_eq!(ctx.level.sectors[0].floorpic, "NUKAGE1");
    }

    #[test]
    fn test_move_plane_direction_zero_is_noop() {
        let mut ctx = two_rooms(8, 0);
        let r = move_plane(&mut ctx, 0, FLOORSPEED, Fixed::ZERO, false, Plane::Floor, 0);
        assert_eq!(r, MoveResult::Ok);
        assert_eq!(ctx.level.sectors[0].floorheight, Fixed::from_int(8));
    }

    #[test]
    fn test_unknown_tag() {
        let mut ctx = two_rooms(0, 0);
        assert!(!ev_do_floor(&mut ctx, 99, FloorKind::RaiseFloor));
        assert!(ctx.thinkers.is_empty());
    }
}
