// p_spec.rs — sector specials and adjacent-sector queries

use doom_common::m_fixed::{Fixed, FRACUNIT};

use crate::p_doors::{spawn_door_close_in30, spawn_door_raise_in5mins};
use crate::p_local::{ExitRequest, PlayContext};
use crate::p_mobj::damage_mobj;
use crate::r_defs::Level;

/// Line special that scrolls its front texture one unit per tic.
const SCROLL_LINE_SPECIAL: i16 = 48;

fn neighbours(level: &Level, secnum: usize) -> impl Iterator<Item = usize> + '_ {
    level.sectors[secnum]
        .lines
        .iter()
        .filter_map(move |&ld| level.next_sector(ld, secnum))
}

pub fn find_lowest_floor_surrounding(level: &Level, secnum: usize) -> Fixed {
    neighbours(level, secnum)
        .map(|s| level.sectors[s].floorheight)
        .fold(level.sectors[secnum].floorheight, Fixed::min)
}

pub fn find_highest_floor_surrounding(level: &Level, secnum: usize) -> Fixed {
    neighbours(level, secnum)
        .map(|s| level.sectors[s].floorheight)
        .fold(Fixed(-500 * FRACUNIT), Fixed::max)
}

/// Lowest neighbouring floor above `currentheight`, or `currentheight`
/// itself when there is none.
pub fn find_next_highest_floor(level: &Level, secnum: usize, currentheight: Fixed) -> Fixed {
    neighbours(level, secnum)
        .map(|s| level.sectors[s].floorheight)
        .filter(|&h| h > currentheight)
        .min()
        .unwrap_or(currentheight)
}

pub fn find_lowest_ceiling_surrounding(level: &Level, secnum: usize) -> Fixed {
    neighbours(level, secnum)
        .map(|s| level.sectors[s].ceilingheight)
        .fold(Fixed::MAX, Fixed::min)
}

pub fn find_highest_ceiling_surrounding(level: &Level, secnum: usize) -> Fixed {
    neighbours(level, secnum)
        .map(|s| level.sectors[s].ceilingheight)
        .fold(Fixed::ZERO, Fixed::max)
}

/// Next sector after `start` carrying `tag`.
pub fn find_sector_from_tag(level: &Level, tag: i16, start: Option<usize>) -> Option<usize> {
    let from = start.map_or(0, |s| s + 1);
    level
        .sectors
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, s)| s.tag == tag)
        .map(|(i, _)| i)
}

/// Creates the level-start sector effects and resets the mover lists.
pub fn spawn_specials(ctx: &mut PlayContext) {
    for secnum in 0..ctx.level.sectors.len() {
        match ctx.level.sectors[secnum].special {
            9 => ctx.level.totalsecret += 1,
            10 => spawn_door_close_in30(ctx, secnum),
            14 => spawn_door_raise_in5mins(ctx, secnum),
            _ => {}
        }
    }

    ctx.activeceilings.clear();
    ctx.activeplats.clear();
}

/// Effects of standing on a special sector floor.
pub fn player_in_special_sector(ctx: &mut PlayContext, playernum: usize) {
    let mo_id = match ctx.players[playernum].mo {
        Some(id) => id,
        None => return,
    };
    let (z, subsector) = match ctx.thinkers.mobj(mo_id) {
        Some(mo) => (mo.z, mo.subsector),
        None => return,
    };
    let secnum = match ctx.level.subsectors.get(subsector) {
        Some(ss) => ss.sector,
        None => return,
    };
    let (floorheight, special) = match ctx.level.sectors.get(secnum) {
        Some(s) => (s.floorheight, s.special),
        None => return,
    };

    // falling, not all the way down yet?
    if z != floorheight {
        return;
    }

    let hurt_tic = ctx.leveltime() & 0x1f == 0;
    match special {
        // hellslime damage
        5 if hurt_tic => damage_mobj(ctx, mo_id, 10),
        // nukage damage
        7 if hurt_tic => damage_mobj(ctx, mo_id, 5),
        // super hellslime damage, strobe hurt
        16 | 4 if hurt_tic => damage_mobj(ctx, mo_id, 20),
        9 => {
            ctx.players[playernum].secretcount += 1;
            ctx.level.sectors[secnum].special = 0;
        }
        11 => {
            if hurt_tic {
                damage_mobj(ctx, mo_id, 20);
            }
            if ctx.players[playernum].health <= 10 {
                ctx.exit_request = Some(ExitRequest::Normal);
            }
        }
        _ => {}
    }
}

/// Per-tic animated specials.
pub fn update_specials(ctx: &mut PlayContext) {
    let Level { lines, sides, .. } = &mut ctx.level;
    for line in lines.iter().filter(|l| l.special == SCROLL_LINE_SPECIAL) {
        if let Some(side) = line.sidenum[0].and_then(|s| sides.get_mut(s)) {
            side.textureoffset += Fixed(FRACUNIT);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::r_defs::{Line, Sector, Side, SlopeType, Vertex};
    use doom_common::m_bbox::BBox;
    use doom_common::wadfiles::LineFlags;

    /// Two sectors sharing one two-sided line, ceilings at 128.
    pub(crate) fn two_rooms(floor0: i32, floor1: i32) -> PlayContext {
        let mut ctx = PlayContext::default();
        ctx.playeringame = [false; 4];
        let sector = |floor: i32| Sector {
            floorheight: Fixed::from_int(floor),
            ceilingheight: Fixed::from_int(128),
            linecount: 1,
            lines: vec![0],
            ..Sector::default()
        };
        ctx.level.sectors = vec![sector(floor0), sector(floor1)];
        ctx.level.vertexes = vec![
            Vertex { x: Fixed::ZERO, y: Fixed::ZERO },
            Vertex { x: Fixed::ZERO, y: Fixed::from_int(64) },
        ];
        ctx.level.sides = vec![
            Side { sector: 0, ..Side::default() },
            Side { sector: 1, ..Side::default() },
        ];
        ctx.level.lines = vec![Line {
            v1: 0,
            v2: 1,
            dx: Fixed::ZERO,
            dy: Fixed::from_int(64),
            flags: LineFlags::TWOSIDED,
            special: 0,
            tag: 0,
            sidenum: [Some(0), Some(1)],
            bbox: BBox::from_points(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, Fixed::from_int(64)),
            slopetype: SlopeType::Vertical,
            frontsector: Some(0),
            backsector: Some(1),
            validcount: 0,
        }];
        ctx
    }

    #[test]
    fn test_surrounding_queries() {
        let mut ctx = two_rooms(32, 8);
        ctx.level.sectors[1].ceilingheight = Fixed::from_int(96);
        let level = &ctx.level;
        assert_eq!(find_lowest_floor_surrounding(level, 0), Fixed::from_int(8));
        assert_eq!(find_lowest_floor_surrounding(level, 1), Fixed::from_int(8));
        assert_eq!(find_highest_floor_surrounding(level, 1), Fixed::from_int(32));
        assert_eq!(find_next_highest_floor(level, 1, Fixed::from_int(8)), Fixed::from_int(32));
        assert_eq!(find_next_highest_floor(level, 0, Fixed::from_int(32)), Fixed::from_int(32));
        assert_eq!(find_lowest_ceiling_surrounding(level, 0), Fixed::from_int(96));
        assert_eq!(find_highest_ceiling_surrounding(level, 1), Fixed::from_int(128));
    }

    #[test]
    fn test_one_sided_lines_have_no_neighbours() {
        let mut ctx = two_rooms(0, 0);
        ctx.level.lines[0].flags = LineFlags::empty();
        assert_eq!(find_highest_floor_surrounding(&ctx.level, 0), Fixed(-500 * FRACUNIT));
        assert_eq!(find_lowest_ceiling_surrounding(&ctx.level, 0), Fixed::MAX);
    }

    #[test]
    fn test_find_sector_from_tag_walks_forward() {
        let mut ctx = two_rooms(0, 0);
        ctx.level.sectors[0].tag = 4;
        ctx.level.sectors[1].tag = 4;
        let first = find_sector_from_tag(&ctx.level, 4, None);
        assert_eq!(first, Some(0));
        assert_eq!(find_sector_from_tag(&ctx.level, 4, first), Some(1));
        assert_eq!(find_sector_from_tag(&ctx.level, 4, Some(1)), None);
    }

    #[test]
    fn test_spawn_specials_counts_secrets_and_doors() {
        let mut ctx = two_rooms(0, 0);
        ctx.level.sectors[0].special = 9;
        ctx.level.sectors[1].special = 10;
        spawn_specials(&mut ctx);
        assert_eq!(ctx.level.totalsecret, 1);
        assert!(ctx.level.sectors[1].special_data.is_some());
        assert_eq!(ctx.level.sectors[1].special, 0);
    }

    #[test]
    fn test_scrolling_line() {
        let mut ctx = two_rooms(0, 0);
        ctx.level.lines[0].special = SCROLL_LINE_SPECIAL;
        update_specials(&mut ctx);
        update_specials(&mut ctx);
        assert_eq!(ctx.level.sides[0].textureoffset, Fixed::from_int(2));
        assert_eq!(ctx.level.sides[1].textureoffset, Fixed::ZERO);
    }
}
