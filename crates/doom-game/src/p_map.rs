// p_map.rs — movement clipping and sector height changes

use doom_common::m_bbox::{BBox, BOXBOTTOM, BOXLEFT, BOXRIGHT, BOXTOP};
use doom_common::m_fixed::Fixed;
use doom_common::wadfiles::LineFlags;

use crate::info::MobjFlags;
use crate::p_local::{PlayContext, MAXRADIUS, MAXSTEP};
use crate::p_maputl::{
    block_lines_iterate, block_range, blocklinks_iterate, box_on_line_side, line_opening,
    point_in_subsector, set_thing_position, unset_thing_position,
};
use crate::p_mobj::{damage_mobj, remove_mobj};
use crate::p_tick::ThinkerId;

/// Result of probing a position for a thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionCheck {
    pub fits: bool,
    pub floorz: Fixed,
    pub ceilingz: Fixed,
    /// Lowest floor touched, for dropoff checks.
    pub dropoffz: Fixed,
}

struct Clip {
    thing: ThinkerId,
    flags: MobjFlags,
    is_player: bool,
    x: Fixed,
    y: Fixed,
    radius: Fixed,
    bbox: BBox,
    floorz: Fixed,
    ceilingz: Fixed,
    dropoffz: Fixed,
}

fn pit_check_thing(ctx: &PlayContext, tm: &Clip, other: ThinkerId) -> bool {
    if other == tm.thing {
        return true;
    }
    let o = match ctx.thinkers.mobj(other) {
        Some(o) => o,
        None => return true,
    };
    if !o
        .flags
        .intersects(MobjFlags::SOLID | MobjFlags::SPECIAL | MobjFlags::SHOOTABLE)
    {
        return true;
    }

    let blockdist = o.radius + tm.radius;
    if (o.x - tm.x).abs() >= blockdist || (o.y - tm.y).abs() >= blockdist {
        // didn't hit it
        return true;
    }

    !o.flags.contains(MobjFlags::SOLID)
}

fn pit_check_line(ctx: &PlayContext, tm: &mut Clip, ld: usize) -> bool {
    let line = &ctx.level.lines[ld];
    if tm.bbox.0[BOXRIGHT] <= line.bbox.0[BOXLEFT]
        || tm.bbox.0[BOXLEFT] >= line.bbox.0[BOXRIGHT]
        || tm.bbox.0[BOXTOP] <= line.bbox.0[BOXBOTTOM]
        || tm.bbox.0[BOXBOTTOM] >= line.bbox.0[BOXTOP]
    {
        return true;
    }
    if box_on_line_side(&tm.bbox, &ctx.level, line) != -1 {
        return true;
    }

    // one sided line
    if line.backsector.is_none() {
        return false;
    }
    if !tm.flags.contains(MobjFlags::MISSILE) {
        if line.flags.contains(LineFlags::BLOCKING) {
            return false;
        }
        if !tm.is_player && line.flags.contains(LineFlags::BLOCKMONSTERS) {
            return false;
        }
    }

    let open = line_opening(&ctx.level, line);
    if open.top < tm.ceilingz {
        tm.ceilingz = open.top;
    }
    if open.bottom > tm.floorz {
        tm.floorz = open.bottom;
    }
    if open.lowfloor < tm.dropoffz {
        tm.dropoffz = open.lowfloor;
    }
    true
}

/// Would `thing` fit at (x, y)? Does not move it. Checks solid things in
/// the surrounding blocks and the lines crossing its bounding box.
pub fn check_position(ctx: &mut PlayContext, thing: ThinkerId, x: Fixed, y: Fixed) -> PositionCheck {
    let (flags, radius, is_player) = match ctx.thinkers.mobj(thing) {
        Some(mo) => (mo.flags, mo.radius, mo.player.is_some()),
        None => {
            return PositionCheck {
                fits: false,
                floorz: Fixed::ZERO,
                ceilingz: Fixed::ZERO,
                dropoffz: Fixed::ZERO,
            }
        }
    };

    let ss = point_in_subsector(&ctx.level, x, y);
    let sector = ctx
        .level
        .subsectors
        .get(ss)
        .and_then(|s| ctx.level.sectors.get(s.sector));
    let (floor, ceiling) = sector
        .map(|s| (s.floorheight, s.ceilingheight))
        .unwrap_or((Fixed::ZERO, Fixed::ZERO));

    let mut tm = Clip {
        thing,
        flags,
        is_player,
        x,
        y,
        radius,
        bbox: BBox([y + radius, y - radius, x - radius, x + radius]),
        floorz: floor,
        ceilingz: ceiling,
        dropoffz: floor,
    };

    let result = |tm: &Clip, fits| PositionCheck {
        fits,
        floorz: tm.floorz,
        ceilingz: tm.ceilingz,
        dropoffz: tm.dropoffz,
    };

    ctx.next_validcount();

    if flags.contains(MobjFlags::NOCLIP) {
        return result(&tm, true);
    }

    // things can reach into neighbouring blocks by up to MAXRADIUS
    let (xl, xh, yl, yh) = block_range(ctx, &tm.bbox, MAXRADIUS);
    for bx in xl..=xh {
        for by in yl..=yh {
            if !blocklinks_iterate(ctx, bx, by, |ctx, other| pit_check_thing(ctx, &tm, other)) {
                return result(&tm, false);
            }
        }
    }

    let (xl, xh, yl, yh) = block_range(ctx, &tm.bbox, Fixed::ZERO);
    for bx in xl..=xh {
        for by in yl..=yh {
            if !block_lines_iterate(ctx, bx, by, |ctx, ld| pit_check_line(ctx, &mut tm, ld)) {
                return result(&tm, false);
            }
        }
    }

    result(&tm, true)
}

/// Moves `thing` to (x, y) if it fits there.
pub fn try_move(ctx: &mut PlayContext, thing: ThinkerId, x: Fixed, y: Fixed) -> bool {
    let check = check_position(ctx, thing, x, y);
    if !check.fits {
        return false;
    }

    let (flags, z, height) = match ctx.thinkers.mobj(thing) {
        Some(mo) => (mo.flags, mo.z, mo.height),
        None => return false,
    };

    if !flags.contains(MobjFlags::NOCLIP) {
        if check.ceilingz - check.floorz < height {
            // doesn't fit
            return false;
        }
        if check.ceilingz - z < height {
            // mobj must lower itself to fit
            return false;
        }
        if !flags.contains(MobjFlags::TELEPORT) && check.floorz - z > MAXSTEP {
            // too big a step up
            return false;
        }
        if !flags.intersects(MobjFlags::DROPOFF | MobjFlags::FLOAT)
            && check.floorz - check.dropoffz > MAXSTEP
        {
            // don't stand over a dropoff
            return false;
        }
    }

    unset_thing_position(ctx, thing);
    if let Some(mo) = ctx.thinkers.mobj_mut(thing) {
        mo.floorz = check.floorz;
        mo.ceilingz = check.ceilingz;
        mo.x = x;
        mo.y = y;
    }
    set_thing_position(ctx, thing);
    true
}

/// Re-reads floor and ceiling for a thing that has not moved. Returns
/// false if it no longer fits vertically.
pub fn thing_height_clip(ctx: &mut PlayContext, thing: ThinkerId) -> bool {
    let (x, y, z, floorz) = match ctx.thinkers.mobj(thing) {
        Some(mo) => (mo.x, mo.y, mo.z, mo.floorz),
        None => return true,
    };
    let onfloor = z == floorz;
    let check = check_position(ctx, thing, x, y);

    match ctx.thinkers.mobj_mut(thing) {
        Some(mo) => {
            mo.floorz = check.floorz;
            mo.ceilingz = check.ceilingz;
            if onfloor {
                // walking monsters rise and fall with the floor
                mo.z = mo.floorz;
            } else if mo.z + mo.height > mo.ceilingz {
                // don't adjust a floating monster unless forced to
                mo.z = mo.ceilingz - mo.height;
            }
            mo.ceilingz - mo.floorz >= mo.height
        }
        None => true,
    }
}

fn pit_change_sector(ctx: &mut PlayContext, thing: ThinkerId, crush: bool, nofit: &mut bool) -> bool {
    if thing_height_clip(ctx, thing) {
        // keep checking
        return true;
    }

    let (health, flags) = match ctx.thinkers.mobj(thing) {
        Some(mo) => (mo.health, mo.flags),
        None => return true,
    };

    // crunch bodies to giblets
    if health <= 0 {
        if let Some(mo) = ctx.thinkers.mobj_mut(thing) {
            mo.flags.remove(MobjFlags::SOLID);
            mo.height = Fixed::ZERO;
            mo.radius = Fixed::ZERO;
        }
        return true;
    }

    // crunch dropped items
    if flags.contains(MobjFlags::DROPPED) {
        remove_mobj(ctx, thing);
        return true;
    }

    if !flags.contains(MobjFlags::SHOOTABLE) {
        // assume it is bloody gibs or something
        return true;
    }

    *nofit = true;

    if crush && ctx.leveltime() & 3 == 0 {
        damage_mobj(ctx, thing, 10);
    }
    true
}

/// Re-fits every thing in the sector's block range after a height change.
/// Returns true if something no longer fits.
pub fn change_sector(ctx: &mut PlayContext, sector: usize, crush: bool) -> bool {
    let blockbox = match ctx.level.sectors.get(sector) {
        Some(s) => s.blockbox,
        None => return false,
    };
    let mut nofit = false;

    for x in blockbox[BOXLEFT]..=blockbox[BOXRIGHT] {
        for y in blockbox[BOXBOTTOM]..=blockbox[BOXTOP] {
            blocklinks_iterate(ctx, x, y, |ctx, thing| {
                pit_change_sector(ctx, thing, crush, &mut nofit)
            });
        }
    }
    nofit
}
