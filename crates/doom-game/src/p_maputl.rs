// p_maputl.rs — map geometry queries and blockmap links

use doom_common::m_bbox::{BBox, BOXBOTTOM, BOXLEFT, BOXRIGHT, BOXTOP};
use doom_common::m_fixed::{fixed_mul, Fixed, FRACBITS};
use doom_common::wadfiles::NF_SUBSECTOR;

use crate::info::MobjFlags;
use crate::p_local::{PlayContext, MAPBLOCKSHIFT};
use crate::p_tick::ThinkerId;
use crate::r_defs::{Level, Line, Node, SlopeType};

/// Side of a BSP partition: 0 front, 1 back.
pub fn point_on_side(x: Fixed, y: Fixed, node: &Node) -> usize {
    if node.dx.0 == 0 {
        if x <= node.x {
            return (node.dy.0 > 0) as usize;
        }
        return (node.dy.0 < 0) as usize;
    }
    if node.dy.0 == 0 {
        if y <= node.y {
            return (node.dx.0 < 0) as usize;
        }
        return (node.dx.0 > 0) as usize;
    }

    let dx = x - node.x;
    let dy = y - node.y;

    // sign bits alone decide it
    if (node.dy.0 ^ node.dx.0 ^ dx.0 ^ dy.0) < 0 {
        if (node.dy.0 ^ dx.0) < 0 {
            return 1;
        }
        return 0;
    }

    let left = fixed_mul(Fixed(node.dy.0 >> FRACBITS), dx);
    let right = fixed_mul(dy, Fixed(node.dx.0 >> FRACBITS));
    if right < left {
        0
    } else {
        1
    }
}

/// Side of a line: 0 front, 1 back.
pub fn point_on_line_side(x: Fixed, y: Fixed, level: &Level, line: &Line) -> i32 {
    let v1 = level.vertexes[line.v1];
    if line.dx.0 == 0 {
        if x <= v1.x {
            return (line.dy.0 > 0) as i32;
        }
        return (line.dy.0 < 0) as i32;
    }
    if line.dy.0 == 0 {
        if y <= v1.y {
            return (line.dx.0 < 0) as i32;
        }
        return (line.dx.0 > 0) as i32;
    }

    let dx = x - v1.x;
    let dy = y - v1.y;
    let left = fixed_mul(Fixed(line.dy.0 >> FRACBITS), dx);
    let right = fixed_mul(dy, Fixed(line.dx.0 >> FRACBITS));
    if right < left {
        0
    } else {
        1
    }
}

/// 0 or 1 when the box lies entirely on one side of the line, -1 if it
/// crosses.
pub fn box_on_line_side(tmbox: &BBox, level: &Level, line: &Line) -> i32 {
    let v1 = level.vertexes[line.v1];
    let (p1, p2) = match line.slopetype {
        SlopeType::Horizontal => {
            let mut p1 = (tmbox.0[BOXTOP] > v1.y) as i32;
            let mut p2 = (tmbox.0[BOXBOTTOM] > v1.y) as i32;
            if line.dx.0 < 0 {
                p1 ^= 1;
                p2 ^= 1;
            }
            (p1, p2)
        }
        SlopeType::Vertical => {
            let mut p1 = (tmbox.0[BOXRIGHT] < v1.x) as i32;
            let mut p2 = (tmbox.0[BOXLEFT] < v1.x) as i32;
            if line.dy.0 < 0 {
                p1 ^= 1;
                p2 ^= 1;
            }
            (p1, p2)
        }
        SlopeType::Positive => (
            point_on_line_side(tmbox.0[BOXLEFT], tmbox.0[BOXTOP], level, line),
            point_on_line_side(tmbox.0[BOXRIGHT], tmbox.0[BOXBOTTOM], level, line),
        ),
        SlopeType::Negative => (
            point_on_line_side(tmbox.0[BOXRIGHT], tmbox.0[BOXTOP], level, line),
            point_on_line_side(tmbox.0[BOXLEFT], tmbox.0[BOXBOTTOM], level, line),
        ),
    };

    if p1 == p2 {
        p1
    } else {
        -1
    }
}

/// Vertical gap through a two-sided line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening {
    pub top: Fixed,
    pub bottom: Fixed,
    pub range: Fixed,
    pub lowfloor: Fixed,
}

pub fn line_opening(level: &Level, line: &Line) -> Opening {
    let (front, back) = match (line.frontsector, line.backsector) {
        (Some(f), Some(b)) => (&level.sectors[f], &level.sectors[b]),
        _ => {
            return Opening {
                top: Fixed::ZERO,
                bottom: Fixed::ZERO,
                range: Fixed::ZERO,
                lowfloor: Fixed::ZERO,
            }
        }
    };

    let top = front.ceilingheight.min(back.ceilingheight);
    let (bottom, lowfloor) = if front.floorheight > back.floorheight {
        (front.floorheight, back.floorheight)
    } else {
        (back.floorheight, front.floorheight)
    };

    Opening {
        top,
        bottom,
        range: top - bottom,
        lowfloor,
    }
}

/// BSP walk down to the subsector containing a point.
pub fn point_in_subsector(level: &Level, x: Fixed, y: Fixed) -> usize {
    // single subsector case
    if level.nodes.is_empty() {
        return 0;
    }

    let mut nodenum = (level.nodes.len() - 1) as u16;
    while nodenum & NF_SUBSECTOR == 0 {
        let node = &level.nodes[nodenum as usize];
        let side = point_on_side(x, y, node);
        nodenum = node.children[side];
    }
    (nodenum & !NF_SUBSECTOR) as usize
}

// ============================================================
// Thing position setting
// ============================================================

/// Unlinks a thing from its block chain. Call before changing its position.
pub fn unset_thing_position(ctx: &mut PlayContext, id: ThinkerId) {
    let (x, y, flags, bnext, bprev) = match ctx.thinkers.mobj(id) {
        Some(mo) => (mo.x, mo.y, mo.flags, mo.bnext, mo.bprev),
        None => return,
    };
    if flags.contains(MobjFlags::NOBLOCKMAP) {
        return;
    }

    if let Some(n) = bnext {
        if let Some(next) = ctx.thinkers.mobj_mut(n) {
            next.bprev = bprev;
        }
    }
    match bprev {
        Some(p) => {
            if let Some(prev) = ctx.thinkers.mobj_mut(p) {
                prev.bnext = bnext;
            }
        }
        None => {
            let blockmap = &mut ctx.level.blockmap;
            if let Some(cell) = blockmap.cell_at(x, y) {
                if blockmap.links[cell] == Some(id) {
                    blockmap.links[cell] = bnext;
                }
            }
        }
    }

    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        mo.bnext = None;
        mo.bprev = None;
    }
}

/// Records the thing's subsector and links it at the head of its block
/// chain. Things outside the grid keep no block links.
pub fn set_thing_position(ctx: &mut PlayContext, id: ThinkerId) {
    let (x, y, flags) = match ctx.thinkers.mobj(id) {
        Some(mo) => (mo.x, mo.y, mo.flags),
        None => return,
    };
    let ss = point_in_subsector(&ctx.level, x, y);

    let mut head = None;
    let mut linked = false;
    if !flags.contains(MobjFlags::NOBLOCKMAP) {
        if let Some(cell) = ctx.level.blockmap.cell_at(x, y) {
            head = ctx.level.blockmap.links[cell];
            ctx.level.blockmap.links[cell] = Some(id);
            linked = true;
        }
    }

    if let Some(h) = head {
        if let Some(next) = ctx.thinkers.mobj_mut(h) {
            next.bprev = Some(id);
        }
    }
    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        mo.subsector = ss;
        if linked {
            mo.bprev = None;
            mo.bnext = head;
        } else if !flags.contains(MobjFlags::NOBLOCKMAP) {
            mo.bprev = None;
            mo.bnext = None;
        }
    }
}

// ============================================================
// Block iterators
// ============================================================

/// Calls `func` for each line in a block, once per validcount. Stops and
/// returns false as soon as `func` does.
pub fn block_lines_iterate<F>(ctx: &mut PlayContext, bx: i32, by: i32, mut func: F) -> bool
where
    F: FnMut(&mut PlayContext, usize) -> bool,
{
    let cell = match ctx.level.blockmap.cell_index(bx, by) {
        Some(c) => c,
        None => return true,
    };
    let lines: Vec<usize> = ctx.level.blockmap.cell_lines(cell).collect();
    let validcount = ctx.validcount;

    for ld in lines {
        let line = match ctx.level.lines.get_mut(ld) {
            Some(l) => l,
            None => continue,
        };
        if line.validcount == validcount {
            continue;
        }
        line.validcount = validcount;
        if !func(ctx, ld) {
            return false;
        }
    }
    true
}

/// Calls `func` for each thing linked in a block. The next link is read
/// before `func` runs, so `func` may unlink or move the current thing.
pub fn blocklinks_iterate<F>(ctx: &mut PlayContext, bx: i32, by: i32, mut func: F) -> bool
where
    F: FnMut(&mut PlayContext, ThinkerId) -> bool,
{
    let cell = match ctx.level.blockmap.cell_index(bx, by) {
        Some(c) => c,
        None => return true,
    };

    let mut cursor = ctx.level.blockmap.links[cell];
    while let Some(id) = cursor {
        cursor = ctx.thinkers.mobj(id).and_then(|mo| mo.bnext);
        if !func(ctx, id) {
            return false;
        }
    }
    true
}

/// Block range covered by a box, clipped to nothing in particular.
pub fn block_range(ctx: &PlayContext, bbox: &BBox, margin: Fixed) -> (i32, i32, i32, i32) {
    let bm = &ctx.level.blockmap;
    let xl = (bbox.0[BOXLEFT] - bm.orgx - margin).0 >> MAPBLOCKSHIFT;
    let xh = (bbox.0[BOXRIGHT] - bm.orgx + margin).0 >> MAPBLOCKSHIFT;
    let yl = (bbox.0[BOXBOTTOM] - bm.orgy - margin).0 >> MAPBLOCKSHIFT;
    let yh = (bbox.0[BOXTOP] - bm.orgy + margin).0 >> MAPBLOCKSHIFT;
    (xl, xh, yl, yh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doom_common::m_fixed::FRACUNIT;
    use proptest::prelude::*;

    fn node(x: i32, y: i32, dx: i32, dy: i32, children: [u16; 2]) -> Node {
        Node {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
            dx: Fixed::from_int(dx),
            dy: Fixed::from_int(dy),
            bbox: [BBox::default(); 2],
            children,
        }
    }

    #[test]
    fn test_point_on_side_axis_aligned() {
        // partition pointing north along x = 0: east is front
        let n = node(0, 0, 0, 64, [0, 1]);
        assert_eq!(point_on_side(Fixed::from_int(10), Fixed::ZERO, &n), 0);
        assert_eq!(point_on_side(Fixed::from_int(-10), Fixed::ZERO, &n), 1);

        // partition pointing east along y = 0: south is front
        let n = node(0, 0, 64, 0, [0, 1]);
        assert_eq!(point_on_side(Fixed::ZERO, Fixed::from_int(-10), &n), 0);
        assert_eq!(point_on_side(Fixed::ZERO, Fixed::from_int(10), &n), 1);
    }

    #[test]
    fn test_point_on_side_diagonal() {
        let n = node(0, 0, 64, 64, [0, 1]);
        assert_eq!(point_on_side(Fixed::from_int(10), Fixed::from_int(-10), &n), 0);
        assert_eq!(point_on_side(Fixed::from_int(-10), Fixed::from_int(10), &n), 1);
        assert_eq!(point_on_side(Fixed::from_int(20), Fixed::from_int(5), &n), 0);
    }

    #[test]
    fn test_point_in_subsector_walks_nodes() {
        let mut level = Level::default();
        assert_eq!(point_in_subsector(&level, Fixed::ZERO, Fixed::ZERO), 0);

        level.nodes = vec![node(0, 0, 0, 64, [NF_SUBSECTOR, NF_SUBSECTOR | 1])];
        assert_eq!(point_in_subsector(&level, Fixed::from_int(5), Fixed::ZERO), 0);
        assert_eq!(point_in_subsector(&level, Fixed::from_int(-5), Fixed::ZERO), 1);
        assert_eq!(point_in_subsector(&level, Fixed(-FRACUNIT), Fixed(3 * FRACUNIT)), 1);
    }

    proptest! {
        #[test]
        fn prop_point_on_side_follows_cross_product(
            nx in -2048i32..2048,
            ny in -2048i32..2048,
            ndx in -512i32..512,
            ndy in -512i32..512,
            px in -2048i32..2048,
            py in -2048i32..2048,
        ) {
            prop_assume!(ndx != 0 || ndy != 0);
            // points on the partition itself are left to the tie rules
            let cross = ndx as i64 * (py - ny) as i64 - ndy as i64 * (px - nx) as i64;
            prop_assume!(cross != 0);

            let n = node(nx, ny, ndx, ndy, [0, 1]);
            let side = point_on_side(Fixed::from_int(px), Fixed::from_int(py), &n);
            prop_assert_eq!(side, (cross > 0) as usize);
        }
    }
}
