// p_setup.rs — level loading and derived geometry

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

use rayon::prelude::*;

use doom_common::common::{com_dprintf, i_error};
use doom_common::doom_error::DoomResult;
use doom_common::doomdef::{GameMode, MAXPLAYERS};
use doom_common::m_bbox::{BBox, BOXBOTTOM, BOXLEFT, BOXRIGHT, BOXTOP};
use doom_common::m_fixed::{Fixed, FRACBITS};
use doom_common::tables::Angle;
use doom_common::w_wad::{LumpStore, PuTag};
use doom_common::wadfiles::{
    LineFlags, MapLineDef, MapNode, MapRecord, MapSector, MapSeg, MapSideDef, MapSubSector,
    MapThing, MapVertex, ML_BLOCKMAP, ML_LINEDEFS, ML_NODES, ML_REJECT, ML_SECTORS, ML_SEGS,
    ML_SIDEDEFS, ML_SSECTORS, ML_THINGS, ML_VERTEXES, NF_SUBSECTOR,
};

use crate::p_local::{PlayContext, MAPBLOCKSHIFT, MAXRADIUS};
use crate::p_mobj::spawn_map_thing;
use crate::p_spec::spawn_specials;
use crate::r_defs::{
    Blockmap, Level, Line, Node, Sector, Seg, Side, SlopeType, SoundOrigin, SubSector, Vertex,
};

/// Below this record count a lump is decoded sequentially.
const PARALLEL_LUMP_THRESHOLD: usize = 64;

/// Doom II monsters that the other game modes have no sprites for.
const COMMERCIAL_ONLY_THINGS: [i16; 10] = [68, 64, 88, 89, 69, 67, 71, 65, 66, 84];

#[inline]
fn to_fixed(v: i16) -> Fixed {
    Fixed((v as i32) << FRACBITS)
}

/// Marker lump name for a level.
pub fn level_lump_name(gamemode: GameMode, episode: i32, map: i32) -> String {
    if gamemode == GameMode::Commercial {
        format!("MAP{:02}", map)
    } else {
        format!("E{}M{}", episode, map)
    }
}

/// Decodes a lump of fixed-size records. A lump that is not a whole number
/// of records is fatal.
fn load_records<T: MapRecord>(store: &mut LumpStore, lump: usize, what: &str) -> DoomResult<Vec<T>> {
    let data = store.cache_lump_num(lump, PuTag::Static)?;
    decode_records(&data, what)
}

fn decode_records<T: MapRecord>(data: &[u8], what: &str) -> DoomResult<Vec<T>> {
    if data.len() % T::SIZE != 0 {
        return Err(i_error(format!("P_SetupLevel: funny lump size ({})", what)));
    }
    let count = data.len() / T::SIZE;
    if count >= PARALLEL_LUMP_THRESHOLD {
        Ok(data.par_chunks_exact(T::SIZE).map(T::parse).collect())
    } else {
        Ok(data.chunks_exact(T::SIZE).map(T::parse).collect())
    }
}

/// Checks a record's reference into another array.
fn index(v: i32, len: usize, what: &str, owner: usize) -> DoomResult<usize> {
    usize::try_from(v)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| i_error(format!("P_SetupLevel: {} {} references {} of {}", what, owner, v, len)))
}

// ============================================================
// Lump loaders
// ============================================================

fn load_blockmap(store: &mut LumpStore, lump: usize) -> DoomResult<Blockmap> {
    let data = store.cache_lump_num(lump, PuTag::Level)?;
    Blockmap::from_lump(&data)
}

fn load_vertexes(store: &mut LumpStore, lump: usize) -> DoomResult<Vec<Vertex>> {
    let raw: Vec<MapVertex> = load_records(store, lump, "vertexes")?;
    Ok(raw
        .iter()
        .map(|v| Vertex { x: to_fixed(v.x), y: to_fixed(v.y) })
        .collect())
}

fn load_sectors(store: &mut LumpStore, lump: usize) -> DoomResult<Vec<Sector>> {
    let raw: Vec<MapSector> = load_records(store, lump, "sectors")?;
    Ok(raw
        .into_iter()
        .map(|ms| Sector {
            floorheight: to_fixed(ms.floorheight),
            ceilingheight: to_fixed(ms.ceilingheight),
            floorpic: ms.floorpic,
            ceilingpic: ms.ceilingpic,
            lightlevel: ms.lightlevel,
            special: ms.special,
            tag: ms.tag,
            ..Sector::default()
        })
        .collect())
}

fn load_sides(store: &mut LumpStore, lump: usize, numsectors: usize) -> DoomResult<Vec<Side>> {
    let raw: Vec<MapSideDef> = load_records(store, lump, "sidedefs")?;
    raw.into_iter()
        .enumerate()
        .map(|(i, msd)| {
            Ok(Side {
                textureoffset: to_fixed(msd.textureoffset),
                rowoffset: to_fixed(msd.rowoffset),
                sector: index(msd.sector as i32, numsectors, "side", i)?,
                toptexture: msd.toptexture,
                bottomtexture: msd.bottomtexture,
                midtexture: msd.midtexture,
            })
        })
        .collect()
}

fn load_lines(store: &mut LumpStore, lump: usize, level: &Level) -> DoomResult<Vec<Line>> {
    let raw: Vec<MapLineDef> = load_records(store, lump, "linedefs")?;
    let mut lines = Vec::with_capacity(raw.len());

    for (i, mld) in raw.iter().enumerate() {
        let v1 = index(mld.v1 as i32, level.vertexes.len(), "line", i)?;
        let v2 = index(mld.v2 as i32, level.vertexes.len(), "line", i)?;
        let (p1, p2) = (level.vertexes[v1], level.vertexes[v2]);
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;

        let mut sidenum = [None; 2];
        for (slot, &raw_side) in sidenum.iter_mut().zip(mld.sidenum.iter()) {
            if raw_side != -1 {
                *slot = Some(index(raw_side as i32, level.sides.len(), "line", i)?);
            }
        }

        lines.push(Line {
            v1,
            v2,
            dx,
            dy,
            flags: LineFlags::from_bits_retain(mld.flags),
            special: mld.special,
            tag: mld.tag,
            sidenum,
            bbox: BBox::from_points(p1.x, p1.y, p2.x, p2.y),
            slopetype: SlopeType::classify(dx, dy),
            frontsector: sidenum[0].map(|s| level.sides[s].sector),
            backsector: sidenum[1].map(|s| level.sides[s].sector),
            validcount: 0,
        });
    }
    Ok(lines)
}

fn load_subsectors(store: &mut LumpStore, lump: usize) -> DoomResult<Vec<SubSector>> {
    let raw: Vec<MapSubSector> = load_records(store, lump, "subsectors")?;
    Ok(raw
        .iter()
        .map(|ms| SubSector {
            sector: 0,
            numsegs: ms.numsegs as u16 as usize,
            firstseg: ms.firstseg as u16 as usize,
        })
        .collect())
}

/// Decodes the BSP nodes. A subsector child must exist and a node child must
/// come before its parent, so every walk from the root ends in a subsector.
fn load_nodes(store: &mut LumpStore, lump: usize, numsubsectors: usize) -> DoomResult<Vec<Node>> {
    let raw: Vec<MapNode> = load_records(store, lump, "nodes")?;
    raw.iter()
        .enumerate()
        .map(|(i, mn)| {
            for &child in &mn.children {
                if child & NF_SUBSECTOR != 0 {
                    index((child & !NF_SUBSECTOR) as i32, numsubsectors, "node", i)?;
                } else {
                    index(child as i32, i, "node", i)?;
                }
            }

            let mut bbox = [BBox::default(); 2];
            for (b, src) in bbox.iter_mut().zip(mn.bbox.iter()) {
                for k in 0..4 {
                    b.0[k] = to_fixed(src[k]);
                }
            }
            Ok(Node {
                x: to_fixed(mn.x),
                y: to_fixed(mn.y),
                dx: to_fixed(mn.dx),
                dy: to_fixed(mn.dy),
                bbox,
                children: mn.children,
            })
        })
        .collect()
}

fn load_segs(store: &mut LumpStore, lump: usize, level: &Level) -> DoomResult<Vec<Seg>> {
    let raw: Vec<MapSeg> = load_records(store, lump, "segs")?;
    let mut segs = Vec::with_capacity(raw.len());

    for (i, ml) in raw.iter().enumerate() {
        let linedef = index(ml.linedef as i32, level.lines.len(), "seg", i)?;
        let ldef = &level.lines[linedef];
        let side = (ml.side != 0) as usize;

        let sidedef = ldef.sidenum[side]
            .ok_or_else(|| i_error(format!("P_LoadSegs: seg {} uses a missing side of line {}", i, linedef)))?;
        let backsector = if ldef.flags.contains(LineFlags::TWOSIDED) {
            ldef.sidenum[side ^ 1].map(|s| level.sides[s].sector)
        } else {
            None
        };

        segs.push(Seg {
            v1: index(ml.v1 as i32, level.vertexes.len(), "seg", i)?,
            v2: index(ml.v2 as i32, level.vertexes.len(), "seg", i)?,
            angle: Angle(((ml.angle as i32) << 16) as u32),
            offset: to_fixed(ml.offset),
            sidedef,
            linedef,
            frontsector: level.sides[sidedef].sector,
            backsector,
        });
    }
    Ok(segs)
}

// ============================================================
// Sector grouping
// ============================================================

/// Counts the lines bounding each sector. A line with the same sector on
/// both sides counts once.
pub fn count_lines(level: &mut Level) {
    for sector in level.sectors.iter_mut() {
        sector.linecount = 0;
    }
    for line in &level.lines {
        if let Some(f) = line.frontsector {
            level.sectors[f].linecount += 1;
        }
        if let Some(b) = line.backsector {
            if line.frontsector != Some(b) {
                level.sectors[b].linecount += 1;
            }
        }
    }
}

/// Fills each sector's line list and derives its bounding box, sound origin
/// and block range. The gathered lists must match the counted ones.
pub fn gather_lines(level: &mut Level) -> DoomResult<()> {
    let Level { sectors, lines, vertexes, blockmap, .. } = level;

    for (secnum, sector) in sectors.iter_mut().enumerate() {
        let mut bbox = BBox::default();
        sector.lines = Vec::with_capacity(sector.linecount);

        for (linenum, line) in lines.iter().enumerate() {
            if line.frontsector == Some(secnum) || line.backsector == Some(secnum) {
                sector.lines.push(linenum);
                let (a, b) = (vertexes[line.v1], vertexes[line.v2]);
                bbox.add_point(a.x, a.y);
                bbox.add_point(b.x, b.y);
            }
        }
        if sector.lines.len() != sector.linecount {
            return Err(i_error("P_GroupLines: miscounted"));
        }

        // set the degenmobj_t to the middle of the bounding box
        sector.soundorg = SoundOrigin {
            x: (bbox.0[BOXRIGHT] + bbox.0[BOXLEFT]) / 2,
            y: (bbox.0[BOXTOP] + bbox.0[BOXBOTTOM]) / 2,
        };

        // adjust bounding box to map blocks
        let mut block = (bbox.0[BOXTOP] - blockmap.orgy + MAXRADIUS).0 >> MAPBLOCKSHIFT;
        sector.blockbox[BOXTOP] = block.min(blockmap.height - 1);

        block = (bbox.0[BOXBOTTOM] - blockmap.orgy - MAXRADIUS).0 >> MAPBLOCKSHIFT;
        sector.blockbox[BOXBOTTOM] = block.max(0);

        block = (bbox.0[BOXRIGHT] - blockmap.orgx + MAXRADIUS).0 >> MAPBLOCKSHIFT;
        sector.blockbox[BOXRIGHT] = block.min(blockmap.width - 1);

        block = (bbox.0[BOXLEFT] - blockmap.orgx - MAXRADIUS).0 >> MAPBLOCKSHIFT;
        sector.blockbox[BOXLEFT] = block.max(0);
    }
    Ok(())
}

/// Builds sector line lists and points each subsector at its sector.
pub fn group_lines(level: &mut Level) -> DoomResult<()> {
    if level.subsectors.is_empty() {
        return Err(i_error("P_SetupLevel: map with no subsectors"));
    }

    // look up sector number for each subsector
    for i in 0..level.subsectors.len() {
        let SubSector { firstseg, numsegs, .. } = level.subsectors[i];
        if numsegs == 0 || firstseg + numsegs > level.segs.len() {
            return Err(i_error(format!(
                "P_GroupLines: subsector {} segs {}..{} of {}",
                i,
                firstseg,
                firstseg + numsegs,
                level.segs.len()
            )));
        }
        let seg = &level.segs[firstseg];
        level.subsectors[i].sector = level.sides[seg.sidedef].sector;
    }

    count_lines(level);
    gather_lines(level)
}

// ============================================================
// Things
// ============================================================

fn load_things(ctx: &mut PlayContext, store: &mut LumpStore, lump: usize) -> DoomResult<()> {
    let things: Vec<MapThing> = load_records(store, lump, "things")?;

    for mt in &things {
        // Do not spawn cool, new monsters if !commercial. The first one ends
        // the things lump.
        if ctx.gamemode != GameMode::Commercial && COMMERCIAL_ONLY_THINGS.contains(&mt.thing_type) {
            break;
        }
        spawn_map_thing(ctx, mt)?;
    }
    Ok(())
}

// ============================================================
// P_SetupLevel
// ============================================================

/// Replaces the current level with `episode`/`map` and populates it.
pub fn setup_level(ctx: &mut PlayContext, store: &mut LumpStore, episode: i32, map: i32) -> DoomResult<()> {
    ctx.level.totalkills = 0;
    ctx.level.totalitems = 0;
    ctx.level.totalsecret = 0;
    for player in ctx.players.iter_mut() {
        player.killcount = 0;
        player.secretcount = 0;
        player.itemcount = 0;
        player.mo = None;
    }

    // the previous level's thinkers and cached geometry go away
    ctx.thinkers.clear();
    ctx.activeceilings.clear();
    ctx.activeplats.clear();
    store.free_tags(PuTag::Level, PuTag::LevSpec);

    let name = level_lump_name(ctx.gamemode, episode, map);
    let lumpnum = store.get_num_for_name(&name)?;
    com_dprintf(&format!("P_SetupLevel: {} (lump {})\n", name, lumpnum));

    let mut level = Level {
        name,
        ..Level::default()
    };

    // note: most of this ordering is important
    level.blockmap = load_blockmap(store, lumpnum + ML_BLOCKMAP)?;
    level.vertexes = load_vertexes(store, lumpnum + ML_VERTEXES)?;
    level.sectors = load_sectors(store, lumpnum + ML_SECTORS)?;
    level.sides = load_sides(store, lumpnum + ML_SIDEDEFS, level.sectors.len())?;
    level.lines = load_lines(store, lumpnum + ML_LINEDEFS, &level)?;
    level.subsectors = load_subsectors(store, lumpnum + ML_SSECTORS)?;
    level.nodes = load_nodes(store, lumpnum + ML_NODES, level.subsectors.len())?;
    level.segs = load_segs(store, lumpnum + ML_SEGS, &level)?;
    level.rejectmatrix = store.cache_lump_num(lumpnum + ML_REJECT, PuTag::Level)?.to_vec();

    group_lines(&mut level)?;

    ctx.level = level;
    ctx.level.playerstarts = [None; MAXPLAYERS];
    ctx.level.deathmatchstarts.clear();

    load_things(ctx, store, lumpnum + ML_THINGS)?;

    // set up world state
    spawn_specials(ctx);

    log::debug!(
        "{}: {} sectors, {} lines, {} things",
        ctx.level.name,
        ctx.level.sectors.len(),
        ctx.level.lines.len(),
        ctx.thinkers.len()
    );
    Ok(())
}
