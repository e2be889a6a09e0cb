// r_defs.rs — runtime level geometry
//
// Everything here is index-addressed: lines name their vertices and sides by
// position in the level arrays, sectors list their lines by index, and the
// blockmap chains name map objects by thinker handle.

use doom_common::doom_error::DoomResult;
use doom_common::common::i_error;
use doom_common::doomdef::MAXPLAYERS;
use doom_common::m_bbox::BBox;
use doom_common::m_fixed::{Fixed, FRACBITS};
use doom_common::tables::Angle;
use doom_common::wadfiles::{LineFlags, MapThing};

use crate::p_local::{MAPBLOCKSHIFT, MAX_DEATHMATCH_STARTS};
use crate::p_tick::ThinkerId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vertex {
    pub x: Fixed,
    pub y: Fixed,
}

/// Direction class of a line, derived once at load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlopeType {
    #[default]
    Horizontal,
    Vertical,
    Positive,
    Negative,
}

impl SlopeType {
    pub fn classify(dx: Fixed, dy: Fixed) -> Self {
        if dx.0 == 0 {
            SlopeType::Vertical
        } else if dy.0 == 0 {
            SlopeType::Horizontal
        } else if (dy / dx).0 > 0 {
            SlopeType::Positive
        } else {
            SlopeType::Negative
        }
    }
}

/// Origin of sounds made by a sector (doors, lifts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundOrigin {
    pub x: Fixed,
    pub y: Fixed,
}

#[derive(Debug, Clone, Default)]
pub struct Sector {
    pub floorheight: Fixed,
    pub ceilingheight: Fixed,
    pub floorpic: String,
    pub ceilingpic: String,
    pub lightlevel: i16,
    pub special: i16,
    pub tag: i16,

    /// Block coordinates (not map units) touched by any line of the sector,
    /// widened by the largest object radius. Indexed like a `BBox`.
    pub blockbox: [i32; 4],
    pub soundorg: SoundOrigin,

    /// The mover currently driving this sector's floor or ceiling.
    pub special_data: Option<ThinkerId>,

    pub linecount: usize,
    pub lines: Vec<usize>,

    pub validcount: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Side {
    pub textureoffset: Fixed,
    pub rowoffset: Fixed,
    pub toptexture: String,
    pub bottomtexture: String,
    pub midtexture: String,
    pub sector: usize,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub v1: usize,
    pub v2: usize,
    /// Precalculated v2 - v1.
    pub dx: Fixed,
    pub dy: Fixed,
    pub flags: LineFlags,
    pub special: i16,
    pub tag: i16,
    /// Front and back side; a one-sided line has no back.
    pub sidenum: [Option<usize>; 2],
    pub bbox: BBox,
    pub slopetype: SlopeType,
    pub frontsector: Option<usize>,
    pub backsector: Option<usize>,
    pub validcount: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubSector {
    pub sector: usize,
    pub numsegs: usize,
    pub firstseg: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Seg {
    pub v1: usize,
    pub v2: usize,
    pub offset: Fixed,
    pub angle: Angle,
    pub sidedef: usize,
    pub linedef: usize,
    pub frontsector: usize,
    /// Only set for two-sided lines.
    pub backsector: Option<usize>,
}

/// BSP node: a partition line and the bounding boxes of both children.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    /// Right (front) child first.
    pub bbox: [BBox; 2],
    /// `NF_SUBSECTOR` marks a subsector index.
    pub children: [u16; 2],
}

// ============================================================
// Blockmap
// ============================================================

/// Uniform collision grid. `lump` is the raw lump as 16-bit words; its
/// first four words are the header and the next `width * height` are
/// offsets (in words) of each cell's line list.
#[derive(Debug, Clone, Default)]
pub struct Blockmap {
    pub orgx: Fixed,
    pub orgy: Fixed,
    pub width: i32,
    pub height: i32,
    pub lump: Vec<i16>,
    /// Head of each cell's map object chain.
    pub links: Vec<Option<ThinkerId>>,
}

pub const BLOCKMAP_HEADER: usize = 4;

impl Blockmap {
    pub fn from_lump(data: &[u8]) -> DoomResult<Self> {
        if data.len() % 2 != 0 || data.len() < BLOCKMAP_HEADER * 2 {
            return Err(i_error(format!("P_LoadBlockMap: bad lump size {}", data.len())));
        }
        let lump: Vec<i16> = data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();

        let width = lump[2] as i32;
        let height = lump[3] as i32;
        if width < 0 || height < 0 {
            return Err(i_error(format!("P_LoadBlockMap: bad size {}x{}", width, height)));
        }
        let cells = (width * height) as usize;
        if lump.len() < BLOCKMAP_HEADER + cells {
            return Err(i_error(format!(
                "P_LoadBlockMap: {} cells but only {} offsets",
                cells,
                lump.len() - BLOCKMAP_HEADER
            )));
        }

        Ok(Self {
            orgx: Fixed((lump[0] as i32) << FRACBITS),
            orgy: Fixed((lump[1] as i32) << FRACBITS),
            width,
            height,
            lump,
            links: vec![None; cells],
        })
    }

    /// Block column and row containing a map position (may lie outside the grid).
    pub fn block_coords(&self, x: Fixed, y: Fixed) -> (i32, i32) {
        (
            (x - self.orgx).0 >> MAPBLOCKSHIFT,
            (y - self.orgy).0 >> MAPBLOCKSHIFT,
        )
    }

    pub fn cell_index(&self, bx: i32, by: i32) -> Option<usize> {
        if bx < 0 || by < 0 || bx >= self.width || by >= self.height {
            None
        } else {
            Some((by * self.width + bx) as usize)
        }
    }

    /// Cell holding a map position.
    pub fn cell_at(&self, x: Fixed, y: Fixed) -> Option<usize> {
        let (bx, by) = self.block_coords(x, y);
        self.cell_index(bx, by)
    }

    /// Line numbers listed for a cell, including the leading zero entry every
    /// list starts with.
    pub fn cell_lines(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self
            .lump
            .get(BLOCKMAP_HEADER + cell)
            .map(|&o| o as u16 as usize)
            .unwrap_or(self.lump.len());
        self.lump
            .get(start..)
            .unwrap_or(&[])
            .iter()
            .take_while(|&&l| l != -1)
            .map(|&l| l as u16 as usize)
    }
}

// ============================================================
// Level
// ============================================================

/// All geometry of the current level. Rebuilt from scratch on every load.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub name: String,
    pub vertexes: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub sectors: Vec<Sector>,
    pub subsectors: Vec<SubSector>,
    pub nodes: Vec<Node>,
    pub lines: Vec<Line>,
    pub sides: Vec<Side>,
    pub blockmap: Blockmap,
    /// Sector-to-sector visibility bits, kept opaque.
    pub rejectmatrix: Vec<u8>,

    pub playerstarts: [Option<MapThing>; MAXPLAYERS],
    pub deathmatchstarts: Vec<MapThing>,

    pub totalkills: i32,
    pub totalitems: i32,
    pub totalsecret: i32,

    pub leveltime: i32,
}

impl Level {
    /// Sector on the other side of `line` from `sector`, if the line is two-sided.
    pub fn next_sector(&self, line: usize, sector: usize) -> Option<usize> {
        let l = &self.lines[line];
        if !l.flags.contains(LineFlags::TWOSIDED) {
            return None;
        }
        if l.frontsector == Some(sector) {
            l.backsector
        } else {
            l.frontsector
        }
    }

    pub fn can_add_deathmatch_start(&self) -> bool {
        self.deathmatchstarts.len() < MAX_DEATHMATCH_STARTS
    }
}
