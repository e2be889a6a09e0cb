//! A small two-room level built in memory.
//!
//! ```text
//!   (0,256) +--------+--------+ (512,256)
//!           |        |        |
//!           | sec 0  | sec 1  |
//!           |        |        |
//!     (0,0) +--------+--------+ (512,0)
//!                  (256,0)
//! ```
//!
//! Line 3 at x = 256 is the only two-sided line. One node splits the map
//! there; each room is a single subsector.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use doom_common::doom_error::DoomResult;
use doom_common::w_wad::LumpStore;
use doom_common::wadfiles::{
    records_to_bytes, MapLineDef, MapNode, MapSector, MapSeg, MapSideDef, MapSubSector, MapThing,
    MapVertex, WadBuilder, WadKind, NF_SUBSECTOR,
};
use doom_game::g_demo::DemoSink;

const ML_TWOSIDED: i16 = 4;
const ML_BLOCKING: i16 = 1;

#[derive(Debug, Clone)]
pub struct TestLevel {
    pub things: Vec<MapThing>,
    pub specials: [i16; 2],
    pub tags: [i16; 2],
    pub floors: [i16; 2],
}

impl Default for TestLevel {
    fn default() -> Self {
        Self {
            things: vec![player_start(1, 64, 64)],
            specials: [0; 2],
            tags: [0; 2],
            floors: [0; 2],
        }
    }
}

pub fn player_start(player: i16, x: i16, y: i16) -> MapThing {
    MapThing { x, y, angle: 0, thing_type: player, options: 7 }
}

pub fn thing(thing_type: i16, x: i16, y: i16) -> MapThing {
    MapThing { x, y, angle: 90, thing_type, options: 7 }
}

fn vertexes() -> Vec<MapVertex> {
    [(0, 0), (0, 256), (256, 256), (256, 0), (512, 256), (512, 0)]
        .iter()
        .map(|&(x, y)| MapVertex { x, y })
        .collect()
}

fn lines() -> Vec<MapLineDef> {
    let one = |v1, v2, side| MapLineDef {
        v1,
        v2,
        flags: ML_BLOCKING,
        special: 0,
        tag: 0,
        sidenum: [side, -1],
    };
    vec![
        one(0, 1, 0),
        one(1, 2, 1),
        one(3, 0, 2),
        MapLineDef {
            v1: 2,
            v2: 3,
            flags: ML_TWOSIDED,
            special: 0,
            tag: 0,
            sidenum: [3, 4],
        },
        one(2, 4, 5),
        one(4, 5, 6),
        one(5, 3, 7),
    ]
}

fn sides() -> Vec<MapSideDef> {
    (0..8)
        .map(|i| MapSideDef {
            midtexture: if i == 3 || i == 4 { "-".into() } else { "STARTAN3".into() },
            toptexture: "-".into(),
            bottomtexture: "-".into(),
            sector: if i < 4 { 0 } else { 1 },
            ..MapSideDef::default()
        })
        .collect()
}

fn sectors(level: &TestLevel) -> Vec<MapSector> {
    (0..2)
        .map(|i| MapSector {
            floorheight: level.floors[i],
            ceilingheight: 128,
            floorpic: "FLOOR4_8".into(),
            ceilingpic: "CEIL3_5".into(),
            lightlevel: 160,
            special: level.specials[i],
            tag: level.tags[i],
        })
        .collect()
}

fn segs() -> Vec<MapSeg> {
    let seg = |v1, v2, linedef, side| MapSeg { v1, v2, angle: 0, linedef, side, offset: 0 };
    vec![
        seg(0, 1, 0, 0),
        seg(1, 2, 1, 0),
        seg(3, 0, 2, 0),
        seg(2, 3, 3, 0),
        seg(3, 2, 3, 1),
        seg(2, 4, 4, 0),
        seg(4, 5, 5, 0),
        seg(5, 3, 6, 0),
    ]
}

fn subsectors() -> Vec<MapSubSector> {
    vec![
        MapSubSector { numsegs: 4, firstseg: 0 },
        MapSubSector { numsegs: 4, firstseg: 4 },
    ]
}

fn nodes() -> Vec<MapNode> {
    vec![MapNode {
        x: 256,
        y: 0,
        dx: 0,
        dy: 256,
        bbox: [[256, 0, 256, 512], [256, 0, 0, 256]],
        // right of the partition is the east room
        children: [1 | NF_SUBSECTOR, NF_SUBSECTOR],
    }]
}

/// 5x3 blocks from (-8,-8); every block lists every line.
fn blockmap() -> Vec<u8> {
    let (width, height) = (5i16, 3i16);
    let cells = (width * height) as usize;
    let list_start = 4 + cells as i16;

    let mut words = vec![-8, -8, width, height];
    words.extend(std::iter::repeat(list_start).take(cells));
    words.push(0);
    words.extend(0..7);
    words.push(-1);
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Marker plus the ten map lumps in their fixed order.
pub fn level_lumps(marker: &str, level: &TestLevel) -> Vec<(String, Vec<u8>)> {
    vec![
        (marker.to_string(), Vec::new()),
        ("THINGS".into(), records_to_bytes(&level.things)),
        ("LINEDEFS".into(), records_to_bytes(&lines())),
        ("SIDEDEFS".into(), records_to_bytes(&sides())),
        ("VERTEXES".into(), records_to_bytes(&vertexes())),
        ("SEGS".into(), records_to_bytes(&segs())),
        ("SSECTORS".into(), records_to_bytes(&subsectors())),
        ("NODES".into(), records_to_bytes(&nodes())),
        ("SECTORS".into(), records_to_bytes(&sectors(level))),
        ("REJECT".into(), vec![0]),
        ("BLOCKMAP".into(), blockmap()),
    ]
}

pub fn store_from(lumps: Vec<(String, Vec<u8>)>) -> DoomResult<LumpStore> {
    let mut wad = WadBuilder::new();
    for (name, data) in lumps {
        wad.add_lump(&name, data);
    }
    let data = wad.build(WadKind::Iwad);
    LumpStore::from_bytes("test.wad", data)
}

/// Store with one level per marker, all the default layout.
pub fn store_with_levels(markers: &[&str]) -> LumpStore {
    let mut lumps = Vec::new();
    for m in markers {
        lumps.extend(level_lumps(m, &TestLevel::default()));
    }
    store_from(lumps).unwrap()
}

/// Demo sink whose recordings outlive the session.
#[derive(Clone, Default)]
pub struct SharedDemoSink(pub Arc<Mutex<Vec<(String, Vec<u8>)>>>);

impl SharedDemoSink {
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl DemoSink for SharedDemoSink {
    fn write_demo(&mut self, name: &str, data: &[u8]) -> DoomResult<()> {
        self.0.lock().unwrap().push((name.to_string(), data.to_vec()));
        Ok(())
    }
}
