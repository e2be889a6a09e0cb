// info.rs — map object type table

use bitflags::bitflags;

bitflags! {
    /// Map object flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MobjFlags: u32 {
        /// Call touch when picked up.
        const SPECIAL      = 0x1;
        /// Blocks.
        const SOLID        = 0x2;
        /// Can be hit.
        const SHOOTABLE    = 0x4;
        /// Don't use the sector links (invisible but touchable).
        const NOSECTOR     = 0x8;
        /// Don't use the blocklinks (inert but displayable).
        const NOBLOCKMAP   = 0x10;
        /// Not to be activated by sound, deaf monster.
        const AMBUSH       = 0x20;
        const JUSTHIT      = 0x40;
        const JUSTATTACKED = 0x80;
        /// Hang from the ceiling instead of standing on the floor.
        const SPAWNCEILING = 0x100;
        const NOGRAVITY    = 0x200;
        /// Allow jumps from high places.
        const DROPOFF      = 0x400;
        /// For players, will pick up items.
        const PICKUP       = 0x800;
        const NOCLIP       = 0x1000;
        const SLIDE        = 0x2000;
        const FLOAT        = 0x4000;
        const TELEPORT     = 0x8000;
        const MISSILE      = 0x10000;
        const DROPPED      = 0x20000;
        const SHADOW       = 0x40000;
        const NOBLOOD      = 0x80000;
        const CORPSE       = 0x100000;
        const INFLOAT      = 0x200000;
        /// Counts towards the kill total.
        const COUNTKILL    = 0x400000;
        /// Counts towards the item total.
        const COUNTITEM    = 0x800000;
        const SKULLFLY     = 0x1000000;
        /// Don't spawn in deathmatch (keys).
        const NOTDMATCH    = 0x2000000;
    }
}

const NONE: MobjFlags = MobjFlags::empty();
const OBSTACLE: MobjFlags = MobjFlags::SOLID;
const MONSTER: MobjFlags = MobjFlags::SOLID
    .union(MobjFlags::SHOOTABLE)
    .union(MobjFlags::COUNTKILL);
const FLYER: MobjFlags = MONSTER.union(MobjFlags::FLOAT).union(MobjFlags::NOGRAVITY);
const PICKUP: MobjFlags = MobjFlags::SPECIAL;
const COUNTED: MobjFlags = MobjFlags::SPECIAL.union(MobjFlags::COUNTITEM);
const KEY: MobjFlags = MobjFlags::SPECIAL.union(MobjFlags::NOTDMATCH);
const HANGING: MobjFlags = MobjFlags::SPAWNCEILING.union(MobjFlags::NOGRAVITY);
const HANGING_SOLID: MobjFlags = HANGING.union(MobjFlags::SOLID);
const MARKER: MobjFlags = MobjFlags::NOBLOCKMAP.union(MobjFlags::NOSECTOR);

/// Static description of a map object type. Sizes are in whole map units.
#[derive(Debug, Clone, Copy)]
pub struct MobjInfo {
    pub name: &'static str,
    /// Editor number in the things lump, -1 for types never placed by maps.
    pub doomednum: i32,
    pub spawnhealth: i32,
    /// Tics of the idle state; -1 stays forever.
    pub spawntics: i32,
    pub reactiontime: i32,
    pub speed: i32,
    pub radius: i32,
    pub height: i32,
    pub mass: i32,
    pub flags: MobjFlags,
}

const fn m(
    name: &'static str,
    doomednum: i32,
    spawnhealth: i32,
    speed: i32,
    radius: i32,
    height: i32,
    mass: i32,
    flags: MobjFlags,
) -> MobjInfo {
    MobjInfo {
        name,
        doomednum,
        spawnhealth,
        spawntics: 10,
        reactiontime: 8,
        speed,
        radius,
        height,
        mass,
        flags,
    }
}

const fn thing(name: &'static str, doomednum: i32, radius: i32, height: i32, flags: MobjFlags) -> MobjInfo {
    MobjInfo {
        name,
        doomednum,
        spawnhealth: 1000,
        spawntics: -1,
        reactiontime: 8,
        speed: 0,
        radius,
        height,
        mass: 100,
        flags,
    }
}

pub const MT_PLAYER: usize = 0;
pub const MT_TELEPORTMAN: usize = 1;
pub const MT_SKULL: usize = 14;

pub static MOBJINFO: &[MobjInfo] = &[
    MobjInfo {
        name: "MT_PLAYER",
        doomednum: -1,
        spawnhealth: 100,
        spawntics: -1,
        reactiontime: 0,
        speed: 0,
        radius: 16,
        height: 56,
        mass: 100,
        flags: MobjFlags::SOLID
            .union(MobjFlags::SHOOTABLE)
            .union(MobjFlags::DROPOFF)
            .union(MobjFlags::PICKUP)
            .union(MobjFlags::NOTDMATCH),
    },
    thing("MT_TELEPORTMAN", 14, 20, 16, MARKER),
    // monsters
    m("MT_POSSESSED", 3004, 20, 8, 20, 56, 100, MONSTER),
    m("MT_SHOTGUY", 9, 30, 8, 20, 56, 100, MONSTER),
    m("MT_VILE", 64, 700, 15, 20, 56, 500, MONSTER),
    m("MT_UNDEAD", 66, 300, 10, 20, 56, 500, MONSTER),
    m("MT_FATSO", 67, 600, 8, 48, 64, 1000, MONSTER),
    m("MT_CHAINGUY", 65, 70, 8, 20, 56, 100, MONSTER),
    m("MT_TROOP", 3001, 60, 8, 20, 56, 100, MONSTER),
    m("MT_SERGEANT", 3002, 150, 10, 30, 56, 400, MONSTER),
    m("MT_SHADOWS", 58, 150, 10, 30, 56, 400, MONSTER.union(MobjFlags::SHADOW)),
    m("MT_HEAD", 3005, 400, 8, 31, 56, 400, FLYER),
    m("MT_BRUISER", 3003, 1000, 8, 24, 64, 1000, MONSTER),
    m("MT_KNIGHT", 69, 500, 8, 24, 64, 1000, MONSTER),
    m(
        "MT_SKULL",
        3006,
        100,
        8,
        16,
        56,
        50,
        MobjFlags::SOLID
            .union(MobjFlags::SHOOTABLE)
            .union(MobjFlags::FLOAT)
            .union(MobjFlags::NOGRAVITY),
    ),
    m("MT_SPIDER", 7, 3000, 12, 128, 100, 1000, MONSTER),
    m("MT_BABY", 68, 500, 12, 64, 64, 600, MONSTER),
    m("MT_CYBORG", 16, 4000, 16, 40, 110, 1000, MONSTER),
    m("MT_PAIN", 71, 400, 8, 31, 56, 400, FLYER),
    m("MT_WOLFSS", 84, 50, 8, 20, 56, 100, MONSTER),
    m("MT_KEEN", 72, 100, 0, 16, 72, 10_000_000, MONSTER.union(HANGING)),
    m(
        "MT_BOSSBRAIN",
        88,
        250,
        0,
        16,
        16,
        10_000_000,
        MobjFlags::SOLID.union(MobjFlags::SHOOTABLE),
    ),
    thing("MT_BOSSSPIT", 89, 20, 32, MARKER),
    thing("MT_BOSSTARGET", 87, 20, 32, MARKER),
    MobjInfo {
        spawnhealth: 20,
        ..thing(
            "MT_BARREL",
            2035,
            10,
            42,
            MobjFlags::SOLID.union(MobjFlags::SHOOTABLE).union(MobjFlags::NOBLOOD),
        )
    },
    // items
    thing("MT_MISC0", 2018, 20, 16, PICKUP),
    thing("MT_MISC1", 2019, 20, 16, PICKUP),
    thing("MT_MISC2", 2014, 20, 16, COUNTED),
    thing("MT_MISC3", 2015, 20, 16, COUNTED),
    thing("MT_MISC4", 5, 20, 16, KEY),
    thing("MT_MISC5", 13, 20, 16, KEY),
    thing("MT_MISC6", 6, 20, 16, KEY),
    thing("MT_MISC7", 39, 20, 16, KEY),
    thing("MT_MISC8", 38, 20, 16, KEY),
    thing("MT_MISC9", 40, 20, 16, KEY),
    thing("MT_MISC10", 2011, 20, 16, PICKUP),
    thing("MT_MISC11", 2012, 20, 16, PICKUP),
    thing("MT_MISC12", 2013, 20, 16, COUNTED),
    thing("MT_INV", 2022, 20, 16, COUNTED),
    thing("MT_MISC13", 2023, 20, 16, COUNTED),
    thing("MT_INS", 2024, 20, 16, COUNTED),
    thing("MT_MISC14", 2025, 20, 16, PICKUP),
    thing("MT_MISC15", 2026, 20, 16, COUNTED),
    thing("MT_MISC16", 2045, 20, 16, COUNTED),
    thing("MT_MEGA", 83, 20, 16, COUNTED),
    thing("MT_CLIP", 2007, 20, 16, PICKUP),
    thing("MT_MISC17", 2048, 20, 16, PICKUP),
    thing("MT_MISC18", 2010, 20, 16, PICKUP),
    thing("MT_MISC19", 2046, 20, 16, PICKUP),
    thing("MT_MISC20", 2047, 20, 16, PICKUP),
    thing("MT_MISC21", 17, 20, 16, PICKUP),
    thing("MT_MISC22", 2008, 20, 16, PICKUP),
    thing("MT_MISC23", 2049, 20, 16, PICKUP),
    thing("MT_MISC24", 8, 20, 16, PICKUP),
    thing("MT_MISC25", 2006, 20, 16, PICKUP),
    thing("MT_CHAINGUN", 2002, 20, 16, PICKUP),
    thing("MT_MISC26", 2005, 20, 16, PICKUP),
    thing("MT_MISC27", 2003, 20, 16, PICKUP),
    thing("MT_MISC28", 2004, 20, 16, PICKUP),
    thing("MT_SHOTGUN", 2001, 20, 16, PICKUP),
    thing("MT_SUPERSHOTGUN", 82, 20, 16, PICKUP),
    // decorations
    thing("MT_MISC29", 85, 16, 16, OBSTACLE),
    thing("MT_MISC30", 86, 16, 16, OBSTACLE),
    thing("MT_MISC31", 2028, 16, 16, OBSTACLE),
    thing("MT_MISC32", 30, 16, 16, OBSTACLE),
    thing("MT_MISC33", 31, 16, 16, OBSTACLE),
    thing("MT_MISC34", 32, 16, 16, OBSTACLE),
    thing("MT_MISC35", 33, 16, 16, OBSTACLE),
    thing("MT_MISC36", 37, 16, 16, OBSTACLE),
    thing("MT_MISC37", 36, 16, 16, OBSTACLE),
    thing("MT_MISC38", 41, 16, 16, OBSTACLE),
    thing("MT_MISC39", 42, 16, 16, OBSTACLE),
    thing("MT_MISC40", 43, 16, 16, OBSTACLE),
    thing("MT_MISC41", 44, 16, 16, OBSTACLE),
    thing("MT_MISC42", 45, 16, 16, OBSTACLE),
    thing("MT_MISC43", 46, 16, 16, OBSTACLE),
    thing("MT_MISC44", 55, 16, 16, OBSTACLE),
    thing("MT_MISC45", 56, 16, 16, OBSTACLE),
    thing("MT_MISC46", 57, 16, 16, OBSTACLE),
    thing("MT_MISC47", 47, 16, 16, OBSTACLE),
    thing("MT_MISC48", 48, 16, 16, OBSTACLE),
    thing("MT_MISC49", 34, 20, 16, NONE),
    thing("MT_MISC50", 35, 16, 16, OBSTACLE),
    thing("MT_MISC51", 49, 16, 68, HANGING_SOLID),
    thing("MT_MISC52", 50, 16, 84, HANGING_SOLID),
    thing("MT_MISC53", 51, 16, 84, HANGING_SOLID),
    thing("MT_MISC54", 52, 16, 68, HANGING_SOLID),
    thing("MT_MISC55", 53, 16, 52, HANGING_SOLID),
    thing("MT_MISC56", 59, 20, 84, HANGING),
    thing("MT_MISC57", 60, 20, 68, HANGING),
    thing("MT_MISC58", 61, 20, 52, HANGING),
    thing("MT_MISC59", 62, 20, 52, HANGING),
    thing("MT_MISC60", 63, 20, 68, HANGING),
    thing("MT_MISC61", 22, 20, 16, NONE),
    thing("MT_MISC62", 15, 20, 16, NONE),
    thing("MT_MISC63", 18, 20, 16, NONE),
    thing("MT_MISC64", 21, 20, 16, NONE),
    thing("MT_MISC65", 23, 20, 16, NONE),
    thing("MT_MISC66", 20, 20, 16, NONE),
    thing("MT_MISC67", 19, 20, 16, NONE),
    thing("MT_MISC68", 10, 20, 16, NONE),
    thing("MT_MISC69", 12, 20, 16, NONE),
    thing("MT_MISC70", 28, 16, 16, OBSTACLE),
    thing("MT_MISC71", 24, 20, 16, NONE),
    thing("MT_MISC72", 27, 16, 16, OBSTACLE),
    thing("MT_MISC73", 29, 16, 16, OBSTACLE),
    thing("MT_MISC74", 25, 16, 16, OBSTACLE),
    thing("MT_MISC75", 26, 16, 16, OBSTACLE),
    thing("MT_MISC76", 54, 32, 16, OBSTACLE),
    thing("MT_MISC77", 70, 16, 16, OBSTACLE),
    thing("MT_MISC78", 73, 16, 88, HANGING_SOLID),
    thing("MT_MISC79", 74, 16, 88, HANGING_SOLID),
    thing("MT_MISC80", 75, 16, 64, HANGING_SOLID),
    thing("MT_MISC81", 76, 16, 64, HANGING_SOLID),
    thing("MT_MISC82", 77, 16, 64, HANGING_SOLID),
    thing("MT_MISC83", 78, 16, 64, HANGING_SOLID),
    thing("MT_MISC84", 79, 20, 16, MobjFlags::NOBLOCKMAP),
    thing("MT_MISC85", 80, 20, 16, MobjFlags::NOBLOCKMAP),
    thing("MT_MISC86", 81, 20, 16, MobjFlags::NOBLOCKMAP),
];

/// Type index for a things-lump editor number.
pub fn find_doomednum(doomednum: i32) -> Option<usize> {
    if doomednum < 0 {
        return None;
    }
    MOBJINFO.iter().position(|info| info.doomednum == doomednum)
}

/// Editor numbers of monsters that only exist in the commercial game.
pub const COMMERCIAL_ONLY_DOOMEDNUMS: [i32; 10] = [68, 64, 88, 89, 69, 67, 71, 65, 66, 84];
