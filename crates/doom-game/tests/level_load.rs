mod common;

use common::*;
use doom_common::doom_error::DoomResult;
use doom_common::doomdef::GameMode;
use doom_common::m_bbox::{BOXBOTTOM, BOXLEFT, BOXRIGHT, BOXTOP};
use doom_common::m_fixed::Fixed;
use doom_game::p_local::PlayContext;
use doom_game::p_maputl::point_in_subsector;
use doom_game::p_setup::setup_level;

fn load(gamemode: GameMode, marker: &str, level: &TestLevel) -> PlayContext {
    let mut store = store_from(level_lumps(marker, level)).unwrap();
    let mut ctx = PlayContext::new(gamemode);
    setup_level(&mut ctx, &mut store, 1, 1).unwrap();
    ctx
}

#[test]
fn test_two_room_geometry() {
    let ctx = load(GameMode::Registered, "E1M1", &TestLevel::default());
    let level = &ctx.level;

    assert_eq!(level.name, "E1M1");
    assert_eq!(level.vertexes.len(), 6);
    assert_eq!(level.lines.len(), 7);
    assert_eq!(level.sides.len(), 8);
    assert_eq!(level.sectors.len(), 2);
    assert_eq!(level.subsectors.len(), 2);
    assert_eq!(level.segs.len(), 8);
    assert_eq!(level.nodes.len(), 1);
    assert_eq!(level.rejectmatrix, vec![0]);

    // every reference resolves
    for line in &level.lines {
        assert!(line.frontsector.is_some_and(|s| s < level.sectors.len()));
        assert!(line.backsector.map_or(true, |s| s < level.sectors.len()));
    }
    assert_eq!(level.lines[3].frontsector, Some(0));
    assert_eq!(level.lines[3].backsector, Some(1));
    assert_eq!(level.lines.iter().filter(|l| l.backsector.is_some()).count(), 1);

    assert_eq!(level.subsectors[0].sector, 0);
    assert_eq!(level.subsectors[1].sector, 1);
    assert_eq!(level.segs[4].frontsector, 1);
    assert_eq!(level.segs[4].backsector, Some(0));
}

#[test]
fn test_sector_line_groups() {
    let ctx = load(GameMode::Registered, "E1M1", &TestLevel::default());
    let level = &ctx.level;

    assert_eq!(level.sectors[0].lines, vec![0, 1, 2, 3]);
    assert_eq!(level.sectors[1].lines, vec![3, 4, 5, 6]);
    assert!(level.sectors.iter().all(|s| s.linecount == s.lines.len()));

    assert_eq!(level.sectors[0].soundorg.x, Fixed::from_int(128));
    assert_eq!(level.sectors[1].soundorg.x, Fixed::from_int(384));
    assert_eq!(level.sectors[1].soundorg.y, Fixed::from_int(128));

    let bb = level.sectors[1].blockbox;
    assert_eq!((bb[BOXTOP], bb[BOXBOTTOM], bb[BOXLEFT], bb[BOXRIGHT]), (2, 0, 1, 4));
    let bb = level.sectors[0].blockbox;
    assert_eq!((bb[BOXTOP], bb[BOXBOTTOM], bb[BOXLEFT], bb[BOXRIGHT]), (2, 0, 0, 2));
}

#[test]
fn test_bsp_and_blockmap() {
    let ctx = load(GameMode::Registered, "E1M1", &TestLevel::default());
    let level = &ctx.level;

    assert_eq!(point_in_subsector(level, Fixed::from_int(100), Fixed::from_int(100)), 0);
    assert_eq!(point_in_subsector(level, Fixed::from_int(300), Fixed::from_int(10)), 1);

    assert_eq!((level.blockmap.width, level.blockmap.height), (5, 3));
    assert_eq!(level.blockmap.orgx, Fixed::from_int(-8));
    let cell = level.blockmap.cell_at(Fixed::from_int(300), Fixed::from_int(200)).unwrap();
    let lines: Vec<usize> = level.blockmap.cell_lines(cell).collect();
    assert!(lines.contains(&3));
    assert!(level.blockmap.cell_at(Fixed::from_int(-100), Fixed::ZERO).is_none());
}

#[test]
fn test_player_spawns_at_start() {
    let ctx = load(GameMode::Registered, "E1M1", &TestLevel::default());

    let id = ctx.players[0].mo.expect("player 1 spawned");
    let mo = ctx.thinkers.mobj(id).unwrap();
    assert_eq!((mo.x, mo.y), (Fixed::from_int(64), Fixed::from_int(64)));
    assert_eq!(mo.subsector, 0);
    assert_eq!(mo.z, Fixed::ZERO);
    assert_eq!(mo.player, Some(0));
    assert!(ctx.level.playerstarts[0].is_some());
    assert!(ctx.players[1].mo.is_none());
}

#[test]
fn test_commercial_thing_ends_things_lump() {
    let things = vec![player_start(1, 64, 64), thing(3004, 100, 100), thing(68, 300, 100), thing(3001, 400, 100)];
    let level = TestLevel { things, ..TestLevel::default() };

    let ctx = load(GameMode::Registered, "E1M1", &level);
    assert_eq!(ctx.thinkers.mobjs().count(), 2);
    assert_eq!(ctx.level.totalkills, 1);

    let ctx = load(GameMode::Commercial, "MAP01", &level);
    assert_eq!(ctx.thinkers.mobjs().count(), 4);
    assert_eq!(ctx.level.totalkills, 3);
}

#[test]
fn test_deathmatch_starts_are_collected() {
    let mut things = vec![player_start(1, 64, 64)];
    things.extend((0..12).map(|i| thing(11, 32 + i * 16, 200)));
    let level = TestLevel { things, ..TestLevel::default() };

    let ctx = load(GameMode::Registered, "E1M1", &level);
    // the list is capped
    assert_eq!(ctx.level.deathmatchstarts.len(), 10);
}

#[test]
fn test_reload_replaces_previous_level() {
    let mut store = store_with_levels(&["E1M1", "E1M2"]);
    let mut ctx = PlayContext::new(GameMode::Registered);

    setup_level(&mut ctx, &mut store, 1, 1).unwrap();
    let first = ctx.thinkers.len();
    ctx.level.leveltime = 500;

    setup_level(&mut ctx, &mut store, 1, 2).unwrap();
    assert_eq!(ctx.level.name, "E1M2");
    assert_eq!(ctx.thinkers.len(), first);
    assert_eq!(ctx.level.leveltime, 0);
}

#[test]
fn test_bad_lumps_are_fatal() {
    let mut lumps = level_lumps("E1M1", &TestLevel::default());
    // VERTEXES with half a record left over
    lumps[4].1.extend_from_slice(&[1, 2]);
    let mut store = store_from(lumps).unwrap();
    let mut ctx = PlayContext::new(GameMode::Registered);
    let err = setup_level(&mut ctx, &mut store, 1, 1).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("funny lump size"));

    // a side pointing past the sector array
    let mut lumps = level_lumps("E1M1", &TestLevel::default());
    let bad = lumps[3].1.len() - 2;
    lumps[3].1[bad..].copy_from_slice(&9i16.to_le_bytes());
    let mut store = store_from(lumps).unwrap();
    assert!(setup_level(&mut ctx, &mut store, 1, 1).unwrap_err().is_fatal());

    // no such map
    let mut store = store_with_levels(&["E1M1"]);
    assert!(setup_level(&mut ctx, &mut store, 2, 1).is_err());
}

fn with_lump_patch(index: usize, offset: usize, bytes: &[u8]) -> DoomResult<()> {
    let mut lumps = level_lumps("E1M1", &TestLevel::default());
    lumps[index].1[offset..offset + bytes.len()].copy_from_slice(bytes);
    let mut store = store_from(lumps).unwrap();
    let mut ctx = PlayContext::new(GameMode::Registered);
    setup_level(&mut ctx, &mut store, 1, 1)
}

#[test]
fn test_bad_bsp_references_are_fatal() {
    // NODES is lump 7; children sit at the end of each 28 byte record
    let err = with_lump_patch(7, 24, &[5, 0, 5, 0]).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("node 0"));

    // a node cannot name itself as a child
    assert!(with_lump_patch(7, 24, &[0, 0, 0, 0]).unwrap_err().is_fatal());

    // subsector past the end of SSECTORS
    let child = (2u16 | 0x8000).to_le_bytes();
    assert!(with_lump_patch(7, 26, &child).unwrap_err().is_fatal());

    // second subsector claims nine segs from seg 4, only eight exist
    let err = with_lump_patch(6, 4, &9i16.to_le_bytes()).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("subsector 1"));

    // the untouched fixture still loads
    with_lump_patch(7, 24, &(1u16 | 0x8000).to_le_bytes()).unwrap();
}
