// p_mobj.rs — map objects: spawning, movement and damage

use doom_common::common::i_error;
use doom_common::doom_error::DoomResult;
use doom_common::doomdef::{Skill, MAXPLAYERS};
use doom_common::m_fixed::{fixed_mul, Fixed, FRACBITS};
use doom_common::tables::{Angle, ANG45};
use doom_common::wadfiles::{MapThing, MapThingFlags};

use crate::info::{find_doomednum, MobjFlags, MOBJINFO, MT_PLAYER, MT_SKULL};
use crate::p_local::{
    PlayContext, FRICTION, GRAVITY, MAXMOVE, ONCEILINGZ, ONFLOORZ, STOPSPEED, VIEWHEIGHT,
};
use crate::p_map::try_move;
use crate::p_maputl::{set_thing_position, unset_thing_position};
use crate::p_tick::{Thinker, ThinkerId};
use crate::p_user::PlayerState;
use crate::s_sound::{Sfx, SoundSource};

/// Anything that exists in the world: monsters, players, pickups and
/// decorations.
#[derive(Debug, Clone)]
pub struct MapObject {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub angle: Angle,

    pub momx: Fixed,
    pub momy: Fixed,
    pub momz: Fixed,

    pub radius: Fixed,
    pub height: Fixed,

    /// Floor and ceiling at the current position, including the heights
    /// of lines the thing overlaps.
    pub floorz: Fixed,
    pub ceilingz: Fixed,

    pub mobj_type: usize,
    pub flags: MobjFlags,
    pub health: i32,
    /// Countdown of the current state; -1 never changes.
    pub tics: i32,
    pub reactiontime: i32,
    pub lastlook: i32,

    pub subsector: usize,
    pub bnext: Option<ThinkerId>,
    pub bprev: Option<ThinkerId>,

    /// Owning player, for player avatars.
    pub player: Option<usize>,
    /// For nightmare respawn.
    pub spawnpoint: MapThing,
}

impl MapObject {
    pub fn info(&self) -> &'static crate::info::MobjInfo {
        &MOBJINFO[self.mobj_type]
    }
}

/// Creates a thing of `mobj_type`, links it into the world and schedules
/// it. `z` may be `ONFLOORZ` or `ONCEILINGZ`.
pub fn spawn_mobj(ctx: &mut PlayContext, x: Fixed, y: Fixed, z: Fixed, mobj_type: usize) -> ThinkerId {
    let info = &MOBJINFO[mobj_type];
    let reactiontime = if ctx.skill != Skill::Nightmare {
        info.reactiontime
    } else {
        0
    };
    let lastlook = ctx.random.p_random() % MAXPLAYERS as i32;

    let mo = MapObject {
        x,
        y,
        z: Fixed::ZERO,
        angle: Angle(0),
        momx: Fixed::ZERO,
        momy: Fixed::ZERO,
        momz: Fixed::ZERO,
        radius: Fixed::from_int(info.radius),
        height: Fixed::from_int(info.height),
        floorz: Fixed::ZERO,
        ceilingz: Fixed::ZERO,
        mobj_type,
        flags: info.flags,
        health: info.spawnhealth,
        tics: info.spawntics,
        reactiontime,
        lastlook,
        subsector: 0,
        bnext: None,
        bprev: None,
        player: None,
        spawnpoint: MapThing::default(),
    };

    let id = ctx.thinkers.add(Thinker::MapObject(Box::new(mo)));
    set_thing_position(ctx, id);

    let (floor, ceiling) = match ctx.thinkers.mobj(id) {
        Some(mo) => ctx
            .level
            .subsectors
            .get(mo.subsector)
            .and_then(|ss| ctx.level.sectors.get(ss.sector))
            .map(|s| (s.floorheight, s.ceilingheight))
            .unwrap_or((Fixed::ZERO, Fixed::ZERO)),
        None => (Fixed::ZERO, Fixed::ZERO),
    };

    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        mo.floorz = floor;
        mo.ceilingz = ceiling;
        mo.z = if z == ONFLOORZ {
            floor
        } else if z == ONCEILINGZ {
            ceiling - mo.height
        } else {
            z
        };
    }
    id
}

pub fn remove_mobj(ctx: &mut PlayContext, id: ThinkerId) {
    unset_thing_position(ctx, id);
    ctx.thinkers.remove(id);
}

// ============================================================
// Movement
// ============================================================

fn xy_movement(ctx: &mut PlayContext, id: ThinkerId) {
    let (mut xmove, mut ymove, player) = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => {
            mo.momx = mo.momx.clamp(-MAXMOVE, MAXMOVE);
            mo.momy = mo.momy.clamp(-MAXMOVE, MAXMOVE);
            (mo.momx, mo.momy, mo.player)
        }
        None => return,
    };

    loop {
        let (x, y) = match ctx.thinkers.mobj(id) {
            Some(mo) => (mo.x, mo.y),
            None => return,
        };
        let (ptryx, ptryy);
        if xmove > MAXMOVE / 2 || ymove > MAXMOVE / 2 {
            ptryx = x + xmove / 2;
            ptryy = y + ymove / 2;
            xmove = xmove >> 1;
            ymove = ymove >> 1;
        } else {
            ptryx = x + xmove;
            ptryy = y + ymove;
            xmove = Fixed::ZERO;
            ymove = Fixed::ZERO;
        }

        if !try_move(ctx, id, ptryx, ptryy) {
            // blocked; walls stop everything
            if let Some(mo) = ctx.thinkers.mobj_mut(id) {
                mo.momx = Fixed::ZERO;
                mo.momy = Fixed::ZERO;
            }
            break;
        }
        if xmove.0 == 0 && ymove.0 == 0 {
            break;
        }
    }

    let cmd_moving = player
        .map(|p| {
            let cmd = &ctx.players[p].cmd;
            cmd.forwardmove != 0 || cmd.sidemove != 0
        })
        .unwrap_or(false);

    let mo = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => mo,
        None => return,
    };
    if mo.z > mo.floorz {
        // no friction when airborne
        return;
    }
    if mo.flags.contains(MobjFlags::CORPSE) && mo.floorz != mo.z {
        return;
    }

    if mo.momx > -STOPSPEED
        && mo.momx < STOPSPEED
        && mo.momy > -STOPSPEED
        && mo.momy < STOPSPEED
        && !cmd_moving
    {
        mo.momx = Fixed::ZERO;
        mo.momy = Fixed::ZERO;
    } else {
        mo.momx = fixed_mul(mo.momx, FRICTION);
        mo.momy = fixed_mul(mo.momy, FRICTION);
    }
}

fn z_movement(ctx: &mut PlayContext, id: ThinkerId) {
    let mut landed_hard = None;
    {
        let mo = match ctx.thinkers.mobj_mut(id) {
            Some(mo) => mo,
            None => return,
        };

        if let Some(p) = mo.player {
            if mo.z < mo.floorz {
                // smooth step up
                let player = &mut ctx.players[p];
                player.viewheight -= mo.floorz - mo.z;
                player.deltaviewheight = (VIEWHEIGHT - player.viewheight) >> 3;
            }
        }

        mo.z += mo.momz;

        if mo.z <= mo.floorz {
            // hit the floor
            if mo.momz.0 < 0 {
                if let Some(p) = mo.player {
                    if mo.momz < GRAVITY * -8 {
                        // squat down
                        ctx.players[p].deltaviewheight = mo.momz >> 3;
                        landed_hard = Some(p);
                    }
                }
                mo.momz = Fixed::ZERO;
            }
            mo.z = mo.floorz;
        } else if !mo.flags.contains(MobjFlags::NOGRAVITY) {
            if mo.momz.0 == 0 {
                mo.momz = GRAVITY * -2;
            } else {
                mo.momz -= GRAVITY;
            }
        }

        if mo.z + mo.height > mo.ceilingz {
            // hit the ceiling
            if mo.momz.0 > 0 {
                mo.momz = Fixed::ZERO;
            }
            mo.z = mo.ceilingz - mo.height;
        }
    }

    if landed_hard.is_some() {
        ctx.sounds.start(Some(SoundSource::Mobj(id)), Sfx::Oof);
    }
}

/// Per-tic update of a map object.
pub fn mobj_thinker(ctx: &mut PlayContext, id: ThinkerId) {
    let (moving, needs_z) = match ctx.thinkers.mobj(id) {
        Some(mo) => (
            mo.momx.0 != 0 || mo.momy.0 != 0,
            mo.z != mo.floorz || mo.momz.0 != 0,
        ),
        None => return,
    };

    if moving {
        xy_movement(ctx, id);
        if !ctx.thinkers.is_live(id) {
            // mobj was removed
            return;
        }
    }
    if needs_z {
        z_movement(ctx, id);
        if !ctx.thinkers.is_live(id) {
            return;
        }
    }

    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        if mo.tics != -1 {
            mo.tics -= 1;
            if mo.tics <= 0 {
                // idle states loop
                mo.tics = mo.info().spawntics;
            }
        }
    }
}

// ============================================================
// Damage
// ============================================================

pub fn kill_mobj(ctx: &mut PlayContext, id: ThinkerId) {
    let player = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => {
            mo.flags
                .remove(MobjFlags::SHOOTABLE | MobjFlags::FLOAT | MobjFlags::SKULLFLY);
            if mo.mobj_type != MT_SKULL {
                mo.flags.remove(MobjFlags::NOGRAVITY);
            }
            mo.flags.insert(MobjFlags::CORPSE | MobjFlags::DROPOFF);
            mo.height = mo.height >> 2;
            mo.tics = -1;
            mo.player
        }
        None => return,
    };

    if let Some(p) = player {
        ctx.players[p].playerstate = PlayerState::Dead;
        if let Some(mo) = ctx.thinkers.mobj_mut(id) {
            mo.flags.remove(MobjFlags::SOLID);
        }
        ctx.sounds.start(Some(SoundSource::Mobj(id)), Sfx::Pldeth);
    }
}

/// Applies damage without a source. Players on the easiest skill take half.
pub fn damage_mobj(ctx: &mut PlayContext, id: ThinkerId, mut damage: i32) {
    let (flags, health, player) = match ctx.thinkers.mobj(id) {
        Some(mo) => (mo.flags, mo.health, mo.player),
        None => return,
    };
    if !flags.contains(MobjFlags::SHOOTABLE) || health <= 0 {
        return;
    }

    if let Some(p) = player {
        if ctx.skill == Skill::Baby {
            damage >>= 1;
        }
        let pl = &mut ctx.players[p];
        pl.health = (pl.health - damage).max(0);
        pl.damagecount = (pl.damagecount + damage).min(100);
    }

    let dead = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => {
            mo.health -= damage;
            mo.health <= 0
        }
        None => false,
    };
    if dead {
        kill_mobj(ctx, id);
    } else if player.is_some() {
        ctx.sounds.start(Some(SoundSource::Mobj(id)), Sfx::Plpain);
    }
}

// ============================================================
// Spawning from map things
// ============================================================

/// Spawns a player's avatar at a start spot. Does nothing for players not
/// in the game.
pub fn spawn_player(ctx: &mut PlayContext, mthing: &MapThing) -> Option<ThinkerId> {
    let playernum = (mthing.thing_type as i32 - 1).clamp(0, MAXPLAYERS as i32 - 1) as usize;
    if !ctx.playeringame[playernum] {
        return None;
    }

    if ctx.players[playernum].playerstate == PlayerState::Reborn {
        ctx.players[playernum].reborn();
    }

    let x = Fixed((mthing.x as i32) << FRACBITS);
    let y = Fixed((mthing.y as i32) << FRACBITS);
    let id = spawn_mobj(ctx, x, y, ONFLOORZ, MT_PLAYER);

    let health = ctx.players[playernum].health;
    let z = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => {
            mo.angle = Angle(ANG45.0.wrapping_mul((mthing.angle as i32 / 45) as u32));
            mo.player = Some(playernum);
            mo.health = health;
            mo.spawnpoint = *mthing;
            mo.z
        }
        None => Fixed::ZERO,
    };

    let player = &mut ctx.players[playernum];
    player.mo = Some(id);
    player.playerstate = PlayerState::Live;
    player.viewheight = VIEWHEIGHT;
    player.deltaviewheight = Fixed::ZERO;
    player.viewz = z + VIEWHEIGHT;
    player.damagecount = 0;
    Some(id)
}

/// Skill bit checked against a map thing's options.
fn skill_bit(skill: Skill) -> MapThingFlags {
    match skill {
        Skill::Baby | Skill::Easy => MapThingFlags::EASY,
        Skill::Medium => MapThingFlags::NORMAL,
        Skill::Hard | Skill::Nightmare => MapThingFlags::HARD,
    }
}

/// Spawns whatever a things-lump record describes.
pub fn spawn_map_thing(ctx: &mut PlayContext, mthing: &MapThing) -> DoomResult<Option<ThinkerId>> {
    // deathmatch start positions
    if mthing.thing_type == 11 {
        if ctx.level.can_add_deathmatch_start() {
            ctx.level.deathmatchstarts.push(*mthing);
        }
        return Ok(None);
    }

    // player starts
    if (1..=MAXPLAYERS as i16).contains(&mthing.thing_type) {
        ctx.level.playerstarts[mthing.thing_type as usize - 1] = Some(*mthing);
        if ctx.deathmatch == 0 {
            return Ok(spawn_player(ctx, mthing));
        }
        return Ok(None);
    }

    let flags = mthing.flags();
    if !ctx.netgame && flags.contains(MapThingFlags::NOT_SINGLE) {
        return Ok(None);
    }
    if !flags.intersects(skill_bit(ctx.skill)) {
        return Ok(None);
    }

    let mobj_type = find_doomednum(mthing.thing_type as i32).ok_or_else(|| {
        i_error(format!(
            "P_SpawnMapThing: Unknown type {} at ({}, {})",
            mthing.thing_type, mthing.x, mthing.y
        ))
    })?;
    let info = &MOBJINFO[mobj_type];

    if ctx.deathmatch != 0 && info.flags.contains(MobjFlags::NOTDMATCH) {
        return Ok(None);
    }
    if ctx.nomonsters && (mobj_type == MT_SKULL || info.flags.contains(MobjFlags::COUNTKILL)) {
        return Ok(None);
    }

    let x = Fixed((mthing.x as i32) << FRACBITS);
    let y = Fixed((mthing.y as i32) << FRACBITS);
    let z = if info.flags.contains(MobjFlags::SPAWNCEILING) {
        ONCEILINGZ
    } else {
        ONFLOORZ
    };

    let id = spawn_mobj(ctx, x, y, z, mobj_type);
    let tics_roll = ctx.random.p_random();

    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        mo.spawnpoint = *mthing;
        if mo.tics > 0 {
            mo.tics = 1 + (tics_roll % mo.tics);
        }
        mo.angle = Angle(ANG45.0.wrapping_mul((mthing.angle as i32 / 45) as u32));
        if flags.contains(MapThingFlags::AMBUSH) {
            mo.flags.insert(MobjFlags::AMBUSH);
        }
    }

    if info.flags.contains(MobjFlags::COUNTKILL) {
        ctx.level.totalkills += 1;
    }
    if info.flags.contains(MobjFlags::COUNTITEM) {
        ctx.level.totalitems += 1;
    }
    Ok(Some(id))
}

/// Thrust along `angle`, as players and pushed things use.
pub fn thrust(ctx: &mut PlayContext, id: ThinkerId, angle: Angle, movement: Fixed) {
    if let Some(mo) = ctx.thinkers.mobj_mut(id) {
        mo.momx += fixed_mul(movement, angle.cos());
        mo.momy += fixed_mul(movement, angle.sin());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r_defs::{Blockmap, Sector, SubSector};

    fn units(n: i32) -> Fixed {
        Fixed::from_int(n)
    }

    /// One sector, one subsector, a 4x4 block grid at the origin.
    fn open_room() -> PlayContext {
        let mut ctx = PlayContext::default();
        ctx.level.sectors = vec![Sector {
            floorheight: Fixed::ZERO,
            ceilingheight: units(128),
            ..Sector::default()
        }];
        ctx.level.subsectors = vec![SubSector::default()];
        ctx.level.blockmap = Blockmap {
            orgx: Fixed::ZERO,
            orgy: Fixed::ZERO,
            width: 4,
            height: 4,
            lump: {
                let mut l = vec![0i16, 0, 4, 4];
                l.extend(std::iter::repeat(20).take(16));
                l.extend([0, -1]);
                l
            },
            links: vec![None; 16],
        };
        ctx
    }

    fn chain(ctx: &PlayContext, cell: usize) -> Vec<ThinkerId> {
        let mut out = Vec::new();
        let mut cur = ctx.level.blockmap.links[cell];
        while let Some(id) = cur {
            out.push(id);
            cur = ctx.thinkers.mobj(id).and_then(|m| m.bnext);
        }
        out
    }

    #[test]
    fn test_spawn_links_into_block_chain() {
        let mut ctx = open_room();
        let troop = find_doomednum(3001).unwrap();
        let a = spawn_mobj(&mut ctx, units(10), units(10), ONFLOORZ, troop);
        let b = spawn_mobj(&mut ctx, units(20), units(20), ONFLOORZ, troop);
        let c = spawn_mobj(&mut ctx, units(200), units(10), ONFLOORZ, troop);

        // newest at the head
        assert_eq!(chain(&ctx, 0), vec![b, a]);
        assert_eq!(chain(&ctx, 1), vec![c]);

        remove_mobj(&mut ctx, b);
        assert_eq!(chain(&ctx, 0), vec![a]);
        assert!(!ctx.thinkers.is_live(b));
    }

    #[test]
    fn test_spawn_z_resolves_floor_and_ceiling() {
        let mut ctx = open_room();
        let keen = find_doomednum(72).unwrap();
        let id = spawn_mobj(&mut ctx, units(10), units(10), ONCEILINGZ, keen);
        let mo = ctx.thinkers.mobj(id).unwrap();
        assert_eq!(mo.z, units(128 - 72));
        assert_eq!(mo.ceilingz, units(128));
    }

    #[test]
    fn test_momentum_and_friction() {
        let mut ctx = open_room();
        let barrel = find_doomednum(2035).unwrap();
        let id = spawn_mobj(&mut ctx, units(100), units(100), ONFLOORZ, barrel);
        ctx.thinkers.mobj_mut(id).unwrap().momx = units(8);

        mobj_thinker(&mut ctx, id);
        let mo = ctx.thinkers.mobj(id).unwrap();
        assert_eq!(mo.x, units(108));
        assert_eq!(mo.momx, fixed_mul(units(8), FRICTION));

        // slow movement stops dead
        ctx.thinkers.mobj_mut(id).unwrap().momx = Fixed(STOPSPEED.0 - 1);
        mobj_thinker(&mut ctx, id);
        assert_eq!(ctx.thinkers.mobj(id).unwrap().momx, Fixed::ZERO);
    }

    #[test]
    fn test_gravity_pulls_to_floor() {
        let mut ctx = open_room();
        let barrel = find_doomednum(2035).unwrap();
        let id = spawn_mobj(&mut ctx, units(100), units(100), units(10), barrel);
        mobj_thinker(&mut ctx, id);
        assert_eq!(ctx.thinkers.mobj(id).unwrap().momz, GRAVITY * -2);
        for _ in 0..10 {
            mobj_thinker(&mut ctx, id);
        }
        let mo = ctx.thinkers.mobj(id).unwrap();
        assert_eq!(mo.z, Fixed::ZERO);
        assert_eq!(mo.momz, Fixed::ZERO);
    }

    #[test]
    fn test_solid_thing_blocks_movement() {
        let mut ctx = open_room();
        let barrel = find_doomednum(2035).unwrap();
        let mover = spawn_mobj(&mut ctx, units(100), units(100), ONFLOORZ, barrel);
        spawn_mobj(&mut ctx, units(130), units(100), ONFLOORZ, barrel);

        ctx.thinkers.mobj_mut(mover).unwrap().momx = units(15);
        mobj_thinker(&mut ctx, mover);
        let mo = ctx.thinkers.mobj(mover).unwrap();
        assert_eq!(mo.x, units(100));
        assert_eq!(mo.momx, Fixed::ZERO);
    }

    #[test]
    fn test_damage_kills() {
        let mut ctx = open_room();
        let barrel = find_doomednum(2035).unwrap();
        let id = spawn_mobj(&mut ctx, units(100), units(100), ONFLOORZ, barrel);
        damage_mobj(&mut ctx, id, 5);
        assert_eq!(ctx.thinkers.mobj(id).unwrap().health, 15);
        damage_mobj(&mut ctx, id, 50);
        let mo = ctx.thinkers.mobj(id).unwrap();
        assert!(mo.flags.contains(MobjFlags::CORPSE));
        assert!(!mo.flags.contains(MobjFlags::SHOOTABLE));
    }

    #[test]
    fn test_spawn_map_thing_filters() {
        let mut ctx = open_room();
        ctx.skill = Skill::Medium;
        let imp = MapThing { x: 10, y: 10, angle: 90, thing_type: 3001, options: 2 };
        let id = spawn_map_thing(&mut ctx, &imp).unwrap().unwrap();
        assert_eq!(ctx.level.totalkills, 1);
        assert_eq!(ctx.thinkers.mobj(id).unwrap().angle, Angle(2 * ANG45.0));

        // easy-only thing on medium
        let easy = MapThing { options: 1, ..imp };
        assert!(spawn_map_thing(&mut ctx, &easy).unwrap().is_none());

        // multiplayer-only thing in single player
        let multi = MapThing { options: 2 | 16, ..imp };
        assert!(spawn_map_thing(&mut ctx, &multi).unwrap().is_none());

        ctx.nomonsters = true;
        assert!(spawn_map_thing(&mut ctx, &imp).unwrap().is_none());
        assert_eq!(ctx.level.totalkills, 1);

        let bogus = MapThing { thing_type: 4242, ..imp };
        assert!(spawn_map_thing(&mut ctx, &bogus).unwrap_err().is_fatal());
    }

    #[test]
    fn test_player_and_deathmatch_starts() {
        let mut ctx = open_room();
        let start = MapThing { x: 50, y: 60, angle: 0, thing_type: 1, options: 7 };
        let id = spawn_map_thing(&mut ctx, &start).unwrap().unwrap();
        assert_eq!(ctx.players[0].mo, Some(id));
        assert_eq!(ctx.thinkers.mobj(id).unwrap().player, Some(0));
        assert_eq!(ctx.level.playerstarts[0], Some(start));

        // player 2 is not in the game
        let start2 = MapThing { thing_type: 2, ..start };
        assert!(spawn_map_thing(&mut ctx, &start2).unwrap().is_none());
        assert_eq!(ctx.level.playerstarts[1], Some(start2));

        let dm = MapThing { thing_type: 11, ..start };
        for _ in 0..12 {
            spawn_map_thing(&mut ctx, &dm).unwrap();
        }
        assert_eq!(ctx.level.deathmatchstarts.len(), 10);
    }
}
