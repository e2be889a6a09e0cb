// p_user.rs — player movement and view bobbing

use doom_common::d_event::{Buttons, TicCmd};
use doom_common::doomdef::MAXPLAYERS;
use doom_common::m_fixed::{fixed_mul, Fixed, FRACUNIT};
use doom_common::tables::{finesine, Angle, ANG90, FINEANGLES, FINEMASK};

use crate::info::MobjFlags;
use crate::p_local::{PlayContext, MAXHEALTH, VIEWHEIGHT};
use crate::p_mobj::thrust;
use crate::p_spec::player_in_special_sector;
use crate::p_tick::ThinkerId;

/// 16 pixels of bob.
const MAXBOB: Fixed = Fixed(0x100000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerState {
    /// Playing or camping.
    Live,
    /// Dead on the ground, view follows killer.
    Dead,
    /// Ready to restart/respawn.
    #[default]
    Reborn,
}

#[derive(Debug, Clone, Default)]
pub struct Player {
    pub mo: Option<ThinkerId>,
    pub playerstate: PlayerState,
    pub cmd: TicCmd,

    /// Focal origin above the floor.
    pub viewz: Fixed,
    /// Base height above floor for viewz.
    pub viewheight: Fixed,
    /// Bob/squat speed.
    pub deltaviewheight: Fixed,
    /// Bounded/scaled total momentum.
    pub bob: Fixed,

    /// Mirrors the mobj's health between levels.
    pub health: i32,
    pub damagecount: i32,
    pub bonuscount: i32,

    pub killcount: i32,
    pub itemcount: i32,
    pub secretcount: i32,
    pub frags: [i32; MAXPLAYERS],
    pub didsecret: bool,

    /// True if button down last tic.
    pub attackdown: bool,
    pub usedown: bool,
}

impl Player {
    /// Resets everything but the level statistics, as on respawn.
    pub fn reborn(&mut self) {
        let kept = (self.frags, self.killcount, self.itemcount, self.secretcount);
        *self = Player {
            playerstate: PlayerState::Live,
            health: MAXHEALTH,
            usedown: true,
            attackdown: true,
            ..Player::default()
        };
        (self.frags, self.killcount, self.itemcount, self.secretcount) = kept;
    }
}

/// Walking/running bob and view height, from the mobj's position.
fn calc_height(ctx: &mut PlayContext, playernum: usize, onground: bool) {
    let (z, ceilingz, momx, momy) = match ctx.players[playernum].mo.and_then(|id| ctx.thinkers.mobj(id)) {
        Some(mo) => (mo.z, mo.ceilingz, mo.momx, mo.momy),
        None => return,
    };
    let leveltime = ctx.leveltime();
    let player = &mut ctx.players[playernum];

    // Regular movement bobbing (needs to be calculated for gun swing even
    // if not on ground).
    player.bob = (fixed_mul(momx, momx) + fixed_mul(momy, momy)) >> 2;
    if player.bob > MAXBOB {
        player.bob = MAXBOB;
    }

    if !onground {
        player.viewz = z + player.viewheight;
        if player.viewz > ceilingz - Fixed::from_int(4) {
            player.viewz = ceilingz - Fixed::from_int(4);
        }
        return;
    }

    let angle = (FINEANGLES / 20 * leveltime as usize) & FINEMASK;
    let bob = fixed_mul(player.bob / 2, finesine(angle));

    // move viewheight
    if player.playerstate == PlayerState::Live {
        player.viewheight += player.deltaviewheight;

        if player.viewheight > VIEWHEIGHT {
            player.viewheight = VIEWHEIGHT;
            player.deltaviewheight = Fixed::ZERO;
        }
        if player.viewheight < VIEWHEIGHT / 2 {
            player.viewheight = VIEWHEIGHT / 2;
            if player.deltaviewheight.0 <= 0 {
                player.deltaviewheight = Fixed(1);
            }
        }
        if player.deltaviewheight.0 != 0 {
            player.deltaviewheight += Fixed(FRACUNIT / 4);
            if player.deltaviewheight.0 == 0 {
                player.deltaviewheight = Fixed(1);
            }
        }
    }

    player.viewz = z + player.viewheight + bob;
    if player.viewz > ceilingz - Fixed::from_int(4) {
        player.viewz = ceilingz - Fixed::from_int(4);
    }
}

fn move_player(ctx: &mut PlayContext, playernum: usize, id: ThinkerId) -> bool {
    let cmd = ctx.players[playernum].cmd;
    let (angle, onground) = match ctx.thinkers.mobj_mut(id) {
        Some(mo) => {
            mo.angle += Angle(((cmd.angleturn as i32) << 16) as u32);
            (mo.angle, mo.z <= mo.floorz)
        }
        None => return false,
    };

    // Do not let the player control movement if not onground.
    if cmd.forwardmove != 0 && onground {
        thrust(ctx, id, angle, Fixed(cmd.forwardmove as i32 * 2048));
    }
    if cmd.sidemove != 0 && onground {
        thrust(ctx, id, angle - ANG90, Fixed(cmd.sidemove as i32 * 2048));
    }
    onground
}

/// Fall to the ground and wait for USE to respawn.
fn death_think(ctx: &mut PlayContext, playernum: usize, id: ThinkerId) {
    let onground = ctx.thinkers.mobj(id).is_some_and(|mo| mo.z <= mo.floorz);
    {
        let player = &mut ctx.players[playernum];
        // fall to the ground
        if player.viewheight > Fixed::from_int(6) {
            player.viewheight -= Fixed(FRACUNIT);
        }
        if player.viewheight < Fixed::from_int(6) {
            player.viewheight = Fixed::from_int(6);
        }
        player.deltaviewheight = Fixed::ZERO;
    }
    calc_height(ctx, playernum, onground);

    let player = &mut ctx.players[playernum];
    if player.damagecount > 0 {
        player.damagecount -= 1;
    }
    if player.cmd.button_flags().contains(Buttons::USE) {
        player.playerstate = PlayerState::Reborn;
    }
}

pub fn player_think(ctx: &mut PlayContext, playernum: usize) {
    let id = match ctx.players[playernum].mo {
        Some(id) if ctx.thinkers.mobj(id).is_some() => id,
        _ => return,
    };

    // chain saw run forward
    let just_attacked = ctx
        .thinkers
        .mobj(id)
        .is_some_and(|mo| mo.flags.contains(MobjFlags::JUSTATTACKED));
    if just_attacked {
        let cmd = &mut ctx.players[playernum].cmd;
        cmd.angleturn = 0;
        cmd.forwardmove = (0xc800 / 512) as i8;
        cmd.sidemove = 0;
        if let Some(mo) = ctx.thinkers.mobj_mut(id) {
            mo.flags.remove(MobjFlags::JUSTATTACKED);
        }
    }

    if ctx.players[playernum].playerstate == PlayerState::Dead {
        death_think(ctx, playernum, id);
        return;
    }

    // Move around. Reactiontime is used to prevent movement for a bit
    // after a teleport hit.
    let waiting = match ctx.thinkers.mobj_mut(id) {
        Some(mo) if mo.reactiontime > 0 => {
            mo.reactiontime -= 1;
            true
        }
        _ => false,
    };
    let onground = if waiting {
        ctx.thinkers.mobj(id).is_some_and(|mo| mo.z <= mo.floorz)
    } else {
        move_player(ctx, playernum, id)
    };

    calc_height(ctx, playernum, onground);
    player_in_special_sector(ctx, playernum);

    let player = &mut ctx.players[playernum];
    // line activation is not simulated; only the button edges are tracked
    player.usedown = player.cmd.button_flags().contains(Buttons::USE);
    player.attackdown = player.cmd.button_flags().contains(Buttons::ATTACK);

    if player.damagecount > 0 {
        player.damagecount -= 1;
    }
    if player.bonuscount > 0 {
        player.bonuscount -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::MT_PLAYER;
    use crate::p_local::ONFLOORZ;
    use crate::p_mobj::spawn_mobj;
    use crate::r_defs::{Sector, SubSector};

    fn ctx_with_player() -> (PlayContext, ThinkerId) {
        let mut ctx = PlayContext::default();
        ctx.level.sectors = vec![Sector {
            ceilingheight: Fixed::from_int(128),
            ..Sector::default()
        }];
        ctx.level.subsectors = vec![SubSector::default()];
        let id = spawn_mobj(&mut ctx, Fixed::ZERO, Fixed::ZERO, ONFLOORZ, MT_PLAYER);
        ctx.players[0].reborn();
        ctx.players[0].mo = Some(id);
        ctx.players[0].viewheight = VIEWHEIGHT;
        ctx.thinkers.mobj_mut(id).unwrap().player = Some(0);
        (ctx, id)
    }

    #[test]
    fn test_reborn_keeps_statistics() {
        let mut p = Player {
            killcount: 3,
            secretcount: 1,
            health: 5,
            playerstate: PlayerState::Dead,
            ..Player::default()
        };
        p.reborn();
        assert_eq!(p.killcount, 3);
        assert_eq!(p.secretcount, 1);
        assert_eq!(p.health, MAXHEALTH);
        assert_eq!(p.playerstate, PlayerState::Live);
        assert!(p.usedown);
    }

    #[test]
    fn test_forward_thrust_along_facing() {
        let (mut ctx, id) = ctx_with_player();
        ctx.players[0].cmd.forwardmove = 0x19;
        player_think(&mut ctx, 0);
        let mo = ctx.thinkers.mobj(id).unwrap();
        // facing east: momentum almost entirely on x
        assert!(mo.momx.0 > 0);
        assert!(mo.momy.0.abs() < mo.momx.0 / 100);
        assert_eq!(ctx.players[0].viewz, VIEWHEIGHT + fixed_mul(ctx.players[0].bob / 2, finesine(0)));
    }

    #[test]
    fn test_turning() {
        let (mut ctx, id) = ctx_with_player();
        ctx.players[0].cmd.angleturn = 0x4000;
        player_think(&mut ctx, 0);
        assert_eq!(ctx.thinkers.mobj(id).unwrap().angle, ANG90);
    }

    #[test]
    fn test_dead_player_respawns_on_use() {
        let (mut ctx, _) = ctx_with_player();
        ctx.players[0].playerstate = PlayerState::Dead;
        player_think(&mut ctx, 0);
        assert_eq!(ctx.players[0].viewheight, VIEWHEIGHT - Fixed(FRACUNIT));
        assert_eq!(ctx.players[0].playerstate, PlayerState::Dead);

        ctx.players[0].cmd.buttons = Buttons::USE.bits();
        player_think(&mut ctx, 0);
        assert_eq!(ctx.players[0].playerstate, PlayerState::Reborn);
    }
}
