// p_ceilng.rs — moving ceilings and crushers

use doom_common::m_fixed::{Fixed, FRACUNIT};

use crate::p_floor::{move_plane, MoveResult, Plane};
use crate::p_local::PlayContext;
use crate::p_spec::{find_highest_ceiling_surrounding, find_sector_from_tag};
use crate::p_tick::{Thinker, ThinkerId};
use crate::s_sound::{Sfx, SoundSource};

pub const CEILSPEED: Fixed = Fixed(FRACUNIT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingKind {
    LowerToFloor,
    RaiseToHighest,
    LowerAndCrush,
    CrushAndRaise,
    FastCrushAndRaise,
    SilentCrushAndRaise,
}

impl CeilingKind {
    fn is_crusher(self) -> bool {
        matches!(
            self,
            CeilingKind::CrushAndRaise
                | CeilingKind::FastCrushAndRaise
                | CeilingKind::SilentCrushAndRaise
        )
    }
}

#[derive(Debug, Clone)]
pub struct CeilingMove {
    pub kind: CeilingKind,
    pub sector: usize,
    pub bottomheight: Fixed,
    pub topheight: Fixed,
    pub speed: Fixed,
    pub crush: bool,
    /// 1 = up, 0 = waiting in stasis, -1 = down.
    pub direction: i32,
    /// Sector tag, for stopping and restarting by tag.
    pub tag: i16,
    pub olddirection: i32,
}

fn ceiling_state(ctx: &PlayContext, id: ThinkerId) -> Option<CeilingMove> {
    match ctx.thinkers.get(id) {
        Some(Thinker::Ceiling(c)) => Some(c.clone()),
        _ => None,
    }
}

fn with_ceiling(ctx: &mut PlayContext, id: ThinkerId, f: impl FnOnce(&mut CeilingMove)) {
    if let Some(Thinker::Ceiling(c)) = ctx.thinkers.get_mut(id) {
        f(c);
    }
}

fn remove_active_ceiling(ctx: &mut PlayContext, id: ThinkerId, sector: usize) {
    if let Some(sec) = ctx.level.sectors.get_mut(sector) {
        sec.special_data = None;
    }
    ctx.thinkers.remove(id);
    ctx.activeceilings.retain(|&c| c != id);
}

pub fn t_move_ceiling(ctx: &mut PlayContext, id: ThinkerId) {
    let mut ceiling = match ceiling_state(ctx, id) {
        Some(c) => c,
        None => return,
    };
    let origin = Some(SoundSource::Sector(ceiling.sector));
    let silent = ceiling.kind == CeilingKind::SilentCrushAndRaise;
    let noise_tic = ctx.leveltime() & 7 == 0;

    match ceiling.direction {
        1 => {
            let res = move_plane(
                ctx,
                ceiling.sector,
                ceiling.speed,
                ceiling.topheight,
                false,
                Plane::Ceiling,
                1,
            );
            if noise_tic && !silent {
                ctx.sounds.start(origin, Sfx::Stnmov);
            }
            if res == MoveResult::PastDest {
                match ceiling.kind {
                    CeilingKind::RaiseToHighest => {
                        remove_active_ceiling(ctx, id, ceiling.sector);
                        return;
                    }
                    CeilingKind::SilentCrushAndRaise => {
                        ctx.sounds.start(origin, Sfx::Pstop);
                        ceiling.direction = -1;
                    }
                    CeilingKind::CrushAndRaise | CeilingKind::FastCrushAndRaise => {
                        ceiling.direction = -1;
                    }
                    _ => {}
                }
            }
        }
        -1 => {
            let res = move_plane(
                ctx,
                ceiling.sector,
                ceiling.speed,
                ceiling.bottomheight,
                ceiling.crush,
                Plane::Ceiling,
                -1,
            );
            if noise_tic && !silent {
                ctx.sounds.start(origin, Sfx::Stnmov);
            }
            match res {
                MoveResult::PastDest => match ceiling.kind {
                    CeilingKind::SilentCrushAndRaise | CeilingKind::CrushAndRaise => {
                        if silent {
                            ctx.sounds.start(origin, Sfx::Pstop);
                        }
                        ceiling.speed = CEILSPEED;
                        ceiling.direction = 1;
                    }
                    CeilingKind::FastCrushAndRaise => ceiling.direction = 1,
                    CeilingKind::LowerAndCrush | CeilingKind::LowerToFloor => {
                        remove_active_ceiling(ctx, id, ceiling.sector);
                        return;
                    }
                    CeilingKind::RaiseToHighest => {}
                },
                MoveResult::Crushed => {
                    // slow down while something is in the way
                    if matches!(
                        ceiling.kind,
                        CeilingKind::SilentCrushAndRaise
                            | CeilingKind::CrushAndRaise
                            | CeilingKind::LowerAndCrush
                    ) {
                        ceiling.speed = CEILSPEED / 8;
                    }
                }
                MoveResult::Ok => {}
            }
        }
        // in stasis
        _ => {}
    }

    with_ceiling(ctx, id, |c| *c = ceiling);
}

/// Restarts stopped crushers tagged `tag`.
fn activate_in_stasis_ceiling(ctx: &mut PlayContext, tag: i16) -> bool {
    let mut rtn = false;
    for id in ctx.activeceilings.clone() {
        with_ceiling(ctx, id, |c| {
            if c.tag == tag && c.direction == 0 {
                c.direction = c.olddirection;
                rtn = true;
            }
        });
    }
    rtn
}

/// Starts a ceiling mover in every idle sector tagged `tag`.
pub fn ev_do_ceiling(ctx: &mut PlayContext, tag: i16, kind: CeilingKind) -> bool {
    let mut rtn = false;

    // reactivate in-stasis ceilings for certain types
    if kind.is_crusher() {
        rtn = activate_in_stasis_ceiling(ctx, tag);
    }

    let mut secnum = None;
    while let Some(s) = find_sector_from_tag(&ctx.level, tag, secnum) {
        secnum = Some(s);
        if ctx.level.sectors[s].special_data.is_some() {
            continue;
        }
        rtn = true;

        let sec = &ctx.level.sectors[s];
        let mut ceiling = CeilingMove {
            kind,
            sector: s,
            bottomheight: sec.floorheight,
            topheight: sec.ceilingheight,
            speed: CEILSPEED,
            crush: false,
            direction: -1,
            tag: sec.tag,
            olddirection: 0,
        };

        match kind {
            CeilingKind::FastCrushAndRaise => {
                ceiling.crush = true;
                ceiling.bottomheight = sec.floorheight + Fixed::from_int(8);
                ceiling.speed = CEILSPEED * 2;
            }
            CeilingKind::SilentCrushAndRaise | CeilingKind::CrushAndRaise => {
                ceiling.crush = true;
                ceiling.bottomheight = sec.floorheight + Fixed::from_int(8);
            }
            CeilingKind::LowerAndCrush => {
                ceiling.bottomheight = sec.floorheight + Fixed::from_int(8);
            }
            CeilingKind::LowerToFloor => {}
            CeilingKind::RaiseToHighest => {
                ceiling.topheight = find_highest_ceiling_surrounding(&ctx.level, s);
                ceiling.direction = 1;
            }
        }

        let id = ctx.thinkers.add(Thinker::Ceiling(ceiling));
        ctx.level.sectors[s].special_data = Some(id);
        ctx.activeceilings.push(id);
    }
    rtn
}

/// Puts moving crushers tagged `tag` into stasis.
pub fn ev_ceiling_crush_stop(ctx: &mut PlayContext, tag: i16) -> bool {
    let mut rtn = false;
    for id in ctx.activeceilings.clone() {
        with_ceiling(ctx, id, |c| {
            if c.tag == tag && c.direction != 0 {
                c.olddirection = c.direction;
                c.direction = 0;
                rtn = true;
            }
        });
    }
    rtn
}
