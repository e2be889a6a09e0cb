// p_tick.rs — thinker scheduler and the per-tic play loop

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

use doom_common::doomdef::MAXPLAYERS;

use crate::p_ceilng::{self, CeilingMove};
use crate::p_doors::{self, VDoor};
use crate::p_floor::{self, FloorMove};
use crate::p_local::PlayContext;
use crate::p_mobj::{self, MapObject};
use crate::p_plats::{self, Plat};
use crate::p_spec;
use crate::p_user;

/// Stable handle to a scheduled thinker. Slots are reused, so the
/// generation tells a stale handle apart from the slot's new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThinkerId {
    index: u32,
    generation: u32,
}

/// Scheduling state of a thinker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkerState {
    Active,
    /// Still linked; unlinked the next time the walk passes it.
    PendingRemoval,
    Unlinked,
}

/// Per-kind state of everything that thinks.
#[derive(Debug, Clone)]
pub enum Thinker {
    Door(VDoor),
    Floor(FloorMove),
    Ceiling(CeilingMove),
    Platform(Plat),
    MapObject(Box<MapObject>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkerKind {
    Door,
    Floor,
    Ceiling,
    Platform,
    MapObject,
}

impl Thinker {
    pub fn kind(&self) -> ThinkerKind {
        match self {
            Thinker::Door(_) => ThinkerKind::Door,
            Thinker::Floor(_) => ThinkerKind::Floor,
            Thinker::Ceiling(_) => ThinkerKind::Ceiling,
            Thinker::Platform(_) => ThinkerKind::Platform,
            Thinker::MapObject(_) => ThinkerKind::MapObject,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    state: ThinkerState,
    prev: Option<u32>,
    next: Option<u32>,
    thinker: Option<Thinker>,
}

/// Insertion-ordered doubly linked list of thinkers over a slot arena.
#[derive(Debug, Default)]
pub struct ThinkerList {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    linked: usize,
}

impl ThinkerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every thinker; used when a level is torn down.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.linked = 0;
    }

    /// Appends at the tail.
    pub fn add(&mut self, thinker: Thinker) -> ThinkerId {
        let index = match self.free.pop() {
            Some(i) => {
                let slot = &mut self.slots[i as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.state = ThinkerState::Active;
                slot.prev = self.tail;
                slot.next = None;
                slot.thinker = Some(thinker);
                i
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    state: ThinkerState::Active,
                    prev: self.tail,
                    next: None,
                    thinker: Some(thinker),
                });
                (self.slots.len() - 1) as u32
            }
        };

        match self.tail {
            Some(t) => self.slots[t as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.linked += 1;

        ThinkerId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Marks a thinker for removal. It stays linked until the next walk
    /// reaches it, and never runs again.
    pub fn remove(&mut self, id: ThinkerId) {
        if let Some(slot) = self.slot_mut(id) {
            if slot.state == ThinkerState::Active {
                slot.state = ThinkerState::PendingRemoval;
            }
        }
    }

    fn slot(&self, id: ThinkerId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ThinkerId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    pub fn state(&self, id: ThinkerId) -> ThinkerState {
        self.slot(id).map(|s| s.state).unwrap_or(ThinkerState::Unlinked)
    }

    pub fn is_live(&self, id: ThinkerId) -> bool {
        self.state(id) == ThinkerState::Active
    }

    /// Number of linked thinkers, including those pending removal.
    pub fn len(&self) -> usize {
        self.linked
    }

    pub fn is_empty(&self) -> bool {
        self.linked == 0
    }

    fn id_at(&self, index: u32) -> ThinkerId {
        ThinkerId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub fn first(&self) -> Option<ThinkerId> {
        self.head.map(|i| self.id_at(i))
    }

    pub fn last(&self) -> Option<ThinkerId> {
        self.tail.map(|i| self.id_at(i))
    }

    pub fn next_of(&self, id: ThinkerId) -> Option<ThinkerId> {
        self.slot(id).and_then(|s| s.next).map(|i| self.id_at(i))
    }

    /// Physically unlinks a thinker and frees its slot.
    fn unlink(&mut self, id: ThinkerId) {
        let (prev, next) = match self.slot(id) {
            Some(s) if s.state != ThinkerState::Unlinked => (s.prev, s.next),
            _ => return,
        };
        match prev {
            Some(p) => self.slots[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n as usize].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[id.index as usize];
        slot.state = ThinkerState::Unlinked;
        slot.prev = None;
        slot.next = None;
        slot.thinker = None;
        self.free.push(id.index);
        self.linked -= 1;
    }

    pub fn get(&self, id: ThinkerId) -> Option<&Thinker> {
        self.slot(id).and_then(|s| s.thinker.as_ref())
    }

    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut Thinker> {
        self.slot_mut(id).and_then(|s| s.thinker.as_mut())
    }

    pub fn mobj(&self, id: ThinkerId) -> Option<&MapObject> {
        match self.get(id) {
            Some(Thinker::MapObject(mo)) => Some(mo.as_ref()),
            _ => None,
        }
    }

    pub fn mobj_mut(&mut self, id: ThinkerId) -> Option<&mut MapObject> {
        match self.get_mut(id) {
            Some(Thinker::MapObject(mo)) => Some(mo.as_mut()),
            _ => None,
        }
    }

    /// Linked thinkers in scheduling order, live or not.
    pub fn iter(&self) -> impl Iterator<Item = (ThinkerId, &Thinker)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let index = cursor?;
            let slot = &self.slots[index as usize];
            cursor = slot.next;
            Some((self.id_at(index), slot.thinker.as_ref()?))
        })
    }

    /// Live map objects in scheduling order.
    pub fn mobjs(&self) -> impl Iterator<Item = (ThinkerId, &MapObject)> + '_ {
        self.iter().filter_map(move |(id, t)| match t {
            Thinker::MapObject(mo) if self.is_live(id) => Some((id, mo.as_ref())),
            _ => None,
        })
    }
}

// ============================================================
// P_RunThinkers
// ============================================================

fn think(ctx: &mut PlayContext, id: ThinkerId) {
    let kind = match ctx.thinkers.get(id) {
        Some(t) => t.kind(),
        None => return,
    };
    match kind {
        ThinkerKind::Door => p_doors::t_vertical_door(ctx, id),
        ThinkerKind::Floor => p_floor::t_move_floor(ctx, id),
        ThinkerKind::Ceiling => p_ceilng::t_move_ceiling(ctx, id),
        ThinkerKind::Platform => p_plats::t_plat_raise(ctx, id),
        ThinkerKind::MapObject => p_mobj::mobj_thinker(ctx, id),
    }
}

/// Walks the list once. Thinkers pending removal are unlinked as they are
/// passed; thinkers added during the walk wait for the next tic.
pub fn run_thinkers(ctx: &mut PlayContext) {
    walk_thinkers(ctx, think);
}

fn walk_thinkers<F>(ctx: &mut PlayContext, mut think: F)
where
    F: FnMut(&mut PlayContext, ThinkerId),
{
    let last = match ctx.thinkers.last() {
        Some(id) => id,
        None => return,
    };
    let mut cursor = ctx.thinkers.first();

    while let Some(id) = cursor {
        let next = ctx.thinkers.next_of(id);
        match ctx.thinkers.state(id) {
            ThinkerState::PendingRemoval => ctx.thinkers.unlink(id),
            ThinkerState::Active => think(ctx, id),
            ThinkerState::Unlinked => {}
        }
        if id == last {
            break;
        }
        cursor = next;
    }
}

// ============================================================
// P_Ticker
// ============================================================

pub fn p_ticker(ctx: &mut PlayContext) {
    if ctx.paused {
        return;
    }

    for i in 0..MAXPLAYERS {
        if ctx.playeringame[i] {
            p_user::player_think(ctx, i);
        }
    }

    run_thinkers(ctx);
    p_spec::update_specials(ctx);

    ctx.level.leveltime += 1;
}
