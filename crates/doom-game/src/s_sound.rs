// s_sound.rs — sound cues, channel allocation and music selection
//
// The simulation only queues cues. Once per tic the game hands the queue to
// a SoundSystem, which positions each cue against the listener, picks a
// channel and forwards raw samples to the host SoundSink.

use doom_common::common::com_dprintf;
use doom_common::doom_error::DoomResult;
use doom_common::doomdef::GameMode;
use doom_common::i_system::{SoundHandle, SoundSink};
use doom_common::m_fixed::{fixed_mul, Fixed, FRACBITS};
use doom_common::tables::{finesine, point_to_angle2, Angle, ANGLETOFINESHIFT};
use doom_common::w_wad::{LumpStore, PuTag};
use doom_common::wadfiles::SoundHeader;

use crate::p_local::PlayContext;
use crate::p_tick::ThinkerId;

const NUM_CHANNELS: usize = 8;

/// Sounds farther away than this are not heard.
const S_CLIPPING_DIST: Fixed = Fixed(1200 * 0x10000);
/// Sounds closer than this are played at full volume.
const S_CLOSE_DIST: Fixed = Fixed(200 * 0x10000);
const S_ATTENUATOR: i32 = (S_CLIPPING_DIST.0 - S_CLOSE_DIST.0) >> FRACBITS;
const S_STEREO_SWING: Fixed = Fixed(96 * 0x10000);

const NORM_PITCH: i32 = 128;
const NORM_SEP: i32 = 128;

pub const DEFAULT_SFX_VOLUME: i32 = 15 * 8;

/// Sound effects the simulation can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Pistol,
    Pstart,
    Pstop,
    Stnmov,
    Swtchn,
    Doropn,
    Dorcls,
    Bdopn,
    Bdcls,
    Itemup,
    Telept,
    Oof,
    Plpain,
    Pldeth,
    Barexp,
    Tink,
}

impl Sfx {
    pub fn name(self) -> &'static str {
        match self {
            Sfx::Pistol => "pistol",
            Sfx::Pstart => "pstart",
            Sfx::Pstop => "pstop",
            Sfx::Stnmov => "stnmov",
            Sfx::Swtchn => "swtchn",
            Sfx::Doropn => "doropn",
            Sfx::Dorcls => "dorcls",
            Sfx::Bdopn => "bdopn",
            Sfx::Bdcls => "bdcls",
            Sfx::Itemup => "itemup",
            Sfx::Telept => "telept",
            Sfx::Oof => "oof",
            Sfx::Plpain => "plpain",
            Sfx::Pldeth => "pldeth",
            Sfx::Barexp => "barexp",
            Sfx::Tink => "tink",
        }
    }

    pub fn lump_name(self) -> String {
        format!("DS{}", self.name().to_ascii_uppercase())
    }

    /// Lower is more important.
    pub fn priority(self) -> i32 {
        match self {
            Sfx::Pistol | Sfx::Itemup => 78,
            Sfx::Pstart | Sfx::Pstop | Sfx::Stnmov | Sfx::Swtchn => 78,
            Sfx::Doropn | Sfx::Dorcls | Sfx::Bdopn | Sfx::Bdcls => 100,
            Sfx::Telept => 32,
            Sfx::Oof | Sfx::Plpain => 96,
            Sfx::Pldeth => 32,
            Sfx::Barexp => 60,
            Sfx::Tink => 60,
        }
    }
}

/// Where a cue is emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSource {
    Sector(usize),
    Mobj(ThinkerId),
}

/// One queued sound start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue {
    /// `None` plays at full volume, centred.
    pub origin: Option<SoundSource>,
    pub sfx: Sfx,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicChange {
    pub lump: String,
    pub looping: bool,
}

/// Cues produced during a tic, consumed by the SoundSystem.
#[derive(Debug, Default)]
pub struct SoundQueue {
    cues: Vec<SoundCue>,
    music: Option<MusicChange>,
}

impl SoundQueue {
    pub fn start(&mut self, origin: Option<SoundSource>, sfx: Sfx) {
        self.cues.push(SoundCue { origin, sfx });
    }

    /// `name` without the `D_` prefix, e.g. "e1m1".
    pub fn change_music(&mut self, name: &str, looping: bool) {
        self.music = Some(MusicChange {
            lump: format!("D_{}", name.to_ascii_uppercase()),
            looping,
        });
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, SoundCue> {
        self.cues.drain(..)
    }

    pub fn take_music(&mut self) -> Option<MusicChange> {
        self.music.take()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
        self.music = None;
    }
}

// ============================================================
// Music selection
// ============================================================

const COMMERCIAL_MUSIC: [&str; 32] = [
    "runnin", "stalks", "countd", "betwee", "doom", "the_da", "shawn", "ddtblu", "in_cit", "dead",
    "stlks2", "theda2", "doom2", "ddtbl2", "runni2", "dead2", "stlks3", "romero", "shawn2",
    "messag", "count2", "ddtbl3", "ampie", "theda3", "adrian", "messg2", "romer2", "tense",
    "shawn3", "openin", "evil", "ultima",
];

/// Episode 4 reuses earlier tracks.
const EPISODE4_MUSIC: [&str; 9] = [
    "e3m4", "e3m2", "e3m3", "e1m5", "e2m7", "e2m4", "e2m6", "e2m5", "e1m9",
];

/// Music name (without `D_`) for a level.
pub fn level_music(gamemode: GameMode, episode: i32, map: i32) -> String {
    if gamemode == GameMode::Commercial {
        let idx = (map - 1).clamp(0, COMMERCIAL_MUSIC.len() as i32 - 1) as usize;
        COMMERCIAL_MUSIC[idx].to_string()
    } else if episode < 4 {
        format!("e{}m{}", episode.max(1), map.clamp(1, 9))
    } else {
        EPISODE4_MUSIC[(map - 1).clamp(0, 8) as usize].to_string()
    }
}

// ============================================================
// Channels
// ============================================================

#[derive(Debug, Clone, Copy)]
struct Channel {
    sfx: Sfx,
    origin: Option<SoundSource>,
    handle: SoundHandle,
}

/// Distance attenuation and stereo separation for a source, or `None` if
/// it is out of earshot.
pub fn adjust_sound_params(
    listener: (Fixed, Fixed, Angle),
    source: (Fixed, Fixed),
    sfx_volume: i32,
    boss_map: bool,
) -> Option<(i32, i32)> {
    let (lx, ly, langle) = listener;
    let adx = (lx - source.0).abs();
    let ady = (ly - source.1).abs();

    // From _GG1_ p.428. Approx. euclidean distance fast.
    let approx_dist = adx + ady - (adx.min(ady) >> 1);

    if !boss_map && approx_dist > S_CLIPPING_DIST {
        return None;
    }

    // angle of source to listener
    let mut angle = point_to_angle2(lx, ly, source.0, source.1);
    if angle > langle {
        angle = angle - langle;
    } else {
        angle = angle + Angle(0xffff_ffff - langle.0);
    }
    let fine = (angle.0 >> ANGLETOFINESHIFT) as usize;

    // stereo separation
    let sep = NORM_SEP - (fixed_mul(S_STEREO_SWING, finesine(fine)).0 >> FRACBITS);

    let vol = if approx_dist < S_CLOSE_DIST {
        sfx_volume
    } else if boss_map {
        let dist = approx_dist.min(S_CLIPPING_DIST);
        15 + ((sfx_volume - 15) * ((S_CLIPPING_DIST - dist).0 >> FRACBITS)) / S_ATTENUATOR
    } else {
        (sfx_volume * ((S_CLIPPING_DIST - approx_dist).0 >> FRACBITS)) / S_ATTENUATOR
    };

    (vol > 0).then_some((vol, sep))
}

/// Owns the hardware channels and the current song.
pub struct SoundSystem {
    channels: [Option<Channel>; NUM_CHANNELS],
    pub sfx_volume: i32,
    music: Option<(String, i32)>,
    music_paused: bool,
}

impl Default for SoundSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundSystem {
    pub fn new() -> Self {
        Self {
            channels: [None; NUM_CHANNELS],
            sfx_volume: DEFAULT_SFX_VOLUME,
            music: None,
            music_paused: false,
        }
    }

    fn listener(ctx: &PlayContext) -> Option<(ThinkerId, (Fixed, Fixed, Angle))> {
        let id = ctx.players[ctx.consoleplayer].mo?;
        let mo = ctx.thinkers.mobj(id)?;
        Some((id, (mo.x, mo.y, mo.angle)))
    }

    fn source_position(ctx: &PlayContext, origin: SoundSource) -> Option<(Fixed, Fixed)> {
        match origin {
            SoundSource::Sector(s) => ctx.level.sectors.get(s).map(|s| (s.soundorg.x, s.soundorg.y)),
            SoundSource::Mobj(id) => ctx.thinkers.mobj(id).map(|mo| (mo.x, mo.y)),
        }
    }

    /// Volume and separation for a cue, `None` if inaudible.
    fn spatialize(&self, ctx: &PlayContext, origin: Option<SoundSource>) -> Option<(i32, i32)> {
        let full = Some((self.sfx_volume, NORM_SEP));
        let (origin, (listener_id, listener)) = match (origin, Self::listener(ctx)) {
            (Some(o), Some(l)) => (o, l),
            _ => return full,
        };
        // the listener's own sounds are never attenuated
        if origin == SoundSource::Mobj(listener_id) {
            return full;
        }
        let pos = Self::source_position(ctx, origin)?;
        adjust_sound_params(listener, pos, self.sfx_volume, ctx.gamemap == 8)
    }

    /// Channel for a new sound: one already used by the same origin, a free
    /// one, or the least important one if it is no more important than
    /// `sfx`.
    fn pick_channel(&mut self, sink: &mut dyn SoundSink, origin: Option<SoundSource>, sfx: Sfx) -> Option<usize> {
        let mut pick = None;
        for (i, ch) in self.channels.iter().enumerate() {
            match ch {
                None => {
                    pick.get_or_insert(i);
                }
                Some(c) if origin.is_some() && c.origin == origin => {
                    pick = Some(i);
                    break;
                }
                Some(_) => {}
            }
        }

        if pick.is_none() {
            pick = self
                .channels
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.map(|c| (i, c.sfx.priority())))
                .filter(|&(_, p)| p >= sfx.priority())
                .max_by_key(|&(_, p)| p)
                .map(|(i, _)| i);
        }

        let i = pick?;
        if let Some(old) = self.channels[i].take() {
            sink.stop_sound(old.handle);
        }
        Some(i)
    }

    /// Starts every queued cue and applies any queued music change.
    pub fn start_cues(
        &mut self,
        ctx: &mut PlayContext,
        store: &mut LumpStore,
        sink: &mut dyn SoundSink,
    ) -> DoomResult<()> {
        let cues: Vec<SoundCue> = ctx.sounds.drain().collect();
        for cue in cues {
            self.start_sound(ctx, store, sink, cue)?;
        }
        if let Some(change) = ctx.sounds.take_music() {
            self.change_music(store, sink, &change.lump, change.looping)?;
        }
        Ok(())
    }

    fn start_sound(
        &mut self,
        ctx: &PlayContext,
        store: &mut LumpStore,
        sink: &mut dyn SoundSink,
        cue: SoundCue,
    ) -> DoomResult<()> {
        let (volume, sep) = match self.spatialize(ctx, cue.origin) {
            Some(p) => p,
            None => return Ok(()),
        };

        let lump = match store.check_num_for_name(&cue.sfx.lump_name()) {
            Some(l) => l,
            None => return Ok(()),
        };

        let chan = match self.pick_channel(sink, cue.origin, cue.sfx) {
            Some(c) => c,
            None => return Ok(()),
        };

        let data = store.cache_lump_num(lump, PuTag::Sound)?;
        let (rate, samples) = match SoundHeader::parse(&data) {
            Some(h) => (h.sample_rate, h.samples(&data)),
            None => {
                com_dprintf(&format!("S_StartSound: bad sound lump {}\n", cue.sfx.lump_name()));
                return Ok(());
            }
        };

        let handle = sink.start_sound(
            cue.sfx as usize,
            samples,
            rate,
            volume,
            sep,
            NORM_PITCH,
            cue.sfx.priority(),
        );
        self.channels[chan] = Some(Channel {
            sfx: cue.sfx,
            origin: cue.origin,
            handle,
        });
        Ok(())
    }

    /// Re-spatializes playing channels and frees finished ones.
    pub fn update(&mut self, ctx: &PlayContext, sink: &mut dyn SoundSink) {
        for i in 0..NUM_CHANNELS {
            let ch = match self.channels[i] {
                Some(c) => c,
                None => continue,
            };
            if !sink.sound_is_playing(ch.handle) {
                self.channels[i] = None;
                continue;
            }
            match self.spatialize(ctx, ch.origin) {
                Some((vol, sep)) => sink.update_sound_params(ch.handle, vol, sep, NORM_PITCH),
                None => {
                    sink.stop_sound(ch.handle);
                    self.channels[i] = None;
                }
            }
        }
    }

    pub fn stop_all(&mut self, sink: &mut dyn SoundSink) {
        for ch in self.channels.iter_mut() {
            if let Some(c) = ch.take() {
                sink.stop_sound(c.handle);
            }
        }
    }

    pub fn active_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.is_some()).count()
    }

    pub fn current_music(&self) -> Option<&str> {
        self.music.as_ref().map(|(name, _)| name.as_str())
    }

    /// Switches songs. Asking for the song already playing does nothing; a
    /// missing lump leaves silence.
    pub fn change_music(
        &mut self,
        store: &mut LumpStore,
        sink: &mut dyn SoundSink,
        lump: &str,
        looping: bool,
    ) -> DoomResult<()> {
        if self.current_music() == Some(lump) {
            return Ok(());
        }
        self.stop_music(sink);

        let num = match store.check_num_for_name(lump) {
            Some(n) => n,
            None => return Ok(()),
        };
        let data = store.cache_lump_num(num, PuTag::Music)?;
        let handle = sink.register_song(&data);
        sink.play_song(handle, looping);
        self.music = Some((lump.to_string(), handle));
        Ok(())
    }

    pub fn stop_music(&mut self, sink: &mut dyn SoundSink) {
        if let Some((_, handle)) = self.music.take() {
            if self.music_paused {
                sink.resume_song(handle);
                self.music_paused = false;
            }
            sink.stop_song(handle);
            sink.unregister_song(handle);
        }
    }

    pub fn pause_music(&mut self, sink: &mut dyn SoundSink) {
        if let Some((_, handle)) = &self.music {
            if !self.music_paused {
                sink.pause_song(*handle);
                self.music_paused = true;
            }
        }
    }

    pub fn resume_music(&mut self, sink: &mut dyn SoundSink) {
        if let Some((_, handle)) = &self.music {
            if self.music_paused {
                sink.resume_song(*handle);
                self.music_paused = false;
            }
        }
    }
}
