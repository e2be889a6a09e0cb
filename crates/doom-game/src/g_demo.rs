// g_demo.rs — demo lump format, recording and playback streams
//
// A demo is a 13-byte header followed by one 4-byte record per in-game
// player per tic, terminated by DEMOMARKER:
//
//   version skill episode map deathmatch respawn fast nomonsters
//   consoleplayer playeringame[4]
//   { forwardmove sidemove angleturn>>8 buttons } ...  0x80

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use doom_common::common::{com_printf, i_error};
use doom_common::doom_error::{DoomError, DoomResult};
use doom_common::doomdef::{Skill, MAXPLAYERS, VERSION};
use doom_common::d_event::TicCmd;

pub const DEMOMARKER: u8 = 0x80;
pub const DEMO_HEADER_SIZE: usize = 9 + MAXPLAYERS;
/// Bytes per player per tic.
pub const DEMO_TICCMD_SIZE: usize = 4;

/// Settings a demo was recorded with; replayed games must match them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoHeader {
    pub version: u8,
    pub skill: Skill,
    pub episode: i32,
    pub map: i32,
    pub deathmatch: i32,
    pub respawnparm: bool,
    pub fastparm: bool,
    pub nomonsters: bool,
    pub consoleplayer: usize,
    pub playeringame: [bool; MAXPLAYERS],
}

impl DemoHeader {
    pub fn parse(data: &[u8]) -> DoomResult<Self> {
        let version = *data
            .first()
            .ok_or_else(|| i_error("G_DoPlayDemo: empty demo"))?;
        if version != VERSION {
            return Err(DoomError::DemoVersion { expected: VERSION, found: version });
        }
        if data.len() < DEMO_HEADER_SIZE {
            return Err(i_error(format!("G_DoPlayDemo: truncated demo header ({} bytes)", data.len())));
        }

        let mut playeringame = [false; MAXPLAYERS];
        for (i, p) in playeringame.iter_mut().enumerate() {
            *p = data[9 + i] != 0;
        }
        Ok(Self {
            version,
            skill: Skill::from_index(data[1] as i32),
            episode: data[2] as i32,
            map: data[3] as i32,
            deathmatch: data[4] as i32,
            respawnparm: data[5] != 0,
            fastparm: data[6] != 0,
            nomonsters: data[7] != 0,
            consoleplayer: (data[8] as usize).min(MAXPLAYERS - 1),
            playeringame,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.version);
        out.push(self.skill.index() as u8);
        out.push(self.episode as u8);
        out.push(self.map as u8);
        out.push(self.deathmatch as u8);
        out.push(self.respawnparm as u8);
        out.push(self.fastparm as u8);
        out.push(self.nomonsters as u8);
        out.push(self.consoleplayer as u8);
        out.extend(self.playeringame.iter().map(|&p| p as u8));
    }

    /// More than one player means the demo was a network game.
    pub fn is_netdemo(&self) -> bool {
        self.playeringame.iter().skip(1).any(|&p| p)
    }
}

/// Turning is stored with 8 bits of precision.
fn encode_angleturn(angleturn: i16) -> u8 {
    ((angleturn as i32 + 128) >> 8) as u8
}

fn decode_angleturn(b: u8) -> i16 {
    ((b as u16) << 8) as i16
}

/// Playback cursor over a demo lump.
#[derive(Debug, Clone)]
pub struct DemoReader {
    data: Arc<[u8]>,
    pos: usize,
}

impl DemoReader {
    pub fn new(data: Arc<[u8]>) -> DoomResult<(DemoHeader, Self)> {
        let header = DemoHeader::parse(&data)?;
        Ok((header, Self { data, pos: DEMO_HEADER_SIZE }))
    }

    /// Fills `cmd` from the next record. Returns false at the end marker
    /// (or the end of a lump missing one); `cmd` is untouched then.
    pub fn read_ticcmd(&mut self, cmd: &mut TicCmd) -> bool {
        let rec = match self.data.get(self.pos..self.pos + DEMO_TICCMD_SIZE) {
            Some(r) if r[0] != DEMOMARKER => r,
            _ => return false,
        };
        cmd.forwardmove = rec[0] as i8;
        cmd.sidemove = rec[1] as i8;
        cmd.angleturn = decode_angleturn(rec[2]);
        cmd.buttons = rec[3];
        self.pos += DEMO_TICCMD_SIZE;
        true
    }

    pub fn at_end(&self) -> bool {
        self.data.get(self.pos).map_or(true, |&b| b == DEMOMARKER)
    }
}

/// Records tic commands into a size-limited buffer.
#[derive(Debug, Clone)]
pub struct DemoRecorder {
    pub name: String,
    buffer: Vec<u8>,
    limit: usize,
}

impl DemoRecorder {
    pub fn new(name: &str, maxdemo_kb: usize) -> Self {
        let limit = maxdemo_kb * 1024;
        Self {
            name: name.to_string(),
            buffer: Vec::with_capacity(limit.min(1 << 20)),
            limit,
        }
    }

    pub fn begin(&mut self, header: &DemoHeader) {
        self.buffer.clear();
        header.write(&mut self.buffer);
    }

    /// Appends `cmd` and rewrites it with the precision it will replay at, so
    /// the recording game and the replay stay in step. Returns false once the
    /// buffer is full; the command is not stored then.
    pub fn write_ticcmd(&mut self, cmd: &mut TicCmd) -> bool {
        if self.buffer.len() + DEMO_TICCMD_SIZE + 1 > self.limit {
            return false;
        }
        let start = self.buffer.len();
        self.buffer.push(cmd.forwardmove as u8);
        self.buffer.push(cmd.sidemove as u8);
        self.buffer.push(encode_angleturn(cmd.angleturn));
        self.buffer.push(cmd.buttons);

        let mut replay = DemoReader {
            data: Arc::from(&self.buffer[start..]),
            pos: 0,
        };
        replay.read_ticcmd(cmd);
        true
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Terminates the stream and hands back the finished lump.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.buffer.push(DEMOMARKER);
        (self.name, self.buffer)
    }
}

/// Destination for finished recordings.
pub trait DemoSink: Send {
    fn write_demo(&mut self, name: &str, data: &[u8]) -> DoomResult<()>;
}

/// Writes `<name>.lmp` into a directory.
pub struct FileDemoSink {
    dir: PathBuf,
}

impl FileDemoSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DemoSink for FileDemoSink {
    fn write_demo(&mut self, name: &str, data: &[u8]) -> DoomResult<()> {
        let path = self.dir.join(format!("{}.lmp", name));
        fs::write(&path, data).map_err(|source| DoomError::Io {
            path: path.display().to_string(),
            source,
        })?;
        com_printf(&format!("Demo {} recorded\n", path.display()));
        Ok(())
    }
}

/// Keeps recordings in memory.
#[derive(Debug, Default)]
pub struct MemoryDemoSink {
    pub demos: Vec<(String, Vec<u8>)>,
}

impl DemoSink for MemoryDemoSink {
    fn write_demo(&mut self, name: &str, data: &[u8]) -> DoomResult<()> {
        self.demos.push((name.to_string(), data.to_vec()));
        Ok(())
    }
}
