// wadfiles.rs — WAD archive and level lump binary formats
//
// All multi-byte fields are little-endian. Record structs here mirror the
// on-disk layout; the game crate converts them into runtime structures.

pub const IWAD_ID: &[u8; 4] = b"IWAD";
pub const PWAD_ID: &[u8; 4] = b"PWAD";

pub const WADINFO_SIZE: usize = 12;
pub const FILELUMP_SIZE: usize = 16;

// ============================================================
// Byte helpers
// ============================================================

#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    read_i32_le(data, offset) as u32
}

/// Upper-cased lump name with trailing NULs and spaces trimmed.
pub fn lump_name_from_bytes(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len()).min(8);
    String::from_utf8_lossy(&raw[..end])
        .trim_end()
        .to_ascii_uppercase()
}

/// NUL-padded 8-byte name field. Longer names are truncated.
pub fn lump_name_to_bytes(name: &str) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (dst, src) in out.iter_mut().zip(name.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    out
}

// ============================================================
// Archive header and directory
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    Iwad,
    Pwad,
}

#[derive(Debug, Clone, Copy)]
pub struct WadInfo {
    pub kind: WadKind,
    pub numlumps: i32,
    pub infotableofs: i32,
}

impl WadInfo {
    /// `None` when the magic is neither "IWAD" nor "PWAD".
    pub fn parse(b: &[u8; WADINFO_SIZE]) -> Option<Self> {
        let kind = match &b[0..4] {
            id if id == IWAD_ID => WadKind::Iwad,
            id if id == PWAD_ID => WadKind::Pwad,
            _ => return None,
        };
        Some(Self {
            kind,
            numlumps: read_i32_le(b, 4),
            infotableofs: read_i32_le(b, 8),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileLump {
    pub filepos: i32,
    pub size: i32,
    pub name: String,
}

impl FileLump {
    pub fn parse(b: &[u8]) -> Self {
        Self {
            filepos: read_i32_le(b, 0),
            size: read_i32_le(b, 4),
            name: lump_name_from_bytes(&b[8..16]),
        }
    }
}

/// Assembles a WAD image in memory: header, lump data, then directory.
#[derive(Debug, Default)]
pub struct WadBuilder {
    lumps: Vec<(String, Vec<u8>)>,
}

impl WadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lump(mut self, name: &str, data: Vec<u8>) -> Self {
        self.lumps.push((name.to_string(), data));
        self
    }

    pub fn add_lump(&mut self, name: &str, data: Vec<u8>) {
        self.lumps.push((name.to_string(), data));
    }

    pub fn build(&self, kind: WadKind) -> Vec<u8> {
        let data_len: usize = self.lumps.iter().map(|(_, d)| d.len()).sum();
        let dir_ofs = WADINFO_SIZE + data_len;

        let mut out = Vec::with_capacity(dir_ofs + self.lumps.len() * FILELUMP_SIZE);
        out.extend_from_slice(match kind {
            WadKind::Iwad => IWAD_ID,
            WadKind::Pwad => PWAD_ID,
        });
        out.extend_from_slice(&(self.lumps.len() as i32).to_le_bytes());
        out.extend_from_slice(&(dir_ofs as i32).to_le_bytes());

        let mut positions = Vec::with_capacity(self.lumps.len());
        for (_, data) in &self.lumps {
            positions.push(out.len());
            out.extend_from_slice(data);
        }
        for ((name, data), pos) in self.lumps.iter().zip(positions) {
            out.extend_from_slice(&(pos as i32).to_le_bytes());
            out.extend_from_slice(&(data.len() as i32).to_le_bytes());
            out.extend_from_slice(&lump_name_to_bytes(name));
        }
        out
    }
}

// ============================================================
// Level lumps
// ============================================================

/// Lump offsets from the level marker.
pub const ML_LABEL: usize = 0;
pub const ML_THINGS: usize = 1;
pub const ML_LINEDEFS: usize = 2;
pub const ML_SIDEDEFS: usize = 3;
pub const ML_VERTEXES: usize = 4;
pub const ML_SEGS: usize = 5;
pub const ML_SSECTORS: usize = 6;
pub const ML_NODES: usize = 7;
pub const ML_SECTORS: usize = 8;
pub const ML_REJECT: usize = 9;
pub const ML_BLOCKMAP: usize = 10;

/// Child index flag marking a subsector leaf in a node.
pub const NF_SUBSECTOR: u16 = 0x8000;

bitflags::bitflags! {
    /// Linedef flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LineFlags: i16 {
        /// Solid, is an obstacle.
        const BLOCKING      = 1;
        /// Blocks monsters only.
        const BLOCKMONSTERS = 2;
        /// Backside will not be present at all if not two sided.
        const TWOSIDED      = 4;
        const DONTPEGTOP    = 8;
        const DONTPEGBOTTOM = 16;
        /// In automap: don't map as two sided: IT'S A SECRET!
        const SECRET        = 32;
        const SOUNDBLOCK    = 64;
        const DONTDRAW      = 128;
        const MAPPED        = 256;
    }
}

bitflags::bitflags! {
    /// Map thing spawn options.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MapThingFlags: i16 {
        const EASY       = 1;
        const NORMAL     = 2;
        const HARD       = 4;
        /// Deaf monster.
        const AMBUSH     = 8;
        /// Multiplayer only.
        const NOT_SINGLE = 16;
    }
}

/// A record type stored as a flat array in a level lump.
pub trait MapRecord: Sized + Send {
    const SIZE: usize;
    fn parse(b: &[u8]) -> Self;
    fn write(&self, out: &mut Vec<u8>);
}

fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_name(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(&lump_name_to_bytes(name));
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapVertex {
    pub x: i16,
    pub y: i16,
}

impl MapRecord for MapVertex {
    const SIZE: usize = 4;
    fn parse(b: &[u8]) -> Self {
        Self { x: read_i16_le(b, 0), y: read_i16_le(b, 2) }
    }
    fn write(&self, out: &mut Vec<u8>) {
        push_i16(out, self.x);
        push_i16(out, self.y);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSideDef {
    pub textureoffset: i16,
    pub rowoffset: i16,
    pub toptexture: String,
    pub bottomtexture: String,
    pub midtexture: String,
    /// Front sector, towards viewer.
    pub sector: i16,
}

impl MapRecord for MapSideDef {
    const SIZE: usize = 30;
    fn parse(b: &[u8]) -> Self {
        Self {
            textureoffset: read_i16_le(b, 0),
            rowoffset: read_i16_le(b, 2),
            toptexture: lump_name_from_bytes(&b[4..12]),
            bottomtexture: lump_name_from_bytes(&b[12..20]),
            midtexture: lump_name_from_bytes(&b[20..28]),
            sector: read_i16_le(b, 28),
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        push_i16(out, self.textureoffset);
        push_i16(out, self.rowoffset);
        push_name(out, &self.toptexture);
        push_name(out, &self.bottomtexture);
        push_name(out, &self.midtexture);
        push_i16(out, self.sector);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapLineDef {
    pub v1: i16,
    pub v2: i16,
    pub flags: i16,
    pub special: i16,
    pub tag: i16,
    /// sidenum[1] will be -1 if one sided
    pub sidenum: [i16; 2],
}

impl MapRecord for MapLineDef {
    const SIZE: usize = 14;
    fn parse(b: &[u8]) -> Self {
        Self {
            v1: read_i16_le(b, 0),
            v2: read_i16_le(b, 2),
            flags: read_i16_le(b, 4),
            special: read_i16_le(b, 6),
            tag: read_i16_le(b, 8),
            sidenum: [read_i16_le(b, 10), read_i16_le(b, 12)],
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.v1, self.v2, self.flags, self.special, self.tag, self.sidenum[0], self.sidenum[1]] {
            push_i16(out, v);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSector {
    pub floorheight: i16,
    pub ceilingheight: i16,
    pub floorpic: String,
    pub ceilingpic: String,
    pub lightlevel: i16,
    pub special: i16,
    pub tag: i16,
}

impl MapRecord for MapSector {
    const SIZE: usize = 26;
    fn parse(b: &[u8]) -> Self {
        Self {
            floorheight: read_i16_le(b, 0),
            ceilingheight: read_i16_le(b, 2),
            floorpic: lump_name_from_bytes(&b[4..12]),
            ceilingpic: lump_name_from_bytes(&b[12..20]),
            lightlevel: read_i16_le(b, 20),
            special: read_i16_le(b, 22),
            tag: read_i16_le(b, 24),
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        push_i16(out, self.floorheight);
        push_i16(out, self.ceilingheight);
        push_name(out, &self.floorpic);
        push_name(out, &self.ceilingpic);
        push_i16(out, self.lightlevel);
        push_i16(out, self.special);
        push_i16(out, self.tag);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSubSector {
    pub numsegs: i16,
    pub firstseg: i16,
}

impl MapRecord for MapSubSector {
    const SIZE: usize = 4;
    fn parse(b: &[u8]) -> Self {
        Self { numsegs: read_i16_le(b, 0), firstseg: read_i16_le(b, 2) }
    }
    fn write(&self, out: &mut Vec<u8>) {
        push_i16(out, self.numsegs);
        push_i16(out, self.firstseg);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSeg {
    pub v1: i16,
    pub v2: i16,
    pub angle: i16,
    pub linedef: i16,
    pub side: i16,
    pub offset: i16,
}

impl MapRecord for MapSeg {
    const SIZE: usize = 12;
    fn parse(b: &[u8]) -> Self {
        Self {
            v1: read_i16_le(b, 0),
            v2: read_i16_le(b, 2),
            angle: read_i16_le(b, 4),
            linedef: read_i16_le(b, 6),
            side: read_i16_le(b, 8),
            offset: read_i16_le(b, 10),
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.v1, self.v2, self.angle, self.linedef, self.side, self.offset] {
            push_i16(out, v);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapNode {
    /// Partition line from (x,y) to x+dx,y+dy.
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    /// Bounding box for each child, top/bottom/left/right.
    pub bbox: [[i16; 4]; 2],
    /// If NF_SUBSECTOR it's a subsector.
    pub children: [u16; 2],
}

impl MapRecord for MapNode {
    const SIZE: usize = 28;
    fn parse(b: &[u8]) -> Self {
        let mut bbox = [[0i16; 4]; 2];
        for (j, side) in bbox.iter_mut().enumerate() {
            for (k, v) in side.iter_mut().enumerate() {
                *v = read_i16_le(b, 8 + j * 8 + k * 2);
            }
        }
        Self {
            x: read_i16_le(b, 0),
            y: read_i16_le(b, 2),
            dx: read_i16_le(b, 4),
            dy: read_i16_le(b, 6),
            bbox,
            children: [read_u16_le(b, 24), read_u16_le(b, 26)],
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.x, self.y, self.dx, self.dy] {
            push_i16(out, v);
        }
        for side in &self.bbox {
            for &v in side {
                push_i16(out, v);
            }
        }
        out.extend_from_slice(&self.children[0].to_le_bytes());
        out.extend_from_slice(&self.children[1].to_le_bytes());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapThing {
    pub x: i16,
    pub y: i16,
    pub angle: i16,
    pub thing_type: i16,
    pub options: i16,
}

impl MapThing {
    pub fn flags(&self) -> MapThingFlags {
        MapThingFlags::from_bits_truncate(self.options)
    }
}

impl MapRecord for MapThing {
    const SIZE: usize = 10;
    fn parse(b: &[u8]) -> Self {
        Self {
            x: read_i16_le(b, 0),
            y: read_i16_le(b, 2),
            angle: read_i16_le(b, 4),
            thing_type: read_i16_le(b, 6),
            options: read_i16_le(b, 8),
        }
    }
    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.x, self.y, self.angle, self.thing_type, self.options] {
            push_i16(out, v);
        }
    }
}

/// Serializes records into a lump body.
pub fn records_to_bytes<T: MapRecord>(records: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * T::SIZE);
    for r in records {
        r.write(&mut out);
    }
    out
}

// ============================================================
// Digital sound effects
// ============================================================

/// Header of a raw sound lump (DMX format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundHeader {
    pub format: u16,
    pub sample_rate: u16,
    /// Sample count including 16 pad bytes before and after.
    pub padded_length: u32,
}

pub const SOUND_HEADER_SIZE: usize = 8;
pub const SOUND_PAD: usize = 16;

impl SoundHeader {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SOUND_HEADER_SIZE {
            return None;
        }
        Some(Self {
            format: read_u16_le(data, 0),
            sample_rate: read_u16_le(data, 2),
            padded_length: read_u32_le(data, 4),
        })
    }

    /// The 8-bit PCM payload between the pads, clamped to the lump size.
    pub fn samples<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        let start = SOUND_HEADER_SIZE + SOUND_PAD;
        let end = (SOUND_HEADER_SIZE + self.padded_length as usize)
            .saturating_sub(SOUND_PAD)
            .min(data.len());
        if start >= end {
            &[]
        } else {
            &data[start..end]
        }
    }
}
