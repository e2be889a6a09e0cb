// w_wad.rs — WAD lump store
//
// Archives are merged into one flat, ordered lump directory. Name lookups scan
// backwards so lumps from later (patch) archives shadow earlier ones. Lump
// payloads are read from the still-open archive on first use and cached under
// a retention tag.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::common::{com_dprintf, com_printf, i_error};
use crate::doom_error::{DoomError, DoomResult};
use crate::wadfiles::{FileLump, WadInfo, WadKind, FILELUMP_SIZE, WADINFO_SIZE};

/// Below this many directory entries sequential parsing is faster.
const PARALLEL_DIRECTORY_THRESHOLD: usize = 64;

/// Any seekable byte stream can back an archive.
pub trait WadSource: Read + Seek + Send {}
impl<T: Read + Seek + Send> WadSource for T {}

// ============================================================
// Retention tags
// ============================================================

/// Tags at or above this level may be evicted.
pub const PU_PURGELEVEL: i32 = 100;

/// How long a cached payload must be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PuTag {
    /// Kept until the store is dropped.
    Static = 1,
    Sound = 2,
    Music = 3,
    /// Kept until the level exits.
    Level = 50,
    /// A special thinker in a level.
    LevSpec = 51,
    /// Purgable whenever needed.
    Cache = 101,
}

impl PuTag {
    pub fn evictable(self) -> bool {
        self as i32 >= PU_PURGELEVEL
    }
}

// ============================================================
// Directory entries
// ============================================================

#[derive(Debug, Clone)]
pub struct LumpInfo {
    /// Upper case, at most 8 characters.
    pub name: String,
    /// Index of the owning archive.
    pub archive: usize,
    pub position: u64,
    pub size: usize,
    pub tag: PuTag,
    cache: Option<Arc<[u8]>>,
}

impl LumpInfo {
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}

struct WadArchive {
    filename: String,
    /// `None` for a lone lump file.
    kind: Option<WadKind>,
    source: Box<dyn WadSource>,
}

/// The merged lump directory of every loaded archive.
pub struct LumpStore {
    archives: Vec<WadArchive>,
    lumps: Vec<LumpInfo>,
}

/// Lump names compare case-insensitively on at most 8 characters.
fn normalize_name(name: &str) -> String {
    name.chars().take(8).collect::<String>().to_ascii_uppercase()
}

impl LumpStore {
    fn empty() -> Self {
        Self {
            archives: Vec::new(),
            lumps: Vec::new(),
        }
    }

    // ============================================================
    // W_InitMultipleFiles
    // ============================================================

    /// Loads every file in order. Files that cannot be opened are reported and
    /// skipped; ending up with no lumps at all is fatal.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> DoomResult<Self> {
        com_printf("W_Init: Init WADfiles.\n");
        let mut store = Self::empty();
        for path in paths {
            store.add_file(path.as_ref())?;
        }
        store.finish()
    }

    /// Builds a store from already-open streams, e.g. in-memory archives.
    pub fn from_sources(sources: Vec<(String, Box<dyn WadSource>)>) -> DoomResult<Self> {
        let mut store = Self::empty();
        for (name, source) in sources {
            store.add_wad(&name, source)?;
        }
        store.finish()
    }

    /// A store over a single archive held in memory.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> DoomResult<Self> {
        let source: Box<dyn WadSource> = Box::new(std::io::Cursor::new(data));
        Self::from_sources(vec![(name.to_string(), source)])
    }

    fn finish(self) -> DoomResult<Self> {
        if self.lumps.is_empty() {
            return Err(i_error("W_InitFiles: no files found"));
        }
        Ok(self)
    }

    // ============================================================
    // W_AddFile
    // ============================================================

    fn add_file(&mut self, path: &Path) -> DoomResult<()> {
        let filename = path.to_string_lossy().to_string();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => {
                com_printf(&format!(" couldn't open {}\n", filename));
                return Ok(());
            }
        };

        let is_wad = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wad"))
            .unwrap_or(false);

        if is_wad {
            self.add_wad(&filename, Box::new(BufReader::new(file)))
        } else {
            // single lump file
            let size = file
                .metadata()
                .map_err(|source| DoomError::Io { path: filename.clone(), source })?
                .len() as usize;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            com_printf(&format!(" adding {}\n", filename));
            self.archives.push(WadArchive {
                filename,
                kind: None,
                source: Box::new(BufReader::new(file)),
            });
            self.lumps.push(LumpInfo {
                name: normalize_name(&stem),
                archive: self.archives.len() - 1,
                position: 0,
                size,
                tag: PuTag::Cache,
                cache: None,
            });
            Ok(())
        }
    }

    /// Parses the header and directory of one archive and appends its lumps.
    pub fn add_wad(&mut self, filename: &str, mut source: Box<dyn WadSource>) -> DoomResult<()> {
        let io_err = |source: io::Error| DoomError::Io { path: filename.to_string(), source };

        let mut header = [0u8; WADINFO_SIZE];
        source.seek(SeekFrom::Start(0)).map_err(io_err)?;
        source.read_exact(&mut header).map_err(io_err)?;

        let info = WadInfo::parse(&header).ok_or_else(|| {
            i_error(format!("Wad file {} doesn't have IWAD or PWAD id", filename))
        })?;
        if info.numlumps < 0 || info.infotableofs < 0 {
            return Err(i_error(format!(
                "Wad file {} has a bad directory ({} lumps at {})",
                filename, info.numlumps, info.infotableofs
            )));
        }

        let numlumps = info.numlumps as usize;
        let filelen = source.seek(SeekFrom::End(0)).map_err(io_err)?;
        let dirend = info.infotableofs as u64 + numlumps as u64 * FILELUMP_SIZE as u64;
        if dirend > filelen {
            return Err(i_error(format!(
                "Wad file {} has a bad directory ({} lumps at {}, file is {} bytes)",
                filename, info.numlumps, info.infotableofs, filelen
            )));
        }
        let mut directory = vec![0u8; numlumps * FILELUMP_SIZE];
        source
            .seek(SeekFrom::Start(info.infotableofs as u64))
            .map_err(io_err)?;
        source.read_exact(&mut directory).map_err(io_err)?;

        let entries: Vec<FileLump> = if numlumps >= PARALLEL_DIRECTORY_THRESHOLD {
            directory.par_chunks(FILELUMP_SIZE).map(FileLump::parse).collect()
        } else {
            directory.chunks(FILELUMP_SIZE).map(FileLump::parse).collect()
        };

        if let Some(bad) = entries.iter().find(|e| e.filepos < 0 || e.size < 0) {
            return Err(i_error(format!(
                "Wad file {}: lump {} has a negative offset or size",
                filename, bad.name
            )));
        }

        com_printf(&format!(" adding {}\n", filename));
        self.archives.push(WadArchive {
            filename: filename.to_string(),
            kind: Some(info.kind),
            source,
        });
        let archive = self.archives.len() - 1;
        self.lumps.extend(entries.into_iter().map(|e| LumpInfo {
            name: e.name,
            archive,
            position: e.filepos as u64,
            size: e.size as usize,
            tag: PuTag::Cache,
            cache: None,
        }));
        Ok(())
    }

    // ============================================================
    // Directory queries
    // ============================================================

    pub fn num_lumps(&self) -> usize {
        self.lumps.len()
    }

    pub fn lump_info(&self, lump: usize) -> Option<&LumpInfo> {
        self.lumps.get(lump)
    }

    pub fn lump_name(&self, lump: usize) -> Option<&str> {
        self.lumps.get(lump).map(|l| l.name.as_str())
    }

    /// Archive kind of the archive that holds `lump`.
    pub fn archive_kind(&self, lump: usize) -> Option<WadKind> {
        let l = self.lumps.get(lump)?;
        self.archives[l.archive].kind
    }

    pub fn archive_name(&self, lump: usize) -> Option<&str> {
        let l = self.lumps.get(lump)?;
        Some(self.archives[l.archive].filename.as_str())
    }

    /// Last lump with this name, or `None` (with a warning) when absent.
    pub fn check_num_for_name(&self, name: &str) -> Option<usize> {
        let found = self.lump_num_quiet(name);
        if found.is_none() {
            log::warn!("W_CheckNumForName: {} not found", normalize_name(name));
        }
        found
    }

    /// Probe for an optional lump; absence is not worth a warning.
    pub fn lump_num_quiet(&self, name: &str) -> Option<usize> {
        let key = normalize_name(name);
        self.lumps.iter().rposition(|l| l.name == key)
    }

    /// Like `check_num_for_name`, but a missing lump is fatal.
    pub fn get_num_for_name(&self, name: &str) -> DoomResult<usize> {
        match self.check_num_for_name(name) {
            Some(i) => Ok(i),
            None => {
                let err = DoomError::LumpNotFound(normalize_name(name));
                com_printf(&format!("Error: {}\n", err));
                Err(err)
            }
        }
    }

    pub fn lump_length(&self, lump: usize) -> DoomResult<usize> {
        self.lumps
            .get(lump)
            .map(|l| l.size)
            .ok_or_else(|| i_error(format!("W_LumpLength: {} >= numlumps", lump)))
    }

    // ============================================================
    // Payload access
    // ============================================================

    /// Returns the payload of `lump`, reading it on first use. A cached
    /// payload has its retention tag replaced by `tag`.
    pub fn cache_lump_num(&mut self, lump: usize, tag: PuTag) -> DoomResult<Arc<[u8]>> {
        let numlumps = self.lumps.len();
        let info = self
            .lumps
            .get_mut(lump)
            .ok_or_else(|| i_error(format!("W_CacheLumpNum: {} >= numlumps {}", lump, numlumps)))?;

        info.tag = tag;
        if let Some(ref data) = info.cache {
            return Ok(Arc::clone(data));
        }

        let archive = &mut self.archives[info.archive];
        let mut buf = vec![0u8; info.size];
        let read = archive
            .source
            .seek(SeekFrom::Start(info.position))
            .and_then(|_| archive.source.read_exact(&mut buf));
        if let Err(e) = read {
            return Err(i_error(format!(
                "W_ReadLump: couldn't read {} bytes of {} from {}: {}",
                info.size, info.name, archive.filename, e
            )));
        }

        com_dprintf(&format!("W_CacheLumpNum: read {} ({} bytes)\n", info.name, info.size));
        let data: Arc<[u8]> = Arc::from(buf);
        info.cache = Some(Arc::clone(&data));
        Ok(data)
    }

    pub fn cache_lump_name(&mut self, name: &str, tag: PuTag) -> DoomResult<Arc<[u8]>> {
        let lump = self.get_num_for_name(name)?;
        self.cache_lump_num(lump, tag)
    }

    pub fn is_cached(&self, lump: usize) -> bool {
        self.lumps.get(lump).map(LumpInfo::is_cached).unwrap_or(false)
    }

    pub fn change_tag(&mut self, lump: usize, tag: PuTag) {
        if let Some(l) = self.lumps.get_mut(lump) {
            l.tag = tag;
        }
    }

    /// Copies the payload of `lump` into `dest`, which must be large enough.
    pub fn read_lump(&mut self, lump: usize, dest: &mut [u8]) -> DoomResult<usize> {
        let data = self.cache_lump_num(lump, PuTag::Cache)?;
        if dest.len() < data.len() {
            return Err(i_error(format!(
                "W_ReadLump: buffer of {} bytes too small for lump {} ({} bytes)",
                dest.len(),
                lump,
                data.len()
            )));
        }
        dest[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    /// Drops every cached payload carrying exactly `tag`.
    pub fn purge_tag(&mut self, tag: PuTag) -> usize {
        self.free_tags(tag, tag)
    }

    /// Drops every cached payload whose tag lies in `low..=high`.
    pub fn free_tags(&mut self, low: PuTag, high: PuTag) -> usize {
        let mut freed = 0;
        for l in self.lumps.iter_mut() {
            if l.cache.is_some() && l.tag >= low && l.tag <= high {
                l.cache = None;
                freed += 1;
            }
        }
        freed
    }

    /// Drops every cached payload that is eligible for eviction.
    pub fn purge_evictable(&mut self) -> usize {
        let mut freed = 0;
        for l in self.lumps.iter_mut() {
            if l.cache.is_some() && l.tag.evictable() {
                l.cache = None;
                freed += 1;
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wadfiles::WadBuilder;
    use std::io::{Cursor, Write};

    fn source(bytes: Vec<u8>) -> Box<dyn WadSource> {
        Box::new(Cursor::new(bytes))
    }

    fn store_of(wads: Vec<Vec<u8>>) -> DoomResult<LumpStore> {
        LumpStore::from_sources(
            wads.into_iter()
                .enumerate()
                .map(|(i, w)| (format!("test{}.wad", i), source(w)))
                .collect(),
        )
    }

    #[test]
    fn test_later_archive_shadows_earlier() {
        let iwad = WadBuilder::new()
            .lump("PLAYPAL", vec![1])
            .lump("E1M1", vec![])
            .build(WadKind::Iwad);
        let pwad = WadBuilder::new().lump("playpal", vec![2, 2]).build(WadKind::Pwad);
        let mut store = store_of(vec![iwad, pwad]).unwrap();

        assert_eq!(store.num_lumps(), 3);
        let idx = store.check_num_for_name("PLAYPAL").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(store.archive_kind(idx), Some(WadKind::Pwad));
        assert_eq!(&*store.cache_lump_name("PlayPal", PuTag::Static).unwrap(), &[2, 2]);
    }

    #[test]
    fn test_empty_store_is_fatal() {
        let empty = WadBuilder::new().build(WadKind::Iwad);
        let err = store_of(vec![empty]).err().unwrap();
        assert!(err.is_fatal());

        let err = LumpStore::load::<&str>(&[]).err().unwrap();
        assert!(matches!(err, DoomError::Fatal(_)));
    }

    #[test]
    fn test_directory_past_end_of_file_is_fatal() {
        let mut wad = WadBuilder::new().lump("ONE", vec![9]).build(WadKind::Pwad);
        wad[4..8].copy_from_slice(&0x0fff_ffffi32.to_le_bytes());
        let err = store_of(vec![wad.clone()]).err().unwrap();
        assert!(matches!(err, DoomError::Fatal(ref m) if m.contains("bad directory")));

        // one entry short
        wad[4..8].copy_from_slice(&2i32.to_le_bytes());
        assert!(store_of(vec![wad]).err().unwrap().is_fatal());
    }

    #[test]
    fn test_single_lump_succeeds() {
        let wad = WadBuilder::new().lump("ONE", vec![9]).build(WadKind::Pwad);
        let store = store_of(vec![wad]).unwrap();
        assert_eq!(store.num_lumps(), 1);
        assert_eq!(store.lump_name(0), Some("ONE"));
    }

    #[test]
    fn test_missing_name() {
        let wad = WadBuilder::new().lump("ONE", vec![9]).build(WadKind::Pwad);
        let mut store = store_of(vec![wad]).unwrap();
        assert_eq!(store.check_num_for_name("TWO"), None);
        let err = store.cache_lump_name("TWO", PuTag::Cache).err().unwrap();
        assert!(matches!(err, DoomError::LumpNotFound(ref n) if n == "TWO"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_payload_is_lazy_and_cached() {
        let wad = WadBuilder::new()
            .lump("A", vec![1, 2, 3])
            .lump("B", vec![4, 5])
            .build(WadKind::Iwad);
        let mut store = store_of(vec![wad]).unwrap();
        assert!(!store.is_cached(0));
        assert!(!store.is_cached(1));

        let b = store.cache_lump_num(1, PuTag::Static).unwrap();
        assert_eq!(&*b, &[4, 5]);
        assert!(store.is_cached(1));
        assert!(!store.is_cached(0));

        // second access updates the tag only
        store.cache_lump_num(1, PuTag::Cache).unwrap();
        assert_eq!(store.lump_info(1).unwrap().tag, PuTag::Cache);
    }

    #[test]
    fn test_purge_respects_tags() {
        let wad = WadBuilder::new()
            .lump("KEEP", vec![1])
            .lump("DROP", vec![2])
            .build(WadKind::Iwad);
        let mut store = store_of(vec![wad]).unwrap();
        store.cache_lump_num(0, PuTag::Static).unwrap();
        store.cache_lump_num(1, PuTag::Cache).unwrap();

        assert_eq!(store.purge_evictable(), 1);
        assert!(store.is_cached(0));
        assert!(!store.is_cached(1));

        // re-read after eviction
        assert_eq!(&*store.cache_lump_num(1, PuTag::Level).unwrap(), &[2]);
        assert_eq!(store.free_tags(PuTag::Level, PuTag::LevSpec), 1);
        assert!(!store.is_cached(1));
        assert_eq!(store.purge_tag(PuTag::Static), 1);
        assert!(!store.is_cached(0));
    }

    #[test]
    fn test_read_lump_into_buffer() {
        let wad = WadBuilder::new().lump("A", vec![7, 8, 9]).build(WadKind::Iwad);
        let mut store = store_of(vec![wad]).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(store.read_lump(0, &mut buf).unwrap(), 3);
        assert_eq!(buf, [7, 8, 9, 0]);
        let mut small = [0u8; 2];
        assert!(store.read_lump(0, &mut small).is_err());
    }

    #[test]
    fn test_out_of_range_lump_is_fatal() {
        let wad = WadBuilder::new().lump("A", vec![1]).build(WadKind::Iwad);
        let mut store = store_of(vec![wad]).unwrap();
        assert!(store.cache_lump_num(5, PuTag::Cache).err().unwrap().is_fatal());
        assert!(store.lump_length(5).is_err());
    }

    #[test]
    fn test_bad_magic_is_fatal() {
        let mut wad = WadBuilder::new().lump("A", vec![1]).build(WadKind::Iwad);
        wad[..4].copy_from_slice(b"JUNK");
        let err = store_of(vec![wad]).err().unwrap();
        assert!(err.to_string().contains("doesn't have IWAD or PWAD id"));
    }

    #[test]
    fn test_truncated_lump_is_fatal() {
        let mut wad = WadBuilder::new().lump("A", vec![1, 2, 3, 4]).build(WadKind::Iwad);
        // point the lump past the end of the archive
        let dir = wad.len() - FILELUMP_SIZE;
        wad[dir..dir + 4].copy_from_slice(&1000i32.to_le_bytes());
        let mut store = store_of(vec![wad]).unwrap();
        assert!(store.cache_lump_num(0, PuTag::Cache).is_err());
    }

    #[test]
    fn test_large_directory_parses_in_order() {
        let mut b = WadBuilder::new();
        for i in 0..200 {
            b.add_lump(&format!("L{}", i), vec![i as u8]);
        }
        let mut store = store_of(vec![b.build(WadKind::Pwad)]).unwrap();
        assert_eq!(store.num_lumps(), 200);
        assert_eq!(store.lump_name(150), Some("L150"));
        assert_eq!(&*store.cache_lump_num(150, PuTag::Cache).unwrap(), &[150]);
    }

    #[test]
    fn test_load_from_files() {
        let dir = std::env::temp_dir();
        let wad_path = dir.join("rdoom_test_load_from_files.wad");
        let lmp_path = dir.join("rdoom_test_demo9.lmp");
        let missing = dir.join("rdoom_test_does_not_exist.wad");
        {
            let mut f = File::create(&wad_path).unwrap();
            f.write_all(&WadBuilder::new().lump("E1M1", vec![]).build(WadKind::Iwad))
                .unwrap();
            let mut f = File::create(&lmp_path).unwrap();
            f.write_all(&[1, 2, 3]).unwrap();
        }

        let mut store = LumpStore::load(&[&wad_path, &missing, &lmp_path]).unwrap();
        assert_eq!(store.num_lumps(), 2);
        let idx = store.get_num_for_name("RDOOM_TE").unwrap();
        assert_eq!(store.lump_length(idx).unwrap(), 3);
        assert_eq!(&*store.cache_lump_num(idx, PuTag::Static).unwrap(), &[1, 2, 3]);
        assert_eq!(store.archive_kind(idx), None);

        let _ = std::fs::remove_file(&wad_path);
        let _ = std::fs::remove_file(&lmp_path);
    }
}
