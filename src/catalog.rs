//! Program catalog and loading.
//!
//! The catalog is a JSON list of `{ "title", "file" }` entries; file paths
//! are relative to the catalog's own directory. Programs are read whole on a
//! background thread and handed back through a channel, so a slow read never
//! holds up a frame and a failed read never touches the running program.

use log::{debug, error, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{CatalogError, LoadError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub file: String,
}

/// immutable once built; replaced wholesale
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    root: PathBuf,
}

impl Catalog {
    pub fn from_entries(entries: Vec<CatalogEntry>, root: &Path) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Catalog {
            entries,
            root: root.to_path_buf(),
        })
    }

    pub fn parse(json: &str, root: &Path) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries, root)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&json, root)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn path_of(&self, entry: &CatalogEntry) -> PathBuf {
        self.root.join(&entry.file)
    }
}

/// a complete program, ready for the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    pub title: String,
    pub bytes: Vec<u8>,
}

struct Completed {
    generation: u64,
    title: String,
    result: Result<Vec<u8>, LoadError>,
}

/// reads program files off the frame loop's thread
pub struct ProgramLoader {
    sender: Sender<Completed>,
    receiver: Receiver<Completed>,
    generation: u64,
    pending: bool,
}

impl ProgramLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        ProgramLoader {
            sender,
            receiver,
            generation: 0,
            pending: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// start reading `path`; supersedes any fetch still in flight
    pub fn fetch(&mut self, title: &str, path: PathBuf) {
        self.generation += 1;
        self.pending = true;
        let generation = self.generation;
        let title = title.to_string();
        let sender = self.sender.clone();
        debug!("fetching {} from {}", title, path.display());
        thread::spawn(move || {
            let result = read_program(&path);
            // NB. the loader may have been dropped; nothing left to tell
            let _ = sender.send(Completed {
                generation,
                title,
                result,
            });
        });
    }

    /// the latest fetch's outcome, if it has finished
    pub fn poll(&mut self) -> Option<Result<LoadedProgram, LoadError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(completed) => {
                    if let Some(outcome) = self.accept(completed) {
                        return Some(outcome);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// block up to `timeout` for the latest fetch to finish
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<LoadedProgram, LoadError>> {
        let deadline = Instant::now() + timeout;
        while self.pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completed) => {
                    if let Some(outcome) = self.accept(completed) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
        None
    }

    fn accept(&mut self, completed: Completed) -> Option<Result<LoadedProgram, LoadError>> {
        if completed.generation != self.generation {
            debug!("dropping superseded load of {}", completed.title);
            return None;
        }
        self.pending = false;
        Some(completed.result.map(|bytes| LoadedProgram {
            title: completed.title,
            bytes,
        }))
    }
}

impl Default for ProgramLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// one bulk read; an empty file is as good as a missing one
fn read_program(path: &Path) -> Result<Vec<u8>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(bytes)
}

/// the catalog plus a cursor, and the loader for whatever gets selected
#[derive(Default)]
pub struct CatalogSelector {
    catalog: Option<Catalog>,
    cursor: usize,
    selected: Option<usize>,
    loader: ProgramLoader,
}

impl CatalogSelector {
    pub fn new() -> Self {
        CatalogSelector::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        match &self.catalog {
            Some(catalog) => catalog.entries(),
            None => &[],
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// read and install a catalog file; on failure the old catalog stays
    pub fn load_catalog(&mut self, path: &Path) -> Result<(), CatalogError> {
        match Catalog::load(path) {
            Ok(catalog) => {
                self.set_catalog(catalog);
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// replace the catalog; a single entry is selected straight away
    pub fn set_catalog(&mut self, catalog: Catalog) {
        info!("catalog has {} programs", catalog.entries().len());
        let single = catalog.entries().len() == 1;
        self.catalog = Some(catalog);
        self.cursor = 0;
        self.selected = None;
        if single {
            self.select(0);
        }
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.entries().len() {
            self.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn load_selected(&mut self) -> bool {
        self.select(self.cursor)
    }

    /// start fetching entry `index`; false if there is no such entry
    pub fn select(&mut self, index: usize) -> bool {
        let Some(catalog) = &self.catalog else {
            return false;
        };
        let Some(entry) = catalog.entries().get(index) else {
            return false;
        };
        let path = catalog.path_of(entry);
        self.loader.fetch(&entry.title, path);
        self.cursor = index;
        self.selected = Some(index);
        true
    }

    pub fn poll(&mut self) -> Option<Result<LoadedProgram, LoadError>> {
        self.loader.poll()
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<Result<LoadedProgram, LoadError>> {
        self.loader.wait(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn entry(title: &str, file: &str) -> CatalogEntry {
        CatalogEntry {
            title: title.to_string(),
            file: file.to_string(),
        }
    }

    #[test]
    fn test_parse_catalog() -> Result<(), CatalogError> {
        let json = r#"[{"title": "Puzzle", "file": "Puzzle.ch8"}, {"title": "Maze", "file": "maze.ch8"}]"#;
        let catalog = Catalog::parse(json, Path::new("programs"))?;
        assert_eq!(catalog.entries().len(), 2);
        assert_eq!(catalog.entries()[1], entry("Maze", "maze.ch8"));
        assert_eq!(
            catalog.path_of(&catalog.entries()[0]),
            Path::new("programs").join("Puzzle.ch8")
        );
        Ok(())
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        assert!(matches!(
            Catalog::parse("[]", Path::new(".")),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_non_list_catalog_is_malformed() {
        assert!(matches!(
            Catalog::parse(r#"{"title": "Puzzle", "file": "Puzzle.ch8"}"#, Path::new(".")),
            Err(CatalogError::Malformed(_))
        ));
        assert!(matches!(
            Catalog::parse(r#"[{"title": 3}]"#, Path::new(".")),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_catalog_file() {
        let dir = TempDir::new().expect("tempdir");
        let result = Catalog::load(&dir.path().join("catalog.json"));
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }

    #[test]
    fn test_single_entry_catalog_loads_itself() -> Result<(), io::Error> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("pong.ch8"), [0x00, 0xe0, 0x12, 0x00])?;
        fs::write(
            dir.path().join("catalog.json"),
            r#"[{"title": "Pong", "file": "pong.ch8"}]"#,
        )?;

        let mut selector = CatalogSelector::new();
        selector
            .load_catalog(&dir.path().join("catalog.json"))
            .expect("catalog");
        assert_eq!(selector.selected(), Some(0));
        assert!(selector.is_loading());

        let program = selector.wait(TIMEOUT).expect("finished").expect("loaded");
        assert_eq!(program.title, "Pong");
        assert_eq!(program.bytes, vec![0x00, 0xe0, 0x12, 0x00]);
        assert!(!selector.is_loading());
        Ok(())
    }

    #[test]
    fn test_failed_catalog_keeps_previous() -> Result<(), io::Error> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("empty.json"), "[]")?;

        let mut selector = CatalogSelector::new();
        let catalog = Catalog::from_entries(
            vec![entry("A", "a.ch8"), entry("B", "b.ch8")],
            dir.path(),
        )
        .expect("catalog");
        selector.set_catalog(catalog);
        assert_eq!(selector.selected(), None);

        assert!(selector.load_catalog(&dir.path().join("empty.json")).is_err());
        assert_eq!(selector.entries().len(), 2);
        Ok(())
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut selector = CatalogSelector::new();
        selector.set_catalog(
            Catalog::from_entries(vec![entry("A", "a"), entry("B", "b")], Path::new("."))
                .expect("catalog"),
        );
        selector.select_previous();
        assert_eq!(selector.cursor(), 0);
        selector.select_next();
        selector.select_next();
        assert_eq!(selector.cursor(), 1);
    }

    #[test]
    fn test_missing_program_reports_error() -> Result<(), io::Error> {
        let dir = TempDir::new()?;
        let mut selector = CatalogSelector::new();
        selector.set_catalog(
            Catalog::from_entries(vec![entry("Gone", "gone.ch8")], dir.path())
                .expect("catalog"),
        );
        let outcome = selector.wait(TIMEOUT).expect("finished");
        assert!(matches!(outcome, Err(LoadError::Read { .. })));
        Ok(())
    }

    #[test]
    fn test_empty_program_is_rejected() -> Result<(), io::Error> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("blank.ch8"), [0u8; 0])?;
        let mut loader = ProgramLoader::new();
        loader.fetch("Blank", dir.path().join("blank.ch8"));
        let outcome = loader.wait(TIMEOUT).expect("finished");
        assert!(matches!(outcome, Err(LoadError::Empty(_))));
        Ok(())
    }

    #[test]
    fn test_only_latest_fetch_is_delivered() -> Result<(), io::Error> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("first.ch8"), [0x01])?;
        fs::write(dir.path().join("second.ch8"), [0x02])?;

        let mut loader = ProgramLoader::new();
        loader.fetch("First", dir.path().join("first.ch8"));
        loader.fetch("Second", dir.path().join("second.ch8"));
        let program = loader.wait(TIMEOUT).expect("finished").expect("loaded");
        assert_eq!(program.title, "Second");
        assert_eq!(program.bytes, vec![0x02]);

        // the first fetch may still arrive; it is dropped
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
        Ok(())
    }
}
