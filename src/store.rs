use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scheduler::{BPM_MAX, BPM_MIN};

pub type TempoId = u64;
pub type SetlistId = u64;

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tempo {
    pub id:   TempoId,
    pub name: String,
    pub bpm:  u32,
    /// Non-owning back-reference to the owning setlist, if any.
    pub setlist: Option<SetlistId>,
    /// Position within its list (setlist or the unattached list).
    pub order: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Setlist {
    pub id:   SetlistId,
    pub name: String,
    /// Owning, ordered collection of tempo ids.
    pub tempos: Vec<TempoId>,
}

// ── Library ───────────────────────────────────────────────────────────────────

/// The persisted object graph: every saved tempo and setlist, plus the id
/// counter.  Serialized as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Library {
    next_id:  u64,
    tempos:   Vec<Tempo>,
    setlists: Vec<Setlist>,
}

impl Library {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ── Tempo CRUD ────────────────────────────────────────────────────────

    pub fn add_tempo(&mut self, name: &str, bpm: u32, setlist: Option<SetlistId>) -> TempoId {
        let id = self.alloc_id();
        let order = self.tempos_in(setlist).len() as u32;
        self.tempos.push(Tempo {
            id,
            name: name.to_string(),
            bpm: bpm.clamp(BPM_MIN, BPM_MAX),
            setlist,
            order,
        });
        if let Some(sid) = setlist {
            if let Some(s) = self.setlists.iter_mut().find(|s| s.id == sid) {
                s.tempos.push(id);
            }
        }
        id
    }

    pub fn tempo(&self, id: TempoId) -> Option<&Tempo> {
        self.tempos.iter().find(|t| t.id == id)
    }

    pub fn rename_tempo(&mut self, id: TempoId, name: &str) {
        if let Some(t) = self.tempos.iter_mut().find(|t| t.id == id) {
            t.name = name.to_string();
        }
    }

    pub fn delete_tempo(&mut self, id: TempoId) {
        let Some(pos) = self.tempos.iter().position(|t| t.id == id) else { return };
        let owner = self.tempos.remove(pos).setlist;
        if let Some(sid) = owner {
            if let Some(s) = self.setlists.iter_mut().find(|s| s.id == sid) {
                s.tempos.retain(|&tid| tid != id);
            }
        }
        self.reindex(owner);
    }

    /// Move a tempo to `new_index` within its list, shifting its siblings.
    pub fn move_tempo(&mut self, id: TempoId, new_index: usize) {
        let Some(owner) = self.tempo(id).map(|t| t.setlist) else { return };
        let mut siblings: Vec<TempoId> =
            self.tempos_in(owner).iter().map(|t| t.id).collect();
        let Some(from) = siblings.iter().position(|&tid| tid == id) else { return };
        let to = new_index.min(siblings.len() - 1);
        let moved = siblings.remove(from);
        siblings.insert(to, moved);

        for (order, tid) in siblings.iter().enumerate() {
            if let Some(t) = self.tempos.iter_mut().find(|t| t.id == *tid) {
                t.order = order as u32;
            }
        }
        if let Some(sid) = owner {
            if let Some(s) = self.setlists.iter_mut().find(|s| s.id == sid) {
                s.tempos = siblings;
            }
        }
    }

    /// Tempos in the given setlist (or unattached when `None`), sorted by
    /// their `order` field.
    pub fn tempos_in(&self, setlist: Option<SetlistId>) -> Vec<&Tempo> {
        let mut out: Vec<&Tempo> =
            self.tempos.iter().filter(|t| t.setlist == setlist).collect();
        out.sort_by_key(|t| t.order);
        out
    }

    // ── Setlist CRUD ──────────────────────────────────────────────────────

    pub fn add_setlist(&mut self, name: &str) -> SetlistId {
        let id = self.alloc_id();
        self.setlists.push(Setlist { id, name: name.to_string(), tempos: Vec::new() });
        id
    }

    pub fn setlist(&self, id: SetlistId) -> Option<&Setlist> {
        self.setlists.iter().find(|s| s.id == id)
    }

    pub fn setlists(&self) -> &[Setlist] {
        &self.setlists
    }

    pub fn rename_setlist(&mut self, id: SetlistId, name: &str) {
        if let Some(s) = self.setlists.iter_mut().find(|s| s.id == id) {
            s.name = name.to_string();
        }
    }

    /// Deleting a setlist cascades: its tempos are deleted with it.
    pub fn delete_setlist(&mut self, id: SetlistId) {
        let Some(pos) = self.setlists.iter().position(|s| s.id == id) else { return };
        self.setlists.remove(pos);
        self.tempos.retain(|t| t.setlist != Some(id));
    }

    /// Rewrite the `order` run of one list after a removal.
    fn reindex(&mut self, setlist: Option<SetlistId>) {
        let ids: Vec<TempoId> = self.tempos_in(setlist).iter().map(|t| t.id).collect();
        for (order, tid) in ids.iter().enumerate() {
            if let Some(t) = self.tempos.iter_mut().find(|t| t.id == *tid) {
                t.order = order as u32;
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))
    }
}

/// Per-user data file, e.g. `~/.local/share/tuipulse/library.json`.
pub fn default_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("tuipulse").join("library.json"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
