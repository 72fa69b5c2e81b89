use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use gitdir_types::ObjectId;
use gix_object::WriteTo;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Raw content (file contents).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// A snapshot of a root tree with its history.
    Commit,
    /// An annotated tag. Never part of a configuration.
    Tag,
}

impl ObjectKind {
    /// Lowercase name as git spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            other => Err(format!("unknown object kind: {other}")),
        }
    }
}

impl From<gix_object::Kind> for ObjectKind {
    fn from(kind: gix_object::Kind) -> Self {
        match kind {
            gix_object::Kind::Blob => Self::Blob,
            gix_object::Kind::Tree => Self::Tree,
            gix_object::Kind::Commit => Self::Commit,
            gix_object::Kind::Tag => Self::Tag,
        }
    }
}

impl From<ObjectKind> for gix_object::Kind {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Blob => Self::Blob,
            ObjectKind::Tree => Self::Tree,
            ObjectKind::Commit => Self::Commit,
            ObjectKind::Tag => Self::Tag,
        }
    }
}

/// A stored object: kind tag plus its canonical git encoding.
///
/// `StoredObject` is the unit of storage. Its id is computed by the
/// repository when written, never assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The object body, without the `<kind> <size>\0` header.
    pub data: Vec<u8>,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Size of `data` in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn expect_kind(&self, id: &ObjectId, expected: ObjectKind) -> StoreResult<()> {
        if self.kind != expected {
            return Err(StoreError::KindMismatch {
                id: *id,
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

fn corrupt(id: &ObjectId, reason: impl ToString) -> StoreError {
    StoreError::CorruptObject {
        id: *id,
        reason: reason.to_string(),
    }
}

fn convert_id(owner: &ObjectId, id: &gix_hash::oid) -> StoreResult<ObjectId> {
    ObjectId::from_gix(id).map_err(|e| corrupt(owner, e))
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw file contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode the object stored under `id`.
    pub fn decode(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(id, ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }

    /// The contents as UTF-8 text.
    pub fn as_utf8(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
    /// Submodule commit (0o160000).
    Submodule,
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Submodule => 0o160000,
        }
    }

    /// Whether the entry points at file content (a blob).
    pub fn is_file(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    fn from_gix(mode: gix_object::tree::EntryMode) -> Self {
        use gix_object::tree::EntryKind;
        match mode.kind() {
            EntryKind::Blob => Self::Regular,
            EntryKind::BlobExecutable => Self::Executable,
            EntryKind::Link => Self::Symlink,
            EntryKind::Tree => Self::Directory,
            EntryKind::Commit => Self::Submodule,
        }
    }

    fn to_gix(self) -> gix_object::tree::EntryMode {
        use gix_object::tree::EntryKind;
        let kind = match self {
            Self::Regular => EntryKind::Blob,
            Self::Executable => EntryKind::BlobExecutable,
            Self::Symlink => EntryKind::Link,
            Self::Directory => EntryKind::Tree,
            Self::Submodule => EntryKind::Commit,
        };
        kind.into()
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name (filename or directory name).
    pub name: String,
    /// Id of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// A regular file entry.
    pub fn file(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(EntryMode::Regular, name, object_id)
    }

    /// A subdirectory entry.
    pub fn dir(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(EntryMode::Directory, name, object_id)
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Directory listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Entries sorted by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries, sorted by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Encode as a git tree. Entries are written in git's tree order, which
    /// sorts a directory as if its name ended in `/`.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let mut entries: Vec<gix_object::tree::Entry> = self
            .entries
            .iter()
            .map(|entry| gix_object::tree::Entry {
                mode: entry.mode.to_gix(),
                filename: entry.name.as_str().into(),
                oid: entry.object_id.to_gix(),
            })
            .collect();
        entries.sort();

        let mut data = Vec::new();
        gix_object::Tree { entries }.write_to(&mut data)?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    /// Decode the object stored under `id`.
    pub fn decode(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(id, ObjectKind::Tree)?;
        let tree = gix_object::TreeRef::from_bytes(&obj.data).map_err(|e| corrupt(id, e))?;
        let mut entries = Vec::with_capacity(tree.entries.len());
        for entry in tree.entries {
            let name = std::str::from_utf8(entry.filename)
                .map_err(|_| corrupt(id, "entry name is not valid UTF-8"))?;
            entries.push(TreeEntry::new(
                EntryMode::from_gix(entry.mode),
                name,
                convert_id(id, entry.oid)?,
            ));
        }
        Ok(Self::new(entries))
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit: the root tree of a repository state plus its history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of this commit.
    pub tree: ObjectId,
    /// Parent commits, empty for a root commit.
    pub parents: Vec<ObjectId>,
    /// Commit message.
    pub message: String,
}

impl Commit {
    /// Decode the object stored under `id`.
    pub fn decode(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(id, ObjectKind::Commit)?;
        let commit = gix_object::CommitRef::from_bytes(&obj.data).map_err(|e| corrupt(id, e))?;
        let parents = commit
            .parents()
            .map(|parent| convert_id(id, &parent))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self {
            tree: convert_id(id, &commit.tree())?,
            parents,
            message: String::from_utf8_lossy(commit.message).into_owned(),
        })
    }
}

/// Encode a commit of `tree` on top of `parents`.
///
/// `identity` is the `Name <email>` used as both author and committer; the
/// timestamp is the current time in UTC.
pub fn encode_commit(
    tree: &ObjectId,
    parents: &[ObjectId],
    identity: &str,
    message: &str,
) -> StoredObject {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let mut text = format!("tree {tree}\n");
    for parent in parents {
        text.push_str(&format!("parent {parent}\n"));
    }
    text.push_str(&format!("author {identity} {seconds} +0000\n"));
    text.push_str(&format!("committer {identity} {seconds} +0000\n"));
    text.push('\n');
    text.push_str(message);
    if !message.ends_with('\n') {
        text.push('\n');
    }
    StoredObject::new(ObjectKind::Commit, text.into_bytes())
}
