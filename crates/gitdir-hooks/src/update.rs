//! Ref update lines as git feeds them to `pre-receive` and `post-receive`.

use std::io::BufRead;

use gitdir_types::ObjectId;
use tracing::{debug, warn};

/// One `<old> <new> <ref>` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefUpdate {
    pub name: String,
    /// Zero when the ref is being created.
    pub old: ObjectId,
    /// Zero when the ref is being deleted.
    pub new: ObjectId,
}

impl RefUpdate {
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let old = fields.next()?.parse().ok()?;
        let new = fields.next()?.parse().ok()?;
        let name = fields.next()?.to_string();
        if fields.next().is_some() {
            return None;
        }
        Some(Self { name, old, new })
    }

    pub fn is_create(&self) -> bool {
        self.old.is_zero() && !self.new.is_zero()
    }

    pub fn is_delete(&self) -> bool {
        self.new.is_zero()
    }
}

/// Read every update line from `input`. Malformed lines are logged and
/// skipped.
pub fn read_updates(input: impl BufRead) -> std::io::Result<Vec<RefUpdate>> {
    let mut updates = Vec::new();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match RefUpdate::parse(&line) {
            Some(update) => {
                debug!(
                    reference = %update.name,
                    old = %update.old.short_hex(),
                    new = %update.new.short_hex(),
                    "ref update"
                );
                updates.push(update);
            }
            None => warn!(line = %line, "skipping malformed ref update line"),
        }
    }
    Ok(updates)
}
