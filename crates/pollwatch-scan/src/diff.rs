//! Snapshot comparison.

use pollwatch_core::{Event, Operation, Snapshot};

/// Events produced by comparing two snapshots of one root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// File-level events followed by at most one root-changed event.
    pub events: Vec<Event>,
    /// Whether any file-level event was produced.
    pub root_changed: bool,
}

impl DiffOutcome {
    /// Number of events of the given kind.
    pub fn count(&self, operation: Operation) -> usize {
        self.events
            .iter()
            .filter(|event| event.operation == operation)
            .count()
    }

    /// Check if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Compute the events that turn `old` into `new`.
///
/// Created and updated files are reported before deleted ones, but callers
/// must not rely on the order among file-level events. When at least one
/// file-level event exists, a single [`Operation::RootChanged`] event for
/// the root of `new` comes last.
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffOutcome {
    let mut events = Vec::new();

    for info in new {
        match old.get(&info.full_path) {
            None => events.push(Event::created(&info.full_path)),
            Some(previous) if previous.differs_from(info) => {
                events.push(Event::updated(&info.full_path))
            }
            Some(_) => {}
        }
    }

    events.extend(
        old.paths()
            .filter(|path| !new.contains(path))
            .map(Event::deleted),
    );

    let root_changed = !events.is_empty();
    if root_changed {
        events.push(Event::root_changed(new.root()));
    }

    DiffOutcome {
        events,
        root_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollwatch_core::FileInfo;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    fn snapshot(files: &[(&str, u64, SystemTime)]) -> Snapshot {
        let mut snapshot = Snapshot::new("/root");
        for (path, size, modified) in files {
            let name = Path::new(path).file_name().unwrap().to_string_lossy();
            snapshot.insert(FileInfo::new(*path, name.to_string(), *size, *modified));
        }
        snapshot
    }

    #[test]
    fn test_unchanged_produces_nothing() {
        let t0 = SystemTime::now();
        let old = snapshot(&[("/root/f", 10, t0), ("/root/g", 3, t0)]);

        let outcome = diff(&old, &old.clone());
        assert!(outcome.is_empty());
        assert!(!outcome.root_changed);
    }

    #[test]
    fn test_update_on_modtime() {
        let t0 = SystemTime::now();
        let t1 = t0 + Duration::from_secs(5);
        let old = snapshot(&[("/root/f", 10, t0)]);
        let new = snapshot(&[("/root/f", 10, t1)]);

        let outcome = diff(&old, &new);
        assert_eq!(outcome.count(Operation::Updated), 1);
        assert_eq!(outcome.count(Operation::Created), 0);
        assert_eq!(outcome.count(Operation::Deleted), 0);
        assert_eq!(outcome.events[0], Event::updated("/root/f"));
    }

    #[test]
    fn test_update_on_size() {
        let t0 = SystemTime::now();
        let old = snapshot(&[("/root/f", 10, t0)]);
        let new = snapshot(&[("/root/f", 11, t0)]);

        assert_eq!(diff(&old, &new).count(Operation::Updated), 1);
    }

    #[test]
    fn test_delete() {
        let t0 = SystemTime::now();
        let old = snapshot(&[("/root/f", 1, t0), ("/root/g", 1, t0)]);
        let new = snapshot(&[("/root/f", 1, t0)]);

        let outcome = diff(&old, &new);
        assert_eq!(outcome.count(Operation::Deleted), 1);
        assert_eq!(outcome.count(Operation::Created), 0);
        assert_eq!(outcome.count(Operation::Updated), 0);
        assert!(outcome.events.contains(&Event::deleted("/root/g")));
    }

    #[test]
    fn test_mixed_changes_end_with_root_changed() {
        let t0 = SystemTime::now();
        let t1 = t0 + Duration::from_secs(1);
        let old = snapshot(&[
            ("/root/kept", 1, t0),
            ("/root/edited", 1, t0),
            ("/root/gone", 1, t0),
        ]);
        let new = snapshot(&[
            ("/root/kept", 1, t0),
            ("/root/edited", 1, t1),
            ("/root/new", 1, t0),
        ]);

        let outcome = diff(&old, &new);
        assert!(outcome.root_changed);
        assert_eq!(outcome.count(Operation::Created), 1);
        assert_eq!(outcome.count(Operation::Updated), 1);
        assert_eq!(outcome.count(Operation::Deleted), 1);
        assert_eq!(outcome.count(Operation::RootChanged), 1);
        assert_eq!(outcome.events.last(), Some(&Event::root_changed("/root")));
    }

    #[test]
    fn test_from_empty_reports_created() {
        let t0 = SystemTime::now();
        let new = snapshot(&[("/root/a", 1, t0), ("/root/b", 2, t0)]);

        let outcome = diff(&Snapshot::new("/root"), &new);
        assert_eq!(outcome.count(Operation::Created), 2);
        assert_eq!(outcome.events.len(), 3);
    }
}
