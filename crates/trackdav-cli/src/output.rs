//! Human and JSON output for CLI commands
//!
//! Besides plain status lines, the formatters know how to render the three
//! things trackdav prints most: remote folder listings, the offline queue
//! and the outcome of a queue flush. The line and document builders are
//! plain functions so both formatters share them.

use std::path::Path;

use serde_json::{json, Value};
use trackdav_core::domain::RemoteFolder;
use trackdav_sync::offline_queue::{OfflineQueue, QueueEntry};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// What `trackdav queue` shows: totals plus the oldest entries
pub struct QueueView<'a> {
    pub path: &'a Path,
    pub pending: usize,
    pub capacity: usize,
    pub shown: &'a [QueueEntry],
}

impl<'a> QueueView<'a> {
    pub fn new(path: &'a Path, queue: &OfflineQueue, shown: &'a [QueueEntry]) -> Self {
        Self {
            path,
            pending: queue.len(),
            capacity: queue.capacity(),
            shown,
        }
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &Value);

    /// Prints the children of a remote folder
    fn folder(&self, folder: &RemoteFolder);
    /// Prints the offline queue summary
    fn queue(&self, view: &QueueView<'_>);
    /// Prints how many queued uploads were delivered and how many remain
    fn flush(&self, flushed: usize, remaining: usize);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &Value) {}

    fn folder(&self, folder: &RemoteFolder) {
        for line in folder_lines(folder) {
            self.info(&line);
        }
    }

    fn queue(&self, view: &QueueView<'_>) {
        if view.pending == 0 {
            self.success("Offline queue is empty");
            return;
        }
        self.warn(&format!(
            "{} pending upload(s) (capacity {})",
            view.pending, view.capacity
        ));
        for line in queue_lines(view) {
            self.info(&line);
        }
    }

    fn flush(&self, flushed: usize, remaining: usize) {
        match (flushed, remaining) {
            (0, 0) => self.success("Offline queue is empty, nothing to flush"),
            (n, 0) => self.success(&format!("Flushed {n} queued upload(s)")),
            (n, left) => self.warn(&format!(
                "Flushed {n} queued upload(s), {left} still pending"
            )),
        }
    }
}

/// JSON output formatter
///
/// Only `print_json` writes to stdout, so command output stays a single
/// parseable document.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}
    fn error(&self, message: &str) {
        eprintln!("{}", json!({"success": false, "error": message}));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", json!({"level": "warning", "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }

    fn folder(&self, folder: &RemoteFolder) {
        self.print_json(&folder_json(folder));
    }

    fn queue(&self, view: &QueueView<'_>) {
        self.print_json(&queue_json(view));
    }

    fn flush(&self, flushed: usize, remaining: usize) {
        self.print_json(&json!({"flushed": flushed, "remaining": remaining}));
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}

/// Folders get a trailing `/`, followed by a blank line and the totals
pub fn folder_lines(folder: &RemoteFolder) -> Vec<String> {
    if folder.is_empty() {
        return vec![format!("{} is empty", folder.path())];
    }
    let mut lines: Vec<String> = folder
        .elements()
        .iter()
        .map(|e| {
            if e.is_folder {
                format!("{}/", e.name)
            } else {
                e.name.clone()
            }
        })
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "{} file(s), {} folder(s)",
        folder.files().count(),
        folder.folders().count()
    ));
    lines
}

pub fn folder_json(folder: &RemoteFolder) -> Value {
    json!({
        "path": folder.path(),
        "elements": folder
            .elements()
            .iter()
            .map(|e| json!({"name": e.name, "is_folder": e.is_folder}))
            .collect::<Vec<_>>(),
    })
}

/// One line per shown entry, plus a note about entries left out
pub fn queue_lines(view: &QueueView<'_>) -> Vec<String> {
    let mut lines: Vec<String> = view
        .shown
        .iter()
        .map(|entry| {
            format!(
                "#{:<5} {}  queued {}",
                entry.id,
                entry.remote_path,
                entry.enqueued_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        })
        .collect();
    if view.pending > view.shown.len() {
        lines.push(format!("... and {} more", view.pending - view.shown.len()));
    }
    lines
}

pub fn queue_json(view: &QueueView<'_>) -> Value {
    json!({
        "path": view.path.display().to_string(),
        "pending": view.pending,
        "capacity": view.capacity,
        "entries": view.shown,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use trackdav_core::domain::RemoteElement;

    use super::*;

    fn queue_of(n: usize) -> OfflineQueue {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let mut queue = OfflineQueue::new(10);
        for i in 0..n {
            queue.push(format!("2026-05-01T08-00-0{i}.000Z.json"), "{}", at);
        }
        queue
    }

    #[test]
    fn test_folder_lines_mark_folders_and_count() {
        let folder = RemoteFolder::from_children(
            "2026/",
            vec![RemoteElement::file("a.json"), RemoteElement::folder("may")],
        );
        assert_eq!(
            folder_lines(&folder),
            vec!["a.json", "may/", "", "1 file(s), 1 folder(s)"]
        );
    }

    #[test]
    fn test_empty_folder_line() {
        let folder = RemoteFolder::from_children("2026/", vec![]);
        assert_eq!(folder_lines(&folder), vec!["2026/ is empty"]);
    }

    #[test]
    fn test_folder_json() {
        let folder = RemoteFolder::from_children(
            "/2026/",
            vec![RemoteElement::file("b.json"), RemoteElement::folder("a")],
        );
        let json = folder_json(&folder);
        assert_eq!(json["path"], "/2026/");
        assert_eq!(json["elements"][0]["name"], "a");
        assert_eq!(json["elements"][0]["is_folder"], true);
        assert_eq!(json["elements"][1]["name"], "b.json");
    }

    #[test]
    fn test_queue_lines_note_hidden_entries() {
        let queue = queue_of(3);
        let shown = queue.peek_oldest(2);
        let view = QueueView::new(Path::new("/tmp/q.json"), &queue, &shown);

        let lines = queue_lines(&view);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#1"));
        assert!(lines[0].contains("2026-05-01T08-00-00.000Z.json"));
        assert!(lines[0].ends_with("queued 2026-05-01 08:00:00 UTC"));
        assert_eq!(lines[2], "... and 1 more");
    }

    #[test]
    fn test_queue_json() {
        let queue = queue_of(2);
        let shown = queue.peek_oldest(20);
        let view = QueueView::new(Path::new("/tmp/q.json"), &queue, &shown);

        let json = queue_json(&view);
        assert_eq!(json["pending"], 2);
        assert_eq!(json["capacity"], 10);
        assert_eq!(json["entries"][1]["id"], 2);
        assert_eq!(json["path"], "/tmp/q.json");
    }
}
