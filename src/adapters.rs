//! Host collaborators for the CLI: a note file as the editor, notices on stdout.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use multiai_core::{Editor, Notifier};
use tracing::info;

/// A Markdown note file standing in for the note editor.
///
/// The selection is an optional line range. Changes are written back immediately.
pub(crate) struct NoteFileEditor {
    path: PathBuf,
    content: String,
    selection: Option<Range<usize>>,
}

impl NoteFileEditor {
    pub(crate) fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        Ok(Self {
            path,
            content,
            selection: None,
        })
    }

    /// Select lines `first..=last` (1-based). Lines past the end are clamped.
    pub(crate) fn select_lines(&mut self, first: usize, last: usize) {
        let mut starts: Vec<usize> = std::iter::once(0)
            .chain(self.content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        starts.push(self.content.len());

        let start = starts[(first.max(1) - 1).min(starts.len() - 1)];
        let end = starts[last.min(starts.len() - 1)];
        self.selection = (start < end).then_some(start..end);
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> io::Result<()> {
        fs::write(&self.path, &self.content)
    }
}

impl Editor for NoteFileEditor {
    fn selection(&self) -> String {
        self.selection
            .clone()
            .map(|range| self.content[range].to_string())
            .unwrap_or_default()
    }

    fn document(&self) -> String {
        self.content.clone()
    }

    fn replace_selection(&mut self, replacement: &str) -> io::Result<()> {
        if let Some(range) = self.selection.take() {
            self.content.replace_range(range, replacement);
            self.save()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.content.clear();
        self.selection = None;
        self.save()
    }
}

/// Parse `A:B`, `A-B` or a single line number.
pub(crate) fn parse_line_range(spec: &str) -> Result<(usize, usize), String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid line number: {}", s.trim()))
    };
    let (first, last) = match spec.split_once([':', '-']) {
        Some((a, b)) => (parse(a)?, parse(b)?),
        None => {
            let n = parse(spec)?;
            (n, n)
        }
    };
    if first > last {
        return Err(format!("empty line range: {}", spec));
    }
    Ok((first, last))
}

/// Prints notices for the user.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        info!(target: "notice", "{}", message);
        println!("{}", message);
    }
}
