//! Output file placement.
//!
//! All pages of a run go through one [`OutputWriter`], which owns the set of
//! paths already written so two pages never land on the same file.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Where converted pages go.
#[derive(Debug)]
pub struct OutputWriter {
    outdir: PathBuf,
    to_stdout: bool,
    written: HashSet<PathBuf>,
}

impl OutputWriter {
    pub fn new(outdir: impl Into<PathBuf>, to_stdout: bool) -> Self {
        Self { outdir: outdir.into(), to_stdout, written: HashSet::new() }
    }

    /// Writes `markdown` under `filename` and returns the path used, or
    /// `None` when writing to stdout.
    pub fn write(&mut self, filename: &str, markdown: &str) -> anyhow::Result<Option<PathBuf>> {
        if self.to_stdout {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", markdown).context("Failed to write to stdout")?;
            return Ok(None);
        }

        let path = self.claim(filename);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, markdown).with_context(|| format!("Failed to write to file: {}", path.display()))?;
        Ok(Some(path))
    }

    /// Reserves a path for `filename`, suffixing `_1`, `_2`, ... on collision.
    fn claim(&mut self, filename: &str) -> PathBuf {
        let base = self.outdir.join(filename);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.written.contains(&candidate) {
            candidate = suffixed(&base, n);
            n += 1;
        }
        self.written.insert(candidate.clone());
        candidate
    }
}

fn suffixed(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}
