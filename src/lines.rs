//! Whole-file output helpers: a buffered writer that only replaces its destination
//! on `commit`, and a line reader for rewriting existing txt exports.

use crate::util::{create_with_backoff, open_with_backoff, remove_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes to a sibling temp file; the destination is untouched until `commit`.
/// Dropping without committing removes the temp file.
pub struct AtomicWriter {
    tmp: PathBuf,
    dest: PathBuf,
    w: Option<BufWriter<File>>,
}

impl AtomicWriter {
    pub fn create(dest: &Path, buf_bytes: usize) -> Result<Self> {
        let tmp = tmp_path_for(dest);
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
            w: Some(BufWriter::with_capacity(buf_bytes.max(8 * 1024), f)),
        })
    }

    /// Write `s` followed by `\n`.
    pub fn write_line(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_all(b"\n")
    }

    /// Write `s` followed by `eol`.
    pub fn write_terminated(&mut self, s: &str, eol: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_all(eol.as_bytes())
    }

    /// Flush and move the temp file over the destination. On failure the temp
    /// file is removed and the destination is left as it was.
    pub fn commit(mut self) -> Result<PathBuf> {
        let w = self.w.take();
        match self.finish(w) {
            Ok(()) => Ok(self.dest.clone()),
            Err(e) => {
                let _ = remove_with_backoff(&self.tmp, 4, 20);
                Err(e)
            }
        }
    }

    fn finish(&self, w: Option<BufWriter<File>>) -> Result<()> {
        if let Some(w) = w {
            let f = w.into_inner().map_err(|e| e.into_error()).with_context(|| format!("flush {}", self.tmp.display()))?;
            f.sync_all().with_context(|| format!("sync {}", self.tmp.display()))?;
        }
        replace_file_atomic_backoff(&self.tmp, &self.dest)
    }
}

impl Write for AtomicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.w {
            Some(w) => w.write(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "writer already committed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.w {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if self.w.take().is_some() {
            let _ = remove_with_backoff(&self.tmp, 4, 20);
        }
    }
}

/// One line of a text file and the terminator that ended it:
/// `"\n"`, `"\r\n"`, or `""` for a final line without one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub eol: &'static str,
}

/// Read every line of `path`, keeping track of each line's terminator.
pub fn read_lines(path: &Path) -> Result<Vec<Line>> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = BufReader::new(f);
    let mut out = Vec::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        let n = rdr.read_line(&mut buf).with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        let eol = if buf.ends_with("\r\n") {
            "\r\n"
        } else if buf.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        buf.truncate(buf.len() - eol.len());
        out.push(Line { text: buf.clone(), eol });
    }
    Ok(out)
}
