//! Export a downloaded timeline to txt / json / csv, plus the txt reversal pass.

use crate::config::{ExportFormat, ExportOptions};
use crate::lines::{read_lines, AtomicWriter};
use crate::record::Timeline;
use crate::timecode::service_time_to_local;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const CSV_HEADER: [&str; 6] = ["plurk_id", "posted", "content", "content_raw", "response_count", "link"];

/// `<base>.<ext>`; the extension is appended, never substituted.
pub fn output_path(base: &Path, format: ExportFormat) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Write every requested format (duplicates collapse). Each file is fully rewritten.
/// Returns the written paths in txt, json, csv order.
pub fn export(timeline: &Timeline, base: &Path, formats: &[ExportFormat], opts: &ExportOptions) -> Result<Vec<PathBuf>> {
    let wanted: BTreeSet<ExportFormat> = formats.iter().copied().collect();
    let mut written = Vec::with_capacity(wanted.len());
    for format in wanted {
        let path = output_path(base, format);
        match format {
            ExportFormat::Txt => write_txt(timeline, &path, opts)?,
            ExportFormat::Json => write_json(timeline, &path, opts)?,
            ExportFormat::Csv => write_csv(timeline, &path, opts)?,
        }
        tracing::info!(path = %path.display(), posts = timeline.len(), "wrote {format}");
        written.push(path);
    }
    Ok(written)
}

/// Replace every line break (`\r\n`, `\n`, lone `\r`) with one space.
pub fn collapse_line_breaks(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Escape `\n` and `\r` into their two-character forms so a CSV row stays on one line.
pub fn escape_newlines(s: &str) -> String {
    s.replace('\n', "\\n").replace('\r', "\\r")
}

/// Inverse of `escape_newlines`.
pub fn unescape_newlines(s: &str) -> String {
    s.replace("\\r", "\r").replace("\\n", "\n")
}

/// One txt line: `seq==id==local time==content==link`.
pub fn txt_line(seq: usize, record: &crate::record::PostRecord, opts: &ExportOptions) -> Result<String> {
    let local = service_time_to_local(&record.posted, opts.zone)?;
    Ok(format!(
        "{seq:05}=={}=={local}=={}=={}",
        record.plurk_id,
        collapse_line_breaks(&record.content_raw),
        record.link
    ))
}

pub fn write_txt(timeline: &Timeline, path: &Path, opts: &ExportOptions) -> Result<()> {
    let mut w = AtomicWriter::create(path, opts.write_buffer_bytes)?;
    for (i, record) in timeline.iter().enumerate() {
        let line = txt_line(i + 1, record, opts).with_context(|| format!("plurk {}", record.plurk_id))?;
        w.write_line(&line)?;
    }
    w.commit()?;
    Ok(())
}

pub fn write_json(timeline: &Timeline, path: &Path, opts: &ExportOptions) -> Result<()> {
    let mut w = AtomicWriter::create(path, opts.write_buffer_bytes)?;
    serde_json::to_writer_pretty(&mut w, timeline).with_context(|| format!("serialize {}", path.display()))?;
    w.write_all(b"\n")?;
    w.commit()?;
    Ok(())
}

pub fn write_csv(timeline: &Timeline, path: &Path, opts: &ExportOptions) -> Result<()> {
    let w = AtomicWriter::create(path, opts.write_buffer_bytes)?;
    let mut out = csv::Writer::from_writer(w);
    out.write_record(CSV_HEADER)?;
    for r in timeline.iter() {
        out.write_record([
            r.plurk_id.to_string(),
            r.posted.clone(),
            escape_newlines(&r.content),
            escape_newlines(&r.content_raw),
            r.response_count.to_string(),
            r.link.clone(),
        ])?;
    }
    let w = out.into_inner().map_err(|e| e.into_error()).with_context(|| format!("flush {}", path.display()))?;
    w.commit()?;
    Ok(())
}

fn leading_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+").expect("static regex"))
}

/// Reverse the line order of a txt export and renumber the leading sequence
/// (`00001`, `00002`, ...). The rest of every line is kept byte for byte, line
/// terminator included; a final line without one takes the file's first terminator.
/// Returns the number of lines written.
pub fn reverse_txt_file(path: &Path) -> Result<usize> {
    let mut lines = read_lines(path)?;
    let fallback = lines.first().map(|l| l.eol).filter(|eol| !eol.is_empty()).unwrap_or("\n");
    lines.reverse();

    let mut w = AtomicWriter::create(path, 64 * 1024)?;
    for (i, line) in lines.iter().enumerate() {
        let seq = format!("{:05}", i + 1);
        let eol = if line.eol.is_empty() { fallback } else { line.eol };
        w.write_terminated(&leading_digits().replace(&line.text, seq.as_str()), eol)?;
    }
    w.commit()?;
    tracing::info!(path = %path.display(), lines = lines.len(), "reversed txt export");
    Ok(lines.len())
}
