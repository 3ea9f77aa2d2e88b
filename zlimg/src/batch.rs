//! Input expansion and batch reporting.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which files a directory walk or glob picks up.
#[derive(Clone, Copy, Debug)]
pub enum InputKind {
    /// PNG sources for `encode` and `anim`.
    Png,
    /// Container files for `info`.
    Container,
}

impl InputKind {
    fn matches(self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        match self {
            InputKind::Png => ext.eq_ignore_ascii_case("png"),
            InputKind::Container => zenloop::is_supported_extension(ext),
        }
    }
}

/// Expand patterns into a deduplicated file list.
///
/// Globs and directories only yield files of `kind`; paths given
/// verbatim are taken as they are. With `by_size`, the list is sorted by
/// file size descending for better parallel load balancing, otherwise it
/// keeps pattern order with glob matches sorted by name.
pub fn expand_inputs(
    patterns: &[String],
    kind: InputKind,
    by_size: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut add = |path: PathBuf, files: &mut Vec<PathBuf>| {
        if let Ok(canonical) = path.canonicalize() {
            if seen.insert(canonical) {
                files.push(path);
            }
        }
    };

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched: Vec<PathBuf> = glob::glob(pattern)?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|p| p.is_file() && kind.matches(p))
                .collect();
            matched.sort();
            for path in matched {
                add(path, &mut files);
            }
        } else {
            let path = PathBuf::from(pattern);
            if path.is_dir() {
                let mut found = Vec::new();
                collect_dir(&path, kind, &mut found);
                found.sort();
                for path in found {
                    add(path, &mut files);
                }
            } else if path.is_file() {
                add(path, &mut files);
            } else {
                anyhow::bail!("not a file or directory: {}", path.display());
            }
        }
    }

    if by_size {
        files.sort_by_key(|p| std::cmp::Reverse(p.metadata().map(|m| m.len()).unwrap_or(0)));
    }
    Ok(files)
}

fn collect_dir(dir: &Path, kind: InputKind, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_dir(&path, kind, out);
        } else if path.is_file() && kind.matches(&path) {
            out.push(path);
        }
    }
}

/// Outcome of one file in a batch.
#[derive(Debug)]
pub struct FileResult {
    pub input_path: PathBuf,
    pub input_size: u64,
    pub output_size: Option<u64>,
    pub output_path: Option<PathBuf>,
    /// Bitstream the encoder settled on.
    pub format: Option<zenloop::BitstreamFormat>,
    pub skipped: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

impl FileResult {
    fn status(&self) -> &'static str {
        if self.error.is_some() {
            "error"
        } else if self.skipped {
            "skipped"
        } else {
            "ok"
        }
    }

    fn change_pct(&self) -> Option<f64> {
        let out = self.output_size?;
        let input = self.input_size as f64;
        (self.input_size > 0).then(|| (out as f64 - input) / input * 100.0)
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    pub fn push(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    /// Print a human-readable summary table.
    pub fn print_report(&self) {
        if self.results.is_empty() {
            println!("No files processed.");
            return;
        }
        println!(
            "{:<36} {:>10} {:>10} {:>8} {:>9} {:>8}",
            "File", "Input", "Output", "Change", "Bitstream", "Time"
        );
        println!("{}", "-".repeat(86));

        for r in &self.results {
            let name = r.input_path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
            let name: String = if name.chars().count() > 34 {
                let skip = name.chars().count() - 32;
                let tail: String = name.chars().skip(skip).collect();
                format!("..{tail}")
            } else {
                name.to_string()
            };
            match (&r.error, r.output_size) {
                (Some(err), _) => {
                    println!("{:<36} {:>10} {}", name, format_size(r.input_size), err)
                }
                (None, _) if r.skipped => {
                    println!("{:<36} {:>10} {:>10}", name, format_size(r.input_size), "skipped")
                }
                (None, Some(out)) => println!(
                    "{:<36} {:>10} {:>10} {:>8} {:>9} {:>8}",
                    name,
                    format_size(r.input_size),
                    format_size(out),
                    r.change_pct().map_or("N/A".to_string(), |p| format!("{p:+.1}%")),
                    r.format.map_or("-", |f| if f.is_lossless() { "lossless" } else { "lossy" }),
                    format_duration(r.duration),
                ),
                (None, None) => {}
            }
        }

        println!("{}", "-".repeat(86));
        let total_in: u64 = self.results.iter().map(|r| r.input_size).sum();
        let total_out: u64 = self.results.iter().filter_map(|r| r.output_size).sum();
        let ok = self.results.iter().filter(|r| r.error.is_none() && !r.skipped).count();
        let skipped = self.results.iter().filter(|r| r.skipped).count();
        println!(
            "{ok} encoded, {skipped} skipped, {} errors | {} -> {}",
            self.error_count(),
            format_size(total_in),
            format_size(total_out),
        );
    }

    /// Write results as CSV.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(f, "input,input_size,output,output_size,change_pct,bitstream,duration_ms,status")?;
        for r in &self.results {
            writeln!(
                f,
                "{},{},{},{},{:.1},{},{},{}",
                r.input_path.display(),
                r.input_size,
                r.output_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
                r.output_size.unwrap_or(0),
                r.change_pct().unwrap_or(0.0),
                r.format.map_or("", |f| if f.is_lossless() { "lossless" } else { "lossy" }),
                r.duration.as_millis(),
                r.status(),
            )?;
        }
        Ok(())
    }
}

fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 { format!("{:.1}s", ms as f64 / 1000.0) } else { format!("{ms}ms") }
}

/// Format a byte size into a human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
