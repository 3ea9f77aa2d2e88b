//! Output path resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Where batch outputs go.
pub struct OutputConfig {
    pub target_dir: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub suffix: String,
    pub force: bool,
    pub dry_run: bool,
    /// Extension given to every output, without the dot.
    pub extension: &'static str,
}

impl OutputConfig {
    pub fn new(
        output: Option<&str>,
        suffix: &str,
        force: bool,
        dry_run: bool,
        extension: &'static str,
    ) -> Self {
        let (target_dir, target_file) = match output {
            Some(o) => {
                let path = PathBuf::from(o);
                if o.ends_with('/') || o.ends_with('\\') || path.is_dir() {
                    (Some(path), None)
                } else {
                    (None, Some(path))
                }
            }
            None => (None, None),
        };
        Self {
            target_dir,
            target_file,
            suffix: suffix.to_string(),
            force,
            dry_run,
            extension,
        }
    }

    /// Output path for `input`. `-o file` is only valid for a single input.
    pub fn resolve(&self, input: &Path, input_count: usize) -> anyhow::Result<PathBuf> {
        if let Some(target) = &self.target_file {
            if input_count > 1 {
                bail!("-o with a file path only works for a single input file (got {input_count})");
            }
            return Ok(target.clone());
        }
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        let filename = format!("{stem}{}.{}", self.suffix, self.extension);
        match &self.target_dir {
            Some(dir) => Ok(dir.join(filename)),
            None => Ok(input.parent().unwrap_or(Path::new(".")).join(filename)),
        }
    }

    /// Refuses to clobber the input or, without `--force`, an existing file.
    pub fn check_writable(&self, input: &Path, output: &Path) -> anyhow::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        check_writable(input, output, self.force)
    }
}

pub fn check_writable(input: &Path, output: &Path, force: bool) -> anyhow::Result<()> {
    if let (Ok(ci), Ok(co)) = (input.canonicalize(), output.canonicalize()) {
        if ci == co && !force {
            bail!("output would overwrite input: {}\nUse --force to confirm", input.display());
        }
    }
    if output.exists() && !force {
        bail!("output already exists: {}\nUse --force to overwrite", output.display());
    }
    Ok(())
}

/// Create parent directories, then write `data`.
pub fn write_file(output: &Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory: {}", parent.display()))?;
        }
    }
    std::fs::write(output, data).with_context(|| format!("writing {}", output.display()))
}
