//! `meta`: set or strip ICC, EXIF and XMP through `Mux`.

use anyhow::{Context, bail};
use zenloop::{FourCc, Mux};

use crate::MetaArgs;
use crate::output::{check_writable, write_file};

pub fn run(args: MetaArgs) -> anyhow::Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut mux = Mux::from_bytes(&data)
        .with_context(|| format!("parsing {}", args.file.display()))?;

    let strip = [
        (FourCc::ICCP, args.strip_all || args.strip_icc),
        (FourCc::EXIF, args.strip_all || args.strip_exif),
        (FourCc::XMP, args.strip_all || args.strip_xmp),
    ];
    for (fourcc, wanted) in strip {
        if wanted && mux.remove(fourcc) {
            eprintln!("removed {fourcc}");
        }
    }

    if let Some(path) = &args.icc {
        let icc = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        mux.set_icc_profile(icc);
    }
    if let Some(path) = &args.exif {
        mux.set_exif(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?);
    }
    if let Some(path) = &args.xmp {
        mux.set_xmp(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?);
    }

    let output = match &args.output {
        Some(path) => path.clone(),
        None if args.force => args.file.clone(),
        None => bail!("rewriting {} in place requires --force", args.file.display()),
    };
    if output != args.file {
        check_writable(&args.file, &output, args.force)?;
    }
    let out = mux.assemble()?;
    write_file(&output, &out)?;
    eprintln!("{} -> {} ({} bytes)", args.file.display(), output.display(), out.len());
    Ok(())
}
