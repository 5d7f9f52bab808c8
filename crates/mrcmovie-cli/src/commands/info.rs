use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mrcmovie_core::io::MrcReader;
use mrcmovie_core::memory::format_bytes;

#[derive(Args)]
pub struct InfoArgs {
    /// Input MRC file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = MrcReader::open(&args.file)?;
    let info = reader.volume_info();

    println!("File:        {}", info.filename.display());
    println!("Slices:      {}", info.depth);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Mode:        {} ({})", info.mode.code(), info.mode);
    println!(
        "Byte order:  {}",
        if info.little_endian { "little-endian" } else { "big-endian" }
    );
    if info.extended_header_bytes > 0 {
        println!("Ext header:  {} bytes", info.extended_header_bytes);
    }
    println!("Data size:   {}", format_bytes(info.data_bytes()));

    Ok(())
}
