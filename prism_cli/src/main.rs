//! Headless command line frontend for the prism emulator core.

use clap::Parser;
use log::{error, info};
use prism::{Config, Emulator, Host, binrw::BinRead};
use std::{
    fs::File,
    path::{Path, PathBuf},
    process::ExitCode,
};

/// A PlayStation emulator.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a 512 KiB BIOS ROM image.
    bios: PathBuf,

    /// Path to a raw (BIN) disc image.
    iso: Option<PathBuf>,

    /// Path to a PS-X EXE to side load once the shell is reached.
    #[arg(long)]
    exe: Option<PathBuf>,

    /// Stop after this many frames (run forever by default).
    #[arg(long)]
    frames: Option<u64>,
}

/// A host without a window: frames are counted and no button is ever pressed.
struct Headless;

impl Host for Headless {
    fn present(&mut self, _vram: &[u16]) {}
}

fn load_bios(path: &Path) -> std::io::Result<Vec<u8>> {
    let bios = std::fs::read(path)?;
    info!("loaded BIOS image: {} bytes", bios.len());
    Ok(bios)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let bios = load_bios(&args.bios)?;

    let disc = args
        .iso
        .as_deref()
        .map(File::open)
        .transpose()?
        .map(|file| Box::new(file) as Box<dyn prism::Disc>);

    let sideload = args
        .exe
        .as_deref()
        .map(|path| -> Result<_, Box<dyn std::error::Error>> {
            let mut file = File::open(path)?;
            let exe = prism::Executable::read(&mut file)?;
            info!(
                "side loading {}, entry at {}",
                path.display(),
                exe.header.initial_pc
            );
            Ok(exe)
        })
        .transpose()?;

    let mut emulator = Emulator::new(
        Config {
            bios,
            disc,
            sideload,
        },
        Headless,
    )?;

    loop {
        emulator.cycle();

        if let Some(limit) = args.frames
            && emulator.psx().gpu.frame >= limit
        {
            break;
        }
    }

    let stdout = &emulator.psx().memory.kernel_stdout;
    if !stdout.is_empty() {
        info!("guest printed {} characters", stdout.len());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal: {err}");
            ExitCode::FAILURE
        }
    }
}
