use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use datasource::{ByteSink, ByteSource, FlexArchive, FlexEntry, StreamSink, StreamSource};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datasource", about = "Inspect binary files and flex archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the size of a file and, for flex archives, the entry count.
    Info {
        file: PathBuf,
    },
    /// List the entries of a flex archive.
    List {
        file: PathBuf,
        /// Print the index as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Copy one flex entry to a file.
    Extract {
        file: PathBuf,
        /// Entry number.
        #[arg(long)]
        index: usize,
        /// Destination file; created or truncated.
        #[arg(long)]
        out: PathBuf,
    },
    /// Decode integers or floats at an offset.
    Peek {
        file: PathBuf,
        /// Byte offset of the first value.
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Value width in bytes (1 to 4).
        #[arg(long, default_value_t = 4)]
        width: usize,
        /// Number of consecutive values.
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Most significant byte first.
        #[arg(long)]
        big_endian: bool,
        /// Sign-extend to 32 bits.
        #[arg(long, conflicts_with = "float")]
        signed: bool,
        /// Reinterpret 4-byte values as IEEE-754 singles.
        #[arg(long)]
        float: bool,
    },
}

/// How `peek` turns bytes into a value.
#[derive(Debug, Clone, Copy)]
struct PeekFormat {
    width: usize,
    big_endian: bool,
    signed: bool,
    float: bool,
}

impl PeekFormat {
    fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.width) {
            bail!("width must be 1, 2, 3 or 4 (got {})", self.width);
        }
        if self.float && self.width != 4 {
            bail!("--float needs --width 4");
        }
        if self.big_endian && self.width == 3 {
            bail!("big-endian reads are 2 or 4 bytes wide");
        }
        Ok(())
    }

    fn read<S: ByteSource + ?Sized>(&self, src: &mut S) -> datasource::Result<String> {
        let raw = match (self.big_endian, self.width) {
            (true, 2) => src.read_u16_be()? as u32,
            (true, 4) => src.read_u32_be()?,
            _ if self.signed => return Ok(src.read_sint(self.width)?.to_string()),
            _ => src.read_uint(self.width)?,
        };
        Ok(if self.float {
            f32::from_bits(raw).to_string()
        } else if self.signed {
            let shift = 32 - 8 * self.width as u32;
            (((raw << shift) as i32) >> shift).to_string()
        } else {
            raw.to_string()
        })
    }
}

#[derive(Serialize)]
struct Listing<'a> {
    header: &'a str,
    entries: Vec<ListedEntry>,
}

#[derive(Serialize)]
struct ListedEntry {
    index: usize,
    #[serde(flatten)]
    entry: FlexEntry,
}

fn open(file: &Path) -> Result<StreamSource> {
    StreamSource::open(file).with_context(|| format!("failed to open {}", file.display()))
}

fn open_flex(file: &Path) -> Result<(StreamSource, FlexArchive)> {
    let mut src = open(file)?;
    let flex = FlexArchive::parse(&mut src)
        .with_context(|| format!("failed to read flex index: {}", file.display()))?;
    Ok((src, flex))
}

fn cmd_info(file: &Path, out: &mut impl Write) -> Result<()> {
    let mut src = open(file)?;
    let size = src.size()?;
    writeln!(out, "File:    {}", file.display())?;
    writeln!(out, "Size:    {size} bytes")?;
    if FlexArchive::is_flex(&mut src)? {
        let flex = FlexArchive::parse(&mut src)?;
        let used = flex.entries().iter().filter(|e| !e.is_empty()).count();
        writeln!(out, "Format:  flex ({:?})", flex.header())?;
        writeln!(out, "Entries: {} ({used} non-empty)", flex.count())?;
    } else {
        writeln!(out, "Format:  raw")?;
    }
    Ok(())
}

fn cmd_list(file: &Path, json: bool, out: &mut impl Write) -> Result<()> {
    let (_, flex) = open_flex(file)?;
    let listing = Listing {
        header: flex.header(),
        entries: flex
            .entries()
            .iter()
            .enumerate()
            .map(|(index, &entry)| ListedEntry { index, entry })
            .collect(),
    };
    if json {
        serde_json::to_writer_pretty(&mut *out, &listing)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "{:>6}  {:>10}  {:>10}", "index", "offset", "size")?;
    for e in listing.entries.iter().filter(|e| !e.entry.is_empty()) {
        writeln!(out, "{:>6}  {:>#10x}  {:>10}", e.index, e.entry.offset, e.entry.size)?;
    }
    Ok(())
}

fn cmd_extract(file: &Path, index: usize, out: &Path) -> Result<()> {
    let (mut src, flex) = open_flex(file)?;
    let data = flex.read_object(&mut src, index)?;
    let mut sink = StreamSink::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    sink.write_bytes(&data)?;
    sink.finish()?;
    info!(index, bytes = data.len(), out = %out.display(), "extracted flex entry");
    Ok(())
}

fn cmd_peek(file: &Path, offset: u64, count: usize, format: PeekFormat) -> Result<()> {
    format.validate()?;
    let mut src = open(file)?;
    src.seek(offset)?;
    for _ in 0..count {
        let at = src.position()?;
        let value = format
            .read(&mut src)
            .with_context(|| format!("failed to read {} bytes at {at:#x}", format.width))?;
        println!("{at:#010x}  {value}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match &cli.command {
        Command::Info { file } => cmd_info(file, &mut io::stdout().lock()),
        Command::List { file, json } => cmd_list(file, *json, &mut io::stdout().lock()),
        Command::Extract { file, index, out } => cmd_extract(file, *index, out),
        Command::Peek {
            file,
            offset,
            width,
            count,
            big_endian,
            signed,
            float,
        } => {
            let format = PeekFormat {
                width: *width,
                big_endian: *big_endian,
                signed: *signed,
                float: *float,
            };
            cmd_peek(file, *offset, *count, format)
        }
    }
}
