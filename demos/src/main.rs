//! `pnglite-demo`: a thin consumer of the `pnglite-png` public API,
//! in the spirit of `zune-bin` as an exerciser rather than a
//! validation/conformance tool. Two subcommands:
//!
//! - `info <file.png>` prints the decoded header fields and any text
//!   metadata, using only `decode`/`Image`.
//! - `roundtrip <in.png> <out.png>` decodes then re-encodes, to
//!   demonstrate the library is usable end to end from a binary.

use std::env;
use std::fs;
use std::process::ExitCode;

use pnglite_png::{decode, encode, EncoderOptions};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("usage: pnglite-demo <info|roundtrip> <file.png> [out.png]");
        return ExitCode::FAILURE;
    };

    let result = match command.as_str() {
        "info" => args.next().map_or_else(
            || Err("info requires a file path".to_string()),
            |path| run_info(&path),
        ),
        "roundtrip" => match (args.next(), args.next()) {
            (Some(input), Some(output)) => run_roundtrip(&input, &output),
            _ => Err("roundtrip requires <in.png> <out.png>".to_string()),
        },
        other => Err(format!("unknown command: {other}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_info(path: &str) -> Result<(), String> {
    let data = fs::read(path).map_err(|e| format!("reading {path}: {e}"))?;
    let image = decode(&data).map_err(|e| format!("decoding {path}: {e}"))?;

    println!("{path}:");
    println!("  size: {}x{}", image.width, image.height);
    println!("  colour type: {:?}", image.color_type);
    println!("  bit depth: {}", image.bit_depth.to_wire());
    println!("  interlace: {:?}", image.interlace);
    if let Some(palette) = &image.palette {
        println!("  palette: {} entries", palette.len());
    }
    if let Some(samples) = image.pixel(0, 0) {
        println!("  pixel(0,0): {samples:?}");
    }
    if let Some(gamma) = image.metadata.gamma {
        println!("  gamma: {gamma}");
    }
    for text in &image.metadata.text {
        println!("  text[{}]: {} bytes", text.keyword, text.text.len());
    }
    Ok(())
}

fn run_roundtrip(input: &str, output: &str) -> Result<(), String> {
    let data = fs::read(input).map_err(|e| format!("reading {input}: {e}"))?;
    let image = decode(&data).map_err(|e| format!("decoding {input}: {e}"))?;
    let reencoded = encode(&image, &EncoderOptions::default())
        .map_err(|e| format!("encoding {output}: {e}"))?;
    fs::write(output, reencoded).map_err(|e| format!("writing {output}: {e}"))?;
    println!("wrote {output} ({} bytes)", fs::metadata(output).map(|m| m.len()).unwrap_or(0));
    Ok(())
}
