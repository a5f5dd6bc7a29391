//! Heightmap generator binary — writes a raw16 heightmap for the terrain.
//!
//! Usage: cargo run --release --bin generate_heightmap -- [OPTIONS]
//!
//! Options:
//!   --width <SAMPLES>  Samples per side, must be 2^n+1 (default: 513)
//!   --seed <SEED>      Random seed (default: 12345)
//!   --scale <SCALE>    Noise feature scale in grids (default: 150.0)
//!   --octaves <N>      fBm octaves (default: 6)
//!   --out <PATH>       Output file (default: "heightmap.raw16")
//!
//! The output is width * width little-endian u16 samples, row-major from
//! the top-left corner, heights normalized to [0, 1].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    let width = parse_u32_arg(&args, "--width").unwrap_or(513);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let scale = parse_f64_arg(&args, "--scale").unwrap_or(150.0);
    let octaves = parse_usize_arg(&args, "--octaves").unwrap_or(6);
    let out_path = parse_str_arg(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("heightmap.raw16"));

    if width < 2 || !(width - 1).is_power_of_two() {
        eprintln!("--width must be 2^n+1, got {}", width);
        std::process::exit(1);
    }

    println!("=== Terraquad Heightmap Generator ===");
    println!("Size:  {} x {} samples", width, width);
    println!("Seed:  {}", seed);
    println!("Scale: {}, Octaves: {}", scale, octaves);
    println!("Output: {}", out_path.display());
    println!();

    let start = Instant::now();

    let fbm = Fbm::<Perlin>::new(seed)
        .set_octaves(octaves)
        .set_persistence(0.5)
        .set_lacunarity(2.0);

    // Each row is independent; fBm evaluation dominates, so rows spread
    // cleanly across the pool
    let rows: Vec<Vec<u16>> = (0..width)
        .into_par_iter()
        .map(|z| {
            (0..width)
                .map(|x| {
                    let n = fbm.get([x as f64 / scale, z as f64 / scale]);
                    // fBm stays well within [-1, 1]; clamp the outliers
                    let h = ((n + 1.0) * 0.5).clamp(0.0, 1.0);
                    (h * u16::MAX as f64).round() as u16
                })
                .collect()
        })
        .collect();

    let file = File::create(&out_path).unwrap_or_else(|e| {
        eprintln!("Failed to create {}: {}", out_path.display(), e);
        std::process::exit(1);
    });
    let mut writer = BufWriter::new(file);
    for row in &rows {
        for &sample in row {
            writer
                .write_all(&sample.to_le_bytes())
                .expect("Failed to write sample");
        }
    }
    writer.flush().expect("Failed to flush output");

    let bytes = width as u64 * width as u64 * 2;
    println!(
        "Wrote {} samples ({} KiB) in {:.2}s",
        width as u64 * width as u64,
        bytes / 1024,
        start.elapsed().as_secs_f32()
    );
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u32_arg(args: &[String], name: &str) -> Option<u32> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}

fn parse_f64_arg(args: &[String], name: &str) -> Option<f64> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], name: &str) -> Option<usize> {
    parse_str_arg(args, name).and_then(|s| s.parse().ok())
}
