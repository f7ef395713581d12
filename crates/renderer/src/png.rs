//! PNG encoding for RGBA tiles.
//!
//! Two encoding modes:
//! - **Indexed (color type 3)** when the tile has at most 256 distinct
//!   RGBA values. Choropleth tiles almost always qualify.
//! - **RGBA (color type 6)** otherwise, e.g. heavily anti-aliased tiles.
//!
//! The palette is sorted so identical pixels always produce identical bytes.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use rayon::prelude::*;
use tile_common::{TileError, TileResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Pixels per work unit when scanning in parallel
const PARALLEL_CHUNK_PIXELS: usize = 4096;

/// Encode RGBA pixels, choosing indexed or RGBA output.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> TileResult<Vec<u8>> {
    check_len(pixels, width, height)?;
    match extract_palette(pixels) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

fn check_len(pixels: &[u8], width: u32, height: u32) -> TileResult<()> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(TileError::Render(format!(
            "pixel buffer is {} bytes, expected {} for {}x{} RGBA",
            pixels.len(),
            expected,
            width,
            height
        )));
    }
    Ok(())
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_be_bytes([px[0], px[1], px[2], px[3]])
}

/// Sorted palette plus one index per pixel, or `None` past 256 colors.
pub(crate) fn extract_palette(pixels: &[u8]) -> Option<(Vec<u32>, Vec<u8>)> {
    let num_pixels = pixels.len() / 4;

    let colors = if num_pixels >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks(PARALLEL_CHUNK_PIXELS * 4)
            .map(distinct_colors)
            .try_reduce(BTreeSet::new, |mut acc, part| {
                acc.extend(part);
                (acc.len() <= MAX_PALETTE_SIZE).then_some(acc)
            })?
    } else {
        distinct_colors(pixels)?
    };

    let palette: Vec<u32> = colors.into_iter().collect();
    let index_of: HashMap<u32, u8> = palette
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as u8))
        .collect();
    let lookup = |px: &[u8]| index_of.get(&pack(px)).copied().unwrap_or(0);

    let indices: Vec<u8> = if num_pixels >= PARALLEL_THRESHOLD {
        pixels.par_chunks_exact(4).map(lookup).collect()
    } else {
        pixels.chunks_exact(4).map(lookup).collect()
    };

    Some((palette, indices))
}

fn distinct_colors(pixels: &[u8]) -> Option<BTreeSet<u32>> {
    let mut colors = BTreeSet::new();
    for px in pixels.chunks_exact(4) {
        colors.insert(pack(px));
        if colors.len() > MAX_PALETTE_SIZE {
            return None;
        }
    }
    Some(colors)
}

/// Indexed PNG from a packed `0xRRGGBBAA` palette and per-pixel indices.
pub fn encode_indexed(
    width: u32,
    height: u32,
    palette: &[u32],
    indices: &[u8],
) -> TileResult<Vec<u8>> {
    if indices.len() != width as usize * height as usize {
        return Err(TileError::Render(format!(
            "{} palette indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::with_capacity(indices.len() / 4 + 1024);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette
        .iter()
        .flat_map(|c| {
            let [r, g, b, _] = c.to_be_bytes();
            [r, g, b]
        })
        .collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| (c & 0xff) < 0xff) {
        let trns: Vec<u8> = palette.iter().map(|c| (c & 0xff) as u8).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Truecolor-with-alpha PNG.
pub fn encode_rgba(pixels: &[u8], width: u32, height: u32) -> TileResult<Vec<u8>> {
    check_len(pixels, width, height)?;

    let mut png = Vec::with_capacity(pixels.len() / 4 + 1024);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    let idat = deflate_scanlines(pixels, width as usize * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter, interlace all 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Zlib-compress rows of `row_bytes`, each prefixed with filter type 0.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> TileResult<Vec<u8>> {
    let rows = if row_bytes == 0 { 0 } else { data.len() / row_bytes };
    let mut raw = Vec::with_capacity(rows * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes.max(1)).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&raw).map_err(compression_error)?;
    encoder.finish().map_err(compression_error)
}

fn compression_error(e: std::io::Error) -> TileError {
    TileError::Render(format!("IDAT compression failed: {}", e))
}
