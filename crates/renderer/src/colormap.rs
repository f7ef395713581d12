//! Named color scales sampled into fixed-size RGB ramps.
//!
//! Continuous scales are compiled into a 256-entry lookup table by
//! piecewise-linear interpolation of per-channel segment data, then sampled
//! at evenly spaced points. Discrete scales (qualitative palettes) are
//! emitted as-is.
//!
//! Channel values are converted to bytes by truncating `c * 255`, so a
//! ramp entry may sit one step below the nominal palette byte.

use std::fmt;

use tile_common::{TileError, TileResult};

/// Default number of ramp entries for continuous scales.
pub const DEFAULT_SAMPLES: usize = 255;

/// Resolution of the intermediate lookup table.
const LUT_SIZE: usize = 256;

/// Suffix selecting the reversed scale.
const REVERSED_SUFFIX: &str = "_r";

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: (hex >> 16) as u8,
            g: (hex >> 8) as u8,
            b: hex as u8,
        }
    }

    /// Channels as fractions in [0, 1].
    fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// Truncating conversion from fractional channels.
    fn from_unit(channels: [f64; 3]) -> Self {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(byte(channels[0]), byte(channels[1]), byte(channels[2]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({} {} {})", self.r, self.g, self.b)
    }
}

/// `(x, value below x, value above x)`
type Segment = (f64, f64, f64);

enum ScaleData {
    /// Colors evenly spaced over [0, 1], linearly interpolated
    Listed(&'static [u32]),
    /// Per-channel segment tables
    Segmented {
        red: &'static [Segment],
        green: &'static [Segment],
        blue: &'static [Segment],
    },
    /// Fixed palette, one ramp entry per color
    Discrete(&'static [u32]),
}

struct Scale {
    name: &'static str,
    data: ScaleData,
}

// === ColorBrewer sequential and diverging ===

const GREENS: &[u32] = &[
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const YLGN: &[u32] = &[
    0xffffe5, 0xf7fcb9, 0xd9f0a3, 0xaddd8e, 0x78c679, 0x41ab5d, 0x238443, 0x006837, 0x004529,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const REDS: &[u32] = &[
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const ORANGES: &[u32] = &[
    0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
];
const PURPLES: &[u32] = &[
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
];
const GREYS: &[u32] = &[
    0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
];
const BUGN: &[u32] = &[
    0xf7fcfd, 0xe5f5f9, 0xccece6, 0x99d8c9, 0x66c2a4, 0x41ae76, 0x238b45, 0x006d2c, 0x00441b,
];
const YLORRD: &[u32] = &[
    0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026,
];
const YLGNBU: &[u32] = &[
    0xffffd9, 0xedf8b1, 0xc7e9b4, 0x7fcdbb, 0x41b6c4, 0x1d91c0, 0x225ea8, 0x253494, 0x081d58,
];
const RDYLGN: &[u32] = &[
    0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63,
    0x1a9850, 0x006837,
];
const RDBU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];

// === Segmented ===

const RISE: &[Segment] = &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)];
const FALL: &[Segment] = &[(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)];
const ONE: &[Segment] = &[(0.0, 1.0, 1.0), (1.0, 1.0, 1.0)];
const ZERO: &[Segment] = &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)];

const HOT_RED: &[Segment] = &[(0.0, 0.0416, 0.0416), (0.365079, 1.0, 1.0), (1.0, 1.0, 1.0)];
const HOT_GREEN: &[Segment] = &[
    (0.0, 0.0, 0.0),
    (0.365079, 0.0, 0.0),
    (0.746032, 1.0, 1.0),
    (1.0, 1.0, 1.0),
];
const HOT_BLUE: &[Segment] = &[(0.0, 0.0, 0.0), (0.746032, 0.0, 0.0), (1.0, 1.0, 1.0)];

const SUMMER_GREEN: &[Segment] = &[(0.0, 0.5, 0.5), (1.0, 1.0, 1.0)];
const SUMMER_BLUE: &[Segment] = &[(0.0, 0.4, 0.4), (1.0, 0.4, 0.4)];
const WINTER_BLUE: &[Segment] = &[(0.0, 1.0, 1.0), (1.0, 0.5, 0.5)];

const BONE_RED: &[Segment] = &[
    (0.0, 0.0, 0.0),
    (0.746032, 0.652778, 0.652778),
    (1.0, 1.0, 1.0),
];
const BONE_GREEN: &[Segment] = &[
    (0.0, 0.0, 0.0),
    (0.365079, 0.319444, 0.319444),
    (0.746032, 0.777778, 0.777778),
    (1.0, 1.0, 1.0),
];
const BONE_BLUE: &[Segment] = &[
    (0.0, 0.0, 0.0),
    (0.365079, 0.444444, 0.444444),
    (1.0, 1.0, 1.0),
];

const COPPER_RED: &[Segment] = &[(0.0, 0.0, 0.0), (0.809524, 1.0, 1.0), (1.0, 1.0, 1.0)];
const COPPER_GREEN: &[Segment] = &[(0.0, 0.0, 0.0), (1.0, 0.7812, 0.7812)];
const COPPER_BLUE: &[Segment] = &[(0.0, 0.0, 0.0), (1.0, 0.4975, 0.4975)];

// === Qualitative ===

const TAB10: &[u32] = &[
    0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f, 0xbcbd22,
    0x17becf,
];
const SET1: &[u32] = &[
    0xe41a1c, 0x377eb8, 0x4daf4a, 0x984ea3, 0xff7f00, 0xffff33, 0xa65628, 0xf781bf, 0x999999,
];
const SET2: &[u32] = &[
    0x66c2a5, 0xfc8d62, 0x8da0cb, 0xe78ac3, 0xa6d854, 0xffd92f, 0xe5c494, 0xb3b3b3,
];
const DARK2: &[u32] = &[
    0x1b9e77, 0xd95f02, 0x7570b3, 0xe7298a, 0x66a61e, 0xe6ab02, 0xa6761d, 0x666666,
];
const PASTEL1: &[u32] = &[
    0xfbb4ae, 0xb3cde3, 0xccebc5, 0xdecbe4, 0xfed9a6, 0xffffcc, 0xe5d8bd, 0xfddaec, 0xf2f2f2,
];
const ACCENT: &[u32] = &[
    0x7fc97f, 0xbeaed4, 0xfdc086, 0xffff99, 0x386cb0, 0xf0027f, 0xbf5b17, 0x666666,
];

const fn listed(name: &'static str, colors: &'static [u32]) -> Scale {
    Scale {
        name,
        data: ScaleData::Listed(colors),
    }
}

const fn segmented(
    name: &'static str,
    red: &'static [Segment],
    green: &'static [Segment],
    blue: &'static [Segment],
) -> Scale {
    Scale {
        name,
        data: ScaleData::Segmented { red, green, blue },
    }
}

const fn discrete(name: &'static str, colors: &'static [u32]) -> Scale {
    Scale {
        name,
        data: ScaleData::Discrete(colors),
    }
}

static SCALES: &[Scale] = &[
    listed("Greens", GREENS),
    listed("YlGn", YLGN),
    listed("Blues", BLUES),
    listed("Reds", REDS),
    listed("Oranges", ORANGES),
    listed("Purples", PURPLES),
    listed("Greys", GREYS),
    listed("BuGn", BUGN),
    listed("YlOrRd", YLORRD),
    listed("YlGnBu", YLGNBU),
    listed("RdYlGn", RDYLGN),
    listed("RdBu", RDBU),
    segmented("hot", HOT_RED, HOT_GREEN, HOT_BLUE),
    segmented("gray", RISE, RISE, RISE),
    segmented("binary", FALL, FALL, FALL),
    segmented("cool", RISE, FALL, ONE),
    segmented("autumn", ONE, RISE, ZERO),
    segmented("spring", ONE, RISE, FALL),
    segmented("summer", RISE, SUMMER_GREEN, SUMMER_BLUE),
    segmented("winter", ZERO, RISE, WINTER_BLUE),
    segmented("bone", BONE_RED, BONE_GREEN, BONE_BLUE),
    segmented("copper", COPPER_RED, COPPER_GREEN, COPPER_BLUE),
    discrete("tab10", TAB10),
    discrete("Set1", SET1),
    discrete("Set2", SET2),
    discrete("Dark2", DARK2),
    discrete("Pastel1", PASTEL1),
    discrete("Accent", ACCENT),
];

/// Base names of every registered scale. Each also exists with an `_r` suffix.
pub fn registered_names() -> Vec<&'static str> {
    SCALES.iter().map(|s| s.name).collect()
}

/// An immutable, non-empty sequence of RGB colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRamp {
    name: String,
    colors: Vec<Rgb>,
}

impl ColorRamp {
    /// Build a ramp from explicit colors. An empty list yields a single black entry.
    pub fn from_colors(name: impl Into<String>, colors: Vec<Rgb>) -> Self {
        let colors = if colors.is_empty() {
            vec![Rgb::new(0, 0, 0)]
        } else {
            colors
        };
        Self {
            name: name.into(),
            colors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    /// Color for a normalized value: entry `floor(t * (N - 1))`.
    ///
    /// `t` is clamped to [0, 1]; NaN maps to the first entry.
    pub fn lookup(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.colors.len() - 1;
        let index = ((t * last as f64).floor() as usize).min(last);
        self.colors[index]
    }

    /// JavaScript `Colormap` literal used by the web client.
    pub fn to_js_snippet(&self) -> String {
        let mut out = format!("const {0} = new Colormap('{0}',\n[\n", self.name);
        for color in &self.colors {
            out.push_str(&format!("  \"{}\",\n", color));
        }
        out.push_str("]);\n");
        out
    }
}

/// Build the ramp for a registered scale.
///
/// Continuous scales are sampled at `sample_count` evenly spaced points
/// (at least one); discrete scales ignore `sample_count`.
///
/// # Errors
/// [`TileError::UnknownRamp`] if `name` is not registered.
pub fn build_ramp(name: &str, sample_count: usize) -> TileResult<ColorRamp> {
    let (base, reversed) = match name.strip_suffix(REVERSED_SUFFIX) {
        Some(base) => (base, true),
        None => (name, false),
    };
    let scale = SCALES
        .iter()
        .find(|s| s.name == base)
        .ok_or_else(|| TileError::UnknownRamp(name.to_string()))?;

    let colors = match &scale.data {
        ScaleData::Discrete(colors) => {
            let mut colors: Vec<Rgb> = colors
                .iter()
                .map(|&hex| Rgb::from_unit(Rgb::from_hex(hex).to_unit()))
                .collect();
            if reversed {
                colors.reverse();
            }
            colors
        }
        ScaleData::Listed(colors) => {
            let channels = listed_segments(colors);
            let [red, green, blue] = channels.each_ref().map(|c| prepare(c, reversed));
            sample(&Lut::new(&red, &green, &blue), sample_count)
        }
        ScaleData::Segmented { red, green, blue } => {
            let [red, green, blue] = [*red, *green, *blue].map(|c| prepare(c, reversed));
            sample(&Lut::new(&red, &green, &blue), sample_count)
        }
    };

    Ok(ColorRamp::from_colors(name, colors))
}

/// Evenly spaced segment tables for a color list.
fn listed_segments(colors: &[u32]) -> [Vec<Segment>; 3] {
    let last = colors.len().saturating_sub(1);
    let step = 1.0 / last.max(1) as f64;
    let mut channels: [Vec<Segment>; 3] = Default::default();
    for (i, &hex) in colors.iter().enumerate() {
        let x = if i == last { 1.0 } else { i as f64 * step };
        for (channel, value) in channels.iter_mut().zip(Rgb::from_hex(hex).to_unit()) {
            channel.push((x, value, value));
        }
    }
    channels
}

/// Reversal mirrors x and swaps the left/right values.
fn prepare(segments: &[Segment], reversed: bool) -> Vec<Segment> {
    if reversed {
        segments
            .iter()
            .rev()
            .map(|&(x, y0, y1)| (1.0 - x, y1, y0))
            .collect()
    } else {
        segments.to_vec()
    }
}

/// Per-channel lookup tables.
struct Lut {
    channels: [Vec<f64>; 3],
}

impl Lut {
    fn new(red: &[Segment], green: &[Segment], blue: &[Segment]) -> Self {
        Self {
            channels: [
                lookup_table(red, LUT_SIZE),
                lookup_table(green, LUT_SIZE),
                lookup_table(blue, LUT_SIZE),
            ],
        }
    }

    /// Table entry `min(floor(t * N), N - 1)`.
    fn color_at(&self, t: f64) -> Rgb {
        let n = self.channels[0].len();
        let index = ((t * n as f64) as usize).min(n - 1);
        Rgb::from_unit(self.channels.each_ref().map(|c| c[index]))
    }
}

/// Piecewise-linear table of `n` entries over `x = i / (n - 1)`.
///
/// Between segment breakpoints the value runs from the right-hand value of
/// the lower breakpoint to the left-hand value of the upper one. The end
/// entries take the outermost values exactly.
fn lookup_table(segments: &[Segment], n: usize) -> Vec<f64> {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return vec![0.0; n];
    };
    if n < 2 || segments.len() < 2 {
        return vec![first.2.clamp(0.0, 1.0); n];
    }

    let step = 1.0 / (n - 1) as f64;
    let mut lut = Vec::with_capacity(n);
    lut.push(first.2);
    for i in 1..n - 1 {
        let x = i as f64 * step;
        let upper = segments
            .iter()
            .position(|s| s.0 >= x)
            .unwrap_or(segments.len() - 1)
            .max(1);
        let (x0, _, y1_lo) = segments[upper - 1];
        let (x1, y0_hi, _) = segments[upper];
        let distance = (x - x0) / (x1 - x0);
        lut.push(distance * (y0_hi - y1_lo) + y1_lo);
    }
    lut.push(last.1);

    lut.into_iter().map(|v| v.clamp(0.0, 1.0)).collect()
}

/// `count` samples at `t_i = i * (1 / (count - 1))`, the last exactly 1.0.
fn sample(lut: &Lut, count: usize) -> Vec<Rgb> {
    let count = count.max(1);
    if count == 1 {
        return vec![lut.color_at(0.0)];
    }
    let step = 1.0 / (count - 1) as f64;
    (0..count)
        .map(|i| {
            let t = if i == count - 1 { 1.0 } else { i as f64 * step };
            lut.color_at(t)
        })
        .collect()
}
