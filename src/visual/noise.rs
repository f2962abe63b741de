//! Hash-based value noise and fractal sums.
//!
//! Everything here is a pure function of the input coordinates and
//! [`NOISE_SEED`]. Lattice arithmetic wraps, so negative and very large
//! coordinates never overflow; interpolation runs in `f64` so the `[0,1)`
//! range survives the trip back to `f32`.

/// Folded into every lattice hash. Changing it reshapes every continent.
pub const NOISE_SEED: u32 = 0x2F6B_4C1D;

const PRIME_X: u32 = 374_761_393;
const PRIME_Y: u32 = 668_265_263;
const PRIME_Z: u32 = 1_274_126_177;

/// Mixes three lattice coordinates into a well-scrambled `u32`.
#[inline]
pub fn hash3(ix: i32, iy: i32, iz: i32) -> u32 {
    let mut h = (ix as u32)
        .wrapping_mul(PRIME_X)
        .wrapping_add((iy as u32).wrapping_mul(PRIME_Y))
        .wrapping_add((iz as u32).wrapping_mul(PRIME_Z))
        .wrapping_add(NOISE_SEED.wrapping_mul(0x9E37_79B9));
    h = (h ^ (h >> 13)).wrapping_mul(PRIME_Z);
    h ^ (h >> 16)
}

/// Maps a hash onto `[0,1)` using its top 24 bits.
#[inline]
pub fn hash_unit(h: u32) -> f64 {
    (h >> 8) as f64 / 16_777_216.0
}

#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Splits a coordinate into its lattice cell and the fractional offset.
#[inline]
fn cell(v: f64) -> (i32, f64) {
    let fl = v.floor();
    // `as` saturates for out-of-range floats and maps NaN to 0.
    let i = fl as i64 as i32;
    let f = v - fl;
    let f = if f.is_finite() { f.clamp(0.0, 1.0) } else { 0.0 };
    (i, f)
}

#[inline]
fn corner(ix: i32, iy: i32, iz: i32) -> f64 {
    hash_unit(hash3(ix, iy, iz))
}

fn value_noise3_f64(x: f64, y: f64, z: f64) -> f64 {
    let (ix, fx) = cell(x);
    let (iy, fy) = cell(y);
    let (iz, fz) = cell(z);
    let sx = smoothstep(fx);
    let sy = smoothstep(fy);
    let sz = smoothstep(fz);
    let jx = ix.wrapping_add(1);
    let jy = iy.wrapping_add(1);
    let jz = iz.wrapping_add(1);

    let x00 = lerp(corner(ix, iy, iz), corner(jx, iy, iz), sx);
    let x10 = lerp(corner(ix, jy, iz), corner(jx, jy, iz), sx);
    let x01 = lerp(corner(ix, iy, jz), corner(jx, iy, jz), sx);
    let x11 = lerp(corner(ix, jy, jz), corner(jx, jy, jz), sx);

    let y0 = lerp(x00, x10, sy);
    let y1 = lerp(x01, x11, sy);
    lerp(y0, y1, sz)
}

fn value_noise2_f64(x: f64, y: f64) -> f64 {
    let (ix, fx) = cell(x);
    let (iy, fy) = cell(y);
    let sx = smoothstep(fx);
    let sy = smoothstep(fy);
    let jx = ix.wrapping_add(1);
    let jy = iy.wrapping_add(1);

    let x0 = lerp(corner(ix, iy, 0), corner(jx, iy, 0), sx);
    let x1 = lerp(corner(ix, jy, 0), corner(jx, jy, 0), sx);
    lerp(x0, x1, sy)
}

/// Smooth 3D value noise in `[0,1)`.
pub fn value_noise3(x: f32, y: f32, z: f32) -> f32 {
    value_noise3_f64(x as f64, y as f64, z as f64) as f32
}

/// Smooth 2D value noise in `[0,1)`; the `z = 0` slice of [`value_noise3`].
pub fn value_noise2(x: f32, y: f32) -> f32 {
    value_noise2_f64(x as f64, y as f64) as f32
}

/// Fractal sum of value-noise octaves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fbm {
    pub octaves: u32,
    pub lacunarity: f32,
    pub gain: f32,
}

impl Fbm {
    /// Continent shapes on the globe.
    pub const GLOBE: Self = Self {
        octaves: 5,
        lacunarity: 2.1,
        gain: 0.5,
    };

    /// Static texture under the Voronoi terrain.
    pub const TERRAIN: Self = Self {
        octaves: 4,
        lacunarity: 2.0,
        gain: 0.5,
    };

    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let (x, y, z) = (x as f64, y as f64, z as f64);
        let gain = (self.gain as f64).clamp(0.0, 1.0);
        let mut value = 0.0f64;
        let mut amplitude = 0.5f64;
        let mut frequency = 1.0f64;
        for _ in 0..self.octaves {
            value += amplitude * value_noise3_f64(x * frequency, y * frequency, z * frequency);
            amplitude *= gain;
            frequency *= self.lacunarity as f64;
        }
        value as f32
    }

    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        let (x, y) = (x as f64, y as f64);
        let gain = (self.gain as f64).clamp(0.0, 1.0);
        let mut value = 0.0f64;
        let mut amplitude = 0.5f64;
        let mut frequency = 1.0f64;
        for _ in 0..self.octaves {
            value += amplitude * value_noise2_f64(x * frequency, y * frequency);
            amplitude *= gain;
            frequency *= self.lacunarity as f64;
        }
        value as f32
    }
}
