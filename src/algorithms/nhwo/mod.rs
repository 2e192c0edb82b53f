//! Non-holonomic-without-obstacles (NHWO) heuristic cache. Precomputes
//! Reeds–Shepp path lengths from every `(Δx, Δy, Δyaw)` in a local patch to
//! a canonical centered goal, persisted as a raw little-endian `f64` blob
//! and read back via `memmap2` + `bytemuck` rather than re-parsed on every
//! load.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;

use crate::algorithms::reeds_shepp::reeds_shepp_path;

/// `[yaw_bin][Δy][Δx]` tensor of Reeds–Shepp lengths to a goal centered at
/// the patch, yaw 0.
pub struct NhwoCache {
    pub yaw_dim: usize,
    pub patch_dim: usize,
    data: Vec<f64>,
    _mmap: Option<Mmap>,
}

impl NhwoCache {
    /// Build the cache in memory by invoking the Reeds–Shepp kernel from
    /// every `(xi, yi, yaw_i)` to the canonical centered goal.
    pub fn build(yaw_dim: usize, patch_dim: usize, res: f64, rho: f64, step: f64) -> Self {
        let center = (patch_dim as f64 - 1.0) / 2.0;
        let mut data = vec![0.0f64; yaw_dim * patch_dim * patch_dim];

        for yaw_bin in 0..yaw_dim {
            let yaw = (yaw_bin as f64 / yaw_dim as f64) * std::f64::consts::TAU - std::f64::consts::PI;
            for yi in 0..patch_dim {
                for xi in 0..patch_dim {
                    let start = (
                        (xi as f64 - center) * res,
                        (yi as f64 - center) * res,
                        yaw,
                    );
                    let goal = (0.0, 0.0, 0.0);
                    let len = reeds_shepp_path(start, goal, rho, step).map(|p| p.total_length).unwrap_or(f64::INFINITY);
                    data[yaw_bin * patch_dim * patch_dim + yi * patch_dim + xi] = len;
                }
            }
        }

        Self { yaw_dim, patch_dim, data, _mmap: None }
    }

    /// Persist as a raw little-endian `f64` blob, header-less.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        let bytes: &[u8] = bytemuck::cast_slice(&self.data);
        file.write_all(bytes)?;
        Ok(())
    }

    /// Load an existing cache, mmap'ing the blob. Returns `FileMissing` (via
    /// `None`) when the file is absent so the caller can regenerate it.
    pub fn load(path: &Path, yaw_dim: usize, patch_dim: usize) -> Option<Self> {
        let file = File::open(path).ok()?;
        let mmap = unsafe { Mmap::map(&file).ok()? };
        let expected_len = yaw_dim * patch_dim * patch_dim * std::mem::size_of::<f64>();
        if mmap.len() != expected_len {
            return None;
        }
        let data: &[f64] = bytemuck::cast_slice(&mmap);
        let data = data.to_vec();
        Some(Self { yaw_dim, patch_dim, data, _mmap: Some(mmap) })
    }

    /// Query: translate so `goal` sits at the patch center, rotate `start`
    /// around `goal` by `-goal.yaw` (nearest-index rounding), and look up
    /// `(yaw_idx_diff, yi, xi)`. Returns `0` if the translated start falls
    /// outside the patch: the heuristic is only valid locally.
    pub fn query(&self, start: (f64, f64, f64), goal: (f64, f64, f64), res: f64) -> f64 {
        let dx = start.0 - goal.0;
        let dy = start.1 - goal.1;
        let (s, c) = (-goal.2).sin_cos();
        let rx = c * dx - s * dy;
        let ry = s * dx + c * dy;

        let center = (self.patch_dim as f64 - 1.0) / 2.0;
        if (rx * rx + ry * ry).sqrt() > center * res {
            return 0.0;
        }

        let xi = (rx / res + center).round() as i64;
        let yi = (ry / res + center).round() as i64;
        if xi < 0 || yi < 0 || xi as usize >= self.patch_dim || yi as usize >= self.patch_dim {
            return 0.0;
        }

        let yaw_diff = crate::geometry::constrain_angle_zero_2pi(start.2 - goal.2);
        let yaw_bin = ((yaw_diff / std::f64::consts::TAU) * self.yaw_dim as f64).round() as usize % self.yaw_dim;

        self.data[yaw_bin * self.patch_dim * self.patch_dim + yi as usize * self.patch_dim + xi as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_outside_patch_returns_zero() {
        let cache = NhwoCache::build(8, 5, 1.0, 5.0, 0.5);
        let far = cache.query((100.0, 100.0, 0.0), (0.0, 0.0, 0.0), 1.0);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn query_at_goal_is_zero_length() {
        let cache = NhwoCache::build(8, 9, 0.5, 5.0, 0.2);
        let same = cache.query((0.0, 0.0, 0.0), (0.0, 0.0, 0.0), 0.5);
        assert!(same < 0.5);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("nhwo_test_{}.data", std::process::id()));
        let cache = NhwoCache::build(4, 5, 1.0, 5.0, 0.5);
        cache.save(&path).unwrap();
        let loaded = NhwoCache::load(&path, 4, 5).unwrap();
        assert_eq!(cache.data, loaded.data);
        let _ = std::fs::remove_file(&path);
    }
}
