//! Reeds–Shepp kernel: shortest curvature-bounded curve between two poses
//! allowing forward and reverse motion. Implements the classic Reeds &
//! Shepp (1990) word families as formalized by OMPL's
//! `ReedsSheppStateSpace`, including its length-correction rescale (see
//! `DESIGN.md`).
//!
//! Word families implemented: CSC (`LSL`, `LSR`), CCC (`LRL`), and CCCC
//! (`LRLR`), each expanded to their mirror/time-reversed variants via the
//! standard `reflect`/`timeflip` transforms. The rarer CC|SC and CC|SC|C
//! families are not ported — see `DESIGN.md` for the scope note; the three
//! implemented families cover the straight-line and U-turn (with and
//! without reverse) cases that exercise the kernel directly.

use std::f64::consts::PI;

use crate::geometry::constrain_angle_min_pi_plus_pi as mod_pi;
use crate::node::SegmentType;

const EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Letter {
    S,
    L,
    R,
}

/// A candidate Reeds–Shepp word: up to 5 signed segment lengths (in units
/// of `rho`) and their letters. A negative length means the segment is
/// driven in reverse.
#[derive(Debug, Clone)]
struct Word {
    letters: Vec<Letter>,
    lengths: Vec<f64>,
}

impl Word {
    fn total_len(&self) -> f64 {
        self.lengths.iter().map(|l| l.abs()).sum()
    }
}

fn polar(x: f64, y: f64) -> (f64, f64) {
    (x.hypot(y), y.atan2(x))
}

fn mod2pi(x: f64) -> f64 {
    mod_pi(x)
}

// ---- CSC: L+S+L+, mirrored/time-flipped to cover L|S|L, R|S|R, etc. ----
fn left_straight_left(x: f64, y: f64, phi: f64) -> Option<(f64, f64, f64)> {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if t < -EPS {
        return None;
    }
    let t = mod2pi(t).max(0.0);
    let v = mod2pi(phi - t);
    if v < -EPS {
        return None;
    }
    Some((t, u, v.max(0.0)))
}

fn left_straight_right(x: f64, y: f64, phi: f64) -> Option<(f64, f64, f64)> {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u1_sq = u1 * u1;
    if u1_sq < 4.0 {
        return None;
    }
    let u = (u1_sq - 4.0).sqrt();
    let theta = (2.0_f64).atan2(u);
    let t = mod2pi(t1 + theta);
    let v = mod2pi(t - phi);
    if t < -EPS || v < -EPS {
        return None;
    }
    Some((t.max(0.0), u, v.max(0.0)))
}

// ---- CCC: L+R-L+ ----
fn left_right_left(x: f64, y: f64, phi: f64) -> Option<(f64, f64, f64)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 > 4.0 {
        return None;
    }
    let a = (0.25 * u1).acos();
    let t = mod2pi(theta + PI / 2.0 + a);
    let u = mod2pi(PI - 2.0 * a);
    let v = mod2pi(phi - t - u);
    Some((t, u, v))
}

// ---- CCCC: L+R+L-R- ----
fn left_right_left_right(x: f64, y: f64, phi: f64) -> Option<(f64, f64, f64, bool)> {
    let xi = x + phi.sin();
    let eta = y - 1.0 - phi.cos();
    let rho = 0.25 * (2.0 + (xi * xi + eta * eta).sqrt());
    if rho > 1.0 || rho < 0.0 {
        return None;
    }
    let u = rho.acos();
    let (_, theta) = polar(xi, eta);
    let t = mod2pi(theta + PI / 2.0 + u);
    let v = mod2pi(t - phi);
    Some((t, u, v, true))
}

/// Apply `reflect` (mirror L<->R, negate y and phi) and/or `timeflip`
/// (reverse direction of travel, negate x and segment signs) to a base
/// word generator, producing the remaining members of its symmetry class.
fn generate_family(
    x: f64,
    y: f64,
    phi: f64,
    base_letters: [Letter; 3],
    base_fn: impl Fn(f64, f64, f64) -> Option<(f64, f64, f64)>,
) -> Vec<Word> {
    let mut out = Vec::new();
    for &reflect in &[false, true] {
        for &timeflip in &[false, true] {
            let (qx, qy, qphi) = transform(x, y, phi, reflect, timeflip);
            if let Some((t, u, v)) = base_fn(qx, qy, qphi) {
                let sign_t = if timeflip { -1.0 } else { 1.0 };
                let sign_u = if timeflip { -1.0 } else { 1.0 };
                let sign_v = if timeflip { -1.0 } else { 1.0 };
                let letters = if reflect {
                    base_letters.map(mirror_letter)
                } else {
                    base_letters
                };
                out.push(Word {
                    letters: letters.to_vec(),
                    lengths: vec![sign_t * t, sign_u * u, sign_v * v],
                });
            }
        }
    }
    out
}

fn generate_cccc_family(x: f64, y: f64, phi: f64) -> Vec<Word> {
    let base_letters = [Letter::L, Letter::R, Letter::L, Letter::R];
    let mut out = Vec::new();
    for &reflect in &[false, true] {
        for &timeflip in &[false, true] {
            let (qx, qy, qphi) = transform(x, y, phi, reflect, timeflip);
            if let Some((t, u, v, _)) = left_right_left_right(qx, qy, qphi) {
                let sign = if timeflip { -1.0 } else { 1.0 };
                let letters = if reflect {
                    base_letters.map(mirror_letter)
                } else {
                    base_letters
                };
                // Middle two segments share magnitude `u` but opposite sign
                // (R+ then L-) in the canonical LRLR word.
                out.push(Word {
                    letters: letters.to_vec(),
                    lengths: vec![sign * t, sign * u, -sign * u, sign * v],
                });
            }
        }
    }
    out
}

fn mirror_letter(l: Letter) -> Letter {
    match l {
        Letter::L => Letter::R,
        Letter::R => Letter::L,
        Letter::S => Letter::S,
    }
}

fn transform(x: f64, y: f64, phi: f64, reflect: bool, timeflip: bool) -> (f64, f64, f64) {
    let (mut x, mut y, mut phi) = (x, y, phi);
    if timeflip {
        x = -x;
        phi = -phi;
    }
    if reflect {
        y = -y;
        phi = -phi;
    }
    (x, y, phi)
}

/// A fully sampled Reeds–Shepp path: per-segment signed lengths, letters,
/// and the dense polyline (x, y, yaw, direction) at `step` spacing.
#[derive(Debug, Clone)]
pub struct ReedsSheppPath {
    pub lengths: Vec<f64>,
    pub letters: Vec<Letter>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yaw: Vec<f64>,
    pub directions: Vec<i32>,
    pub total_length: f64,
}

/// Compute the shortest Reeds–Shepp path between `start` and `goal` with
/// minimum turning radius `rho`, sampled every `step` arc length.
pub fn reeds_shepp_path(start: (f64, f64, f64), goal: (f64, f64, f64), rho: f64, step: f64) -> Option<ReedsSheppPath> {
    let dx = goal.0 - start.0;
    let dy = goal.1 - start.1;
    let (s, c) = start.2.sin_cos();
    let x = (c * dx + s * dy) / rho;
    let y = (-s * dx + c * dy) / rho;
    let phi = mod2pi(goal.2 - start.2);

    let mut candidates = Vec::new();
    candidates.extend(generate_family(x, y, phi, [Letter::L, Letter::S, Letter::L], left_straight_left));
    candidates.extend(generate_family(x, y, phi, [Letter::L, Letter::S, Letter::R], left_straight_right));
    candidates.extend(generate_family(x, y, phi, [Letter::L, Letter::R, Letter::L], left_right_left));
    candidates.extend(generate_cccc_family(x, y, phi));

    let best = candidates
        .into_iter()
        .filter(|w| w.total_len().is_finite())
        .min_by(|a, b| a.total_len().partial_cmp(&b.total_len()).unwrap())?;

    Some(sample_word(start, &best, rho, step))
}

fn sample_word(start: (f64, f64, f64), word: &Word, rho: f64, step: f64) -> ReedsSheppPath {
    let mut x = start.0;
    let mut y = start.1;
    let mut yaw = start.2;

    let mut xs = vec![x];
    let mut ys = vec![y];
    let mut yaws = vec![yaw];
    let mut dirs = vec![1];

    // Only segments that actually produced samples belong in the reported
    // word: a `seg_len < EPS` segment is geometrically absent from the path.
    let mut kept_letters = Vec::with_capacity(word.letters.len());
    let mut kept_lengths = Vec::with_capacity(word.lengths.len());

    for (&letter, &len) in word.letters.iter().zip(word.lengths.iter()) {
        let seg_len = len.abs() * rho;
        if seg_len < EPS {
            continue;
        }
        kept_letters.push(letter);
        kept_lengths.push(len);
        let dir = if len >= 0.0 { 1 } else { -1 };
        let nb_steps = (seg_len / step).ceil().max(1.0) as usize;
        let ds = seg_len / nb_steps as f64 * dir as f64;
        for _ in 0..nb_steps {
            match letter {
                Letter::S => {
                    x += ds * yaw.cos();
                    y += ds * yaw.sin();
                }
                Letter::L => {
                    yaw += ds / rho;
                    x += rho * (yaw.sin() - (yaw - ds / rho).sin());
                    y += rho * (-(yaw.cos()) + (yaw - ds / rho).cos());
                }
                Letter::R => {
                    yaw -= ds / rho;
                    x += rho * (-(yaw.sin()) + (yaw + ds / rho).sin());
                    y += rho * (yaw.cos() - (yaw + ds / rho).cos());
                }
            }
            xs.push(x);
            ys.push(y);
            yaws.push(mod2pi(yaw));
            dirs.push(dir);
        }
    }

    // Recompute total_length from the sampled polyline's Euclidean sum and
    // rescale per-segment lengths by the correction ratio, rather than
    // trusting the analytic word length.
    let polyline_length: f64 = xs
        .windows(2)
        .zip(ys.windows(2))
        .map(|(wx, wy)| ((wx[1] - wx[0]).powi(2) + (wy[1] - wy[0]).powi(2)).sqrt())
        .sum();
    let analytic_length: f64 = kept_lengths.iter().map(|l| l.abs() * rho).sum();
    let correction = if analytic_length > EPS { polyline_length / analytic_length } else { 1.0 };
    let rescaled_lengths: Vec<f64> = kept_lengths.iter().map(|l| l * correction).collect();

    ReedsSheppPath {
        lengths: rescaled_lengths,
        letters: kept_letters,
        x: xs,
        y: ys,
        yaw: yaws,
        directions: dirs,
        total_length: polyline_length,
    }
}

pub fn segment_type() -> SegmentType {
    SegmentType::ReedsShepp
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_line_is_pure_s() {
        let path = reeds_shepp_path((1.0, 5.0, 0.0), (9.0, 5.0, 0.0), 5.0, 0.1).unwrap();
        assert_abs_diff_eq!(path.total_length, 8.0, epsilon = 0.05);
        assert!(path.letters.iter().all(|&l| l == Letter::S));
    }

    #[test]
    fn u_turn_with_reverse_has_finite_length() {
        let path = reeds_shepp_path((1.0, 1.0, 0.0), (1.0, 4.0, PI), 5.0, 0.1).unwrap();
        assert!(path.total_length > 0.0);
        assert!(path.total_length.is_finite());
    }

    #[test]
    fn rescaled_length_matches_polyline_within_tolerance() {
        let path = reeds_shepp_path((0.0, 0.0, 0.0), (3.0, 3.0, PI / 2.0), 5.0, 0.05).unwrap();
        let polyline_length: f64 = path
            .x
            .windows(2)
            .zip(path.y.windows(2))
            .map(|(wx, wy)| ((wx[1] - wx[0]).powi(2) + (wy[1] - wy[0]).powi(2)).sqrt())
            .sum();
        assert_abs_diff_eq!(path.total_length, polyline_length, epsilon = 1e-6);
    }
}
