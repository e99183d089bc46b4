use nalgebra::{Point3, Rotation3, Unit, Vector3};

const DEGENERACY_EPSILON: f64 = 1e-10;
const SINE_EPSILON: f64 = 1e-8;
const DIFFERENTIATION_STEP: f64 = 1e-6;

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

#[inline]
pub fn distance_squared(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm_squared()
}

/// Returns the angle `a-b-c` in radians, with `b` as the vertex.
pub fn bond_angle_radians(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let u = a - b;
    let v = c - b;
    let denominator = u.norm() * v.norm();
    if denominator < DEGENERACY_EPSILON {
        return 0.0;
    }
    (u.dot(&v) / denominator).clamp(-1.0, 1.0).acos()
}

pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    bond_angle_radians(a, b, c).to_degrees()
}

/// Returns the dihedral angle `a-b-c-d` in radians, in the range `(-π, π]`.
pub fn torsion_angle_radians(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let m = b1.cross(&b2);
    let n = b2.cross(&b3);

    let y = b2.norm() * b1.dot(&n);
    let x = m.dot(&n);
    y.atan2(x)
}

pub fn torsion_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    torsion_angle_radians(a, b, c, d).to_degrees()
}

/// Returns the out-of-plane (Wilson) angle in radians between the bond `b-d`
/// and the plane spanned by `a-b` and `c-b`. `b` is the central atom.
pub fn wilson_angle_radians(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let normal = (a - b).cross(&(c - b));
    let w = d - b;
    let denominator = normal.norm() * w.norm();
    if denominator < DEGENERACY_EPSILON {
        return 0.0;
    }
    (normal.dot(&w) / denominator).clamp(-1.0, 1.0).asin()
}

pub fn wilson_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    wilson_angle_radians(a, b, c, d).to_degrees()
}

/// Gradient of `|a - b|` with respect to `a` and `b`.
///
/// Coincident points have no defined direction; the unit x axis is used, so a term
/// whose energy falls with distance still pushes the points apart.
pub fn distance_gradient(a: &Point3<f64>, b: &Point3<f64>) -> [Vector3<f64>; 2] {
    let r = a - b;
    let length = r.norm();
    if length < DEGENERACY_EPSILON {
        let ga = Vector3::x();
        return [ga, -ga];
    }
    let ga = r / length;
    [ga, -ga]
}

/// Gradient of the bond angle (radians) with respect to `a`, `b` and `c`.
///
/// Near 0° or 180° the closed form divides by `sin θ`, so the gradient is
/// obtained by central differences of the angle instead.
pub fn bond_angle_gradient_radians(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> [Vector3<f64>; 3] {
    let u = a - b;
    let v = c - b;
    let lu = u.norm();
    let lv = v.norm();
    if lu < DEGENERACY_EPSILON || lv < DEGENERACY_EPSILON {
        return [Vector3::zeros(); 3];
    }

    let cosine = (u.dot(&v) / (lu * lv)).clamp(-1.0, 1.0);
    let sine = (1.0 - cosine * cosine).sqrt();
    if sine < SINE_EPSILON {
        return central_difference([*a, *b, *c], |p| {
            bond_angle_radians(&p[0], &p[1], &p[2])
        });
    }

    let ga = (v / (lu * lv) - u * (cosine / (lu * lu))) * (-1.0 / sine);
    let gc = (u / (lu * lv) - v * (cosine / (lv * lv))) * (-1.0 / sine);
    [ga, -(ga + gc), gc]
}

pub fn bond_angle_gradient(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> [Vector3<f64>; 3] {
    bond_angle_gradient_radians(a, b, c).map(|g| g * 1f64.to_degrees())
}

/// Gradient of the torsion angle (radians) with respect to `a`, `b`, `c` and `d`.
///
/// When either `a-b-c` or `b-c-d` is collinear the dihedral is undefined and the
/// closed form would divide by a vanishing cross product; central differences are
/// used instead.
pub fn torsion_angle_gradient_radians(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> [Vector3<f64>; 4] {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let m = b1.cross(&b2);
    let n = b2.cross(&b3);
    let m2 = m.norm_squared();
    let n2 = n.norm_squared();
    let l2 = b2.norm_squared();

    if m2 < DEGENERACY_EPSILON || n2 < DEGENERACY_EPSILON || l2 < DEGENERACY_EPSILON {
        return central_difference([*a, *b, *c, *d], |p| {
            torsion_angle_radians(&p[0], &p[1], &p[2], &p[3])
        });
    }

    let length = l2.sqrt();
    let ga = m * (-length / m2);
    let gd = n * (length / n2);
    let p = b1.dot(&b2) / l2;
    let q = b3.dot(&b2) / l2;
    let gb = ga * (-p - 1.0) + gd * q;
    let gc = gd * (-q - 1.0) + ga * p;
    [ga, gb, gc, gd]
}

pub fn torsion_angle_gradient(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> [Vector3<f64>; 4] {
    torsion_angle_gradient_radians(a, b, c, d).map(|g| g * 1f64.to_degrees())
}

/// Gradient of the Wilson angle (radians) with respect to `a`, `b`, `c` and `d`.
///
/// With `u = a - b`, `v = c - b`, `w = d - b`, `n = u × v` and
/// `s = n·w / (|n||w|)`, the angle is `asin(s)`. The closed form breaks down when
/// `a-b-c` is collinear, `d` coincides with `b`, or `d` is perpendicular to the
/// plane (`|s| → 1`); those cases fall back to central differences.
pub fn wilson_angle_gradient_radians(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> [Vector3<f64>; 4] {
    let u = a - b;
    let v = c - b;
    let w = d - b;
    let normal = u.cross(&v);
    let ln = normal.norm();
    let lw = w.norm();

    let fallback = || {
        central_difference([*a, *b, *c, *d], |p| {
            wilson_angle_radians(&p[0], &p[1], &p[2], &p[3])
        })
    };

    if ln < DEGENERACY_EPSILON || lw < DEGENERACY_EPSILON {
        return fallback();
    }

    let s = (normal.dot(&w) / (ln * lw)).clamp(-1.0, 1.0);
    let cosine = (1.0 - s * s).sqrt();
    if cosine < SINE_EPSILON {
        return fallback();
    }

    let scale = 1.0 / cosine;
    let du = v.cross(&w) / (ln * lw) - v.cross(&normal) * (s / (ln * ln));
    let dv = w.cross(&u) / (ln * lw) - normal.cross(&u) * (s / (ln * ln));
    let dw = normal / (ln * lw) - w * (s / (lw * lw));

    let ga = du * scale;
    let gc = dv * scale;
    let gd = dw * scale;
    [ga, -(ga + gc + gd), gc, gd]
}

pub fn wilson_angle_gradient(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> [Vector3<f64>; 4] {
    wilson_angle_gradient_radians(a, b, c, d).map(|g| g * 1f64.to_degrees())
}

/// Root-mean-square deviation between two equally sized point sets.
///
/// Returns `None` if the sets differ in length or are empty.
pub fn rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| distance_squared(p1, p2))
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

fn central_difference<const N: usize, F>(points: [Point3<f64>; N], f: F) -> [Vector3<f64>; N]
where
    F: Fn(&[Point3<f64>; N]) -> f64,
{
    let mut gradient = [Vector3::zeros(); N];
    let mut work = points;
    for i in 0..N {
        for axis in 0..3 {
            let original = work[i][axis];
            work[i][axis] = original + DIFFERENTIATION_STEP;
            let plus = f(&work);
            work[i][axis] = original - DIFFERENTIATION_STEP;
            let minus = f(&work);
            work[i][axis] = original;
            gradient[i][axis] = (plus - minus) / (2.0 * DIFFERENTIATION_STEP);
        }
    }
    gradient
}
