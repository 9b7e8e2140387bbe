//! Vertex normals for SLv1 meshes, which store none

use glam::Vec3;

/// Area-weighted smooth normals over a triangle list.
///
/// Each face adds its unnormalized cross product to its three vertices, so
/// larger faces weigh more. Vertices touched by no face (or only by
/// degenerate faces) get `+Z`.
#[must_use]
pub fn smooth_normals(positions: &[[f32; 3]], faces: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; positions.len()];

    for face in faces {
        let [a, b, c] = face.map(|i| i as usize);
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
        let face_normal = (pb - pa).cross(pc - pa);
        sums[a] += face_normal;
        sums[b] += face_normal;
        sums[c] += face_normal;
    }

    sums.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z).to_array())
        .collect()
}
