//! Scene builder: normalizes and links a [`RawContainer`] into a [`Scene`]
//!
//! The builder owns every dialect-dependent convention so the scene model
//! is uniform:
//! - SLv2 UVs are flipped (`v = 1 - v`); SLv1 UVs pass through
//! - `MSHX` objects have their faces rewound to counter-clockwise
//! - SLv1 meshes get computed smooth normals
//! - the two SLv2 padding vertices are dropped when unreferenced
//!
//! Raw indices that point nowhere are dropped with a diagnostic, or fail the
//! build when [`ImportOptions::strict_references`] is set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::hierarchy::validate_hierarchy;
use super::normals::smooth_normals;
use super::textures::resolve_texture;
use super::types::{
    Camera, Diagnostic, FaceGroup, Material, Mesh, Object, Projection, Scene, ShapeKeyFrame,
    ShapeKeyTrack, Texture, TextureResolution, TrackTarget, Transform, TransformSample,
    TransformTrack, Vertex, unpack_argb,
};
use crate::error::{Error, Result};
use crate::formats::bwx::{
    Dialect, EXTRA_VERTICES_SLV2, RawCamera, RawContainer, RawMaterial, RawMatrixSample,
    RawMatrixTrack, RawMesh, RawObject, timeline_to_frame,
};
use crate::import::{ImportOptions, animation_name_from_path, is_helper_object};
use crate::utils::{file_stem, normalize_path, texture_key};

/// Build a [`Scene`] from decoded records.
///
/// `base_path` is the model file (or its directory). It anchors texture
/// resolution and names the animation.
///
/// # Errors
/// Fails on shape-key frames that do not match their base mesh, keyframes
/// that do not strictly increase, face indices out of range, a cyclic
/// parent graph, and (in strict mode) dangling references.
pub fn build(raw: &RawContainer, base_path: Option<&Path>, options: &ImportOptions) -> Result<Scene> {
    SceneBuilder::new(raw, base_path, options).build()
}

struct SceneBuilder<'a> {
    raw: &'a RawContainer,
    options: &'a ImportOptions,
    asset_dir: Option<PathBuf>,
    animation_name: String,
    textures: Vec<Texture>,
    /// Lowercased normalized path -> index into `textures`.
    texture_lookup: HashMap<String, usize>,
    materials: Vec<Material>,
    /// Per MTRL group, the scene material index of each slot.
    material_groups: Vec<Vec<usize>>,
    diagnostics: Vec<Diagnostic>,
}

/// Mesh plus the per-part data shape keys are assembled from.
struct BuiltMesh<'r> {
    mesh: Mesh,
    parts: Vec<MeshPart<'r>>,
}

struct MeshPart<'r> {
    raw: &'r RawMesh,
    /// Vertices kept from the raw buffer.
    vertex_count: usize,
}

impl<'a> SceneBuilder<'a> {
    fn new(raw: &'a RawContainer, base_path: Option<&Path>, options: &'a ImportOptions) -> Self {
        let asset_dir = base_path.map(|p| {
            if p.is_dir() {
                p.to_path_buf()
            } else {
                p.parent().map(Path::to_path_buf).unwrap_or_default()
            }
        });

        // A bare directory names nothing; fall back to the HEAD name.
        let animation_name = base_path
            .filter(|p| !p.is_dir())
            .and_then(animation_name_from_path)
            .unwrap_or_else(|| raw.header.name.clone());

        let mut diagnostics: Vec<Diagnostic> = raw
            .lossy_strings
            .iter()
            .map(|&offset| Diagnostic::UndecodableString { offset })
            .collect();
        diagnostics.extend(
            raw.extra_blocks
                .iter()
                .map(|name| Diagnostic::OpaqueBlock { name: name.clone() }),
        );

        Self {
            raw,
            options,
            asset_dir,
            animation_name,
            textures: Vec::new(),
            texture_lookup: HashMap::new(),
            materials: Vec::new(),
            material_groups: Vec::new(),
            diagnostics,
        }
    }

    fn build(mut self) -> Result<Scene> {
        let raw = self.raw;
        tracing::debug!(
            dialect = %raw.dialect(),
            materials = raw.materials.len(),
            objects = raw.objects.len(),
            cameras = raw.cameras.len(),
            "building scene"
        );

        for (group, material) in raw.materials.iter().enumerate() {
            self.add_material_group(group, material);
        }

        let objects = self.build_objects()?;
        validate_hierarchy(&objects)?;

        let cameras = if self.options.import_cameras {
            raw.cameras
                .iter()
                .enumerate()
                .map(|(index, camera)| self.build_camera(index, camera))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Scene {
            dialect: raw.dialect(),
            name: raw.header.name.clone(),
            description: raw.header.description.clone(),
            animation_name: self.animation_name,
            textures: self.textures,
            materials: self.materials,
            objects,
            cameras,
            diagnostics: self.diagnostics,
        })
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// Apply the dangling-reference policy.
    fn dangling(&mut self, kind: &'static str, owner: &str, index: i64, len: usize) -> Result<()> {
        if self.options.strict_references {
            return Err(Error::DanglingReference { kind, index, len });
        }
        tracing::warn!(kind, owner, index, len, "dropping dangling reference");
        self.diagnostics.push(Diagnostic::DanglingReference {
            kind: kind.to_string(),
            owner: owner.to_string(),
            index,
            len,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Materials and textures
    // ------------------------------------------------------------------

    fn add_material_group(&mut self, group: usize, material: &RawMaterial) {
        let mut slots = Vec::with_capacity(material.sub_materials.len());
        for (slot, sub) in material.sub_materials.iter().enumerate() {
            let texture = sub
                .texture
                .as_ref()
                .and_then(|t| self.intern_texture(&t.filename));
            slots.push(self.materials.len());
            self.materials.push(Material {
                name: material.name.clone(),
                group,
                slot,
                diffuse: unpack_argb(sub.diffuse),
                ambient: unpack_argb(sub.ambient),
                specular: unpack_argb(sub.specular),
                shininess: sub.shininess,
                highlight: sub.highlight,
                flags: sub.flags,
                blend: sub.blend,
                texture,
            });
        }
        self.material_groups.push(slots);
    }

    /// Index of the texture for `stored`, resolving it on first sight.
    fn intern_texture(&mut self, stored: &str) -> Option<usize> {
        let path = normalize_path(stored);
        if path.trim().is_empty() {
            return None;
        }
        let key = texture_key(&path);
        if let Some(&index) = self.texture_lookup.get(&key) {
            return Some(index);
        }

        let lookup = resolve_texture(
            &path,
            self.asset_dir.as_deref(),
            self.options.graphic_search_depth,
        );
        if lookup.resolution == TextureResolution::Unresolved {
            tracing::warn!(texture = %path, "unresolved texture");
            self.diagnostics
                .push(Diagnostic::UnresolvedTexture { path: path.clone() });
        }

        let index = self.textures.len();
        self.textures.push(Texture {
            name: file_stem(&path),
            path,
            search_roots: lookup.search_roots,
            resolution: lookup.resolution,
        });
        self.texture_lookup.insert(key, index);
        Some(index)
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    fn build_objects(&mut self) -> Result<Vec<Object>> {
        let raw = self.raw;

        // Raw object index -> scene object index.
        let mut remap = Vec::with_capacity(raw.objects.len());
        let mut kept = 0usize;
        for object in &raw.objects {
            if self.options.skip_helper_objects && is_helper_object(&object.name) {
                tracing::debug!(name = %object.name, "skipping helper object");
                self.diagnostics.push(Diagnostic::SkippedHelperObject {
                    name: object.name.clone(),
                });
                remap.push(None);
            } else {
                remap.push(Some(kept));
                kept += 1;
            }
        }

        let mut tracks: Vec<Vec<&RawMatrixTrack>> = vec![Vec::new(); raw.objects.len()];
        for track in &raw.transform_tracks {
            match tracks.get_mut(track.object) {
                Some(owned) => owned.push(track),
                None => self.dangling(
                    "transform track",
                    "MATRIX",
                    i64::try_from(track.object).unwrap_or(i64::MAX),
                    raw.objects.len(),
                )?,
            }
        }

        let mut objects = Vec::with_capacity(kept);
        for (index, object) in raw.objects.iter().enumerate() {
            let Some(scene_index) = remap[index] else {
                continue;
            };
            let mut built = self.build_object(object, scene_index, &tracks[index])?;
            built.parent = match object.parent {
                None => None,
                Some(parent) => match remap.get(parent) {
                    Some(Some(mapped)) => Some(*mapped),
                    // Parent was a skipped helper: the child becomes a root.
                    Some(None) => None,
                    None => {
                        self.dangling(
                            "parent",
                            &object.name,
                            i64::try_from(parent).unwrap_or(i64::MAX),
                            raw.objects.len(),
                        )?;
                        None
                    }
                },
            };
            objects.push(built);
        }
        Ok(objects)
    }

    fn build_object(
        &mut self,
        object: &RawObject,
        scene_index: usize,
        tracks: &[&RawMatrixTrack],
    ) -> Result<Object> {
        let group_slots = self.material_group(object)?;
        let built = self.build_mesh(object, group_slots.as_deref())?;

        let shape_keys = match &built {
            Some(built) if self.options.import_animations => {
                build_shape_keys(&object.name, built)?
            }
            _ => None,
        };

        let transform = tracks
            .iter()
            .find_map(|t| t.samples.first())
            .map(|s| Transform::from_matrix(&s.matrix));

        let mut transform_tracks = Vec::new();
        if self.options.import_animations {
            for track in tracks.iter().filter(|t| !t.samples.is_empty()) {
                let name = if transform_tracks.is_empty() {
                    object.name.clone()
                } else {
                    format!("{}.{}", object.name, transform_tracks.len())
                };
                transform_tracks.push(build_track(
                    name,
                    TrackTarget::Object(scene_index),
                    &track.samples,
                )?);
            }
        }

        Ok(Object {
            name: object.name.clone(),
            parent: None,
            reversed_winding: object.direction.is_reversed(),
            mesh: built.map(|b| b.mesh),
            shape_keys,
            transform_tracks,
            transform,
        })
    }

    /// Scene material indices of the object's MTRL group.
    fn material_group(&mut self, object: &RawObject) -> Result<Option<Vec<usize>>> {
        if object.material < 0 {
            return Ok(None);
        }
        let group = usize::try_from(object.material)
            .ok()
            .and_then(|g| self.material_groups.get(g));
        match group {
            Some(slots) => Ok(Some(slots.clone())),
            None => {
                self.dangling(
                    "material",
                    &object.name,
                    object.material,
                    self.material_groups.len(),
                )?;
                Ok(None)
            }
        }
    }

    /// Merge every mesh record of `object` into one mesh, one face group per record.
    fn build_mesh<'r>(
        &mut self,
        object: &'r RawObject,
        group_slots: Option<&[usize]>,
    ) -> Result<Option<BuiltMesh<'r>>> {
        if object.meshes.is_empty() {
            return Ok(None);
        }

        let dialect = self.raw.dialect();
        let reversed = object.direction.is_reversed();
        let mut mesh = Mesh::default();
        let mut parts = Vec::with_capacity(object.meshes.len());

        for part in &object.meshes {
            let base = part.frames.first();
            let positions = base.map_or(&[][..], |f| &f.positions[..]);
            let raw_count = positions.len();

            if part.indices.len() % 3 != 0 {
                return Err(Error::malformed(
                    0,
                    format!(
                        "'{}': {} indices is not a triangle list",
                        object.name,
                        part.indices.len()
                    ),
                ));
            }
            if let Some(&bad) = part.indices.iter().find(|&&i| i as usize >= raw_count) {
                return Err(Error::malformed(
                    0,
                    format!(
                        "'{}': face index {bad} out of range for {raw_count} vertices",
                        object.name
                    ),
                ));
            }

            let vertex_count = kept_vertex_count(dialect, raw_count, &part.indices);
            let offset = u32::try_from(mesh.vertices.len())
                .map_err(|_| Error::malformed(0, format!("'{}': too many vertices", object.name)))?;

            for i in 0..vertex_count {
                let uv = base.and_then(|f| f.uvs.get(i)).map_or([0.0, 0.0], |&[u, v]| {
                    match dialect {
                        Dialect::SLv2 => [u, 1.0 - v],
                        Dialect::SLv1 => [u, v],
                    }
                });
                let normal = base
                    .and_then(|f| f.normals.get(i))
                    .copied()
                    .unwrap_or([0.0, 0.0, 1.0]);
                mesh.vertices.push(Vertex {
                    position: positions[i],
                    normal,
                    uv,
                });
            }

            let first_face = mesh.faces.len();
            for tri in part.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0] + offset, tri[1] + offset, tri[2] + offset];
                mesh.faces.push(if reversed { [a, c, b] } else { [a, b, c] });
            }

            let material = self.face_material(object, part, group_slots)?;
            mesh.groups.push(FaceGroup {
                material,
                first_face,
                face_count: mesh.faces.len() - first_face,
            });
            parts.push(MeshPart {
                raw: part,
                vertex_count,
            });
        }

        if dialect == Dialect::SLv1 {
            let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
            for (vertex, normal) in mesh
                .vertices
                .iter_mut()
                .zip(smooth_normals(&positions, &mesh.faces))
            {
                vertex.normal = normal;
            }
        }

        Ok(Some(BuiltMesh { mesh, parts }))
    }

    fn face_material(
        &mut self,
        object: &RawObject,
        part: &RawMesh,
        group_slots: Option<&[usize]>,
    ) -> Result<Option<usize>> {
        let (Some(slots), Some(slot)) = (group_slots, part.sub_material) else {
            return Ok(None);
        };
        if slot < 0 {
            return Ok(None);
        }
        match usize::try_from(slot).ok().and_then(|s| slots.get(s)) {
            Some(&material) => Ok(Some(material)),
            None => {
                self.dangling("sub-material", &object.name, slot, slots.len())?;
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Cameras
    // ------------------------------------------------------------------

    fn build_camera(&self, index: usize, camera: &RawCamera) -> Result<Camera> {
        let first = camera.frames.first();
        let transform = first.map(|f| Transform::from_matrix(&f.eye));
        let target = first.map(|f| [f.target[12], f.target[13], f.target[14]]);

        let (track, target_track) = if self.options.import_animations && !camera.frames.is_empty() {
            let eye: Vec<RawMatrixSample> = camera
                .frames
                .iter()
                .map(|f| RawMatrixSample {
                    timeline: f.timeline,
                    matrix: f.eye,
                })
                .collect();
            let look_at: Vec<RawMatrixSample> = camera
                .frames
                .iter()
                .map(|f| RawMatrixSample {
                    timeline: f.timeline,
                    matrix: f.target,
                })
                .collect();
            (
                Some(build_track(
                    camera.name.clone(),
                    TrackTarget::Camera(index),
                    &eye,
                )?),
                Some(build_track(
                    format!("{}.target", camera.name),
                    TrackTarget::Camera(index),
                    &look_at,
                )?),
            )
        } else {
            (None, None)
        };

        Ok(Camera {
            name: camera.name.clone(),
            projection: Projection::default(),
            transform,
            target,
            track,
            target_track,
        })
    }
}

/// Number of raw vertices kept: SLv2 buffers end in two padding vertices,
/// which are dropped unless a face uses them.
fn kept_vertex_count(dialect: Dialect, raw_count: usize, indices: &[u32]) -> usize {
    if dialect != Dialect::SLv2 || raw_count < EXTRA_VERTICES_SLV2 {
        return raw_count;
    }
    let trimmed = raw_count - EXTRA_VERTICES_SLV2;
    if indices.iter().all(|&i| (i as usize) < trimmed) {
        trimmed
    } else {
        raw_count
    }
}

fn ensure_increasing(track: &str, timelines: impl IntoIterator<Item = u32>) -> Result<()> {
    let mut previous: Option<u32> = None;
    for timeline in timelines {
        if previous.is_some_and(|p| timeline <= p) {
            return Err(Error::UnorderedKeyframes {
                track: track.to_string(),
                timeline,
            });
        }
        previous = Some(timeline);
    }
    Ok(())
}

fn build_track(name: String, target: TrackTarget, samples: &[RawMatrixSample]) -> Result<TransformTrack> {
    ensure_increasing(&name, samples.iter().map(|s| s.timeline))?;
    let samples = samples
        .iter()
        .map(|s| TransformSample {
            timeline: s.timeline,
            frame: timeline_to_frame(s.timeline),
            matrix: s.matrix,
            transform: Transform::from_matrix(&s.matrix),
        })
        .collect();
    Ok(TransformTrack {
        name,
        target,
        samples,
    })
}

/// Per-vertex morph track over the merged mesh.
///
/// The frame count is the longest part's; a part with fewer frames holds
/// its last one. Every animated part must share the longest part's
/// timelines up to its own length. A frame may carry either the raw or the
/// kept vertex count of its part (SLv2 frames keep their padding).
fn build_shape_keys(name: &str, built: &BuiltMesh<'_>) -> Result<Option<ShapeKeyTrack>> {
    let frame_count = built
        .parts
        .iter()
        .map(|p| p.raw.frames.len())
        .max()
        .unwrap_or(0);
    if frame_count <= 1 {
        return Ok(None);
    }

    let timelines: Vec<u32> = built
        .parts
        .iter()
        .find(|p| p.raw.frames.len() == frame_count)
        .map(|p| p.raw.frames.iter().map(|f| f.timeline).collect())
        .unwrap_or_default();
    ensure_increasing(name, timelines.iter().copied())?;
    for part in built.parts.iter().filter(|p| p.raw.frames.len() > 1) {
        ensure_increasing(name, part.raw.frames.iter().map(|f| f.timeline))?;
        if let Some((frame, _)) = part
            .raw
            .frames
            .iter()
            .zip(&timelines)
            .find(|(f, t)| f.timeline != **t)
        {
            return Err(Error::UnorderedKeyframes {
                track: name.to_string(),
                timeline: frame.timeline,
            });
        }
    }

    let mut frames = Vec::with_capacity(frame_count);
    for (frame_index, &timeline) in timelines.iter().enumerate() {
        let mut positions = Vec::with_capacity(built.mesh.vertices.len());
        for part in &built.parts {
            let Some(frame) = part
                .raw
                .frames
                .get(frame_index)
                .or_else(|| part.raw.frames.last())
            else {
                continue;
            };
            let raw_count = part.raw.frames.first().map_or(0, |f| f.positions.len());
            let found = frame.positions.len();
            if found != part.vertex_count && found != raw_count {
                return Err(Error::ShapeKeyMismatch {
                    object: name.to_string(),
                    frame: frame_index,
                    expected: part.vertex_count,
                    found,
                });
            }
            positions.extend_from_slice(&frame.positions[..part.vertex_count]);
        }
        frames.push(ShapeKeyFrame {
            timeline,
            frame: timeline_to_frame(timeline),
            positions,
        });
    }

    Ok(Some(ShapeKeyTrack {
        name: name.to_string(),
        frames,
    }))
}
