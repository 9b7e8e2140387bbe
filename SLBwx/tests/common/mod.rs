//! Minimal BWX writer for building test fixtures in memory.

#![allow(dead_code)]

pub const SLV1: u16 = 0x0500;
pub const SLV2: u16 = 0x0602;
pub const MNHX: u32 = 0x4D4E_4858;
pub const MSHX: u32 = 0x4D53_4858;

pub fn varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn int(out: &mut Vec<u8>, value: i64) {
    if (0..0x20).contains(&value) {
        out.push(value as u8);
    } else {
        out.push(b'I');
        out.extend_from_slice(&(value as i32).to_le_bytes());
    }
}

pub fn float(out: &mut Vec<u8>, value: f32) {
    out.push(b'F');
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn string(out: &mut Vec<u8>, value: &str) {
    string_bytes(out, value.as_bytes());
}

pub fn string_bytes(out: &mut Vec<u8>, value: &[u8]) {
    out.push(b'S');
    varint(out, value.len() as u64);
    out.extend_from_slice(value);
}

pub fn bytes(out: &mut Vec<u8>, value: &[u8]) {
    out.push(b'B');
    varint(out, value.len() as u64);
    out.extend_from_slice(value);
}

pub fn inline(out: &mut Vec<u8>, value: &[u8]) {
    assert!(value.len() < 0x80);
    out.push(0x80 | value.len() as u8);
    out.extend_from_slice(value);
}

pub fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// `A size count body`, with `size` covering the count varint and body.
pub fn record(out: &mut Vec<u8>, count: usize, body: &[u8]) {
    let mut count_bytes = Vec::new();
    varint(&mut count_bytes, count as u64);
    out.push(b'A');
    varint(out, (count_bytes.len() + body.len()) as u64);
    out.extend_from_slice(&count_bytes);
    out.extend_from_slice(body);
}

pub fn identity_with_translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    let mut m = [0.0; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[15] = 1.0;
    m[12] = x;
    m[13] = y;
    m[14] = z;
    m
}

// ============================================================================
// Records
// ============================================================================

pub fn sub_material(diffuse: u32, texture: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "SUBMTRL");
    int(&mut body, i64::from(diffuse as i32));
    int(&mut body, i64::from(0xFF20_2020u32 as i32));
    int(&mut body, i64::from(0xFFFF_FFFFu32 as i32));
    float(&mut body, 10.0);
    float(&mut body, 0.5);
    int(&mut body, 0);
    int(&mut body, 1);
    let count = if let Some(filename) = texture {
        let mut tex = Vec::new();
        string(&mut tex, "TEX");
        int(&mut tex, 0);
        string(&mut tex, filename);
        record(&mut body, 3, &tex);
        9
    } else {
        8
    };
    let mut out = Vec::new();
    record(&mut out, count, &body);
    out
}

pub fn material(name: &str, subs: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "MTRL");
    string(&mut body, name);
    for sub in subs {
        body.extend_from_slice(sub);
    }
    let mut out = Vec::new();
    record(&mut out, 2 + subs.len(), &body);
    out
}

/// One vertex frame: positions and UVs.
#[derive(Clone)]
pub struct Frame {
    pub timeline: u32,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

pub fn triangle(timeline: u32, z: f32) -> Frame {
    Frame {
        timeline,
        positions: vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.25]],
    }
}

pub fn mesh_v1(sub_material: i64, frames: &[Frame], indices: &[u32]) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "MESH");

    let mut frame_bytes = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        let mut fb = Vec::new();
        string(&mut fb, "MESHF");
        int(&mut fb, i64::from(frame.timeline));
        let mut verts = Vec::new();
        for p in &frame.positions {
            inline(&mut verts, &floats(p));
        }
        record(&mut fb, frame.positions.len(), &verts);
        let mut uvs = Vec::new();
        let uv_count = if i == 0 { frame.uvs.len() } else { 0 };
        for uv in frame.uvs.iter().take(uv_count) {
            inline(&mut uvs, &floats(uv));
        }
        record(&mut fb, uv_count, &uvs);
        record(&mut frame_bytes, 4, &fb);
    }
    record(&mut body, frames.len(), &frame_bytes);

    let mut subs = Vec::new();
    int(&mut subs, sub_material);
    record(&mut body, 1, &subs);

    let mut index_bytes = Vec::new();
    for &i in indices {
        int(&mut index_bytes, i64::from(i));
    }
    record(&mut body, indices.len(), &index_bytes);

    for _ in 0..4 {
        int(&mut body, 0);
    }

    let mut out = Vec::new();
    record(&mut out, 8, &body);
    out
}

/// SLv2 mesh; two padding vertices are appended to every frame, and UVs
/// are written as `1 - v` the way the exporter does.
pub fn mesh_v2(sub_material: i64, frames: &[Frame], indices: &[u32]) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "DXMESH");
    int(&mut body, sub_material);

    let mut frame_bytes = Vec::new();
    for frame in frames {
        let mut fb = Vec::new();
        string(&mut fb, "DXMESHF");
        int(&mut fb, i64::from(frame.timeline));
        int(&mut fb, 0x15);
        let count = frame.positions.len() + 2;
        int(&mut fb, count as i64);
        int(&mut fb, 32);
        let mut buffer = Vec::new();
        for (i, p) in frame.positions.iter().enumerate() {
            let [u, v] = frame.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
            buffer.extend(floats(&[p[0], p[1], p[2], 0.0, 0.0, 1.0, u, 1.0 - v]));
        }
        buffer.extend(floats(&[0.0; 16]));
        bytes(&mut fb, &buffer);
        record(&mut frame_bytes, 6, &fb);
    }
    record(&mut body, frames.len(), &frame_bytes);

    int(&mut body, indices.len() as i64);
    let index_buffer: Vec<u8> = indices
        .iter()
        .flat_map(|&i| (i as u16).to_le_bytes())
        .collect();
    bytes(&mut body, &index_buffer);

    let mut out = Vec::new();
    record(&mut out, 5, &body);
    out
}

/// `(timeline, matrix)` samples of one MATRIX record.
pub fn matrix(version: u16, samples: &[(u32, [f32; 16])]) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "MATRIX");
    for (timeline, m) in samples {
        body.push(if version == SLV1 { 0xC4 } else { 0xE0 });
        body.extend_from_slice(&timeline.to_le_bytes());
        body.extend(floats(m));
        if version == SLV2 {
            body.extend(floats(&[0.0; 7]));
        }
    }
    let mut out = Vec::new();
    record(&mut out, 1 + samples.len(), &body);
    out
}

pub fn object(
    version: u16,
    name: &str,
    material: i64,
    direction: u32,
    meshes: &[Vec<u8>],
    matrices: &[Vec<u8>],
) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, if version == SLV1 { "OBJ2" } else { "DXOBJ" });
    string(&mut body, name);
    int(&mut body, 0);
    int(&mut body, material);
    int(&mut body, 0);
    int(&mut body, 0);
    body.push(b'I');
    body.extend_from_slice(&direction.to_le_bytes());
    let mesh_bytes: Vec<u8> = meshes.concat();
    record(&mut body, meshes.len(), &mesh_bytes);
    let matrix_bytes: Vec<u8> = matrices.concat();
    record(&mut body, matrices.len(), &matrix_bytes);
    int(&mut body, 0);
    let mut out = Vec::new();
    record(&mut out, 10, &body);
    out
}

pub fn camera(name: &str, frames: &[(u32, [f32; 16], [f32; 16])]) -> Vec<u8> {
    let mut body = Vec::new();
    string(&mut body, "CAM");
    string(&mut body, name);
    body.push(b'I');
    body.extend_from_slice(&0x4341_4D52i32.to_le_bytes());
    int(&mut body, 0);
    for (timeline, eye, target) in frames {
        let mut frame = timeline.to_le_bytes().to_vec();
        frame.extend(floats(eye));
        frame.extend(floats(target));
        frame.extend(floats(&[0.0; 6]));
        bytes(&mut body, &frame);
    }
    let mut out = Vec::new();
    record(&mut out, 4 + frames.len(), &body);
    out
}

// ============================================================================
// Container
// ============================================================================

/// Builds a whole `BWXF ... FXWB` file block by block.
pub struct BwxBuilder {
    blocks: Vec<Vec<u8>>,
}

impl BwxBuilder {
    pub fn new() -> Self {
        let mut builder = Self { blocks: Vec::new() };
        let mut signature = Vec::new();
        string(&mut signature, "SLBWX");
        builder.raw_block("0", &signature);
        builder
    }

    /// Start with the signature and a HEAD block of `version`.
    pub fn with_head(version: u16) -> Self {
        let mut builder = Self::new();
        builder.head("model", "test model", version);
        builder
    }

    pub fn raw_block(&mut self, name: &str, payload: &[u8]) -> &mut Self {
        let mut block = Vec::new();
        varint(&mut block, name.len() as u64);
        block.extend_from_slice(name.as_bytes());
        block.extend_from_slice(payload);
        self.blocks.push(block);
        self
    }

    pub fn head(&mut self, name: &str, description: &str, version: u16) -> &mut Self {
        let mut body = Vec::new();
        string(&mut body, name);
        string(&mut body, description);
        body.push(b'I');
        body.extend_from_slice(&0x504E_5800i32.to_le_bytes());
        body.push(b'W');
        body.extend_from_slice(&version.to_le_bytes());
        int(&mut body, 0);
        let mut payload = Vec::new();
        record(&mut payload, 4, &body);
        self.raw_block("HEAD", &payload)
    }

    pub fn materials(&mut self, materials: &[Vec<u8>]) -> &mut Self {
        let mut payload = Vec::new();
        record(&mut payload, materials.len(), &materials.concat());
        self.raw_block("MTRL", &payload)
    }

    pub fn objects(&mut self, block: &str, objects: &[Vec<u8>]) -> &mut Self {
        let mut payload = Vec::new();
        record(&mut payload, objects.len(), &objects.concat());
        self.raw_block(block, &payload)
    }

    pub fn cameras(&mut self, cameras: &[Vec<u8>]) -> &mut Self {
        let mut payload = Vec::new();
        record(&mut payload, cameras.len(), &cameras.concat());
        self.raw_block("CAM", &payload)
    }

    pub fn finish(&self) -> Vec<u8> {
        let body: Vec<u8> = self.blocks.concat();
        let mut out = b"BWXF".to_vec();
        varint(&mut out, body.len() as u64);
        varint(&mut out, self.blocks.len() as u64);
        out.extend_from_slice(&body);
        out.extend_from_slice(b"FXWB");
        out
    }
}

/// A one-object, one-triangle model with a textured material.
pub fn simple_model(version: u16, direction: u32, texture: &str) -> Vec<u8> {
    let mesh = if version == SLV1 {
        mesh_v1(0, &[triangle(0, 0.0)], &[0, 1, 2])
    } else {
        mesh_v2(0, &[triangle(0, 0.0)], &[0, 1, 2])
    };
    BwxBuilder::with_head(version)
        .materials(&[material("skin", &[sub_material(0xFFFF_0000, Some(texture))])])
        .objects(
            if version == SLV1 { "OBJ2" } else { "DXOBJ" },
            &[object(version, "body", 0, direction, &[mesh], &[])],
        )
        .finish()
}

/// A model with three shape-key frames, a transform track and a camera.
pub fn animated_model(version: u16) -> Vec<u8> {
    let frames = [triangle(0, 0.0), triangle(32, 1.0), triangle(64, 2.0)];
    let mesh = if version == SLV1 {
        mesh_v1(0, &frames, &[0, 1, 2])
    } else {
        mesh_v2(0, &frames, &[0, 1, 2])
    };
    let track = matrix(
        version,
        &[
            (0, identity_with_translation(1.0, 2.0, 3.0)),
            (32, identity_with_translation(2.0, 2.0, 3.0)),
            (64, identity_with_translation(3.0, 2.0, 3.0)),
        ],
    );
    let cam = camera(
        "cam01",
        &[
            (
                0,
                identity_with_translation(0.0, -10.0, 5.0),
                identity_with_translation(0.0, 0.0, 1.0),
            ),
            (
                32,
                identity_with_translation(0.0, -12.0, 5.0),
                identity_with_translation(0.0, 0.0, 1.0),
            ),
        ],
    );
    BwxBuilder::with_head(version)
        .materials(&[material("skin", &[sub_material(0xFFFF_FFFF, None)])])
        .objects(
            if version == SLV1 { "OBJ2" } else { "DXOBJ" },
            &[object(version, "body", 0, MNHX, &[mesh], &[track])],
        )
        .cameras(&[cam])
        .finish()
}
