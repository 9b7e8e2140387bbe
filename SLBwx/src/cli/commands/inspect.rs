//! Inspect command

use std::path::Path;

use crate::import::{ImportOptions, import_bytes};

/// Inspect a BNX/PNX file and display its structure.
pub fn execute(path: &Path, list_objects: bool, options: &ImportOptions) -> anyhow::Result<()> {
    println!("Inspecting BWX file: {}", path.display());
    println!();

    let data = std::fs::read(path)?;
    let scene = import_bytes(&data, Some(path), options)?;
    let summary = scene.summary();

    println!("BWX File Information");
    println!("====================");
    println!("Dialect:     {}", scene.dialect);
    println!("Name:        {}", scene.name);
    if !scene.description.is_empty() {
        println!("Description: {}", scene.description);
    }
    println!("Animation:   {}", scene.animation_name);
    println!("File size:   {} bytes", data.len());
    println!();
    println!("Objects:     {}", summary.objects);
    println!("Meshes:      {}", summary.meshes);
    println!("Vertices:    {}", summary.vertices);
    println!("Faces:       {}", summary.faces);
    println!(
        "Materials:   {} ({} textures, {} missing)",
        summary.materials, summary.textures, summary.unresolved_textures
    );
    println!(
        "Animation:   {} shape-key tracks, {} transform tracks",
        summary.shape_key_tracks, summary.transform_tracks
    );
    println!("Cameras:     {}", summary.cameras);

    if list_objects {
        println!();
        println!("Objects ({}):", scene.objects.len());
        println!("-----------");
        for object in &scene.objects {
            let (vertices, faces) = object
                .mesh
                .as_ref()
                .map_or((0, 0), |m| (m.vertices.len(), m.faces.len()));
            let frames = object.shape_keys.as_ref().map_or(0, |t| t.frames.len());
            println!(
                "  - {} ({} vertices, {} faces, {} shape keys, {} tracks){}",
                object.name,
                vertices,
                faces,
                frames,
                object.transform_tracks.len(),
                if object.reversed_winding { " [MSHX]" } else { "" }
            );
        }
        for camera in &scene.cameras {
            let frames = camera.track.as_ref().map_or(0, |t| t.samples.len());
            println!("  - camera {} ({} frames)", camera.name, frames);
        }
    }

    if !scene.diagnostics.is_empty() {
        println!();
        println!("Diagnostics ({}):", scene.diagnostics.len());
        for diagnostic in &scene.diagnostics {
            println!("  ! {diagnostic}");
        }
    }

    Ok(())
}
