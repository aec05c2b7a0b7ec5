// ============================================================================
// PROJECT FILES — versioned .gfe save/load of the editable mesh
// ============================================================================

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mesh::grid::MeshState;
use crate::render::ControlState;

const GFE_MAGIC_V1: &str = "GFE1";

/// On-disk project: the editable mesh plus the control panel state.
#[derive(Serialize, Deserialize)]
pub struct ProjectFileV1 {
    magic: String,
    pub mesh: MeshState,
    pub control: ControlState,
}

/// Error type for .gfe file operations.
#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Serialize(e) => write!(f, "Serialization error: {}", e),
            ProjectError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for ProjectError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectError::Serialize(e.to_string())
    }
}

/// Save mesh + control state as a .gfe project file.
pub fn save_gfe(mesh: &MeshState, control: &ControlState, path: &Path) -> Result<(), ProjectError> {
    let project = ProjectFileV1 {
        magic: GFE_MAGIC_V1.to_string(),
        mesh: mesh.clone(),
        control: *control,
    };
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &project)?;
    Ok(())
}

/// Load a .gfe project file, rejecting other formats by magic, and clamp
/// the loaded control state back into its documented ranges.
pub fn load_gfe(path: &Path) -> Result<(MeshState, ControlState), ProjectError> {
    let reader = BufReader::new(File::open(path)?);
    let project: ProjectFileV1 = bincode::deserialize_from(reader)?;
    if project.magic != GFE_MAGIC_V1 {
        return Err(ProjectError::InvalidFormat(format!(
            "not a GradientFE project (magic '{}')",
            project.magic
        )));
    }
    project
        .mesh
        .validate_shape()
        .map_err(|e| ProjectError::InvalidFormat(e.to_string()))?;
    let mut control = project.control;
    control.sanitize();
    Ok((project.mesh, control))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = std::env::temp_dir().join("gradientfe_project_test");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("mesh.gfe");

        let mesh = MeshState::with_default_geometry(2, 3);
        let control = ControlState::default();
        save_gfe(&mesh, &control, &path).unwrap();
        let (loaded_mesh, loaded_control) = load_gfe(&path).unwrap();
        assert_eq!(loaded_mesh.rows(), 2);
        assert_eq!(loaded_mesh.cols(), 3);
        assert_eq!(loaded_mesh.points, mesh.points);
        assert_eq!(loaded_mesh.colors, mesh.colors);
        assert_eq!(loaded_control.subdivision_depth, control.subdivision_depth);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_garbage() {
        let dir = std::env::temp_dir().join("gradientfe_project_test");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("garbage.gfe");
        std::fs::write(&path, b"not a project at all").unwrap();
        assert!(load_gfe(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
