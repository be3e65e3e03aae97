//! Pre-built queries for common host commands.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use tether_protocol::CommandParams;

use super::{Session, SessionError};

/// Result of `ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pong {
    /// Always true for a live host.
    pub pong: bool,
}

/// Result of `list_commands`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandList {
    /// Registered command types in sorted order.
    pub commands: Vec<String>,
}

/// One entry of the scene summary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectSummary {
    /// Object name.
    pub name: String,
    /// Object kind such as `MESH` or `CAMERA`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Location rounded to two decimals.
    pub location: [f64; 3],
}

/// Result of `get_scene_info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneInfo {
    /// Scene name.
    pub name: String,
    /// Total number of objects in the scene.
    pub object_count: usize,
    /// Leading objects of the scene.
    pub objects: Vec<ObjectSummary>,
    /// Number of materials defined in the scene.
    pub materials_count: usize,
}

/// Mesh statistics reported for mesh objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MeshStats {
    /// Vertex count.
    pub vertices: u32,
    /// Edge count.
    pub edges: u32,
    /// Face count.
    pub polygons: u32,
}

/// Result of `get_object_info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectInfo {
    /// Object name.
    pub name: String,
    /// Object kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Location in scene units.
    pub location: [f64; 3],
    /// Euler rotation in radians.
    pub rotation: [f64; 3],
    /// Per-axis scale.
    pub scale: [f64; 3],
    /// Visibility flag.
    pub visible: bool,
    /// Names of the materials in the object's slots.
    pub materials: Vec<String>,
    /// Mesh statistics, present for mesh objects.
    #[serde(default)]
    pub mesh: Option<MeshStats>,
}

impl Session {
    /// Checks that the host is reachable and dispatching commands.
    ///
    /// # Errors
    ///
    /// Propagates the round-trip failure.
    pub fn ping(&mut self) -> Result<Pong, SessionError> {
        self.query("ping", CommandParams::new())
    }

    /// Lists the command types the host has registered.
    ///
    /// # Errors
    ///
    /// Propagates the round-trip failure.
    pub fn list_commands(&mut self) -> Result<Vec<String>, SessionError> {
        self.query::<CommandList>("list_commands", CommandParams::new())
            .map(|list| list.commands)
    }

    /// Summarises the host's scene.
    ///
    /// # Errors
    ///
    /// Propagates the round-trip failure.
    pub fn scene_info(&mut self) -> Result<SceneInfo, SessionError> {
        self.query("get_scene_info", CommandParams::new())
    }

    /// Describes one object.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Remote`] when the object does not exist.
    pub fn object_info(&mut self, name: &str) -> Result<ObjectInfo, SessionError> {
        let mut params = CommandParams::new();
        params.insert(String::from("name"), json!(name));
        self.query("get_object_info", params)
    }

    fn query<T: DeserializeOwned>(
        &mut self,
        command: &'static str,
        params: CommandParams,
    ) -> Result<T, SessionError> {
        let result: Value = self.send_command(command, params)?;
        serde_json::from_value(result)
            .map_err(|source| SessionError::UnexpectedResult { command, source })
    }
}
