//! In-memory scene state.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumString};

/// Maximum number of collision suffixes tried before giving up.
const MAX_NAME_SUFFIX: u32 = 999;

/// A three-component vector (location, rotation in radians, or scale).
pub type Vec3 = [f64; 3];

/// Object types the scene can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Primitive {
    /// Unit cube mesh.
    Cube,
    /// UV sphere mesh.
    Sphere,
    /// Cylinder mesh.
    Cylinder,
    /// Single-face plane mesh.
    Plane,
    /// Cone mesh.
    Cone,
    /// Torus mesh.
    Torus,
    /// Transform-only object with no geometry.
    Empty,
    /// Camera object.
    Camera,
    /// Point light.
    Light,
}

impl Primitive {
    /// Name given to a freshly created object of this type.
    #[must_use]
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Plane => "Plane",
            Self::Cone => "Cone",
            Self::Torus => "Torus",
            Self::Empty => "Empty",
            Self::Camera => "Camera",
            Self::Light => "Light",
        }
    }

    /// Category reported as the object's `type`.
    #[must_use]
    pub const fn kind(self) -> ObjectKind {
        match self {
            Self::Cube | Self::Sphere | Self::Cylinder | Self::Plane | Self::Cone | Self::Torus => {
                ObjectKind::Mesh
            }
            Self::Empty => ObjectKind::Empty,
            Self::Camera => ObjectKind::Camera,
            Self::Light => ObjectKind::Light,
        }
    }
}

/// Object category as reported to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ObjectKind {
    /// Object carrying mesh geometry.
    Mesh,
    /// Transform-only object.
    Empty,
    /// Camera.
    Camera,
    /// Light source.
    Light,
}

/// Geometry counts for mesh objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshStats {
    /// Vertex count.
    pub vertices: u32,
    /// Edge count.
    pub edges: u32,
    /// Face count.
    pub polygons: u32,
}

impl MeshStats {
    const fn new(vertices: u32, edges: u32, polygons: u32) -> Self {
        Self {
            vertices,
            edges,
            polygons,
        }
    }

    /// Counts for a torus with the given ring and cross-section segments.
    #[must_use]
    pub const fn torus(major_segments: u32, minor_segments: u32) -> Self {
        let faces = major_segments.saturating_mul(minor_segments);
        Self::new(faces, faces.saturating_mul(2), faces)
    }
}

/// Mesh data attached to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// No mesh data.
    None,
    /// Mesh with the given counts.
    Mesh(MeshStats),
}

impl Geometry {
    /// Default geometry for a primitive.
    #[must_use]
    pub const fn for_primitive(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Cube => Self::Mesh(MeshStats::new(8, 12, 6)),
            Primitive::Plane => Self::Mesh(MeshStats::new(4, 4, 1)),
            Primitive::Sphere => Self::Mesh(MeshStats::new(482, 992, 512)),
            Primitive::Cylinder => Self::Mesh(MeshStats::new(64, 96, 34)),
            Primitive::Cone => Self::Mesh(MeshStats::new(33, 64, 33)),
            Primitive::Torus => Self::Mesh(MeshStats::torus(48, 12)),
            Primitive::Empty | Primitive::Camera | Primitive::Light => Self::None,
        }
    }

    /// Mesh counts, if any.
    pub const fn stats(self) -> Option<MeshStats> {
        match self {
            Self::Mesh(stats) => Some(stats),
            Self::None => None,
        }
    }
}

/// A named object placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Unique name within the scene.
    pub name: String,
    /// Category reported as `type`.
    pub kind: ObjectKind,
    /// Mesh data, if any.
    pub geometry: Geometry,
    /// Location in scene units.
    pub location: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Whether the object renders in the viewport.
    pub visible: bool,
    /// Material slots in order; only the first slot is ever assigned.
    pub materials: Vec<String>,
}

impl SceneObject {
    /// Object at the origin with unit scale and no materials.
    #[must_use]
    pub fn new(name: String, primitive: Primitive, geometry: Geometry) -> Self {
        Self {
            name,
            kind: primitive.kind(),
            geometry,
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            visible: true,
            materials: Vec::new(),
        }
    }

    /// Only objects with mesh data carry material slots.
    pub const fn accepts_materials(&self) -> bool {
        matches!(self.geometry, Geometry::Mesh(_))
    }
}

/// RGBA base colour.
pub type Color = [f64; 4];

/// Named material with an optional base colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Unique material name.
    pub name: String,
    /// Base colour, unset until a colour is assigned.
    pub color: Option<Color>,
}

/// Named objects and the material library.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Scene name reported by `get_scene_info`.
    pub name: String,
    objects: Vec<SceneObject>,
    materials: BTreeMap<String, Material>,
}

impl Scene {
    /// Empty scene.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            materials: BTreeMap::new(),
        }
    }

    /// Startup scene: a cube with a default material, a camera and a light.
    #[must_use]
    pub fn startup() -> Self {
        let mut scene = Self::empty("Scene");
        let mut cube = SceneObject::new(
            "Cube".to_owned(),
            Primitive::Cube,
            Geometry::for_primitive(Primitive::Cube),
        );
        cube.materials.push("Material".to_owned());
        scene.insert_material(Material {
            name: "Material".to_owned(),
            color: Some([0.8, 0.8, 0.8, 1.0]),
        });
        scene.objects.push(cube);

        let mut camera = SceneObject::new("Camera".to_owned(), Primitive::Camera, Geometry::None);
        camera.location = [7.36, -6.93, 4.96];
        camera.rotation = [1.11, 0.0, 0.82];
        scene.objects.push(camera);

        let mut light = SceneObject::new("Light".to_owned(), Primitive::Light, Geometry::None);
        light.location = [4.08, 1.01, 5.9];
        scene.objects.push(light);
        scene
    }

    /// Objects in creation order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Looks up an object by exact name.
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    /// Mutable lookup by exact name.
    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }

    /// Adds an object, renaming it with a numeric suffix when the name is
    /// taken. Returns the final name, or `None` when every suffix is in use.
    pub fn add_object(&mut self, mut object: SceneObject) -> Option<String> {
        object.name = self.unique_name(&object.name)?;
        let name = object.name.clone();
        self.objects.push(object);
        Some(name)
    }

    /// Removes an object and returns it.
    pub fn remove_object(&mut self, name: &str) -> Option<SceneObject> {
        let index = self.objects.iter().position(|object| object.name == name)?;
        Some(self.objects.remove(index))
    }

    /// Looks up a material by name.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Mutable material lookup by name.
    pub fn material_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    /// Adds or replaces a material by name.
    pub fn insert_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Number of materials in the library.
    #[must_use]
    pub fn materials_count(&self) -> usize {
        self.materials.len()
    }

    fn unique_name(&self, requested: &str) -> Option<String> {
        if self.object(requested).is_none() {
            return Some(requested.to_owned());
        }
        (1..=MAX_NAME_SUFFIX)
            .map(|suffix| format!("{requested}.{suffix:03}"))
            .find(|candidate| self.object(candidate).is_none())
    }
}

/// Rounds to two decimal places for summaries.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
