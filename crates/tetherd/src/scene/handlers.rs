//! Command handlers for the reference scene host.

use serde::{Deserialize, Serialize};

use super::SceneHost;
use super::catalog::{AssetType, Categories, CatalogStatus};
use super::model::{
    Color, Geometry, Material, MeshStats, ObjectKind, Primitive, SceneObject, Vec3, round2,
};
use crate::dispatch::{ContextRequirement, HandlerError, HandlerTableBuilder, NoParams};

/// Objects listed by `get_scene_info`.
const SCENE_SUMMARY_LIMIT: usize = 10;
const DEFAULT_TORUS_MAJOR_SEGMENTS: u32 = 48;
const DEFAULT_TORUS_MINOR_SEGMENTS: u32 = 12;

pub(super) fn register(builder: HandlerTableBuilder<SceneHost>) -> HandlerTableBuilder<SceneHost> {
    builder
        .register("get_scene_info", ContextRequirement::Any, get_scene_info)
        .register("get_object_info", ContextRequirement::Any, get_object_info)
        .register("create_object", ContextRequirement::Active, create_object)
        .register("modify_object", ContextRequirement::Active, modify_object)
        .register("delete_object", ContextRequirement::Active, delete_object)
        .register("set_material", ContextRequirement::Any, set_material)
        .register(
            "get_asset_catalog_status",
            ContextRequirement::Any,
            get_asset_catalog_status,
        )
}

pub(super) fn register_catalog(
    builder: HandlerTableBuilder<SceneHost>,
) -> HandlerTableBuilder<SceneHost> {
    builder.register(
        "get_asset_categories",
        ContextRequirement::Any,
        get_asset_categories,
    )
}

#[derive(Debug, Serialize)]
struct SceneSummary {
    name: String,
    object_count: usize,
    objects: Vec<ObjectSummary>,
    materials_count: usize,
}

#[derive(Debug, Serialize)]
struct ObjectSummary {
    name: String,
    #[serde(rename = "type")]
    kind: ObjectKind,
    location: Vec3,
}

fn get_scene_info(host: &mut SceneHost, _: NoParams) -> Result<SceneSummary, HandlerError> {
    let scene = host.scene();
    let objects = scene
        .objects()
        .iter()
        .take(SCENE_SUMMARY_LIMIT)
        .map(|object| ObjectSummary {
            name: object.name.clone(),
            kind: object.kind,
            location: object.location.map(round2),
        })
        .collect();
    Ok(SceneSummary {
        name: scene.name.clone(),
        object_count: scene.objects().len(),
        objects,
        materials_count: scene.materials_count(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectName {
    name: String,
}

#[derive(Debug, Serialize)]
struct ObjectState {
    name: String,
    #[serde(rename = "type")]
    kind: ObjectKind,
    location: Vec3,
    rotation: Vec3,
    scale: Vec3,
    visible: bool,
}

impl From<&SceneObject> for ObjectState {
    fn from(object: &SceneObject) -> Self {
        Self {
            name: object.name.clone(),
            kind: object.kind,
            location: object.location,
            rotation: object.rotation,
            scale: object.scale,
            visible: object.visible,
        }
    }
}

#[derive(Debug, Serialize)]
struct ObjectInfo {
    #[serde(flatten)]
    state: ObjectState,
    materials: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<MeshStats>,
}

fn get_object_info(host: &mut SceneHost, params: ObjectName) -> Result<ObjectInfo, HandlerError> {
    let object = host
        .scene()
        .object(&params.name)
        .ok_or_else(|| HandlerError::not_found("object", &params.name))?;
    Ok(ObjectInfo {
        state: object.into(),
        materials: object.materials.clone(),
        mesh: object.geometry.stats(),
    })
}

fn default_primitive() -> String {
    Primitive::Cube.to_string()
}

const fn unit_scale() -> Vec3 {
    [1.0; 3]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateObject {
    #[serde(rename = "type", default = "default_primitive")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Vec3,
    #[serde(default)]
    rotation: Vec3,
    #[serde(default = "unit_scale")]
    scale: Vec3,
    #[serde(default)]
    major_segments: Option<u32>,
    #[serde(default)]
    minor_segments: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Created {
    name: String,
}

fn create_object(host: &mut SceneHost, params: CreateObject) -> Result<Created, HandlerError> {
    host.ensure_active()?;
    let primitive = params
        .kind
        .parse::<Primitive>()
        .map_err(|_| HandlerError::unsupported(format!("unsupported object type: {}", params.kind)))?;
    let geometry = match primitive {
        Primitive::Torus => Geometry::Mesh(MeshStats::torus(
            params.major_segments.unwrap_or(DEFAULT_TORUS_MAJOR_SEGMENTS),
            params.minor_segments.unwrap_or(DEFAULT_TORUS_MINOR_SEGMENTS),
        )),
        other => Geometry::for_primitive(other),
    };
    let requested = params
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| primitive.base_name().to_owned());
    let mut object = SceneObject::new(requested.clone(), primitive, geometry);
    object.location = params.location;
    object.rotation = params.rotation;
    object.scale = params.scale;
    let name = host
        .scene_mut()
        .add_object(object)
        .ok_or_else(|| HandlerError::failed(format!("no free object name derived from {requested}")))?;
    Ok(Created { name })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModifyObject {
    name: String,
    #[serde(default)]
    location: Option<Vec3>,
    #[serde(default)]
    rotation: Option<Vec3>,
    #[serde(default)]
    scale: Option<Vec3>,
    #[serde(default)]
    visible: Option<bool>,
}

fn modify_object(host: &mut SceneHost, params: ModifyObject) -> Result<ObjectState, HandlerError> {
    host.ensure_active()?;
    let object = host
        .scene_mut()
        .object_mut(&params.name)
        .ok_or_else(|| HandlerError::not_found("object", &params.name))?;
    if let Some(location) = params.location {
        object.location = location;
    }
    if let Some(rotation) = params.rotation {
        object.rotation = rotation;
    }
    if let Some(scale) = params.scale {
        object.scale = scale;
    }
    if let Some(visible) = params.visible {
        object.visible = visible;
    }
    Ok(ObjectState::from(&*object))
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: String,
}

fn delete_object(host: &mut SceneHost, params: ObjectName) -> Result<Deleted, HandlerError> {
    host.ensure_active()?;
    let removed = host
        .scene_mut()
        .remove_object(&params.name)
        .ok_or_else(|| HandlerError::not_found("object", &params.name))?;
    Ok(Deleted {
        deleted: removed.name,
    })
}

const fn create_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetMaterial {
    object_name: String,
    #[serde(default)]
    material_name: Option<String>,
    #[serde(default = "create_by_default")]
    create_if_missing: bool,
    #[serde(default)]
    color: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct MaterialAssignment {
    object: String,
    material: String,
    color: Option<Color>,
}

fn parse_color(components: &[f64]) -> Result<Color, HandlerError> {
    match *components {
        [red, green, blue] => Ok([red, green, blue, 1.0]),
        [red, green, blue, alpha] => Ok([red, green, blue, alpha]),
        _ => Err(HandlerError::invalid_params(format!(
            "color must have 3 or 4 components, got {}",
            components.len()
        ))),
    }
}

fn set_material(
    host: &mut SceneHost,
    params: SetMaterial,
) -> Result<MaterialAssignment, HandlerError> {
    let color = params.color.as_deref().map(parse_color).transpose()?;
    let object = host
        .scene()
        .object(&params.object_name)
        .ok_or_else(|| HandlerError::not_found("object", &params.object_name))?;
    if !object.accepts_materials() {
        return Err(HandlerError::unsupported(format!(
            "object {} cannot accept materials",
            params.object_name
        )));
    }

    let (material_name, may_create) = match params.material_name {
        Some(name) => (name, params.create_if_missing),
        None => (format!("{}_material", params.object_name), true),
    };
    let scene = host.scene_mut();
    if scene.material(&material_name).is_none() {
        if !may_create {
            return Err(HandlerError::not_found("material", material_name));
        }
        scene.insert_material(Material {
            name: material_name.clone(),
            color: None,
        });
    }
    if let (Some(color), Some(material)) = (color, scene.material_mut(&material_name)) {
        material.color = Some(color);
    }

    let object = scene
        .object_mut(&params.object_name)
        .ok_or_else(|| HandlerError::not_found("object", &params.object_name))?;
    match object.materials.first_mut() {
        Some(slot) => slot.clone_from(&material_name),
        None => object.materials.push(material_name.clone()),
    }

    Ok(MaterialAssignment {
        object: params.object_name,
        material: material_name,
        color,
    })
}

fn get_asset_catalog_status(
    host: &mut SceneHost,
    _: NoParams,
) -> Result<CatalogStatus, HandlerError> {
    Ok(host.catalog().status())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssetCategoriesQuery {
    asset_type: String,
}

fn get_asset_categories(
    host: &mut SceneHost,
    params: AssetCategoriesQuery,
) -> Result<Categories, HandlerError> {
    let asset_type = params.asset_type.parse::<AssetType>().map_err(|_| {
        HandlerError::invalid_params(format!(
            "invalid asset type: {}; expected one of {}",
            params.asset_type,
            AssetType::NAMES
        ))
    })?;
    Ok(host.catalog().categories(asset_type))
}
