//! In-memory reference host.
//!
//! The `tetherd` binary serves this scene so agents have something to drive
//! end to end. It holds named objects with transforms and material slots,
//! plus a local stand-in for the asset catalog. Object creation, modification
//! and deletion must run inside the active viewport context.

#![deny(missing_docs)]

mod catalog;
mod handlers;
mod model;

use tracing::debug;

use tether_config::Config;

pub use self::catalog::{AssetCatalog, AssetType};
pub use self::model::{Geometry, MeshStats, ObjectKind, Primitive, Scene, SceneObject};
use crate::dispatch::{HandlerError, HandlerResult, HandlerTable, Host};

const SCENE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::scene");

/// Host state for the reference scene.
#[derive(Debug)]
pub struct SceneHost {
    scene: Scene,
    catalog: AssetCatalog,
    active_depth: usize,
}

impl SceneHost {
    /// Host with the given scene and catalog, outside any viewport context.
    #[must_use]
    pub const fn new(scene: Scene, catalog: AssetCatalog) -> Self {
        Self {
            scene,
            catalog,
            active_depth: 0,
        }
    }

    /// Current scene state.
    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    pub(crate) const fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub(crate) const fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    fn ensure_active(&self) -> Result<(), HandlerError> {
        if self.active_depth == 0 {
            return Err(HandlerError::failed(
                "operation requires the active viewport context",
            ));
        }
        Ok(())
    }
}

impl Host for SceneHost {
    fn with_active_context(
        &mut self,
        command: &str,
        operation: &mut dyn FnMut(&mut Self) -> HandlerResult,
    ) -> HandlerResult {
        debug!(target: SCENE_TARGET, command, "entering active viewport context");
        self.active_depth += 1;
        let result = operation(self);
        self.active_depth -= 1;
        result
    }
}

/// Builds the startup scene and its handler table.
///
/// The asset catalog group is registered only when `asset_catalog` is set;
/// `get_asset_catalog_status` is always available so agents can tell why.
#[must_use]
pub fn install(config: &Config) -> (SceneHost, HandlerTable<SceneHost>) {
    let host = SceneHost::new(Scene::startup(), AssetCatalog::new(config.asset_catalog()));
    let table = handlers::register(HandlerTable::builder())
        .extend_if(config.asset_catalog(), handlers::register_catalog)
        .build();
    (host, table)
}
