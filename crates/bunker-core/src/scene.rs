use std::collections::VecDeque;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::lights::{LightKind, LightSource};

// --- Serde types for the scene YAML ---

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneFile {
    pub name: String,
    #[serde(default)]
    pub settings: SceneSettings,
    #[serde(default)]
    pub player: Option<PlayerDef>,
    #[serde(default)]
    pub exit_zone: Option<ExitZoneDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneSettings {
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    #[serde(default = "default_ambient")]
    pub ambient_light: [f32; 3],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            ambient_light: default_ambient(),
        }
    }
}

fn default_gravity() -> [f32; 3] {
    [0.0, -9.81, 0.0]
}

fn default_ambient() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerDef {
    pub spawn: [f32; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExitZoneDef {
    pub position: [f32; 3],
    #[serde(default = "default_exit_radius")]
    pub radius: f32,
}

fn default_exit_radius() -> f32 {
    3.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(default)]
    pub transform: Option<TransformDef>,
    #[serde(default)]
    pub light: Option<LightDef>,
    #[serde(default)]
    pub geometry: Option<GeometryDef>,
    #[serde(default)]
    pub collider: Option<ColliderDef>,
    #[serde(default)]
    pub children: Vec<NodeDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformDef {
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles in degrees (pitch, yaw, roll).
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LightDef {
    pub kind: LightKind,
    #[serde(default = "default_white")]
    pub color: [f32; 3],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_range")]
    pub range: f32,
    /// Local direction for directional and spot lights.
    #[serde(default = "default_light_direction")]
    pub direction: [f32; 3],
    #[serde(default = "default_inner_angle")]
    pub inner_angle: f32,
    #[serde(default = "default_outer_angle")]
    pub outer_angle: f32,
}

fn default_white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_intensity() -> f32 {
    1.0
}
fn default_range() -> f32 {
    10.0
}
fn default_light_direction() -> [f32; 3] {
    [0.0, -1.0, 0.0]
}
fn default_inner_angle() -> f32 {
    20.0
}
fn default_outer_angle() -> f32 {
    30.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryDef {
    pub mesh: String,
    #[serde(default)]
    pub material: MaterialParams,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderDef {
    Box { half_extents: [f32; 3] },
    Sphere { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
}

/// Render-side material parameters the loader normalizes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MaterialParams {
    #[serde(default)]
    pub base_color: Option<[f32; 4]>,
    #[serde(default)]
    pub alpha_discard_threshold: Option<f32>,
    #[serde(default)]
    pub double_sided: bool,
    #[serde(default)]
    pub texture_filter: TextureFilter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

// --- Runtime scene graph ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Compose a child's local transform onto this (parent) world transform.
    pub fn then(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale * local.position),
            rotation: self.rotation * local.rotation,
            scale: self.scale * local.scale,
        }
    }
}

impl From<&TransformDef> for Transform {
    fn from(def: &TransformDef) -> Self {
        Self {
            position: Vec3::from(def.position),
            rotation: euler_degrees_to_quat(def.rotation),
            scale: Vec3::from(def.scale),
        }
    }
}

/// Pitch/yaw/roll in degrees to a quaternion, yaw applied first.
pub fn euler_degrees_to_quat(euler: [f32; 3]) -> Quat {
    let [pitch, yaw, roll] = euler;
    Quat::from_euler(
        glam::EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub mesh: String,
    pub material: MaterialParams,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
}

impl From<&ColliderDef> for ColliderShape {
    fn from(def: &ColliderDef) -> Self {
        match def {
            ColliderDef::Box { half_extents } => ColliderShape::Box {
                half_extents: Vec3::from(*half_extents),
            },
            ColliderDef::Sphere { radius } => ColliderShape::Sphere { radius: *radius },
            ColliderDef::Capsule {
                half_height,
                radius,
            } => ColliderShape::Capsule {
                half_height: *half_height,
                radius: *radius,
            },
        }
    }
}

/// Something hanging off a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Light(LightSource),
    Geometry(Geometry),
    Collider(ColliderShape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub local: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attachments: Vec<Attachment>,
}

/// Exit trigger placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitZonePlacement {
    pub position: Vec3,
    pub radius: f32,
}

/// Arena-backed scene graph. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub gravity: Vec3,
    pub ambient_light: Vec3,
    pub spawn: Option<Vec3>,
    pub exit_zone: Option<ExitZonePlacement>,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gravity: Vec3::from(default_gravity()),
            ambient_light: Vec3::from(default_ambient()),
            spawn: None,
            exit_zone: None,
            nodes: vec![SceneNode {
                name: name.to_string(),
                local: Transform::IDENTITY,
                parent: None,
                children: Vec::new(),
                attachments: Vec::new(),
            }],
        }
    }

    /// Build the runtime graph from a parsed file.
    pub fn from_file(file: &SceneFile) -> Result<Self, SceneError> {
        if file.nodes.is_empty() {
            return Err(SceneError::EmptyScene(file.name.clone()));
        }

        let mut scene = Scene::new(&file.name);
        scene.gravity = Vec3::from(file.settings.gravity);
        scene.ambient_light = Vec3::from(file.settings.ambient_light);
        scene.spawn = file.player.as_ref().map(|p| Vec3::from(p.spawn));
        scene.exit_zone = file.exit_zone.as_ref().map(|z| ExitZonePlacement {
            position: Vec3::from(z.position),
            radius: z.radius,
        });

        let root = scene.root();
        for def in &file.nodes {
            scene.add_node_def(root, def);
        }
        Ok(scene)
    }

    fn add_node_def(&mut self, parent: NodeId, def: &NodeDef) {
        let local = def.transform.as_ref().map(Transform::from).unwrap_or_default();
        let id = self.add_node(parent, &def.name, local);

        if let Some(light) = &def.light {
            self.attach(id, Attachment::Light(LightSource::from(light)));
        }
        if let Some(geometry) = &def.geometry {
            self.attach(
                id,
                Attachment::Geometry(Geometry {
                    mesh: geometry.mesh.clone(),
                    material: geometry.material.clone(),
                }),
            );
        }
        if let Some(collider) = &def.collider {
            self.attach(id, Attachment::Collider(ColliderShape::from(collider)));
        }
        for child in &def.children {
            self.add_node_def(id, child);
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_node(&mut self, parent: NodeId, name: &str, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.to_string(),
            local,
            parent: Some(parent),
            children: Vec::new(),
            attachments: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn attach(&mut self, node: NodeId, attachment: Attachment) {
        self.nodes[node.0].attachments.push(attachment);
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Visit every node breadth-first with its world transform.
    pub fn visit_breadth_first<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &SceneNode, &Transform),
    {
        let mut queue = VecDeque::new();
        queue.push_back((self.root(), self.nodes[0].local));

        while let Some((id, world)) = queue.pop_front() {
            let node = &self.nodes[id.0];
            visit(id, node, &world);
            for &child in &node.children {
                queue.push_back((child, world.then(&self.nodes[child.0].local)));
            }
        }
    }

    /// All colliders with their world transforms.
    pub fn colliders(&self) -> Vec<(Transform, ColliderShape)> {
        let mut out = Vec::new();
        self.visit_breadth_first(|_, node, world| {
            for attachment in &node.attachments {
                if let Attachment::Collider(shape) = attachment {
                    out.push((*world, *shape));
                }
            }
        });
        out
    }

    /// Every geometry with its node name and world transform.
    pub fn geometries(&self) -> Vec<(String, Transform, Geometry)> {
        let mut out = Vec::new();
        self.visit_breadth_first(|_, node, world| {
            for attachment in &node.attachments {
                if let Attachment::Geometry(geometry) = attachment {
                    out.push((node.name.clone(), *world, geometry.clone()));
                }
            }
        });
        out
    }

    /// Normalize geometry materials for the retro look: alpha discard at 0.5
    /// unless set, double-sided faces and nearest-neighbour texture filtering.
    /// Returns how many geometries were touched.
    pub fn prepare_materials(&mut self) -> usize {
        let mut touched = 0;
        for node in &mut self.nodes {
            for attachment in &mut node.attachments {
                if let Attachment::Geometry(geometry) = attachment {
                    let material = &mut geometry.material;
                    if material.alpha_discard_threshold.is_none() {
                        material.alpha_discard_threshold = Some(0.5);
                    }
                    material.double_sided = true;
                    material.texture_filter = TextureFilter::Nearest;
                    touched += 1;
                }
            }
        }
        tracing::debug!("Prepared {} materials in scene '{}'", touched, self.name);
        touched
    }
}

/// Load and build a scene YAML file.
pub fn load_scene(path: &Path) -> Result<Scene, SceneError> {
    let contents = std::fs::read_to_string(path)?;
    let file: SceneFile = serde_yaml::from_str(&contents)?;
    let scene = Scene::from_file(&file)?;
    tracing::info!("Loaded scene '{}' ({} nodes)", scene.name, scene.len() - 1);
    Ok(scene)
}

impl From<&LightDef> for LightSource {
    fn from(def: &LightDef) -> Self {
        LightSource {
            kind: def.kind,
            color: Vec3::from(def.color),
            intensity: def.intensity,
            range: def.range,
            direction: Vec3::from(def.direction).normalize_or_zero(),
            inner_angle: def.inner_angle.to_radians(),
            outer_angle: def.outer_angle.to_radians(),
        }
    }
}
