//! URDF robot model
//!
//! Parses a URDF description into a link/joint tree and loads each link's
//! visual geometry into one merged mesh expressed in the link frame.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use glam::DVec3;

use crate::joint::{JointLimits, JointMimic, JointType};
use crate::mesh::{MeshError, TriMesh, load_mesh};
use crate::pose::Pose;
use crate::primitive::{generate_box_mesh, generate_cylinder_mesh, generate_sphere_mesh};

/// Environment variable searched for `package://` URIs
pub const ROS_PACKAGE_PATH: &str = "ROS_PACKAGE_PATH";

/// Load options for URDF parsing
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Base directory for resolving relative mesh paths.
    /// Defaults to the URDF file's directory.
    pub base_dir: Option<PathBuf>,
    /// Directories containing ROS packages, searched for `package://` URIs
    pub package_paths: Vec<PathBuf>,
    /// Default material color if not specified
    pub default_color: [f32; 4],
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            package_paths: Vec::new(),
            default_color: [0.7, 0.7, 0.7, 1.0],
        }
    }
}

/// Errors that can occur while building a robot model
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to parse URDF: {0}")]
    UrdfParse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Mesh file not found: {path}")]
    MeshNotFound { path: String },

    #[error("Failed to load mesh '{path}': {source}")]
    MeshLoad { path: String, source: MeshError },

    #[error("Unsupported mesh format: {0} (only STL and OBJ are supported)")]
    UnsupportedMeshFormat(String),

    #[error("Package not found for URI: {0}")]
    PackageNotFound(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Joint not found: {0}")]
    JointNotFound(String),

    #[error("Link '{0}' is the child of more than one joint")]
    MultipleParents(String),

    #[error("Joint '{0}' has a zero-length axis")]
    InvalidAxis(String),

    #[error("Mimic joints form a cycle through '{0}'")]
    MimicCycle(String),

    #[error("URDF has multiple root links: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("URDF has no root link (the link graph is cyclic)")]
    NoRoot,

    #[error("Links not reachable from the root: {0:?}")]
    Disconnected(Vec<String>),

    #[error("Empty URDF: no links defined")]
    EmptyUrdf,
}

/// A rigid body of the robot
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    /// All visual elements merged into one mesh, in the link frame
    pub visual: Option<TriMesh>,
    /// Material color (RGBA) of the first colored visual element
    pub color: [f32; 4],
}

impl Link {
    pub fn has_visual(&self) -> bool {
        self.visual.as_ref().is_some_and(|m| !m.is_empty())
    }
}

/// A joint connecting two links
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub joint_type: JointType,
    /// Parent link index
    pub parent_link: usize,
    /// Child link index
    pub child_link: usize,
    /// Transform from parent link to joint origin
    pub origin: Pose,
    /// Unit joint axis in the joint frame
    pub axis: DVec3,
    /// Joint limits (revolute and prismatic only)
    pub limits: Option<JointLimits>,
    /// Joint mimic configuration (follows another joint)
    pub mimic: Option<JointMimic>,
}

impl Joint {
    /// Whether this joint takes its value from the joint vector
    pub fn is_actuated(&self) -> bool {
        self.joint_type.is_actuated() && self.mimic.is_none()
    }
}

/// Parsed robot description
#[derive(Debug, Clone)]
pub struct RobotModel {
    pub(crate) name: String,
    pub(crate) links: Vec<Link>,
    pub(crate) joints: Vec<Joint>,
    pub(crate) link_index: HashMap<String, usize>,
    pub(crate) joint_index: HashMap<String, usize>,
    pub(crate) root: usize,
    /// Child link -> (joint, parent link)
    pub(crate) parent: Vec<Option<(usize, usize)>>,
    /// Joints in breadth-first order from the root
    pub(crate) traversal: Vec<usize>,
    /// Joints consuming the joint vector, in joint-vector order
    pub(crate) actuated: Vec<usize>,
}

impl RobotModel {
    /// Load a URDF file
    pub fn load(urdf_path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, ModelError> {
        let urdf_path = urdf_path.as_ref();
        if !urdf_path.exists() {
            return Err(ModelError::Io(format!(
                "URDF file not found: {}",
                urdf_path.display()
            )));
        }

        let robot =
            urdf_rs::read_file(urdf_path).map_err(|e| ModelError::UrdfParse(e.to_string()))?;

        // Resolve relative meshes against the URDF's directory unless overridden
        let base_dir = options.base_dir.clone().unwrap_or_else(|| {
            urdf_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        tracing::info!("Loading URDF {:?}", urdf_path);
        Self::from_urdf(robot, &base_dir, options)
    }

    /// Parse a URDF document held in memory
    pub fn from_urdf_str(urdf: &str, options: &LoadOptions) -> Result<Self, ModelError> {
        let robot = urdf_rs::read_from_string(urdf).map_err(|e| ModelError::UrdfParse(e.to_string()))?;
        let base_dir = options.base_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        Self::from_urdf(robot, &base_dir, options)
    }

    fn from_urdf(
        robot: urdf_rs::Robot,
        base_dir: &Path,
        options: &LoadOptions,
    ) -> Result<Self, ModelError> {
        if robot.links.is_empty() {
            return Err(ModelError::EmptyUrdf);
        }

        let material_colors: HashMap<String, [f32; 4]> = robot
            .materials
            .iter()
            .filter_map(|m| m.color.as_ref().map(|c| (m.name.clone(), rgba(c))))
            .collect();

        let mut loader = MeshLoader::new(base_dir, &options.package_paths);

        let mut links = Vec::with_capacity(robot.links.len());
        let mut link_index = HashMap::new();
        for urdf_link in &robot.links {
            link_index.insert(urdf_link.name.clone(), links.len());
            links.push(build_link(urdf_link, &mut loader, options, &material_colors)?);
        }

        let mut joints = Vec::with_capacity(robot.joints.len());
        let mut joint_index = HashMap::new();
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; links.len()];
        let mut children: Vec<Vec<(usize, usize)>> = vec![Vec::new(); links.len()];

        for urdf_joint in &robot.joints {
            let parent_link = *link_index
                .get(&urdf_joint.parent.link)
                .ok_or_else(|| ModelError::LinkNotFound(urdf_joint.parent.link.clone()))?;
            let child_link = *link_index
                .get(&urdf_joint.child.link)
                .ok_or_else(|| ModelError::LinkNotFound(urdf_joint.child.link.clone()))?;

            let joint = build_joint(urdf_joint, parent_link, child_link)?;
            let joint_id = joints.len();

            if parent[child_link].is_some() {
                return Err(ModelError::MultipleParents(urdf_joint.child.link.clone()));
            }
            parent[child_link] = Some((joint_id, parent_link));
            children[parent_link].push((joint_id, child_link));

            joint_index.insert(joint.name.clone(), joint_id);
            joints.push(joint);
        }

        // Find root link (link that is not a child of any joint)
        let roots: Vec<usize> = (0..links.len()).filter(|&i| parent[i].is_none()).collect();
        let root = match roots.as_slice() {
            [] => return Err(ModelError::NoRoot),
            [root] => *root,
            _ => {
                return Err(ModelError::MultipleRoots(
                    roots.iter().map(|&i| links[i].name.clone()).collect(),
                ));
            }
        };

        // Breadth-first walk; also yields link depths for joint ordering
        let mut depth = vec![usize::MAX; links.len()];
        let mut traversal = Vec::with_capacity(joints.len());
        let mut queue = VecDeque::from([root]);
        depth[root] = 0;
        while let Some(link_id) = queue.pop_front() {
            for &(joint_id, child_id) in &children[link_id] {
                depth[child_id] = depth[link_id] + 1;
                traversal.push(joint_id);
                queue.push_back(child_id);
            }
        }

        let unreachable: Vec<String> = (0..links.len())
            .filter(|&i| depth[i] == usize::MAX)
            .map(|i| links[i].name.clone())
            .collect();
        if !unreachable.is_empty() {
            return Err(ModelError::Disconnected(unreachable));
        }

        validate_mimics(&joints, &joint_index)?;

        // Joint-vector order: by depth of the child link, ties in declaration order
        let mut actuated: Vec<usize> = (0..joints.len()).filter(|&j| joints[j].is_actuated()).collect();
        actuated.sort_by_key(|&j| depth[joints[j].child_link]);

        for joint in &joints {
            if matches!(joint.joint_type, JointType::Floating | JointType::Planar) {
                tracing::warn!(
                    "Joint '{}' is {}; it is held at its origin",
                    joint.name,
                    joint.joint_type.display_name()
                );
            }
        }

        let model = Self {
            name: robot.name,
            links,
            joints,
            link_index,
            joint_index,
            root,
            parent,
            traversal,
            actuated,
        };

        tracing::info!(
            "Loaded robot '{}': {} links ({} with visuals), {} joints, {} DOF",
            model.name,
            model.links.len(),
            model.visual_links().count(),
            model.joints.len(),
            model.dof()
        );

        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_index.get(name).map(|&i| &self.links[i])
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index.get(name).map(|&i| &self.joints[i])
    }

    pub fn root_link(&self) -> &Link {
        &self.links[self.root]
    }

    /// Links that carry visual geometry, in declaration order
    pub fn visual_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.has_visual())
    }

    /// Number of entries in a joint vector
    pub fn dof(&self) -> usize {
        self.actuated.len()
    }

    /// Joints consuming the joint vector, in joint-vector order
    pub fn actuated_joints(&self) -> impl Iterator<Item = &Joint> {
        self.actuated.iter().map(|&j| &self.joints[j])
    }

    /// Names of the actuated joints, in joint-vector order
    pub fn actuated_joint_names(&self) -> Vec<&str> {
        self.actuated_joints().map(|j| j.name.as_str()).collect()
    }

    /// Chain of link names from the root to `link`, inclusive
    pub fn chain_to(&self, link: &str) -> Option<Vec<&str>> {
        let mut current = Some(*self.link_index.get(link)?);
        let mut chain = Vec::new();
        while let Some(id) = current {
            chain.push(self.links[id].name.as_str());
            current = self.parent[id].map(|(_, p)| p);
        }
        chain.reverse();
        Some(chain)
    }

    /// The deepest leaf link, first in declaration order on ties.
    ///
    /// Used as the end-effector when none is configured.
    pub fn deepest_leaf(&self) -> &Link {
        let has_children: HashSet<usize> = self.joints.iter().map(|j| j.parent_link).collect();
        let depth_of = |mut id: usize| {
            let mut depth = 0;
            while let Some((_, p)) = self.parent[id] {
                depth += 1;
                id = p;
            }
            depth
        };

        let mut best = self.root;
        let mut best_depth = 0;
        for id in (0..self.links.len()).filter(|i| !has_children.contains(i)) {
            let depth = depth_of(id);
            if depth > best_depth {
                best = id;
                best_depth = depth;
            }
        }
        &self.links[best]
    }
}

fn rgba(color: &urdf_rs::Color) -> [f32; 4] {
    [
        color.rgba.0[0] as f32,
        color.rgba.0[1] as f32,
        color.rgba.0[2] as f32,
        color.rgba.0[3] as f32,
    ]
}

/// Build a link, merging all of its visual elements
fn build_link(
    urdf_link: &urdf_rs::Link,
    loader: &mut MeshLoader,
    options: &LoadOptions,
    material_colors: &HashMap<String, [f32; 4]>,
) -> Result<Link, ModelError> {
    let mut merged: Option<TriMesh> = None;
    let mut color = None;

    for visual in &urdf_link.visual {
        let mesh = loader.geometry_mesh(&visual.geometry)?;
        let mesh = mesh.transformed(&Pose::from(&visual.origin).to_mat4());
        merged.get_or_insert_with(TriMesh::default).append(&mesh);

        if color.is_none()
            && let Some(ref mat) = visual.material
        {
            color = mat
                .color
                .as_ref()
                .map(rgba)
                .or_else(|| material_colors.get(&mat.name).copied());
        }
    }

    Ok(Link {
        name: urdf_link.name.clone(),
        visual: merged,
        color: color.unwrap_or(options.default_color),
    })
}

fn build_joint(
    urdf_joint: &urdf_rs::Joint,
    parent_link: usize,
    child_link: usize,
) -> Result<Joint, ModelError> {
    let joint_type = JointType::from(&urdf_joint.joint_type);

    let axis = DVec3::from(urdf_joint.axis.xyz.0);
    let axis = if joint_type.has_axis() {
        axis.try_normalize()
            .ok_or_else(|| ModelError::InvalidAxis(urdf_joint.name.clone()))?
    } else {
        axis.try_normalize().unwrap_or(DVec3::X)
    };

    Ok(Joint {
        name: urdf_joint.name.clone(),
        joint_type,
        parent_link,
        child_link,
        origin: Pose::from(&urdf_joint.origin),
        axis,
        limits: joint_type
            .has_limits()
            .then(|| JointLimits::from(&urdf_joint.limit)),
        mimic: urdf_joint.mimic.as_ref().map(JointMimic::from),
    })
}

/// Every mimic, on any joint type, must name an existing joint and chains must end
fn validate_mimics(
    joints: &[Joint],
    joint_index: &HashMap<String, usize>,
) -> Result<(), ModelError> {
    for joint in joints {
        let mut current = joint;
        let mut steps = 0;
        while let Some(mimic) = &current.mimic {
            let source = *joint_index
                .get(&mimic.joint)
                .ok_or_else(|| ModelError::JointNotFound(mimic.joint.clone()))?;
            current = &joints[source];
            steps += 1;
            if steps > joints.len() {
                return Err(ModelError::MimicCycle(joint.name.clone()));
            }
        }
    }
    Ok(())
}

/// Resolves and caches visual meshes
struct MeshLoader<'a> {
    base_dir: &'a Path,
    package_paths: Vec<PathBuf>,
    cache: HashMap<PathBuf, TriMesh>,
}

impl<'a> MeshLoader<'a> {
    fn new(base_dir: &'a Path, package_paths: &[PathBuf]) -> Self {
        let mut package_paths = package_paths.to_vec();
        if let Ok(ros_paths) = std::env::var(ROS_PACKAGE_PATH) {
            package_paths.extend(std::env::split_paths(&ros_paths));
        }
        Self {
            base_dir,
            package_paths,
            cache: HashMap::new(),
        }
    }

    fn geometry_mesh(&mut self, geometry: &urdf_rs::Geometry) -> Result<TriMesh, ModelError> {
        let mesh = match geometry {
            urdf_rs::Geometry::Mesh { filename, scale } => {
                let path = self.resolve_mesh_path(filename)?;
                let mut mesh = match self.cache.get(&path) {
                    Some(mesh) => mesh.clone(),
                    None => {
                        let mesh = load_mesh(&path).map_err(|e| ModelError::MeshLoad {
                            path: filename.clone(),
                            source: e,
                        })?;
                        self.cache.insert(path, mesh.clone());
                        mesh
                    }
                };

                if let Some(s) = scale {
                    mesh.scale([s.0[0] as f32, s.0[1] as f32, s.0[2] as f32]);
                }
                mesh
            }

            urdf_rs::Geometry::Box { size } => {
                generate_box_mesh([size.0[0] as f32, size.0[1] as f32, size.0[2] as f32])
            }

            urdf_rs::Geometry::Cylinder { radius, length } => {
                generate_cylinder_mesh(*radius as f32, *length as f32)
            }

            urdf_rs::Geometry::Sphere { radius } => generate_sphere_mesh(*radius as f32),

            urdf_rs::Geometry::Capsule { radius, length } => {
                // Approximate capsule as cylinder
                generate_cylinder_mesh(*radius as f32, *length as f32)
            }
        };

        Ok(mesh)
    }

    /// Resolve mesh path from URDF filename reference
    fn resolve_mesh_path(&self, filename: &str) -> Result<PathBuf, ModelError> {
        let path = if let Some(rest) = filename.strip_prefix("package://") {
            self.resolve_package_uri(filename, rest)?
        } else {
            let path_str = filename.strip_prefix("file://").unwrap_or(filename);
            if Path::new(path_str).is_absolute() {
                PathBuf::from(path_str)
            } else {
                self.base_dir.join(path_str)
            }
        };

        if !crate::mesh::MeshFormat::from_path(&path).is_supported() {
            return Err(ModelError::UnsupportedMeshFormat(filename.to_string()));
        }

        if !path.exists() {
            return Err(ModelError::MeshNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        Ok(path)
    }

    fn resolve_package_uri(&self, uri: &str, rest: &str) -> Result<PathBuf, ModelError> {
        let (package, relative) = rest
            .split_once('/')
            .ok_or_else(|| ModelError::PackageNotFound(uri.to_string()))?;

        self.package_paths
            .iter()
            .map(|dir| dir.join(package))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(relative))
            .ok_or_else(|| ModelError::PackageNotFound(uri.to_string()))
    }
}
