//! URDF loading
//!
//! Turns a URDF document (local file or http URL) into a [`RobotModel`]:
//! joints in document order, a scene node tree, and renderable visual parts.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};

use crate::mesh::{load_mesh, MeshFormat, MeshSource};
use crate::primitive::{generate_box, generate_cylinder, generate_sphere};
use crate::robot::{JointLimits, JointState, JointType, RobotModel, VisualPart};
use crate::scene::{NodeId, NodeKind, SceneNode};

/// Options for resolving a URDF document's mesh references
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Base directory for relative mesh paths; defaults to the URDF's parent
    pub base_dir: Option<PathBuf>,
    /// Package name -> root directory, for `package://` URIs
    pub package_paths: HashMap<String, PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            package_paths: discover_ros_packages(),
        }
    }
}

impl LoadOptions {
    /// Add a package path mapping
    pub fn add_package_path(&mut self, package: impl Into<String>, path: impl Into<PathBuf>) {
        self.package_paths.insert(package.into(), path.into());
    }
}

/// Discover ROS package roots from the usual environment variables
/// (ROS_PACKAGE_PATH, AMENT_PREFIX_PATH, COLCON_PREFIX_PATH).
fn discover_ros_packages() -> HashMap<String, PathBuf> {
    let mut packages = HashMap::new();

    let mut scan = |dir: &Path| {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && path.join("package.xml").exists() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    packages.insert(name.to_string(), path.clone());
                }
            }
        }
    };

    if let Ok(var) = std::env::var("ROS_PACKAGE_PATH") {
        for dir in var.split(':') {
            scan(Path::new(dir));
        }
    }
    for env in ["AMENT_PREFIX_PATH", "COLCON_PREFIX_PATH"] {
        if let Ok(var) = std::env::var(env) {
            for dir in var.split(':') {
                scan(&Path::new(dir).join("share"));
            }
        }
    }

    packages
}

/// Errors that can occur while loading a robot description
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to parse URDF: {0}")]
    UrdfParse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Mesh file not found: {path}")]
    MeshNotFound { path: String },

    #[error("Failed to load mesh '{path}': {reason}")]
    MeshLoad { path: String, reason: String },

    #[error("Unsupported mesh format: {0}")]
    UnsupportedMeshFormat(String),

    #[error("Package not found: {package} (from URI: {uri})")]
    PackageNotFound { package: String, uri: String },

    #[error("Cannot resolve mesh '{uri}' relative to a remote URDF")]
    RemoteMesh { uri: String },

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Empty URDF: no links defined")]
    EmptyModel,
}

/// Load a robot model from a filesystem path or an `http(s)://` URL.
///
/// Remote documents are fetched with ureq and parsed from the body; their
/// mesh references cannot be resolved (primitive geometry still works).
pub fn load_robot(source: &str, options: &LoadOptions) -> Result<RobotModel, LoadError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!("Fetching robot description from {source}");
        let mut response = ureq::get(source).call().map_err(|e| LoadError::Fetch {
            url: source.to_string(),
            reason: e.to_string(),
        })?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LoadError::Fetch {
                url: source.to_string(),
                reason: e.to_string(),
            })?;
        let robot =
            urdf_rs::read_from_string(&body).map_err(|e| LoadError::UrdfParse(e.to_string()))?;
        build_model(&robot, MeshRoot::Remote(source.to_string()), options)
    } else {
        let path = Path::new(source);
        let robot = urdf_rs::read_file(path).map_err(|e| LoadError::UrdfParse(e.to_string()))?;
        let base_dir = options
            .base_dir
            .clone()
            .or_else(|| path.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        build_model(&robot, MeshRoot::Local(base_dir), options)
    }
}

/// Build a model from an already-parsed URDF document (used by tests and by
/// callers that produce the XML themselves).
pub fn build_from_string(
    urdf: &str,
    base_dir: impl Into<PathBuf>,
    options: &LoadOptions,
) -> Result<RobotModel, LoadError> {
    let robot = urdf_rs::read_from_string(urdf).map_err(|e| LoadError::UrdfParse(e.to_string()))?;
    build_model(&robot, MeshRoot::Local(base_dir.into()), options)
}

/// Where to resolve relative mesh references
enum MeshRoot {
    Local(PathBuf),
    Remote(String),
}

fn build_model(
    robot: &urdf_rs::Robot,
    mesh_root: MeshRoot,
    options: &LoadOptions,
) -> Result<RobotModel, LoadError> {
    if robot.links.is_empty() {
        return Err(LoadError::EmptyModel);
    }

    // Global material palette: name -> rgba
    let material_colors: HashMap<String, [f32; 4]> = robot
        .materials
        .iter()
        .filter_map(|m| m.color.as_ref().map(|c| (m.name.clone(), rgba(&c.rgba))))
        .collect();

    let links: HashMap<&str, &urdf_rs::Link> =
        robot.links.iter().map(|l| (l.name.as_str(), l)).collect();

    // Child joints grouped by parent link, in document order
    let mut children: HashMap<&str, Vec<&urdf_rs::Joint>> = HashMap::new();
    for joint in &robot.joints {
        children
            .entry(joint.parent.link.as_str())
            .or_default()
            .push(joint);
    }

    // Root link: the one that is not any joint's child
    let root_link = robot
        .links
        .iter()
        .find(|l| !robot.joints.iter().any(|j| j.child.link == l.name))
        .ok_or(LoadError::EmptyModel)?;

    let mut model = RobotModel::new(robot.name.clone());

    // Joints first, in document order, so the name -> index map reflects the
    // document. Node ids are patched in while the tree is built.
    for (i, joint) in robot.joints.iter().enumerate() {
        let joint_type = JointType::from(&joint.joint_type);
        let limits = match joint_type {
            JointType::Revolute | JointType::Prismatic => Some(JointLimits::new(
                joint.limit.lower as f32,
                joint.limit.upper as f32,
            )),
            _ => None,
        };
        let axis = Vec3::new(
            joint.axis.xyz.0[0] as f32,
            joint.axis.xyz.0[1] as f32,
            joint.axis.xyz.0[2] as f32,
        );
        model.joints.push(JointState::new(
            joint.name.clone(),
            joint_type,
            axis,
            limits,
            NodeId(0), // patched below
        ));
        model.joint_index.insert(joint.name.clone(), i);
    }

    let mut builder = TreeBuilder {
        model: &mut model,
        links: &links,
        children: &children,
        material_colors: &material_colors,
        mesh_root: &mesh_root,
        options,
        visited: HashSet::new(),
    };
    builder.add_link(root_link, None)?;

    model.update_world_transforms();
    tracing::info!(
        "Loaded robot '{}': {} links, {} joints, {} parts",
        model.name,
        robot.links.len(),
        model.joint_count(),
        model.parts().len()
    );
    Ok(model)
}

struct TreeBuilder<'a> {
    model: &'a mut RobotModel,
    links: &'a HashMap<&'a str, &'a urdf_rs::Link>,
    children: &'a HashMap<&'a str, Vec<&'a urdf_rs::Joint>>,
    material_colors: &'a HashMap<String, [f32; 4]>,
    mesh_root: &'a MeshRoot,
    options: &'a LoadOptions,
    /// Links already placed in the tree, to reject joint cycles
    visited: HashSet<String>,
}

impl TreeBuilder<'_> {
    fn add_link(
        &mut self,
        link: &urdf_rs::Link,
        parent: Option<NodeId>,
    ) -> Result<NodeId, LoadError> {
        if !self.visited.insert(link.name.clone()) {
            return Err(LoadError::UrdfParse(format!(
                "link '{}' is the child of more than one joint chain",
                link.name
            )));
        }

        let link_node = self.model.push_node(SceneNode::new(
            link.name.clone(),
            NodeKind::Group,
            parent,
            Mat4::IDENTITY,
        ));

        for (i, visual) in link.visual.iter().enumerate() {
            self.add_visual(link, visual, i, link_node)?;
        }

        for joint in self.children.get(link.name.as_str()).into_iter().flatten() {
            let joint_index = self
                .model
                .joint_index
                .get(&joint.name)
                .copied()
                .ok_or_else(|| LoadError::UrdfParse(format!("unknown joint '{}'", joint.name)))?;

            let joint_node = self.model.push_node(SceneNode::new(
                joint.name.clone(),
                NodeKind::Joint(joint_index),
                Some(link_node),
                pose_to_mat4(&joint.origin),
            ));
            self.model.joints[joint_index].node = joint_node;

            let child = self
                .links
                .get(joint.child.link.as_str())
                .copied()
                .ok_or_else(|| LoadError::LinkNotFound(joint.child.link.clone()))?;
            self.add_link(child, Some(joint_node))?;
        }

        Ok(link_node)
    }

    fn add_visual(
        &mut self,
        link: &urdf_rs::Link,
        visual: &urdf_rs::Visual,
        index: usize,
        link_node: NodeId,
    ) -> Result<(), LoadError> {
        let Some(mesh) = self.geometry_mesh(&visual.geometry)? else {
            return Ok(());
        };

        let name = visual.name.clone().unwrap_or_else(|| {
            if index == 0 {
                link.name.clone()
            } else {
                format!("{}_visual_{index}", link.name)
            }
        });

        let node = self.model.push_node(SceneNode::new(
            name.clone(),
            NodeKind::Visual(self.model.parts.len()),
            Some(link_node),
            pose_to_mat4(&visual.origin),
        ));

        let mut part = VisualPart::new(name, node);
        part.vertices = mesh.vertices;
        part.normals = mesh.normals;
        part.indices = mesh.indices;
        part.color = self.material_color(visual);
        part.calculate_bounding_box();
        self.model.parts.push(part);
        Ok(())
    }

    /// Resolve the visual's color: inline rgba wins, then the global palette,
    /// then None (the part is rendered with the default color and never
    /// highlighted).
    fn material_color(&self, visual: &urdf_rs::Visual) -> Option<[f32; 4]> {
        let material = visual.material.as_ref()?;
        material
            .color
            .as_ref()
            .map(|c| rgba(&c.rgba))
            .or_else(|| self.material_colors.get(&material.name).copied())
    }

    fn geometry_mesh(&self, geometry: &urdf_rs::Geometry) -> Result<Option<MeshSource>, LoadError> {
        let mesh = match geometry {
            urdf_rs::Geometry::Mesh { filename, scale } => {
                let path = self.resolve_mesh_path(filename)?;
                let mut mesh = load_mesh(&path).map_err(|e| LoadError::MeshLoad {
                    path: filename.clone(),
                    reason: e.to_string(),
                })?;
                if let Some(s) = scale {
                    mesh.apply_scale([s.0[0] as f32, s.0[1] as f32, s.0[2] as f32]);
                }
                mesh
            }
            urdf_rs::Geometry::Box { size } => {
                generate_box([size.0[0] as f32, size.0[1] as f32, size.0[2] as f32])
            }
            urdf_rs::Geometry::Cylinder { radius, length } => {
                generate_cylinder(*radius as f32, *length as f32)
            }
            urdf_rs::Geometry::Sphere { radius } => generate_sphere(*radius as f32),
            // Approximate capsule as a cylinder of the same radius and length
            urdf_rs::Geometry::Capsule { radius, length } => {
                generate_cylinder(*radius as f32, *length as f32)
            }
        };
        Ok(Some(mesh))
    }

    fn resolve_mesh_path(&self, filename: &str) -> Result<PathBuf, LoadError> {
        let base_dir = match self.mesh_root {
            MeshRoot::Local(dir) => dir,
            MeshRoot::Remote(_) => {
                return Err(LoadError::RemoteMesh {
                    uri: filename.to_string(),
                });
            }
        };
        resolve_mesh_path(filename, base_dir, &self.options.package_paths)
    }
}

/// Resolve a URDF mesh filename (`package://`, `file://`, relative, absolute)
/// to a filesystem path.
fn resolve_mesh_path(
    filename: &str,
    base_dir: &Path,
    package_paths: &HashMap<String, PathBuf>,
) -> Result<PathBuf, LoadError> {
    if let Some(rest) = filename.strip_prefix("package://") {
        return resolve_package_uri(rest, filename, package_paths, base_dir);
    }

    let path_str = filename.strip_prefix("file://").unwrap_or(filename);

    let format = MeshFormat::from_path(Path::new(path_str));
    if !format.is_supported() {
        return Err(LoadError::UnsupportedMeshFormat(format!(
            "{filename} ({})",
            format.name()
        )));
    }

    let path = if Path::new(path_str).is_absolute() {
        PathBuf::from(path_str)
    } else {
        base_dir.join(path_str)
    };

    if !path.exists() {
        return Err(LoadError::MeshNotFound {
            path: path.to_string_lossy().to_string(),
        });
    }
    Ok(path)
}

fn resolve_package_uri(
    rest: &str,
    original_uri: &str,
    package_paths: &HashMap<String, PathBuf>,
    base_dir: &Path,
) -> Result<PathBuf, LoadError> {
    let mut parts = rest.splitn(2, '/');
    let package = parts.next().unwrap_or_default();
    let relative = parts.next().unwrap_or_default();

    let format = MeshFormat::from_path(Path::new(relative));
    if !format.is_supported() {
        return Err(LoadError::UnsupportedMeshFormat(format!(
            "{original_uri} ({})",
            format.name()
        )));
    }

    if let Some(root) = package_paths.get(package) {
        let path = root.join(relative);
        if path.exists() {
            return Ok(path);
        }
    }

    // Fallbacks for URDFs living inside their own package
    let candidates = [
        base_dir.join(relative),
        base_dir.join("..").join(relative),
        base_dir.join("..").join(package).join(relative),
        base_dir.join("..").join("..").join(package).join(relative),
    ];
    for candidate in &candidates {
        if let Ok(canonical) = candidate.canonicalize() {
            return Ok(canonical);
        }
    }

    Err(LoadError::PackageNotFound {
        package: package.to_string(),
        uri: original_uri.to_string(),
    })
}

fn pose_to_mat4(pose: &urdf_rs::Pose) -> Mat4 {
    let translation = Vec3::new(
        pose.xyz.0[0] as f32,
        pose.xyz.0[1] as f32,
        pose.xyz.0[2] as f32,
    );
    let rotation = Quat::from_euler(
        glam::EulerRot::XYZ,
        pose.rpy.0[0] as f32,
        pose.rpy.0[1] as f32,
        pose.rpy.0[2] as f32,
    );
    Mat4::from_rotation_translation(rotation, translation)
}

fn rgba(color: &urdf_rs::Vec4) -> [f32; 4] {
    [
        color.0[0] as f32,
        color.0[1] as f32,
        color.0[2] as f32,
        color.0[3] as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    const ARM_URDF: &str = r#"
        <robot name="two_link_arm">
          <material name="steel"><color rgba="0.6 0.6 0.7 1.0"/></material>
          <link name="base">
            <visual>
              <geometry><box size="0.2 0.2 0.1"/></geometry>
              <material name="steel"/>
            </visual>
          </link>
          <link name="upper">
            <visual>
              <origin xyz="0 0 0.25"/>
              <geometry><cylinder radius="0.05" length="0.5"/></geometry>
              <material name="red"><color rgba="1 0 0 1"/></material>
            </visual>
          </link>
          <link name="tool">
            <visual>
              <geometry><sphere radius="0.04"/></geometry>
            </visual>
          </link>
          <joint name="shoulder" type="revolute">
            <parent link="base"/>
            <child link="upper"/>
            <origin xyz="0 0 0.1"/>
            <axis xyz="0 1 0"/>
            <limit lower="-1.5" upper="1.5" effort="10" velocity="1"/>
          </joint>
          <joint name="wrist" type="fixed">
            <parent link="upper"/>
            <child link="tool"/>
            <origin xyz="0 0 0.5"/>
          </joint>
        </robot>
    "#;

    fn arm() -> RobotModel {
        build_from_string(ARM_URDF, ".", &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_joints_in_document_order() {
        let model = arm();
        assert_eq!(model.joint_count(), 2);
        assert_eq!(model.joints()[0].name, "shoulder");
        assert_eq!(model.joints()[1].name, "wrist");
        assert_eq!(model.find_joint_by_name("shoulder"), Some(0));
        assert_eq!(model.find_joint_by_name("wrist"), Some(1));
        assert_eq!(model.find_joint_by_name("missing"), None);
    }

    #[test]
    fn test_joint_limits_and_types() {
        let model = arm();
        let shoulder = &model.joints()[0];
        assert_eq!(shoulder.joint_type, JointType::Revolute);
        let limits = shoulder.limits.unwrap();
        assert_eq!(limits.lower, -1.5);
        assert_eq!(limits.upper, 1.5);
        assert_eq!(shoulder.axis, Vec3::Y);

        let wrist = &model.joints()[1];
        assert_eq!(wrist.joint_type, JointType::Fixed);
        assert!(wrist.limits.is_none());
    }

    #[test]
    fn test_material_colors() {
        let model = arm();
        // base uses the named global material, upper an inline one, tool none
        let base = model.parts().iter().find(|p| p.name == "base").unwrap();
        assert_eq!(base.color, Some([0.6, 0.6, 0.7, 1.0]));
        let upper = model.parts().iter().find(|p| p.name == "upper").unwrap();
        assert_eq!(upper.color, Some([1.0, 0.0, 0.0, 1.0]));
        let tool = model.parts().iter().find(|p| p.name == "tool").unwrap();
        assert_eq!(tool.color, None);
    }

    #[test]
    fn test_part_joint_lookup() {
        let model = arm();
        let upper = model.parts().iter().find(|p| p.name == "upper").unwrap();
        assert_eq!(model.nearest_joint(upper.node), Some(0));

        // The tool's nearest joint is the fixed wrist, not the shoulder
        let tool = model.parts().iter().find(|p| p.name == "tool").unwrap();
        assert_eq!(model.nearest_joint(tool.node), Some(1));

        // The base sits above every joint
        let base = model.parts().iter().find(|p| p.name == "base").unwrap();
        assert_eq!(model.nearest_joint(base.node), None);
    }

    #[test]
    fn test_joint_nodes_patched() {
        let model = arm();
        for (i, joint) in model.joints().iter().enumerate() {
            assert_eq!(model.node(joint.node).kind, NodeKind::Joint(i));
        }
    }

    #[test]
    fn test_joint_cycle_rejected() {
        // b's child joint points back at a; the load must fail, not recurse
        let cyclic = r#"
            <robot name="looped">
              <link name="base"/>
              <link name="a"/>
              <link name="b"/>
              <joint name="root_to_a" type="fixed">
                <parent link="base"/>
                <child link="a"/>
              </joint>
              <joint name="a_to_b" type="fixed">
                <parent link="a"/>
                <child link="b"/>
              </joint>
              <joint name="b_to_a" type="fixed">
                <parent link="b"/>
                <child link="a"/>
              </joint>
            </robot>
        "#;
        let result = build_from_string(cyclic, ".", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::UrdfParse(_))));
    }

    #[test]
    fn test_empty_urdf_rejected() {
        let result = build_from_string(r#"<robot name="empty"></robot>"#, ".", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::EmptyModel)));
    }

    #[test]
    fn test_resolve_package_uri_not_found() {
        let packages = HashMap::new();
        let result = resolve_mesh_path("package://robot/meshes/link.stl", Path::new("/nonexistent"), &packages);
        assert!(matches!(result, Err(LoadError::PackageNotFound { .. })));
    }

    #[test]
    fn test_resolve_package_uri_with_mapping() {
        use std::fs;
        use tempfile::tempdir;

        let temp = tempdir().unwrap();
        let meshes = temp.path().join("meshes");
        fs::create_dir_all(&meshes).unwrap();
        let stl = meshes.join("link.stl");
        fs::write(&stl, b"solid link\nendsolid link\n").unwrap();

        let mut packages = HashMap::new();
        packages.insert("robot".to_string(), temp.path().to_path_buf());

        let result = resolve_mesh_path("package://robot/meshes/link.stl", Path::new("."), &packages);
        assert_eq!(result.unwrap(), stl);
    }

    #[test]
    fn test_resolve_rejects_dae() {
        let packages = HashMap::new();
        let result = resolve_mesh_path("mesh.dae", Path::new("."), &packages);
        assert!(matches!(result, Err(LoadError::UnsupportedMeshFormat(_))));
    }

    #[test]
    fn test_remote_urdf_mesh_rejected() {
        let robot = urdf_rs::read_from_string(
            r#"
            <robot name="remote">
              <link name="base">
                <visual><geometry><mesh filename="meshes/base.stl"/></geometry></visual>
              </link>
            </robot>
            "#,
        )
        .unwrap();
        let result = build_model(
            &robot,
            MeshRoot::Remote("http://example.com/robot.urdf".into()),
            &LoadOptions::default(),
        );
        assert!(matches!(result, Err(LoadError::RemoteMesh { .. })));
    }
}
