//! Conversion of the node graph into a boundary-representation shape.

use crate::brep::{AppearanceMap, Shape, ShapeKind};
use crate::node::{NodeId, NodeKind};
use crate::scene::SceneData;

/// Collect the geometry under `ids`.
///
/// Every Shape node with geometry contributes its fragment; every group
/// contributes the shape of its children, placed by its transform. A single
/// fragment from a Shape node is returned bare; anything else is wrapped in
/// a compound. When `appearances` is given, each face is bound to the
/// appearance of the Shape node it came from.
pub(crate) fn extract(
    data: &SceneData,
    ids: &[NodeId],
    mut appearances: Option<&mut AppearanceMap>,
) -> Option<Shape> {
    let mut parts = Vec::new();
    let mut single = true;
    for &id in ids {
        let Some(node) = data.node(id) else {
            continue;
        };
        match &node.kind {
            NodeKind::Shape(shape_node) => {
                let Some(fragment) = shape_node
                    .geometry
                    .and_then(|g| data.node(g))
                    .and_then(|g| g.kind.shape(data))
                else {
                    continue;
                };
                if let (Some(map), Some(appearance)) = (appearances.as_deref_mut(), shape_node.appearance) {
                    bind_faces(map, &fragment, appearance);
                }
                parts.push(fragment);
            }
            NodeKind::Group(group) => {
                if let Some(sub) = extract(data, &group.children, appearances.as_deref_mut()) {
                    let placed = if group.is_transform {
                        sub.located(group.matrix())
                    } else {
                        sub
                    };
                    parts.push(placed);
                    single = false;
                }
            }
            _ => {}
        }
    }
    match parts.len() {
        0 => None,
        1 if single => parts.pop(),
        _ => Some(Shape::compound(parts)),
    }
}

fn bind_faces(map: &mut AppearanceMap, fragment: &Shape, appearance: NodeId) {
    if fragment.kind() == ShapeKind::Face {
        map.bind(fragment, appearance);
    } else {
        for face in fragment.faces() {
            map.bind(&face, appearance);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::brep::ShapeKind;
    use crate::node::{Appearance, BoxNode, Group, Material, Node, ShapeNode, Sphere};
    use crate::Scene;
    use vrml_math::DVec3;

    #[test]
    fn test_empty_scene_has_no_shape() {
        let scene = Scene::new();
        assert!(scene.shape().is_none());
        let (shape, map) = scene.shape_with_appearances();
        assert!(shape.is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_single_shape_is_not_wrapped() {
        let scene = Scene::new();
        let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();
        let shape = ShapeNode {
            appearance: None,
            geometry: Some(cube),
        };
        scene.add_node(Node::anonymous(shape), true).unwrap();

        let result = scene.shape().unwrap();
        assert_eq!(result.kind(), ShapeKind::Shell);
        assert_eq!(result.face_count(), 6);
    }

    #[test]
    fn test_shape_without_geometry_is_skipped() {
        let scene = Scene::new();
        scene.add_node(Node::anonymous(ShapeNode::default()), true).unwrap();
        assert!(scene.shape().is_none());
    }

    #[test]
    fn test_group_forces_compound_and_applies_transform() {
        let scene = Scene::new();
        let ball = scene.add_node(Node::anonymous(Sphere::default()), false).unwrap();
        let shape = scene
            .add_node(
                Node::anonymous(ShapeNode {
                    appearance: None,
                    geometry: Some(ball),
                }),
                false,
            )
            .unwrap();
        let mut moved = Group::transform().with_children(vec![shape]);
        moved.translation = DVec3::new(10.0, 0.0, 0.0);
        scene.add_node(Node::anonymous(moved), true).unwrap();

        let result = scene.shape().unwrap();
        assert_eq!(result.kind(), ShapeKind::Compound);
        assert_eq!(result.children().len(), 1);
        let center = result.bounds().centroid();
        assert!((center - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_appearance_bound_to_every_face() {
        let scene = Scene::new();
        let material = scene
            .add_node(
                Node::anonymous(Material {
                    diffuse_color: DVec3::new(0.0, 0.0, 1.0),
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let look = scene
            .add_node(
                Node::anonymous(Appearance {
                    material: Some(material),
                    ..Default::default()
                }),
                false,
            )
            .unwrap();
        let cube = scene.add_node(Node::anonymous(BoxNode::default()), false).unwrap();
        let shape = ShapeNode {
            appearance: Some(look),
            geometry: Some(cube),
        };
        scene.add_node(Node::anonymous(shape), true).unwrap();

        let (result, map) = scene.shape_with_appearances();
        let result = result.unwrap();
        assert_eq!(map.len(), 6);
        for face in result.faces() {
            assert_eq!(map.get(&face), Some(look));
        }
    }
}
