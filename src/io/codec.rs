// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editable form of a scene.
//!
//! A compact JSON envelope carrying a format version, the logical canvas
//! size and the scene. Encoding the same scene always yields the same
//! bytes: the scene holds only ordered sequences.

use crate::error::{EditorError, Result};
use crate::models::scene::{CanvasSize, Scene, LOGICAL_CANVAS};
use serde::{Deserialize, Serialize};

/// Current editable-form version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    canvas: CanvasSize,
    scene: &'a Scene,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[allow(dead_code)]
    canvas: Option<CanvasSize>,
    scene: Scene,
}

/// Serialize a scene to its editable form.
pub fn encode(scene: &Scene) -> Result<String> {
    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        canvas: LOGICAL_CANVAS,
        scene,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Restore a scene from its editable form.
pub fn decode(editable: &str) -> Result<Scene> {
    let envelope: Envelope = serde_json::from_str(editable)?;
    if envelope.version != FORMAT_VERSION {
        return Err(EditorError::format(format!(
            "unsupported version {} (expected {})",
            envelope.version, FORMAT_VERSION
        )));
    }
    Ok(envelope.scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{
        ArrowGroup, IconMarker, Placement, Point, Rgba, Shape, Stroke, TextLabel,
    };
    use crate::models::scene::Background;
    use proptest::prelude::*;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        scene.set_background(Some(Background {
            reference: "objects/site-plans/Q-1001/background.png".to_string(),
            width: 1000,
            height: 800,
        }));
        scene.add(Shape::Stroke(Stroke {
            points: vec![Point::new(1.5, 2.25), Point::new(3.0, 4.125)],
            color: Rgba::RED,
            width: 3.0,
        }));
        scene.add(Shape::Arrow(ArrowGroup::new(
            Point::new(100.0, 100.0),
            Point::new(300.0, 100.0),
            Rgba::BLACK,
            2.0,
        )));
        let label = scene.add(Shape::Text(TextLabel {
            anchor: Point::new(50.0, 60.0),
            content: "Main entrance \"A\"".to_string(),
            font_size: 20.0,
            color: Rgba::BLACK,
        }));
        scene.add(Shape::Icon(IconMarker::new(
            "dome_camera",
            "Dome Camera",
            Point::new(400.0, 300.0),
            48.0,
        )));
        scene.set_placement(
            label,
            Placement {
                offset: Point::new(10.0, -5.0),
                rotation: 0.3,
                scale: 1.5,
            },
        );
        scene
    }

    #[test]
    fn test_roundtrip_preserves_scene() {
        let scene = sample_scene();
        let restored = decode(&encode(&scene).unwrap()).unwrap();
        assert_eq!(restored, scene);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let scene = sample_scene();
        let first = encode(&scene).unwrap();
        let second = encode(&decode(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{"version":99,"scene":{"annotations":[]}}"#;
        assert!(matches!(decode(json), Err(EditorError::Format { .. })));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(EditorError::Format { .. })));
    }

    fn arb_point() -> impl Strategy<Value = Point> {
        (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn arb_shape() -> impl Strategy<Value = Shape> {
        prop_oneof![
            (prop::collection::vec(arb_point(), 1..20), 0.5f64..20.0).prop_map(|(points, width)| {
                Shape::Stroke(Stroke {
                    points,
                    color: Rgba::RED,
                    width,
                })
            }),
            (arb_point(), arb_point()).prop_map(|(a, b)| Shape::Arrow(ArrowGroup::new(a, b, Rgba::BLACK, 3.0))),
            (arb_point(), "[a-zA-Z0-9 <>&\"]{1,24}").prop_map(|(anchor, content)| {
                Shape::Text(TextLabel {
                    anchor,
                    content,
                    font_size: 20.0,
                    color: Rgba::BLACK,
                })
            }),
            arb_point().prop_map(|p| Shape::Icon(IconMarker::new("siren", "Siren", p, 48.0))),
        ]
    }

    proptest! {
        #[test]
        fn prop_roundtrip_keeps_count_order_and_fields(shapes in prop::collection::vec(arb_shape(), 0..16)) {
            let mut scene = Scene::new();
            for shape in shapes {
                scene.add(shape);
            }
            let encoded = encode(&scene).unwrap();
            let restored = decode(&encoded).unwrap();
            prop_assert_eq!(restored.len(), scene.len());
            prop_assert_eq!(&restored, &scene);
            prop_assert_eq!(encode(&restored).unwrap(), encoded);
        }
    }
}
