use anyhow::Result;

use robosim_core::graphics::VertexData;
use robosim_core::scene::graphical::DrawPass;
use robosim_core::simulation::Simulation;
use robosim_core::LoadError;

use crate::common::test_utils::{init_logging, RecordingContext};

mod common;

const PUCK_SCENE: &str = r#"
scene:
  name: arena
  step_length: 0.01
  gravity: [0.0, 0.0]
  bodies:
    - name: puck
      position: [0.0, 1.0]
      geometries:
        - shape: circle
          radius: 0.1
      appearance:
        name: puck_hull
        vertices:
          unit: 1.0
          data:
            - [0.0, 0.0, 0.0]
            - [1.0, 0.0, 0.0]
            - [1.0, 1.0, 0.0]
            - [0.0, 1.0, 0.0]
        primitives:
          - mode: quads
            indices: [0, 1, 2, 3]
  compounds:
    - name: border
      geometries:
        - shape: rect
          width: 4.0
          height: 0.1
          offset: [0.0, -1.0]
"#;

#[test]
fn ten_steps_advance_counters_by_fixed_interval() -> Result<()> {
    init_logging();
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE)?;

    for _ in 0..10 {
        simulation.step();
    }

    assert_eq!(simulation.step_count(), 10);
    assert!((simulation.simulated_time() - 0.1).abs() < 1e-6);
    Ok(())
}

#[test]
fn load_failure_leaves_simulation_unloaded() {
    let mut simulation = Simulation::new();
    let err = simulation.load_str("scene:\n  bodies: 3\n").unwrap_err();
    assert!(!err.messages().is_empty());
    assert!(!simulation.is_loaded());
    assert_eq!(simulation.step_count(), 0);
}

#[test]
fn structural_errors_are_reported_as_a_list() {
    let text = r#"
scene:
  name: broken
  step_length: -1.0
  bodies:
    - name: empty_body
      geometries: []
    - name: bad_circle
      geometries:
        - shape: circle
          radius: 0.0
"#;
    let mut simulation = Simulation::new();
    match simulation.load_str(text) {
        Err(LoadError::Invalid(errors)) => {
            assert!(errors.len() >= 3, "expected all problems listed: {errors:?}");
            assert!(errors.iter().any(|e| e.contains("step_length")));
            assert!(errors.iter().any(|e| e.contains("empty_body")));
            assert!(errors.iter().any(|e| e.contains("radius")));
        }
        other => panic!("expected invalid-scene error, got {other:?}"),
    }
    assert!(!simulation.is_loaded());
}

#[test]
fn loaded_scene_builds_world_with_solver_handles() -> Result<()> {
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE)?;

    let scene = simulation.scene().expect("scene just loaded");
    assert!(scene.bodies[0].handle().is_some());
    assert!(scene.bodies[0].geometries[0].collider().is_some());
    assert!(scene.compounds[0].geometries[0].collider().is_some());
    Ok(())
}

#[test]
fn register_objects_reports_scene_then_children() {
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE).unwrap();

    let mut seen = Vec::new();
    simulation.register_objects(&mut |name, parent| {
        seen.push((name.to_string(), parent.map(str::to_string)));
    });

    assert_eq!(seen[0], ("arena".to_string(), None));
    assert!(seen.contains(&("puck".to_string(), Some("arena".to_string()))));
    assert!(seen.contains(&("border".to_string(), Some("arena".to_string()))));
}

#[test]
fn end_to_end_quad_scene_synthesizes_flat_mesh() -> Result<()> {
    init_logging();
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE)?;

    let mut ctx = RecordingContext::new();
    simulation.create_graphics(&mut ctx);

    assert_eq!(ctx.meshes.len(), 1);
    let mesh = robosim_core::MeshHandle(0);
    assert_eq!(ctx.indices_of(mesh).len(), 6);
    match ctx.vertex_data_of(mesh) {
        VertexData::Plain(vertices) => {
            assert_eq!(vertices.len(), 4);
            let first = vertices[0].normal;
            for vertex in vertices {
                assert_eq!(vertex.normal, first);
            }
            assert!((first[2].abs() - 1.0).abs() < 1e-6);
        }
        other => panic!("expected plain layout, got {other:?}"),
    }

    // Resources are created once; a second pass is a no-op.
    simulation.create_graphics(&mut ctx);
    assert_eq!(ctx.meshes.len(), 1);
    Ok(())
}

#[test]
fn draw_submits_body_appearance_at_body_pose() {
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE).unwrap();

    let mut ctx = RecordingContext::new();
    simulation.create_graphics(&mut ctx);
    simulation.update_model_matrices();
    simulation.draw(&mut ctx, &DrawPass::default());

    assert_eq!(ctx.draws.len(), 1);
    let (_, matrix, _) = &ctx.draws[0];
    // The puck body sits at (0, 1); its appearance must be drawn there.
    assert!((matrix.w.x - 0.0).abs() < 1e-5);
    assert!((matrix.w.y - 1.0).abs() < 1e-5);
}

#[test]
fn frame_rate_estimate_is_stable_within_a_sample_window() {
    let mut simulation = Simulation::new();
    simulation.load_str(PUCK_SCENE).unwrap();

    // A handful of immediate steps stays well below the 2 s sample interval.
    for _ in 0..5 {
        simulation.step();
    }
    assert_eq!(simulation.frame_rate(), 0);
}
