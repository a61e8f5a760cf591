use std::cell::RefCell;
use std::rc::Rc;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use robosim_core::scene::geometry::{PrimitiveGroup, PrimitiveMode, VertexLibrary};
use robosim_core::scene::graphical::{
    AppearanceElement, ComplexAppearance, ControllerDrawing, DrawPass,
};

use crate::common::test_utils::{init_logging, RecordingContext};

mod common;

type CallLog = Rc<RefCell<Vec<(&'static str, Matrix4<f32>, Matrix4<f32>)>>>;

/// Records every invocation together with the matrices it was handed.
struct NamedDrawing {
    name: &'static str,
    log: CallLog,
}

impl ControllerDrawing for NamedDrawing {
    fn draw(&mut self, projection: &Matrix4<f32>, view: &Matrix4<f32>) {
        self.log.borrow_mut().push((self.name, *projection, *view));
    }
}

fn quad_shape(name: &str) -> ComplexAppearance {
    let mut shape = ComplexAppearance::new(name);
    shape.attach(AppearanceElement::Vertices(VertexLibrary {
        unit: 1.0,
        vertices: vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ],
    }));
    shape.attach(AppearanceElement::Primitives(PrimitiveGroup::new(
        PrimitiveMode::Quads,
        vec![0, 1, 2, 3],
    )));
    shape
}

#[test]
fn drawings_run_depth_first_with_the_raw_matrices() {
    init_logging();
    let log: CallLog = Rc::default();

    let mut child = ComplexAppearance::new("antenna");
    child.register_drawing(Box::new(NamedDrawing {
        name: "child",
        log: log.clone(),
    }));

    let mut root = quad_shape("hull");
    root.register_drawing(Box::new(NamedDrawing {
        name: "root",
        log: log.clone(),
    }));
    root.attach(AppearanceElement::Child(child));

    let projection = Matrix4::from_scale(2.0);
    let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0));
    root.draw_controller_drawings(&projection, &view);

    let calls = log.borrow();
    assert_eq!(calls.len(), 2);
    // Own drawings first, then the children in insertion order.
    assert_eq!(calls[0], ("root", projection, view));
    assert_eq!(calls[1], ("child", projection, view));
}

#[test]
fn controller_pass_submits_no_meshes() {
    let mut shape = quad_shape("hull");
    let mut ctx = RecordingContext::new();
    shape.create_graphics(&mut ctx);
    shape.update_model_matrices(&[Matrix4::identity()]);

    let pass = DrawPass {
        matrix_index: 0,
        controller_drawings: true,
    };
    shape.draw(&mut ctx, &pass);
    assert!(ctx.draws.is_empty());

    shape.draw(&mut ctx, &DrawPass::default());
    assert_eq!(ctx.draws.len(), 1);
}

#[test]
fn matrix_index_selects_the_placement() {
    let mut shape = quad_shape("hull");
    let mut ctx = RecordingContext::new();
    shape.create_graphics(&mut ctx);

    // Two placements of the same object in the scene.
    shape.update_model_matrices(&[
        Matrix4::identity(),
        Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)),
    ]);

    shape.draw(
        &mut ctx,
        &DrawPass {
            matrix_index: 1,
            controller_drawings: false,
        },
    );

    assert_eq!(ctx.draws.len(), 1);
    let (_, matrix, _) = &ctx.draws[0];
    assert!((matrix.w.x - 2.0).abs() < 1e-6);
}

#[test]
fn cleared_drawings_no_longer_run() {
    let log: CallLog = Rc::default();
    let mut shape = ComplexAppearance::new("hull");
    shape.register_drawing(Box::new(NamedDrawing {
        name: "root",
        log: log.clone(),
    }));
    shape.clear_drawings();

    shape.draw_controller_drawings(&Matrix4::identity(), &Matrix4::identity());
    assert!(log.borrow().is_empty());
}
