//! Builds the stereo camera rig on the simulated display and walks the
//! head through a slow turn.

use anyhow::Result;
use glam::{Quat, Vec3};

use ember_bridges::hmd::{Eye, HeadPose, SimulatedHmd};
use ember_bridges::{BridgeSettings, FrameLoop, HmdCamera, Node};

fn main() -> Result<()> {
    env_logger::init();

    let settings = BridgeSettings::default();
    let hmd = SimulatedHmd::detect()?;
    let camera = HmdCamera::new(Box::new(hmd.clone()), &settings.hmd);

    let head = Node::new("head");
    let frames = FrameLoop::new();
    camera.attach(&head, &frames)?;

    let target = camera
        .render_target()
        .expect("camera was attached, target exists");
    println!(
        "render target: {}x{} (aspect {:.2})",
        target.width,
        target.height,
        target.width as f32 / target.height as f32
    );

    for eye in Eye::BOTH {
        let rig = camera.eye_rig(eye).expect("attached camera has both eyes");
        println!(
            "{:?} eye: viewport ({}, {}) {}x{}, fov {:.1} deg, distortion mesh {} vertices / {} triangles",
            eye,
            rig.renderer.viewport.x,
            rig.renderer.viewport.y,
            rig.renderer.viewport.width,
            rig.renderer.viewport.height,
            rig.camera.fov_y.to_degrees(),
            rig.distortion.vertex_count(),
            rig.distortion.triangle_count()
        );
    }

    // Turn the head 90 degrees over two seconds.
    for frame in 0..120 {
        let yaw = frame as f32 / 120.0 * std::f32::consts::FRAC_PI_2;
        hmd.set_head_pose(HeadPose {
            orientation: Quat::from_rotation_y(yaw),
            position: Vec3::ZERO,
        });
        frames.run_frame(settings.physics.fixed_timestep);

        if frame % 30 == 29 {
            let (_, rotation, _) = head.transform().to_scale_rotation_translation();
            let (axis, angle) = rotation.to_axis_angle();
            println!(
                "frame {:>3}: head yaw {:.1} deg (axis {:+.1} {:+.1} {:+.1})",
                frame + 1,
                angle.to_degrees(),
                axis.x,
                axis.y,
                axis.z
            );
        }
    }

    // Recenter: the current pose becomes the neutral one.
    camera.reset_head_tracking();
    frames.run_frame(settings.physics.fixed_timestep);
    let (_, rotation, _) = head.transform().to_scale_rotation_translation();
    println!(
        "after recenter: residual head angle {:.3} deg",
        rotation.to_axis_angle().1.to_degrees()
    );

    camera.detach();
    Ok(())
}
