/// Stereo camera component driven by an HMD runtime.
///
/// Attaching builds the whole rig: one shared render target sized from the
/// runtime's recommendations, one renderer and perspective camera per eye,
/// one child node per eye under the target node, and one distortion mesh
/// per eye for the compositor. Each frame end, the tracked head orientation
/// is written back to the target node.
use std::sync::Arc;

use glam::Mat4;
use parking_lot::Mutex;

use crate::frame::FrameLoop;
use crate::hmd::error::{already_attached, HmdResult};
use crate::hmd::runtime::{Eye, EyeFov, HmdRuntime, TrackingCaps};
use crate::hmd::WORLD_UNIT;
use crate::render::{Geometry, PerspectiveCamera, RenderTarget, Renderer, Viewport};
use crate::scene::{Node, NodeRef};
use crate::settings::HmdSettings;
use crate::signal::Slot;

/// Everything attachment builds for one eye.
#[derive(Clone)]
pub struct EyeRig {
    pub node: NodeRef,
    pub fov: EyeFov,
    pub camera: PerspectiveCamera,
    pub renderer: Renderer,
    pub distortion: Geometry,
}

struct CameraState {
    runtime: Box<dyn HmdRuntime>,
    target: Option<NodeRef>,
    render_target: Option<RenderTarget>,
    eyes: Option<[EyeRig; 2]>,
    frame_slot: Option<Slot>,
}

struct CameraInner {
    settings: HmdSettings,
    state: Mutex<CameraState>,
}

/// Scene-facing HMD component. Cheap to clone; clones share the camera.
#[derive(Clone)]
pub struct HmdCamera {
    inner: Arc<CameraInner>,
}

impl HmdCamera {
    pub fn new(runtime: Box<dyn HmdRuntime>, settings: &HmdSettings) -> Self {
        Self {
            inner: Arc::new(CameraInner {
                settings: settings.clone(),
                state: Mutex::new(CameraState {
                    runtime,
                    target: None,
                    render_target: None,
                    eyes: None,
                    frame_slot: None,
                }),
            }),
        }
    }

    /// Build the stereo rig under `target` and start tracking.
    ///
    /// The shared target is the two recommended eye widths side by side,
    /// rounded up to powers of two and clamped to the configured maximum.
    /// The right eye renders second into its half, so only the left eye
    /// clears.
    pub fn attach(&self, target: &NodeRef, frames: &FrameLoop) -> HmdResult<()> {
        let settings = &self.inner.settings;
        let mut state = self.inner.state.lock();
        if state.target.is_some() {
            return Err(already_attached());
        }

        state.runtime.configure_tracking(TrackingCaps::ALL)?;

        let left_fov = state.runtime.default_eye_fov(Eye::Left);
        let right_fov = state.runtime.default_eye_fov(Eye::Right);
        let (left_w, left_h) = state.runtime.recommended_target_size(
            Eye::Left,
            left_fov,
            settings.pixels_per_display_pixel,
        );
        let (right_w, right_h) = state.runtime.recommended_target_size(
            Eye::Right,
            right_fov,
            settings.pixels_per_display_pixel,
        );

        // The host renderer only accepts power-of-two targets.
        let width = (left_w + right_w)
            .next_power_of_two()
            .min(settings.max_target_size);
        let height = left_h
            .max(right_h)
            .next_power_of_two()
            .min(settings.max_target_size);
        let render_target = RenderTarget { width, height };
        let aspect = width as f32 / height as f32;

        let left_viewport = Viewport {
            x: 0,
            y: 0,
            width: width / 2,
            height,
        };
        let right_viewport = Viewport {
            x: (width + 1) / 2,
            y: 0,
            width: width / 2,
            height,
        };

        let left = EyeRig {
            node: Node::with_transform(
                "left_eye",
                Mat4::from_translation(state.runtime.eye_offset(Eye::Left) * WORLD_UNIT),
            ),
            fov: left_fov,
            camera: PerspectiveCamera {
                fov_y: (left_fov.left_tan + left_fov.right_tan).atan(),
                aspect,
                z_near: settings.z_near,
                z_far: settings.z_far,
            },
            renderer: Renderer {
                viewport: left_viewport,
                clear_before_render: true,
                target: render_target,
            },
            distortion: state
                .runtime
                .distortion_mesh(Eye::Left, left_fov)
                .to_geometry(),
        };
        let right = EyeRig {
            node: Node::with_transform(
                "right_eye",
                Mat4::from_translation(state.runtime.eye_offset(Eye::Right) * WORLD_UNIT),
            ),
            fov: right_fov,
            camera: PerspectiveCamera {
                fov_y: (right_fov.left_tan + right_fov.right_tan).atan(),
                aspect,
                z_near: settings.z_near,
                z_far: settings.z_far,
            },
            renderer: Renderer {
                viewport: right_viewport,
                clear_before_render: false,
                target: render_target,
            },
            distortion: state
                .runtime
                .distortion_mesh(Eye::Right, right_fov)
                .to_geometry(),
        };

        target.add_child(left.node.clone());
        target.add_child(right.node.clone());

        let slot = {
            let inner = Arc::downgrade(&self.inner);
            frames.frame_end().connect(move |_| {
                if let Some(inner) = inner.upgrade() {
                    Self::update_head_pose(&inner);
                }
            })
        };

        state.target = Some(target.clone());
        state.render_target = Some(render_target);
        state.eyes = Some([left, right]);
        state.frame_slot = Some(slot);

        log::info!(
            "stereo camera attached, render target {}x{}, viewports {}x{} per eye",
            width,
            height,
            width / 2,
            height
        );
        Ok(())
    }

    /// Tear the rig down again: remove the eye nodes, drop the frame
    /// subscription and forget the render target. The camera can be
    /// attached again afterwards.
    pub fn detach(&self) {
        let mut state = self.inner.state.lock();
        state.frame_slot = None;
        if let (Some(target), Some(eyes)) = (state.target.take(), state.eyes.take()) {
            for rig in &eyes {
                target.remove_child(&rig.node);
            }
        }
        state.render_target = None;
        log::info!("stereo camera detached");
    }

    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().target.is_some()
    }

    pub fn render_target(&self) -> Option<RenderTarget> {
        self.inner.state.lock().render_target
    }

    pub fn eye_rig(&self, eye: Eye) -> Option<EyeRig> {
        let state = self.inner.state.lock();
        let eyes = state.eyes.as_ref()?;
        let rig = match eye {
            Eye::Left => &eyes[0],
            Eye::Right => &eyes[1],
        };
        Some(rig.clone())
    }

    /// Make the current head pose the neutral one.
    pub fn reset_head_tracking(&self) {
        self.inner.state.lock().runtime.reset_tracking();
    }

    /// Write the tracked orientation into the target node. The node keeps
    /// its own translation; only the rotation follows the sensor. Runs with
    /// the camera lock released because the transform write is observable.
    fn update_head_pose(inner: &Arc<CameraInner>) {
        let (target, pose) = {
            let state = inner.state.lock();
            let Some(target) = state.target.clone() else {
                return;
            };
            (target, state.runtime.head_pose())
        };

        let (_, _, translation) = target.transform().to_scale_rotation_translation();
        target.set_transform(Mat4::from_rotation_translation(pose.orientation, translation));
    }
}
