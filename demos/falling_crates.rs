//! Drops a few crates onto a floor and prints the collision lifecycle.

use anyhow::Result;
use glam::{Mat4, Vec3};

use ember_bridges::physics::Collider;
use ember_bridges::{BridgeSettings, ColliderShape, FrameLoop, Node, PhysicsWorld, Slot};

fn main() -> Result<()> {
    env_logger::init();

    let settings = BridgeSettings::default();
    let world = PhysicsWorld::with_rapier(&settings.physics);
    let frames = FrameLoop::new();
    world.attach(&frames)?;

    let floor = Collider::fixed(ColliderShape::Box {
        half_extents: Vec3::new(20.0, 0.5, 20.0),
    });
    floor.set_node(&Node::new("floor"));
    world.add_collider(&floor)?;

    // Three unit crates, staggered so they land one after another.
    let mut crates = Vec::new();
    let mut slots: Vec<Slot> = Vec::new();
    for (index, height) in [4.0f32, 7.0, 10.0].into_iter().enumerate() {
        let name = format!("crate-{}", index);
        let node = Node::with_transform(
            &name,
            Mat4::from_translation(Vec3::new(index as f32 * 1.5, height, 0.0)),
        );

        let collider = Collider::dynamic(
            ColliderShape::Box {
                half_extents: Vec3::splat(0.5),
            },
            10.0,
        );
        collider.set_node(&node);
        collider.set_trigger_collisions(true);

        slots.push(collider.collision_started.connect(|event| {
            let name = event
                .collider
                .node()
                .map(|node| node.name().to_string())
                .unwrap_or_default();
            let partner = event
                .partner
                .node()
                .map(|node| node.name().to_string())
                .unwrap_or_default();
            println!("collision started: {} touched {}", name, partner);
        }));
        slots.push(collider.collision_ended.connect(|event| {
            let name = event
                .collider
                .node()
                .map(|node| node.name().to_string())
                .unwrap_or_default();
            println!("collision ended for {}", name);
        }));

        world.add_collider(&collider)?;
        crates.push((node, collider));
    }

    for _ in 0..240 {
        frames.run_frame(settings.physics.fixed_timestep);
    }

    println!("\nafter {} frames:", frames.frame_index());
    for (node, _collider) in &crates {
        let (_, _, position) = node.transform().to_scale_rotation_translation();
        println!(
            "  {:>8}: x = {:+.2}, y = {:+.2}, z = {:+.2}",
            node.name(),
            position.x,
            position.y,
            position.z
        );
    }

    world.detach();
    Ok(())
}
