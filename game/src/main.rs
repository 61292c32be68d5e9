//! Demo scene rendered on the headless device
//!
//! Builds the container grid scene, then runs a fixed number of frames with
//! scripted camera input. Pass a JSON config path as the first argument to
//! override the defaults.

use std::process::ExitCode;
use std::rc::Rc;

use glam::{Vec2, Vec3, Vec4};
use lumen::assets::DecodedImage;
use lumen::prelude::*;
use tracing::{error, info};

/// Frames simulated before exiting
const FRAME_COUNT: u32 = 120;
/// Simulated render time of one frame, in seconds
const FRAME_TIME: f32 = 1.0 / 60.0;

fn main() -> ExitCode {
    lumen::init_logging();
    info!("Starting lumen demo");

    match run() {
        Ok(()) => {
            info!("Demo finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };

    let device = Rc::new(HeadlessDevice::new());
    let mut context = RenderContext::with_assets(device.clone(), config.assets.clone())?;

    // Stand-ins for the container maps
    context.cache.load_texture_from_image(
        "Container-Diffuse-Map",
        &DecodedImage::solid(64, 64, [150, 100, 50, 255]),
        false,
    )?;
    context.cache.load_texture_from_image(
        "Container-Specular-Map",
        &DecodedImage::solid(64, 64, [200, 200, 200, 255]),
        false,
    )?;

    let mut crate_material = Material::default();
    crate_material.diffuse_texture = context.cache.get_texture("Container-Diffuse-Map");
    crate_material.specular_texture = context.cache.get_texture("Container-Specular-Map");
    crate_material.use_textures = true;

    let mut crates = Vec::new();
    for x in 0..15 {
        for z in 0..15 {
            let position = Vec3::new(-10.5 + x as f32 * 1.5, 0.0, -10.5 + z as f32 * 1.5);
            crates.push(Geometry::new(
                GeometryKind::Cube,
                Transform::from_position(position),
                crate_material.clone(),
                &mut context.cache,
            )?);
        }
    }

    let lighting = config.lighting.clone().unwrap_or_else(|| {
        let mut lighting =
            SceneLighting::default().with_point_light(PointLight::at(Vec3::new(0.0, 3.0, 0.0)));
        lighting.global_light.ambient_intensity = Vec3::splat(0.2);
        lighting.global_light.enabled = false;
        lighting
    });

    let mut lamp = Geometry::new(
        GeometryKind::Cube,
        Transform {
            position: Vec3::new(0.0, 3.0, 0.0),
            size: Vec3::splat(0.5),
            ..Transform::default()
        },
        Material::white(),
        &mut context.cache,
    )?;
    lamp.set_emission(Vec3::ONE);

    let mut camera = config
        .camera
        .build(Vec3::new(-2.5, 3.0, 0.0), config.window.viewport_size())
        .with_input(true);
    let mut timestep = config.timing.build();
    let mut total_draw_calls = 0;

    for frame in 0..FRAME_COUNT {
        let steps = timestep.accumulate(FRAME_TIME);
        for _ in 0..steps {
            let input = CameraInput {
                cursor: Vec2::new(frame as f32 * 2.0, 0.0),
                keys: MovementKeys::FORWARD,
            };
            camera.update(&input, timestep.timestep);
        }

        context.clear(ClearFlags::COLOR | ClearFlags::DEPTH, Vec4::new(0.0, 0.0, 0.0, 1.0));
        for geometry in &crates {
            context.render(&camera, geometry, Some(&lighting))?;
        }
        context.render(&camera, &lamp, None)?;

        total_draw_calls += device
            .take_commands()
            .iter()
            .filter(|command| command.is_draw())
            .count();
    }

    info!(
        frames = FRAME_COUNT,
        draw_calls = context.renderer.stats().draw_calls,
        total_draw_calls,
        live_buffers = device.live_buffers(),
        live_vertex_arrays = device.live_vertex_arrays(),
        camera_position = ?camera.position(),
        "Rendered demo scene"
    );
    Ok(())
}
