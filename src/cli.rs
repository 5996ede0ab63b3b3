use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::ProgressBar;
use lucent::{
    geometry::{ScreenSize, Triangle, WorldPoint, WorldVector},
    Camera, Geometry, Material, MeshData, RenderSettings, SoftwareEvaluator, Tracer, Transform,
};

const SAMPLES: u32 = 64;

fn matte(color: WorldVector) -> Material {
    Material::new(color, 0.9, 0.0, 0.0, 0.0, 1.0, 1.0)
}

fn glowing(color: WorldVector, strength: f32) -> Material {
    Material::new(color, 1.0, strength, 0.0, 0.0, 1.0, 1.0)
}

fn demo_scene(tracer: &mut Tracer<SoftwareEvaluator>) -> anyhow::Result<()> {
    let a = WorldPoint::new(-20.0, 0.0, -20.0);
    let b = WorldPoint::new(20.0, 0.0, -20.0);
    let c = WorldPoint::new(20.0, 0.0, 20.0);
    let d = WorldPoint::new(-20.0, 0.0, 20.0);
    tracer.add_object(
        Geometry::Mesh(vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]),
        Transform::default(),
        matte(WorldVector::new(0.7, 0.7, 0.7)),
    )?;

    tracer.add_object(
        Geometry::Sphere { radius: 1.0 },
        Transform::from_translation(WorldVector::new(0.0, 1.0, 0.0)),
        matte(WorldVector::new(0.8, 0.3, 0.25)),
    )?;
    tracer.add_object(
        Geometry::Sphere { radius: 0.6 },
        Transform::from_translation(WorldVector::new(2.0, 2.2, -1.0)),
        glowing(WorldVector::new(1.0, 0.9, 0.7), 8.0),
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let resolution = ScreenSize::new(800, 600);
    let mut tracer = Tracer::new(SoftwareEvaluator::new(), resolution);
    tracer.set_camera(Camera::new(WorldPoint::new(0.0, 1.5, -6.0), 0.1, 0.0));
    tracer.set_settings(
        RenderSettings::builder()
            .blur(1.1 / resolution.y as f32)
            .build(),
    );

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        demo_scene(&mut tracer)?;
    } else {
        for path in &paths {
            let mesh = MeshData::from_obj_file(path)?;
            tracer.add_object(
                Geometry::Mesh(mesh.triangle_list()),
                Transform::default(),
                matte(WorldVector::new(0.8, 0.8, 0.8)),
            )?;
        }
    }

    let bar = ProgressBar::new(SAMPLES as u64);
    for _ in 0..SAMPLES {
        tracer.step()?;
        bar.inc(1);
    }
    bar.finish();

    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let output = format!("render-{stamp}.png");
    tracer.export_image().save(&output)?;
    println!("wrote {output} ({} samples)", tracer.sample_count());
    Ok(())
}
