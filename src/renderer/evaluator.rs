use nalgebra::Matrix4;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, UnitDisc, UnitSphere};
use thiserror::Error;

use crate::camera::Camera;
use crate::flatten::{GpuMaterial, GpuTriangle, RenderBuffers};
use crate::framebuffer::{Framebuffer, Rgba};
use crate::geometry::{
    Aabb, FloatType, Ray, ScreenSize, Triangle, WorldMatrix, WorldPoint, WorldVector, EPSILON,
};

use super::RenderSettings;

/// Failure of one evaluator pass, e.g. a lost device on a real backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EvaluatorError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> EvaluatorError {
        EvaluatorError {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> EvaluatorError {
        EvaluatorError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The external massively parallel evaluator boundary: given the published
/// buffers, a camera and settings, produce one noisy radiance sample per
/// pixel. `sample_index` restarts at 0 after every accumulation reset.
pub trait Evaluator {
    fn evaluate(
        &mut self,
        buffers: &RenderBuffers,
        camera: &Camera,
        settings: &RenderSettings,
        sample_index: u32,
        target: &mut Framebuffer,
    ) -> Result<(), EvaluatorError>;
}

/// Reference implementation of the evaluator on the CPU.
///
/// Consumes the published buffers exactly the way the parallel backend
/// would: per-descriptor world-to-local ray transform, iterative traversal
/// of the object-local node ranges, and the sphere records for analytic
/// primitives. Output is deterministic for a given (seed, sample_index).
pub struct SoftwareEvaluator {
    seed: u64,
    /// Reused traversal stack of object-local node indices.
    stack: Vec<u32>,
}

impl SoftwareEvaluator {
    pub fn new() -> SoftwareEvaluator {
        Self::with_seed(rand::rng().random())
    }

    pub fn with_seed(seed: u64) -> SoftwareEvaluator {
        SoftwareEvaluator {
            seed,
            stack: Vec::new(),
        }
    }
}

impl Default for SoftwareEvaluator {
    fn default() -> SoftwareEvaluator {
        SoftwareEvaluator::new()
    }
}

impl Evaluator for SoftwareEvaluator {
    fn evaluate(
        &mut self,
        buffers: &RenderBuffers,
        camera: &Camera,
        settings: &RenderSettings,
        sample_index: u32,
        target: &mut Framebuffer,
    ) -> Result<(), EvaluatorError> {
        let mut rng = SmallRng::seed_from_u64(
            self.seed
                .wrapping_add((sample_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );
        let rotation = camera.rotation_matrix();
        let samples = settings.samples_per_pixel.get();

        for y in 0..target.height() {
            for x in 0..target.width() {
                let mut sum = WorldVector::zeros();
                for _ in 0..samples {
                    let ray =
                        primary_ray(x, y, target.size(), camera, &rotation, settings, &mut rng);
                    sum += self.radiance(buffers, ray, settings, &mut rng);
                }
                let color = sum / samples as FloatType;
                target.put_pixel(x, y, Rgba::new(color.x, color.y, color.z, 1.0));
            }
        }
        Ok(())
    }
}

impl SoftwareEvaluator {
    fn radiance(
        &mut self,
        buffers: &RenderBuffers,
        mut ray: Ray,
        settings: &RenderSettings,
        rng: &mut SmallRng,
    ) -> WorldVector {
        let mut radiance = WorldVector::zeros();
        let mut throughput = WorldVector::new(1.0, 1.0, 1.0);

        for _ in 0..=settings.max_bounces {
            let Some(hit) = self.intersect_scene(buffers, &ray) else {
                radiance += throughput.component_mul(&sky(&ray.direction));
                break;
            };

            let material = hit.material;
            let emission =
                WorldVector::from(material.emission_color) * material.emission_strength;
            radiance += throughput.component_mul(&emission);
            throughput = throughput.component_mul(&WorldVector::from(material.color));
            if throughput.max() < 1e-3 {
                break;
            }

            // Mirror reflection blended toward a diffuse scatter by roughness.
            let reflected =
                ray.direction - hit.normal * (2.0 * ray.direction.dot(&hit.normal));
            let scatter: [FloatType; 3] = UnitSphere.sample(rng);
            let diffuse = (hit.normal + WorldVector::from(scatter)).normalize();
            let mut direction =
                reflected.lerp(&diffuse, material.roughness.clamp(0.0, 1.0));
            if direction.norm() < EPSILON {
                direction = hit.normal;
            }

            ray = Ray::new(hit.point + hit.normal * 1e-4, direction);
        }

        radiance
    }

    /// Nearest hit across all descriptors' mesh ranges and all sphere
    /// records, in world space.
    fn intersect_scene(&mut self, buffers: &RenderBuffers, ray: &Ray) -> Option<SceneHit> {
        let mut best: Option<SceneHit> = None;
        let mut consider = |candidate: SceneHit| {
            if best.as_ref().is_none_or(|b| candidate.t < b.t) {
                best = Some(candidate);
            }
        };

        for descriptor in buffers.descriptors() {
            if descriptor.triangle_count == 0 {
                continue;
            }
            let local_to_world = Matrix4::from(descriptor.local_to_world);
            let world_to_local = Matrix4::from(descriptor.world_to_local);
            let local_ray = ray.transformed(&world_to_local);

            self.stack.clear();
            self.stack.push(0);
            while let Some(index) = self.stack.pop() {
                let node = &buffers.nodes()[(descriptor.node_offset + index) as usize];
                let bounds = Aabb::new(
                    WorldPoint::from(node.min),
                    WorldPoint::from(node.max),
                );
                if !bounds.intersects(&local_ray, FloatType::INFINITY) {
                    continue;
                }

                if node.triangle_index >= 0 {
                    let triangle = local_triangle(
                        &buffers.triangles()
                            [(descriptor.triangle_offset + node.triangle_index as u32) as usize],
                    );
                    if let Some(hit) = triangle.intersect(&local_ray) {
                        if hit.t > EPSILON {
                            let local_point = local_ray.point_at(hit.t);
                            let point = local_to_world.transform_point(&local_point);
                            let t = (point - ray.origin).dot(&ray.direction);
                            if t > EPSILON {
                                let normal = world_to_local
                                    .transpose()
                                    .transform_vector(&triangle.normal());
                                consider(SceneHit {
                                    t,
                                    point,
                                    normal: face_against(normal, &ray.direction),
                                    material: descriptor.material,
                                });
                            }
                        }
                    }
                } else {
                    self.stack.push(node.child_a as u32);
                    self.stack.push(node.child_b as u32);
                }
            }
        }

        for sphere in buffers.spheres() {
            if let Some((t, point, normal)) =
                intersect_sphere(ray, &WorldPoint::from(sphere.center), sphere.radius)
            {
                consider(SceneHit {
                    t,
                    point,
                    normal: face_against(normal, &ray.direction),
                    material: sphere.material,
                });
            }
        }

        best
    }
}

struct SceneHit {
    t: FloatType,
    point: WorldPoint,
    normal: WorldVector,
    material: GpuMaterial,
}

fn primary_ray(
    x: u32,
    y: u32,
    size: ScreenSize,
    camera: &Camera,
    rotation: &WorldMatrix,
    settings: &RenderSettings,
    rng: &mut SmallRng,
) -> Ray {
    let aspect = size.y as FloatType / size.x as FloatType;
    let jitter = |rng: &mut SmallRng| {
        if settings.blur > 0.0 {
            rng.random_range(-1.0..=1.0) * settings.blur
        } else {
            0.0
        }
    };
    let u = 2.0 * (x as FloatType + 0.5) / size.x as FloatType - 1.0 + jitter(rng);
    let v = (1.0 - 2.0 * (y as FloatType + 0.5) / size.y as FloatType) * aspect + jitter(rng);

    let film_direction = WorldVector::new(
        u * settings.perspective_slope,
        v * settings.perspective_slope,
        1.0,
    );

    let (local_origin, local_direction) = if settings.focal_blur > 0.0 {
        let lens_uv: [FloatType; 2] = UnitDisc.sample(rng);
        let lens =
            WorldVector::new(lens_uv[0], lens_uv[1], 0.0) * settings.focal_blur;
        // film_direction.z == 1, so this lands on the focal plane.
        let focus = film_direction * settings.focal_distance;
        (lens, focus - lens)
    } else {
        (WorldVector::zeros(), film_direction)
    };

    Ray::new(
        camera.position + rotation.transform_vector(&local_origin),
        rotation.transform_vector(&local_direction),
    )
}

fn local_triangle(triangle: &GpuTriangle) -> Triangle {
    let p = |v: [f32; 4]| WorldPoint::new(v[0], v[1], v[2]);
    Triangle::new(p(triangle.p[0]), p(triangle.p[1]), p(triangle.p[2]))
}

fn face_against(normal: WorldVector, direction: &WorldVector) -> WorldVector {
    let normal = normal.normalize();
    if normal.dot(direction) > 0.0 {
        -normal
    } else {
        normal
    }
}

fn intersect_sphere(
    ray: &Ray,
    center: &WorldPoint,
    radius: FloatType,
) -> Option<(FloatType, WorldPoint, WorldVector)> {
    let oc = ray.origin - center;
    let b = oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = -b - sqrt_disc;
    let t2 = -b + sqrt_disc;
    let t = if t1 > EPSILON {
        t1
    } else if t2 > EPSILON {
        t2
    } else {
        return None;
    };

    let point = ray.point_at(t);
    let normal = (point - center) / radius;
    Some((t, point, normal))
}

/// Stand-in for the skybox texture: a vertical gradient.
fn sky(direction: &WorldVector) -> WorldVector {
    let t = 0.5 * (direction.y + 1.0);
    WorldVector::new(1.0, 1.0, 1.0).lerp(&WorldVector::new(0.4, 0.6, 0.9), t)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flatten::{flatten, BufferCapacity};
    use crate::geometry::ScreenSize;
    use crate::scene::{Geometry, Material, Scene, Transform};
    use assert2::assert;

    fn emissive(strength: f32) -> Material {
        Material::new(
            WorldVector::new(1.0, 1.0, 1.0),
            1.0,
            strength,
            0.0,
            0.0,
            1.0,
            1.0,
        )
    }

    fn big_quad(z: f32) -> Vec<Triangle> {
        let a = WorldPoint::new(-100.0, -100.0, z);
        let b = WorldPoint::new(100.0, -100.0, z);
        let c = WorldPoint::new(100.0, 100.0, z);
        let d = WorldPoint::new(-100.0, 100.0, z);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    fn published(scene: &Scene) -> RenderBuffers {
        let mut buffers = RenderBuffers::new(BufferCapacity::default());
        buffers.publish(flatten(scene)).unwrap();
        buffers
    }

    fn render_once(buffers: &RenderBuffers, settings: RenderSettings) -> Framebuffer {
        let mut evaluator = SoftwareEvaluator::with_seed(7);
        let mut target = Framebuffer::new(ScreenSize::new(9, 9));
        evaluator
            .evaluate(buffers, &Camera::default(), &settings, 0, &mut target)
            .unwrap();
        target
    }

    #[test]
    fn empty_scene_shows_the_sky() {
        let buffers = published(&Scene::new());
        let image = render_once(&buffers, RenderSettings::default());
        let pixel = image.pixel(4, 4);
        // Looking along +Z hits the middle of the gradient.
        assert!(pixel.r > 0.5 && pixel.b > 0.5);
    }

    #[test]
    fn emissive_quad_covers_the_center() {
        let mut scene = Scene::new();
        scene.add_object(
            Geometry::Mesh(big_quad(5.0)),
            Transform::default(),
            emissive(3.0),
        );
        let buffers = published(&scene);
        let settings = RenderSettings::builder().max_bounces(0).build();
        let image = render_once(&buffers, settings);

        // The quad fills the view, so every pixel sees its emission only.
        assert!(image.pixel(4, 4).r == 3.0);
        assert!(image.pixel(0, 0).r == 3.0);
    }

    #[test]
    fn emissive_sphere_hits_center_but_not_corners() {
        let mut scene = Scene::new();
        scene.add_object(
            Geometry::Sphere { radius: 1.0 },
            Transform::from_translation(WorldVector::new(0.0, 0.0, 10.0)),
            emissive(5.0),
        );
        let buffers = published(&scene);
        let settings = RenderSettings::builder().max_bounces(0).build();
        let image = render_once(&buffers, settings);

        assert!(image.pixel(4, 4).r == 5.0);
        // Corner rays diverge past the sphere into the sky.
        assert!(image.pixel(0, 0).r < 1.5);
    }

    #[test]
    fn object_transform_moves_the_mesh() {
        let mut scene = Scene::new();
        let id = scene.add_object(
            Geometry::Mesh(big_quad(5.0)),
            Transform::from_translation(WorldVector::new(500.0, 0.0, 0.0)),
            emissive(3.0),
        );
        let settings = RenderSettings::builder().max_bounces(0).build();

        // Quad moved far off to the side: only sky visible.
        let image = render_once(&published(&scene), settings);
        assert!(image.pixel(4, 4).r < 1.5);

        // Moved back to the origin it fills the view again.
        scene
            .get_mut(id)
            .unwrap()
            .set_transform(Transform::default());
        let image = render_once(&published(&scene), settings);
        assert!(image.pixel(4, 4).r == 3.0);
    }

    #[test]
    fn deterministic_for_equal_seed_and_sample_index() {
        let mut scene = Scene::new();
        scene.add_object(
            Geometry::Mesh(big_quad(5.0)),
            Transform::default(),
            Material::new(WorldVector::new(0.5, 0.5, 0.5), 0.7, 0.0, 0.0, 0.0, 1.0, 1.0),
        );
        let buffers = published(&scene);
        let settings = RenderSettings::builder().blur(0.01).build();

        let mut a = SoftwareEvaluator::with_seed(42);
        let mut b = SoftwareEvaluator::with_seed(42);
        let mut target_a = Framebuffer::new(ScreenSize::new(6, 6));
        let mut target_b = Framebuffer::new(ScreenSize::new(6, 6));
        a.evaluate(&buffers, &Camera::default(), &settings, 3, &mut target_a)
            .unwrap();
        b.evaluate(&buffers, &Camera::default(), &settings, 3, &mut target_b)
            .unwrap();
        assert!(target_a.pixels() == target_b.pixels());
    }
}
