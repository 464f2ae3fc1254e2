//! The compute kernel and the rayon backend shade the same frame alike.
//!
//! Skipped when no adapter is available (e.g. headless CI without a software
//! rasterizer).

use glam::{Vec3, Vec4};

use sphaera_engine::camera::CameraState;
use sphaera_engine::coords::Extent;
use sphaera_engine::device::HeadlessGpu;
use sphaera_engine::pipeline::FramePipeline;
use sphaera_engine::scene::{Scene, Sphere};
use sphaera_engine::trace::{BackendKind, DeviceBackend, HostBackend, ShadingBackend};

fn headless() -> Option<HeadlessGpu> {
    match HeadlessGpu::block_on_new() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping device backend test: {e:#}");
            None
        }
    }
}

/// Fraction of pixels whose channels all agree within `eps`.
fn agreement(a: &[Vec4], b: &[Vec4], eps: f32) -> f32 {
    let close = a
        .iter()
        .zip(b)
        .filter(|(x, y)| (**x - **y).abs().max_element() < eps)
        .count();
    close as f32 / a.len() as f32
}

fn render(backend: &mut dyn ShadingBackend, extent: Extent, camera: CameraState) -> Vec<Vec4> {
    render_scene(backend, Scene::default_scene(), extent, camera)
}

fn render_scene(
    backend: &mut dyn ShadingBackend,
    scene: Scene,
    extent: Extent,
    camera: CameraState,
) -> Vec<Vec4> {
    let mut pipeline = FramePipeline::new(scene, camera, extent, 5);
    pipeline.step(backend, 0.0).unwrap();
    pipeline.step(backend, 1.0).unwrap();
    pipeline.displayed().unwrap().to_vec()
}

#[test]
fn device_matches_host_on_default_view() {
    let Some(gpu) = headless() else { return; };
    let extent = Extent::new(32, 32);

    let mut device = DeviceBackend::new(gpu.device, gpu.queue);
    assert_eq!(device.kind(), BackendKind::Device);

    let host = render(&mut HostBackend::new(), extent, CameraState::default());
    let dev = render(&mut device, extent, CameraState::default());

    // Silhouette pixels may land on the other side of an edge.
    let frac = agreement(&host, &dev, 1e-3);
    assert!(frac > 0.97, "only {:.1}% of pixels agree", frac * 100.0);
}

#[test]
fn device_handles_odd_extents_and_resizes() {
    let Some(gpu) = headless() else { return; };
    let mut device = DeviceBackend::new(gpu.device, gpu.queue);
    let camera = CameraState {
        position: Vec3::new(1.0, 0.5, -6.0),
        rotation: Vec3::new(5.0, -10.0, 0.0),
    };

    for extent in [Extent::new(17, 9), Extent::new(40, 23)] {
        let host = render(&mut HostBackend::new(), extent, camera);
        let dev = render(&mut device, extent, camera);
        assert_eq!(dev.len(), extent.pixel_count());

        let frac = agreement(&host, &dev, 1e-3);
        assert!(frac > 0.97, "{extent:?}: only {:.1}% agree", frac * 100.0);
    }
}

#[test]
fn device_skips_degenerate_spheres_like_host() {
    let Some(gpu) = headless() else { return; };
    let mut device = DeviceBackend::new(gpu.device, gpu.queue);
    let extent = Extent::new(24, 16);

    // Non-finite records placed ahead of the real spheres; both backends must
    // ignore them rather than report a hit at index 0 or 1.
    let mut spheres = vec![
        Sphere {
            center: Vec3::new(f32::NAN, 0.0, 0.0),
            radius: 2.0,
            ..Sphere::default()
        },
        Sphere {
            center: Vec3::ZERO,
            radius: f32::INFINITY,
            albedo: Vec3::new(0.0, 1.0, 0.0),
            ..Sphere::default()
        },
    ];
    spheres.extend_from_slice(Scene::default_scene().spheres());
    let scene = Scene::new(spheres);

    let host = render_scene(&mut HostBackend::new(), scene.clone(), extent, CameraState::default());
    let dev = render_scene(&mut device, scene, extent, CameraState::default());
    assert!(dev.iter().all(|p| p.is_finite()));

    let frac = agreement(&host, &dev, 1e-3);
    assert!(frac > 0.97, "only {:.1}% of pixels agree", frac * 100.0);
}
