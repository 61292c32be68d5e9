//! Resource cache behaviour against real image and shader files

use std::path::Path;
use std::rc::Rc;

use glam::UVec2;
use lumen::assets::ResourceCache;
use lumen::error::EngineError;
use lumen::graphics::device::{Gpu, InternalFormat};
use lumen::graphics::headless::HeadlessDevice;
use lumen::shaders;

fn setup() -> (Rc<HeadlessDevice>, ResourceCache) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let device = Rc::new(HeadlessDevice::new());
    let gpu: Gpu = device.clone();
    (device, ResourceCache::new(&gpu))
}

fn write_rgb_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([40, 160, 40]))
        .save(path)
        .unwrap();
}

#[test]
fn test_grass_texture_loaded_once() {
    let (device, mut cache) = setup();
    let dir = tempfile::tempdir().unwrap();
    let grass = dir.path().join("grass.png");
    let other = dir.path().join("other.png");
    write_rgb_png(&grass, 64, 64);
    write_rgb_png(&other, 32, 16);

    cache.load_texture("Grass", &grass, false, false).unwrap();
    let texture = cache.get_texture("Grass").unwrap();
    assert_eq!(texture.size(), UVec2::new(64, 64));
    assert_eq!(texture.internal_format(), InternalFormat::Rgb8);

    cache.load_texture("Grass", &other, false, false).unwrap();
    let again = cache.get_texture("Grass").unwrap();
    assert!(Rc::ptr_eq(&texture, &again));
    assert_eq!(again.size(), UVec2::new(64, 64));
    assert_eq!(device.live_textures(), 1);
}

#[test]
fn test_srgb_rgba_texture() {
    let (_device, mut cache) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaf.png");
    image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 255, 0, 128]))
        .save(&path)
        .unwrap();

    cache.load_texture("Leaf", &path, true, true).unwrap();
    let texture = cache.get_texture("Leaf").unwrap();
    assert_eq!(texture.internal_format(), InternalFormat::Srgb8Alpha8);
}

#[test]
fn test_grayscale_texture_rejected() {
    let (device, mut cache) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("height.png");
    image::GrayImage::from_pixel(4, 4, image::Luma([128]))
        .save(&path)
        .unwrap();

    let result = cache.load_texture("Height", &path, false, false);
    assert!(matches!(
        result,
        Err(EngineError::UnsupportedPixelFormat { channels: 1, .. })
    ));
    assert!(!cache.contains_texture("Height"));
    assert_eq!(device.live_textures(), 0);
}

#[test]
fn test_missing_image_file() {
    let (_device, mut cache) = setup();
    let result = cache.load_texture("Missing", "does/not/exist.png", false, false);
    assert!(matches!(result, Err(EngineError::ImageDecode { .. })));
    assert!(cache.get_texture("Missing").is_none());
}

#[test]
fn test_shader_files_loaded_once() {
    let (device, mut cache) = setup();
    let dir = tempfile::tempdir().unwrap();
    let vertex = dir.path().join("common.vert");
    let fragment = dir.path().join("geometry.frag");
    std::fs::write(&vertex, shaders::UNLIT_VERTEX).unwrap();
    std::fs::write(&fragment, shaders::UNLIT_FRAGMENT).unwrap();

    cache.load_shader("Geometry", &vertex, &fragment).unwrap();
    let first = cache.get_shader("Geometry").unwrap();

    std::fs::remove_file(&vertex).unwrap();
    cache.load_shader("Geometry", &vertex, &fragment).unwrap();
    let second = cache.get_shader("Geometry").unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(device.live_programs(), 1);
    assert_eq!(device.live_shaders(), 0);
}

#[test]
fn test_shader_source_missing() {
    let (_device, mut cache) = setup();
    let result = cache.load_shader("Broken", "no/such.vert", "no/such.frag");
    assert!(matches!(result, Err(EngineError::ShaderSourceRead { .. })));
    assert!(matches!(
        cache.get_shader("Broken"),
        Err(EngineError::ShaderNotFound { .. })
    ));
}

#[test]
fn test_dropping_cache_releases_resources() {
    let (device, mut cache) = setup();
    let dir = tempfile::tempdir().unwrap();
    let grass = dir.path().join("grass.png");
    write_rgb_png(&grass, 2, 2);

    cache.load_texture("Grass", &grass, false, false).unwrap();
    cache
        .load_shader_from_source("Geometry", shaders::UNLIT_VERTEX, shaders::UNLIT_FRAGMENT)
        .unwrap();
    assert_eq!(device.live_textures(), 1);
    assert_eq!(device.live_programs(), 1);

    drop(cache);
    assert_eq!(device.live_textures(), 0);
    assert_eq!(device.live_programs(), 0);
}
