//! Tests running complete operations against local files.

             extern crate image;
             extern crate pixl;
#[macro_use] extern crate spectral;
             extern crate tempfile;
             extern crate url;


use std::path::{Path, PathBuf};

use image::{GenericImageView, Rgb, RgbImage};
use spectral::prelude::*;
use tempfile::TempDir;
use url::Url;

use pixl::{Processor, ProcessorBuilder};
use pixl::blob::{FetchOptions, HttpBlobStore, UploadTarget};
use pixl::meme::{self, fit, Measure, Typeface};
use pixl::transform::Backend;
use pixl::{Caption, FontLoader, Loader};


const FONT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/fonts");


struct Fixture {
    dir: TempDir,
    processor: Processor,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let blobs = dir.path().join("blobs");
        let target = UploadTarget::Directory{
            base_url: Url::from_directory_path(&blobs).unwrap().to_string(),
            root: blobs,
        };
        let options = FetchOptions{allow_local_files: true, ..FetchOptions::default()};
        let processor = ProcessorBuilder::new()
            .font_directory(FONT_DIR)
            .backend(Backend::Native)
            .blob_store(HttpBlobStore::new(target, options).unwrap())
            .work_directory(dir.path().join("work"))
            .build().unwrap();
        Fixture{dir, processor}
    }

    /// Write a test image and return its URL.
    fn image(&self, name: &str, width: u32, height: u32) -> String {
        let path = self.dir.path().join(name);
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        }).save(&path).unwrap();
        Url::from_file_path(path).unwrap().to_string()
    }
}

fn local(url: &str) -> PathBuf {
    Url::parse(url).unwrap().to_file_path().unwrap()
}

fn dimensions<P: AsRef<Path>>(path: P) -> (u32, u32) {
    image::open(path).unwrap().dimensions()
}


#[test]
fn resize_to_half() {
    let fx = Fixture::new();
    let url = fx.processor.resize(0.5, fx.image("square.png", 1000, 1000)).unwrap();
    assert_eq!((500, 500), dimensions(local(&url)));
}

#[test]
fn rotate_swaps_dimensions() {
    let fx = Fixture::new();
    let src = fx.image("wide.png", 300, 100);
    let url = fx.processor.rotate(90.0, src.as_str()).unwrap();
    assert_eq!((100, 300), dimensions(local(&url)));
    let url = fx.processor.rotate(-270.0, src.as_str()).unwrap();
    assert_eq!((100, 300), dimensions(local(&url)));
    let url = fx.processor.rotate(180.0, src).unwrap();
    assert_eq!((300, 100), dimensions(local(&url)));
}

#[test]
fn blur_keeps_dimensions() {
    let fx = Fixture::new();
    let url = fx.processor.blur(2.0, fx.image("cat.png", 120, 80)).unwrap();
    assert_eq!((120, 80), dimensions(local(&url)));
}

#[test]
fn convert_roundtrip() {
    let fx = Fixture::new();
    let src = fx.image("cat.png", 64, 48);

    let jpg = fx.processor.convert("jpg", src).unwrap();
    assert!(jpg.ends_with("/out_cat.jpg"));
    assert_eq!(image::ImageFormat::Jpeg,
        image::ImageFormat::from_path(local(&jpg)).unwrap());

    let png = fx.processor.convert("png", jpg).unwrap();
    assert!(png.ends_with("/out_out_cat.png"));
    assert_eq!((64, 48), dimensions(local(&png)));
}

#[test]
fn meme_is_deterministic() {
    let fx = Fixture::new();
    let src = fx.image("boromir.png", 400, 300);
    let first = fx.processor.meme_generate("one does not simply", "walk into mordor", src.as_str()).unwrap();
    let second = fx.processor.meme_generate("one does not simply", "walk into mordor", src.as_str()).unwrap();
    assert_ne!(first, second);

    let first = image::open(local(&first)).unwrap().to_rgb8();
    let second = image::open(local(&second)).unwrap().to_rgb8();
    assert_eq!((400, 300), first.dimensions());
    assert!(first.into_raw() == second.into_raw());
}

#[test]
fn meme_is_case_insensitive() {
    let fx = Fixture::new();
    let src = fx.image("cat.png", 300, 200);
    let lower = fx.processor.meme_generate("hello", "world", src.as_str()).unwrap();
    let upper = fx.processor.meme_generate("HELLO", "WORLD", src.as_str()).unwrap();
    let lower = image::open(local(&lower)).unwrap().to_rgb8();
    let upper = image::open(local(&upper)).unwrap().to_rgb8();
    assert!(lower.into_raw() == upper.into_raw());
}

#[test]
fn meme_layout_scenario() {
    let font = FontLoader::new(FONT_DIR).load(pixl::constants::DEFAULT_FONT).unwrap();
    let fitted = fit(&font, 800, 400, &Caption::top("hello"), &Caption::bottom("world")).unwrap();
    let layout = fitted.layout;

    assert_that!(layout.size).is_less_than_or_equal_to(80);
    assert_that!(layout.top_extent.width).is_less_than_or_equal_to(780);
    assert_that!(layout.bottom_extent.width).is_less_than_or_equal_to(780);
    assert_eq!(0.0, layout.top.y);
    let bottom_height = font.at_size(layout.size).measure("WORLD").height;
    assert_eq!(400.0 - bottom_height as f32, layout.bottom.y);
}

#[test]
fn meme_generate_file() {
    let fx = Fixture::new();
    let src = local(&fx.image("input.png", 500, 250));
    let out = fx.dir.path().join("output.png");
    let font = FontLoader::new(FONT_DIR).load(pixl::constants::DEFAULT_FONT).unwrap();
    let layout = meme::generate(&src, &out, &font, "top text", "").unwrap();
    assert_that!(layout.size).is_equal_to(50);
    assert_eq!((500, 250), dimensions(out));
}

#[test]
fn meme_on_narrow_image() {
    let fx = Fixture::new();
    let err = fx.processor.meme_generate("a", "b", fx.image("narrow.png", 20, 500)).unwrap_err();
    assert_eq!("layout", err.stage().name());
}
