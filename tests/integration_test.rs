use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use serde_json::{json, Value};
use tokio::sync::watch;

use listing_autopilot::app::{App, Outcome};
use listing_autopilot::cli::{Command, IoArgs};
use listing_autopilot::config::Config;
use listing_autopilot::services::description_generator::TRUNCATION_MARKER;
use listing_autopilot::services::summary_writer::SUMMARY_FILE_NAME;
use listing_autopilot::utils::logging;
use listing_autopilot::BatchRunner;

fn write_opaque(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"not really an image").unwrap();
    }
}

fn write_coin_photo(path: &Path) {
    let mut img = RgbImage::from_pixel(1200, 1000, Rgb([250, 250, 250]));
    for x in 300..700 {
        for y in 200..600 {
            img.put_pixel(x, y, Rgb([90, 90, 100]));
        }
    }
    img.save(path).unwrap();
}

fn read_summary(output: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(output.join(SUMMARY_FILE_NAME)).unwrap()).unwrap()
}

#[tokio::test]
async fn test_batch_run_end_to_end() {
    logging::init(false);
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_opaque(input.path(), &["coin_001.jpg", "coin_042.png", "readme.md"]);
    std::fs::create_dir(input.path().join("archive")).unwrap();

    let metadata = input.path().join("metadata.json");
    std::fs::write(
        &metadata,
        json!({
            "coin_001": { "year": 1885, "mint_mark": "O", "condition": "Extremely Fine" }
        })
        .to_string(),
    )
    .unwrap();

    let summary = BatchRunner::new(Arc::new(Config::default()))
        .run(input.path(), output.path(), Some(&metadata))
        .await
        .unwrap();
    assert_eq!(summary.processed_count, 2);
    assert_eq!(summary.failed_count, 0);

    let written = read_summary(output.path());
    for key in [
        "processed_images",
        "generated_titles",
        "generated_descriptions",
        "failed",
        "listings",
    ] {
        assert!(written.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(written["generated_titles"], 2);
    assert_eq!(written["listings"][0]["item_name"], "coin_001");
    assert_eq!(
        written["listings"][0]["outputs"]["title"],
        "1885 Silver Coin Dollar Extremely Fine"
    );
    assert_eq!(
        written["listings"][1]["outputs"]["title"],
        "1921 Silver Coin Dollar Fine"
    );

    let description =
        std::fs::read_to_string(output.path().join("coin_001_description.txt")).unwrap();
    assert!(description.contains("with O mint mark"));
    assert!(description.contains("Grade: Extremely Fine"));
}

#[tokio::test]
async fn test_config_file_drives_pipeline() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_opaque(input.path(), &["coin_100.jpg"]);

    let config_path = input.path().join("autopilot.json");
    std::fs::write(
        &config_path,
        json!({
            "image_cropper": { "enabled": false },
            "title_generator": { "templates": ["Vintage {year} {type} {denomination}"], "max_length": 20 },
            "description_generator": { "max_length": 200, "sections": ["history", "overview"] }
        })
        .to_string(),
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    let summary = BatchRunner::new(Arc::new(config))
        .run(input.path(), output.path(), None)
        .await
        .unwrap();

    let item = &summary.listings[0];
    let title = item.outputs.title.as_deref().unwrap();
    assert_eq!(title, "Vintage 1921 Silv...");
    assert_eq!(
        item.outputs.cropped_image.as_deref(),
        Some(input.path().join("coin_100.jpg").to_string_lossy().as_ref())
    );
    assert_eq!(summary.titles_generated_count, 1);

    let description =
        std::fs::read_to_string(output.path().join("coin_100_description.txt")).unwrap();
    assert!(description.starts_with("HISTORICAL CONTEXT"));
    assert!(description.chars().count() <= 200);
    assert!(description.ends_with(TRUNCATION_MARKER));
    assert!(!description.contains("SPECIFICATIONS"));
}

#[tokio::test]
async fn test_raster_backend_crops_real_image() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_coin_photo(&input.path().join("coin_200.png"));

    let mut config = Config::default();
    config.image_stage.backend = listing_autopilot::config::VisionBackend::Raster;
    config.description_generator.enabled = false;

    let summary = BatchRunner::new(Arc::new(config))
        .run(input.path(), output.path(), None)
        .await
        .unwrap();

    assert_eq!(summary.processed_count, 1);
    let cropped = output.path().join("coin_200_cropped.jpg");
    assert_eq!(
        summary.listings[0].outputs.cropped_image.as_deref(),
        Some(cropped.to_string_lossy().as_ref())
    );
    assert_eq!(image::image_dimensions(&cropped).unwrap(), (800, 800));
    assert_eq!(
        summary.listings[0].outputs.description.as_deref(),
        Some("No description available.")
    );
}

#[tokio::test]
async fn test_raster_backend_fails_undecodable_item_only() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_coin_photo(&input.path().join("good.png"));
    write_opaque(input.path(), &["broken.jpg"]);

    let mut config = Config::default();
    config.image_stage.backend = listing_autopilot::config::VisionBackend::Raster;

    let summary = BatchRunner::new(Arc::new(config))
        .run(input.path(), output.path(), None)
        .await
        .unwrap();

    assert_eq!(summary.processed_count + summary.failed_count, 2);
    assert_eq!(summary.failed_count, 1);
    let broken = &summary.listings[0];
    assert_eq!(broken.item_name, "broken");
    assert!(!broken.success);
    assert!(broken.error.is_some());
    assert!(broken.outputs.title.is_none());

    let written = read_summary(output.path());
    assert_eq!(written["listings"][0]["success"], false);
    assert_eq!(written["listings"][1]["success"], true);
}

#[tokio::test]
async fn test_run_command_strict_outcome() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_opaque(input.path(), &["a.jpg", "b.jpg"]);

    let mut config = Config::default();
    config.image_stage.backend = listing_autopilot::config::VisionBackend::Raster;
    let (_tx, rx) = watch::channel(false);
    let app = App::with_config(config, rx);

    let outcome = app
        .execute(&Command::Run {
            io: IoArgs {
                input: input.path().to_path_buf(),
                output: output.path().to_path_buf(),
                config: None,
                batch: true,
            },
            metadata: None,
            strict: true,
        })
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome {
            processed: 0,
            failed: 2,
            strict: true
        }
    );
    assert!(outcome.should_fail());
}

#[tokio::test]
async fn test_missing_explicit_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (_tx, rx) = watch::channel(false);
    let io = IoArgs {
        input: dir.path().to_path_buf(),
        output: dir.path().join("out"),
        config: Some(dir.path().join("missing.json")),
        batch: true,
    };

    assert!(App::initialize(&io, rx).is_err());
    assert!(!dir.path().join("out").exists());
}
