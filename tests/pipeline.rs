//! End-to-end runs of the submission pipeline against a local media server
//! and a scripted text generator.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};

use tree_spotter::pipeline::acquisition::{AcquisitionPolicy, HttpImageAcquirer};
use tree_spotter::pipeline::diameter::{LanguageModelEstimator, MockTextGenerator};
use tree_spotter::pipeline::{ImageSubmission, ProcessingPipeline, ProcessingStage, Submission};

fn rationals(tag: Tag, dms: [f64; 3]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            dms.iter()
                .map(|&v| Rational {
                    num: (v * 10_000.0).round() as u32,
                    denom: 10_000,
                })
                .collect(),
        ),
    }
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

/// Little-endian TIFF carrying GPS tags at 45°30'N, 122°40'(lon_seconds)W.
fn geotagged_tiff(lon_seconds: f64) -> Vec<u8> {
    let fields = [
        rationals(Tag::GPSLatitude, [45.0, 30.0, 0.0]),
        ascii(Tag::GPSLatitudeRef, "N"),
        rationals(Tag::GPSLongitude, [122.0, 40.0, lon_seconds]),
        ascii(Tag::GPSLongitudeRef, "W"),
        ascii(Tag::DateTimeOriginal, "2024:05:17 09:12:44"),
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true).unwrap();
    buf.into_inner()
}

fn tiff_without_gps() -> Vec<u8> {
    let field = ascii(Tag::Make, "TreeCam");
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true).unwrap();
    buf.into_inner()
}

fn image_response(bytes: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/tiff")], bytes)
}

async fn spawn_media_server() -> String {
    let router = Router::new()
        .route("/media/a", get(|| async { image_response(geotagged_tiff(0.0)) }))
        .route("/media/b", get(|| async { image_response(geotagged_tiff(0.05)) }))
        .route("/media/far", get(|| async { image_response(geotagged_tiff(30.0)) }))
        .route("/media/nogps", get(|| async { image_response(tiff_without_gps()) }))
        .route(
            "/media/page",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
        )
        .route("/media/gone", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn pipeline(generator: MockTextGenerator) -> ProcessingPipeline {
    let acquirer = HttpImageAcquirer::new(AcquisitionPolicy {
        attempt_timeout: Duration::from_millis(500),
        retry_delay: Duration::from_millis(10),
    })
    .unwrap();
    let estimator = LanguageModelEstimator::new(Arc::new(generator), "llama3.1:8b");
    ProcessingPipeline::new(Arc::new(acquirer), Arc::new(estimator))
}

#[tokio::test]
async fn remote_images_are_fetched_located_and_grouped() {
    let base = spawn_media_server().await;
    let submission = Submission {
        subject: "Big maple".into(),
        body: "DBH: 25 centimeters".into(),
        images: vec![
            ImageSubmission::remote(format!("{base}/media/a"), "image/tiff"),
            ImageSubmission::remote(format!("{base}/media/far"), "image/tiff"),
            ImageSubmission::remote(format!("{base}/media/b"), "image/tiff"),
        ],
    };

    let result = pipeline(MockTextGenerator::text("25")).process(submission).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.trees.len(), 2);
    assert_eq!(result.trees[0].images.len(), 2);
    assert_eq!(result.trees[1].images.len(), 1);
    assert_ne!(result.trees[0].id, result.trees[1].id);

    let seed = &result.trees[0].images[0];
    assert_eq!(seed.image_ref, format!("{base}/media/a"));
    assert!((seed.gps.latitude - 45.5).abs() < 1e-9);
    assert!((seed.gps.longitude - -(122.0 + 40.0 / 60.0)).abs() < 1e-9);
    assert_eq!(seed.diameter_cm, 25.0);
    assert!(seed.captured_at.is_some());
    assert!(seed.contents.starts_with(b"II*\0"));
}

#[tokio::test]
async fn every_image_lands_in_a_tree_or_an_error() {
    let base = spawn_media_server().await;
    let urls = ["a", "gone", "page", "nogps", "far"].map(|path| format!("{base}/media/{path}"));
    let submission = Submission {
        subject: String::new(),
        body: "Trunk is 40 cm across".into(),
        images: urls
            .iter()
            .map(|url| ImageSubmission::remote(url.clone(), "image/tiff"))
            .collect(),
    };

    let result = pipeline(MockTextGenerator::text("40")).process(submission).await;

    assert_eq!(result.image_count() + result.errors.len(), urls.len());
    assert_eq!(result.image_count(), 2);

    let stages: Vec<(ProcessingStage, &str)> = result
        .errors
        .iter()
        .map(|e| (e.stage, e.image_ref.rsplit('/').next().unwrap_or_default()))
        .collect();
    assert_eq!(
        stages,
        vec![
            (ProcessingStage::ImageAcquisition, "gone"),
            (ProcessingStage::ImageAcquisition, "page"),
            (ProcessingStage::GpsExtraction, "nogps"),
        ]
    );
}

#[tokio::test]
async fn diameter_rejection_fails_every_image() {
    let base = spawn_media_server().await;
    let generator = MockTextGenerator::text("NOT_FOUND");
    let submission = Submission {
        subject: "Tree".into(),
        body: "No measurements provided".into(),
        images: vec![
            ImageSubmission::remote(format!("{base}/media/a"), "image/tiff"),
            ImageSubmission::inline("IMG_0002.tiff", geotagged_tiff(0.0), "image/tiff"),
        ],
    };

    let result = pipeline(generator).process(submission).await;

    assert!(result.is_complete_failure());
    assert_eq!(result.errors.len(), 2);
    for err in &result.errors {
        assert_eq!(err.stage, ProcessingStage::DiameterCalculation);
        assert_eq!(err.message, "No diameter measurement found in email content");
    }
    assert_eq!(result.errors[1].image_ref, "IMG_0002.tiff");
}

#[tokio::test]
async fn batch_result_serializes_for_downstream() {
    let submission = Submission {
        subject: "Oak".into(),
        body: "Circumference 94 cm".into(),
        images: vec![
            ImageSubmission::inline("IMG_1.tiff", geotagged_tiff(0.0), "image/tiff"),
            ImageSubmission::inline("IMG_2.tiff", Vec::new(), "image/jpeg"),
        ],
    };

    let result = pipeline(MockTextGenerator::text("30")).process(submission).await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["trees"].as_array().unwrap().len(), 1);
    let image = &json["trees"][0]["images"][0];
    assert_eq!(image["image_ref"], "IMG_1.tiff");
    assert_eq!(image["diameter_cm"], 30.0);
    assert!(image["contents"].as_str().unwrap().starts_with("SUkq"));
    assert_eq!(json["errors"][0]["stage"], "gps_extraction");
    assert_eq!(json["errors"][0]["image_ref"], "IMG_2.tiff");
}
