//! Destructive and Edge Case Tests for the Design Pipeline
//!
//! Hostile documents, odd dimensions and full export/import cycles across
//! module boundaries.

use std::sync::Arc;

use serde_json::json;

use crate::core::assemble::assemble_design;
use crate::core::catalog::{product_to_template, Product};
use crate::core::design::{
    DesignHeader, DesignType, Layer, Scene, VIDEO_SCENE_PLACEHOLDER_NAME,
};
use crate::core::hydrate::{DesignImporter, MockCollaborators, SvgPreviewRenderer};
use crate::core::session::EditorSession;
use crate::core::settings::AppSettings;
use crate::core::{CoreError, Frame, DEFAULT_VIDEO_SCENE_DURATION_MS};

fn mock_importer() -> (Arc<MockCollaborators>, DesignImporter) {
    let mock = Arc::new(MockCollaborators::new());
    let importer = DesignImporter::new(mock.clone(), mock.clone(), mock.clone());
    (mock, importer)
}

fn text_layer(id: &str, text: &str) -> Layer {
    Layer::new(id)
        .with_prop("type", "StaticText")
        .with_prop("text", text)
        .with_prop("fontFamily", "Inter")
        .with_prop("metadata", json!({ "nested": { "deep": [1, 2, 3] } }))
}

#[tokio::test]
async fn test_destructive_graphic_export_import_cycle() {
    let header = DesignHeader::new(DesignType::Graphic, "Cycle", Frame::new(1200.0, 628.0));
    let stored = vec![
        Scene::new("s1").with_layers(vec![text_layer("t1", "old")]),
        Scene::new("s2").with_layers(vec![text_layer("t2", "second")]),
    ];
    let active = Scene::new("s1").with_layers(vec![text_layer("t1", "new")]);

    let design = assemble_design(DesignType::Graphic, &active, &stored, Some(&header))
        .unwrap()
        .unwrap();
    let wire = serde_json::to_string(&design).unwrap();

    let (_, importer) = mock_importer();
    let imported = importer.import_str(&wire).await.unwrap();

    assert_eq!(imported.scene_ids(), vec!["s1", "s2"]);
    assert_eq!(imported.design.id, header.id);
    let first = &imported.scenes[0].scene.layers[0];
    assert_eq!(first.str_prop("text"), Some("new"));
    assert_eq!(first.props["metadata"]["nested"]["deep"][2], json!(3));
}

#[tokio::test]
async fn test_destructive_video_nameless_scene_cycle() {
    let header = DesignHeader::new(DesignType::Video, "Clip", Frame::new(1080.0, 1920.0));
    let stored = vec![Scene::new("v1").with_duration(3000.0)];
    let active = Scene::new("v1");

    let design = assemble_design(DesignType::Video, &active, &stored, Some(&header))
        .unwrap()
        .unwrap();
    assert_eq!(design.scenes[0].name.as_deref(), Some(""));
    assert_eq!(design.scenes[0].duration, Some(3000.0));

    let (_, importer) = mock_importer();
    let imported = importer
        .import_value(serde_json::to_value(&design).unwrap())
        .await
        .unwrap();

    assert_eq!(
        imported.scenes[0].scene.name.as_deref(),
        Some(VIDEO_SCENE_PLACEHOLDER_NAME)
    );
    assert_eq!(imported.scenes[0].scene.duration, Some(3000.0));
}

#[tokio::test]
async fn test_destructive_new_video_design_reimports() {
    let mut session = EditorSession::new(DesignType::Video);
    session.create_design("Reel", Frame::new(1080.0, 1920.0));

    let design = session.export_design().unwrap().unwrap();
    assert_eq!(design.scenes[0].duration, Some(DEFAULT_VIDEO_SCENE_DURATION_MS));

    let (_, importer) = mock_importer();
    let imported = importer.import(design).await.unwrap();
    assert_eq!(
        imported.scenes[0].scene.duration,
        Some(DEFAULT_VIDEO_SCENE_DURATION_MS)
    );
}

#[tokio::test]
async fn test_destructive_video_template_in_empty_session_reimports() {
    let product: Product = serde_json::from_value(json!({
        "id": 1, "name": "Screen", "image1": "s.jpg",
        "max_width": "1920", "max_height": "1080", "size": "Meter"
    }))
    .unwrap();
    let mut session = EditorSession::new(DesignType::Video);
    session.apply_template(product_to_template(&product, None).unwrap());

    let design = session.export_design().unwrap().unwrap();
    assert_eq!(design.scenes.len(), 1);
    assert_eq!(design.scenes[0].duration, Some(DEFAULT_VIDEO_SCENE_DURATION_MS));

    let (_, importer) = mock_importer();
    let wire = serde_json::to_string(&design).unwrap();
    let imported = importer.import_str(&wire).await.unwrap();
    assert_eq!(imported.scenes[0].scene.layers[0].layer_type(), Some("Background"));
}

#[tokio::test]
async fn test_destructive_hostile_documents_rejected_without_hydration() {
    let (mock, importer) = mock_importer();
    let base = json!({
        "id": "d1",
        "type": "VIDEO",
        "name": "Hostile",
        "frame": { "width": 100, "height": 100 },
        "scenes": [{ "id": "a", "layers": [], "duration": 10 }]
    });

    let mut zero_frame = base.clone();
    zero_frame["frame"] = json!({ "width": 0, "height": 100 });
    let mut duplicate = base.clone();
    duplicate["scenes"] = json!([
        { "id": "a", "layers": [], "duration": 10 },
        { "id": "a", "layers": [], "duration": 10 }
    ]);
    let mut negative = base.clone();
    negative["scenes"][0]["duration"] = json!(-5);
    let mut blank_id = base.clone();
    blank_id["scenes"][0]["id"] = json!("  ");
    let mut no_scenes = base.clone();
    no_scenes["scenes"] = json!([]);

    for doc in [zero_frame, duplicate, negative, blank_id, no_scenes] {
        let err = importer.import_value(doc).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)), "{err:?}");
    }

    let mut numeric_type = base.clone();
    numeric_type["type"] = json!(5);
    let err = importer.import_value(numeric_type).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedDesign(_)));

    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_destructive_lowercase_type_accepted() {
    let (_, importer) = mock_importer();
    let doc = json!({
        "id": "d1",
        "type": "presentation",
        "name": "Deck",
        "frame": { "width": 1920, "height": 1080 },
        "scenes": [{ "id": "p1", "layers": [] }]
    });

    let imported = importer.import_value(doc).await.unwrap();

    assert_eq!(imported.design.kind, DesignType::Presentation);
    assert!(imported.scenes[0].scene.duration.is_none());
}

#[tokio::test]
async fn test_destructive_svg_preview_escapes_markup() {
    let renderer = Arc::new(SvgPreviewRenderer::new());
    let mock = Arc::new(MockCollaborators::new());
    let importer = DesignImporter::new(mock.clone(), mock, renderer);

    let design = DesignHeader::new(DesignType::Graphic, "XSS", Frame::new(300.0, 100.0))
        .with_scenes(vec![Scene::new("s1")
            .with_layers(vec![text_layer("t1", "<script>alert(1)</script>")])]);

    let imported = importer.import(design).await.unwrap();
    let preview = &imported.scenes[0].preview;

    assert!(preview.starts_with("data:image/svg+xml"));
    assert!(!preview.contains("<script>"));
    assert!(!preview.contains("%3Cscript"));
}

#[test]
fn test_destructive_product_dimensions() {
    let parse = |w: serde_json::Value, h: serde_json::Value| -> Product {
        serde_json::from_value(json!({
            "id": "x", "name": "X", "image1": "", "max_width": w, "max_height": h, "size": "Meter"
        }))
        .unwrap()
    };

    assert!(product_to_template(&parse(json!(""), json!("10")), None).is_err());
    assert!(product_to_template(&parse(json!("0"), json!("10")), None).is_err());
    assert!(product_to_template(&parse(json!(-1), json!(10)), None).is_err());

    let tiny = product_to_template(&parse(json!("0.5"), json!(0.25)), None).unwrap();
    assert_eq!(tiny.frame, Frame::new(0.5, 0.25));

    let malformed: Result<Product, _> = serde_json::from_value(json!({
        "id": "x", "name": "X", "max_width": [1], "max_height": 1
    }));
    assert!(malformed.is_err());
}

#[test]
fn test_destructive_session_variant_mismatch() {
    let mut session = EditorSession::new(DesignType::Graphic);
    session.create_design("G", Frame::new(10.0, 10.0));

    let header = session.current_design().cloned().unwrap();
    let active = Scene::new("s1");
    let err = assemble_design(DesignType::Video, &active, session.scenes(), Some(&header))
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::VariantMismatch {
            expected: DesignType::Graphic,
            requested: DesignType::Video
        }
    ));
}

#[test]
fn test_destructive_settings_extremes() {
    let mut settings: AppSettings = serde_json::from_value(json!({
        "version": 0,
        "remote": { "timeoutSecs": 999999, "apiBaseUrl": "" },
        "logging": { "level": "DEBUG" },
        "unknownSection": { "x": 1 }
    }))
    .unwrap();

    settings.normalize();

    assert_eq!(settings.remote.timeout_secs, 300);
    assert_eq!(settings.remote.api_base_url, crate::core::settings::DEFAULT_API_BASE_URL);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.version, crate::core::settings::SETTINGS_VERSION);
}
