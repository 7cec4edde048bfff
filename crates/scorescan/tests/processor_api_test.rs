//! Integration tests for the SheetProcessor API

use scorescan::{
    ScorescanError, SheetProcessor, SigError,
    config::{AppConfig, GridConfig, ReducerConfig},
    document::SheetDocument,
    image::BinaryImage,
    scale::Scale,
    sig::ReductionMode,
};

fn staff_image() -> BinaryImage {
    let mut image = BinaryImage::new(500, 260);
    for line in 0..5 {
        image.fill_rect(20, 60 + line * 20, 460, 3);
    }
    image
}

const DOCUMENT: &str = r#"{
    "systems": [{
        "id": 1,
        "interline": 20,
        "inters": [
            { "id": 1, "shape": "notehead_black", "grade": 0.8, "pitch": 0,
              "bounds": { "min_x": 88.0, "min_y": 135.0, "max_x": 99.0, "max_y": 145.0 } },
            { "id": 2, "shape": "stem", "grade": 0.75,
              "bounds": { "min_x": 99.0, "min_y": 80.0, "max_x": 101.0, "max_y": 140.0 } },
            { "id": 3, "shape": "sharp", "grade": 0.55,
              "bounds": { "min_x": 84.0, "min_y": 130.0, "max_x": 92.0, "max_y": 150.0 } },
            { "id": 4, "shape": "natural", "grade": 0.52,
              "bounds": { "min_x": 300.0, "min_y": 130.0, "max_x": 308.0, "max_y": 150.0 } },
            { "id": 5, "shape": "flag_down1", "grade": 0.45,
              "bounds": { "min_x": 400.0, "min_y": 60.0, "max_x": 410.0, "max_y": 90.0 } }
        ],
        "relations": [
            { "source": 1, "target": 2, "kind": "head_stem", "head_side": "right", "grade": 0.8 }
        ]
    }]
}"#;

#[test]
fn test_processor_api_exists() {
    let _processor = SheetProcessor::default();
}

#[test]
fn test_retrieve_staves_with_measured_scale() {
    let processor = SheetProcessor::default();
    let layout = processor
        .retrieve_staves(&staff_image(), None)
        .expect("Failed to retrieve staves");

    assert_eq!(layout.staves().len(), 1);
    assert_eq!(layout.staves()[0].lines().len(), 5);
    assert_eq!(layout.scale().interline(), 20);
}

#[test]
fn test_retrieve_staves_with_given_scale() {
    let processor = SheetProcessor::new(AppConfig::default());
    let scale = Scale::new(20, 3, 3).unwrap();
    let layout = processor
        .retrieve_staves(&staff_image(), Some(scale))
        .expect("Failed to retrieve staves");

    assert_eq!(layout.staves().len(), 1);
}

#[test]
fn test_empty_image_returns_error() {
    let processor = SheetProcessor::default();
    let result = processor.retrieve_staves(&BinaryImage::new(0, 0), None);
    assert!(matches!(result, Err(ScorescanError::Grid(_))));
}

#[test]
fn test_reduce_document() {
    let document: SheetDocument = serde_json::from_str(DOCUMENT).unwrap();
    let processor = SheetProcessor::default();
    let reduced = processor
        .reduce_document(&document)
        .expect("Failed to reduce document");

    let system = &reduced.systems()[0];
    let ids: Vec<usize> = system.inters().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(system.relations().len(), 1);
    assert_eq!(system.relations()[0].source, 1);

    // The reduced document reads back and stays as is
    let json = serde_json::to_string(&reduced).unwrap();
    let again: SheetDocument = serde_json::from_str(&json).unwrap();
    let twice = processor.reduce_document(&again).unwrap();
    assert_eq!(twice.systems()[0].inters().len(), 3);
}

#[test]
fn test_malformed_document_returns_error() {
    let json = r#"{ "systems": [{ "id": 1, "interline": 20, "relations": [
        { "source": 1, "target": 2, "kind": "flag_stem", "grade": 0.5 }
    ] }] }"#;
    let document: SheetDocument = serde_json::from_str(json).unwrap();

    let result = SheetProcessor::default().reduce_document(&document);
    assert!(matches!(
        result,
        Err(ScorescanError::Sig(SigError::UnknownInter(1)))
    ));
}

#[test]
fn test_processor_with_config() {
    let config = AppConfig::new(
        GridConfig::default(),
        ReducerConfig::default().with_mode(ReductionMode::Relaxed),
    );
    let processor = SheetProcessor::new(config);
    assert_eq!(processor.config().reducer().mode(), ReductionMode::Relaxed);

    let document: SheetDocument = serde_json::from_str(DOCUMENT).unwrap();
    assert!(processor.reduce_document(&document).is_ok());
}
