//
// dicom_workflows.rs
// Mammo-Prep-rs
//
// Integration-style tests covering DICOM decoding, windowing, letterboxing, table enrichment and image export.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use dicom::core::{dicom_value, DataElement, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use mammo_prep::annotations::{AnnotationRow, Source};
use mammo_prep::attributes::PhotometricInterpretation;
use mammo_prep::backend::Backend;
use mammo_prep::intensity::{DeviceModel, IntensityValue};
use mammo_prep::{batch, metadata, source, table, IntensityNormalizer, PrepConfig};
use tempfile::{tempdir, TempDir};

const PIXELS: [u8; 8] = [0, 32, 64, 96, 128, 160, 192, 255];

enum Windowing {
    None,
    Scalar,
    GiottoMonochrome1,
}

fn build_test_dicom(dir: &Path, name: &str, windowing: Windowing) -> PathBuf {
    // A 4x2 (rows x columns) 8-bit mammogram stand-in with predictable samples.
    let path = dir.join(name);

    let mut obj = InMemDicomObject::new_empty_with_dict(StandardDataDictionary);
    obj.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::from("MG"),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0016),
        VR::UI,
        PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.7"),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0018),
        VR::UI,
        PrimitiveValue::from("1.2.826.0.1.3680043.2.1125.1"),
    ));
    obj.put(DataElement::new(
        Tag(0x0028, 0x0010),
        VR::US,
        PrimitiveValue::from(4_u16),
    )); // Rows
    obj.put(DataElement::new(
        Tag(0x0028, 0x0011),
        VR::US,
        PrimitiveValue::from(2_u16),
    )); // Columns
    obj.put(DataElement::new(
        Tag(0x0028, 0x0002),
        VR::US,
        PrimitiveValue::from(1_u16),
    )); // Samples per pixel
    obj.put(DataElement::new(
        Tag(0x0028, 0x0100),
        VR::US,
        PrimitiveValue::from(8_u16),
    )); // Bits Allocated
    obj.put(DataElement::new(
        Tag(0x0028, 0x0101),
        VR::US,
        PrimitiveValue::from(8_u16),
    )); // Bits Stored
    obj.put(DataElement::new(
        Tag(0x0028, 0x0102),
        VR::US,
        PrimitiveValue::from(7_u16),
    )); // High Bit
    obj.put(DataElement::new(
        Tag(0x0028, 0x0103),
        VR::US,
        PrimitiveValue::from(0_u16),
    )); // Pixel Representation

    let photometric = match windowing {
        Windowing::GiottoMonochrome1 => "MONOCHROME1",
        _ => "MONOCHROME2",
    };
    obj.put(DataElement::new(
        Tag(0x0028, 0x0004),
        VR::CS,
        PrimitiveValue::from(photometric),
    ));

    match windowing {
        Windowing::None => {}
        Windowing::Scalar => {
            obj.put(DataElement::new(
                Tag(0x0028, 0x1050),
                VR::DS,
                PrimitiveValue::from("128"),
            )); // Window Center
            obj.put(DataElement::new(
                Tag(0x0028, 0x1051),
                VR::DS,
                PrimitiveValue::from("256"),
            )); // Window Width
        }
        Windowing::GiottoMonochrome1 => {
            obj.put(DataElement::new(
                Tag(0x0028, 0x1050),
                VR::DS,
                dicom_value!(Strs, ["128", "64"]),
            ));
            obj.put(DataElement::new(
                Tag(0x0028, 0x1051),
                VR::DS,
                dicom_value!(Strs, ["256", "100"]),
            ));
            obj.put(DataElement::new(
                Tag(0x0008, 0x1090),
                VR::LO,
                PrimitiveValue::from("GIOTTO CLASS"),
            )); // Manufacturer Model Name
        }
    }

    obj.put(DataElement::new(
        Tag(0x7fe0, 0x0010),
        VR::OB,
        PrimitiveValue::from(PIXELS.to_vec()),
    ));

    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1")
        .build()
        .expect("meta");

    let mut file_obj = FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
    for elem in obj {
        file_obj.put(elem);
    }
    file_obj.write_to_file(&path).expect("write test dicom");

    path
}

fn workspace() -> TempDir {
    tempdir().expect("tempdir")
}

#[test]
fn decoding_reads_samples_and_attributes() {
    let dir = workspace();
    let path = build_test_dicom(dir.path(), "scalar.dcm", Windowing::Scalar);

    let (pixels, attrs) = source::load_dicom(&path).expect("load");
    assert_eq!((pixels.height(), pixels.width(), pixels.channels()), (4, 2, 1));
    assert_eq!(pixels.samples()[[3, 1, 0]], 255.0);
    assert_eq!(attrs.window_center, Some(IntensityValue::Scalar(128.0)));
    assert_eq!(attrs.window_width, Some(IntensityValue::Scalar(256.0)));
    assert_eq!(attrs.photometric_interpretation, PhotometricInterpretation::Monochrome2);
    assert_eq!(attrs.padding_value(), 0.0);

    assert_eq!(source::image_dimensions(&path).expect("dims"), (4, 2));
}

#[test]
fn windowed_image_is_letterboxed() {
    let dir = workspace();
    let path = build_test_dicom(dir.path(), "scalar.dcm", Windowing::Scalar);

    let square = source::prepare_training_image(&path, &IntensityNormalizer::new(Backend::Parallel))
        .expect("prepare");
    assert_eq!(square.side(), 4);
    assert_eq!((square.offset_y, square.offset_x), (0, 1));
    // Level 128 maps to the midpoint.
    assert_eq!(square.samples()[[2, 1, 0]], 127);
    assert_eq!(square.samples()[[2, 1, 2]], 127);
    assert_eq!(square.samples()[[3, 2, 1]], 254);
    // Border columns stay black.
    assert!((0..4).all(|y| square.samples()[[y, 0, 0]] == 0 && square.samples()[[y, 3, 0]] == 0));
}

#[test]
fn monochrome1_with_vendor_windows_is_inverted() {
    let dir = workspace();
    let path = build_test_dicom(dir.path(), "giotto.dcm", Windowing::GiottoMonochrome1);

    let (pixels, attrs) = source::load_dicom(&path).expect("load");
    assert_eq!(attrs.device_model(), DeviceModel::GiottoClass);
    assert!(attrs.window_center.as_ref().is_some_and(|c| c.is_multi_valued()));

    let normalized = IntensityNormalizer::new(Backend::Serial)
        .strict_devices(true)
        .normalize(pixels, &attrs)
        .expect("normalize");
    // Darkest stored sample renders brightest.
    assert_eq!(normalized.samples()[[0, 0, 0]], 255);
    assert_eq!(normalized.samples()[[3, 1, 0]], 0);
}

#[test]
fn missing_window_falls_back_to_min_max() {
    let dir = workspace();
    let path = build_test_dicom(dir.path(), "plain.dcm", Windowing::None);

    let square = source::prepare_training_image(&path, &IntensityNormalizer::new(Backend::Serial))
        .expect("prepare");
    let column: Vec<u8> = (0..4).map(|y| square.samples()[[y, 1, 0]]).collect();
    assert_eq!(column, vec![0, 64, 128, 192]);
    assert_eq!(square.samples()[[3, 2, 0]], 255);
}

#[test]
fn attribute_summary_reports_resolved_window() {
    let dir = workspace();
    let path = build_test_dicom(dir.path(), "giotto.dcm", Windowing::GiottoMonochrome1);

    let summary = metadata::read_summary(&path, false).expect("summary");
    assert_eq!((summary.rows, summary.columns), (4, 2));
    assert_eq!(summary.resolved_window, Some((256.0, 128.0)));
    assert_eq!(summary.window_width, Some(vec![256.0, 100.0]));
}

#[test]
fn table_enrichment_and_export_round_out_a_batch() {
    let dir = workspace();
    let images = dir.path().join("images");
    std::fs::create_dir_all(&images).expect("images dir");
    let dicom_path = build_test_dicom(&images, "a.dcm", Windowing::Scalar);
    let missing_path = images.join("missing.dcm");

    let row = |path: &Path, id: &str, finding: &str| AnnotationRow {
        abs_path: path.to_string_lossy().into_owned(),
        source: Source::Other("DDSM".to_string()),
        finding: finding.to_string(),
        xmin: 0.0,
        ymin: 1.0,
        xmax: 2.0,
        ymax: 3.0,
        id: id.to_string(),
    };
    let rows = vec![
        row(&dicom_path, "1", "Mass"),
        row(&dicom_path, "2", "Calcification"),
        row(&missing_path, "3", "Mass"),
    ];

    let config = PrepConfig {
        target_size: 8,
        ..Default::default()
    };
    let outcome = batch::enrich_rows(rows, &config).expect("enrich");
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].id, "3");

    let first = &outcome.rows[0];
    assert_eq!((first.number, first.index, first.label), (1, 1, 2));
    assert_eq!(outcome.rows[1].index, 2);
    assert_eq!(first.image_name, "Unknown");
    // 4x2 image: x shifted by 1, scale 8/4.
    assert_eq!((first.coordinates.pix_height, first.coordinates.pix_width), (4, 2));
    assert!((first.coordinates.xmin1080 - 2.0).abs() < 1e-9);
    assert!((first.coordinates.x2 - 0.75).abs() < 1e-9);
    assert!((first.coordinates.cy - 0.5).abs() < 1e-9);

    let enriched_csv = dir.path().join("enriched.csv");
    table::write_enriched(&enriched_csv, &outcome.rows).expect("write enriched");

    let out_dir = dir.path().join("out");
    let images = table::read_enriched_images(&enriched_csv).expect("read enriched");
    let export = batch::export_images(&batch::distinct_images(&outcome.rows), &out_dir, &config)
        .expect("export");
    assert_eq!(images.len(), 2);
    assert_eq!(export.written.len(), 1);
    assert!(export.failures.is_empty());

    let written = image::open(&export.written[0]).expect("open png");
    assert_eq!((written.width(), written.height()), (4, 4));
}

#[test]
fn directory_conversion_writes_one_png_per_input() {
    let dir = workspace();
    let input = dir.path().join("in");
    std::fs::create_dir_all(input.join("nested")).expect("nested");
    build_test_dicom(&input, "a.dcm", Windowing::Scalar);
    build_test_dicom(&input.join("nested"), "b.DCM", Windowing::None);
    std::fs::write(input.join("notes.txt"), b"ignored").expect("notes");

    let config = PrepConfig {
        export_size: Some(16),
        ..Default::default()
    };
    let out = dir.path().join("out");
    let outcome = batch::convert_directory(&input, &out, &config).expect("convert");
    assert_eq!(outcome.written.len(), 2);
    assert!(out.join("a.png").exists());
    assert!(out.join("nested").join("b.png").exists());

    let resized = image::open(out.join("a.png")).expect("open png");
    assert_eq!((resized.width(), resized.height()), (16, 16));
}
