use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use voctree_core::types::{Descriptor, DESCRIPTOR_DIM};
use voctree_core::Error;
use voctree_io::descriptors::{read_descriptors, write_descriptors};
use voctree_io::{DocumentSource, SceneDescription, SourceKind};

fn descriptor(x: f32) -> Descriptor {
    let mut d = [0f32; DESCRIPTOR_DIM];
    d[0] = x;
    d[DESCRIPTOR_DIM - 1] = -x;
    d
}

const SCENE: &str = r#"{
    "sfm_data_version": "0.3",
    "root_path": "/captures/session",
    "views": [
        { "key": 1, "value": { "polymorphic_id": 1073741824, "ptr_wrapper": { "id": 2147483650,
          "data": { "local_path": "cam1", "filename": "IMG_0002.jpg", "width": 640, "height": 480,
                    "id_view": 1, "id_intrinsic": 0, "id_pose": 1 } } } },
        { "key": 0, "value": { "polymorphic_id": 1073741824, "ptr_wrapper": { "id": 2147483649,
          "data": { "local_path": "", "filename": "IMG_0001.jpg", "width": 640, "height": 480,
                    "id_view": 0, "id_intrinsic": 0, "id_pose": 0 } } } }
    ],
    "intrinsics": [],
    "extrinsics": []
}"#;

#[test]
fn source_kind_follows_extension() {
    assert_eq!(SourceKind::of(Path::new("/a/sfm_data.json")), SourceKind::SceneDescription);
    assert_eq!(SourceKind::of(Path::new("/a/list.txt")), SourceKind::ImageList);
    assert_eq!(SourceKind::of(Path::new("/a/list")), SourceKind::ImageList);
}

#[test]
fn descriptor_file_round_trip_preserves_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("0.desc");
    let written = vec![descriptor(1.0), descriptor(2.5), descriptor(-3.0)];
    write_descriptors(&path, &written).expect("write");
    assert_eq!(read_descriptors(&path).expect("read"), written);
}

#[test]
fn truncated_descriptor_file_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("0.desc");
    write_descriptors(&path, &[descriptor(1.0), descriptor(2.0)]).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();
    assert!(matches!(read_descriptors(&path), Err(Error::Parse { .. })));
}

#[test]
fn oversized_descriptor_count_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("0.desc");
    fs::write(&path, (1u64 << 56).to_le_bytes()).unwrap();
    assert!(matches!(read_descriptors(&path), Err(Error::Parse { .. })));

    let mut bytes = u64::MAX.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; DESCRIPTOR_DIM * 4]);
    fs::write(&path, bytes).unwrap();
    assert!(matches!(read_descriptors(&path), Err(Error::Parse { .. })));
}

#[test]
fn image_list_maps_lines_to_colocated_descriptor_files() {
    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("list.txt");
    fs::write(&list, "images/b.jpg 0 0 1200\n\na.jpg\nc.png 0 0\n").unwrap();

    let source = DocumentSource::open(&list).expect("open");
    assert_eq!(source.kind, SourceKind::ImageList);
    let expected: Vec<PathBuf> = ["b.desc", "a.desc", "c.desc"].iter().map(|f| tmp.path().join(f)).collect();
    assert_eq!(source.descriptor_files(), expected.as_slice());
}

#[test]
fn documents_are_read_in_source_order() {
    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("list.txt");
    fs::write(&list, "b.jpg\na.jpg\n").unwrap();
    write_descriptors(&tmp.path().join("b.desc"), &[descriptor(1.0)]).unwrap();
    write_descriptors(&tmp.path().join("a.desc"), &[descriptor(2.0), descriptor(3.0)]).unwrap();

    let source = DocumentSource::open(&list).expect("open");
    let docs: Vec<Vec<Descriptor>> = source.documents().collect::<Result<_, _>>().expect("read");
    assert_eq!(docs, vec![vec![descriptor(1.0)], vec![descriptor(2.0), descriptor(3.0)]]);
}

#[test]
fn missing_descriptor_file_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let list = tmp.path().join("list.txt");
    fs::write(&list, "ghost.jpg\n").unwrap();
    let source = DocumentSource::open(&list).expect("open");
    let first = source.documents().next().expect("one document");
    assert!(matches!(first, Err(Error::Io { .. })));
}

#[test]
fn scene_description_reads_views_and_root() {
    let scene = SceneDescription::from_json(SCENE).expect("parse");
    assert_eq!(scene.root_path, PathBuf::from("/captures/session"));
    assert_eq!(scene.len(), 2);

    let ids: Vec<usize> = scene.views().map(|v| v.id).collect();
    assert_eq!(ids, vec![0, 1], "views are ordered by id");

    let view = scene.view(1).expect("view 1");
    assert_eq!(view.path, PathBuf::from("cam1/IMG_0002.jpg"));
    assert_eq!(view.file_name(), Some("IMG_0002.jpg"));
    assert_eq!(scene.image_path(1), Some(PathBuf::from("/captures/session/cam1/IMG_0002.jpg")));
    assert_eq!(scene.image_path(0), Some(PathBuf::from("/captures/session/IMG_0001.jpg")));
    assert!(scene.view(7).is_none());
}

#[test]
fn scene_source_uses_view_ids_for_descriptor_files() {
    let tmp = TempDir::new().unwrap();
    let json = tmp.path().join("sfm_data.json");
    fs::write(&json, SCENE).unwrap();

    let source = DocumentSource::open(&json).expect("open");
    assert_eq!(source.kind, SourceKind::SceneDescription);
    assert_eq!(source.descriptor_files(), &[tmp.path().join("0.desc"), tmp.path().join("1.desc")]);
}

#[test]
fn malformed_scene_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let json = tmp.path().join("sfm_data.json");
    fs::write(&json, "{ \"views\": 3 }").unwrap();
    assert!(matches!(SceneDescription::load(&json), Err(Error::Parse { .. })));
}
