//! Error handling

use sedekah_qr::error::SedekahError;
use sedekah_qr::scanner;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result.unwrap_err(), SedekahError::FolderNotFound(_)));
}

#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path());
    assert!(result.unwrap().is_empty());
}

#[test]
fn test_decode_missing_file_is_io_error() {
    let result = scanner::decode_file(Path::new("/nonexistent/qr.png"));
    assert!(matches!(result, Err(SedekahError::Io(_))));
}

#[test]
fn test_decode_corrupt_file_is_decode_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("corrupt.png");
    std::fs::write(&path, b"corrupt.bin renamed").unwrap();

    let result = scanner::decode_file(&path);
    assert!(matches!(result, Err(SedekahError::Decode(_))));
}

#[test]
fn test_error_display() {
    let errors = vec![
        SedekahError::Config("bad".to_string()),
        SedekahError::FileNotFound("qr.png".to_string()),
        SedekahError::FolderNotFound("/path/to/folder".to_string()),
        SedekahError::NoImagesFound("folder".to_string()),
        SedekahError::InvalidCoordinates("91, 0".to_string()),
        SedekahError::IncompleteForm("name".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "empty message: {:?}", err);
    }
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: SedekahError = io_err.into();

    assert!(matches!(err, SedekahError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: SedekahError = json_err.into();

    assert!(matches!(err, SedekahError::JsonParse(_)));
}

#[test]
fn test_decode_error_conversion() {
    let decode_err = sedekah_qr_common::DecodeError::BufferSize {
        width: 1,
        height: 1,
        expected: 4,
        actual: 0,
    };
    let err: SedekahError = decode_err.into();

    assert!(matches!(err, SedekahError::Decode(_)));
    assert!(format!("{}", err).starts_with("Image decode error"));
}
