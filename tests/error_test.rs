//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use leaf_doctor::error::LeafDoctorError;
use leaf_doctor::scanner;
use tempfile::tempdir;

/// 存在しないパスを解析対象にした場合（ファイル名風のパスでもフォルダ扱い）
#[test]
fn test_scan_missing_leaf_photo() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("tomato_leaf_001.jpg");

    let err = scanner::scan_path(&missing, false).unwrap_err();
    assert!(matches!(err, LeafDoctorError::FolderNotFound(_)));
    assert!(err.to_string().contains("tomato_leaf_001.jpg"));
}

/// 大文字小文字が混在する拡張子の葉画像を拾う
#[test]
fn test_scan_mixed_case_extensions() {
    let dir = tempdir().expect("Failed to create temp dir");
    for name in ["rice_leaf.TIFF", "apple_leaf.bmp", "grape_leaf.Jpeg", "notes.txt", "leaf.gif"] {
        std::fs::write(dir.path().join(name), b"dummy").unwrap();
    }

    let images = scanner::scan_path(dir.path(), false).unwrap();
    let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["apple_leaf.bmp", "grape_leaf.Jpeg", "rice_leaf.TIFF"]);
}

/// サブフォルダの画像は `recursive` 指定時のみ対象
#[test]
fn test_scan_field_subfolders() {
    let dir = tempdir().expect("Failed to create temp dir");
    let plot = dir.path().join("plot_b");
    std::fs::create_dir(&plot).unwrap();
    std::fs::write(dir.path().join("plot_a_leaf.png"), b"dummy").unwrap();
    std::fs::write(plot.join("plot_b_leaf.tif"), b"dummy").unwrap();
    std::fs::write(plot.join("reply.json"), "{}").unwrap();

    let shallow = scanner::scan_path(dir.path(), false).unwrap();
    assert_eq!(shallow.len(), 1);
    assert_eq!(shallow[0].file_name, "plot_a_leaf.png");

    let deep = scanner::scan_path(dir.path(), true).unwrap();
    let names: Vec<&str> = deep.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["plot_a_leaf.png", "plot_b_leaf.tif"]);
}

/// 単一の葉画像ファイルを直接指定した場合
#[test]
fn test_scan_single_leaf_photo() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("Leaf_Sample.PNG");
    std::fs::write(&path, b"dummy").unwrap();

    let images = scanner::scan_path(&path, false).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].file_name, "Leaf_Sample.PNG");
    assert_eq!(images[0].path, path);
}

/// 対応外の拡張子のファイルを直接指定した場合
#[test]
fn test_scan_unsupported_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("leaf.gif");
    std::fs::write(&path, b"GIF89a").unwrap();

    let err = scanner::scan_path(&path, false).unwrap_err();
    assert!(matches!(err, LeafDoctorError::UnsupportedFormat(_)));
    assert!(err.is_client_error());
}

/// LeafDoctorErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        LeafDoctorError::Config("テスト設定エラー".to_string()),
        LeafDoctorError::FileNotFound("leaf.jpg".to_string()),
        LeafDoctorError::FolderNotFound("/path/to/folder".to_string()),
        LeafDoctorError::ApiCall("API呼び出し失敗".to_string()),
        LeafDoctorError::ApiParse("返答が不正".to_string()),
        LeafDoctorError::InvalidImagePayload("Base64".to_string()),
        LeafDoctorError::ImageLoad("壊れた画像".to_string()),
        LeafDoctorError::NoImagesFound("フォルダ".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// MissingApiKeyエラーのメッセージ確認
#[test]
fn test_missing_api_key_message() {
    let err = LeafDoctorError::MissingApiKey;
    let display = format!("{}", err);

    assert!(display.contains("APIキー"));
    assert!(display.contains("GROQ_API_KEY"));
    assert!(display.contains("leaf-doctor config"));
}

/// エラー分類（HTTPステータスの判定に使う）
#[test]
fn test_error_classification() {
    assert!(LeafDoctorError::InvalidImagePayload("x".into()).is_client_error());
    assert!(LeafDoctorError::ImageLoad("x".into()).is_client_error());
    assert!(!LeafDoctorError::ApiCall("x".into()).is_client_error());

    assert!(LeafDoctorError::ApiCall("x".into()).is_upstream_error());
    assert!(!LeafDoctorError::ApiParse("x".into()).is_upstream_error());
    assert!(!LeafDoctorError::MissingApiKey.is_upstream_error());
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: LeafDoctorError = io_err.into();

    assert!(matches!(err, LeafDoctorError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: LeafDoctorError = json_err.into();

    assert!(matches!(err, LeafDoctorError::JsonParse(_)));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_conversion() {
    let common_err = leaf_doctor_common::parse_disease_response("no json here").unwrap_err();
    let err: LeafDoctorError = common_err.into();

    assert!(matches!(err, LeafDoctorError::Common(_)));
    // 透過的エラーなので抜粋がそのまま表示される
    assert!(err.to_string().contains("no json here"));
}
