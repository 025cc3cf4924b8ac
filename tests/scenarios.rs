//! End-to-end hide/reveal scenarios through the file-based API.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use invisible_ink::crypto::{open, seal};
use invisible_ink::processing::steganography::{capacity, open_carrier};
use invisible_ink::{hide_file, InkError, InkService, RevealOutcome};

const CLIENT: &str = "192.168.1.20";

fn write_carrier(dir: &TempDir, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(width, height, Rgb([90, 160, 220]))
        .save_with_format(&path, format)
        .unwrap();
    path
}

fn reveal(service: &InkService, path: &Path, password: Option<&str>) -> RevealOutcome {
    service.reveal_file(CLIENT, path, password).unwrap()
}

#[test]
fn test_hello_in_solid_image() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "solid.png", 100, 100, ImageFormat::Png);
    let output = dir.path().join("hidden.png");

    let outcome = hide_file(&input, "HELLO", None, &output).unwrap();
    assert_eq!(outcome.output_path, output);
    assert_eq!(capacity(&open_carrier(&input).unwrap()), 30_000);

    let service = InkService::default();
    assert_eq!(
        reveal(&service, &output, None),
        RevealOutcome::Message("HELLO".to_string())
    );
}

#[test]
fn test_one_pixel_image_is_too_small() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "tiny.png", 1, 1, ImageFormat::Png);
    let before = std::fs::read(&input).unwrap();
    let output = dir.path().join("hidden.png");

    let err = hide_file(&input, "x", None, &output).unwrap_err();

    assert_eq!(
        err,
        InkError::CapacityExceeded {
            required: 48,
            available: 3
        }
    );
    assert!(!output.exists());
    assert_eq!(std::fs::read(&input).unwrap(), before);
}

#[test]
fn test_exact_fit_and_one_char_over() {
    let dir = TempDir::new().unwrap();
    // 4x4x3 = 48 bits = one char plus the 5-char sentinel.
    let input = write_carrier(&dir, "small.png", 4, 4, ImageFormat::Png);
    let output = dir.path().join("hidden.png");

    hide_file(&input, "a", None, &output).unwrap();
    assert_eq!(
        reveal(&InkService::default(), &output, None),
        RevealOutcome::Message("a".to_string())
    );

    assert!(matches!(
        hide_file(&input, "ab", None, &dir.path().join("other.png")),
        Err(InkError::CapacityExceeded {
            required: 56,
            available: 48
        })
    ));
}

#[test]
fn test_seal_with_one_password_open_with_another() {
    let sealed = seal("secret", "pw1").unwrap();
    assert_eq!(open(&sealed, "pw2"), Err(InkError::AuthenticationFailure));
    assert_eq!(open(&sealed, "pw1").unwrap(), "secret");
}

#[test]
fn test_lockout_after_three_wrong_passwords() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "carrier.png", 64, 64, ImageFormat::Png);
    let output = dir.path().join("hidden.png");
    hide_file(&input, "launch codes", Some("right"), &output).unwrap();

    let service = InkService::default();
    for attempt in 1..=3 {
        assert_eq!(
            reveal(&service, &output, Some("wrong")),
            RevealOutcome::WrongPassword,
            "attempt {attempt}"
        );
    }

    match reveal(&service, &output, Some("right")) {
        RevealOutcome::LockedOut { remaining_secs } => {
            assert!(remaining_secs > 0 && remaining_secs <= 30)
        }
        other => panic!("expected lockout, got {other:?}"),
    }

    // Another client is unaffected.
    assert_eq!(
        service.reveal_file("10.0.0.1", &output, Some("right")).unwrap(),
        RevealOutcome::Message("launch codes".to_string())
    );
}

#[test]
fn test_encrypted_message_needs_password() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "carrier.png", 64, 64, ImageFormat::Png);
    let output = dir.path().join("hidden.png");
    hide_file(&input, "secret", Some("pw"), &output).unwrap();

    let service = InkService::default();
    assert_eq!(reveal(&service, &output, None), RevealOutcome::PasswordRequired);
    assert_eq!(
        reveal(&service, &output, Some("pw")),
        RevealOutcome::Message("secret".to_string())
    );
}

#[test]
fn test_jpeg_input_is_written_as_png() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "photo.jpg", 80, 60, ImageFormat::Jpeg);
    // Extension says JPEG; contents must still be PNG.
    let output = dir.path().join("hidden.jpg");

    hide_file(&input, "lossless please", None, &output).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    assert_eq!(
        reveal(&InkService::default(), &output, None),
        RevealOutcome::Message("lossless please".to_string())
    );
}

#[test]
fn test_untouched_image_has_no_message() {
    let dir = TempDir::new().unwrap();
    let input = write_carrier(&dir, "plain.png", 32, 32, ImageFormat::Png);

    assert_eq!(
        reveal(&InkService::default(), &input, Some("pw")),
        RevealOutcome::NoMessageFound
    );
}

#[test]
fn test_missing_file_is_io_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.png");

    assert!(matches!(
        InkService::default().reveal_file(CLIENT, &missing, None),
        Err(InkError::Io(_))
    ));
    assert!(matches!(
        hide_file(&missing, "x", None, &dir.path().join("out.png")),
        Err(InkError::Io(_))
    ));
}
