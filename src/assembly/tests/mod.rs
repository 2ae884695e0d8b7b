use super::frames::{is_frame, order_frames};
use super::*;
use crate::error::Error;
use image::{AnimationDecoder, Rgba, RgbaImage};
use std::io::Write;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encode a solid 4x4 PNG in memory
fn png_frame(shade: u8) -> Vec<u8> {
    let pixels = RgbaImage::from_pixel(4, 4, Rgba([shade, 255 - shade, 0, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    pixels.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Write a stored (uncompressed) zip with the given entries
fn create_zip_archive(archive_path: &Path, files: &[(String, Vec<u8>)]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

fn numbered_frames(names: &[&str]) -> Vec<(String, Vec<u8>)> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), png_frame((i * 20) as u8)))
        .collect()
}

fn gif_frame_count(path: &Path) -> usize {
    let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
    let decoder = image::codecs::gif::GifDecoder::new(file).unwrap();
    decoder.into_frames().collect_frames().unwrap().len()
}

/// Red channel of the top-left pixel of every frame, in playback order
fn gif_frame_reds(path: &Path) -> Vec<u8> {
    let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
    let decoder = image::codecs::gif::GifDecoder::new(file).unwrap();
    decoder
        .into_frames()
        .collect_frames()
        .unwrap()
        .iter()
        .map(|frame| frame.buffer().get_pixel(0, 0)[0])
        .collect()
}

fn assert_scratch_removed(dest: &Path, id: ItemId) {
    assert!(!dest.join(format!("{}.zip", id)).exists(), "archive left behind");
    assert!(
        !dest.join(format!("{}_extracted", id)).exists(),
        "extraction directory left behind"
    );
}

// ---------------------------------------------------------------------------
// Frame ordering
// ---------------------------------------------------------------------------

#[test]
fn frame_extensions_are_case_insensitive() {
    assert!(is_frame(Path::new("000001.JPG")));
    assert!(is_frame(Path::new("frame_1.jpeg")));
    assert!(is_frame(Path::new("frame_1.png")));
    assert!(!is_frame(Path::new("animation.json")));
    assert!(!is_frame(Path::new("frames")));
}

#[test]
fn zero_padded_frames_sort_in_sequence() {
    let dir = Path::new("/x");
    // Shuffled input, as archive order is not guaranteed
    let files: Vec<PathBuf> = [7, 0, 11, 3, 1, 10, 2, 4, 5, 9, 6, 8]
        .iter()
        .map(|i| dir.join(format!("frame_{:03}.jpg", i)))
        .collect();

    let ordered = order_frames(dir, files).unwrap();
    let expected: Vec<PathBuf> = (0..12)
        .map(|i| dir.join(format!("frame_{:03}.jpg", i)))
        .collect();
    assert_eq!(ordered, expected);
}

#[test]
fn non_frame_files_are_ignored() {
    let dir = Path::new("/x");
    let files = vec![
        dir.join("000001.jpg"),
        dir.join("animation.json"),
        dir.join("000000.jpg"),
    ];
    let ordered = order_frames(dir, files).unwrap();
    assert_eq!(ordered, vec![dir.join("000000.jpg"), dir.join("000001.jpg")]);
}

#[test]
fn unpadded_names_that_sort_wrongly_are_rejected() {
    let dir = Path::new("/x");
    let files = vec![dir.join("1.png"), dir.join("2.png"), dir.join("10.png")];
    match order_frames(dir, files) {
        Err(Error::Assembly(AssemblyError::UnsortableFrames { reason, .. })) => {
            assert!(reason.contains("2.png"), "reason: {}", reason);
        }
        other => panic!("expected UnsortableFrames, got {:?}", other),
    }
}

#[test]
fn unpadded_names_below_ten_are_accepted() {
    let dir = Path::new("/x");
    let files = vec![dir.join("f2.png"), dir.join("f1.png"), dir.join("f3.png")];
    assert_eq!(order_frames(dir, files).unwrap().len(), 3);
}

#[test]
fn names_without_sequence_number_are_rejected() {
    let dir = Path::new("/x");
    let files = vec![dir.join("000000.jpg"), dir.join("cover.jpg")];
    assert!(matches!(
        order_frames(dir, files),
        Err(Error::Assembly(AssemblyError::UnsortableFrames { .. }))
    ));
}

#[test]
fn no_frames_is_an_error() {
    let dir = Path::new("/x");
    assert!(matches!(
        order_frames(dir, vec![dir.join("readme.txt")]),
        Err(Error::Assembly(AssemblyError::NoFrames { .. }))
    ));
    assert!(matches!(
        order_frames(dir, vec![]),
        Err(Error::Assembly(AssemblyError::NoFrames { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Full assembly
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assembles_all_frames_and_removes_scratch() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(654321);
    let archive = dest.path().join("654321.zip");
    let names: Vec<String> = (0..12).map(|i| format!("{:06}.png", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    create_zip_archive(&archive, &numbered_frames(&names));

    let output = FrameAssembler::new(100)
        .assemble(&archive, dest.path(), id)
        .await
        .unwrap();

    assert_eq!(output, dest.path().join("654321.gif"));
    assert_eq!(gif_frame_count(&output), 12);
    assert!(!dest.path().join("654321.gif.part").exists());
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn animation_plays_frames_in_sequence_order() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(4242);
    let archive = dest.path().join("4242.zip");
    // Entries stored out of order; each frame's red channel encodes its number
    let files: Vec<(String, Vec<u8>)> = [5usize, 0, 11, 2, 7, 1, 9, 3, 10, 4, 8, 6]
        .iter()
        .map(|n| {
            let pixels = RgbaImage::from_pixel(4, 4, Rgba([(*n * 20) as u8, 0, 0, 255]));
            let mut bytes = std::io::Cursor::new(Vec::new());
            pixels.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
            (format!("{:06}.png", n), bytes.into_inner())
        })
        .collect();
    create_zip_archive(&archive, &files);

    let output = FrameAssembler::new(100)
        .assemble(&archive, dest.path(), id)
        .await
        .unwrap();

    let expected: Vec<u8> = (0..12).map(|n| (n * 20) as u8).collect();
    assert_eq!(gif_frame_reds(&output), expected);
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn single_frame_archive_produces_animation() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(7);
    let archive = dest.path().join("7.zip");
    create_zip_archive(&archive, &numbered_frames(&["000000.png"]));

    let output = FrameAssembler::new(100)
        .assemble(&archive, dest.path(), id)
        .await
        .unwrap();
    assert_eq!(gif_frame_count(&output), 1);
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn archive_without_frames_fails_and_cleans_up() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(8);
    let archive = dest.path().join("8.zip");
    create_zip_archive(&archive, &[("readme.txt".to_string(), b"hi".to_vec())]);

    let result = FrameAssembler::new(100).assemble(&archive, dest.path(), id).await;
    assert!(matches!(
        result,
        Err(Error::Assembly(AssemblyError::NoFrames { .. }))
    ));
    assert!(!dest.path().join("8.gif").exists());
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn corrupt_frame_fails_decode_and_cleans_up() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(9);
    let archive = dest.path().join("9.zip");
    let mut files = numbered_frames(&["000000.png"]);
    files.push(("000001.jpg".to_string(), b"definitely not a jpeg".to_vec()));
    create_zip_archive(&archive, &files);

    let result = FrameAssembler::new(100).assemble(&archive, dest.path(), id).await;
    match result {
        Err(Error::Assembly(AssemblyError::Decode { frame, .. })) => {
            assert!(frame.ends_with("000001.jpg"));
        }
        other => panic!("expected Decode error, got {:?}", other),
    }
    assert!(!dest.path().join("9.gif").exists());
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn unreadable_archive_fails_extraction_and_cleans_up() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(10);
    let archive = dest.path().join("10.zip");
    std::fs::write(&archive, b"PK but not really").unwrap();

    let result = FrameAssembler::new(100).assemble(&archive, dest.path(), id).await;
    assert!(matches!(
        result,
        Err(Error::Assembly(AssemblyError::Extraction { .. }))
    ));
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn unsortable_archive_fails_and_cleans_up() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(11);
    let archive = dest.path().join("11.zip");
    create_zip_archive(&archive, &numbered_frames(&["1.png", "2.png", "10.png"]));

    let result = FrameAssembler::new(100).assemble(&archive, dest.path(), id).await;
    assert!(matches!(
        result,
        Err(Error::Assembly(AssemblyError::UnsortableFrames { .. }))
    ));
    assert_scratch_removed(dest.path(), id);
}

#[tokio::test]
async fn cancelled_assembly_still_cleans_up() {
    let dest = TempDir::new().unwrap();
    let id = ItemId(12);
    let archive = dest.path().join("12.zip");
    let names: Vec<String> = (0..30).map(|i| format!("{:06}.png", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    create_zip_archive(&archive, &numbered_frames(&names));

    // Dropped after its first poll; the blocking work carries on and owns cleanup
    let assembler = FrameAssembler::new(100);
    let _ = tokio::time::timeout(
        std::time::Duration::ZERO,
        assembler.assemble(&archive, dest.path(), id),
    )
    .await;

    let extract_dir = dest.path().join("12_extracted");
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    while (archive.exists() || extract_dir.exists()) && std::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_scratch_removed(dest.path(), id);
}
