use super::*;

#[test]
fn drop_removes_directory_and_contents() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path().join("staging");
    {
        let staging = Staging::create(&root).unwrap();
        std::fs::write(staging.frame_image(FrameIndex(0)), b"png").unwrap();
        std::fs::write(staging.concat_list(), b"file frame-0.webm\n").unwrap();
        assert!(root.is_dir());
    }
    assert!(!root.exists());
}

#[test]
fn create_clears_stale_run() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path().join("staging");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join(MARKER), b"owned\n").unwrap();
    std::fs::write(root.join("frame-9.png"), b"old").unwrap();
    std::fs::write(root.join("concat.txt"), b"old").unwrap();

    {
        let staging = Staging::create(&root).unwrap();
        assert!(!staging.frame_image(FrameIndex(9)).exists());
        assert!(!staging.concat_list().exists());
        assert!(staging.root().is_dir());
    }
    assert!(!root.exists());
}

#[test]
fn existing_user_directory_is_never_wiped() {
    let scratch = tempfile::tempdir().unwrap();
    let videos = scratch.path().join("videos");
    std::fs::create_dir_all(&videos).unwrap();
    let clip = videos.join("clip.mp4");
    std::fs::write(&clip, b"user video").unwrap();

    let err = Staging::create(&videos).unwrap_err();
    assert!(matches!(err, DynresError::InvalidInput(_)));
    assert_eq!(std::fs::read(&clip).unwrap(), b"user video");
}

#[test]
fn stale_marker_does_not_license_deleting_user_files() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path().join("staging");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join(MARKER), b"owned\n").unwrap();
    std::fs::write(root.join("frame-0.png"), b"old").unwrap();
    std::fs::write(root.join("notes.txt"), b"keep me").unwrap();

    let err = Staging::create(&root).unwrap_err();
    assert!(matches!(err, DynresError::InvalidInput(_)));
    assert_eq!(std::fs::read(root.join("notes.txt")).unwrap(), b"keep me");
    assert!(!root.join("frame-0.png").exists());
}

#[test]
fn empty_existing_directory_is_borrowed_and_kept() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path().join("mine");
    std::fs::create_dir_all(&root).unwrap();

    {
        let staging = Staging::create(&root).unwrap();
        std::fs::write(staging.frame_image(FrameIndex(0)), b"png").unwrap();
        std::fs::write(staging.segment(FrameIndex(0)), b"webm").unwrap();
        std::fs::write(staging.silent_video(), b"webm").unwrap();
    }
    assert!(root.is_dir());
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn file_as_staging_root_is_invalid_input() {
    let scratch = tempfile::tempdir().unwrap();
    let file = scratch.path().join("clip.mp4");
    std::fs::write(&file, b"x").unwrap();

    let err = Staging::create(&file).unwrap_err();
    assert!(matches!(err, DynresError::InvalidInput(_)));
    assert!(file.is_file());
}

#[test]
fn staged_names_are_recognized() {
    for name in [MARKER, "frame-0.png", "frame-12.webm", "concat.txt", "out.webm", "audio.wav"] {
        assert!(is_staged_file_name(name), "{name}");
    }
    for name in ["clip.mp4", "frame-0.jpg", "notes.txt", "output.webm"] {
        assert!(!is_staged_file_name(name), "{name}");
    }
}

#[test]
fn file_names_are_index_derived() {
    let scratch = tempfile::tempdir().unwrap();
    let staging = Staging::create(scratch.path().join("s")).unwrap();
    assert!(staging.frame_image(FrameIndex(3)).ends_with("frame-3.png"));
    assert!(staging.segment(FrameIndex(3)).ends_with("frame-3.webm"));
    assert!(staging.frame_image_pattern().ends_with("frame-%d.png"));
    assert_eq!(Staging::segment_file_name(FrameIndex(12)), "frame-12.webm");
}
