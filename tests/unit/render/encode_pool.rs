use std::{
    collections::BTreeSet,
    path::Path,
    sync::Mutex,
};

use super::*;
use crate::media::tools::MediaInfo;

/// Writes a marker file per segment and records which indices were encoded.
#[derive(Default)]
struct MarkerTools {
    encoded: Mutex<Vec<FrameIndex>>,
    fail_on: Option<FrameIndex>,
    skip_write: Option<FrameIndex>,
}

impl MediaTools for MarkerTools {
    fn probe(&self, _input: &Path) -> DynresResult<MediaInfo> {
        unreachable!("not used by the pool")
    }

    fn extract_frames(&self, _input: &Path, _fps: Fps, _pattern: &Path) -> DynresResult<()> {
        unreachable!("not used by the pool")
    }

    fn encode_segment(&self, job: &SegmentJob) -> DynresResult<()> {
        if self.fail_on == Some(job.index) {
            return Err(DynresError::external_tool("ffmpeg", "exit status: 1"));
        }
        if self.skip_write != Some(job.index) {
            std::fs::write(&job.segment, format!("{}", job.index.0)).unwrap();
        }
        self.encoded.lock().unwrap().push(job.index);
        Ok(())
    }

    fn concat_segments(&self, _list: &Path, _out: &Path) -> DynresResult<()> {
        unreachable!("not used by the pool")
    }

    fn extract_audio(&self, _input: &Path, _out: &Path) -> DynresResult<()> {
        unreachable!("not used by the pool")
    }

    fn mux_audio(&self, _video: &Path, _audio: &Path, _out: &Path) -> DynresResult<()> {
        unreachable!("not used by the pool")
    }
}

fn staged(n: u64) -> (tempfile::TempDir, Staging, Vec<FrameIndex>) {
    let dir = tempfile::tempdir().unwrap();
    let staging = Staging::create(dir.path().join("staging")).unwrap();
    let indices: Vec<FrameIndex> = (0..n).map(FrameIndex).collect();
    for &i in &indices {
        std::fs::write(staging.frame_image(i), b"png").unwrap();
    }
    (dir, staging, indices)
}

fn segment_files(staging: &Staging) -> BTreeSet<String> {
    std::fs::read_dir(staging.root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".webm"))
        .collect()
}

fn fps() -> Fps {
    Fps::new(30, 1).unwrap()
}

#[test]
fn sequential_encodes_in_ascending_order() {
    let (_dir, staging, indices) = staged(5);
    let tools = MarkerTools::default();
    let pool = EncodePool::new(&EncodeMode::Sequential).unwrap();
    let stats = pool
        .encode_segments(&tools, &staging, &indices, fps(), false, &CancellationToken::new())
        .unwrap();
    assert_eq!(stats.segments_encoded, 5);
    assert_eq!(*tools.encoded.lock().unwrap(), indices);
}

#[test]
fn parallel_and_sequential_produce_same_segment_set() {
    let (_d1, seq_staging, indices) = staged(32);
    let (_d2, par_staging, _) = staged(32);

    let seq_tools = MarkerTools::default();
    EncodePool::new(&EncodeMode::Sequential)
        .unwrap()
        .encode_segments(&seq_tools, &seq_staging, &indices, fps(), true, &CancellationToken::new())
        .unwrap();

    let par_tools = MarkerTools::default();
    EncodePool::new(&EncodeMode::Parallel { threads: Some(4) })
        .unwrap()
        .encode_segments(&par_tools, &par_staging, &indices, fps(), true, &CancellationToken::new())
        .unwrap();

    assert_eq!(segment_files(&seq_staging), segment_files(&par_staging));
    assert_eq!(segment_files(&par_staging).len(), 32);

    let mut par_encoded = par_tools.encoded.lock().unwrap().clone();
    par_encoded.sort();
    assert_eq!(par_encoded, indices, "each index encoded exactly once");
}

#[test]
fn one_failure_fails_the_whole_pass() {
    let (_dir, staging, indices) = staged(8);
    let tools = MarkerTools {
        fail_on: Some(FrameIndex(3)),
        ..MarkerTools::default()
    };
    for mode in [EncodeMode::Sequential, EncodeMode::Parallel { threads: Some(2) }] {
        let err = EncodePool::new(&mode)
            .unwrap()
            .encode_segments(&tools, &staging, &indices, fps(), false, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, DynresError::ExternalToolFailure { .. }));
    }
}

#[test]
fn missing_still_is_reported_before_encoding() {
    let (_dir, staging, mut indices) = staged(2);
    indices.push(FrameIndex(7));
    let tools = MarkerTools::default();
    let err = EncodePool::new(&EncodeMode::Sequential)
        .unwrap()
        .encode_segments(&tools, &staging, &indices, fps(), false, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        DynresError::MissingFrame {
            index: FrameIndex(7),
            ..
        }
    ));
}

#[test]
fn segment_not_written_is_missing_frame() {
    let (_dir, staging, indices) = staged(3);
    let tools = MarkerTools {
        skip_write: Some(FrameIndex(1)),
        ..MarkerTools::default()
    };
    let err = EncodePool::new(&EncodeMode::Parallel { threads: Some(2) })
        .unwrap()
        .encode_segments(&tools, &staging, &indices, fps(), false, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        DynresError::MissingFrame {
            index: FrameIndex(1),
            ..
        }
    ));
}

#[test]
fn sequential_mode_stops_on_interrupt() {
    let (_dir, staging, indices) = staged(4);
    let tools = MarkerTools::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = EncodePool::new(&EncodeMode::Sequential)
        .unwrap()
        .encode_segments(&tools, &staging, &indices, fps(), false, &cancel)
        .unwrap_err();
    assert!(matches!(err, DynresError::Interrupted));
    assert!(tools.encoded.lock().unwrap().is_empty());
}

#[test]
fn parallel_mode_drains_before_honouring_interrupt() {
    let (_dir, staging, indices) = staged(6);
    let tools = MarkerTools::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = EncodePool::new(&EncodeMode::Parallel { threads: Some(3) })
        .unwrap()
        .encode_segments(&tools, &staging, &indices, fps(), false, &cancel)
        .unwrap_err();
    assert!(matches!(err, DynresError::Interrupted));
    assert_eq!(tools.encoded.lock().unwrap().len(), 6);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(EncodePool::new(&EncodeMode::Parallel { threads: Some(0) }).is_err());
}
