use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    foundation::{
        core::Fps,
        error::{DynresError, DynresResult},
    },
    media::tools::{MediaInfo, MediaTools, SegmentJob},
};

/// Audio bitrate of the final webm's opus track.
pub const AUDIO_BITRATE: &str = "160k";

pub fn is_ffmpeg_on_path() -> bool {
    tool_responds("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_responds("ffprobe")
}

fn tool_responds(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// [`MediaTools`] backed by the system `ffmpeg` and `ffprobe` binaries.
///
/// We shell out rather than link libav so the crate builds without FFmpeg dev headers.
#[derive(Clone, Debug)]
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Fails early with a readable message when `ffmpeg`/`ffprobe` cannot be run.
    pub fn ensure_available(&self) -> DynresResult<()> {
        for bin in [&self.ffmpeg, &self.ffprobe] {
            if !tool_responds(&bin.to_string_lossy()) {
                return Err(DynresError::external_tool(
                    bin.display().to_string(),
                    "not found on PATH (is it installed?)",
                ));
            }
        }
        Ok(())
    }

    fn ffmpeg_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"]);
        cmd
    }
}

impl MediaTools for FfmpegTools {
    fn probe(&self, input: &Path) -> DynresResult<MediaInfo> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(input);
        let stdout = run_capture(cmd, "ffprobe")?;
        parse_probe_json(&stdout)
    }

    fn extract_frames(&self, input: &Path, fps: Fps, pattern: &Path) -> DynresResult<()> {
        let mut cmd = self.ffmpeg_cmd();
        cmd.arg("-i")
            .arg(input)
            .args([
                "-vf",
                &format!("fps={}", fps.to_ffmpeg_rate()),
                "-start_number",
                "0",
                "-y",
            ])
            .arg(pattern);
        run_capture(cmd, "ffmpeg").map(drop)
    }

    fn encode_segment(&self, job: &SegmentJob) -> DynresResult<()> {
        let mut cmd = self.ffmpeg_cmd();
        cmd.args(["-framerate", &job.fps.to_ffmpeg_rate(), "-f", "image2", "-i"])
            .arg(&job.image)
            .args(["-c:v", "libvpx-vp9"]);
        if job.alpha {
            cmd.args(["-pix_fmt", "yuva420p"]);
        }
        cmd.arg("-y").arg(&job.segment);
        run_capture(cmd, "ffmpeg").map(drop)
    }

    fn concat_segments(&self, list: &Path, out: &Path) -> DynresResult<()> {
        let mut cmd = self.ffmpeg_cmd();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list)
            .args(["-c", "copy", "-y"])
            .arg(out);
        run_capture(cmd, "ffmpeg").map(drop)
    }

    fn extract_audio(&self, input: &Path, out: &Path) -> DynresResult<()> {
        let mut cmd = self.ffmpeg_cmd();
        cmd.arg("-y").arg("-i").arg(input).arg(out);
        run_capture(cmd, "ffmpeg").map(drop)
    }

    fn mux_audio(&self, video: &Path, audio: &Path, out: &Path) -> DynresResult<()> {
        let mut cmd = self.ffmpeg_cmd();
        cmd.arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args([
                "-map",
                "0:V:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                "libopus",
                "-b:a",
                AUDIO_BITRATE,
                "-f",
                "webm",
                "-y",
            ])
            .arg(out);
        run_capture(cmd, "ffmpeg").map(drop)
    }
}

/// Run to completion and return stdout; spawn errors and non-zero exits carry stderr.
fn run_capture(mut cmd: Command, tool: &str) -> DynresResult<Vec<u8>> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group: a terminal Ctrl-C reaches only us, and we decide when to stop.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }

    tracing::debug!(?cmd, "spawn");
    let out = cmd.output().map_err(|e| {
        DynresError::external_tool(tool, format!("failed to spawn (is it installed?): {e}"))
    })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(DynresError::external_tool(
            tool,
            format!("exited with status {}: {}", out.status, stderr.trim()),
        ));
    }
    Ok(out.stdout)
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> DynresResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| DynresError::external_tool("ffprobe", format!("json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| DynresError::invalid_input("no video stream found"))?;

    let width = video
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| DynresError::invalid_input("missing video width from ffprobe"))?;
    let height = video
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| DynresError::invalid_input("missing video height from ffprobe"))?;

    let (num, den) = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .ok_or_else(|| DynresError::invalid_input("invalid video r_frame_rate"))?;
    let fps = Fps::new(num, den)?;

    let duration_sec = video
        .duration
        .as_deref()
        .and_then(parse_duration)
        .or_else(|| {
            parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_duration)
        })
        .ok_or_else(|| DynresError::invalid_input("could not determine video duration"))?;

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        width,
        height,
        fps,
        duration_sec,
        has_audio,
    })
}

fn parse_duration(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0)
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
