use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use indicatif::ProgressBar;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::extractor::{self, VideoInfo};
use crate::options::MediaFormat;
use crate::progress::{self, PROGRESS_TEMPLATE};

const FILEPATH_MARK: &str = "FILEPATH|";

/// Where and how one URL should be written
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Output path without extension; the downloader picks the extension
    pub stem: PathBuf,
    pub format: MediaFormat,
}

/// External media download backend
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Read title, uploader and id without downloading
    async fn probe(&self, url: &str) -> Result<VideoInfo>;

    /// Download and convert, returning the path of the finished file
    async fn fetch(&self, url: &str, plan: &FetchPlan, bar: &ProgressBar) -> Result<PathBuf>;
}

/// `yt-dlp` executable driven as a subprocess
pub struct YtDlp {
    program: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: PathBuf, ffmpeg_location: Option<PathBuf>) -> Self {
        Self {
            program,
            ffmpeg_location,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        if e.kind() == ErrorKind::NotFound {
            Error::ToolNotFound(self.program.display().to_string())
        } else {
            Error::Io(e)
        }
    }

    /// Arguments for a download, excluding the program name
    pub fn fetch_args(&self, url: &str, plan: &FetchPlan) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--no-playlist".into(),
            "--continue".into(),
            "--no-warnings".into(),
            "--newline".into(),
            "--progress".into(),
            "--progress-template".into(),
            PROGRESS_TEMPLATE.into(),
            "--print".into(),
            format!("after_move:{}%(filepath)s", FILEPATH_MARK),
            "-o".into(),
            output_template(&plan.stem),
        ];

        args.extend(format_args(&plan.format));

        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.display().to_string());
        }

        args.push("--".into());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn probe(&self, url: &str) -> Result<VideoInfo> {
        debug!("probing {}", url);

        let output = self
            .command()
            .args(["--dump-single-json", "--no-playlist", "--no-warnings", "--", url])
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(Error::ProbeFailed(last_error_line(&output.stderr)));
        }

        extractor::parse_info(&output.stdout)
    }

    async fn fetch(&self, url: &str, plan: &FetchPlan, bar: &ProgressBar) -> Result<PathBuf> {
        let args = self.fetch_args(url, plan);
        debug!("running {} {}", self.program.display(), args.join(" "));

        let mut child = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::DownloadFailed("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::DownloadFailed("stderr not captured".to_string()))?;

        // Quiet mode can route progress lines to stderr, so both streams are watched.
        let stderr_bar = bar.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(update) = progress::parse_progress_line(&line) {
                    progress::render(&stderr_bar, &update);
                    continue;
                }
                debug!("yt-dlp stderr: {}", line);
                collected.extend_from_slice(line.as_bytes());
                collected.push(b'\n');
            }
            collected
        });

        let mut final_path = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(update) = progress::parse_progress_line(&line) {
                progress::render(bar, &update);
            } else if let Some(path) = line.strip_prefix(FILEPATH_MARK) {
                final_path = Some(PathBuf::from(path.trim()));
            } else {
                debug!("yt-dlp: {}", line);
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(Error::DownloadFailed(last_error_line(&stderr)));
        }

        bar.set_position(100);
        final_path.ok_or_else(|| Error::DownloadFailed("yt-dlp did not report an output file".to_string()))
    }
}

/// `-o` template for a stem; `%` is literal in titles so it gets escaped.
pub fn output_template(stem: &Path) -> String {
    format!("{}.%(ext)s", stem.display().to_string().replace('%', "%%"))
}

/// Format selection and post-processing arguments
pub fn format_args(format: &MediaFormat) -> Vec<String> {
    match format {
        MediaFormat::Audio { codec, quality } => vec![
            "-f".into(),
            "bestaudio/best".into(),
            "-x".into(),
            "--audio-format".into(),
            codec.ytdlp_format().into(),
            "--audio-quality".into(),
            format!("{}K", quality.kbps()),
        ],
        MediaFormat::Video {
            container,
            resolution,
        } => {
            let h = resolution.height();
            vec![
                "-f".into(),
                format!("bv*[height<={h}]+ba/b[height<={h}]/b"),
                "--merge-output-format".into(),
                container.extension().into(),
            ]
        }
    }
}

fn last_error_line(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "yt-dlp exited with an error".to_string())
}
