#[macro_use]
extern crate log;

mod banner;
mod batch;
mod error;
mod extractor;
mod journal;
mod naming;
mod options;
mod progress;
mod prompt;
mod tagger;
#[cfg(test)]
mod test_support;
mod ytdlp;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use console::style;
use url::Url;

use batch::{BatchContext, Settings};
use error::{Error, Result};
use journal::EventLog;
use options::{AudioCodec, AudioQuality, MediaFormat, Menu, Mode, Resolution, VideoContainer};
use progress::Reporter;
use prompt::Prompter;
use ytdlp::YtDlp;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Parser, Debug, Clone)]
#[command(name = "ytgrab")]
#[command(version = "0.1.0")]
#[command(about = "Download YouTube audio or video and tag the result", long_about = None)]
struct Args {
    /// YouTube URLs, space or comma separated (prompted for when omitted)
    urls: Vec<String>,

    /// Output folder (prompted for when omitted)
    #[arg(short = 'O', long)]
    output_dir: Option<PathBuf>,

    /// audio or video (or menu key 1-2)
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Audio format (mp3, aac, flac, wav) or video format (mp4, mkv, webm)
    #[arg(short, long)]
    codec: Option<String>,

    /// Audio bitrate: 128kbps, 192kbps, 256kbps, 320kbps (or menu key 1-4)
    #[arg(short, long)]
    quality: Option<AudioQuality>,

    /// Video resolution: 1080p, 1440p, 2160p, 4320p (or menu key 1-4)
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Number of concurrent downloads
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// File that receives one line per download event
    #[arg(long, default_value = "ytgrab.log")]
    log_file: PathBuf,

    /// yt-dlp executable to run
    #[arg(long = "yt-dlp", default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Directory or binary of ffmpeg, passed through to yt-dlp
    #[arg(long)]
    ffmpeg_location: Option<PathBuf>,

    /// Skip writing tags into audio files
    #[arg(long)]
    no_tags: bool,

    /// Save the thumbnail as <video id>.jpg (any mode, with or without tags)
    #[arg(long)]
    keep_thumbnails: bool,

    #[arg(long, default_value = tagger::DEFAULT_THUMBNAIL_BASE, hide = true)]
    thumbnail_base: Url,

    /// Be quiet (minimal output)
    #[arg(long)]
    quiet: bool,
}

/// Answers gathered from flags and prompts
struct Request {
    output_dir: PathBuf,
    format: MediaFormat,
    urls: Vec<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run().await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        banner::print_banner();
    }

    let request = {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        collect_request(&args, &mut prompter)?
    };

    std::fs::create_dir_all(&request.output_dir).with_context(|| {
        format!("could not create output folder {}", request.output_dir.display())
    })?;

    let log = EventLog::open(&args.log_file)
        .with_context(|| format!("could not open log file {}", args.log_file.display()))?;

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

    let settings = Settings {
        output_dir: request.output_dir,
        format: request.format,
        tag_audio: !args.no_tags,
        keep_thumbnails: args.keep_thumbnails,
        thumbnail_base: args.thumbnail_base.clone(),
        jobs: args.jobs,
    };
    let ctx = Arc::new(BatchContext::new(
        YtDlp::new(args.yt_dlp.clone(), args.ffmpeg_location.clone()),
        client,
        settings,
        log,
        Reporter::new(args.quiet),
    ));

    let summary = batch::run_batch(ctx, request.urls).await;

    if !args.quiet && summary.tagged > 0 {
        println!(
            "{} {} file(s) tagged",
            style("[ytgrab]").cyan().bold(),
            style(summary.tagged).green()
        );
    }

    Ok(())
}

fn collect_request<R: BufRead, W: Write>(args: &Args, prompter: &mut Prompter<R, W>) -> Result<Request> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => prompter.output_folder()?,
    };

    let mode = match args.mode {
        Some(mode) => mode,
        None => prompter.choose()?,
    };

    let format = match mode {
        Mode::Audio => {
            let codec = match &args.codec {
                Some(c) => c.parse::<AudioCodec>()?,
                None => prompter.choose()?,
            };
            let quality = match args.quality {
                Some(q) => q,
                None => prompter.choose()?,
            };
            MediaFormat::Audio { codec, quality }
        }
        Mode::Video => {
            let container = match &args.codec {
                Some(c) => c.parse::<VideoContainer>()?,
                None => prompter.choose()?,
            };
            let resolution = match args.resolution {
                Some(r) => r,
                None => prompter.choose()?,
            };
            MediaFormat::Video {
                container,
                resolution,
            }
        }
    };

    if mode == Mode::Audio && args.resolution.is_some() {
        warn!("--resolution has no effect in {} mode", mode.name());
    }
    if mode == Mode::Video && args.quality.is_some() {
        warn!("--quality has no effect in {} mode", mode.name());
    }

    let (mut urls, rejected) = extractor::split_urls(&args.urls.join(","));
    for url in rejected {
        eprintln!("{} {}", style("Skipping:").yellow(), Error::InvalidUrl(url));
    }
    if urls.is_empty() {
        urls = prompter.urls()?;
    }

    Ok(Request {
        output_dir,
        format,
        urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_everything_prompted() {
        let args = Args::parse_from(["ytgrab"]);
        let mut p = prompter("\n1\n1\n4\nhttps://youtu.be/dQw4w9WgXcQ\n");
        let request = collect_request(&args, &mut p).unwrap();

        assert_eq!(request.output_dir, PathBuf::from("downloads"));
        assert_eq!(
            request.format,
            MediaFormat::Audio {
                codec: AudioCodec::Mp3,
                quality: AudioQuality::Kbps320
            }
        );
        assert_eq!(request.urls, vec!["https://youtu.be/dQw4w9WgXcQ"]);
    }

    #[test]
    fn test_flags_skip_prompts() {
        let args = Args::parse_from([
            "ytgrab",
            "-O",
            "out",
            "--mode",
            "video",
            "--codec",
            "mkv",
            "--resolution",
            "4",
            "https://youtu.be/a,https://vimeo.com/b",
            "https://www.youtube.com/watch?v=c",
        ]);
        let mut p = prompter("");
        let request = collect_request(&args, &mut p).unwrap();

        assert_eq!(request.output_dir, PathBuf::from("out"));
        assert_eq!(
            request.format,
            MediaFormat::Video {
                container: VideoContainer::Mkv,
                resolution: Resolution::P4320
            }
        );
        assert_eq!(
            request.urls,
            vec!["https://youtu.be/a", "https://www.youtube.com/watch?v=c"]
        );
    }

    #[test]
    fn test_codec_must_match_mode() {
        let args = Args::parse_from(["ytgrab", "-O", "out", "-m", "audio", "-c", "mkv"]);
        let mut p = prompter("");
        assert!(matches!(
            collect_request(&args, &mut p),
            Err(Error::InvalidChoice(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ytgrab"]);
        assert_eq!(args.jobs, 1);
        assert_eq!(args.log_file, PathBuf::from("ytgrab.log"));
        assert_eq!(args.thumbnail_base.as_str(), tagger::DEFAULT_THUMBNAIL_BASE);
        assert!(Args::try_parse_from(["ytgrab", "--quality", "9"]).is_err());
    }
}
