use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use console::style;
use futures::stream::{self, StreamExt};
use url::Url;

use crate::error::{Error, Result};
use crate::extractor::VideoInfo;
use crate::journal::EventLog;
use crate::naming;
use crate::options::MediaFormat;
use crate::progress::{format_size, Reporter};
use crate::tagger::{self, TrackTags};
use crate::ytdlp::{FetchPlan, MediaFetcher};

pub const MAX_JOBS: usize = 10;

/// Settings that apply to every URL in a batch
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub format: MediaFormat,
    pub tag_audio: bool,
    pub keep_thumbnails: bool,
    pub thumbnail_base: Url,
    pub jobs: usize,
}

/// Everything a batch needs, shared between its jobs
pub struct BatchContext<F> {
    pub fetcher: F,
    pub client: reqwest::Client,
    pub settings: Settings,
    pub log: EventLog,
    pub reporter: Reporter,
    /// Output paths handed to jobs that are still downloading
    reserved: Mutex<HashSet<PathBuf>>,
}

impl<F> BatchContext<F> {
    pub fn new(fetcher: F, client: reqwest::Client, settings: Settings, log: EventLog, reporter: Reporter) -> Self {
        Self {
            fetcher,
            client,
            settings,
            log,
            reporter,
            reserved: Mutex::new(HashSet::new()),
        }
    }

    /// Pick a free output path for `stem` that no other job in this batch holds.
    ///
    /// The path stays claimed for the rest of the batch, so concurrent jobs
    /// with the same title get numbered names before either file exists.
    fn reserve_path(&self, stem: &str) -> PathBuf {
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        let path = naming::unique_path(
            &self.settings.output_dir,
            stem,
            self.settings.format.extension(),
            |p| reserved.contains(p),
        );
        reserved.insert(path.clone());
        path
    }

    fn release_path(&self, path: &Path) {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }
}

#[derive(Debug)]
pub enum Outcome {
    Downloaded { tagged: bool },
    Failed,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub tagged: usize,
}

/// Download every URL, at most `jobs` at a time.
///
/// A failing URL is logged and skipped; it never stops the batch.
pub async fn run_batch<F: MediaFetcher + 'static>(
    ctx: Arc<BatchContext<F>>,
    urls: Vec<String>,
) -> BatchSummary {
    let total = urls.len();
    let jobs = ctx.settings.jobs.clamp(1, MAX_JOBS);

    ctx.reporter.line(format!(
        "{} Processing {} URL(s) as {} with {} concurrent job(s)",
        style("[ytgrab]").cyan().bold(),
        style(total).yellow(),
        style(ctx.settings.format.mode()).yellow(),
        style(jobs).yellow()
    ));

    let outcomes: Vec<Outcome> = stream::iter(urls.into_iter().enumerate())
        .map(|(idx, url)| {
            let ctx = ctx.clone();
            async move { process_url(&ctx, &url, idx + 1).await }
        })
        .buffered(jobs)
        .collect()
        .await;

    let mut summary = BatchSummary::default();
    for outcome in &outcomes {
        match outcome {
            Outcome::Downloaded { tagged } => {
                summary.succeeded += 1;
                if *tagged {
                    summary.tagged += 1;
                }
            }
            Outcome::Failed => summary.failed += 1,
        }
    }

    ctx.reporter.line(format!(
        "\n{} Batch complete: {} succeeded, {} failed",
        style("[ytgrab]").cyan().bold(),
        style(summary.succeeded).green(),
        if summary.failed > 0 {
            style(summary.failed).red()
        } else {
            style(summary.failed).dim()
        }
    ));
    ctx.log.record(&format!(
        "Batch complete: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    ));

    summary
}

async fn process_url<F: MediaFetcher>(ctx: &BatchContext<F>, url: &str, index: usize) -> Outcome {
    let prefix = format!("[{}]", index);

    let (path, info) = match download(ctx, url, &prefix).await {
        Ok(done) => done,
        Err(e) => {
            ctx.reporter.line(format!(
                "{} {} Failed {}: {}",
                style("[ytgrab]").red().bold(),
                prefix,
                url,
                e
            ));
            ctx.log.record(&format!("FAILED: {}: {}", url, e));
            return Outcome::Failed;
        }
    };

    let size = std::fs::metadata(&path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());
    ctx.reporter.line(format!(
        "{} {} Downloaded: {} ({})",
        style("[ytgrab]").cyan().bold(),
        prefix,
        style(path.display()).yellow(),
        size
    ));
    ctx.log.record(&format!("SUCCESS: {} -> {}", url, path.display()));

    let settings = &ctx.settings;
    let will_tag = settings.tag_audio && settings.format.is_taggable();

    let cover = if will_tag || settings.keep_thumbnails {
        tagger::fetch_thumbnail(&ctx.client, &settings.thumbnail_base, &info.id).await
    } else {
        None
    };

    if settings.keep_thumbnails {
        keep_thumbnail(ctx, &info.id, cover.as_deref()).await;
    }

    let tagged = if will_tag {
        tag(ctx, &path, &info, cover, &prefix).await
    } else {
        debug!("not tagging {}", path.display());
        false
    };

    Outcome::Downloaded { tagged }
}

async fn download<F: MediaFetcher>(
    ctx: &BatchContext<F>,
    url: &str,
    prefix: &str,
) -> Result<(PathBuf, VideoInfo)> {
    let info = ctx.fetcher.probe(url).await?;

    let stem = naming::output_stem(&info.title, &info.id, ctx.settings.format.quality_tag());
    let target = ctx.reserve_path(&stem);
    let stem_path = target.with_extension("");
    debug!("{} will be written to {}", url, target.display());

    let plan = FetchPlan {
        stem: stem_path,
        format: ctx.settings.format,
    };

    let bar = ctx.reporter.bar(prefix);
    let result = ctx.fetcher.fetch(url, &plan, &bar).await;
    bar.finish_and_clear();

    match result {
        Ok(path) => Ok((path, info)),
        Err(e) => {
            ctx.release_path(&target);
            Err(e)
        }
    }
}

async fn keep_thumbnail<F>(ctx: &BatchContext<F>, video_id: &str, cover: Option<&[u8]>) {
    let Some(data) = cover else {
        debug!("no thumbnail to keep for {}", video_id);
        return;
    };

    if let Err(e) = tagger::save_thumbnail(&ctx.settings.output_dir, video_id, data).await {
        warn!("could not save thumbnail for {}: {}", video_id, e);
    }
}

async fn tag<F: MediaFetcher>(
    ctx: &BatchContext<F>,
    path: &Path,
    info: &VideoInfo,
    cover: Option<Vec<u8>>,
    prefix: &str,
) -> bool {
    let has_cover = cover.is_some();
    let tags = TrackTags::new(&info.title, info.artist(), cover);
    let target = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || tagger::write_tags(&target, &tags)).await;

    match result {
        Ok(Ok(())) => {
            ctx.reporter.line(format!(
                "{} {} Metadata updated: {} - {} ({}){}",
                style("[ytgrab]").cyan().bold(),
                prefix,
                info.title,
                info.artist(),
                tagger::ALBUM,
                if has_cover { "" } else { " without cover art" }
            ));
            ctx.log.record(&format!("TAGGED: {}", path.display()));
            true
        }
        Ok(Err(e @ Error::TaggingUnsupported(_))) => {
            ctx.reporter.line(format!(
                "{} {} Metadata not written: {}",
                style("[ytgrab]").yellow().bold(),
                prefix,
                e
            ));
            ctx.log.record(&format!("TAG SKIPPED: {}: {}", path.display(), e));
            false
        }
        Ok(Err(e)) => {
            tag_failed(ctx, path, prefix, &e.to_string());
            false
        }
        Err(e) => {
            tag_failed(ctx, path, prefix, &e.to_string());
            false
        }
    }
}

fn tag_failed<F>(ctx: &BatchContext<F>, path: &Path, prefix: &str, reason: &str) {
    ctx.reporter.line(format!(
        "{} {} Failed to update metadata: {}",
        style("[ytgrab]").yellow().bold(),
        prefix,
        reason
    ));
    ctx.log.record(&format!("TAG FAILED: {}: {}", path.display(), reason));
}
