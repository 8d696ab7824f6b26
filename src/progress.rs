use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Marker at the start of yt-dlp progress lines
pub const PROGRESS_MARK: &str = "PROGRESS|";

/// `--progress-template` value that yields lines `parse_progress_line` reads
pub const PROGRESS_TEMPLATE: &str =
    "download:PROGRESS|%(progress._percent_str)s|%(progress._eta_str)s";

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f64,
    pub eta: Option<String>,
}

/// Parse one `PROGRESS|<percent>|<eta>` line
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim().strip_prefix(PROGRESS_MARK)?;
    let mut parts = rest.splitn(2, '|');

    let percent = parts
        .next()?
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()?
        .clamp(0.0, 100.0);

    let eta = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "NA" && *s != "Unknown")
        .map(str::to_string);

    Some(ProgressUpdate { percent, eta })
}

/// Terminal output shared by every job in a batch
pub struct Reporter {
    multi: MultiProgress,
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self { multi, quiet }
    }

    /// A percent bar for one download
    pub fn bar(&self, prefix: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(100));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% (ETA {msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb.set_prefix(prefix.to_string());
        pb.set_message("--:--");
        pb
    }

    /// Print a line above any active bars
    pub fn line(&self, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        self.multi.suspend(|| println!("{}", message.as_ref()));
    }
}

/// Apply an update to a bar
pub fn render(bar: &ProgressBar, update: &ProgressUpdate) {
    bar.set_position(update.percent.round() as u64);
    bar.set_message(update.eta.clone().unwrap_or_else(|| "--:--".to_string()));
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
