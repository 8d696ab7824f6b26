use std::path::{Path, PathBuf};

const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Strip characters that are not allowed in filenames
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

/// Filename stem for a download, e.g. `Song Title [320kbps]`.
///
/// Falls back to the video id when the title sanitizes to nothing.
pub fn output_stem(title: &str, video_id: &str, quality_tag: &str) -> String {
    let safe = sanitize_filename(title);
    let base = if safe.trim().is_empty() {
        sanitize_filename(video_id)
    } else {
        safe.trim().to_string()
    };
    format!("{} [{}]", base, quality_tag)
}

/// First path among `stem.ext`, `stem (1).ext`, `stem (2).ext`, ... that does
/// not exist in `folder` and is not `taken`.
pub fn unique_path(folder: &Path, stem: &str, ext: &str, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let is_free = |p: &Path| !p.exists() && !taken(p);

    let candidate = folder.join(format!("{}.{}", stem, ext));
    if is_free(&candidate) {
        return candidate;
    }

    let mut counter: u32 = 1;
    loop {
        let candidate = folder.join(format!("{} ({}).{}", stem, counter, ext));
        if is_free(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
