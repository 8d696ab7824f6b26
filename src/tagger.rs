use std::path::{Path, PathBuf};

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use metaflac::block::PictureType as FlacPictureType;
use mp4ameta::Img;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi/";
pub const ALBUM: &str = "YouTube Download";

const JPEG: &str = "image/jpeg";

/// Tag values written into a finished audio file
#[derive(Debug, Clone)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover: Option<Vec<u8>>,
}

impl TrackTags {
    pub fn new(title: &str, artist: &str, cover: Option<Vec<u8>>) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: ALBUM.to_string(),
            cover,
        }
    }
}

/// Full-size thumbnail location for a video id
pub fn thumbnail_url(base: &Url, video_id: &str) -> Result<Url> {
    base.join(&format!("{}/maxresdefault.jpg", video_id))
        .map_err(|e| Error::InvalidUrl(format!("thumbnail for {}: {}", video_id, e)))
}

/// Fetch the thumbnail image.
///
/// Any non-success status or transport error means "no thumbnail".
pub async fn fetch_thumbnail(client: &reqwest::Client, base: &Url, video_id: &str) -> Option<Vec<u8>> {
    match download_thumbnail(client, base, video_id).await {
        Ok(data) => data,
        Err(e) => {
            debug!("no thumbnail for {}: {}", video_id, e);
            None
        }
    }
}

/// `Ok(None)` for a non-success status or an empty body
async fn download_thumbnail(client: &reqwest::Client, base: &Url, video_id: &str) -> Result<Option<Vec<u8>>> {
    let url = thumbnail_url(base, video_id)?;
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        debug!("thumbnail {} returned HTTP {}", url, response.status());
        return Ok(None);
    }

    let bytes = response.bytes().await?;
    Ok(Some(bytes.to_vec()).filter(|b| !b.is_empty()))
}

/// Keep a copy of the thumbnail as `<id>.jpg` in `dir`
pub async fn save_thumbnail(dir: &Path, video_id: &str, data: &[u8]) -> Result<PathBuf> {
    let path = dir.join(format!("{}.jpg", video_id));
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Write title, artist, album and optional cover into a finished audio file.
///
/// The tag format follows the extension: a fresh ID3v2.4 tag for MP3 (leading
/// tag) and WAV (`id3 ` chunk), Vorbis comments plus a PICTURE block for FLAC,
/// and iTunes-style atoms for M4A. Existing values of these fields and any
/// front cover are replaced.
pub fn write_tags(path: &Path, tags: &TrackTags) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => id3_tag(tags).write_to_path(path, Version::Id3v24)?,
        "wav" => id3_tag(tags).write_to_wav_path(path, Version::Id3v24)?,
        "flac" => write_flac(path, tags)?,
        "m4a" => write_mp4(path, tags)?,
        _ => return Err(Error::TaggingUnsupported(ext)),
    }

    Ok(())
}

fn id3_tag(tags: &TrackTags) -> Tag {
    let mut tag = Tag::new();
    tag.set_title(tags.title.as_str());
    tag.set_artist(tags.artist.as_str());
    tag.set_album(tags.album.as_str());

    if let Some(cover) = &tags.cover {
        tag.add_frame(Picture {
            mime_type: JPEG.to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: cover.clone(),
        });
    }
    tag
}

fn write_flac(path: &Path, tags: &TrackTags) -> Result<()> {
    let mut tag = metaflac::Tag::read_from_path(path)?;
    tag.set_vorbis("TITLE", vec![tags.title.as_str()]);
    tag.set_vorbis("ARTIST", vec![tags.artist.as_str()]);
    tag.set_vorbis("ALBUM", vec![tags.album.as_str()]);

    tag.remove_picture_type(FlacPictureType::CoverFront);
    if let Some(cover) = &tags.cover {
        tag.add_picture(JPEG, FlacPictureType::CoverFront, cover.clone());
    }

    tag.write_to_path(path)?;
    Ok(())
}

fn write_mp4(path: &Path, tags: &TrackTags) -> Result<()> {
    let mut tag = mp4ameta::Tag::read_from_path(path)?;
    tag.set_title(tags.title.as_str());
    tag.set_artist(tags.artist.as_str());
    tag.set_album(tags.album.as_str());

    tag.remove_artworks();
    if let Some(cover) = &tags.cover {
        tag.set_artwork(Img::jpeg(cover.clone()));
    }

    tag.write_to_path(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flac_bytes, mp3_bytes, refused_base, serve_once};

    fn fake_mp3(path: &Path) {
        std::fs::write(path, mp3_bytes()).unwrap();
    }

    fn vorbis(tag: &metaflac::Tag, key: &str) -> Option<String> {
        tag.get_vorbis(key).and_then(|mut v| v.next()).map(str::to_string)
    }

    #[test]
    fn test_thumbnail_url() {
        let base = Url::parse(DEFAULT_THUMBNAIL_BASE).unwrap();
        assert_eq!(
            thumbnail_url(&base, "dQw4w9WgXcQ").unwrap().as_str(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[test]
    fn test_thumbnail_url_rejects_unjoinable_base() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(thumbnail_url(&base, "abc"), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_thumbnail_ok() {
        let base = serve_once("200 OK", b"\xFF\xD8\xFFjpeg-bytes").await;
        let client = reqwest::Client::new();
        let data = fetch_thumbnail(&client, &base, "abc").await;
        assert_eq!(data.as_deref(), Some(&b"\xFF\xD8\xFFjpeg-bytes"[..]));
    }

    #[tokio::test]
    async fn test_fetch_thumbnail_not_found() {
        let base = serve_once("404 Not Found", b"").await;
        let client = reqwest::Client::new();
        assert!(fetch_thumbnail(&client, &base, "abc").await.is_none());
    }

    #[tokio::test]
    async fn test_connection_error_is_http_error() {
        let base = refused_base();
        let client = reqwest::Client::new();

        let result = download_thumbnail(&client, &base, "abc").await;
        assert!(matches!(result, Err(Error::Http(_))));
        assert!(fetch_thumbnail(&client, &base, "abc").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_thumbnail_tags_without_cover() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        fake_mp3(&file);

        let base = serve_once("404 Not Found", b"").await;
        let client = reqwest::Client::new();
        let cover = fetch_thumbnail(&client, &base, "abc").await;

        write_tags(&file, &TrackTags::new("Title", "Uploader", cover)).unwrap();

        let tag = Tag::read_from_path(&file).unwrap();
        assert_eq!(tag.title(), Some("Title"));
        assert_eq!(tag.artist(), Some("Uploader"));
        assert_eq!(tag.album(), Some(ALBUM));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[test]
    fn test_write_tags_with_cover_replaces_old_frames() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        fake_mp3(&file);

        let mut old = Tag::new();
        old.set_title("Old title");
        old.set_genre("Old genre");
        old.write_to_path(&file, Version::Id3v24).unwrap();

        let cover = vec![0xFF, 0xD8, 0xFF, 0xE0];
        write_tags(&file, &TrackTags::new("New title", "Someone", Some(cover.clone()))).unwrap();

        let tag = Tag::read_from_path(&file).unwrap();
        assert_eq!(tag.title(), Some("New title"));
        assert_eq!(tag.genre(), None);

        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
        assert_eq!(pictures[0].data, cover);
    }

    #[test]
    fn test_write_flac_tags() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.flac");
        std::fs::write(&file, flac_bytes()).unwrap();

        write_tags(&file, &TrackTags::new("Old title", "Old artist", Some(vec![1, 2, 3]))).unwrap();
        let cover = vec![0xFF, 0xD8, 0xFF, 0xE0];
        write_tags(&file, &TrackTags::new("New title", "Someone", Some(cover.clone()))).unwrap();

        let tag = metaflac::Tag::read_from_path(&file).unwrap();
        assert_eq!(vorbis(&tag, "TITLE").as_deref(), Some("New title"));
        assert_eq!(vorbis(&tag, "ARTIST").as_deref(), Some("Someone"));
        assert_eq!(vorbis(&tag, "ALBUM").as_deref(), Some(ALBUM));

        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
        assert_eq!(pictures[0].data, cover);

        // the audio frames after the metadata blocks survive
        assert!(std::fs::read(&file).unwrap().ends_with(&[0xFF, 0xF8, 0x00, 0x00]));
    }

    #[test]
    fn test_write_tags_rejects_broken_m4a() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.m4a");
        std::fs::write(&file, b"not an mp4 file").unwrap();

        let result = write_tags(&file, &TrackTags::new("t", "a", None));
        assert!(matches!(result, Err(Error::Mp4(_))));
    }

    #[test]
    fn test_write_tags_unsupported_container() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.opus");
        std::fs::write(&file, b"OggS").unwrap();

        let result = write_tags(&file, &TrackTags::new("t", "a", None));
        assert!(matches!(result, Err(Error::TaggingUnsupported(ext)) if ext == "opus"));
    }

    #[tokio::test]
    async fn test_save_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_thumbnail(dir.path(), "abc", b"jpeg").await.unwrap();
        assert_eq!(path, dir.path().join("abc.jpg"));
        assert_eq!(std::fs::read(path).unwrap(), b"jpeg");
    }
}
