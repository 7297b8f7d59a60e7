//! Downloads template images to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::{
    DEFAULT_DOWNLOAD_FILENAME, DOWNLOAD_CHUNK_SIZE, NO_IMAGE_SENTINEL,
    RECOGNIZED_IMAGE_EXTENSIONS,
};
use crate::error::MemeError;

/// Builds the HTTP client used for image downloads. Connects and individual
/// reads are bounded by `timeout`; the total transfer is not.
pub fn download_client(timeout: Duration) -> Result<reqwest::Client, MemeError> {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(MemeError::from)
}

/// Works out the local filename for an image URL.
pub fn filename_for_url(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let mut filename = if basename.is_empty() {
        DEFAULT_DOWNLOAD_FILENAME.to_string()
    } else {
        basename.to_string()
    };

    let lowered = filename.to_ascii_lowercase();
    if !RECOGNIZED_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lowered.ends_with(ext))
    {
        filename.push_str(".jpg");
    }
    filename
}

/// Downloads `image_url` into `save_dir`, streaming the body to disk.
///
/// Returns the path written to, which is `save_dir` joined with the derived
/// filename. The directory is created if it doesn't exist yet.
pub async fn save_image(
    client: &reqwest::Client,
    image_url: &str,
    save_dir: &Path,
) -> Result<PathBuf, MemeError> {
    if image_url.is_empty() || image_url == NO_IMAGE_SENTINEL {
        warn!("No image URL provided to download");
        return Err(MemeError::MissingImageUrl);
    }

    tokio::fs::create_dir_all(save_dir).await?;

    let url = Url::parse(image_url)?;
    let save_path = save_dir.join(filename_for_url(&url));

    debug!("Downloading {} to {}", url, save_path.display());
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MemeError::UpstreamStatus {
            service: "image download",
            status: status.as_u16(),
            body: String::new(),
        });
    }

    if let Err(err) = stream_to_file(&mut response, &save_path).await {
        if let Err(remove_err) = tokio::fs::remove_file(&save_path).await
            && remove_err.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Failed to clean up partial download {}: {}",
                save_path.display(),
                remove_err
            );
        }
        return Err(err);
    }

    info!("Original image saved to: {}", save_path.display());
    Ok(save_path)
}

async fn stream_to_file(response: &mut reqwest::Response, path: &Path) -> Result<(), MemeError> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    debug!("Wrote {} bytes to {}", written, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> String {
        filename_for_url(&Url::parse(url).expect("parse url"))
    }

    #[test]
    fn basename_is_used() {
        assert_eq!(name("https://i.imgflip.com/30b1gx.jpg"), "30b1gx.jpg");
        assert_eq!(name("https://x/a/b/test.png?size=large"), "test.png");
    }

    #[test]
    fn trailing_slash_falls_back_to_default() {
        assert_eq!(name("https://example.com/images/"), "downloaded_image.jpg");
        assert_eq!(name("https://example.com"), "downloaded_image.jpg");
    }

    #[test]
    fn recognized_extensions_are_kept() {
        assert_eq!(name("https://x/cat.png"), "cat.png");
        assert_eq!(name("https://x/cat.gif"), "cat.gif");
        assert_eq!(name("https://x/cat.jpeg"), "cat.jpeg");
        assert_eq!(name("https://x/cat.JPG"), "cat.JPG");
        assert_eq!(name("https://x/cat.PnG"), "cat.PnG");
    }

    #[test]
    fn other_names_get_jpg_appended() {
        assert_eq!(name("https://x/cat"), "cat.jpg");
        assert_eq!(name("https://x/cat.webp"), "cat.webp.jpg");
    }

    #[tokio::test]
    async fn missing_url_short_circuits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let save_dir = dir.path().join("originals");
        let client = reqwest::Client::new();

        let result = save_image(&client, "", &save_dir).await;
        assert!(matches!(result, Err(MemeError::MissingImageUrl)));
        let result = save_image(&client, NO_IMAGE_SENTINEL, &save_dir).await;
        assert!(matches!(result, Err(MemeError::MissingImageUrl)));
        assert!(!save_dir.exists());
    }

    #[tokio::test]
    async fn connection_refused_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let dir = tempfile::tempdir().expect("tempdir");
        let save_dir = dir.path().join("originals");
        let client = download_client(Duration::from_secs(1)).expect("client");
        let result = save_image(&client, &format!("http://{addr}/test.png"), &save_dir).await;

        assert!(matches!(result, Err(MemeError::Network(_))));
        assert!(save_dir.is_dir());
        assert!(!save_dir.join("test.png").exists());
    }
}
