//! Input staging: gets every image and the narration onto local disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_stage_core::{ImageLocation, NarrationAudio};
use tempfile::TempDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// Per-request timeout for image downloads unless configured otherwise.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Client used to fetch remote images, bounded by `timeout_secs` per request.
pub fn download_client(timeout_secs: u64) -> MangareelResult<reqwest::Client> {
    let timeout = Duration::from_secs(timeout_secs.max(1));
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
        .build()?;
    Ok(client)
}

/// Local copies of the assembly inputs. The staging directory is removed
/// when this value is dropped.
#[derive(Debug)]
pub struct StagedInputs {
    dir: TempDir,
    pub images: Vec<PathBuf>,
    pub audio: PathBuf,
}

impl StagedInputs {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Download remote images, verify local ones, and write the audio bytes.
pub async fn stage_inputs(
    client: &reqwest::Client,
    images: &[ImageLocation],
    audio: &NarrationAudio,
) -> MangareelResult<StagedInputs> {
    let dir = tempfile::Builder::new().prefix("mangareel-").tempdir()?;

    let mut staged = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = if image.is_remote() {
            download_image(client, image, dir.path(), index).await?
        } else {
            resolve_local(image)?
        };
        staged.push(path);
    }

    if audio.is_empty() {
        return Err(MangareelError::assembly("narration audio is empty"));
    }
    let audio_path = dir
        .path()
        .join(format!("narration.{}", audio.encoding.extension()));
    tokio::fs::write(&audio_path, &audio.bytes).await?;

    tracing::debug!(
        dir = %dir.path().display(),
        images = staged.len(),
        audio_bytes = audio.len(),
        "Assembly inputs staged"
    );

    Ok(StagedInputs {
        dir,
        images: staged,
        audio: audio_path,
    })
}

async fn download_image(
    client: &reqwest::Client,
    image: &ImageLocation,
    dir: &Path,
    index: usize,
) -> MangareelResult<PathBuf> {
    let response = client.get(image.as_str()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MangareelError::Api {
            status: status.as_u16(),
            message: format!("failed to download {}", image.as_str()),
        });
    }
    let bytes = response.bytes().await?;

    let path = dir.join(format!("image-{index:02}.{}", extension_for(image.as_str())));
    tokio::fs::write(&path, &bytes).await?;

    tracing::debug!(
        url = image.as_str(),
        bytes = bytes.len(),
        path = %path.display(),
        "Downloaded image"
    );
    Ok(path)
}

fn resolve_local(image: &ImageLocation) -> MangareelResult<PathBuf> {
    let raw = image.as_str();
    let path = PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw));
    if !path.is_file() {
        return Err(MangareelError::FileNotFound { path });
    }
    Ok(path)
}

/// Pick a file extension from the URL path, ignoring query and fragment.
fn extension_for(url: &str) -> &'static str {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or("");

    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == ext)
        .unwrap_or("png")
}
