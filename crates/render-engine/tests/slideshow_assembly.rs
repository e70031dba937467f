use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_render_engine::staging::{download_client, stage_inputs};
use mangareel_render_engine::{
    report_path_for, AssemblyProgress, AssemblyStage, ProgressCallback, RenderBackend,
    SlideshowAssembler, SlideshowConfig, SlideshowPlan,
};
use mangareel_stage_core::{AudioEncoding, ImageLocation, NarrationAudio, VideoAssembler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SCENE_JPEG: &[u8] = b"\xff\xd8\xff\xe0scene";

/// Writes a placeholder output instead of encoding, and remembers the plan.
#[derive(Default)]
struct RecordingBackend {
    available: bool,
    fail_with: Option<&'static str>,
    plans: Mutex<Vec<SlideshowPlan>>,
    staged_audio_seen: Mutex<Option<Vec<u8>>>,
}

impl RenderBackend for RecordingBackend {
    fn render(
        &self,
        plan: &SlideshowPlan,
        progress: Option<&ProgressCallback>,
    ) -> MangareelResult<()> {
        self.plans.lock().unwrap().push(plan.clone());

        // The audio input is the last "-i" argument; it must still exist while rendering.
        let audio_input = plan
            .ffmpeg_args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].clone())
            .last()
            .unwrap();
        *self.staged_audio_seen.lock().unwrap() = std::fs::read(audio_input).ok();

        if let Some(message) = self.fail_with {
            return Err(MangareelError::assembly(message));
        }
        if let Some(cb) = progress {
            cb(AssemblyProgress {
                progress: 0.5,
                frames_rendered: plan.total_frames / 2,
                total_frames: plan.total_frames,
                eta_secs: 1.0,
                stage: AssemblyStage::Encoding,
            });
        }
        std::fs::write(&plan.output_path, b"fake-mp4")?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn write_images(dir: &Path, n: usize) -> Vec<ImageLocation> {
    (0..n)
        .map(|i| {
            let path = dir.join(format!("scene-{i}.png"));
            std::fs::write(&path, b"\x89PNG").unwrap();
            ImageLocation::new(path.display().to_string())
        })
        .collect()
}

fn narration() -> NarrationAudio {
    NarrationAudio::new(b"ID3-narration".to_vec(), AudioEncoding::Mp3)
}

#[tokio::test]
async fn assembles_local_images_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path(), 3);
    let output = dir.path().join("out").join("output_video.mp4");

    let backend = Arc::new(RecordingBackend {
        available: true,
        ..RecordingBackend::default()
    });
    let stages: Arc<Mutex<Vec<AssemblyStage>>> = Arc::default();
    let seen = Arc::clone(&stages);
    let assembler = SlideshowAssembler::with_backend(SlideshowConfig::default(), backend.clone())
        .with_progress(Arc::new(move |p: AssemblyProgress| {
            seen.lock().unwrap().push(p.stage)
        }));

    let written = assembler
        .create_video(&images, &narration(), &output)
        .await
        .unwrap();

    assert_eq!(written, output);
    assert_eq!(std::fs::read(&output).unwrap(), b"fake-mp4");
    assert_eq!(
        backend.staged_audio_seen.lock().unwrap().as_deref(),
        Some(&b"ID3-narration"[..])
    );

    let plans = backend.plans.lock().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].clip_count, 3);
    assert!((plans[0].total_duration_secs - 15.0).abs() < 1e-9);

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            AssemblyStage::Staging,
            AssemblyStage::Encoding,
            AssemblyStage::Finalizing,
            AssemblyStage::Complete
        ]
    );

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path_for(&output)).unwrap()).unwrap();
    assert_eq!(report["backend"], "recording");
    assert_eq!(report["images"].as_array().unwrap().len(), 3);
    assert_eq!(report["audio_encoding"], "MP3");
    assert_eq!(report["video_codec"], "libx264");
    assert_eq!(report["audio_codec"], "aac");
}

#[tokio::test]
async fn unavailable_backend_is_an_assembly_error() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path(), 1);
    let assembler = SlideshowAssembler::with_backend(
        SlideshowConfig::default(),
        Arc::new(RecordingBackend::default()),
    );

    let err = assembler
        .create_video(&images, &narration(), &dir.path().join("o.mp4"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to assemble video: Unsupported operation: No supported render backend found (expected recording in PATH)"
    );
}

#[tokio::test]
async fn backend_failure_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path(), 2);
    let output = dir.path().join("o.mp4");
    let assembler = SlideshowAssembler::with_backend(
        SlideshowConfig::default(),
        Arc::new(RecordingBackend {
            available: true,
            fail_with: Some("ffmpeg failed (status 1): boom"),
            ..RecordingBackend::default()
        }),
    );

    let err = assembler
        .create_video(&images, &narration(), &output)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to assemble video: ffmpeg failed (status 1): boom"
    );
    assert!(!report_path_for(&output).exists());
}

#[tokio::test]
async fn no_images_never_reaches_backend() {
    let backend = Arc::new(RecordingBackend {
        available: true,
        ..RecordingBackend::default()
    });
    let assembler = SlideshowAssembler::with_backend(SlideshowConfig::default(), backend.clone());

    let err = assembler
        .create_video(&[], &narration(), &PathBuf::from("unused.mp4"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to assemble video: no images to assemble");
    assert!(backend.plans.lock().unwrap().is_empty());
}

/// Minimal image host on 127.0.0.1:
/// - `/scene.jpg` answers 200 with [`SCENE_JPEG`];
/// - `/stall.png` accepts the request and never answers;
/// - anything else answers 404.
async fn serve_images() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while read < buf.len() {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body): (&str, &[u8]) = if path.starts_with("/scene.jpg") {
                    ("200 OK", SCENE_JPEG)
                } else if path.starts_with("/stall.png") {
                    std::future::pending::<()>().await;
                    return;
                } else {
                    ("404 Not Found", &b"not found"[..])
                };

                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn remote_images_are_downloaded_into_staging() {
    let base = serve_images().await;
    let dir = tempfile::tempdir().unwrap();
    let local = write_images(dir.path(), 1);
    let images = vec![
        ImageLocation::new(format!("{base}/scene.jpg?sig=abc")),
        local[0].clone(),
    ];

    let staged = stage_inputs(&download_client(5).unwrap(), &images, &narration())
        .await
        .unwrap();

    assert_eq!(staged.images[0], staged.dir().join("image-00.jpg"));
    assert_eq!(std::fs::read(&staged.images[0]).unwrap(), SCENE_JPEG);
    assert_eq!(staged.images[1], PathBuf::from(local[0].as_str()));
}

#[tokio::test]
async fn failed_download_is_an_assembly_error() {
    let base = serve_images().await;
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(RecordingBackend {
        available: true,
        ..RecordingBackend::default()
    });
    let assembler = SlideshowAssembler::with_backend(SlideshowConfig::default(), backend.clone());

    let images = vec![
        ImageLocation::new(format!("{base}/scene.jpg")),
        ImageLocation::new(format!("{base}/missing.png")),
    ];
    let err = assembler
        .create_video(&images, &narration(), &dir.path().join("o.mp4"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Failed to assemble video: API error (status 404): failed to download {base}/missing.png"
        )
    );
    assert!(backend.plans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stalled_download_times_out() {
    let base = serve_images().await;
    let dir = tempfile::tempdir().unwrap();
    let assembler = SlideshowAssembler::with_backend(
        SlideshowConfig::default(),
        Arc::new(RecordingBackend {
            available: true,
            ..RecordingBackend::default()
        }),
    )
    .with_download_timeout(1)
    .unwrap();

    let images = vec![ImageLocation::new(format!("{base}/stall.png"))];
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        assembler.create_video(&images, &narration(), &dir.path().join("o.mp4")),
    )
    .await
    .expect("download must be bounded by the configured timeout");

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Failed to assemble video: "));
}
