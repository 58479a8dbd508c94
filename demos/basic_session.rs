//! Basic session example
//!
//! This example walks one video through the whole session:
//! - Loading configuration from the environment (`VIDFETCH_API_URL`)
//! - Subscribing to notifications and progress
//! - Submitting a URL and previewing its metadata
//! - Choosing a format and following the download to the end
//!
//! Usage: `cargo run --example basic_session -- <video-url> [audio]`

use vidfetch::presentation::ProgressView;
use vidfetch::{
    AudioCodec, Config, DownloadKind, Event, Intent, Orchestrator, Panel, Quality, SessionTag,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vidfetch=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .ok_or("usage: basic_session <video-url> [audio]")?;
    let audio = args.next().as_deref() == Some("audio");

    let config = Config::from_env()?;
    println!("Backend: {}", config.base_url());
    let mut orchestrator = Orchestrator::with_http(config)?;

    // Subscribe to events
    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Notification(n) => println!("[{}] {}", n.title, n.message),
                Event::Progress(progress) => {
                    let view = ProgressView::from_event(&progress);
                    if view.show_bar {
                        println!(
                            "{} {} {} {}",
                            view.headline,
                            view.percent_label,
                            view.speed_label.unwrap_or_default(),
                            view.eta_label.unwrap_or_default()
                        );
                    }
                }
                Event::StateChanged { from, to } => println!("({} -> {})", from, to),
            }
        }
    });

    orchestrator.dispatch(Intent::SubmitUrl(url))?;
    if orchestrator.run_until_settled().await != SessionTag::MetadataReady {
        return Ok(());
    }

    let view = orchestrator.view();
    if let Some(preview) = &view.preview {
        println!(
            "{} {} ({}, {} formats)",
            preview.title, preview.uploader_label, preview.duration_label, preview.format_count
        );
    }

    if audio {
        orchestrator.dispatch(Intent::SelectKind(DownloadKind::Audio))?;
        orchestrator.dispatch(Intent::SelectAudioCodec(AudioCodec::Mp3))?;
    } else {
        orchestrator.dispatch(Intent::SelectQuality(Quality::P1080))?;
    }

    orchestrator.dispatch(Intent::StartDownload)?;
    orchestrator.run_until_settled().await;

    let view = orchestrator.view();
    if view.panel == Panel::Progress {
        if let Some(progress) = view.progress {
            println!("{}", progress.headline);
            if let Some(footer) = progress.footer {
                println!("{}", footer);
            }
        }
    }

    // Let the event printer catch up before exiting
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    Ok(())
}
