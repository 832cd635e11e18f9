//! One-shot mode: identify a photo from disk and print the result

use std::path::Path;

use nu_ansi_term::{Color, Style};
use tc_core::{IdentificationView, Orchestrator, Session, UploadedImage};
use tracing::info;

/// Outcome of one image run
#[derive(Debug)]
pub struct Report {
    pub identification: IdentificationView,
    /// Weather text, or the reason it is unavailable
    pub weather: Result<String, String>,
}

/// Run the upload → identify → weather flow for a single file
pub async fn identify_file(orchestrator: &Orchestrator, path: &Path) -> anyhow::Result<Report> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let image = UploadedImage::from_extension(extension, bytes)?;

    let mut session = Session::new();
    orchestrator.upload_image(&mut session, image);

    info!("Identifying {}", path.display());
    orchestrator.identify_place(&mut session).await?;

    let weather = orchestrator
        .fetch_weather(&mut session)
        .await
        .map_err(|e| e.to_string());

    let identification = Orchestrator::render_identification(&session)
        .ok_or_else(|| anyhow::anyhow!("identification missing after identify"))?;

    Ok(Report {
        identification,
        weather,
    })
}

/// Identify `path` and print the result
pub async fn run(orchestrator: &Orchestrator, path: &Path) -> anyhow::Result<()> {
    let report = identify_file(orchestrator, path).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &Report) {
    let heading = Color::Cyan.bold();
    let label = Style::new().bold();

    println!();
    println!("{}", heading.paint(&report.identification.name));
    println!("{}", report.identification.description);
    println!();
    println!("{}", label.paint("Location"));
    println!("{}", report.identification.location);
    println!();
    println!("{}", label.paint("Weather"));
    match &report.weather {
        Ok(text) => println!("{}", text),
        Err(reason) => println!("{}", Color::Yellow.paint(reason)),
    }
}
