use geotrack_console::config::Config;
use geotrack_console::console::{HELP, Input, parse_line};
use geotrack_console::controller::{self, Command, Outcome};
use geotrack_console::map::resolve_style_url;
use geotrack_console::{App, HttpLocationApi, SceneRenderer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Done => println!("ok"),
        Outcome::Places(places) => {
            if places.is_empty() {
                println!("no places found");
            }
            for place in places {
                let at = place.geometry.point;
                println!(
                    "{} ({}, {})",
                    place.label.as_deref().unwrap_or("<unnamed>"),
                    at.lng,
                    at.lat
                );
            }
        }
        Outcome::Pass(summary) => println!(
            "positions: {} new, {} moved, {} missing, {} failed",
            summary.created, summary.moved, summary.missing, summary.failed
        ),
        Outcome::Snapshot(snapshot) => {
            println!("mode: {} (cursor: {})", snapshot.mode, snapshot.cursor.as_css());
            if let Some(status) = snapshot.status {
                println!("status: {}", status);
            }
            println!(
                "drafts: {} geofence point(s), {} device point(s)",
                snapshot.geofence_draft.len(),
                snapshot.device_draft.len()
            );
            println!("geofences: {}", snapshot.geofence_ids.join(", "));
            println!("devices: {}", snapshot.device_ids.join(", "));
            for (id, at) in snapshot.device_positions {
                println!("  {} at ({}, {})", id, at.lng, at.lat);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geotrack=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        "Loaded configuration: endpoint={}, map={}",
        config.api.endpoint, config.map.map_name
    );
    info!(
        "Initial view: center=({}, {}), zoom={}",
        config.map.center.lng, config.map.center.lat, config.map.zoom
    );
    match config.map.region() {
        Some(region) => info!(
            "Map style: {}",
            resolve_style_url(&config.map.map_name, region)
        ),
        None => warn!("No identity pool configured - map requests will not be signed"),
    }

    let api = HttpLocationApi::new(&config.api)?;
    let renderer = SceneRenderer::new(config.map.hit_tolerance);
    let mut app = App::new(api, renderer);

    // Start with whatever the backend holds; an unreachable backend is not fatal
    if let Err(e) = app.init().await {
        error!("Initial load failed: {}", e);
    }

    let handle = controller::spawn(app, config.refresh.clone());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Ok(Input::Empty) => {}
            Ok(Input::Help) => println!("{}", HELP),
            Ok(Input::Quit) => break,
            // Pointer moves only touch the cursor; nothing to report back
            Ok(Input::Command(Command::MouseMove)) => handle.post(Command::MouseMove).await?,
            Ok(Input::Command(command)) => match handle.send(command).await {
                Ok(outcome) => print_outcome(outcome),
                Err(e) => println!("error: {}", e),
            },
            Err(e) => println!("{}", e),
        }
    }

    handle.shutdown().await?;
    info!("Geotrack console stopped");

    Ok(())
}
