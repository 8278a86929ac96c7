use clap::Parser;
use sedekah_qr::{cli, config, contribute, error, geocoder, geolocation, notify, scanner};
use cli::{Cli, Commands};
use config::Config;
use contribute::{ContributeOptions, NameDecision};
use error::{Result, SedekahError};
use geolocation::DeviceLocation;
use sedekah_qr_common::{Coordinates, DecodeResult, LocationOutcome, Notifier, TracingNotifier};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;
    let notifier: Arc<dyn Notifier> = if std::io::stdout().is_terminal() {
        Arc::new(notify::ConsoleNotifier)
    } else {
        Arc::new(TracingNotifier)
    };

    match cli.command {
        Commands::Decode { path, output } => {
            if path.is_dir() {
                println!("[1/2] Scanning images...");
                let images = scanner::scan_folder(&path)?;
                if images.is_empty() {
                    return Err(SedekahError::NoImagesFound(path.display().to_string()));
                }
                println!("✔ Found {} images\n", images.len());

                println!("[2/2] Decoding QR codes...");
                let reports = scanner::decode_images(&images, true);
                for report in &reports {
                    match (&report.text, &report.error) {
                        (Some(text), _) => println!("✔ {}: {}", report.file_name, text),
                        (None, Some(e)) => println!("✖ {}: {}", report.file_name, e),
                        (None, None) => println!("⚠ {}: no QR code found", report.file_name),
                    }
                }
                write_or_skip(output.as_deref(), &reports)?;
            } else {
                if !path.exists() {
                    return Err(SedekahError::FileNotFound(path.display().to_string()));
                }
                match scanner::decode_file(&path)? {
                    DecodeResult::Decoded { text } => println!("{}", text),
                    DecodeResult::NotFound => println!("⚠ No QR code found in {}", path.display()),
                }
            }
        }

        Commands::Locate { lat, lon, exif, accept_name, policy } => {
            let device = device_location(lat, lon, exif)?.unwrap_or(DeviceLocation::Unavailable);
            let mut config = config;
            if let Some(policy) = policy {
                config.name_suggestion = policy;
            }
            let decision = if accept_name { NameDecision::Accept } else { NameDecision::Ask };

            let client = geocoder::NominatimClient::new(&config)?;
            let (outcome, values) =
                contribute::run_locate(&config, device, client, decision, notifier).await?;

            if let LocationOutcome::GeocodingFailed(failure) = &outcome {
                println!("⚠ No address found ({}); enter city and state manually", failure);
            }
            println!("{}", serde_json::to_string_pretty(&values)?);
        }

        Commands::Contribute {
            image,
            lat,
            lon,
            exif_location,
            name,
            city,
            state,
            accept_name,
            output,
        } => {
            if !image.is_file() {
                return Err(SedekahError::FileNotFound(image.display().to_string()));
            }
            let exif = exif_location.then(|| image.clone());
            let options = ContributeOptions {
                location: device_location(lat, lon, exif)?,
                image,
                name,
                city,
                state,
                name_decision: if accept_name { NameDecision::Accept } else { NameDecision::Ask },
            };

            let report = contribute::run_contribute(&config, options, notifier).await?;
            if report.submission.needs_manual_qr {
                println!("⚠ Submitting without QR content; an admin will extract it manually");
            }

            let json = serde_json::to_string_pretty(&report.submission)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ Submission saved: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config { set_geocoder_url, set_name_suggestion, show } => {
            let mut config = config;

            if let Some(url) = set_geocoder_url {
                config.set_geocoder_url(url)?;
                println!("✔ Geocoder URL updated");
            }

            if let Some(policy) = set_name_suggestion {
                config.set_name_suggestion(policy)?;
                println!("✔ Name suggestion policy updated");
            }

            if show {
                println!("Settings:");
                println!("  Geocoder URL: {}", config.geocoder_url);
                println!("  User agent: {}", config.user_agent);
                println!("  Accept-Language: {}", config.accept_language);
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  Name suggestion: {}", config.name_suggestion);
                println!("  File: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn device_location(
    lat: Option<f64>,
    lon: Option<f64>,
    exif: Option<std::path::PathBuf>,
) -> Result<Option<DeviceLocation>> {
    match (lat, lon, exif) {
        (Some(lat), Some(lon), _) => {
            let coords = Coordinates::new(lat, lon);
            if !coords.is_valid() {
                return Err(SedekahError::InvalidCoordinates(format!("{}, {}", lat, lon)));
            }
            Ok(Some(DeviceLocation::Fixed(coords)))
        }
        (_, _, Some(path)) => Ok(Some(DeviceLocation::Exif(path))),
        _ => Ok(None),
    }
}

fn write_or_skip<T: serde::Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(value)?)?;
        println!("✔ Results saved: {}", path.display());
    }
    Ok(())
}
