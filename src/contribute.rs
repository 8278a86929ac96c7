use crate::config::Config;
use crate::error::Result;
use crate::form::{ContributionForm, FormValues, Submission};
use crate::geocoder::NominatimClient;
use crate::geolocation::DeviceLocation;
use crate::loader::FileLoader;
use dialoguer::Confirm;
use sedekah_qr_common::{
    ExtractionController, FieldSetter, FormField, LocationController, LocationOutcome, Notifier,
    ReverseGeocoder, SelectedFile,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// What to do with a name suggestion from the geocoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameDecision {
    Accept,
    /// Prompt when attached to a terminal, otherwise dismiss
    Ask,
    Dismiss,
}

#[derive(Debug, Clone)]
pub struct ContributeOptions {
    pub image: PathBuf,
    /// `None` when the user never asked for their location
    pub location: Option<DeviceLocation>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub name_decision: NameDecision,
}

#[derive(Debug)]
pub struct ContributeReport {
    pub submission: Submission,
    pub location: Option<LocationOutcome>,
}

pub async fn run_contribute(
    config: &Config,
    options: ContributeOptions,
    notifier: Arc<dyn Notifier>,
) -> Result<ContributeReport> {
    let geocoder = NominatimClient::new(config)?;
    run_contribute_with(config, options, geocoder, notifier).await
}

/// Same as `run_contribute`, with the geocoder injected
pub async fn run_contribute_with<R: ReverseGeocoder>(
    config: &Config,
    options: ContributeOptions,
    geocoder: R,
    notifier: Arc<dyn Notifier>,
) -> Result<ContributeReport> {
    let form = Arc::new(ContributionForm::new());

    let content_sink = Arc::clone(&form);
    let extraction = ExtractionController::builder(FileLoader)
        .notifier(Arc::clone(&notifier))
        .on_content_change(move |content| content_sink.set_qr_content(content))
        .on_status_change(|state| debug!(?state, "extraction state"))
        .build();

    let pending = extraction.on_file_selected(Some(SelectedFile::from_path(&options.image)));

    let location_outcome = match options.location.clone() {
        Some(device) => {
            let location = LocationController::builder(device, geocoder, form.clone())
                .notifier(Arc::clone(&notifier))
                .policy(config.name_suggestion)
                .build();

            let (_, outcome) = tokio::join!(pending, location.request_location());

            if options.name.is_none() {
                if let Some(name) = location.pending_name() {
                    if decide(options.name_decision, &name)? {
                        location.accept_suggestion();
                    } else {
                        location.dismiss_suggestion();
                    }
                }
            }
            Some(outcome)
        }
        None => {
            pending.await;
            None
        }
    };

    // Values typed by the user are the final edit
    for (field, value) in [
        (FormField::Name, &options.name),
        (FormField::City, &options.city),
        (FormField::State, &options.state),
    ] {
        if let Some(value) = value {
            form.set_value(field, value);
        }
    }

    let submission = form.submission(&extraction.state())?;
    extraction.clear();

    Ok(ContributeReport {
        submission,
        location: location_outcome,
    })
}

fn decide(decision: NameDecision, name: &str) -> Result<bool> {
    match decision {
        NameDecision::Accept => Ok(true),
        NameDecision::Dismiss => Ok(false),
        NameDecision::Ask if std::io::stdin().is_terminal() => Ok(Confirm::new()
            .with_prompt(format!("Use \"{}\" as the institution name?", name))
            .default(false)
            .interact()?),
        NameDecision::Ask => Ok(false),
    }
}

/// Location-only variant used by `sedekah-qr locate`
pub async fn run_locate<R: ReverseGeocoder>(
    config: &Config,
    device: DeviceLocation,
    geocoder: R,
    name_decision: NameDecision,
    notifier: Arc<dyn Notifier>,
) -> Result<(LocationOutcome, FormValues)> {
    let form = Arc::new(ContributionForm::new());
    let location = LocationController::builder(device, geocoder, form.clone())
        .notifier(notifier)
        .policy(config.name_suggestion)
        .build();

    let outcome = location.request_location().await;
    if let Some(name) = location.pending_name() {
        if decide(name_decision, &name)? {
            location.accept_suggestion();
        }
    }

    Ok((outcome, form.values()))
}
