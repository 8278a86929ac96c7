use clap::{Parser, Subcommand};
use sedekah_qr_common::SuggestionPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sedekah-qr")]
#[command(about = "Donation QR extraction and location-assisted contribution tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode the QR code in an image, or in every image of a folder
    Decode {
        /// Image file or folder
        #[arg(required = true)]
        path: PathBuf,

        /// Write the results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a position to city/state and a suggested institution name
    Locate {
        /// Latitude in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Take the position from a photo's EXIF GPS tags
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        exif: Option<PathBuf>,

        /// Accept the suggested name without asking
        #[arg(long)]
        accept_name: bool,

        /// Name suggestion policy (loose/institutional)
        #[arg(long)]
        policy: Option<SuggestionPolicy>,
    },

    /// Build a contribution from a QR image plus optional location
    Contribute {
        /// Image containing the donation QR code
        #[arg(short, long, required = true)]
        image: PathBuf,

        /// Latitude in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Take the position from the image's EXIF GPS tags
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        exif_location: bool,

        /// Institution name
        #[arg(short, long)]
        name: Option<String>,

        /// City (overrides the detected one)
        #[arg(long)]
        city: Option<String>,

        /// State (overrides the detected one)
        #[arg(long)]
        state: Option<String>,

        /// Accept the suggested name without asking
        #[arg(long, conflicts_with = "name")]
        accept_name: bool,

        /// Write the submission JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or edit settings
    Config {
        /// Reverse geocoding endpoint
        #[arg(long)]
        set_geocoder_url: Option<String>,

        /// Name suggestion policy (loose/institutional)
        #[arg(long)]
        set_name_suggestion: Option<SuggestionPolicy>,

        /// Print the settings
        #[arg(long)]
        show: bool,
    },
}
