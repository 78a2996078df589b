use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use colophon::brochure::build_brochures;
use colophon::config::ClientConfig;
use colophon::convert::{OfficeConverter, DEFAULT_OFFICE_BINARY};
use colophon::error::ContextError;
use colophon::issue::{IssueNumber, INAUGURAL_YEAR};
use colophon::manifest::{IssueManifest, QrMaterials};
use colophon::newsletter::{build_newsletter, build_tokiqr, NewsletterOptions};
use colophon::splice::splice_documents;

#[derive(Parser)]
#[command(version, about = "Generates the TokiStorage newsletter PDFs", long_about = None)]
struct CliArguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a serial issue of the newsletter
    Newsletter {
        #[arg(default_value_t = INAUGURAL_YEAR, help = "Publication year")]
        year: i32,
        #[arg(default_value_t = 1, help = "Issue number within the year")]
        number: u32,
        #[arg(default_value_t = 1, help = "Serial number across all years")]
        serial: u32,
        #[arg(
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u8).range(1..=12),
            help = "Publication month shown on the cover"
        )]
        month: u8,
        #[arg(long, help = "Path to the issue manifest in the JSON format")]
        manifest: Option<PathBuf>,
        #[arg(long = "client-config", help = "Path to the client configuration in the JSON format")]
        client_config: Option<PathBuf>,
        #[arg(long = "output-dir", default_value = "newsletter")]
        output_directory: PathBuf,
        #[arg(long, help = "Logo image placed on the cover")]
        logo: Option<PathBuf>,
    },
    /// Generate a QR special issue from a materials file
    Tokiqr {
        materials: PathBuf,
        client_config: PathBuf,
        output_directory: PathBuf,
    },
    /// Generate the introduction brochure in Japanese and in English
    Brochure {
        #[arg(long = "client-config", help = "Path to the client configuration in the JSON format")]
        client_config: Option<PathBuf>,
        #[arg(long = "output-dir", default_value = "brochure")]
        output_directory: PathBuf,
        #[arg(long, help = "Logo image placed in the header")]
        logo: Option<PathBuf>,
    },
    /// Insert supplementary PDF files before the last page of a base PDF
    Splice {
        #[arg(long)]
        base: PathBuf,
        #[arg(long)]
        output: PathBuf,
        supplements: Vec<PathBuf>,
    },
    /// Convert a slide deck to PDF with a headless office suite
    Convert {
        input: PathBuf,
        #[arg(long = "office-binary", default_value = DEFAULT_OFFICE_BINARY)]
        office_binary: String,
        #[arg(long, default_value_t = 120, help = "Wall-clock limit in seconds")]
        timeout: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    let cli_arguments = CliArguments::parse();

    match cli_arguments.command {
        Command::Newsletter {
            year,
            number,
            serial,
            month,
            manifest,
            client_config,
            output_directory,
            logo,
        } => {
            let issue = IssueNumber::checked(year, number, serial)?;
            let manifest = manifest
                .map(|manifest_path| IssueManifest::from_path(&manifest_path))
                .transpose()?;
            let client_config = load_client_config(client_config)?;
            build_newsletter(&NewsletterOptions {
                issue,
                month,
                manifest,
                client_config,
                output_directory,
                logo_path: logo,
            })?;
        }
        Command::Tokiqr {
            materials,
            client_config,
            output_directory,
        } => {
            let materials = QrMaterials::from_path(&materials)?;
            let client_config = ClientConfig::from_path(&client_config)?;
            build_tokiqr(&materials, &client_config, &output_directory)?;
        }
        Command::Brochure {
            client_config,
            output_directory,
            logo,
        } => {
            let client_config = load_client_config(client_config)?;
            build_brochures(&client_config, &output_directory, logo.as_deref())?;
        }
        Command::Splice {
            base,
            output,
            supplements,
        } => {
            let report = splice_documents(&base, &supplements, &output)?;
            log::info!("{} ({} pages)", output.display(), report.page_count);
        }
        Command::Convert {
            input,
            office_binary,
            timeout,
        } => {
            OfficeConverter::new(office_binary, Duration::from_secs(timeout))
                .convert_to_pdf(&input)?;
        }
    }

    Ok(())
}

fn load_client_config(client_config_path: Option<PathBuf>) -> Result<ClientConfig, ContextError> {
    match client_config_path {
        Some(client_config_path) => ClientConfig::from_path(&client_config_path),
        None => Ok(ClientConfig::default()),
    }
}
