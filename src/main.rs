use std::io::{self, IsTerminal, Read};

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "medscan",
    version,
    about = "Read medicine names and dosages from prescription label images"
)]
struct Cli {
    /// Label or prescription image to scan
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Medicine list, one name per line (overrides settings [medicines] path)
    #[arg(short = 'm', long = "medicines")]
    medicines: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Run the HTTP API
    #[arg(long = "server")]
    server: bool,

    /// Server bind address (overrides settings [server] addr)
    #[arg(long = "addr", requires = "server")]
    addr: Option<String>,

    /// Show loaded medicine names and exit
    #[arg(long = "show-medicines")]
    show_medicines: bool,

    /// Show installed tesseract languages and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    medscan::logging::init(cli.verbose)?;

    let config = medscan::Config {
        data: cli.data,
        medicines: cli.medicines,
        settings_path: cli.read_settings,
        show_medicines: cli.show_medicines,
        show_ocr_languages: cli.show_ocr_languages,
    };

    if cli.server {
        let settings = medscan::resolve_settings(&config)?;
        let addr = cli.addr.unwrap_or_else(|| settings.server_addr.clone());
        return medscan::server::run_server(settings, addr).await;
    }

    let needs_input = config.data.is_none() && !config.show_medicines && !config.show_ocr_languages;
    let input = if needs_input {
        if io::stdin().is_terminal() {
            return Err(anyhow!("pass --data <image> or pipe label text on stdin"));
        }
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer).map_err(|_| anyhow!("stdin must be UTF-8 text"))?;
        Some(text)
    } else {
        None
    };

    let output = tokio::task::spawn_blocking(move || medscan::run(config, input)).await??;
    println!("{}", output);
    Ok(())
}
