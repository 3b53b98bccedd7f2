use anyhow::Result;
use clap::Parser;
use sotto::cli::{Cli, Commands};
use sotto::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => {
            list_audio_devices()?;
            Ok(())
        }
        None => {
            let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            sotto::app::run(cli, config).await?;
            Ok(())
        }
    }
}

#[cfg(feature = "mic")]
fn list_audio_devices() -> Result<()> {
    let devices = sotto::audio::capture::list_devices()?;
    if devices.is_empty() {
        sotto::output::error("no audio input devices found");
    }
    for name in devices {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(not(feature = "mic"))]
fn list_audio_devices() -> Result<()> {
    sotto::output::error("built without microphone support");
    Ok(())
}
