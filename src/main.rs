use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use tuya_switch::{api, Device, PlatformResponse, Settings, TuyaClient};

#[derive(Parser)]
#[command(name = "tuya-switch")]
#[command(about = "Toggle and query a Tuya smart switch through the Tuya cloud API")]
#[command(version)]
struct Cli {
    /// Tuya cloud project client ID
    #[arg(
        long,
        global = true,
        env = "TUYA_CLIENT_ID",
        default_value = "",
        hide_default_value = true
    )]
    client_id: String,

    /// Tuya cloud project client secret
    #[arg(
        long,
        global = true,
        env = "TUYA_CLIENT_SECRET",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    client_secret: String,

    /// ID of the device to control
    #[arg(
        long,
        global = true,
        env = "TUYA_DEVICE_ID",
        default_value = "",
        hide_default_value = true
    )]
    device_id: String,

    /// Data center region: eu, us, cn or in
    #[arg(long, global = true, env = "TUYA_REGION", default_value = "eu")]
    region: String,

    /// Data point that switches the device
    #[arg(long, global = true, env = "TUYA_DP_CODE", default_value = "switch")]
    dp_code: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 10000)]
        port: u16,
    },
    /// Turn the switch on
    On,
    /// Turn the switch off
    Off,
    /// Show the switch state and data points
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let settings = Arc::new(
        Settings::new(&cli.client_id, &cli.client_secret, &cli.device_id)
            .with_region(&cli.region)
            .with_dp_code(&cli.dp_code),
    );
    info!(
        "Using region {} ({}) for device {}",
        settings.region(),
        settings.region().base_url(),
        settings.device_id()
    );

    let device = Device::new(TuyaClient::new(settings.clone())?);

    match cli.command {
        Commands::Serve { host, port } => {
            let listener = TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind {}:{}", host, port))?;
            api::start(listener, Arc::new(device)).await?;
        }
        Commands::On => {
            let response = device.switch(true).await?;
            print_command_result("on", &response)?;
        }
        Commands::Off => {
            let response = device.switch(false).await?;
            print_command_result("off", &response)?;
        }
        Commands::Status => {
            let response = device.status().await?;
            if !response.success {
                anyhow::bail!("Platform rejected status request: {}", response.failure_reason());
            }

            let state = match response.switch_state(settings.dp_code()) {
                Some(true) => "on",
                Some(false) => "off",
                None => "unknown",
            };
            println!("Device {} is {}", settings.device_id(), state);
            for dp in response.data_points() {
                println!("  {} = {}", dp.code, dp.value);
            }
        }
    }

    Ok(())
}

fn print_command_result(action: &str, response: &PlatformResponse) -> Result<()> {
    if !response.success {
        anyhow::bail!(
            "Platform rejected '{}' command: {}",
            action,
            response.failure_reason()
        );
    }
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
