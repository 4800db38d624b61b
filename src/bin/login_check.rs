/// login_check: run one login handshake against the configured device.
///
/// Usage:
///   cargo run --bin login_check
///
/// Reads the `[device]` table from the config file and reports whether the
/// device accepted the credentials.
use anyhow::{bail, Result};
use dahua_login::config::{config_path, Config};
use dahua_login::DeviceClient;

#[tokio::main]
async fn main() -> Result<()> {
    dahua_login::init_tracing();

    let config = Config::load()?;
    if !config.is_configured() {
        bail!("no device configured in {}", config_path().display());
    }

    let client = DeviceClient::from_config(&config.device)?;
    let outcome = client.login().await?;

    if outcome.success {
        println!(
            "LOGIN SUCCESSFUL (session {}, keep-alive {}s)",
            outcome.session_id().unwrap_or_default(),
            outcome.keep_alive_interval()
        );
    } else {
        println!(
            "LOGIN FAILED: {}",
            outcome.error_message().unwrap_or("device gave no reason")
        );
    }
    Ok(())
}
