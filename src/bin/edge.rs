use cep_weather::telemetry::Telemetry;
use cep_weather::{CliOptions, Server, Settings, Stage};
use clap::Parser;

const STAGE: Stage = Stage::Edge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = cep_weather::tracing::get_tracing_subscriber(
        STAGE.service_name(),
        "info",
        std::io::stdout,
    );
    cep_weather::tracing::init_subscriber(subscriber);

    let options = CliOptions::parse();
    if options.config.is_none() {
        tracing::info!("No settings file provided; using defaults and environment.");
    }
    let settings = Settings::load(&options, STAGE)?;

    let telemetry = Telemetry::for_collector(STAGE.service_name(), &settings.collector_url);
    let server = Server::build(&settings, STAGE, telemetry.clone()).await?;
    let outcome = server.run_until_stopped().await;
    telemetry.shutdown().await;
    outcome.map_err(|err| err.into())
}
