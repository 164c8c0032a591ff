use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = gibs_layer_validator_lib::cli::Cli::parse();
    gibs_layer_validator_lib::run(cli).await
}
