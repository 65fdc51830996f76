//! sm-cli - pull CDEC snow courses and snow sensors into SnowModel CSV files.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sm-cli",
    version,
    about = "Pull CDEC snow course and snow sensor data into SnowModel station files"
)]
struct Cli {
    #[command(subcommand)]
    command: sm_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    sm_cmd::run(cli.command).await
}
