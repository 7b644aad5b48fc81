use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = runway::api::Cli::parse();
    if let Err(e) = runway::api::run(cli).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
