use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = veil::cli::Cli::parse();
    if let Err(e) = veil::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
