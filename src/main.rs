use clap::Parser;
use crucible::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match crucible::run(cli).await {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}
