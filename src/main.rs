use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = bookstore::config::Cli::parse();
    if let Err(err) = bookstore::run(cli) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
