use std::env;

use tabletrail::config::args::CliArgs;
use tabletrail::config::{StaticConfig, get_config, init_config_from};
use tabletrail::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let cli = CliArgs::parse(&args);

    if cli.print_sample_config {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    init_config_from(cli.config_path_or_default());

    // 日志 guard 必须存活到进程结束
    let _log_guard = init_logging(&get_config().logging)?;

    if !cli.unknown.is_empty() {
        tracing::warn!("Ignoring unknown arguments: {:?}", cli.unknown);
    }

    #[cfg(feature = "server")]
    if let Err(e) = tabletrail::runtime::modes::run_server().await {
        match e.downcast_ref::<tabletrail::errors::LoyaltyError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("[ERROR] {:#}", e),
        }
        return Err(e);
    }

    Ok(())
}
