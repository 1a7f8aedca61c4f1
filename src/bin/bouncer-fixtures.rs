use std::error::Error;

use tracing::info;

use bouncer_fixtures::{
    bouncer::locate_bouncer_binary,
    cli::{Cli, Command, KindCommand},
    config::HarnessConfig,
    k8s::{cli::SystemCli, KindCluster},
    logging::Logging,
    repo::lookup_project_repo,
};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::init_fixtures_cli();

    // init logging singleton
    Logging::try_init(cli.log_level())?;

    let config = match cli.config_path() {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::from_env()?,
    };

    match cli.command() {
        Command::Locate => {
            let project_repo = lookup_project_repo()?;
            let binary = locate_bouncer_binary(&project_repo, config.bouncer_under_test()?)?;
            println!("{}", binary.display());
        }
        Command::Kind(KindCommand::Up) => {
            // always kept, the cluster must outlive this command
            let mut cluster = KindCluster::new(&config.kind.cluster_name, true, SystemCli)?;
            cluster.start()?;
            info!(cluster = cluster.name(), "kind cluster is up");
        }
        Command::Kind(KindCommand::Down) => {
            let mut cluster = KindCluster::new(&config.kind.cluster_name, true, SystemCli)?;
            cluster.delete()?;
        }
    }

    Ok(())
}
