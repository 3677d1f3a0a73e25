pub mod audit;
pub mod programmes;
pub mod schema;
pub mod seed;
pub mod serve;
pub mod shared;

use skt_config::SktConfig;

use crate::bootstrap;
use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler. `schema` is handled before the
/// configuration is loaded.
pub async fn dispatch(command: Commands, config: SktConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve::handle(&args, config).await,
        Commands::Seed(args) => {
            let svc = bootstrap::open_service(&config).await?;
            seed::handle(&args, &svc, flags).await
        }
        Commands::Programmes(args) => {
            let svc = bootstrap::open_service(&config).await?;
            programmes::handle(&args, &svc, flags).await
        }
        Commands::Audit(args) => {
            let svc = bootstrap::open_service(&config).await?;
            audit::handle(&args, &svc, flags).await
        }
        Commands::Schema(args) => schema::handle(&args, flags),
    }
}
