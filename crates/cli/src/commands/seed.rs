use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_db::{connect, fixtures, migrations, PoolSettings};

use crate::commands::{build_runtime, CommandResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(
            &config.database.url,
            PoolSettings::new(config.database.max_connections, config.database.timeout_secs),
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let summary = fixtures::seed_demo_catalog(&pool)
            .await
            .map_err(|error| ("seed", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) if summary.machines == 0 => {
            CommandResult::success("seed", "catalog already populated, nothing to do")
        }
        Ok(summary) => CommandResult::success(
            "seed",
            format!(
                "seeded {} machines and {} payment conditions",
                summary.machines, summary.payment_conditions
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
