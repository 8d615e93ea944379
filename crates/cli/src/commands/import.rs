use std::fs;
use std::path::Path;

use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_core::{pricelist, ImportReconciler, ReviewedProduct};
use cotiza_db::{connect, migrations, PoolSettings, SqlCatalogStore};

use crate::commands::{build_runtime, CommandResult};

/// Parse a price-list PDF. Without `--commit` this prints the preview the
/// admin UI would show; with it, every parsed product is applied to the
/// catalog (the no-review path for operators working from the terminal).
pub fn run(file: &Path, commit: bool, replace: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let document = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "read_file",
                format!("could not read {}: {error}", file.display()),
                4,
            );
        }
    };

    let preview = match pricelist::parse_with_limit(&document, config.import.max_document_bytes) {
        Ok(preview) => preview,
        Err(error) => {
            return CommandResult::failure("import", "parse", error.to_string(), 5);
        }
    };

    if !commit {
        return match serde_json::to_string_pretty(&preview) {
            Ok(json) => CommandResult { exit_code: 0, output: json },
            Err(error) => CommandResult::failure("import", "serialization", error.to_string(), 6),
        };
    }

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "import",
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

        let store = SqlCatalogStore::new(pool.clone());
        let products: Vec<ReviewedProduct> =
            preview.products.into_iter().map(ReviewedProduct::from).collect();
        let summary = ImportReconciler::new(&store)
            .confirm(products, preview.payment_conditions, replace)
            .await
            .map_err(|error| ("import", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => {
            let exit_code = if summary.errors.is_empty() { 0 } else { 1 };
            let message = format!(
                "imported {}, updated {}, payment conditions {}, errors: {}",
                summary.imported,
                summary.updated,
                summary.payment_conditions_imported,
                if summary.errors.is_empty() {
                    "none".to_string()
                } else {
                    summary.errors.join("; ")
                }
            );
            if exit_code == 0 {
                CommandResult::success("import", message)
            } else {
                CommandResult::failure("import", "partial_failure", message, exit_code)
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("import", error_class, message, exit_code)
        }
    }
}
