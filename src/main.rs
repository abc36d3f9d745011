// website - migration runner

use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use website::{
    codegen::Dialect,
    config::Config,
    database::Database,
    migrations::MigrationExecutor,
    schemas::{create_schema_registry, validate_schemas},
    AppError,
};

fn print_usage() {
    eprintln!("Usage: website <command>");
    eprintln!("Commands:");
    eprintln!("  migrate                          - Apply all unapplied migrations");
    eprintln!("  migrate <app> zero               - Unapply every migration of <app>");
    eprintln!("  showmigrations                   - List migrations and whether they are applied");
    eprintln!("  sqlmigrate <app> <name> [--postgres] - Print the SQL of one migration");
    eprintln!("  inspect                          - Print the registered models as JSON");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let config = Config::from_env()?;
    validate_schemas(&config.auth).map_err(AppError::SchemaError)?;

    match command.as_str() {
        "migrate" => migrate(&config, &args[1..]).await?,
        "showmigrations" => show_migrations(&config).await?,
        "sqlmigrate" => sql_migrate(&config, &args[1..]).await?,
        "inspect" => inspect()?,
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }

    Ok(())
}

async fn executor(config: &Config) -> anyhow::Result<MigrationExecutor> {
    let database = Database::connect(&config.database).await?;
    database.health_check().await?;
    Ok(MigrationExecutor::with_default_migrations(
        database.pool,
        config.auth.clone(),
    )?)
}

async fn migrate(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let executor = executor(config).await?;

    match args {
        [] => {
            let applied = executor.migrate().await?;
            for key in &applied {
                println!("  Applying {}... OK", key);
            }
        }
        [app, target] if target == "zero" => {
            let reversed = executor.unapply_app(app).await?;
            for key in &reversed {
                println!("  Unapplying {}... OK", key);
            }
        }
        _ => anyhow::bail!("migrate accepts no arguments or '<app> zero'"),
    }
    Ok(())
}

async fn show_migrations(config: &Config) -> anyhow::Result<()> {
    let executor = executor(config).await?;
    let mut current_app = String::new();

    for status in executor.show().await? {
        if status.key.app_label != current_app {
            current_app = status.key.app_label.clone();
            println!("{}", current_app);
        }
        let mark = if status.applied { "X" } else { " " };
        println!(" [{}] {}", mark, status.key.name);
    }
    Ok(())
}

async fn sql_migrate(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let (app, name, dialect) = match args {
        [app, name] => (app, name, Dialect::Sqlite),
        [app, name, flag] if flag == "--postgres" => (app, name, Dialect::Postgres),
        _ => anyhow::bail!("usage: sqlmigrate <app> <name> [--postgres]"),
    };

    let executor = executor(config).await?;
    for statement in executor.sql_for(app, name, dialect)? {
        println!("{};", statement);
    }
    Ok(())
}

fn inspect() -> anyhow::Result<()> {
    let registry = create_schema_registry();
    let models: Vec<_> = registry.models().collect();
    println!("{}", serde_json::to_string_pretty(&models)?);
    Ok(())
}
