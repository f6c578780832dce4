//! Crowbar Role Catalog CLI
//!
//! Admin entry point for the role catalog:
//! - Schema migration
//! - Role create, update, delete, show and list
//! - Attaching element orders and instances to a role
//!
//! Results print as JSON on stdout. Failures exit non-zero with the error
//! code and message.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use cb_config::{AppConfig, ConfigLoader};
use cb_platform::{
    BarclampId, CreateRoleCommand, CreateRoleUseCase, Database, DeleteRoleCommand,
    DeleteRoleUseCase, ExecutionContext, Role, RoleElementOrder, RoleElementOrderRepository,
    RoleInstance, RoleInstanceRepository, RoleRepository, SqliteUnitOfWork, UpdateRoleCommand,
    UpdateRoleUseCase, UseCaseError, UseCaseResult,
};

/// Crowbar role catalog administration
#[derive(Parser, Debug)]
#[command(name = "cb-roles")]
#[command(about = "Manage Crowbar roles, their element orders and instances")]
struct Args {
    /// Config file (defaults to CROWBAR_CONFIG, then the standard search paths)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Principal recorded on events and audit rows
    #[arg(long, global = true, env = "CROWBAR_PRINCIPAL", default_value = "cli")]
    principal: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create missing tables and indexes
    Migrate,

    /// Create a role
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        barclamp_id: i64,

        #[arg(long)]
        states: Option<String>,

        /// Execution-order hint
        #[arg(long, alias = "priority")]
        order: Option<i32>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Change fields of a role
    Update {
        role_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        barclamp_id: Option<i64>,

        #[arg(long)]
        states: Option<String>,

        #[arg(long, alias = "priority")]
        order: Option<i32>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a role with its element orders and instances
    Delete { role_id: String },

    /// Show a role with its element orders and instances
    Show { role_id: String },

    /// List roles, optionally of one barclamp, in execution order
    List {
        #[arg(long)]
        barclamp_id: Option<i64>,
    },

    /// Attach an element order to a role
    AddElementOrder {
        role_id: String,

        #[arg(long)]
        order: i32,
    },

    /// Record a role applied to a node
    AddInstance {
        role_id: String,

        #[arg(long)]
        node: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleDetails {
    #[serde(flatten)]
    role: Role,
    element_orders: Vec<RoleElementOrder>,
    instances: Vec<RoleInstance>,
}

struct Catalog {
    roles: Arc<RoleRepository>,
    element_orders: Arc<RoleElementOrderRepository>,
    instances: Arc<RoleInstanceRepository>,
    unit_of_work: Arc<SqliteUnitOfWork>,
}

impl Catalog {
    fn new(db: &Database) -> Self {
        Self {
            roles: Arc::new(RoleRepository::new(db)),
            element_orders: Arc::new(RoleElementOrderRepository::new(db)),
            instances: Arc::new(RoleInstanceRepository::new(db)),
            unit_of_work: Arc::new(SqliteUnitOfWork::new(db.pool().clone())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;

    init_logging(&config);
    debug!(?config, "Configuration loaded");

    let db = Database::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    if config.dev_mode || matches!(args.command, Command::Migrate) {
        db.migrate().await.context("Failed to apply schema")?;
    }

    let result = run(args, &db).await;
    db.close().await;
    result
}

fn init_logging(config: &AppConfig) {
    let filter = if config.dev_mode && config.logging.filter == "info" {
        "debug"
    } else {
        config.logging.filter.as_str()
    };
    cb_common::init_logging("cb-roles", config.logging.format, filter);
}

async fn run(args: Args, db: &Database) -> Result<()> {
    let catalog = Catalog::new(db);
    let ctx = ExecutionContext::create(&args.principal);

    match args.command {
        Command::Migrate => {
            info!("Schema is up to date");
        }

        Command::Create {
            name,
            barclamp_id,
            states,
            order,
            description,
        } => {
            let use_case = CreateRoleUseCase::new(catalog.roles.clone(), catalog.unit_of_work.clone());
            let command = CreateRoleCommand {
                name,
                states,
                order,
                description,
                barclamp_id: BarclampId(barclamp_id),
            };
            let event = outcome(use_case.execute(command, ctx).await)?;
            info!(role_id = %event.role_id, name = %event.name, "Role created");
            print_json(&event)?;
        }

        Command::Update {
            role_id,
            name,
            barclamp_id,
            states,
            order,
            description,
        } => {
            let use_case = UpdateRoleUseCase::new(catalog.roles.clone(), catalog.unit_of_work.clone());
            let command = UpdateRoleCommand {
                role_id,
                name,
                states,
                order,
                description,
                barclamp_id: barclamp_id.map(BarclampId),
            };
            let event = outcome(use_case.execute(command, ctx).await)?;
            info!(role_id = %event.role_id, "Role updated");
            print_json(&event)?;
        }

        Command::Delete { role_id } => {
            let use_case =
                DeleteRoleUseCase::new(catalog.roles.clone(), catalog.unit_of_work.clone());
            let event = outcome(use_case.execute(DeleteRoleCommand { role_id }, ctx).await)?;
            info!(
                role_id = %event.role_id,
                element_orders = event.element_orders_removed,
                instances = event.instances_removed,
                "Role deleted"
            );
            print_json(&event)?;
        }

        Command::Show { role_id } => {
            let Some(role) = catalog.roles.find_by_id(&role_id).await? else {
                bail!("ROLE_NOT_FOUND: Role with ID '{}' not found", role_id);
            };
            let details = RoleDetails {
                element_orders: catalog.element_orders.find_by_role(&role.id).await?,
                instances: catalog.instances.find_by_role(&role.id).await?,
                role,
            };
            print_json(&details)?;
        }

        Command::List { barclamp_id } => {
            let roles = match barclamp_id {
                Some(id) => catalog.roles.find_by_barclamp(BarclampId(id)).await?,
                None => catalog.roles.find_all().await?,
            };
            print_json(&roles)?;
        }

        Command::AddElementOrder { role_id, order } => {
            let element_order = RoleElementOrder::new(role_id, order);
            catalog.element_orders.insert(&element_order).await?;
            print_json(&element_order)?;
        }

        Command::AddInstance { role_id, node } => {
            let instance = RoleInstance::new(role_id, node);
            catalog.instances.insert(&instance).await?;
            print_json(&instance)?;
        }
    }

    Ok(())
}

fn outcome<T>(result: UseCaseResult<T>) -> Result<T> {
    result
        .into_result()
        .map_err(|e: UseCaseError| anyhow::anyhow!("{}: {}", e.code(), e.message()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
