//! Top-level orchestration: parses already-validated CLI arguments into a
//! `ConnectionSpec`/`SampleConfig`/`FilterController`, drives introspection,
//! resolution, sampling, and emission in sequence, and writes the dump to
//! stdout. Mirrors the teacher's `cmd::run` one-function-per-command shape,
//! collapsed to this crate's single command.

use crate::cli::Cli;
use crate::driver::{self, ConnectionSpec, Protocol};
use crate::emitter::{self, EmitOptions};
use crate::error::DumpError;
use crate::filter::FilterController;
use crate::resolver;
use crate::sample::{self, SampleConfig};
use crate::schema::introspect::{self, IntrospectOptions};
use anyhow::{Context, Result};
use dialoguer::Password;
use std::io;

pub fn run(cli: Cli) -> Result<()> {
    let protocol = driver::Protocol::parse(&cli.protocol)
        .ok_or_else(|| DumpError::UnknownDriver { name: cli.protocol.clone() })?;

    let password = resolve_password(&cli)?;
    let user = cli.user.clone().unwrap_or_else(whoami);

    let spec = ConnectionSpec {
        host: cli.host.clone(),
        port: cli.port,
        protocol,
        user,
        password,
        database: cli.database.clone(),
    };

    let mut driver = driver::open(&spec).context("opening connection")?;

    let version = driver.variable("version")?;
    let parsed = driver::ServerVersion::parse(&version)
        .ok_or_else(|| DumpError::UnsupportedServerVersion { version: version.clone() })?;
    if parsed.major != 5 {
        return Err(DumpError::UnsupportedServerVersion { version }.into());
    }

    let mut schema = introspect::introspect(
        driver.as_mut(),
        &cli.database,
        &IntrospectOptions { routines: cli.routines, triggers: cli.triggers },
    )
    .context("introspecting schema")?;

    apply_user_constraints(&mut schema, &cli.constraints)?;

    let order = resolver::resolve(&schema)?;

    let mut filters = FilterController::new();
    filters.set_commands(&cli.filters)?;

    let sample_config = SampleConfig {
        limit: cli.limit,
        skip_lock_tables: cli.skip_lock_tables || protocol == Protocol::Memory,
        null_parents_skip_children: true,
    };

    let stats = sample::sample(driver.as_mut(), &mut schema, &order, &sample_config, &filters)
        .context("sampling rows")?;

    for warning in &stats.warnings {
        eprintln!("warning: {warning}");
    }

    driver.close()?;

    let emit_opts = EmitOptions {
        create_database: !cli.no_create_database,
        add_drop_table: !cli.skip_add_drop_table,
        extended_insert: cli.extended_insert,
        rename_database: cli.rename_database.clone(),
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    emitter::emit(&mut handle, &schema, &emit_opts).context("writing dump")?;

    Ok(())
}

fn resolve_password(cli: &Cli) -> Result<Option<String>> {
    match &cli.password {
        None => Ok(None),
        Some(p) if !p.is_empty() => {
            eprintln!("warning: passing a password on the command line is visible to other users on this host");
            Ok(Some(p.clone()))
        }
        Some(_) => {
            let entered = Password::new()
                .with_prompt("Password")
                .interact()
                .context("reading password")?;
            Ok(Some(entered))
        }
    }
}

fn whoami() -> String {
    std::env::var("USER").or_else(|_| std::env::var("USERNAME")).unwrap_or_else(|_| "root".to_string())
}

fn apply_user_constraints(schema: &mut crate::schema::Schema, specs: &[String]) -> Result<(), DumpError> {
    for raw in specs {
        let (child, parent) = raw
            .split_once(' ')
            .ok_or_else(|| DumpError::ConstraintSpec { raw: raw.clone() })?;
        let (child_table, child_column) = child
            .split_once('.')
            .ok_or_else(|| DumpError::ConstraintSpec { raw: raw.clone() })?;
        let (parent_table, parent_column) = parent
            .split_once('.')
            .ok_or_else(|| DumpError::ConstraintSpec { raw: raw.clone() })?;

        let parent_idx = schema
            .table_index(parent_table)
            .ok_or_else(|| DumpError::ConstraintSpec { raw: raw.clone() })?;

        schema.tables[parent_idx].incoming_edges.push(crate::schema::Constraint {
            referenced_column: parent_column.to_string(),
            referencing_table: child_table.to_string(),
            referencing_column: child_column.to_string(),
        });
    }
    Ok(())
}
