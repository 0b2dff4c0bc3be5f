// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Command-line access to a labstore database.
//!
//! Usage:
//!   labstore --db ./labs seed
//!   labstore --db ./labs list lab
//!   labstore --db ./labs query lab '{"selector":{"classID":"class1"}}'
//!   labstore --db ./labs page instance --page-size 2 --bookmark <token>
//!   labstore --db ./labs index submission owner~name Tom
//!   labstore --db ./labs create class '{"docType":"class","ID":"class7","name":"OS","content":"","owner":""}' --caller Ana --attribute class.creator=true
//!   labstore --db ./labs update lab lab1 '{"docType":"lab","ID":"lab1",...}' --caller Tom
//!   labstore --db ./labs transfer instance instance3 Tom --caller Sam

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use labstore::kinds::{seed_demo, Class, Instance, Lab, Submission};
use labstore::record::{Caller, Predicate, Record, RecordContract};
use labstore::storage::RocksStore;
use labstore::{QueryLimits, StoreConfig};

#[derive(Parser)]
#[command(name = "labstore")]
#[command(about = "Inspect and edit an index-consistent lab record store", long_about = None)]
struct Cli {
    /// Database directory
    #[arg(long, global = true, default_value = "labstore.db")]
    db: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Class,
    Lab,
    Instance,
    Submission,
}

#[derive(Subcommand)]
enum Command {
    /// Load the demo records of every kind
    Seed,

    /// List every record of a kind
    List { kind: Kind },

    /// Read one record
    Get { kind: Kind, id: String },

    /// Run a selector such as '{"selector":{"owner":"Tom"}}'
    Query { kind: Kind, selector: String },

    /// Fetch one page of a query or of the whole kind
    Page {
        kind: Kind,

        /// Selector; omit to page over every record of the kind
        #[arg(long)]
        selector: Option<String>,

        #[arg(long, default_value = "10")]
        page_size: i32,

        /// Bookmark returned by the previous page
        #[arg(long, default_value = "")]
        bookmark: String,
    },

    /// Resolve records through an index prefix scan
    Index {
        kind: Kind,
        index: String,
        values: Vec<String>,
    },

    /// Store a new record given as JSON
    Create {
        kind: Kind,
        document: String,

        /// Identity submitting the record
        #[arg(long)]
        caller: String,

        /// Caller attribute as name=value, e.g. class.creator=true
        #[arg(long = "attribute", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Replace a record with the given JSON; id, docType and owner must not change
    Update {
        kind: Kind,
        id: String,
        document: String,

        /// Identity of the owner
        #[arg(long)]
        caller: String,
    },

    /// Hand a record over to a new owner
    Transfer {
        kind: Kind,
        id: String,
        new_owner: String,

        /// Identity of the current owner
        #[arg(long)]
        caller: String,
    },

    /// Delete a record and its index entries
    Delete {
        kind: Kind,
        id: String,

        /// Identity of the owner
        #[arg(long)]
        caller: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(RocksStore::open_with_config(&StoreConfig::new(&cli.db))?);

    match cli.command.kind() {
        None => print_json(&seed_demo(store)?),
        Some(Kind::Class) => run::<Class>(store, cli.command),
        Some(Kind::Lab) => run::<Lab>(store, cli.command),
        Some(Kind::Instance) => run::<Instance>(store, cli.command),
        Some(Kind::Submission) => run::<Submission>(store, cli.command),
    }
}

impl Command {
    fn kind(&self) -> Option<Kind> {
        match self {
            Command::Seed => None,
            Command::List { kind }
            | Command::Get { kind, .. }
            | Command::Query { kind, .. }
            | Command::Page { kind, .. }
            | Command::Index { kind, .. }
            | Command::Create { kind, .. }
            | Command::Update { kind, .. }
            | Command::Transfer { kind, .. }
            | Command::Delete { kind, .. } => Some(*kind),
        }
    }
}

fn run<R: Record>(store: Arc<RocksStore>, command: Command) -> Result<(), Box<dyn Error>> {
    let contract = RecordContract::<R, _>::new(store).with_limits(QueryLimits::default());

    match command {
        Command::Seed => Ok(()),
        Command::List { .. } => print_json(&contract.list_all()?),
        Command::Get { id, .. } => print_json(&contract.read(&id)?),
        Command::Query { selector, .. } => print_json(&contract.query_string(&selector)?),
        Command::Page {
            selector,
            page_size,
            bookmark,
            ..
        } => {
            let page = match selector {
                Some(selector) => {
                    contract.query_paginated(&Predicate::parse(&selector)?, page_size, &bookmark)?
                }
                None => contract.range_paginated("", "", page_size, &bookmark)?,
            };
            print_json(&page)
        }
        Command::Index { index, values, .. } => {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            print_json(&contract.query_by_index(&index, &values)?)
        }
        Command::Create {
            document,
            caller,
            attributes,
            ..
        } => {
            let record: R = serde_json::from_str(&document)?;
            let caller = attributes
                .into_iter()
                .fold(Caller::new(caller), |caller, (name, value)| {
                    caller.with_attribute(name, value)
                });
            print_json(&contract.create(&caller, record)?)
        }
        Command::Update {
            id,
            document,
            caller,
            ..
        } => {
            let replacement: R = serde_json::from_str(&document)?;
            let caller = Caller::new(caller);
            print_json(&contract.update(&id, &caller, |record| *record = replacement)?)
        }
        Command::Transfer {
            id,
            new_owner,
            caller,
            ..
        } => print_json(&contract.transfer(&id, &Caller::new(caller), &new_owner)?),
        Command::Delete { id, caller, .. } => {
            contract.delete(&id, &Caller::new(caller))?;
            println!("deleted {} {id}", R::DOC_TYPE);
            Ok(())
        }
    }
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
