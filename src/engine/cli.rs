//! CLI command handlers: `pub` runs a producer that writes JSON lines to stdout, `sub` feeds JSON
//! lines from stdin to a consumer.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::io::{self, BufWriter};

use crate::engine::arg_parser::{Cli, Commands, PubArgs, SubArgs};
use crate::pipeline::{
    ConsumerConnector, JsonLinesSink, ProducerConnector, WireMessage, read_wire_messages,
};
use crate::types::{Field, FieldKind, Schema};
use crate::utils::{
    BridgeToml, ConsumerConfig, Defaults, ProducerConfig, apply_file_to_consumer,
    apply_file_to_producer, load_bridge_toml, setup_logging,
};

/// Dispatch to `pub` or `sub`. Config file values apply first, then CLI flags.
pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose);
    let config_path = cli.config_path();
    let file = load_bridge_toml(&config_path);
    if file.is_some() {
        debug!("loaded {}", config_path.display());
    }
    match &cli.command {
        Commands::Pub(args) => handle_pub(args, file.as_ref()),
        Commands::Sub(args) => handle_sub(args, file.as_ref()),
    }
}

/// Schema the CLI producer publishes: `id:int64`, `data:binary|utf8str`, optional `path:utf8str`.
pub fn publish_schema(text: bool, with_path: bool) -> Schema {
    let mut fields = vec![
        Field::new(Defaults::ID_FIELD, FieldKind::Int64),
        Field::new(
            Defaults::DATA_FIELD,
            if text {
                FieldKind::Utf8Str
            } else {
                FieldKind::Binary
            },
        ),
    ];
    if with_path {
        fields.push(Field::new(Defaults::PATH_FIELD, FieldKind::Utf8Str));
    }
    Schema::new(fields)
}

fn producer_config(args: &PubArgs, file: Option<&BridgeToml>) -> ProducerConfig {
    let mut config = ProducerConfig::new("", "");
    if let Some(file) = file {
        apply_file_to_producer(file, &mut config);
    }
    if let Some(path) = &args.path {
        config.path = path.clone();
    }
    if let Some(pattern) = &args.pattern {
        config.filename_rgx = pattern.clone();
    }
    if let Some(rate) = args.rate {
        config.publish_rate = rate;
    }
    if let Some(repeat) = args.repeat {
        config.repeat_count = repeat;
    }
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(transactional) = args.transactional {
        config.transactional = transactional;
    }
    if let Some(upsert) = args.upsert {
        config.publish_with_upsert = upsert;
    }
    if let Some(delay) = args.rescan_delay {
        config.rescan_delay_ms = delay;
    }
    config
}

fn consumer_config(args: &SubArgs, file: Option<&BridgeToml>) -> ConsumerConfig {
    let mut config = ConsumerConfig::new("", Defaults::DATA_FIELD);
    if let Some(file) = file {
        apply_file_to_consumer(file, &mut config);
    }
    if let Some(filename) = &args.filename {
        config.filename = filename.clone();
    }
    if let Some(field) = &args.field {
        config.data_field_name = field.clone();
    }
    config
}

fn handle_pub(args: &PubArgs, file: Option<&BridgeToml>) -> Result<()> {
    let config = producer_config(args, file);
    debug!("{:#?}", config);
    let schema = publish_schema(args.text, args.with_path);

    let mut connector = ProducerConnector::new(config).context("producer configuration")?;
    connector.on_schema_ready(&schema)?;
    let sink = JsonLinesSink::new(BufWriter::new(io::stdout()), &schema)?;

    let stop = connector.stop_signal();
    ctrlc::set_handler(move || {
        stop.stop();
    })
    .context("set Ctrl+C handler")?;

    connector.start(sink)?;
    if let Some(report) = connector.wait()? {
        info!(
            "published {} records in {} groups over {} cycles ({} skipped)",
            report.records, report.groups, report.cycles, report.skipped
        );
    }
    Ok(())
}

fn handle_sub(args: &SubArgs, file: Option<&BridgeToml>) -> Result<()> {
    let config = consumer_config(args, file);
    debug!("{:#?}", config);
    let mut connector = ConsumerConnector::new(config).context("consumer configuration")?;

    let stdin = io::stdin().lock();
    let mut schema_seen = false;
    for message in read_wire_messages(stdin) {
        match message? {
            WireMessage::Schema { schema } => {
                if schema_seen {
                    warn!("ignoring repeated schema message");
                    continue;
                }
                connector.on_schema_ready(&schema)?;
                schema_seen = true;
            }
            WireMessage::Group { group } => {
                if !schema_seen {
                    bail!("record group received before schema message");
                }
                connector.on_record_group(&group)?;
            }
        }
    }

    let totals = connector.totals();
    info!(
        "wrote {} files ({} skipped, {} failed)",
        totals.written, totals.skipped, totals.failed
    );
    Ok(())
}
