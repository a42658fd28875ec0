//! `meshtag`: encode and inspect Meshtastic contact tokens, and rehearse NFC tag
//! writes against a simulated reader.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use eyre::{eyre, Result, WrapErr};
use meshtag_core::{
    contact_record_for_active_device, decode_contact_token, defaults::DEFAULT_REPOLL_DELAY_MS,
    encode_contact_token, ndef, ContactIdentity, ContactRecord, DeviceIdentity, IdentitySource,
    SessionConfig, TagCapability, TagWriteSession, WriteOutcome,
};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod simulate;

use simulate::{Scenario, SimulatedDriver, TracingLogger};

#[derive(Debug, Parser)]
#[command(name = "meshtag", version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `meshtag_core=debug`.
    #[arg(long, env = "MESHTAG_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a contact token for a node.
    Encode(EncodeArgs),
    /// Decode a contact token.
    Decode {
        token: String,
        /// Print the contact as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the NDEF message that would be written to a tag, as hex.
    Ndef { token: String },
    /// Write a token through a simulated NFC reader session.
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct EncodeArgs {
    /// Node number of the shared device.
    #[arg(long, default_value_t = 0)]
    node_num: u64,
    /// Node id; derived from the node number when omitted.
    #[arg(long)]
    id: Option<String>,
    #[arg(long, default_value = "")]
    long_name: String,
    #[arg(long, default_value = "")]
    short_name: String,
    /// Public key as hex.
    #[arg(long)]
    public_key: Option<String>,
    /// Do not mark the contact as manually verified.
    #[arg(long)]
    unverified: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CapabilityArg {
    ReadWrite,
    ReadOnly,
    NotSupported,
}

impl From<CapabilityArg> for TagCapability {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::ReadWrite => Self::ReadWrite,
            CapabilityArg::ReadOnly => Self::ReadOnly,
            CapabilityArg::NotSupported => Self::NotSupported,
        }
    }
}

#[derive(Debug, Args)]
struct SimulateArgs {
    token: String,
    /// Tags presented at once on the first detection.
    #[arg(long, default_value_t = 1)]
    tags: u64,
    #[arg(long, value_enum, default_value_t = CapabilityArg::ReadWrite)]
    capability: CapabilityArg,
    #[arg(long)]
    fail_connect: bool,
    #[arg(long)]
    fail_query: bool,
    #[arg(long)]
    fail_write: bool,
    /// Delay before polling again after several tags were presented.
    #[arg(long, env = "MESHTAG_REPOLL_DELAY_MS", default_value_t = DEFAULT_REPOLL_DELAY_MS)]
    repoll_delay_ms: u64,
}

/// Identity assembled from command line flags.
struct FlagIdentity(Option<DeviceIdentity>);

impl IdentitySource for FlagIdentity {
    fn active_device(&self) -> Option<DeviceIdentity> {
        self.0.clone()
    }
}

impl EncodeArgs {
    fn device(&self) -> Result<Option<DeviceIdentity>> {
        let public_key = self
            .public_key
            .as_deref()
            .map(hex::decode)
            .transpose()
            .wrap_err("public key is not valid hex")?
            .unwrap_or_default();

        let anonymous = self.node_num == 0
            && self.id.is_none()
            && self.long_name.is_empty()
            && self.short_name.is_empty()
            && public_key.is_empty();
        if anonymous {
            return Ok(None);
        }

        Ok(Some(DeviceIdentity {
            node_num: self.node_num,
            user: ContactIdentity {
                id: self
                    .id
                    .clone()
                    .unwrap_or_else(|| node_id(self.node_num)),
                long_name: self.long_name.clone(),
                short_name: self.short_name.clone(),
                public_key,
                ..ContactIdentity::default()
            },
        }))
    }

    fn record(&self) -> Result<ContactRecord> {
        let source = Arc::new(FlagIdentity(self.device()?));
        let mut record = contact_record_for_active_device(source)?;
        record.verified = !self.unverified;
        Ok(record)
    }
}

fn node_id(node_num: u64) -> String {
    format!("!{node_num:08x}")
}

#[derive(Debug, Serialize)]
struct ContactView {
    device_id: u32,
    node_id: String,
    verified: bool,
    identity: Option<IdentityView>,
}

#[derive(Debug, Serialize)]
struct IdentityView {
    id: String,
    long_name: String,
    short_name: String,
    hw_model: i32,
    is_licensed: bool,
    role: i32,
    public_key: String,
    is_unmessagable: Option<bool>,
}

impl TryFrom<&ContactRecord> for ContactView {
    type Error = eyre::Report;

    fn try_from(record: &ContactRecord) -> Result<Self> {
        let identity = if record.has_identity() {
            let identity = record.identity_details()?;
            Some(IdentityView {
                id: identity.id,
                long_name: identity.long_name,
                short_name: identity.short_name,
                hw_model: identity.hw_model,
                is_licensed: identity.is_licensed,
                role: identity.role,
                public_key: hex::encode(identity.public_key),
                is_unmessagable: identity.is_unmessagable,
            })
        } else {
            None
        };

        Ok(Self {
            device_id: record.device_id,
            node_id: node_id(u64::from(record.device_id)),
            verified: record.verified,
            identity,
        })
    }
}

impl ContactView {
    fn print(&self) {
        println!("device_id: {} ({})", self.device_id, self.node_id);
        println!("verified:  {}", self.verified);
        match &self.identity {
            Some(identity) => {
                println!("id:        {}", identity.id);
                println!("long_name: {}", identity.long_name);
                println!("short_name: {}", identity.short_name);
                if !identity.public_key.is_empty() {
                    println!("public_key: {}", identity.public_key);
                }
            }
            None => println!("identity:  (none)"),
        }
    }
}

async fn simulate(args: SimulateArgs) -> Result<()> {
    let driver = Arc::new(SimulatedDriver::new(Scenario {
        tags: args.tags,
        capability: args.capability.into(),
        fail_connect: args.fail_connect,
        fail_query: args.fail_query,
        fail_write: args.fail_write,
    }));
    let config = SessionConfig {
        repoll_delay_ms: args.repoll_delay_ms,
        ..SessionConfig::default()
    };
    let session = TagWriteSession::new(driver.clone(), config, Some(Arc::new(TracingLogger)));

    let outcome = session.scan(args.token).await?;

    for entry in driver.journal() {
        println!("  {entry}");
    }
    match outcome {
        WriteOutcome::Success { message } => {
            println!("{message}");
            Ok(())
        }
        WriteOutcome::Failure { reason, message } => Err(eyre!("{reason}: {message}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_new(&cli.log).wrap_err("invalid log filter")?)
        .init();

    match cli.command {
        Command::Encode(args) => {
            let record = args.record()?;
            if !record.has_identity() {
                tracing::warn!("no node identity given, sharing an empty contact");
            }
            println!("{}", encode_contact_token(record));
        }
        Command::Decode { token, json } => {
            let record = decode_contact_token(&token)?;
            let view = ContactView::try_from(&record)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                view.print();
            }
        }
        Command::Ndef { token } => {
            println!("{}", hex::encode(ndef::build_uri_message(&token)?));
        }
        Command::Simulate(args) => simulate(args).await?,
    }

    Ok(())
}
