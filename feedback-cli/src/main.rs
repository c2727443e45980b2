mod client;
mod server;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::client::RemoteArgs;
use crate::server::config::StorageBackend;
use crate::server::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "feedback")]
#[command(version)]
#[command(about = "Collect feedback submissions and manage them from an admin view", long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(ClapArgs, Debug)]
struct RemoteFlags {
    /// Base URL of a running feedback server
    #[arg(short = 'r', long = "remote")]
    remote: Option<String>,

    /// Admin username (falls back to ADMIN_USERNAME, then [remote] in the config file)
    #[arg(short = 'u', long = "username")]
    username: Option<String>,

    /// Admin password (falls back to ADMIN_PASSWORD, then [remote] in the config file)
    #[arg(short = 'p', long = "password")]
    password: Option<String>,

    /// Path to config file
    #[arg(short = 'c', long = "config", default_value = "feedback.toml")]
    config: String,
}

impl From<RemoteFlags> for RemoteArgs {
    fn from(flags: RemoteFlags) -> Self {
        RemoteArgs {
            remote: flags.remote,
            username: flags.username,
            password: flags.password,
            config_path: flags.config,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the feedback HTTP server
    Serve {
        /// Port to listen on
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Address to bind
        #[arg(long = "hostname")]
        hostname: Option<String>,

        /// Path to config file
        #[arg(short = 'c', long = "config", default_value = "feedback.toml")]
        config: String,

        /// Storage backend
        #[arg(short = 's', long = "storage", value_enum)]
        storage: Option<StorageBackend>,

        /// Backing JSON file for the json storage backend
        #[arg(short = 'f', long = "data-file")]
        data_file: Option<String>,

        /// Directory of static assets
        #[arg(long = "public-dir")]
        public_dir: Option<String>,
    },
    /// List submissions stored on a running server
    List {
        #[command(flatten)]
        remote: RemoteFlags,

        /// Print raw JSON instead of a summary table
        #[arg(long = "json")]
        json: bool,
    },
    /// Delete a submission on a running server
    Delete {
        /// Id of the submission to delete
        id: String,

        #[command(flatten)]
        remote: RemoteFlags,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Args::parse();
    match cli.cmd {
        Command::Serve {
            port,
            hostname,
            config,
            storage,
            data_file,
            public_dir,
        } => {
            server::run_serve(ServeArgs {
                config_path: config,
                port,
                hostname,
                storage,
                data_file,
                public_dir,
            })
            .await
        }
        Command::List { remote, json } => client::run_list(remote.into(), json).await,
        Command::Delete { id, remote } => client::run_delete(&id, remote.into()).await,
    }
}
