use std::path::PathBuf;

use chord_node::config::Config;
use chord_node::config::DEFAULT_CONFIG_PATH;
use chord_node::logging::init_logging;
use chord_node::logging::LogLevel;
use chord_node::prelude::chord_rpc::jsonrpc::Client;
use chord_node::processor::run_node;
use chord_node::server::run_nameserver;
use chord_node::util;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[arg(long, value_enum, env)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// Run a ring node.
    Node(NodeArgs),
    /// Run the membership nameserver.
    Nameserver(NameserverArgs),
    /// Write a default config file.
    InitConfig(InitConfigArgs),
    /// Ask a running node to leave the ring.
    Leave(LeaveArgs),
}

#[derive(Args, Debug)]
struct NodeArgs {
    #[arg(long, short = 'c', env = "CHORD_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env, help = "listen address of the ring rpc server")]
    rpc_addr: Option<String>,

    #[arg(long, env, help = "listen address of the key/value front end")]
    http_addr: Option<String>,

    #[arg(long, env, help = "address advertised to other nodes")]
    external_address: Option<String>,

    #[arg(long, env, help = "host:port of the nameserver")]
    nameserver: Option<String>,

    #[arg(long, env, help = "seconds between stabilization cycles")]
    stabilize_interval: Option<u64>,

    #[arg(long, env)]
    rpc_timeout_ms: Option<u64>,

    #[arg(long, env)]
    successor_list_size: Option<usize>,

    #[arg(long, env)]
    max_lookup_hops: Option<usize>,

    #[arg(long, env, help = "offer this node to the fingers of others when joining")]
    announce_on_join: bool,
}

#[derive(Args, Debug)]
struct NameserverArgs {
    #[arg(long, default_value = "127.0.0.1:8000", env = "NAMESERVER_ADDR")]
    addr: String,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    path: PathBuf,
}

#[derive(Args, Debug)]
struct LeaveArgs {
    #[arg(long, default_value = "127.0.0.1:8011", help = "rpc address of the node")]
    endpoint: String,
}

impl NodeArgs {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::read_fs(path)?,
            None => {
                let default_path = util::expand_home(DEFAULT_CONFIG_PATH)?;
                if default_path.is_file() {
                    Config::read_fs(default_path)?
                } else {
                    Config::default()
                }
            }
        };
        if let Some(v) = self.rpc_addr {
            config.rpc_addr = v;
        }
        if let Some(v) = self.http_addr {
            config.http_addr = v;
        }
        if let Some(v) = self.external_address {
            config.external_address = Some(v);
        }
        if let Some(v) = self.nameserver {
            config.nameserver = Some(v);
        }
        if let Some(v) = self.stabilize_interval {
            config.stabilize_interval = v;
        }
        if let Some(v) = self.rpc_timeout_ms {
            config.rpc_timeout_ms = v;
        }
        if let Some(v) = self.successor_list_size {
            config.successor_list_size = v;
        }
        if let Some(v) = self.max_lookup_hops {
            config.max_lookup_hops = v;
        }
        if self.announce_on_join {
            config.announce_on_join = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Node(args) => {
            let config = args.into_config()?;
            init_logging(cli.log_level.unwrap_or(config.log_level));
            run_node(config).await
        }
        Command::Nameserver(args) => {
            init_logging(cli.log_level.unwrap_or(LogLevel::Info));
            let listener = util::bind(&args.addr)?;
            run_nameserver(listener, async {
                tokio::signal::ctrl_c().await.ok();
            })
            .await
        }
        Command::InitConfig(args) => {
            let path = Config::default().write_fs(&args.path)?;
            println!("Config written to {}", path);
            Ok(())
        }
        Command::Leave(args) => {
            init_logging(cli.log_level.unwrap_or(LogLevel::Warn));
            Client::new(&format!("http://{}", args.endpoint))
                .leave()
                .await?;
            println!("{} left the ring", args.endpoint);
            Ok(())
        }
    }
}
