//! GovernDAO command-line client.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use governdao_engine::{EngineConfig, ReconciliationEngine, Session, VoteOutcome};
use governdao_gateway::RpcGateway;
use governdao_store_lmdb::{LmdbEnvironment, LmdbStateStore};
use governdao_types::{Chain, Proposal, ProposalId, Timestamp, TxHash};
use governdao_utils::{format_remaining, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "governdao", about = "GovernDAO governance voting client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GOVERNDAO_CONFIG")]
    config: Option<PathBuf>,

    /// Governance relay node endpoint.
    #[arg(long, env = "GOVERNDAO_RPC_URL")]
    rpc_url: Option<String>,

    /// Governance contract address.
    #[arg(long, env = "GOVERNDAO_CONTRACT")]
    contract: Option<String>,

    /// Directory holding the local cache.
    #[arg(long, env = "GOVERNDAO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Account to act as. Without it only cached data is shown.
    #[arg(long, env = "GOVERNDAO_ACCOUNT")]
    account: Option<String>,

    /// Chain to use, e.g. "polygon-mumbai". Remembered for later runs.
    #[arg(long, env = "GOVERNDAO_CHAIN")]
    chain: Option<Chain>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GOVERNDAO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GOVERNDAO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List proposals.
    Proposals {
        /// Order as a results page: completed, then active, then upcoming.
        #[arg(long)]
        results: bool,
    },
    /// Vote on a proposal.
    Vote {
        /// Proposal id.
        id: String,
        /// Vote in favour.
        #[arg(long = "for", conflicts_with = "against")]
        in_favour: bool,
        /// Vote against.
        #[arg(long)]
        against: bool,
        /// Wait for the chain to confirm the new tally before exiting.
        #[arg(long)]
        wait: bool,
    },
    /// Submit a new proposal.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Voting period, in hours from now.
        #[arg(long, default_value_t = 72)]
        hours: u64,
    },
    /// Show the account's votes and the transaction history.
    History,
    /// Print the block explorer link for a transaction.
    Explorer {
        /// Transaction hash.
        hash: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(contract) = &cli.contract {
        config.contract_address = contract.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    let environment = LmdbEnvironment::open_default(&config.data_dir)
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;
    let store = Arc::new(LmdbStateStore::open(&environment)?);
    let gateway = Arc::new(RpcGateway::new(&config.rpc_url, &config.contract_address)?);
    tracing::debug!(
        rpc_url = %gateway.node_url(),
        contract = %gateway.contract(),
        "using governance relay"
    );

    let engine = ReconciliationEngine::builder(gateway, store)
        .config(config.clone())
        .build();
    if let Some(chain) = cli.chain {
        engine.select_chain(chain);
    }
    let session = match cli.account {
        Some(account) => Session::connected(account, engine.selected_chain()),
        None => Session::disconnected(),
    };
    engine.activate(&session);

    match cli.command {
        Command::Proposals { results } => {
            refresh(&engine, &session).await?;
            let proposals = if results {
                engine.view().results()
            } else {
                engine.displayed_proposals(&session)
            };
            if proposals.is_empty() {
                println!("no proposals");
            }
            let view = engine.view();
            for proposal in &proposals {
                let mark = match view.vote_of(&proposal.id) {
                    Some(choice) => format!("  (you voted {choice})"),
                    None => String::new(),
                };
                println!("{}{mark}", describe(proposal, Timestamp::now()));
            }
        }
        Command::Vote {
            id,
            in_favour,
            against,
            wait,
        } => {
            if !in_favour && !against {
                bail!("pass --for or --against");
            }
            refresh(&engine, &session).await?;
            let id = ProposalId::new(id);
            let outcome = engine.cast_vote(&session, &id, in_favour).await?;
            match &outcome {
                VoteOutcome::Submitted(record) => {
                    println!("vote submitted: {}", engine.explorer_url_for(&session, &record.hash));
                }
                VoteOutcome::LocalOnly { reason } => {
                    println!("vote recorded locally only: {reason}");
                }
                VoteOutcome::AlreadyVoted(choice) => {
                    println!("already voted {choice} on proposal {id}");
                }
            }
            if wait && outcome.is_submitted() {
                // Give the scheduled re-read time to land.
                tokio::time::sleep(config.propagation_delay() * 2).await;
            }
            if let Some(proposal) = engine.view().proposal(&id) {
                println!("{}", describe(proposal, Timestamp::now()));
            }
        }
        Command::Create {
            title,
            description,
            hours,
        } => {
            let deadline = Timestamp::new(Timestamp::now().as_secs() + hours * 3_600);
            let record = engine
                .create_proposal(&session, &title, &description, deadline)
                .await?;
            println!(
                "proposal submitted: {}",
                engine.explorer_url_for(&session, &record.hash)
            );
        }
        Command::History => {
            refresh(&engine, &session).await?;
            let view = engine.view();
            if session.is_connected() {
                println!("votes:");
                for entry in view.voting_history() {
                    println!("  #{} {}: {}", entry.proposal_id, entry.title, entry.choice);
                }
            }
            println!("transactions:");
            for tx in &view.transactions {
                let subject = if tx.proposal_id.is_pending() {
                    "new proposal".to_string()
                } else {
                    format!("proposal #{}", tx.proposal_id)
                };
                println!(
                    "  {} {} {} at {}  {}",
                    tx.kind,
                    subject,
                    tx.hash,
                    tx.timestamp,
                    engine.explorer_url_for(&session, &tx.hash)
                );
            }
        }
        Command::Explorer { hash } => {
            println!("{}", engine.explorer_url_for(&session, &TxHash::new(hash)));
        }
    }

    Ok(())
}

/// Reload from the chain when an account is connected.
async fn refresh(engine: &ReconciliationEngine, session: &Session) -> anyhow::Result<()> {
    if session.is_connected() {
        engine.load_all(session).await?;
    }
    Ok(())
}

fn describe(proposal: &Proposal, now: Timestamp) -> String {
    let remaining = format_remaining(proposal.deadline.remaining_from(now));
    format!(
        "#{} [{}] {}  for {} / against {} ({:.0}% for)  {}",
        proposal.id,
        proposal.status,
        proposal.title,
        proposal.votes.for_votes,
        proposal.votes.against_votes,
        proposal.votes.for_percentage(),
        remaining,
    )
}
