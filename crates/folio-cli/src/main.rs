use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_client::{
    load_follow_state, load_like_state, toggle_follow, toggle_like, Config, LocalState, OptimisticMutationExecutor,
    QueryCache, FOLLOWS, LIKES,
};
use folio_core::{AuthorId, BiteId, FollowState, LikeState, MutationOutcome, RemoteError, UserId};
use folio_store::{row, InMemoryStore, RemoteStore, SubscriptionFilter};

#[derive(Parser)]
#[command(name = "folio", version, about = "Optimistic like/follow demo over an in-memory row store")]
struct Cli {
    /// Config file (defaults to .folio/folio.toml under the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file
    Init,

    /// Print the effective configuration
    Config,

    /// Toggle a like on a quick bite
    Like {
        #[arg(long)]
        bite: String,
        #[arg(long, default_value = "demo-user")]
        user: String,
        /// Like count shown before the click
        #[arg(long, default_value_t = 10)]
        likes: u64,
        /// The user already likes the bite
        #[arg(long)]
        liked: bool,
        /// Make the remote write fail with a network error
        #[arg(long)]
        fail: bool,
    },

    /// Toggle following an author
    Follow {
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "demo-user")]
        user: String,
        #[arg(long, default_value_t = 0)]
        followers: u64,
        #[arg(long)]
        following: bool,
        #[arg(long)]
        fail: bool,
    },

    /// Subscribe to a table and print the changes a scripted writer makes
    Watch {
        #[arg(long, default_value = LIKES)]
        table: String,
        #[arg(long, default_value_t = 3)]
        events: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(p) => p,
        None => Config::config_path(&std::env::current_dir()?),
    };

    match cli.cmd {
        Command::Init => {
            Config::default().save_to(&config_path)?;
            println!("Wrote {}", config_path.display());
        }
        Command::Config => {
            let cfg = Config::load_or_default(&config_path)?;
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
        }
        Command::Like { bite, user, likes, liked, fail } => {
            let cfg = Config::load_or_default(&config_path)?;
            let store = Arc::new(cfg.build_store());
            let (user, bite) = (UserId::from_str(user), BiteId::from_str(bite));
            seed_likes(&store, &user, &bite, likes, liked).await?;

            let exec = OptimisticMutationExecutor::with_policy(Arc::new(QueryCache::new()), cfg.mutation.pending_policy);
            let state = LocalState::new(LikeState::new(liked, likes));
            if fail {
                store.fail_next(RemoteError::network("simulated network failure"));
            }

            let pending = exec.submit(&state, toggle_like(store.clone(), &user, &bite, state.get()));
            println!("optimistic: {:?}", state.get());
            report(pending.await);
            println!("final:      {:?}", state.get());
            let remote = load_like_state(&*store, &user, &bite, &cfg.retry).await?;
            println!("remote:     {:?}", remote);
        }
        Command::Follow { author, user, followers, following, fail } => {
            let cfg = Config::load_or_default(&config_path)?;
            let store = Arc::new(cfg.build_store());
            let (user, author) = (UserId::from_str(user), AuthorId::from_str(author));
            seed_follows(&store, &user, &author, followers, following).await?;

            let exec = OptimisticMutationExecutor::with_policy(Arc::new(QueryCache::new()), cfg.mutation.pending_policy);
            let state = LocalState::new(FollowState::new(following, followers));
            if fail {
                store.fail_next(RemoteError::network("simulated network failure"));
            }

            let pending = exec.submit(&state, toggle_follow(store.clone(), &user, &author, state.get()));
            println!("optimistic: {:?}", state.get());
            report(pending.await);
            println!("final:      {:?}", state.get());
            let remote = load_follow_state(&*store, &user, &author, &cfg.retry).await?;
            println!("remote:     {:?}", remote);
        }
        Command::Watch { table, events } => {
            let cfg = Config::load_or_default(&config_path)?;
            let store = Arc::new(cfg.build_store());
            let mut sub = store.subscribe(SubscriptionFilter::table(table.clone()));

            let writer = Arc::clone(&store);
            let target = table.clone();
            tokio::spawn(async move {
                for n in 0..events {
                    let r = row([("user_id", json!(format!("user-{n}"))), ("seq", json!(n))]);
                    if let Err(err) = writer.insert(&target, r).await {
                        tracing::warn!(error = %err, "scripted insert failed");
                    }
                }
            });

            for _ in 0..events {
                match sub.next().await {
                    Some(ev) => println!("{}", serde_json::to_string(&ev)?),
                    None => break,
                }
            }
            sub.unsubscribe();
            info!(table = %table, "watch finished");
        }
    }

    Ok(())
}

fn report<T: std::fmt::Debug>(outcome: MutationOutcome<T>) {
    match outcome {
        MutationOutcome::Committed(v) => println!("committed:  {:?}", v),
        MutationOutcome::RolledBack(err) => println!("rolled back: {err}"),
    }
}

/// Make the store agree with the state the button is rendered from.
async fn seed_likes(store: &InMemoryStore, user: &UserId, bite: &BiteId, likes: u64, liked: bool) -> anyhow::Result<()> {
    let others = if liked { likes.saturating_sub(1) } else { likes };
    for n in 0..others {
        store.insert(LIKES, row([("user_id", json!(format!("fan-{n}"))), ("bite_id", json!(bite.as_str()))])).await?;
    }
    if liked {
        store.insert(LIKES, row([("user_id", json!(user.as_str())), ("bite_id", json!(bite.as_str()))])).await?;
    }
    Ok(())
}

async fn seed_follows(
    store: &InMemoryStore,
    user: &UserId,
    author: &AuthorId,
    followers: u64,
    following: bool,
) -> anyhow::Result<()> {
    let others = if following { followers.saturating_sub(1) } else { followers };
    for n in 0..others {
        let r = row([("follower_id", json!(format!("fan-{n}"))), ("following_id", json!(author.as_str()))]);
        store.insert(FOLLOWS, r).await?;
    }
    if following {
        let r = row([("follower_id", json!(user.as_str())), ("following_id", json!(author.as_str()))]);
        store.insert(FOLLOWS, r).await?;
    }
    Ok(())
}
