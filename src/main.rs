// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus CLI entrypoint.
//!
//! Opens (or creates) a session file, optionally applies a JSON batch of
//! edit intents, waits for edge routing to settle, and prints the resulting
//! scene as a text listing.

use std::error::Error;
use std::time::Duration;

use proteus::edit::EditIntent;
use proteus::layout::StackedLayoutEngine;
use proteus::model::fixtures;
use proteus::render::{render_scene_listing, NullRenderer};
use proteus::routing::{OrthogonalRouter, RoutingDriverConfig};
use proteus::store::{SessionFile, SessionSnapshot, WriteDurability};
use proteus::DiagramSession;

const DEFAULT_SESSION_FILE: &str = "proteus-session.json";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<session-file>] [--durable-writes] [--ops <file>]\n  {program} --session <file> [--durable-writes] [--ops <file>]\n  {program} --demo [--ops <file>]\n\nIf session-file/--session is omitted, `{DEFAULT_SESSION_FILE}` in the current\nworking directory is used. --demo runs on a built-in demo session and cannot\nbe combined with session-file/--session.\n\n--ops applies a JSON array of edit intents before printing the scene.\n--durable-writes opts into slower, best-effort durable persistence\n(fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    demo: bool,
    session_file: Option<String>,
    ops_file: Option<String>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--session" => {
                if options.session_file.is_some() {
                    return Err(());
                }
                let file = args.next().ok_or(())?;
                options.session_file = Some(file);
            }
            "--ops" => {
                if options.ops_file.is_some() {
                    return Err(());
                }
                let file = args.next().ok_or(())?;
                options.ops_file = Some(file);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            other => {
                if other.starts_with('-') || options.session_file.is_some() {
                    return Err(());
                }
                options.session_file = Some(other.to_owned());
            }
        }
    }

    if options.demo && options.session_file.is_some() {
        return Err(());
    }
    Ok(options)
}

async fn run(options: CliOptions) -> Result<(), Box<dyn Error>> {
    let routing_config = RoutingDriverConfig {
        debounce: Duration::from_millis(20),
        max_wait: Duration::from_millis(100),
    };
    let mut session = DiagramSession::new_with(
        StackedLayoutEngine::new(),
        OrthogonalRouter::new(),
        Box::new(NullRenderer),
        routing_config,
    );

    if options.demo {
        session
            .restore(SessionSnapshot {
                graph: fixtures::demo_graph(),
                view: Default::default(),
            })
            .await;
    } else {
        let path = options
            .session_file
            .as_deref()
            .unwrap_or(DEFAULT_SESSION_FILE);
        let durability = if options.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        };
        let store = SessionFile::new(path).with_durability(durability);
        session.attach_store(store, SessionSnapshot::empty).await;
    }

    if let Some(ops_file) = &options.ops_file {
        let raw = std::fs::read_to_string(ops_file)?;
        let intents: Vec<EditIntent> = serde_json::from_str(&raw)?;
        for intent in &intents {
            session.apply(intent).await?;
        }
    }

    // A session without geometry gets one full layout pass.
    if session.view().nodes().is_empty() && !session.graph().is_empty() {
        let root_id = session.graph().root_id().clone();
        session.relayout_scope(&root_id).await?;
    }

    // Feed node centers to the router, then let the batch window commit.
    let scene = session.scene();
    session
        .routing()
        .with_router(|router| {
            router.clear_anchors();
            for node in &scene.nodes {
                router.set_anchor(node.id.clone(), node.frame.center());
            }
        })
        .await;
    session.reroute_all(None).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    session.drain_route_updates();

    print!("{}", render_scene_listing(&session.scene()));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "proteus".to_owned());
    let options = match parse_options(args) {
        Ok(options) => options,
        Err(()) => {
            print_usage(&program);
            std::process::exit(2);
        }
    };

    if let Err(err) = run(options).await {
        eprintln!("proteus: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};

    fn parse(args: &[&str]) -> Result<CliOptions, ()> {
        parse_options(args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn parses_positional_session_file() {
        let options = parse(&["my-session.json", "--durable-writes"]).expect("options");
        assert_eq!(options.session_file.as_deref(), Some("my-session.json"));
        assert!(options.durable_writes);
        assert!(!options.demo);
    }

    #[test]
    fn rejects_demo_combined_with_a_session_file() {
        assert!(parse(&["--demo", "--session", "x.json"]).is_err());
        assert!(parse(&["--session"]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn accepts_ops_file() {
        let options = parse(&["--demo", "--ops", "edits.json"]).expect("options");
        assert!(options.demo);
        assert_eq!(options.ops_file.as_deref(), Some("edits.json"));
    }
}
