//! CLI entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `docket_core` linkage.
//! - Dump the local document tree of one project as JSON.
//!
//! Usage: `docket_cli [<db_path> <project_id>]`

use docket_core::{CoreContext, CoreHandle, MemoryRemoteStore, SqliteLocalStore};
use log::error;
use std::process::ExitCode;
use std::rc::Rc;

const OFFLINE_ACCOUNT: &str = "local";

fn main() -> ExitCode {
    println!("docket_core ping={}", docket_core::ping());
    println!("docket_core version={}", docket_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [db_path, project_id] => match dump_tree(db_path, project_id) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(message) => {
                error!("event=cli_dump module=cli status=error error={message}");
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: docket_cli [<db_path> <project_id>]");
            ExitCode::from(2)
        }
    }
}

fn dump_tree(db_path: &str, project_id: &str) -> Result<String, String> {
    let local = SqliteLocalStore::open(db_path).map_err(|err| err.to_string())?;
    let remote = MemoryRemoteStore::new();
    remote.set_available(false);

    let handle = CoreHandle::new(CoreContext::new(
        OFFLINE_ACCOUNT,
        Rc::new(local),
        Rc::new(remote),
    ));
    let tree = handle
        .document_tree(project_id)
        .map_err(|err| err.to_string())?;
    serde_json::to_string_pretty(&tree).map_err(|err| err.to_string())
}
