
use crate::{Cli, Commands, DeleteAssetsArgs};

use clap::Parser;

/// Parse `delete-assets` arguments after the subcommand name.
pub(crate) fn delete_args(args: &[&str]) -> DeleteAssetsArgs {
    let argv = ["bi-admin", "delete-assets"]
        .iter()
        .chain(args.iter())
        .copied();
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::DeleteAssets(args) => args,
        other => panic!("unexpected command: {other:?}"),
    }
}
