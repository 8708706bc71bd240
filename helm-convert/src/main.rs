use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use helm_convert::{Options, options::TransformerKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Hoist common values out of rendered manifests into a kustomize overlay
    Convert {
        /// A manifest file, a directory of manifests, or `-` for stdin
        input: PathBuf,
        /// Directory to write the overlay to
        #[clap(short, long, required_unless_present = "stdout")]
        output: Option<PathBuf>,
        /// Print the kustomization and resources as a single stream instead
        #[clap(long, conflicts_with = "output")]
        stdout: bool,
        /// Options file selecting and configuring transformers
        #[clap(long)]
        config: Option<PathBuf>,
        /// Additional annotation key to remove
        #[clap(long = "remove-annotation", value_name = "KEY")]
        remove_annotations: Vec<String>,
        /// Transformer to leave out
        #[clap(long, value_enum, value_name = "NAME")]
        skip: Vec<TransformerKind>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Convert {
            input,
            output,
            stdout: _,
            config,
            remove_annotations,
            skip,
        } => {
            let mut options = match config {
                Some(path) => Options::load(path)?,
                None => Options::default(),
            };
            options
                .remove_annotations
                .extend(remove_annotations.into_iter().map(Into::into));
            for kind in skip {
                options.skip(kind);
            }

            let mut resources = helm_convert::load::load_path(&input)
                .with_context(|| format!("loading `{}`", input.display()))?;
            let mut kustomization = helm_convert::convert(&options, &mut resources)?;

            match output {
                Some(dir) => {
                    helm_convert::write::write_overlay(&dir, &mut kustomization, &resources)?
                }
                None => print!(
                    "{}",
                    helm_convert::write::to_string(&kustomization, &resources)?
                ),
            }
        }
    }

    Ok(())
}
