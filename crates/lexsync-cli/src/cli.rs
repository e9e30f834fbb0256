use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lexsync",
    about = "lexsync: verify lexicon send/receive results on both sides of the sync",
    version
)]
pub struct Cli {
    /// Settings file (missing file means built-in defaults)
    #[arg(long, global = true, default_value = "lexsync.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a fixture and print its canonical tree
    Parse {
        /// Path to the fixture file
        fixture: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify a fixture against a LanguageDepot working directory
    VerifyDepot {
        /// Path to the fixture file
        fixture: String,

        /// Repository root (overrides `repository.root` from settings)
        #[arg(long)]
        repo: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify a fixture against a project's document database
    VerifyDocstore {
        /// Path to the fixture file
        fixture: String,

        /// Project key; the database is `<database_prefix><project>`
        #[arg(long)]
        project: String,

        /// Read collections from `<db>.<collection>.json` dumps in this
        /// directory instead of a live server
        #[arg(long)]
        dump_dir: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
