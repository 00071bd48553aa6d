use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "node-workdir",
    about = "Pin Node.js versions to project directories",
    long_about = "Pin Node.js versions to project directories.\n\n\
        npm, npx, yarn and pnpm are wrapped by a hook in your shell startup file. \
        Inside a registered directory they switch to the pinned version through your \
        version manager and switch back when the command ends.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug output on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pin a directory to a Node version
    Add {
        /// Project directory (`.`, `~/code/app` or an absolute path)
        dir: String,
        /// Node version, e.g. 18, 18.17.1, v20.0.0 or lts/hydrogen
        version: String,
    },

    /// Forget a directory
    #[command(alias = "rm")]
    Remove { dir: String },

    /// Show registered directories
    #[command(alias = "ls")]
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite the shell hook from the saved configuration
    Regenerate,

    /// Remove the shell hook from startup files
    Clean {
        /// Clean every known startup file of every shell
        #[arg(long)]
        all: bool,
    },

    /// Show configuration paths and hook status
    Info,

    /// Choose the shell and version manager, then install the hook
    Setup {
        /// bash, zsh, fish or powershell (detected when omitted)
        #[arg(short, long)]
        shell: Option<String>,
        /// nvm, n, fnm, nvm-windows or nvs (detected when omitted)
        #[arg(short, long)]
        manager: Option<String>,
        /// Save the choice without touching startup files
        #[arg(long)]
        no_hook: bool,
    },

    /// Show detected shells and version managers
    Detect,

    /// Print the hook block without writing it
    Hook {
        /// Render for this shell instead of the configured one
        #[arg(short, long)]
        shell: Option<String>,
    },
}
