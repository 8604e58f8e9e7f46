mod cli;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            activity,
            acre,
        } => cli::init::run(data_dir, activity, acre),
        Commands::Calc {
            revenue,
            activity,
            acre,
            no_acre,
            save,
        } => cli::calc::run(&revenue, activity.as_deref(), acre, no_acre, save),
        Commands::History { year } => cli::history::list(year),
        Commands::Delete { id } => cli::history::delete(id),
        Commands::Clear { yes } => cli::history::clear(yes),
        Commands::Threshold { year, activity } => cli::threshold::run(year, activity.as_deref()),
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
