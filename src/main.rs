use clap::Parser;
use lilerp::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    lilerp::core::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Raw(cmd) => lilerp::cli::commands::raw::run(cmd, &global),
        Commands::Pack(cmd) => lilerp::cli::commands::pack::run(cmd, &global),
        Commands::Master(cmd) => lilerp::cli::commands::master::run(cmd, &global),
        Commands::Db(cmd) => lilerp::cli::commands::db::run(cmd, &global),
        Commands::Config(cmd) => lilerp::cli::commands::config::run(cmd, &global),
        Commands::Bridge(args) => lilerp::cli::commands::bridge::run(args, &global),
        Commands::Completions(args) => lilerp::cli::commands::completions::run(args),
    }
}
