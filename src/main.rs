use anyhow::Result;
use hackscan::cli::Cli;
use hackscan::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.common.log_level, cli.log_dir().as_deref())?;
    cli.execute()
}
