use anyhow::Result;
use scalebench::cli;

fn main() -> Result<()> {
    cli::handle_calls()
}
