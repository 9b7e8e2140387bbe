//! slbwx - ShiningLore BNX/PNX model tools

fn main() -> anyhow::Result<()> {
    slbwx::cli::run_cli()
}
