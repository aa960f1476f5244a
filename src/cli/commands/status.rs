//! Status command - check the bundler and JavaScript runtime

use crate::build::{Builder, EsbuildBuilder};
use crate::config::Config;
use crate::error::RendrResult;
use crate::paths;
use crate::sandbox::create_sandbox;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> RendrResult<()> {
    println!("{}", style("Rendr Status").bold().cyan());
    println!();

    let mut all_ok = true;

    println!("{}", style("Frontend:").bold());
    let frontend_dir = paths::absolutize(&config.engine.frontend_dir)?;
    if frontend_dir.is_dir() {
        println!("  {} {}", CHECK, frontend_dir.display());
        let node_modules = frontend_dir.join("node_modules");
        if !node_modules.is_dir() {
            println!(
                "    {} no node_modules; run npm install in the frontend directory",
                style("note:").dim()
            );
        }
    } else {
        println!(
            "  {} {} {}",
            CROSS,
            frontend_dir.display(),
            style("(not found)").red()
        );
        all_ok = false;
    }

    println!();
    println!("{}", style("Builder:").bold());
    let builder = EsbuildBuilder::new(&config.builder);
    all_ok &= report(builder.name(), &config.builder.command, builder.is_available().await);

    println!();
    println!("{}", style("Sandbox:").bold());
    let sandbox = create_sandbox(&config.sandbox);
    let command = config
        .sandbox
        .command
        .as_deref()
        .unwrap_or_else(|| config.sandbox.runtime.default_command());
    all_ok &= report(sandbox.name(), command, sandbox.is_available().await);

    println!();
    if all_ok {
        println!("{}", style("All checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details").yellow().bold()
        );
    }

    Ok(())
}

fn report(name: &str, command: &str, available: bool) -> bool {
    if available {
        println!("  {} {} ({})", CHECK, name, style(command).dim());
    } else {
        println!(
            "  {} {} {}",
            CROSS,
            name,
            style(format!("({} not found)", command)).red()
        );
    }
    available
}
