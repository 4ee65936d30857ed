#![forbid(unsafe_code)]

use std::env;

use onduty_tools::demo_cli::{build_demo_world, execute_demo_command};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let subcommand = args
        .first()
        .ok_or_else(|| "usage: onduty <dashboard|quota> [args]".to_string())?;

    let world = build_demo_world()?;
    let output = execute_demo_command(&world, subcommand, &args[1..])?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
