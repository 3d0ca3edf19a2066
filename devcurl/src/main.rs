use commands::command_argument_builder;
use devcurl::handlers::{
    handle_generate, handle_headers, handle_init, handle_list, handle_map, handle_response,
    handle_scan, open_db,
};
use tracing::Level;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    let level = if chosen_command.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("list", primary_command)) => handle_list(primary_command),
        Some(("generate", primary_command)) => {
            handle_generate(primary_command, open_db(&chosen_command))
        }
        Some(("response", primary_command)) => handle_response(primary_command),
        Some(("headers", primary_command)) => {
            handle_headers(primary_command, open_db(&chosen_command))
        }
        Some(("scan", primary_command)) => {
            handle_scan(primary_command, open_db(&chosen_command)).await
        }
        Some(("map", primary_command)) => handle_map(primary_command, open_db(&chosen_command)),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
