use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub(crate) const DEFAULT_DB_PATH: &str = "~/.config/devcurl/devcurl.db";

fn har_arg() -> clap::Arg {
    arg!(<HAR>)
        .help("Path to a HAR capture")
        .value_parser(clap::value_parser!(PathBuf))
}

fn index_arg() -> clap::Arg {
    arg!(-i --"index" <N>)
        .required(false)
        .help("Entry number as shown by `devcurl list`")
        .value_parser(clap::value_parser!(u64).range(1..))
        .default_value("1")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("devcurl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("devcurl")
        .styles(CLAP_STYLING)
        .about("Turn captured HTTP exchanges into curl, fetch and axios code and page-to-API maps")
        .arg(
            arg!(-q --"quiet" "Suppress non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output to stderr")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"db" <PATH>)
                .required(false)
                .global(true)
                .help("Location of the devcurl database")
                .default_value(DEFAULT_DB_PATH),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Initializes the devcurl database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the devcurl database (defaults to --db)"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database at the specified location")
                        .required(false),
                ),
        )
        .subcommand(
            command!("list")
                .about("List the API calls in a HAR capture")
                .arg(har_arg())
                .arg(
                    arg!(-a --"all")
                        .required(false)
                        .help("Include documents, scripts, images and other non-API requests"),
                ),
        )
        .subcommand(
            command!("generate")
                .about("Generate call code for a captured exchange")
                .arg(har_arg())
                .arg(index_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format")
                        .value_parser(["curl", "curl-oneline", "fetch", "axios"])
                        .default_value("curl"),
                ),
        )
        .subcommand(
            command!("response")
                .about("Show the response of a captured exchange")
                .arg(har_arg())
                .arg(index_arg())
                .arg(
                    arg!(--"headers")
                        .required(false)
                        .help("Show response headers")
                        .conflicts_with("body"),
                )
                .arg(
                    arg!(--"body")
                        .required(false)
                        .help("Show only the response body")
                        .conflicts_with("headers"),
                ),
        )
        .subcommand(
            command!("headers")
                .about("Manage the request headers left out of generated code")
                .subcommand_required(true)
                .subcommand(command!("list").about("List filtered headers by category"))
                .subcommand(
                    command!("add")
                        .about("Filter a header")
                        .arg(arg!(<NAME>).help("Header name")),
                )
                .subcommand(
                    command!("remove")
                        .about("Stop filtering a header")
                        .arg(arg!(<NAME>).help("Header name")),
                )
                .subcommand(
                    command!("preset").about("Replace the list with a preset").arg(
                        arg!(<PRESET>)
                            .help("Preset name")
                            .value_parser(["essential", "default", "include-all"]),
                    ),
                )
                .subcommand(command!("reset").about("Restore the default list")),
        )
        .subcommand(
            command!("scan")
                .about(
                    "Scan the page a HAR capture was recorded on and store its API map. \
                Rescanning a page replaces its earlier scan.",
                )
                .arg(har_arg())
                .arg(
                    arg!(-p --"page" <URL>)
                        .required(false)
                        .help("Page URL (defaults to the first document in the capture)"),
                )
                .arg(
                    arg!(--"refetch")
                        .required(false)
                        .help("Re-request GET endpoints whose body is missing from the capture"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request body retrieval timeout")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("map")
                .about("Inspect the stored page-to-API map")
                .subcommand_required(true)
                .subcommand(
                    command!("show").about("Show scanned pages").arg(
                        arg!(-s --"search" <TEXT>)
                            .required(false)
                            .help("Only pages whose URL contains TEXT"),
                    ),
                )
                .subcommand(command!("clear").about("Remove all scanned pages"))
                .subcommand(
                    command!("export")
                        .about("Write the map to a dated JSON file")
                        .arg(
                            arg!(-o --"output" <DIR>)
                                .required(false)
                                .help("Directory to write into")
                                .value_parser(clap::value_parser!(PathBuf))
                                .default_value("."),
                        ),
                ),
        )
}
