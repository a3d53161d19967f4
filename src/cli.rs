// Copyright (c) 2025 Kopilka Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn days_arg(default: &'static str) -> Arg {
    Arg::new("days")
        .long("days")
        .value_parser(value_parser!(i64))
        .default_value(default)
        .help("Trailing window in days")
}

fn output_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn windowed_report(name: &'static str, about: &'static str, default_days: &'static str) -> Command {
    output_flags(Command::new(name).about(about).arg(days_arg(default_days)))
}

pub fn build_cli() -> Command {
    Command::new("kopilka")
        .about("Kopilka: chat-style income/expense tracking with summaries and trends")
        .version(crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .value_parser(value_parser!(i64))
                .default_value("1")
                .global(true)
                .help("User id the command acts for"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Record and manage transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction from a free-form line")
                        .arg(
                            Arg::new("text")
                                .required(true)
                                .num_args(1..)
                                .help("Entry like: расход продукты 1500.50"),
                        )
                        .arg(
                            Arg::new("desc")
                                .long("desc")
                                .help("Optional note stored with the entry"),
                        ),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .about("List recent transactions, newest first")
                        .arg(days_arg("30"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .help("Show at most this many rows"),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .about("Change fields of a transaction you own")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64)))
                        .arg(Arg::new("category").long("category").help("New category"))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .help("New amount, `,` or `.` decimals"),
                        )
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .help("income/доход or expense/расход"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction you own")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Summaries and trends over a trailing window")
                .subcommand(windowed_report(
                    "summary",
                    "Totals, counts and averages",
                    "30",
                ))
                .subcommand(windowed_report(
                    "categories",
                    "Per-category totals and averages by kind",
                    "30",
                ))
                .subcommand(windowed_report(
                    "daily",
                    "Income, expense and balance per day",
                    "30",
                ))
                .subcommand(windowed_report(
                    "weekly",
                    "Income, expense and balance per ISO week number",
                    "30",
                ))
                .subcommand(windowed_report(
                    "monthly",
                    "Income, expense and balance per month",
                    "90",
                ))
                .subcommand(
                    windowed_report("top", "Top categories by amount", "30")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("expense")
                                .help("income/доход or expense/расход"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .default_value("10"),
                        ),
                )
                .subcommand(output_flags(
                    Command::new("balance").about("All-time income, expense and balance"),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Dump the transaction log for external tooling")
                .subcommand(
                    Command::new("transactions")
                        .about("Write the full log as CSV or JSON, oldest first")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .required(true)
                                .help("csv or json"),
                        )
                        .arg(Arg::new("out").long("out").required(true).help("Output path")),
                ),
        )
}
