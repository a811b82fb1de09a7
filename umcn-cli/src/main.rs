// Copyright (c) 2023 Contributors to the Eclipse Foundation
//
// See the NOTICE file(s) distributed with this work for additional
// information regarding copyright ownership.
//
// This program and the accompanying materials are made available under the
// terms of the Apache Software License 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0, or the MIT license
// which is available at https://opensource.org/licenses/MIT.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;
#[cfg(debug_assertions)]
extern crate better_panic;

fn main() -> Result<()> {
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Starts the frequency estimator. Run standalone, this process has no
    // topics of its own to advertise - `mcn` addresses whatever topics the
    // host application that embeds uMCN has already advertised in this same
    // process. A demo host application lives under `demos/basic-pubsub`.
    umcn::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::List => {
            commands::list();
            Ok(())
        }
        Command::Echo(args) => commands::echo(&args.topic, args.period, args.number),
        Command::Suspend(args) => commands::suspend(&args.topic),
        Command::Resume(args) => commands::resume(&args.topic),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }

    Ok(())
}
