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

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
    name = "mcn",
    bin_name = "mcn",
    about = "uMCN topics operations",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all uMCN topics.
    List,
    /// Echo a uMCN topic.
    Echo(EchoArgs),
    /// Suspend a uMCN topic.
    Suspend(TopicArgs),
    /// Resume a uMCN topic.
    Resume(TopicArgs),
}

#[derive(Args)]
pub struct TopicArgs {
    /// Name of the topic, as passed to `define_topic!`.
    pub topic: String,
}

#[derive(Args)]
pub struct EchoArgs {
    /// Name of the topic, as passed to `define_topic!`.
    pub topic: String,

    /// Echo count, e.g. `-n 10` echoes 10 times.
    #[arg(short = 'n', long = "number", default_value_t = 1)]
    pub number: u32,

    /// Echo period in milliseconds. `-p 0` polls as fast as possible.
    #[arg(short = 'p', long = "period", default_value_t = 500)]
    pub period: u64,
}
