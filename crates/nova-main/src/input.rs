// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of NOVA.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Terminal command parsing for the interactive loop.

use nova_types::{LightCommand, RemoteCommand};

pub const HELP: &str = "\
Commands:
  light on | off | color <name> | brightness <0-100>
  remote <button>      e.g. remote play, remote volume-up
  chat <text>          ask the assistant
  say <text>           speak text without adding it to the chat
  status               poll now and show the dashboard
  help                 show this help
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Light(LightCommand),
    Remote(RemoteCommand),
    Chat(String),
    Say(String),
    Status,
    Help,
    Quit,
    Empty,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    match word.to_lowercase().as_str() {
        "" => Ok(Input::Empty),
        "light" => rest
            .parse::<LightCommand>()
            .map(Input::Light)
            .map_err(|e| e.to_string()),
        "remote" => rest
            .parse::<RemoteCommand>()
            .map(Input::Remote)
            .map_err(|e| e.to_string()),
        "chat" | "ask" => non_empty(rest, "chat").map(Input::Chat),
        "say" => non_empty(rest, "say").map(Input::Say),
        "status" => Ok(Input::Status),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(format!("unknown command '{other}' (type 'help')")),
    }
}

fn non_empty(text: &str, command: &str) -> Result<String, String> {
    if text.is_empty() {
        Err(format!("usage: {command} <text>"))
    } else {
        Ok(text.to_owned())
    }
}
