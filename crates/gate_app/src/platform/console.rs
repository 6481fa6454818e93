use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use gate_core::{Msg, ScrapeParameters};

use super::app::AppEvent;

pub const HELP: &str = "\
Commands:
  activate <key>          redeem a license key
  set keyword <text>      product keyword
  set price <number>      minimum price
  set pinned <count>      minimum pinned count
  set reviews <count>     minimum review count
  set dir <path>          export directory
  form                    show the current form
  start | stop            control the collection job
  status                  show license, job, metrics and recent activity
  clear                   clear the result lists
  export                  show where results are written
  identity                show this device's identifier
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    Send(AppEvent),
    Print(String),
    Nothing,
}

/// Form fields the user edits before pressing start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Form {
    parameters: ScrapeParameters,
}

impl Form {
    pub fn new(saved: Option<ScrapeParameters>) -> Self {
        Self {
            parameters: saved.unwrap_or_default(),
        }
    }

    fn describe(&self) -> String {
        let p = &self.parameters;
        format!(
            "keyword={:?} price={} pinned={} reviews={} dir={:?}",
            p.keyword, p.price_floor, p.min_pinned, p.min_reviews, p.export_dir
        )
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), String> {
        let p = &mut self.parameters;
        match field {
            "keyword" => p.keyword = value.to_string(),
            "dir" | "export" | "export_dir" => p.export_dir = value.to_string(),
            "price" => p.price_floor = parse_number(field, value)?,
            "pinned" => p.min_pinned = parse_count(field, value)?,
            "reviews" => p.min_reviews = parse_count(field, value)?,
            other => return Err(format!("unknown field '{other}'")),
        }
        Ok(())
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, String> {
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| format!("{field} must be a number"))
}

fn parse_count(field: &str, value: &str) -> Result<u32, String> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<u32>()
        .map_err(|_| format!("{field} must be a whole number >= 0"))
}

pub fn parse_line(line: &str, form: &mut Form) -> ConsoleAction {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "" => ConsoleAction::Nothing,
        "activate" => ConsoleAction::Send(AppEvent::Msg(Msg::ActivateClicked(rest.to_string()))),
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(field, value)| (field, value.trim()))
                .unwrap_or((rest, ""));
            match form.set(&field.to_ascii_lowercase(), value) {
                Ok(()) => ConsoleAction::Print(form.describe()),
                Err(message) => ConsoleAction::Print(message),
            }
        }
        "form" => ConsoleAction::Print(form.describe()),
        "start" => ConsoleAction::Send(AppEvent::Msg(Msg::StartClicked(form.parameters.clone()))),
        "stop" => ConsoleAction::Send(AppEvent::Msg(Msg::StopClicked)),
        "clear" => ConsoleAction::Send(AppEvent::Msg(Msg::ClearResultsClicked)),
        "export" => ConsoleAction::Send(AppEvent::Msg(Msg::ExportLocationRequested)),
        "status" => ConsoleAction::Send(AppEvent::ShowStatus),
        "identity" | "id" => ConsoleAction::Send(AppEvent::ShowIdentity),
        "quit" | "exit" => ConsoleAction::Send(AppEvent::Quit),
        "help" | "?" => ConsoleAction::Print(HELP.to_string()),
        other => ConsoleAction::Print(format!("unknown command '{other}', try 'help'")),
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub fn spawn_input(form: Form, app_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let mut form = form;
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line, &mut form) {
                ConsoleAction::Send(AppEvent::Quit) => break,
                ConsoleAction::Send(event) => {
                    if app_tx.send(event).is_err() {
                        return;
                    }
                }
                ConsoleAction::Print(text) => println!("{text}"),
                ConsoleAction::Nothing => {}
            }
        }
        let _ = app_tx.send(AppEvent::Quit);
    });
}
